use serde_json::Value;

use crate::schema::field_model::{
    ApiSource, ButtonApiConfig, DataSource, DependencySource, DependsOn, Field, FieldOption,
    FieldType, HttpMethod, StaticSource,
};
use crate::store::ids;

const GLOBAL_API: &str = "https://crmapi.thinkdatalabs.com/api/global";

// ============================================================================
// Toolbox categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub types: &'static [FieldType],
}

pub const FIELD_CATEGORIES: &[FieldCategory] = &[
    FieldCategory {
        key: "basic",
        label: "Basic",
        types: &[
            FieldType::Text,
            FieldType::Email,
            FieldType::Password,
            FieldType::Number,
            FieldType::Tel,
            FieldType::Url,
        ],
    },
    FieldCategory {
        key: "location",
        label: "Location",
        types: &[FieldType::Country, FieldType::State, FieldType::City],
    },
    FieldCategory {
        key: "program",
        label: "Program",
        types: &[
            FieldType::Program,
            FieldType::Scheme,
            FieldType::Standard,
            FieldType::Cluster,
        ],
    },
    FieldCategory {
        key: "choice",
        label: "Choice",
        types: &[
            FieldType::Textarea,
            FieldType::Select,
            FieldType::Checkbox,
            FieldType::Radio,
            FieldType::Switch,
        ],
    },
    FieldCategory {
        key: "datetime",
        label: "Date/Time",
        types: &[
            FieldType::Date,
            FieldType::Time,
            FieldType::DatetimeLocal,
            FieldType::Multidate,
        ],
    },
    FieldCategory {
        key: "file",
        label: "Files",
        types: &[FieldType::File, FieldType::Image],
    },
    FieldCategory {
        key: "advanced",
        label: "Advanced",
        types: &[
            FieldType::Range,
            FieldType::Color,
            FieldType::Hidden,
            FieldType::Otp,
        ],
    },
    FieldCategory {
        key: "layout",
        label: "Layout",
        types: &[
            FieldType::Label,
            FieldType::Heading,
            FieldType::Divider,
            FieldType::Button,
        ],
    },
];

pub fn category_of(field_type: FieldType) -> Option<&'static FieldCategory> {
    FIELD_CATEGORIES
        .iter()
        .find(|c| c.types.contains(&field_type))
}

// ============================================================================
// Field templates
// ============================================================================

/// A ready-to-insert field of `field_type` with a fresh id.
///
/// Chain types are wired to the last field of their parent type in
/// `existing`; with no such field the link is left empty.
pub fn default_field(field_type: FieldType, existing: &[Field]) -> Field {
    let (label, name) = label_and_name(field_type);
    let mut field = Field::new(ids::field_id(), field_type, name).with_label(label);
    field.placeholder = placeholder(field_type).map(str::to_string);

    match field_type {
        FieldType::Textarea => field.rows = Some(4),
        FieldType::Image => field.accept = Some("image/*".to_string()),
        FieldType::Range => {
            field.min = Some(0.0);
            field.max = Some(100.0);
            field.default_value = Some(Value::from(50));
        }
        FieldType::Color => field.default_value = Some(Value::from("#3b82f6")),
        FieldType::Button => {
            field.button_api_config = Some(ButtonApiConfig {
                enabled: false,
                method: Some(HttpMethod::Post),
                success_message: Some("Submitted!".to_string()),
                error_message: Some("Something went wrong.".to_string()),
                ..ButtonApiConfig::default()
            })
        }
        FieldType::Select | FieldType::Multiselect => {
            field.data_source = Some(static_source(&[
                ("Option 1", "option_1"),
                ("Option 2", "option_2"),
            ]))
        }
        FieldType::Radio => {
            field.data_source = Some(static_source(&[("Option A", "a"), ("Option B", "b")]))
        }
        FieldType::Multidate => field.data_source = Some(static_source(&[])),
        FieldType::Country => field.data_source = Some(api_source("country")),
        FieldType::Program => field.data_source = Some(api_source("programme")),
        FieldType::State => {
            field.data_source = Some(chain_source(existing, field_type, "state", "country", "country"))
        }
        FieldType::City => {
            field.data_source = Some(chain_source(existing, field_type, "city", "state", "state"))
        }
        FieldType::Scheme => {
            field.data_source =
                Some(chain_source(existing, field_type, "scheme", "programme", "program"))
        }
        FieldType::Standard => {
            field.data_source =
                Some(chain_source(existing, field_type, "standard", "scheme", "scheme"));
            field.multiple = true;
        }
        FieldType::Cluster => {
            field.data_source =
                Some(chain_source(existing, field_type, "cluster", "standard", "standard"))
        }
        _ => {}
    }

    field
}

fn label_and_name(field_type: FieldType) -> (&'static str, &'static str) {
    match field_type {
        FieldType::Text => ("Text Field", "text_field"),
        FieldType::Email => ("Email", "email"),
        FieldType::Password => ("Password", "password"),
        FieldType::Number => ("Number", "number"),
        FieldType::Tel => ("Phone", "phone"),
        FieldType::Url => ("Website", "url"),
        FieldType::Textarea => ("Message", "message"),
        FieldType::Country => ("Country", "country"),
        FieldType::State => ("State", "state"),
        FieldType::City => ("City", "city"),
        FieldType::Program => ("Program", "program"),
        FieldType::Scheme => ("Scheme", "scheme"),
        FieldType::Standard => ("Standard", "standard"),
        FieldType::Cluster => ("Cluster", "cluster"),
        FieldType::Select => ("Select", "select"),
        FieldType::Multiselect => ("Multi Select", "multi_select"),
        FieldType::Multidate => ("Multiple Dates", "multi_date"),
        FieldType::Checkbox => ("I agree to the terms", "agree"),
        FieldType::Radio => ("Choose one", "choice"),
        FieldType::Switch => ("Enable notifications", "toggle"),
        FieldType::Date => ("Date", "date"),
        FieldType::Time => ("Time", "time"),
        FieldType::DatetimeLocal => ("Date & Time", "datetime"),
        FieldType::File => ("Upload File", "file"),
        FieldType::Image => ("Upload Image", "image"),
        FieldType::Range => ("Range", "range"),
        FieldType::Color => ("Color", "color"),
        FieldType::Hidden => ("Hidden", "hidden_field"),
        FieldType::Label => ("This is a label", "label"),
        FieldType::Heading => ("Section Heading", "heading"),
        FieldType::Divider => ("", "divider"),
        FieldType::Button => ("Submit", "submit_btn"),
        FieldType::Otp => ("Enter OTP", "otp"),
        FieldType::Captcha => ("Captcha", "captcha"),
    }
}

fn placeholder(field_type: FieldType) -> Option<&'static str> {
    match field_type {
        FieldType::Text => Some("Enter text..."),
        FieldType::Email => Some("your@email.com"),
        FieldType::Password => Some("••••••••"),
        FieldType::Number => Some("0"),
        FieldType::Tel => Some("+1 (555) 000-0000"),
        FieldType::Url => Some("https://"),
        FieldType::Textarea => Some("Enter message..."),
        FieldType::Country => Some("Select country..."),
        FieldType::State => Some("Select state..."),
        FieldType::City => Some("Select city..."),
        FieldType::Program => Some("Select program"),
        FieldType::Scheme => Some("Select scheme..."),
        FieldType::Standard => Some("Select standard..."),
        FieldType::Cluster => Some("Select cluster..."),
        FieldType::Select => Some("Choose..."),
        FieldType::Multidate => Some("Select dates..."),
        _ => None,
    }
}

fn static_source(pairs: &[(&str, &str)]) -> DataSource {
    DataSource::Static(StaticSource {
        static_data: Some(
            pairs
                .iter()
                .map(|(label, value)| FieldOption::new(*label, *value))
                .collect(),
        ),
    })
}

fn api_source(resource: &str) -> DataSource {
    DataSource::Api(ApiSource {
        endpoint: format!("{}/{}/", GLOBAL_API, resource),
        method: HttpMethod::Get,
        label_key: "name".to_string(),
        value_key: "id".to_string(),
        ..ApiSource::default()
    })
}

/// `query` is the remote filter name, `param` the parent field's name.
fn chain_source(
    existing: &[Field],
    field_type: FieldType,
    resource: &str,
    query: &str,
    param: &str,
) -> DataSource {
    let parent_id = field_type
        .chain_parent()
        .and_then(|parent| existing.iter().rev().find(|f| f.field_type == parent))
        .map(|f| f.id.clone())
        .unwrap_or_default();

    DataSource::Dependency(DependencySource {
        depends_on: DependsOn::One(parent_id),
        dependency_endpoint: format!("{}/{}/?{}={{value}}", GLOBAL_API, resource, query),
        dependency_param: Some(param.to_string()),
        dependency_value_key: Some("id".to_string()),
        method: HttpMethod::Get,
        label_key: "name".to_string(),
        value_key: "id".to_string(),
        ..DependencySource::default()
    })
}
