use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Field types
// ============================================================================

/// Every control the builder can place on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Textarea,
    Select,
    Multiselect,
    Checkbox,
    Radio,
    Switch,
    Date,
    Time,
    DatetimeLocal,
    Multidate,
    File,
    Image,
    Range,
    Color,
    Hidden,
    Label,
    Heading,
    Divider,
    Button,
    Otp,
    Captcha,
    Country,
    State,
    City,
    Program,
    Scheme,
    Standard,
    Cluster,
}

impl FieldType {
    /// Display-only elements.
    pub fn is_layout(self) -> bool {
        matches!(self, FieldType::Label | FieldType::Heading | FieldType::Divider)
    }

    /// Whether the field contributes a value to submission data.
    pub fn collects_value(self) -> bool {
        !self.is_layout() && self != FieldType::Button
    }

    /// The type a chain field is normally wired to (state -> country, ...).
    pub fn chain_parent(self) -> Option<FieldType> {
        match self {
            FieldType::State => Some(FieldType::Country),
            FieldType::City => Some(FieldType::State),
            FieldType::Scheme => Some(FieldType::Program),
            FieldType::Standard => Some(FieldType::Scheme),
            FieldType::Cluster => Some(FieldType::Standard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Switch => "switch",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DatetimeLocal => "datetime-local",
            FieldType::Multidate => "multidate",
            FieldType::File => "file",
            FieldType::Image => "image",
            FieldType::Range => "range",
            FieldType::Color => "color",
            FieldType::Hidden => "hidden",
            FieldType::Label => "label",
            FieldType::Heading => "heading",
            FieldType::Divider => "divider",
            FieldType::Button => "button",
            FieldType::Otp => "otp",
            FieldType::Captcha => "captcha",
            FieldType::Country => "country",
            FieldType::State => "state",
            FieldType::City => "city",
            FieldType::Program => "program",
            FieldType::Scheme => "scheme",
            FieldType::Standard => "standard",
            FieldType::Cluster => "cluster",
        }
    }
}

// ============================================================================
// Options and data sources
// ============================================================================

/// A selectable entry. `raw` keeps the fetched record so a parent key other
/// than the displayed value can be read from it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
    #[serde(rename = "_raw", default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            raw: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Methods that carry a request body by default.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// Where a select-like field gets its options from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataSource {
    Static(StaticSource),
    Api(ApiSource),
    Dependency(DependencySource),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSource {
    /// When absent, the field's own `options` list is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<Vec<FieldOption>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSource {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub response_path: String,
    #[serde(default)]
    pub label_key: String,
    #[serde(default)]
    pub value_key: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySource {
    #[serde(default)]
    pub depends_on: DependsOn,
    #[serde(default, alias = "endpointTemplate")]
    pub dependency_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_param: Option<String>,
    #[serde(default, alias = "parentValueKey", skip_serializing_if = "Option::is_none")]
    pub dependency_value_key: Option<String>,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub response_path: String,
    #[serde(default)]
    pub label_key: String,
    #[serde(default)]
    pub value_key: String,
}

impl DependencySource {
    /// Key read from a parent's selected raw item; `id` when unset.
    pub fn parent_value_key(&self) -> &str {
        match self.dependency_value_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => "id",
        }
    }
}

/// A single parent id or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    One(String),
    Many(Vec<String>),
}

impl Default for DependsOn {
    fn default() -> Self {
        DependsOn::One(String::new())
    }
}

impl DependsOn {
    /// Linked parent ids in declared order. Empty ids are "not linked yet".
    pub fn ids(&self) -> Vec<&str> {
        match self {
            DependsOn::One(id) => {
                if id.is_empty() {
                    vec![]
                } else {
                    vec![id.as_str()]
                }
            }
            DependsOn::Many(ids) => ids
                .iter()
                .map(String::as_str)
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    pub fn references(&self, id: &str) -> bool {
        self.ids().contains(&id)
    }

    /// Drop `id` from the parent list, keeping the variant shape.
    pub fn unlink(&mut self, id: &str) {
        match self {
            DependsOn::One(current) => {
                if current == id {
                    current.clear();
                }
            }
            DependsOn::Many(ids) => ids.retain(|p| p != id),
        }
    }
}

/// Response navigation shared by `api` and `dependency` sources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseMapping {
    pub response_path: Option<String>,
    pub label_key: Option<String>,
    pub value_key: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

impl ResponseMapping {
    pub fn new(response_path: &str, label_key: &str, value_key: &str) -> Self {
        Self {
            response_path: non_empty(response_path),
            label_key: non_empty(label_key),
            value_key: non_empty(value_key),
        }
    }
}

impl DataSource {
    pub fn mapping(&self) -> ResponseMapping {
        match self {
            DataSource::Static(_) => ResponseMapping::default(),
            DataSource::Api(api) => {
                ResponseMapping::new(&api.response_path, &api.label_key, &api.value_key)
            }
            DataSource::Dependency(dep) => {
                ResponseMapping::new(&dep.response_path, &dep.label_key, &dep.value_key)
            }
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencySource> {
        match self {
            DataSource::Dependency(dep) => Some(dep),
            _ => None,
        }
    }
}

// ============================================================================
// Presentation and validation metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
}

/// Raw CSS declarations per part of the field. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCss {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Remote call performed when a button field is pressed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

// ============================================================================
// Field
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub validation: FieldValidation,
    /// Legacy static list, used when no data source is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(
        default,
        rename = "apiDataSource",
        alias = "dataSource",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_source: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_api_config: Option<ButtonApiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, alias = "gridSpan", skip_serializing_if = "Option::is_none")]
    pub grid_cols: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(
        default,
        rename = "customCSS",
        alias = "customStyling",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_css: Option<CustomCss>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub multiple: bool,
}

impl Field {
    /// Bare field of the given type; see `schema::defaults` for populated templates.
    pub fn new(id: impl Into<String>, field_type: FieldType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            name: name.into(),
            label: String::new(),
            placeholder: None,
            help_text: None,
            validation: FieldValidation::default(),
            options: None,
            data_source: None,
            button_api_config: None,
            default_value: None,
            grid_cols: None,
            alignment: None,
            custom_css: None,
            step: None,
            rows: None,
            min: None,
            max: None,
            accept: None,
            order: 0,
            multiple: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.data_source = Some(source);
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn dependency(&self) -> Option<&DependencySource> {
        self.data_source.as_ref().and_then(DataSource::as_dependency)
    }

    pub fn is_dependent(&self) -> bool {
        self.dependency().is_some()
    }

    /// Label for messages, falling back to the programmatic name.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() { &self.name } else { &self.label }
    }
}
