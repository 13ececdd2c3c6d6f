use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::field_model::{Field, HttpMethod};
use crate::store::ids;

/// Form-level behavior applied when the form is filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub store_submissions: bool,
    #[serde(default, rename = "customCSS", skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_grid_cols: Option<u8>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            submit_url: None,
            submit_method: Some(HttpMethod::Post),
            redirect_url: None,
            store_submissions: true,
            custom_css: None,
            form_grid_cols: Some(1),
        }
    }
}

/// A complete form definition as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub settings: FormSettings,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl FormSchema {
    /// Fresh, empty "Untitled Form".
    pub fn untitled() -> Self {
        let now = now_rfc3339();
        Self {
            id: ids::form_id(),
            name: "Untitled Form".to_string(),
            description: String::new(),
            fields: vec![],
            settings: FormSettings::default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self.renumber();
        self
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Look a field up by id first, then by name.
    pub fn find_field(&self, key: &str) -> Option<&Field> {
        self.field(key)
            .or_else(|| self.fields.iter().find(|f| f.name == key))
    }

    pub(crate) fn renumber(&mut self) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.order = i;
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

/// One collected set of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub form_id: String,
    pub form_name: String,
    pub data: Map<String, Value>,
    pub submitted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// A persisted form together with its submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedForm {
    #[serde(flatten)]
    pub schema: FormSchema,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
