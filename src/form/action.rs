use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::warn;

use crate::engine::path::coerce_to_string;
use crate::engine::transport::{FetchRequest, Transport};
use crate::schema::field_model::{ButtonApiConfig, HttpMethod};

/// Result of pressing a button that has an action configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Succeeded(String),
    Failed(String),
}

impl ActionStatus {
    pub fn message(&self) -> &str {
        match self {
            ActionStatus::Succeeded(m) | ActionStatus::Failed(m) => m,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionStatus::Succeeded(_))
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}

/// Replace `{{fieldName}}` with the current value of that field (empty if unset).
pub fn render_body_template(template: &str, values: &Map<String, Value>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            values
                .get(&caps[1])
                .map(coerce_to_string)
                .unwrap_or_default()
        })
        .into_owned()
}

/// The request a button would send, or `None` if it is disabled or has no URL.
pub fn build_action_request(
    config: &ButtonApiConfig,
    values: &Map<String, Value>,
) -> Option<FetchRequest> {
    if !config.enabled {
        return None;
    }
    let url = config.url.as_deref().filter(|u| !u.trim().is_empty())?;
    let method = config.method.unwrap_or(HttpMethod::Post);

    let body = match config.body_template.as_deref().filter(|t| !t.is_empty()) {
        Some(template) => Some(render_body_template(template, values)),
        None if method.has_body() => Some(Value::Object(values.clone()).to_string()),
        None => None,
    };

    let mut headers = std::collections::BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.extend(config.headers.clone());

    Some(FetchRequest {
        url: url.to_string(),
        method,
        headers,
        body,
    })
}

/// Send the button's request and map the response to a status message.
pub fn run_action<T: Transport + ?Sized>(
    transport: &T,
    config: &ButtonApiConfig,
    values: &Map<String, Value>,
) -> Option<ActionStatus> {
    let request = build_action_request(config, values)?;

    let status = match transport.send(&request) {
        Ok(response) if response.is_success() => ActionStatus::Succeeded(
            config
                .success_message
                .clone()
                .unwrap_or_else(|| "Success!".to_string()),
        ),
        Ok(response) => ActionStatus::Failed(
            config
                .error_message
                .clone()
                .unwrap_or_else(|| format!("Error {}", response.status)),
        ),
        Err(e) => {
            warn!(url = %request.url, error = %e, "button action failed");
            ActionStatus::Failed(config.error_message.clone().unwrap_or_else(|| e.to_string()))
        }
    };
    Some(status)
}
