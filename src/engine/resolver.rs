use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::debug;

use crate::engine::error::ResolveError;
use crate::engine::path;
use crate::engine::transport::{FetchRequest, Transport};
use crate::schema::field_model::{DataSource, Field, FieldOption, ResponseMapping};

/// Literal token in a dependency endpoint replaced by the parent value.
pub const PLACEHOLDER: &str = "{value}";

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, so the value is safe in
/// a path segment as well as a query component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ============================================================================
// Parent values
// ============================================================================

/// Resolved parent ids for a dependent field, in declared parent order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentValue(Vec<String>);

impl ParentValue {
    pub fn single(value: impl Into<String>) -> Self {
        ParentValue(vec![value.into()])
    }

    pub fn from_parts(parts: Vec<String>) -> Self {
        ParentValue(parts)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Incomplete when any parent is unset.
    pub fn is_complete(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|p| !p.is_empty())
    }

    /// Comma-joined form; also the load-state key.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    /// Each part percent-encoded as a URI component, joined with literal commas.
    pub fn encoded(&self) -> String {
        self.0
            .iter()
            .map(|p| utf8_percent_encode(p, COMPONENT).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoDataSource,
    MissingEndpoint,
    MissingPlaceholder,
    MissingParentValue,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoDataSource => "no data source",
            SkipReason::MissingEndpoint => "missing endpoint",
            SkipReason::MissingPlaceholder => "endpoint template has no placeholder",
            SkipReason::MissingParentValue => "parent value not set",
        }
    }
}

/// What resolving a field would do, decided without touching the network.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvePlan {
    Static(Vec<FieldOption>),
    Fetch {
        request: FetchRequest,
        mapping: ResponseMapping,
    },
    Skip(SkipReason),
}

// ============================================================================
// Resolver
// ============================================================================

/// Turns a field's data source (plus a parent value for dependent fields)
/// into a uniform option list.
pub struct OptionResolver<T: Transport> {
    transport: T,
}

impl<T: Transport> OptionResolver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn plan(&self, field: &Field, parent: Option<&ParentValue>) -> ResolvePlan {
        let Some(source) = field.data_source.as_ref() else {
            return match &field.options {
                Some(options) => ResolvePlan::Static(normalize_static(options)),
                None => ResolvePlan::Skip(SkipReason::NoDataSource),
            };
        };

        match source {
            DataSource::Static(s) => {
                let options = s
                    .static_data
                    .as_deref()
                    .or(field.options.as_deref())
                    .unwrap_or(&[]);
                ResolvePlan::Static(normalize_static(options))
            }

            DataSource::Api(api) => {
                if api.endpoint.trim().is_empty() {
                    return ResolvePlan::Skip(SkipReason::MissingEndpoint);
                }
                ResolvePlan::Fetch {
                    request: FetchRequest {
                        url: api.endpoint.clone(),
                        method: api.method,
                        headers: api.headers.clone(),
                        body: None,
                    },
                    mapping: source.mapping(),
                }
            }

            DataSource::Dependency(dep) => {
                let template = dep.dependency_endpoint.trim();
                if template.is_empty() {
                    return ResolvePlan::Skip(SkipReason::MissingEndpoint);
                }
                if !template.contains(PLACEHOLDER) {
                    return ResolvePlan::Skip(SkipReason::MissingPlaceholder);
                }
                let Some(parent) = parent.filter(|p| p.is_complete()) else {
                    return ResolvePlan::Skip(SkipReason::MissingParentValue);
                };
                ResolvePlan::Fetch {
                    request: FetchRequest {
                        url: template.replacen(PLACEHOLDER, &parent.encoded(), 1),
                        method: dep.method,
                        headers: dep.headers.clone(),
                        body: None,
                    },
                    mapping: source.mapping(),
                }
            }
        }
    }

    /// Perform a fetch and normalize the body.
    pub fn fetch(
        &self,
        request: &FetchRequest,
        mapping: &ResponseMapping,
    ) -> Result<Vec<FieldOption>, ResolveError> {
        debug!(url = %request.url, method = request.method.as_str(), "fetching options");

        let response = self.transport.send(request)?;
        if !response.is_success() {
            return Err(ResolveError::Status {
                url: request.url.clone(),
                status: response.status,
            });
        }
        let body: Value =
            serde_json::from_str(&response.body).map_err(|e| ResolveError::Parse {
                url: request.url.clone(),
                source: e,
            })?;

        let candidate = match mapping.response_path.as_deref() {
            Some(p) => path::get(&body, p),
            None => Some(&body),
        };
        Ok(normalize_options(candidate, mapping))
    }

    /// Plan and, when needed, fetch. Skipped plans yield no options.
    pub fn resolve(
        &self,
        field: &Field,
        parent: Option<&ParentValue>,
    ) -> Result<Vec<FieldOption>, ResolveError> {
        match self.plan(field, parent) {
            ResolvePlan::Static(options) => Ok(options),
            ResolvePlan::Fetch { request, mapping } => self.fetch(&request, &mapping),
            ResolvePlan::Skip(reason) => {
                debug!(field = %field.name, reason = reason.as_str(), "resolution skipped");
                Ok(vec![])
            }
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Map fetched records to options. Non-array candidates give no options.
pub fn normalize_options(candidate: Option<&Value>, mapping: &ResponseMapping) -> Vec<FieldOption> {
    let Some(Value::Array(items)) = candidate else {
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| {
            let label = match mapping.label_key.as_deref() {
                Some(key) => path::get_string(item, key),
                None => path::coerce_to_string(item),
            };
            let value = match mapping.value_key.as_deref() {
                Some(key) => path::get_string(item, key),
                None => path::coerce_to_string(item),
            };
            if label.is_empty() || value.is_empty() {
                return None;
            }
            Some(FieldOption {
                label,
                value,
                raw: Some(item.clone()),
            })
        })
        .collect()
}

pub fn normalize_static(options: &[FieldOption]) -> Vec<FieldOption> {
    options
        .iter()
        .filter(|o| !o.label.is_empty() && !o.value.is_empty())
        .cloned()
        .collect()
}
