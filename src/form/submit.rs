use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::{info, warn};

use crate::engine::session::FormSession;
use crate::engine::transport::{FetchRequest, Transport};
use crate::schema::field_model::HttpMethod;
use crate::schema::form_model::Submission;
use crate::store::form_store::{FormStore, StoreError};

#[derive(Debug)]
pub enum SubmitError {
    Store(StoreError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Store(e) => write!(f, "Could not store submission: {}", e),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Store(e) => Some(e),
        }
    }
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        SubmitError::Store(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; `name -> message`
    Invalid(BTreeMap<String, String>),
    Accepted {
        /// Present when the form stores submissions and a store was given
        submission: Option<Submission>,
        /// HTTP status of the forward to `submitUrl`, if one was made and answered
        forwarded: Option<u16>,
    },
}

/// Validate, store, forward, then clear the session's values.
///
/// Forwarding to `settings.submitUrl` is best effort: failures are logged.
pub fn submit<T: Transport>(
    session: &mut FormSession<T>,
    store: Option<&mut FormStore>,
    user_agent: Option<&str>,
) -> Result<SubmitOutcome, SubmitError> {
    if !session.validate() {
        return Ok(SubmitOutcome::Invalid(session.errors().clone()));
    }

    let schema = session.schema();
    let data = session.values().clone();

    let submission = match store {
        Some(store) if schema.settings.store_submissions => {
            match store.add_submission(&schema.id, data.clone(), user_agent) {
                Ok(submission) => Some(submission),
                Err(StoreError::FormNotFound(id)) => {
                    warn!(form = %id, "form is not saved; submission not stored");
                    None
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ => None,
    };

    let forwarded = match schema.settings.submit_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            let mut request = FetchRequest::get(url);
            request.method = schema.settings.submit_method.unwrap_or(HttpMethod::Post);
            request
                .headers
                .insert("Content-Type".to_string(), "application/json".to_string());
            request.body = Some(Value::Object(data).to_string());

            match session.transport().send(&request) {
                Ok(response) => Some(response.status),
                Err(e) => {
                    warn!(url, error = %e, "forwarding submission failed");
                    None
                }
            }
        }
        None => None,
    };

    info!(form = %session.schema().id, stored = submission.is_some(), "form submitted");
    session.clear_values();

    Ok(SubmitOutcome::Accepted {
        submission,
        forwarded,
    })
}
