use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::form_model::{FormSchema, SavedForm, Submission, now_rfc3339};
use crate::store::ids;

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    FormNotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "Store I/O error ({}): {}", path.display(), source)
            }
            StoreError::Json { path, source } => {
                write!(f, "Store JSON error ({}): {}", path.display(), source)
            }
            StoreError::FormNotFound(id) => write!(f, "No saved form with id '{}'", id),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Json { source, .. } => Some(source),
            StoreError::FormNotFound(_) => None,
        }
    }
}

/// Saved forms and their submissions, kept in one JSON file.
///
/// Every mutation rewrites the file.
#[derive(Debug)]
pub struct FormStore {
    path: PathBuf,
    forms: Vec<SavedForm>,
}

impl FormStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let forms = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => vec![],
            Ok(content) => serde_json::from_str(&content).map_err(|e| StoreError::Json {
                path: path.clone(),
                source: e,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => vec![],
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };
        Ok(Self { path, forms })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn forms(&self) -> &[SavedForm] {
        &self.forms
    }

    pub fn get(&self, form_id: &str) -> Option<&SavedForm> {
        self.forms.iter().find(|f| f.schema.id == form_id)
    }

    /// Insert or replace the form with `schema.id`. Existing submissions are kept.
    pub fn save_form(
        &mut self,
        schema: &FormSchema,
        name: &str,
        description: &str,
    ) -> Result<&SavedForm, StoreError> {
        let mut saved = schema.clone();
        saved.name = name.to_string();
        saved.description = description.to_string();
        saved.updated_at = now_rfc3339();
        if saved.created_at.is_empty() {
            saved.created_at = saved.updated_at.clone();
        }

        let index = match self.forms.iter().position(|f| f.schema.id == schema.id) {
            Some(i) => {
                self.forms[i].schema = saved;
                i
            }
            None => {
                self.forms.push(SavedForm {
                    schema: saved,
                    submissions: vec![],
                });
                self.forms.len() - 1
            }
        };

        self.persist()?;
        debug!(form = %schema.id, "form saved");
        Ok(&self.forms[index])
    }

    /// Remove a form. Returns whether it existed.
    pub fn delete_form(&mut self, form_id: &str) -> Result<bool, StoreError> {
        let before = self.forms.len();
        self.forms.retain(|f| f.schema.id != form_id);
        let removed = self.forms.len() != before;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn add_submission(
        &mut self,
        form_id: &str,
        data: Map<String, Value>,
        user_agent: Option<&str>,
    ) -> Result<Submission, StoreError> {
        let form = self
            .forms
            .iter_mut()
            .find(|f| f.schema.id == form_id)
            .ok_or_else(|| StoreError::FormNotFound(form_id.to_string()))?;

        let submission = Submission {
            id: ids::submission_id(),
            form_id: form_id.to_string(),
            form_name: form.schema.name.clone(),
            data,
            submitted_at: now_rfc3339(),
            user_agent: user_agent.map(str::to_string),
        };
        form.submissions.push(submission.clone());

        self.persist()?;
        Ok(submission)
    }

    pub fn submissions(&self, form_id: &str) -> &[Submission] {
        self.get(form_id)
            .map(|f| f.submissions.as_slice())
            .unwrap_or(&[])
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.forms).map_err(|e| StoreError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}
