use std::collections::{HashMap, HashSet};

use crate::engine::graph::FieldGraph;

/// Memo of `(field, parent value)` pairs that have already been requested.
///
/// `should_load` is false for a pair exactly when `mark_loaded` saw it and
/// no `invalidate` covering that field has happened since.
#[derive(Debug, Clone, Default)]
pub struct LoadState {
    loaded: HashMap<String, HashSet<String>>,
}

impl LoadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_load(&self, field_id: &str, parent_value: &str) -> bool {
        !self
            .loaded
            .get(field_id)
            .is_some_and(|values| values.contains(parent_value))
    }

    pub fn mark_loaded(&mut self, field_id: &str, parent_value: &str) {
        self.loaded
            .entry(field_id.to_string())
            .or_default()
            .insert(parent_value.to_string());
    }

    /// Forget every parent-value variant recorded for `field_id`.
    pub fn invalidate(&mut self, field_id: &str) {
        self.loaded.remove(field_id);
    }

    /// Invalidate `field_id` and all of its descendants.
    pub fn invalidate_subtree(&mut self, field_id: &str, graph: &FieldGraph) {
        for id in graph.subtree(field_id) {
            self.invalidate(&id);
        }
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
