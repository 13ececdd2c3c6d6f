use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::engine::error::{ResolveError, SessionError};
use crate::engine::graph::FieldGraph;
use crate::engine::load_state::LoadState;
use crate::engine::path;
use crate::engine::resolver::{OptionResolver, ParentValue, ResolvePlan, SkipReason};
use crate::engine::transport::{FetchRequest, Transport};
use crate::form::action::{ActionStatus, run_action};
use crate::form::validation::validate;
use crate::schema::field_model::{Field, FieldOption, ResponseMapping};
use crate::schema::form_model::FormSchema;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::ResolutionEvent;

// ============================================================================
// Per-field resolution state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Failed => "failed",
        }
    }
}

/// Why a field currently shows no options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyHint {
    Loading,
    AwaitingParent,
    NoOptions,
    Failed,
}

impl EmptyHint {
    pub fn message(self) -> &'static str {
        match self {
            EmptyHint::Loading => "Loading...",
            EmptyHint::AwaitingParent => "Select parent first",
            EmptyHint::NoOptions => "No options",
            EmptyHint::Failed => "Could not load options",
        }
    }
}

/// A fetch that has been started but not yet applied.
///
/// Carries everything needed to perform the request away from the session;
/// hand the result back through `FormSession::complete_resolution`.
#[derive(Debug, Clone)]
pub struct PendingResolution {
    pub field_id: String,
    pub field_name: String,
    pub generation: u64,
    pub parent_value: Option<String>,
    pub request: FetchRequest,
    pub mapping: ResponseMapping,
}

#[derive(Debug, Clone)]
pub enum BeginOutcome {
    /// A network fetch is needed
    Pending(PendingResolution),
    /// Options were available without a fetch (static source)
    Ready { count: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Loaded { field_id: String, count: usize },
    Failed { field_id: String, error: String },
    /// A newer request for the field superseded this one
    Discarded { field_id: String, generation: u64 },
}

impl ResolutionOutcome {
    pub fn field_id(&self) -> &str {
        match self {
            ResolutionOutcome::Loaded { field_id, .. }
            | ResolutionOutcome::Failed { field_id, .. }
            | ResolutionOutcome::Discarded { field_id, .. } => field_id,
        }
    }
}

/// What a single value change did to the dependent fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeReport {
    /// Fields whose value and options were cleared, in cascade order
    pub reset: Vec<String>,
    /// Direct children already loaded for the same parent value
    pub untouched: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    pub outcomes: Vec<ResolutionOutcome>,
}

// ============================================================================
// FormSession: one live instance of a form being filled in
// ============================================================================

pub struct FormSession<T: Transport> {
    schema: FormSchema,
    graph: FieldGraph,
    resolver: OptionResolver<T>,
    tracer: TraceLogger,

    values: Map<String, Value>,
    errors: BTreeMap<String, String>,
    selections: HashMap<String, FieldOption>,
    options: HashMap<String, Vec<FieldOption>>,
    status: HashMap<String, LoadStatus>,
    generations: HashMap<String, u64>,
    load_state: LoadState,
    button_status: HashMap<String, ActionStatus>,
}

impl<T: Transport> FormSession<T> {
    pub fn new(schema: FormSchema, transport: T) -> Result<Self, SessionError> {
        let graph = FieldGraph::build(&schema.fields)?;
        Ok(Self {
            schema,
            graph,
            resolver: OptionResolver::new(transport),
            tracer: TraceLogger::disabled(),
            values: Map::new(),
            errors: BTreeMap::new(),
            selections: HashMap::new(),
            options: HashMap::new(),
            status: HashMap::new(),
            generations: HashMap::new(),
            load_state: LoadState::new(),
            button_status: HashMap::new(),
        })
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn graph(&self) -> &FieldGraph {
        &self.graph
    }

    pub fn transport(&self) -> &T {
        self.resolver.transport()
    }

    pub fn field(&self, id: &str) -> Result<&Field, SessionError> {
        self.schema
            .field(id)
            .ok_or_else(|| SessionError::UnknownField(id.to_string()))
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn options(&self, field_id: &str) -> &[FieldOption] {
        self.options.get(field_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn status(&self, field_id: &str) -> LoadStatus {
        self.status.get(field_id).copied().unwrap_or_default()
    }

    pub fn is_loading(&self, field_id: &str) -> bool {
        self.status(field_id) == LoadStatus::Loading
    }

    pub fn generation(&self, field_id: &str) -> u64 {
        self.generations.get(field_id).copied().unwrap_or(0)
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn selection(&self, field_id: &str) -> Option<&FieldOption> {
        self.selections.get(field_id)
    }

    pub fn button_status(&self, field_id: &str) -> Option<&ActionStatus> {
        self.button_status.get(field_id)
    }

    pub fn empty_hint(&self, field_id: &str) -> Option<EmptyHint> {
        match self.status(field_id) {
            LoadStatus::Loading => return Some(EmptyHint::Loading),
            LoadStatus::Failed => return Some(EmptyHint::Failed),
            _ => {}
        }
        if !self.options(field_id).is_empty() {
            return None;
        }
        let dependent = self.schema.field(field_id).is_some_and(Field::is_dependent);
        if dependent && self.status(field_id) == LoadStatus::Idle {
            Some(EmptyHint::AwaitingParent)
        } else {
            Some(EmptyHint::NoOptions)
        }
    }

    // ------------------------------------------------------------------
    // Initial load
    // ------------------------------------------------------------------

    /// Populate static fields and resolve every non-dependent remote field.
    ///
    /// Fetches run concurrently; results are applied afterwards one by one.
    /// Dependent fields stay empty until a parent receives a value.
    pub fn mount(&mut self) -> Vec<ResolutionOutcome> {
        let mut pending = Vec::new();
        for id in self.graph.order().to_vec() {
            if self.schema.field(&id).is_some_and(Field::is_dependent) {
                continue;
            }
            if let Ok(BeginOutcome::Pending(p)) = self.begin_resolution(&id, None) {
                pending.push(p);
            }
        }

        let resolver = &self.resolver;
        let results: Vec<Result<Vec<FieldOption>, ResolveError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = pending
                .iter()
                .map(|p| scope.spawn(move || resolver.fetch(&p.request, &p.mapping)))
                .collect();

            handles
                .into_iter()
                .zip(&pending)
                .map(|(handle, p)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ResolveError::Aborted {
                            field: p.field_name.clone(),
                        })
                    })
                })
                .collect()
        });

        pending
            .into_iter()
            .zip(results)
            .map(|(p, result)| self.complete_resolution(p, result))
            .collect()
    }

    // ------------------------------------------------------------------
    // Cascade
    // ------------------------------------------------------------------

    /// Commit a new value for `field_id` and cascade to dependent fields.
    ///
    /// `selected` is the option the value came from, if any; when omitted it
    /// is looked up in the field's current options by value.
    pub fn change_value(
        &mut self,
        field_id: &str,
        value: Value,
        selected: Option<FieldOption>,
    ) -> Result<CascadeReport, SessionError> {
        let name = self.field(field_id)?.name.clone();

        let selected = selected.or_else(|| {
            let wanted = path::coerce_to_string(&value);
            self.options(field_id)
                .iter()
                .find(|o| o.value == wanted)
                .cloned()
        });
        match selected {
            Some(option) => {
                self.selections.insert(field_id.to_string(), option);
            }
            None => {
                self.selections.remove(field_id);
            }
        }
        self.values.insert(name.clone(), value);
        self.errors.remove(&name);

        let mut report = CascadeReport::default();
        for child_id in self.graph.children(field_id).to_vec() {
            let parent = self.parent_value_for(&child_id)?;
            let key = parent.joined();

            if parent.is_complete() && !self.load_state.should_load(&child_id, &key) {
                debug!(field = %child_id, parent = %key, "already loaded for this parent value");
                report.untouched.push(child_id);
                continue;
            }

            self.load_state.invalidate_subtree(&child_id, &self.graph);
            for id in self.graph.subtree(&child_id) {
                self.reset_field(&id);
                if !report.reset.contains(&id) {
                    report.reset.push(id);
                }
            }

            if !parent.is_complete() {
                report
                    .skipped
                    .push((child_id, SkipReason::MissingParentValue));
                continue;
            }

            self.load_state.mark_loaded(&child_id, &key);
            match self.begin_resolution(&child_id, Some(&parent))? {
                BeginOutcome::Pending(pending) => {
                    let result = self.execute(&pending);
                    report.outcomes.push(self.complete_resolution(pending, result));
                }
                BeginOutcome::Ready { .. } => {}
                BeginOutcome::Skipped(reason) => report.skipped.push((child_id, reason)),
            }
        }

        Ok(report)
    }

    /// Select one of the field's current options by its value.
    pub fn select(&mut self, field_id: &str, option_value: &str) -> Result<CascadeReport, SessionError> {
        let option = self
            .options(field_id)
            .iter()
            .find(|o| o.value == option_value)
            .cloned();
        self.change_value(field_id, Value::String(option_value.to_string()), option)
    }

    /// Start resolving a field. Static sources and skips apply immediately;
    /// remote sources return a `PendingResolution` and mark the field loading.
    pub fn begin_resolution(
        &mut self,
        field_id: &str,
        parent: Option<&ParentValue>,
    ) -> Result<BeginOutcome, SessionError> {
        let field = self.field(field_id)?;
        let field_name = field.name.clone();
        let plan = self.resolver.plan(field, parent);

        match plan {
            ResolvePlan::Static(options) => {
                let count = options.len();
                self.options.insert(field_id.to_string(), options);
                self.status.insert(field_id.to_string(), LoadStatus::Loaded);
                Ok(BeginOutcome::Ready { count })
            }
            ResolvePlan::Skip(reason) => {
                debug!(field = %field_name, reason = reason.as_str(), "resolution skipped");
                if reason != SkipReason::NoDataSource {
                    self.options.insert(field_id.to_string(), vec![]);
                    self.status.insert(field_id.to_string(), LoadStatus::Idle);
                }
                Ok(BeginOutcome::Skipped(reason))
            }
            ResolvePlan::Fetch { request, mapping } => {
                let generation = self.bump_generation(field_id);
                self.options.insert(field_id.to_string(), vec![]);
                self.status.insert(field_id.to_string(), LoadStatus::Loading);

                let parent_value = parent.map(ParentValue::joined);
                self.tracer.log(
                    &ResolutionEvent::now(field_id, &field_name, generation, LoadStatus::Loading)
                        .with_url(&request.url)
                        .with_parent(parent_value.as_deref()),
                );

                Ok(BeginOutcome::Pending(PendingResolution {
                    field_id: field_id.to_string(),
                    field_name,
                    generation,
                    parent_value,
                    request,
                    mapping,
                }))
            }
        }
    }

    /// Perform the fetch for a pending resolution without touching session state.
    pub fn execute(&self, pending: &PendingResolution) -> Result<Vec<FieldOption>, ResolveError> {
        self.resolver.fetch(&pending.request, &pending.mapping)
    }

    /// Apply a fetch result. Results for a superseded generation are dropped.
    pub fn complete_resolution(
        &mut self,
        pending: PendingResolution,
        result: Result<Vec<FieldOption>, ResolveError>,
    ) -> ResolutionOutcome {
        let PendingResolution {
            field_id,
            field_name,
            generation,
            parent_value,
            request,
            ..
        } = pending;

        if self.generation(&field_id) != generation {
            debug!(field = %field_name, generation, "discarding stale options");
            self.tracer.log(
                &ResolutionEvent::now(&field_id, &field_name, generation, self.status(&field_id))
                    .with_url(&request.url)
                    .discarded(),
            );
            return ResolutionOutcome::Discarded { field_id, generation };
        }

        match result {
            Ok(options) => {
                let count = options.len();
                self.options.insert(field_id.clone(), options);
                self.status.insert(field_id.clone(), LoadStatus::Loaded);
                self.tracer.log(
                    &ResolutionEvent::now(&field_id, &field_name, generation, LoadStatus::Loaded)
                        .with_url(&request.url)
                        .with_parent(parent_value.as_deref())
                        .with_count(count),
                );
                ResolutionOutcome::Loaded { field_id, count }
            }
            Err(e) => {
                warn!(field = %field_name, url = %request.url, error = %e, "option resolution failed");
                self.options.insert(field_id.clone(), vec![]);
                self.status.insert(field_id.clone(), LoadStatus::Failed);
                if parent_value.is_some() {
                    self.load_state.invalidate(&field_id);
                }
                self.tracer.log(
                    &ResolutionEvent::now(&field_id, &field_name, generation, LoadStatus::Failed)
                        .with_url(&request.url)
                        .with_parent(parent_value.as_deref())
                        .with_error(&e),
                );
                ResolutionOutcome::Failed {
                    field_id,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Parent ids for a dependent field, one per declared parent.
    pub fn parent_value_for(&self, child_id: &str) -> Result<ParentValue, SessionError> {
        let child = self.field(child_id)?;
        let key = child
            .dependency()
            .map(|d| d.parent_value_key())
            .unwrap_or("id");

        let parts = self
            .graph
            .parents(child_id)
            .iter()
            .map(|parent_id| self.parent_id(parent_id, key))
            .collect();
        Ok(ParentValue::from_parts(parts))
    }

    /// Selected raw item's `key`, else the option value, else the committed value.
    fn parent_id(&self, parent_id: &str, key: &str) -> String {
        let selected = self.selections.get(parent_id);

        if let Some(raw) = selected.and_then(|o| o.raw.as_ref()) {
            let from_raw = path::get_string(raw, key);
            if !from_raw.is_empty() {
                return from_raw;
            }
        }
        if let Some(option) = selected {
            if !option.value.is_empty() {
                return option.value.clone();
            }
        }

        self.schema
            .field(parent_id)
            .and_then(|p| self.values.get(&p.name))
            .map(path::coerce_to_string)
            .unwrap_or_default()
    }

    fn reset_field(&mut self, field_id: &str) {
        if let Some(field) = self.schema.field(field_id) {
            self.values.remove(&field.name);
        }
        self.selections.remove(field_id);
        self.options.insert(field_id.to_string(), vec![]);
        self.status.insert(field_id.to_string(), LoadStatus::Idle);
        self.bump_generation(field_id);
    }

    fn bump_generation(&mut self, field_id: &str) -> u64 {
        let generation = self.generations.entry(field_id.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Discard all session state. In-flight results become stale.
    pub fn reset(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.selections.clear();
        self.options.clear();
        self.status.clear();
        self.load_state.clear();
        self.button_status.clear();
        for id in self.graph.order().to_vec() {
            self.bump_generation(&id);
        }
    }

    /// Swap in an edited schema: rebuild the graph and start over.
    pub fn replace_schema(&mut self, schema: FormSchema) -> Result<(), SessionError> {
        self.graph = FieldGraph::build(&schema.fields)?;
        self.schema = schema;
        self.reset();
        Ok(())
    }

    /// Clear entered values but keep options of independent fields.
    pub fn clear_values(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.selections.clear();
        self.button_status.clear();
        self.load_state.clear();
        for id in self.graph.order().to_vec() {
            if self.graph.has_parents(&id) {
                self.reset_field(&id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation and actions
    // ------------------------------------------------------------------

    /// Recompute validation errors; true when the form is valid.
    pub fn validate(&mut self) -> bool {
        self.errors = validate(&self.schema.fields, &self.values);
        self.errors.is_empty()
    }

    /// Run a button field's configured action. `None` when it has none.
    pub fn press_button(&mut self, field_id: &str) -> Result<Option<ActionStatus>, SessionError> {
        let field = self.field(field_id)?;
        let Some(config) = field.button_api_config.as_ref() else {
            return Ok(None);
        };

        let status = run_action(self.resolver.transport(), config, &self.values);
        if let Some(status) = &status {
            self.button_status
                .insert(field_id.to_string(), status.clone());
        }
        Ok(status)
    }
}
