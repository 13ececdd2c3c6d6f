use std::path::Path;

use serde_json::Value;

use crate::cli::config::{AppConfig, build_http_settings};
use crate::engine::graph::FieldGraph;
use crate::engine::resolver::{OptionResolver, ParentValue, ResolvePlan};
use crate::engine::session::{FormSession, ResolutionOutcome};
use crate::engine::transport::{HttpTransport, Transport};
use crate::form::submit::{SubmitOutcome, submit};
use crate::schema::form_model::FormSchema;
use crate::store::form_store::FormStore;
use crate::trace::logger::TraceLogger;

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// Schema loading
// ============================================================================

/// Read a schema from JSON, or YAML when the extension is `.yaml`/`.yml`.
pub fn load_schema(path: &str) -> CmdResult<FormSchema> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let schema = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(schema)
}

/// Split `field=value` at the first `=`.
pub fn parse_assignment(raw: &str) -> CmdResult<(String, String)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", raw))?;
    if field.trim().is_empty() {
        return Err(format!("missing field name in '{}'", raw).into());
    }
    Ok((field.trim().to_string(), value.to_string()))
}

fn build_transport(config: &AppConfig, timeout: Option<u64>) -> CmdResult<HttpTransport> {
    Ok(HttpTransport::new(&build_http_settings(config, timeout))?)
}

fn build_tracer(config: &AppConfig) -> TraceLogger {
    match config.trace.path.as_deref() {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    }
}

// ============================================================================
// validate subcommand
// ============================================================================

pub fn cmd_validate(schema_path: &str) -> CmdResult<()> {
    let schema = load_schema(schema_path)?;
    let graph = FieldGraph::build(&schema.fields)?;

    println!("Form '{}' ({}): {} fields", schema.name, schema.id, schema.fields.len());

    let chains = graph.chains();
    if chains.is_empty() {
        println!("No dependent fields.");
    } else {
        println!("Dependency chains:");
        for chain in &chains {
            let names: Vec<&str> = chain
                .iter()
                .filter_map(|id| schema.field(id))
                .map(|f| f.name.as_str())
                .collect();
            println!("  {}", names.join(" -> "));
        }
    }
    Ok(())
}

// ============================================================================
// options subcommand
// ============================================================================

pub fn cmd_options(
    schema_path: &str,
    field_key: &str,
    parents: &[String],
    config: &AppConfig,
    timeout: Option<u64>,
) -> CmdResult<()> {
    let schema = load_schema(schema_path)?;
    let field = schema
        .find_field(field_key)
        .ok_or_else(|| format!("no field '{}' in schema", field_key))?;

    let resolver = OptionResolver::new(build_transport(config, timeout)?);
    let parent = (!parents.is_empty()).then(|| ParentValue::from_parts(parents.to_vec()));

    let options = match resolver.plan(field, parent.as_ref()) {
        ResolvePlan::Static(options) => options,
        ResolvePlan::Fetch { request, mapping } => {
            println!("{} {}", request.method.as_str(), request.url);
            resolver.fetch(&request, &mapping)?
        }
        ResolvePlan::Skip(reason) => {
            println!("Skipped: {}", reason.as_str());
            return Ok(());
        }
    };

    println!("{} options:", options.len());
    for option in &options {
        println!("  {} = {}", option.value, option.label);
    }
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

pub fn cmd_fill(
    schema_path: &str,
    assignments: &[String],
    do_submit: bool,
    store_path: &str,
    config: &AppConfig,
    timeout: Option<u64>,
) -> CmdResult<()> {
    let schema = load_schema(schema_path)?;
    let transport = build_transport(config, timeout)?;
    let mut session = FormSession::new(schema, transport)?.with_tracer(build_tracer(config));

    report_outcomes(&session.mount());

    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        let field_id = session
            .schema()
            .find_field(&key)
            .map(|f| f.id.clone())
            .ok_or_else(|| format!("no field '{}' in schema", key))?;

        let report = session.change_value(&field_id, Value::String(value), None)?;
        for (id, reason) in &report.skipped {
            eprintln!("  {} skipped: {}", id, reason.as_str());
        }
        report_outcomes(&report.outcomes);
    }

    print_state(&session);

    if do_submit {
        let mut store = FormStore::open(store_path)?;
        match submit(&mut session, Some(&mut store), config.http.user_agent.as_deref())? {
            SubmitOutcome::Invalid(errors) => {
                println!("Validation failed:");
                for (name, message) in &errors {
                    println!("  {}: {}", name, message);
                }
                std::process::exit(1);
            }
            SubmitOutcome::Accepted { submission, forwarded } => {
                match submission {
                    Some(s) => println!("Stored submission {}", s.id),
                    None => println!("Submission accepted"),
                }
                if let Some(status) = forwarded {
                    println!("Forwarded to submit URL (HTTP {})", status);
                }
            }
        }
    }
    Ok(())
}

fn report_outcomes(outcomes: &[ResolutionOutcome]) {
    for outcome in outcomes {
        match outcome {
            ResolutionOutcome::Loaded { field_id, count } => {
                eprintln!("  {} loaded {} options", field_id, count)
            }
            ResolutionOutcome::Failed { field_id, error } => {
                eprintln!("  {} failed: {}", field_id, error)
            }
            ResolutionOutcome::Discarded { .. } => {}
        }
    }
}

fn print_state<T: Transport>(session: &FormSession<T>) {
    for field in &session.schema().fields {
        if !field.field_type.collects_value() {
            continue;
        }
        let value = session
            .value(&field.name)
            .map(crate::engine::path::coerce_to_string)
            .unwrap_or_default();
        let options = session.options(&field.id);
        let detail = match session.empty_hint(&field.id) {
            Some(hint) if field.data_source.is_some() || field.options.is_some() => {
                hint.message().to_string()
            }
            Some(_) => String::new(),
            None => format!("{} options", options.len()),
        };
        println!(
            "  [{}] {} = {:?} {}",
            field.field_type.as_str(),
            field.name,
            value,
            detail
        );
    }
}

// ============================================================================
// store subcommands
// ============================================================================

pub fn cmd_import(
    schema_path: &str,
    name: Option<&str>,
    description: Option<&str>,
    store_path: &str,
) -> CmdResult<()> {
    let schema = load_schema(schema_path)?;
    FieldGraph::build(&schema.fields)?;

    let mut store = FormStore::open(store_path)?;
    let name = name.unwrap_or(&schema.name).to_string();
    let description = description.unwrap_or(&schema.description).to_string();
    let saved = store.save_form(&schema, &name, &description)?;

    println!("Saved '{}' as {} in {}", saved.schema.name, saved.schema.id, store_path);
    Ok(())
}

pub fn cmd_list(store_path: &str) -> CmdResult<()> {
    let store = FormStore::open(store_path)?;
    if store.forms().is_empty() {
        println!("No saved forms in {}", store_path);
        return Ok(());
    }
    for form in store.forms() {
        println!(
            "{}  {}  ({} fields, {} submissions, updated {})",
            form.schema.id,
            form.schema.name,
            form.schema.fields.len(),
            form.submissions.len(),
            form.schema.updated_at
        );
    }
    Ok(())
}

pub fn cmd_submissions(form_id: &str, store_path: &str) -> CmdResult<()> {
    let store = FormStore::open(store_path)?;
    let form = store
        .get(form_id)
        .ok_or_else(|| format!("no saved form with id '{}'", form_id))?;

    println!("{} submissions for '{}'", form.submissions.len(), form.schema.name);
    for submission in &form.submissions {
        println!(
            "{}  {}  {}",
            submission.id,
            submission.submitted_at,
            Value::Object(submission.data.clone())
        );
    }
    Ok(())
}
