use std::time::Duration;

use clap::Parser;
use form_builder::cli::commands::{cmd_import, load_schema, parse_assignment};
use form_builder::cli::config::{
    AppConfig, Cli, Commands, build_http_settings, load_config, resolve_store_path,
};
use form_builder::cli::logging::default_directive;
use form_builder::store::form_store::FormStore;

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_validate() {
    let cli = Cli::parse_from(["form-builder", "validate", "--schema", "form.json"]);
    match cli.command {
        Commands::Validate { schema } => assert_eq!(schema, "form.json"),
        _ => panic!("Expected Validate command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.timeout.is_none());
}

#[test]
fn cli_parse_options_with_parents() {
    let cli = Cli::parse_from([
        "form-builder",
        "options",
        "--schema",
        "form.yaml",
        "--field",
        "city",
        "--parent",
        "5",
        "--parent",
        "9",
    ]);
    match cli.command {
        Commands::Options {
            schema,
            field,
            parent,
        } => {
            assert_eq!(schema, "form.yaml");
            assert_eq!(field, "city");
            assert_eq!(parent, ["5", "9"]);
        }
        _ => panic!("Expected Options command"),
    }
}

#[test]
fn cli_parse_fill_with_globals() {
    let cli = Cli::parse_from([
        "form-builder",
        "fill",
        "--schema",
        "form.json",
        "--set",
        "country=1",
        "--set",
        "email=a@b.c",
        "--submit",
        "-vv",
        "--store",
        "/tmp/forms.json",
        "--timeout",
        "5",
    ]);
    match cli.command {
        Commands::Fill {
            schema,
            set,
            submit,
        } => {
            assert_eq!(schema, "form.json");
            assert_eq!(set, ["country=1", "email=a@b.c"]);
            assert!(submit);
        }
        _ => panic!("Expected Fill command"),
    }
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.store.as_deref(), Some("/tmp/forms.json"));
    assert_eq!(cli.timeout, Some(5));
}

#[test]
fn cli_parse_store_commands() {
    let cli = Cli::parse_from(["form-builder", "list"]);
    assert!(matches!(cli.command, Commands::List));

    let cli = Cli::parse_from(["form-builder", "submissions", "--form", "form_1"]);
    match cli.command {
        Commands::Submissions { form } => assert_eq!(form, "form_1"),
        _ => panic!("Expected Submissions command"),
    }

    let cli = Cli::parse_from(["form-builder", "import", "--schema", "a.json", "--name", "A"]);
    match cli.command {
        Commands::Import {
            schema,
            name,
            description,
        } => {
            assert_eq!(schema, "a.json");
            assert_eq!(name.as_deref(), Some("A"));
            assert!(description.is_none());
        }
        _ => panic!("Expected Import command"),
    }
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["form-builder"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.http.timeout_secs, 30);
    assert!(config.http.user_agent.is_none());
    assert_eq!(config.store.path, "fb-forms.json");
    assert!(config.trace.path.is_none());
}

#[test]
fn config_load_missing_file_returns_defaults() {
    let config = load_config(Some("/nonexistent/form-builder.yaml"));
    assert_eq!(config.http.timeout_secs, 30);
}

#[test]
fn config_load_partial_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form-builder.yaml");
    std::fs::write(
        &path,
        "http:\n  timeout_secs: 7\n  headers:\n    X-Api-Key: secret\ntrace:\n  path: trace.jsonl\n",
    )
    .unwrap();

    let config = load_config(path.to_str());

    assert_eq!(config.http.timeout_secs, 7);
    assert_eq!(
        config.http.headers.get("X-Api-Key").map(String::as_str),
        Some("secret")
    );
    assert_eq!(config.store.path, "fb-forms.json");
    assert_eq!(config.trace.path.as_deref(), Some("trace.jsonl"));
}

#[test]
fn config_load_malformed_yaml_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "http: [unclosed").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.http.timeout_secs, 30);
}

#[test]
fn cli_flags_override_config() {
    let mut config = AppConfig::default();
    config.http.timeout_secs = 7;
    config.http.user_agent = Some("fb/1".into());
    config.store.path = "configured.json".into();

    let settings = build_http_settings(&config, Some(3));
    assert_eq!(settings.timeout, Duration::from_secs(3));
    assert_eq!(settings.user_agent.as_deref(), Some("fb/1"));
    assert_eq!(build_http_settings(&config, None).timeout, Duration::from_secs(7));

    assert_eq!(resolve_store_path(&config, Some("flag.json")), "flag.json");
    assert_eq!(resolve_store_path(&config, None), "configured.json");
}

#[test]
fn verbosity_maps_to_filter_directive() {
    assert_eq!(default_directive(0), "warn");
    assert_eq!(default_directive(1), "info");
    assert_eq!(default_directive(2), "debug");
    assert_eq!(default_directive(9), "trace");
}

// ============================================================================
// Command helpers
// ============================================================================

#[test]
fn parse_assignment_splits_at_first_equals() {
    assert_eq!(
        parse_assignment("note=a=b").unwrap(),
        ("note".to_string(), "a=b".to_string())
    );
    assert_eq!(
        parse_assignment("country=").unwrap(),
        ("country".to_string(), String::new())
    );
    assert!(parse_assignment("novalue").is_err());
    assert!(parse_assignment("=1").is_err());
}

#[test]
fn load_schema_reads_json_and_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let schema = common::geo_schema();

    let json_path = dir.path().join("geo.json");
    std::fs::write(&json_path, serde_json::to_string(&schema).unwrap()).unwrap();
    let yaml_path = dir.path().join("geo.YML");
    std::fs::write(&yaml_path, serde_yaml::to_string(&schema).unwrap()).unwrap();

    let from_json = load_schema(json_path.to_str().unwrap()).unwrap();
    let from_yaml = load_schema(yaml_path.to_str().unwrap()).unwrap();

    assert_eq!(from_json, schema);
    assert_eq!(from_yaml, schema);
}

#[test]
fn import_saves_schema_into_store() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("geo.json");
    std::fs::write(
        &schema_path,
        serde_json::to_string(&common::geo_schema()).unwrap(),
    )
    .unwrap();
    let store_path = dir.path().join("forms.json");

    cmd_import(
        schema_path.to_str().unwrap(),
        Some("Imported"),
        None,
        store_path.to_str().unwrap(),
    )
    .unwrap();

    let store = FormStore::open(&store_path).unwrap();
    let saved = store.get("form_geo").unwrap();
    assert_eq!(saved.schema.name, "Imported");
    assert_eq!(saved.schema.fields.len(), 4);
}
