use std::collections::BTreeMap;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::engine::transport::HttpSettings;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-builder",
    version,
    about = "Resolve, fill and store form-builder schemas with dependent fields"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-builder.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the saved-forms store
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a schema file and print its dependency chains
    Validate {
        /// Schema file (.json, .yaml or .yml)
        #[arg(long)]
        schema: String,
    },

    /// Resolve the options of one field
    Options {
        #[arg(long)]
        schema: String,

        /// Field id or name
        #[arg(long)]
        field: String,

        /// Parent value(s) for a dependent field, in declared parent order
        #[arg(long)]
        parent: Vec<String>,
    },

    /// Load a form, apply values in order and print the resulting state
    Fill {
        #[arg(long)]
        schema: String,

        /// Value to set, as `field=value` (field id or name); repeatable
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Validate and submit after applying values
        #[arg(long, default_value_t = false)]
        submit: bool,
    },

    /// Save a schema file into the store
    Import {
        #[arg(long)]
        schema: String,

        /// Name to save under (default: the schema's own name)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List saved forms
    List,

    /// Print the submissions of a saved form
    Submissions {
        /// Saved form id
        #[arg(long)]
        form: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-builder.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    pub user_agent: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "fb-forms.json".to_string(),
        }
    }
}

/// Resolution trace; disabled unless a path is given.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_timeout() -> u64 { 30 }
fn default_store_path() -> String { "fb-forms.json".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("form-builder.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// HTTP settings from the config file, with `--timeout` taking precedence.
pub fn build_http_settings(config: &AppConfig, timeout: Option<u64>) -> HttpSettings {
    HttpSettings {
        timeout: Duration::from_secs(timeout.unwrap_or(config.http.timeout_secs)),
        user_agent: config.http.user_agent.clone(),
        default_headers: config.http.headers.clone(),
    }
}

pub fn resolve_store_path<'a>(config: &'a AppConfig, store: Option<&'a str>) -> &'a str {
    store.unwrap_or(&config.store.path)
}
