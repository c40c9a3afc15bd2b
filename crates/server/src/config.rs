//! # Application Configuration
//!
//! This module defines the configuration structure for the `askdb-server` and
//! the logic for loading it once at startup from an optional `config.yml` file
//! and the process environment. Nothing is validated here: missing database or
//! API settings produce an unusable connection that fails on first use.

use askdb::{
    constants::{DEFAULT_MODEL, OPENAI_CHAT_COMPLETIONS_URL},
    providers::db::postgres::build_database_url,
};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure.
///
/// Each field maps to an upper-case environment variable of the same name
/// (`db_username` ← `DB_USERNAME`, `openai_api_key` ← `OPENAI_API_KEY`, ...).
#[derive(Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub db_username: String,
    #[serde(default)]
    pub db_password: String,
    #[serde(default)]
    pub db_host: String,
    /// Kept as text so that an unset port still yields a (broken) URL.
    #[serde(default)]
    pub db_port: String,
    #[serde(default)]
    pub db_name: String,
    /// The credential for the hosted language model.
    #[serde(default)]
    pub openai_api_key: String,
    /// The chat completions endpoint. Loaded from `OPENAI_API_URL` env var.
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,
    /// The model identifier. Loaded from `GPT_MODEL` env var.
    #[serde(default = "default_gpt_model")]
    pub gpt_model: String,
}

/// Provides a default value for the `port` field if not set in the environment.
fn default_port() -> u16 {
    7860
}

fn default_openai_api_url() -> String {
    OPENAI_CHAT_COMPLETIONS_URL.to_string()
}

fn default_gpt_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl AppConfig {
    /// The PostgreSQL connection URL composed from the `DB_*` settings.
    pub fn database_url(&self) -> String {
        build_database_url(
            &self.db_username,
            &self.db_password,
            &self.db_host,
            &self.db_port,
            &self.db_name,
        )
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("db_username", &self.db_username)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("openai_api_url", &self.openai_api_url)
            .field("gpt_model", &self.gpt_model)
            .field("openai_api_key_set", &!self.openai_api_key.is_empty())
            .finish_non_exhaustive()
    }
}

// Helper to read a file, substitute `${VAR}` references, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.into_owned()))
}

/// Loads the application configuration from a file and environment variables.
///
/// Layers, lowest priority first:
/// 1. Serde defaults on `AppConfig`.
/// 2. A YAML file: `config_path_override` if given (it must exist), otherwise
///    `config.yml` next to this crate's manifest if present.
/// 3. Environment variables (`PORT`, `DB_HOST`, `OPENAI_API_KEY`, ...).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    let file_content = match config_path_override {
        Some(path) => Some(read_and_substitute(path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{path}'."))
        })?),
        None => {
            let default_path = format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"));
            let content = read_and_substitute(&default_path)?;
            if content.is_some() {
                info!("Loading configuration from '{default_path}'.");
            }
            content
        }
    };
    if let Some(content) = file_content {
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder.add_source(Environment::default()).build()?;

    Ok(settings.try_deserialize()?)
}
