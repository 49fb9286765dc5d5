//! Configuration loading, validation, and management for Colloquy.
//!
//! Loads configuration from `~/.colloquy/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.colloquy/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the reasoning oracle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chat model
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model used by the document index
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature. 0 keeps tool-call decisions reproducible.
    #[serde(default)]
    pub temperature: f32,

    /// Iteration ceiling: maximum reasoning steps before the loop aborts
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Lookup tool configuration
    #[serde(default)]
    pub lookup: LookupConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_recursion_limit() -> u32 {
    15
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("recursion_limit", &self.recursion_limit)
            .field("database", &self.database)
            .field("lookup", &self.lookup)
            .finish()
    }
}

/// Where checkpoints and the document index live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "sqlite://colloquy.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// The shipped lookup tool's identity and search scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Tool name as presented to the oracle
    #[serde(default = "default_lookup_name")]
    pub name: String,

    /// Tool description as presented to the oracle
    #[serde(default = "default_lookup_description")]
    pub description: String,

    /// Logical collection the tool searches
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Named index within the collection
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_lookup_name() -> String {
    "employee_lookup".into()
}
fn default_lookup_description() -> String {
    "Gathers employee details from the HR database".into()
}
fn default_collection() -> String {
    "employees".into()
}
fn default_index() -> String {
    "vector_index".into()
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            name: default_lookup_name(),
            description: default_lookup_description(),
            collection: default_collection(),
            index: default_index(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.colloquy/config.toml).
    ///
    /// Also checks environment variables:
    /// - `COLLOQUY_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `COLLOQUY_MODEL` overrides the chat model
    /// - `COLLOQUY_DATABASE_URL` overrides the database URL
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("COLLOQUY_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("COLLOQUY_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("COLLOQUY_DATABASE_URL") {
            config.database.url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".colloquy")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.recursion_limit == 0 {
            return Err(ConfigError::ValidationError(
                "recursion_limit must be at least 1".into(),
            ));
        }

        if self.lookup.name.is_empty()
            || self.lookup.collection.is_empty()
            || self.lookup.index.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "lookup name, collection, and index must be non-empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: 0.0,
            recursion_limit: default_recursion_limit(),
            database: DatabaseConfig::default(),
            lookup: LookupConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.recursion_limit, 15);
        assert!(config.temperature.abs() < f32::EPSILON);
        assert_eq!(config.lookup.name, "employee_lookup");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.database.url, config.database.url);
        assert_eq!(parsed.lookup.collection, config.lookup.collection);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_recursion_limit_rejected() {
        let config = AppConfig {
            recursion_limit: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
model = "gpt-4o"
recursion_limit = 25

[lookup]
collection = "contracts"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.recursion_limit, 25);
        assert_eq!(config.lookup.collection, "contracts");
        // Untouched fields keep their defaults
        assert_eq!(config.lookup.index, "vector_index");
        assert_eq!(config.database.url, "sqlite://colloquy.db");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = 0.2\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }
}
