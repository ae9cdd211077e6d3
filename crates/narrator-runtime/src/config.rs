//! Evaluator configuration.
//!
//! Layered lowest precedence first: defaults, an optional YAML file, then
//! `NARRATOR_*` environment variables. The CLI applies its flags last.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::{LOCAL_HASH_BACKEND, MIN_DIMENSIONS};

pub const DEFAULT_MODEL_ID: &str = "miniLM-L6-v2-local-v1";
pub const DEFAULT_MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

pub const ENV_BACKEND: &str = "NARRATOR_EMBEDDING_BACKEND";
pub const ENV_MODEL: &str = "NARRATOR_EMBEDDING_MODEL";
pub const ENV_DIMENSIONS: &str = "NARRATOR_EMBEDDING_DIM";
pub const ENV_CONCURRENCY: &str = "NARRATOR_CONCURRENCY";

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown embedding backend: '{requested}'. Available: {available:?}")]
    UnknownBackend {
        requested: String,
        available: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the similarity evaluator and its embedding backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Registered backend name (e.g. "local-hash-v1")
    pub backend: String,

    /// Stable identifier recorded in comparison summaries
    pub model_id: String,

    /// Model the backend loads or stands in for; recorded in summaries
    pub model_name: String,

    /// Embedding vector length
    pub dimensions: usize,

    /// Cached embeddings; 0 disables the cache
    pub cache_capacity: u64,

    /// Pairs scored at once in concurrent mode
    pub concurrency: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            backend: LOCAL_HASH_BACKEND.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIM,
            cache_capacity: 10_000,
            concurrency: 4,
        }
    }
}

impl EvaluatorConfig {
    /// Parse from a YAML string. Missing fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply `NARRATOR_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment-shaped).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model_id = model;
        }
        if let Some(raw) = lookup(ENV_DIMENSIONS) {
            self.dimensions = parse_number(ENV_DIMENSIONS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            self.concurrency = parse_number(ENV_CONCURRENCY, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.trim().is_empty() {
            return Err(ConfigError::Invalid("backend must not be empty".into()));
        }
        if self.dimensions < MIN_DIMENSIONS {
            return Err(ConfigError::Invalid(format!(
                "dimensions must be at least {}, got {}",
                MIN_DIMENSIONS,
                self.dimensions
            )));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} must be a positive integer, got '{}'", key, raw)))
}
