//! Factory pattern for embedding backends.
//!
//! A real model backend registers a factory under its name; the evaluator
//! resolves `EvaluatorConfig::backend` through the registry, so adding a
//! backend never touches the evaluator.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = EmbedderRegistry::with_defaults();
//! registry.register(Arc::new(MyOnnxFactory));
//!
//! let embedder = registry.create(&config)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{LocalHashEmbedder, TextEmbedder, LOCAL_HASH_BACKEND};
use crate::config::{ConfigError, EvaluatorConfig};

/// Creates embedders from configuration.
pub trait EmbedderFactory: Send + Sync {
    /// Unique backend name, matched against `EvaluatorConfig::backend`.
    fn backend(&self) -> &'static str;

    /// Create (load) an embedder. Called once per process.
    fn create(&self, config: &EvaluatorConfig) -> Result<Arc<dyn TextEmbedder>, ConfigError>;
}

/// Factory for the built-in [`LocalHashEmbedder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHashEmbedderFactory;

impl EmbedderFactory for LocalHashEmbedderFactory {
    fn backend(&self) -> &'static str {
        LOCAL_HASH_BACKEND
    }

    fn create(&self, config: &EvaluatorConfig) -> Result<Arc<dyn TextEmbedder>, ConfigError> {
        config.validate()?;
        Ok(Arc::new(LocalHashEmbedder::new(
            config.model_id.clone(),
            config.dimensions,
        )))
    }
}

/// Registry of available embedding backends.
#[derive(Default)]
pub struct EmbedderRegistry {
    factories: BTreeMap<String, Arc<dyn EmbedderFactory>>,
}

impl EmbedderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in backends registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LocalHashEmbedderFactory));
        registry
    }

    /// Register a factory, replacing any with the same backend name.
    pub fn register(&mut self, factory: Arc<dyn EmbedderFactory>) {
        self.factories.insert(factory.backend().to_string(), factory);
    }

    /// Create the embedder named by `config.backend`.
    pub fn create(&self, config: &EvaluatorConfig) -> Result<Arc<dyn TextEmbedder>, ConfigError> {
        let factory = self
            .factories
            .get(&config.backend)
            .ok_or_else(|| ConfigError::UnknownBackend {
                requested: config.backend.clone(),
                available: self.available_backends().iter().map(|s| s.to_string()).collect(),
            })?;

        let embedder = factory.create(config)?;
        tracing::info!(
            backend = factory.backend(),
            model = embedder.name(),
            dimensions = embedder.dimensions(),
            "Embedding backend loaded"
        );
        Ok(embedder)
    }

    /// List registered backend names.
    pub fn available_backends(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_backend(&self, backend: &str) -> bool {
        self.factories.contains_key(backend)
    }
}

impl std::fmt::Debug for EmbedderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedderRegistry")
            .field("backends", &self.available_backends())
            .finish()
    }
}
