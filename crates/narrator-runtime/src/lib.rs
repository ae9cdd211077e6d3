//! # narrator-runtime
//!
//! Embedding-backed evaluation of compliance narratives.
//!
//! This crate measures how closely generated narratives match the trusted
//! reference narratives produced by `narrator-core`, and assembles the
//! few-shot prompts used to generate them.
//!
//! ## Important
//!
//! The embedding model is an injected collaborator: construct it once
//! (through [`EmbedderRegistry`] or directly), share it by reference, and
//! drop it at shutdown. There is no process-wide model state.
//!
//! Encoding failures are always surfaced as errors; they are never scored
//! as zero.
//!
//! ## Example
//!
//! ```rust,ignore
//! use narrator_runtime::{EmbedderRegistry, EvaluatorConfig, SimilarityEvaluator};
//!
//! let config = EvaluatorConfig::default().with_env_overrides()?;
//! let evaluator = SimilarityEvaluator::from_config(&config, &EmbedderRegistry::with_defaults())?;
//!
//! let run = evaluator.compare_all(&generated, &reference)?;
//! println!("mean similarity: {:?}", run.summary().mean);
//! ```

pub mod cache;
pub mod config;
pub mod embedding;
pub mod prompts;
pub mod similarity;

pub use cache::{CacheStats, CachedEmbedder};
pub use config::{ConfigError, EvaluatorConfig};
pub use embedding::{
    cosine_similarity, EmbedderFactory, EmbedderRegistry, EmbeddingError, LocalHashEmbedder,
    LocalHashEmbedderFactory, TextEmbedder,
};
pub use prompts::{PromptBuilder, PromptError, PromptRecord, SYSTEM_PROMPT};
pub use similarity::{
    ComparisonRun, ComparisonSummary, DefectStats, EmbeddingModel, EvaluationError,
    SimilarityEvaluator,
};
