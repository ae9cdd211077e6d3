//! Similarity Evaluator
//!
//! Scores how closely a generated narrative matches its reference:
//! both texts go through the same shared embedder, then cosine similarity.
//!
//! Batch mode aligns the two collections first (inner join on `Filename`)
//! and scores every matched pair. Any encoding failure aborts the batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use narrator_core::{align, ComparisonRecord, GeneratedRecord, ReferenceRecord};

use crate::cache::CachedEmbedder;
use crate::config::{ConfigError, EvaluatorConfig};
use crate::embedding::{cosine_similarity, EmbedderRegistry, EmbeddingError, TextEmbedder};

/// Errors from similarity evaluation.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Encoding failed for '{key}': {source}")]
    Encoding {
        key: String,
        #[source]
        source: EmbeddingError,
    },

    #[error("Scoring task failed: {0}")]
    Task(String),
}

impl EvaluationError {
    fn encoding(key: &str, source: EmbeddingError) -> Self {
        Self::Encoding {
            key: key.to_string(),
            source,
        }
    }
}

/// The embedding that produced a run's scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub backend: String,
    pub model_id: String,
    pub model_name: Option<String>,
    pub dimensions: usize,
}

impl EmbeddingModel {
    fn from_embedder(embedder: &dyn TextEmbedder) -> Self {
        Self {
            backend: embedder.name().to_string(),
            model_id: embedder.name().to_string(),
            model_name: None,
            dimensions: embedder.dimensions(),
        }
    }

    fn from_config(config: &EvaluatorConfig, embedder: &dyn TextEmbedder) -> Self {
        Self {
            backend: config.backend.clone(),
            model_id: config.model_id.clone(),
            model_name: Some(config.model_name.clone()),
            dimensions: embedder.dimensions(),
        }
    }
}

/// Scores narrative pairs with a shared embedder.
///
/// Cloning is cheap and shares the embedder.
#[derive(Clone)]
pub struct SimilarityEvaluator {
    embedder: Arc<dyn TextEmbedder>,
    model: EmbeddingModel,
}

impl SimilarityEvaluator {
    /// Wrap an already-loaded embedder. The caller owns its lifecycle.
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        let model = EmbeddingModel::from_embedder(embedder.as_ref());
        Self { embedder, model }
    }

    /// Resolve the configured backend and wrap it in a cache when enabled.
    pub fn from_config(
        config: &EvaluatorConfig,
        registry: &EmbedderRegistry,
    ) -> Result<Self, ConfigError> {
        let embedder = registry.create(config)?;
        let model = EmbeddingModel::from_config(config, embedder.as_ref());
        let embedder: Arc<dyn TextEmbedder> = if config.cache_capacity > 0 {
            Arc::new(CachedEmbedder::new(embedder, config.cache_capacity))
        } else {
            embedder
        };
        Ok(Self { embedder, model })
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    pub fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    /// Cosine similarity of the two texts' embeddings.
    pub fn score(&self, left: &str, right: &str) -> Result<f64, EmbeddingError> {
        let left = self.embedder.embed(left)?;
        let right = self.embedder.embed(right)?;
        cosine_similarity(&left, &right)
    }

    /// Align and score every matched pair, in generated-record order.
    pub fn compare_all(
        &self,
        generated: &[GeneratedRecord],
        reference: &[ReferenceRecord],
    ) -> Result<ComparisonRun, EvaluationError> {
        let alignment = align(generated, reference);

        let mut records = Vec::with_capacity(alignment.len());
        for (generated, reference) in &alignment.pairs {
            let similarity = self
                .score(&generated.explanation, &reference.description)
                .map_err(|source| EvaluationError::encoding(&generated.filename, source))?;
            records.push(ComparisonRecord::from_pair(generated, reference, similarity));
        }

        let run = ComparisonRun {
            records,
            dropped: alignment.dropped,
            duplicate_reference_keys: alignment.duplicate_reference_keys,
            model: self.model.clone(),
        };
        run.log_completion();
        Ok(run)
    }

    /// Like [`compare_all`](Self::compare_all), scoring up to `concurrency`
    /// pairs at once on the blocking pool. Output order is unchanged.
    pub async fn compare_all_concurrent(
        &self,
        generated: &[GeneratedRecord],
        reference: &[ReferenceRecord],
        concurrency: usize,
    ) -> Result<ComparisonRun, EvaluationError> {
        let alignment = align(generated, reference);

        let jobs: Vec<(String, String)> = alignment
            .pairs
            .iter()
            .map(|(g, r)| (g.explanation.clone(), r.description.clone()))
            .collect();

        let scores: Vec<_> = stream::iter(jobs)
            .map(|(left, right)| {
                let evaluator = self.clone();
                tokio::task::spawn_blocking(move || evaluator.score(&left, &right))
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut records = Vec::with_capacity(alignment.len());
        for ((generated, reference), joined) in alignment.pairs.iter().zip(scores) {
            let similarity = joined
                .map_err(|e| EvaluationError::Task(e.to_string()))?
                .map_err(|source| EvaluationError::encoding(&generated.filename, source))?;
            records.push(ComparisonRecord::from_pair(generated, reference, similarity));
        }

        let run = ComparisonRun {
            records,
            dropped: alignment.dropped,
            duplicate_reference_keys: alignment.duplicate_reference_keys,
            model: self.model.clone(),
        };
        run.log_completion();
        Ok(run)
    }
}

impl std::fmt::Debug for SimilarityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEvaluator")
            .field("embedder", &self.embedder.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Output of one batch evaluation.
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    /// One record per matched pair, in generated-record order.
    pub records: Vec<ComparisonRecord>,

    /// Generated records with no reference partner.
    pub dropped: usize,

    /// Reference records ignored under the first-match policy.
    pub duplicate_reference_keys: usize,

    pub model: EmbeddingModel,
}

impl ComparisonRun {
    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary::from_run(self)
    }

    fn log_completion(&self) {
        tracing::info!(
            compared = self.records.len(),
            dropped = self.dropped,
            duplicates = self.duplicate_reference_keys,
            "Similarity evaluation complete"
        );
    }
}

/// Per-defect similarity statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectStats {
    pub count: usize,
    pub mean: f64,
}

/// Aggregate statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub compared: usize,
    pub dropped: usize,
    pub duplicate_reference_keys: usize,
    pub model: EmbeddingModel,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub by_defect: BTreeMap<String, DefectStats>,
    pub generated_at: DateTime<Utc>,
}

impl ComparisonSummary {
    fn from_run(run: &ComparisonRun) -> Self {
        let scores: Vec<f64> = run.records.iter().map(|r| r.similarity).collect();

        let overall = mean(&scores);
        let min = scores.iter().copied().reduce(f64::min);
        let max = scores.iter().copied().reduce(f64::max);

        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in &run.records {
            grouped
                .entry(defect_label(&record.contrast_element))
                .or_default()
                .push(record.similarity);
        }
        let by_defect = grouped
            .into_iter()
            .filter_map(|(label, values)| {
                mean(&values).map(|mean| {
                    (
                        label,
                        DefectStats {
                            count: values.len(),
                            mean,
                        },
                    )
                })
            })
            .collect();

        Self {
            compared: run.records.len(),
            dropped: run.dropped,
            duplicate_reference_keys: run.duplicate_reference_keys,
            model: run.model.clone(),
            mean: overall,
            min,
            max,
            by_defect,
            generated_at: Utc::now(),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn defect_label(raw: &Value) -> String {
    match raw {
        Value::String(label) => label.clone(),
        other => other.to_string(),
    }
}
