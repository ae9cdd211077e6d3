use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use narrator_core::{read_jsonl, write_jsonl, GeneratedRecord, ReferenceRecord};
use narrator_runtime::{ComparisonRun, EmbedderRegistry, EvaluatorConfig, SimilarityEvaluator};

use crate::cli::CompareArgs;

pub fn run(args: CompareArgs) -> Result<()> {
    let config = load_config(&args)?;

    let generated: Vec<GeneratedRecord> = read_jsonl(&args.generated)
        .with_context(|| format!("failed to load generated narratives from {}", args.generated.display()))?;
    let reference: Vec<ReferenceRecord> = read_jsonl(&args.reference)
        .with_context(|| format!("failed to load reference narratives from {}", args.reference.display()))?;

    let evaluator = SimilarityEvaluator::from_config(&config, &EmbedderRegistry::with_defaults())
        .context("failed to load embedding backend")?;

    let comparison = if args.sequential || config.concurrency == 1 {
        evaluator.compare_all(&generated, &reference)?
    } else {
        score_concurrently(&evaluator, &generated, &reference, config.concurrency)?
    };

    if comparison.dropped > 0 {
        warn!(
            dropped = comparison.dropped,
            "generated records had no reference narrative"
        );
    }

    write_jsonl(&args.output, &comparison.records)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let summary = serde_json::to_string_pretty(&comparison.summary())?;
    match &args.summary_path {
        Some(path) => {
            fs::write(path, summary).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote summary");
        }
        None => println!("{}", summary),
    }

    info!(
        compared = comparison.records.len(),
        output = %args.output.display(),
        "wrote comparison records"
    );
    Ok(())
}

/// Defaults, then the YAML file, then the environment, then flags.
fn load_config(args: &CompareArgs) -> Result<EvaluatorConfig> {
    let base = match &args.config {
        Some(path) => EvaluatorConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EvaluatorConfig::default(),
    };

    let mut config = base.with_env_overrides()?;
    if let Some(backend) = &args.backend {
        config.backend = backend.clone();
    }
    if let Some(model_id) = &args.model_id {
        config.model_id = model_id.clone();
    }
    if let Some(dimensions) = args.dimensions {
        config.dimensions = dimensions;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    config.validate()?;
    Ok(config)
}

fn score_concurrently(
    evaluator: &SimilarityEvaluator,
    generated: &[GeneratedRecord],
    reference: &[ReferenceRecord],
    concurrency: usize,
) -> Result<ComparisonRun> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let comparison = runtime.block_on(evaluator.compare_all_concurrent(generated, reference, concurrency))?;
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(dir: &std::path::Path) -> CompareArgs {
        CompareArgs {
            generated: dir.join("generated.jsonl"),
            reference: dir.join("reference.jsonl"),
            output: dir.join("comparison.jsonl"),
            summary_path: Some(dir.join("summary.json")),
            config: None,
            backend: None,
            model_id: None,
            dimensions: None,
            concurrency: None,
            sequential: false,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path: PathBuf = dir.path().join("narrator.yaml");
        fs::write(&config_path, "dimensions: 64\nconcurrency: 2\n").unwrap();

        let mut args = args(dir.path());
        args.config = Some(config_path);
        args.concurrency = Some(3);

        let config = load_config(&args).unwrap();
        assert_eq!(config.dimensions, 64);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.dimensions = Some(0);

        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_compare_writes_records_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("generated.jsonl"),
            "{\"Filename\":\"a.png\",\"ContrastElement\":\"oof\",\"llm_generated_explanation\":\"Blurry image.\"}\n\
             {\"Filename\":\"b.png\",\"ContrastElement\":\"bkg\",\"llm_generated_explanation\":\"Busy background.\"}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("reference.jsonl"),
            "{\"Filename\":\"a.png\",\"ContrastElement\":\"oof\",\"Description\":\"Blurry image.\"}\n",
        )
        .unwrap();

        let mut args = args(dir.path());
        args.sequential = true;
        run(args).unwrap();

        let lines = fs::read_to_string(dir.path().join("comparison.jsonl")).unwrap();
        assert_eq!(lines.lines().count(), 1);
        assert!(lines.contains("\"Similarity_Score\""));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["compared"], 1);
        assert_eq!(summary["dropped"], 1);
    }
}
