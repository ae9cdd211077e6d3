use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use narrator_core::{read_jsonl, write_jsonl, AssessmentRecord, ReferenceRecord};
use narrator_runtime::PromptBuilder;

use crate::cli::PromptsArgs;

pub fn run(args: PromptsArgs) -> Result<()> {
    let examples: Vec<ReferenceRecord> = read_jsonl(&args.train)
        .with_context(|| format!("failed to load examples from {}", args.train.display()))?;
    if examples.is_empty() {
        warn!(path = %args.train.display(), "no in-context examples found");
    }

    let test_set: Vec<AssessmentRecord> = read_jsonl(&args.test)
        .with_context(|| format!("failed to load test set from {}", args.test.display()))?;

    let mut builder = PromptBuilder::new(&examples)?;
    if let Some(path) = &args.system_prompt {
        let system_prompt = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        builder = builder.with_system_prompt(system_prompt.trim_end());
    }

    let prompts = builder.build_all(&test_set)?;

    write_jsonl(&args.output, &prompts)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        examples = examples.len(),
        prompts = prompts.len(),
        output = %args.output.display(),
        "wrote prompts"
    );
    Ok(())
}
