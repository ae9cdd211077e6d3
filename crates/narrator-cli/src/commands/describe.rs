use anyhow::{Context, Result};
use tracing::info;

use narrator_core::{describe_assessments, read_jsonl, write_jsonl, AssessmentRecord};

use crate::cli::DescribeArgs;

pub fn run(args: DescribeArgs) -> Result<()> {
    let assessments: Vec<AssessmentRecord> = read_jsonl(&args.input)
        .with_context(|| format!("failed to load assessments from {}", args.input.display()))?;

    let references = describe_assessments(&assessments);

    write_jsonl(&args.output, &references)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        count = references.len(),
        output = %args.output.display(),
        "wrote reference descriptions"
    );
    Ok(())
}
