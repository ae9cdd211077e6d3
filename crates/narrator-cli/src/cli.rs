use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "narrator",
    version,
    about = "Generate and evaluate OFIQ compliance narratives"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate reference descriptions from OFIQ assessments
    Describe(DescribeArgs),
    /// Score generated narratives against reference narratives
    Compare(CompareArgs),
    /// Build few-shot prompts for the text-generation step
    Prompts(PromptsArgs),
    /// Copy in-context training images into per-defect folders
    StageImages(StageImagesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    /// JSONL of {Filename, ContrastElement, OFIQResults}
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// JSONL with `llm_generated_explanation`
    #[arg(long)]
    pub generated: PathBuf,

    /// JSONL with `Description`
    #[arg(long)]
    pub reference: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Write the summary here instead of stdout
    #[arg(long)]
    pub summary_path: Option<PathBuf>,

    /// YAML evaluator config
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub backend: Option<String>,

    #[arg(long)]
    pub model_id: Option<String>,

    #[arg(long)]
    pub dimensions: Option<usize>,

    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Score pairs one at a time on the current thread
    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PromptsArgs {
    /// In-context examples: JSONL with OFIQResults, ContrastElement, Description
    #[arg(long)]
    pub train: PathBuf,

    /// Images to explain: JSONL of assessments
    #[arg(long)]
    pub test: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Replace the built-in system prompt with the contents of this file
    #[arg(long)]
    pub system_prompt: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StageImagesArgs {
    /// In-context training JSONL
    #[arg(long)]
    pub train: PathBuf,

    /// Root holding one folder per defect code (TONO release)
    #[arg(long)]
    pub defect_root: PathBuf,

    /// Folder holding compliant images (ONOT)
    #[arg(long)]
    pub compliant_root: PathBuf,

    #[arg(long)]
    pub output: PathBuf,
}
