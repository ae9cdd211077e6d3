//! Few-shot prompts for the external text-generation step.
//!
//! Prompts are laid out for cache efficiency:
//! 1. System prompt (shared by every request)
//! 2. In-context examples (shared by every request in a run)
//! 3. The image's own OFIQ scores (per request)
//!
//! Sending the prompt is left to the caller.

use std::collections::HashSet;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use narrator_core::{to_defect_code, AssessmentRecord, ReferenceRecord, ScoreReport};

/// Base instructions for the narrative model.
pub const SYSTEM_PROMPT: &str = r#"You are an AI assistant specialized in explaining face image quality defects based on OFIQ (Open Source Face Image Quality) assessment.
For each image, carefully review all OFIQ scores and select the defect specific to that image. Do not assume the same defect for all images; each image may have a different primary defect.
One defect might be a combination of multiple OFIQ scores. Only mention the scores that are correlated with the defect.
Always start by stating if the image is compliant or not. Then provide a concise description of the defect and actionable feedback for improvement.
If no significant defects are identified, state that the image is fully compliant and no specific defects were found.
Your response should be concise, professional, and easy to understand. Each image has at most one main defect."#;

/// Instruction placed between the examples and the image being explained.
pub const TASK_INSTRUCTION: &str = "Now explain if the image is compliant or not compliant for biometrics. Remember to provide Actionable Feedback. Use the examples above to guide your judgment and the format of the Description:";

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to serialize OFIQ scores for '{filename}': {source}")]
    Scores {
        filename: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A rendered prompt, written out for the generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    #[serde(rename = "Filename")]
    pub filename: String,

    #[serde(rename = "ContrastElement", skip_serializing_if = "Option::is_none")]
    pub contrast_element: Option<Value>,

    #[serde(rename = "OFIQResults")]
    pub ofiq_results: ScoreReport,

    pub prompt: String,
}

/// Builds per-image prompts around a fixed set of in-context examples.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    examples_section: String,
    example_filenames: HashSet<String>,
}

impl PromptBuilder {
    /// Render the example section once from reference records.
    pub fn new(examples: &[ReferenceRecord]) -> Result<Self, PromptError> {
        let mut examples_section = String::new();
        for example in examples {
            let scores = example.ofiq_results.clone().unwrap_or_default();
            examples_section.push_str(&format!("OFIQ Scores: {}\n", scores_json(&example.filename, &scores)?));
            examples_section.push_str(&format!(
                "Defect type: {}\n",
                to_defect_code(example.contrast_element.as_ref())
            ));
            examples_section.push_str(&format!("Description: {}\n\n", example.description));
        }

        Ok(Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            examples_section,
            example_filenames: examples.iter().map(|e| e.filename.clone()).collect(),
        })
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn examples_section(&self) -> &str {
        &self.examples_section
    }

    /// Whether `filename` is one of the in-context examples.
    pub fn is_example(&self, filename: &str) -> bool {
        self.example_filenames.contains(filename)
    }

    /// Full prompt for one image.
    pub fn build(&self, assessment: &AssessmentRecord) -> Result<String, PromptError> {
        Ok(format!(
            "{}\n\n{}{}\n\nOFIQ Scores: {}\n",
            self.system_prompt,
            self.examples_section,
            TASK_INSTRUCTION,
            scores_json(&assessment.filename, &assessment.ofiq_results)?
        ))
    }

    /// Prompts for every assessment that is not itself an example.
    pub fn build_all(&self, assessments: &[AssessmentRecord]) -> Result<Vec<PromptRecord>, PromptError> {
        let test_set: Vec<&AssessmentRecord> = assessments
            .iter()
            .filter(|a| !self.is_example(&a.filename))
            .collect();

        let excluded = assessments.len() - test_set.len();
        if excluded > 0 {
            tracing::info!(excluded, "Skipped images used as in-context examples");
        }
        if test_set.is_empty() {
            tracing::warn!("Test set is empty, no prompts to build");
        }

        test_set
            .into_iter()
            .map(|assessment| {
                Ok(PromptRecord {
                    filename: assessment.filename.clone(),
                    contrast_element: assessment.contrast_element.clone(),
                    ofiq_results: assessment.ofiq_results.clone(),
                    prompt: self.build(assessment)?,
                })
            })
            .collect()
    }
}

/// Writes `", "` and `": "` separators, the layout the example prompts use.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn scores_json(filename: &str, scores: &ScoreReport) -> Result<String, PromptError> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    scores
        .serialize(&mut serializer)
        .map_err(|source| PromptError::Scores {
            filename: filename.to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
