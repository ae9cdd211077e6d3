//! # narrator-core
//!
//! Deterministic compliance narratives for OFIQ face-image quality reports.
//!
//! This crate turns a defect classification and a score report into a
//! human-readable narrative, and joins generated narratives with trusted
//! reference narratives for evaluation.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same (defect code, report) always produces the same text
//! 2. **Total**: Any code and any report, even empty, yield a non-empty narrative
//! 3. **No model calls**: Similarity scoring lives in `narrator-runtime`
//! 4. **No fabricated matches**: Unmatched keys are dropped, never padded
//!
//! ## Example
//!
//! ```rust
//! use narrator_core::{describe, ScoreReport};
//! use serde_json::json;
//!
//! let report: ScoreReport = [("BackgroundUniformity.scalar", 12.0)].into_iter().collect();
//! let text = describe(Some(&json!("bkg")), &report);
//!
//! assert!(text.contains("background is not uniform"));
//! ```

pub mod aligner;
pub mod defect;
pub mod generator;
pub mod narrative;
pub mod records;
pub mod report;

// Re-export main types at crate root
pub use aligner::{align, Alignment};
pub use defect::{to_defect_code, DefectCode};
pub use generator::{NarrativeGenerator, COMPLIANT_STATEMENT, NON_COMPLIANT_OPENING};
pub use narrative::{Narrative, FEEDBACK_MARKER};
pub use records::{
    parse_jsonl, read_jsonl, write_jsonl, AssessmentRecord, ComparisonRecord, GeneratedRecord,
    Keyed, RecordError, ReferenceRecord,
};
pub use report::{metrics, Scalar, ScoreReport};

use serde_json::Value;

/// Render the narrative for a raw `ContrastElement` value.
///
/// The raw value goes through [`to_defect_code`] first, so null, NaN and
/// `"none"` all produce the compliant narrative.
pub fn describe(raw_code: Option<&Value>, report: &ScoreReport) -> String {
    NarrativeGenerator::new().describe(&to_defect_code(raw_code), report)
}

/// Produce reference records for a batch of assessed images.
///
/// Each record keeps its filename, raw label and scores, and gains a
/// `Description` generated from them.
pub fn describe_assessments(assessments: &[AssessmentRecord]) -> Vec<ReferenceRecord> {
    let generator = NarrativeGenerator::new();

    let references: Vec<ReferenceRecord> = assessments
        .iter()
        .map(|assessment| ReferenceRecord {
            filename: assessment.filename.clone(),
            contrast_element: assessment.contrast_element.clone(),
            ofiq_results: Some(assessment.ofiq_results.clone()),
            description: generator.describe(&assessment.defect_code(), &assessment.ofiq_results),
        })
        .collect();

    let unknown = assessments
        .iter()
        .filter(|assessment| assessment.defect_code().is_unknown())
        .count();
    if unknown > 0 {
        tracing::warn!(unknown, "Assessments carry unclassified defect codes");
    }
    tracing::info!(count = references.len(), "Generated reference descriptions");

    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_sentinels() {
        let report = ScoreReport::new();
        let expected = describe(None, &report);
        assert_eq!(expected, COMPLIANT_STATEMENT);
        assert_eq!(describe(Some(&Value::Null), &report), expected);
        assert_eq!(describe(Some(&json!("none")), &report), expected);
        assert_eq!(describe(Some(&json!("NONE")), &report), expected);
        assert_eq!(describe(Some(&json!("nan")), &report), expected);
    }

    #[test]
    fn test_describe_assessments() {
        let assessments: Vec<AssessmentRecord> = parse_jsonl(std::io::Cursor::new(
            r#"{"Filename":"tono/oof/1.png","ContrastElement":"oof","OFIQResults":{"Sharpness.scalar":7}}
{"Filename":"onot/2.png","ContrastElement":"ONOT","OFIQResults":{}}
"#,
        ))
        .unwrap();

        let references = describe_assessments(&assessments);

        assert_eq!(references.len(), 2);
        assert_eq!(references[0].filename, "tono/oof/1.png");
        assert!(references[0].description.contains("(Sharpness.scalar: 7)"));
        assert!(references[0].description.contains("Actionable Feedback:"));
        assert_eq!(references[1].description, COMPLIANT_STATEMENT);
        assert_eq!(references[1].contrast_element, Some(json!("ONOT")));
    }

    #[test]
    fn test_aligned_reference_pairs() {
        let generated: Vec<GeneratedRecord> = parse_jsonl(std::io::Cursor::new(
            "{\"Filename\":\"a\",\"llm_generated_explanation\":\"x\"}\n{\"Filename\":\"b\",\"llm_generated_explanation\":\"y\"}\n",
        ))
        .unwrap();
        let reference: Vec<ReferenceRecord> = parse_jsonl(std::io::Cursor::new(
            "{\"Filename\":\"b\",\"Description\":\"rb\"}\n{\"Filename\":\"c\",\"Description\":\"rc\"}\n",
        ))
        .unwrap();

        let alignment = align(&generated, &reference);
        assert_eq!(alignment.len(), 1);
        assert_eq!(alignment.pairs[0].0.explanation, "y");
        assert_eq!(alignment.pairs[0].1.description, "rb");
        assert_eq!(alignment.dropped, 1);
    }
}
