//! Line-delimited JSON records exchanged with the surrounding pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::defect::{to_defect_code, DefectCode};
use crate::report::ScoreReport;

/// Errors raised while reading or writing JSONL files.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to access record file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A record that can be joined on its key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// One assessed image: its OFIQ scores and the dataset's defect label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(rename = "Filename")]
    pub filename: String,

    /// Raw label, kept untouched (may be null, absent or a string).
    #[serde(
        rename = "ContrastElement",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub contrast_element: Option<Value>,

    #[serde(rename = "OFIQResults", default)]
    pub ofiq_results: ScoreReport,
}

impl AssessmentRecord {
    pub fn defect_code(&self) -> DefectCode {
        to_defect_code(self.contrast_element.as_ref())
    }
}

/// A trusted narrative, as produced by the rule-based generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    #[serde(rename = "Filename")]
    pub filename: String,

    #[serde(
        rename = "ContrastElement",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub contrast_element: Option<Value>,

    #[serde(
        rename = "OFIQResults",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ofiq_results: Option<ScoreReport>,

    #[serde(rename = "Description", default)]
    pub description: String,
}

/// A narrative produced by the external text-generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecord {
    #[serde(rename = "Filename")]
    pub filename: String,

    #[serde(
        rename = "ContrastElement",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub contrast_element: Option<Value>,

    #[serde(
        rename = "OFIQResults",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ofiq_results: Option<ScoreReport>,

    #[serde(rename = "llm_generated_explanation", default)]
    pub explanation: String,
}

/// Similarity of one generated narrative against its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    #[serde(rename = "Filename")]
    pub filename: String,

    #[serde(rename = "ContrastElement")]
    pub contrast_element: Value,

    #[serde(rename = "LLM_Description")]
    pub generated: String,

    #[serde(rename = "Reference_Description")]
    pub reference: String,

    #[serde(rename = "Similarity_Score")]
    pub similarity: f64,
}

impl ComparisonRecord {
    /// Build from an aligned pair. An absent defect label becomes `""`.
    pub fn from_pair(generated: &GeneratedRecord, reference: &ReferenceRecord, similarity: f64) -> Self {
        Self {
            filename: generated.filename.clone(),
            contrast_element: generated
                .contrast_element
                .clone()
                .unwrap_or_else(|| Value::String(String::new())),
            generated: generated.explanation.clone(),
            reference: reference.description.clone(),
            similarity,
        }
    }
}

impl Keyed for AssessmentRecord {
    fn key(&self) -> &str {
        &self.filename
    }
}

impl Keyed for ReferenceRecord {
    fn key(&self) -> &str {
        &self.filename
    }
}

impl Keyed for GeneratedRecord {
    fn key(&self) -> &str {
        &self.filename
    }
}

// Keeps an explicit `null` as `Some(Value::Null)` so it is passed through.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Parse JSONL from a reader, skipping blank lines.
pub fn parse_jsonl<T: DeserializeOwned, R: BufRead>(reader: R) -> Result<Vec<T>, RecordError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| RecordError::Line {
            line: index + 1,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|source| RecordError::Json {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read every record of a JSONL file.
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, RecordError> {
    let file = File::open(path.as_ref())?;
    let records = parse_jsonl(BufReader::new(file))?;
    tracing::debug!(path = %path.as_ref().display(), count = records.len(), "Loaded records");
    Ok(records)
}

/// Write records as one compact JSON object per line.
pub fn write_jsonl<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), RecordError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for record in records {
        let line = serde_json::to_string(record).map_err(RecordError::Serialize)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_parse_skips_blank_lines() {
        let input = "{\"Filename\":\"a.jpg\",\"Description\":\"x\"}\n\n  \n{\"Filename\":\"b.jpg\"}\n";
        let records: Vec<ReferenceRecord> = parse_jsonl(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "x");
        assert_eq!(records[1].description, "");
    }

    #[test]
    fn test_parse_reports_line_number() {
        let input = "{\"Filename\":\"a.jpg\"}\n\nnot json\n";
        let err = parse_jsonl::<ReferenceRecord, _>(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, RecordError::Json { line: 3, .. }));
    }

    #[test]
    fn test_invalid_utf8_reports_line_number() {
        let input: &[u8] = b"{\"Filename\":\"a.jpg\"}\n\xff\xfe\n";
        let err = parse_jsonl::<ReferenceRecord, _>(Cursor::new(input)).unwrap_err();
        match err {
            RecordError::Line { line, source } => {
                assert_eq!(line, 2);
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
            }
            other => panic!("Expected Line error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_filename_is_rejected() {
        let err = parse_jsonl::<GeneratedRecord, _>(Cursor::new("{\"llm_generated_explanation\":\"x\"}"))
            .unwrap_err();
        assert!(matches!(err, RecordError::Json { line: 1, .. }));
    }

    #[test]
    fn test_assessment_defect_code() {
        let record: AssessmentRecord = serde_json::from_value(json!({
            "Filename": "img.png",
            "ContrastElement": null,
            "OFIQResults": {"Sharpness.scalar": 10}
        }))
        .unwrap();
        assert!(record.defect_code().is_compliant());
        assert_eq!(record.ofiq_results.get("Sharpness.scalar"), Some(10.0));
    }

    #[test]
    fn test_null_label_is_passed_through() {
        let record: GeneratedRecord =
            serde_json::from_str(r#"{"Filename":"a.jpg","ContrastElement":null}"#).unwrap();
        assert_eq!(record.contrast_element, Some(Value::Null));

        let record: GeneratedRecord = serde_json::from_str(r#"{"Filename":"a.jpg"}"#).unwrap();
        assert_eq!(record.contrast_element, None);
    }

    #[test]
    fn test_comparison_record_field_names() {
        let generated = GeneratedRecord {
            filename: "a.jpg".into(),
            contrast_element: None,
            ofiq_results: None,
            explanation: "gen".into(),
        };
        let reference = ReferenceRecord {
            filename: "a.jpg".into(),
            contrast_element: Some(json!("oof")),
            ofiq_results: None,
            description: "ref".into(),
        };
        let value = serde_json::to_value(ComparisonRecord::from_pair(&generated, &reference, 0.5)).unwrap();
        assert_eq!(
            value,
            json!({
                "Filename": "a.jpg",
                "ContrastElement": "",
                "LLM_Description": "gen",
                "Reference_Description": "ref",
                "Similarity_Score": 0.5
            })
        );
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.jsonl");
        let records = vec![ReferenceRecord {
            filename: "x.jpg".into(),
            contrast_element: Some(json!("bkg")),
            ofiq_results: None,
            description: "desc".into(),
        }];
        write_jsonl(&path, &records).unwrap();

        let loaded: Vec<ReferenceRecord> = read_jsonl(&path).unwrap();
        assert_eq!(loaded, records);
    }
}
