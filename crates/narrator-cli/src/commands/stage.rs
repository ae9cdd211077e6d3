use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use narrator_core::{read_jsonl, to_defect_code, DefectCode, ReferenceRecord};

use crate::cli::StageImagesArgs;

/// Folder name used for compliant images.
const COMPLIANT_LABEL: &str = "ONOT";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub copied: usize,
    pub missing: usize,
    pub rejected: usize,
}

pub fn run(args: StageImagesArgs) -> Result<()> {
    let examples: Vec<ReferenceRecord> = read_jsonl(&args.train)
        .with_context(|| format!("failed to load examples from {}", args.train.display()))?;

    let report = stage(&examples, &args.defect_root, &args.compliant_root, &args.output)?;

    info!(
        copied = report.copied,
        missing = report.missing,
        rejected = report.rejected,
        output = %args.output.display(),
        "staged in-context images"
    );
    Ok(())
}

/// Copy each example image to `<output>/<label>/<file name>`.
///
/// Sources that do not exist are skipped with a warning.
pub fn stage(
    examples: &[ReferenceRecord],
    defect_root: &Path,
    compliant_root: &Path,
    output: &Path,
) -> Result<StageReport> {
    let mut report = StageReport::default();

    for example in examples {
        let code = to_defect_code(example.contrast_element.as_ref());
        let Some(file_name) = Path::new(&example.filename).file_name() else {
            warn!(filename = %example.filename, "record has no file name, skipping");
            report.missing += 1;
            continue;
        };
        let Some((source, label)) = source_path(file_name, &code, defect_root, compliant_root)
        else {
            warn!(label = code.label(), "defect label is not a plain folder name, skipping");
            report.rejected += 1;
            continue;
        };

        if !source.is_file() {
            warn!(source = %source.display(), "image not found, skipping");
            report.missing += 1;
            continue;
        }

        let target_dir = output.join(label);
        fs::create_dir_all(&target_dir)
            .with_context(|| format!("failed to create {}", target_dir.display()))?;

        let target = target_dir.join(file_name);
        fs::copy(&source, &target).with_context(|| {
            format!("failed to copy {} to {}", source.display(), target.display())
        })?;
        debug!(source = %source.display(), target = %target.display(), "copied");
        report.copied += 1;
    }

    Ok(report)
}

fn source_path(
    file_name: &OsStr,
    code: &DefectCode,
    defect_root: &Path,
    compliant_root: &Path,
) -> Option<(PathBuf, String)> {
    if code.is_compliant() {
        return Some((compliant_root.join(file_name), COMPLIANT_LABEL.to_string()));
    }

    let label = code.label();
    if !is_folder_name(label) {
        return None;
    }
    Some((defect_root.join(label).join(file_name), label.to_string()))
}

/// A single normal path component; labels become folder names under both roots.
fn is_folder_name(label: &str) -> bool {
    let mut components = Path::new(label).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !label.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn example(filename: &str, code: serde_json::Value) -> ReferenceRecord {
        ReferenceRecord {
            filename: filename.into(),
            contrast_element: Some(code),
            ofiq_results: None,
            description: String::new(),
        }
    }

    #[test]
    fn test_stage_sorts_images_by_label() {
        let dir = tempfile::tempdir().unwrap();
        let defects = dir.path().join("tono");
        let compliant = dir.path().join("onot");
        let output = dir.path().join("staged");

        fs::create_dir_all(defects.join("oof")).unwrap();
        fs::create_dir_all(&compliant).unwrap();
        fs::write(defects.join("oof").join("a.png"), b"a").unwrap();
        fs::write(compliant.join("b.png"), b"b").unwrap();

        let examples = vec![
            example("a.png", json!("oof")),
            example("b.png", serde_json::Value::Null),
            example("c.png", json!("bkg")),
            example("nested/dir/a.png", json!("oof")),
        ];

        let report = stage(&examples, &defects, &compliant, &output).unwrap();

        assert_eq!(report, StageReport { copied: 3, missing: 1, rejected: 0 });
        assert_eq!(fs::read(output.join("oof").join("a.png")).unwrap(), b"a");
        assert_eq!(fs::read(output.join("ONOT").join("b.png")).unwrap(), b"b");
        assert!(!output.join("bkg").exists());
    }

    #[test]
    fn test_unknown_labels_cannot_escape_roots() {
        let dir = tempfile::tempdir().unwrap();
        let defects = dir.path().join("tono");
        let output = dir.path().join("staged");
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("x").join("a.png"), b"a").unwrap();

        let examples = vec![
            example("a.png", json!("../x")),
            example("a.png", json!("..")),
            example("a.png", json!("a\\b")),
        ];

        let report = stage(&examples, &defects, &dir.path().join("onot"), &output).unwrap();

        assert_eq!(report, StageReport { copied: 0, missing: 0, rejected: 3 });
        assert!(!output.exists());
        assert!(!dir.path().join("x").join("staged").exists());
    }

    #[test]
    fn test_folder_names() {
        assert!(is_folder_name("oof"));
        assert!(is_folder_name("custom-label"));
        assert!(!is_folder_name(""));
        assert!(!is_folder_name("."));
        assert!(!is_folder_name(".."));
        assert!(!is_folder_name("a/b"));
        assert!(!is_folder_name("/abs"));
    }
}
