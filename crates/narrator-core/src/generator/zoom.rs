//! Framing rule for the `zoom` defect.
//!
//! The only multi-branch rule. An oversized head ends the rule; otherwise
//! each crop/margin metric is checked independently and the insufficient
//! ones are listed together.
//!
//! The thresholds are tuned against the TONO/ONOT data. Comparisons are
//! strict and an absent metric never trips a threshold.

use super::RuleOutcome;
use crate::report::{metrics, ScoreReport};

/// `HeadSize` strictly above this is "too large".
pub const HEAD_SIZE_TOO_LARGE: f64 = 75.0;

/// Left/right crop strictly below this is an insufficient side margin.
pub const MIN_SIDE_CROP: f64 = 90.0;

/// Top margin strictly below this is insufficient.
pub const MIN_TOP_MARGIN: f64 = 1.0;

pub(super) fn framing(report: &ScoreReport) -> RuleOutcome {
    let head_size = report.scalar(metrics::HEAD_SIZE);

    if head_size.exceeds(HEAD_SIZE_TOO_LARGE) {
        return RuleOutcome {
            sentences: vec![format!(
                "The subject's head size is too large (HeadSize.scalar: {}, InterEyesDistance.scalar: {}), indicating the image is excessively zoomed in. This often results in the face being cropped too tightly, with small margins above (MarginAboveOfTheFaceImage.scalar: {}) and below the face (MarginBelowOfTheFaceImage.scalar: {}) and a loss of sharpness (Sharpness.scalar: {}).",
                head_size,
                report.scalar(metrics::INTER_EYES_DISTANCE),
                report.scalar(metrics::MARGIN_ABOVE),
                report.scalar(metrics::MARGIN_BELOW),
                report.scalar(metrics::SHARPNESS)
            )],
            feedback: vec![
                "Please ensure the subject's entire head and shoulders are visible within the frame, with appropriate margins."
                    .to_string(),
            ],
        };
    }

    let mut outcome = RuleOutcome {
        sentences: vec![format!(
            "The head size is compliant (HeadSize.scalar: {}).",
            head_size
        )],
        feedback: Vec::new(),
    };

    let left = report.scalar(metrics::LEFTWARD_CROP);
    let right = report.scalar(metrics::RIGHTWARD_CROP);
    let above = report.scalar(metrics::MARGIN_ABOVE);

    let mut issues = Vec::new();
    if left.falls_below(MIN_SIDE_CROP) {
        issues.push(format!(
            "insufficient left margin (LeftwardCropOfTheFaceImage.scalar: {})",
            left
        ));
    }
    if right.falls_below(MIN_SIDE_CROP) {
        issues.push(format!(
            "insufficient right margin (RightwardCropOfTheFaceImage.scalar: {})",
            right
        ));
    }
    if above.falls_below(MIN_TOP_MARGIN) {
        issues.push(format!(
            "insufficient top margin (MarginAboveOfTheFaceImage.scalar: {})",
            above
        ));
    }

    if issues.is_empty() {
        outcome
            .sentences
            .push("The framing is excellent, with optimal head size and margins.".to_string());
    } else {
        outcome.sentences.push(format!(
            "However, the image is poorly cropped due to {}.",
            issues.join(", ")
        ));
        outcome.feedback.push(
            "Please ensure sufficient margins around the face to avoid cutting off parts of the head or face."
                .to_string(),
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(head: f64, left: f64, right: f64, above: f64) -> RuleOutcome {
        let report: ScoreReport = [
            (metrics::HEAD_SIZE, head),
            (metrics::LEFTWARD_CROP, left),
            (metrics::RIGHTWARD_CROP, right),
            (metrics::MARGIN_ABOVE, above),
        ]
        .into_iter()
        .collect();
        framing(&report)
    }

    fn is_too_large(outcome: &RuleOutcome) -> bool {
        outcome.sentences[0].contains("too large")
    }

    #[test]
    fn test_head_size_boundary_is_strict() {
        assert!(!is_too_large(&framed(75.0, 100.0, 100.0, 50.0)));
        assert!(is_too_large(&framed(76.0, 100.0, 100.0, 50.0)));
    }

    #[test]
    fn test_too_large_stops_before_crop_checks() {
        let outcome = framed(90.0, 10.0, 10.0, 0.0);
        assert_eq!(outcome.sentences.len(), 1);
        assert_eq!(outcome.feedback.len(), 1);
        assert!(outcome.sentences[0].contains("excessively zoomed in"));
    }

    #[test]
    fn test_crop_boundaries_are_strict() {
        let clean = framed(50.0, 90.0, 90.0, 1.0);
        assert!(clean.feedback.is_empty());
        assert!(clean.sentences[1].contains("framing is excellent"));

        let left = framed(50.0, 89.0, 90.0, 1.0);
        assert!(left.sentences[1].contains("insufficient left margin"));
        assert!(!left.sentences[1].contains("right margin"));

        let right = framed(50.0, 90.0, 89.0, 1.0);
        assert!(right.sentences[1].contains("insufficient right margin"));

        let top = framed(50.0, 90.0, 90.0, 0.9);
        assert!(top.sentences[1].contains("insufficient top margin (MarginAboveOfTheFaceImage.scalar: 0.9)"));
    }

    #[test]
    fn test_all_crop_issues_are_listed_in_order() {
        let outcome = framed(10.0, 5.0, 6.0, 0.0);
        assert_eq!(
            outcome.sentences[1],
            "However, the image is poorly cropped due to insufficient left margin (LeftwardCropOfTheFaceImage.scalar: 5), insufficient right margin (RightwardCropOfTheFaceImage.scalar: 6), insufficient top margin (MarginAboveOfTheFaceImage.scalar: 0)."
        );
        assert_eq!(outcome.feedback.len(), 1);
    }

    #[test]
    fn test_empty_report_is_compliant_framing() {
        let outcome = framing(&ScoreReport::new());
        assert_eq!(outcome.sentences[0], "The head size is compliant (HeadSize.scalar: None).");
        assert!(outcome.feedback.is_empty());
    }
}
