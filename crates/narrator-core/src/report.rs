//! OFIQ score reports and safe scalar lookup.
//!
//! A report is the flat `OFIQResults` object emitted by the assessment engine:
//! metric identifiers of the form `<Component>.scalar` mapped to numbers,
//! nominally in the 0-100 range. Missing metrics are expected and never an
//! error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metric identifiers referenced by the narrative rules.
pub mod metrics {
    pub const BACKGROUND_UNIFORMITY: &str = "BackgroundUniformity.scalar";
    pub const NO_HEAD_COVERINGS: &str = "NoHeadCoverings.scalar";
    pub const EYES_OPEN: &str = "EyesOpen.scalar";
    pub const EYES_VISIBLE: &str = "EyesVisible.scalar";
    pub const LUMINANCE_MEAN: &str = "LuminanceMean.scalar";
    pub const LUMINANCE_VARIANCE: &str = "LuminanceVariance.scalar";
    pub const UNDER_EXPOSURE_PREVENTION: &str = "UnderExposurePrevention.scalar";
    pub const OVER_EXPOSURE_PREVENTION: &str = "OverExposurePrevention.scalar";
    pub const DYNAMIC_RANGE: &str = "DynamicRange.scalar";
    pub const ILLUMINATION_UNIFORMITY: &str = "IlluminationUniformity.scalar";
    pub const FACE_OCCLUSION_PREVENTION: &str = "FaceOcclusionPrevention.scalar";
    pub const SHARPNESS: &str = "Sharpness.scalar";
    pub const NATURAL_COLOUR: &str = "NaturalColour.scalar";
    pub const EXPRESSION_NEUTRALITY: &str = "ExpressionNeutrality.scalar";
    pub const MOUTH_CLOSED: &str = "MouthClosed.scalar";
    pub const HEAD_POSE_YAW: &str = "HeadPoseYaw.scalar";
    pub const HEAD_POSE_PITCH: &str = "HeadPosePitch.scalar";
    pub const HEAD_POSE_ROLL: &str = "HeadPoseRoll.scalar";
    pub const HEAD_SIZE: &str = "HeadSize.scalar";
    pub const INTER_EYES_DISTANCE: &str = "InterEyesDistance.scalar";
    pub const LEFTWARD_CROP: &str = "LeftwardCropOfTheFaceImage.scalar";
    pub const RIGHTWARD_CROP: &str = "RightwardCropOfTheFaceImage.scalar";
    pub const MARGIN_ABOVE: &str = "MarginAboveOfTheFaceImage.scalar";
    pub const MARGIN_BELOW: &str = "MarginBelowOfTheFaceImage.scalar";
}

/// Immutable mapping from metric identifier to quality scalar.
///
/// The raw JSON values are kept as-is so the report serialises back exactly
/// as it was read (prompt assembly relies on this). Lookups only ever yield
/// numbers; a non-numeric entry reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreReport {
    scalars: BTreeMap<String, Value>,
}

impl ScoreReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a metric by its full identifier (e.g. `Sharpness.scalar`).
    ///
    /// Unknown names are not validated against any vocabulary; they simply
    /// resolve to `None`.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.scalars.get(metric).and_then(Value::as_f64)
    }

    /// Look up a metric for interpolation into narrative text.
    pub fn scalar(&self, metric: &str) -> Scalar {
        Scalar(self.get(metric))
    }

    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ScoreReport {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let scalars = iter
            .into_iter()
            .filter_map(|(metric, value)| {
                serde_json::Number::from_f64(value).map(|n| (metric.into(), Value::Number(n)))
            })
            .collect();
        Self { scalars }
    }
}

/// A looked-up scalar as it appears in narrative text.
///
/// Absent values render as `None` rather than failing the narrative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar(pub Option<f64>);

impl Scalar {
    /// `true` only when the value is present and strictly greater than `threshold`.
    pub fn exceeds(self, threshold: f64) -> bool {
        self.0.is_some_and(|v| v > threshold)
    }

    /// `true` only when the value is present and strictly below `threshold`.
    pub fn falls_below(self, threshold: f64) -> bool {
        self.0.is_some_and(|v| v < threshold)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_present_and_absent() {
        let report: ScoreReport = [(metrics::SHARPNESS, 42.0)].into_iter().collect();
        assert_eq!(report.get(metrics::SHARPNESS), Some(42.0));
        assert_eq!(report.get(metrics::HEAD_SIZE), None);
        assert_eq!(report.get("NotAMetric"), None);
    }

    #[test]
    fn test_deserialize_keeps_non_numeric_as_absent() {
        let report: ScoreReport = serde_json::from_str(
            r#"{"Sharpness.scalar": 12, "HeadSize.scalar": null, "Note": "x"}"#,
        )
        .unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.get("Sharpness.scalar"), Some(12.0));
        assert_eq!(report.get("HeadSize.scalar"), None);
        assert_eq!(report.get("Note"), None);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar(Some(12.0)).to_string(), "12");
        assert_eq!(Scalar(Some(0.9)).to_string(), "0.9");
        assert_eq!(Scalar(None).to_string(), "None");
    }

    #[test]
    fn test_threshold_helpers_ignore_absent() {
        assert!(!Scalar(None).exceeds(75.0));
        assert!(!Scalar(None).falls_below(90.0));
        assert!(!Scalar(Some(75.0)).exceeds(75.0));
        assert!(Scalar(Some(76.0)).exceeds(75.0));
        assert!(!Scalar(Some(90.0)).falls_below(90.0));
        assert!(Scalar(Some(89.0)).falls_below(90.0));
    }

    #[test]
    fn test_round_trip_preserves_raw_values() {
        let raw = r#"{"HeadSize.scalar":80.5,"Sharpness.scalar":3}"#;
        let report: ScoreReport = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&report).unwrap(), raw);
    }
}
