//! Defect codes (contrast elements) and sentinel normalization.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// The dominant quality problem of a face image.
///
/// The closed set mirrors the contrast elements of the TONO dataset.
/// `Compliant` is the normalized "no defect" marker and `Unknown` carries
/// any code outside the closed set unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefectCode {
    Compliant,
    /// `bkg`
    Background,
    /// `cap`
    HeadCovering,
    /// `ce`
    ClosedEyes,
    /// `ceg`
    ClosedEyesWithGlasses,
    /// `expos`
    Exposure,
    /// `la_1`
    LookingRight,
    /// `la_2`
    LookingLeft,
    /// `light`
    Lighting,
    /// `mkup`
    Makeup,
    /// `oof`
    OutOfFocus,
    /// `pixel`
    Pixelation,
    /// `poster`
    Posterization,
    /// `sat`
    Saturation,
    /// `sm`
    Expression,
    /// `sun`
    Sunglasses,
    /// `tq`
    HeadPose,
    /// `zoom`
    Zoom,
    Unknown(String),
}

impl DefectCode {
    /// Every code of the closed set, in label order.
    pub const CLOSED_SET: [DefectCode; 17] = [
        DefectCode::Background,
        DefectCode::HeadCovering,
        DefectCode::ClosedEyes,
        DefectCode::ClosedEyesWithGlasses,
        DefectCode::Exposure,
        DefectCode::LookingRight,
        DefectCode::LookingLeft,
        DefectCode::Lighting,
        DefectCode::Makeup,
        DefectCode::OutOfFocus,
        DefectCode::Pixelation,
        DefectCode::Posterization,
        DefectCode::Saturation,
        DefectCode::Expression,
        DefectCode::Sunglasses,
        DefectCode::HeadPose,
        DefectCode::Zoom,
    ];

    /// Parse a textual label.
    ///
    /// `none`, `nan` and the dataset's compliant label `ONOT` (all
    /// case-insensitive) collapse to [`DefectCode::Compliant`]. Closed-set
    /// labels are matched exactly.
    pub fn from_label(label: &str) -> Self {
        if is_compliant_label(label) {
            return Self::Compliant;
        }

        match label {
            "bkg" => Self::Background,
            "cap" => Self::HeadCovering,
            "ce" => Self::ClosedEyes,
            "ceg" => Self::ClosedEyesWithGlasses,
            "expos" => Self::Exposure,
            "la_1" => Self::LookingRight,
            "la_2" => Self::LookingLeft,
            "light" => Self::Lighting,
            "mkup" => Self::Makeup,
            "oof" => Self::OutOfFocus,
            "pixel" => Self::Pixelation,
            "poster" => Self::Posterization,
            "sat" => Self::Saturation,
            "sm" => Self::Expression,
            "sun" => Self::Sunglasses,
            "tq" => Self::HeadPose,
            "zoom" => Self::Zoom,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Classify a numeric raw code. NaN is the compliant sentinel.
    pub fn from_float(value: f64) -> Self {
        if value.is_nan() {
            Self::Compliant
        } else {
            Self::Unknown(value.to_string())
        }
    }

    /// The dataset label for this code.
    pub fn label(&self) -> &str {
        match self {
            Self::Compliant => "none",
            Self::Background => "bkg",
            Self::HeadCovering => "cap",
            Self::ClosedEyes => "ce",
            Self::ClosedEyesWithGlasses => "ceg",
            Self::Exposure => "expos",
            Self::LookingRight => "la_1",
            Self::LookingLeft => "la_2",
            Self::Lighting => "light",
            Self::Makeup => "mkup",
            Self::OutOfFocus => "oof",
            Self::Pixelation => "pixel",
            Self::Posterization => "poster",
            Self::Saturation => "sat",
            Self::Expression => "sm",
            Self::Sunglasses => "sun",
            Self::HeadPose => "tq",
            Self::Zoom => "zoom",
            Self::Unknown(code) => code,
        }
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, Self::Compliant)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl FromStr for DefectCode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl fmt::Display for DefectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize a raw `ContrastElement` value into a [`DefectCode`].
///
/// A missing field, JSON `null`, a NaN marker and the string `none` in any
/// case all yield [`DefectCode::Compliant`]. This runs before any rule
/// dispatch.
pub fn to_defect_code(raw: Option<&Value>) -> DefectCode {
    match raw {
        None | Some(Value::Null) => DefectCode::Compliant,
        Some(Value::String(label)) => DefectCode::from_label(label),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) if value.is_nan() => DefectCode::Compliant,
            _ => DefectCode::Unknown(number.to_string()),
        },
        Some(other) => DefectCode::Unknown(other.to_string()),
    }
}

fn is_compliant_label(label: &str) -> bool {
    ["none", "nan", "onot"]
        .iter()
        .any(|sentinel| label.eq_ignore_ascii_case(sentinel))
}
