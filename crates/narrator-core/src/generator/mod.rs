//! Narrative Generator
//!
//! Maps a defect code and an OFIQ score report to a deterministic compliance
//! narrative. One rule per defect code, each producing the sentences that
//! describe the defect and the feedback that fixes it.
//!
//! The generator is total: any code (including unknown ones) and any report
//! (including an empty one) produce a non-empty narrative.

mod zoom;

use crate::defect::DefectCode;
use crate::narrative::Narrative;
use crate::report::{metrics, ScoreReport};

pub use zoom::{HEAD_SIZE_TOO_LARGE, MIN_SIDE_CROP, MIN_TOP_MARGIN};

/// Sole sentence of a compliant narrative.
pub const COMPLIANT_STATEMENT: &str = "This image is excellent and fully compliant for biometric use. The face is perfectly centered and optimally cropped. No changes needed.";

/// Opening sentence of every non-compliant narrative.
pub const NON_COMPLIANT_OPENING: &str =
    "The image is not compliant for biometric use. Please address the following issues:";

/// Sentences and feedback contributed by a single defect rule.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct RuleOutcome {
    pub sentences: Vec<String>,
    pub feedback: Vec<String>,
}

impl RuleOutcome {
    fn single(sentence: String, feedback: &str) -> Self {
        Self {
            sentences: vec![sentence],
            feedback: vec![feedback.to_string()],
        }
    }
}

/// Stateless generator of compliance narratives.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeGenerator;

impl NarrativeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate the narrative for `code` using the scores in `report`.
    pub fn generate(&self, code: &DefectCode, report: &ScoreReport) -> Narrative {
        if code.is_compliant() {
            return Narrative::new(vec![COMPLIANT_STATEMENT.to_string()], Vec::new());
        }

        let outcome = apply_rule(code, report);

        let mut description = Vec::with_capacity(outcome.sentences.len() + 1);
        description.push(NON_COMPLIANT_OPENING.to_string());
        description.extend(outcome.sentences);

        Narrative::new(description, outcome.feedback)
    }

    /// Generate and render in one step.
    pub fn describe(&self, code: &DefectCode, report: &ScoreReport) -> String {
        self.generate(code, report).render()
    }
}

fn apply_rule(code: &DefectCode, report: &ScoreReport) -> RuleOutcome {
    match code {
        // Handled before dispatch; kept total for direct callers.
        DefectCode::Compliant => RuleOutcome::default(),
        DefectCode::Background => background(report),
        DefectCode::HeadCovering => head_covering(report),
        DefectCode::ClosedEyes => closed_eyes(report),
        DefectCode::ClosedEyesWithGlasses => closed_eyes_with_glasses(report),
        DefectCode::Exposure => exposure(report),
        DefectCode::LookingRight => gaze("away to the right"),
        DefectCode::LookingLeft => gaze("away to the left"),
        DefectCode::Lighting => lighting(report),
        DefectCode::Makeup => makeup(report),
        DefectCode::OutOfFocus => out_of_focus(report),
        DefectCode::Pixelation => pixelation(),
        DefectCode::Posterization => posterization(report),
        DefectCode::Saturation => saturation(report),
        DefectCode::Expression => expression(report),
        DefectCode::Sunglasses => sunglasses(report),
        DefectCode::HeadPose => head_pose(report),
        DefectCode::Zoom => zoom::framing(report),
        DefectCode::Unknown(raw) => RuleOutcome {
            sentences: vec![format!(
                "Unknown contrast element: {}. Please review the input data.",
                raw
            )],
            feedback: Vec::new(),
        },
    }
}

fn background(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The background is not uniform (BackgroundUniformity.scalar: {}). This low score indicates inconsistencies or distracting elements in the background.",
            report.scalar(metrics::BACKGROUND_UNIFORMITY)
        ),
        "Please ensure a clean, plain, and consistent background.",
    )
}

fn head_covering(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject is wearing a head covering (NoHeadCoverings.scalar: {}), which is non-compliant.",
            report.scalar(metrics::NO_HEAD_COVERINGS)
        ),
        "Please ensure the subject's head is uncovered, with the entire face clearly visible.",
    )
}

fn closed_eyes(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject has closed or partially closed eyes (EyesOpen.scalar: {}). This low score prevents proper detection of eye features crucial for recognition.",
            report.scalar(metrics::EYES_OPEN)
        ),
        "Please ensure the subject's eyes are clearly open and visible.",
    )
}

fn closed_eyes_with_glasses(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject has closed eyes while wearing glasses (EyesOpen.scalar: {}). This prevents proper detection of eye features crucial for recognition.",
            report.scalar(metrics::EYES_OPEN)
        ),
        "Please ensure the subject's eyes are clearly open and visible, without any occlusions.",
    )
}

fn exposure(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "There are exposure problems: the image might be too dark (UnderExposurePrevention.scalar: {}) or too bright (LuminanceMean.scalar: {}, LuminanceVariance.scalar: {}). This can lead to a loss of detail in highlights or shadows (DynamicRange.scalar: {}).",
            report.scalar(metrics::UNDER_EXPOSURE_PREVENTION),
            report.scalar(metrics::LUMINANCE_MEAN),
            report.scalar(metrics::LUMINANCE_VARIANCE),
            report.scalar(metrics::DYNAMIC_RANGE)
        ),
        "Please ensure proper exposure settings for balanced brightness and detail preservation.",
    )
}

// OFIQ does not score gaze direction, so the rule is text-only.
fn gaze(direction: &str) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject is looking {}. This deviation from a straight gaze is non-compliant.",
            direction
        ),
        "Please ensure the subject is looking straight ahead at the camera with a frontal head pose.",
    )
}

fn lighting(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The face illumination is not uniform (IlluminationUniformity.scalar: {}, OverExposurePrevention.scalar: {}). This low score indicates uneven lighting, causing harsh shadows or bright spots that obscure facial features.",
            report.scalar(metrics::ILLUMINATION_UNIFORMITY),
            report.scalar(metrics::OVER_EXPOSURE_PREVENTION)
        ),
        "Please ensure even and consistent illumination across the entire face.",
    )
}

// Heavy makeup shows up as occlusion.
fn makeup(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject is wearing makeup, which may obscure facial features (FaceOcclusionPrevention.scalar: {}). This can impact biometric matching.",
            report.scalar(metrics::FACE_OCCLUSION_PREVENTION)
        ),
        "Please ensure the subject is wearing minimal or no makeup for biometric capture.",
    )
}

fn out_of_focus(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The image is not sharp (Sharpness.scalar: {}), causing blurriness across facial features. This severely impacts recognition accuracy.",
            report.scalar(metrics::SHARPNESS)
        ),
        "Please ensure proper focus to achieve high sharpness in the image.",
    )
}

fn pixelation() -> RuleOutcome {
    RuleOutcome::single(
        "The image exhibits pixelation or low resolution artifacts. This impacts overall clarity and detail.".to_string(),
        "Please ensure high resolution and minimal compression to avoid these distortions.",
    )
}

fn posterization(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The image has posterization, indicating a loss of color depth and smooth tonal gradients. This can be caused by insufficient dynamic range capture (DynamicRange.scalar: {}).",
            report.scalar(metrics::DYNAMIC_RANGE)
        ),
        "Please ensure sufficient color depth and dynamic range in the capture settings.",
    )
}

fn saturation(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The image colors are unnatural (NaturalColour.scalar: {}), appearing either too vivid or washed out.",
            report.scalar(metrics::NATURAL_COLOUR)
        ),
        "Please ensure balanced color saturation and natural color reproduction.",
    )
}

fn expression(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject does not have a neutral facial expression (ExpressionNeutrality.scalar: {}, MouthClosed.scalar: {}). Expressions like smiling, frowning, or grimacing alter facial landmarks.",
            report.scalar(metrics::EXPRESSION_NEUTRALITY),
            report.scalar(metrics::MOUTH_CLOSED)
        ),
        "Please ensure the subject maintains a neutral expression with a closed mouth.",
    )
}

fn sunglasses(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject's face is occluded by sunglasses (FaceOcclusionPrevention.scalar: {}), specifically obscuring the eyes (EyesVisible.scalar: {}). This prevents biometric analysis of key features.",
            report.scalar(metrics::FACE_OCCLUSION_PREVENTION),
            report.scalar(metrics::EYES_VISIBLE)
        ),
        "Please ensure the subject is not wearing sunglasses and eyes are fully visible.",
    )
}

fn head_pose(report: &ScoreReport) -> RuleOutcome {
    RuleOutcome::single(
        format!(
            "The subject's head pose is incorrect, with significant deviation (HeadPoseYaw.scalar: {}, HeadPosePitch.scalar: {}, HeadPoseRoll.scalar: {}). This non-frontal pose is non-compliant.",
            report.scalar(metrics::HEAD_POSE_YAW),
            report.scalar(metrics::HEAD_POSE_PITCH),
            report.scalar(metrics::HEAD_POSE_ROLL)
        ),
        "Please ensure the subject is facing the capturing device directly and is upright.",
    )
}
