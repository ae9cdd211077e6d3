//! Rendered compliance narratives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal separating the description from the feedback list.
pub const FEEDBACK_MARKER: &str = " Actionable Feedback: ";

/// An ordered list of descriptive sentences plus actionable feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    description: Vec<String>,
    feedback: Vec<String>,
}

impl Narrative {
    pub fn new(description: Vec<String>, feedback: Vec<String>) -> Self {
        Self {
            description,
            feedback,
        }
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    pub fn has_feedback(&self) -> bool {
        !self.feedback.is_empty()
    }

    /// Render as a single string.
    ///
    /// Sentences are space-joined; feedback follows the
    /// [`FEEDBACK_MARKER`] comma-joined, only when present. The result is
    /// trimmed.
    pub fn render(&self) -> String {
        let mut text = self.description.join(" ");
        if !self.feedback.is_empty() {
            text.push_str(FEEDBACK_MARKER);
            text.push_str(&self.feedback.join(", "));
        }
        text.trim().to_string()
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
