use serde::Serialize;

use crate::model::tutorial::Tutorial;

/// Presentation-agnostic summary of a user's progress through a learning path.
///
/// Derived on demand from a snapshot and the catalog; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCardView {
    /// Completion in percent, within `[0, 100]`.
    pub progress_percentage: f64,
    pub last_completed_tutorial: Option<Tutorial>,
    pub tutorial_to_resume_from: Option<Tutorial>,
}

impl ProgressCardView {
    /// True once the last completed tutorial is the final catalog entry.
    #[must_use]
    pub fn is_path_finished(&self) -> bool {
        self.last_completed_tutorial.is_some() && self.tutorial_to_resume_from.is_none()
    }
}
