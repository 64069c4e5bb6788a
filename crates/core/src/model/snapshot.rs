use serde::{Deserialize, Serialize};

use crate::model::ids::{TutorialId, UserId};

/// The full progress record of one user.
///
/// `completed_tutorial_ids` keeps completion order: the last element is the
/// most recently completed tutorial. Uniqueness is the server's concern; the
/// client never deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub user_id: UserId,
    pub completed_tutorial_ids: Vec<TutorialId>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new(user_id: UserId, completed_tutorial_ids: Vec<TutorialId>) -> Self {
        Self {
            user_id,
            completed_tutorial_ids,
        }
    }

    /// Value published before the first successful fetch.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_completed(&self, tutorial_id: TutorialId) -> bool {
        self.completed_tutorial_ids.contains(&tutorial_id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_tutorial_ids.len()
    }

    #[must_use]
    pub fn last_completed_id(&self) -> Option<TutorialId> {
        self.completed_tutorial_ids.last().copied()
    }

    /// Copy of this snapshot without `tutorial_id`.
    #[must_use]
    pub fn without(&self, tutorial_id: TutorialId) -> Self {
        Self {
            user_id: self.user_id.clone(),
            completed_tutorial_ids: self
                .completed_tutorial_ids
                .iter()
                .copied()
                .filter(|id| *id != tutorial_id)
                .collect(),
        }
    }

    /// Copy of this snapshot with no completed tutorials, same user.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            user_id: self.user_id.clone(),
            completed_tutorial_ids: Vec::new(),
        }
    }
}
