//! Pure derivations over a progress snapshot and a tutorial catalog.
//!
//! Nothing here caches: callers recompute whenever either input changes.

use crate::model::{ProgressCardView, ProgressSnapshot, Tutorial, TutorialId};

/// Percentage of the catalog the user has completed.
///
/// An empty catalog yields `0.0`. The result is clamped to `[0, 100]` because
/// the snapshot may still reference tutorials the catalog no longer lists.
#[must_use]
pub fn completion_percentage(completed: usize, catalog_len: usize) -> f64 {
    if catalog_len == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = completed as f64 / catalog_len as f64;
    (ratio * 100.0).clamp(0.0, 100.0)
}

/// Catalog entry matching the most recently completed id.
///
/// Catalog order is irrelevant here: only the last element of `completed`
/// counts. Returns `None` when nothing is completed or the id is unknown.
#[must_use]
pub fn last_completed_tutorial<'a>(
    completed: &[TutorialId],
    catalog: &'a [Tutorial],
) -> Option<&'a Tutorial> {
    let last = completed.last()?;
    catalog.iter().find(|tutorial| tutorial.id == *last)
}

/// The tutorial a user should start next.
///
/// With a last completed tutorial this is its successor in catalog order
/// (`None` once the path is finished); otherwise the first catalog entry.
#[must_use]
pub fn tutorial_to_resume_from<'a>(
    last_completed: Option<&Tutorial>,
    catalog: &'a [Tutorial],
) -> Option<&'a Tutorial> {
    match last_completed {
        Some(last) => {
            let index = catalog.iter().position(|tutorial| tutorial.id == last.id)?;
            catalog.get(index + 1)
        }
        None => catalog.first(),
    }
}

/// Percentage for a snapshot against the full catalog.
#[must_use]
pub fn snapshot_percentage(snapshot: &ProgressSnapshot, catalog: &[Tutorial]) -> f64 {
    completion_percentage(snapshot.completed_count(), catalog.len())
}

/// Builds the card view shown for a learning path.
#[must_use]
pub fn progress_card_view(snapshot: &ProgressSnapshot, catalog: &[Tutorial]) -> ProgressCardView {
    let last = last_completed_tutorial(&snapshot.completed_tutorial_ids, catalog);
    let resume = tutorial_to_resume_from(last, catalog);

    ProgressCardView {
        progress_percentage: snapshot_percentage(snapshot, catalog),
        last_completed_tutorial: last.cloned(),
        tutorial_to_resume_from: resume.cloned(),
    }
}
