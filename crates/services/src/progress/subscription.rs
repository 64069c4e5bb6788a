use learn_core::model::{ProgressSnapshot, Tutorial};
use tokio::sync::watch;

/// Replay-latest view of a watched value.
///
/// The first `next` yields the value current at that moment, later calls wait
/// for updates. Intermediate values a slow reader never observed are skipped.
/// Ends (`None`) once the publisher is gone.
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx, primed: false }
    }

    /// Latest published value, without consuming an update.
    #[must_use]
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    pub async fn next(&mut self) -> Option<T> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Derivation applied to each (snapshot, catalog) pair.
pub type Derive<T> = fn(&ProgressSnapshot, &[Tutorial]) -> T;

enum Source {
    Progress,
    Catalog,
}

/// Replay-latest stream of a value computed from the progress snapshot and
/// the tutorial catalog.
///
/// Recomputed whenever either input changes; nothing is cached between calls.
/// Ends once both publishers are gone.
pub struct DerivedSubscription<T> {
    progress: watch::Receiver<ProgressSnapshot>,
    catalog: watch::Receiver<Vec<Tutorial>>,
    derive: Derive<T>,
    primed: bool,
    progress_open: bool,
    catalog_open: bool,
}

impl<T> DerivedSubscription<T> {
    pub(crate) fn new(
        progress: watch::Receiver<ProgressSnapshot>,
        catalog: watch::Receiver<Vec<Tutorial>>,
        derive: Derive<T>,
    ) -> Self {
        Self {
            progress,
            catalog,
            derive,
            primed: false,
            progress_open: true,
            catalog_open: true,
        }
    }

    /// Derived value for the current inputs, without consuming an update.
    #[must_use]
    pub fn current(&self) -> T {
        let progress = self.progress.borrow();
        let catalog = self.catalog.borrow();
        (self.derive)(&progress, &catalog)
    }

    pub async fn next(&mut self) -> Option<T> {
        if self.primed && !self.wait_for_change().await {
            return None;
        }
        self.primed = true;

        let progress = self.progress.borrow_and_update();
        let catalog = self.catalog.borrow_and_update();
        Some((self.derive)(&progress, &catalog))
    }

    async fn wait_for_change(&mut self) -> bool {
        loop {
            let (source, changed) = tokio::select! {
                res = self.progress.changed(), if self.progress_open => (Source::Progress, res.is_ok()),
                res = self.catalog.changed(), if self.catalog_open => (Source::Catalog, res.is_ok()),
                else => return false,
            };

            if changed {
                return true;
            }
            match source {
                Source::Progress => self.progress_open = false,
                Source::Catalog => self.catalog_open = false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::{TutorialId, UserId};
    use learn_core::progress::snapshot_percentage;

    #[tokio::test]
    async fn first_next_replays_current_value() {
        let (tx, rx) = watch::channel(1_u32);
        tx.send_replace(2);
        let mut sub = Subscription::new(rx);
        assert_eq!(sub.next().await, Some(2));

        tx.send_replace(3);
        assert_eq!(sub.next().await, Some(3));
    }

    #[tokio::test]
    async fn ends_when_publisher_drops() {
        let (tx, rx) = watch::channel(0_u32);
        let mut sub = Subscription::new(rx);
        assert_eq!(sub.next().await, Some(0));
        drop(tx);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn derived_recomputes_on_either_input() {
        let (progress_tx, progress_rx) = watch::channel(ProgressSnapshot::placeholder());
        let (catalog_tx, catalog_rx) = watch::channel(vec![
            Tutorial::titled(1, 1, "A"),
            Tutorial::titled(2, 2, "B"),
        ]);
        let mut sub = DerivedSubscription::new(progress_rx, catalog_rx, snapshot_percentage);
        assert_eq!(sub.next().await, Some(0.0));

        progress_tx.send_replace(ProgressSnapshot::new(
            UserId::new("u"),
            vec![TutorialId::new(1)],
        ));
        assert_eq!(sub.next().await, Some(50.0));

        catalog_tx.send_replace(vec![Tutorial::titled(1, 1, "A")]);
        assert_eq!(sub.next().await, Some(100.0));
    }

    #[tokio::test]
    async fn derived_keeps_following_the_open_input() {
        let (progress_tx, progress_rx) = watch::channel(ProgressSnapshot::placeholder());
        let (catalog_tx, catalog_rx) = watch::channel(vec![Tutorial::titled(1, 1, "A")]);
        let mut sub = DerivedSubscription::new(progress_rx, catalog_rx, snapshot_percentage);
        assert_eq!(sub.next().await, Some(0.0));

        drop(catalog_tx);
        progress_tx.send_replace(ProgressSnapshot::new(
            UserId::new("u"),
            vec![TutorialId::new(1)],
        ));
        assert_eq!(sub.next().await, Some(100.0));

        drop(progress_tx);
        assert_eq!(sub.next().await, None);
    }
}
