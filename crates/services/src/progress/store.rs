use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use learn_core::model::{ProgressCardView, ProgressSnapshot, TutorialId, UserId};
use learn_core::progress::{progress_card_view, snapshot_percentage};
use tokio::sync::watch;

use super::subscription::{DerivedSubscription, Subscription};
use crate::catalog::TutorialCatalog;
use crate::error::ProgressError;
use crate::identity::IdentityProvider;
use crate::progress_api::ProgressApi;

/// What a store operation ended up doing.
///
/// Informational only: failures are logged inside the store and never
/// returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new snapshot was published.
    Applied,
    /// Nothing to do; no request was sent.
    Skipped,
    /// The request succeeded but a later request had already been applied.
    Superseded,
    /// The request failed or could not be sent; the snapshot is unchanged.
    Failed,
}

/// Client-side cache of the signed-in user's tutorial progress.
///
/// Holds a single snapshot, replaced wholesale on every successful fetch or
/// mutation and republished to every subscriber. Cloning shares the cache.
///
/// Fetch and completion requests take a ticket when they are sent. A server
/// snapshot whose ticket is older than the last applied one is dropped, so a
/// slow response can never overwrite a fresher snapshot. Removals and resets
/// carry no snapshot: on success they are applied to whatever is current.
#[derive(Clone)]
pub struct ProgressStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    api: Arc<dyn ProgressApi>,
    identity: Arc<dyn IdentityProvider>,
    catalog: TutorialCatalog,
    progress_tx: watch::Sender<ProgressSnapshot>,
    issued: AtomicU64,
    applied: Mutex<u64>,
    initialized: AtomicBool,
}

impl ProgressStore {
    /// Create a store publishing the placeholder snapshot.
    ///
    /// Nothing is fetched until `initialize` runs.
    #[must_use]
    pub fn new(
        api: Arc<dyn ProgressApi>,
        identity: Arc<dyn IdentityProvider>,
        catalog: TutorialCatalog,
    ) -> Self {
        let (progress_tx, _rx) = watch::channel(ProgressSnapshot::placeholder());
        Self {
            inner: Arc::new(StoreInner {
                api,
                identity,
                catalog,
                progress_tx,
                issued: AtomicU64::new(0),
                applied: Mutex::new(0),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    /// Create a store and load the current user's progress.
    pub async fn connect(
        api: Arc<dyn ProgressApi>,
        identity: Arc<dyn IdentityProvider>,
        catalog: TutorialCatalog,
    ) -> Self {
        let store = Self::new(api, identity, catalog);
        store.initialize().await;
        store
    }

    /// Load the progress of the user signed in right now.
    ///
    /// Runs once per store: later calls are skipped, and identity changes do
    /// not trigger a new fetch.
    pub async fn initialize(&self) -> SyncOutcome {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("progress store already initialized");
            return SyncOutcome::Skipped;
        }

        let user = match self.inner.identity.current_user().await {
            Some(user) if !user.uid.is_empty() => user,
            _ => {
                tracing::error!(
                    error = %ProgressError::UnidentifiedUser,
                    "failed to fetch user progress"
                );
                return SyncOutcome::Failed;
            }
        };

        let ticket = self.next_ticket();
        match self.inner.api.fetch(&user.uid).await {
            Ok(snapshot) => self.publish_echo(ticket, snapshot),
            Err(err) => {
                tracing::error!(error = %err, user_id = %user.uid, "failed to fetch user progress");
                SyncOutcome::Failed
            }
        }
    }

    /// Last published snapshot (the placeholder until the first fetch lands).
    #[must_use]
    pub fn current_progress(&self) -> ProgressSnapshot {
        self.inner.progress_tx.borrow().clone()
    }

    #[must_use]
    pub fn progress_stream(&self) -> Subscription<ProgressSnapshot> {
        Subscription::new(self.inner.progress_tx.subscribe())
    }

    /// Completion percentage, following both the snapshot and the catalog.
    #[must_use]
    pub fn percentage_stream(&self) -> DerivedSubscription<f64> {
        DerivedSubscription::new(
            self.inner.progress_tx.subscribe(),
            self.inner.catalog.subscribe(),
            snapshot_percentage,
        )
    }

    #[must_use]
    pub fn progress_card_view(&self) -> DerivedSubscription<ProgressCardView> {
        DerivedSubscription::new(
            self.inner.progress_tx.subscribe(),
            self.inner.catalog.subscribe(),
            progress_card_view,
        )
    }

    #[must_use]
    pub fn is_completed(&self, tutorial_id: TutorialId) -> bool {
        self.inner.progress_tx.borrow().is_completed(tutorial_id)
    }

    /// Catalog the derived views are computed against.
    #[must_use]
    pub fn catalog(&self) -> &TutorialCatalog {
        &self.inner.catalog
    }

    /// Mark a tutorial as completed; the server's snapshot replaces ours.
    pub async fn mark_completed(&self, tutorial_id: TutorialId) -> SyncOutcome {
        if self.is_completed(tutorial_id) {
            tracing::debug!(%tutorial_id, "tutorial already completed");
            return SyncOutcome::Skipped;
        }
        let Some(user_id) = self.identified_user() else {
            tracing::error!(
                error = %ProgressError::UnidentifiedUser,
                %tutorial_id,
                "failed to mark tutorial as completed"
            );
            return SyncOutcome::Failed;
        };

        let ticket = self.next_ticket();
        match self.inner.api.complete(&user_id, tutorial_id).await {
            Ok(snapshot) => self.publish_echo(ticket, snapshot),
            Err(err) => {
                tracing::error!(error = %err, %tutorial_id, "failed to mark tutorial as completed");
                SyncOutcome::Failed
            }
        }
    }

    /// Remove a completion mark; the id is filtered out locally on success.
    pub async fn mark_not_completed(&self, tutorial_id: TutorialId) -> SyncOutcome {
        if !self.is_completed(tutorial_id) {
            tracing::debug!(%tutorial_id, "tutorial not completed");
            return SyncOutcome::Skipped;
        }
        let Some(user_id) = self.identified_user() else {
            tracing::error!(
                error = %ProgressError::UnidentifiedUser,
                %tutorial_id,
                "failed to remove tutorial completion"
            );
            return SyncOutcome::Failed;
        };

        match self.inner.api.remove_completion(&user_id, tutorial_id).await {
            Ok(()) => self.publish_local(|current| current.without(tutorial_id)),
            Err(err) => {
                tracing::error!(error = %err, %tutorial_id, "failed to remove tutorial completion");
                SyncOutcome::Failed
            }
        }
    }

    /// Clear every completion mark of the current user.
    pub async fn reset_all(&self) -> SyncOutcome {
        let Some(user_id) = self.identified_user() else {
            tracing::error!(
                error = %ProgressError::UnidentifiedUser,
                "failed to reset learning progress"
            );
            return SyncOutcome::Failed;
        };

        match self.inner.api.remove_all(&user_id).await {
            Ok(()) => self.publish_local(ProgressSnapshot::cleared),
            Err(err) => {
                tracing::error!(error = %err, %user_id, "failed to reset learning progress");
                SyncOutcome::Failed
            }
        }
    }

    fn identified_user(&self) -> Option<UserId> {
        let snapshot = self.inner.progress_tx.borrow();
        (!snapshot.user_id.is_empty()).then(|| snapshot.user_id.clone())
    }

    fn next_ticket(&self) -> u64 {
        self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a snapshot echoed by the server unless a later-issued echo
    /// already landed.
    fn publish_echo(&self, ticket: u64, snapshot: ProgressSnapshot) -> SyncOutcome {
        let mut applied = self
            .inner
            .applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if ticket < *applied {
            tracing::warn!(ticket, applied = *applied, "discarding superseded progress response");
            return SyncOutcome::Superseded;
        }
        *applied = ticket;
        self.publish_local(|_| snapshot)
    }

    /// Recompute the snapshot from the current one and publish it.
    fn publish_local(
        &self,
        next: impl FnOnce(&ProgressSnapshot) -> ProgressSnapshot,
    ) -> SyncOutcome {
        self.inner.progress_tx.send_modify(|current| {
            *current = next(current);
            tracing::debug!(
                user_id = %current.user_id,
                completed = current.completed_count(),
                "progress snapshot published"
            );
        });
        SyncOutcome::Applied
    }
}
