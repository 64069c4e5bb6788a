use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use learn_core::model::{ProgressSnapshot, TutorialId, UserId};
use reqwest::{Client, Response};
use serde::Serialize;
use url::Url;

use crate::config::ProgressApiConfig;
use crate::error::ProgressError;

/// Remote contract for a user's tutorial progress.
///
/// Every call is a single attempt: no retry, no timeout.
#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// Load the stored progress for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the request fails or the backend rejects it.
    async fn fetch(&self, user_id: &UserId) -> Result<ProgressSnapshot, ProgressError>;

    /// Record `tutorial_id` as completed and return the authoritative snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the request fails or the backend rejects it.
    async fn complete(
        &self,
        user_id: &UserId,
        tutorial_id: TutorialId,
    ) -> Result<ProgressSnapshot, ProgressError>;

    /// Remove the completion mark for `tutorial_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the request fails or the backend rejects it.
    async fn remove_completion(
        &self,
        user_id: &UserId,
        tutorial_id: TutorialId,
    ) -> Result<(), ProgressError>;

    /// Remove every completion mark of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the request fails or the backend rejects it.
    async fn remove_all(&self, user_id: &UserId) -> Result<(), ProgressError>;
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    user_id: &'a UserId,
    tutorial_id: TutorialId,
}

/// `ProgressApi` backed by the progress REST endpoint.
#[derive(Clone)]
pub struct HttpProgressApi {
    client: Client,
    base_url: Url,
}

impl HttpProgressApi {
    #[must_use]
    pub fn new(config: ProgressApiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    #[must_use]
    pub fn with_client(client: Client, config: ProgressApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProgressError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProgressError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn ensure_success(response: Response) -> Result<Response, ProgressError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProgressError::HttpStatus(status))
    }
}

#[async_trait]
impl ProgressApi for HttpProgressApi {
    async fn fetch(&self, user_id: &UserId) -> Result<ProgressSnapshot, ProgressError> {
        let url = self.endpoint(&[user_id.as_str()])?;
        tracing::debug!(%url, "fetching progress");

        let response = self.client.get(url).send().await?;
        let snapshot = ensure_success(response)?.json().await?;
        Ok(snapshot)
    }

    async fn complete(
        &self,
        user_id: &UserId,
        tutorial_id: TutorialId,
    ) -> Result<ProgressSnapshot, ProgressError> {
        let url = self.endpoint(&["complete-tutorial"])?;
        tracing::debug!(%url, %tutorial_id, "completing tutorial");

        let response = self
            .client
            .post(url)
            .json(&CompletionRequest {
                user_id,
                tutorial_id,
            })
            .send()
            .await?;
        let snapshot = ensure_success(response)?.json().await?;
        Ok(snapshot)
    }

    async fn remove_completion(
        &self,
        user_id: &UserId,
        tutorial_id: TutorialId,
    ) -> Result<(), ProgressError> {
        let url = self.endpoint(&["remove-completion"])?;
        tracing::debug!(%url, %tutorial_id, "removing tutorial completion");

        let response = self
            .client
            .delete(url)
            .json(&CompletionRequest {
                user_id,
                tutorial_id,
            })
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn remove_all(&self, user_id: &UserId) -> Result<(), ProgressError> {
        let url = self.endpoint(&["remove-all", user_id.as_str()])?;
        tracing::debug!(%url, "removing all completions");

        let response = self.client.delete(url).send().await?;
        ensure_success(response)?;
        Ok(())
    }
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory backend for testing and prototyping.
///
/// Mirrors the server: completing appends the id once, fetching an unknown
/// user yields an empty record. Counts every call and can be switched into a
/// failing mode.
#[derive(Clone, Default)]
pub struct InMemoryProgressApi {
    records: Arc<Mutex<HashMap<UserId, Vec<TutorialId>>>>,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl InMemoryProgressApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed stored progress for a user.
    #[must_use]
    pub fn with_progress(self, user_id: UserId, completed: Vec<TutorialId>) -> Self {
        if let Ok(mut guard) = self.records.lock() {
            guard.insert(user_id, completed);
        }
        self
    }

    /// Make every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls received so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Completed ids currently stored for `user_id`.
    #[must_use]
    pub fn stored(&self, user_id: &UserId) -> Vec<TutorialId> {
        self.records
            .lock()
            .ok()
            .and_then(|guard| guard.get(user_id).cloned())
            .unwrap_or_default()
    }

    fn begin_call(&self) -> Result<(), ProgressError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProgressError::Unavailable("in-memory backend set to fail".into()));
        }
        Ok(())
    }

    fn with_records<T>(
        &self,
        f: impl FnOnce(&mut HashMap<UserId, Vec<TutorialId>>) -> T,
    ) -> Result<T, ProgressError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| ProgressError::Unavailable(e.to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl ProgressApi for InMemoryProgressApi {
    async fn fetch(&self, user_id: &UserId) -> Result<ProgressSnapshot, ProgressError> {
        self.begin_call()?;
        self.with_records(|records| {
            let completed = records.get(user_id).cloned().unwrap_or_default();
            ProgressSnapshot::new(user_id.clone(), completed)
        })
    }

    async fn complete(
        &self,
        user_id: &UserId,
        tutorial_id: TutorialId,
    ) -> Result<ProgressSnapshot, ProgressError> {
        self.begin_call()?;
        self.with_records(|records| {
            let completed = records.entry(user_id.clone()).or_default();
            if !completed.contains(&tutorial_id) {
                completed.push(tutorial_id);
            }
            ProgressSnapshot::new(user_id.clone(), completed.clone())
        })
    }

    async fn remove_completion(
        &self,
        user_id: &UserId,
        tutorial_id: TutorialId,
    ) -> Result<(), ProgressError> {
        self.begin_call()?;
        self.with_records(|records| {
            if let Some(completed) = records.get_mut(user_id) {
                completed.retain(|id| *id != tutorial_id);
            }
        })
    }

    async fn remove_all(&self, user_id: &UserId) -> Result<(), ProgressError> {
        self.begin_call()?;
        self.with_records(|records| {
            records.remove(user_id);
        })
    }
}
