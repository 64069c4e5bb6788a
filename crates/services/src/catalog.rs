use std::path::Path;
use std::sync::Arc;

use learn_core::model::Tutorial;
use tokio::sync::watch;

use crate::error::CatalogError;

/// Watchable, ordered list of the tutorials that make up a learning path.
///
/// The catalog is owned by whoever supplies it; the progress store only
/// subscribes. Cloning the handle shares the same channel.
#[derive(Clone)]
pub struct TutorialCatalog {
    tx: Arc<watch::Sender<Vec<Tutorial>>>,
}

impl TutorialCatalog {
    #[must_use]
    pub fn new(tutorials: Vec<Tutorial>) -> Self {
        let (tx, _rx) = watch::channel(tutorials);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a JSON array of tutorials, keeping the array order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the document is not a tutorial array.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let tutorials: Vec<Tutorial> = serde_json::from_str(raw)?;
        Ok(Self::new(tutorials))
    }

    /// Load a JSON catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Swap in a new catalog; subscribers are notified.
    pub fn replace(&self, tutorials: Vec<Tutorial>) {
        let count = tutorials.len();
        self.tx.send_replace(tutorials);
        tracing::debug!(count, "tutorial catalog replaced");
    }

    #[must_use]
    pub fn tutorials(&self) -> Vec<Tutorial> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Vec<Tutorial>> {
        self.tx.subscribe()
    }
}

impl Default for TutorialCatalog {
    fn default() -> Self {
        Self::empty()
    }
}
