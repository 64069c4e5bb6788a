#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod progress;
pub mod progress_api;

pub use learn_core::model;

pub use catalog::TutorialCatalog;
pub use config::ProgressApiConfig;
pub use error::{CatalogError, ConfigError, ProgressError};
pub use identity::{IdentityHandle, IdentityProvider, StaticIdentity, UserIdentity};
pub use progress::{DerivedSubscription, ProgressStore, Subscription, SyncOutcome};
pub use progress_api::{HttpProgressApi, InMemoryProgressApi, ProgressApi};
