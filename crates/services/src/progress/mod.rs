mod store;
mod subscription;

// Public API of the progress subsystem.
pub use store::{ProgressStore, SyncOutcome};
pub use subscription::{DerivedSubscription, Subscription};
