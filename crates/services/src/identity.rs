use std::sync::Arc;

use async_trait::async_trait;
use learn_core::model::UserId;
use tokio::sync::watch;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: UserId,
}

impl UserIdentity {
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self { uid: uid.into() }
    }
}

/// Source of the current user.
///
/// Each call yields one value: the user signed in right now, if any.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserIdentity>;
}

/// Identity fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(uid: impl Into<UserId>) -> Self {
        Self {
            user: Some(UserIdentity::new(uid)),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}

/// Identity that can change over time (sign-in, sign-out).
#[derive(Clone)]
pub struct IdentityHandle {
    tx: Arc<watch::Sender<Option<UserIdentity>>>,
}

impl IdentityHandle {
    #[must_use]
    pub fn new(user: Option<UserIdentity>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { tx: Arc::new(tx) }
    }

    pub fn sign_in(&self, uid: impl Into<UserId>) {
        self.tx.send_replace(Some(UserIdentity::new(uid)));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl IdentityProvider for IdentityHandle {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.tx.borrow().clone()
    }
}
