//! Identity resolution: who the memory rows of a run belong to.
//!
//! The acting user comes from an external identity provider. When it has no
//! authenticated user, a fixed placeholder id is used instead so a run can
//! always proceed.

use async_trait::async_trait;
use tracing::debug;

/// Placeholder id used when nobody is signed in.
pub const DEV_USER_ID: &str = "dev-user-id";

/// A source of the current user's id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The authenticated user's id, or `None` when there isn't one.
    async fn current_user_id(&self) -> Option<String>;
}

/// An identity fixed at construction (from config or environment).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    /// No authenticated user.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolve the user id for a run, substituting `fallback` when the provider
/// has no (or a blank) identity.
pub async fn resolve_user_id(provider: &dyn IdentityProvider, fallback: &str) -> String {
    match provider.current_user_id().await {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            debug!(fallback, "No authenticated user, using fallback identity");
            fallback.to_string()
        }
    }
}
