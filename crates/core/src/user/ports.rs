//! Port interfaces for the external identity provider
//!
//! Users, sessions and role metadata live in the identity provider; these
//! traits define the boundary the core talks to.

use async_trait::async_trait;
use pslang_domain::{IdentityUser, Result, UserFilter};

/// Trait for identity provider access
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a session token to its user.
    ///
    /// # Errors
    /// `Unauthorized` when the token is missing, invalid or expired.
    async fn current_user(&self, session_token: &str) -> Result<IdentityUser>;

    /// List users matching a filter
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<IdentityUser>>;

    /// Merge `patch` into a user's public metadata and return the updated user
    async fn update_metadata(
        &self,
        user_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<IdentityUser>;

    /// Delete a user from the identity provider
    async fn delete_user(&self, user_id: &str) -> Result<()>;
}
