//! Role-checked administrative operations.

use std::sync::Arc;

use pslang_domain::{
    AlphaSignup, Feedback, IdentityUser, PsLangError, Result, UserFilter, UserRole,
};
use serde_json::{json, Map};
use tracing::{info, instrument};

use super::ports::IdentityProvider;
use crate::account::AccountService;

/// Default page size for admin listings.
pub const DEFAULT_ADMIN_LIMIT: u32 = 100;

/// Fail with `Forbidden` unless `actor` holds at least `required`.
pub fn require_role(actor: &IdentityUser, required: UserRole) -> Result<()> {
    if actor.role().satisfies(required) {
        Ok(())
    } else {
        Err(PsLangError::Forbidden(format!("{required} role required")))
    }
}

pub struct AdminService {
    identity: Arc<dyn IdentityProvider>,
    accounts: Arc<AccountService>,
}

impl AdminService {
    pub fn new(identity: Arc<dyn IdentityProvider>, accounts: Arc<AccountService>) -> Self {
        Self { identity, accounts }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn list_users(
        &self,
        actor: &IdentityUser,
        filter: &UserFilter,
    ) -> Result<Vec<IdentityUser>> {
        require_role(actor, UserRole::SuperAdmin)?;
        self.identity.list_users(filter).await
    }

    /// Change a user's role. Super admins cannot demote themselves.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn set_role(
        &self,
        actor: &IdentityUser,
        user_id: &str,
        role: UserRole,
    ) -> Result<IdentityUser> {
        require_role(actor, UserRole::SuperAdmin)?;
        if actor.id == user_id && role != UserRole::SuperAdmin {
            return Err(PsLangError::BadRequest("cannot demote yourself".into()));
        }

        let mut patch = Map::new();
        patch.insert("role".to_string(), json!(role.as_str()));
        let updated = self.identity.update_metadata(user_id, patch).await?;

        info!(user_id, %role, "role updated");
        Ok(updated)
    }

    /// Delete a user from the identity provider, then their local data.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_user(&self, actor: &IdentityUser, user_id: &str) -> Result<()> {
        require_role(actor, UserRole::SuperAdmin)?;
        if actor.id == user_id {
            return Err(PsLangError::BadRequest("cannot delete yourself".into()));
        }

        self.identity.delete_user(user_id).await?;
        self.accounts.delete_local_data(user_id).await?;

        info!(user_id, "user deleted");
        Ok(())
    }

    pub async fn list_feedback(&self, actor: &IdentityUser, limit: u32) -> Result<Vec<Feedback>> {
        require_role(actor, UserRole::Admin)?;
        self.accounts.list_feedback(limit).await
    }

    pub async fn list_alpha_signups(
        &self,
        actor: &IdentityUser,
        limit: u32,
    ) -> Result<Vec<AlphaSignup>> {
        require_role(actor, UserRole::Admin)?;
        self.accounts.list_alpha_signups(limit).await
    }
}
