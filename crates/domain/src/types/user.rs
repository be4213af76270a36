//! User identity types
//!
//! Users live in the external identity provider; roles are stored in its
//! public metadata under the `role` key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PsLangError;

/// Role stored in identity-provider metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular account.
    #[default]
    User,
    /// Can read feedback and alpha signups.
    Admin,
    /// Can also list users, change roles and delete users.
    SuperAdmin,
}

impl UserRole {
    /// Metadata value for this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Whether this role grants at least the privileges of `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = PsLangError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            other => Err(PsLangError::BadRequest(format!("unknown role: {other}"))),
        }
    }
}

/// User as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    /// Identity-provider user id.
    pub id: String,
    /// Primary email address.
    pub email: String,
    /// Public metadata; `role` lives here.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl IdentityUser {
    /// Role read from metadata; anything unrecognised is a plain user.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.metadata
            .get("role")
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

/// Filter for listing identity-provider users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {
    /// Email address to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Exact role match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Maximum number of users returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
