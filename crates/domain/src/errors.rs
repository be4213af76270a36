//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for PS-LANG services
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PsLangError {
    /// Missing or invalid session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role is insufficient.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or malformed input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate unique key.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Third-party API failure. The message is diagnostic text only.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Missing or invalid configuration, including a rejected database key.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider token endpoint rejected an authorization code.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// No `connected` credential exists for the (user, provider) pair.
    #[error("Connector not connected: {0}")]
    NotConnected(String),

    /// The provider answered 401 for a stored access token.
    #[error("Connector token expired: {0}")]
    TokenExpired(String),

    /// Storage failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Bug or unexpected runtime failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PsLangError {
    /// HTTP status code for the error when it crosses the API boundary.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) | Self::TokenExpired(_) => 401,
            Self::Forbidden(_) => 403,
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::NotConnected(_) => 409,
            Self::Upstream(_)
            | Self::Config(_)
            | Self::TokenExchange(_)
            | Self::Database(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code, used as the `error` field of JSON
    /// error bodies and as a log label.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Upstream(_) => "upstream_error",
            Self::Config(_) => "configuration_error",
            Self::TokenExchange(_) => "token_exchange_error",
            Self::NotConnected(_) => "not_connected",
            Self::TokenExpired(_) => "token_expired",
            Self::Database(_) => "database_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// The diagnostic message carried by the variant.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Upstream(msg)
            | Self::Config(msg)
            | Self::TokenExchange(msg)
            | Self::NotConnected(msg)
            | Self::TokenExpired(msg)
            | Self::Database(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias for PS-LANG operations
pub type Result<T> = std::result::Result<T, PsLangError>;
