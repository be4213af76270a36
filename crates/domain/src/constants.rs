//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Conversation titles
/// Longest derived title, in characters, before truncation.
pub const MAX_TITLE_LENGTH: usize = 80;
/// Appended to truncated titles.
pub const TITLE_TRUNCATE_SUFFIX: &str = "...";
/// Title used when no user message has text.
pub const UNTITLED_CONVERSATION: &str = "Untitled conversation";

// OAuth state tokens
/// Lifetime of an OAuth `state` token.
pub const DEFAULT_STATE_TTL_SECS: i64 = 600;
/// Shortest accepted state-signing secret, in bytes.
pub const MIN_STATE_SECRET_LENGTH: usize = 32;

// Account inputs
/// Longest accepted feedback message, in characters.
pub const MAX_FEEDBACK_LENGTH: usize = 5000;
/// Longest accepted email address.
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Longest accepted alpha signup use case, in characters.
pub const MAX_ALPHA_USE_CASE_LENGTH: usize = 2000;

// Redirect targets (appended to the public app URL)
/// Connector settings page that OAuth callbacks redirect to.
pub const CONNECTOR_SETTINGS_PATH: &str = "/settings/connectors";

// HTTP
/// Per-request timeout for outbound HTTP.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// User agent sent on outbound HTTP.
pub const USER_AGENT: &str = concat!("pslang/", env!("CARGO_PKG_VERSION"));
