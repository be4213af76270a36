use std::time::Duration;

use pslang_domain::PsLangError;
use tracing::{info, warn};

/// Log the outcome of one HTTP request with structured fields.
///
/// `route` is the matched route template, never the raw path, so provider
/// codes and user ids stay out of the logs.
#[inline]
pub fn log_request_outcome(method: &str, route: &str, status: u16, elapsed: Duration) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if status >= 500 {
        warn!(method, route, status, duration_ms, "request_failed");
    } else {
        info!(method, route, status, duration_ms, "request_completed");
    }
}

/// Convert a `PsLangError` into a stable, coarse label suitable for logging.
#[inline]
pub fn error_label(error: &PsLangError) -> &'static str {
    match error {
        PsLangError::Unauthorized(_) | PsLangError::Forbidden(_) | PsLangError::TokenExpired(_) => {
            "auth"
        }
        PsLangError::BadRequest(_) => "invalid_input",
        PsLangError::NotFound(_) => "not_found",
        PsLangError::Conflict(_) | PsLangError::NotConnected(_) => "conflict",
        PsLangError::Upstream(_) | PsLangError::TokenExchange(_) => "upstream",
        PsLangError::Config(_) => "config",
        PsLangError::Database(_) => "database",
        PsLangError::Internal(_) => "internal",
    }
}
