//! JSON error boundary for handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pslang_domain::PsLangError;
use serde::Serialize;
use tracing::{error, warn};

use crate::utils::logging::error_label;

/// Handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// A domain error on its way out as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub PsLangError);

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl From<PsLangError> for ApiError {
    fn from(err: PsLangError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PsLangError::BadRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(PsLangError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(label = error_label(&self.0), code = self.0.code(), error = %self.0, "request failed");
        } else {
            warn!(label = error_label(&self.0), code = self.0.code(), "request rejected");
        }

        let body = ErrorBody { error: self.0.code(), message: self.0.message() };
        (status, Json(body)).into_response()
    }
}
