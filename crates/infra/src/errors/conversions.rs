//! Conversions from SQLCipher and HTTP errors into domain errors.

use pslang_domain::PsLangError;
use reqwest::Error as HttpError;
use rusqlite::ffi::ErrorCode;
use rusqlite::Error as SqlError;

use crate::database::sqlcipher_pool::{looks_like_wrong_key, wrong_key};

// SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
const UNIQUE_CONSTRAINT_CODES: [i32; 2] = [2067, 1555];

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PsLangError);

impl From<InfraError> for PsLangError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        Self(map_sql(err))
    }
}

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        Self(map_http(&err))
    }
}

fn map_sql(err: SqlError) -> PsLangError {
    match err {
        SqlError::SqliteFailure(ffi, message) => {
            let message = message.unwrap_or_default();
            match ffi.code {
                ErrorCode::ConstraintViolation
                    if UNIQUE_CONSTRAINT_CODES.contains(&ffi.extended_code) =>
                {
                    PsLangError::Conflict(duplicate_key(&message))
                }
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    PsLangError::Database(format!("database is busy: {message}"))
                }
                ErrorCode::NotADatabase => wrong_key(),
                _ if looks_like_wrong_key(&message) => wrong_key(),
                _ => PsLangError::Database(format!("{:?}: {message}", ffi.code)),
            }
        }
        SqlError::QueryReturnedNoRows => PsLangError::NotFound("record not found".into()),
        // Enum and JSON columns that no longer parse.
        SqlError::FromSqlConversionFailure(column, _, cause) => {
            PsLangError::Database(format!("stored value in column {column} is corrupt: {cause}"))
        }
        other => PsLangError::Database(other.to_string()),
    }
}

/// `"UNIQUE constraint failed: alpha_signups.email"` -> `"duplicate alpha_signups.email"`.
fn duplicate_key(message: &str) -> String {
    match message.rsplit_once(": ") {
        Some((_, columns)) if !columns.is_empty() => format!("duplicate {columns}"),
        _ => "record already exists".into(),
    }
}

fn map_http(err: &HttpError) -> PsLangError {
    if err.is_builder() {
        return PsLangError::Config(format!("invalid provider request: {err}"));
    }
    if err.is_timeout() {
        return PsLangError::Upstream("provider request timed out".into());
    }
    if err.is_connect() {
        return PsLangError::Upstream("could not reach provider".into());
    }
    if err.is_decode() {
        return PsLangError::Upstream(format!("unexpected provider response: {err}"));
    }
    match err.status().map(|s| s.as_u16()) {
        Some(401) => PsLangError::Unauthorized(format!("provider rejected credentials: {err}")),
        _ => PsLangError::Upstream(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use rusqlite::ffi::Error as FfiError;
    use rusqlite::types::Type;
    use serde::Deserialize;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sqlite_failure(code: ErrorCode, extended_code: i32, message: &str) -> PsLangError {
        InfraError::from(SqlError::SqliteFailure(
            FfiError { code, extended_code },
            Some(message.into()),
        ))
        .into()
    }

    #[test]
    fn unique_violation_names_the_duplicate_column() {
        let mapped = sqlite_failure(
            ErrorCode::ConstraintViolation,
            2067,
            "UNIQUE constraint failed: alpha_signups.email",
        );
        assert!(
            matches!(&mapped, PsLangError::Conflict(msg) if msg == "duplicate alpha_signups.email"),
            "got {mapped:?}"
        );
    }

    #[test]
    fn other_constraints_stay_database_errors() {
        let mapped = sqlite_failure(ErrorCode::ConstraintViolation, 787, "FOREIGN KEY constraint failed");
        assert!(matches!(mapped, PsLangError::Database(_)));
    }

    #[test]
    fn wrong_key_is_a_config_error() {
        let mapped = sqlite_failure(ErrorCode::NotADatabase, 26, "file is not a database");
        assert!(matches!(mapped, PsLangError::Config(_)));
    }

    #[test]
    fn corrupt_enum_column_is_a_database_error() {
        let cause = PsLangError::BadRequest("unknown provider: bard".into());
        let err = SqlError::FromSqlConversionFailure(2, Type::Text, Box::new(cause));

        let mapped: PsLangError = InfraError::from(err).into();
        assert!(matches!(&mapped, PsLangError::Database(msg) if msg.contains("column 2")));
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        let err = Client::new().get("not a url").build().unwrap_err();
        let mapped: PsLangError = InfraError::from(err).into();
        assert!(matches!(mapped, PsLangError::Config(_)));
    }

    #[tokio::test]
    async fn undecodable_body_is_upstream() {
        #[derive(Debug, Deserialize)]
        struct Conversations {
            #[allow(dead_code)]
            data: Vec<String>,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let err = client
            .get(server.uri())
            .send()
            .await
            .unwrap()
            .json::<Conversations>()
            .await
            .unwrap_err();

        let mapped: PsLangError = InfraError::from(err).into();
        assert!(matches!(mapped, PsLangError::Upstream(_)), "got {mapped:?}");
    }

    #[tokio::test]
    async fn status_401_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(401)).mount(&server).await;

        let client = Client::builder().no_proxy().build().unwrap();
        let err =
            client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: PsLangError = InfraError::from(err).into();
        assert!(matches!(mapped, PsLangError::Unauthorized(_)));
    }
}
