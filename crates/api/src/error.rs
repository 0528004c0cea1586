use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use studies_core::error::CoreError;
use studies_core::types::DbId;
use studies_db::{DbError, QueryFailure};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`DbError`] for store errors,
/// and implements [`IntoResponse`] to produce `{ "error", "code" }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// No route matches the request's method and path.
    #[error("No route for {0}")]
    UnknownRoute(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Map [`DbError::NotFound`] to a typed 404 for `entity`/`id`; pass
    /// everything else through.
    pub fn lookup(entity: &'static str, id: DbId) -> impl FnOnce(DbError) -> AppError {
        move |err| match err {
            DbError::NotFound => AppError::Core(CoreError::NotFound { entity, id }),
            other => AppError::Database(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::DeletedStateInput { operation } => {
                    let code = if *operation == "create" {
                        "DELETE_VIA_POST_REQUEST_IS_FORBIDDEN"
                    } else {
                        "DELETE_VIA_PUT_REQUEST_IS_FORBIDDEN"
                    };
                    (StatusCode::BAD_REQUEST, code, core.to_string())
                }
                CoreError::InvalidCredentials => (
                    StatusCode::BAD_REQUEST,
                    "WRONG_PASSWORD_OR_EMAIL",
                    core.to_string(),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            AppError::Database(err) => classify_db_error(err),

            AppError::UnknownRoute(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - `NotFound` maps to 404.
/// - Duplicate keys map to 400 `DUPLICATE_FOUND`.
/// - Everything else is logged and maps to 500 with a sanitized message.
fn classify_db_error(err: &DbError) -> (StatusCode, &'static str, String) {
    match err {
        DbError::NotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        DbError::TaskDuplicateKey | DbError::TagDuplicateKey | DbError::UserDuplicateKey => (
            StatusCode::BAD_REQUEST,
            "DUPLICATE_FOUND",
            err.to_string(),
        ),
        other => {
            if matches!(other.failure(), Some(QueryFailure::DeadlineExceeded)) {
                tracing::error!(error = %other, "Database transaction timed out");
            } else {
                tracing::error!(error = %other, "Database error");
            }
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn duplicate_keys_are_bad_requests() {
        for err in [
            DbError::TaskDuplicateKey,
            DbError::TagDuplicateKey,
            DbError::UserDuplicateKey,
        ] {
            let (status, body) = render(err.into()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "DUPLICATE_FOUND");
        }
    }

    #[tokio::test]
    async fn infrastructure_failures_hide_details() {
        let err = DbError::query("loading tags (secret detail)", QueryFailure::DeadlineExceeded);
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"], "An internal error occurred");

        let (status, _) = render(DbError::Commit(QueryFailure::Canceled).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn deleted_state_code_depends_on_operation() {
        let (status, body) =
            render(CoreError::DeletedStateInput { operation: "create" }.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "DELETE_VIA_POST_REQUEST_IS_FORBIDDEN");

        let (_, body) = render(CoreError::DeletedStateInput { operation: "update" }.into()).await;
        assert_eq!(body["code"], "DELETE_VIA_PUT_REQUEST_IS_FORBIDDEN");
    }

    #[tokio::test]
    async fn wrong_credentials_are_bad_request() {
        let (status, body) = render(CoreError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "WRONG_PASSWORD_OR_EMAIL");
    }

    #[test]
    fn lookup_turns_missing_rows_into_typed_not_found() {
        let err = AppError::lookup("Tag", 7)(DbError::NotFound);
        assert!(matches!(
            err,
            AppError::Core(CoreError::NotFound { entity: "Tag", id: 7 })
        ));

        let err = AppError::lookup("Tag", 7)(DbError::TagDuplicateKey);
        assert!(matches!(err, AppError::Database(DbError::TagDuplicateKey)));
    }
}
