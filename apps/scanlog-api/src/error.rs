//! Error types for the scanlog API.
//!
//! Every handler failure becomes `{"code": "...", "message": "..."}` with a
//! status chosen by category:
//!
//! ```text
//! ValidationError ──► 400  INVALID_ID | EMPTY_UPDATE | BAD_REQUEST
//! no matching row ──► 404  NOT_FOUND
//! DbError         ──► 500  STORAGE_ERROR  (detail logged, not returned)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use scanlog_core::ValidationError;
use scanlog_db::DbError;

/// Stable error code constants. Clients match on these, never on `message`.
pub mod error_code {
    pub const INVALID_ID: &str = "INVALID_ID";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const EMPTY_UPDATE: &str = "EMPTY_UPDATE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Message returned in place of storage failure detail.
pub const STORAGE_FAILURE_MESSAGE: &str = "Storage operation failed";

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Path id is not `^\d+$`. HTTP 400.
    #[error("{0}")]
    InvalidId(String),

    /// Body missing, malformed or carrying unknown fields. HTTP 400.
    #[error("{0}")]
    BadRequest(String),

    /// Update body with nothing to apply. HTTP 400.
    #[error("{0}")]
    EmptyUpdate(String),

    /// No record with that id. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Storage engine failure. HTTP 500.
    #[error("Storage operation failed")]
    Storage(#[source] DbError),
}

impl ApiError {
    /// Not-found error for record `id`.
    pub fn code_not_found(id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("Code {id} not found"))
    }

    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidId(_) => error_code::INVALID_ID,
            ApiError::BadRequest(_) => error_code::BAD_REQUEST,
            ApiError::EmptyUpdate(_) => error_code::EMPTY_UPDATE,
            ApiError::NotFound(_) => error_code::NOT_FOUND,
            ApiError::Storage(_) => error_code::STORAGE_ERROR,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_) | ApiError::BadRequest(_) | ApiError::EmptyUpdate(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidId { .. } => ApiError::InvalidId(err.to_string()),
            ValidationError::EmptyPatch => ApiError::EmptyUpdate(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(detail) = &self {
            error!(error = %detail, "Storage failure");
        }

        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(ApiError::InvalidId("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyUpdate("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Storage(DbError::PoolExhausted).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_map_to_codes() {
        let err: ApiError = ValidationError::InvalidId { value: "a".into() }.into();
        assert_eq!(err.error_code(), "INVALID_ID");

        let err: ApiError = ValidationError::EmptyPatch.into();
        assert_eq!(err.error_code(), "EMPTY_UPDATE");
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err: ApiError = DbError::QueryFailed("disk I/O error at page 7".into()).into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert_eq!(err.to_string(), STORAGE_FAILURE_MESSAGE);
    }

    #[test]
    fn db_not_found_is_404() {
        let err: ApiError = DbError::not_found("Code", 3).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
