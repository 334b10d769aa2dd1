use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Storage-layer failure (connectivity, query execution).
    DatabaseError(sqlx::Error),
    /// A lead row that should exist is gone; logic error, not expected in
    /// normal operation.
    NotFound(String),
    /// Client input rejected; carries a machine-readable code such as
    /// `email_required` or `email_invalid`.
    Validation(&'static str),
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Validation(code) => write!(f, "Validation failed: {}", code),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Validation failures answer 400 with the machine-readable code in the
    /// body; everything else collapses to an opaque 500 while the full error
    /// is logged server-side.
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::NotFound(msg) => {
                tracing::error!("Lead row missing: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Validation(code) => (StatusCode::BAD_REQUEST, *code),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = Json(json!({
            "ok": false,
            "error": error_code,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}
