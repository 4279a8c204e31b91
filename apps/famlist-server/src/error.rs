//! HTTP error type and wire mapping.
//!
//! Domain errors carry their own HTTP status. Internal errors are logged
//! server-side and presented to clients as an opaque 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use famlist_storage::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("missing or malformed identity headers")]
    Unauthorized,

    #[error("not allowed")]
    Forbidden,

    #[error("not found")]
    NotFound,

    /// 400-class domain rule violations (last admin, duplicate invitation,
    /// inviting an existing member).
    #[error("{0}")]
    Rule(String),

    #[error("invitation has already been responded to")]
    AlreadyResponded,

    #[error("invitation has expired")]
    Expired,

    #[error("internal error")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Rule(_) => (StatusCode::BAD_REQUEST, "rule_violation"),
            AppError::AlreadyResponded => (StatusCode::CONFLICT, "already_responded"),
            AppError::Expired => (StatusCode::GONE, "expired"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            StoreError::AlreadyResponded => AppError::AlreadyResponded,
            StoreError::Expired => AppError::Expired,
            StoreError::LastAdmin
            | StoreError::AlreadyMember
            | StoreError::DuplicateInvitation
            | StoreError::AlreadyExists => AppError::Rule(err.to_string()),
            StoreError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never leak backend detail to clients.
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": { "code": code, "message": message }
        }));

        (status, body).into_response()
    }
}
