//! Request body extraction helper.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and unwrap it through
//! [`extract_json`], so a malformed body (bad JSON, unknown role or action)
//! surfaces as a 400 validation error instead of axum's default 422.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}
