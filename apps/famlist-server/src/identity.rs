//! Caller identity, asserted by the authenticating reverse proxy.
//!
//! The proxy terminates authentication and forwards the verified identity in
//! `x-famlist-user-id` and `x-famlist-user-email`. Requests without both
//! headers are rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use famlist_storage::UserId;
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-famlist-user-id";
pub const USER_EMAIL_HEADER: &str = "x-famlist-user-email";

#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

impl Identity {
    /// Case-insensitive comparison against a stored (lowercased) email.
    pub fn email_matches(&self, other: &str) -> bool {
        self.email.eq_ignore_ascii_case(other)
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::try_parse(v).ok())
            .map(UserId)
            .ok_or(AppError::Unauthorized)?;

        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.contains('@'))
            .map(|v| v.to_string())
            .ok_or(AppError::Unauthorized)?;

        Ok(Identity { user_id, email })
    }
}
