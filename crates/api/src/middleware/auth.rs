//! Caller identity extraction.
//!
//! The API sits behind a gateway that authenticates the caller and forwards
//! the user id in the `X-User-Id` header. `AuthUser` is an Axum extractor
//! that rejects requests without it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use okusuri_common::error::AppError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user extracted from the gateway header.
///
/// Use as an Axum extractor on protected routes:
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     // auth.user_id is the caller's id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from(parts)
            .map(|user_id| AuthUser { user_id })
            .ok_or_else(|| AppError::Auth(format!("Missing {} header", USER_ID_HEADER)))
    }
}

fn user_id_from(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
