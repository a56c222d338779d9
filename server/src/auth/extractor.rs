use crate::api::ApiError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::SessionVerifier;

/// Extractor that validates the Authorization header and provides the
/// authenticated account id.
///
/// ```ignore
/// async fn my_handler(AuthUser(account): AuthUser) -> impl IntoResponse {
///     // account is the caller's Uuid
/// }
/// ```
pub struct AuthUser(pub Uuid);

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AuthError::MissingHeader => ("MISSING_AUTH_HEADER", "Missing Authorization header"),
            AuthError::InvalidHeader => ("UNAUTHORIZED", "Invalid Authorization header"),
            AuthError::InvalidFormat => ("UNAUTHORIZED", "Invalid Authorization header format"),
            AuthError::InvalidToken => ("UNAUTHORIZED", "Invalid or expired token"),
        };

        ApiError::new(StatusCode::UNAUTHORIZED, code, message).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<dyn SessionVerifier>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<dyn SessionVerifier>::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?;

        let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidFormat)?;

        let account = sessions
            .verify(token)
            .await
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser(account))
    }
}
