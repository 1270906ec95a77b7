//! Caller identity extraction.
//!
//! Upstream auth middleware (gateway) is expected to set `x-user-id` to the
//! authenticated user's id. Handlers that record who performed an action take
//! a [`GrantedBy`] argument and get a 401 when the header is missing or not a
//! valid UUID.

use axum::{extract::FromRequestParts, http::request::Parts};
use grantly_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user performing the request.
#[derive(Debug, Clone, Copy)]
pub struct GrantedBy(pub Uuid);

impl<S> FromRequestParts<S> for GrantedBy
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(format!(
                    "Missing {} header",
                    USER_ID_HEADER
                )))
            })?;

        let user_id = Uuid::parse_str(header.trim()).map_err(|_| {
            HttpAppError(AppError::Unauthorized(format!(
                "Invalid {} header: expected a UUID",
                USER_ID_HEADER
            )))
        })?;

        Ok(GrantedBy(user_id))
    }
}
