/*
 * Responsibility
 * - Pull the bearer token out of the Authorization header
 * - Hand it to TokenCodec and return the caller identity
 * - No side effects: a pure function of the header + clock
 */
use axum::http::{HeaderMap, header};
use uuid::Uuid;

use crate::services::auth::{AuthError, TokenCodec};

const BEARER: &str = "Bearer";

/// Resolve the caller identity from request headers at clock value `now`.
pub fn extract_identity(headers: &HeaderMap, codec: &TokenCodec, now: i64) -> Result<Uuid, AuthError> {
    let token = bearer_token(headers)?;
    codec.verify_at(token, now)
}

/// Split `Authorization: <scheme> <token>` into its token.
///
/// Exactly one space separates scheme and token; a bare scheme, doubled spaces
/// or trailing segments are malformed rather than truncated.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;

    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() || token.contains(' ') {
        return Err(AuthError::MalformedCredential);
    }

    Ok(token)
}
