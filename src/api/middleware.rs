//! Request guards.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

use crate::app_state::AppState;
use crate::error::LedgerError;

/// Header carrying the admin API key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Rejects requests whose `X-Admin-Key` header does not match the
/// configured admin key.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] for a missing or wrong key.
pub async fn require_admin_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, LedgerError> {
    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if !secrets_match(provided, &state.keys.admin_api_key) {
        tracing::warn!(path = %request.uri().path(), "admin request rejected");
        return Err(LedgerError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Compares a presented secret with the configured one in time that does
/// not depend on where they differ. Both sides are hashed first, so the
/// length of the expected secret does not leak either.
#[must_use]
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
