//! Payment provider webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::middleware::secrets_match;
use crate::app_state::AppState;
use crate::domain::PaymentEvent;
use crate::error::{ErrorResponse, LedgerError};
use crate::service::PaymentOutcome;

/// `POST /webhooks/payments`: Apply a payment notification.
///
/// The shared secret is checked before the body is parsed, so a caller
/// without the token always gets `401`.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] for a missing or wrong token,
/// [`LedgerError::InvalidRequest`] for a malformed body or payment, and
/// [`LedgerError::UserNotFound`] for an unknown external reference.
#[utoipa::path(
    post,
    path = "/webhooks/payments",
    tag = "Webhooks",
    summary = "Receive a payment event",
    description = "Validates the shared-secret header, ignores unconfirmed event types, converts the paid amount into credits and pays the referral commission.",
    request_body = PaymentEvent,
    params(
        ("asaas-access-token" = String, Header, description = "Shared secret (header name is configurable)"),
    ),
    responses(
        (status = 200, description = "Event acknowledged", body = PaymentOutcome),
        (status = 400, description = "Malformed event", body = ErrorResponse),
        (status = 401, description = "Bad token", body = ErrorResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    )
)]
pub async fn receive_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PaymentOutcome>, LedgerError> {
    let provided = headers
        .get(state.keys.webhook_token_header.as_str())
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    if !secrets_match(provided, &state.keys.webhook_token) {
        tracing::warn!("webhook rejected: bad token");
        return Err(LedgerError::Unauthorized);
    }

    let event: PaymentEvent = serde_json::from_slice(&body)
        .map_err(|e| LedgerError::InvalidRequest(format!("malformed payment event: {e}")))?;
    let outcome = state.ledger_service.process_payment(&event).await?;
    Ok(Json(outcome))
}

/// Webhook routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/payments", post(receive_payment))
}
