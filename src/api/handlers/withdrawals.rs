//! User-facing withdrawal handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::CreateWithdrawalRequest;
use crate::app_state::AppState;
use crate::domain::{UserId, Withdrawal};
use crate::error::{ErrorResponse, LedgerError};

/// `POST /users/{id}/withdrawals`: Request a payout.
///
/// # Errors
///
/// Returns [`LedgerError::PermissionDenied`] without withdrawal rights and
/// [`LedgerError::InsufficientBalance`] if the source balance is short.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/withdrawals",
    tag = "Withdrawals",
    summary = "Request a withdrawal",
    description = "Holds the amount from the chosen balance and opens a pending withdrawal.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = CreateWithdrawalRequest,
    responses(
        (status = 201, description = "Withdrawal pending", body = Withdrawal),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Withdrawals disabled", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn request_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CreateWithdrawalRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let withdrawal = state
        .withdrawal_service
        .request_withdrawal(
            UserId::from_uuid(id),
            req.amount_cents,
            req.destination_key,
            req.source,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// `GET /users/{id}/withdrawals`
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/withdrawals",
    tag = "Withdrawals",
    summary = "List a user's withdrawals",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Withdrawals, newest first", body = Vec<Withdrawal>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Vec<Withdrawal>>, LedgerError> {
    let list = state
        .withdrawal_service
        .withdrawals_for(UserId::from_uuid(id))
        .await?;
    Ok(Json(list))
}

/// Withdrawal routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/users/{id}/withdrawals",
        get(list_withdrawals).post(request_withdrawal),
    )
}
