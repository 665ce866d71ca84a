//! Lead listing and unlock handlers.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::{LeadId, LeadView, UserId};
use crate::error::{ErrorResponse, LedgerError};

/// `GET /users/{id}/leads`: Leads as seen by a user.
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/leads",
    tag = "Leads",
    summary = "List leads",
    description = "Returns every lead, newest first. Contact fields are masked unless the user unlocked the lead.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Lead views", body = Vec<LeadView>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_leads(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Vec<LeadView>>, LedgerError> {
    let views = state.lead_service.leads_for(UserId::from_uuid(id)).await?;
    Ok(Json(views))
}

/// `POST /users/{id}/leads/{lead_id}/unlock`: Spend credits on a lead.
///
/// # Errors
///
/// Returns [`LedgerError::PermissionDenied`] without lead access and
/// [`LedgerError::InsufficientCredits`] when the counter is too low.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/leads/{lead_id}/unlock",
    tag = "Leads",
    summary = "Unlock a lead",
    description = "Consumes credits to reveal the lead's contact fields. Unlocking a lead twice is free.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        ("lead_id" = uuid::Uuid, Path, description = "Lead UUID"),
    ),
    responses(
        (status = 200, description = "Unlocked lead", body = LeadView),
        (status = 403, description = "Lead access disabled", body = ErrorResponse),
        (status = 404, description = "User or lead not found", body = ErrorResponse),
        (status = 422, description = "Insufficient credits", body = ErrorResponse),
    )
)]
pub async fn unlock_lead(
    State(state): State<AppState>,
    Path((id, lead_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<Json<LeadView>, LedgerError> {
    let view = state
        .lead_service
        .unlock_lead(UserId::from_uuid(id), LeadId::from_uuid(lead_id))
        .await?;
    Ok(Json(view))
}

/// Lead routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/leads", get(list_leads))
        .route("/users/{id}/leads/{lead_id}/unlock", post(unlock_lead))
}
