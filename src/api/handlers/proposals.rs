//! Proposal handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{CreateProposalRequest, UpdateProposalStatusRequest};
use crate::app_state::AppState;
use crate::domain::{Proposal, ProposalId, UserId};
use crate::error::{ErrorResponse, LedgerError};

/// `POST /users/{id}/proposals`: Write a proposal for an unlocked lead.
///
/// # Errors
///
/// Returns [`LedgerError::PermissionDenied`] if the lead is still locked
/// for the user.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/proposals",
    tag = "Proposals",
    summary = "Create a proposal",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = CreateProposalRequest,
    responses(
        (status = 201, description = "Proposal created", body = Proposal),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Lead not unlocked", body = ErrorResponse),
        (status = 404, description = "User or lead not found", body = ErrorResponse),
    )
)]
pub async fn create_proposal(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CreateProposalRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let proposal = state
        .lead_service
        .create_proposal(UserId::from_uuid(id), req.lead_id, req.title, req.amount_cents)
        .await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// `GET /users/{id}/proposals`
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/proposals",
    tag = "Proposals",
    summary = "List a user's proposals",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Proposals, newest first", body = Vec<Proposal>),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_proposals(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Vec<Proposal>>, LedgerError> {
    let list = state
        .lead_service
        .proposals_for(UserId::from_uuid(id))
        .await?;
    Ok(Json(list))
}

/// `PUT /users/{id}/proposals/{proposal_id}/status`
///
/// # Errors
///
/// Returns [`LedgerError::PermissionDenied`] for someone else's proposal
/// and [`LedgerError::InvalidTransition`] unless the proposal is open.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/proposals/{proposal_id}/status",
    tag = "Proposals",
    summary = "Accept or decline a proposal",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        ("proposal_id" = uuid::Uuid, Path, description = "Proposal UUID"),
    ),
    request_body = UpdateProposalStatusRequest,
    responses(
        (status = 200, description = "Proposal closed", body = Proposal),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Proposal not found", body = ErrorResponse),
        (status = 409, description = "Proposal already closed", body = ErrorResponse),
    )
)]
pub async fn update_proposal_status(
    State(state): State<AppState>,
    Path((id, proposal_id)): Path<(uuid::Uuid, uuid::Uuid)>,
    Json(req): Json<UpdateProposalStatusRequest>,
) -> Result<Json<Proposal>, LedgerError> {
    let proposal = state
        .lead_service
        .close_proposal(
            UserId::from_uuid(id),
            ProposalId::from_uuid(proposal_id),
            req.status,
        )
        .await?;
    Ok(Json(proposal))
}

/// Proposal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{id}/proposals",
            get(list_proposals).post(create_proposal),
        )
        .route(
            "/users/{id}/proposals/{proposal_id}/status",
            put(update_proposal_status),
        )
}
