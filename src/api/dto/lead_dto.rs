//! Lead and proposal DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{LeadId, ProposalStatus};

/// Request body for `POST /admin/leads`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeadRequest {
    /// Contact person.
    pub name: String,
    /// Company name.
    pub company: String,
    /// Market segment.
    #[serde(default)]
    pub segment: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Request body for `POST /users/{id}/proposals`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProposalRequest {
    /// Unlocked lead the proposal is addressed to.
    pub lead_id: LeadId,
    /// Short description.
    pub title: String,
    /// Proposed value in cents.
    pub amount_cents: i64,
}

/// Request body for `PUT /users/{id}/proposals/{proposal_id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProposalStatusRequest {
    /// `accepted` or `declined`.
    pub status: ProposalStatus,
}
