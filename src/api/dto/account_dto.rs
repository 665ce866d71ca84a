//! User account DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{CommissionRecord, Role};

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Role, `seller` when omitted.
    #[serde(default)]
    pub role: Option<Role>,
    /// Referral code of the user who invited this one.
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Paginated commission records.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommissionListResponse {
    /// Records on this page, newest first.
    pub data: Vec<CommissionRecord>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
