//! Withdrawal DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, PaginationParams};
use crate::domain::{BalanceKind, Withdrawal, WithdrawalStatus};

/// Request body for `POST /users/{id}/withdrawals`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWithdrawalRequest {
    /// Amount in cents.
    pub amount_cents: i64,
    /// PIX key receiving the payout.
    pub destination_key: String,
    /// Balance the amount is taken from.
    pub source: BalanceKind,
}

/// Request body for `PUT /admin/withdrawals/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWithdrawalStatusRequest {
    /// Target status.
    pub status: WithdrawalStatus,
    /// Failure reason, kept only when `status` is `failed`.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query parameters for the admin withdrawal queue.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct WithdrawalQuery {
    /// Only withdrawals in this status.
    #[serde(default)]
    pub status: Option<WithdrawalStatus>,
    /// Page number (1-indexed).
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100).
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl WithdrawalQuery {
    /// Pagination part of the query, with defaults filled in.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Paginated withdrawal list.
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalListResponse {
    /// Withdrawals on this page.
    pub data: Vec<Withdrawal>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
