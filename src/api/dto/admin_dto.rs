//! Admin panel DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{BalanceKind, Permissions, Role};

/// Request body for `PUT /admin/users/{id}/permissions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    /// New role; unchanged when omitted.
    #[serde(default)]
    pub role: Option<Role>,
    /// May the user request withdrawals.
    pub can_withdraw: bool,
    /// May the user unlock leads.
    pub can_access_leads: bool,
}

impl UpdatePermissionsRequest {
    /// The flag pair as a domain value.
    #[must_use]
    pub const fn permissions(&self) -> Permissions {
        Permissions {
            can_withdraw: self.can_withdraw,
            can_access_leads: self.can_access_leads,
        }
    }
}

/// Request body for `POST /admin/users/{id}/balance`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustBalanceRequest {
    /// Signed amount in cents.
    pub delta_cents: i64,
    /// Audit reason.
    pub reason: String,
    /// Balance to adjust, `personal` when omitted.
    #[serde(default)]
    pub balance: Option<BalanceKind>,
}
