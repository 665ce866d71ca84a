//! Referral commissions: rate arithmetic and the append-only audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CommissionId, UserId};

/// Outcome recorded for a commission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// The referrer's multi-level balance was credited.
    Paid,
    /// The referrer record could not be credited.
    Failed,
}

/// Audit entry correlating a payer, a payee and an amount.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommissionRecord {
    /// Record identifier.
    pub id: CommissionId,
    /// Provider payment id that triggered the commission.
    pub payment_id: String,
    /// Referred user who paid.
    pub payer_id: UserId,
    /// Referrer receiving the commission.
    pub payee_id: UserId,
    /// Payment amount in cents.
    pub payment_cents: i64,
    /// Commission amount in cents.
    pub commission_cents: i64,
    /// Rate applied, in basis points.
    pub rate_bps: u32,
    /// Whether the payout landed.
    pub status: CommissionStatus,
    /// When the record was appended.
    pub created_at: DateTime<Utc>,
}

/// Computes `amount_cents * rate_bps / 10 000`, floored. Non-positive
/// amounts earn nothing.
#[must_use]
pub fn commission_for(amount_cents: i64, rate_bps: u32) -> i64 {
    if amount_cents <= 0 {
        return 0;
    }
    let scaled = i128::from(amount_cents) * i128::from(rate_bps) / 10_000;
    i64::try_from(scaled).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_of_package_price() {
        assert_eq!(commission_for(4_990, 1_000), 499);
        assert_eq!(commission_for(39_990, 1_000), 3_999);
    }

    #[test]
    fn fractions_of_a_cent_are_floored() {
        assert_eq!(commission_for(9_999, 1_000), 999);
        assert_eq!(commission_for(1, 1_000), 0);
    }

    #[test]
    fn zero_rate_or_amount_pays_nothing() {
        assert_eq!(commission_for(10_000, 0), 0);
        assert_eq!(commission_for(0, 1_000), 0);
        assert_eq!(commission_for(-500, 1_000), 0);
    }

    #[test]
    fn custom_rates() {
        assert_eq!(commission_for(10_000, 250), 250);
        assert_eq!(commission_for(10_000, 10_000), 10_000);
    }
}
