//! Inbound payment events as delivered by the payment provider webhook.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::LedgerError;

/// Event types that mean money has actually arrived.
pub const CONFIRMED_EVENT_TYPES: [&str; 2] = ["PAYMENT_CONFIRMED", "PAYMENT_RECEIVED"];

/// Webhook envelope: an event type plus the payment it refers to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentEvent {
    /// Provider event type (e.g. `"PAYMENT_CONFIRMED"`).
    pub event: String,
    /// Payment snapshot at the time of the event.
    pub payment: PaymentRecord,
}

/// Payment fields the ledger reads. Unknown provider fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Provider payment id.
    pub id: String,
    /// Paid amount in currency units (e.g. `49.9`).
    pub value: f64,
    /// User id the checkout was created for.
    #[serde(default)]
    pub external_reference: Option<String>,
    /// Free-form checkout description.
    #[serde(default)]
    pub description: Option<String>,
}

impl PaymentEvent {
    /// Returns `true` for the two confirmed event types.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        CONFIRMED_EVENT_TYPES.contains(&self.event.as_str())
    }
}

impl PaymentRecord {
    /// Extracts the user reference.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] when the reference is missing
    /// or is not a user id.
    pub fn user_id(&self) -> Result<UserId, LedgerError> {
        let reference = self
            .external_reference
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                LedgerError::InvalidRequest(format!(
                    "payment {} has no external reference",
                    self.id
                ))
            })?;
        reference.parse().map_err(|_| {
            LedgerError::InvalidRequest(format!("invalid external reference: {reference}"))
        })
    }

    /// Paid amount in cents, rounded to the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for negative, non-finite or
    /// out-of-range values.
    pub fn amount_cents(&self) -> Result<i64, LedgerError> {
        amount_to_cents(self.value)
    }
}

/// Converts a currency amount to integer cents.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for negative, non-finite or
/// out-of-range values.
pub fn amount_to_cents(value: f64) -> Result<i64, LedgerError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LedgerError::InvalidRequest(format!(
            "invalid payment value: {value}"
        )));
    }
    let cents = (value * 100.0).round();
    if cents > 9.0e15 {
        return Err(LedgerError::InvalidRequest(format!(
            "payment value out of range: {value}"
        )));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(cents as i64)
}
