//! Domain events reflecting ledger mutations.
//!
//! Every state change emits a [`LedgerEvent`] through the [`super::EventBus`].
//! Events are appended to the PostgreSQL event log and turned into
//! best-effort user notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    BalanceKind, CommissionStatus, LeadId, ProposalId, ProposalStatus, UserId, WithdrawalId,
    WithdrawalStatus,
};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A user record was created.
    AccountCreated {
        /// New user.
        user_id: UserId,
        /// Referrer resolved from the sign-up code.
        referred_by: Option<UserId>,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A confirmed payment was converted into credits.
    CreditsGranted {
        /// Credited user.
        user_id: UserId,
        /// Provider payment id.
        payment_id: String,
        /// Paid amount in cents.
        amount_cents: i64,
        /// Credits added.
        credits: u64,
        /// Credit counter after the increment.
        credit_balance: u64,
        /// Processing timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A referral commission was attempted.
    CommissionRecorded {
        /// Referrer (payee).
        user_id: UserId,
        /// Referred user whose payment generated the commission.
        payer_id: UserId,
        /// Provider payment id.
        payment_id: String,
        /// Commission amount in cents.
        commission_cents: i64,
        /// Whether the payout landed.
        status: CommissionStatus,
        /// Processing timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Credits were consumed to unlock a lead.
    LeadUnlocked {
        /// Buyer.
        user_id: UserId,
        /// Unlocked lead.
        lead_id: LeadId,
        /// Credits consumed.
        credits: u64,
        /// Unlock timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An operator adjusted a balance.
    BalanceAdjusted {
        /// Adjusted user.
        user_id: UserId,
        /// Adjusted balance.
        balance: BalanceKind,
        /// Signed change in cents.
        delta_cents: i64,
        /// Balance after the change.
        new_balance_cents: i64,
        /// Operator note.
        reason: String,
        /// Adjustment timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A withdrawal was requested and its amount held.
    WithdrawalRequested {
        /// Requesting user.
        user_id: UserId,
        /// New request.
        withdrawal_id: WithdrawalId,
        /// Held amount in cents.
        amount_cents: i64,
        /// Request timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A withdrawal moved through its status table.
    WithdrawalStatusChanged {
        /// Owner of the request.
        user_id: UserId,
        /// Request.
        withdrawal_id: WithdrawalId,
        /// Previous status.
        from: WithdrawalStatus,
        /// New status.
        to: WithdrawalStatus,
        /// Amount in cents (refunded when `to` is `failed`).
        amount_cents: i64,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A proposal was accepted or declined.
    ProposalClosed {
        /// Author.
        user_id: UserId,
        /// Proposal.
        proposal_id: ProposalId,
        /// Closing status.
        status: ProposalStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns the user the event is about.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        match self {
            Self::AccountCreated { user_id, .. }
            | Self::CreditsGranted { user_id, .. }
            | Self::CommissionRecorded { user_id, .. }
            | Self::LeadUnlocked { user_id, .. }
            | Self::BalanceAdjusted { user_id, .. }
            | Self::WithdrawalRequested { user_id, .. }
            | Self::WithdrawalStatusChanged { user_id, .. }
            | Self::ProposalClosed { user_id, .. } => *user_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::AccountCreated { .. } => "account_created",
            Self::CreditsGranted { .. } => "credits_granted",
            Self::CommissionRecorded { .. } => "commission_recorded",
            Self::LeadUnlocked { .. } => "lead_unlocked",
            Self::BalanceAdjusted { .. } => "balance_adjusted",
            Self::WithdrawalRequested { .. } => "withdrawal_requested",
            Self::WithdrawalStatusChanged { .. } => "withdrawal_status_changed",
            Self::ProposalClosed { .. } => "proposal_closed",
        }
    }

    /// User-facing text for events worth a message, `None` otherwise.
    #[must_use]
    pub fn notification_message(&self) -> Option<String> {
        match self {
            Self::CreditsGranted { credits, .. } => {
                Some(format!("Payment confirmed: {credits} credits added to your account."))
            }
            Self::CommissionRecorded {
                commission_cents,
                status: CommissionStatus::Paid,
                ..
            } => Some(format!(
                "You earned a referral commission of {}.",
                format_cents(*commission_cents)
            )),
            Self::WithdrawalStatusChanged {
                to, amount_cents, ..
            } => Some(format!(
                "Your withdrawal of {} is now {to}.",
                format_cents(*amount_cents)
            )),
            _ => None,
        }
    }
}

/// Formats cents as `R$ 12.34`.
fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}R$ {}.{:02}", abs / 100, abs % 100)
}
