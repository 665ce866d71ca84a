//! Withdrawal requests and their status table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BalanceKind, UserId, WithdrawalId};
use crate::error::LedgerError;

/// Lifecycle of a withdrawal.
///
/// ```text
/// pending ──► processing ──► done
///    │             │
///    └─────────────┴──► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Requested, amount held.
    Pending,
    /// Picked up by an operator.
    Processing,
    /// Paid out.
    Done,
    /// Rejected or bounced; the held amount is refunded.
    Failed,
}

impl WithdrawalStatus {
    /// Returns `true` if the state table allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Done)
                | (Self::Processing, Self::Failed)
        )
    }

    /// `done` and `failed` accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to pay a balance out to a destination key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Withdrawal {
    /// Request identifier.
    pub id: WithdrawalId,
    /// Requesting user.
    pub user_id: UserId,
    /// Requested amount in cents.
    pub amount_cents: i64,
    /// Destination key (PIX key).
    pub destination_key: String,
    /// Balance the amount was held from.
    pub source: BalanceKind,
    /// Current status.
    pub status: WithdrawalStatus,
    /// Operator note when the request failed.
    pub failure_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Creates a pending request.
    #[must_use]
    pub fn new(
        user_id: UserId,
        amount_cents: i64,
        destination_key: String,
        source: BalanceKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WithdrawalId::new(),
            user_id,
            amount_cents,
            destination_key,
            source,
            status: WithdrawalStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the request to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidTransition`] if the state table does
    /// not allow the change.
    pub fn transition(
        &mut self,
        next: WithdrawalStatus,
        reason: Option<String>,
    ) -> Result<WithdrawalStatus, LedgerError> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                from: previous.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        if next == WithdrawalStatus::Failed {
            self.failure_reason = reason;
        }
        self.updated_at = Utc::now();
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WithdrawalStatus::{Done, Failed, Pending, Processing};

    #[test]
    fn allowed_transitions() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Done));
        assert!(Processing.can_transition_to(Failed));
    }

    #[test]
    fn forbidden_transitions() {
        assert!(!Pending.can_transition_to(Done));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Pending));
        for terminal in [Done, Failed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Processing, Done, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn failure_reason_is_kept_only_on_failure() {
        let mut w = Withdrawal::new(UserId::new(), 5_000, "key".to_string(), BalanceKind::Personal);
        assert!(w.transition(Processing, Some("ignored".to_string())).is_ok());
        assert_eq!(w.failure_reason, None);
        assert_eq!(
            w.transition(Failed, Some("invalid key".to_string())).ok(),
            Some(Processing)
        );
        assert_eq!(w.failure_reason.as_deref(), Some("invalid key"));
        assert!(w.transition(Done, None).is_err());
    }
}
