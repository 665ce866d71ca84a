//! User records: balances, role, referral linkage and permission flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::LedgerError;

/// Role of a user inside a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works leads and sends proposals.
    #[default]
    Seller,
    /// Supervises sellers.
    Manager,
    /// Operates the admin panel.
    Admin,
}

/// Feature gates set from the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    /// May request withdrawals.
    pub can_withdraw: bool,
    /// May unlock leads.
    pub can_access_leads: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            can_withdraw: true,
            can_access_leads: true,
        }
    }
}

/// Which money balance an operation draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    /// Balance adjusted from the admin panel.
    Personal,
    /// Balance fed by referral commissions.
    MultiLevel,
}

/// A user record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Identity.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Role enumeration.
    pub role: Role,
    /// Code other users sign up with to become this user's referrals.
    pub referral_code: String,
    /// User who referred this one, if any.
    pub referred_by: Option<UserId>,
    /// Personal balance in cents.
    pub personal_balance_cents: i64,
    /// Multi-level (commission) balance in cents.
    pub multi_level_balance_cents: i64,
    /// Credits available to unlock leads.
    pub credits: u64,
    /// Feature gates.
    pub permissions: Permissions,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account with empty balances and a fresh referral code.
    #[must_use]
    pub fn new(name: String, email: String, role: Role, referred_by: Option<UserId>) -> Self {
        let id = UserId::new();
        let now = Utc::now();
        Self {
            id,
            name,
            email,
            role,
            referral_code: referral_code_for(id),
            referred_by,
            personal_balance_cents: 0,
            multi_level_balance_cents: 0,
            credits: 0,
            permissions: Permissions::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current value of the selected balance, in cents.
    #[must_use]
    pub const fn balance(&self, kind: BalanceKind) -> i64 {
        match kind {
            BalanceKind::Personal => self.personal_balance_cents,
            BalanceKind::MultiLevel => self.multi_level_balance_cents,
        }
    }

    /// Adds credits to the counter.
    pub fn grant_credits(&mut self, credits: u64) {
        self.credits = self.credits.saturating_add(credits);
        self.updated_at = Utc::now();
    }

    /// Consumes credits.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientCredits`] if the counter is short.
    pub fn spend_credits(&mut self, credits: u64) -> Result<(), LedgerError> {
        if self.credits < credits {
            return Err(LedgerError::InsufficientCredits {
                required: credits,
                available: self.credits,
            });
        }
        self.credits -= credits;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the referral code with a freshly drawn one, used when the
    /// derived code is already taken.
    pub fn regenerate_referral_code(&mut self) {
        self.referral_code = referral_code_for(UserId::new());
    }

    /// Adds a signed amount to the selected balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the result would be
    /// negative.
    pub fn adjust_balance(&mut self, kind: BalanceKind, delta_cents: i64) -> Result<i64, LedgerError> {
        let current = self.balance(kind);
        let next = current.saturating_add(delta_cents);
        if next < 0 {
            return Err(LedgerError::InsufficientBalance {
                requested: delta_cents.saturating_neg(),
                available: current,
            });
        }
        match kind {
            BalanceKind::Personal => self.personal_balance_cents = next,
            BalanceKind::MultiLevel => self.multi_level_balance_cents = next,
        }
        self.updated_at = Utc::now();
        Ok(next)
    }
}

/// Derives the public referral code: the first eight hex digits of the id.
fn referral_code_for(id: UserId) -> String {
    id.as_uuid()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase()
}
