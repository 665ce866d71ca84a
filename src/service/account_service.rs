//! Account service: user records, referral linkage, permissions and
//! operator balance adjustments.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Account, BalanceKind, Collections, CommissionRecord, EventBus, LedgerEvent, Permissions,
    Role, UserId,
};
use crate::error::LedgerError;

/// Draws tried before giving up on a unique referral code.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Fields accepted when creating a user.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Role; defaults to seller.
    pub role: Option<Role>,
    /// Referral code of the referring user.
    pub referral_code: Option<String>,
}

/// Orchestration for user records.
#[derive(Debug, Clone)]
pub struct AccountService {
    collections: Arc<Collections>,
    event_bus: EventBus,
}

impl AccountService {
    /// Creates a new `AccountService`.
    #[must_use]
    pub fn new(collections: Arc<Collections>, event_bus: EventBus) -> Self {
        Self {
            collections,
            event_bus,
        }
    }

    /// Creates a user, resolving the optional referral code to a referrer.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a blank name, an email
    /// without `@`, or an unknown referral code, and
    /// [`LedgerError::Internal`] if no free referral code could be drawn.
    pub async fn create_account(&self, new: NewAccount) -> Result<Account, LedgerError> {
        let name = new.name.trim().to_string();
        let email = new.email.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(LedgerError::InvalidRequest("name must not be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(LedgerError::InvalidRequest(format!("invalid email: {email}")));
        }

        let referred_by = match new.referral_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let code = code.to_ascii_uppercase();
                let referrer = self.collections.referrer_for(&code).await.ok_or_else(|| {
                    LedgerError::InvalidRequest(format!("unknown referral code: {code}"))
                })?;
                Some(referrer)
            }
            _ => None,
        };

        let account = self
            .register(Account::new(name, email, new.role.unwrap_or_default(), referred_by))
            .await?;

        let _ = self.event_bus.publish(LedgerEvent::AccountCreated {
            user_id: account.id,
            referred_by,
            timestamp: account.created_at,
        });
        tracing::info!(user_id = %account.id, referred_by = ?referred_by, "account created");
        Ok(account)
    }

    /// Stores `account` under a referral code no other account holds,
    /// drawing a new code on collision.
    async fn register(&self, mut account: Account) -> Result<Account, LedgerError> {
        let mut attempts = 0;
        while !self
            .collections
            .claim_referral_code(&account.referral_code, account.id)
            .await
        {
            attempts += 1;
            if attempts >= MAX_CODE_ATTEMPTS {
                return Err(LedgerError::Internal(
                    "could not allocate a unique referral code".to_string(),
                ));
            }
            tracing::debug!(code = %account.referral_code, "referral code taken, drawing another");
            account.regenerate_referral_code();
        }

        if let Err(err) = self.collections.accounts.insert(account.clone()).await {
            self.collections
                .release_referral_code(&account.referral_code)
                .await;
            return Err(err);
        }
        Ok(account)
    }

    /// Returns a user record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the user does not exist.
    pub async fn get_account(&self, user_id: UserId) -> Result<Account, LedgerError> {
        self.collections.accounts.read(user_id).await
    }

    /// Returns the commissions a user earned, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the user does not exist.
    pub async fn commissions_for(&self, user_id: UserId) -> Result<Vec<CommissionRecord>, LedgerError> {
        if !self.collections.accounts.contains(user_id).await {
            return Err(LedgerError::UserNotFound(user_id));
        }
        let log = self.collections.commissions.read().await;
        Ok(log
            .iter()
            .rev()
            .filter(|c| c.payee_id == user_id)
            .cloned()
            .collect())
    }

    /// Returns the whole commission audit log, newest first.
    pub async fn all_commissions(&self) -> Vec<CommissionRecord> {
        self.collections
            .commissions
            .read()
            .await
            .iter()
            .rev()
            .cloned()
            .collect()
    }

    /// Sets role and permission flags from the admin panel.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the user does not exist.
    pub async fn set_permissions(
        &self,
        user_id: UserId,
        role: Option<Role>,
        permissions: Permissions,
    ) -> Result<Account, LedgerError> {
        let lock = self.collections.accounts.get(user_id).await?;
        let mut account = lock.write().await;
        if let Some(role) = role {
            account.role = role;
        }
        account.permissions = permissions;
        account.updated_at = Utc::now();
        tracing::info!(%user_id, role = ?account.role, ?permissions, "permissions updated");
        Ok(account.clone())
    }

    /// Applies a signed operator adjustment to a balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a zero delta or blank
    /// reason, [`LedgerError::UserNotFound`] if the user does not exist, and
    /// [`LedgerError::InsufficientBalance`] if the balance would go
    /// negative.
    pub async fn adjust_balance(
        &self,
        user_id: UserId,
        balance: BalanceKind,
        delta_cents: i64,
        reason: String,
    ) -> Result<Account, LedgerError> {
        if delta_cents == 0 {
            return Err(LedgerError::InvalidRequest("delta must not be zero".to_string()));
        }
        if reason.trim().is_empty() {
            return Err(LedgerError::InvalidRequest("reason must not be empty".to_string()));
        }

        let lock = self.collections.accounts.get(user_id).await?;
        let mut account = lock.write().await;
        let new_balance_cents = account.adjust_balance(balance, delta_cents)?;
        let snapshot = account.clone();
        drop(account);

        let _ = self.event_bus.publish(LedgerEvent::BalanceAdjusted {
            user_id,
            balance,
            delta_cents,
            new_balance_cents,
            reason,
            timestamp: Utc::now(),
        });
        tracing::info!(%user_id, ?balance, delta_cents, new_balance_cents, "balance adjusted");
        Ok(snapshot)
    }
}
