//! Withdrawal service: holds the requested amount and walks requests
//! through their status table.

use std::sync::Arc;

use chrono::Utc;

use crate::config::LedgerPolicy;
use crate::domain::{
    BalanceKind, Collections, EventBus, LedgerEvent, UserId, Withdrawal, WithdrawalId,
    WithdrawalStatus,
};
use crate::error::LedgerError;

/// Orchestration for withdrawal requests.
#[derive(Debug, Clone)]
pub struct WithdrawalService {
    collections: Arc<Collections>,
    event_bus: EventBus,
    policy: Arc<LedgerPolicy>,
}

impl WithdrawalService {
    /// Creates a new `WithdrawalService`.
    #[must_use]
    pub fn new(collections: Arc<Collections>, event_bus: EventBus, policy: Arc<LedgerPolicy>) -> Self {
        Self {
            collections,
            event_bus,
            policy,
        }
    }

    /// Opens a pending withdrawal and deducts the amount from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for an empty destination key
    /// or an amount below the minimum, [`LedgerError::UserNotFound`],
    /// [`LedgerError::PermissionDenied`] without `can_withdraw`, and
    /// [`LedgerError::InsufficientBalance`] if `source` is short.
    pub async fn request_withdrawal(
        &self,
        user_id: UserId,
        amount_cents: i64,
        destination_key: String,
        source: BalanceKind,
    ) -> Result<Withdrawal, LedgerError> {
        let destination_key = destination_key.trim().to_string();
        if destination_key.is_empty() {
            return Err(LedgerError::InvalidRequest(
                "destination key must not be empty".to_string(),
            ));
        }
        if amount_cents < self.policy.min_withdrawal_cents {
            return Err(LedgerError::InvalidRequest(format!(
                "minimum withdrawal is {} cents",
                self.policy.min_withdrawal_cents
            )));
        }

        let lock = self.collections.accounts.get(user_id).await?;
        let mut account = lock.write().await;
        if !account.permissions.can_withdraw {
            return Err(LedgerError::PermissionDenied(
                "withdrawals are disabled for this user".to_string(),
            ));
        }
        let available = account.balance(source);
        if available < amount_cents {
            return Err(LedgerError::InsufficientBalance {
                requested: amount_cents,
                available,
            });
        }
        account.adjust_balance(source, -amount_cents)?;
        drop(account);

        // The hold is taken first; the account lock is never held while
        // the withdrawal collection is locked.
        let withdrawal = Withdrawal::new(user_id, amount_cents, destination_key, source);
        if let Err(err) = self.collections.withdrawals.insert(withdrawal.clone()).await {
            lock.write().await.adjust_balance(source, amount_cents)?;
            return Err(err);
        }

        let _ = self.event_bus.publish(LedgerEvent::WithdrawalRequested {
            user_id,
            withdrawal_id: withdrawal.id,
            amount_cents,
            timestamp: withdrawal.created_at,
        });
        tracing::info!(%user_id, withdrawal_id = %withdrawal.id, amount_cents, ?source, "withdrawal requested");
        Ok(withdrawal)
    }

    /// Returns a user's withdrawals, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the user does not exist.
    pub async fn withdrawals_for(&self, user_id: UserId) -> Result<Vec<Withdrawal>, LedgerError> {
        if !self.collections.accounts.contains(user_id).await {
            return Err(LedgerError::UserNotFound(user_id));
        }
        let mut list = self
            .collections
            .withdrawals
            .filter(|w| w.user_id == user_id)
            .await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Returns every withdrawal, optionally filtered by status, oldest
    /// first (queue order).
    pub async fn list(&self, status: Option<WithdrawalStatus>) -> Vec<Withdrawal> {
        let mut list = self
            .collections
            .withdrawals
            .filter(|w| status.is_none_or(|s| w.status == s))
            .await;
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    /// Moves a withdrawal to `next`. A move to `failed` refunds the held
    /// amount to its source balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WithdrawalNotFound`] and
    /// [`LedgerError::InvalidTransition`] for a change the status table
    /// forbids.
    pub async fn update_status(
        &self,
        id: WithdrawalId,
        next: WithdrawalStatus,
        reason: Option<String>,
    ) -> Result<Withdrawal, LedgerError> {
        let lock = self.collections.withdrawals.get(id).await?;
        let mut withdrawal = lock.write().await;
        let previous = withdrawal.transition(next, reason)?;

        if next == WithdrawalStatus::Failed {
            match self.collections.accounts.get(withdrawal.user_id).await {
                Ok(account_lock) => {
                    let mut account = account_lock.write().await;
                    account.adjust_balance(withdrawal.source, withdrawal.amount_cents)?;
                }
                Err(err) => {
                    tracing::error!(withdrawal_id = %id, error = %err, "refund target missing");
                }
            }
        }
        let snapshot = withdrawal.clone();
        drop(withdrawal);

        let _ = self.event_bus.publish(LedgerEvent::WithdrawalStatusChanged {
            user_id: snapshot.user_id,
            withdrawal_id: id,
            from: previous,
            to: next,
            amount_cents: snapshot.amount_cents,
            timestamp: Utc::now(),
        });
        tracing::info!(withdrawal_id = %id, from = %previous, to = %next, "withdrawal status changed");
        Ok(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Account, Role};

    async fn setup(balance: i64) -> (WithdrawalService, UserId) {
        let collections = Arc::new(Collections::new());
        let mut acc = Account::new(
            "ana".to_string(),
            "ana@example.com".to_string(),
            Role::Seller,
            None,
        );
        acc.multi_level_balance_cents = balance;
        let Ok(id) = collections.accounts.insert(acc).await else {
            panic!("insert failed");
        };
        let service = WithdrawalService::new(
            collections,
            EventBus::new(100),
            Arc::new(LedgerPolicy::default()),
        );
        (service, id)
    }

    async fn balance(service: &WithdrawalService, id: UserId) -> i64 {
        service
            .collections
            .accounts
            .read(id)
            .await
            .map(|a| a.multi_level_balance_cents)
            .unwrap_or(-1)
    }

    #[tokio::test]
    async fn request_holds_amount() {
        let (service, user) = setup(5_000).await;
        let Ok(w) = service
            .request_withdrawal(user, 3_000, "ana@pix".to_string(), BalanceKind::MultiLevel)
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(w.status, WithdrawalStatus::Pending);
        assert_eq!(balance(&service, user).await, 2_000);
    }

    #[tokio::test]
    async fn request_above_balance_is_rejected() {
        let (service, user) = setup(5_000).await;
        let result = service
            .request_withdrawal(user, 5_001, "ana@pix".to_string(), BalanceKind::MultiLevel)
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(balance(&service, user).await, 5_000);
    }

    #[tokio::test]
    async fn request_below_minimum_or_without_key_is_rejected() {
        let (service, user) = setup(5_000).await;
        let small = service
            .request_withdrawal(user, 999, "ana@pix".to_string(), BalanceKind::MultiLevel)
            .await;
        assert!(matches!(small, Err(LedgerError::InvalidRequest(_))));
        let no_key = service
            .request_withdrawal(user, 2_000, " ".to_string(), BalanceKind::MultiLevel)
            .await;
        assert!(matches!(no_key, Err(LedgerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn permission_flag_blocks_withdrawals() {
        let (service, user) = setup(5_000).await;
        if let Ok(lock) = service.collections.accounts.get(user).await {
            lock.write().await.permissions.can_withdraw = false;
        }
        let result = service
            .request_withdrawal(user, 2_000, "ana@pix".to_string(), BalanceKind::MultiLevel)
            .await;
        assert!(matches!(result, Err(LedgerError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn failure_refunds_and_done_does_not() {
        let (service, user) = setup(10_000).await;
        let Ok(first) = service
            .request_withdrawal(user, 4_000, "k".to_string(), BalanceKind::MultiLevel)
            .await
        else {
            panic!("request failed");
        };
        let Ok(second) = service
            .request_withdrawal(user, 3_000, "k".to_string(), BalanceKind::MultiLevel)
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(balance(&service, user).await, 3_000);

        let _ = service
            .update_status(first.id, WithdrawalStatus::Processing, None)
            .await;
        let done = service
            .update_status(first.id, WithdrawalStatus::Done, None)
            .await;
        assert!(done.is_ok());
        assert_eq!(balance(&service, user).await, 3_000);

        let failed = service
            .update_status(second.id, WithdrawalStatus::Failed, Some("bad key".to_string()))
            .await;
        assert_eq!(
            failed.ok().and_then(|w| w.failure_reason),
            Some("bad key".to_string())
        );
        assert_eq!(balance(&service, user).await, 6_000);
    }

    #[tokio::test]
    async fn invalid_transition_changes_nothing() {
        let (service, user) = setup(10_000).await;
        let Ok(w) = service
            .request_withdrawal(user, 4_000, "k".to_string(), BalanceKind::MultiLevel)
            .await
        else {
            panic!("request failed");
        };
        let result = service
            .update_status(w.id, WithdrawalStatus::Done, None)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidTransition { .. })));
        assert_eq!(service.list(Some(WithdrawalStatus::Pending)).await.len(), 1);
        assert_eq!(balance(&service, user).await, 6_000);
    }

    #[tokio::test]
    async fn request_refund_and_listing_interleave_without_deadlock() {
        use std::time::Duration;

        let (service, user) = setup(10_000).await;
        let Ok(pending) = service
            .request_withdrawal(user, 2_000, "k".to_string(), BalanceKind::MultiLevel)
            .await
        else {
            panic!("request failed");
        };
        let Ok(account_lock) = service.collections.accounts.get(user).await else {
            panic!("account vanished");
        };
        let held = account_lock.write().await;

        let requester = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .request_withdrawal(user, 1_000, "k".to_string(), BalanceKind::MultiLevel)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let refunder = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .update_status(pending.id, WithdrawalStatus::Failed, None)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let lister = {
            let service = service.clone();
            tokio::spawn(async move { service.list(None).await.len() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        let joined = tokio::time::timeout(Duration::from_secs(3), async {
            (requester.await, refunder.await, lister.await)
        })
        .await;
        let Ok((Ok(requested), Ok(refunded), Ok(listed))) = joined else {
            panic!("withdrawal tasks deadlocked");
        };
        assert!(requested.is_ok());
        assert!(refunded.is_ok());
        assert!(listed >= 1);
        assert_eq!(balance(&service, user).await, 9_000);
        assert_eq!(service.list(None).await.len(), 2);
    }
}
