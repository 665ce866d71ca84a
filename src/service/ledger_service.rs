//! Ledger service: turns confirmed payments into credits and referral
//! commissions.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::LedgerPolicy;
use crate::domain::{
    BalanceKind, Collections, CommissionId, CommissionRecord, CommissionStatus, EventBus,
    LedgerEvent, PaymentEvent, PaymentRecord, UserId, commission_for,
};
use crate::error::LedgerError;

/// What the ledger did with a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDisposition {
    /// Credits granted (and commission attempted).
    Processed,
    /// Event type is not a confirmed payment.
    Ignored,
    /// Payment id was already applied.
    Duplicate,
    /// Amount is below every credit package; commission still attempted.
    UnmatchedAmount,
}

/// Result of processing one payment event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentOutcome {
    /// Disposition.
    pub status: PaymentDisposition,
    /// Provider payment id.
    pub payment_id: String,
    /// Credited user, when the event was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Paid amount in cents, when the event was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    /// Credits added to the user's counter.
    pub credits_granted: u64,
    /// Commission audit record, when a referrer exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<CommissionRecord>,
}

impl PaymentOutcome {
    fn skipped(status: PaymentDisposition, payment_id: &str) -> Self {
        Self {
            status,
            payment_id: payment_id.to_string(),
            user_id: None,
            amount_cents: None,
            credits_granted: 0,
            commission: None,
        }
    }
}

/// Credit ledger updater and referral commission payer.
///
/// Every balance mutation happens under the target document's write lock;
/// events are published after the lock is released.
#[derive(Debug, Clone)]
pub struct LedgerService {
    collections: Arc<Collections>,
    event_bus: EventBus,
    policy: Arc<LedgerPolicy>,
}

impl LedgerService {
    /// Creates a new `LedgerService`.
    #[must_use]
    pub fn new(collections: Arc<Collections>, event_bus: EventBus, policy: Arc<LedgerPolicy>) -> Self {
        Self {
            collections,
            event_bus,
            policy,
        }
    }

    /// Returns the business rules in effect.
    #[must_use]
    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Applies a webhook payment event to the ledger.
    ///
    /// Non-confirmed event types are acknowledged and ignored. With
    /// deduplication on, a payment id is applied at most once; a failed
    /// attempt releases the id so the provider's retry can succeed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a missing or malformed
    /// user reference or amount, and [`LedgerError::UserNotFound`] if the
    /// referenced user does not exist.
    pub async fn process_payment(&self, event: &PaymentEvent) -> Result<PaymentOutcome, LedgerError> {
        let payment = &event.payment;
        if !event.is_confirmed() {
            tracing::debug!(event = %event.event, payment_id = %payment.id, "ignoring payment event");
            return Ok(PaymentOutcome::skipped(PaymentDisposition::Ignored, &payment.id));
        }

        let user_id = payment.user_id()?;
        let amount_cents = payment.amount_cents()?;

        if self.policy.deduplicate_payments && !self.claim_payment(&payment.id).await {
            tracing::warn!(payment_id = %payment.id, %user_id, "duplicate payment delivery");
            return Ok(PaymentOutcome::skipped(PaymentDisposition::Duplicate, &payment.id));
        }

        match self.apply_payment(payment, user_id, amount_cents).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if self.policy.deduplicate_payments {
                    self.release_payment(&payment.id).await;
                }
                Err(err)
            }
        }
    }

    async fn claim_payment(&self, payment_id: &str) -> bool {
        self.collections
            .processed_payments
            .lock()
            .await
            .insert(payment_id.to_string())
    }

    async fn release_payment(&self, payment_id: &str) {
        self.collections
            .processed_payments
            .lock()
            .await
            .remove(payment_id);
    }

    async fn apply_payment(
        &self,
        payment: &PaymentRecord,
        user_id: UserId,
        amount_cents: i64,
    ) -> Result<PaymentOutcome, LedgerError> {
        let package = self.policy.price_table.classify(amount_cents);

        let lock = self.collections.accounts.get(user_id).await?;
        let mut account = lock.write().await;
        if let Some(package) = package {
            account.grant_credits(package.credits);
        }
        let credit_balance = account.credits;
        let referrer = account.referred_by.filter(|r| *r != user_id);
        drop(account);

        let credits_granted = package.map_or(0, |p| p.credits);
        let status = if let Some(package) = package {
            let _ = self.event_bus.publish(LedgerEvent::CreditsGranted {
                user_id,
                payment_id: payment.id.clone(),
                amount_cents,
                credits: package.credits,
                credit_balance,
                timestamp: Utc::now(),
            });
            tracing::info!(%user_id, payment_id = %payment.id, amount_cents, credits = package.credits, "credits granted");
            PaymentDisposition::Processed
        } else {
            tracing::warn!(%user_id, payment_id = %payment.id, amount_cents, "amount matches no credit package");
            PaymentDisposition::UnmatchedAmount
        };

        let commission = match referrer {
            Some(payee) => {
                self.pay_commission(&payment.id, user_id, payee, amount_cents)
                    .await
            }
            None => None,
        };

        Ok(PaymentOutcome {
            status,
            payment_id: payment.id.clone(),
            user_id: Some(user_id),
            amount_cents: Some(amount_cents),
            credits_granted,
            commission,
        })
    }

    /// Credits the referrer's multi-level balance and appends the audit
    /// record. A missing referrer yields a `failed` record; the payer's
    /// credit is not rolled back.
    async fn pay_commission(
        &self,
        payment_id: &str,
        payer_id: UserId,
        payee_id: UserId,
        payment_cents: i64,
    ) -> Option<CommissionRecord> {
        let rate_bps = self.policy.commission_bps;
        let commission_cents = commission_for(payment_cents, rate_bps);
        if commission_cents == 0 {
            return None;
        }

        let status = match self.collections.accounts.get(payee_id).await {
            Ok(lock) => {
                let mut payee = lock.write().await;
                match payee.adjust_balance(BalanceKind::MultiLevel, commission_cents) {
                    Ok(_) => CommissionStatus::Paid,
                    Err(err) => {
                        tracing::warn!(%payee_id, error = %err, "commission credit rejected");
                        CommissionStatus::Failed
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%payee_id, %payer_id, error = %err, "referrer missing, commission not paid");
                CommissionStatus::Failed
            }
        };

        let record = CommissionRecord {
            id: CommissionId::new(),
            payment_id: payment_id.to_string(),
            payer_id,
            payee_id,
            payment_cents,
            commission_cents,
            rate_bps,
            status,
            created_at: Utc::now(),
        };
        self.collections.commissions.write().await.push(record.clone());

        let _ = self.event_bus.publish(LedgerEvent::CommissionRecorded {
            user_id: payee_id,
            payer_id,
            payment_id: payment_id.to_string(),
            commission_cents,
            status,
            timestamp: record.created_at,
        });
        tracing::info!(%payee_id, %payer_id, commission_cents, ?status, "commission recorded");

        Some(record)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Account, PaymentRecord, Role};

    fn make_service(policy: LedgerPolicy) -> LedgerService {
        LedgerService::new(
            Arc::new(Collections::new()),
            EventBus::new(100),
            Arc::new(policy),
        )
    }

    async fn add_account(service: &LedgerService, referred_by: Option<UserId>) -> UserId {
        let acc = Account::new(
            "user".to_string(),
            "user@example.com".to_string(),
            Role::Seller,
            referred_by,
        );
        let Ok(id) = service.collections.accounts.insert(acc).await else {
            panic!("insert failed");
        };
        id
    }

    fn event(kind: &str, id: &str, value: f64, user: UserId) -> PaymentEvent {
        PaymentEvent {
            event: kind.to_string(),
            payment: PaymentRecord {
                id: id.to_string(),
                value,
                external_reference: Some(user.to_string()),
                description: None,
            },
        }
    }

    async fn credits(service: &LedgerService, id: UserId) -> u64 {
        service
            .collections
            .accounts
            .read(id)
            .await
            .map(|a| a.credits)
            .unwrap_or_default()
    }

    async fn processed(service: &LedgerService, payment_id: &str) -> bool {
        service
            .collections
            .processed_payments
            .lock()
            .await
            .contains(payment_id)
    }

    #[tokio::test]
    async fn confirmed_payment_grants_package_credits() {
        let service = make_service(LedgerPolicy::default());
        let mut rx = service.event_bus.subscribe();
        let user = add_account(&service, None).await;

        let Ok(outcome) = service
            .process_payment(&event("PAYMENT_CONFIRMED", "pay_1", 99.9, user))
            .await
        else {
            panic!("processing failed");
        };
        assert_eq!(outcome.status, PaymentDisposition::Processed);
        assert_eq!(outcome.credits_granted, 25);
        assert!(outcome.commission.is_none());
        assert_eq!(credits(&service, user).await, 25);

        let Ok(ev) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(ev.event_type_str(), "credits_granted");
    }

    #[tokio::test]
    async fn other_event_types_are_ignored() {
        let service = make_service(LedgerPolicy::default());
        let user = add_account(&service, None).await;

        let Ok(outcome) = service
            .process_payment(&event("PAYMENT_CREATED", "pay_1", 99.9, user))
            .await
        else {
            panic!("processing failed");
        };
        assert_eq!(outcome.status, PaymentDisposition::Ignored);
        assert_eq!(credits(&service, user).await, 0);
        assert!(!processed(&service, "pay_1").await);
    }

    #[tokio::test]
    async fn redelivery_does_not_double_credit() {
        let service = make_service(LedgerPolicy::default());
        let user = add_account(&service, None).await;
        let ev = event("PAYMENT_RECEIVED", "pay_1", 49.9, user);

        let _ = service.process_payment(&ev).await;
        let Ok(second) = service.process_payment(&ev).await else {
            panic!("processing failed");
        };
        assert_eq!(second.status, PaymentDisposition::Duplicate);
        assert_eq!(credits(&service, user).await, 10);
    }

    #[tokio::test]
    async fn deduplication_can_be_disabled() {
        let service = make_service(LedgerPolicy {
            deduplicate_payments: false,
            ..LedgerPolicy::default()
        });
        let user = add_account(&service, None).await;
        let ev = event("PAYMENT_RECEIVED", "pay_1", 49.9, user);

        let _ = service.process_payment(&ev).await;
        let _ = service.process_payment(&ev).await;
        assert_eq!(credits(&service, user).await, 20);
    }

    #[tokio::test]
    async fn unknown_user_fails_and_releases_payment_id() {
        let service = make_service(LedgerPolicy::default());
        let ghost = UserId::new();

        let result = service
            .process_payment(&event("PAYMENT_CONFIRMED", "pay_9", 49.9, ghost))
            .await;
        assert!(matches!(result, Err(LedgerError::UserNotFound(_))));
        assert!(!processed(&service, "pay_9").await);
    }

    #[tokio::test]
    async fn referrer_receives_commission_on_multi_level_balance() {
        let service = make_service(LedgerPolicy::default());
        let referrer = add_account(&service, None).await;
        let user = add_account(&service, Some(referrer)).await;

        let Ok(outcome) = service
            .process_payment(&event("PAYMENT_CONFIRMED", "pay_1", 199.9, user))
            .await
        else {
            panic!("processing failed");
        };
        let Some(commission) = outcome.commission else {
            panic!("expected a commission");
        };
        assert_eq!(commission.commission_cents, 1_999);
        assert_eq!(commission.status, CommissionStatus::Paid);

        let Ok(payee) = service.collections.accounts.read(referrer).await else {
            panic!("referrer vanished");
        };
        assert_eq!(payee.multi_level_balance_cents, 1_999);
        assert_eq!(payee.credits, 0);
        assert_eq!(service.collections.commissions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_referrer_records_failed_commission() {
        let service = make_service(LedgerPolicy::default());
        let user = add_account(&service, Some(UserId::new())).await;

        let Ok(outcome) = service
            .process_payment(&event("PAYMENT_CONFIRMED", "pay_1", 49.9, user))
            .await
        else {
            panic!("processing failed");
        };
        assert_eq!(outcome.status, PaymentDisposition::Processed);
        assert_eq!(
            outcome.commission.map(|c| c.status),
            Some(CommissionStatus::Failed)
        );
        assert_eq!(credits(&service, user).await, 10);
    }

    #[tokio::test]
    async fn unmatched_amount_still_pays_commission() {
        let service = make_service(LedgerPolicy::default());
        let referrer = add_account(&service, None).await;
        let user = add_account(&service, Some(referrer)).await;

        let Ok(outcome) = service
            .process_payment(&event("PAYMENT_CONFIRMED", "pay_1", 20.0, user))
            .await
        else {
            panic!("processing failed");
        };
        assert_eq!(outcome.status, PaymentDisposition::UnmatchedAmount);
        assert_eq!(outcome.credits_granted, 0);
        assert_eq!(outcome.commission.map(|c| c.commission_cents), Some(200));
    }

    #[tokio::test]
    async fn concurrent_deliveries_for_same_referrer_keep_every_commission() {
        let service = make_service(LedgerPolicy::default());
        let referrer = add_account(&service, None).await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let user = add_account(&service, Some(referrer)).await;
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let ev = event("PAYMENT_CONFIRMED", &format!("pay_{i}"), 49.9, user);
                service.process_payment(&ev).await.is_ok()
            }));
        }
        for handle in handles {
            assert!(matches!(handle.await, Ok(true)));
        }

        let Ok(payee) = service.collections.accounts.read(referrer).await else {
            panic!("referrer vanished");
        };
        assert_eq!(payee.multi_level_balance_cents, 20 * 499);
    }
}
