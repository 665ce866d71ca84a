//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::{LedgerConfig, LedgerPolicy};
use crate::domain::{Collections, EventBus};
use crate::service::{AccountService, LeadService, LedgerService, WithdrawalService};

/// Shared secrets checked at the HTTP edge.
#[derive(Debug, Clone)]
pub struct AccessKeys {
    /// Token the payment provider sends with every webhook.
    pub webhook_token: String,
    /// Header carrying the webhook token (lower-case).
    pub webhook_token_header: String,
    /// Value expected in `X-Admin-Key` on admin routes.
    pub admin_api_key: String,
}

impl From<&LedgerConfig> for AccessKeys {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            webhook_token: config.webhook_token.clone(),
            webhook_token_header: config.webhook_token_header.clone(),
            admin_api_key: config.admin_api_key.clone(),
        }
    }
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Webhook processing and commissions.
    pub ledger_service: Arc<LedgerService>,
    /// User records, permissions and balance adjustments.
    pub account_service: Arc<AccountService>,
    /// Leads and proposals.
    pub lead_service: Arc<LeadService>,
    /// Withdrawal requests.
    pub withdrawal_service: Arc<WithdrawalService>,
    /// Event bus feeding the event log and notifications.
    pub event_bus: EventBus,
    /// Edge secrets.
    pub keys: Arc<AccessKeys>,
}

impl AppState {
    /// Wires every service over one shared document store.
    #[must_use]
    pub fn new(
        collections: Arc<Collections>,
        event_bus: EventBus,
        policy: LedgerPolicy,
        keys: AccessKeys,
    ) -> Self {
        let policy = Arc::new(policy);
        Self {
            ledger_service: Arc::new(LedgerService::new(
                Arc::clone(&collections),
                event_bus.clone(),
                Arc::clone(&policy),
            )),
            account_service: Arc::new(AccountService::new(
                Arc::clone(&collections),
                event_bus.clone(),
            )),
            lead_service: Arc::new(LeadService::new(
                Arc::clone(&collections),
                event_bus.clone(),
                Arc::clone(&policy),
            )),
            withdrawal_service: Arc::new(WithdrawalService::new(
                collections,
                event_bus.clone(),
                policy,
            )),
            event_bus,
            keys: Arc::new(keys),
        }
    }
}
