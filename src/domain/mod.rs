//! Domain layer: core types, document store, and event system.
//!
//! This module contains the server-side domain model: typed identifiers,
//! user records and their balances, the credit price table, commissions,
//! withdrawals, leads and proposals, the event bus for broadcasting state
//! changes, and the registry for concurrent document storage.

pub mod account;
pub mod collections;
pub mod commission;
pub mod event_bus;
pub mod ids;
pub mod lead;
pub mod ledger_event;
pub mod payment;
pub mod price_table;
pub mod registry;
pub mod withdrawal;

pub use account::{Account, BalanceKind, Permissions, Role};
pub use collections::Collections;
pub use commission::{CommissionRecord, CommissionStatus, commission_for};
pub use event_bus::EventBus;
pub use ids::{CommissionId, LeadId, ProposalId, UserId, WithdrawalId};
pub use lead::{Lead, LeadView, Proposal, ProposalStatus};
pub use ledger_event::LedgerEvent;
pub use payment::{PaymentEvent, PaymentRecord};
pub use price_table::{CreditPackage, PriceTable};
pub use registry::{Document, Registry};
pub use withdrawal::{Withdrawal, WithdrawalStatus};
