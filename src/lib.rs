//! # credit-ledger
//!
//! Back-office service for a multi-tenant sales CRM: payment webhooks feed a
//! credit ledger, referrers earn a commission on every payment made by the
//! users they invited, and credits are spent unlocking sales leads.
//! Withdrawals, proposals and an admin panel complete the surface.
//!
//! ## Architecture
//!
//! ```text
//! Payment provider ──► POST /webhooks/payments
//! Clients (HTTP)   ──► REST Handlers (api/)
//!     │
//!     ├── LedgerService, AccountService,
//!     │   LeadService, WithdrawalService (service/)
//!     ├── EventBus (domain/) ──► Notifier (notify/)
//!     │                      └─► Event log (persistence/)
//!     │
//!     ├── Collections: one Registry per document type (domain/)
//!     │
//!     └── PostgreSQL snapshots (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
