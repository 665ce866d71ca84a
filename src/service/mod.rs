//! Service layer: business logic orchestration.
//!
//! Each service owns a handle to the shared [`crate::domain::Collections`]
//! and the [`crate::domain::EventBus`]. Every mutation follows the pattern:
//! acquire document lock → check → write → release → emit event.

pub mod account_service;
pub mod lead_service;
pub mod ledger_service;
pub mod withdrawal_service;

pub use account_service::{AccountService, NewAccount};
pub use lead_service::{LeadService, NewLead};
pub use ledger_service::{LedgerService, PaymentDisposition, PaymentOutcome};
pub use withdrawal_service::WithdrawalService;
