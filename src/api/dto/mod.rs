//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records that are safe to expose (accounts, withdrawals,
//! proposals, lead views) are returned as-is; this module holds request
//! bodies, query strings and list envelopes.

pub mod account_dto;
pub mod admin_dto;
pub mod common_dto;
pub mod lead_dto;
pub mod withdrawal_dto;

pub use account_dto::*;
pub use admin_dto::*;
pub use common_dto::*;
pub use lead_dto::*;
pub use withdrawal_dto::*;
