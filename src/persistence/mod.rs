//! Persistence layer: PostgreSQL document snapshots and event log.
//!
//! The service keeps its collections in memory. When persistence is
//! enabled they are restored from the `documents` table at startup and
//! written back periodically, while every ledger event is appended to
//! `ledger_events`. The concrete implementation uses `sqlx::PgPool`.

pub mod models;
pub mod postgres;
pub mod sync;

pub use postgres::PostgresPersistence;
