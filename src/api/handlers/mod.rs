//! REST endpoint handlers organized by resource.

pub mod accounts;
pub mod admin;
pub mod leads;
pub mod proposals;
pub mod system;
pub mod webhook;
pub mod withdrawals;

use axum::Router;

use crate::app_state::AppState;

/// Composes the user-facing resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(accounts::routes())
        .merge(leads::routes())
        .merge(proposals::routes())
        .merge(withdrawals::routes())
}
