//! System endpoints: health check and credit packages.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::CreditPackage;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    event_subscribers: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp, and the number of event bus subscribers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            event_subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// `GET /config/credit-packages`: The price table.
#[utoipa::path(
    get,
    path = "/config/credit-packages",
    tag = "System",
    summary = "List credit packages",
    description = "Returns the price table used to convert paid amounts into credits, cheapest first.",
    responses(
        (status = 200, description = "Credit packages", body = Vec<CreditPackage>),
    )
)]
pub async fn credit_packages_handler(State(state): State<AppState>) -> impl IntoResponse {
    let packages = state.ledger_service.policy().price_table.packages().to_vec();
    (StatusCode::OK, Json(packages))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/credit-packages", get(credit_packages_handler))
}
