//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; admin endpoints under
//! `/api/v1/admin` require the `X-Admin-Key` header. The payment webhook
//! and system endpoints live at the root.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(state: AppState) -> Router {
    let admin = handlers::admin::routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::require_admin_key,
    ));

    let router = Router::new()
        .nest(
            "/api/v1",
            handlers::routes().nest("/admin", admin),
        )
        .merge(handlers::webhook::routes())
        .merge(handlers::system::routes())
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}
