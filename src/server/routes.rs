//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Builds the complete router: health probes plus the ticketing API.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/purchase", post(api::create_purchase))
        .route("/purchase-confirmation", get(api::purchase_confirmation))
        .route("/tickets/:id", get(api::get_ticket))
        .route("/users/:id/tickets", get(api::user_history))
        .route("/routes", get(api::list_routes))
        .route("/reports/tickets", get(api::ticket_report))
        .route("/reports/sales", get(api::sales_report));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
