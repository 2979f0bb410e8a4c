//! Route catalog endpoint.
//!
//! `GET /api/routes` backs the browse/purchase page with every route and its
//! resolved station names.

use super::error::ApiError;
use crate::fulfillment::RouteView;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// The route catalog.
#[derive(Debug, Serialize)]
pub struct RouteCatalogResponse {
    /// All routes with origin/destination names.
    pub routes: Vec<RouteView>,
}

/// List the route catalog.
///
/// # Errors
///
/// 5xx on store failure.
pub async fn list_routes(
    State(state): State<AppState>,
) -> Result<Json<RouteCatalogResponse>, ApiError> {
    let routes = state.store.list_routes().await?;
    Ok(Json(RouteCatalogResponse { routes }))
}
