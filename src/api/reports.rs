//! Reporting endpoints.
//!
//! Read-only rollups for the operator dashboard:
//! - `GET /api/reports/tickets` - newest tickets across all riders.
//! - `GET /api/reports/sales` - tickets sold and revenue collected.

use super::error::ApiError;
use crate::fulfillment::{SalesSummary, TicketReportRow};
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

const DEFAULT_REPORT_LIMIT: i64 = 50;
const MAX_REPORT_LIMIT: i64 = 500;

/// Query parameters for the ticket report.
#[derive(Debug, Deserialize)]
pub struct TicketReportQuery {
    /// Maximum rows to return (default 50, capped at 500).
    pub limit: Option<i64>,
}

/// The ticket report.
#[derive(Debug, Serialize)]
pub struct TicketReportResponse {
    /// Newest tickets first.
    pub tickets: Vec<TicketReportRow>,
}

/// List the newest tickets.
///
/// # Errors
///
/// 5xx on store failure.
pub async fn ticket_report(
    State(state): State<AppState>,
    Query(query): Query<TicketReportQuery>,
) -> Result<Json<TicketReportResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_REPORT_LIMIT)
        .clamp(1, MAX_REPORT_LIMIT);
    let tickets = state.store.recent_tickets(limit).await?;
    Ok(Json(TicketReportResponse { tickets }))
}

/// Sales rollup for the dashboard.
///
/// # Errors
///
/// 5xx on store failure.
pub async fn sales_report(
    State(state): State<AppState>,
) -> Result<Json<SalesSummary>, ApiError> {
    let summary = state.store.sales_summary().await?;
    Ok(Json(summary))
}
