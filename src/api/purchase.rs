//! Purchase endpoint.
//!
//! `POST /api/purchase` runs the orchestrator and answers with the created
//! ticket ids, the batch total, and the opaque confirmation token the caller
//! passes back to `GET /api/purchase-confirmation`.

use super::error::ApiError;
use crate::fulfillment;
use crate::purchase::PurchaseRequest;
use crate::server::state::AppState;
use crate::types::{Money, TicketId};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response for a committed purchase batch.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Created ticket ids, in batch order.
    pub ticket_ids: Vec<TicketId>,
    /// Price charged per ticket, in cents.
    pub unit_price: Money,
    /// Batch total, in cents.
    pub total: Money,
    /// Batch total formatted to two decimal places.
    pub total_display: String,
    /// Shared batch timestamp.
    pub purchased_at: DateTime<Utc>,
    /// Opaque token for the confirmation view.
    pub confirmation_token: String,
}

/// Create a purchase batch.
///
/// # Errors
///
/// See [`ApiError`]: 422 for invalid quantity, 404 for an unknown route,
/// 402 for a declined card, 5xx for store/encoding failures.
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    let batch = state.orchestrator.purchase(request).await?;
    let confirmation_token = fulfillment::confirmation_token(&batch.ticket_ids);
    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            total_display: batch.total.to_string(),
            ticket_ids: batch.ticket_ids,
            unit_price: batch.unit_price,
            total: batch.total,
            purchased_at: batch.purchased_at,
            confirmation_token,
        }),
    ))
}
