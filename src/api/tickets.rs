//! Fulfillment endpoints.
//!
//! Read-only views over persisted tickets:
//! - `GET /api/tickets/{id}` - one ticket with payment, route, and stations.
//! - `GET /api/purchase-confirmation?token=...` - batch summary with total.
//! - `GET /api/users/{id}/tickets` - a rider's history, newest first.

use super::error::ApiError;
use crate::error::TicketingError;
use crate::fulfillment::{self, BatchConfirmation, TicketView};
use crate::server::state::AppState;
use crate::types::{TicketId, UserId};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

/// Query parameters for the confirmation view.
#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    /// The token returned by `POST /api/purchase`.
    pub token: Option<String>,
}

/// A rider's ticket history.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Tickets, newest purchase first.
    pub tickets: Vec<TicketView>,
}

/// Get one ticket by id.
///
/// # Errors
///
/// 404 with `TICKET_NOT_FOUND` if the id does not exist - never a generic
/// server error.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TicketView>, ApiError> {
    let id = TicketId::new(id);
    let view = state
        .store
        .ticket_view(id)
        .await?
        .ok_or(TicketingError::TicketNotFound { id })?;
    Ok(Json(view))
}

/// Get the confirmation summary for one purchase batch.
///
/// The token is required; a request without one has no batch to show and is
/// turned away rather than served from ambient session state.
///
/// # Errors
///
/// 400 for a missing token, 422 for an undecodable one, 404 if any ticket
/// in the batch does not exist.
pub async fn purchase_confirmation(
    State(state): State<AppState>,
    Query(query): Query<ConfirmationQuery>,
) -> Result<Json<BatchConfirmation>, ApiError> {
    let token = query
        .token
        .ok_or_else(|| ApiError::bad_request("missing confirmation token"))?;
    let ids = fulfillment::decode_confirmation_token(&token)?;
    let views = state.store.batch_view(&ids).await?;
    let confirmation = BatchConfirmation::from_views(&ids, views)?;
    Ok(Json(confirmation))
}

/// Get a rider's full ticket history.
///
/// # Errors
///
/// 5xx only on store failure; an unknown rider simply has no tickets.
pub async fn user_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let tickets = state.store.user_history(UserId::new(user_id)).await?;
    Ok(Json(HistoryResponse { tickets }))
}
