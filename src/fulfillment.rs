//! Fulfillment read side.
//!
//! View types reconstructed by joining tickets, payments, routes, and
//! stations, plus the opaque confirmation token that carries a purchase
//! batch from the purchase response to the confirmation view without any
//! session state.

use crate::error::{Result, TicketingError};
use crate::types::{
    Money, OPERATING_TZ, PaymentMethod, RouteId, TicketId, TicketStatus, UserId,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One ticket joined with its payment, route, and station names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketView {
    /// Ticket id.
    pub ticket_id: TicketId,
    /// Owning rider.
    pub usuario_id: UserId,
    /// Unique ticket code.
    pub codigo: String,
    /// QR data URL for the code.
    pub codigo_qr: String,
    /// Lifecycle state.
    pub estado: TicketStatus,
    /// Batch purchase timestamp (UTC instant).
    pub fecha_compra: DateTime<Utc>,
    /// Purchase time on the operator's wall clock, for display.
    pub fecha_compra_local: DateTime<FixedOffset>,
    /// Route display name.
    pub ruta_nombre: String,
    /// Origin station name.
    pub origen: String,
    /// Destination station name.
    pub destino: String,
    /// Amount charged.
    pub monto: Money,
    /// Payment method tag.
    pub metodo_pago: PaymentMethod,
    /// Gateway transaction id or bank reference.
    pub referencia: String,
}

/// Converts a stored UTC instant to the operator's wall clock
/// (America/Guayaquil). Stores call this when assembling display views.
#[must_use]
pub fn operating_local(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.with_timezone(&OPERATING_TZ).fixed_offset()
}

/// A catalog entry for the route browse page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteView {
    /// Route id.
    pub id: RouteId,
    /// Route display name.
    pub nombre: String,
    /// Base price for the standard fare class.
    pub precio: Money,
    /// Origin station name.
    pub origen: String,
    /// Destination station name.
    pub destino: String,
}

/// One row of the admin ticket report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketReportRow {
    /// Ticket id.
    pub ticket_id: TicketId,
    /// Unique ticket code.
    pub codigo: String,
    /// Lifecycle state.
    pub estado: TicketStatus,
    /// Batch purchase timestamp.
    pub fecha_compra: DateTime<Utc>,
    /// Purchase time on the operator's wall clock.
    pub fecha_compra_local: DateTime<FixedOffset>,
    /// Owning rider.
    pub usuario_id: UserId,
    /// Route display name.
    pub ruta_nombre: String,
}

/// Rollup for the sales dashboard.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SalesSummary {
    /// Tickets sold (payment rows).
    pub tickets_sold: u64,
    /// Revenue collected across all payments.
    pub total_revenue: Money,
}

/// Batch summary rendered by the confirmation view.
#[derive(Clone, Debug, Serialize)]
pub struct BatchConfirmation {
    /// All tickets of the batch.
    pub tickets: Vec<TicketView>,
    /// Sum of the batch's payment amounts.
    pub total: Money,
}

impl BatchConfirmation {
    /// Builds the confirmation for one batch, requiring every requested id
    /// to be present exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::TicketNotFound`] naming the first id the
    /// store did not return, or [`TicketingError::Validation`] if a ticket
    /// appears more than once (a repeated view would inflate the total).
    pub fn from_views(requested: &[TicketId], views: Vec<TicketView>) -> Result<Self> {
        for id in requested {
            match views.iter().filter(|v| v.ticket_id == *id).count() {
                0 => return Err(TicketingError::TicketNotFound { id: *id }),
                1 => {}
                _ => {
                    return Err(TicketingError::validation(
                        "ticket listed more than once in the batch",
                    ));
                }
            }
        }
        if views.len() != requested.len() {
            return Err(TicketingError::validation(
                "batch view does not match the requested tickets",
            ));
        }
        let mut total = Money::from_cents(0);
        for view in &views {
            total = total
                .checked_add(view.monto)
                .ok_or_else(|| TicketingError::validation("batch total overflow"))?;
        }
        Ok(Self {
            tickets: views,
            total,
        })
    }
}

/// Encodes a purchase batch as an opaque confirmation token.
///
/// The token is self-contained (base64url JSON of the ticket ids), so the
/// confirmation view needs no server-side session state: the caller receives
/// it from the purchase response and passes it back verbatim.
#[must_use]
pub fn confirmation_token(ids: &[TicketId]) -> String {
    let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
    // Serializing a Vec<i64> cannot fail.
    let json = serde_json::to_vec(&raw).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a confirmation token back into its ticket ids.
///
/// # Errors
///
/// Returns [`TicketingError::Validation`] for tokens that are not valid
/// base64url, not valid JSON, empty, or that repeat a ticket id. Tokens are
/// unsigned caller input; a forged token repeating one id must not render a
/// multiplied batch.
pub fn decode_confirmation_token(token: &str) -> Result<Vec<TicketId>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| TicketingError::validation(format!("malformed confirmation token: {e}")))?;
    let raw: Vec<i64> = serde_json::from_slice(&bytes)
        .map_err(|e| TicketingError::validation(format!("malformed confirmation token: {e}")))?;
    if raw.is_empty() {
        return Err(TicketingError::validation(
            "confirmation token names no tickets",
        ));
    }
    let mut seen = HashSet::with_capacity(raw.len());
    for id in &raw {
        if !seen.insert(*id) {
            return Err(TicketingError::validation(
                "confirmation token repeats a ticket",
            ));
        }
    }
    Ok(raw.into_iter().map(TicketId::new).collect())
}
