//! Ticket code generation.
//!
//! Each ticket carries a process-unique code and a scannable QR rendering of
//! it. The code concatenates the batch timestamp (microseconds), the payer,
//! the route, and the ticket's index within the batch, so a tight loop
//! issuing many tickets for the same rider and route cannot collide.
//!
//! The QR image is rendered to SVG and wrapped in a base64 `data:` URL so the
//! stored value is self-contained and directly embeddable. An encoding
//! failure aborts the ticket's creation; a blank image is never substituted.

use crate::error::{Result, TicketingError};
use crate::types::{RouteId, UserId};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use qrcode::QrCode;
use qrcode::render::svg;

/// Inputs that make one ticket's code unique.
#[derive(Clone, Copy, Debug)]
pub struct CodeContext {
    /// Purchasing rider.
    pub user_id: UserId,
    /// Route being purchased.
    pub route_id: RouteId,
    /// Shared batch timestamp.
    pub issued_at: DateTime<Utc>,
    /// 0-based index of this ticket within the batch.
    pub sequence: u32,
}

/// A generated ticket code with its scannable rendering.
#[derive(Clone, Debug)]
pub struct TicketCode {
    /// Unique code string stored in `tickets.codigo`.
    pub code: String,
    /// SVG data URL stored in `tickets.codigo_qr`.
    pub qr_data_url: String,
}

/// Generates the unique code and QR image for one ticket.
///
/// # Errors
///
/// Returns [`TicketingError::Encoding`] if the QR encoder rejects the code
/// (the payload is tiny, so in practice this indicates an encoder bug).
pub fn generate(ctx: &CodeContext) -> Result<TicketCode> {
    let code = format!(
        "TICKET-{}-{}-{}-{}",
        ctx.issued_at.timestamp_micros(),
        ctx.user_id,
        ctx.route_id,
        ctx.sequence
    );
    let qr_data_url = render_qr(&code)?;
    Ok(TicketCode { code, qr_data_url })
}

fn render_qr(code: &str) -> Result<String> {
    let qr = QrCode::new(code.as_bytes()).map_err(|e| TicketingError::Encoding {
        reason: e.to_string(),
    })?;
    let image = qr
        .render::<svg::Color<'_>>()
        .min_dimensions(200, 200)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image)
    ))
}
