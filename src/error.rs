//! Error taxonomy for the ticketing core.
//!
//! Every failure is scoped to one purchase or query; nothing here is fatal to
//! the process. The HTTP layer maps these onto status codes in
//! [`crate::api::ApiError`].

use crate::payment_gateway::PaymentGatewayError;
use crate::types::{RouteId, TicketId};
use thiserror::Error;

/// Result type alias for ticketing operations.
pub type Result<T> = std::result::Result<T, TicketingError>;

/// Failure modes of the purchase and fulfillment workflow.
#[derive(Debug, Error)]
pub enum TicketingError {
    /// Caller-supplied input was rejected (bad quantity, malformed token).
    #[error("validation failed: {reason}")]
    Validation {
        /// What was wrong with the input.
        reason: String,
    },

    /// The requested route does not exist. A purchase against an unknown
    /// route is rejected outright; no fallback price is substituted.
    #[error("route {id} not found")]
    RouteNotFound {
        /// The unknown route id.
        id: RouteId,
    },

    /// The requested ticket does not exist.
    #[error("ticket {id} not found")]
    TicketNotFound {
        /// The unknown ticket id.
        id: TicketId,
    },

    /// Rendering the scannable code image failed. The whole batch aborts
    /// rather than issuing a ticket with a blank image.
    #[error("ticket code encoding failed: {reason}")]
    Encoding {
        /// Encoder failure detail.
        reason: String,
    },

    /// A store write or read failed; the surrounding transaction (if any)
    /// has been rolled back.
    #[error("persistence failure: {reason}")]
    Persistence {
        /// Driver failure detail.
        reason: String,
    },

    /// The store could not be reached in time. Retryable from the client's
    /// perspective; retries are not idempotent at this layer.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Connectivity failure detail.
        reason: String,
    },

    /// The payment gateway declined or failed the charge.
    #[error(transparent)]
    Gateway(#[from] PaymentGatewayError),
}

impl TicketingError {
    /// Convenience constructor for validation failures.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
