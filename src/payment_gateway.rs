//! Payment gateway seam.
//!
//! This system does not integrate a real card processor. Card purchases go
//! through [`PaymentGateway`], an explicit seam an external collaborator can
//! implement against Stripe, a bank switch, etc. The bundled
//! [`SimulatedGateway`] approves every charge and synthesizes a
//! `CARD-<millis>` transaction reference, matching the legacy behavior.

use crate::types::{Money, PaymentMethod};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Gateway failure modes.
#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    /// The card issuer declined the charge.
    #[error("card declined: {reason}")]
    Declined {
        /// Issuer-provided decline reason.
        reason: String,
    },
    /// The gateway did not answer in time. Retryable.
    #[error("payment gateway timeout")]
    Timeout,
    /// Any other gateway-side failure.
    #[error("payment gateway error: {message}")]
    Other {
        /// Gateway failure detail.
        message: String,
    },
}

/// A successful gateway authorization for one purchase batch.
#[derive(Debug, Clone)]
pub struct GatewayAuthorization {
    /// Gateway transaction id, stored as the payment reference for every
    /// ticket in the batch.
    pub reference: String,
    /// Total amount authorized.
    pub amount: Money,
}

/// Abstraction over card payment processors.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authorizes a card charge for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentGatewayError`] if the charge is declined or the
    /// gateway fails.
    async fn authorize(
        &self,
        amount: Money,
        method: PaymentMethod,
        at: DateTime<Utc>,
    ) -> Result<GatewayAuthorization, PaymentGatewayError>;
}

/// Gateway stand-in that approves every charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(
        &self,
        amount: Money,
        method: PaymentMethod,
        at: DateTime<Utc>,
    ) -> Result<GatewayAuthorization, PaymentGatewayError> {
        tracing::debug!(%amount, %method, "simulated gateway authorization");
        Ok(GatewayAuthorization {
            reference: format!("CARD-{}", at.timestamp_millis()),
            amount,
        })
    }
}
