//! Persistence layer.
//!
//! [`TicketStore`] abstracts the relational store behind the purchase
//! workflow and the fulfillment read side. Two implementations:
//!
//! - [`PostgresTicketStore`]: production store over a `sqlx` pool.
//! - [`InMemoryTicketStore`]: test double with injectable failures.
//!
//! The one write path, [`TicketStore::insert_purchase`], is atomic: either
//! every staged ticket/payment pair becomes visible or none do.

mod memory;
mod postgres;

pub use memory::{FailNext, InMemoryTicketStore};
pub use postgres::PostgresTicketStore;

use crate::error::Result;
use crate::fulfillment::{RouteView, SalesSummary, TicketReportRow, TicketView};
use crate::types::{Money, PaymentMethod, Route, RouteId, TicketId, TicketStatus, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A fully staged ticket/payment pair, ready to persist.
///
/// The orchestrator resolves prices, codes, and references before touching
/// the store, so the store's job is a straight multi-row insert.
#[derive(Clone, Debug)]
pub struct NewTicket {
    /// Purchasing rider.
    pub usuario_id: UserId,
    /// Route purchased.
    pub ruta_id: RouteId,
    /// Unique ticket code.
    pub codigo: String,
    /// QR data URL for the code.
    pub codigo_qr: String,
    /// Status written at creation (the purchase flow always writes `Paid`).
    pub estado: TicketStatus,
    /// Shared batch timestamp.
    pub fecha_compra: DateTime<Utc>,
    /// The payment settling this ticket.
    pub pago: NewPayment,
}

/// The payment half of a staged pair.
#[derive(Clone, Debug)]
pub struct NewPayment {
    /// Amount charged for this ticket.
    pub monto: Money,
    /// Payment method tag.
    pub metodo_pago: PaymentMethod,
    /// Gateway transaction id or bank reference, shared across the batch.
    pub referencia: String,
    /// Shared batch timestamp.
    pub fecha_pago: DateTime<Utc>,
}

/// Relational store behind the purchase and fulfillment workflow.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Fetches one route for pricing, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn route_by_id(&self, id: RouteId) -> Result<Option<Route>>;

    /// Lists the route catalog with resolved station names.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn list_routes(&self) -> Result<Vec<RouteView>>;

    /// Persists all staged ticket/payment pairs of one purchase batch in a
    /// single transaction, returning the store-assigned ticket ids in batch
    /// order.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if any insert fails; in
    /// that case no row from the batch is visible afterwards.
    async fn insert_purchase(&self, staged: &[NewTicket]) -> Result<Vec<TicketId>>;

    /// Reconstructs one ticket joined with its payment, route, and stations.
    /// `None` if the ticket does not exist.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn ticket_view(&self, id: TicketId) -> Result<Option<TicketView>>;

    /// Fetches the views for one purchase batch in a single query. Ids that
    /// do not exist are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn batch_view(&self, ids: &[TicketId]) -> Result<Vec<TicketView>>;

    /// A rider's full ticket history, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn user_history(&self, user: UserId) -> Result<Vec<TicketView>>;

    /// Newest tickets across all riders for the admin report.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn recent_tickets(&self, limit: i64) -> Result<Vec<TicketReportRow>>;

    /// Total tickets sold and revenue collected.
    ///
    /// # Errors
    ///
    /// Returns a persistence or availability error if the query fails.
    async fn sales_summary(&self) -> Result<SalesSummary>;

    /// Cheap connectivity probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns an availability error if the store cannot be reached.
    async fn ping(&self) -> Result<()>;
}
