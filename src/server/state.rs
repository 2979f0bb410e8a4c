//! Shared application state.

use crate::payment_gateway::PaymentGateway;
use crate::purchase::PurchaseOrchestrator;
use crate::store::TicketStore;
use std::sync::Arc;

/// State shared across all HTTP handlers, cloned cheaply per request.
///
/// Both the store and the gateway are injected at startup; nothing here is
/// process-global, so tests build a state over the in-memory store.
#[derive(Clone)]
pub struct AppState {
    /// Relational store behind purchases and views.
    pub store: Arc<dyn TicketStore>,
    /// The purchase workflow.
    pub orchestrator: Arc<PurchaseOrchestrator>,
}

impl AppState {
    /// Wires the orchestrator over the given collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn TicketStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let orchestrator = Arc::new(PurchaseOrchestrator::new(Arc::clone(&store), gateway));
        Self {
            store,
            orchestrator,
        }
    }
}
