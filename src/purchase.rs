//! Purchase orchestration.
//!
//! One call = one batch: validate the quantity, price the route, resolve the
//! payment reference, stamp the batch, generate N codes, and persist N
//! ticket/payment pairs through a single store transaction. The call moves
//! through `Validating -> PricingResolved -> Paying -> Committed`, or
//! `Failed` at any point with no partial writes - there is no
//! partial-success terminal state.

use crate::error::{Result, TicketingError};
use crate::fare;
use crate::payment_gateway::PaymentGateway;
use crate::store::{NewPayment, NewTicket, TicketStore};
use crate::ticket_code::{self, CodeContext};
use crate::types::{FareClass, Money, PaymentMethod, RouteId, TicketId, TicketStatus, UserId};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// One purchase call's inputs.
#[derive(Clone, Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Purchasing rider (supplied by the external auth collaborator).
    pub user_id: UserId,
    /// Route to purchase.
    pub route_id: RouteId,
    /// Tickets to issue. Absent defaults to 1; zero is rejected.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// How the batch is paid for.
    pub payment_method: PaymentMethod,
    /// Pricing tier, uniform across the batch.
    #[serde(default)]
    pub fare_class: FareClass,
    /// Caller-supplied payment reference for non-card methods.
    #[serde(default)]
    pub reference: Option<String>,
}

/// The result of one successful purchase call. Ephemeral: held only long
/// enough to render the confirmation view via its token.
#[derive(Clone, Debug)]
pub struct PurchaseBatch {
    /// Store-assigned ids of the created tickets, in batch order.
    pub ticket_ids: Vec<TicketId>,
    /// Price charged per ticket.
    pub unit_price: Money,
    /// Sum charged across the batch.
    pub total: Money,
    /// The shared batch timestamp.
    pub purchased_at: DateTime<Utc>,
}

/// Coordinates fare calculation, code generation, the payment gateway seam,
/// and the transactional store write.
pub struct PurchaseOrchestrator {
    store: Arc<dyn TicketStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PurchaseOrchestrator {
    /// Creates an orchestrator over injected collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn TicketStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Executes one purchase call.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::Validation`] for a zero quantity.
    /// - [`TicketingError::RouteNotFound`] for an unknown route (no fallback
    ///   price is substituted).
    /// - [`TicketingError::Gateway`] if the card authorization fails.
    /// - [`TicketingError::Encoding`] if a QR image cannot be rendered.
    /// - [`TicketingError::Persistence`] / [`TicketingError::Unavailable`]
    ///   if the store write fails; the whole batch rolls back.
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<PurchaseBatch> {
        let quantity = validate_quantity(request.quantity)?;

        let route = self
            .store
            .route_by_id(request.route_id)
            .await?
            .ok_or(TicketingError::RouteNotFound {
                id: request.route_id,
            })?;

        let unit_price = fare::unit_price(route.precio, request.fare_class);
        let total = unit_price
            .checked_mul(u64::from(quantity))
            .ok_or_else(|| TicketingError::validation("batch total overflow"))?;

        // One timestamp for the whole batch; stored as the UTC instant and
        // rendered in the operator's fixed timezone downstream.
        let purchased_at = Utc::now();

        let referencia = self
            .resolve_reference(&request, total, purchased_at)
            .await?;

        let mut staged = Vec::with_capacity(quantity as usize);
        for sequence in 0..quantity {
            let code = ticket_code::generate(&CodeContext {
                user_id: request.user_id,
                route_id: route.id,
                issued_at: purchased_at,
                sequence,
            })?;
            staged.push(NewTicket {
                usuario_id: request.user_id,
                ruta_id: route.id,
                codigo: code.code,
                codigo_qr: code.qr_data_url,
                estado: TicketStatus::Paid,
                fecha_compra: purchased_at,
                pago: NewPayment {
                    monto: unit_price,
                    metodo_pago: request.payment_method,
                    referencia: referencia.clone(),
                    fecha_pago: purchased_at,
                },
            });
        }

        let ticket_ids = self.store.insert_purchase(&staged).await?;
        tracing::info!(
            user = %request.user_id,
            route = %route.id,
            quantity,
            %unit_price,
            %total,
            "purchase committed"
        );

        Ok(PurchaseBatch {
            ticket_ids,
            unit_price,
            total,
            purchased_at,
        })
    }

    /// Card methods go through the gateway seam; other methods use the
    /// caller's reference or a synthesized `REF-<millis>` one.
    async fn resolve_reference(
        &self,
        request: &PurchaseRequest,
        total: Money,
        purchased_at: DateTime<Utc>,
    ) -> Result<String> {
        if request.payment_method.is_card() {
            let authorization = self
                .gateway
                .authorize(total, request.payment_method, purchased_at)
                .await?;
            return Ok(authorization.reference);
        }
        Ok(request
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map_or_else(
                || format!("REF-{}", purchased_at.timestamp_millis()),
                ToString::to_string,
            ))
    }
}

/// Absent quantity defaults to a single ticket; an explicit zero is a
/// caller error, not something to coerce.
fn validate_quantity(quantity: Option<u32>) -> Result<u32> {
    match quantity {
        None => Ok(1),
        Some(0) => Err(TicketingError::validation(
            "quantity must be a positive integer",
        )),
        Some(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::payment_gateway::SimulatedGateway;
    use crate::store::{FailNext, InMemoryTicketStore};
    use crate::types::Money;
    use std::collections::HashSet;

    fn orchestrator_with_route(precio_cents: u64) -> (PurchaseOrchestrator, InMemoryTicketStore, RouteId) {
        let store = InMemoryTicketStore::new();
        let a = store.add_station("Quitumbe", "Av. Condor Nan");
        let b = store.add_station("El Labrador", "Av. Galo Plaza");
        let route = store.add_route("L1 Sur-Norte", Money::from_cents(precio_cents), a, b);
        let orchestrator = PurchaseOrchestrator::new(
            Arc::new(store.clone()),
            Arc::new(SimulatedGateway),
        );
        (orchestrator, store, route)
    }

    fn request(route: RouteId, quantity: Option<u32>, method: PaymentMethod) -> PurchaseRequest {
        PurchaseRequest {
            user_id: UserId::new(1),
            route_id: route,
            quantity,
            payment_method: method,
            fare_class: FareClass::Standard,
            reference: None,
        }
    }

    #[tokio::test]
    async fn cash_purchase_of_three_standard_tickets_totals_1_65() {
        let (orchestrator, store, route) = orchestrator_with_route(55);
        let batch = orchestrator
            .purchase(request(route, Some(3), PaymentMethod::Cash))
            .await
            .unwrap();

        assert_eq!(batch.ticket_ids.len(), 3);
        assert_eq!(batch.unit_price, Money::from_cents(55));
        assert_eq!(batch.total, Money::from_cents(165));
        assert_eq!(batch.total.to_string(), "1.65");
        assert_eq!(store.ticket_count(), 3);
        assert_eq!(store.payment_count(), 3);
    }

    #[tokio::test]
    async fn batch_shares_payer_route_method_and_timestamp_with_distinct_codes() {
        let (orchestrator, store, route) = orchestrator_with_route(55);
        let batch = orchestrator
            .purchase(request(route, Some(4), PaymentMethod::Cash))
            .await
            .unwrap();

        let views = store.batch_view(&batch.ticket_ids).await.unwrap();
        assert_eq!(views.len(), 4);

        let codes: HashSet<&str> = views.iter().map(|v| v.codigo.as_str()).collect();
        assert_eq!(codes.len(), 4);

        for view in &views {
            assert_eq!(view.usuario_id, UserId::new(1));
            assert_eq!(view.ruta_nombre, "L1 Sur-Norte");
            assert_eq!(view.metodo_pago, PaymentMethod::Cash);
            assert_eq!(view.fecha_compra, batch.purchased_at);
            assert_eq!(view.monto, Money::from_cents(55));
            assert_eq!(view.estado, TicketStatus::Paid);
        }
    }

    #[tokio::test]
    async fn reduced_and_differential_fares_ignore_the_base_price() {
        let (orchestrator, _store, route) = orchestrator_with_route(55);

        let mut reduced = request(route, Some(1), PaymentMethod::Cash);
        reduced.fare_class = FareClass::Reduced;
        let batch = orchestrator.purchase(reduced).await.unwrap();
        assert_eq!(batch.unit_price, Money::from_cents(22));

        let mut differential = request(route, Some(1), PaymentMethod::Cash);
        differential.fare_class = FareClass::Differential;
        let batch = orchestrator.purchase(differential).await.unwrap();
        assert_eq!(batch.unit_price, Money::from_cents(10));
    }

    #[tokio::test]
    async fn unknown_route_is_rejected_without_a_fallback_price() {
        let (orchestrator, store, _route) = orchestrator_with_route(55);
        let err = orchestrator
            .purchase(request(RouteId::new(9999), Some(1), PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TicketingError::RouteNotFound { id } if id == RouteId::new(9999)
        ));
        assert_eq!(store.ticket_count(), 0);
    }

    #[tokio::test]
    async fn absent_quantity_defaults_to_one_and_zero_is_rejected() {
        let (orchestrator, store, route) = orchestrator_with_route(45);

        let batch = orchestrator
            .purchase(request(route, None, PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(batch.ticket_ids.len(), 1);
        assert_eq!(store.ticket_count(), 1);

        let err = orchestrator
            .purchase(request(route, Some(0), PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::Validation { .. }));
        assert_eq!(store.ticket_count(), 1);
    }

    #[tokio::test]
    async fn card_purchases_carry_a_gateway_reference() {
        let (orchestrator, store, route) = orchestrator_with_route(55);
        let batch = orchestrator
            .purchase(request(route, Some(2), PaymentMethod::Credit))
            .await
            .unwrap();

        let views = store.batch_view(&batch.ticket_ids).await.unwrap();
        for view in &views {
            assert!(view.referencia.starts_with("CARD-"));
        }
        // One gateway authorization shared by the whole batch.
        assert_eq!(views[0].referencia, views[1].referencia);
    }

    #[tokio::test]
    async fn transfer_uses_caller_reference_and_synthesizes_when_absent() {
        let (orchestrator, store, route) = orchestrator_with_route(55);

        let mut with_reference = request(route, Some(1), PaymentMethod::Transfer);
        with_reference.reference = Some("BANK-778899".to_string());
        let batch = orchestrator.purchase(with_reference).await.unwrap();
        let view = store
            .ticket_view(batch.ticket_ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.referencia, "BANK-778899");

        let mut blank_reference = request(route, Some(1), PaymentMethod::Transfer);
        blank_reference.reference = Some("   ".to_string());
        let batch = orchestrator.purchase(blank_reference).await.unwrap();
        let view = store
            .ticket_view(batch.ticket_ids[0])
            .await
            .unwrap()
            .unwrap();
        assert!(view.referencia.starts_with("REF-"));
    }

    #[tokio::test]
    async fn store_failure_mid_batch_persists_nothing() {
        let (orchestrator, store, route) = orchestrator_with_route(55);
        store.fail_next(FailNext::InsertAfter(2));

        let err = orchestrator
            .purchase(request(route, Some(3), PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::Persistence { .. }));
        assert_eq!(store.ticket_count(), 0);
        assert_eq!(store.payment_count(), 0);
    }
}
