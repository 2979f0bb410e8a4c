//! In-memory ticket store for tests.
//!
//! Mirrors the `PostgreSQL` store's contract, including atomicity of the
//! batch insert, over plain maps behind a mutex. Failure injection lets
//! tests drive the orchestrator through mid-batch store errors without a
//! database.

use super::{NewTicket, TicketStore};
use crate::error::{Result, TicketingError};
use crate::fulfillment::{self, RouteView, SalesSummary, TicketReportRow, TicketView};
use crate::types::{
    Money, Payment, PaymentId, Route, RouteId, Station, StationId, Ticket, TicketId, UserId,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// Which operation the next injected failure should hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailNext {
    /// Fail `insert_purchase` after staging the given number of pairs.
    InsertAfter(usize),
    /// Fail every read with an availability error.
    Reads,
}

#[derive(Default)]
struct Inner {
    stations: BTreeMap<i64, Station>,
    routes: BTreeMap<i64, Route>,
    tickets: BTreeMap<i64, Ticket>,
    payments: BTreeMap<i64, Payment>,
    next_station_id: i64,
    next_route_id: i64,
    next_ticket_id: i64,
    next_payment_id: i64,
    fail_next: Option<FailNext>,
}

/// In-memory test double for [`TicketStore`].
#[derive(Clone, Default)]
pub struct InMemoryTicketStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a station, returning its id.
    pub fn add_station(&self, nombre: &str, direccion: &str) -> StationId {
        let mut inner = self.lock();
        inner.next_station_id += 1;
        let id = StationId::new(inner.next_station_id);
        inner.stations.insert(
            id.value(),
            Station {
                id,
                nombre: nombre.to_string(),
                direccion: direccion.to_string(),
            },
        );
        id
    }

    /// Seeds a route between two previously seeded stations.
    pub fn add_route(&self, nombre: &str, precio: Money, origen: StationId, destino: StationId) -> RouteId {
        let mut inner = self.lock();
        inner.next_route_id += 1;
        let id = RouteId::new(inner.next_route_id);
        inner.routes.insert(
            id.value(),
            Route {
                id,
                nombre: nombre.to_string(),
                precio,
                estacion_origen_id: origen,
                estacion_destino_id: destino,
            },
        );
        id
    }

    /// Arms a one-shot failure injection.
    pub fn fail_next(&self, mode: FailNext) {
        self.lock().fail_next = Some(mode);
    }

    /// Number of persisted tickets (for atomicity assertions).
    #[must_use]
    pub fn ticket_count(&self) -> usize {
        self.lock().tickets.len()
    }

    /// Number of persisted payments (for atomicity assertions).
    #[must_use]
    pub fn payment_count(&self) -> usize {
        self.lock().payments.len()
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned mutex in a test double is already a failed test.
        self.inner.lock().unwrap()
    }

    fn take_read_failure(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_next == Some(FailNext::Reads) {
            inner.fail_next = None;
            return Err(TicketingError::Unavailable {
                reason: "injected read failure".to_string(),
            });
        }
        Ok(())
    }

    fn view_of(inner: &Inner, ticket: &Ticket) -> Option<TicketView> {
        let payment = inner
            .payments
            .values()
            .find(|p| p.ticket_id == ticket.id)?;
        let route = inner.routes.get(&ticket.ruta_id.value())?;
        let origen = inner.stations.get(&route.estacion_origen_id.value())?;
        let destino = inner.stations.get(&route.estacion_destino_id.value())?;
        Some(TicketView {
            ticket_id: ticket.id,
            usuario_id: ticket.usuario_id,
            codigo: ticket.codigo.clone(),
            codigo_qr: ticket.codigo_qr.clone(),
            estado: ticket.estado,
            fecha_compra: ticket.fecha_compra,
            fecha_compra_local: fulfillment::operating_local(ticket.fecha_compra),
            ruta_nombre: route.nombre.clone(),
            origen: origen.nombre.clone(),
            destino: destino.nombre.clone(),
            monto: payment.monto,
            metodo_pago: payment.metodo_pago,
            referencia: payment.referencia.clone(),
        })
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn route_by_id(&self, id: RouteId) -> Result<Option<Route>> {
        self.take_read_failure()?;
        Ok(self.lock().routes.get(&id.value()).cloned())
    }

    async fn list_routes(&self) -> Result<Vec<RouteView>> {
        self.take_read_failure()?;
        let inner = self.lock();
        Ok(inner
            .routes
            .values()
            .filter_map(|route| {
                let origen = inner.stations.get(&route.estacion_origen_id.value())?;
                let destino = inner.stations.get(&route.estacion_destino_id.value())?;
                Some(RouteView {
                    id: route.id,
                    nombre: route.nombre.clone(),
                    precio: route.precio,
                    origen: origen.nombre.clone(),
                    destino: destino.nombre.clone(),
                })
            })
            .collect())
    }

    async fn insert_purchase(&self, staged: &[NewTicket]) -> Result<Vec<TicketId>> {
        let mut inner = self.lock();

        // Stage everything before touching the maps so an injected failure
        // leaves no partial batch, matching the transactional contract.
        let fail_after = match inner.fail_next {
            Some(FailNext::InsertAfter(n)) => {
                inner.fail_next = None;
                Some(n)
            }
            _ => None,
        };

        let mut pairs = Vec::with_capacity(staged.len());
        for (index, ticket) in staged.iter().enumerate() {
            if fail_after == Some(index) {
                return Err(TicketingError::Persistence {
                    reason: format!("injected insert failure at pair {index}"),
                });
            }
            let ticket_id = TicketId::new(inner.next_ticket_id + 1 + i64::try_from(index).unwrap_or(0));
            let payment_id = PaymentId::new(inner.next_payment_id + 1 + i64::try_from(index).unwrap_or(0));
            pairs.push((
                Ticket {
                    id: ticket_id,
                    usuario_id: ticket.usuario_id,
                    ruta_id: ticket.ruta_id,
                    codigo: ticket.codigo.clone(),
                    codigo_qr: ticket.codigo_qr.clone(),
                    estado: ticket.estado,
                    fecha_compra: ticket.fecha_compra,
                },
                Payment {
                    id: payment_id,
                    ticket_id,
                    monto: ticket.pago.monto,
                    metodo_pago: ticket.pago.metodo_pago,
                    referencia: ticket.pago.referencia.clone(),
                    fecha_pago: ticket.pago.fecha_pago,
                },
            ));
        }

        let count = i64::try_from(pairs.len()).unwrap_or(0);
        inner.next_ticket_id += count;
        inner.next_payment_id += count;

        let mut ids = Vec::with_capacity(pairs.len());
        for (ticket, payment) in pairs {
            ids.push(ticket.id);
            inner.tickets.insert(ticket.id.value(), ticket);
            inner.payments.insert(payment.id.value(), payment);
        }
        Ok(ids)
    }

    async fn ticket_view(&self, id: TicketId) -> Result<Option<TicketView>> {
        self.take_read_failure()?;
        let inner = self.lock();
        Ok(inner
            .tickets
            .get(&id.value())
            .and_then(|ticket| Self::view_of(&inner, ticket)))
    }

    async fn batch_view(&self, ids: &[TicketId]) -> Result<Vec<TicketView>> {
        self.take_read_failure()?;
        let inner = self.lock();
        // Each ticket appears once even if the id list repeats it, matching
        // the relational `ANY($1)` lookup.
        let mut seen = BTreeSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(id.value()))
            .filter_map(|id| inner.tickets.get(&id.value()))
            .filter_map(|ticket| Self::view_of(&inner, ticket))
            .collect())
    }

    async fn user_history(&self, user: UserId) -> Result<Vec<TicketView>> {
        self.take_read_failure()?;
        let inner = self.lock();
        let mut views: Vec<TicketView> = inner
            .tickets
            .values()
            .filter(|t| t.usuario_id == user)
            .filter_map(|ticket| Self::view_of(&inner, ticket))
            .collect();
        views.sort_by(|a, b| {
            b.fecha_compra
                .cmp(&a.fecha_compra)
                .then(b.ticket_id.cmp(&a.ticket_id))
        });
        Ok(views)
    }

    async fn recent_tickets(&self, limit: i64) -> Result<Vec<TicketReportRow>> {
        self.take_read_failure()?;
        let inner = self.lock();
        let mut rows: Vec<TicketReportRow> = inner
            .tickets
            .values()
            .filter_map(|ticket| {
                let route = inner.routes.get(&ticket.ruta_id.value())?;
                Some(TicketReportRow {
                    ticket_id: ticket.id,
                    codigo: ticket.codigo.clone(),
                    estado: ticket.estado,
                    fecha_compra: ticket.fecha_compra,
                    fecha_compra_local: fulfillment::operating_local(ticket.fecha_compra),
                    usuario_id: ticket.usuario_id,
                    ruta_nombre: route.nombre.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.fecha_compra
                .cmp(&a.fecha_compra)
                .then(b.ticket_id.cmp(&a.ticket_id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn sales_summary(&self) -> Result<SalesSummary> {
        self.take_read_failure()?;
        let inner = self.lock();
        let mut total = Money::from_cents(0);
        for payment in inner.payments.values() {
            total = total
                .checked_add(payment.monto)
                .ok_or_else(|| TicketingError::validation("revenue overflow"))?;
        }
        Ok(SalesSummary {
            tickets_sold: inner.payments.len() as u64,
            total_revenue: total,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.take_read_failure()
    }
}
