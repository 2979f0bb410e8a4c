//! `PostgreSQL` ticket store.
//!
//! Runtime-checked `query_as` queries over an injected [`PgPool`]; the pool
//! is built at startup and owned by the server state, never a module global.
//! The batch insert runs inside one transaction so a failure or timeout
//! rolls every staged row back together.

use super::{NewTicket, TicketStore};
use crate::error::{Result, TicketingError};
use crate::fulfillment::{self, RouteView, SalesSummary, TicketReportRow, TicketView};
use crate::types::{
    Money, PaymentMethod, Route, RouteId, StationId, TicketId, TicketStatus, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Raw row shape shared by every joined ticket query.
type TicketRow = (
    i64,           // t.id
    i64,           // t.usuario_id
    String,        // t.codigo
    String,        // t.codigo_qr
    String,        // t.estado
    DateTime<Utc>, // t.fecha_compra
    String,        // r.nombre
    String,        // e1.nombre (origen)
    String,        // e2.nombre (destino)
    i64,           // p.monto
    String,        // p.metodo_pago
    String,        // p.referencia
);

const TICKET_VIEW_SELECT: &str = "
    SELECT t.id, t.usuario_id, t.codigo, t.codigo_qr, t.estado, t.fecha_compra,
           r.nombre, e1.nombre AS origen, e2.nombre AS destino,
           p.monto, p.metodo_pago, p.referencia
    FROM tickets t
    JOIN pagos p ON p.ticket_id = t.id
    JOIN rutas r ON t.ruta_id = r.id
    JOIN estaciones e1 ON r.estacion_origen_id = e1.id
    JOIN estaciones e2 ON r.estacion_destino_id = e2.id";

/// Production ticket store over `PostgreSQL`.
#[derive(Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TicketingError::Persistence {
                reason: format!("migration failed: {e}"),
            })?;
        Ok(())
    }
}

/// Maps driver errors onto the taxonomy: connectivity problems are
/// retryable `Unavailable`, everything else is `Persistence`.
fn storage_error(e: sqlx::Error) -> TicketingError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => TicketingError::Unavailable {
            reason: e.to_string(),
        },
        other => TicketingError::Persistence {
            reason: other.to_string(),
        },
    }
}

fn decode_view(row: TicketRow) -> Result<TicketView> {
    let (id, usuario_id, codigo, codigo_qr, estado, fecha_compra, ruta, origen, destino, monto, metodo, referencia) =
        row;
    Ok(TicketView {
        ticket_id: TicketId::new(id),
        usuario_id: UserId::new(usuario_id),
        codigo,
        codigo_qr,
        estado: parse_status(&estado)?,
        fecha_compra,
        fecha_compra_local: fulfillment::operating_local(fecha_compra),
        ruta_nombre: ruta,
        origen,
        destino,
        monto: money_from_db(monto),
        metodo_pago: parse_method(&metodo)?,
        referencia,
    })
}

fn parse_status(tag: &str) -> Result<TicketStatus> {
    tag.parse()
        .map_err(|reason: String| TicketingError::Persistence { reason })
}

fn parse_method(tag: &str) -> Result<PaymentMethod> {
    tag.parse()
        .map_err(|reason: String| TicketingError::Persistence { reason })
}

#[allow(clippy::cast_sign_loss)]
const fn money_from_db(cents: i64) -> Money {
    Money::from_cents(cents as u64)
}

#[allow(clippy::cast_possible_wrap)]
const fn money_to_db(money: Money) -> i64 {
    money.cents() as i64
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn route_by_id(&self, id: RouteId) -> Result<Option<Route>> {
        let row: Option<(i64, String, i64, i64, i64)> = sqlx::query_as(
            "SELECT id, nombre, precio, estacion_origen_id, estacion_destino_id
             FROM rutas WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|(id, nombre, precio, origen, destino)| Route {
            id: RouteId::new(id),
            nombre,
            precio: money_from_db(precio),
            estacion_origen_id: StationId::new(origen),
            estacion_destino_id: StationId::new(destino),
        }))
    }

    async fn list_routes(&self) -> Result<Vec<RouteView>> {
        let rows: Vec<(i64, String, i64, String, String)> = sqlx::query_as(
            "SELECT r.id, r.nombre, r.precio, e1.nombre AS origen, e2.nombre AS destino
             FROM rutas r
             JOIN estaciones e1 ON r.estacion_origen_id = e1.id
             JOIN estaciones e2 ON r.estacion_destino_id = e2.id
             ORDER BY r.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, nombre, precio, origen, destino)| RouteView {
                id: RouteId::new(id),
                nombre,
                precio: money_from_db(precio),
                origen,
                destino,
            })
            .collect())
    }

    async fn insert_purchase(&self, staged: &[NewTicket]) -> Result<Vec<TicketId>> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let mut ids = Vec::with_capacity(staged.len());

        // All-or-nothing: an error before commit rolls back every pair,
        // including the earlier iterations of this loop.
        for ticket in staged {
            let (ticket_id,): (i64,) = sqlx::query_as(
                "INSERT INTO tickets (usuario_id, ruta_id, codigo, codigo_qr, estado, fecha_compra)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id",
            )
            .bind(ticket.usuario_id.value())
            .bind(ticket.ruta_id.value())
            .bind(&ticket.codigo)
            .bind(&ticket.codigo_qr)
            .bind(ticket.estado.as_str())
            .bind(ticket.fecha_compra)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;

            sqlx::query(
                "INSERT INTO pagos (ticket_id, monto, metodo_pago, referencia, fecha_pago)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(ticket_id)
            .bind(money_to_db(ticket.pago.monto))
            .bind(ticket.pago.metodo_pago.as_str())
            .bind(&ticket.pago.referencia)
            .bind(ticket.pago.fecha_pago)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

            ids.push(TicketId::new(ticket_id));
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(ids)
    }

    async fn ticket_view(&self, id: TicketId) -> Result<Option<TicketView>> {
        let row: Option<TicketRow> = sqlx::query_as(&format!("{TICKET_VIEW_SELECT} WHERE t.id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(decode_view).transpose()
    }

    async fn batch_view(&self, ids: &[TicketId]) -> Result<Vec<TicketView>> {
        let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let rows: Vec<TicketRow> =
            sqlx::query_as(&format!("{TICKET_VIEW_SELECT} WHERE t.id = ANY($1)"))
                .bind(&raw)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        rows.into_iter().map(decode_view).collect()
    }

    async fn user_history(&self, user: UserId) -> Result<Vec<TicketView>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "{TICKET_VIEW_SELECT} WHERE t.usuario_id = $1 ORDER BY t.fecha_compra DESC"
        ))
        .bind(user.value())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(decode_view).collect()
    }

    async fn recent_tickets(&self, limit: i64) -> Result<Vec<TicketReportRow>> {
        let rows: Vec<(i64, String, String, DateTime<Utc>, i64, String)> = sqlx::query_as(
            "SELECT t.id, t.codigo, t.estado, t.fecha_compra, t.usuario_id, r.nombre
             FROM tickets t
             JOIN rutas r ON t.ruta_id = r.id
             ORDER BY t.fecha_compra DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(|(id, codigo, estado, fecha_compra, usuario_id, ruta_nombre)| {
                Ok(TicketReportRow {
                    ticket_id: TicketId::new(id),
                    codigo,
                    estado: parse_status(&estado)?,
                    fecha_compra,
                    fecha_compra_local: fulfillment::operating_local(fecha_compra),
                    usuario_id: UserId::new(usuario_id),
                    ruta_nombre,
                })
            })
            .collect()
    }

    async fn sales_summary(&self) -> Result<SalesSummary> {
        let (count, revenue): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(monto), 0)::BIGINT FROM pagos")
                .fetch_one(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(SalesSummary {
            tickets_sold: u64::try_from(count).unwrap_or_default(),
            total_revenue: money_from_db(revenue),
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(storage_error)
    }
}
