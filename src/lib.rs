//! Transit ticketing core.
//!
//! Riders browse routes, purchase tickets, and view their history; the
//! operator reads sales reports. The heart of the crate is the **purchase
//! workflow** - the one subsystem with real invariants (money, uniqueness of
//! ticket codes, multi-row transactional writes):
//!
//! ```text
//! POST /api/purchase
//!        │
//!        ▼
//! ┌────────────────────┐   route lookup    ┌──────────────┐
//! │     Purchase       │ ────────────────► │  TicketStore │
//! │   Orchestrator     │                   │  (Postgres)  │
//! │                    │   N pairs, one tx │              │
//! │ fare → codes → pay │ ────────────────► │ tickets+pagos│
//! └────────────────────┘                   └──────────────┘
//!        │
//!        ▼
//! confirmation token ──► GET /api/purchase-confirmation
//! ```
//!
//! Key guarantees:
//!
//! - A purchase of quantity N commits exactly N ticket/payment pairs
//!   **atomically**: a failure anywhere rolls the whole batch back.
//! - Every ticket code is process-unique (batch timestamp + payer + route +
//!   sequence) and rendered as a self-contained QR data URL.
//! - `reduced`/`differential` fares are fixed statutory amounts; `standard`
//!   charges the route's base price.
//! - Unknown routes are rejected, not silently priced.
//!
//! Authentication, HTML rendering, and admin CRUD for stations/routes/users
//! are external collaborators; this crate exposes the JSON core they call.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod fare;
pub mod fulfillment;
pub mod payment_gateway;
pub mod purchase;
pub mod server;
pub mod store;
pub mod ticket_code;
pub mod types;

pub use config::Config;
pub use error::{Result, TicketingError};
pub use purchase::{PurchaseBatch, PurchaseOrchestrator, PurchaseRequest};
pub use server::{AppState, build_router};
pub use store::{InMemoryTicketStore, PostgresTicketStore, TicketStore};
