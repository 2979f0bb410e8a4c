//! HTTP API handlers.
//!
//! Thin JSON layer over the core, organized by concern:
//! - Purchase: the one write path.
//! - Tickets: single ticket, confirmation, and history views.
//! - Routes: the browse catalog.
//! - Reports: operator rollups.

mod error;
pub mod purchase;
pub mod reports;
pub mod routes;
pub mod tickets;

pub use error::ApiError;
pub use purchase::create_purchase;
pub use reports::{sales_report, ticket_report};
pub use routes::list_routes;
pub use tickets::{get_ticket, purchase_confirmation, user_history};
