//! Domain types for the transit ticketing core.
//!
//! Value objects and entities shared by the purchase workflow and the
//! fulfillment read side: identifiers, `Money`, fare classes, payment
//! methods, and the persisted `Route`/`Station`/`Ticket`/`Payment` shapes.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The operator's fixed timezone. Every purchase timestamp is normalized to
/// this zone before it is rendered or embedded in a ticket code.
pub const OPERATING_TZ: Tz = chrono_tz::America::Guayaquil;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a station (assigned by the store).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(i64);

impl StationId {
    /// Wraps a raw store-assigned id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a route (assigned by the store).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(i64);

impl RouteId {
    /// Wraps a raw store-assigned id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket (assigned by the store).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(i64);

impl TicketId {
    /// Wraps a raw store-assigned id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payment record (assigned by the store).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(i64);

impl PaymentId {
    /// Wraps a raw store-assigned id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the purchasing rider (owned by the external auth collaborator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw user id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in integer cents (USD).
///
/// Integer cents avoid floating-point rounding in payment records. Display
/// renders two decimal places, matching the confirmation-view requirement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Multiplies the amount by a unit count with overflow checking.
    #[must_use]
    pub const fn checked_mul(self, units: u64) -> Option<Self> {
        match self.0.checked_mul(units) {
            Some(product) => Some(Self(product)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Pricing tier selector applied uniformly across a purchase batch.
///
/// `Reduced` and `Differential` are fixed statutory overrides that ignore the
/// route's base price; see [`crate::fare`]. Unrecognized selectors fall back
/// to `Standard` rather than rejecting the purchase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FareClass {
    /// Charge the route's base price.
    #[default]
    Standard,
    /// Fixed reduced fare (seniors, students).
    Reduced,
    /// Fixed differential fare (subsidized riders).
    Differential,
}

impl From<String> for FareClass {
    fn from(selector: String) -> Self {
        match selector.as_str() {
            "reduced" => Self::Reduced,
            "differential" => Self::Differential,
            _ => Self::Standard,
        }
    }
}

/// How a purchase was paid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash at a staffed booth.
    Cash,
    /// Credit card, settled through the payment gateway seam.
    Credit,
    /// Debit card, settled through the payment gateway seam.
    Debit,
    /// Bank transfer identified by a caller-supplied reference.
    Transfer,
}

impl PaymentMethod {
    /// Card methods are authorized by the payment gateway; the rest carry a
    /// caller-supplied or synthesized reference.
    #[must_use]
    pub const fn is_card(self) -> bool {
        matches!(self, Self::Credit | Self::Debit)
    }

    /// Stable string tag stored in the `pagos.metodo_pago` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Transfer => "transfer",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "transfer" => Ok(Self::Transfer),
            other => Err(format!("unknown payment method tag: {other}")),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a ticket. The purchase workflow only ever writes
/// `Paid`; `Pending` exists for rows staged by out-of-band tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Created but not yet backed by a payment.
    Pending,
    /// Paid for; exactly one payment record exists.
    Paid,
}

impl TicketStatus {
    /// Stable string tag stored in the `tickets.estado` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown ticket status tag: {other}")),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A named stop referenced by routes. Read-only during a purchase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Station {
    /// Station id.
    pub id: StationId,
    /// Station name.
    pub nombre: String,
    /// Street address.
    pub direccion: String,
}

/// A priced origin-destination transit link. Read-only during a purchase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    /// Route id.
    pub id: RouteId,
    /// Display name.
    pub nombre: String,
    /// Base price charged for the `Standard` fare class.
    pub precio: Money,
    /// Origin station.
    pub estacion_origen_id: StationId,
    /// Destination station.
    pub estacion_destino_id: StationId,
}

/// One purchased ride instance with a unique scannable code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id.
    pub id: TicketId,
    /// Owning rider.
    pub usuario_id: UserId,
    /// Route the ticket is valid for.
    pub ruta_id: RouteId,
    /// Unique code embedded in the QR image.
    pub codigo: String,
    /// QR rendering of `codigo` as a self-contained SVG data URL.
    pub codigo_qr: String,
    /// Lifecycle state.
    pub estado: TicketStatus,
    /// Batch purchase timestamp.
    pub fecha_compra: DateTime<Utc>,
}

/// The monetary record backing exactly one ticket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    /// Payment id.
    pub id: PaymentId,
    /// Ticket this payment settles.
    pub ticket_id: TicketId,
    /// Amount charged.
    pub monto: Money,
    /// Payment method tag.
    pub metodo_pago: PaymentMethod,
    /// Gateway transaction id or bank reference.
    pub referencia: String,
    /// Batch purchase timestamp.
    pub fecha_pago: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_displays_two_decimal_places() {
        assert_eq!(Money::from_cents(165).to_string(), "1.65");
        assert_eq!(Money::from_cents(45).to_string(), "0.45");
        assert_eq!(Money::from_cents(100).to_string(), "1.00");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn money_checked_arithmetic() {
        let price = Money::from_cents(55);
        assert_eq!(price.checked_mul(3), Some(Money::from_cents(165)));
        assert_eq!(
            price.checked_add(Money::from_cents(45)),
            Some(Money::from_cents(100))
        );
        assert_eq!(Money::from_cents(u64::MAX).checked_mul(2), None);
    }

    #[test]
    fn fare_class_falls_back_to_standard() {
        assert_eq!(FareClass::from("reduced".to_string()), FareClass::Reduced);
        assert_eq!(
            FareClass::from("differential".to_string()),
            FareClass::Differential
        );
        assert_eq!(FareClass::from("standard".to_string()), FareClass::Standard);
        assert_eq!(FareClass::from("vip".to_string()), FareClass::Standard);
        assert_eq!(FareClass::default(), FareClass::Standard);
    }

    #[test]
    fn payment_method_tags_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Credit,
            PaymentMethod::Debit,
            PaymentMethod::Transfer,
        ] {
            assert_eq!(method.as_str().parse::<PaymentMethod>(), Ok(method));
        }
        assert!("check".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn only_card_methods_use_the_gateway() {
        assert!(PaymentMethod::Credit.is_card());
        assert!(PaymentMethod::Debit.is_card());
        assert!(!PaymentMethod::Cash.is_card());
        assert!(!PaymentMethod::Transfer.is_card());
    }
}
