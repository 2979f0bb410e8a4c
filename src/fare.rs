//! Fare calculation.
//!
//! Pure pricing policy: the fare class selects either the route's base price
//! or one of two fixed statutory overrides. The overrides deliberately ignore
//! the route - a reduced ticket costs 0.22 on every route, a differential
//! ticket 0.10. This mirrors the operator's published tariff and is not a
//! per-route discount.

use crate::types::{FareClass, Money};

/// Fixed fare charged for the `Reduced` class, regardless of route.
pub const REDUCED_FARE: Money = Money::from_cents(22);

/// Fixed fare charged for the `Differential` class, regardless of route.
pub const DIFFERENTIAL_FARE: Money = Money::from_cents(10);

/// Price charged per ticket for one route and fare class.
///
/// Deterministic and side-effect free; applied uniformly across a batch.
#[must_use]
pub const fn unit_price(base: Money, class: FareClass) -> Money {
    match class {
        FareClass::Standard => base,
        FareClass::Reduced => REDUCED_FARE,
        FareClass::Differential => DIFFERENTIAL_FARE,
    }
}
