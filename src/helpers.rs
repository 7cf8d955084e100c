//! Shared rounding helpers for weather values.
//!
//! Rounding goes through `Decimal` so that values such as 2.25 round to 2.3
//! rather than drifting on their binary f64 representation. Midpoints round
//! away from zero.
//!
//! Both helpers return 0 for non-finite inputs (NaN, ±Inf).

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

fn to_decimal(v: f64, context: &str) -> Option<Decimal> {
    if !v.is_finite() {
        tracing::warn!("{} received non-finite value {}, defaulting to 0", context, v);
        return None;
    }
    Decimal::from_f64(v)
}

/// Round an f64 to 1 decimal place (temperature, precipitation, wind speed).
pub(crate) fn round_1dp(v: f64) -> f64 {
    to_decimal(v, "round_1dp")
        .map(|d| d.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

/// Round an f64 to the nearest integer (humidity, pressure, cloud cover, degrees).
pub(crate) fn round_to_i64(v: f64) -> i64 {
    to_decimal(v, "round_to_i64")
        .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_i64())
        .unwrap_or(0)
}
