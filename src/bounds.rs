//! Clamping, rounding and zero-denominator guards.

use crate::{Price, Series};

/// Decimal places kept in every value an indicator emits.
///
/// Rounding outputs to a fixed precision keeps signal classification stable
/// across platforms: two runs over the same bars compare equal bit for bit.
pub const PRECISION: u32 = 4;

/// Confines `value` to `[lo, hi]`.
///
/// NaN maps to `lo`. Unlike [`f64::clamp`] this never panics; callers pass
/// constant ranges with `lo <= hi`.
#[inline]
#[must_use]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    debug_assert!(lo <= hi, "clamp range inverted: lo={lo}, hi={hi}");

    if value.is_nan() || value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Rounds half away from zero to `decimals` places.
///
/// Non-finite values pass through unchanged.
#[inline]
#[must_use]
pub fn round(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    #[allow(clippy::cast_possible_wrap)]
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;

    // keep -0.0 out of outputs
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Rounds every element of `series` in place and returns it.
#[must_use]
pub fn round_series(mut series: Series, decimals: u32) -> Series {
    for value in &mut series {
        *value = round(*value, decimals);
    }
    series
}

/// `numerator / denominator`, or `fallback` when the denominator is zero.
#[inline]
#[must_use]
pub fn ratio_or(numerator: Price, denominator: Price, fallback: f64) -> f64 {
    if denominator == 0.0 {
        fallback
    } else {
        numerator / denominator
    }
}
