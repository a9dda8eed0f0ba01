// src/test_util.rs

use crate::{Bar, Candles, Price};
use std::num::NonZero;

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

/// Asserts element-wise closeness of two series within an absolute tolerance.
macro_rules! assert_series_near {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let (a, e): (&[f64], &[f64]) = (&$actual, &$expected);
        assert_eq!(a.len(), e.len(), "length mismatch: {a:?} vs {e:?}");
        for (i, (x, y)) in a.iter().zip(e).enumerate() {
            assert!(
                (x - y).abs() <= $tolerance,
                "index {i}: actual={x}, expected={y}, diff={}",
                (x - y).abs(),
            );
        }
    }};
}

pub(crate) use assert_approx;
pub(crate) use assert_series_near;

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).unwrap()
}

/// Candles where every bar is flat at the given close.
pub fn closes(prices: &[Price]) -> Candles {
    Candles::from_closes(prices.to_vec())
}

/// Candles from `(high, low, close)` triples, open equal to close.
pub fn hlc(rows: &[(Price, Price, Price)]) -> Candles {
    let bars: Vec<Bar> = rows
        .iter()
        .map(|&(h, l, c)| Bar::new(c, h, l, c, 0.0))
        .collect();
    Candles::from_bars(&bars)
}
