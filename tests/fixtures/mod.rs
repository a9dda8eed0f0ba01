#![allow(dead_code)]

use quantedge_studies::{Candles, Ohlcv, Price};
use serde::{Deserialize, de::DeserializeOwned};

/// Hourly OHLCV bar parsed from the fixture CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct RefBar {
    pub open_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv for RefBar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub open_time: u64,
    pub expected: f64,
}

/// Reference channel value (Bollinger, Donchian) with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefChannel {
    pub open_time: u64,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Reference RSI and signal line with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefRsi {
    pub open_time: u64,
    pub rsi: f64,
    pub signal: f64,
}

/// Reference stochastic %K and %D with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefStochastic {
    pub open_time: u64,
    pub fast_k: f64,
    pub slow_d: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/ohlcv-1h.csv";

/// Load reference OHLCV bars.
pub fn load_reference_ohlcvs() -> Vec<RefBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Reference bars as columns.
pub fn load_reference_candles() -> Candles {
    Candles::from_bars(&load_reference_ohlcvs())
}

/// Load single-value reference data (moving averages).
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

/// Load channel reference data (upper, middle, lower).
pub fn load_channel_ref(path: &str) -> Vec<RefChannel> {
    load_records(path, "invalid channel reference record")
}

pub fn load_rsi_ref(path: &str) -> Vec<RefRsi> {
    load_records(path, "invalid RSI reference record")
}

pub fn load_stochastic_ref(path: &str) -> Vec<RefStochastic> {
    load_records(path, "invalid stochastic reference record")
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Assert a computed series lines up bar for bar with reference rows.
///
/// `expected` maps each reference row to its open time and value.
pub fn assert_series_matches<R>(
    name: &str,
    bars: &[RefBar],
    actual: &[f64],
    reference: &[R],
    expected: impl Fn(&R) -> (u64, f64),
    tolerance: f64,
) {
    assert_eq!(actual.len(), bars.len(), "{name}: output length");
    assert_eq!(reference.len(), bars.len(), "{name}: reference length");

    for (i, ((bar, &value), row)) in bars.iter().zip(actual).zip(reference).enumerate() {
        let (open_time, want) = expected(row);
        assert_eq!(bar.open_time, open_time, "{name}: misaligned row {i}");
        assert_near(
            value,
            want,
            tolerance,
            &format!("{name} at bar {i} (t={open_time})"),
        );
    }
}

/// Generate a reference match test for a moving average kind.
///
/// Usage: `reference_test!(sma_20, MaKind::Simple, 20, "tests/fixtures/data/sma-20-close.csv", 1e-9);`
#[allow(unused_macros)]
macro_rules! reference_test {
    ($name:ident, $kind:expr, $length:expr, $ref_path:expr, $tolerance:expr) => {
        mod $name {
            use super::fixtures::*;
            use quantedge_studies::*;
            use std::num::NonZero;

            #[test]
            fn matches_reference() {
                let bars = load_reference_ohlcvs();
                let reference = load_ref_values($ref_path);
                let candles = Candles::from_bars(&bars);
                let length = NonZero::new($length).unwrap();

                let actual = moving_average($kind, length, candles.close());

                assert_series_matches(
                    stringify!($name),
                    &bars,
                    &actual,
                    &reference,
                    |r| (r.open_time, r.expected),
                    $tolerance,
                );
            }

            #[test]
            #[allow(clippy::float_cmp)]
            fn first_value_is_first_close() {
                let bars = load_reference_ohlcvs();
                let candles = Candles::from_bars(&bars);
                let length = NonZero::new($length).unwrap();

                let actual = moving_average($kind, length, candles.close());

                assert_eq!(actual[0], bars[0].close);
            }
        }
    };
}

#[allow(unused_imports)]
pub(crate) use reference_test;

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
