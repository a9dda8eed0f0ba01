/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// An ordered sequence of values, one per bar.
///
/// Every series produced from the same input has the same length as that
/// input, and index `i` always refers to bar `i`.
pub type Series = Vec<Price>;

/// OHLCV bar data used as input to all indicators.
///
/// Implement this on your own kline/candle type to avoid conversion.
/// Indicators read bars in slice order: index 0 is the oldest bar.
///
/// # Example
///
/// ```
/// use quantedge_studies::{Ohlcv, Price};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing price of the bar.
    fn close(&self) -> Price;

    /// Trade volume during the bar. Defaults to `0.0`.
    ///
    /// Indicators that don't use volume ignore this value.
    fn volume(&self) -> f64 {
        0.0
    }
}

/// A plain OHLCV bar.
///
/// Ready-made [`Ohlcv`] implementation for callers without their own
/// candle type.
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct Bar {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
}

impl Bar {
    #[must_use]
    pub fn new(open: Price, high: Price, low: Price, close: Price, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar with every price equal to `price` and no volume.
    #[must_use]
    pub fn flat(price: Price) -> Self {
        Self::new(price, price, price, price, 0.0)
    }
}

impl Ohlcv for Bar {
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

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    struct Close(f64);

    impl Ohlcv for Close {
        fn open(&self) -> Price {
            self.0
        }
        fn high(&self) -> Price {
            self.0
        }
        fn low(&self) -> Price {
            self.0
        }
        fn close(&self) -> Price {
            self.0
        }
    }

    #[test]
    fn volume_defaults_to_zero() {
        assert_eq!(Close(5.0).volume(), 0.0);
    }

    #[test]
    fn bar_reports_its_fields() {
        let bar = Bar::new(1.0, 4.0, 0.5, 3.0, 100.0);
        assert_eq!(bar.open(), 1.0);
        assert_eq!(bar.high(), 4.0);
        assert_eq!(bar.low(), 0.5);
        assert_eq!(bar.close(), 3.0);
        assert_eq!(bar.volume(), 100.0);
    }

    #[test]
    fn flat_bar_has_equal_prices() {
        let bar = Bar::flat(7.0);
        assert_eq!(bar, Bar::new(7.0, 7.0, 7.0, 7.0, 0.0));
    }
}
