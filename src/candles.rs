use crate::{Error, Ohlcv, Price, PriceSource, Result, Series};

/// Aligned OHLCV columns extracted from a bar sequence.
///
/// All five columns have the same length, and index `i` of each refers to
/// bar `i`. Built once per input and shared read-only by every stage of an
/// indicator.
///
/// # Example
///
/// ```
/// use quantedge_studies::{Bar, Candles, PriceSource};
///
/// let bars = [
///     Bar::new(10.0, 12.0, 9.0, 11.0, 100.0),
///     Bar::new(11.0, 14.0, 10.0, 13.0, 150.0),
/// ];
/// let candles = Candles::from_bars(&bars);
///
/// assert_eq!(candles.len(), 2);
/// assert_eq!(candles.price(PriceSource::HL2), vec![10.5, 12.0]);
/// ```
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Candles {
    open: Series,
    high: Series,
    low: Series,
    close: Series,
    volume: Series,
}

impl Candles {
    /// Splits bars into columns.
    #[must_use]
    pub fn from_bars<B: Ohlcv>(bars: &[B]) -> Self {
        let mut candles = Self {
            open: Vec::with_capacity(bars.len()),
            high: Vec::with_capacity(bars.len()),
            low: Vec::with_capacity(bars.len()),
            close: Vec::with_capacity(bars.len()),
            volume: Vec::with_capacity(bars.len()),
        };

        for bar in bars {
            candles.open.push(bar.open());
            candles.high.push(bar.high());
            candles.low.push(bar.low());
            candles.close.push(bar.close());
            candles.volume.push(bar.volume());
        }

        candles
    }

    /// Builds candles from pre-extracted columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MisalignedColumns`] if any column's length differs
    /// from `close`.
    pub fn from_columns(
        open: Series,
        high: Series,
        low: Series,
        close: Series,
        volume: Series,
    ) -> Result<Self> {
        let expected = close.len();

        for (column, values) in [
            ("open", &open),
            ("high", &high),
            ("low", &low),
            ("volume", &volume),
        ] {
            if values.len() != expected {
                tracing::debug!(column, expected, actual = values.len(), "rejecting columns");
                return Err(Error::MisalignedColumns {
                    column,
                    expected,
                    actual: values.len(),
                });
            }
        }

        Ok(Self {
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Candles whose open, high, low and close all equal `close`.
    ///
    /// Volume is zero. This is how one indicator's primary series is fed into
    /// another.
    #[must_use]
    pub fn from_closes(close: Series) -> Self {
        Self {
            open: close.clone(),
            high: close.clone(),
            low: close.clone(),
            volume: vec![0.0; close.len()],
            close,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn open(&self) -> &[Price] {
        &self.open
    }

    #[inline]
    #[must_use]
    pub fn high(&self) -> &[Price] {
        &self.high
    }

    #[inline]
    #[must_use]
    pub fn low(&self) -> &[Price] {
        &self.low
    }

    #[inline]
    #[must_use]
    pub fn close(&self) -> &[Price] {
        &self.close
    }

    #[inline]
    #[must_use]
    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    /// Extracts the configured price for every bar.
    ///
    /// The previous bar's close is carried forward for
    /// [`PriceSource::TrueRange`].
    #[must_use]
    pub fn price(&self, source: PriceSource) -> Series {
        match source {
            PriceSource::Close => self.close.clone(),
            PriceSource::Open => self.open.clone(),
            PriceSource::High => self.high.clone(),
            PriceSource::Low => self.low.clone(),
            _ => (0..self.len())
                .scan(None, |prev_close, i| {
                    let bar = Row { candles: self, i };
                    let price = source.extract(&bar, *prev_close);
                    *prev_close = Some(self.close[i]);
                    Some(price)
                })
                .collect(),
        }
    }
}

/// One bar viewed through the columns.
struct Row<'a> {
    candles: &'a Candles,
    i: usize,
}

impl Ohlcv for Row<'_> {
    fn open(&self) -> Price {
        self.candles.open[self.i]
    }

    fn high(&self) -> Price {
        self.candles.high[self.i]
    }

    fn low(&self) -> Price {
        self.candles.low[self.i]
    }

    fn close(&self) -> Price {
        self.candles.close[self.i]
    }

    fn volume(&self) -> f64 {
        self.candles.volume[self.i]
    }
}

impl<B: Ohlcv> From<&[B]> for Candles {
    fn from(bars: &[B]) -> Self {
        Self::from_bars(bars)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::Bar;

    fn bars() -> Vec<Bar> {
        vec![
            Bar::new(10.0, 12.0, 8.0, 11.0, 5.0),
            Bar::new(11.0, 15.0, 10.0, 14.0, 7.0),
            Bar::new(14.0, 14.5, 9.0, 10.0, 3.0),
        ]
    }

    mod construction {
        use super::*;

        #[test]
        fn from_bars_splits_columns() {
            let candles = Candles::from_bars(&bars());
            assert_eq!(candles.open(), [10.0, 11.0, 14.0]);
            assert_eq!(candles.high(), [12.0, 15.0, 14.5]);
            assert_eq!(candles.low(), [8.0, 10.0, 9.0]);
            assert_eq!(candles.close(), [11.0, 14.0, 10.0]);
            assert_eq!(candles.volume(), [5.0, 7.0, 3.0]);
        }

        #[test]
        fn empty_input_gives_empty_columns() {
            let candles = Candles::from_bars::<Bar>(&[]);
            assert!(candles.is_empty());
            assert!(candles.price(PriceSource::HLC3).is_empty());
        }

        #[test]
        fn from_closes_mirrors_close() {
            let candles = Candles::from_closes(vec![1.0, 2.0]);
            assert_eq!(candles.high(), candles.close());
            assert_eq!(candles.low(), candles.close());
            assert_eq!(candles.volume(), [0.0, 0.0]);
        }

        #[test]
        fn from_columns_accepts_aligned() {
            let candles = Candles::from_columns(
                vec![1.0],
                vec![2.0],
                vec![0.5],
                vec![1.5],
                vec![10.0],
            );
            assert!(candles.is_ok());
        }

        #[test]
        fn from_columns_rejects_misaligned() {
            let err = Candles::from_columns(
                vec![1.0, 2.0],
                vec![2.0],
                vec![0.5, 1.0],
                vec![1.5, 1.0],
                vec![10.0, 1.0],
            )
            .unwrap_err();
            assert_eq!(
                err,
                Error::MisalignedColumns {
                    column: "high",
                    expected: 2,
                    actual: 1,
                }
            );
        }
    }

    mod price {
        use super::*;

        #[test]
        fn close_source_copies_close() {
            let candles = Candles::from_bars(&bars());
            assert_eq!(candles.price(PriceSource::Close), vec![11.0, 14.0, 10.0]);
        }

        #[test]
        fn hl2_source() {
            let candles = Candles::from_bars(&bars());
            assert_eq!(candles.price(PriceSource::HL2), vec![10.0, 12.5, 11.75]);
        }

        #[test]
        fn true_range_threads_previous_close() {
            let candles = Candles::from_bars(&bars());
            // bar 0: no prev close → 12 - 8 = 4
            // bar 1: max(5, |15 - 11|, |10 - 11|) = 5
            // bar 2: max(5.5, |14.5 - 14|, |9 - 14|) = 5.5
            assert_eq!(candles.price(PriceSource::TrueRange), vec![4.0, 5.0, 5.5]);
        }

        #[test]
        fn true_range_gap_uses_previous_close() {
            let candles = Candles::from_bars(&[
                Bar::new(10.0, 10.0, 10.0, 10.0, 0.0),
                Bar::new(20.0, 21.0, 19.0, 20.0, 0.0),
            ]);
            // |21 - 10| = 11 dominates high - low = 2
            assert_eq!(candles.price(PriceSource::TrueRange), vec![0.0, 11.0]);
        }

        #[test]
        fn length_matches_input() {
            let candles = Candles::from_bars(&bars());
            for source in [
                PriceSource::Open,
                PriceSource::High,
                PriceSource::Low,
                PriceSource::HLC3,
                PriceSource::OHLC4,
                PriceSource::HLCC4,
            ] {
                assert_eq!(candles.price(source).len(), candles.len());
            }
        }
    }
}
