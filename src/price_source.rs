use crate::{Error, Ohlcv, Price};

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

/// Price extracted from each [`Ohlcv`] bar before it enters an indicator.
///
/// Each indicator is configured with a `PriceSource` that determines which
/// value (or derived value) to compute on. See
/// [`Candles::price`](crate::Candles::price) for the whole-series form.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
pub enum PriceSource {
    /// Opening price.
    Open,
    /// Highest price.
    High,
    /// Closing price.
    #[default]
    Close,
    /// Lowest price.
    Low,
    /// Median price: `(high + low) / 2`.
    HL2,
    /// Typical price: `(high + low + close) / 3`.
    HLC3,
    /// Average price: `(open + high + low + close) / 4`.
    OHLC4,
    /// Weighted close: `(high + low + close + close) / 4`.
    HLCC4,
    /// True range: `max(high - low, |high - prev_close|, |low - prev_close|)`.
    ///
    /// On the first bar (no previous close), falls back to `high - low`.
    TrueRange,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for PriceSource {
    type Err = Error;

    /// Parses a source name, case-insensitively.
    ///
    /// Accepts the variant names plus `tr` for true range and the
    /// `typical`/`median` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "close" => Ok(Self::Close),
            "low" => Ok(Self::Low),
            "hl2" | "median" => Ok(Self::HL2),
            "hlc3" | "typical" => Ok(Self::HLC3),
            "ohlc4" => Ok(Self::OHLC4),
            "hlcc4" => Ok(Self::HLCC4),
            "truerange" | "true_range" | "tr" => Ok(Self::TrueRange),
            _ => Err(Error::UnknownPriceSource(s.to_owned())),
        }
    }
}

impl PriceSource {
    /// Derives this source's price from one bar.
    ///
    /// `prev_close` is the close of the preceding bar, used only by
    /// [`TrueRange`](Self::TrueRange).
    #[inline]
    #[must_use]
    pub fn extract(self, ohlcv: &impl Ohlcv, prev_close: Option<Price>) -> Price {
        match self {
            Self::Open => ohlcv.open(),
            Self::High => ohlcv.high(),
            Self::Close => ohlcv.close(),
            Self::Low => ohlcv.low(),
            Self::HL2 => f64::midpoint(ohlcv.high(), ohlcv.low()),
            Self::HLC3 => (ohlcv.high() + ohlcv.low() + ohlcv.close()) / 3.0,
            Self::OHLC4 => (ohlcv.open() + ohlcv.high() + ohlcv.low() + ohlcv.close()) / 4.0,
            Self::HLCC4 => (ohlcv.high() + ohlcv.low() + ohlcv.close() + ohlcv.close()) / 4.0,
            Self::TrueRange => {
                let hl = ohlcv.high() - ohlcv.low();

                match prev_close {
                    Some(prev_close) => {
                        let hc = (ohlcv.high() - prev_close).abs();
                        let lc = (ohlcv.low() - prev_close).abs();
                        hl.max(hc).max(lc)
                    }
                    None => hl,
                }
            }
        }
    }
}
