//! Batch technical analysis studies for Rust.
//!
//! Every study maps a complete bar history to named output series of the
//! same length plus one [`Signal`] per bar. Nothing is retained between
//! calls: the same bars and config always give the same, bit-identical
//! result.
//!
//! The building blocks are public too:
//!
//! - [`MovingAverage`] dispatches over fifteen smoothing kinds ([`MaKind`]),
//! - [`rolling`] holds trailing-window statistics,
//! - [`bounds`] clamps and rounds outputs,
//! - [`compare_signal`] and [`threshold_signal`] classify deltas.
//!
//! Each study type ([`Rsi`], [`ConnorsRsi`], [`Bb`], [`DonchianChannels`],
//! [`PriceChannel`], [`Stochastic`]) exposes [`new`](Rsi::new) and
//! [`calculate`](Rsi::calculate) as inherent methods, no trait import
//! needed. Import [`Indicator`] only for generic code.
//!
//! ```
//! use quantedge_studies::{Candles, Rsi, RsiConfig, Signal};
//!
//! let candles = Candles::from_closes(vec![50.0; 30]);
//! let result = Rsi::new(RsiConfig::default()).calculate(&candles);
//!
//! assert!(result.primary().iter().all(|&v| v == 100.0));
//! assert!(result.signals().iter().all(|&s| s == Signal::Neutral));
//! ```

mod bb;
mod candles;
mod connors_rsi;
mod donchian;
mod error;
mod indicator;
mod moving_average;
mod ohlcv;
mod price_channel;
mod price_source;
mod rsi;
mod signal;
mod stochastic;

pub mod bounds;
pub mod rolling;

pub use crate::candles::Candles;
pub use crate::error::{Error, Result};
pub use crate::indicator::{
    Composition, Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorResult, Operand,
    Rule, Trigger, evaluate,
};
pub use crate::moving_average::{MaKind, MovingAverage, moving_average};
pub use crate::ohlcv::{Bar, Ohlcv, Price, Series};
pub use crate::price_source::PriceSource;
pub use crate::signal::{Bands, Signal, compare_signal, threshold_signal};

pub use crate::bb::{Bb, BbConfig, BbConfigBuilder, StdDev};
pub use crate::connors_rsi::{ConnorsRsi, ConnorsRsiConfig, ConnorsRsiConfigBuilder};
pub use crate::donchian::{DonchianChannels, DonchianConfig, DonchianConfigBuilder};
pub use crate::price_channel::{Percent, PriceChannel, PriceChannelConfig, PriceChannelConfigBuilder};
pub use crate::rsi::{Rsi, RsiConfig, RsiConfigBuilder};
pub use crate::stochastic::{Stochastic, StochasticConfig, StochasticConfigBuilder};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::calculate`].
            #[must_use]
            pub fn calculate(&self, candles: &Candles) -> IndicatorResult {
                <Self as Indicator>::calculate(self, candles)
            }

            /// See [`Indicator::calculate_bars`].
            #[must_use]
            pub fn calculate_bars<B: Ohlcv>(&self, bars: &[B]) -> IndicatorResult {
                <Self as Indicator>::calculate_bars(self, bars)
            }
        }
    };
}

impl_indicator_methods!(Rsi, RsiConfig);
impl_indicator_methods!(ConnorsRsi, ConnorsRsiConfig);
impl_indicator_methods!(Bb, BbConfig);
impl_indicator_methods!(DonchianChannels, DonchianConfig);
impl_indicator_methods!(PriceChannel, PriceChannelConfig);
impl_indicator_methods!(Stochastic, StochasticConfig);

#[cfg(test)]
mod test_util;
