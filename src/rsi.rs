use std::{fmt::Display, num::NonZero};

use crate::{
    Candles, Composition, Indicator, IndicatorConfig, IndicatorConfigBuilder, MaKind,
    MovingAverage, Operand, Price, PriceSource, Result, Series, Trigger,
    signal::Bands,
};

/// Configuration for the Relative Strength Index ([`Rsi`]) indicator.
///
/// Defaults: length 14, [`MaKind::Wilder`] smoothing, close price, a
/// 3-bar [`MaKind::Exponential`] signal line and 70/30 bands.
///
/// # Example
///
/// ```
/// use quantedge_studies::{IndicatorConfig, IndicatorConfigBuilder, MaKind, RsiConfig};
/// use std::num::NonZero;
///
/// let config = RsiConfig::builder()
///     .length(NonZero::new(7).unwrap())
///     .kind(MaKind::Simple)
///     .bands(80.0, 20.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.length(), 7);
/// assert_eq!(config.kind(), MaKind::Simple);
/// assert_eq!(config.bands().upper(), 80.0);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RsiConfig {
    length: NonZero<usize>,
    source: PriceSource,
    kind: MaKind,
    signal_length: NonZero<usize>,
    signal_kind: MaKind,
    bands: Bands,
}

impl IndicatorConfig for RsiConfig {
    type Builder = RsiConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        RsiConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.length.get()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl RsiConfig {
    /// RSI on closing price with the given length, other settings default.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// Smoothing applied to gains and losses.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MaKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn signal_length(&self) -> usize {
        self.signal_length.get()
    }

    #[inline]
    #[must_use]
    pub fn signal_kind(&self) -> MaKind {
        self.signal_kind
    }

    #[inline]
    #[must_use]
    pub fn bands(&self) -> Bands {
        self.bands
    }
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            source: PriceSource::Close,
            kind: MaKind::Wilder,
            signal_length: DEFAULT_SIGNAL_LENGTH,
            signal_kind: MaKind::Exponential,
            bands: Bands::fixed(70.0, 30.0),
        }
    }
}

impl Display for RsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RsiConfig({}, {}, {}, {} {}, {})",
            self.length,
            self.source,
            self.kind,
            self.signal_length,
            self.signal_kind,
            self.bands
        )
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(14).unwrap();
const DEFAULT_SIGNAL_LENGTH: NonZero<usize> = NonZero::new(3).unwrap();

/// Builder for [`RsiConfig`].
///
/// Every field starts at the [`RsiConfig::default`] value. Bands are
/// validated in [`build`](IndicatorConfigBuilder::build).
pub struct RsiConfigBuilder {
    config: RsiConfig,
    bands: (f64, f64),
}

impl RsiConfigBuilder {
    fn new() -> Self {
        let config = RsiConfig::default();
        Self {
            bands: (config.bands.upper(), config.bands.lower()),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(mut self, kind: MaKind) -> Self {
        self.config.kind = kind;
        self
    }

    #[inline]
    #[must_use]
    pub fn signal_length(mut self, signal_length: NonZero<usize>) -> Self {
        self.config.signal_length = signal_length;
        self
    }

    #[inline]
    #[must_use]
    pub fn signal_kind(mut self, signal_kind: MaKind) -> Self {
        self.config.signal_kind = signal_kind;
        self
    }

    /// Overbought and oversold levels.
    #[inline]
    #[must_use]
    pub fn bands(mut self, upper: f64, lower: f64) -> Self {
        self.bands = (upper, lower);
        self
    }
}

impl IndicatorConfigBuilder<RsiConfig> for RsiConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.config.length = length;
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    fn build(self) -> Result<RsiConfig> {
        let (upper, lower) = self.bands;

        Ok(RsiConfig {
            bands: Bands::new(upper, lower)?,
            ..self.config
        })
    }
}

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes on a 0–100
/// scale. Gains and losses are taken from consecutive price deltas (the
/// first bar contributes a zero delta) and smoothed with the configured
/// kind, Wilder's by default:
///
/// ```text
/// RSI = 100 − 100 / (1 + avg_gain / avg_loss)
/// ```
///
/// With no losses in the window RSI is 100; with losses but no gains it
/// is 0. A flat series therefore reads 100.
///
/// Outputs `Rsi` (primary) and `Signal`, a moving average of RSI.
/// Signals classify `Rsi − Signal` against the configured bands.
///
/// # Example
///
/// ```
/// use quantedge_studies::{Candles, Indicator, Rsi, RsiConfig, MaKind};
/// use quantedge_studies::{IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = RsiConfig::builder()
///     .length(NonZero::new(3).unwrap())
///     .kind(MaKind::Simple)
///     .build()
///     .unwrap();
/// let rsi = Rsi::new(config);
///
/// let candles = Candles::from_closes(vec![10.0, 12.0, 11.0, 13.0]);
/// let result = rsi.calculate(&candles);
///
/// // changes +2, −1, +2 → avg_gain = 4/3, avg_loss = 1/3 → RSI = 80
/// assert_eq!(result.primary()[3], 80.0);
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    config: RsiConfig,
    average: MovingAverage,
    signal: MovingAverage,
}

impl Rsi {
    /// Label of the RSI line.
    pub const RSI: &'static str = "Rsi";
    /// Label of the smoothed RSI line.
    pub const SIGNAL: &'static str = "Signal";
}

impl Indicator for Rsi {
    type Config = RsiConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            average: MovingAverage::new(config.kind, config.length),
            signal: MovingAverage::new(config.signal_kind, config.signal_length),
            config,
        }
    }

    #[inline]
    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn compose(&self, candles: &Candles) -> Composition {
        let price = candles.price(self.config.source);

        Composition::new(Trigger::bands(
            Operand::Line(Self::RSI),
            Operand::Line(Self::SIGNAL),
            self.config.bands,
        ))
        .bounded(Self::RSI, relative_strength(&price, &self.average), 0.0, 100.0)
        .smoothed(Self::SIGNAL, Self::RSI, self.signal.clone())
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RSI({}, {}, {})",
            self.config.length, self.config.source, self.config.kind
        )
    }
}

/// Unbounded RSI of `source` with gains and losses smoothed by `average`.
///
/// Smoothing kinds with negative weights can overshoot [0, 100]; callers
/// clamp.
pub(crate) fn relative_strength(source: &[Price], average: &MovingAverage) -> Series {
    let (gains, losses): (Series, Series) = source
        .iter()
        .scan(None, |prev: &mut Option<Price>, &price| {
            let change = prev.map_or(0.0, |p| price - p);
            *prev = Some(price);
            Some((change.max(0.0), (-change).max(0.0)))
        })
        .unzip();

    let avg_gain = average.apply(&gains);
    let avg_loss = average.apply(&losses);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&gain, &loss)| rsi_from_averages(gain, loss))
        .collect()
}

#[inline]
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
