use std::{fmt::Display, num::NonZero};

use crate::{
    Candles, Composition, Indicator, IndicatorConfig, IndicatorConfigBuilder, MaKind,
    MovingAverage, Operand, PriceSource, Result, Series, Trigger,
    bounds::{clamp, ratio_or},
    rolling::{percentile_rank, streak},
    rsi::relative_strength,
    signal::Bands,
};

/// Configuration for [`ConnorsRsi`].
///
/// Defaults: price RSI length 3, streak RSI length 2, rank length 100,
/// [`MaKind::Wilder`] smoothing, close price, 3-bar
/// [`MaKind::Exponential`] signal line, 70/30 bands.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ConnorsRsiConfig {
    length: NonZero<usize>,
    streak_length: NonZero<usize>,
    rank_length: NonZero<usize>,
    source: PriceSource,
    kind: MaKind,
    signal_length: NonZero<usize>,
    signal_kind: MaKind,
    bands: Bands,
}

impl IndicatorConfig for ConnorsRsiConfig {
    type Builder = ConnorsRsiConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        ConnorsRsiConfigBuilder::new()
    }

    /// Length of the price RSI.
    #[inline]
    fn length(&self) -> usize {
        self.length.get()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl ConnorsRsiConfig {
    #[inline]
    #[must_use]
    pub fn streak_length(&self) -> usize {
        self.streak_length.get()
    }

    #[inline]
    #[must_use]
    pub fn rank_length(&self) -> usize {
        self.rank_length.get()
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> MaKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn bands(&self) -> Bands {
        self.bands
    }
}

impl Default for ConnorsRsiConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            streak_length: DEFAULT_STREAK_LENGTH,
            rank_length: DEFAULT_RANK_LENGTH,
            source: PriceSource::Close,
            kind: MaKind::Wilder,
            signal_length: DEFAULT_LENGTH,
            signal_kind: MaKind::Exponential,
            bands: Bands::fixed(70.0, 30.0),
        }
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(3).unwrap();
const DEFAULT_STREAK_LENGTH: NonZero<usize> = NonZero::new(2).unwrap();
const DEFAULT_RANK_LENGTH: NonZero<usize> = NonZero::new(100).unwrap();

impl Display for ConnorsRsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnorsRsiConfig({}, {}, {}, {}, {}, {} {}, {})",
            self.length,
            self.streak_length,
            self.rank_length,
            self.source,
            self.kind,
            self.signal_length,
            self.signal_kind,
            self.bands
        )
    }
}

/// Builder for [`ConnorsRsiConfig`], starting from the defaults.
pub struct ConnorsRsiConfigBuilder {
    config: ConnorsRsiConfig,
    bands: (f64, f64),
}

impl ConnorsRsiConfigBuilder {
    fn new() -> Self {
        let config = ConnorsRsiConfig::default();
        Self {
            bands: (config.bands.upper(), config.bands.lower()),
            config,
        }
    }

    #[must_use]
    pub fn streak_length(mut self, streak_length: NonZero<usize>) -> Self {
        self.config.streak_length = streak_length;
        self
    }

    #[must_use]
    pub fn rank_length(mut self, rank_length: NonZero<usize>) -> Self {
        self.config.rank_length = rank_length;
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: MaKind) -> Self {
        self.config.kind = kind;
        self
    }

    #[must_use]
    pub fn signal_length(mut self, signal_length: NonZero<usize>) -> Self {
        self.config.signal_length = signal_length;
        self
    }

    #[must_use]
    pub fn signal_kind(mut self, signal_kind: MaKind) -> Self {
        self.config.signal_kind = signal_kind;
        self
    }

    #[must_use]
    pub fn bands(mut self, upper: f64, lower: f64) -> Self {
        self.bands = (upper, lower);
        self
    }
}

impl IndicatorConfigBuilder<ConnorsRsiConfig> for ConnorsRsiConfigBuilder {
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.config.length = length;
        self
    }

    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    fn build(self) -> Result<ConnorsRsiConfig> {
        let (upper, lower) = self.bands;

        Ok(ConnorsRsiConfig {
            bands: Bands::new(upper, lower)?,
            ..self.config
        })
    }
}

/// Connors RSI: the mean of three 0–100 components.
///
/// ```text
/// CRSI = (RSI(price, length) + RSI(streak, streak_length)
///         + PercentRank(ROC(1), rank_length)) / 3
/// ```
///
/// `streak` counts consecutive up or down closes (see
/// [`rolling::streak`](crate::rolling::streak)); `ROC(1)` is the one-bar
/// percent change, 0 on the first bar or after a zero price. The first bar
/// has no rank and averages the two RSI components only.
///
/// Outputs `ConnorsRsi` (primary) and `Signal`.
#[derive(Clone, Debug)]
pub struct ConnorsRsi {
    config: ConnorsRsiConfig,
    price_average: MovingAverage,
    streak_average: MovingAverage,
    signal: MovingAverage,
}

impl ConnorsRsi {
    pub const CONNORS_RSI: &'static str = "ConnorsRsi";
    pub const SIGNAL: &'static str = "Signal";
}

impl Indicator for ConnorsRsi {
    type Config = ConnorsRsiConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            price_average: MovingAverage::new(config.kind, config.length),
            streak_average: MovingAverage::new(config.kind, config.streak_length),
            signal: MovingAverage::new(config.signal_kind, config.signal_length),
            config,
        }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn compose(&self, candles: &Candles) -> Composition {
        let price = candles.price(self.config.source);

        let price_rsi = relative_strength(&price, &self.price_average);
        let streak_rsi = relative_strength(&streak(&price), &self.streak_average);
        let rank = percentile_rank(&rate_of_change(&price), self.config.rank_length);

        // the rank has no prior value on the first bar, so it stays out of
        // that bar's mean
        let connors: Series = price_rsi
            .iter()
            .zip(&streak_rsi)
            .zip(&rank)
            .enumerate()
            .map(|(i, ((&a, &b), &c))| {
                let rsi = clamp(a, 0.0, 100.0) + clamp(b, 0.0, 100.0);
                if i == 0 { rsi / 2.0 } else { (rsi + c) / 3.0 }
            })
            .collect();

        Composition::new(Trigger::bands(
            Operand::Line(Self::CONNORS_RSI),
            Operand::Line(Self::SIGNAL),
            self.config.bands,
        ))
        .bounded(Self::CONNORS_RSI, connors, 0.0, 100.0)
        .smoothed(Self::SIGNAL, Self::CONNORS_RSI, self.signal.clone())
    }
}

impl Display for ConnorsRsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CRSI({}, {}, {}, {})",
            self.config.length, self.config.streak_length, self.config.rank_length, self.config.source
        )
    }
}

/// One-bar percent change.
fn rate_of_change(source: &[f64]) -> Series {
    source
        .iter()
        .enumerate()
        .map(|(i, &x)| match i.checked_sub(1).map(|j| source[j]) {
            Some(prev) => ratio_or(x - prev, prev, 0.0) * 100.0,
            None => 0.0,
        })
        .collect()
}
