use std::{fmt::Display, num::NonZero};

use crate::{
    Candles, Composition, Indicator, IndicatorConfig, IndicatorConfigBuilder, MaKind,
    MovingAverage, Operand, PriceSource, Result, Series, Trigger,
    bounds::ratio_or,
    rolling::{Extrema, trailing_extrema},
    signal::Bands,
};

/// Configuration for the [`Stochastic`] oscillator.
///
/// Defaults: length 14, `%D` smoothing 3 with [`MaKind::Simple`], 80/20
/// bands, close.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct StochasticConfig {
    length: NonZero<usize>,
    source: PriceSource,
    smoothing: NonZero<usize>,
    kind: MaKind,
    bands: Bands,
}

impl IndicatorConfig for StochasticConfig {
    type Builder = StochasticConfigBuilder;

    fn builder() -> Self::Builder {
        let config = Self::default();
        StochasticConfigBuilder {
            bands: (config.bands.upper(), config.bands.lower()),
            config,
        }
    }

    fn length(&self) -> usize {
        self.length.get()
    }

    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl StochasticConfig {
    /// Length of the `%D` moving average.
    #[must_use]
    pub fn smoothing(&self) -> usize {
        self.smoothing.get()
    }

    #[must_use]
    pub fn kind(&self) -> MaKind {
        self.kind
    }

    #[must_use]
    pub fn bands(&self) -> Bands {
        self.bands
    }
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            source: PriceSource::Close,
            smoothing: DEFAULT_SMOOTHING,
            kind: MaKind::Simple,
            bands: Bands::fixed(80.0, 20.0),
        }
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(14).unwrap();
const DEFAULT_SMOOTHING: NonZero<usize> = NonZero::new(3).unwrap();

impl Display for StochasticConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StochasticConfig({}, {}, {}, {})",
            self.length, self.smoothing, self.source, self.bands
        )
    }
}

pub struct StochasticConfigBuilder {
    config: StochasticConfig,
    bands: (f64, f64),
}

impl StochasticConfigBuilder {
    #[must_use]
    pub fn smoothing(mut self, smoothing: NonZero<usize>) -> Self {
        self.config.smoothing = smoothing;
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: MaKind) -> Self {
        self.config.kind = kind;
        self
    }

    #[must_use]
    pub fn bands(mut self, upper: f64, lower: f64) -> Self {
        self.bands = (upper, lower);
        self
    }
}

impl IndicatorConfigBuilder<StochasticConfig> for StochasticConfigBuilder {
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.config.length = length;
        self
    }

    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    fn build(self) -> Result<StochasticConfig> {
        let (upper, lower) = self.bands;

        Ok(StochasticConfig {
            bands: Bands::new(upper, lower)?,
            ..self.config
        })
    }
}

/// Stochastic oscillator.
///
/// ```text
/// %K = 100 × (price − lowest low) / (highest high − lowest low)
/// %D = MA(%K, smoothing)
/// ```
///
/// A window with no range reads 0. Outputs `FastK` (primary) and `SlowD`.
/// Signals classify `%K − %D` against the bands.
#[derive(Clone, Debug)]
pub struct Stochastic {
    config: StochasticConfig,
    smoothing: MovingAverage,
}

impl Stochastic {
    pub const FAST_K: &'static str = "FastK";
    pub const SLOW_D: &'static str = "SlowD";
}

impl Indicator for Stochastic {
    type Config = StochasticConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            smoothing: MovingAverage::new(config.kind, config.smoothing),
            config,
        }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn compose(&self, candles: &Candles) -> Composition {
        let price = candles.price(self.config.source);
        let Extrema { highest, lowest } =
            trailing_extrema(candles.high(), candles.low(), self.config.length);

        let fast_k: Series = price
            .iter()
            .zip(highest.iter().zip(&lowest))
            .map(|(p, (hh, ll))| 100.0 * ratio_or(p - ll, hh - ll, 0.0))
            .collect();

        Composition::new(Trigger::bands(
            Operand::Line(Self::FAST_K),
            Operand::Line(Self::SLOW_D),
            self.config.bands,
        ))
        .bounded(Self::FAST_K, fast_k, 0.0, 100.0)
        .smoothed(Self::SLOW_D, Self::FAST_K, self.smoothing.clone())
    }
}

impl Display for Stochastic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "STOCH({}, {}, {})",
            self.config.length, self.config.smoothing, self.config.source
        )
    }
}
