use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
};

use crate::{
    Candles, Composition, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, MaKind,
    MovingAverage, Operand, PriceSource, Result, Series, Trigger, rolling::trailing_std_dev,
};

/// Standard deviation multiplier for Bollinger Bands.
///
/// Wraps a positive, finite `f64`. Defaults to `2.0` (the standard Bollinger
/// Bands setting).
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe because
/// NaN is rejected at construction.
#[derive(Clone, Copy, Debug)]
pub struct StdDev(f64);

impl StdDev {
    /// Creates a new standard deviation multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMultiplier`] if `value` is zero, negative,
    /// infinite or NaN.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            tracing::debug!(value, "rejecting std_dev multiplier");
            return Err(Error::InvalidMultiplier {
                name: "std_dev",
                value,
            });
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for StdDev {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for StdDev {}

impl Hash for StdDev {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for StdDev {
    fn default() -> Self {
        Self(2.0)
    }
}

/// Configuration for the Bollinger Bands ([`Bb`]) indicator.
///
/// # Example
///
/// ```
/// use quantedge_studies::{BbConfig, IndicatorConfig, IndicatorConfigBuilder, StdDev};
/// use std::num::NonZero;
///
/// let config = BbConfig::builder()
///     .length(NonZero::new(10).unwrap())
///     .std_dev(StdDev::new(1.5).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.length(), 10);
/// assert_eq!(config.std_dev().value(), 1.5);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct BbConfig {
    length: NonZero<usize>,
    source: PriceSource,
    kind: MaKind,
    std_dev: StdDev,
}

impl IndicatorConfig for BbConfig {
    type Builder = BbConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        BbConfigBuilder::new()
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

impl BbConfig {
    /// Standard deviation multiplier for the upper and lower bands.
    #[inline]
    #[must_use]
    pub fn std_dev(&self) -> StdDev {
        self.std_dev
    }

    /// Moving average used for the middle band.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MaKind {
        self.kind
    }

    /// BB with custom length, close price, SMA middle, 2σ.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }
}

impl Default for BbConfig {
    /// BB(20, Close, SMA, 2σ), the standard setting.
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            source: PriceSource::Close,
            kind: MaKind::Simple,
            std_dev: StdDev::default(),
        }
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(20).unwrap();

impl Display for BbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BbConfig({}, {}, {}, {})",
            self.length,
            self.source,
            self.kind,
            self.std_dev.value()
        )
    }
}

/// Builder for [`BbConfig`].
///
/// Defaults: length 20, source = [`PriceSource::Close`],
/// kind = [`MaKind::Simple`], `std_dev` = `2.0`.
pub struct BbConfigBuilder {
    config: BbConfig,
}

impl BbConfigBuilder {
    fn new() -> Self {
        Self {
            config: BbConfig::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn std_dev(mut self, std_dev: StdDev) -> Self {
        self.config.std_dev = std_dev;
        self
    }

    #[inline]
    #[must_use]
    pub fn kind(mut self, kind: MaKind) -> Self {
        self.config.kind = kind;
        self
    }
}

impl IndicatorConfigBuilder<BbConfig> for BbConfigBuilder {
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

    #[inline]
    fn build(self) -> Result<BbConfig> {
        Ok(self.config)
    }
}

/// Bollinger Bands (BB).
///
/// A volatility indicator consisting of three bands: a moving average
/// (middle) with upper and lower bands offset by a configurable number of
/// standard deviations.
///
/// ```text
/// upper  = MA + k × σ
/// middle = MA
/// lower  = MA − k × σ
/// width  = upper − lower
/// ```
///
/// `σ` is the population standard deviation of the trailing window, taken
/// from a running sum and sum of squares. Early bars use the values
/// present so far.
///
/// Signals compare price with the middle band and flag price returning
/// inside either band.
///
/// # Example
///
/// ```
/// use quantedge_studies::{Bb, BbConfig, Candles, Indicator};
/// use std::num::NonZero;
///
/// let bb = Bb::new(BbConfig::close(NonZero::new(8).unwrap()));
/// let candles = Candles::from_closes(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
/// let result = bb.calculate(&candles);
///
/// // mean 5, σ 2
/// assert_eq!(result.get(Bb::MIDDLE).unwrap()[7], 5.0);
/// assert_eq!(result.get(Bb::UPPER).unwrap()[7], 9.0);
/// assert_eq!(result.get(Bb::LOWER).unwrap()[7], 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct Bb {
    config: BbConfig,
    average: MovingAverage,
}

impl Bb {
    pub const MIDDLE: &'static str = "Middle";
    pub const UPPER: &'static str = "Upper";
    pub const LOWER: &'static str = "Lower";
    pub const WIDTH: &'static str = "Width";
}

impl Indicator for Bb {
    type Config = BbConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            average: MovingAverage::new(config.kind, config.length),
            config,
        }
    }

    #[inline]
    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn compose(&self, candles: &Candles) -> Composition {
        let price = candles.price(self.config.source);
        let middle = self.average.apply(&price);
        let deviation = trailing_std_dev(&price, self.config.length);
        let k = self.config.std_dev.value();

        let (upper, lower): (Series, Series) = middle
            .iter()
            .zip(&deviation)
            .map(|(&m, &sd)| (k.mul_add(sd, m), (-k).mul_add(sd, m)))
            .unzip();
        let width: Series = upper.iter().zip(&lower).map(|(u, l)| u - l).collect();

        Composition::new(Trigger::envelope(
            Operand::Series(price),
            Operand::Line(Self::MIDDLE),
            Self::UPPER,
            Self::LOWER,
        ))
        .line(Self::MIDDLE, middle)
        .line(Self::UPPER, upper)
        .line(Self::LOWER, lower)
        .line(Self::WIDTH, width)
    }
}

impl Display for Bb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB({}, {}, {})",
            self.config.length,
            self.config.source,
            self.config.std_dev.value()
        )
    }
}
