use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
};

use crate::{
    Candles, Composition, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, MaKind,
    MovingAverage, Operand, PriceSource, Result, Series, Trigger,
};

/// Band offset of a [`PriceChannel`] in percent of the centre line.
///
/// Positive and finite. Compared and hashed bit for bit.
#[derive(Clone, Copy, Debug)]
pub struct Percent(f64);

impl Percent {
    /// # Errors
    ///
    /// Returns [`Error::InvalidMultiplier`] if `value` is not positive and
    /// finite.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            tracing::debug!(value, "rejecting channel percent");
            return Err(Error::InvalidMultiplier {
                name: "percent",
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

impl PartialEq for Percent {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Percent {}

impl Hash for Percent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Configuration for [`PriceChannel`].
///
/// Defaults: length 21, [`MaKind::Exponential`], 6%, close.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct PriceChannelConfig {
    length: NonZero<usize>,
    source: PriceSource,
    kind: MaKind,
    percent: Percent,
}

impl IndicatorConfig for PriceChannelConfig {
    type Builder = PriceChannelConfigBuilder;

    fn builder() -> Self::Builder {
        PriceChannelConfigBuilder {
            config: Self::default(),
        }
    }

    fn length(&self) -> usize {
        self.length.get()
    }

    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl PriceChannelConfig {
    #[must_use]
    pub fn kind(&self) -> MaKind {
        self.kind
    }

    #[must_use]
    pub fn percent(&self) -> Percent {
        self.percent
    }
}

impl Default for PriceChannelConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            source: PriceSource::Close,
            kind: MaKind::Exponential,
            percent: Percent(6.0),
        }
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(21).unwrap();

impl Display for PriceChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PriceChannelConfig({}, {}, {}, {}%)",
            self.length,
            self.source,
            self.kind,
            self.percent.value()
        )
    }
}

pub struct PriceChannelConfigBuilder {
    config: PriceChannelConfig,
}

impl PriceChannelConfigBuilder {
    #[must_use]
    pub fn kind(mut self, kind: MaKind) -> Self {
        self.config.kind = kind;
        self
    }

    #[must_use]
    pub fn percent(mut self, percent: Percent) -> Self {
        self.config.percent = percent;
        self
    }
}

impl IndicatorConfigBuilder<PriceChannelConfig> for PriceChannelConfigBuilder {
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.config.length = length;
        self
    }

    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    fn build(self) -> Result<PriceChannelConfig> {
        Ok(self.config)
    }
}

/// Percentage envelope around a moving average.
///
/// ```text
/// middle = MA(price)
/// upper  = middle × (1 + pct / 100)
/// lower  = middle × (1 − pct / 100)
/// ```
///
/// Signals compare price with the middle line and flag price returning
/// inside the envelope.
#[derive(Clone, Debug)]
pub struct PriceChannel {
    config: PriceChannelConfig,
    average: MovingAverage,
}

impl PriceChannel {
    pub const MIDDLE: &'static str = "Middle";
    pub const UPPER: &'static str = "Upper";
    pub const LOWER: &'static str = "Lower";
}

impl Indicator for PriceChannel {
    type Config = PriceChannelConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            average: MovingAverage::new(config.kind, config.length),
            config,
        }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn compose(&self, candles: &Candles) -> Composition {
        let price = candles.price(self.config.source);
        let middle = self.average.apply(&price);
        let offset = self.config.percent.value() / 100.0;

        let upper: Series = middle.iter().map(|m| m * (1.0 + offset)).collect();
        let lower: Series = middle.iter().map(|m| m * (1.0 - offset)).collect();

        Composition::new(Trigger::envelope(
            Operand::Series(price),
            Operand::Line(Self::MIDDLE),
            Self::UPPER,
            Self::LOWER,
        ))
        .line(Self::MIDDLE, middle)
        .line(Self::UPPER, upper)
        .line(Self::LOWER, lower)
    }
}

impl Display for PriceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PC({}, {}, {}%)",
            self.config.length,
            self.config.kind,
            self.config.percent.value()
        )
    }
}
