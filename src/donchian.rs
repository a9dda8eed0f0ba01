use std::{fmt::Display, num::NonZero};

use crate::{
    Candles, Composition, Indicator, IndicatorConfig, IndicatorConfigBuilder, Operand,
    PriceSource, Result, Series, Trigger,
    rolling::{Extrema, trailing_extrema},
};

/// Configuration for [`DonchianChannels`].
///
/// The channel always spans bar highs and lows; `source` selects the price
/// compared against the middle line for signals.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct DonchianConfig {
    length: NonZero<usize>,
    source: PriceSource,
}

impl IndicatorConfig for DonchianConfig {
    type Builder = DonchianConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        DonchianConfigBuilder {
            config: Self::default(),
        }
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

impl DonchianConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length,
            source: PriceSource::Close,
        }
    }
}

impl Default for DonchianConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH)
    }
}

const DEFAULT_LENGTH: NonZero<usize> = NonZero::new(20).unwrap();

impl Display for DonchianConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DonchianConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`DonchianConfig`]. Defaults: length 20, close.
pub struct DonchianConfigBuilder {
    config: DonchianConfig,
}

impl IndicatorConfigBuilder<DonchianConfig> for DonchianConfigBuilder {
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.config.length = length;
        self
    }

    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    fn build(self) -> Result<DonchianConfig> {
        Ok(self.config)
    }
}

/// Donchian Channels.
///
/// Upper is the highest high and lower the lowest low of the trailing
/// window; middle is their mean. Outputs `Middle` (primary), `Upper` and
/// `Lower`. Signals fire when price crosses the middle line.
#[derive(Clone, Debug)]
pub struct DonchianChannels {
    config: DonchianConfig,
}

impl DonchianChannels {
    pub const MIDDLE: &'static str = "Middle";
    pub const UPPER: &'static str = "Upper";
    pub const LOWER: &'static str = "Lower";
}

impl Indicator for DonchianChannels {
    type Config = DonchianConfig;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn compose(&self, candles: &Candles) -> Composition {
        let Extrema { highest, lowest } =
            trailing_extrema(candles.high(), candles.low(), self.config.length);
        let middle: Series = highest
            .iter()
            .zip(&lowest)
            .map(|(h, l)| (h + l) / 2.0)
            .collect();

        Composition::new(Trigger::crossover(
            Operand::Series(candles.price(self.config.source)),
            Operand::Line(Self::MIDDLE),
        ))
        .line(Self::MIDDLE, middle)
        .line(Self::UPPER, highest)
        .line(Self::LOWER, lowest)
    }
}

impl Display for DonchianChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DC({}, {})", self.config.length, self.config.source)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{
        Signal,
        test_util::{hlc, nz},
    };

    fn donchian(length: usize) -> DonchianChannels {
        DonchianChannels::new(DonchianConfig::new(nz(length)))
    }

    #[test]
    fn tracks_window_extremes() {
        let candles = hlc(&[
            (10.0, 8.0, 9.0),
            (12.0, 9.0, 11.0),
            (11.0, 7.0, 8.0),
            (9.0, 8.5, 9.0),
        ]);
        let result = donchian(2).calculate(&candles);

        assert_eq!(result.get(DonchianChannels::UPPER).unwrap(), [10.0, 12.0, 12.0, 11.0]);
        assert_eq!(result.get(DonchianChannels::LOWER).unwrap(), [8.0, 8.0, 7.0, 7.0]);
        assert_eq!(result.primary(), [9.0, 10.0, 9.5, 9.0]);
    }

    #[test]
    fn close_crossing_middle() {
        let candles = hlc(&[
            (10.0, 8.0, 8.5),
            (10.0, 8.0, 9.5),
            (10.0, 8.0, 8.2),
        ]);
        let result = donchian(3).calculate(&candles);
        assert_eq!(
            result.signals(),
            [Signal::Neutral, Signal::Buy, Signal::Sell]
        );
    }

    #[test]
    fn lines_in_order() {
        let result = donchian(3).calculate(&hlc(&[(2.0, 1.0, 1.5)]));
        assert_eq!(
            result.labels().collect::<Vec<_>>(),
            vec!["Middle", "Upper", "Lower"]
        );
    }

    #[test]
    fn defaults_and_display() {
        let config = DonchianConfig::builder().build().unwrap();
        assert_eq!(config.length(), 20);
        assert_eq!(config.to_string(), "DonchianConfig(20, Close)");
        assert_eq!(DonchianChannels::new(config).to_string(), "DC(20, Close)");
    }
}
