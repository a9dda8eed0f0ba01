//! Discrete trading signals from consecutive value pairs.
//!
//! Classification is memoryless beyond the previous bar: every function
//! here is a pure function of the current and previous values, so any
//! transition can be replayed and tested on its own.

use crate::{Error, Result};

use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

/// Directional classification of one bar.
///
/// The strong variants mark exits from an overbought/oversold band; the
/// plain variants mark zero crossings of a delta.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
pub enum Signal {
    StrongBuy,
    Buy,
    #[default]
    Neutral,
    Sell,
    StrongSell,
}

impl Signal {
    /// The same signal from the opposite side: buys become sells of equal
    /// strength and vice versa. Neutral stays neutral.
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            Self::StrongBuy => Self::StrongSell,
            Self::Buy => Self::Sell,
            Self::Neutral => Self::Neutral,
            Self::Sell => Self::Buy,
            Self::StrongSell => Self::StrongBuy,
        }
    }

    #[must_use]
    pub fn is_buy(self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    #[must_use]
    pub fn is_sell(self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Upper and lower threshold levels, e.g. 70/30 for RSI.
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe
/// because non-finite levels are rejected at construction.
#[derive(Clone, Copy, Debug)]
pub struct Bands {
    upper: f64,
    lower: f64,
}

impl Bands {
    /// # Errors
    ///
    /// Returns [`Error::InvalidBands`] if either level is not finite or
    /// `upper <= lower`.
    pub fn new(upper: f64, lower: f64) -> Result<Self> {
        if !upper.is_finite() || !lower.is_finite() || upper <= lower {
            tracing::debug!(upper, lower, "rejecting bands");
            return Err(Error::InvalidBands { upper, lower });
        }

        Ok(Self { upper, lower })
    }

    /// Levels known to be valid at compile time.
    pub(crate) const fn fixed(upper: f64, lower: f64) -> Self {
        Self { upper, lower }
    }

    #[inline]
    #[must_use]
    pub fn upper(self) -> f64 {
        self.upper
    }

    #[inline]
    #[must_use]
    pub fn lower(self) -> f64 {
        self.lower
    }
}

impl PartialEq for Bands {
    fn eq(&self, other: &Self) -> bool {
        self.upper.to_bits() == other.upper.to_bits()
            && self.lower.to_bits() == other.lower.to_bits()
    }
}

impl Eq for Bands {}

impl Hash for Bands {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.upper.to_bits().hash(state);
        self.lower.to_bits().hash(state);
    }
}

impl Display for Bands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.upper, self.lower)
    }
}

/// Zero-cross classification of a delta.
///
/// `Buy` when the delta turns positive (`delta > 0`, `prev_delta <= 0`),
/// `Sell` when it turns negative (`delta < 0`, `prev_delta >= 0`),
/// `Neutral` otherwise.
///
/// # Example
///
/// ```
/// use quantedge_studies::{Signal, compare_signal};
///
/// assert_eq!(compare_signal(0.5, -0.1), Signal::Buy);
/// assert_eq!(compare_signal(-0.5, 0.0), Signal::Sell);
/// assert_eq!(compare_signal(0.5, 0.2), Signal::Neutral);
/// ```
#[must_use]
pub fn compare_signal(delta: f64, prev_delta: f64) -> Signal {
    if delta > 0.0 && prev_delta <= 0.0 {
        Signal::Buy
    } else if delta < 0.0 && prev_delta >= 0.0 {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// Band-aware classification.
///
/// In order of precedence:
///
/// 1. value falls back below `upper` → [`Signal::StrongSell`],
/// 2. value climbs back above `lower` → [`Signal::StrongBuy`],
/// 3. delta turns negative while value is at or above `upper` →
///    [`Signal::Sell`],
/// 4. delta turns positive while value is at or below `lower` →
///    [`Signal::Buy`],
/// 5. otherwise [`compare_signal`] on the deltas.
///
/// # Example
///
/// ```
/// use quantedge_studies::{Signal, threshold_signal};
///
/// // RSI drops from 74 to 68 through the 70 line
/// assert_eq!(threshold_signal(-1.0, 0.5, 68.0, 74.0, 70.0, 30.0), Signal::StrongSell);
/// // mid-range crossover falls through to the plain zero-cross rule
/// assert_eq!(threshold_signal(1.0, -1.0, 50.0, 48.0, 70.0, 30.0), Signal::Buy);
/// ```
#[must_use]
pub fn threshold_signal(
    delta: f64,
    prev_delta: f64,
    value: f64,
    prev_value: f64,
    upper: f64,
    lower: f64,
) -> Signal {
    if prev_value >= upper && value < upper {
        Signal::StrongSell
    } else if prev_value <= lower && value > lower {
        Signal::StrongBuy
    } else if delta < 0.0 && prev_delta >= 0.0 && value >= upper {
        Signal::Sell
    } else if delta > 0.0 && prev_delta <= 0.0 && value <= lower {
        Signal::Buy
    } else {
        compare_signal(delta, prev_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod compare {
        use super::*;

        #[test]
        fn upward_cross_is_buy() {
            assert_eq!(compare_signal(1.0, -1.0), Signal::Buy);
            assert_eq!(compare_signal(1.0, 0.0), Signal::Buy);
        }

        #[test]
        fn downward_cross_is_sell() {
            assert_eq!(compare_signal(-1.0, 1.0), Signal::Sell);
            assert_eq!(compare_signal(-1.0, 0.0), Signal::Sell);
        }

        #[test]
        fn no_cross_is_neutral() {
            assert_eq!(compare_signal(2.0, 1.0), Signal::Neutral);
            assert_eq!(compare_signal(-2.0, -1.0), Signal::Neutral);
            assert_eq!(compare_signal(0.0, 0.0), Signal::Neutral);
            assert_eq!(compare_signal(0.0, 1.0), Signal::Neutral);
        }

        #[test]
        fn sign_flip_mirrors() {
            let pairs = [(1.0, -1.0), (-1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (3.0, 2.0)];
            for (d, p) in pairs {
                assert_eq!(compare_signal(-d, -p), compare_signal(d, p).mirrored());
            }
        }
    }

    mod threshold {
        use super::*;

        const UPPER: f64 = 70.0;
        const LOWER: f64 = 30.0;

        fn classify(delta: f64, prev_delta: f64, value: f64, prev_value: f64) -> Signal {
            threshold_signal(delta, prev_delta, value, prev_value, UPPER, LOWER)
        }

        #[test]
        fn overbought_release_is_strong_sell() {
            assert_eq!(classify(0.5, 0.5, 69.0, 71.0), Signal::StrongSell);
        }

        #[test]
        fn oversold_release_is_strong_buy() {
            assert_eq!(classify(-0.5, -0.5, 31.0, 29.0), Signal::StrongBuy);
        }

        #[test]
        fn band_exit_beats_zero_cross() {
            // delta crosses up, but the value just left the overbought band
            assert_eq!(classify(1.0, -1.0, 69.0, 72.0), Signal::StrongSell);
        }

        #[test]
        fn turn_down_inside_upper_band_is_sell() {
            assert_eq!(classify(-1.0, 1.0, 80.0, 82.0), Signal::Sell);
        }

        #[test]
        fn turn_up_inside_lower_band_is_buy() {
            assert_eq!(classify(1.0, -1.0, 20.0, 18.0), Signal::Buy);
        }

        #[test]
        fn mid_range_falls_back_to_compare() {
            assert_eq!(classify(1.0, -1.0, 50.0, 49.0), Signal::Buy);
            assert_eq!(classify(-1.0, 1.0, 50.0, 51.0), Signal::Sell);
            assert_eq!(classify(1.0, 1.0, 50.0, 49.0), Signal::Neutral);
        }

        #[test]
        fn staying_above_upper_without_turn_is_neutral() {
            assert_eq!(classify(1.0, 1.0, 85.0, 80.0), Signal::Neutral);
        }

        #[test]
        fn mirrored_inputs_mirror_output() {
            // reflect around 50 so the bands swap
            let cases = [
                (0.5, 0.5, 69.0, 71.0),
                (-1.0, 1.0, 80.0, 82.0),
                (1.0, -1.0, 50.0, 49.0),
                (1.0, 1.0, 50.0, 49.0),
            ];
            for (d, p, v, pv) in cases {
                assert_eq!(
                    classify(-d, -p, 100.0 - v, 100.0 - pv),
                    classify(d, p, v, pv).mirrored()
                );
            }
        }
    }

    mod bands {
        use super::*;

        #[test]
        fn accepts_ordered_levels() {
            let bands = Bands::new(70.0, 30.0).unwrap();
            assert_eq!((bands.upper(), bands.lower()), (70.0, 30.0));
        }

        #[test]
        fn rejects_inverted_levels() {
            assert_eq!(
                Bands::new(30.0, 70.0),
                Err(Error::InvalidBands {
                    upper: 30.0,
                    lower: 70.0
                })
            );
        }

        #[test]
        fn rejects_equal_levels() {
            assert!(Bands::new(50.0, 50.0).is_err());
        }

        #[test]
        fn rejects_nan() {
            assert!(Bands::new(f64::NAN, 30.0).is_err());
        }

        #[test]
        fn display() {
            assert_eq!(Bands::fixed(80.0, 20.0).to_string(), "80/20");
        }
    }

    mod signal {
        use super::*;

        #[test]
        fn mirrored_is_an_involution() {
            for s in [
                Signal::StrongBuy,
                Signal::Buy,
                Signal::Neutral,
                Signal::Sell,
                Signal::StrongSell,
            ] {
                assert_eq!(s.mirrored().mirrored(), s);
            }
        }

        #[test]
        fn sides() {
            assert!(Signal::StrongBuy.is_buy());
            assert!(Signal::Sell.is_sell());
            assert!(!Signal::Neutral.is_buy());
            assert!(!Signal::Neutral.is_sell());
        }

        #[test]
        fn default_is_neutral() {
            assert_eq!(Signal::default(), Signal::Neutral);
        }
    }
}
