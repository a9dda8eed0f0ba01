use crate::{
    Candles, MovingAverage, Ohlcv, Price, PriceSource, Result, Series, Signal,
    bounds::{PRECISION, clamp, round, round_series},
    signal::{Bands, compare_signal, threshold_signal},
};

use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    hash::Hash,
    num::NonZero,
};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its parameters
/// (length, price source, smoothing kind, bands). Configs are value types:
/// cheap to clone, compare, and hash.
pub trait IndicatorConfig: Sized + PartialEq + Eq + Hash + Display + Debug {
    /// Builder type for constructing this config.
    type Builder: IndicatorConfigBuilder<Self>;

    /// Returns a new builder with default values.
    fn builder() -> Self::Builder;

    /// Main window length (number of bars).
    fn length(&self) -> usize;

    /// Price source extracted from each bar.
    fn source(&self) -> &PriceSource;
}

/// Builder for an [`IndicatorConfig`].
///
/// Every field has a documented default, so `builder().build()` always
/// yields the conventional setting.
pub trait IndicatorConfigBuilder<Config>
where
    Config: IndicatorConfig,
{
    /// Sets the main window length.
    #[must_use]
    fn length(self, length: NonZero<usize>) -> Self;

    /// Sets the price source.
    #[must_use]
    fn source(self, source: PriceSource) -> Self;

    /// Validates the parameters and builds the config.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`](crate::Error) describing the first invalid
    /// parameter, before any bar is processed.
    fn build(self) -> Result<Config>;
}

/// A batch technical indicator.
///
/// An indicator is a pure function of its config and the full bar history:
/// [`calculate`](Indicator::calculate) re-derives every output on each call
/// and keeps nothing between calls.
///
/// Implementors only describe their lines in
/// [`compose`](Indicator::compose); clamping, rounding and signal
/// classification are shared through [`evaluate`].
///
/// # Example
///
/// ```
/// use quantedge_studies::{Candles, Indicator, Rsi, RsiConfig};
///
/// let rsi = Rsi::new(RsiConfig::default());
/// let candles = Candles::from_closes(vec![10.0, 11.0, 10.5, 12.0]);
/// let result = rsi.calculate(&candles);
///
/// assert_eq!(result.len(), 4);
/// assert_eq!(result.signals().len(), 4);
/// assert!(result.primary().iter().all(|v| (0.0..=100.0).contains(v)));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug + Send + Sync {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// The config this indicator was built with.
    fn config(&self) -> &Self::Config;

    /// Derives this indicator's raw lines and signal trigger.
    fn compose(&self, candles: &Candles) -> Composition;

    /// Computes every output line and the per-bar signals.
    fn calculate(&self, candles: &Candles) -> IndicatorResult {
        evaluate(&self.to_string(), candles, |c| self.compose(c))
    }

    /// [`calculate`](Indicator::calculate) over bars of any [`Ohlcv`] type.
    fn calculate_bars<B: Ohlcv>(&self, bars: &[B]) -> IndicatorResult {
        self.calculate(&Candles::from_bars(bars))
    }
}

/// Where a trigger reads its per-bar values.
#[derive(PartialEq, Clone, Debug)]
pub enum Operand {
    /// An output line of the same composition, after clamping and rounding.
    Line(&'static str),
    /// A series that is not an output, typically the source price.
    /// Rounded like the output lines before use.
    Series(Series),
}

/// Classification rule applied to `delta = subject - reference`.
#[derive(PartialEq, Clone, Debug)]
pub enum Rule {
    /// [`compare_signal`] on the deltas.
    Crossover,
    /// [`threshold_signal`] with fixed levels on the subject.
    Bands(Bands),
    /// [`threshold_signal`] with per-bar levels read from two output lines.
    Envelope {
        upper: &'static str,
        lower: &'static str,
    },
}

/// How an indicator turns its lines into signals.
#[derive(PartialEq, Clone, Debug)]
pub struct Trigger {
    subject: Operand,
    reference: Operand,
    rule: Rule,
}

impl Trigger {
    #[must_use]
    pub fn crossover(subject: Operand, reference: Operand) -> Self {
        Self {
            subject,
            reference,
            rule: Rule::Crossover,
        }
    }

    #[must_use]
    pub fn bands(subject: Operand, reference: Operand, bands: Bands) -> Self {
        Self {
            subject,
            reference,
            rule: Rule::Bands(bands),
        }
    }

    #[must_use]
    pub fn envelope(
        subject: Operand,
        reference: Operand,
        upper: &'static str,
        lower: &'static str,
    ) -> Self {
        Self {
            subject,
            reference,
            rule: Rule::Envelope { upper, lower },
        }
    }

    fn classify(&self, outputs: &[(&'static str, Series)], len: usize) -> Vec<Signal> {
        let subject = resolve(&self.subject, outputs);
        let reference = resolve(&self.reference, outputs);
        let levels = match self.rule {
            Rule::Envelope { upper, lower } => {
                Some((lookup(outputs, upper), lookup(outputs, lower)))
            }
            _ => None,
        };

        let mut signals = Vec::with_capacity(len);
        if len == 0 {
            return signals;
        }
        signals.push(Signal::Neutral);

        for i in 1..len {
            let (Some(value), Some(prev_value), Some(base), Some(prev_base)) = (
                subject.get(i),
                subject.get(i - 1),
                reference.get(i),
                reference.get(i - 1),
            ) else {
                signals.push(Signal::Neutral);
                continue;
            };

            let delta = value - base;
            let prev_delta = prev_value - prev_base;

            let signal = match (&self.rule, &levels) {
                (Rule::Bands(bands), _) => threshold_signal(
                    delta,
                    prev_delta,
                    *value,
                    *prev_value,
                    bands.upper(),
                    bands.lower(),
                ),
                (Rule::Envelope { .. }, Some((upper, lower))) => {
                    match (upper.get(i), lower.get(i)) {
                        (Some(&upper), Some(&lower)) => threshold_signal(
                            delta,
                            prev_delta,
                            *value,
                            *prev_value,
                            upper,
                            lower,
                        ),
                        _ => Signal::Neutral,
                    }
                }
                _ => compare_signal(delta, prev_delta),
            };

            signals.push(signal);
        }

        signals
    }
}

fn resolve<'a>(operand: &'a Operand, outputs: &'a [(&'static str, Series)]) -> Cow<'a, [Price]> {
    match operand {
        Operand::Line(label) => lookup(outputs, label),
        Operand::Series(values) => Cow::Owned(round_series(values.clone(), PRECISION)),
    }
}

fn lookup<'a>(outputs: &'a [(&'static str, Series)], label: &str) -> Cow<'a, [Price]> {
    let found = outputs.iter().find(|(l, _)| *l == label);
    debug_assert!(found.is_some(), "trigger references unknown line {label:?}");

    found.map_or(Cow::Borrowed(&[][..]), |(_, values)| Cow::Borrowed(values))
}

#[derive(PartialEq, Clone, Debug)]
enum LineValues {
    Raw {
        values: Series,
        range: Option<(f64, f64)>,
    },
    Smoothed {
        of: &'static str,
        average: MovingAverage,
    },
}

/// Raw lines and trigger of one indicator run, before clamping, rounding
/// and classification.
///
/// The first line added is the primary series.
#[derive(PartialEq, Clone, Debug)]
pub struct Composition {
    lines: Vec<(&'static str, LineValues)>,
    trigger: Trigger,
}

impl Composition {
    #[must_use]
    pub fn new(trigger: Trigger) -> Self {
        Self {
            lines: Vec::new(),
            trigger,
        }
    }

    /// Adds an unbounded line.
    #[must_use]
    pub fn line(mut self, label: &'static str, values: Series) -> Self {
        self.lines.push((
            label,
            LineValues::Raw {
                values,
                range: None,
            },
        ));
        self
    }

    /// Adds a line clamped to `[lo, hi]`.
    #[must_use]
    pub fn bounded(mut self, label: &'static str, values: Series, lo: f64, hi: f64) -> Self {
        self.lines.push((
            label,
            LineValues::Raw {
                values,
                range: Some((lo, hi)),
            },
        ));
        self
    }

    /// Adds a line smoothing the earlier line `of` after it was clamped.
    #[must_use]
    pub fn smoothed(mut self, label: &'static str, of: &'static str, average: MovingAverage) -> Self {
        self.lines.push((label, LineValues::Smoothed { of, average }));
        self
    }
}

/// Shared tail of every indicator.
///
/// Runs `compose` on the candles, then:
///
/// 1. clamps each bounded line to its range,
/// 2. derives smoothed lines from the clamped values,
/// 3. rounds every line to [`PRECISION`] decimals,
/// 4. classifies each bar from consecutive deltas of the rounded values.
///
/// Bar 0 is always [`Signal::Neutral`]: it has no previous bar.
pub fn evaluate<F>(name: &str, candles: &Candles, compose: F) -> IndicatorResult
where
    F: FnOnce(&Candles) -> Composition,
{
    tracing::debug!(indicator = name, bars = candles.len(), "evaluating indicator");

    let Composition { lines, trigger } = compose(candles);

    let mut outputs: Vec<(&'static str, Series)> = Vec::with_capacity(lines.len());
    for (label, line) in lines {
        let values = match line {
            LineValues::Raw {
                values,
                range: Some((lo, hi)),
            } => values.into_iter().map(|v| clamp(v, lo, hi)).collect(),
            LineValues::Raw {
                values,
                range: None,
            } => values,
            LineValues::Smoothed { of, average } => average.apply(&lookup(&outputs, of)),
        };
        outputs.push((label, values));
    }

    for (_, values) in &mut outputs {
        for value in values.iter_mut() {
            *value = round(*value, PRECISION);
        }
    }

    let signals = trigger.classify(&outputs, candles.len());

    IndicatorResult { outputs, signals }
}

/// Output of one indicator run.
///
/// Named series (all as long as the input), the per-bar signals, and the
/// primary series used when chaining into another indicator.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct IndicatorResult {
    outputs: Vec<(&'static str, Series)>,
    signals: Vec<Signal>,
}

impl IndicatorResult {
    /// The series named `label`, if present.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&[Price]> {
        self.outputs
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, values)| values.as_slice())
    }

    /// The primary series.
    #[must_use]
    pub fn primary(&self) -> &[Price] {
        self.outputs
            .first()
            .map_or(&[][..], |(_, values)| values.as_slice())
    }

    /// Label of the primary series.
    #[must_use]
    pub fn primary_label(&self) -> Option<&'static str> {
        self.outputs.first().map(|(label, _)| *label)
    }

    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Output labels in composition order, primary first.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outputs.iter().map(|(label, _)| *label)
    }

    /// `(label, series)` pairs in composition order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[Price])> {
        self.outputs
            .iter()
            .map(|(label, values)| (*label, values.as_slice()))
    }

    /// Number of bars covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Consumes the result, keeping only the primary series.
    #[must_use]
    pub fn into_primary(self) -> Series {
        self.outputs
            .into_iter()
            .next()
            .map(|(_, values)| values)
            .unwrap_or_default()
    }

    /// Candles built from the primary series, for chaining into another
    /// indicator.
    #[must_use]
    pub fn into_candles(self) -> Candles {
        Candles::from_closes(self.into_primary())
    }
}
