//! Moving averages selected by kind.
//!
//! [`MovingAverage::new`] resolves a [`MaKind`] and window length into a
//! smoother holding every constant it needs (smoothing factors, full-window
//! kernels). [`MovingAverage::apply`] then dispatches once per call and runs
//! a single causal pass: output `i` depends only on source values `..= i`.
//!
//! Windowed kinds follow the same truncation rule as [`crate::rolling`]:
//! early indices use the values present. Recursive kinds start from the
//! first source value (`out[0] = source[0]`).

use crate::{
    Error, Price, Series,
    bounds::ratio_or,
    rolling::{present, trailing_average, trailing_sum},
};

use std::{
    borrow::Cow,
    f64::consts::PI,
    fmt::Display,
    num::NonZero,
    str::FromStr,
};

/// Smoothing recurrence used by a [`MovingAverage`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
pub enum MaKind {
    /// Arithmetic mean of the window.
    #[default]
    Simple,
    /// `α = 2 / (length + 1)`.
    Exponential,
    /// Wilder's smoothing, `α = 1 / length`.
    Wilder,
    /// Linear weights `1..=n`, newest heaviest.
    Weighted,
    /// `2·EMA − EMA(EMA)`.
    DoubleExponential,
    /// `3·EMA − 3·EMA(EMA) + EMA(EMA(EMA))`.
    TripleExponential,
    /// Hull: `WMA(2·WMA(n/2) − WMA(n), √n)`.
    Hull,
    /// SMA of an SMA, weights peaking mid-window.
    Triangular,
    /// EMA of the de-lagged price `2·x[i] − x[i − (n−1)/2]`.
    ZeroLagExponential,
    /// Kaufman's adaptive average, smoothing driven by the efficiency ratio.
    KaufmanAdaptive,
    /// Tillson's T3: six cascaded EMAs, volume factor 0.7.
    TillsonT3,
    /// Arnaud Legoux: Gaussian weights, offset 0.85, sigma 6.
    ArnaudLegoux,
    /// Half-sine weights.
    SineWeighted,
    /// End point of the least-squares line through the window.
    LeastSquares,
    /// McGinley dynamic, speed adjusted by the price/average ratio.
    McGinleyDynamic,
}

impl MaKind {
    /// Every supported kind.
    pub const ALL: [Self; 15] = [
        Self::Simple,
        Self::Exponential,
        Self::Wilder,
        Self::Weighted,
        Self::DoubleExponential,
        Self::TripleExponential,
        Self::Hull,
        Self::Triangular,
        Self::ZeroLagExponential,
        Self::KaufmanAdaptive,
        Self::TillsonT3,
        Self::ArnaudLegoux,
        Self::SineWeighted,
        Self::LeastSquares,
        Self::McGinleyDynamic,
    ];

    /// Conventional short name, e.g. `"EMA"`.
    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Simple => "SMA",
            Self::Exponential => "EMA",
            Self::Wilder => "RMA",
            Self::Weighted => "WMA",
            Self::DoubleExponential => "DEMA",
            Self::TripleExponential => "TEMA",
            Self::Hull => "HMA",
            Self::Triangular => "TRIMA",
            Self::ZeroLagExponential => "ZLEMA",
            Self::KaufmanAdaptive => "KAMA",
            Self::TillsonT3 => "T3",
            Self::ArnaudLegoux => "ALMA",
            Self::SineWeighted => "SWMA",
            Self::LeastSquares => "LSMA",
            Self::McGinleyDynamic => "MGD",
        }
    }
}

impl Display for MaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for MaKind {
    type Err = Error;

    /// Parses a kind from its variant name or abbreviation.
    ///
    /// Case, underscores, dashes and spaces are ignored, so `"sma"`,
    /// `"Simple"` and `"zero-lag exponential"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        let kind = match key.as_str() {
            "sma" | "simple" => Self::Simple,
            "ema" | "exponential" => Self::Exponential,
            "rma" | "smma" | "wilder" | "wilders" => Self::Wilder,
            "wma" | "lwma" | "weighted" => Self::Weighted,
            "dema" | "doubleexponential" => Self::DoubleExponential,
            "tema" | "tripleexponential" => Self::TripleExponential,
            "hma" | "hull" => Self::Hull,
            "trima" | "tma" | "triangular" => Self::Triangular,
            "zlema" | "zerolag" | "zerolagexponential" => Self::ZeroLagExponential,
            "kama" | "kaufman" | "kaufmanadaptive" => Self::KaufmanAdaptive,
            "t3" | "tillson" | "tillsont3" => Self::TillsonT3,
            "alma" | "arnaudlegoux" => Self::ArnaudLegoux,
            "swma" | "sine" | "sineweighted" => Self::SineWeighted,
            "lsma" | "epma" | "leastsquares" => Self::LeastSquares,
            "mgd" | "mcginley" | "mcginleydynamic" => Self::McGinleyDynamic,
            _ => {
                tracing::debug!(name = s, "rejecting moving average kind");
                return Err(Error::UnknownMaKind(s.to_owned()));
            }
        };

        Ok(kind)
    }
}

const KAMA_FAST: f64 = 2.0 / (2.0 + 1.0);
const KAMA_SLOW: f64 = 2.0 / (30.0 + 1.0);
const T3_VOLUME_FACTOR: f64 = 0.7;
const ALMA_OFFSET: f64 = 0.85;
const ALMA_SIGMA: f64 = 6.0;

/// Weight profile of a kernel average, oldest sample first.
#[derive(PartialEq, Clone, Copy, Debug)]
enum Shape {
    Sine,
    Gaussian { offset: f64, sigma: f64 },
    LeastSquares,
}

impl Shape {
    #[allow(clippy::cast_precision_loss)]
    fn weights(self, n: usize) -> Vec<f64> {
        let size = n as f64;

        match self {
            Self::Sine => (1..=n)
                .map(|j| (j as f64 * PI / (size + 1.0)).sin())
                .collect(),
            Self::Gaussian { offset, sigma } => {
                let m = offset * (size - 1.0);
                let s = size / sigma;
                (0..n)
                    .map(|j| (-(j as f64 - m).powi(2) / (2.0 * s * s)).exp())
                    .collect()
            }
            Self::LeastSquares if n == 1 => vec![1.0],
            Self::LeastSquares => {
                // end-point value of the fitted line is linear in the samples
                let mean_x = (size - 1.0) / 2.0;
                let sxx: f64 = (0..n).map(|j| (j as f64 - mean_x).powi(2)).sum();
                let end = size - 1.0 - mean_x;
                (0..n)
                    .map(|j| 1.0 / size + (j as f64 - mean_x) * end / sxx)
                    .collect()
            }
        }
    }
}

/// A kind resolved into its constants.
#[derive(PartialEq, Clone, Debug)]
enum Smoother {
    Simple,
    Recursive { alpha: f64 },
    Weighted,
    DoubleExponential { alpha: f64 },
    TripleExponential { alpha: f64 },
    Hull { half: NonZero<usize>, root: NonZero<usize> },
    Triangular { first: NonZero<usize>, second: NonZero<usize> },
    ZeroLag { alpha: f64, lag: usize },
    Kaufman,
    TillsonT3 { alpha: f64, coefficients: [f64; 4] },
    Kernel { shape: Shape, full: Vec<f64> },
    McGinley { length: f64 },
}

impl Smoother {
    #[allow(clippy::cast_precision_loss)]
    fn resolve(kind: MaKind, length: NonZero<usize>) -> Self {
        let n = length.get();
        let ema_alpha = 2.0 / (n as f64 + 1.0);
        let at_least_one = |value: usize| NonZero::new(value).unwrap_or(NonZero::<usize>::MIN);

        match kind {
            MaKind::Simple => Self::Simple,
            MaKind::Exponential => Self::Recursive { alpha: ema_alpha },
            MaKind::Wilder => Self::Recursive {
                alpha: 1.0 / n as f64,
            },
            MaKind::Weighted => Self::Weighted,
            MaKind::DoubleExponential => Self::DoubleExponential { alpha: ema_alpha },
            MaKind::TripleExponential => Self::TripleExponential { alpha: ema_alpha },
            MaKind::Hull => Self::Hull {
                half: at_least_one(n / 2),
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                root: at_least_one((n as f64).sqrt().floor() as usize),
            },
            MaKind::Triangular => Self::Triangular {
                first: at_least_one(n / 2 + n % 2),
                second: at_least_one(n / 2 + 1),
            },
            MaKind::ZeroLagExponential => Self::ZeroLag {
                alpha: ema_alpha,
                lag: (n - 1) / 2,
            },
            MaKind::KaufmanAdaptive => Self::Kaufman,
            MaKind::TillsonT3 => {
                let a = T3_VOLUME_FACTOR;
                let (a2, a3) = (a * a, a * a * a);
                Self::TillsonT3 {
                    alpha: ema_alpha,
                    coefficients: [
                        -a3,
                        3.0 * a2 + 3.0 * a3,
                        -6.0 * a2 - 3.0 * a - 3.0 * a3,
                        1.0 + 3.0 * a + a3 + 3.0 * a2,
                    ],
                }
            }
            MaKind::ArnaudLegoux => Self::kernel(
                Shape::Gaussian {
                    offset: ALMA_OFFSET,
                    sigma: ALMA_SIGMA,
                },
                n,
            ),
            MaKind::SineWeighted => Self::kernel(Shape::Sine, n),
            MaKind::LeastSquares => Self::kernel(Shape::LeastSquares, n),
            MaKind::McGinleyDynamic => Self::McGinley { length: n as f64 },
        }
    }

    fn kernel(shape: Shape, n: usize) -> Self {
        Self::Kernel {
            shape,
            full: shape.weights(n),
        }
    }
}

/// A moving average of one kind and window length.
///
/// Construction resolves the kind once; [`apply`](Self::apply) holds no
/// state between calls, so one instance can be shared across threads and
/// reused for any number of series.
///
/// # Example
///
/// ```
/// use quantedge_studies::{MaKind, MovingAverage};
/// use std::num::NonZero;
///
/// let ema = MovingAverage::new(MaKind::Exponential, NonZero::new(3).unwrap());
///
/// // α = 0.5: 2, 0.5·4 + 0.5·2 = 3, 0.5·6 + 0.5·3 = 4.5
/// assert_eq!(ema.apply(&[2.0, 4.0, 6.0]), vec![2.0, 3.0, 4.5]);
/// ```
#[derive(PartialEq, Clone, Debug)]
pub struct MovingAverage {
    kind: MaKind,
    length: NonZero<usize>,
    smoother: Smoother,
}

impl MovingAverage {
    #[must_use]
    pub fn new(kind: MaKind, length: NonZero<usize>) -> Self {
        Self {
            kind,
            length,
            smoother: Smoother::resolve(kind, length),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> MaKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length.get()
    }

    /// Smooths `source` into a series of the same length.
    #[must_use]
    pub fn apply(&self, source: &[Price]) -> Series {
        tracing::trace!(
            kind = %self.kind,
            length = self.length.get(),
            bars = source.len(),
            "applying moving average"
        );

        let length = self.length;

        match &self.smoother {
            Smoother::Simple => trailing_average(source, length),
            Smoother::Recursive { alpha } => exponential(source, *alpha),
            Smoother::Weighted => weighted(source, length),
            Smoother::DoubleExponential { alpha } => {
                let e1 = exponential(source, *alpha);
                let e2 = exponential(&e1, *alpha);
                e1.iter().zip(&e2).map(|(a, b)| 2.0 * a - b).collect()
            }
            Smoother::TripleExponential { alpha } => {
                let e1 = exponential(source, *alpha);
                let e2 = exponential(&e1, *alpha);
                let e3 = exponential(&e2, *alpha);
                e1.iter()
                    .zip(&e2)
                    .zip(&e3)
                    .map(|((a, b), c)| 3.0 * a - 3.0 * b + c)
                    .collect()
            }
            Smoother::Hull { half, root } => {
                let fast = weighted(source, *half);
                let slow = weighted(source, length);
                let raw: Series = fast.iter().zip(&slow).map(|(f, s)| 2.0 * f - s).collect();
                weighted(&raw, *root)
            }
            Smoother::Triangular { first, second } => {
                trailing_average(&trailing_average(source, *first), *second)
            }
            Smoother::ZeroLag { alpha, lag } => {
                let delagged: Series = source
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| 2.0 * x - source[i.saturating_sub(*lag)])
                    .collect();
                exponential(&delagged, *alpha)
            }
            Smoother::Kaufman => kaufman(source, length),
            Smoother::TillsonT3 {
                alpha,
                coefficients: [c1, c2, c3, c4],
            } => {
                let e1 = exponential(source, *alpha);
                let e2 = exponential(&e1, *alpha);
                let e3 = exponential(&e2, *alpha);
                let e4 = exponential(&e3, *alpha);
                let e5 = exponential(&e4, *alpha);
                let e6 = exponential(&e5, *alpha);
                (0..source.len())
                    .map(|i| c1 * e6[i] + c2 * e5[i] + c3 * e4[i] + c4 * e3[i])
                    .collect()
            }
            Smoother::Kernel { shape, full } => kernel(source, *shape, full),
            Smoother::McGinley { length } => mcginley(source, *length),
        }
    }
}

impl Display for MovingAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.length)
    }
}

/// Smooths `source` with the given kind and length.
///
/// One-shot form of [`MovingAverage::apply`].
#[must_use]
pub fn moving_average(kind: MaKind, length: NonZero<usize>, source: &[Price]) -> Series {
    MovingAverage::new(kind, length).apply(source)
}

/// `out[i] = out[i-1] + α·(x[i] − out[i-1])`, seeded with `x[0]`.
fn exponential(source: &[Price], alpha: f64) -> Series {
    source
        .iter()
        .scan(None, |prev: &mut Option<Price>, &x| {
            let next = prev.map_or(x, |p| alpha.mul_add(x - p, p));
            *prev = Some(next);
            Some(next)
        })
        .collect()
}

/// Linear-weighted average with O(1) update.
///
/// While the window fills, the newest of `n` samples gets weight `n` and
/// older weights stay put. Once full, every retained sample loses one unit
/// of weight (subtract the previous plain sum) and the newest enters at
/// weight `length`.
fn weighted(source: &[Price], length: NonZero<usize>) -> Series {
    let size = length.get();

    source
        .iter()
        .enumerate()
        .scan((0.0, 0.0), |(weighted_sum, sum), (i, &x)| {
            #[allow(clippy::cast_precision_loss)]
            let n = present(i, size) as f64;

            if i < size {
                *weighted_sum += n * x;
                *sum += x;
            } else {
                *weighted_sum += n * x - *sum;
                *sum += x - source[i - size];
            }

            Some(*weighted_sum / (n * (n + 1.0) / 2.0))
        })
        .collect()
}

/// Normalised weighted sum over the window; truncated windows get their own
/// weights, full windows reuse the precomputed ones.
fn kernel(source: &[Price], shape: Shape, full: &[f64]) -> Series {
    let size = full.len();

    source
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let n = present(i, size);
            let weights: Cow<'_, [f64]> = if n == size {
                Cow::Borrowed(full)
            } else {
                Cow::Owned(shape.weights(n))
            };

            let window = &source[i + 1 - n..=i];
            let total: f64 = weights.iter().sum();
            let value: f64 = window.iter().zip(weights.iter()).map(|(v, w)| v * w).sum();

            ratio_or(value, total, x)
        })
        .collect()
}

fn kaufman(source: &[Price], length: NonZero<usize>) -> Series {
    let n = length.get();
    let moves: Series = source
        .iter()
        .enumerate()
        .map(|(i, &x)| if i == 0 { 0.0 } else { (x - source[i - 1]).abs() })
        .collect();
    let volatility = trailing_sum(&moves, length);

    source
        .iter()
        .enumerate()
        .scan(None, |prev: &mut Option<Price>, (i, &x)| {
            let change = (x - source[i.saturating_sub(n)]).abs();
            let efficiency = ratio_or(change, volatility[i], 0.0);
            let constant = efficiency.mul_add(KAMA_FAST - KAMA_SLOW, KAMA_SLOW).powi(2);

            let next = prev.map_or(x, |p| constant.mul_add(x - p, p));
            *prev = Some(next);
            Some(next)
        })
        .collect()
}

/// The step toward price is capped at the full gap, so the average never
/// overshoots the price it chases.
fn mcginley(source: &[Price], length: f64) -> Series {
    source
        .iter()
        .scan(None, |prev: &mut Option<Price>, &x| {
            let next = prev.map_or(x, |p| {
                let factor = if p == 0.0 {
                    1.0
                } else {
                    (1.0 / (length * (x / p).powi(4))).min(1.0)
                };
                factor.mul_add(x - p, p)
            });
            *prev = Some(next);
            Some(next)
        })
        .collect()
}
