//! Trailing-window statistics over whole series.
//!
//! Every function maps a source series to an output series of the same
//! length. Output index `i` summarises the window
//! `source[max(0, i + 1 - length) ..= i]`: early indices use whatever history
//! exists instead of leaving a warm-up gap, and averages divide by the
//! number of values actually present.
//!
//! Sums are carried through a single left-to-right scan (add the newest
//! value, drop the one leaving the window). Extrema use a monotonic deque.
//! Rank re-scans the window since it has no incremental form.

use crate::{Error, Price, Result, Series};

use std::{collections::VecDeque, num::NonZero};

/// Validates a raw window length.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `length` is zero.
///
/// # Example
///
/// ```
/// use quantedge_studies::rolling::window_length;
///
/// assert_eq!(window_length(14).map(|l| l.get()), Ok(14));
/// assert!(window_length(0).is_err());
/// ```
pub fn window_length(length: usize) -> Result<NonZero<usize>> {
    NonZero::new(length).ok_or_else(|| {
        tracing::debug!(length, "rejecting window length");
        Error::InvalidLength { length }
    })
}

/// Number of values in the window ending at `index`.
#[inline]
pub(crate) fn present(index: usize, length: usize) -> usize {
    (index + 1).min(length)
}

/// Sum of the trailing window at every index.
///
/// Maintained incrementally. May accumulate floating-point drift over very
/// long runs, negligible for typical window sizes on price data.
#[must_use]
pub fn trailing_sum(source: &[Price], length: NonZero<usize>) -> Series {
    let length = length.get();

    source
        .iter()
        .enumerate()
        .scan(0.0, |sum, (i, &value)| {
            *sum += value;
            if i >= length {
                *sum -= source[i - length];
            }
            Some(*sum)
        })
        .collect()
}

/// Arithmetic mean of the trailing window at every index.
///
/// # Example
///
/// ```
/// use quantedge_studies::rolling::trailing_average;
/// use std::num::NonZero;
///
/// let avg = trailing_average(&[2.0, 4.0, 6.0, 8.0], NonZero::new(3).unwrap());
/// assert_eq!(avg, vec![2.0, 3.0, 4.0, 6.0]);
/// ```
#[must_use]
pub fn trailing_average(source: &[Price], length: NonZero<usize>) -> Series {
    let size = length.get();

    trailing_sum(source, length)
        .into_iter()
        .enumerate()
        .map(|(i, sum)| {
            #[allow(clippy::cast_precision_loss)]
            let count = present(i, size) as f64;
            sum / count
        })
        .collect()
}

/// Population standard deviation of the trailing window at every index.
///
/// Uses a running sum and sum of squares. Variance is floored at zero
/// before the square root, so flat windows give exactly `0.0` or a value
/// within rounding noise of it.
#[must_use]
pub fn trailing_std_dev(source: &[Price], length: NonZero<usize>) -> Series {
    let size = length.get();

    source
        .iter()
        .enumerate()
        .scan((0.0, 0.0), |(sum, sum_of_squares), (i, &value)| {
            *sum += value;
            *sum_of_squares += value * value;
            if i >= size {
                let old = source[i - size];
                *sum -= old;
                *sum_of_squares -= old * old;
            }

            #[allow(clippy::cast_precision_loss)]
            let count = present(i, size) as f64;
            let mean = *sum / count;
            let variance = (*sum_of_squares / count - mean * mean).max(0.0);

            Some(variance.sqrt())
        })
        .collect()
}

/// Windowed highest high and lowest low.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Extrema {
    pub highest: Series,
    pub lowest: Series,
}

/// Trailing maximum of `high` and minimum of `low`, computed jointly for
/// range and channel studies.
///
/// `high` and `low` must have the same length.
#[must_use]
pub fn trailing_extrema(high: &[Price], low: &[Price], length: NonZero<usize>) -> Extrema {
    debug_assert_eq!(high.len(), low.len(), "high and low must be aligned");

    Extrema {
        highest: trailing_max(high, length),
        lowest: trailing_min(low, length),
    }
}

/// Trailing maximum at every index.
#[must_use]
pub fn trailing_max(source: &[Price], length: NonZero<usize>) -> Series {
    monotonic(source, length.get(), |kept, incoming| kept > incoming)
}

/// Trailing minimum at every index.
#[must_use]
pub fn trailing_min(source: &[Price], length: NonZero<usize>) -> Series {
    monotonic(source, length.get(), |kept, incoming| kept < incoming)
}

/// Sliding-window extreme over a deque of indices whose values stay ordered
/// by `dominates`. The front is always the window's extreme.
///
/// NaN values never enter the deque; a window holding only NaN yields NaN.
fn monotonic(source: &[Price], length: usize, dominates: impl Fn(f64, f64) -> bool) -> Series {
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(length);

    source
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            if !value.is_nan() {
                while deque
                    .back()
                    .is_some_and(|&j| !dominates(source[j], value))
                {
                    deque.pop_back();
                }
                deque.push_back(i);
            }

            while deque.front().is_some_and(|&j| j + length <= i) {
                deque.pop_front();
            }

            deque.front().map_or(f64::NAN, |&j| source[j])
        })
        .collect()
}

/// Percentage (0–100) of `prior` values that are `<= value`.
///
/// Returns `0.0` when `prior` is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rank_of(prior: &[Price], value: Price) -> f64 {
    if prior.is_empty() {
        return 0.0;
    }

    let at_or_below = prior.iter().filter(|&&p| p <= value).count();

    100.0 * at_or_below as f64 / prior.len() as f64
}

/// Percentile rank of each value among the `length - 1` values before it.
///
/// The current value is excluded from its own comparison set. Early indices
/// rank against whatever prior values exist; index 0 and any `length <= 1`
/// give `0.0`.
///
/// # Example
///
/// ```
/// use quantedge_studies::rolling::percentile_rank;
/// use std::num::NonZero;
///
/// let rank = percentile_rank(&[3.0, 1.0, 2.0, 5.0], NonZero::new(3).unwrap());
/// // index 2: prior [3, 1], one of two is <= 2
/// assert_eq!(rank, vec![0.0, 0.0, 50.0, 100.0]);
/// ```
#[must_use]
pub fn percentile_rank(source: &[Price], length: NonZero<usize>) -> Series {
    let lookback = length.get() - 1;

    source
        .iter()
        .enumerate()
        .map(|(i, &value)| rank_of(&source[i.saturating_sub(lookback)..i], value))
        .collect()
}

/// Signed count of consecutive moves in one direction.
///
/// Up moves count 1, 2, 3…; down moves count −1, −2, −3…. An unchanged value
/// resets to 0 and a reversal restarts at ±1. Index 0 is always 0.
///
/// # Example
///
/// ```
/// use quantedge_studies::rolling::streak;
///
/// let s = streak(&[1.0, 2.0, 3.0, 2.0, 2.0, 1.0]);
/// assert_eq!(s, vec![0.0, 1.0, 2.0, -1.0, 0.0, -1.0]);
/// ```
#[must_use]
pub fn streak(source: &[Price]) -> Series {
    source
        .iter()
        .scan((None, 0.0_f64), |(prev, count), &value| {
            *count = match *prev {
                Some(p) if value > p => (*count).max(0.0) + 1.0,
                Some(p) if value < p => (*count).min(0.0) - 1.0,
                _ => 0.0,
            };
            *prev = Some(value);
            Some(*count)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, assert_series_near, nz};

    mod length {
        use super::*;

        #[test]
        fn zero_is_rejected() {
            assert_eq!(window_length(0), Err(Error::InvalidLength { length: 0 }));
        }

        #[test]
        fn positive_is_accepted() {
            assert_eq!(window_length(1), Ok(nz(1)));
        }
    }

    mod sum {
        use super::*;

        #[test]
        fn truncated_then_sliding() {
            let sum = trailing_sum(&[1.0, 2.0, 3.0, 4.0, 5.0], nz(3));
            assert_eq!(sum, vec![1.0, 3.0, 6.0, 9.0, 12.0]);
        }

        #[test]
        fn length_one_is_identity() {
            let source = [4.0, -2.0, 7.5];
            assert_eq!(trailing_sum(&source, nz(1)), source.to_vec());
        }

        #[test]
        fn window_longer_than_input_is_cumulative() {
            assert_eq!(trailing_sum(&[1.0, 1.0, 1.0], nz(10)), vec![1.0, 2.0, 3.0]);
        }

        #[test]
        fn empty_input_gives_empty_output() {
            assert!(trailing_sum(&[], nz(3)).is_empty());
        }
    }

    mod average {
        use super::*;

        #[test]
        fn divides_by_present_count() {
            let avg = trailing_average(&[10.0, 20.0, 30.0, 40.0], nz(3));
            assert_eq!(avg, vec![10.0, 15.0, 20.0, 30.0]);
        }

        #[test]
        fn matches_naive_mean_after_warm_up() {
            let source: Vec<f64> = (0..50).map(|i| f64::from(i).sin() * 10.0 + 50.0).collect();
            let avg = trailing_average(&source, nz(7));
            for i in 6..source.len() {
                let naive = source[i - 6..=i].iter().sum::<f64>() / 7.0;
                assert!((avg[i] - naive).abs() < 1e-9, "index {i}");
            }
        }
    }

    mod std_dev {
        use super::*;

        #[test]
        fn flat_window_is_zero() {
            let sd = trailing_std_dev(&[5.0; 6], nz(3));
            assert_eq!(sd, vec![0.0; 6]);
        }

        #[test]
        fn population_deviation() {
            // window [2, 4, 4, 4, 5, 5, 7, 9] has population σ = 2
            let source = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
            let sd = trailing_std_dev(&source, nz(8));
            assert_approx!(sd[7], 2.0);
        }

        #[test]
        fn first_index_is_zero() {
            assert_eq!(trailing_std_dev(&[3.0, 9.0], nz(2))[0], 0.0);
        }
    }

    mod extrema {
        use super::*;

        #[test]
        fn rolling_max_and_min() {
            let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
            assert_eq!(
                trailing_max(&data, nz(3)),
                vec![3.0, 3.0, 4.0, 4.0, 5.0, 9.0, 9.0, 9.0]
            );
            assert_eq!(
                trailing_min(&data, nz(3)),
                vec![3.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]
            );
        }

        #[test]
        fn joint_extrema_use_high_and_low() {
            let high = [10.0, 12.0, 11.0, 9.0];
            let low = [8.0, 9.0, 7.0, 8.5];
            let ext = trailing_extrema(&high, &low, nz(2));
            assert_eq!(ext.highest, vec![10.0, 12.0, 12.0, 11.0]);
            assert_eq!(ext.lowest, vec![8.0, 8.0, 7.0, 7.0]);
        }

        #[test]
        fn matches_naive_scan() {
            let source: Vec<f64> = (0..40).map(|i| f64::from(i * 37 % 11)).collect();
            let max = trailing_max(&source, nz(5));
            let min = trailing_min(&source, nz(5));
            for i in 0..source.len() {
                let window = &source[i.saturating_sub(4)..=i];
                assert_eq!(max[i], window.iter().copied().fold(f64::MIN, f64::max));
                assert_eq!(min[i], window.iter().copied().fold(f64::MAX, f64::min));
            }
        }

        #[test]
        fn nan_is_skipped() {
            let max = trailing_max(&[1.0, f64::NAN, 0.5], nz(2));
            assert_eq!(max[0], 1.0);
            assert_eq!(max[1], 1.0);
            assert_eq!(max[2], 0.5);
        }

        #[test]
        fn equal_values_keep_latest() {
            // ties must not leave an expired index at the front
            let max = trailing_max(&[2.0, 2.0, 2.0, 1.0, 1.0], nz(2));
            assert_eq!(max, vec![2.0, 2.0, 2.0, 2.0, 1.0]);
        }
    }

    mod rank {
        use super::*;

        #[test]
        fn excludes_current_value() {
            // index 3: prior [1, 2, 3], all <= 3
            let rank = percentile_rank(&[1.0, 2.0, 3.0, 3.0], nz(4));
            assert_eq!(rank[3], 100.0);
        }

        #[test]
        fn counts_ties_as_at_or_below() {
            assert_eq!(rank_of(&[1.0, 2.0, 2.0, 4.0], 2.0), 75.0);
        }

        #[test]
        fn length_one_is_zero() {
            assert_eq!(percentile_rank(&[1.0, 5.0, 9.0], nz(1)), vec![0.0; 3]);
        }

        #[test]
        fn first_index_is_zero() {
            assert_eq!(percentile_rank(&[7.0, 8.0], nz(5))[0], 0.0);
        }

        #[test]
        fn slides_over_prior_values() {
            // length 3 → two prior values
            let rank = percentile_rank(&[1.0, 9.0, 8.0, 2.0, 3.0], nz(3));
            assert_series_near!(rank, [0.0, 100.0, 50.0, 0.0, 50.0], 1e-12);
        }
    }

    mod streak {
        use super::*;

        #[test]
        fn resets_and_restarts() {
            assert_eq!(
                streak(&[1.0, 2.0, 3.0, 2.0, 2.0, 1.0]),
                vec![0.0, 1.0, 2.0, -1.0, 0.0, -1.0]
            );
        }

        #[test]
        fn reversal_from_down_run_restarts_at_one() {
            assert_eq!(
                streak(&[5.0, 4.0, 3.0, 4.0, 5.0]),
                vec![0.0, -1.0, -2.0, 1.0, 2.0]
            );
        }

        #[test]
        fn flat_is_zero() {
            assert_eq!(streak(&[3.0; 4]), vec![0.0; 4]);
        }

        #[test]
        fn empty_input_gives_empty_output() {
            assert!(streak(&[]).is_empty());
        }
    }
}
