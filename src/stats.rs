//! Descriptive statistics kernel.
//!
//! Pure functions over `f64` slices, used standalone by the trend and
//! distribution operations and internally by the clustering and
//! aggregation engines. Every function is total: empty input yields
//! `None`, numeric degeneracy (zero spread, zero bin width) resolves to
//! a documented fallback instead of dividing by zero.

use crate::types::TrendSummary;
use serde::{Deserialize, Serialize};

/// Upper bound on automatic histogram bin counts
const MAX_HISTOGRAM_BINS: usize = 50;

/// Critical value for a 95% confidence interval on a mean
const Z_95: f64 = 1.96;

/// Arithmetic mean, `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Smallest value, `None` for empty input.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Largest value, `None` for empty input.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Median: middle of the sorted values, or the average of the two
/// middles for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation (sum of squared deviations over N,
/// not N-1).
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Bundle of the basic descriptive statistics for one value set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Compute all summary statistics in one pass over the input.
pub fn summarize(values: &[f64]) -> Option<SummaryStats> {
    Some(SummaryStats {
        count: values.len(),
        mean: mean(values)?,
        median: median(values)?,
        min: min(values)?,
        max: max(values)?,
        std_dev: population_std_dev(values)?,
    })
}

/// First and third quartiles by sorted index: Q1 at
/// `floor(0.25 * (n - 1))`, Q3 at `floor(0.75 * (n - 1))`.
fn quartiles(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    let q1 = sorted[(0.25 * (n - 1) as f64).floor() as usize];
    let q3 = sorted[(0.75 * (n - 1) as f64).floor() as usize];
    (q1, q3)
}

/// Interquartile range.
///
/// For fewer than 4 values the index-based quartiles are too coarse to
/// be meaningful, so the full range `max - min` is used instead.
pub fn interquartile_range(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    if values.len() < 4 {
        return Some(max(values)? - min(values)?);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let (q1, q3) = quartiles(&sorted);
    Some(q3 - q1)
}

/// Indices of IQR-method outliers: values below `Q1 - multiplier * IQR`
/// or above `Q3 + multiplier * IQR`. The conventional multiplier is 1.5.
pub fn iqr_outlier_indices(values: &[f64], multiplier: f64) -> Vec<usize> {
    if values.len() < 4 {
        // Too few samples to call anything an outlier
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let (q1, q3) = quartiles(&sorted);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < lower || **v > upper)
        .map(|(i, _)| i)
        .collect()
}

/// Indices of z-score outliers: `|value - mean| / stddev > threshold`.
/// The conventional threshold is 3.0. A zero standard deviation means
/// no value deviates, so no outliers are reported.
pub fn zscore_outlier_indices(values: &[f64], threshold: f64) -> Vec<usize> {
    let Some(m) = mean(values) else {
        return Vec::new();
    };
    let Some(sd) = population_std_dev(values) else {
        return Vec::new();
    };
    if sd == 0.0 {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| ((**v - m) / sd).abs() > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// One histogram bin over `[lower, upper)`; the last bin is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of a value set. The sum of bin counts always
/// equals the input length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub bin_width: f64,
}

impl Histogram {
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Build a histogram, `None` for empty input.
///
/// When `bin_count` is not given, the Freedman-Diaconis rule picks it:
/// `bin_width = 2 * IQR / n^(1/3)`, `bins = ceil(range / bin_width)`,
/// clamped to `[1, 50]`. A degenerate width (all values equal, or zero
/// IQR) falls back to a single bin holding every value.
pub fn histogram(values: &[f64], bin_count: Option<usize>) -> Option<Histogram> {
    if values.is_empty() {
        return None;
    }
    let lo = min(values)?;
    let hi = max(values)?;
    let range = hi - lo;
    let n = values.len();

    let bins = match bin_count {
        Some(b) => b.clamp(1, MAX_HISTOGRAM_BINS),
        None => {
            let iqr = interquartile_range(values)?;
            let width = 2.0 * iqr / (n as f64).cbrt();
            if width <= 0.0 || range <= 0.0 {
                1
            } else {
                ((range / width).ceil() as usize).clamp(1, MAX_HISTOGRAM_BINS)
            }
        }
    };

    if range <= 0.0 {
        // All values identical: one bin containing everything
        return Some(Histogram {
            bins: vec![HistogramBin {
                lower: lo,
                upper: hi,
                count: n,
            }],
            bin_width: 0.0,
        });
    }

    let bin_width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + i as f64 * bin_width,
            upper: lo + (i + 1) as f64 * bin_width,
            count,
        })
        .collect();

    Some(Histogram { bins, bin_width })
}

/// 95% confidence interval on the mean: `mean +/- 1.96 * stddev / sqrt(n)`.
///
/// Only meaningful for `n >= 3`; below that the interval collapses to
/// the mean and the standard error is reported as 0 rather than an
/// unstable estimate.
pub fn mean_confidence_interval(values: &[f64]) -> Option<TrendSummary> {
    let m = mean(values)?;
    let sd = population_std_dev(values)?;
    let n = values.len();

    if n < 3 {
        return Some(TrendSummary {
            point_count: n,
            mean: m,
            std_dev: sd,
            standard_error: 0.0,
            ci_lower: m,
            ci_upper: m,
        });
    }

    let se = sd / (n as f64).sqrt();
    Some(TrendSummary {
        point_count: n,
        mean: m,
        std_dev: sd,
        standard_error: se,
        ci_lower: m - Z_95 * se,
        ci_upper: m + Z_95 * se,
    })
}
