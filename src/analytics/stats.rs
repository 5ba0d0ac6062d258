//! Shared statistics for the domain engines
//!
//! Trend classification uses Pearson correlation of value against sample
//! index, with p-values from the Student's t-distribution (statrs). Only
//! a statistically significant slope counts as a trend; everything else
//! reads as stable.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::types::Trend;

/// Correlations with p at or above this are not trends.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Below this many points, trend direction is unknowable.
pub const MIN_TREND_SAMPLES: usize = 5;

/// Mean of a slice. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation. `None` below two points.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Median of a slice (non-destructive, clones and sorts).
/// `None` for an empty slice.
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

/// Pearson correlation coefficient.
///
/// Formula: r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|a| a * a).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Two-tailed p-value for a correlation coefficient.
///
/// Formula: t = r × sqrt(n-2) / sqrt(1-r²), tested against the
/// t-distribution with n-2 degrees of freedom.
pub fn p_value_for_r(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }

    // Perfect or near-perfect correlation is highly significant
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}

/// Classify the direction of a time-ordered series.
///
/// `higher_is_better` flips the mapping for domains where a falling
/// series is the good outcome (compulsion intensity).
pub fn classify_trend(values: &[f64], higher_is_better: bool) -> Trend {
    if values.len() < MIN_TREND_SAMPLES {
        return Trend::Unknown;
    }

    let index: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let r = pearson(&index, values);
    let p = p_value_for_r(r, values.len());

    if p >= SIGNIFICANCE_THRESHOLD {
        return Trend::Stable;
    }

    let rising = r > 0.0;
    match (rising, higher_is_better) {
        (true, true) | (false, false) => Trend::Improving,
        (true, false) | (false, true) => Trend::Declining,
    }
}
