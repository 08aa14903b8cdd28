use crate::error::{Result, TreeError};

/// Median of the non-NaN values; the mean of the two middle values when the
/// count is even.
pub fn median(values: &[f64]) -> Result<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(TreeError::EmptyDistribution("values"));
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Median absolute deviation around the median.
pub fn mad(values: &[f64]) -> Result<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - center).abs())
        .collect();
    median(&deviations)
}

/// How many MADs `value` sits from `median`, ignoring direction.
pub fn value_to_mad_count(value: f64, median: f64, mad: f64) -> f64 {
    (value - median).abs() / mad
}

pub fn mad_count_to_value(mad_count: f64, median: f64, mad: f64) -> f64 {
    median + mad_count * mad
}

/// Smallest and largest non-NaN value.
pub fn extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
