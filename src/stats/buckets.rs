use crate::error::{Result, TreeError};
use crate::stats::summary::{extent, mad_count_to_value};
use serde::Serialize;

/// Node count left standing when pruning at `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub threshold: f64,
    pub count: usize,
}

/// Node count left standing when pruning `mads` MADs above the median.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MadBucket {
    pub mads: usize,
    pub threshold: f64,
    pub count: usize,
}

/// Evenly spaced thresholds from `lower` with `upper` appended exactly, so
/// float drift never skips the top value.
pub fn linear_thresholds(lower: f64, upper: f64, bucket_count: usize) -> Vec<f64> {
    if bucket_count == 0 || upper <= lower {
        return vec![lower];
    }
    let step = (upper - lower) / bucket_count as f64;
    let mut thresholds: Vec<f64> = (0..bucket_count)
        .map(|i| lower + step * i as f64)
        .collect();
    thresholds.push(upper);
    thresholds
}

pub fn cumulative_buckets<F>(lower: f64, upper: f64, bucket_count: usize, mut count_at: F) -> Vec<Bucket>
where
    F: FnMut(f64) -> usize,
{
    linear_thresholds(lower, upper, bucket_count)
        .into_iter()
        .map(|threshold| Bucket {
            threshold,
            count: count_at(threshold),
        })
        .collect()
}

/// One bucket per whole MAD above the median, up to the largest value.
pub fn mad_buckets<F>(values: &[f64], median: f64, mad: f64, count_at: F) -> Result<Vec<MadBucket>>
where
    F: FnMut(f64) -> usize,
{
    let (_, max) = extent(values).ok_or(TreeError::EmptyDistribution("values"))?;
    Ok(mad_buckets_up_to(max, median, mad, count_at))
}

/// Same as [`mad_buckets`] with an explicit top value.
pub fn mad_buckets_up_to<F>(upper: f64, median: f64, mad: f64, mut count_at: F) -> Vec<MadBucket>
where
    F: FnMut(f64) -> usize,
{
    if !(mad.is_finite() && mad > 0.0) {
        return Vec::new();
    }
    let steps = ((upper - median) / mad).ceil();
    if !(steps.is_finite() && steps > 0.0) {
        return Vec::new();
    }
    (0..steps as usize)
        .map(|mads| {
            let threshold = mad_count_to_value(mads as f64, median, mad);
            MadBucket {
                mads,
                threshold,
                count: count_at(threshold),
            }
        })
        .collect()
}
