//! Robust statistics over tree quantities and the threshold previews that
//! drive the value pruners.

pub mod buckets;
pub mod distribution;
pub mod summary;

pub use buckets::{cumulative_buckets, linear_thresholds, mad_buckets, Bucket, MadBucket};
pub use distribution::{DepthGroup, DistributionMetadata, Distributions, TreeMetadata};
pub use summary::{extent, mad, mad_count_to_value, median, value_to_mad_count};
