//! Where per-cell feature values come from.

mod file;
mod http;

use crate::annotation::FeatureMap;
use crate::error::Result;

pub use file::JsonFileFeatureSource;
pub use http::{records_to_feature_map, FeatureRecord, HttpFeatureSource};

pub trait FeatureSource {
    /// Fetch `feature -> barcode -> value` for each named feature. Features
    /// the source does not know are left out of the result.
    fn fetch(&self, features: &[String]) -> Result<FeatureMap>;

    fn describe(&self) -> String;
}
