use crate::annotation::{aggregate_bottom_up, AttributeMap, AttributeValue};
use crate::stats::{extent, mad, median};
use crate::tree::{CellItem, NodeId, TreeNode};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Feature name to (barcode to value).
pub type FeatureMap = BTreeMap<String, HashMap<String, f64>>;

/// Spread of one feature over the cells of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDistribution {
    pub mad: f64,
    pub mad_with_zeroes: f64,
    pub median: f64,
    pub median_with_zeroes: f64,
    pub min: f64,
    pub max: f64,
    /// Sum of the values, zeroes included.
    pub total: f64,
}

impl FeatureDistribution {
    /// Summaries that have nothing to summarize fall back to 0.
    pub fn from_values(values: &[f64]) -> Self {
        let non_zero: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
        let (min, max) = extent(values).unwrap_or((0.0, 0.0));
        Self {
            mad: mad(&non_zero).unwrap_or(0.0),
            mad_with_zeroes: mad(values).unwrap_or(0.0),
            median: median(&non_zero).unwrap_or(0.0),
            median_with_zeroes: median(values).unwrap_or(0.0),
            min,
            max,
            total: values.iter().sum(),
        }
    }
}

/// Per-cell feature values fetched so far. Cells missing from a feature
/// read as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureStore {
    values: FeatureMap,
}

impl FeatureStore {
    pub fn new(values: FeatureMap) -> Self {
        Self { values }
    }

    /// Add fetched features, replacing any already stored under the same name.
    pub fn extend(&mut self, features: FeatureMap) {
        self.values.extend(features);
    }

    pub fn remove(&mut self, feature: &str) -> bool {
        self.values.remove(feature).is_some()
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.values.contains_key(feature)
    }

    pub fn value(&self, feature: &str, barcode: &str) -> f64 {
        self.values
            .get(feature)
            .and_then(|cells| cells.get(barcode))
            .copied()
            .unwrap_or(0.0)
    }

    /// Distribution of `feature` over every cell in the leaves of `tree`.
    pub fn distribution(&self, feature: &str, tree: &TreeNode) -> FeatureDistribution {
        let values: Vec<f64> = tree
            .cells()
            .into_iter()
            .map(|cell| self.value(feature, cell.barcode()))
            .collect();
        FeatureDistribution::from_values(&values)
    }

    /// Median of the fetched values of `feature`, or 0.
    pub fn default_threshold(&self, feature: &str) -> f64 {
        self.values
            .get(feature)
            .map(|cells| cells.values().copied().collect::<Vec<_>>())
            .and_then(|values| median(&values).ok())
            .unwrap_or(0.0)
    }

    /// Sum of each active feature over the cells under every node.
    pub fn feature_counts(&self, base: &TreeNode, active: &[String]) -> HashMap<NodeId, AttributeMap> {
        aggregate_bottom_up(base, |items| {
            active
                .iter()
                .map(|feature| {
                    let total: f64 = items.iter().map(|c| self.value(feature, c.barcode())).sum();
                    (feature.clone(), AttributeValue::labelled(feature.as_str(), total))
                })
                .collect()
        })
    }

    /// High/low combination key of one cell, features in name order.
    /// A cell is high on a feature when its value is non-zero and at least
    /// the threshold.
    pub fn hi_lo_key(
        &self,
        cell: &CellItem,
        active: &[String],
        thresholds: &BTreeMap<String, f64>,
    ) -> Option<String> {
        let mut features: Vec<&String> = active.iter().collect();
        features.sort();
        features.dedup();
        if features.is_empty() {
            return None;
        }
        let parts: Vec<String> = features
            .into_iter()
            .map(|feature| {
                let value = self.value(feature, cell.barcode());
                let high = value != 0.0 && thresholds.get(feature).is_some_and(|t| value >= *t);
                format!("{}-{}", if high { "high" } else { "low" }, feature)
            })
            .collect();
        Some(parts.join("-"))
    }

    /// Cells per high/low combination under every node.
    pub fn feature_hi_los(
        &self,
        base: &TreeNode,
        active: &[String],
        thresholds: &BTreeMap<String, f64>,
    ) -> HashMap<NodeId, AttributeMap> {
        aggregate_bottom_up(base, |items| {
            let mut counts = AttributeMap::new();
            for item in items {
                if let Some(key) = self.hi_lo_key(item, active, thresholds) {
                    counts
                        .entry(key.clone())
                        .and_modify(|v| v.quantity += 1.0)
                        .or_insert_with(|| AttributeValue::labelled(key, 1.0));
                }
            }
            counts
        })
    }
}

/// Every high/low combination of `features`, in the same key form as
/// [`FeatureStore::hi_lo_key`].
pub fn scale_combinations(features: &[String]) -> Vec<String> {
    let mut sorted: Vec<&String> = features.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut combinations: Vec<String> = vec![String::new()];
    for feature in sorted.into_iter().rev() {
        combinations = ["high", "low"]
            .iter()
            .flat_map(|level| {
                combinations.iter().map(move |rest| {
                    if rest.is_empty() {
                        format!("{}-{}", level, feature)
                    } else {
                        format!("{}-{}-{}", level, feature, rest)
                    }
                })
            })
            .collect();
    }
    combinations.retain(|c| !c.is_empty());
    combinations
}
