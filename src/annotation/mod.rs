//! Per-node overlays: label tallies, feature sums, high/low feature
//! combinations and user uploaded values.
//!
//! Overlays are aggregated once on the base tree, keyed by [`NodeId`], and
//! copied onto whichever pruned tree is on screen. A collapsed node therefore
//! still reports the cells of the subtree it stands in for.

pub mod features;
pub mod labels;
pub mod upload;

use crate::error::TreeError;
use crate::tree::{CellItem, NodeId, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use features::{scale_combinations, FeatureDistribution, FeatureMap, FeatureStore};
pub use labels::{LabelMap, DEFAULT_LABEL};
pub use upload::parse_user_annotations;

/// Color-scale key of an attribute: a category name or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleKey {
    Label(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub quantity: f64,
    pub scale_key: ScaleKey,
}

impl AttributeValue {
    pub fn labelled(label: impl Into<String>, quantity: f64) -> Self {
        Self {
            quantity,
            scale_key: ScaleKey::Label(label.into()),
        }
    }
}

pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// Add `from` into `into`, summing quantities of shared keys.
pub fn merge_attribute_maps(into: &mut AttributeMap, from: &AttributeMap) {
    for (key, value) in from {
        into.entry(key.clone())
            .and_modify(|existing| existing.quantity += value.quantity)
            .or_insert_with(|| value.clone());
    }
}

/// Fold cell-level attributes up the tree: a node's map is its own cells'
/// map merged with each child's.
pub fn aggregate_bottom_up<F>(base: &TreeNode, leaf_map: F) -> HashMap<NodeId, AttributeMap>
where
    F: Fn(&[CellItem]) -> AttributeMap,
{
    fn visit<F>(node: &TreeNode, leaf_map: &F, out: &mut HashMap<NodeId, AttributeMap>) -> AttributeMap
    where
        F: Fn(&[CellItem]) -> AttributeMap,
    {
        let mut map = if node.own_items().is_empty() {
            AttributeMap::new()
        } else {
            leaf_map(node.own_items())
        };
        for child in node.children() {
            let child_map = visit(child, leaf_map, out);
            merge_attribute_maps(&mut map, &child_map);
        }
        out.insert(node.id, map.clone());
        map
    }

    let mut out = HashMap::new();
    visit(base, &leaf_map, &mut out);
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOverlay {
    pub label_count: AttributeMap,
    pub feature_count: AttributeMap,
    pub feature_hi_los: AttributeMap,
    pub user_annotation: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationOverlay {
    nodes: HashMap<NodeId, NodeOverlay>,
}

impl AnnotationOverlay {
    pub fn get(&self, id: NodeId) -> Option<&NodeOverlay> {
        self.nodes.get(&id)
    }

    /// Copy overlay values onto every node of `tree` that has one.
    pub fn apply_to(&self, tree: &mut TreeNode) {
        tree.each_before_mut(&mut |node| {
            if let Some(overlay) = self.nodes.get(&node.id) {
                node.label_count = overlay.label_count.clone();
                node.feature_count = overlay.feature_count.clone();
                node.feature_hi_los = overlay.feature_hi_los.clone();
                node.user_annotation = overlay.user_annotation.clone();
            }
        });
    }
}

/// Everything needed to annotate a tree, held as plain data.
#[derive(Debug, Clone, Default)]
pub struct AnnotationState {
    pub labels: LabelMap,
    pub features: FeatureStore,
    pub active_features: Vec<String>,
    /// Per-feature "high" cutoffs; features without one use their median.
    pub thresholds: BTreeMap<String, f64>,
    pub user_annotations: HashMap<NodeId, f64>,
}

impl AnnotationState {
    /// Thresholds for every active feature, filling gaps with the feature's
    /// median over all cells in the store.
    pub fn effective_thresholds(&self) -> BTreeMap<String, f64> {
        self.active_features
            .iter()
            .map(|feature| {
                let threshold = self
                    .thresholds
                    .get(feature)
                    .copied()
                    .unwrap_or_else(|| self.features.default_threshold(feature));
                (feature.clone(), threshold)
            })
            .collect()
    }

    pub fn overlay(&self, base: &TreeNode) -> AnnotationOverlay {
        let label_counts = self.labels.label_counts(base);
        let (feature_counts, hi_los) = if self.active_features.is_empty() {
            (HashMap::new(), HashMap::new())
        } else {
            let thresholds = self.effective_thresholds();
            (
                self.features.feature_counts(base, &self.active_features),
                self.features.feature_hi_los(base, &self.active_features, &thresholds),
            )
        };

        let mut nodes: HashMap<NodeId, NodeOverlay> = HashMap::new();
        for node in base.descendants() {
            let overlay = NodeOverlay {
                label_count: label_counts.get(&node.id).cloned().unwrap_or_default(),
                feature_count: feature_counts.get(&node.id).cloned().unwrap_or_default(),
                feature_hi_los: hi_los.get(&node.id).cloned().unwrap_or_default(),
                user_annotation: self.user_annotations.get(&node.id).map(|value| AttributeValue {
                    quantity: *value,
                    scale_key: ScaleKey::Number(*value),
                }),
            };
            nodes.insert(node.id, overlay);
        }
        AnnotationOverlay { nodes }
    }
}

/// Reader for uploaded CSV files: a header row, equal-length rows and
/// surrounding whitespace trimmed.
pub(crate) fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

pub(crate) fn upload_error(err: csv::Error) -> TreeError {
    match err.position() {
        Some(pos) => TreeError::InvalidUploadFormat(format!("line {}: {}", pos.line(), err)),
        None => TreeError::InvalidUploadFormat(err.to_string()),
    }
}
