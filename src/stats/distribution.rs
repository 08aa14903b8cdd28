use crate::error::Result;
use crate::prune::{prune_by_depth, prune_by_min_distance, prune_by_min_distance_search, prune_by_min_value};
use crate::stats::buckets::{cumulative_buckets, mad_buckets_up_to, Bucket, MadBucket};
use crate::stats::summary::{extent, mad, median};
use crate::tree::TreeNode;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of one prunable quantity plus the node counts each threshold
/// would leave.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionMetadata {
    pub median: f64,
    pub mad: f64,
    pub plain_groups: Vec<Bucket>,
    pub mad_groups: Vec<MadBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthGroup {
    pub depth: usize,
    pub count: usize,
}

/// Threshold previews for every value pruner, computed over one tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributions {
    pub size: DistributionMetadata,
    pub distance: Option<DistributionMetadata>,
    pub distance_search: Option<DistributionMetadata>,
    pub depth_groups: Vec<DepthGroup>,
}

impl Distributions {
    pub fn from_tree(tree: &TreeNode, bin_count: usize) -> Result<Self> {
        let nodes = tree.descendants();

        let sizes: Vec<f64> = nodes.iter().map(|n| n.value as f64).collect();
        let size = summarize(&sizes, max_cutoff_node_size(tree), bin_count, |t| {
            prune_by_min_value(tree, t).node_count()
        })?;

        let distances: Vec<f64> = nodes
            .iter()
            .filter_map(|n| n.distance)
            .filter(|d| *d != 0.0)
            .collect();
        let (distance, distance_search) = if distances.is_empty() {
            log::debug!("tree carries no branch distances, skipping distance distributions");
            (None, None)
        } else {
            let distance = summarize(&distances, max_cutoff_distance(tree), bin_count, |t| {
                prune_by_min_distance(tree, t).node_count()
            })?;
            let search = summarize(&distances, max_cutoff_distance_search(tree), bin_count, |t| {
                prune_by_min_distance_search(tree, t).node_count()
            })?;
            (Some(distance), Some(search))
        };

        Ok(Self {
            size,
            distance,
            distance_search,
            depth_groups: depth_groups(tree),
        })
    }
}

fn summarize<F>(values: &[f64], upper: f64, bin_count: usize, mut count_at: F) -> Result<DistributionMetadata>
where
    F: FnMut(f64) -> usize,
{
    let median = median(values)?;
    let mad = mad(values)?;
    Ok(DistributionMetadata {
        median,
        mad,
        plain_groups: cumulative_buckets(0.0, upper, bin_count, &mut count_at),
        mad_groups: mad_buckets_up_to(upper, median, mad, &mut count_at),
    })
}

/// Largest size cutoff that still leaves one of the root's children.
pub fn max_cutoff_node_size(tree: &TreeNode) -> f64 {
    tree.children()
        .iter()
        .map(|c| c.value as f64)
        .fold(None, min_of)
        .unwrap_or(0.0)
}

/// Largest distance cutoff that keeps at least one grandchild of the root
/// under the top-down prune.
pub fn max_cutoff_distance(tree: &TreeNode) -> f64 {
    tree.children()
        .iter()
        .flat_map(|child| {
            if child.is_leaf() {
                vec![0.0]
            } else {
                child
                    .children()
                    .iter()
                    .map(|g| g.distance.unwrap_or(0.0))
                    .collect()
            }
        })
        .fold(None, min_of)
        .unwrap_or(0.0)
}

/// Largest distance cutoff that keeps every child of the root under the
/// bottom-up prune.
pub fn max_cutoff_distance_search(tree: &TreeNode) -> f64 {
    tree.children()
        .iter()
        .map(|c| c.distance.unwrap_or(0.0))
        .fold(None, min_of)
        .unwrap_or(0.0)
}

fn min_of(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}

/// Node count left by a depth prune at each depth present in the tree.
pub fn depth_groups(tree: &TreeNode) -> Vec<DepthGroup> {
    let max_depth = tree.descendants().iter().map(|n| n.depth).max().unwrap_or(0);
    (tree.depth..=max_depth)
        .map(|depth| DepthGroup {
            depth,
            count: prune_by_depth(tree, depth as f64).node_count(),
        })
        .collect()
}

/// Headline numbers for a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMetadata {
    pub leaf_count: usize,
    pub node_count: usize,
    pub min_value: usize,
    pub max_value: usize,
    pub min_distance: f64,
    pub max_distance: f64,
    pub depth_counts: BTreeMap<usize, usize>,
}

impl TreeMetadata {
    pub fn from_tree(tree: &TreeNode) -> Self {
        let nodes = tree.descendants();
        let distances: Vec<f64> = nodes.iter().filter_map(|n| n.distance).collect();
        let (min_distance, max_distance) = extent(&distances).unwrap_or((0.0, 0.0));

        let mut depth_counts = BTreeMap::new();
        for node in &nodes {
            *depth_counts.entry(node.depth).or_insert(0) += 1;
        }

        Self {
            leaf_count: nodes.iter().filter(|n| n.is_leaf()).count(),
            node_count: nodes.len(),
            min_value: nodes.iter().map(|n| n.value).min().unwrap_or(0),
            max_value: nodes.iter().map(|n| n.value).max().unwrap_or(0),
            min_distance,
            max_distance,
            depth_counts,
        }
    }
}
