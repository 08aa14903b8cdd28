//! Threshold pruners. Each works on a deep copy and leaves the input tree
//! untouched; the root always survives.

use crate::tree::TreeNode;

/// Remove every child whose subtree value is below `min_value`.
pub fn prune_by_min_value(tree: &TreeNode, min_value: f64) -> TreeNode {
    let mut pruned = tree.clone();
    drop_small_children(&mut pruned, min_value);
    pruned
}

fn drop_small_children(node: &mut TreeNode, min_value: f64) {
    let Some(children) = node.children.as_mut() else {
        return;
    };
    children.retain(|child| child.value as f64 >= min_value);
    for child in children.iter_mut() {
        drop_small_children(child, min_value);
    }
    if children.is_empty() {
        node.children = None;
    }
}

/// Cut the tree so no node is deeper than `max_depth`.
pub fn prune_by_depth(tree: &TreeNode, max_depth: f64) -> TreeNode {
    let mut pruned = tree.clone();
    truncate_below(&mut pruned, max_depth);
    pruned
}

fn truncate_below(node: &mut TreeNode, max_depth: f64) {
    if (node.depth + 1) as f64 > max_depth {
        node.children = None;
        return;
    }
    for child in node.children_mut() {
        truncate_below(child, max_depth);
    }
}

/// Walking down from the root, turn into a leaf the first node on each path
/// whose distance is missing or below `min_distance`.
pub fn prune_by_min_distance(tree: &TreeNode, min_distance: f64) -> TreeNode {
    let mut pruned = tree.clone();
    if min_distance <= 0.0 {
        return pruned;
    }
    for child in pruned.children_mut() {
        stop_at_short_branch(child, min_distance);
    }
    pruned
}

fn stop_at_short_branch(node: &mut TreeNode, min_distance: f64) {
    if !meets_distance(node, min_distance) {
        node.children = None;
        return;
    }
    for child in node.children_mut() {
        stop_at_short_branch(child, min_distance);
    }
}

/// Working up from the leaves, remove every node that fails `min_distance`
/// unless something beneath it survived.
pub fn prune_by_min_distance_search(tree: &TreeNode, min_distance: f64) -> TreeNode {
    let mut pruned = tree.clone();
    if min_distance <= 0.0 {
        return pruned;
    }
    if let Some(children) = pruned.children.as_mut() {
        children.retain_mut(|child| keep_reaching(child, min_distance));
        if children.is_empty() {
            pruned.children = None;
        }
    }
    pruned
}

fn keep_reaching(node: &mut TreeNode, min_distance: f64) -> bool {
    if let Some(children) = node.children.as_mut() {
        children.retain_mut(|child| keep_reaching(child, min_distance));
        if children.is_empty() {
            node.children = None;
        }
    }
    node.children.is_some() || meets_distance(node, min_distance)
}

fn meets_distance(node: &TreeNode, min_distance: f64) -> bool {
    node.distance.is_some_and(|d| d >= min_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::sample_tree;
    use crate::tree::NodeId;

    fn ids(tree: &TreeNode) -> Vec<u32> {
        tree.descendants().iter().map(|n| n.id.0).collect()
    }

    #[test]
    fn min_value_drops_small_subtrees_only() {
        let tree = sample_tree();
        let pruned = prune_by_min_value(&tree, 2.0);
        assert_eq!(ids(&pruned), vec![0, 1, 2, 3, 5, 8, 9]);
        // A2 keeps its value but lost both leaves
        assert!(pruned.find(NodeId(5)).unwrap().is_leaf());
        assert_eq!(pruned.find(NodeId(5)).unwrap().value, 2);
        assert_eq!(tree.node_count(), 11);
    }

    #[test]
    fn min_value_above_everything_keeps_root() {
        let pruned = prune_by_min_value(&sample_tree(), 100.0);
        assert_eq!(pruned.node_count(), 1);
        assert!(pruned.children.is_none());
    }

    #[test]
    fn depth_limits_tree_height() {
        let tree = sample_tree();
        assert_eq!(prune_by_depth(&tree, 1.0).node_count(), 3);
        assert_eq!(prune_by_depth(&tree, 2.0).node_count(), 7);
        assert_eq!(prune_by_depth(&tree, 0.0).node_count(), 1);
        assert_eq!(prune_by_depth(&tree, 3.0).node_count(), 11);
    }

    #[test]
    fn min_distance_stops_at_short_branches() {
        let tree = sample_tree();
        let pruned = prune_by_min_distance(&tree, 0.6);
        assert_eq!(ids(&pruned), vec![0, 1, 2, 5, 8, 9, 10]);
        assert!(pruned.find(NodeId(2)).unwrap().is_leaf());
        assert!(!pruned.find(NodeId(8)).unwrap().is_leaf());
    }

    #[test]
    fn min_distance_search_keeps_paths_to_long_branches() {
        let tree = sample_tree();
        let pruned = prune_by_min_distance_search(&tree, 0.6);
        assert_eq!(ids(&pruned), vec![0, 1, 8]);
        assert!(pruned.find(NodeId(1)).unwrap().is_leaf());
    }

    #[test]
    fn zero_distance_thresholds_are_identity() {
        let tree = sample_tree();
        assert_eq!(prune_by_min_distance(&tree, 0.0).node_count(), 11);
        assert_eq!(prune_by_min_distance_search(&tree, 0.0).node_count(), 11);
    }
}
