use crate::error::{Result, TreeError};
use crate::tree::types::{CellItem, NodeId, RawNode, TreeNode, MAX_TREE_DEPTH};
use std::collections::HashMap;
use std::sync::Arc;

/// A node of the flattened tree, linked to its parent by id.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub items: Option<Arc<[CellItem]>>,
    pub distance: Option<f64>,
    pub significance: Option<f64>,
}

/// Number the raw tree in pre-order and emit one record per node, parents
/// always ahead of their children.
pub fn flatten(raw: &RawNode) -> Vec<FlatNode> {
    let mut flat = Vec::new();
    let mut stack: Vec<(&RawNode, Option<NodeId>)> = vec![(raw, None)];

    while let Some((node, parent_id)) = stack.pop() {
        let id = NodeId(flat.len() as u32);
        let meta = node.meta.as_ref();
        flat.push(FlatNode {
            id,
            parent_id,
            items: meta
                .and_then(|m| m.items.as_ref())
                .map(|items| Arc::from(items.as_slice())),
            distance: meta.and_then(|m| m.distance),
            significance: meta.and_then(|m| m.significance),
        });
        for child in node.children.iter().rev() {
            stack.push((child, Some(id)));
        }
    }

    flat
}

/// Rebuild the hierarchy from id/parent links.
///
/// Exactly one record may lack a parent, every parent id must resolve and
/// every record must be reachable from the root. Children end up ordered by
/// descending cell count (stable), `value` is summed bottom-up and depths run
/// from 0 at the root.
pub fn stratify(flat: Vec<FlatNode>) -> Result<TreeNode> {
    let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(flat.len());
    for (position, node) in flat.iter().enumerate() {
        if index.insert(node.id, position).is_some() {
            return Err(TreeError::MalformedTree(format!("duplicate node id {}", node.id)));
        }
    }

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();
    for (position, node) in flat.iter().enumerate() {
        match node.parent_id {
            None => roots.push(position),
            Some(parent_id) => {
                let parent = index.get(&parent_id).ok_or_else(|| {
                    TreeError::MalformedTree(format!(
                        "node {} references missing parent {}",
                        node.id, parent_id
                    ))
                })?;
                children_of[*parent].push(position);
            }
        }
    }

    let root = match roots.as_slice() {
        [root] => *root,
        [] => return Err(TreeError::MalformedTree("no root node".to_string())),
        _ => {
            return Err(TreeError::MalformedTree(format!(
                "found {} root nodes",
                roots.len()
            )))
        }
    };

    let (reachable, deepest) = measure(root, &children_of);
    if reachable != flat.len() {
        return Err(TreeError::MalformedTree(format!(
            "{} nodes are not connected to the root",
            flat.len() - reachable
        )));
    }
    if deepest > MAX_TREE_DEPTH {
        return Err(TreeError::MalformedTree(format!(
            "tree is {} levels deep, the limit is {}",
            deepest, MAX_TREE_DEPTH
        )));
    }

    let mut slots: Vec<Option<FlatNode>> = flat.into_iter().map(Some).collect();
    assemble(root, 0, &mut slots, &children_of)
}

/// Parse-side entry point: flatten then stratify.
pub fn build_tree(raw: &RawNode) -> Result<TreeNode> {
    let mut tree = stratify(flatten(raw))?;
    tree.assign_node_ids();
    Ok(tree)
}

/// Nodes reachable from `root` and the depth of the deepest one.
fn measure(root: usize, children_of: &[Vec<usize>]) -> (usize, usize) {
    let mut seen = vec![false; children_of.len()];
    let mut stack = vec![(root, 0)];
    let (mut count, mut deepest) = (0, 0);
    while let Some((position, depth)) = stack.pop() {
        if std::mem::replace(&mut seen[position], true) {
            continue;
        }
        count += 1;
        deepest = deepest.max(depth);
        stack.extend(children_of[position].iter().map(|&child| (child, depth + 1)));
    }
    (count, deepest)
}

fn assemble(
    position: usize,
    depth: usize,
    slots: &mut [Option<FlatNode>],
    children_of: &[Vec<usize>],
) -> Result<TreeNode> {
    let flat = slots[position]
        .take()
        .ok_or_else(|| TreeError::MalformedTree("cycle in parent links".to_string()))?;

    let mut children = children_of[position]
        .iter()
        .map(|&child| assemble(child, depth + 1, slots, children_of))
        .collect::<Result<Vec<_>>>()?;
    children.sort_by(|a, b| b.value.cmp(&a.value));

    let mut node = TreeNode::new(
        flat.id,
        flat.parent_id,
        flat.items,
        flat.distance,
        flat.significance,
    );
    node.depth = depth;
    node.value = node.own_items().len() + children.iter().map(|c| c.value).sum::<usize>();
    if !children.is_empty() {
        node.children = Some(children);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::{cells, sample_raw};

    #[test]
    fn flatten_numbers_nodes_in_pre_order() {
        let flat = flatten(&sample_raw());
        let ids: Vec<u32> = flat.iter().map(|n| n.id.0).collect();
        assert_eq!(ids, (0..11).collect::<Vec<_>>());
        assert_eq!(flat[0].parent_id, None);
        assert_eq!(flat[2].parent_id, Some(NodeId(1)));
        assert_eq!(flat[8].parent_id, Some(NodeId(0)));
        assert_eq!(flat[8].distance, Some(0.8));
    }

    #[test]
    fn stratify_sums_values_and_sets_depths() {
        let tree = build_tree(&sample_raw()).unwrap();
        assert_eq!(tree.value, 9);
        assert_eq!(tree.depth, 0);

        let a = tree.find(NodeId(1)).unwrap();
        assert_eq!(a.value, 5);
        assert_eq!(a.depth, 1);
        assert_eq!(a.parent_id, Some(NodeId(0)));
        assert!(a.items.is_none());

        let leaf = tree.find(NodeId(3)).unwrap();
        assert_eq!(leaf.depth, 3);
        assert!(leaf.children.is_none());
    }

    #[test]
    fn children_sorted_by_descending_value() {
        let raw = RawNode::branch(
            None,
            vec![
                RawNode::leaf(cells("x", 1)),
                RawNode::leaf(cells("y", 4)),
                RawNode::leaf(cells("z", 1)),
            ],
        );
        let tree = build_tree(&raw).unwrap();
        let order: Vec<u32> = tree.children().iter().map(|c| c.id.0).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn missing_parent_is_malformed() {
        let mut flat = flatten(&sample_raw());
        flat[4].parent_id = Some(NodeId(99));
        assert!(matches!(stratify(flat), Err(TreeError::MalformedTree(_))));
    }

    #[test]
    fn multiple_roots_are_malformed() {
        let mut flat = flatten(&sample_raw());
        flat[8].parent_id = None;
        let err = stratify(flat).unwrap_err();
        assert!(err.to_string().contains("2 root nodes"));
    }

    #[test]
    fn cycles_are_malformed() {
        let mut flat = flatten(&sample_raw());
        flat[1].parent_id = Some(NodeId(2));
        assert!(matches!(stratify(flat), Err(TreeError::MalformedTree(_))));
    }

    fn chain(depth: usize) -> RawNode {
        (0..depth).fold(RawNode::leaf(cells("tip", 1)), |node, _| RawNode::branch(Some(1.0), vec![node]))
    }

    #[test]
    fn depth_limit_is_inclusive() {
        let tree = build_tree(&chain(MAX_TREE_DEPTH)).unwrap();
        assert_eq!(tree.value, 1);
        assert_eq!(tree.node_count(), MAX_TREE_DEPTH + 1);

        let err = build_tree(&chain(MAX_TREE_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, TreeError::MalformedTree(_)));
        assert!(err.to_string().contains("levels deep"));
    }

    #[test]
    fn single_node_tree() {
        let tree = build_tree(&RawNode::leaf(cells("solo", 3))).unwrap();
        assert_eq!(tree.value, 3);
        assert!(tree.is_leaf());
        assert_eq!(tree.node_count(), 1);
    }
}
