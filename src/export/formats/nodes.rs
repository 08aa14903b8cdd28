use crate::error::Result;
use crate::tree::{NodeId, RawMeta, RawNode, TreeNode};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// One line of the node metadata download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub item_count: usize,
    /// Descendants below the node, the node itself excluded.
    pub child_count: usize,
    pub distance: Option<f64>,
}

/// Rows for every node of `tree` in pre-order.
pub fn node_rows(tree: &TreeNode) -> Vec<NodeRow> {
    fn visit(node: &TreeNode, rows: &mut Vec<NodeRow>) -> usize {
        let index = rows.len();
        rows.push(NodeRow {
            node_id: node.id,
            parent_id: node.parent_id,
            item_count: node.value,
            child_count: 0,
            distance: node.distance,
        });
        let below: usize = node.children().iter().map(|child| visit(child, rows)).sum();
        rows[index].child_count = below;
        below + 1
    }

    let mut rows = Vec::new();
    visit(tree, &mut rows);
    rows
}

pub fn write_node_csv<W: Write>(tree: &TreeNode, writer: &mut W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in node_rows(tree) {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Full dump of the visible tree, overlays included.
pub fn write_tree_json<W: Write>(tree: &TreeNode, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, tree)?;
    writeln!(writer)?;
    Ok(())
}

/// Convert a (pruned) tree back to the nested input format. Leaves take
/// their cells from `base`, so a node pruned to a leaf carries every cell of
/// its original subtree.
pub fn to_cluster_tree(tree: &TreeNode, base: &TreeNode) -> RawNode {
    let originals: HashMap<NodeId, &TreeNode> =
        base.descendants().into_iter().map(|node| (node.id, node)).collect();
    convert(tree, &originals)
}

fn convert(node: &TreeNode, originals: &HashMap<NodeId, &TreeNode>) -> RawNode {
    let children: Vec<RawNode> = node
        .children()
        .iter()
        .map(|child| convert(child, originals))
        .collect();
    let items = if children.is_empty() {
        let source = originals.get(&node.id).copied().unwrap_or(node);
        Some(source.cells().into_iter().cloned().collect())
    } else {
        None
    };
    RawNode::new(
        RawMeta {
            items,
            distance: node.distance,
            significance: node.significance,
        },
        children,
    )
}

pub fn write_cluster_tree<W: Write>(tree: &TreeNode, base: &TreeNode, writer: &mut W) -> Result<()> {
    serde_json::to_writer(&mut *writer, &to_cluster_tree(tree, base))?;
    Ok(())
}
