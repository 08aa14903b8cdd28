use crate::error::{Result, TreeError};
use crate::tree::{NodeId, TreeNode};

/// Copy the subtree under `id` out as a standalone tree rooted at depth 0.
pub fn set_root_node(tree: &TreeNode, id: NodeId) -> Result<TreeNode> {
    let target = tree.find(id).ok_or(TreeError::NodeNotFound(id))?;
    let mut root = target.clone();
    root.parent_id = None;
    root.refresh_depths(0);
    Ok(root)
}

/// Turn the node `id` into a leaf.
pub fn collapse_node(tree: &TreeNode, id: NodeId) -> Result<TreeNode> {
    if !tree.contains(id) {
        return Err(TreeError::NodeNotFound(id));
    }
    let mut collapsed = tree.clone();
    if let Some(node) = collapsed.find_mut(id) {
        node.children = None;
    }
    Ok(collapsed)
}
