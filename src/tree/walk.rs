use crate::tree::types::{CellItem, NodeId, TreeNode};

impl TreeNode {
    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn children_mut(&mut self) -> &mut [TreeNode] {
        self.children.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// All nodes of the subtree in pre-order, this node first.
    pub fn descendants(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().iter().rev());
        }
        out
    }

    pub fn leaves(&self) -> Vec<&TreeNode> {
        self.descendants()
            .into_iter()
            .filter(|node| node.is_leaf())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Cells reachable from this node in the tree as currently shaped.
    pub fn cells(&self) -> Vec<&CellItem> {
        self.descendants()
            .into_iter()
            .flat_map(|node| node.own_items().iter())
            .collect()
    }

    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children_mut()
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Visit every node parent-first.
    pub fn each_before_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut TreeNode),
    {
        visit(self);
        for child in self.children_mut() {
            child.each_before_mut(visit);
        }
    }

    /// Renumber `node_id` in pre-order starting from 0 at this node.
    pub fn assign_node_ids(&mut self) {
        let mut next = 0;
        self.each_before_mut(&mut |node| {
            node.node_id = next;
            next += 1;
        });
    }

    /// Reset depths below this node, which is placed at `depth`, and relink
    /// each child's `parent_id`.
    pub fn refresh_depths(&mut self, depth: usize) {
        self.depth = depth;
        let id = self.id;
        for child in self.children_mut() {
            child.parent_id = Some(id);
            child.refresh_depths(depth + 1);
        }
    }
}
