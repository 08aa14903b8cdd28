//! Radial tidy-tree layout.
//!
//! Node positions come from the Buchheim/Jünger/Leipert linear-time variant
//! of the Reingold-Tilford algorithm, run over a virtual parent of the real
//! root. Breadth is mapped onto a full turn of angle and depth onto a radius
//! of 90% of half the requested width.

use crate::tree::{NodeId, TreeNode};
use serde::Serialize;
use std::f64::consts::PI;

/// One laid-out node. `parent` and `children` index into
/// [`PositionedTree::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointNode {
    pub id: NodeId,
    pub node_id: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
    pub value: usize,
    pub angle: f64,
    pub radius: f64,
}

impl PointNode {
    /// Cartesian position with the root at the origin and angle 0 pointing up.
    pub fn point(&self) -> (f64, f64) {
        point_radial(self.angle, self.radius)
    }
}

/// Nodes in pre-order; the root is always first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedTree {
    pub width: f64,
    pub nodes: Vec<PointNode>,
}

impl PositionedTree {
    pub fn root(&self) -> &PointNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: NodeId) -> Option<&PointNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub fn point_radial(angle: f64, radius: f64) -> (f64, f64) {
    let a = angle - PI / 2.0;
    (radius * a.cos(), radius * a.sin())
}

pub fn car_to_radius(x: f64, y: f64) -> f64 {
    x.hypot(y)
}

pub fn car_to_theta(x: f64, y: f64) -> f64 {
    y.atan2(x) + PI / 2.0
}

/// Lay out `tree` inside a `width`-wide square.
pub fn layout(tree: &TreeNode, width: f64) -> PositionedTree {
    let mut tidy = Tidy::from_tree(tree);
    tidy.run();

    let extent = (2.0 * PI, (width / 2.0) * 0.9);
    let placed = tidy.scale(extent);

    let nodes = tree
        .descendants()
        .into_iter()
        .zip(placed)
        .enumerate()
        .map(|(i, (node, (angle, radius)))| {
            let slot = &tidy.nodes[i + 1];
            PointNode {
                id: node.id,
                node_id: node.node_id,
                parent: slot.parent.filter(|p| *p > 0).map(|p| p - 1),
                children: slot.children.iter().map(|c| c - 1).collect(),
                depth: slot.depth,
                value: node.value,
                angle,
                radius,
            }
        })
        .collect();

    PositionedTree { width, nodes }
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
    number: usize,
    ancestor: usize,
    default_ancestor: Option<usize>,
    thread: Option<usize>,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
    x: f64,
}

impl Slot {
    fn new(index: usize, parent: Option<usize>, depth: usize, number: usize) -> Self {
        Self {
            parent,
            children: Vec::new(),
            depth,
            number,
            ancestor: index,
            default_ancestor: None,
            thread: None,
            prelim: 0.0,
            modifier: 0.0,
            change: 0.0,
            shift: 0.0,
            x: 0.0,
        }
    }
}

/// Arena for the layout. Slot 0 is the virtual root; slot `i + 1` holds the
/// `i`-th node of the tree in pre-order.
struct Tidy {
    nodes: Vec<Slot>,
}

impl Tidy {
    fn from_tree(tree: &TreeNode) -> Self {
        let mut nodes = vec![Slot::new(0, None, 0, 0)];
        let mut stack: Vec<(&TreeNode, usize, usize, usize)> = vec![(tree, 0, 0, 0)];
        while let Some((node, parent, depth, number)) = stack.pop() {
            let index = nodes.len();
            nodes.push(Slot::new(index, Some(parent), depth, number));
            nodes[parent].children.push(index);
            for (i, child) in node.children().iter().enumerate().rev() {
                stack.push((child, index, depth + 1, i));
            }
        }
        Self { nodes }
    }

    fn run(&mut self) {
        for v in self.post_order() {
            self.first_walk(v);
        }
        self.nodes[0].modifier = -self.nodes[1].prelim;
        for v in 1..self.nodes.len() {
            self.second_walk(v);
        }
    }

    /// Real nodes children-first, siblings left to right.
    fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len() - 1);
        let mut stack = vec![(1, false)];
        while let Some((v, expanded)) = stack.pop() {
            if expanded {
                order.push(v);
                continue;
            }
            stack.push((v, true));
            for &child in self.nodes[v].children.iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }

    fn separation(&self, a: usize, b: usize) -> f64 {
        let base = if self.nodes[a].parent == self.nodes[b].parent {
            3.0
        } else {
            2.0
        };
        base / self.nodes[a].depth.max(1) as f64
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.nodes[v].children.first().copied().or(self.nodes[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.nodes[v].children.last().copied().or(self.nodes[v].thread)
    }

    fn parent(&self, v: usize) -> usize {
        self.nodes[v].parent.unwrap_or(0)
    }

    fn first_walk(&mut self, v: usize) {
        let parent = self.parent(v);
        let number = self.nodes[v].number;
        let left_sibling = (number > 0).then(|| self.nodes[parent].children[number - 1]);

        let ends = (
            self.nodes[v].children.first().copied(),
            self.nodes[v].children.last().copied(),
        );
        if let (Some(first), Some(last)) = ends {
            self.execute_shifts(v);
            let midpoint = (self.nodes[first].prelim + self.nodes[last].prelim) / 2.0;
            match left_sibling {
                Some(w) => {
                    self.nodes[v].prelim = self.nodes[w].prelim + self.separation(v, w);
                    self.nodes[v].modifier = self.nodes[v].prelim - midpoint;
                }
                None => self.nodes[v].prelim = midpoint,
            }
        } else if let Some(w) = left_sibling {
            self.nodes[v].prelim = self.nodes[w].prelim + self.separation(v, w);
        }

        let default = self.nodes[parent]
            .default_ancestor
            .unwrap_or(self.nodes[parent].children[0]);
        let ancestor = self.apportion(v, left_sibling, default);
        self.nodes[parent].default_ancestor = Some(ancestor);
    }

    fn second_walk(&mut self, v: usize) {
        let parent_modifier = self.nodes[self.parent(v)].modifier;
        let slot = &mut self.nodes[v];
        slot.x = slot.prelim + parent_modifier;
        slot.modifier += parent_modifier;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for i in (0..self.nodes[v].children.len()).rev() {
            let w = self.nodes[v].children[i];
            let slot = &mut self.nodes[w];
            slot.prelim += shift;
            slot.modifier += shift;
            change += slot.change;
            shift += slot.shift + change;
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = (self.nodes[wp].number - self.nodes[wm].number) as f64;
        let change = shift / subtrees;
        self.nodes[wp].change -= change;
        self.nodes[wp].shift += shift;
        self.nodes[wm].change += change;
        self.nodes[wp].prelim += shift;
        self.nodes[wp].modifier += shift;
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.nodes[vim].ancestor;
        if self.nodes[candidate].parent == self.nodes[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    /// Push the subtree at `v` right until its left contour clears the right
    /// contour of its left siblings. Returns the new default ancestor.
    fn apportion(&mut self, v: usize, left_sibling: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = left_sibling else {
            return ancestor;
        };

        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.nodes[self.parent(vip)].children[0];
        let mut sip = self.nodes[vip].modifier;
        let mut sop = self.nodes[vop].modifier;
        let mut sim = self.nodes[vim].modifier;
        let mut som = self.nodes[vom].modifier;

        let mut next_vim;
        let mut next_vip;
        loop {
            next_vim = self.next_right(vim);
            next_vip = self.next_left(vip);
            let (Some(im), Some(ip)) = (next_vim, next_vip) else {
                break;
            };
            vim = im;
            vip = ip;
            let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
                break;
            };
            vom = om;
            vop = op;

            self.nodes[vop].ancestor = v;
            let shift = self.nodes[vim].prelim + sim - self.nodes[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.nodes[vim].modifier;
            sip += self.nodes[vip].modifier;
            som += self.nodes[vom].modifier;
            sop += self.nodes[vop].modifier;
        }

        if let Some(im) = next_vim {
            if self.next_right(vop).is_none() {
                self.nodes[vop].thread = Some(im);
                self.nodes[vop].modifier += sim - sop;
            }
        }
        if let Some(ip) = next_vip {
            if self.next_left(vom).is_none() {
                self.nodes[vom].thread = Some(ip);
                self.nodes[vom].modifier += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    /// Fit the walked coordinates into `(dx, dy)`, returning `(angle, radius)`
    /// per real node in pre-order.
    fn scale(&self, (dx, dy): (f64, f64)) -> Vec<(f64, f64)> {
        let mut left = 1;
        let mut right = 1;
        let mut bottom = 1;
        for v in 1..self.nodes.len() {
            let slot = &self.nodes[v];
            if slot.x < self.nodes[left].x {
                left = v;
            }
            if slot.x > self.nodes[right].x {
                right = v;
            }
            if slot.depth > self.nodes[bottom].depth {
                bottom = v;
            }
        }

        let s = if left == right {
            1.0
        } else {
            self.separation(left, right) / 2.0
        };
        let tx = s - self.nodes[left].x;
        let kx = dx / (self.nodes[right].x + s + tx);
        let ky = dy / self.nodes[bottom].depth.max(1) as f64;

        self.nodes[1..]
            .iter()
            .map(|slot| ((slot.x + tx) * kx, slot.depth as f64 * ky))
            .collect()
    }
}
