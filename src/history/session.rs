use crate::annotation::AnnotationState;
use crate::error::Result;
use crate::history::step::{apply_click_or_skip, PruneHistory};
use crate::layout::{layout, PositionedTree};
use crate::prune::{ClickPruner, ValuePruner};
use crate::stats::{Distributions, TreeMetadata};
use crate::tree::TreeNode;
use serde::Serialize;

/// The visible tree with its overlays applied, plus its radial layout.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedTree {
    pub tree: TreeNode,
    pub layout: PositionedTree,
}

/// Owns the base tree and its prune history and keeps the derived trees in
/// sync with it.
///
/// `baseline` is the tree entering the active step and `visible` is the
/// tree after it. Edits to the active step only replay that step; moving
/// the cursor backwards replays from the base tree.
#[derive(Debug, Clone)]
pub struct PruneSession {
    base: TreeNode,
    history: PruneHistory,
    baseline: TreeNode,
    visible: TreeNode,
}

impl PruneSession {
    pub fn new(base: TreeNode) -> Self {
        Self::with_history(base, PruneHistory::new())
    }

    pub fn with_history(base: TreeNode, history: PruneHistory) -> Self {
        let mut session = Self {
            baseline: base.clone(),
            visible: base.clone(),
            base,
            history,
        };
        session.rebuild();
        session
    }

    pub fn base(&self) -> &TreeNode {
        &self.base
    }

    pub fn history(&self) -> &PruneHistory {
        &self.history
    }

    pub fn baseline(&self) -> &TreeNode {
        &self.baseline
    }

    pub fn visible(&self) -> &TreeNode {
        &self.visible
    }

    pub fn set_value_pruner(&mut self, pruner: ValuePruner) -> Result<()> {
        let active = self.history.active_step_index();
        self.history.set_value_pruner(active, pruner)?;
        self.set_visible(pruner.apply(&self.baseline));
        Ok(())
    }

    pub fn clear_value_pruner(&mut self) -> Result<()> {
        let active = self.history.active_step_index();
        self.history.clear_value_pruner(active)?;
        self.set_visible(self.baseline.clone());
        Ok(())
    }

    /// Record a click on the active step and apply it to the visible tree.
    pub fn add_click_prune(&mut self, click: ClickPruner) -> Result<()> {
        let active = self.history.active_step_index();
        self.history.add_click_prune(active, click)?;
        if let Some(pruned) = apply_click_or_skip(&self.visible, &click) {
            log::debug!("Applied {:?} to the visible tree without replay", click);
            self.set_visible(pruned);
        }
        Ok(())
    }

    pub fn remove_click_prune(&mut self, click: ClickPruner) -> Result<bool> {
        let active = self.history.active_step_index();
        let removed = self.history.remove_click_prune(active, click)?;
        if removed {
            let visible = self.history.active_step().apply_to(&self.baseline);
            self.set_visible(visible);
        }
        Ok(removed)
    }

    /// Freeze the active step. The visible tree becomes the new baseline
    /// without re-running any prune.
    pub fn apply(&mut self) {
        self.history.apply();
        self.baseline = self.visible.clone();
    }

    pub fn reset(&mut self) {
        self.history.reset();
        self.baseline = self.base.clone();
        self.set_visible(self.base.clone());
    }

    pub fn revert_to_step(&mut self, index: usize) -> Result<()> {
        self.history.revert_to_step(index)?;
        self.rebuild();
        Ok(())
    }

    /// Threshold previews for the active step, computed on its baseline.
    pub fn distributions(&self, bin_count: usize) -> Result<Distributions> {
        Distributions::from_tree(&self.baseline, bin_count)
    }

    pub fn metadata(&self) -> TreeMetadata {
        TreeMetadata::from_tree(&self.visible)
    }

    pub fn layout(&self, width: f64) -> PositionedTree {
        layout(&self.visible, width)
    }

    /// Overlay annotations onto a copy of the visible tree and lay it out.
    pub fn render(&self, width: f64, annotations: &AnnotationState) -> RenderedTree {
        let mut tree = self.visible.clone();
        annotations.overlay(&self.base).apply_to(&mut tree);
        let layout = layout(&tree, width);
        RenderedTree { tree, layout }
    }

    fn rebuild(&mut self) {
        let active = self.history.active_step_index();
        self.baseline = self.history.replay_before(&self.base, active);
        let visible = self.history.active_step().apply_to(&self.baseline);
        self.set_visible(visible);
    }

    fn set_visible(&mut self, mut tree: TreeNode) {
        tree.assign_node_ids();
        self.visible = tree;
    }
}
