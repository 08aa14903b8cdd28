use crate::error::{Result, TreeError};
use crate::prune::pruner::optional_value_pruner;
use crate::prune::{ClickPruner, ValuePruner};
use crate::tree::TreeNode;
use serde::{Deserialize, Serialize};

/// One step of the prune history: an optional threshold prune followed by
/// click prunes in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneStep {
    #[serde(with = "optional_value_pruner", default)]
    pub value_pruner: Option<ValuePruner>,
    #[serde(default)]
    pub click_prune_history: Vec<ClickPruner>,
}

impl PruneStep {
    pub fn is_empty(&self) -> bool {
        self.value_pruner.is_none() && self.click_prune_history.is_empty()
    }

    /// Run this step against `tree`. Clicks that name a node no longer in
    /// the tree are skipped with a warning.
    pub fn apply_to(&self, tree: &TreeNode) -> TreeNode {
        let mut pruned = match &self.value_pruner {
            Some(pruner) => pruner.apply(tree),
            None => tree.clone(),
        };
        for click in &self.click_prune_history {
            pruned = apply_click_or_skip(&pruned, click).unwrap_or(pruned);
        }
        pruned
    }
}

/// Apply `click`, or return `None` (after logging) when its node is gone.
pub(crate) fn apply_click_or_skip(tree: &TreeNode, click: &ClickPruner) -> Option<TreeNode> {
    match click.apply(tree) {
        Ok(pruned) => Some(pruned),
        Err(TreeError::NodeNotFound(id)) => {
            log::warn!("Skipping {:?}: node {} is not in the current tree", click, id);
            None
        }
        Err(e) => {
            log::warn!("Skipping {:?}: {}", click, e);
            None
        }
    }
}

/// Linear, branch-free undo history of prune steps.
///
/// There is always at least one step and `active_step_index` always points
/// at one of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneHistory {
    steps: Vec<PruneStep>,
    active_step_index: usize,
}

impl Default for PruneHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PruneHistory {
    pub fn new() -> Self {
        Self {
            steps: vec![PruneStep::default()],
            active_step_index: 0,
        }
    }

    /// Rebuild a history from saved steps, with the last one active.
    pub fn from_steps(steps: Vec<PruneStep>) -> Self {
        if steps.is_empty() {
            return Self::new();
        }
        let active_step_index = steps.len() - 1;
        Self {
            steps,
            active_step_index,
        }
    }

    pub fn steps(&self) -> &[PruneStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn active_step_index(&self) -> usize {
        self.active_step_index
    }

    pub fn active_step(&self) -> &PruneStep {
        &self.steps[self.active_step_index]
    }

    pub fn step(&self, index: usize) -> Result<&PruneStep> {
        self.check_index(index)?;
        Ok(&self.steps[index])
    }

    /// Freeze the active step and open an empty one after it. Any steps past
    /// the active one are discarded first.
    pub fn apply(&mut self) {
        self.steps.truncate(self.active_step_index + 1);
        self.steps.push(PruneStep::default());
        self.active_step_index += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Move the cursor back (or forward) without discarding anything.
    pub fn revert_to_step(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.active_step_index = index;
        Ok(())
    }

    /// Set the threshold prune of `index`, dropping the clicks made on it.
    pub fn set_value_pruner(&mut self, index: usize, pruner: ValuePruner) -> Result<()> {
        self.check_index(index)?;
        let step = &mut self.steps[index];
        step.value_pruner = Some(pruner);
        step.click_prune_history.clear();
        Ok(())
    }

    pub fn clear_value_pruner(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        let step = &mut self.steps[index];
        step.value_pruner = None;
        step.click_prune_history.clear();
        Ok(())
    }

    pub fn add_click_prune(&mut self, index: usize, click: ClickPruner) -> Result<()> {
        self.check_index(index)?;
        self.steps[index].click_prune_history.push(click);
        Ok(())
    }

    /// Remove every click on `index` matching `click`. Returns whether any
    /// were removed.
    pub fn remove_click_prune(&mut self, index: usize, click: ClickPruner) -> Result<bool> {
        self.check_index(index)?;
        let clicks = &mut self.steps[index].click_prune_history;
        let before = clicks.len();
        clicks.retain(|c| *c != click);
        Ok(clicks.len() != before)
    }

    /// The tree entering step `end`: steps `0..end` applied to `base`.
    pub fn replay_before(&self, base: &TreeNode, end: usize) -> TreeNode {
        let steps = &self.steps[..end.min(self.steps.len())];
        let tree = steps
            .iter()
            .fold(base.clone(), |tree, step| step.apply_to(&tree));
        log::debug!(
            "Replayed {} prune steps, {} nodes remain",
            steps.len(),
            tree.node_count()
        );
        tree
    }

    /// The visible tree: every step up to and including the active one.
    pub fn replay(&self, base: &TreeNode) -> TreeNode {
        self.replay_before(base, self.active_step_index + 1)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.steps.len() {
            Ok(())
        } else {
            Err(TreeError::StepOutOfRange {
                index,
                len: self.steps.len(),
            })
        }
    }
}
