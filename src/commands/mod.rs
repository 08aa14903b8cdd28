pub mod render;
pub mod stats;

use crate::export::StateExport;
use crate::progress::spinner;
use crate::prune::ValuePruner;
use crate::history::PruneSession;
use crate::tree::{build_tree, RawNode, TreeNode};
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

/// Read and build a cluster tree file.
pub fn load_tree(path: &Path) -> Result<TreeNode> {
    let progress = spinner(format!("Loading {}...", path.display()));
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree file {}", path.display()))?;
    let raw = RawNode::from_json_str(&data)
        .with_context(|| format!("Failed to parse tree file {}", path.display()))?;
    let tree = build_tree(&raw).with_context(|| format!("Invalid tree in {}", path.display()))?;
    progress.finish_and_clear();

    info!(
        "Loaded tree with {} nodes and {} cells from {}",
        tree.node_count(),
        tree.value,
        path.display()
    );
    Ok(tree)
}

pub fn load_state(path: &Path) -> Result<StateExport> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid state file {}", path.display()))
}

/// Apply each pruner as its own step, freezing the active step first when
/// it already holds a prune.
pub fn apply_prune_steps(session: &mut PruneSession, pruners: &[ValuePruner]) -> Result<()> {
    for pruner in pruners {
        if !session.history().active_step().is_empty() {
            session.apply();
        }
        session.set_value_pruner(*pruner)?;
        session.apply();
        info!(
            "Applied {}: {} nodes visible",
            pruner,
            session.visible().node_count()
        );
    }
    Ok(())
}
