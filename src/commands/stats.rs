use crate::commands::{apply_prune_steps, load_tree};
use crate::config::Config;
use crate::history::PruneSession;
use crate::prune::ValuePruner;
use crate::stats::{Distributions, TreeMetadata};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub distributions: Distributions,
    pub metadata: TreeMetadata,
}

pub fn run(tree: PathBuf, bins: Option<usize>, prune: Vec<ValuePruner>) -> Result<()> {
    let config = Config::load();
    let report = report(&tree, bins.unwrap_or(config.bin_count), &prune)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn report(tree: &Path, bin_count: usize, prune: &[ValuePruner]) -> Result<StatsReport> {
    let mut session = PruneSession::new(load_tree(tree)?);
    apply_prune_steps(&mut session, prune)?;
    Ok(StatsReport {
        distributions: session.distributions(bin_count)?,
        metadata: session.metadata(),
    })
}
