use crate::prune::ValuePruner;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prune, annotate and lay out a cluster tree, writing every export
    Render(RenderArgs),

    /// Print threshold distributions and tree metadata as JSON
    Stats {
        /// Cluster tree JSON file
        tree: PathBuf,
        /// Number of linear threshold buckets (default: from config)
        #[arg(long)]
        bins: Option<usize>,
        /// Value prune to apply first, e.g. minSize=10 (repeatable)
        #[arg(long = "prune")]
        prune: Vec<ValuePruner>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenderArgs {
    /// Cluster tree JSON file
    #[arg(long)]
    pub tree: PathBuf,

    /// CSV of cell labels (item,label)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Saved view state to restore prunes, features and scales from
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// JSON file of feature values ({feature: {barcode: value}})
    #[arg(long)]
    pub features: Option<PathBuf>,

    /// Feature to color by (repeatable)
    #[arg(long = "feature")]
    pub active_features: Vec<String>,

    /// CSV of per-node values (node_id plus one value column)
    #[arg(long)]
    pub node_values: Option<PathBuf>,

    /// Value prune applied as its own step, e.g. minDistance=0.5 (repeatable)
    #[arg(long = "prune")]
    pub prune: Vec<ValuePruner>,

    /// Layout width in pixels (default: state file, then config)
    #[arg(long)]
    pub width: Option<f64>,

    /// Directory the exports are written to
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,
}
