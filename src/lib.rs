pub mod annotation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod history;
pub mod layout;
mod progress;
pub mod prune;
pub mod stats;
pub mod tree;

pub use annotation::{AnnotationState, FeatureStore, LabelMap};
pub use error::{Result, TreeError};
pub use history::{PruneHistory, PruneSession, PruneStep};
pub use layout::{layout, PositionedTree};
pub use prune::{ClickPruner, Pruner, ValuePruner};
pub use stats::{Distributions, TreeMetadata};
pub use tree::{build_tree, NodeId, RawNode, TreeNode};
