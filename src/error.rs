use crate::tree::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised by the tree engine and its file/feature boundaries.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Node {0} not found in tree")]
    NodeNotFound(NodeId),

    #[error("Cannot summarize an empty distribution of {0}")]
    EmptyDistribution(&'static str),

    #[error("Invalid upload format: {0}")]
    InvalidUploadFormat(String),

    #[error("Prune step {index} out of range (history has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid feature source: {0}")]
    InvalidFeatureSource(String),

    #[error("Feature request failed: {0}")]
    Http(#[from] reqwest::Error),
}
