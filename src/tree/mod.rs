pub mod build;
pub mod types;
mod walk;

pub use build::{build_tree, flatten, stratify, FlatNode};
pub use types::{Barcode, CellItem, CellRow, NodeId, RawMeta, RawNode, TreeNode, MAX_TREE_DEPTH};
