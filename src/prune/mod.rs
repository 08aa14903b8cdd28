//! Prune operations. Every prune returns a new tree and never mutates its
//! input; the ids it leaves behind are a subset of the input's ids.

pub mod click;
pub mod pruner;
pub mod value;

pub use click::{collapse_node, set_root_node};
pub use pruner::{ClickPruner, Pruner, ValuePruner};
pub use value::{
    prune_by_depth, prune_by_min_distance, prune_by_min_distance_search, prune_by_min_value,
};
