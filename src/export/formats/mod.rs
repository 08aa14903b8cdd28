pub mod nodes;
pub mod state;
