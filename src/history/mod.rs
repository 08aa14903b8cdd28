//! Undo-able prune history and the session that keeps the visible tree in
//! step with it.

pub mod session;
pub mod step;

pub use session::{PruneSession, RenderedTree};
pub use step::{PruneHistory, PruneStep};
