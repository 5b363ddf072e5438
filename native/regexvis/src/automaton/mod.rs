//! Automaton model: states, transitions and the graph that owns them.
//!
//! This module provides:
//! - [`Automaton`], a labelled multigraph with monotonic id allocation
//! - [`StateSet`], a bit set of state ids used by the language algorithms
//! - [`AutomatonSnapshot`], a serde representation for persistence

mod graph;
mod snapshot;
mod state;

pub use graph::{Automaton, AutomatonTransition, START_STATE_ID, TransitionId};
pub use snapshot::{AutomatonSnapshot, StateSnapshot, TransitionSnapshot};
pub use state::{AutomatonState, StateId, StateSet};
