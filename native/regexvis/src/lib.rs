//! Step-by-step, reversible conversion between regular expressions and
//! finite automata.
//!
//! A [`Session`] starts from a regular expression on a single transition,
//! breaks it down into an epsilon-NFA, determinizes it, and can read a
//! regular expression back off the automaton by state elimination. Every
//! step is a [`Command`] kept in a [`CommandHistory`], so any point of the
//! conversion can be revisited.

pub mod automaton;
pub mod command;
pub mod config;
pub mod error;
pub mod formlang;
pub mod regexp;
pub mod session;

pub use automaton::{Automaton, AutomatonSnapshot, AutomatonState, AutomatonTransition, StateId};
pub use command::{Command, CommandHistory, HistoryEvent};
pub use config::{EngineConfig, IsolationPolicy};
pub use error::{Error, RegexpError, Result};
pub use regexp::{Operator, RegexNode, parse};
pub use session::Session;
