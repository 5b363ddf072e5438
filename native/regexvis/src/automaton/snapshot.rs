//! Serializable picture of an automaton, for collaborators that persist or
//! transport the graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::automaton::graph::{Automaton, TransitionId};
use crate::automaton::state::{AutomatonState, StateId};
use crate::error::{Error, Result};
use crate::regexp::parse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub id: StateId,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSnapshot {
    pub id: TransitionId,
    pub from: StateId,
    pub to: StateId,
    /// The label, printed with minimal parentheses.
    pub label: String,
}

/// Everything needed to rebuild an [`Automaton`] and keep editing it.
///
/// The id counters are optional; when absent they are derived from the
/// largest ids present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonSnapshot {
    pub start_state: StateId,
    pub states: Vec<StateSnapshot>,
    pub transitions: Vec<TransitionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state_id: Option<StateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_transition_id: Option<TransitionId>,
}

impl Automaton {
    pub fn snapshot(&self) -> AutomatonSnapshot {
        AutomatonSnapshot {
            start_state: self.start_state_id(),
            states: self
                .states()
                .map(|s| StateSnapshot {
                    id: s.id(),
                    is_final: s.is_final(),
                })
                .collect(),
            transitions: self
                .transitions()
                .map(|t| TransitionSnapshot {
                    id: t.id(),
                    from: t.from(),
                    to: t.to(),
                    label: t.regex().to_string(),
                })
                .collect(),
            next_state_id: Some(self.next_state_id()),
            next_transition_id: Some(self.next_transition_id()),
        }
    }

    /// Rebuild an automaton from a snapshot.
    ///
    /// Every reference is checked and every label parsed before the automaton
    /// is assembled.
    pub fn from_snapshot(snapshot: &AutomatonSnapshot) -> Result<Automaton> {
        let mut state_ids = HashSet::new();
        for state in &snapshot.states {
            if !state_ids.insert(state.id) {
                return Err(Error::Snapshot(format!("duplicate state id {}", state.id)));
            }
        }
        let Some(start) = snapshot
            .states
            .iter()
            .find(|s| s.id == snapshot.start_state)
        else {
            return Err(Error::Snapshot(format!(
                "start state {} is not listed",
                snapshot.start_state
            )));
        };

        let mut transition_ids = HashSet::new();
        let mut transitions = Vec::with_capacity(snapshot.transitions.len());
        for t in &snapshot.transitions {
            if !transition_ids.insert(t.id) {
                return Err(Error::Snapshot(format!("duplicate transition id {}", t.id)));
            }
            for endpoint in [t.from, t.to] {
                if !state_ids.contains(&endpoint) {
                    return Err(Error::Snapshot(format!(
                        "transition {} references missing state {endpoint}",
                        t.id
                    )));
                }
            }
            let regex = parse(&t.label)?.ok_or_else(|| {
                Error::Snapshot(format!("transition {} has an empty label", t.id))
            })?;
            transitions.push(Automaton::build_transition(t.id, t.from, t.to, regex));
        }

        let mut automaton = Automaton::with_start_state(start.id, start.is_final);
        for state in snapshot.states.iter().filter(|s| s.id != start.id) {
            automaton.add_state(AutomatonState::new(state.id, state.is_final));
        }
        for transition in transitions {
            automaton.add_transition(transition);
        }

        let derived_state = state_ids.iter().max().map_or(0, |id| id + 1);
        let derived_transition = transition_ids.iter().max().map_or(0, |id| id + 1);
        automaton.reserve_ids(
            snapshot.next_state_id.unwrap_or(0).max(derived_state),
            snapshot
                .next_transition_id
                .unwrap_or(0)
                .max(derived_transition),
        );
        Ok(automaton)
    }
}
