//! Mutable labelled multigraph backing an automaton.

use std::collections::{BTreeMap, HashMap};

use crate::automaton::state::{AutomatonState, StateId};
use crate::regexp::RegexNode;

/// A transition identifier. Transitions and states use separate id spaces.
pub type TransitionId = u32;

/// The id the start state of every automaton is created with.
pub const START_STATE_ID: StateId = 0;

/// A transition between two states, labelled with a regular expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomatonTransition {
    id: TransitionId,
    from: StateId,
    to: StateId,
    regex: RegexNode,
}

impl AutomatonTransition {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn from(&self) -> StateId {
        self.from
    }

    pub fn to(&self) -> StateId {
        self.to
    }

    pub fn regex(&self) -> &RegexNode {
        &self.regex
    }

    /// True if this transition is labelled with epsilon only.
    pub fn is_epsilon(&self) -> bool {
        self.regex.is_epsilon()
    }
}

#[derive(Debug, Clone)]
struct StateEntry {
    is_final: bool,
    /// Outgoing transitions in insertion order.
    outgoing: Vec<AutomatonTransition>,
}

/// A finite automaton whose transitions carry regular expressions.
///
/// The automaton stores states and transitions but performs no reference
/// validation: adding a transition whose endpoints are missing, or removing a
/// state that still has transitions, is the caller's responsibility to avoid.
/// All edits are expected to go through [`Command`](crate::command::Command)s,
/// which order their primitive edits so the graph stays consistent.
///
/// Ids come from two monotonic counters owned by the automaton and are never
/// reused, so replaying history always refers to the same objects. States
/// are kept in id order, which makes undo restore the original ordering.
#[derive(Debug, Clone)]
pub struct Automaton {
    start_state: StateId,
    states: BTreeMap<StateId, StateEntry>,
    ingoing: HashMap<StateId, Vec<AutomatonTransition>>,
    transitions: HashMap<TransitionId, AutomatonTransition>,
    next_state_id: StateId,
    next_transition_id: TransitionId,
}

impl Automaton {
    /// Create an automaton containing only its (non-final) start state.
    pub fn new() -> Self {
        Self::with_start_state(START_STATE_ID, false)
    }

    pub(crate) fn with_start_state(start_state: StateId, is_final: bool) -> Self {
        let mut states = BTreeMap::new();
        states.insert(
            start_state,
            StateEntry {
                is_final,
                outgoing: Vec::new(),
            },
        );
        Self {
            start_state,
            states,
            ingoing: HashMap::new(),
            transitions: HashMap::new(),
            next_state_id: start_state + 1,
            next_transition_id: 0,
        }
    }

    /// Allocate a new, non-final state. It is not part of the graph until it
    /// is added with [`Automaton::add_state`].
    pub fn create_new_state(&mut self) -> AutomatonState {
        let id = self.next_state_id;
        self.next_state_id += 1;
        AutomatonState::new(id, false)
    }

    /// Allocate a new transition. It is not part of the graph until it is
    /// added with [`Automaton::add_transition`].
    pub fn create_new_transition(
        &mut self,
        from: StateId,
        to: StateId,
        regex: RegexNode,
    ) -> AutomatonTransition {
        let id = self.next_transition_id;
        self.next_transition_id += 1;
        AutomatonTransition {
            id,
            from,
            to,
            regex,
        }
    }

    pub fn add_state(&mut self, state: AutomatonState) {
        log::trace!("add state {state}");
        self.states.insert(
            state.id(),
            StateEntry {
                is_final: state.is_final(),
                outgoing: Vec::new(),
            },
        );
    }

    /// Remove a state from the graph. The start state is never removed.
    pub fn remove_state(&mut self, id: StateId) {
        if id == self.start_state {
            log::warn!("ignoring request to remove start state {id}");
            return;
        }
        log::trace!("remove state {id}");
        self.states.remove(&id);
        if self.ingoing.get(&id).is_some_and(Vec::is_empty) {
            self.ingoing.remove(&id);
        }
    }

    pub fn add_transition(&mut self, transition: AutomatonTransition) {
        log::trace!(
            "add transition {} ({} -> {}, {})",
            transition.id,
            transition.from,
            transition.to,
            transition.regex
        );
        match self.states.get_mut(&transition.from) {
            Some(entry) => entry.outgoing.push(transition.clone()),
            None => log::warn!(
                "transition {} added from missing state {}",
                transition.id,
                transition.from
            ),
        }
        self.ingoing
            .entry(transition.to)
            .or_default()
            .push(transition.clone());
        self.transitions.insert(transition.id, transition);
    }

    pub fn remove_transition(&mut self, id: TransitionId) {
        let Some(transition) = self.transitions.remove(&id) else {
            log::warn!("ignoring request to remove missing transition {id}");
            return;
        };
        log::trace!("remove transition {id}");
        if let Some(entry) = self.states.get_mut(&transition.from) {
            entry.outgoing.retain(|t| t.id != id);
        }
        if let Some(ingoing) = self.ingoing.get_mut(&transition.to) {
            ingoing.retain(|t| t.id != id);
            if ingoing.is_empty() {
                self.ingoing.remove(&transition.to);
            }
        }
    }

    pub fn set_final(&mut self, id: StateId, is_final: bool) {
        if let Some(entry) = self.states.get_mut(&id) {
            log::trace!("set state {id} final = {is_final}");
            entry.is_final = is_final;
        }
    }

    pub fn start_state(&self) -> AutomatonState {
        self.state(self.start_state)
            .unwrap_or_else(|| AutomatonState::new(self.start_state, false))
    }

    pub fn start_state_id(&self) -> StateId {
        self.start_state
    }

    pub fn state(&self, id: StateId) -> Option<AutomatonState> {
        self.states
            .get(&id)
            .map(|entry| AutomatonState::new(id, entry.is_final))
    }

    pub fn has_state(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn is_final(&self, id: StateId) -> bool {
        self.states.get(&id).is_some_and(|entry| entry.is_final)
    }

    /// All states, in id order (which is creation order).
    pub fn states(&self) -> impl Iterator<Item = AutomatonState> + '_ {
        self.states
            .iter()
            .map(|(&id, entry)| AutomatonState::new(id, entry.is_final))
    }

    pub fn final_states(&self) -> Vec<AutomatonState> {
        self.states().filter(AutomatonState::is_final).collect()
    }

    /// Outgoing transitions of a state, in insertion order.
    pub fn outgoing(&self, id: StateId) -> &[AutomatonTransition] {
        self.states
            .get(&id)
            .map(|entry| entry.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Ingoing transitions of a state.
    pub fn ingoing(&self, id: StateId) -> &[AutomatonTransition] {
        self.ingoing.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_outgoing(&self, id: StateId) -> bool {
        !self.outgoing(id).is_empty()
    }

    /// Iterate over every state together with its outgoing transitions.
    pub fn graph_iter(&self) -> impl Iterator<Item = (AutomatonState, &[AutomatonTransition])> + '_ {
        self.states.iter().map(|(&id, entry)| {
            (
                AutomatonState::new(id, entry.is_final),
                entry.outgoing.as_slice(),
            )
        })
    }

    /// Every transition, grouped by source state.
    pub fn transitions(&self) -> impl Iterator<Item = &AutomatonTransition> + '_ {
        self.states.values().flat_map(|entry| entry.outgoing.iter())
    }

    pub fn transition(&self, id: TransitionId) -> Option<&AutomatonTransition> {
        self.transitions.get(&id)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// True if a transition `from -> to` labelled exactly `regex` exists.
    pub fn has_transition_between(&self, from: StateId, to: StateId, regex: &RegexNode) -> bool {
        self.outgoing(from)
            .iter()
            .any(|t| t.to == to && &t.regex == regex)
    }

    pub fn next_state_id(&self) -> StateId {
        self.next_state_id
    }

    pub fn next_transition_id(&self) -> TransitionId {
        self.next_transition_id
    }

    pub(crate) fn reserve_ids(&mut self, next_state_id: StateId, next_transition_id: TransitionId) {
        self.next_state_id = self.next_state_id.max(next_state_id);
        self.next_transition_id = self.next_transition_id.max(next_transition_id);
    }

    pub(crate) fn build_transition(
        id: TransitionId,
        from: StateId,
        to: StateId,
        regex: RegexNode,
    ) -> AutomatonTransition {
        AutomatonTransition {
            id,
            from,
            to,
            regex,
        }
    }
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}
