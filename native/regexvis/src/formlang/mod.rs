//! Formal language transformations between regular expressions and automata.
//!
//! This module provides:
//! - Breakdown of compound transitions into epsilon-NFA fragments
//! - Epsilon closure computation and closure-equivalence merging
//! - Incremental subset construction (NFA to DFA conversion)
//! - State elimination (automaton to regular expression)
//!
//! Every transformation is produced as a [`Command`](crate::command::Command)
//! and changes nothing until it is executed.

mod breakdown;
mod epsilon_closure;
mod epsilon_removal;
mod state_elimination;
mod subset_construction;

pub use breakdown::{
    IsolationLevel, breakdown_choice, breakdown_iteration, breakdown_option, breakdown_sequence,
    create_breakdown_command, optimal_isolation_level,
};
pub use epsilon_closure::{EpsilonContext, epsilon_closure, epsilon_closure_of_set};
pub use epsilon_removal::{remove_epsilon_transitions, remove_equivalent_states};
pub use state_elimination::{
    eliminable_states, eliminate_state, extracted_regex, isolate_final_state,
};
pub use subset_construction::{
    NonDeterminismContext, has_non_determinism, is_deterministic, remove_non_determinism,
    remove_unreachable_state, unreachable_states,
};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::automaton::{Automaton, StateId};
    use crate::regexp::RegexNode;

    /// Build an automaton with states `0..n` and single-character edges,
    /// where `'ε'` marks an epsilon transition.
    pub fn build(n: u32, finals: &[StateId], edges: &[(StateId, char, StateId)]) -> Automaton {
        let mut automaton = Automaton::new();
        for _ in 1..n {
            let s = automaton.create_new_state();
            automaton.add_state(s);
        }
        for &f in finals {
            automaton.set_final(f, true);
        }
        for &(from, c, to) in edges {
            let t = automaton.create_new_transition(from, to, RegexNode::char(c));
            automaton.add_transition(t);
        }
        automaton
    }

    /// Every transition as a sorted `(from, to, label)` list.
    pub fn edges(automaton: &Automaton) -> Vec<(StateId, StateId, String)> {
        let mut out: Vec<_> = automaton
            .transitions()
            .map(|t| (t.from(), t.to(), t.regex().to_string()))
            .collect();
        out.sort();
        out
    }
}
