//! Epsilon closures, closure-equivalence classes, and word simulation.

use std::collections::HashMap;

use crate::automaton::{Automaton, StateId, StateSet};

fn capacity(automaton: &Automaton) -> usize {
    automaton.next_state_id() as usize
}

/// States reachable from `state` using only epsilon transitions, including
/// `state` itself.
pub fn epsilon_closure(automaton: &Automaton, state: StateId) -> StateSet {
    let mut closure = StateSet::with_capacity(capacity(automaton));
    extend_closure(automaton, &mut closure, vec![state]);
    closure
}

/// Epsilon closure of a set of states.
pub fn epsilon_closure_of_set(automaton: &Automaton, states: &StateSet) -> StateSet {
    let mut closure = StateSet::with_capacity(capacity(automaton));
    extend_closure(automaton, &mut closure, states.iter().collect());
    closure
}

fn extend_closure(automaton: &Automaton, closure: &mut StateSet, mut stack: Vec<StateId>) {
    while let Some(s) = stack.pop() {
        if !closure.insert(s) {
            continue;
        }
        for t in automaton.outgoing(s) {
            if t.is_epsilon() && !closure.contains(t.to()) {
                stack.push(t.to());
            }
        }
    }
}

/// Epsilon closures of every state, and the partition of states into
/// classes with identical closures.
///
/// Two states share a class exactly when each is epsilon-reachable from the
/// other. The partition is computed once, against the automaton as it was
/// when the context was built.
#[derive(Debug, Clone)]
pub struct EpsilonContext {
    closures: HashMap<StateId, StateSet>,
    classes: Vec<StateSet>,
}

impl EpsilonContext {
    pub fn new(automaton: &Automaton) -> Self {
        let mut closures = HashMap::with_capacity(automaton.state_count());
        let mut todo = Vec::with_capacity(automaton.state_count());
        for state in automaton.states() {
            closures.insert(state.id(), epsilon_closure(automaton, state.id()));
            todo.push(state.id());
        }

        // Greedy partition: take the first unclassified state and every
        // other unclassified state sharing its closure.
        let mut classes = Vec::new();
        while let Some(&first) = todo.first() {
            let closure = &closures[&first];
            let class: StateSet = todo
                .iter()
                .copied()
                .filter(|s| &closures[s] == closure)
                .collect();
            todo.retain(|s| !class.contains(*s));
            classes.push(class);
        }
        log::trace!("epsilon classes: {classes:?}");

        Self { closures, classes }
    }

    pub fn closure(&self, state: StateId) -> Option<&StateSet> {
        self.closures.get(&state)
    }

    pub fn classes(&self) -> &[StateSet] {
        &self.classes
    }

    /// The class containing `state`, if the state was known at construction.
    pub fn equivalent_states(&self, state: StateId) -> Option<&StateSet> {
        self.classes.iter().find(|class| class.contains(state))
    }

    /// True if another member of `state`'s class is still in the automaton.
    pub fn equivalent_states_exist(&self, automaton: &Automaton, state: StateId) -> bool {
        self.equivalent_states(state)
            .is_some_and(|class| class.iter().any(|s| s != state && automaton.has_state(s)))
    }

    pub fn are_states_equivalent(&self, a: StateId, b: StateId) -> bool {
        self.equivalent_states(a)
            .is_some_and(|class| class.contains(b))
    }
}

impl Automaton {
    /// Run `word` through the automaton.
    ///
    /// Returns `None` if some transition carries a compound expression, since
    /// those cannot be stepped one symbol at a time. The epsilon symbol in
    /// `word` is ignored.
    pub fn simulate(&self, word: &str) -> Option<bool> {
        if self
            .transitions()
            .any(|t| !t.regex().is_epsilon() && !t.regex().is_symbol())
        {
            return None;
        }

        let mut current =
            epsilon_closure_of_set(self, &StateSet::singleton(self.start_state_id(), capacity(self)));
        for c in word.chars().filter(|&c| !crate::regexp::is_epsilon(c)) {
            let mut next = StateSet::with_capacity(capacity(self));
            for s in current.iter() {
                for t in self.outgoing(s) {
                    if t.regex().char_value() == Some(c) && t.regex().is_symbol() {
                        next.insert(t.to());
                    }
                }
            }
            current = epsilon_closure_of_set(self, &next);
            if current.is_empty() {
                return Some(false);
            }
        }
        Some(current.iter().any(|s| self.is_final(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formlang::test_support::build;
    use crate::regexp::RegexNode;

    #[test]
    fn test_epsilon_closure_chain() {
        // 0 -ε-> 1 -ε-> 2, 2 -a-> 3
        let automaton = build(4, &[], &[(0, 'ε', 1), (1, 'ε', 2), (2, 'a', 3)]);
        assert_eq!(epsilon_closure(&automaton, 0).to_vec(), vec![0, 1, 2]);
        assert_eq!(epsilon_closure(&automaton, 2).to_vec(), vec![2]);
        assert_eq!(epsilon_closure(&automaton, 3).to_vec(), vec![3]);
    }

    #[test]
    fn test_equivalence_classes() {
        // 1 and 2 reach each other on epsilon; 0 reaches both but not back.
        let automaton = build(4, &[], &[(0, 'ε', 1), (1, 'ε', 2), (2, 'ε', 1), (2, 'a', 3)]);
        let ctx = EpsilonContext::new(&automaton);
        assert_eq!(ctx.classes().len(), 3);
        assert!(ctx.are_states_equivalent(1, 2));
        assert!(!ctx.are_states_equivalent(0, 1));
        assert_eq!(ctx.equivalent_states(2).unwrap().to_vec(), vec![1, 2]);
        assert!(ctx.equivalent_states_exist(&automaton, 1));
        assert!(!ctx.equivalent_states_exist(&automaton, 0));
        assert!(ctx.equivalent_states(99).is_none());
    }

    #[test]
    fn test_equivalent_states_exist_ignores_removed_states() {
        let mut automaton = build(3, &[], &[(1, 'ε', 2), (2, 'ε', 1)]);
        let ctx = EpsilonContext::new(&automaton);
        let ids: Vec<_> = automaton.outgoing(1).iter().chain(automaton.outgoing(2)).map(|t| t.id()).collect();
        for id in ids {
            automaton.remove_transition(id);
        }
        automaton.remove_state(2);
        assert!(!ctx.equivalent_states_exist(&automaton, 1));
    }

    #[test]
    fn test_simulate() {
        // (ab)*: 0 -a-> 1 -b-> 0, 0 final
        let automaton = build(2, &[0], &[(0, 'a', 1), (1, 'b', 0)]);
        assert_eq!(automaton.simulate(""), Some(true));
        assert_eq!(automaton.simulate("ab"), Some(true));
        assert_eq!(automaton.simulate("aba"), Some(false));
        assert_eq!(automaton.simulate("b"), Some(false));
    }

    #[test]
    fn test_simulate_follows_epsilon() {
        let automaton = build(3, &[2], &[(0, 'ε', 1), (1, 'a', 2)]);
        assert_eq!(automaton.simulate("a"), Some(true));
        assert_eq!(automaton.simulate(""), Some(false));
    }

    #[test]
    fn test_simulate_rejects_compound_labels() {
        let mut automaton = Automaton::new();
        let t = automaton.create_new_transition(0, 0, RegexNode::star(RegexNode::char('a')));
        automaton.add_transition(t);
        assert_eq!(automaton.simulate("a"), None);
    }
}
