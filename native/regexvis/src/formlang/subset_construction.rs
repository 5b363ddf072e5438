//! Incremental, reversible subset construction.
//!
//! Instead of building a fresh DFA, each step resolves one ambiguous symbol
//! of one state: the transitions sharing that symbol are replaced by a single
//! transition to a state standing for the whole set of destinations. The
//! [`NonDeterminismContext`] remembers which set each synthesized state
//! stands for, so later steps reuse it instead of creating duplicates.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::automaton::{Automaton, AutomatonTransition, StateId, StateSet};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::regexp::RegexNode;

/// Bindings from states to the set of original states they stand for.
///
/// A state without a binding stands for itself. Bindings of states that are
/// not currently in the automaton are ignored by lookups, so undoing and
/// redoing the command that created a state keeps its binding meaningful.
#[derive(Debug, Clone, Default)]
pub struct NonDeterminismContext {
    bindings: IndexMap<StateId, StateSet>,
}

impl NonDeterminismContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_state_binding(&mut self, state: StateId, set: StateSet) {
        self.bindings.insert(state, set);
    }

    pub fn lookup_state_binding(&self, state: StateId) -> Option<&StateSet> {
        self.bindings.get(&state)
    }

    pub fn remove_state_binding(&mut self, state: StateId) -> Option<StateSet> {
        self.bindings.shift_remove(&state)
    }

    /// Union of what every state in `states` stands for.
    pub fn reachable_to_set(&self, states: &StateSet) -> StateSet {
        let mut out = StateSet::default();
        for state in states.iter() {
            match self.bindings.get(&state) {
                Some(bound) => out.union_with(bound),
                None => {
                    out.insert(state);
                }
            }
        }
        out
    }

    /// A state of `automaton` standing for exactly `set`, if there is one.
    pub fn find_state_from_set(&self, automaton: &Automaton, set: &StateSet) -> Option<StateId> {
        if let Some((&state, _)) = self
            .bindings
            .iter()
            .find(|(state, bound)| *bound == set && automaton.has_state(**state))
        {
            return Some(state);
        }
        // An unbound state stands for itself.
        let mut members = set.iter();
        match (members.next(), members.next()) {
            (Some(only), None)
                if automaton.has_state(only) && !self.bindings.contains_key(&only) =>
            {
                Some(only)
            }
            _ => None,
        }
    }
}

fn check_symbols(automaton: &Automaton, state: StateId) -> Result<()> {
    match automaton.outgoing(state).iter().find(|t| !t.regex().is_symbol()) {
        Some(t) => Err(Error::illegal(format!(
            "transition {} from state {state} is labelled {}, expected a single symbol",
            t.id(),
            t.regex()
        ))),
        None => Ok(()),
    }
}

/// The first symbol (in outgoing order) that leaves `state` more than once.
fn ambiguous_symbol(automaton: &Automaton, state: StateId) -> Option<RegexNode> {
    let outgoing = automaton.outgoing(state);
    outgoing.iter().enumerate().find_map(|(i, t)| {
        outgoing[i + 1..]
            .iter()
            .any(|other| other.regex() == t.regex())
            .then(|| t.regex().clone())
    })
}

/// True if `state` has two outgoing transitions on the same symbol.
pub fn has_non_determinism(automaton: &Automaton, state: StateId) -> bool {
    ambiguous_symbol(automaton, state).is_some()
}

/// Resolve one ambiguous symbol leaving `state`.
///
/// Every outgoing label of `state` must be a single symbol (no epsilon, no
/// compound expression). Returns `Ok(None)` if `state` is already
/// deterministic.
pub fn remove_non_determinism(
    automaton: &mut Automaton,
    ctx: &mut NonDeterminismContext,
    state: StateId,
) -> Result<Option<Command>> {
    if !automaton.has_state(state) {
        return Err(Error::illegal(format!("state {state} is not part of the automaton")));
    }
    check_symbols(automaton, state)?;
    let Some(symbol) = ambiguous_symbol(automaton, state) else {
        return Ok(None);
    };

    let ambiguous: Vec<AutomatonTransition> = automaton
        .outgoing(state)
        .iter()
        .filter(|t| t.regex() == &symbol)
        .cloned()
        .collect();
    let targets: StateSet = ambiguous.iter().map(AutomatonTransition::to).collect();
    let reachable = ctx.reachable_to_set(&targets);

    let mut commands: Vec<Command> = ambiguous
        .iter()
        .cloned()
        .map(Command::RemoveTransition)
        .collect();

    let destination = match ctx.find_state_from_set(automaton, &reachable) {
        Some(existing) => existing,
        None => {
            let merged = automaton
                .create_new_state()
                .with_final(targets.iter().any(|s| automaton.is_final(s)));
            commands.push(Command::AddState(merged));

            let mut copies: Vec<(StateId, RegexNode)> = Vec::new();
            for target in targets.iter() {
                for t in automaton.outgoing(target) {
                    let copy = (t.to(), t.regex().clone());
                    if !copies.contains(&copy) {
                        copies.push(copy);
                    }
                }
            }
            for (to, regex) in copies {
                let t = automaton.create_new_transition(merged.id(), to, regex);
                commands.push(Command::AddTransition(t));
            }
            log::trace!("state {} stands for {reachable:?}", merged.id());
            ctx.put_state_binding(merged.id(), reachable);
            merged.id()
        }
    };

    let resolved = automaton.create_new_transition(state, destination, symbol.clone());
    commands.push(Command::AddTransition(resolved));

    Ok(Some(Command::composite(
        format!("Remove non-determinism on {symbol} from state {state}"),
        commands,
    )))
}

/// States that cannot be reached from the start state, in id order.
pub fn unreachable_states(automaton: &Automaton) -> Vec<StateId> {
    let mut seen = StateSet::with_capacity(automaton.next_state_id() as usize);
    let mut queue = VecDeque::from([automaton.start_state_id()]);
    while let Some(s) = queue.pop_front() {
        if !seen.insert(s) {
            continue;
        }
        for t in automaton.outgoing(s) {
            if !seen.contains(t.to()) {
                queue.push_back(t.to());
            }
        }
    }
    automaton
        .states()
        .map(|s| s.id())
        .filter(|&s| !seen.contains(s))
        .collect()
}

/// Remove an unreachable state together with every transition touching it.
pub fn remove_unreachable_state(automaton: &Automaton, state: StateId) -> Result<Command> {
    let Some(removed) = automaton.state(state) else {
        return Err(Error::illegal(format!("state {state} is not part of the automaton")));
    };
    if !unreachable_states(automaton).contains(&state) {
        return Err(Error::illegal(format!("state {state} is reachable from the start state")));
    }

    let mut commands: Vec<Command> = Vec::new();
    for t in automaton.ingoing(state) {
        commands.push(Command::RemoveTransition(t.clone()));
    }
    // Self-loops were already removed as ingoing transitions.
    for t in automaton.outgoing(state).iter().filter(|t| t.to() != state) {
        commands.push(Command::RemoveTransition(t.clone()));
    }
    commands.push(Command::RemoveState(removed));

    Ok(Command::composite(
        format!("Remove unreachable state {state}"),
        commands,
    ))
}

/// True if no transition is epsilon or compound and no state has two
/// outgoing transitions on the same symbol.
pub fn is_deterministic(automaton: &Automaton) -> bool {
    automaton.transitions().all(|t| t.regex().is_symbol())
        && automaton
            .states()
            .all(|s| !has_non_determinism(automaton, s.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formlang::test_support::{build, edges};

    #[test]
    fn test_context_bindings() {
        let automaton = build(3, &[], &[]);
        let mut ctx = NonDeterminismContext::new();
        let set: StateSet = [1, 2].into_iter().collect();

        assert_eq!(ctx.reachable_to_set(&StateSet::singleton(0, 3)).to_vec(), vec![0]);
        assert_eq!(ctx.find_state_from_set(&automaton, &StateSet::singleton(1, 3)), Some(1));
        assert_eq!(ctx.find_state_from_set(&automaton, &set), None);

        ctx.put_state_binding(2, set.clone());
        assert_eq!(ctx.lookup_state_binding(2), Some(&set));
        assert_eq!(ctx.find_state_from_set(&automaton, &set), Some(2));
        // State 2 now stands for {1, 2}, not for itself.
        assert_eq!(ctx.find_state_from_set(&automaton, &StateSet::singleton(2, 3)), None);
        let both: StateSet = [0, 2].into_iter().collect();
        assert_eq!(ctx.reachable_to_set(&both).to_vec(), vec![0, 1, 2]);

        assert_eq!(ctx.remove_state_binding(2), Some(set));
        assert!(ctx.lookup_state_binding(2).is_none());
    }

    #[test]
    fn test_binding_of_missing_state_is_ignored() {
        let automaton = build(2, &[], &[]);
        let mut ctx = NonDeterminismContext::new();
        let set: StateSet = [0, 1].into_iter().collect();
        ctx.put_state_binding(7, set.clone());
        assert_eq!(ctx.find_state_from_set(&automaton, &set), None);
    }

    #[test]
    fn test_resolve_ambiguous_symbol() {
        // 0 -a-> 1(final), 0 -a-> 2, 2 -b-> 1
        let mut automaton = build(3, &[1], &[(0, 'a', 1), (0, 'a', 2), (2, 'b', 1)]);
        let mut ctx = NonDeterminismContext::new();
        assert!(!is_deterministic(&automaton));

        let command = remove_non_determinism(&mut automaton, &mut ctx, 0)
            .unwrap()
            .unwrap();
        command.redo(&mut automaton);
        let merged = command.added_states()[0];
        assert!(merged.is_final());
        assert_eq!(
            edges(&automaton),
            vec![
                (0, merged.id(), "a".into()),
                (2, 1, "b".into()),
                (merged.id(), 1, "b".into()),
            ]
        );
        assert_eq!(ctx.lookup_state_binding(merged.id()).unwrap().to_vec(), vec![1, 2]);
        assert!(remove_non_determinism(&mut automaton, &mut ctx, 0).unwrap().is_none());
        assert_eq!(unreachable_states(&automaton), vec![2]);
    }

    #[test]
    fn test_resolution_reuses_bound_state() {
        // Self-loop case: 0 -a-> 0, 0 -a-> 1(final)
        let mut automaton = build(2, &[1], &[(0, 'a', 0), (0, 'a', 1)]);
        let mut ctx = NonDeterminismContext::new();
        let mut steps = 0;
        loop {
            let mut changed = false;
            let states: Vec<StateId> = automaton.states().map(|s| s.id()).collect();
            for s in states {
                if let Some(command) = remove_non_determinism(&mut automaton, &mut ctx, s).unwrap() {
                    command.redo(&mut automaton);
                    changed = true;
                    steps += 1;
                }
            }
            if !changed {
                break;
            }
        }
        assert_eq!(steps, 2);
        assert!(is_deterministic(&automaton));
        for (word, expected) in [("", false), ("a", true), ("aa", true), ("aaa", true)] {
            assert_eq!(automaton.simulate(word), Some(expected), "{word}");
        }
    }

    #[test]
    fn test_rejects_epsilon_labels() {
        let mut automaton = build(2, &[], &[(0, 'ε', 1), (0, 'ε', 1)]);
        let mut ctx = NonDeterminismContext::new();
        assert!(remove_non_determinism(&mut automaton, &mut ctx, 0).is_err());
    }

    #[test]
    fn test_remove_unreachable_state() {
        // 2 is unreachable and has a self-loop and an edge into 1.
        let mut automaton = build(3, &[], &[(0, 'a', 1), (2, 'b', 2), (2, 'c', 1)]);
        assert_eq!(unreachable_states(&automaton), vec![2]);
        assert!(remove_unreachable_state(&automaton, 1).is_err());

        let command = remove_unreachable_state(&automaton, 2).unwrap();
        command.redo(&mut automaton);
        assert!(!automaton.has_state(2));
        assert_eq!(edges(&automaton), vec![(0, 1, "a".into())]);

        command.undo(&mut automaton);
        assert_eq!(automaton.transition_count(), 3);
    }
}
