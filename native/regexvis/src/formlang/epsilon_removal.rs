//! Merging epsilon-equivalent states and removing epsilon transitions.

use crate::automaton::{Automaton, AutomatonTransition, StateId, StateSet};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::formlang::epsilon_closure::{EpsilonContext, epsilon_closure};
use crate::regexp::RegexNode;

/// Merge every other member of `state`'s equivalence class into `state`.
///
/// Transitions entering the class are redirected to `state`, transitions
/// leaving removed members now leave from `state`, and the removed members
/// are deleted. Redirected transitions that would duplicate an existing
/// transition (same endpoints and label) are dropped, as are epsilon
/// self-loops. If any removed member was final, `state` becomes final.
///
/// A class containing the start state can only be merged into the start
/// state.
pub fn remove_equivalent_states(
    automaton: &mut Automaton,
    ctx: &EpsilonContext,
    state: StateId,
) -> Result<Command> {
    if !automaton.has_state(state) {
        return Err(Error::illegal(format!("state {state} is not part of the automaton")));
    }
    let Some(class) = ctx.equivalent_states(state) else {
        return Err(Error::illegal(format!("state {state} has no equivalence class")));
    };
    let class: StateSet = class.iter().filter(|&s| automaton.has_state(s)).collect();
    let start = automaton.start_state_id();
    if class.contains(start) && state != start {
        return Err(Error::illegal(format!(
            "states equivalent to the start state must be merged into it, not into {state}"
        )));
    }
    let removed: Vec<StateId> = class.iter().filter(|&s| s != state).collect();
    if removed.is_empty() {
        return Err(Error::illegal(format!("state {state} has no equivalent states to merge")));
    }
    let is_removed = |s: StateId| s != state && class.contains(s);

    // Every transition touching a removed member, in graph order.
    let mut touched: Vec<AutomatonTransition> = Vec::new();
    for (_, outgoing) in automaton.graph_iter() {
        for t in outgoing {
            if is_removed(t.to()) || is_removed(t.from()) {
                touched.push(t.clone());
            }
        }
    }

    let mut commands = Vec::new();
    // Ingoing transitions of removed members first, then the remaining
    // outgoing ones, so no transition is removed twice.
    for t in touched.iter().filter(|t| is_removed(t.to())) {
        commands.push(Command::RemoveTransition(t.clone()));
    }
    for t in touched.iter().filter(|t| !is_removed(t.to())) {
        commands.push(Command::RemoveTransition(t.clone()));
    }
    for &s in &removed {
        if let Some(member) = automaton.state(s) {
            commands.push(Command::RemoveState(member));
        }
    }

    // Redirected copies, sorted by source then label so duplicates sit
    // next to each other.
    let mut redirected: Vec<(StateId, StateId, RegexNode)> = touched
        .iter()
        .map(|t| {
            let from = if is_removed(t.from()) { state } else { t.from() };
            let to = if class.contains(t.to()) { state } else { t.to() };
            (from, to, t.regex().clone())
        })
        .filter(|(from, to, regex)| !(from == to && regex.is_epsilon()))
        .collect();
    redirected.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.cmp(&b.2)).then_with(|| a.1.cmp(&b.1)));
    redirected.dedup();

    for (from, to, regex) in redirected {
        if automaton.has_transition_between(from, to, &regex) {
            continue;
        }
        let t = automaton.create_new_transition(from, to, regex);
        commands.push(Command::AddTransition(t));
    }

    if !automaton.is_final(state) && removed.iter().any(|&s| automaton.is_final(s)) {
        commands.push(Command::set_final(automaton, state, true));
    }

    log::trace!("merging {removed:?} into {state}");
    Ok(Command::composite(
        format!("Merge states equivalent to {state}"),
        commands,
    ))
}

/// Replace the outgoing epsilon transitions of `state`.
///
/// Every non-epsilon transition leaving a member of the epsilon closure of
/// `state` is copied to leave from `state` instead, and `state` becomes
/// final if any closure member is final.
pub fn remove_epsilon_transitions(automaton: &mut Automaton, state: StateId) -> Result<Command> {
    if !automaton.has_state(state) {
        return Err(Error::illegal(format!("state {state} is not part of the automaton")));
    }
    let epsilons: Vec<AutomatonTransition> = automaton
        .outgoing(state)
        .iter()
        .filter(|t| t.is_epsilon())
        .cloned()
        .collect();
    if epsilons.is_empty() {
        return Err(Error::illegal(format!(
            "state {state} has no outgoing epsilon transitions"
        )));
    }

    let closure = epsilon_closure(automaton, state);
    let mut commands: Vec<Command> = epsilons.into_iter().map(Command::RemoveTransition).collect();

    let mut copies: Vec<(StateId, RegexNode)> = Vec::new();
    for member in closure.iter().filter(|&s| s != state) {
        for t in automaton.outgoing(member).iter().filter(|t| !t.is_epsilon()) {
            let copy = (t.to(), t.regex().clone());
            if !automaton.has_transition_between(state, copy.0, &copy.1) && !copies.contains(&copy) {
                copies.push(copy);
            }
        }
    }
    for (to, regex) in copies {
        let t = automaton.create_new_transition(state, to, regex);
        commands.push(Command::AddTransition(t));
    }

    if !automaton.is_final(state) && closure.iter().any(|s| automaton.is_final(s)) {
        commands.push(Command::set_final(automaton, state, true));
    }

    Ok(Command::composite(
        format!("Remove epsilon transitions from state {state}"),
        commands,
    ))
}
