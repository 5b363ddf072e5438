//! Regular expression extraction by state elimination.

use crate::automaton::{Automaton, AutomatonTransition, StateId};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::regexp::{Operator, RegexNode};

/// Depth of the optimisation applied to each bypass label.
const BYPASS_OPTIMISE_DEPTH: usize = 1;

/// Make sure the automaton has exactly one final state with no outgoing
/// transitions.
///
/// Returns `None` if it already does, or if no state is final (the language
/// is empty and there is nothing to isolate).
pub fn isolate_final_state(automaton: &mut Automaton) -> Option<Command> {
    let finals = automaton.final_states();
    let needs_isolation = match finals.as_slice() {
        [] => false,
        [only] => automaton.has_outgoing(only.id()),
        _ => true,
    };
    if !needs_isolation {
        return None;
    }

    let isolated = automaton.create_new_state().with_final(true);
    let mut commands = vec![Command::AddState(isolated)];
    for old in &finals {
        commands.push(Command::set_final(automaton, old.id(), false));
        let t = automaton.create_new_transition(old.id(), isolated.id(), RegexNode::epsilon());
        commands.push(Command::AddTransition(t));
    }
    Some(Command::composite(
        format!("Isolate final state {}", isolated.id()),
        commands,
    ))
}

fn choice_of(labels: Vec<RegexNode>) -> Option<RegexNode> {
    if labels.is_empty() {
        None
    } else {
        Some(RegexNode::join(Operator::Choice, labels))
    }
}

/// Remove `state`, replacing each path `u -p-> state -q-> v` by a direct
/// transition `u -> v` labelled `p q`, or `p (l1|...|lk)* q` when `state`
/// has self-loops labelled `l1..lk`.
pub fn eliminate_state(automaton: &mut Automaton, state: StateId) -> Result<Command> {
    let Some(eliminated) = automaton.state(state) else {
        return Err(Error::illegal(format!("state {state} is not part of the automaton")));
    };
    if state == automaton.start_state_id() {
        return Err(Error::illegal("the start state cannot be eliminated"));
    }
    if eliminated.is_final() {
        return Err(Error::illegal(format!("final state {state} cannot be eliminated")));
    }

    let ingoing: Vec<AutomatonTransition> = automaton.ingoing(state).to_vec();
    let outgoing: Vec<AutomatonTransition> = automaton.outgoing(state).to_vec();
    let self_loop = choice_of(
        outgoing
            .iter()
            .filter(|t| t.to() == state)
            .map(|t| t.regex().clone())
            .collect(),
    )
    .map(RegexNode::star);

    let mut bypasses: Vec<(StateId, StateId, RegexNode)> = Vec::new();
    for t_in in ingoing.iter().filter(|t| t.from() != state) {
        for t_out in outgoing.iter().filter(|t| t.to() != state) {
            let mut operands = vec![t_in.regex().clone()];
            operands.extend(self_loop.clone());
            operands.push(t_out.regex().clone());
            let label = RegexNode::join(Operator::Sequence, operands)
                .optimise_to_depth(BYPASS_OPTIMISE_DEPTH);
            let bypass = (t_in.from(), t_out.to(), label);
            if !bypasses.contains(&bypass)
                && !automaton.has_transition_between(bypass.0, bypass.1, &bypass.2)
            {
                bypasses.push(bypass);
            }
        }
    }

    let mut commands = Vec::new();
    for (from, to, label) in bypasses {
        let t = automaton.create_new_transition(from, to, label);
        commands.push(Command::AddTransition(t));
    }
    for t in &ingoing {
        commands.push(Command::RemoveTransition(t.clone()));
    }
    // Self-loops were removed with the ingoing transitions.
    for t in outgoing.iter().filter(|t| t.to() != state) {
        commands.push(Command::RemoveTransition(t.clone()));
    }
    commands.push(Command::RemoveState(eliminated));

    Ok(Command::composite(format!("Eliminate state {state}"), commands))
}

/// States that still have to be eliminated: everything except the start
/// state and final states.
pub fn eliminable_states(automaton: &Automaton) -> Vec<StateId> {
    let start = automaton.start_state_id();
    automaton
        .states()
        .filter(|s| s.id() != start && !s.is_final())
        .map(|s| s.id())
        .collect()
}

/// Read the expression off a fully eliminated automaton.
///
/// The automaton must consist of the start state plus at most one final
/// state without outgoing transitions. Returns `Ok(None)` when the language
/// is empty.
pub fn extracted_regex(automaton: &Automaton) -> Result<Option<RegexNode>> {
    if !eliminable_states(automaton).is_empty() {
        return Err(Error::illegal("intermediate states have not been eliminated yet"));
    }
    let start = automaton.start_state_id();
    let finals = automaton.final_states();
    let loops = choice_of(
        automaton
            .outgoing(start)
            .iter()
            .filter(|t| t.to() == start)
            .map(|t| t.regex().clone())
            .collect(),
    )
    .map(RegexNode::star);

    let final_state = match finals.as_slice() {
        [] => return Ok(None),
        [only] => only.id(),
        _ => return Err(Error::illegal("the final state has not been isolated yet")),
    };
    if final_state == start {
        return Ok(Some(loops.unwrap_or_else(RegexNode::epsilon)));
    }
    if automaton.has_outgoing(final_state) {
        return Err(Error::illegal("the final state has not been isolated yet"));
    }

    let Some(body) = choice_of(
        automaton
            .outgoing(start)
            .iter()
            .filter(|t| t.to() == final_state)
            .map(|t| t.regex().clone())
            .collect(),
    ) else {
        return Ok(None);
    };
    Ok(Some(match loops {
        Some(loops) => RegexNode::join(Operator::Sequence, vec![loops, body]),
        None => body,
    }))
}
