//! Regular expression to NFA expansion.
//!
//! Each breakdown replaces one transition whose label is a compound
//! expression by a small fragment of simpler transitions accepting the same
//! language. Repeating this until every label is a single character (or
//! epsilon) yields an epsilon-NFA.

use crate::automaton::{Automaton, AutomatonTransition, StateId};
use crate::command::Command;
use crate::config::IsolationPolicy;
use crate::error::{Error, Result};
use crate::regexp::{Operator, RegexNode};

/// How far an iteration breakdown separates its loop from the surrounding
/// graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    /// Loop directly between the original endpoints.
    None,
    /// Fresh state between `from` and the loop.
    StartIsolate,
    /// Fresh state between the loop and `to`.
    EndIsolate,
    /// Fresh states on both sides.
    FullyIsolate,
}

impl IsolationLevel {
    fn isolates_start(self) -> bool {
        matches!(self, IsolationLevel::StartIsolate | IsolationLevel::FullyIsolate)
    }

    fn isolates_end(self) -> bool {
        matches!(self, IsolationLevel::EndIsolate | IsolationLevel::FullyIsolate)
    }

    /// True if this level isolates at least every side `optimal` does.
    pub fn is_sufficient_for(self, optimal: IsolationLevel) -> bool {
        (self.isolates_start() || !optimal.isolates_start())
            && (self.isolates_end() || !optimal.isolates_end())
    }
}

/// The weakest isolation level that keeps the breakdown of `t` from leaking
/// into unrelated paths.
///
/// The start side needs isolating when `from` has other outgoing transitions,
/// the end side when `to` has other ingoing ones.
pub fn optimal_isolation_level(automaton: &Automaton, t: &AutomatonTransition) -> IsolationLevel {
    let start = automaton.outgoing(t.from()).iter().any(|o| o.id() != t.id());
    let end = automaton.ingoing(t.to()).iter().any(|i| i.id() != t.id());
    match (start, end) {
        (true, true) => IsolationLevel::FullyIsolate,
        (true, false) => IsolationLevel::StartIsolate,
        (false, true) => IsolationLevel::EndIsolate,
        (false, false) => IsolationLevel::None,
    }
}

fn check_present(automaton: &Automaton, t: &AutomatonTransition) -> Result<()> {
    match automaton.transition(t.id()) {
        Some(current) if current == t => Ok(()),
        _ => Err(Error::illegal(format!(
            "transition {} is not part of the automaton",
            t.id()
        ))),
    }
}

fn check_operator(t: &AutomatonTransition, expected: &[Operator], kind: &str) -> Result<()> {
    if expected.contains(&t.regex().operator()) {
        Ok(())
    } else {
        Err(Error::illegal(format!(
            "{kind} breakdown cannot be applied to {}",
            t.regex()
        )))
    }
}

fn description(t: &AutomatonTransition) -> String {
    format!("Break down {} on {} -> {}", t.regex(), t.from(), t.to())
}

/// `r1|...|rn` becomes `n` parallel transitions.
pub fn breakdown_choice(automaton: &mut Automaton, t: &AutomatonTransition) -> Result<Command> {
    check_present(automaton, t)?;
    check_operator(t, &[Operator::Choice], "choice")?;

    let mut commands = vec![Command::RemoveTransition(t.clone())];
    for operand in t.regex().operands() {
        let added = automaton.create_new_transition(t.from(), t.to(), operand.clone());
        commands.push(Command::AddTransition(added));
    }
    Ok(Command::composite(description(t), commands))
}

/// `r1...rn` becomes a chain through `n - 1` fresh states.
pub fn breakdown_sequence(automaton: &mut Automaton, t: &AutomatonTransition) -> Result<Command> {
    check_present(automaton, t)?;
    check_operator(t, &[Operator::Sequence], "sequence")?;

    let operands = t.regex().operands();
    let mut commands = vec![Command::RemoveTransition(t.clone())];

    let mut chain: Vec<StateId> = Vec::with_capacity(operands.len() + 1);
    chain.push(t.from());
    for _ in 1..operands.len() {
        let state = automaton.create_new_state();
        commands.push(Command::AddState(state));
        chain.push(state.id());
    }
    chain.push(t.to());

    for (operand, pair) in operands.iter().zip(chain.windows(2)) {
        let added = automaton.create_new_transition(pair[0], pair[1], operand.clone());
        commands.push(Command::AddTransition(added));
    }
    Ok(Command::composite(description(t), commands))
}

/// `r*` or `r+` becomes a loop, isolated from the endpoints as `level` asks.
///
/// Fails with [`Error::IllegalArgument`] if `level` does not isolate every
/// side [`optimal_isolation_level`] requires.
pub fn breakdown_iteration(
    automaton: &mut Automaton,
    t: &AutomatonTransition,
    level: IsolationLevel,
) -> Result<Command> {
    check_present(automaton, t)?;
    check_operator(t, &[Operator::Star, Operator::Plus], "iteration")?;
    let optimal = optimal_isolation_level(automaton, t);
    if !level.is_sufficient_for(optimal) {
        return Err(Error::illegal(format!(
            "isolation level {level:?} is insufficient, at least {optimal:?} is required"
        )));
    }
    let Some(body) = t.regex().operand() else {
        return Err(Error::illegal(format!("{} has no operand", t.regex())));
    };
    let is_star = t.regex().operator() == Operator::Star;
    let (from, to) = (t.from(), t.to());
    log::trace!("iteration breakdown of {} at {level:?}", t.regex());

    let mut commands = vec![Command::RemoveTransition(t.clone())];

    if level == IsolationLevel::None {
        // STAR: skip forwards, loop body backwards. PLUS: body forwards,
        // repeat backwards on epsilon.
        let (eps_from, eps_to) = if is_star { (from, to) } else { (to, from) };
        if !automaton.has_transition_between(eps_from, eps_to, &RegexNode::epsilon()) {
            let skip = automaton.create_new_transition(eps_from, eps_to, RegexNode::epsilon());
            commands.push(Command::AddTransition(skip));
        }
        let (body_from, body_to) = if is_star { (to, from) } else { (from, to) };
        let body = automaton.create_new_transition(body_from, body_to, body);
        commands.push(Command::AddTransition(body));
        return Ok(Command::composite(description(t), commands));
    }

    let start_isolated = level.isolates_start().then(|| automaton.create_new_state());
    let end_isolated = level.isolates_end().then(|| automaton.create_new_state());
    for state in start_isolated.iter().chain(end_isolated.iter()) {
        commands.push(Command::AddState(*state));
    }
    let loop_start = start_isolated.map_or(from, |s| s.id());
    let loop_end = end_isolated.map_or(to, |s| s.id());

    if let Some(state) = start_isolated {
        let enter = automaton.create_new_transition(from, state.id(), RegexNode::epsilon());
        commands.push(Command::AddTransition(enter));
    }
    if let Some(state) = end_isolated {
        let leave = automaton.create_new_transition(state.id(), to, RegexNode::epsilon());
        commands.push(Command::AddTransition(leave));
    }
    if is_star && !automaton.has_transition_between(from, to, &RegexNode::epsilon()) {
        let skip = automaton.create_new_transition(from, to, RegexNode::epsilon());
        commands.push(Command::AddTransition(skip));
    }
    let back = automaton.create_new_transition(loop_end, loop_start, RegexNode::epsilon());
    commands.push(Command::AddTransition(back));
    let body = automaton.create_new_transition(loop_start, loop_end, body);
    commands.push(Command::AddTransition(body));

    Ok(Command::composite(description(t), commands))
}

/// `r?` becomes `r` in parallel with an epsilon transition.
pub fn breakdown_option(automaton: &mut Automaton, t: &AutomatonTransition) -> Result<Command> {
    check_present(automaton, t)?;
    check_operator(t, &[Operator::Option], "option")?;
    let Some(body) = t.regex().operand() else {
        return Err(Error::illegal(format!("{} has no operand", t.regex())));
    };

    let mut commands = vec![Command::RemoveTransition(t.clone())];
    let body = automaton.create_new_transition(t.from(), t.to(), body);
    commands.push(Command::AddTransition(body));
    if !automaton.has_transition_between(t.from(), t.to(), &RegexNode::epsilon()) {
        let skip = automaton.create_new_transition(t.from(), t.to(), RegexNode::epsilon());
        commands.push(Command::AddTransition(skip));
    }
    Ok(Command::composite(description(t), commands))
}

/// Pick the breakdown matching the label of `t`.
///
/// Returns `Ok(None)` for labels that are already a single character.
pub fn create_breakdown_command(
    automaton: &mut Automaton,
    t: &AutomatonTransition,
    policy: IsolationPolicy,
) -> Result<Option<Command>> {
    let command = match t.regex().operator() {
        Operator::None => return Ok(None),
        Operator::Choice => breakdown_choice(automaton, t)?,
        Operator::Sequence => breakdown_sequence(automaton, t)?,
        Operator::Option => breakdown_option(automaton, t)?,
        Operator::Star | Operator::Plus => {
            let level = match policy {
                IsolationPolicy::Optimal => optimal_isolation_level(automaton, t),
                IsolationPolicy::Full => IsolationLevel::FullyIsolate,
            };
            breakdown_iteration(automaton, t, level)?
        }
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::AutomatonState;
    use crate::formlang::test_support::edges;
    use crate::regexp::parse;

    fn re(text: &str) -> RegexNode {
        parse(text).unwrap().unwrap()
    }

    /// start(0) -> end(1, final) on `label`.
    fn single(label: &str) -> (Automaton, AutomatonTransition) {
        let mut automaton = Automaton::new();
        let end = automaton.create_new_state().with_final(true);
        automaton.add_state(end);
        let t = automaton.create_new_transition(0, end.id(), re(label));
        automaton.add_transition(t.clone());
        (automaton, t)
    }

    fn e(from: StateId, to: StateId, label: &str) -> (StateId, StateId, String) {
        (from, to, label.to_string())
    }

    #[test]
    fn test_choice() {
        let (mut automaton, t) = single("a|b|cd");
        let command = breakdown_choice(&mut automaton, &t).unwrap();
        command.redo(&mut automaton);
        assert_eq!(automaton.state_count(), 2);
        assert_eq!(edges(&automaton), vec![e(0, 1, "a"), e(0, 1, "b"), e(0, 1, "cd")]);

        command.undo(&mut automaton);
        assert_eq!(edges(&automaton), vec![e(0, 1, "a|b|cd")]);
    }

    #[test]
    fn test_sequence() {
        let (mut automaton, t) = single("ab");
        let command = breakdown_sequence(&mut automaton, &t).unwrap();
        command.redo(&mut automaton);
        assert_eq!(automaton.state_count(), 3);
        assert_eq!(edges(&automaton), vec![e(0, 2, "a"), e(2, 1, "b")]);
    }

    #[test]
    fn test_sequence_of_three_adds_two_states() {
        let (mut automaton, t) = single("(a|b)c*d");
        let command = breakdown_sequence(&mut automaton, &t).unwrap();
        command.redo(&mut automaton);
        assert_eq!(automaton.state_count(), 4);
        assert_eq!(
            edges(&automaton),
            vec![e(0, 2, "a|b"), e(2, 3, "c*"), e(3, 1, "d")]
        );
        assert!(!automaton.is_final(2));
    }

    #[test]
    fn test_wrong_operator_is_rejected() {
        let (mut automaton, t) = single("ab");
        assert!(matches!(
            breakdown_choice(&mut automaton, &t),
            Err(Error::IllegalArgument(_))
        ));
        assert!(breakdown_iteration(&mut automaton, &t, IsolationLevel::FullyIsolate).is_err());
    }

    #[test]
    fn test_star_unisolated() {
        let (mut automaton, t) = single("a*");
        assert_eq!(optimal_isolation_level(&automaton, &t), IsolationLevel::None);
        let command = breakdown_iteration(&mut automaton, &t, IsolationLevel::None).unwrap();
        command.redo(&mut automaton);
        assert_eq!(automaton.state_count(), 2);
        assert_eq!(edges(&automaton), vec![e(0, 1, "ε"), e(1, 0, "a")]);
    }

    #[test]
    fn test_plus_unisolated() {
        let (mut automaton, t) = single("(ab)+");
        let command = breakdown_iteration(&mut automaton, &t, IsolationLevel::None).unwrap();
        command.redo(&mut automaton);
        assert_eq!(edges(&automaton), vec![e(0, 1, "ab"), e(1, 0, "ε")]);
    }

    #[test]
    fn test_star_with_existing_epsilon_skips_duplicate() {
        let (mut automaton, t) = single("a*");
        let eps = automaton.create_new_transition(0, 1, RegexNode::epsilon());
        automaton.add_transition(eps);
        // The extra epsilon makes `to` shared.
        assert_eq!(optimal_isolation_level(&automaton, &t), IsolationLevel::FullyIsolate);
        let command = breakdown_iteration(&mut automaton, &t, IsolationLevel::FullyIsolate).unwrap();
        command.redo(&mut automaton);
        let eps_count = automaton
            .outgoing(0)
            .iter()
            .filter(|t| t.to() == 1 && t.is_epsilon())
            .count();
        assert_eq!(eps_count, 1);
    }

    #[test]
    fn test_isolation_levels() {
        let (mut automaton, t) = single("a*");
        let other = automaton.create_new_state();
        automaton.add_state(other);
        let out = automaton.create_new_transition(0, other.id(), re("x"));
        automaton.add_transition(out);
        assert_eq!(optimal_isolation_level(&automaton, &t), IsolationLevel::StartIsolate);

        assert!(breakdown_iteration(&mut automaton, &t, IsolationLevel::None).is_err());
        assert!(breakdown_iteration(&mut automaton, &t, IsolationLevel::EndIsolate).is_err());
        let before = automaton.snapshot();

        let command = breakdown_iteration(&mut automaton, &t, IsolationLevel::StartIsolate).unwrap();
        command.redo(&mut automaton);
        let iso = command.added_states()[0].id();
        assert_eq!(
            edges(&automaton),
            vec![
                e(0, 1, "ε"),
                e(0, other.id(), "x"),
                e(0, iso, "ε"),
                e(1, iso, "ε"),
                e(iso, 1, "a"),
            ]
        );
        command.undo(&mut automaton);
        assert_eq!(automaton.snapshot().states, before.states);
        assert_eq!(automaton.snapshot().transitions.len(), before.transitions.len());
    }

    #[test]
    fn test_fully_isolated_plus() {
        let (mut automaton, t) = single("a+");
        let command = breakdown_iteration(&mut automaton, &t, IsolationLevel::FullyIsolate).unwrap();
        command.redo(&mut automaton);
        let added: Vec<AutomatonState> = command.added_states();
        assert_eq!(added.len(), 2);
        let (s, en) = (added[0].id(), added[1].id());
        assert_eq!(
            edges(&automaton),
            vec![e(0, s, "ε"), e(s, en, "a"), e(en, 1, "ε"), e(en, s, "ε")]
        );
    }

    #[test]
    fn test_sufficiency() {
        use IsolationLevel::*;
        assert!(None.is_sufficient_for(None));
        assert!(FullyIsolate.is_sufficient_for(StartIsolate));
        assert!(FullyIsolate.is_sufficient_for(EndIsolate));
        assert!(StartIsolate.is_sufficient_for(StartIsolate));
        assert!(!StartIsolate.is_sufficient_for(EndIsolate));
        assert!(!EndIsolate.is_sufficient_for(FullyIsolate));
        assert!(!None.is_sufficient_for(StartIsolate));
    }

    #[test]
    fn test_option() {
        let (mut automaton, t) = single("(ab)?");
        let command = breakdown_option(&mut automaton, &t).unwrap();
        command.redo(&mut automaton);
        assert_eq!(edges(&automaton), vec![e(0, 1, "ab"), e(0, 1, "ε")]);
    }

    #[test]
    fn test_dispatch() {
        let (mut automaton, t) = single("a");
        assert!(create_breakdown_command(&mut automaton, &t, IsolationPolicy::Optimal)
            .unwrap()
            .is_none());

        let (mut automaton, t) = single("a*");
        let command = create_breakdown_command(&mut automaton, &t, IsolationPolicy::Full)
            .unwrap()
            .unwrap();
        assert_eq!(command.added_states().len(), 2);
    }

    #[test]
    fn test_stale_transition_is_rejected() {
        let (mut automaton, t) = single("a|b");
        automaton.remove_transition(t.id());
        assert!(breakdown_choice(&mut automaton, &t).is_err());
    }
}
