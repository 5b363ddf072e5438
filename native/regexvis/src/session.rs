//! One editing session: an automaton, its history, and the engine settings.

use crate::automaton::{Automaton, StateId, TransitionId};
use crate::command::{Command, CommandHistory};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::formlang::{
    EpsilonContext, NonDeterminismContext, create_breakdown_command, eliminable_states,
    eliminate_state, extracted_regex, isolate_final_state, remove_epsilon_transitions,
    remove_equivalent_states, remove_non_determinism, remove_unreachable_state,
    unreachable_states,
};
use crate::regexp::{Operator, RegexNode, parse};

/// Drives the transformations over one automaton.
///
/// Every step is executed through the session's [`CommandHistory`], so the
/// whole conversion can be stepped backwards and forwards.
#[derive(Debug)]
pub struct Session {
    automaton: Automaton,
    history: CommandHistory,
    config: EngineConfig,
}

impl Session {
    /// A session over an automaton with only a start state.
    pub fn new(config: EngineConfig) -> Self {
        Self::from_automaton(Automaton::new(), config)
    }

    pub fn from_automaton(automaton: Automaton, config: EngineConfig) -> Self {
        Self {
            automaton,
            history: CommandHistory::with_clobber(config.clobber_history),
            config,
        }
    }

    /// Start from the two-state automaton `start -(regex)-> final`.
    ///
    /// The construction is the first entry of the history.
    pub fn from_regex(text: &str, config: EngineConfig) -> Result<Self> {
        let regex = parse(text)?.ok_or_else(|| Error::illegal("empty regular expression"))?;
        let mut session = Self::new(config);
        let automaton = &mut session.automaton;
        let start = automaton.start_state_id();
        let end = automaton.create_new_state().with_final(true);
        let t = automaton.create_new_transition(start, end.id(), regex.clone());
        let command = Command::composite(
            format!("Create automaton for {regex}"),
            vec![Command::AddState(end), Command::AddTransition(t)],
        );
        session.execute(command)?;
        Ok(session)
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Mutable access for observers and the clobber toggle.
    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        self.history.execute_new_command(&mut self.automaton, command)
    }

    pub fn undo(&mut self) -> bool {
        self.history.prev(&mut self.automaton)
    }

    pub fn redo(&mut self) -> bool {
        self.history.next(&mut self.automaton)
    }

    pub fn seek(&mut self, index: usize) -> Result<()> {
        self.history.seek(&mut self.automaton, index)
    }

    /// Break down one transition. Returns false if its label is already a
    /// single character.
    pub fn breakdown_transition(&mut self, id: TransitionId) -> Result<bool> {
        let t = self
            .automaton
            .transition(id)
            .cloned()
            .ok_or_else(|| Error::illegal(format!("no transition with id {id}")))?;
        match create_breakdown_command(&mut self.automaton, &t, self.config.isolation)? {
            Some(command) => {
                self.execute(command)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Break down transitions until every label is a single character.
    /// Returns the number of breakdowns performed.
    pub fn breakdown_all(&mut self) -> Result<usize> {
        let mut count = 0;
        loop {
            let next = self
                .automaton
                .transitions()
                .find(|t| t.regex().operator() != Operator::None)
                .map(|t| t.id());
            let Some(id) = next else {
                break;
            };
            self.breakdown_transition(id)?;
            count += 1;
        }
        Ok(count)
    }

    fn state_ids(&self) -> Vec<StateId> {
        let start = self.automaton.start_state_id();
        let mut ids: Vec<StateId> = self.automaton.states().map(|s| s.id()).collect();
        // The start state goes first so its equivalence class merges into it.
        ids.sort_by_key(|&id| (id != start, id));
        ids
    }

    fn remove_unreachable(&mut self) -> Result<()> {
        for state in unreachable_states(&self.automaton) {
            let command = remove_unreachable_state(&self.automaton, state)?;
            self.execute(command)?;
        }
        Ok(())
    }

    /// Convert the automaton into a DFA.
    ///
    /// Compound labels are broken down, epsilon-equivalent states merged,
    /// epsilon transitions removed, and ambiguous symbols resolved by subset
    /// construction. Unreachable states are dropped along the way.
    pub fn determinize(&mut self) -> Result<()> {
        self.breakdown_all()?;

        let ctx = EpsilonContext::new(&self.automaton);
        for state in self.state_ids() {
            if self.automaton.has_state(state) && ctx.equivalent_states_exist(&self.automaton, state) {
                let command = remove_equivalent_states(&mut self.automaton, &ctx, state)?;
                self.execute(command)?;
            }
        }

        for state in self.state_ids() {
            if self.automaton.outgoing(state).iter().any(|t| t.is_epsilon()) {
                let command = remove_epsilon_transitions(&mut self.automaton, state)?;
                self.execute(command)?;
            }
        }
        self.remove_unreachable()?;

        let mut ctx = NonDeterminismContext::new();
        loop {
            let mut changed = false;
            for state in self.state_ids() {
                while let Some(command) = remove_non_determinism(&mut self.automaton, &mut ctx, state)? {
                    self.execute(command)?;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        self.remove_unreachable()
    }

    /// Recover a regular expression for the automaton's language by state
    /// elimination. Returns `Ok(None)` for the empty language.
    pub fn to_regex(&mut self) -> Result<Option<RegexNode>> {
        if let Some(command) = isolate_final_state(&mut self.automaton) {
            self.execute(command)?;
        }
        for state in eliminable_states(&self.automaton) {
            let command = eliminate_state(&mut self.automaton, state)?;
            self.execute(command)?;
        }
        let regex = extracted_regex(&self.automaton)?;
        Ok(if self.config.optimise_extracted {
            regex.map(|r| r.optimise())
        } else {
            regex
        })
    }
}
