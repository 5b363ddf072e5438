//! Reversible edits on an [`Automaton`].
//!
//! Every structural change to an automaton is expressed as a [`Command`]
//! that knows both its forward and backward delta at construction time.
//! Multi-step transformations are [`CompositeCommand`]s, applied forwards on
//! redo and backwards on undo, so a transformation is either fully present in
//! the graph or fully absent.
//!
//! Commands are driven through a [`CommandHistory`].

mod history;

pub use history::{CommandHistory, HistoryEvent};

use std::fmt;

use crate::automaton::{Automaton, AutomatonState, AutomatonTransition, StateId};

/// A single reversible edit, or an ordered group of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddState(AutomatonState),
    RemoveState(AutomatonState),
    AddTransition(AutomatonTransition),
    RemoveTransition(AutomatonTransition),
    SetFinal {
        state: StateId,
        is_final: bool,
        was_final: bool,
    },
    Composite(CompositeCommand),
}

impl Command {
    /// Change the final flag of `state`, remembering its current value.
    pub fn set_final(automaton: &Automaton, state: StateId, is_final: bool) -> Self {
        Command::SetFinal {
            state,
            is_final,
            was_final: automaton.is_final(state),
        }
    }

    pub fn composite(description: impl Into<String>, commands: Vec<Command>) -> Self {
        Command::Composite(CompositeCommand::new(description, commands))
    }

    /// Apply the forward delta.
    pub fn redo(&self, automaton: &mut Automaton) {
        match self {
            Command::AddState(state) => automaton.add_state(*state),
            Command::RemoveState(state) => automaton.remove_state(state.id()),
            Command::AddTransition(t) => automaton.add_transition(t.clone()),
            Command::RemoveTransition(t) => automaton.remove_transition(t.id()),
            Command::SetFinal {
                state, is_final, ..
            } => automaton.set_final(*state, *is_final),
            Command::Composite(composite) => composite.redo(automaton),
        }
    }

    /// Apply the backward delta.
    pub fn undo(&self, automaton: &mut Automaton) {
        match self {
            Command::AddState(state) => automaton.remove_state(state.id()),
            Command::RemoveState(state) => automaton.add_state(*state),
            Command::AddTransition(t) => automaton.remove_transition(t.id()),
            Command::RemoveTransition(t) => automaton.add_transition(t.clone()),
            Command::SetFinal {
                state, was_final, ..
            } => automaton.set_final(*state, *was_final),
            Command::Composite(composite) => composite.undo(automaton),
        }
    }

    /// Human readable summary, for history listings.
    pub fn description(&self) -> String {
        match self {
            Command::AddState(state) => format!("Add state {state}"),
            Command::RemoveState(state) => format!("Remove state {state}"),
            Command::AddTransition(t) => format!(
                "Add transition {} -> {} on {}",
                t.from(),
                t.to(),
                t.regex()
            ),
            Command::RemoveTransition(t) => format!(
                "Remove transition {} -> {} on {}",
                t.from(),
                t.to(),
                t.regex()
            ),
            Command::SetFinal {
                state, is_final, ..
            } => {
                if *is_final {
                    format!("Make state {state} final")
                } else {
                    format!("Make state {state} non-final")
                }
            }
            Command::Composite(composite) => composite.description().to_string(),
        }
    }

    /// Child commands of a composite; empty for primitive edits.
    pub fn children(&self) -> &[Command] {
        match self {
            Command::Composite(composite) => composite.commands(),
            _ => &[],
        }
    }

    /// Transitions added by this command, including those of its children.
    pub fn added_transitions(&self) -> Vec<&AutomatonTransition> {
        let mut out = Vec::new();
        self.collect(&mut |command| {
            if let Command::AddTransition(t) = command {
                out.push(t);
            }
        });
        out
    }

    /// States added by this command, including those of its children.
    pub fn added_states(&self) -> Vec<AutomatonState> {
        let mut out = Vec::new();
        self.collect(&mut |command| {
            if let Command::AddState(state) = command {
                out.push(*state);
            }
        });
        out
    }

    fn collect<'a>(&'a self, visit: &mut impl FnMut(&'a Command)) {
        visit(self);
        for child in self.children() {
            child.collect(visit);
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// An ordered list of commands treated as one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeCommand {
    description: String,
    commands: Vec<Command>,
}

impl CompositeCommand {
    pub fn new(description: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            description: description.into(),
            commands,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn redo(&self, automaton: &mut Automaton) {
        for command in &self.commands {
            command.redo(automaton);
        }
    }

    pub fn undo(&self, automaton: &mut Automaton) {
        for command in self.commands.iter().rev() {
            command.undo(automaton);
        }
    }
}
