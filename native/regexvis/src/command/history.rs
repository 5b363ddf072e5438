//! Linear undo/redo history with a movable cursor.

use std::fmt;

use crate::automaton::Automaton;
use crate::command::Command;
use crate::error::{Error, Result};

/// Notifications sent to history observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A new command was appended and applied. `position` is the new cursor.
    Executed { position: usize },
    /// The cursor moved through existing commands.
    PositionChanged { from: usize, to: usize },
    /// The redoable tail was discarded to make room for a new command.
    Truncated { len: usize, removed: usize },
}

type Observer = Box<dyn FnMut(&HistoryEvent)>;

/// An ordered list of executed commands and a cursor in `0..=len`.
///
/// Commands before the cursor are applied to the automaton, commands at or
/// after it are undone. New commands may only be appended at the end unless
/// clobbering is enabled, in which case the tail after the cursor is
/// discarded first.
#[derive(Default)]
pub struct CommandHistory {
    commands: Vec<Command>,
    position: usize,
    clobber: bool,
    observers: Vec<Observer>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clobber(clobber: bool) -> Self {
        Self {
            clobber,
            ..Self::default()
        }
    }

    /// Register a callback invoked after every cursor or length change.
    pub fn subscribe(&mut self, observer: impl FnMut(&HistoryEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self, event: HistoryEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_clobber(&self) -> bool {
        self.clobber
    }

    pub fn set_clobber(&mut self, clobber: bool) {
        self.clobber = clobber;
    }

    /// Description of the command [`CommandHistory::prev`] would undo.
    pub fn undo_description(&self) -> Option<String> {
        self.position
            .checked_sub(1)
            .and_then(|idx| self.commands.get(idx))
            .map(Command::description)
    }

    /// Description of the command [`CommandHistory::next`] would redo.
    pub fn redo_description(&self) -> Option<String> {
        self.commands.get(self.position).map(Command::description)
    }

    /// Apply `command` and append it to the history.
    ///
    /// Fails with [`Error::NotAtHistoryEnd`] when the cursor is not at the
    /// end and clobbering is disabled; nothing is applied in that case.
    pub fn execute_new_command(&mut self, automaton: &mut Automaton, command: Command) -> Result<()> {
        let size = self.commands.len();
        if self.position != size {
            if !self.clobber {
                return Err(Error::NotAtHistoryEnd {
                    position: self.position,
                    size,
                });
            }
            let removed = size - self.position;
            log::debug!("clobbering {removed} command(s) after position {}", self.position);
            self.commands.truncate(self.position);
            self.notify(HistoryEvent::Truncated {
                len: self.position,
                removed,
            });
        }

        log::debug!("execute: {}", command.description());
        command.redo(automaton);
        self.commands.push(command);
        self.position = self.commands.len();
        self.notify(HistoryEvent::Executed {
            position: self.position,
        });
        Ok(())
    }

    fn step_forward(&mut self, automaton: &mut Automaton) -> bool {
        let Some(command) = self.commands.get(self.position) else {
            return false;
        };
        log::debug!("redo {}: {}", self.position, command.description());
        command.redo(automaton);
        self.position += 1;
        true
    }

    fn step_backward(&mut self, automaton: &mut Automaton) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        let command = &self.commands[self.position];
        log::debug!("undo {}: {}", self.position, command.description());
        command.undo(automaton);
        true
    }

    /// Redo the command at the cursor. Returns false at the end of history.
    pub fn next(&mut self, automaton: &mut Automaton) -> bool {
        let from = self.position;
        let moved = self.step_forward(automaton);
        if moved {
            self.notify(HistoryEvent::PositionChanged {
                from,
                to: self.position,
            });
        }
        moved
    }

    /// Undo the command before the cursor. Returns false at position 0.
    pub fn prev(&mut self, automaton: &mut Automaton) -> bool {
        let from = self.position;
        let moved = self.step_backward(automaton);
        if moved {
            self.notify(HistoryEvent::PositionChanged {
                from,
                to: self.position,
            });
        }
        moved
    }

    /// Move the cursor to `index`, redoing or undoing every command between.
    pub fn seek(&mut self, automaton: &mut Automaton, index: usize) -> Result<()> {
        let size = self.commands.len();
        if index > size {
            return Err(Error::OutOfRange { index, size });
        }
        let from = self.position;
        while self.position < index {
            self.step_forward(automaton);
        }
        while self.position > index {
            self.step_backward(automaton);
        }
        if from != index {
            self.notify(HistoryEvent::PositionChanged { from, to: index });
        }
        Ok(())
    }
}

impl fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("commands", &self.commands)
            .field("position", &self.position)
            .field("clobber", &self.clobber)
            .field("observers", &self.observers.len())
            .finish()
    }
}
