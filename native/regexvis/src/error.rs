//! Error types shared by every part of the engine.

use thiserror::Error;

use crate::regexp::Operator;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a regular expression string can be rejected by the parser.
///
/// `position` is the character offset (not byte offset) into the text that
/// was handed to [`crate::regexp::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegexpError {
    #[error("{operator:?} operator on empty word at position {position}")]
    OperatorOnEmptyWord { operator: Operator, position: usize },
    #[error("CHOICE operator on empty word at position {position}")]
    EmptyChoiceOperand { position: usize },
    #[error("unclosed parenthesis found at position {position}")]
    UnclosedParenthesis { position: usize },
    #[error("stray closing parenthesis found at position {position}")]
    StrayClosingParenthesis { position: usize },
    #[error("parentheses at position {position} enclose nothing")]
    EmptyParentheses { position: usize },
}

/// Errors that can occur while parsing, transforming or replaying automata.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid regular expression: {0}")]
    InvalidRegexp(#[from] RegexpError),
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("history index {index} is out of range (size: {size})")]
    OutOfRange { index: usize, size: usize },
    #[error(
        "cannot execute a new command at history position {position} of {size} \
         while clobbering is disabled"
    )]
    NotAtHistoryEnd { position: usize, size: usize },
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid automaton snapshot: {0}")]
    Snapshot(String),
}

impl Error {
    pub(crate) fn illegal(msg: impl Into<String>) -> Self {
        Error::IllegalArgument(msg.into())
    }
}
