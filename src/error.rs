//! Error types for puzzle construction and state validation.

use thiserror::Error;

/// Errors raised while building a puzzle or inspecting a state.
///
/// An unreachable goal is not an error; searches report it through
/// [`crate::Outcome::Unreachable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// The board, piece list, groups or initial placement is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A state has overlapping pieces, leaves the board, or has the wrong arity.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result alias for puzzle operations.
pub type Result<T> = std::result::Result<T, PuzzleError>;
