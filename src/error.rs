//! Typed errors for the game core. All of these are recoverable at the
//! state machine boundary; none should surface as a panic.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The target cell is occupied, out of range, or the move flips
    /// nothing.
    #[error("illegal move at cell {index}")]
    IllegalMove { index: usize },
    /// A board string that does not decode; callers treat this as "no
    /// prior state".
    #[error("malformed board encoding")]
    MalformedEncoding,
    /// The move service produced no usable move for a seat that has one.
    #[error("no AI move available for seat {seat}")]
    AiMoveUnavailable { seat: usize },
    /// A mover tried to play a seat it does not control.
    #[error("seat {seat} is not controlled by this mover")]
    UnauthorizedMover { seat: usize },
    /// The session driver is gone; the game must be reset or rebuilt.
    #[error("session disconnected")]
    SessionDisconnected,
}
