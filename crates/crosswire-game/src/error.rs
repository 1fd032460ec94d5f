//! Error types for the game engine.

use crosswire_protocol::{ClientId, ErrorKind, SessionId};

/// Errors that can occur during game operations.
///
/// Every variant maps onto one of the wire-level [`ErrorKind`]s; the
/// `Display` text becomes the human-readable half of the error payload.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No live session has this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session already has two participants.
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// The requester is already a member of a live session. A connection
    /// holds at most one seat at a time.
    #[error("client {0} is already in session {1}")]
    AlreadyInSession(ClientId, SessionId),

    /// The target cell is already occupied.
    #[error("cell {0} is already taken")]
    CellTaken(usize),

    /// The requester does not hold the current turn — not a participant,
    /// not their mark, or the game is already decided.
    #[error("not your turn")]
    NotYourTurn,

    /// The cell index is outside the 3×3 grid.
    #[error("cell index {0} out of range (expected 0..=8)")]
    InvalidCell(usize),
}

impl GameError {
    /// The wire-level kind surfaced to clients for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotFound(_) => ErrorKind::NotFound,
            GameError::SessionFull(_) => ErrorKind::SessionFull,
            GameError::AlreadyInSession(_, _) => ErrorKind::AlreadyInSession,
            GameError::CellTaken(_) => ErrorKind::CellTaken,
            GameError::NotYourTurn => ErrorKind::NotYourTurn,
            GameError::InvalidCell(_) => ErrorKind::InvalidCell,
        }
    }
}
