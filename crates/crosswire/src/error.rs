//! Unified error type for the Crosswire server.

use crosswire_game::GameError;
use crosswire_protocol::ProtocolError;
use crosswire_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes auto-generate `From` impls, so the `?`
/// operator converts sub-crate errors automatically at the server layer.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-level error (unknown session, bad move, etc.).
    #[error(transparent)]
    Game(#[from] GameError),

    /// The game service task is gone — the server is shutting down.
    #[error("game service unavailable")]
    ServiceUnavailable,
}
