//! # Crosswire
//!
//! Real-time coordination server for two-player tic-tac-toe.
//!
//! Crosswire pairs two connected participants in an ephemeral session
//! addressed by a shareable id, validates and applies their moves,
//! detects terminal outcomes, relays chat, and supports rematches. The
//! authoritative game state lives in [`crosswire_game`]; this crate wires
//! it to the WebSocket transport through a single service actor task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crosswire::ServerBuilder;
//!
//! # async fn run() -> Result<(), crosswire::ServerError> {
//! let server = ServerBuilder::new().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod service;

pub use error::ServerError;
pub use server::{CrosswireServer, ServerBuilder};

/// Commonly used types, re-exported for one-line imports in binaries
/// and tests.
pub mod prelude {
    pub use crate::{CrosswireServer, ServerBuilder, ServerError};
    pub use crosswire_game::{GameError, GameService, SessionStatus};
    pub use crosswire_protocol::{
        Board, ClientEvent, ClientId, ErrorKind, GameOutcome, Mark,
        PlayerInfo, ServerEvent, SessionId, EMPTY_BOARD,
    };
}
