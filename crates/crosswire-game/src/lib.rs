//! Game-state engine for Crosswire.
//!
//! This crate is the authoritative core: session creation and admission,
//! turn-taking and move validation, win/tie detection, chat relay,
//! leave/disconnect bookkeeping, and rematch reset. It is pure and
//! synchronous — no sockets, no clocks, no tasks. Every operation on
//! [`GameService`] returns either a list of `(Recipient, ServerEvent)`
//! pairs to deliver or a [`GameError`] for the originator; a thin adapter
//! above maps both onto the transport.
//!
//! # Key types
//!
//! - [`GameService`] — the operations: create/join/move/chat/rematch/leave
//! - [`SessionStore`] — in-memory session table, injected into the service
//! - [`GameSession`] — one board, up to two [`Participant`]s
//! - [`evaluate`] — pure win/tie classification of a board

mod board;
mod error;
mod service;
mod session;
mod store;

pub use board::{evaluate, WIN_LINES};
pub use error::GameError;
pub use service::{Emitted, GameService};
pub use session::{GameSession, Participant, SessionStatus};
pub use store::SessionStore;
