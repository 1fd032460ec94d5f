//! Wire protocol for Crosswire.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Mark`], [`SessionId`],
//!   etc.) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the game
//! engine. It doesn't know about connections or session storage — it only
//! knows how events are shaped and serialized.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Engine (session state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Board, ClientEvent, ClientId, ErrorKind, GameOutcome, Mark, PlayerInfo,
    Recipient, ServerEvent, SessionId, EMPTY_BOARD,
};
