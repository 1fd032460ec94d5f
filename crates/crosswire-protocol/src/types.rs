//! Core protocol types for Crosswire's wire format.
//!
//! Everything here either travels on the wire as JSON or names the parties
//! a wire message is addressed to. The shapes are internally tagged
//! (`{"type": "...", ...}`) so a browser client can switch on a single
//! discriminator field.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// This is the transport-level connection identity: stable for the life of
/// a connection and unique across concurrently connected clients. There is
/// no account behind it — when the socket closes, the identity is gone.
///
/// `#[serde(transparent)]` makes `ClientId(42)` serialize as just `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A unique identifier for a game session.
///
/// Opaque to clients: an ephemeral random token handed out on session
/// creation and shared out-of-band with the intended opponent. Serialized
/// as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Wraps a raw token in a `SessionId`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Board values
// ---------------------------------------------------------------------------

/// A player's mark on the board.
///
/// The first participant of a session always plays `X`, the joiner `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// A 3×3 board in row-major order. `None` is an empty cell.
///
/// Serializes as a 9-element JSON array of `null`/`"X"`/`"O"`, which is
/// exactly what a grid-rendering client wants to consume.
pub type Board = [Option<Mark>; 9];

/// A board with every cell empty.
pub const EMPTY_BOARD: Board = [None; 9];

/// The terminal outcome of a game.
///
/// Absent (`winner: null` on the wire) while the game is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum GameOutcome {
    /// Some row, column, or diagonal is uniformly `mark`.
    Win { mark: Mark },
    /// Every cell is occupied and nobody won.
    Tie,
}

/// A participant as presented to clients in session-wide events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// The participant's connection identity.
    pub client_id: ClientId,
    /// The name shown to the opponent.
    pub display_name: String,
    /// The mark this participant plays.
    pub mark: Mark,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an outbound event?
// ---------------------------------------------------------------------------

/// Addresses an outbound [`ServerEvent`].
///
/// Engine operations return `(Recipient, ServerEvent)` pairs; the delivery
/// layer resolves session-scoped recipients against current membership and
/// fans the event out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// One specific client.
    Client(ClientId),

    /// Every current member of a session.
    Session(SessionId),

    /// Every current member of a session except one — the usual shape for
    /// relaying something the excluded client originated.
    SessionExcept(SessionId, ClientId),
}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// The named error kinds surfaced to clients.
///
/// Every failed operation is answered with exactly one of these; no other
/// failure detail crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// No live session has the given id.
    NotFound,
    /// The session already has two participants.
    SessionFull,
    /// The requester is already a member of a live session.
    AlreadyInSession,
    /// The target cell is already occupied.
    CellTaken,
    /// The requester does not hold the current turn.
    NotYourTurn,
    /// The cell index is outside `0..=8`.
    InvalidCell,
    /// The request could not be handled (e.g. a malformed payload).
    InternalFault,
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "MakeMove", "session_id": "ab12…", "cell": 4 }`.
/// Disconnects have no event — the socket closing is the signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Open a new session and take the X seat.
    CreateSession {
        #[serde(default)]
        display_name: Option<String>,
    },

    /// Take the O seat in an existing session.
    JoinSession {
        session_id: SessionId,
        #[serde(default)]
        display_name: Option<String>,
    },

    /// Place the requester's mark in `cell` (row-major 0..=8).
    MakeMove { session_id: SessionId, cell: usize },

    /// Relay a chat line to the session.
    Chat {
        session_id: SessionId,
        message: String,
        sender_name: String,
    },

    /// Reset the session's board for a new game. Answered with a
    /// [`ServerEvent::RematchAck`] in addition to the usual broadcast.
    RequestRematch { session_id: SessionId },

    /// Give up the requester's seat in the session.
    LeaveSession { session_id: SessionId },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Private ack: the requester's session was created and they hold X.
    SessionCreated {
        session_id: SessionId,
        display_name: String,
        board: Board,
    },

    /// Private ack: the requester was admitted and assigned `mark`.
    SessionJoined { session_id: SessionId, mark: Mark },

    /// Broadcast: both seats are filled and play begins.
    GameStarted {
        session_id: SessionId,
        players: Vec<PlayerInfo>,
        board: Board,
        current_player: Mark,
    },

    /// Broadcast: a move was applied. `winner` is set on the terminal
    /// move; `current_player` stops advancing once it is.
    BoardUpdated {
        session_id: SessionId,
        board: Board,
        winner: Option<GameOutcome>,
        current_player: Mark,
    },

    /// A relayed chat line. The originator receives their own copy with
    /// `sender` set to `"You"`; peers see the sender's display name.
    ChatMessage {
        session_id: SessionId,
        sender: String,
        sender_id: ClientId,
        message: String,
        timestamp: String,
    },

    /// Private ack for [`ClientEvent::RequestRematch`], sent exactly once
    /// per request.
    RematchAck {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorKind>,
    },

    /// Broadcast: the board was reset and X moves first again.
    RematchStarted {
        session_id: SessionId,
        board: Board,
        current_player: Mark,
    },

    /// Broadcast to the remaining member(s): a participant left or
    /// disconnected.
    PlayerLeft {
        session_id: SessionId,
        display_name: String,
    },

    /// Private: the referenced request failed.
    Error { kind: ErrorKind, message: String },
}

// =========================================================================
// Tests
// =========================================================================
