//! Session types: one board, up to two participants.

use std::fmt;

use crosswire_protocol::{
    Board, ClientId, GameOutcome, Mark, PlayerInfo, SessionId, EMPTY_BOARD,
};

use crate::{board, GameError};

/// The lifecycle status of a session.
///
/// - **Waiting**: one seat open, accepting a joiner.
/// - **InProgress**: both seats filled, moves are accepted.
/// - **Finished**: a winner (or tie) is recorded; only a rematch resumes
///   play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Waiting,
    InProgress,
    Finished,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Waiting => write!(f, "waiting"),
            SessionStatus::InProgress => write!(f, "in-progress"),
            SessionStatus::Finished => write!(f, "finished"),
        }
    }
}

/// A connected party holding a seat in a session.
///
/// Owned exclusively by its [`GameSession`]; identified by the transport
/// connection identity.
#[derive(Debug, Clone)]
pub struct Participant {
    /// The transport-level connection identity.
    pub client_id: ClientId,
    /// The name shown to the opponent.
    pub display_name: String,
    /// The mark this participant plays. The creator holds X, the joiner O.
    pub mark: Mark,
    /// Set when the participant's connection dropped (as opposed to an
    /// explicit leave). Only meaningful during removal bookkeeping.
    pub disconnected: bool,
}

/// One game instance: session id, seats, board, and turn state.
///
/// All mutation goes through the methods here so the invariants hold:
/// at most two seats, a cell written at most once per game, the turn
/// alternating strictly until a winner is recorded.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    players: Vec<Participant>,
    board: Board,
    current_player: Mark,
    status: SessionStatus,
    winner: Option<GameOutcome>,
}

impl GameSession {
    /// Creates a session with its first participant seated as X.
    pub fn new(
        id: SessionId,
        client_id: ClientId,
        display_name: String,
    ) -> Self {
        Self {
            id,
            players: vec![Participant {
                client_id,
                display_name,
                mark: Mark::X,
                disconnected: false,
            }],
            board: EMPTY_BOARD,
            current_player: Mark::X,
            status: SessionStatus::Waiting,
            winner: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Mark {
        self.current_player
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn winner(&self) -> Option<GameOutcome> {
        self.winner
    }

    pub fn players(&self) -> &[Participant] {
        &self.players
    }

    /// Returns `true` when both seats are taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= 2
    }

    /// Looks up a participant by connection identity.
    pub fn participant(&self, client_id: ClientId) -> Option<&Participant> {
        self.players.iter().find(|p| p.client_id == client_id)
    }

    /// Mutable participant lookup.
    pub fn participant_mut(
        &mut self,
        client_id: ClientId,
    ) -> Option<&mut Participant> {
        self.players.iter_mut().find(|p| p.client_id == client_id)
    }

    /// Connection identities of all current members, in seating order.
    pub fn member_ids(&self) -> Vec<ClientId> {
        self.players.iter().map(|p| p.client_id).collect()
    }

    /// The player list as presented to clients.
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|p| PlayerInfo {
                client_id: p.client_id,
                display_name: p.display_name.clone(),
                mark: p.mark,
            })
            .collect()
    }

    /// Seats a joiner as O and starts the game.
    ///
    /// # Errors
    /// [`GameError::SessionFull`] when both seats are already taken.
    pub fn admit(
        &mut self,
        client_id: ClientId,
        display_name: String,
    ) -> Result<Mark, GameError> {
        if self.is_full() {
            return Err(GameError::SessionFull(self.id.clone()));
        }
        self.players.push(Participant {
            client_id,
            display_name,
            mark: Mark::O,
            disconnected: false,
        });
        self.status = SessionStatus::InProgress;
        Ok(Mark::O)
    }

    /// Applies a move for `client_id` at `cell`.
    ///
    /// Validation short-circuits in a fixed order: index bounds, cell
    /// occupancy, then turn ownership (a non-member, the off-turn mark,
    /// and a finished game all fail the same way — nobody holds the turn
    /// in a terminal state).
    ///
    /// On success the mark is written, the board is re-evaluated, and
    /// either the winner is recorded (turn frozen) or the turn flips.
    pub fn apply_move(
        &mut self,
        client_id: ClientId,
        cell: usize,
    ) -> Result<(), GameError> {
        if cell >= self.board.len() {
            return Err(GameError::InvalidCell(cell));
        }
        if self.board[cell].is_some() {
            return Err(GameError::CellTaken(cell));
        }
        let mark = self
            .participant(client_id)
            .map(|p| p.mark)
            .ok_or(GameError::NotYourTurn)?;
        if self.winner.is_some() || mark != self.current_player {
            return Err(GameError::NotYourTurn);
        }

        self.board[cell] = Some(mark);
        match board::evaluate(&self.board) {
            Some(outcome) => {
                self.winner = Some(outcome);
                self.status = SessionStatus::Finished;
            }
            None => {
                self.current_player = mark.other();
            }
        }
        Ok(())
    }

    /// Unseats a participant. Returns the removed seat, or `None` if the
    /// client held none (removal degrades to a no-op rather than failing).
    ///
    /// A still-running game with an open seat goes back to `Waiting`;
    /// a decided game stays `Finished`.
    pub fn remove(&mut self, client_id: ClientId) -> Option<Participant> {
        let idx = self
            .players
            .iter()
            .position(|p| p.client_id == client_id)?;
        let removed = self.players.remove(idx);
        if self.winner.is_none() && self.players.len() < 2 {
            self.status = SessionStatus::Waiting;
        }
        Some(removed)
    }

    /// Resets for a rematch: empty board, X to move, no winner, play on.
    /// Seats and marks are preserved.
    pub fn reset(&mut self) {
        self.board = EMPTY_BOARD;
        self.current_player = Mark::X;
        self.winner = None;
        self.status = SessionStatus::InProgress;
    }
}
