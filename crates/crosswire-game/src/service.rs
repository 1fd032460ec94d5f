//! The game service: session lifecycle, move handling, and chat relay.
//!
//! Every operation is a plain function over the injected [`SessionStore`]
//! returning the events to deliver — `(Recipient, ServerEvent)` pairs —
//! or a [`GameError`] for the originator. Nothing here touches the
//! network; the service adapter above resolves recipients against current
//! membership and fans events out.

use crosswire_protocol::{
    ClientId, Recipient, ServerEvent, SessionId,
};
use rand::Rng;

use crate::{GameError, GameSession, SessionStore};

/// Events produced by one operation, paired with their recipients.
pub type Emitted = Vec<(Recipient, ServerEvent)>;

/// The authoritative coordinator for all live sessions.
///
/// Owns the [`SessionStore`]; constructed per service instance rather
/// than living in a global, so tests can run any number of independent
/// services side by side.
#[derive(Debug, Default)]
pub struct GameService {
    store: SessionStore,
}

impl GameService {
    /// Creates a service with an empty store.
    pub fn new() -> Self {
        Self::with_store(SessionStore::new())
    }

    /// Creates a service over an existing store.
    pub fn with_store(store: SessionStore) -> Self {
        Self { store }
    }

    /// Read access to the store, mainly for inspection in tests.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Current member connections of a session; empty once it is gone.
    pub fn members_of(&self, session_id: &SessionId) -> Vec<ClientId> {
        self.store.members_of(session_id)
    }

    /// Opens a new session with the requester seated as X.
    ///
    /// Infallible: a missing display name gets a generated default, and
    /// the session id is re-rolled until it is unique among live
    /// sessions. Acks the requester with the id and the empty board.
    pub fn create_session(
        &mut self,
        client: ClientId,
        display_name: Option<String>,
    ) -> Emitted {
        let name = display_name.unwrap_or_else(default_display_name);
        let session_id = self.fresh_session_id();
        let session =
            GameSession::new(session_id.clone(), client, name.clone());
        let board = *session.board();
        self.store.insert(session);

        tracing::info!(%session_id, client_id = %client, "session created");

        vec![(
            Recipient::Client(client),
            ServerEvent::SessionCreated {
                session_id,
                display_name: name,
                board,
            },
        )]
    }

    /// Seats the requester as O in an existing session.
    ///
    /// # Errors
    /// - [`GameError::NotFound`] — unknown session id
    /// - [`GameError::SessionFull`] — both seats already taken
    /// - [`GameError::AlreadyInSession`] — the requester holds a seat in
    ///   a live session; one connection, one session
    pub fn join_session(
        &mut self,
        client: ClientId,
        session_id: &SessionId,
        display_name: Option<String>,
    ) -> Result<Emitted, GameError> {
        {
            let session = self
                .store
                .get(session_id)
                .ok_or_else(|| GameError::NotFound(session_id.clone()))?;
            if session.is_full() {
                return Err(GameError::SessionFull(session_id.clone()));
            }
        }
        if let Some(existing) = self.store.find_by_client(client) {
            return Err(GameError::AlreadyInSession(client, existing));
        }

        let name = display_name.unwrap_or_else(default_display_name);
        let session = self
            .store
            .get_mut(session_id)
            .expect("session checked above");
        let mark = session.admit(client, name)?;

        tracing::info!(
            %session_id,
            client_id = %client,
            players = session.players().len(),
            "game started"
        );

        Ok(vec![
            (
                Recipient::Client(client),
                ServerEvent::SessionJoined {
                    session_id: session_id.clone(),
                    mark,
                },
            ),
            (
                Recipient::Session(session_id.clone()),
                ServerEvent::GameStarted {
                    session_id: session_id.clone(),
                    players: session.player_infos(),
                    board: *session.board(),
                    current_player: session.current_player(),
                },
            ),
        ])
    }

    /// Applies a move and broadcasts the resulting board.
    ///
    /// # Errors
    /// In validation order: [`GameError::NotFound`],
    /// [`GameError::InvalidCell`], [`GameError::CellTaken`],
    /// [`GameError::NotYourTurn`].
    pub fn make_move(
        &mut self,
        client: ClientId,
        session_id: &SessionId,
        cell: usize,
    ) -> Result<Emitted, GameError> {
        let session = self
            .store
            .get_mut(session_id)
            .ok_or_else(|| GameError::NotFound(session_id.clone()))?;
        session.apply_move(client, cell)?;

        tracing::debug!(
            %session_id,
            client_id = %client,
            cell,
            winner = ?session.winner(),
            "move applied"
        );

        Ok(vec![(
            Recipient::Session(session_id.clone()),
            ServerEvent::BoardUpdated {
                session_id: session_id.clone(),
                board: *session.board(),
                winner: session.winner(),
                current_player: session.current_player(),
            },
        )])
    }

    /// Relays a chat line to the session.
    ///
    /// Best-effort: an unknown session id drops the message with no
    /// feedback. `<` and `>` are escaped so recipients rendering the text
    /// as markup can't be injected. Peers receive the sender's name; the
    /// sender's own echo is labeled `"You"`. The timestamp is supplied by
    /// the caller (the adapter stamps server local time-of-day).
    pub fn send_chat(
        &mut self,
        client: ClientId,
        session_id: &SessionId,
        sender_name: &str,
        message: &str,
        timestamp: &str,
    ) -> Emitted {
        if !self.store.contains(session_id) {
            tracing::debug!(%session_id, "chat for unknown session dropped");
            return Vec::new();
        }

        let sanitized = sanitize_markup(message);
        vec![
            (
                Recipient::SessionExcept(session_id.clone(), client),
                ServerEvent::ChatMessage {
                    session_id: session_id.clone(),
                    sender: sender_name.to_string(),
                    sender_id: client,
                    message: sanitized.clone(),
                    timestamp: timestamp.to_string(),
                },
            ),
            (
                Recipient::Client(client),
                ServerEvent::ChatMessage {
                    session_id: session_id.clone(),
                    sender: "You".to_string(),
                    sender_id: client,
                    message: sanitized,
                    timestamp: timestamp.to_string(),
                },
            ),
        ]
    }

    /// Resets a session's board for a rematch, keeping seats and marks.
    ///
    /// # Errors
    /// [`GameError::NotFound`] — unknown session id.
    pub fn request_rematch(
        &mut self,
        session_id: &SessionId,
    ) -> Result<Emitted, GameError> {
        let session = self
            .store
            .get_mut(session_id)
            .ok_or_else(|| GameError::NotFound(session_id.clone()))?;
        session.reset();

        tracing::info!(%session_id, "rematch started");

        Ok(vec![(
            Recipient::Session(session_id.clone()),
            ServerEvent::RematchStarted {
                session_id: session_id.clone(),
                board: *session.board(),
                current_player: session.current_player(),
            },
        )])
    }

    /// Removes the requester's seat from the named session.
    ///
    /// Remaining members are notified; the last seat out destroys the
    /// session. Inconsistent state (unknown session, not a member)
    /// degrades to a silent no-op.
    pub fn leave_session(
        &mut self,
        client: ClientId,
        session_id: &SessionId,
    ) -> Emitted {
        self.remove_participant(client, session_id.clone(), false)
    }

    /// Handles a dropped connection.
    ///
    /// Scans live sessions for the connection's seat and stops at the
    /// first match (join admission guarantees there is at most one), then
    /// applies the same removal as an explicit leave. Never fails
    /// visibly.
    pub fn handle_disconnect(&mut self, client: ClientId) -> Emitted {
        match self.store.find_by_client(client) {
            Some(session_id) => {
                self.remove_participant(client, session_id, true)
            }
            None => Vec::new(),
        }
    }

    fn remove_participant(
        &mut self,
        client: ClientId,
        session_id: SessionId,
        disconnected: bool,
    ) -> Emitted {
        let Some(session) = self.store.get_mut(&session_id) else {
            return Vec::new();
        };
        if disconnected {
            if let Some(p) = session.participant_mut(client) {
                p.disconnected = true;
            }
        }
        let Some(removed) = session.remove(client) else {
            return Vec::new();
        };

        if session.players().is_empty() {
            self.store.remove(&session_id);
            tracing::info!(%session_id, "last participant gone, session destroyed");
            return Vec::new();
        }

        tracing::info!(
            %session_id,
            client_id = %client,
            disconnected,
            "participant left"
        );

        vec![(
            Recipient::Session(session_id.clone()),
            ServerEvent::PlayerLeft {
                session_id,
                display_name: removed.display_name,
            },
        )]
    }

    /// Generates a session id unique among live sessions. Collisions on
    /// a 48-bit token are vanishingly rare, but the loop makes uniqueness
    /// a guarantee rather than a probability.
    fn fresh_session_id(&self) -> SessionId {
        loop {
            let id = SessionId::new(generate_token());
            if !self.store.contains(&id) {
                return id;
            }
        }
    }
}

/// A random 12-character lowercase hex token (48 bits of entropy) —
/// short enough to paste to a friend, long enough not to collide.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 6] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Default display name for participants who don't supply one.
fn default_display_name() -> String {
    let mut rng = rand::rng();
    format!("Player_{}", rng.random_range(0..1000))
}

/// Escapes `<` and `>` so relayed chat can't inject markup.
fn sanitize_markup(message: &str) -> String {
    message.replace('<', "&lt;").replace('>', "&gt;")
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionStatus;
    use crosswire_protocol::{GameOutcome, Mark, EMPTY_BOARD};

    // -- Helpers ----------------------------------------------------------

    fn cid(id: u64) -> ClientId {
        ClientId(id)
    }

    /// Creates a session for client 1 and returns its id.
    fn create(service: &mut GameService, client: u64) -> SessionId {
        let events =
            service.create_session(cid(client), Some(format!("P{client}")));
        match &events[0].1 {
            ServerEvent::SessionCreated { session_id, .. } => {
                session_id.clone()
            }
            other => panic!("expected SessionCreated, got {other:?}"),
        }
    }

    /// Creates a session for client 1 and joins client 2.
    fn started_game(service: &mut GameService) -> SessionId {
        let id = create(service, 1);
        service.join_session(cid(2), &id, Some("P2".into())).unwrap();
        id
    }

    /// Plays out X winning the top row: X 0, O 4, X 1, O 5, X 2.
    fn play_x_win(service: &mut GameService, id: &SessionId) {
        for (client, cell) in [(1, 0), (2, 4), (1, 1), (2, 5), (1, 2)] {
            service.make_move(cid(client), id, cell).unwrap();
        }
    }

    // =====================================================================
    // create_session
    // =====================================================================

    #[test]
    fn test_create_session_acks_requester_with_empty_board() {
        let mut service = GameService::new();
        let events = service.create_session(cid(1), Some("Ada".into()));

        assert_eq!(events.len(), 1);
        let (recipient, event) = &events[0];
        assert_eq!(*recipient, Recipient::Client(cid(1)));
        match event {
            ServerEvent::SessionCreated {
                display_name,
                board,
                ..
            } => {
                assert_eq!(display_name, "Ada");
                assert_eq!(*board, EMPTY_BOARD);
            }
            other => panic!("expected SessionCreated, got {other:?}"),
        }
    }

    #[test]
    fn test_create_session_first_participant_is_x_and_waiting() {
        let mut service = GameService::new();
        let id = create(&mut service, 1);

        let session = service.store().get(&id).unwrap();
        assert_eq!(session.players().len(), 1);
        assert_eq!(session.players()[0].mark, Mark::X);
        assert_eq!(session.status(), SessionStatus::Waiting);
    }

    #[test]
    fn test_create_session_generates_default_name_in_range() {
        let mut service = GameService::new();
        let events = service.create_session(cid(1), None);

        let name = match &events[0].1 {
            ServerEvent::SessionCreated { display_name, .. } => display_name,
            other => panic!("expected SessionCreated, got {other:?}"),
        };
        let suffix = name
            .strip_prefix("Player_")
            .expect("default name starts with Player_");
        let n: u32 = suffix.parse().expect("numeric suffix");
        assert!(n < 1000, "suffix {n} out of range");
    }

    #[test]
    fn test_create_session_ids_are_unique() {
        let mut service = GameService::new();
        let a = create(&mut service, 1);
        let b = create(&mut service, 2);
        assert_ne!(a, b);
        assert_eq!(service.store().len(), 2);
    }

    // =====================================================================
    // join_session
    // =====================================================================

    #[test]
    fn test_join_unknown_session_returns_not_found() {
        let mut service = GameService::new();
        let result =
            service.join_session(cid(2), &SessionId::new("nope"), None);
        assert!(matches!(result, Err(GameError::NotFound(_))));
    }

    #[test]
    fn test_join_emits_private_ack_then_broadcast() {
        let mut service = GameService::new();
        let id = create(&mut service, 1);
        let events =
            service.join_session(cid(2), &id, Some("Bea".into())).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, Recipient::Client(cid(2)));
        assert!(matches!(
            events[0].1,
            ServerEvent::SessionJoined { mark: Mark::O, .. }
        ));

        assert_eq!(events[1].0, Recipient::Session(id.clone()));
        match &events[1].1 {
            ServerEvent::GameStarted {
                players,
                current_player,
                board,
                ..
            } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].mark, Mark::X);
                assert_eq!(players[1].mark, Mark::O);
                assert_eq!(players[1].display_name, "Bea");
                assert_eq!(*current_player, Mark::X);
                assert_eq!(*board, EMPTY_BOARD);
            }
            other => panic!("expected GameStarted, got {other:?}"),
        }
    }

    #[test]
    fn test_join_sets_status_in_progress() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        assert_eq!(
            service.store().get(&id).unwrap().status(),
            SessionStatus::InProgress
        );
    }

    #[test]
    fn test_third_join_always_fails_with_full() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let result = service.join_session(cid(3), &id, None);
        assert!(matches!(result, Err(GameError::SessionFull(_))));
        assert_eq!(service.members_of(&id).len(), 2);
    }

    #[test]
    fn test_join_while_seated_elsewhere_is_rejected() {
        let mut service = GameService::new();
        let first = create(&mut service, 1);
        let second = create(&mut service, 2);

        // Client 1 already holds the X seat in `first`.
        let result = service.join_session(cid(1), &second, None);
        assert!(matches!(
            result,
            Err(GameError::AlreadyInSession(c, ref s)) if c == cid(1) && *s == first
        ));
    }

    // =====================================================================
    // make_move
    // =====================================================================

    #[test]
    fn test_move_on_unknown_session_returns_not_found() {
        let mut service = GameService::new();
        let result =
            service.make_move(cid(1), &SessionId::new("nope"), 0);
        assert!(matches!(result, Err(GameError::NotFound(_))));
    }

    #[test]
    fn test_move_out_of_range_returns_invalid_cell() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let result = service.make_move(cid(1), &id, 9);
        assert!(matches!(result, Err(GameError::InvalidCell(9))));
    }

    #[test]
    fn test_move_by_non_current_player_returns_not_your_turn() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let result = service.make_move(cid(2), &id, 0);
        assert!(matches!(result, Err(GameError::NotYourTurn)));
    }

    #[test]
    fn test_move_by_outsider_returns_not_your_turn() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let result = service.make_move(cid(9), &id, 0);
        assert!(matches!(result, Err(GameError::NotYourTurn)));
    }

    #[test]
    fn test_move_to_occupied_cell_leaves_board_unchanged() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        service.make_move(cid(1), &id, 0).unwrap();
        let before = *service.store().get(&id).unwrap().board();

        let result = service.make_move(cid(2), &id, 0);
        assert!(matches!(result, Err(GameError::CellTaken(0))));
        assert_eq!(*service.store().get(&id).unwrap().board(), before);
    }

    #[test]
    fn test_move_broadcasts_board_and_turn() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let events = service.make_move(cid(1), &id, 4).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, Recipient::Session(id.clone()));
        match &events[0].1 {
            ServerEvent::BoardUpdated {
                board,
                winner,
                current_player,
                ..
            } => {
                assert_eq!(board[4], Some(Mark::X));
                assert_eq!(*winner, None);
                assert_eq!(*current_player, Mark::O);
            }
            other => panic!("expected BoardUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_turn_alternates_strictly_until_win() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        play_x_win(&mut service, &id);

        let session = service.store().get(&id).unwrap();
        assert_eq!(
            session.winner(),
            Some(GameOutcome::Win { mark: Mark::X })
        );
        assert_eq!(session.current_player(), Mark::X);
        assert_eq!(session.status(), SessionStatus::Finished);

        // Alternation halts: no further move is accepted.
        assert!(matches!(
            service.make_move(cid(2), &id, 6),
            Err(GameError::NotYourTurn)
        ));
    }

    #[test]
    fn test_full_board_without_line_is_a_tie() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        // Ends at X O X / X O O / O X X — full, no triple.
        for (client, cell) in [
            (1, 0),
            (2, 1),
            (1, 2),
            (2, 4),
            (1, 3),
            (2, 5),
            (1, 7),
            (2, 6),
            (1, 8),
        ] {
            service.make_move(cid(client), &id, cell).unwrap();
        }

        let session = service.store().get(&id).unwrap();
        assert_eq!(session.winner(), Some(GameOutcome::Tie));
        assert_eq!(session.status(), SessionStatus::Finished);
    }

    // =====================================================================
    // send_chat
    // =====================================================================

    #[test]
    fn test_chat_relays_to_peers_and_echoes_sender_as_you() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let events =
            service.send_chat(cid(1), &id, "P1", "hello", "12:34:56");

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].0,
            Recipient::SessionExcept(id.clone(), cid(1))
        );
        match &events[0].1 {
            ServerEvent::ChatMessage {
                sender,
                sender_id,
                message,
                timestamp,
                ..
            } => {
                assert_eq!(sender, "P1");
                assert_eq!(*sender_id, cid(1));
                assert_eq!(message, "hello");
                assert_eq!(timestamp, "12:34:56");
            }
            other => panic!("expected ChatMessage, got {other:?}"),
        }

        assert_eq!(events[1].0, Recipient::Client(cid(1)));
        match &events[1].1 {
            ServerEvent::ChatMessage { sender, .. } => {
                assert_eq!(sender, "You");
            }
            other => panic!("expected ChatMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_escapes_markup() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let events = service.send_chat(
            cid(1),
            &id,
            "P1",
            "<script>alert(1)</script>",
            "12:34:56",
        );

        match &events[0].1 {
            ServerEvent::ChatMessage { message, .. } => {
                assert_eq!(
                    message,
                    "&lt;script&gt;alert(1)&lt;/script&gt;"
                );
            }
            other => panic!("expected ChatMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_to_unknown_session_is_silently_dropped() {
        let mut service = GameService::new();
        let events = service.send_chat(
            cid(1),
            &SessionId::new("nope"),
            "P1",
            "hello",
            "12:34:56",
        );
        assert!(events.is_empty());
    }

    // =====================================================================
    // request_rematch
    // =====================================================================

    #[test]
    fn test_rematch_unknown_session_returns_not_found() {
        let mut service = GameService::new();
        let result = service.request_rematch(&SessionId::new("nope"));
        assert!(matches!(result, Err(GameError::NotFound(_))));
    }

    #[test]
    fn test_rematch_resets_board_and_keeps_seats() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        play_x_win(&mut service, &id);

        let events = service.request_rematch(&id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, Recipient::Session(id.clone()));
        match &events[0].1 {
            ServerEvent::RematchStarted {
                board,
                current_player,
                ..
            } => {
                assert_eq!(*board, EMPTY_BOARD);
                assert_eq!(*current_player, Mark::X);
            }
            other => panic!("expected RematchStarted, got {other:?}"),
        }

        let session = service.store().get(&id).unwrap();
        assert_eq!(session.winner(), None);
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.players().len(), 2);
        assert_eq!(session.players()[0].mark, Mark::X);
        assert_eq!(session.players()[1].mark, Mark::O);

        // Play resumes from scratch.
        service.make_move(cid(1), &id, 0).unwrap();
    }

    // =====================================================================
    // leave_session / handle_disconnect
    // =====================================================================

    #[test]
    fn test_leave_notifies_remaining_participant() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let events = service.leave_session(cid(2), &id);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, Recipient::Session(id.clone()));
        match &events[0].1 {
            ServerEvent::PlayerLeft { display_name, .. } => {
                assert_eq!(display_name, "P2");
            }
            other => panic!("expected PlayerLeft, got {other:?}"),
        }
        assert_eq!(service.members_of(&id), vec![cid(1)]);
    }

    #[test]
    fn test_last_leave_destroys_session() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        service.leave_session(cid(2), &id);
        let events = service.leave_session(cid(1), &id);

        assert!(events.is_empty(), "nobody left to notify");
        assert!(!service.store().contains(&id));
        // A later join by the stale id sees NotFound.
        assert!(matches!(
            service.join_session(cid(3), &id, None),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn test_leave_unknown_session_is_noop() {
        let mut service = GameService::new();
        let events =
            service.leave_session(cid(1), &SessionId::new("nope"));
        assert!(events.is_empty());
    }

    #[test]
    fn test_leave_by_non_member_is_noop() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        let events = service.leave_session(cid(9), &id);
        assert!(events.is_empty());
        assert_eq!(service.members_of(&id).len(), 2);
    }

    #[test]
    fn test_disconnect_finds_session_by_scan() {
        let mut service = GameService::new();
        let id = started_game(&mut service);
        // An unrelated session should be untouched by the scan.
        let other = create(&mut service, 5);

        let events = service.handle_disconnect(cid(1));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].1,
            ServerEvent::PlayerLeft { .. }
        ));
        assert_eq!(service.members_of(&id), vec![cid(2)]);
        assert_eq!(service.members_of(&other), vec![cid(5)]);
    }

    #[test]
    fn test_disconnect_of_unseated_client_is_noop() {
        let mut service = GameService::new();
        started_game(&mut service);
        let events = service.handle_disconnect(cid(42));
        assert!(events.is_empty());
    }

    #[test]
    fn test_disconnect_of_last_participant_destroys_session() {
        let mut service = GameService::new();
        let id = create(&mut service, 1);
        let events = service.handle_disconnect(cid(1));
        assert!(events.is_empty());
        assert!(!service.store().contains(&id));
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    #[test]
    fn test_generate_token_is_twelve_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 12);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sanitize_markup_only_touches_angle_brackets() {
        assert_eq!(sanitize_markup("a < b > c & d"), "a &lt; b &gt; c & d");
        assert_eq!(sanitize_markup("plain"), "plain");
    }
}
