//! Session store: the in-memory table of live sessions.

use std::collections::HashMap;

use crosswire_protocol::{ClientId, SessionId};

use crate::GameSession;

/// All live sessions, keyed by session id.
///
/// Not thread-safe by itself — the store is owned by a single task and
/// every inbound event runs against it to completion before the next, so
/// a plain `HashMap` is the whole story.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, GameSession>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Inserts a session under its own id.
    pub fn insert(&mut self, session: GameSession) {
        self.sessions.insert(session.id().clone(), session);
    }

    /// Looks up a session by id.
    pub fn get(&self, id: &SessionId) -> Option<&GameSession> {
        self.sessions.get(id)
    }

    /// Mutable session lookup.
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut GameSession> {
        self.sessions.get_mut(id)
    }

    /// Removes and returns a session.
    pub fn remove(&mut self, id: &SessionId) -> Option<GameSession> {
        self.sessions.remove(id)
    }

    /// Returns `true` if a live session has this id.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Finds the session a connection is seated in, if any.
    ///
    /// Scans live sessions and stops at the first match — join admission
    /// guarantees a connection holds at most one seat, so there is
    /// nothing further to find.
    pub fn find_by_client(&self, client_id: ClientId) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|s| s.participant(client_id).is_some())
            .map(|s| s.id().clone())
    }

    /// Current member connection ids of a session; empty if the session
    /// is gone.
    pub fn members_of(&self, id: &SessionId) -> Vec<ClientId> {
        self.sessions
            .get(id)
            .map(|s| s.member_ids())
            .unwrap_or_default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, client: u64) -> GameSession {
        GameSession::new(
            SessionId::new(id),
            ClientId(client),
            format!("Player_{client}"),
        )
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let mut store = SessionStore::new();
        store.insert(session("ab12", 1));

        assert!(store.contains(&SessionId::new("ab12")));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&SessionId::new("ab12")).unwrap().players().len(),
            1
        );
    }

    #[test]
    fn test_get_unknown_id_returns_none() {
        let store = SessionStore::new();
        assert!(store.get(&SessionId::new("nope")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_drops_the_session() {
        let mut store = SessionStore::new();
        store.insert(session("ab12", 1));
        assert!(store.remove(&SessionId::new("ab12")).is_some());
        assert!(!store.contains(&SessionId::new("ab12")));
        assert!(store.remove(&SessionId::new("ab12")).is_none());
    }

    #[test]
    fn test_find_by_client_scans_sessions() {
        let mut store = SessionStore::new();
        store.insert(session("aaaa", 1));
        store.insert(session("bbbb", 2));

        assert_eq!(
            store.find_by_client(ClientId(2)),
            Some(SessionId::new("bbbb"))
        );
        assert_eq!(
            store.find_by_client(ClientId(9)),
            None
        );
    }

    #[test]
    fn test_members_of_missing_session_is_empty() {
        let store = SessionStore::new();
        assert!(store.members_of(&SessionId::new("gone")).is_empty());
    }
}
