//! Session registry and spectator routing policy.

use std::collections::HashMap;

use super::{Session, SessionId};

/// Sessions by id. Keys are unique; an entry is removed exactly once.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions ordered by creation.
    pub fn sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by_key(|s| s.sequence);
        sessions
    }
}

/// Picks the session a late joiner should watch.
pub type SpectatorTargetPolicy = fn(&SessionRegistry) -> Option<SessionId>;

/// Most recently created active session.
pub fn most_recent_active(registry: &SessionRegistry) -> Option<SessionId> {
    registry
        .sessions
        .values()
        .filter(|s| s.is_active())
        .max_by_key(|s| s.sequence)
        .map(|s| s.id.clone())
}
