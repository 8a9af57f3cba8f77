//! Matchmaking pool.
//!
//! Holds connections waiting for a seat. The pool serves one pairing cycle at
//! a time: once it has seated two connections it stays full until the session
//! it produced is released, and joiners are routed to spectating meanwhile.

use super::{ConnectionId, SessionId};

/// Number of waiting connections that triggers pairing
pub const PAIRING_SIZE: usize = 2;

#[derive(Debug, Default)]
pub struct MatchmakingPool {
    /// Insertion order; the first entry gets white
    waiting: Vec<ConnectionId>,
    /// Session produced by the current pairing cycle
    cycle: Option<SessionId>,
}

impl MatchmakingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current cycle already produced a live session.
    pub fn is_full(&self) -> bool {
        self.cycle.is_some()
    }

    /// Add a waiting connection.
    ///
    /// Returns its 1-based position in the pool.
    pub fn enqueue(&mut self, id: ConnectionId) -> usize {
        if let Some(index) = self.waiting.iter().position(|w| *w == id) {
            return index + 1;
        }
        self.waiting.push(id);
        self.waiting.len()
    }

    /// Take the first two waiting connections as (white, black) once the
    /// pool holds a full pair.
    pub fn take_pair(&mut self) -> Option<(ConnectionId, ConnectionId)> {
        if self.waiting.len() < PAIRING_SIZE {
            return None;
        }
        let mut pair = self.waiting.drain(..PAIRING_SIZE);
        let white = pair.next()?;
        let black = pair.next()?;
        Some((white, black))
    }

    /// Mark the pool full until `session_id` is released.
    pub fn bind_cycle(&mut self, session_id: SessionId) {
        self.cycle = Some(session_id);
    }

    /// Reopen the pool if `session_id` is the current cycle.
    pub fn release_cycle(&mut self, session_id: &SessionId) {
        if self.cycle.as_ref() == Some(session_id) {
            self.cycle = None;
        }
    }

    /// Returns whether `id` was waiting.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|w| *w != id);
        self.waiting.len() != before
    }

    pub fn waiting(&self) -> &[ConnectionId] {
        &self.waiting
    }
}
