//! Server state shared by every handler.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    domain::{Lobby, RulesEngine, SeatPolicy},
    infrastructure::{Broadcaster, ChessRulesEngine},
};

/// Shared application state
pub struct AppState {
    /// Pool, registry and connection arena behind the single serialization lock
    pub lobby: Arc<Mutex<Lobby>>,
    /// Outbound channels per connection
    pub broadcaster: Arc<Broadcaster>,
    pub rules: Arc<dyn RulesEngine>,
    pub seat_policy: SeatPolicy,
}

impl AppState {
    pub fn new(rules: Arc<dyn RulesEngine>, seat_policy: SeatPolicy) -> Self {
        Self {
            lobby: Arc::new(Mutex::new(Lobby::new())),
            broadcaster: Arc::new(Broadcaster::new(Arc::new(Mutex::new(HashMap::new())))),
            rules,
            seat_policy,
        }
    }

    /// State backed by the standard chess rules
    pub fn chess(seat_policy: SeatPolicy) -> Self {
        Self::new(Arc::new(ChessRulesEngine::new()), seat_policy)
    }
}
