//! UseCase テスト用の共通ヘルパー

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{ConnectionId, DisplayName, JoinOutcome, Lobby, RulesEngine},
    infrastructure::{Broadcaster, ChessRulesEngine},
};

use super::{ConnectPlayerUseCase, JoinGameUseCase};

pub struct Harness {
    pub lobby: Arc<Mutex<Lobby>>,
    pub broadcaster: Arc<Broadcaster>,
    pub rules: Arc<dyn RulesEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            lobby: Arc::new(Mutex::new(Lobby::new())),
            broadcaster: Arc::new(Broadcaster::new(Arc::new(Mutex::new(HashMap::new())))),
            rules: Arc::new(ChessRulesEngine::new()),
        }
    }

    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectPlayerUseCase::new(self.lobby.clone(), self.broadcaster.clone())
            .execute(tx)
            .await;
        (id, rx)
    }

    pub async fn join(&self, id: ConnectionId, name: &str) -> JoinOutcome {
        JoinGameUseCase::new(
            self.lobby.clone(),
            self.broadcaster.clone(),
            self.rules.clone(),
        )
        .execute(id, DisplayName::new(name.to_string()).unwrap())
        .await
        .unwrap()
    }
}

/// Everything queued for a connection so far, parsed as JSON.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
    let mut messages = Vec::new();
    while let Ok(text) = rx.try_recv() {
        messages.push(serde_json::from_str(&text).unwrap());
    }
    messages
}
