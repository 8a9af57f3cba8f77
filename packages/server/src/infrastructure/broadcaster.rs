//! Fan-out of outbound messages to connections.
//!
//! Each connection owns an unbounded mpsc channel drained by its socket writer
//! task. Sending never waits on the socket, so one slow client cannot hold up
//! delivery to the others. A send to a closed channel is logged and skipped.
//!
//! Lock order: callers already holding the lobby lock may call into the
//! broadcaster; the broadcaster never touches the lobby lock itself.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::domain::{ConnectionId, Lobby, SessionId};

/// Client connection information
pub struct ClientInfo {
    /// Message sender channel
    pub sender: UnboundedSender<String>,
    /// Unix timestamp when connected (in JST, milliseconds)
    pub connected_at: i64,
}

#[derive(Default)]
pub struct Broadcaster {
    connected_clients: Arc<Mutex<HashMap<ConnectionId, ClientInfo>>>,
}

impl Broadcaster {
    pub fn new(connected_clients: Arc<Mutex<HashMap<ConnectionId, ClientInfo>>>) -> Self {
        Self { connected_clients }
    }

    pub async fn register(&self, id: ConnectionId, info: ClientInfo) {
        self.connected_clients.lock().await.insert(id, info);
    }

    /// Returns whether `id` was registered.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        self.connected_clients.lock().await.remove(&id).is_some()
    }

    pub async fn count_connected_clients(&self) -> usize {
        self.connected_clients.lock().await.len()
    }

    /// Send `message` to one connection.
    ///
    /// Returns whether it was enqueued.
    pub async fn send_to<T: Serialize>(&self, id: ConnectionId, message: &T) -> bool {
        let Some(payload) = encode(message) else {
            return false;
        };
        let clients = self.connected_clients.lock().await;
        deliver(&clients, id, payload)
    }

    /// Send `message` to every seat and spectator of `session_id`.
    ///
    /// No-op if the session is no longer registered. Returns the number of
    /// connections the message was enqueued for.
    pub async fn broadcast<T: Serialize>(
        &self,
        lobby: &Lobby,
        session_id: &SessionId,
        message: &T,
    ) -> usize {
        let Some(members) = lobby.session_members(session_id) else {
            tracing::debug!("Skipping broadcast to removed session '{}'", session_id);
            return 0;
        };
        let Some(payload) = encode(message) else {
            return 0;
        };

        let clients = self.connected_clients.lock().await;
        members
            .into_iter()
            .filter(|id| deliver(&clients, *id, payload.clone()))
            .count()
    }
}

fn encode<T: Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize outbound message: {}", e);
            None
        }
    }
}

fn deliver(
    clients: &HashMap<ConnectionId, ClientInfo>,
    id: ConnectionId,
    payload: String,
) -> bool {
    match clients.get(&id) {
        Some(client_info) if client_info.sender.send(payload).is_ok() => true,
        Some(_) => {
            tracing::warn!("Channel to '{}' is closed, skipping", id);
            false
        }
        None => {
            tracing::debug!("'{}' is no longer connected, skipping", id);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Color, DisplayName, JoinOutcome, SessionIdFactory, Timestamp},
        infrastructure::{dto::websocket::TurnMessage, rules::ChessRulesEngine},
    };
    use tokio::sync::mpsc;

    fn create_broadcaster() -> Broadcaster {
        Broadcaster::new(Arc::new(Mutex::new(HashMap::new())))
    }

    fn client(sender: mpsc::UnboundedSender<String>) -> ClientInfo {
        ClientInfo {
            sender,
            connected_at: 0,
        }
    }

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_send_to_registered_client() {
        // テスト項目: 登録済みの接続にメッセージが届く
        // given (前提条件):
        let broadcaster = create_broadcaster();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new(1);
        broadcaster.register(id, client(tx)).await;

        // when (操作):
        let sent = broadcaster
            .send_to(id, &TurnMessage::new(Color::White))
            .await;

        // then (期待する結果):
        assert!(sent);
        assert_eq!(rx.recv().await.unwrap(), r#"{"type":"turn","turn":"white"}"#);
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_and_missing() {
        // テスト項目: 閉じたチャンネルや未登録の接続は飛ばし、残りに配信する
        // given (前提条件):
        let broadcaster = create_broadcaster();
        let rules = ChessRulesEngine::new();
        let mut lobby = Lobby::new();
        let alice = lobby.connect(Timestamp::new(0));
        let bob = lobby.connect(Timestamp::new(0));
        let carol = lobby.connect(Timestamp::new(0));
        lobby
            .join(alice, name("alice"), &rules, Timestamp::new(1))
            .unwrap();
        let JoinOutcome::Paired { session_id, .. } = lobby
            .join(bob, name("bob"), &rules, Timestamp::new(2))
            .unwrap()
        else {
            panic!("expected pairing");
        };
        lobby
            .join(carol, name("carol"), &rules, Timestamp::new(3))
            .unwrap();

        let (tx_alice, mut rx_alice) = mpsc::unbounded_channel();
        let (tx_bob, rx_bob) = mpsc::unbounded_channel();
        broadcaster.register(alice, client(tx_alice)).await;
        broadcaster.register(bob, client(tx_bob)).await;
        drop(rx_bob); // bob's socket is gone; carol never registered

        // when (操作):
        let delivered = broadcaster
            .broadcast(&lobby, &session_id, &TurnMessage::new(Color::Black))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(
            rx_alice.recv().await.unwrap(),
            r#"{"type":"turn","turn":"black"}"#
        );
    }

    #[tokio::test]
    async fn test_broadcast_to_removed_session_is_noop() {
        // テスト項目: 存在しないセッションへのブロードキャストは何もしない
        // given (前提条件):
        let broadcaster = create_broadcaster();
        let lobby = Lobby::new();

        // when (操作):
        let delivered = broadcaster
            .broadcast(
                &lobby,
                &SessionIdFactory::generate(),
                &TurnMessage::new(Color::White),
            )
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_unregister() {
        // テスト項目: 登録解除後は接続数が減り、送信されない
        // given (前提条件):
        let broadcaster = create_broadcaster();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new(7);
        broadcaster.register(id, client(tx)).await;

        // when (操作):
        let removed = broadcaster.unregister(id).await;

        // then (期待する結果):
        assert!(removed);
        assert_eq!(broadcaster.count_connected_clients().await, 0);
        assert!(
            !broadcaster
                .send_to(id, &TurnMessage::new(Color::White))
                .await
        );
    }
}
