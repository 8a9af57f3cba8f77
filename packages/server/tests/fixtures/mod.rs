//! Shared fixtures for integration tests.
//!
//! `TestServer` runs the real router in-process on an ephemeral port.
//! `Player` wraps a WebSocket client connection with JSON helpers.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use banmen_server::{
    domain::SeatPolicy,
    ui::{build_router, state::AppState},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(SeatPolicy::default()).await
    }

    pub async fn start_with(seat_policy: SeatPolicy) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let app = build_router(Arc::new(AppState::chess(seat_policy)));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });
        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn connect(&self) -> Player {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect WebSocket");
        Player { stream }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct Player {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Player {
    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn join(&mut self, name: &str) {
        self.send_json(json!({"type": "join", "name": name})).await;
    }

    pub async fn play(&mut self, session_id: &str, from: &str, to: &str, color: &str) {
        self.send_json(json!({
            "type": "move",
            "sessionId": session_id,
            "from": from,
            "to": to,
            "color": color,
        }))
        .await;
    }

    /// Next JSON message, failing the test after `RECV_TIMEOUT`.
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a message")
                .expect("Stream ended")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
            }
        }
    }

    /// Asserts that nothing arrives within a short window.
    pub async fn expect_silence(&mut self) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(SILENCE_WINDOW, self.stream.next()).await
        {
            panic!("Expected no message, got {}", text.as_str());
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Connect and pair two players; returns (white, black, session id) with the
/// join notifications already consumed.
pub async fn start_game(server: &TestServer) -> (Player, Player, String) {
    let mut white = server.connect().await;
    let mut black = server.connect().await;

    white.join("alice").await;
    assert_eq!(white.recv().await["type"], "welcome");
    black.join("bob").await;
    assert_eq!(black.recv().await["type"], "welcome");

    let start = white.recv().await;
    assert_eq!(start["type"], "start");
    let session_id = start["gameId"].as_str().expect("gameId").to_string();
    assert_eq!(white.recv().await, json!({"type": "turn", "turn": "white"}));
    assert_eq!(black.recv().await["type"], "start");
    assert_eq!(black.recv().await, json!({"type": "turn", "turn": "white"}));

    (white, black, session_id)
}
