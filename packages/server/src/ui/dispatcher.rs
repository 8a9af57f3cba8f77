//! Classifies inbound frames and routes them to the use cases.
//!
//! Every failure is answered with an `error` message to the sender only; the
//! connection always stays open.

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, DisplayName},
    infrastructure::dto::websocket::{ClientMessage, ErrorMessage, ProtocolError},
    ui::state::AppState,
    usecase::{
        ApplyMoveUseCase, ConnectPlayerUseCase, DisconnectPlayerUseCase, JoinGameUseCase,
    },
};

pub struct Dispatcher {
    state: Arc<AppState>,
}

impl Dispatcher {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Register a new connection whose outbound messages go to `sender`.
    pub async fn connect(
        &self,
        sender: tokio::sync::mpsc::UnboundedSender<String>,
    ) -> ConnectionId {
        ConnectPlayerUseCase::new(self.state.lobby.clone(), self.state.broadcaster.clone())
            .execute(sender)
            .await
    }

    /// Handle one text frame from `id`.
    pub async fn dispatch(&self, id: ConnectionId, text: &str) {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                match &e {
                    ProtocolError::MalformedMessage(reason) => {
                        tracing::warn!("Malformed message from '{}': {}", id, reason)
                    }
                    ProtocolError::UnknownType(tag) => {
                        tracing::warn!("Unknown message type '{}' from '{}'", tag, id)
                    }
                }
                self.reply_error(id, e.to_string()).await;
                return;
            }
        };

        match message {
            ClientMessage::Join(request) => {
                let name = match DisplayName::new(request.name) {
                    Ok(name) => name,
                    Err(e) => {
                        tracing::warn!("Rejected join from '{}': {}", id, e);
                        let error = ProtocolError::MalformedMessage(e.to_string());
                        self.reply_error(id, error.to_string()).await;
                        return;
                    }
                };
                let usecase = JoinGameUseCase::new(
                    self.state.lobby.clone(),
                    self.state.broadcaster.clone(),
                    self.state.rules.clone(),
                );
                if let Err(e) = usecase.execute(id, name).await {
                    tracing::warn!("Rejected join from '{}': {}", id, e);
                    self.reply_error(id, e.to_string()).await;
                }
            }
            ClientMessage::Move(request) => {
                let usecase = ApplyMoveUseCase::new(
                    self.state.lobby.clone(),
                    self.state.broadcaster.clone(),
                    self.state.rules.clone(),
                    self.state.seat_policy,
                );
                if let Err(e) = usecase.execute(id, request.into()).await {
                    tracing::warn!("Rejected move from '{}': {}", id, e);
                    self.reply_error(id, e.to_string()).await;
                }
            }
        }
    }

    /// Handle the close of `id`'s channel.
    pub async fn disconnect(&self, id: ConnectionId) {
        DisconnectPlayerUseCase::new(self.state.lobby.clone(), self.state.broadcaster.clone())
            .execute(id)
            .await;
    }

    async fn reply_error(&self, id: ConnectionId, message: String) {
        self.state
            .broadcaster
            .send_to(id, &ErrorMessage::new(message))
            .await;
    }
}
