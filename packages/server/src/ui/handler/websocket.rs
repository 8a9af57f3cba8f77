//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{Stream, StreamExt},
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::ConnectionId,
    ui::{dispatcher::Dispatcher, state::AppState},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let dispatcher = Arc::new(Dispatcher::new(state));

    // Create a channel for this connection to receive messages
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = dispatcher.connect(tx).await;
    tracing::info!("Connection '{}' opened", id);

    let (mut sender, receiver) = socket.split();
    let (stop_tx, stop_rx) = oneshot::channel();

    // Spawn a task to receive frames from this connection
    let mut recv_task = tokio::spawn(pump_frames(receiver, dispatcher.clone(), id, stop_rx));

    // Spawn a task to forward queued messages to this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If the receiver ends, abort the sender. If the sender ends, stop the
    // receiver between frames so a dispatch in progress finishes its broadcasts.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            let _ = stop_tx.send(());
            let _ = (&mut recv_task).await;
        }
    };

    dispatcher.disconnect(id).await;
    tracing::info!("Connection '{}' closed", id);
}

/// Dispatch inbound frames until the stream ends, a close frame arrives or
/// `stop` fires. `stop` is only observed while waiting for the next frame.
async fn pump_frames<S>(
    mut receiver: S,
    dispatcher: Arc<Dispatcher>,
    id: ConnectionId,
    mut stop: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = &mut stop => break,
        };
        let Some(msg) = msg else {
            break;
        };
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!("WebSocket error on '{}': {}", id, e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received from '{}': {}", id, text);
                dispatcher.dispatch(id, text.as_str()).await;
            }
            Message::Binary(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                tracing::debug!("Received binary from '{}': {}", id, text);
                dispatcher.dispatch(id, &text).await;
            }
            Message::Ping(_) => {
                tracing::debug!("Received ping");
                // Ping/pong is handled automatically by the WebSocket protocol
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", id);
                break;
            }
            _ => {}
        }
    }
}
