//! UseCase: 切断処理
//!
//! 接続の送信チャンネルを解除し、待機列・観戦リストから取り除きます。
//! 着席者の切断ではセッションの残りのメンバーに終了通知を送り、
//! セッションを削除します。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, DisconnectOutcome, GameError, Lobby},
    infrastructure::{Broadcaster, dto::websocket::ErrorMessage},
};

/// 切断のユースケース
pub struct DisconnectPlayerUseCase {
    lobby: Arc<Mutex<Lobby>>,
    broadcaster: Arc<Broadcaster>,
}

impl DisconnectPlayerUseCase {
    /// 新しい DisconnectPlayerUseCase を作成
    pub fn new(lobby: Arc<Mutex<Lobby>>, broadcaster: Arc<Broadcaster>) -> Self {
        Self { lobby, broadcaster }
    }

    /// 切断を実行
    ///
    /// 登録されていない接続に対しては何もしない。
    pub async fn execute(&self, id: ConnectionId) -> DisconnectOutcome {
        let mut lobby = self.lobby.lock().await;
        let name = lobby
            .display_name(id)
            .map(|n| n.as_str().to_string())
            .unwrap_or_default();

        self.broadcaster.unregister(id).await;
        let outcome = lobby.disconnect(id);

        if let Some(session_id) = &outcome.abandoned_session {
            let notice = ErrorMessage::new(GameError::PeerDisconnected.to_string());
            self.broadcaster
                .broadcast(&lobby, session_id, &notice)
                .await;
            lobby.close_session(session_id);
            tracing::info!(
                "'{}' ({}) left session '{}', session closed",
                name,
                id,
                session_id
            );
        } else {
            tracing::debug!("'{}' ({}) disconnected", name, id);
        }

        outcome
    }
}
