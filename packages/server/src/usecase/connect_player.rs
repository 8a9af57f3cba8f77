//! UseCase: 接続登録処理
//!
//! 新しい WebSocket 接続を Lobby のアリーナに登録し、送信チャンネルを
//! Broadcaster に紐付けます。

use std::sync::Arc;

use banmen_shared::time::get_jst_timestamp;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    domain::{ConnectionId, Lobby, Timestamp},
    infrastructure::{Broadcaster, ClientInfo},
};

/// 接続登録のユースケース
pub struct ConnectPlayerUseCase {
    lobby: Arc<Mutex<Lobby>>,
    broadcaster: Arc<Broadcaster>,
}

impl ConnectPlayerUseCase {
    /// 新しい ConnectPlayerUseCase を作成
    pub fn new(lobby: Arc<Mutex<Lobby>>, broadcaster: Arc<Broadcaster>) -> Self {
        Self { lobby, broadcaster }
    }

    /// 接続を登録し、割り当てたハンドルを返す
    ///
    /// # Arguments
    ///
    /// * `sender` - この接続へのメッセージ送信チャンネル
    pub async fn execute(&self, sender: UnboundedSender<String>) -> ConnectionId {
        let connected_at = get_jst_timestamp();

        // ロック順序: lobby → broadcaster
        let mut lobby = self.lobby.lock().await;
        let id = lobby.connect(Timestamp::new(connected_at));
        self.broadcaster
            .register(
                id,
                ClientInfo {
                    sender,
                    connected_at,
                },
            )
            .await;

        tracing::debug!("Registered connection '{}'", id);
        id
    }
}
