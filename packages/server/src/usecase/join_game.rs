//! UseCase: 対局参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinGameUseCase::execute() メソッド
//! - 待機・ペアリング・観戦への振り分けと、それぞれの通知内容
//!
//! ### なぜこのテストが必要か
//! - 2 人目の参加でセッションが作られ、welcome → start → turn の順で通知されることを保証
//! - 対局中の参加者が観戦者として扱われ、着席しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：1 人目の待機、2 人目でのペアリング
//! - 正常系：対局中の 3 人目の観戦
//! - 異常系：参加済みの接続による再 join

use std::sync::Arc;

use banmen_shared::time::get_jst_timestamp;
use tokio::sync::Mutex;

use crate::{
    domain::{
        Color, ConnectionId, DisplayName, GameError, JoinOutcome, Lobby, RulesEngine, Timestamp,
    },
    infrastructure::{
        Broadcaster,
        dto::websocket::{
            MessageType, SpectatorMessage, StartMessage, TurnMessage, WelcomeMessage,
        },
    },
};

const SPECTATOR_NOTICE: &str = "You are watching the game as a spectator.";
const NOTHING_TO_WATCH_NOTICE: &str = "The game is full and there is no game to watch yet.";

/// 対局参加のユースケース
pub struct JoinGameUseCase {
    lobby: Arc<Mutex<Lobby>>,
    broadcaster: Arc<Broadcaster>,
    rules: Arc<dyn RulesEngine>,
}

impl JoinGameUseCase {
    /// 新しい JoinGameUseCase を作成
    pub fn new(
        lobby: Arc<Mutex<Lobby>>,
        broadcaster: Arc<Broadcaster>,
        rules: Arc<dyn RulesEngine>,
    ) -> Self {
        Self {
            lobby,
            broadcaster,
            rules,
        }
    }

    /// 対局参加を実行
    ///
    /// # Arguments
    ///
    /// * `id` - 参加する接続のハンドル
    /// * `name` - 表示名
    ///
    /// # Returns
    ///
    /// * `Ok(JoinOutcome)` - 待機 / ペアリング / 観戦のいずれか
    /// * `Err(GameError)` - 参加済み、または未登録の接続
    pub async fn execute(
        &self,
        id: ConnectionId,
        name: DisplayName,
    ) -> Result<JoinOutcome, GameError> {
        let now = Timestamp::new(get_jst_timestamp());

        let mut lobby = self.lobby.lock().await;
        let outcome = lobby.join(id, name.clone(), self.rules.as_ref(), now)?;

        match &outcome {
            JoinOutcome::Waiting { player_id } => {
                self.send_welcome(id, *player_id, &name).await;
                tracing::info!("'{}' ({}) is waiting for an opponent", name, id);
            }
            JoinOutcome::Paired {
                player_id,
                session_id,
                seats,
            } => {
                self.send_welcome(id, *player_id, &name).await;

                for color in [Color::White, Color::Black] {
                    let start = StartMessage {
                        r#type: MessageType::Start,
                        game_id: session_id.as_str().to_string(),
                        color,
                        flipped: color == Color::Black,
                        first_player: Color::White,
                    };
                    self.broadcaster.send_to(seats.get(color), &start).await;
                }
                self.broadcaster
                    .broadcast(&lobby, session_id, &TurnMessage::new(Color::White))
                    .await;

                tracing::info!(
                    "Session '{}' started: white '{}', black '{}'",
                    session_id,
                    seats.white,
                    seats.black
                );
            }
            JoinOutcome::Spectating { session_id } => {
                let message = SpectatorMessage {
                    r#type: MessageType::Spectator,
                    message: match session_id {
                        Some(_) => SPECTATOR_NOTICE,
                        None => NOTHING_TO_WATCH_NOTICE,
                    }
                    .to_string(),
                    game_id: session_id.as_ref().map(|s| s.as_str().to_string()),
                };
                self.broadcaster.send_to(id, &message).await;
                match session_id {
                    Some(session_id) => {
                        tracing::info!("'{}' ({}) is spectating '{}'", name, id, session_id)
                    }
                    None => tracing::info!("'{}' ({}) has nothing to watch", name, id),
                }
            }
        }

        Ok(outcome)
    }

    async fn send_welcome(&self, id: ConnectionId, player_id: usize, name: &DisplayName) {
        let welcome = WelcomeMessage {
            r#type: MessageType::Welcome,
            player_id,
            name: name.as_str().to_string(),
        };
        self.broadcaster.send_to(id, &welcome).await;
    }
}
