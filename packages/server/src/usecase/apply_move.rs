//! UseCase: 指し手処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ApplyMoveUseCase::execute() メソッド
//! - move → turn（→ game_over）の通知順序と、終局時のセッション削除
//!
//! ### なぜこのテストが必要か
//! - 全メンバーが同じ順序で盤面の変化を受け取ることを保証
//! - 拒否された指し手が状態を変えず、送信者以外に通知されないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：白の 1 手目
//! - 正常系：チェックメイトによる終局
//! - 正常系：同一局面 3 回の繰り返しによる引き分け
//! - 異常系：手番違い、観戦者の指し手、終局後の指し手

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{
        AppliedMove, ConnectionId, GameError, Lobby, MoveCommand, RulesEngine, SeatPolicy,
    },
    infrastructure::{
        Broadcaster,
        dto::websocket::{GameOverMessage, MessageType, MoveMessage, MovePayload, TurnMessage},
    },
};

/// 指し手のユースケース
pub struct ApplyMoveUseCase {
    lobby: Arc<Mutex<Lobby>>,
    broadcaster: Arc<Broadcaster>,
    rules: Arc<dyn RulesEngine>,
    seat_policy: SeatPolicy,
}

impl ApplyMoveUseCase {
    /// 新しい ApplyMoveUseCase を作成
    pub fn new(
        lobby: Arc<Mutex<Lobby>>,
        broadcaster: Arc<Broadcaster>,
        rules: Arc<dyn RulesEngine>,
        seat_policy: SeatPolicy,
    ) -> Self {
        Self {
            lobby,
            broadcaster,
            rules,
            seat_policy,
        }
    }

    /// 指し手を検証・適用し、セッションの全メンバーへ通知する
    ///
    /// # Arguments
    ///
    /// * `requester` - 指し手を送信した接続
    /// * `command` - 未検証の指し手
    ///
    /// # Returns
    ///
    /// * `Ok(AppliedMove)` - 受理された指し手
    /// * `Err(GameError)` - InvalidSession / OutOfTurn / IllegalMove（送信者にのみ返す）
    pub async fn execute(
        &self,
        requester: ConnectionId,
        command: MoveCommand,
    ) -> Result<AppliedMove, GameError> {
        let mut lobby = self.lobby.lock().await;
        let (session_id, applied) =
            lobby.apply_move(requester, &command, self.rules.as_ref(), self.seat_policy)?;

        let move_message = MoveMessage {
            r#type: MessageType::Move,
            r#move: MovePayload {
                from: applied.record.from.as_str().to_string(),
                to: applied.record.to.as_str().to_string(),
            },
        };
        self.broadcaster
            .broadcast(&lobby, &session_id, &move_message)
            .await;
        self.broadcaster
            .broadcast(&lobby, &session_id, &TurnMessage::new(applied.turn))
            .await;

        tracing::debug!(
            "Session '{}': {}{} by '{}'",
            session_id,
            applied.record.from,
            applied.record.to,
            requester
        );

        if let Some(result) = applied.result {
            let game_over = GameOverMessage {
                r#type: MessageType::GameOver,
                result,
            };
            self.broadcaster
                .broadcast(&lobby, &session_id, &game_over)
                .await;
            lobby.close_session(&session_id);
            tracing::info!("Session '{}' ended: {:?}", session_id, result);
        }

        Ok(applied)
    }
}
