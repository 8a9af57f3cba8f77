//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層（Dispatcher）から呼び出され、Lobby を一つのロックの下で操作し、
//! 結果を Broadcaster 経由で接続へ通知します。

pub mod apply_move;
pub mod connect_player;
pub mod disconnect_player;
pub mod join_game;

#[cfg(test)]
pub(crate) mod test_support;

pub use apply_move::ApplyMoveUseCase;
pub use connect_player::ConnectPlayerUseCase;
pub use disconnect_player::DisconnectPlayerUseCase;
pub use join_game::JoinGameUseCase;
