//! Real-time chess session server library.
//!
//! Pairs two WebSocket connections into a game, relays validated moves to both
//! seats and any spectators, and exposes a read-only HTTP view of the sessions.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::run as run_server;
