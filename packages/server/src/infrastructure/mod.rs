//! Infrastructure layer.
//!
//! Concrete adapters behind the domain: the chess rules engine, message
//! delivery to sockets, and wire DTOs.

pub mod broadcaster;
pub mod dto;
pub mod rules;

pub use broadcaster::{Broadcaster, ClientInfo};
pub use rules::ChessRulesEngine;
