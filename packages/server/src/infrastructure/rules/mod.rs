//! Rules engine implementations.
//!
//! Concrete implementations of the domain's `RulesEngine` port.

pub mod chess_engine;

pub use chess_engine::ChessRulesEngine;
