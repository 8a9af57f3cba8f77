//! Chess session server: router, handlers and shared state.

mod dispatcher;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use dispatcher::Dispatcher;
pub use runner::{build_router, run};
