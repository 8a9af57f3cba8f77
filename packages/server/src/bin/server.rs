//! Chess session server.
//!
//! Pairs players over WebSocket and relays their moves to both seats and any
//! spectators.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin banmen-server -- --port 3000
//! ```

use banmen_server::ServerConfig;
use banmen_shared::logger::setup_logger;
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = banmen_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
