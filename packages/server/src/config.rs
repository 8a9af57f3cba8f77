//! Command-line configuration.

use clap::Parser;

use crate::domain::SeatPolicy;

/// Real-time chess session server
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    pub log_level: String,

    /// Only accept a move from the connection seated on the side to move
    #[arg(long)]
    pub bind_moves_to_seat: bool,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn seat_policy(&self) -> SeatPolicy {
        if self.bind_moves_to_seat {
            SeatPolicy::BindToSeat
        } else {
            SeatPolicy::TrustDeclaredColor
        }
    }
}
