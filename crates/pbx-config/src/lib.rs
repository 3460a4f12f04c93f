//! Command-line configuration for the PBX server binary.

use clap::Parser;

/// A simulated telephone exchange: accepts one TCP connection per
/// handset and switches calls between them.
#[derive(Debug, Parser)]
#[command(name = "pbx-server", version, about)]
pub struct ServerConfig {
    /// TCP port to listen on (1-65535).
    #[arg(short = 'p', long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..=65535))]
    pub port: u16,
}

impl ServerConfig {
    /// Parse configuration from `std::env::args()`, printing usage and
    /// exiting the process on a malformed invocation.
    pub fn from_args() -> Self {
        ServerConfig::parse()
    }
}
