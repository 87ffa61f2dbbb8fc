//! Command-line interface for reversi_online.

use clap::{Parser, Subcommand};

/// Reversi Online - two-player Reversi server and terminal client
#[derive(Parser, Debug)]
#[command(name = "reversi_online")]
#[command(about = "Online Reversi with matchmaking", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Server {
        /// Path to server config (TOML). Defaults are used if missing.
        #[arg(short, long, default_value = "reversi.toml")]
        config: std::path::PathBuf,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Reject moves made out of turn
        #[arg(long)]
        enforce_turn_order: bool,
    },

    /// Join a game from the terminal
    Play {
        /// Game server URL
        #[arg(long, default_value = "ws://127.0.0.1:50051")]
        server_url: String,
    },
}
