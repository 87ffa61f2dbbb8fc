//! Reversi Online - Unified CLI

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use reversi_online::{GameServer, ReversiClient, ServerConfig};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Server {
            config,
            host,
            port,
            enforce_turn_order,
        } => run_server(config, host, port, enforce_turn_order).await,
        Command::Play { server_url } => run_client(server_url).await,
    }
}

/// Run the game server
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_server(
    config_path: PathBuf,
    host: Option<String>,
    port: Option<u16>,
    enforce_turn_order: bool,
) -> Result<()> {
    initialize_tracing("info,reversi_online=debug");

    let mut config = ServerConfig::load_or_default(&config_path)?;
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if enforce_turn_order {
        config = config.with_turn_order(true);
    }

    info!(
        host = %config.host(),
        port = config.port(),
        enforce_turn_order = config.enforce_turn_order(),
        "Starting Reversi server"
    );
    GameServer::new(config).run().await
}

/// Run the terminal client
async fn run_client(server_url: String) -> Result<()> {
    // Keep the board readable: only warnings unless RUST_LOG says otherwise.
    initialize_tracing("warn");
    ReversiClient::new(server_url).run().await
}

fn initialize_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
