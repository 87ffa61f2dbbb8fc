//! Reversi Online library - two-player Reversi over WebSockets
//!
//! # Architecture
//!
//! - **Games**: Board rules and game lifecycle (`games::reversi`)
//! - **Matchmaking**: Pairs anonymous joiners into rooms of two
//! - **Session**: Applies moves per room and fans events out to both players
//! - **Server**: axum WebSocket endpoints `/join` and `/play`
//! - **Client**: Terminal client with `A-1` move input
//!
//! # Example
//!
//! ```no_run
//! use reversi_online::{GameServer, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = GameServer::new(ServerConfig::default().with_port(50051));
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod client;
mod config;
mod games;
mod matchmaking;
mod protocol;
mod server;
mod session;

// Crate-level exports - Game types (reversi)
pub use games::reversi::{
    Board, BoardError, Color, Game, GamePhase, ParseMoveError, Player, PlayerId, Position, Room,
    RoomId,
};

// Crate-level exports - Wire protocol
pub use protocol::{
    MatchEvent, PlayAction, PlayEvent, PlayRequest, ProtocolError, ProtocolState,
};

// Crate-level exports - Matchmaking
pub use matchmaking::{DEFAULT_MATCH_TIMEOUT, MatchError, MatchSender, Matchmaker};

// Crate-level exports - Session management
pub use session::{EventSender, SessionError, SessionRegistry, SessionSnapshot};

// Crate-level exports - Server and configuration
pub use config::{ConfigError, ServerConfig};
pub use server::{AppState, GameServer, spawn_reaper};

// Crate-level exports - Client
pub use client::{ReversiClient, outcome_message, render};
