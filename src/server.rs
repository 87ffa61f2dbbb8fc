//! WebSocket server exposing `JoinRoom` (`/join`) and `Play` (`/play`).

use crate::config::ServerConfig;
use crate::matchmaking::Matchmaker;
use crate::protocol::{MatchEvent, PlayAction, PlayEvent, PlayRequest, ProtocolState};
use crate::session::{EventSender, SessionRegistry};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Registries shared by every connection.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Pairs joiners into rooms.
    pub matchmaker: Matchmaker,
    /// Live games per room.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Builds the registries described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            matchmaker: Matchmaker::with_timeout(config.match_timeout()),
            sessions: SessionRegistry::with_turn_order(*config.enforce_turn_order()),
        }
    }
}

/// Main server handle.
#[derive(Debug, Clone)]
pub struct GameServer {
    config: ServerConfig,
    state: AppState,
}

impl GameServer {
    /// Creates a server from configuration.
    #[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
    pub fn new(config: ServerConfig) -> Self {
        info!("Creating game server");
        let state = AppState::from_config(&config);
        Self { config, state }
    }

    /// Shared registries.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes for both RPC surfaces.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/join", get(join_handler))
            .route("/play", get(play_handler))
            .with_state(self.state.clone())
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener =
            TcpListener::bind((self.config.host().as_str(), *self.config.port())).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        if let Some(interval) = self.config.reap_interval() {
            spawn_reaper(self.state.sessions.clone(), interval, self.config.reap_idle());
        }

        info!(addr = %listener.local_addr()?, "Server ready");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Periodically evicts finished sessions that went idle.
pub fn spawn_reaper(sessions: SessionRegistry, interval: Duration, idle: Duration) -> JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        idle_secs = idle.as_secs(),
        "Starting session reaper"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle_finished(idle);
            debug!(count = evicted.len(), "Reaper sweep done");
        }
    })
}

async fn join_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_join(socket, state))
}

async fn play_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_play(socket, state))
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    socket.send(Message::Text(text.into())).await?;
    Ok(())
}

/// Streams matchmaking events until a terminal one or a hang-up.
#[instrument(skip_all)]
async fn handle_join(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let matchmaker = state.matchmaker.clone();
    let mut join = tokio::spawn(async move { matchmaker.join_room(&tx).await });

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = send_json(&mut socket, &event).await {
                    warn!(error = %e, "Join stream closed");
                    join.abort();
                    return;
                }
            }
            incoming = socket.recv() => {
                if matches!(incoming, None | Some(Err(_)) | Some(Ok(Message::Close(_)))) {
                    debug!("Joiner hung up");
                    join.abort();
                    return;
                }
            }
        }
    }

    let failure = match (&mut join).await {
        Ok(Ok((room, me))) => {
            info!(room_id = *room.id(), player_id = *me.id(), "Join completed");
            None
        }
        Ok(Err(e)) => Some(e.to_string()),
        Err(e) => {
            error!(error = %e, "Join task failed");
            Some("internal error".to_string())
        }
    };

    if let Some(message) = failure {
        let _ = send_json(&mut socket, &MatchEvent::Error { message }).await;
    }
    let _ = socket.send(Message::Close(None)).await;
}

/// What to do with the connection after a request.
enum Flow {
    Continue,
    Close(String),
}

/// Drives one `Play` stream.
#[instrument(skip_all)]
async fn handle_play(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut protocol = ProtocolState::default();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = protocol.observe(&event) {
                    warn!(error = %e, "Unexpected event for connection");
                }
                if let Err(e) = send_json(&mut socket, &event).await {
                    warn!(error = %e, "Play stream closed");
                    break;
                }
                if event.is_terminal() {
                    break;
                }
            }
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(error = %e, "Play stream failed");
                        break;
                    }
                };

                let flow = match serde_json::from_str::<PlayRequest>(text.as_str()) {
                    Ok(request) => handle_request(&state, &mut protocol, request, &tx),
                    Err(e) => {
                        reject(&tx, format!("Malformed request: {}", e));
                        Flow::Continue
                    }
                };

                if let Flow::Close(message) = flow {
                    let _ = send_json(&mut socket, &PlayEvent::Error { message }).await;
                    break;
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

fn reject(tx: &EventSender, message: String) {
    let _ = tx.send(PlayEvent::Error { message });
}

#[instrument(skip(state, protocol, tx), fields(room_id = request.room_id, protocol_state = %protocol))]
fn handle_request(
    state: &AppState,
    protocol: &mut ProtocolState,
    request: PlayRequest,
    tx: &EventSender,
) -> Flow {
    if let Err(e) = protocol.request(&request.action) {
        warn!(error = %e, "Out of order request");
        reject(tx, e.to_string());
        return Flow::Continue;
    }

    let result = match request.action {
        PlayAction::Start => state
            .sessions
            .start(request.room_id, request.player, tx.clone())
            .map(|_| ()),
        PlayAction::Move { x, y } => state
            .sessions
            .apply_move(request.room_id, x, y, request.player)
            .map(|finished| debug!(finished, "Move handled")),
    };

    match result {
        Ok(()) => Flow::Continue,
        Err(e) if e.is_recoverable() => {
            reject(tx, e.to_string());
            Flow::Continue
        }
        Err(e) => {
            warn!(error = %e, "Closing play stream");
            Flow::Close(e.to_string())
        }
    }
}
