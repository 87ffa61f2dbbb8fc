//! Interactive terminal client.

use crate::games::reversi::{Color, Game, Player, Position, Room};
use crate::protocol::{MatchEvent, PlayAction, PlayEvent, PlayRequest, ProtocolState};
use anyhow::{Context, Result, bail};
use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument};

const PROMPT: &str = "Input Your Move (ex. A-1):";

/// Client connected to one game server.
#[derive(Debug, Clone)]
pub struct ReversiClient {
    server_url: String,
}

impl ReversiClient {
    /// Creates a client for a server such as `ws://127.0.0.1:50051`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Finds an opponent and plays one game to the end.
    #[instrument(skip(self), fields(server_url = %self.server_url))]
    pub async fn run(&self) -> Result<()> {
        let (room, me) = self.matching().await?;
        println!("Matched room_id={}", room.id());
        self.play(&room, me).await
    }

    /// Runs `JoinRoom` until matched.
    #[instrument(skip(self))]
    pub async fn matching(&self) -> Result<(Room, Player)> {
        let url = format!("{}/join", self.server_url);
        let (mut stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        println!("Requested matching...");
        while let Some(message) = stream.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match serde_json::from_str::<MatchEvent>(text.as_str())? {
                MatchEvent::Waiting { room } => {
                    debug!(room_id = *room.id(), "Waiting in room");
                    println!("Waiting matching...");
                }
                MatchEvent::Matched { room, me } => {
                    info!(room_id = *room.id(), player_id = *me.id(), "Matched");
                    return Ok((room, me));
                }
                MatchEvent::Error { message } => bail!("Matching failed: {}", message),
            }
        }

        bail!("Server closed the matching stream")
    }

    /// Runs the `Play` stream for `room` as `me`.
    #[instrument(skip(self, room), fields(room_id = *room.id()))]
    pub async fn play(&self, room: &Room, me: Player) -> Result<()> {
        let url = format!("{}/play", self.server_url);
        let (stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        let (mut write, mut read) = stream.split();

        let mut game = Game::new(*me.color());
        let mut protocol = ProtocolState::default();
        let room_id = *room.id();

        protocol.request(&PlayAction::Start)?;
        send(
            &mut write,
            &PlayRequest {
                room_id,
                player: me,
                action: PlayAction::Start,
            },
        )
        .await?;

        let mut input = spawn_stdin_reader();

        loop {
            tokio::select! {
                message = read.next() => {
                    let Some(message) = message else {
                        bail!("Server closed the connection");
                    };
                    let text = match message? {
                        Message::Text(text) => text,
                        Message::Close(_) => bail!("Server closed the connection"),
                        _ => continue,
                    };

                    let event: PlayEvent = serde_json::from_str(text.as_str())?;
                    protocol.observe(&event)?;

                    match event {
                        PlayEvent::Waiting => println!("Waiting until opponent player ready"),
                        PlayEvent::Ready => {
                            println!("READY GO!");
                            println!("{}", render(&game));
                            prompt();
                        }
                        PlayEvent::MoveApplied { player, x, y, board } => {
                            game.sync_board(board);
                            if player.color() != me.color()
                                && let Some(pos) = Position::new(x, y)
                            {
                                println!("\nOpponent played {}", pos);
                            }
                            println!("{}", render(&game));
                            if !game.is_finished() {
                                prompt();
                            }
                        }
                        PlayEvent::Finished { winner, board } => {
                            game.sync_board(board);
                            println!("{}", render(&game));
                            println!("{}", outcome_message(winner, *me.color()));
                            return Ok(());
                        }
                        PlayEvent::Error { message } => {
                            println!("{}", message);
                            prompt();
                        }
                    }
                }
                line = input.recv() => {
                    let Some(line) = line else {
                        bail!("Input closed");
                    };
                    if !protocol.can_move() {
                        println!("Waiting until opponent player ready");
                        continue;
                    }

                    let pos = match Position::parse_notation(&line) {
                        Ok(pos) => pos,
                        Err(e) => {
                            println!("{}", e);
                            prompt();
                            continue;
                        }
                    };
                    if !game.board().can_place(pos.x, pos.y, *me.color()) {
                        println!("Can not put stone at {}", pos);
                        prompt();
                        continue;
                    }

                    let action = PlayAction::Move { x: pos.x, y: pos.y };
                    protocol.request(&action)?;
                    send(&mut write, &PlayRequest { room_id, player: me, action }).await?;
                }
            }
        }
    }
}

async fn send<S, T>(sink: &mut S, value: &T) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
    T: Serialize,
{
    let text = serde_json::to_string(value)?;
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt() {
    print!("{}", PROMPT);
    let _ = std::io::stdout().flush();
}

/// Draws the board with column letters, row numbers and the score line.
pub fn render(game: &Game) -> String {
    let board = game.board();
    let mut out = String::from("\n");

    if game.me() != Color::None {
        out.push_str(&format!("You: {}\n", game.me().symbol()));
    }

    out.push_str(" ｜A｜B｜C｜D｜E｜F｜G｜H\n");
    out.push_str("ーーーーーーーーーーーーーー\n");
    for y in 1..=8 {
        out.push_str(&format!("{}｜", y));
        for x in 1..=8 {
            let cell = board.get(x, y).unwrap_or(Color::Empty);
            out.push_str(cell.symbol());
            out.push('｜');
        }
        out.push('\n');
    }
    out.push_str("ーーーーーーーーーーーーーー\n");
    out.push_str(&format!(
        "Score: BLACK={}, WHITE={} REST={}\n",
        board.score(Color::Black),
        board.score(Color::White),
        board.empty_count()
    ));
    out
}

/// Result line shown to the player of color `me`.
pub fn outcome_message(winner: Color, me: Color) -> &'static str {
    if winner == Color::None {
        "Draw!"
    } else if winner == me {
        "You Win!"
    } else {
        "You Lose!"
    }
}
