//! Game session registry: one live game and its output channels per room.

use crate::games::reversi::{BoardError, Color, Game, Player, RoomId};
use crate::protocol::PlayEvent;
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Players per room.
const ROOM_CAPACITY: usize = 2;

/// Output channel of one connected participant.
pub type EventSender = mpsc::UnboundedSender<PlayEvent>;

/// Error returned by [`SessionRegistry`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// No game has been started for the room.
    #[display("Unknown room {room_id}")]
    UnknownRoom {
        /// Requested room.
        room_id: RoomId,
    },

    /// Both seats are already connected.
    #[display("Room {room_id} already has two players")]
    RoomFull {
        /// Requested room.
        room_id: RoomId,
    },

    /// Turn order is enforced and the other color is due.
    #[display("Not your turn. Waiting for {expected}")]
    NotYourTurn {
        /// Color expected to move.
        expected: Color,
    },

    /// The move was rejected by the board rules.
    #[display("{source}")]
    Board {
        /// Rule violation.
        source: BoardError,
    },

    /// At least one participant could not be reached. Applied moves stay applied.
    #[display("Lost connection to {failed} participant(s) in room {room_id}")]
    ChannelClosed {
        /// Room being broadcast to.
        room_id: RoomId,
        /// Number of channels that rejected the event.
        failed: usize,
    },
}

impl SessionError {
    /// True for errors after which the caller may keep playing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::Board { .. } | SessionError::NotYourTurn { .. }
        )
    }
}

impl From<BoardError> for SessionError {
    fn from(source: BoardError) -> Self {
        SessionError::Board { source }
    }
}

/// Game state and connected participants of one room.
#[derive(Debug)]
struct GameSession {
    room_id: RoomId,
    game: Game,
    channels: Vec<EventSender>,
    expected_next: Color,
    last_activity: Instant,
}

impl GameSession {
    fn new(room_id: RoomId) -> Self {
        info!(room_id, "Creating new game session");
        Self {
            room_id,
            game: Game::new(Color::None),
            channels: Vec::with_capacity(ROOM_CAPACITY),
            expected_next: Color::Black,
            last_activity: Instant::now(),
        }
    }

    /// Sends `event` to every channel, reporting how many failed.
    fn broadcast(&self, event: &PlayEvent) -> Result<(), SessionError> {
        let failed = self
            .channels
            .iter()
            .filter(|tx| tx.send(event.clone()).is_err())
            .count();

        if failed > 0 {
            warn!(room_id = self.room_id, failed, "Broadcast incomplete");
            return Err(SessionError::ChannelClosed {
                room_id: self.room_id,
                failed,
            });
        }
        Ok(())
    }

    /// Color due after `mover` played: the opponent, unless it must pass.
    fn next_after(&self, mover: Color) -> Color {
        let opponent = mover.opponent();
        if self.game.board().legal_move_count(opponent) > 0 {
            opponent
        } else {
            mover
        }
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Copy of the game.
    pub game: Game,
    /// Number of connected channels.
    pub connected: usize,
    /// Color due to move when turn order is enforced.
    pub expected_next: Color,
}

/// Manages all game sessions.
///
/// The outer map lock is only held to find or insert a session. Each session
/// has its own mutex, held across the game mutation and its broadcast, so
/// every participant of a room sees events in application order while other
/// rooms proceed independently.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<RoomId, Arc<Mutex<GameSession>>>>>,
    enforce_turn_order: bool,
}

fn lock(session: &Mutex<GameSession>) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    /// Creates a registry that only checks move legality.
    #[instrument]
    pub fn new() -> Self {
        Self::with_turn_order(false)
    }

    /// Creates a registry, optionally rejecting moves made out of turn.
    #[instrument]
    pub fn with_turn_order(enforce_turn_order: bool) -> Self {
        info!(enforce_turn_order, "Creating session registry");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            enforce_turn_order,
        }
    }

    fn get(&self, room_id: RoomId) -> Option<Arc<Mutex<GameSession>>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&room_id)
            .cloned()
    }

    fn get_or_create(&self, room_id: RoomId) -> Arc<Mutex<GameSession>> {
        if let Some(session) = self.get(room_id) {
            return session;
        }
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(room_id)
            .or_insert_with(|| Arc::new(Mutex::new(GameSession::new(room_id))))
            .clone()
    }

    /// Registers `channel` for the room, creating the session on first use.
    ///
    /// The first participant receives `Waiting`; the second triggers `Ready`
    /// on both channels.
    #[instrument(skip(self, channel), fields(player_id = *player.id()))]
    pub fn start(
        &self,
        room_id: RoomId,
        player: Player,
        channel: EventSender,
    ) -> Result<(), SessionError> {
        let session = self.get_or_create(room_id);
        let mut session = lock(&session);

        if session.channels.len() >= ROOM_CAPACITY {
            warn!(room_id, "Rejecting start for full room");
            return Err(SessionError::RoomFull { room_id });
        }

        session.last_activity = Instant::now();

        if session.channels.len() + 1 == ROOM_CAPACITY {
            session.channels.push(channel);
            session.game.start();
            info!(room_id, "Game has started");
            session.broadcast(&PlayEvent::Ready)
        } else {
            debug!(room_id, "Waiting for opponent to start");
            // A dead channel must not take a seat.
            if channel.send(PlayEvent::Waiting).is_err() {
                warn!(room_id, "Starter left before registration");
                return Err(SessionError::ChannelClosed { room_id, failed: 1 });
            }
            session.channels.push(channel);
            Ok(())
        }
    }

    /// Applies a move and broadcasts the result to the room.
    ///
    /// Returns `Ok(true)` when the game is over. A move against a finished
    /// game changes nothing and broadcasts nothing.
    #[instrument(skip(self), fields(player_id = *player.id(), color = %player.color()))]
    pub fn apply_move(
        &self,
        room_id: RoomId,
        x: i32,
        y: i32,
        player: Player,
    ) -> Result<bool, SessionError> {
        let session = self
            .get(room_id)
            .ok_or(SessionError::UnknownRoom { room_id })?;
        let mut session = lock(&session);

        if session.game.is_finished() {
            debug!(room_id, "Ignoring move after game end");
            return Ok(true);
        }

        let color = *player.color();
        if self.enforce_turn_order && color != session.expected_next {
            warn!(room_id, expected = %session.expected_next, "Move out of turn");
            return Err(SessionError::NotYourTurn {
                expected: session.expected_next,
            });
        }

        let finished = session.game.apply_move(x, y, color).inspect_err(|e| {
            warn!(room_id, error = %e, "Invalid move");
        })?;
        session.expected_next = session.next_after(color);
        session.last_activity = Instant::now();

        let board = session.game.board().clone();
        let moved = session.broadcast(&PlayEvent::MoveApplied {
            player,
            x,
            y,
            board: board.clone(),
        });

        if finished {
            let winner = session.game.winner();
            info!(room_id, %winner, "Game finished");
            let ended = session.broadcast(&PlayEvent::Finished { winner, board });
            moved.and(ended)?;
        } else {
            moved?;
        }

        Ok(finished)
    }

    /// Copies the current state of a room's session.
    pub fn snapshot(&self, room_id: RoomId) -> Option<SessionSnapshot> {
        let session = self.get(room_id)?;
        let session = lock(&session);
        Some(SessionSnapshot {
            game: session.game.clone(),
            connected: session.channels.len(),
            expected_next: session.expected_next,
        })
    }

    /// Number of resident sessions.
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drops finished sessions idle for at least `idle`. Returns their room ids.
    #[instrument(skip(self))]
    pub fn evict_idle_finished(&self, idle: Duration) -> Vec<RoomId> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let expired: Vec<RoomId> = sessions
            .iter()
            .filter(|(_, session)| {
                let session = lock(session);
                session.game.is_finished() && now.duration_since(session.last_activity) >= idle
            })
            .map(|(room_id, _)| *room_id)
            .collect();

        for room_id in &expired {
            sessions.remove(room_id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Evicted finished sessions");
        }
        expired
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
