//! Matchmaking: pairs anonymous joiners into two-player rooms.

use crate::games::reversi::{Color, Player, PlayerId, Room, RoomId};
use crate::protocol::MatchEvent;
use derive_more::{Display, Error};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

/// How long a host waits for a guest by default.
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Sink for the events of one `JoinRoom` call.
pub type MatchSender = mpsc::UnboundedSender<MatchEvent>;

/// Error returned when a join does not produce a match.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MatchError {
    /// Nobody joined the room before the deadline.
    #[display("No opponent joined room {room_id} within {}s", waited.as_secs())]
    Timeout {
        /// The room left waiting.
        room_id: RoomId,
        /// The deadline that elapsed.
        waited: Duration,
    },

    /// The registry went away while waiting.
    #[display("Matchmaking for room {room_id} was cancelled")]
    Cancelled {
        /// The room left waiting.
        room_id: RoomId,
    },
}

#[derive(Debug, Default)]
struct MatchTable {
    rooms: BTreeMap<RoomId, Room>,
    /// Wake-up handles of hosts still waiting, keyed by their room.
    waiting: HashMap<RoomId, oneshot::Sender<Room>>,
    max_player_id: PlayerId,
    max_room_id: RoomId,
}

impl MatchTable {
    fn next_player_id(&mut self) -> PlayerId {
        self.max_player_id += 1;
        self.max_player_id
    }

    /// Lowest-numbered room whose host is still waiting.
    fn open_room(&mut self) -> Option<RoomId> {
        // A host that hung up leaves a closed sender behind; that room can
        // never be completed.
        self.waiting.retain(|room_id, tx| {
            let alive = !tx.is_closed();
            if !alive {
                debug!(room_id, "Dropping abandoned room");
            }
            alive
        });

        self.rooms
            .values()
            .filter(|room| !room.is_full())
            .map(|room| *room.id())
            .find(|room_id| self.waiting.contains_key(room_id))
    }
}

/// Outcome of the non-blocking part of a join.
enum Ticket {
    Matched(Room, Player),
    Hosting(Room, Player, oneshot::Receiver<Room>),
}

/// Shared matchmaking registry.
#[derive(Debug, Clone)]
pub struct Matchmaker {
    table: Arc<RwLock<MatchTable>>,
    timeout: Duration,
}

impl Matchmaker {
    /// Creates a matchmaker with the default two-minute deadline.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_MATCH_TIMEOUT)
    }

    /// Creates a matchmaker whose hosts give up after `timeout`.
    #[instrument]
    pub fn with_timeout(timeout: Duration) -> Self {
        info!(timeout_secs = timeout.as_secs(), "Creating matchmaker");
        Self {
            table: Arc::new(RwLock::new(MatchTable::default())),
            timeout,
        }
    }

    /// Joins the first open room, or opens a new one and waits for a guest.
    ///
    /// Streams `Waiting` (hosts only) and then `Matched` into `events`, and
    /// returns the room together with the caller's own player.
    #[instrument(skip(self, events))]
    pub async fn join_room(&self, events: &MatchSender) -> Result<(Room, Player), MatchError> {
        match self.take_ticket() {
            Ticket::Matched(room, me) => {
                emit(events, MatchEvent::Matched {
                    room: room.clone(),
                    me,
                });
                Ok((room, me))
            }
            Ticket::Hosting(room, me, wake) => {
                emit(events, MatchEvent::Waiting { room: room.clone() });
                let room = self.wait_for_guest(room, wake).await?;
                emit(events, MatchEvent::Matched {
                    room: room.clone(),
                    me,
                });
                Ok((room, me))
            }
        }
    }

    fn take_ticket(&self) -> Ticket {
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let table = &mut *guard;
        let player_id = table.next_player_id();

        if let Some(room_id) = table.open_room() {
            let me = Player::new(player_id, Color::White);
            if let Some(room) = table.rooms.get_mut(&room_id)
                && room.seat_guest(me)
            {
                let room = room.clone();
                if let Some(host) = table.waiting.remove(&room_id) {
                    // The host may cancel between the scan and this send;
                    // the room is full either way.
                    let _ = host.send(room.clone());
                }
                info!(room_id, player_id, "Matched");
                return Ticket::Matched(room, me);
            }
        }

        table.max_room_id += 1;
        let room_id = table.max_room_id;
        let me = Player::new(player_id, Color::Black);
        let room = Room::new(room_id, me);
        let (tx, rx) = oneshot::channel();
        table.rooms.insert(room_id, room.clone());
        table.waiting.insert(room_id, tx);
        info!(room_id, player_id, "Opened room");
        Ticket::Hosting(room, me, rx)
    }

    async fn wait_for_guest(
        &self,
        room: Room,
        wake: oneshot::Receiver<Room>,
    ) -> Result<Room, MatchError> {
        let room_id = *room.id();
        match tokio::time::timeout(self.timeout, wake).await {
            Ok(Ok(room)) => Ok(room),
            Ok(Err(_)) => Err(MatchError::Cancelled { room_id }),
            Err(_) => {
                let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
                // A guest may have been seated right at the deadline.
                if let Some(room) = table.rooms.get(&room_id).filter(|room| room.is_full()) {
                    return Ok(room.clone());
                }
                table.waiting.remove(&room_id);
                warn!(room_id, "Matchmaking timed out");
                Err(MatchError::Timeout {
                    room_id,
                    waited: self.timeout,
                })
            }
        }
    }

    /// Returns a copy of a room.
    pub fn room(&self, room_id: RoomId) -> Option<Room> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rooms
            .get(&room_id)
            .cloned()
    }

    /// Number of rooms ever opened.
    pub fn room_count(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rooms
            .len()
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(events: &MatchSender, event: MatchEvent) {
    if events.send(event).is_err() {
        debug!("Join caller stopped listening");
    }
}
