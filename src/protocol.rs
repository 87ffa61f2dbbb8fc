//! Wire messages and the per-connection protocol state machine.
//!
//! Both ends of a `Play` stream walk the same states:
//! `Idle -> WaitingStart -> InProgress -> Finished`. The server drives a
//! [`ProtocolState`] from the requests it receives and the events it forwards;
//! the client drives one from the requests it sends and the events it
//! receives.

use crate::games::reversi::{Board, Color, Player, Room, RoomId};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Message streamed back by `JoinRoom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A room was opened for the caller; waiting for an opponent.
    Waiting {
        /// The half-filled room.
        room: Room,
    },
    /// Terminal: both seats are filled.
    Matched {
        /// The full room.
        room: Room,
        /// The caller's own identity.
        me: Player,
    },
    /// Terminal: matchmaking failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Message sent by a client on the `Play` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRequest {
    /// Room obtained from matchmaking.
    pub room_id: RoomId,
    /// The sender.
    pub player: Player,
    /// What the sender wants to do.
    pub action: PlayAction,
}

/// Action carried by a [`PlayRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayAction {
    /// Ready to play.
    Start,
    /// Place a stone.
    Move {
        /// Column, 1..=8.
        x: i32,
        /// Row, 1..=8.
        y: i32,
    },
}

/// Event pushed by the server on the `Play` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayEvent {
    /// Registered; the opponent has not started yet.
    Waiting,
    /// Both players started; moves are accepted.
    Ready,
    /// A move was applied.
    MoveApplied {
        /// Who moved.
        player: Player,
        /// Column.
        x: i32,
        /// Row.
        y: i32,
        /// Board after the move.
        board: Board,
    },
    /// Terminal: the game is over.
    Finished {
        /// Winning color, `none` on a draw.
        winner: Color,
        /// Final board.
        board: Board,
    },
    /// A request was rejected.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl PlayEvent {
    /// True for the event that ends a `Play` stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayEvent::Finished { .. })
    }
}

/// State of one end of a `Play` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// `Start` sent, `Ready` not yet seen.
    WaitingStart,
    /// Moves may be exchanged.
    InProgress,
    /// `Finished` seen. Terminal.
    Finished,
}

/// A request or event that does not fit the current [`ProtocolState`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{} not allowed while {}", what, state)]
pub struct ProtocolError {
    /// State at the time of the violation.
    pub state: ProtocolState,
    /// What was attempted.
    pub what: &'static str,
}

impl ProtocolState {
    /// True while moves may be sent.
    pub fn can_move(self) -> bool {
        self == ProtocolState::InProgress
    }

    /// True once the stream has ended.
    pub fn is_finished(self) -> bool {
        self == ProtocolState::Finished
    }

    /// Advances on an outgoing (client) or incoming (server) request.
    #[instrument]
    pub fn request(&mut self, action: &PlayAction) -> Result<(), ProtocolError> {
        match (*self, action) {
            (ProtocolState::Idle, PlayAction::Start) => {
                *self = ProtocolState::WaitingStart;
                Ok(())
            }
            (ProtocolState::InProgress, PlayAction::Move { .. }) => Ok(()),
            (state, PlayAction::Start) => Err(ProtocolError {
                state,
                what: "start",
            }),
            (state, PlayAction::Move { .. }) => Err(ProtocolError {
                state,
                what: "move",
            }),
        }
    }

    /// Advances on an incoming (client) or outgoing (server) event.
    #[instrument(skip(event))]
    pub fn observe(&mut self, event: &PlayEvent) -> Result<(), ProtocolError> {
        let next = match (*self, event) {
            (_, PlayEvent::Error { .. }) => *self,
            (ProtocolState::WaitingStart, PlayEvent::Waiting) => ProtocolState::WaitingStart,
            (ProtocolState::WaitingStart, PlayEvent::Ready) => ProtocolState::InProgress,
            (ProtocolState::InProgress, PlayEvent::MoveApplied { .. }) => ProtocolState::InProgress,
            (ProtocolState::InProgress, PlayEvent::Finished { .. }) => ProtocolState::Finished,
            (state, PlayEvent::Waiting) => return Err(ProtocolError { state, what: "waiting" }),
            (state, PlayEvent::Ready) => return Err(ProtocolError { state, what: "ready" }),
            (state, PlayEvent::MoveApplied { .. }) => {
                return Err(ProtocolError { state, what: "move_applied" });
            }
            (state, PlayEvent::Finished { .. }) => {
                return Err(ProtocolError { state, what: "finished" });
            }
        };

        if next != *self {
            debug!(from = %self, to = %next, "Protocol state changed");
        }
        *self = next;
        Ok(())
    }
}
