//! Core domain types for reversi.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Contents of a board cell, or a player's stone color.
///
/// `Wall` only ever appears on the border of a [`Board`](super::Board).
/// `None` is never placed; it stands for "no player" (e.g. a drawn game).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// No stone.
    #[default]
    Empty,
    /// Black stone (moves first).
    Black,
    /// White stone.
    White,
    /// Border sentinel.
    Wall,
    /// No player; used for a draw.
    None,
}

impl Color {
    /// Returns the opposing stone color.
    ///
    /// Only `Black` and `White` have opponents; every other value maps to `None`.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            _ => Color::None,
        }
    }

    /// True for the two colors a player can hold.
    pub fn is_stone(self) -> bool {
        matches!(self, Color::Black | Color::White)
    }

    /// Glyph used when drawing the board.
    pub fn symbol(self) -> &'static str {
        match self {
            Color::Black => "○",
            Color::White => "◉",
            Color::Empty => " ",
            Color::Wall | Color::None => "",
        }
    }
}

/// Process-wide player identifier.
pub type PlayerId = u64;

/// Matchmaking room identifier.
pub type RoomId = u64;

/// A matched participant and the color they play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters, Serialize, Deserialize, new)]
pub struct Player {
    /// Unique id, assigned in join order.
    id: PlayerId,
    /// Stone color (`Black` for hosts, `White` for guests).
    color: Color,
}

/// A pairing of a host and, once matched, a guest.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Room {
    /// Room id.
    id: RoomId,
    /// First player to join; always black.
    host: Player,
    /// Second player to join; always white.
    guest: Option<Player>,
}

impl Room {
    /// Opens a room with only a host present.
    pub fn new(id: RoomId, host: Player) -> Self {
        Self {
            id,
            host,
            guest: None,
        }
    }

    /// True once a guest has joined.
    pub fn is_full(&self) -> bool {
        self.guest.is_some()
    }

    /// Seats the guest. A room fills exactly once; later calls are ignored.
    pub(crate) fn seat_guest(&mut self, guest: Player) -> bool {
        if self.guest.is_some() {
            return false;
        }
        self.guest = Some(guest);
        true
    }
}
