mod board;
mod game;
mod position;
mod types;

pub use board::{Board, BoardError};
pub use game::{Game, GamePhase};
pub use position::{ParseMoveError, Position};
pub use types::{Color, Player, PlayerId, Room, RoomId};
