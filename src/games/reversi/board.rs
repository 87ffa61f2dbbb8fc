//! Reversi board and capture rules.
//!
//! The board is a 10x10 grid whose outer ring is [`Color::Wall`]. Directional
//! scans stop on the wall, so no bounds checks are needed inside a scan once
//! the starting cell is known to be playable.

use super::position::Position;
use super::types::Color;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Side length including the wall ring.
const SIDE: usize = 10;

/// The eight compass directions as `(dx, dy)`.
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Error returned when a stone cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// The cell is occupied or the placement captures nothing.
    #[display("Can not put stone x={x}, y={y} color={color}")]
    IllegalMove {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
        /// Color that was attempted.
        color: Color,
    },

    /// The coordinate lies outside the 8x8 playable region.
    #[display("Coordinate out of range x={x}, y={y} (expected 1-8)")]
    InvalidCoordinate {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// A received grid holds a value its cell may not hold.
    #[display("Malformed board cell x={x}, y={y} color={color}")]
    MalformedCell {
        /// Column, 0..=9.
        x: i32,
        /// Row, 0..=9.
        y: i32,
        /// Offending value.
        color: Color,
    },
}

/// Reversi board. Cells are addressed `cells[x][y]`.
///
/// Deserialization rejects grids whose border is not all [`Color::Wall`] or
/// whose playable cells hold anything but stones and [`Color::Empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    cells: [[Color; SIDE]; SIDE],
}

/// Unchecked wire form of [`Board`].
#[derive(Deserialize)]
struct RawBoard {
    cells: [[Color; SIDE]; SIDE],
}

impl TryFrom<RawBoard> for Board {
    type Error = BoardError;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        for (x, column) in raw.cells.iter().enumerate() {
            for (y, &color) in column.iter().enumerate() {
                let (x, y) = (x as i32, y as i32);
                let valid = if Position::in_bounds(x, y) {
                    color == Color::Empty || color.is_stone()
                } else {
                    color == Color::Wall
                };
                if !valid {
                    return Err(BoardError::MalformedCell { x, y, color });
                }
            }
        }
        Ok(Self { cells: raw.cells })
    }
}

impl Board {
    /// Creates the standard opening position.
    pub fn new() -> Self {
        let mut cells = [[Color::Empty; SIDE]; SIDE];

        for i in 0..SIDE {
            cells[0][i] = Color::Wall;
            cells[SIDE - 1][i] = Color::Wall;
            cells[i][0] = Color::Wall;
            cells[i][SIDE - 1] = Color::Wall;
        }

        cells[4][4] = Color::White;
        cells[5][5] = Color::White;
        cells[5][4] = Color::Black;
        cells[4][5] = Color::Black;

        Self { cells }
    }

    /// Returns the cell at `(x, y)`, including the wall ring (0..=9).
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.cells.get(x)?.get(y).copied()
    }

    /// Raw grid, wall ring included.
    pub fn cells(&self) -> &[[Color; SIDE]; SIDE] {
        &self.cells
    }

    fn at(&self, x: i32, y: i32) -> Color {
        self.cells[x as usize][y as usize]
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        self.cells[x as usize][y as usize] = color;
    }

    /// Walled board holding only `stones`.
    #[cfg(test)]
    pub(crate) fn from_stones(stones: &[(i32, i32, Color)]) -> Self {
        let mut board = Self::new();
        for p in Position::all() {
            board.set(p.x, p.y, Color::Empty);
        }
        for &(x, y, color) in stones {
            board.set(x, y, color);
        }
        board
    }

    /// Counts opponent stones captured in one direction by placing `color`
    /// at `(x, y)`.
    ///
    /// The run starts at the neighbour `(x + dx, y + dy)` and must end on a
    /// stone of `color`; otherwise nothing is captured and 0 is returned.
    pub fn turnable_run(&self, x: i32, y: i32, color: Color, dx: i32, dy: i32) -> usize {
        if !Position::in_bounds(x, y) || (dx, dy) == (0, 0) || !color.is_stone() {
            return 0;
        }

        let opponent = color.opponent();
        let mut count = 0;
        let (mut nx, mut ny) = (x + dx, y + dy);
        while self.at(nx, ny) == opponent {
            count += 1;
            nx += dx;
            ny += dy;
        }

        if count > 0 && self.at(nx, ny) == color {
            count
        } else {
            0
        }
    }

    /// True if `color` may be placed at `(x, y)`.
    pub fn can_place(&self, x: i32, y: i32, color: Color) -> bool {
        if !Position::in_bounds(x, y) || self.at(x, y) != Color::Empty {
            return false;
        }

        DIRECTIONS
            .iter()
            .any(|&(dx, dy)| self.turnable_run(x, y, color, dx, dy) > 0)
    }

    /// Places a stone and flips every captured run.
    ///
    /// On error the board is left untouched.
    #[instrument(skip(self))]
    pub fn place(&mut self, x: i32, y: i32, color: Color) -> Result<(), BoardError> {
        if !Position::in_bounds(x, y) {
            return Err(BoardError::InvalidCoordinate { x, y });
        }
        if !self.can_place(x, y, color) {
            return Err(BoardError::IllegalMove { x, y, color });
        }

        let runs: Vec<(i32, i32, usize)> = DIRECTIONS
            .iter()
            .map(|&(dx, dy)| (dx, dy, self.turnable_run(x, y, color, dx, dy)))
            .filter(|&(_, _, n)| n > 0)
            .collect();

        self.set(x, y, color);
        let mut flipped = 0;
        for (dx, dy, n) in runs {
            for step in 1..=n as i32 {
                self.set(x + dx * step, y + dy * step, color);
            }
            flipped += n;
        }

        debug!(flipped, "Stone placed");
        Ok(())
    }

    /// Every playable cell where `color` has a legal move.
    pub fn legal_moves(&self, color: Color) -> Vec<Position> {
        Position::all()
            .filter(|p| self.can_place(p.x, p.y, color))
            .collect()
    }

    /// Number of playable cells where `color` has a legal move.
    pub fn legal_move_count(&self, color: Color) -> usize {
        Position::all()
            .filter(|p| self.can_place(p.x, p.y, color))
            .count()
    }

    /// Number of stones of `color` on the board.
    pub fn score(&self, color: Color) -> usize {
        self.count(color)
    }

    /// Number of empty playable cells.
    pub fn empty_count(&self) -> usize {
        self.count(Color::Empty)
    }

    fn count(&self, color: Color) -> usize {
        Position::all()
            .filter(|p| self.at(p.x, p.y) == color)
            .count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
