//! Board coordinates and their `A-1` text notation.
//!
//! Columns are letters `A`-`H` (x = 1..=8), rows are digits `1`-`8`
//! (y = 1..=8). `"C-4"` names the cell at x = 3, y = 4.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// Column letters in board order.
const COLUMNS: &str = "ABCDEFGH";

/// A playable cell, 1-indexed on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column, 1..=8.
    pub x: i32,
    /// Row, 1..=8.
    pub y: i32,
}

impl Position {
    /// Creates a position if both coordinates are on the playable board.
    pub fn new(x: i32, y: i32) -> Option<Self> {
        if Self::in_bounds(x, y) {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// True when `(x, y)` lies inside the 8x8 playable region.
    pub fn in_bounds(x: i32, y: i32) -> bool {
        (1..=8).contains(&x) && (1..=8).contains(&y)
    }

    /// All 64 playable positions, column-major.
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8).flat_map(|x| (1..=8).map(move |y| Position { x, y }))
    }

    /// Column letter for this position.
    pub fn column_letter(&self) -> char {
        COLUMNS
            .chars()
            .nth((self.x - 1) as usize)
            .unwrap_or('?')
    }

    /// Parses `A-1` style input.
    #[instrument]
    pub fn parse_notation(s: &str) -> Result<Self, ParseMoveError> {
        let (col, row) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ParseMoveError::new(s))?;

        let mut letters = col.trim().chars();
        let letter = match (letters.next(), letters.next()) {
            (Some(c), None) => c.to_ascii_uppercase(),
            _ => return Err(ParseMoveError::new(s)),
        };
        let x = COLUMNS
            .find(letter)
            .map(|i| i as i32 + 1)
            .ok_or_else(|| ParseMoveError::new(s))?;

        let y = row
            .trim()
            .parse::<i32>()
            .map_err(|_| ParseMoveError::new(s))?;

        Position::new(x, y).ok_or_else(|| ParseMoveError::new(s))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.column_letter(), self.y)
    }
}

impl FromStr for Position {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_notation(s)
    }
}

/// Move input that is not valid `A-1` notation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid move {:?}. Example: A-1", input)]
pub struct ParseMoveError {
    /// The rejected input.
    pub input: String,
}

impl ParseMoveError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}
