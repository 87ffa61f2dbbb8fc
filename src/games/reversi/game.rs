//! Game lifecycle on top of the board rules.

use super::board::{Board, BoardError};
use super::types::Color;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Lifecycle phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Created, no move accepted yet.
    NotStarted,
    /// Moves are being played.
    InProgress,
    /// Neither color can move. Terminal.
    Finished,
}

/// Reversi game engine.
///
/// Turn order is not tracked here: any color may move whenever it has a
/// capturing placement.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    phase: GamePhase,
    me: Color,
}

impl Game {
    /// Creates a new game viewed from `me` (`Color::None` on the server).
    #[instrument]
    pub fn new(me: Color) -> Self {
        Self {
            board: Board::new(),
            phase: GamePhase::NotStarted,
            me,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Color of the local viewer.
    pub fn me(&self) -> Color {
        self.me
    }

    /// True once a move has been accepted or [`Game::start`] was called.
    pub fn is_started(&self) -> bool {
        self.phase != GamePhase::NotStarted
    }

    /// True once neither color can move.
    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Finished
    }

    /// Marks the game as in progress. No effect after the game started.
    pub fn start(&mut self) {
        if self.phase == GamePhase::NotStarted {
            self.phase = GamePhase::InProgress;
        }
    }

    /// Plays `color` at `(x, y)`.
    ///
    /// Returns `Ok(true)` when the game is over, including when it already
    /// was, in which case the board is not touched.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn apply_move(&mut self, x: i32, y: i32, color: Color) -> Result<bool, BoardError> {
        if self.is_finished() {
            return Ok(true);
        }

        self.board.place(x, y, color)?;
        self.start();

        if self.is_game_over() {
            self.phase = GamePhase::Finished;
            info!(
                black = self.board.score(Color::Black),
                white = self.board.score(Color::White),
                "Game finished"
            );
            return Ok(true);
        }

        Ok(false)
    }

    /// True when neither color has a legal move.
    pub fn is_game_over(&self) -> bool {
        self.board.legal_move_count(Color::Black) == 0
            && self.board.legal_move_count(Color::White) == 0
    }

    /// Winning color by stone count, or `Color::None` on a tie.
    ///
    /// Only meaningful once the game is finished.
    pub fn winner(&self) -> Color {
        let black = self.board.score(Color::Black);
        let white = self.board.score(Color::White);
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Color::Black,
            std::cmp::Ordering::Less => Color::White,
            std::cmp::Ordering::Equal => Color::None,
        }
    }

    /// Replaces the board with a server snapshot.
    ///
    /// Used by clients to stay in lockstep with the authoritative game.
    pub fn sync_board(&mut self, board: Board) {
        self.board = board;
        self.start();
        if self.is_game_over() {
            self.phase = GamePhase::Finished;
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Color::None)
    }
}
