//! Shared fixtures for integration tests.

#![allow(dead_code)]

use reversi_online::Color;

/// Nine alternating moves that end with black holding every stone (13-0).
pub const WIPEOUT: [(i32, i32, Color); 9] = [
    (3, 4, Color::Black),
    (3, 3, Color::White),
    (3, 2, Color::Black),
    (2, 4, Color::White),
    (1, 5, Color::Black),
    (6, 4, Color::White),
    (7, 4, Color::Black),
    (3, 5, Color::White),
    (4, 6, Color::Black),
];
