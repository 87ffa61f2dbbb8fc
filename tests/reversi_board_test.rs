//! Tests for the reversi board rules.

use reversi_online::{Board, BoardError, Color};

#[test]
fn test_new_board_scores_and_walls() {
    let board = Board::new();
    assert_eq!(board.score(Color::Black), 2);
    assert_eq!(board.score(Color::White), 2);
    assert_eq!(board.empty_count(), 60);

    for i in 0..10 {
        for (x, y) in [(0, i), (9, i), (i, 0), (i, 9)] {
            assert_eq!(board.get(x, y), Some(Color::Wall), "({x},{y}) should be wall");
        }
    }
}

#[test]
fn test_new_board_opening_stones() {
    let board = Board::new();
    assert_eq!(board.get(4, 4), Some(Color::White));
    assert_eq!(board.get(5, 5), Some(Color::White));
    assert_eq!(board.get(5, 4), Some(Color::Black));
    assert_eq!(board.get(4, 5), Some(Color::Black));
}

#[test]
fn test_place_flips_captured_stone() {
    let mut board = Board::new();
    assert!(board.can_place(3, 4, Color::Black));

    board.place(3, 4, Color::Black).unwrap();

    assert_eq!(board.get(4, 4), Some(Color::Black));
    assert_eq!(board.get(5, 5), Some(Color::White));
    assert_eq!(board.get(5, 4), Some(Color::Black));
    assert_eq!(board.get(4, 5), Some(Color::Black));
    assert_eq!(board.get(3, 4), Some(Color::Black));
    assert_eq!(board.score(Color::Black), 4);
    assert_eq!(board.score(Color::White), 1);
    assert_eq!(board.empty_count(), 59);
}

#[test]
fn test_place_on_occupied_cell_is_illegal() {
    let mut board = Board::new();
    let before = board.clone();

    let result = board.place(4, 4, Color::Black);

    assert_eq!(
        result,
        Err(BoardError::IllegalMove {
            x: 4,
            y: 4,
            color: Color::Black
        })
    );
    assert_eq!(board, before);
}

#[test]
fn test_place_without_capture_is_illegal() {
    let mut board = Board::new();
    let before = board.clone();

    assert!(!board.can_place(1, 1, Color::Black));
    assert!(matches!(
        board.place(1, 1, Color::Black),
        Err(BoardError::IllegalMove { .. })
    ));
    // Rejection is repeatable and never mutates.
    assert!(board.place(1, 1, Color::Black).is_err());
    assert_eq!(board, before);
}

#[test]
fn test_place_out_of_range_is_invalid_coordinate() {
    let mut board = Board::new();
    for (x, y) in [(0, 4), (9, 4), (4, 0), (4, 9), (-3, 2), (100, 100)] {
        assert_eq!(
            board.place(x, y, Color::Black),
            Err(BoardError::InvalidCoordinate { x, y })
        );
        assert!(!board.can_place(x, y, Color::Black));
    }
    assert_eq!(board, Board::new());
}

#[test]
fn test_non_stone_colors_cannot_be_placed() {
    let mut board = Board::new();
    for color in [Color::Empty, Color::Wall, Color::None] {
        assert!(matches!(
            board.place(3, 4, color),
            Err(BoardError::IllegalMove { .. })
        ));
    }
}

#[test]
fn test_initial_legal_moves() {
    let board = Board::new();
    assert_eq!(board.legal_move_count(Color::Black), 4);
    assert_eq!(board.legal_move_count(Color::White), 4);

    let black: Vec<(i32, i32)> = board
        .legal_moves(Color::Black)
        .iter()
        .map(|p| (p.x, p.y))
        .collect();
    assert_eq!(black, vec![(3, 4), (4, 3), (5, 6), (6, 5)]);
}

#[test]
fn test_turnable_run_by_direction() {
    let board = Board::new();
    assert_eq!(board.turnable_run(3, 4, Color::Black, 1, 0), 1);
    assert_eq!(board.turnable_run(3, 4, Color::Black, 1, 1), 0);
    assert_eq!(board.turnable_run(3, 4, Color::Black, 0, 0), 0);
}

#[test]
fn test_board_serializes_as_grid() {
    let board = Board::new();
    let json = serde_json::to_value(&board).unwrap();
    let cells = json["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 10);
    assert_eq!(cells[0][0], "wall");
    assert_eq!(cells[4][4], "white");
    assert_eq!(cells[1][1], "empty");

    let back: Board = serde_json::from_value(json).unwrap();
    assert_eq!(back, board);
}

#[test]
fn test_board_without_walls_is_rejected() {
    let mut grid = vec![vec!["white"; 10]; 10];
    grid[3][3] = "empty";
    grid[3][4] = "black";

    let err = serde_json::from_value::<Board>(serde_json::json!({ "cells": grid })).unwrap_err();
    assert!(err.to_string().contains("Malformed board cell x=0, y=0"), "{err}");
}

#[test]
fn test_board_with_non_stone_in_play_area_is_rejected() {
    let mut json = serde_json::to_value(Board::new()).unwrap();
    json["cells"][2][7] = serde_json::json!("none");

    let err = serde_json::from_value::<Board>(json).unwrap_err();
    assert!(err.to_string().contains("x=2, y=7 color=None"), "{err}");
}
