//! Tests for terminal rendering helpers.

use reversi_online::{Color, Game, outcome_message, render};

#[test]
fn test_render_opening_board() {
    let game = Game::new(Color::Black);
    let text = render(&game);

    assert!(text.contains("You: ○"));
    assert!(text.contains(" ｜A｜B｜C｜D｜E｜F｜G｜H"));
    assert!(text.contains("4｜ ｜ ｜ ｜◉｜○｜ ｜ ｜ ｜"));
    assert!(text.contains("5｜ ｜ ｜ ｜○｜◉｜ ｜ ｜ ｜"));
    assert!(text.contains("Score: BLACK=2, WHITE=2 REST=60"));
}

#[test]
fn test_render_server_view_has_no_player_line() {
    let text = render(&Game::default());
    assert!(!text.contains("You:"));
}

#[test]
fn test_outcome_messages() {
    assert_eq!(outcome_message(Color::None, Color::Black), "Draw!");
    assert_eq!(outcome_message(Color::White, Color::White), "You Win!");
    assert_eq!(outcome_message(Color::Black, Color::White), "You Lose!");
}
