//! Tests for the game session registry.

mod common;

use common::WIPEOUT;
use reversi_online::{Color, Player, PlayEvent, SessionError, SessionRegistry};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

const ROOM: u64 = 7;

fn black() -> Player {
    Player::new(1, Color::Black)
}

fn white() -> Player {
    Player::new(2, Color::White)
}

fn drain(rx: &mut UnboundedReceiver<PlayEvent>) -> Vec<PlayEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Registry with both players started; the `Ready` events are drained.
fn ready_room(
    sessions: &SessionRegistry,
) -> (UnboundedReceiver<PlayEvent>, UnboundedReceiver<PlayEvent>) {
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let (tx_w, mut rx_w) = mpsc::unbounded_channel();
    sessions.start(ROOM, black(), tx_b).unwrap();
    sessions.start(ROOM, white(), tx_w).unwrap();
    drain(&mut rx_b);
    drain(&mut rx_w);
    (rx_b, rx_w)
}

#[tokio::test]
async fn test_first_start_only_waits() {
    let sessions = SessionRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    sessions.start(ROOM, black(), tx).unwrap();

    assert_eq!(drain(&mut rx), vec![PlayEvent::Waiting]);
    let snapshot = sessions.snapshot(ROOM).unwrap();
    assert_eq!(snapshot.connected, 1);
    assert!(!snapshot.game.is_started());
}

#[tokio::test]
async fn test_second_start_readies_both() {
    let sessions = SessionRegistry::new();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let (tx_w, mut rx_w) = mpsc::unbounded_channel();

    sessions.start(ROOM, black(), tx_b).unwrap();
    sessions.start(ROOM, white(), tx_w).unwrap();

    assert_eq!(drain(&mut rx_b), vec![PlayEvent::Waiting, PlayEvent::Ready]);
    assert_eq!(drain(&mut rx_w), vec![PlayEvent::Ready]);
    assert!(sessions.snapshot(ROOM).unwrap().game.is_started());
}

#[tokio::test]
async fn test_dead_starter_does_not_take_a_seat() {
    let sessions = SessionRegistry::new();
    let (tx_dead, rx_dead) = mpsc::unbounded_channel();
    drop(rx_dead);

    assert_eq!(
        sessions.start(ROOM, black(), tx_dead),
        Err(SessionError::ChannelClosed {
            room_id: ROOM,
            failed: 1
        })
    );
    assert_eq!(sessions.snapshot(ROOM).unwrap().connected, 0);

    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let (tx_w, mut rx_w) = mpsc::unbounded_channel();
    sessions.start(ROOM, black(), tx_b).unwrap();
    sessions.start(ROOM, white(), tx_w).unwrap();
    assert_eq!(drain(&mut rx_b), vec![PlayEvent::Waiting, PlayEvent::Ready]);
    assert_eq!(drain(&mut rx_w), vec![PlayEvent::Ready]);
}

#[tokio::test]
async fn test_third_start_is_room_full() {
    let sessions = SessionRegistry::new();
    let (_rx_b, _rx_w) = ready_room(&sessions);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = sessions.start(ROOM, Player::new(3, Color::Black), tx);

    assert_eq!(result, Err(SessionError::RoomFull { room_id: ROOM }));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(sessions.snapshot(ROOM).unwrap().connected, 2);
}

#[tokio::test]
async fn test_move_in_unknown_room() {
    let sessions = SessionRegistry::new();
    assert_eq!(
        sessions.apply_move(99, 3, 4, black()),
        Err(SessionError::UnknownRoom { room_id: 99 })
    );
}

#[tokio::test]
async fn test_move_broadcasts_identical_events() {
    let sessions = SessionRegistry::new();
    let (mut rx_b, mut rx_w) = ready_room(&sessions);

    let finished = sessions.apply_move(ROOM, 3, 4, black()).unwrap();
    assert!(!finished);

    let events_b = drain(&mut rx_b);
    let events_w = drain(&mut rx_w);
    assert_eq!(events_b, events_w);
    match events_b.as_slice() {
        [PlayEvent::MoveApplied { player, x, y, board }] => {
            assert_eq!(player, &black());
            assert_eq!((*x, *y), (3, 4));
            assert_eq!(board.score(Color::Black), 4);
            assert_eq!(board.score(Color::White), 1);
        }
        other => panic!("Unexpected events {:?}", other),
    }
}

#[tokio::test]
async fn test_illegal_move_is_reported_without_broadcast() {
    let sessions = SessionRegistry::new();
    let (mut rx_b, mut rx_w) = ready_room(&sessions);

    let err = sessions.apply_move(ROOM, 1, 1, black()).unwrap_err();
    assert!(matches!(err, SessionError::Board { .. }));
    assert!(err.is_recoverable());

    let err = sessions.apply_move(ROOM, 0, 1, black()).unwrap_err();
    assert!(err.to_string().contains("out of range"));

    assert!(drain(&mut rx_b).is_empty());
    assert!(drain(&mut rx_w).is_empty());
}

#[tokio::test]
async fn test_full_game_ends_with_finished_event() {
    let sessions = SessionRegistry::new();
    let (mut rx_b, mut rx_w) = ready_room(&sessions);

    for (i, &(x, y, color)) in WIPEOUT.iter().enumerate() {
        let player = if color == Color::Black { black() } else { white() };
        let finished = sessions.apply_move(ROOM, x, y, player).unwrap();
        assert_eq!(finished, i == WIPEOUT.len() - 1);
    }

    let events_b = drain(&mut rx_b);
    assert_eq!(events_b, drain(&mut rx_w));
    assert_eq!(events_b.len(), WIPEOUT.len() + 1);
    match events_b.last() {
        Some(PlayEvent::Finished { winner, board }) => {
            assert_eq!(*winner, Color::Black);
            assert_eq!(board.score(Color::Black), 13);
        }
        other => panic!("Expected finished, got {:?}", other),
    }
    assert!(matches!(
        events_b[WIPEOUT.len() - 1],
        PlayEvent::MoveApplied { x: 4, y: 6, .. }
    ));
}

#[tokio::test]
async fn test_move_after_finish_is_silent_noop() {
    let sessions = SessionRegistry::new();
    let (mut rx_b, mut rx_w) = ready_room(&sessions);
    for &(x, y, color) in &WIPEOUT {
        let player = if color == Color::Black { black() } else { white() };
        sessions.apply_move(ROOM, x, y, player).unwrap();
    }
    drain(&mut rx_b);
    drain(&mut rx_w);
    let board = sessions.snapshot(ROOM).unwrap().game.board().clone();

    assert_eq!(sessions.apply_move(ROOM, 1, 1, white()), Ok(true));

    assert!(drain(&mut rx_b).is_empty());
    assert!(drain(&mut rx_w).is_empty());
    assert_eq!(sessions.snapshot(ROOM).unwrap().game.board(), &board);
}

#[tokio::test]
async fn test_closed_channel_keeps_move_committed() {
    let sessions = SessionRegistry::new();
    let (mut rx_b, rx_w) = ready_room(&sessions);
    drop(rx_w);

    let result = sessions.apply_move(ROOM, 3, 4, black());

    assert_eq!(
        result,
        Err(SessionError::ChannelClosed {
            room_id: ROOM,
            failed: 1
        })
    );
    // The live participant still got the update.
    assert_eq!(drain(&mut rx_b).len(), 1);
    let snapshot = sessions.snapshot(ROOM).unwrap();
    assert_eq!(snapshot.game.board().get(3, 4), Some(Color::Black));
}

#[tokio::test]
async fn test_turn_order_not_enforced_by_default() {
    let sessions = SessionRegistry::new();
    let (_rx_b, _rx_w) = ready_room(&sessions);
    assert!(sessions.apply_move(ROOM, 5, 3, white()).is_ok());
}

#[tokio::test]
async fn test_turn_order_enforced_when_enabled() {
    let sessions = SessionRegistry::with_turn_order(true);
    let (_rx_b, _rx_w) = ready_room(&sessions);

    let err = sessions.apply_move(ROOM, 5, 3, white()).unwrap_err();
    assert_eq!(
        err,
        SessionError::NotYourTurn {
            expected: Color::Black
        }
    );
    assert!(err.is_recoverable());

    sessions.apply_move(ROOM, 3, 4, black()).unwrap();
    assert_eq!(sessions.snapshot(ROOM).unwrap().expected_next, Color::White);
    assert!(matches!(
        sessions.apply_move(ROOM, 3, 2, black()),
        Err(SessionError::NotYourTurn { .. })
    ));
    sessions.apply_move(ROOM, 3, 3, white()).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_evicts_only_idle_finished_sessions() {
    let sessions = SessionRegistry::new();
    let (_rx_b, _rx_w) = ready_room(&sessions);
    for &(x, y, color) in &WIPEOUT {
        let player = if color == Color::Black { black() } else { white() };
        sessions.apply_move(ROOM, x, y, player).unwrap();
    }
    let (tx, _rx) = mpsc::unbounded_channel();
    sessions.start(ROOM + 1, black(), tx).unwrap();

    assert!(sessions.evict_idle_finished(Duration::from_secs(60)).is_empty());

    tokio::time::advance(Duration::from_secs(61)).await;

    assert_eq!(sessions.evict_idle_finished(Duration::from_secs(60)), vec![ROOM]);
    assert!(sessions.snapshot(ROOM).is_none());
    assert!(sessions.snapshot(ROOM + 1).is_some());
    assert_eq!(sessions.session_count(), 1);
}
