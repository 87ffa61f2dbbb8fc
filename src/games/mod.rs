pub mod reversi;
