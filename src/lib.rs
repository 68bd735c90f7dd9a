pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod sfx;
pub mod types;
pub mod wasm;

pub use board::{Board, Position};
pub use error::{GameError, GameResult};
pub use game::GameSession;
pub use types::{Coord, GameStatus, LogEntry, Move, Player, Winner};
