//! Errors surfaced at the crate boundary.
//!
//! Rules, evaluation and search are total over well-formed positions and never
//! fail. Only inputs arriving from a host (coordinates, notation, player codes,
//! configuration) can be rejected.

/// Errors produced while translating host input into game values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Row or column outside `0..8`.
    #[error("coordinate out of range: row {row}, col {col}")]
    CoordOutOfRange { row: u8, col: u8 },

    /// Text that is not a square name such as `D3`.
    #[error("invalid move notation: {0:?}")]
    BadNotation(String),

    /// The square is not among the legal moves of the side to move.
    #[error("illegal move at {0}")]
    IllegalMove(String),

    /// Player code other than 1 (black) or 2 (white).
    #[error("unknown player code: {0}")]
    UnknownPlayer(u8),

    /// Configuration rejected by validation or deserialization.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for boundary operations
pub type GameResult<T> = Result<T, GameError>;
