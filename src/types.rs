use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{GameError, GameResult};

pub const BOARD_WIDTH: usize = 8;
pub const BOARD_CELLS: usize = BOARD_WIDTH * BOARD_WIDTH;

/// One of the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Player {
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "W")]
    White,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// Wire code used in board arrays: 1=black, 2=white.
    pub fn code(self) -> u8 {
        match self {
            Self::Black => 1,
            Self::White => 2,
        }
    }

    pub fn from_code(code: u8) -> GameResult<Self> {
        match code {
            1 => Ok(Self::Black),
            2 => Ok(Self::White),
            other => Err(GameError::UnknownPlayer(other)),
        }
    }

    /// +1 for black, -1 for white. Converts black-relative scores to this side's view.
    pub fn sign(self) -> f64 {
        match self {
            Self::Black => 1.0,
            Self::White => -1.0,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Black => "Black",
            Self::White => "White",
        })
    }
}

/// Content of a single square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Black => 1,
            Self::White => 2,
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::Black => Self::Black,
            Player::White => Self::White,
        }
    }
}

/// A board coordinate, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

impl Coord {
    pub fn new(row: u8, col: u8) -> GameResult<Self> {
        if row as usize >= BOARD_WIDTH || col as usize >= BOARD_WIDTH {
            return Err(GameError::CoordOutOfRange { row, col });
        }
        Ok(Self { row, col })
    }

    /// Caller contract: `index < 64`.
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < BOARD_CELLS);
        Self {
            row: (index / BOARD_WIDTH) as u8,
            col: (index % BOARD_WIDTH) as u8,
        }
    }

    pub fn index(self) -> usize {
        self.row as usize * BOARD_WIDTH + self.col as usize
    }

    pub fn bit(self) -> u64 {
        1u64 << self.index()
    }

    pub fn is_corner(self) -> bool {
        let edge = BOARD_WIDTH as u8 - 1;
        (self.row == 0 || self.row == edge) && (self.col == 0 || self.col == edge)
    }

    /// Column letter followed by 1-based row, e.g. row 2 col 3 is `D3`.
    pub fn notation(self) -> String {
        self.to_string()
    }

    /// Parses `D3` style notation (case-insensitive).
    pub fn from_notation(text: &str) -> GameResult<Self> {
        let bad = || GameError::BadNotation(text.to_string());
        let mut chars = text.trim().chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(bad());
        };
        let file = file.to_ascii_uppercase();
        if !('A'..='H').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(bad());
        }
        Ok(Self {
            row: rank as u8 - b'1',
            col: file as u8 - b'A',
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.col) as char, self.row + 1)
    }
}

/// Iterates the coordinates of every set bit, lowest index first.
pub fn coords_of(mask: u64) -> impl Iterator<Item = Coord> {
    let mut bits = mask;
    std::iter::from_fn(move || {
        if bits == 0 {
            return None;
        }
        let idx = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        Some(Coord::from_index(idx))
    })
}

fn serialize_mask<S: Serializer>(mask: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(coords_of(*mask))
}

/// A placement and the exact set of opponent discs it flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub at: Coord,
    #[serde(serialize_with = "serialize_mask")]
    pub flips: u64,
}

impl Move {
    pub fn flip_count(&self) -> u32 {
        self.flips.count_ones()
    }

    pub fn flipped(&self) -> impl Iterator<Item = Coord> {
        coords_of(self.flips)
    }

    pub fn notation(&self) -> String {
        self.at.notation()
    }
}

/// Final result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Winner {
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "W")]
    White,
    #[serde(rename = "draw")]
    Draw,
}

impl Winner {
    /// Higher disc count wins; equal counts draw.
    pub fn from_counts(black: u8, white: u8) -> Self {
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Self::Black,
            std::cmp::Ordering::Less => Self::White,
            std::cmp::Ordering::Equal => Self::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameStatus {
    Playing {
        turn: Player,
    },
    /// `from` had no legal move; `to` moves next.
    Passed {
        from: Player,
        to: Player,
    },
    #[serde(rename = "gameover")]
    GameOver {
        black: u8,
        white: u8,
        winner: Winner,
    },
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, Self::GameOver { .. })
    }

    pub fn describe(&self) -> String {
        match *self {
            Self::Playing { turn } => format!("{turn} to move"),
            Self::Passed { from, .. } => format!("{from} has no legal move and passes"),
            Self::GameOver {
                black,
                white,
                winner: Winner::Draw,
            } => format!("Game over: draw ({black}-{white})"),
            Self::GameOver {
                black,
                white,
                winner,
            } => {
                let side = if winner == Winner::Black {
                    Player::Black
                } else {
                    Player::White
                };
                format!("Game over: {side} wins ({black}-{white})")
            }
        }
    }
}

/// One row of the move log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub n: usize,
    pub player: Player,
    #[serde(rename = "move")]
    pub mv: Option<Move>,
    /// Square name, or `pass`.
    pub notation: String,
    pub flips: u32,
    pub eval_before: f64,
    pub eval_after: f64,
    pub delta: f64,
}

impl LogEntry {
    /// Delta signed so that positive is good for the side that acted.
    pub fn delta_for_mover(&self) -> f64 {
        self.player.sign() * self.delta
    }
}

/// Win probability pair; the two values sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinProbability {
    pub black: f64,
    pub white: f64,
}

/// Snapshot handed to the host for rendering.
/// Contract:
/// - `board` holds 64 codes, 0=empty, 1=black, 2=white, row-major.
/// - `flipped` lists the squares flipped by the move that produced this view;
///   empty for the initial position and after a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub board: Vec<u8>,
    pub turn: Player,
    pub status: GameStatus,
    pub status_text: String,
    pub black_count: u8,
    pub white_count: u8,
    pub legal_moves: Vec<Move>,
    pub flipped: Vec<Coord>,
    pub eval: f64,
    pub probability: WinProbability,
    pub cursor: usize,
    pub last_index: usize,
    pub at_end: bool,
    pub human_turn: bool,
}
