//! Static position evaluation and the score-to-probability curve.
//!
//! Scores are always from black's point of view: positive favours black,
//! negative favours white. Each feature is a differential normalised to
//! roughly `[-1, 1]` before it is weighted; the weighted sum is clamped to
//! `[-EVAL_LIMIT, EVAL_LIMIT]` so displayed values stay readable.

use serde::{Deserialize, Serialize};

use crate::board::{Board, CORNER_ADJACENT, CORNERS};
use crate::types::{GameStatus, Player, WinProbability, Winner};

pub const EVAL_LIMIT: f64 = 999.0;
pub const PROBABILITY_SCALE: f64 = 100.0;
const EVEN_EPSILON: f64 = 1e-6;

/// Feature coefficients. The ordering corner > mobility > corner-adjacency >
/// material is what gives the engine its positional sense.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvalWeights {
    pub material: f64,
    pub mobility: f64,
    pub corner: f64,
    pub corner_adjacent: f64,
}

impl EvalWeights {
    pub const DEFAULT: Self = Self {
        material: 10.0,
        mobility: 30.0,
        corner: 100.0,
        corner_adjacent: 25.0,
    };
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Normalised black-minus-white differentials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    pub material: f64,
    pub mobility: f64,
    pub corner: f64,
    pub corner_adjacent: f64,
}

impl Features {
    pub fn of(board: &Board) -> Self {
        let (black, white) = board.count();
        let discs = (black as u32 + white as u32).max(1) as f64;
        let material = (black as f64 - white as f64) / discs;

        let black_moves = board.legal_mask(Player::Black).count_ones();
        let white_moves = board.legal_mask(Player::White).count_ones();
        let move_total = (black_moves + white_moves).max(1) as f64;
        let mobility = (black_moves as f64 - white_moves as f64) / move_total;

        Self {
            material,
            mobility,
            corner: masked_diff(board, CORNERS) / 4.0,
            corner_adjacent: masked_diff(board, CORNER_ADJACENT) / 12.0,
        }
    }
}

fn masked_diff(board: &Board, mask: u64) -> f64 {
    (board.black() & mask).count_ones() as f64 - (board.white() & mask).count_ones() as f64
}

/// Weighted score of `board` from black's perspective.
pub fn evaluate(board: &Board, weights: &EvalWeights) -> f64 {
    let f = Features::of(board);
    let score = weights.material * f.material
        + weights.mobility * f.mobility
        + weights.corner * f.corner
        - weights.corner_adjacent * f.corner_adjacent;
    score.clamp(-EVAL_LIMIT, EVAL_LIMIT)
}

/// `evaluate` with the default weights.
pub fn evaluate_default(board: &Board) -> f64 {
    evaluate(board, &EvalWeights::DEFAULT)
}

/// Maps a score onto a smooth S-curve; `scale` sets the steepness.
pub fn to_probability(score: f64, scale: f64) -> WinProbability {
    let black = ((score / scale).tanh() + 1.0) / 2.0;
    WinProbability {
        black,
        white: 1.0 - black,
    }
}

/// Probability for a position with the given status. A finished game reports
/// its actual outcome instead of the heuristic.
pub fn status_probability(status: &GameStatus, score: f64) -> WinProbability {
    match status {
        GameStatus::GameOver { winner, .. } => match winner {
            Winner::Black => WinProbability {
                black: 1.0,
                white: 0.0,
            },
            Winner::White => WinProbability {
                black: 0.0,
                white: 1.0,
            },
            Winner::Draw => WinProbability {
                black: 0.5,
                white: 0.5,
            },
        },
        _ => to_probability(score, PROBABILITY_SCALE),
    }
}

/// Which side a score leans toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lean {
    Black,
    White,
    Even,
}

/// Splits a score into the favoured side and a non-negative magnitude.
pub fn format_eval(score: f64) -> (Lean, f64) {
    if score.abs() < EVEN_EPSILON {
        (Lean::Even, 0.0)
    } else if score > 0.0 {
        (Lean::Black, score)
    } else {
        (Lean::White, -score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bit(row: usize, col: usize) -> u64 {
        1u64 << (row * 8 + col)
    }

    #[test]
    fn initial_position_is_balanced() {
        assert_eq!(evaluate_default(&Board::new()), 0.0);
    }

    #[test]
    fn features_follow_documented_normalisation() {
        // Black: a1 corner, b1 corner-adjacent, d4. White: h8 corner, e5.
        let black = bit(0, 0) | bit(0, 1) | bit(3, 3);
        let white = bit(7, 7) | bit(4, 4);
        let board = Board::from_bitboards(black, white);
        let f = Features::of(&board);

        assert!((f.material - 1.0 / 5.0).abs() < 1e-12);
        assert_eq!(f.corner, 0.0);
        assert!((f.corner_adjacent - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn empty_board_does_not_divide_by_zero() {
        let f = Features::of(&Board::from_bitboards(0, 0));

        assert_eq!(f.material, 0.0);
        assert_eq!(f.mobility, 0.0);
        assert_eq!(evaluate_default(&Board::from_bitboards(0, 0)), 0.0);
    }

    #[test]
    fn corner_outweighs_everything_else() {
        // Black owns one corner but is down on material.
        let black = bit(0, 0);
        let white = bit(3, 3) | bit(3, 4) | bit(4, 3);
        let board = Board::from_bitboards(black, white);

        assert!(evaluate_default(&board) > 0.0);
    }

    #[test]
    fn color_swap_negates_score() {
        let boards = [
            Board::new(),
            Board::from_bitboards(bit(0, 0) | bit(0, 1) | bit(3, 3), bit(7, 7) | bit(4, 4)),
            Board::from_bitboards(
                bit(2, 3) | bit(3, 3) | bit(3, 4) | bit(4, 3),
                bit(4, 4) | bit(6, 6),
            ),
        ];
        for board in boards {
            let score = evaluate_default(&board);
            assert_eq!(evaluate_default(&board.swap_colors()), -score);
        }
    }

    #[test]
    fn score_is_clamped() {
        let weights = EvalWeights {
            corner: 10_000.0,
            ..EvalWeights::DEFAULT
        };
        let board = Board::from_bitboards(bit(0, 0) | bit(7, 7), 0);

        assert_eq!(evaluate(&board, &weights), EVAL_LIMIT);
        assert_eq!(evaluate(&board.swap_colors(), &weights), -EVAL_LIMIT);
    }

    #[test]
    fn probability_is_symmetric_and_monotonic() {
        let even = to_probability(0.0, PROBABILITY_SCALE);
        assert_eq!(even.black, 0.5);
        assert_eq!(even.white, 0.5);

        let mut last = 0.0;
        for score in [-999.0, -200.0, -50.0, 0.0, 50.0, 200.0, 999.0] {
            let p = to_probability(score, PROBABILITY_SCALE);
            assert!(p.black > last || score == -999.0);
            assert!((p.black + p.white - 1.0).abs() < 1e-12);
            let mirrored = to_probability(-score, PROBABILITY_SCALE);
            assert!((p.black - mirrored.white).abs() < 1e-12);
            last = p.black;
        }
        assert!(to_probability(999.0, PROBABILITY_SCALE).black > 0.99);
    }

    #[test]
    fn finished_game_ignores_heuristic() {
        let over = GameStatus::GameOver {
            black: 20,
            white: 44,
            winner: Winner::White,
        };
        let p = status_probability(&over, 500.0);
        assert_eq!((p.black, p.white), (0.0, 1.0));

        let draw = GameStatus::GameOver {
            black: 32,
            white: 32,
            winner: Winner::Draw,
        };
        let p = status_probability(&draw, -500.0);
        assert_eq!((p.black, p.white), (0.5, 0.5));

        let playing = GameStatus::Playing {
            turn: Player::Black,
        };
        assert_eq!(status_probability(&playing, 0.0).black, 0.5);
    }

    #[test]
    fn format_eval_reports_side_and_magnitude() {
        assert_eq!(format_eval(0.0), (Lean::Even, 0.0));
        assert_eq!(format_eval(1e-9), (Lean::Even, 0.0));
        assert_eq!(format_eval(12.5), (Lean::Black, 12.5));
        assert_eq!(format_eval(-3.0), (Lean::White, 3.0));
    }
}
