use crate::types::{BOARD_CELLS, BOARD_WIDTH, Cell, Coord, Move, Player};

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
const NOT_COL_0: u64 = 0xFEFE_FEFE_FEFE_FEFE;
const NOT_COL_7: u64 = 0x7F7F_7F7F_7F7F_7F7F;

pub const CORNERS: u64 = bit(0) | bit(7) | bit(56) | bit(63);
/// The three squares touching each corner.
pub const CORNER_ADJACENT: u64 = bit(1)
    | bit(8)
    | bit(9)
    | bit(6)
    | bit(14)
    | bit(15)
    | bit(48)
    | bit(49)
    | bit(57)
    | bit(54)
    | bit(55)
    | bit(62);

/// Reversi board state represented by two bitboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    black: u64,
    white: u64,
}

impl Board {
    /// Creates the initial board:
    /// d4=white, e4=black, d5=black, e5=white.
    pub fn new() -> Self {
        Self {
            black: bit(28) | bit(35),
            white: bit(27) | bit(36),
        }
    }

    /// Builds a board from raw masks. Overlapping bits are given to black.
    pub fn from_bitboards(black: u64, white: u64) -> Self {
        Self {
            black,
            white: white & !black,
        }
    }

    pub fn black(&self) -> u64 {
        self.black
    }

    pub fn white(&self) -> u64 {
        self.white
    }

    pub fn cell(&self, at: Coord) -> Cell {
        let square = at.bit();
        if (self.black & square) != 0 {
            Cell::Black
        } else if (self.white & square) != 0 {
            Cell::White
        } else {
            Cell::Empty
        }
    }

    /// Returns legal move mask for the given side.
    pub fn legal_mask(&self, player: Player) -> u64 {
        let (me, opp) = self.sides(player);
        let empty = !(me | opp);
        let mut legal = 0u64;

        for dir in 0..DIRECTIONS.len() {
            let mut run = shift(me, dir) & opp;
            while run != 0 {
                let next = shift(run, dir);
                legal |= next & empty;
                run = next & opp;
            }
        }

        legal
    }

    /// Every legal move for `player` with its flip set, lowest square first.
    pub fn legal_moves(&self, player: Player) -> Vec<Move> {
        let (me, opp) = self.sides(player);
        crate::types::coords_of(self.legal_mask(player))
            .map(|at| Move {
                at,
                flips: Self::collect_flips(at.index(), me, opp),
            })
            .collect()
    }

    pub fn has_moves(&self, player: Player) -> bool {
        self.legal_mask(player) != 0
    }

    /// Looks up the legal move that places on `at`, if there is one.
    pub fn move_at(&self, at: Coord, player: Player) -> Option<Move> {
        let (me, opp) = self.sides(player);
        let flips = Self::collect_flips(at.index(), me, opp);
        (flips != 0).then_some(Move { at, flips })
    }

    /// Returns a new board with the placement and its flips applied.
    /// Caller contract: `mv` came from `legal_moves` for this board and player.
    pub fn apply_move(&self, mv: &Move, player: Player) -> Self {
        let (me, opp) = self.sides(player);
        let next_me = me | mv.at.bit() | mv.flips;
        let next_opp = opp & !mv.flips;

        match player {
            Player::Black => Self {
                black: next_me,
                white: next_opp,
            },
            Player::White => Self {
                black: next_opp,
                white: next_me,
            },
        }
    }

    /// True when neither side can move.
    pub fn is_terminal(&self) -> bool {
        !self.has_moves(Player::Black) && !self.has_moves(Player::White)
    }

    /// Returns `(black_count, white_count)`.
    pub fn count(&self) -> (u8, u8) {
        (self.black.count_ones() as u8, self.white.count_ones() as u8)
    }

    /// Returns the number of empty squares.
    pub fn empty_count(&self) -> u8 {
        let (black_count, white_count) = self.count();
        BOARD_CELLS as u8 - black_count - white_count
    }

    /// Same layout with the colours exchanged.
    pub fn swap_colors(&self) -> Self {
        Self {
            black: self.white,
            white: self.black,
        }
    }

    /// Converts board to `[u8; 64]` where 0=empty, 1=black, 2=white.
    pub fn to_array(&self) -> [u8; BOARD_CELLS] {
        let mut board = [0u8; BOARD_CELLS];
        for (pos, cell) in board.iter_mut().enumerate() {
            *cell = self.cell(Coord::from_index(pos)).code();
        }
        board
    }

    fn sides(&self, player: Player) -> (u64, u64) {
        match player {
            Player::Black => (self.black, self.white),
            Player::White => (self.white, self.black),
        }
    }

    fn collect_flips(pos: usize, me: u64, opp: u64) -> u64 {
        if pos >= BOARD_CELLS {
            return 0;
        }

        let move_bit = bit(pos);
        if ((me | opp) & move_bit) != 0 {
            return 0;
        }

        let (row, col) = pos_to_row_col(pos);
        let mut flips = 0u64;

        for (dr, dc) in DIRECTIONS {
            let mut r = row + dr;
            let mut c = col + dc;
            let mut line = 0u64;

            while in_bounds(r, c) {
                let square = bit((r as usize) * BOARD_WIDTH + c as usize);
                if (opp & square) != 0 {
                    line |= square;
                } else if (me & square) != 0 {
                    flips |= line;
                    break;
                } else {
                    break;
                }

                r += dr;
                c += dc;
            }
        }

        flips
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// A board together with the side to move. Two positions with the same discs
/// but different movers are different states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub board: Board,
    pub to_move: Player,
}

impl Position {
    /// Standard four-disc setup, black to move.
    pub fn initial() -> Self {
        Self {
            board: Board::new(),
            to_move: Player::Black,
        }
    }

    pub fn new(board: Board, to_move: Player) -> Self {
        Self { board, to_move }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.legal_moves(self.to_move)
    }

    /// Applies `mv` for the side to move and hands the turn over.
    pub fn play(&self, mv: &Move) -> Self {
        Self {
            board: self.board.apply_move(mv, self.to_move),
            to_move: self.to_move.opponent(),
        }
    }

    /// Same discs, other side to move.
    pub fn pass(&self) -> Self {
        Self {
            board: self.board,
            to_move: self.to_move.opponent(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}

/// Moves every disc one step in direction `dir` (index into `DIRECTIONS`),
/// dropping discs that would wrap around a board edge.
fn shift(bits: u64, dir: usize) -> u64 {
    match dir {
        0 => (bits >> 9) & NOT_COL_7,
        1 => bits >> 8,
        2 => (bits >> 7) & NOT_COL_0,
        3 => (bits >> 1) & NOT_COL_7,
        4 => (bits << 1) & NOT_COL_0,
        5 => (bits << 7) & NOT_COL_7,
        6 => bits << 8,
        7 => (bits << 9) & NOT_COL_0,
        _ => 0,
    }
}

const fn bit(pos: usize) -> u64 {
    if pos < BOARD_CELLS { 1u64 << pos } else { 0 }
}

fn pos_to_row_col(pos: usize) -> (i32, i32) {
    ((pos / BOARD_WIDTH) as i32, (pos % BOARD_WIDTH) as i32)
}

fn in_bounds(row: i32, col: i32) -> bool {
    (0..BOARD_WIDTH as i32).contains(&row) && (0..BOARD_WIDTH as i32).contains(&col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(row: usize, col: usize) -> usize {
        row * BOARD_WIDTH + col
    }

    fn at(row: u8, col: u8) -> Coord {
        Coord { row, col }
    }

    /// Walks a fixed pseudo-random game, yielding every position reached.
    fn playout(seed: u64) -> Vec<Position> {
        let mut state = seed;
        let mut position = Position::initial();
        let mut seen = vec![position];
        while !position.board.is_terminal() {
            let moves = position.legal_moves();
            if moves.is_empty() {
                position = position.pass();
                continue;
            }
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let pick = (state >> 33) as usize % moves.len();
            position = position.play(&moves[pick]);
            seen.push(position);
        }
        seen
    }

    /// Reference implementation: slow per-square scan.
    fn scan_legal_mask(board: &Board, player: Player) -> u64 {
        let (me, opp) = board.sides(player);
        (0..BOARD_CELLS)
            .filter(|&pos| Board::collect_flips(pos, me, opp) != 0)
            .fold(0, |mask, pos| mask | bit(pos))
    }

    #[test]
    fn t01_initial_black_legal_moves_are_four_expected_squares() {
        let board = Board::new();

        let expected = bit(idx(2, 3)) | bit(idx(3, 2)) | bit(idx(4, 5)) | bit(idx(5, 4)); // d3,c4,f5,e6

        assert_eq!(board.legal_mask(Player::Black), expected);
        let notations: Vec<String> = board
            .legal_moves(Player::Black)
            .iter()
            .map(Move::notation)
            .collect();
        assert_eq!(notations, vec!["D3", "C4", "F5", "E6"]);
    }

    #[test]
    fn initial_white_legal_moves_mirror_black() {
        let board = Board::new();

        let expected = bit(idx(2, 4)) | bit(idx(3, 5)) | bit(idx(4, 2)) | bit(idx(5, 3)); // e3,f4,c5,d6

        assert_eq!(board.legal_mask(Player::White), expected);
    }

    #[test]
    fn apply_move_flips_opponent_stones_and_updates_counts() {
        let board = Board::new();
        let mv = board.move_at(at(2, 3), Player::Black).unwrap(); // d3

        assert_eq!(mv.flips, bit(idx(3, 3))); // d4
        let next = board.apply_move(&mv, Player::Black);

        assert_eq!(next.count(), (4, 1));
        assert_eq!(next.empty_count(), 59);
        assert_eq!(board.count(), (2, 2));

        let cells = next.to_array();
        assert_eq!(cells[idx(2, 3)], 1);
        assert_eq!(cells[idx(3, 3)], 1);
        assert_eq!(cells[idx(3, 4)], 1);
        assert_eq!(cells[idx(4, 3)], 1);
        assert_eq!(cells[idx(4, 4)], 2);
    }

    #[test]
    fn occupied_or_non_flipping_squares_are_not_moves() {
        let board = Board::new();

        assert_eq!(board.move_at(at(0, 0), Player::Black), None);
        assert_eq!(board.move_at(at(3, 3), Player::Black), None);
        assert_eq!(board.move_at(at(3, 4), Player::Black), None);
    }

    #[test]
    fn flips_stop_at_edges_and_empties() {
        // Row 0: W W B . with black to play at col 3: only the run bounded by
        // the black disc at col 2 would count, but col 2 is adjacent so nothing flips.
        // Row 7: . W W with black to play at col 0: the run hits the edge.
        let white = bit(idx(0, 0)) | bit(idx(0, 1)) | bit(idx(7, 1)) | bit(idx(7, 2));
        let black = bit(idx(0, 2));
        let board = Board::from_bitboards(black, white);

        assert_eq!(board.move_at(at(0, 3), Player::Black), None);
        assert_eq!(board.move_at(at(7, 0), Player::Black), None);
        // White at col 3 flips the black disc at col 2 back along the row.
        let mv = board.move_at(at(0, 3), Player::White).unwrap();
        assert_eq!(mv.flips, bit(idx(0, 2)));
    }

    #[test]
    fn flips_union_every_bounded_direction() {
        // White runs capped by black discs at (4,2) and (4,4). Each placement
        // collects one diagonal and one vertical run.
        let black = bit(idx(4, 4)) | bit(idx(4, 2));
        let white = bit(idx(3, 3)) | bit(idx(3, 4)) | bit(idx(3, 2));
        let board = Board::from_bitboards(black, white);

        let mv = board.move_at(at(2, 2), Player::Black).unwrap();
        assert_eq!(mv.flips, bit(idx(3, 3)) | bit(idx(3, 2)));

        let mv = board.move_at(at(2, 4), Player::Black).unwrap();
        assert_eq!(mv.flips, bit(idx(3, 4)) | bit(idx(3, 3)));
    }

    #[test]
    fn shift_generation_matches_square_scan_over_playouts() {
        for seed in 1..=8 {
            for position in playout(seed) {
                for player in [Player::Black, Player::White] {
                    assert_eq!(
                        position.board.legal_mask(player),
                        scan_legal_mask(&position.board, player),
                        "seed {seed}"
                    );
                }
            }
        }
    }

    #[test]
    fn flipped_discs_change_owner_and_counts_stay_consistent() {
        for seed in 11..=14 {
            for position in playout(seed) {
                let (black, white) = position.board.count();
                let occupied = position.board.to_array().iter().filter(|&&c| c != 0).count();
                assert_eq!(black as usize + white as usize, occupied);
                assert_eq!(position.board.black() & position.board.white(), 0);

                let player = position.to_move;
                for mv in position.legal_moves() {
                    assert_ne!(mv.flips, 0);
                    let next = position.board.apply_move(&mv, player);
                    for coord in mv.flipped() {
                        assert_eq!(position.board.cell(coord), Cell::from(player.opponent()));
                        assert_eq!(next.cell(coord), Cell::from(player));
                    }
                    assert_eq!(next.cell(mv.at), Cell::from(player));
                }
            }
        }
    }

    #[test]
    fn terminal_iff_neither_side_has_moves() {
        for seed in 21..=24 {
            for position in playout(seed) {
                let board = position.board;
                assert_eq!(
                    board.is_terminal(),
                    board.legal_moves(Player::Black).is_empty()
                        && board.legal_moves(Player::White).is_empty()
                );
            }
        }
    }

    #[test]
    fn full_board_is_terminal() {
        let board = Board::from_bitboards(u64::MAX ^ bit(0), bit(0));

        assert!(board.is_terminal());
        assert_eq!(board.count(), (63, 1));
        assert_eq!(board.empty_count(), 0);
    }

    #[test]
    fn position_keys_differ_by_side_to_move() {
        let black_to_move = Position::initial();
        let white_to_move = black_to_move.pass();

        assert_ne!(black_to_move, white_to_move);
        assert_eq!(black_to_move.board, white_to_move.board);
    }

    #[test]
    fn corner_masks_have_expected_population() {
        assert_eq!(CORNERS.count_ones(), 4);
        assert_eq!(CORNER_ADJACENT.count_ones(), 12);
        assert_eq!(CORNERS & CORNER_ADJACENT, 0);
    }
}
