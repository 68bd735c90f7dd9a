use std::collections::HashMap;

use tracing::{debug, info};
use web_time::Instant;

use crate::ai::eval::evaluate;
use crate::board::{Board, Position};
use crate::config::SearchConfig;
use crate::types::{Move, Player};

/// Base magnitude of a decided game. Larger than any heuristic score.
pub const WIN_SCORE: f64 = 100_000.0;
const MIN_SCORE: f64 = f64::NEG_INFINITY;
const MAX_SCORE: f64 = f64::INFINITY;

/// How a cached score relates to the true value of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Exact,
    /// Failed high: true score >= stored score.
    Lower,
    /// Failed low: true score <= stored score.
    Upper,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    depth: u8,
    score: f64,
    bound: Bound,
    best: Option<Move>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Node {
    score: f64,
    best: Option<Move>,
}

impl Node {
    fn leaf(score: f64) -> Self {
        Self { score, best: None }
    }
}

/// Outcome of one `search_with_report` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchReport {
    pub best: Option<Move>,
    /// Score of `best` from the mover's perspective at `depth`.
    pub score: f64,
    /// Deepest iteration that produced a move; 0 when none did.
    pub depth: u8,
    pub nodes: u64,
    pub timed_out: bool,
}

impl SearchReport {
    fn empty() -> Self {
        Self {
            best: None,
            score: 0.0,
            depth: 0,
            nodes: 0,
            timed_out: false,
        }
    }
}

/// Identifies the session state a search was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    pub position: Position,
    /// History length when the search started.
    pub ply: usize,
}

/// Time-bounded iterative-deepening negamax with alpha-beta pruning.
///
/// The transposition cache lives only for the duration of one search call.
pub struct Searcher {
    config: SearchConfig,
    deadline: Instant,
    cache: HashMap<Position, CacheEntry>,
    nodes: u64,
    timed_out: bool,
}

impl Searcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            deadline: Instant::now() + config.budget(),
            cache: HashMap::new(),
            nodes: 0,
            timed_out: false,
        }
    }

    /// Picks a move for `position.to_move`, or `None` when `legal` is empty.
    pub fn select_move(&mut self, position: &Position, legal: &[Move]) -> Option<Move> {
        self.search_with_report(position, legal).best
    }

    pub fn search_with_report(&mut self, position: &Position, legal: &[Move]) -> SearchReport {
        self.start();

        let mut report = SearchReport::empty();
        if legal.is_empty() {
            return report;
        }

        for depth in self.config.min_depth..=self.config.max_depth {
            if !self.iterate(position, legal, depth, &mut report) {
                break;
            }
        }
        self.finish(position, legal, report)
    }

    /// Runs one deepening iteration and folds it into `report`. Returns
    /// whether there is time left for another.
    fn iterate(
        &mut self,
        position: &Position,
        legal: &[Move],
        depth: u8,
        report: &mut SearchReport,
    ) -> bool {
        let node = self.negamax(position, depth, MIN_SCORE, MAX_SCORE);
        if let Some(mv) = node.best.filter(|mv| legal.contains(mv)) {
            report.best = Some(mv);
            report.score = node.score;
            report.depth = depth;
        }
        debug!(
            depth,
            score = node.score,
            nodes = self.nodes,
            timed_out = self.timed_out,
            "search iteration finished"
        );
        if self.expired() {
            self.timed_out = true;
            return false;
        }
        true
    }

    fn finish(&self, position: &Position, legal: &[Move], mut report: SearchReport) -> SearchReport {
        if report.best.is_none() {
            report.best = legal.first().copied();
        }
        report.nodes = self.nodes;
        report.timed_out = self.timed_out;

        info!(
            player = %position.to_move,
            best = ?report.best.map(|mv| mv.notation()),
            score = report.score,
            depth = report.depth,
            nodes = report.nodes,
            timed_out = report.timed_out,
            "search selected move"
        );
        report
    }

    /// One full-width search at a fixed depth, bounded by the configured budget.
    /// Returns the score from the mover's perspective and the best move.
    pub fn search_depth(&mut self, position: &Position, depth: u8) -> (f64, Option<Move>) {
        self.start();
        let node = self.negamax(position, depth, MIN_SCORE, MAX_SCORE);
        (node.score, node.best)
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    fn start(&mut self) {
        self.deadline = Instant::now() + self.config.budget();
        self.cache.clear();
        self.nodes = 0;
        self.timed_out = false;
    }

    fn expired(&self) -> bool {
        Instant::now() > self.deadline
    }

    fn static_score(&self, board: &Board, player: Player) -> f64 {
        player.sign() * evaluate(board, &self.config.weights)
    }

    fn negamax(&mut self, position: &Position, depth: u8, mut alpha: f64, beta: f64) -> Node {
        self.nodes += 1;
        let player = position.to_move;
        let board = &position.board;

        // Past the deadline the static score stands in for the subtree.
        if self.expired() {
            self.timed_out = true;
            return Node::leaf(self.static_score(board, player));
        }

        if let Some(entry) = self.cache.get(position)
            && entry.depth >= depth
        {
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => entry.score >= beta,
                Bound::Upper => entry.score <= alpha,
            };
            if usable {
                return Node {
                    score: entry.score,
                    best: entry.best,
                };
            }
        }

        if depth == 0 {
            return Node::leaf(self.static_score(board, player));
        }

        if board.is_terminal() {
            return Node::leaf(terminal_score(board, player));
        }

        let alpha_orig = alpha;
        let moves = position.legal_moves();
        if moves.is_empty() {
            let child = self.negamax(&position.pass(), depth - 1, -beta, -alpha);
            let node = Node::leaf(-child.score);
            self.store(position, depth, node, alpha_orig, beta);
            return node;
        }

        let mut best = None;
        let mut best_score = MIN_SCORE;

        for mv in order_moves(moves) {
            let child = self.negamax(&position.play(&mv), depth - 1, -beta, -alpha);
            let score = -child.score;
            if score > best_score {
                best_score = score;
                best = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
            if self.expired() {
                self.timed_out = true;
                break;
            }
        }

        let node = Node {
            score: best_score,
            best,
        };
        self.store(position, depth, node, alpha_orig, beta);
        node
    }

    fn store(&mut self, position: &Position, depth: u8, node: Node, alpha: f64, beta: f64) {
        let bound = if node.score <= alpha {
            Bound::Upper
        } else if node.score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.cache.insert(
            *position,
            CacheEntry {
                depth,
                score: node.score,
                bound,
                best: node.best,
            },
        );
    }
}

/// A search advanced one deepening iteration per [`DeepeningSearch::step`],
/// for hosts that must regain control between iterations.
///
/// The deadline starts when the search is created and keeps running between
/// steps. Results match [`Searcher::search_with_report`] for the same budget.
pub struct DeepeningSearch {
    searcher: Searcher,
    position: Position,
    legal: Vec<Move>,
    next_depth: u8,
    report: SearchReport,
    done: bool,
}

impl DeepeningSearch {
    pub fn new(config: SearchConfig, position: Position, legal: Vec<Move>) -> Self {
        let mut searcher = Searcher::new(config);
        searcher.start();
        let done = legal.is_empty();
        Self {
            searcher,
            position,
            legal,
            next_depth: config.min_depth,
            report: SearchReport::empty(),
            done,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Runs the next iteration. Returns whether another one is still due.
    pub fn step(&mut self) -> bool {
        if self.done {
            return false;
        }
        let depth = self.next_depth;
        let more = self
            .searcher
            .iterate(&self.position, &self.legal, depth, &mut self.report);
        if more && depth < self.searcher.config.max_depth {
            self.next_depth = depth + 1;
        } else {
            self.done = true;
        }
        !self.done
    }

    /// Completes any remaining iterations, then reports.
    pub fn finish(mut self) -> SearchReport {
        while self.step() {}
        if self.legal.is_empty() {
            return self.report;
        }
        self.searcher.finish(&self.position, &self.legal, self.report)
    }
}

/// Score of a finished game from `player`'s perspective: zero for a draw,
/// otherwise `WIN_SCORE` plus the disc margin, signed toward the winner.
pub fn terminal_score(board: &Board, player: Player) -> f64 {
    let (black, white) = board.count();
    if black == white {
        return 0.0;
    }
    let base = WIN_SCORE + (black as f64 - white as f64).abs();
    let black_won = black > white;
    if black_won == (player == Player::Black) {
        base
    } else {
        -base
    }
}

/// Corners first, then larger flip sets. Ties keep generation order.
fn order_moves(mut moves: Vec<Move>) -> Vec<Move> {
    moves.sort_by(|left, right| {
        right
            .at
            .is_corner()
            .cmp(&left.at.is_corner())
            .then_with(|| right.flip_count().cmp(&left.flip_count()))
    });
    moves
}
