use std::sync::Arc;

use tracing::{debug, info};

use crate::ai::engine::{Engine, EngineRegistry};
use crate::ai::eval::{EvalWeights, evaluate, status_probability};
use crate::ai::search::{DeepeningSearch, SearchTicket};
#[cfg(not(target_arch = "wasm32"))]
use crate::ai::worker::{PendingSearch, Poll, spawn_search};
use crate::board::{Board, Position};
use crate::config::SessionConfig;
use crate::error::{GameError, GameResult};
use crate::sfx::{self, CueSink};
use crate::types::{Coord, GameStatus, GameView, LogEntry, Move, Player, WinProbability, Winner};

/// One point on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub position: Position,
    pub status: GameStatus,
}

impl Snapshot {
    fn start(position: Position) -> Self {
        let board = &position.board;
        let status = if board.is_terminal() {
            game_over(board)
        } else {
            GameStatus::Playing {
                turn: position.to_move,
            }
        };
        Self { position, status }
    }
}

/// A computer move in progress.
enum PendingTurn {
    #[cfg(not(target_arch = "wasm32"))]
    Thread(PendingSearch),
    Stepped {
        ticket: SearchTicket,
        search: DeepeningSearch,
    },
}

impl PendingTurn {
    fn ticket(&self) -> SearchTicket {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            Self::Thread(search) => search.ticket(),
            Self::Stepped { ticket, .. } => *ticket,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Backend {
    #[cfg(not(target_arch = "wasm32"))]
    Thread,
    Stepped,
}

/// Game history, replay cursor, move log and per-side engine selection.
///
/// Requests that make no sense in the current state (moving after the game
/// ended, passing while a move exists, a stale engine answer) are ignored.
pub struct GameSession {
    history: Vec<Snapshot>,
    log: Vec<LogEntry>,
    cursor: usize,
    engines: [String; 2],
    registry: Arc<EngineRegistry>,
    weights: EvalWeights,
    sound: bool,
    /// Cue sink for this session; the process-wide player when unset.
    cues: Option<Arc<dyn CueSink>>,
    pending: Option<PendingTurn>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> GameResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Two human players, standard search profile.
    pub fn with_defaults() -> Self {
        Self::build(SessionConfig::default())
    }

    fn build(config: SessionConfig) -> Self {
        Self {
            history: vec![Snapshot::start(Position::initial())],
            log: Vec::new(),
            cursor: 0,
            engines: [config.black, config.white],
            registry: Arc::new(EngineRegistry::with_search_config(config.search)),
            weights: config.search.weights,
            sound: config.sound,
            cues: None,
            pending: None,
        }
    }

    /// Replaces the history with a single arbitrary starting position.
    pub fn load_position(&mut self, position: Position) {
        self.history = vec![Snapshot::start(position)];
        self.log.clear();
        self.cursor = 0;
        self.cancel_search();
    }

    pub fn reset(&mut self) {
        info!("session reset");
        self.load_position(Position::initial());
    }

    pub fn current(&self) -> &Snapshot {
        &self.history[self.cursor]
    }

    pub fn position(&self) -> &Position {
        &self.current().position
    }

    pub fn status(&self) -> GameStatus {
        self.current().status
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.position().legal_moves()
    }

    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_index(&self) -> usize {
        self.history.len() - 1
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.last_index()
    }

    /// Black-relative score of the viewed position.
    pub fn current_eval(&self) -> f64 {
        evaluate(&self.position().board, &self.weights)
    }

    pub fn probability(&self) -> WinProbability {
        status_probability(&self.status(), self.current_eval())
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.sound = enabled;
    }

    /// Routes this session's cues to `sink` instead of the shared player.
    pub fn set_cue_sink(&mut self, sink: Arc<dyn CueSink>) {
        self.cues = Some(sink);
    }

    /// Advances the game by `mv`, or by a pass when `mv` is `None`.
    ///
    /// Anything after the cursor is discarded first. Returns the new log entry,
    /// or `None` when the request was ignored.
    pub fn step(&mut self, mv: Option<Move>) -> Option<&LogEntry> {
        let current = *self.current();
        if current.status.is_over() {
            debug!("ignoring step: game is over");
            return None;
        }

        let position = current.position;
        let mover = position.to_move;
        let legal = position.legal_moves();
        let eval_before = evaluate(&position.board, &self.weights);

        let (snapshot, entry) = match mv {
            Some(mv) => {
                if !legal.contains(&mv) {
                    debug!(notation = %mv.at, "ignoring move outside the legal set");
                    return None;
                }
                let board = position.board.apply_move(&mv, mover);
                let status = next_status(&board, mover);
                let to_move = match status {
                    GameStatus::Playing { turn } => turn,
                    GameStatus::Passed { to, .. } => to,
                    GameStatus::GameOver { .. } => mover,
                };
                let eval_after = evaluate(&board, &self.weights);
                let entry = LogEntry {
                    n: self.cursor + 1,
                    player: mover,
                    mv: Some(mv),
                    notation: mv.notation(),
                    flips: mv.flip_count(),
                    eval_before,
                    eval_after,
                    delta: eval_after - eval_before,
                };
                (
                    Snapshot {
                        position: Position::new(board, to_move),
                        status,
                    },
                    entry,
                )
            }
            None => {
                if !legal.is_empty() {
                    debug!(player = %mover, "ignoring pass: legal moves exist");
                    return None;
                }
                let entry = LogEntry {
                    n: self.cursor + 1,
                    player: mover,
                    mv: None,
                    notation: "pass".to_string(),
                    flips: 0,
                    eval_before,
                    eval_after: eval_before,
                    delta: 0.0,
                };
                (
                    Snapshot {
                        position: position.pass(),
                        status: GameStatus::Passed {
                            from: mover,
                            to: mover.opponent(),
                        },
                    },
                    entry,
                )
            }
        };

        self.history.truncate(self.cursor + 1);
        self.log.truncate(self.cursor);
        self.history.push(snapshot);
        self.log.push(entry);
        self.cursor = self.last_index();
        self.cancel_search();

        debug!(
            n = self.cursor,
            player = %mover,
            notation = %self.log[self.cursor - 1].notation,
            status = %snapshot.status.describe(),
            "step applied"
        );
        if let GameStatus::GameOver { black, white, .. } = snapshot.status {
            info!(black, white, "game over");
        }
        if self.sound && mv.is_some() {
            let flips = self.log[self.cursor - 1].flips as usize;
            match &self.cues {
                Some(sink) => sink.play(&sfx::flip_cue(flips)),
                None => sfx::play_flips(flips),
            }
        }

        self.log.last()
    }

    /// Plays the legal move on `at` for the side to move.
    pub fn play_at(&mut self, at: Coord) -> GameResult<()> {
        let at = Coord::new(at.row, at.col)?;
        let mv = self
            .position()
            .board
            .move_at(at, self.position().to_move)
            .ok_or_else(|| GameError::IllegalMove(at.notation()))?;
        match self.step(Some(mv)) {
            Some(_) => Ok(()),
            None => Err(GameError::IllegalMove(at.notation())),
        }
    }

    pub fn pass_turn(&mut self) -> bool {
        self.step(None).is_some()
    }

    pub fn first(&mut self) {
        self.seek(0);
    }

    pub fn prev(&mut self) {
        self.seek(self.cursor.saturating_sub(1));
    }

    pub fn next(&mut self) {
        self.seek(self.cursor + 1);
    }

    pub fn last(&mut self) {
        self.seek(self.last_index());
    }

    /// Moves the cursor, clamped to the recorded history.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.last_index());
    }

    /// One autoplay tick. Returns whether the cursor moved.
    pub fn advance_replay(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn set_engine(&mut self, player: Player, id: &str) {
        self.engines[side_index(player)] = id.to_string();
        self.cancel_search();
    }

    pub fn engine_id(&self, player: Player) -> &str {
        &self.engines[side_index(player)]
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Unknown engine ids count as human.
    pub fn is_human_turn(&self) -> bool {
        self.registry.is_human(self.engine_id(self.position().to_move))
    }

    /// The computer engine that should move now, if any. Engines stay idle
    /// while the cursor is replaying an earlier point.
    pub fn engine_to_move(&self) -> Option<Arc<dyn Engine>> {
        if self.status().is_over() || !self.at_end() {
            return None;
        }
        self.registry
            .get(self.engine_id(self.position().to_move))
            .filter(|engine| !engine.is_human())
    }

    /// Lets the computer side move, blocking until it has chosen. Passes
    /// automatically when it has no legal move. Returns whether the game advanced.
    pub fn run_engine_turn(&mut self) -> bool {
        let Some(engine) = self.engine_to_move() else {
            return false;
        };
        let legal = self.legal_moves();
        if legal.is_empty() {
            return self.step(None).is_some();
        }
        let choice = engine.select_move(self.position(), &legal);
        self.step(choice).is_some()
    }

    /// Starts the computer side's move without blocking the caller.
    ///
    /// Natively the search runs on a worker thread. In the browser it runs on
    /// the calling thread one deepening iteration per [`Self::poll_engine_turn`],
    /// so the host regains control between iterations. Does nothing while a
    /// search for the same state is already running. Returns whether the game
    /// advanced immediately (auto-pass).
    pub fn start_engine_turn(&mut self) -> bool {
        #[cfg(not(target_arch = "wasm32"))]
        let backend = Backend::Thread;
        #[cfg(target_arch = "wasm32")]
        let backend = Backend::Stepped;
        self.begin_turn(backend)
    }

    /// Like [`Self::start_engine_turn`], but always searches on the calling
    /// thread, one iteration per poll.
    pub fn start_stepped_turn(&mut self) -> bool {
        self.begin_turn(Backend::Stepped)
    }

    fn begin_turn(&mut self, backend: Backend) -> bool {
        let Some(engine) = self.engine_to_move() else {
            return false;
        };
        let ticket = self.ticket();
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket() == ticket)
        {
            return false;
        }
        let legal = self.legal_moves();
        if legal.is_empty() {
            return self.step(None).is_some();
        }

        let pending = match backend {
            #[cfg(not(target_arch = "wasm32"))]
            Backend::Thread => {
                PendingTurn::Thread(spawn_search(Arc::clone(&engine), ticket, legal))
            }
            Backend::Stepped => match engine.begin_search(self.position(), &legal) {
                Some(search) => PendingTurn::Stepped { ticket, search },
                None => {
                    let choice = engine.select_move(self.position(), &legal);
                    return self.step(choice).is_some();
                }
            },
        };
        debug!(engine = engine.id(), ply = ticket.ply, "engine turn started");
        self.pending = Some(pending);
        false
    }

    /// Advances or collects the running search. Answers for a state that is
    /// no longer current are dropped. Returns whether the game advanced.
    pub fn poll_engine_turn(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        match pending {
            #[cfg(not(target_arch = "wasm32"))]
            PendingTurn::Thread(search) => match search.try_take() {
                Poll::Pending => {
                    self.pending = Some(PendingTurn::Thread(search));
                    false
                }
                Poll::Ready(choice) => self.apply_search_result(search.ticket(), choice),
                Poll::Lost => {
                    tracing::warn!("search worker exited without a result");
                    false
                }
            },
            PendingTurn::Stepped { ticket, mut search } => {
                if !self.is_current(ticket) {
                    debug!(ply = ticket.ply, "dropping stale stepped search");
                    return false;
                }
                if search.step() {
                    self.pending = Some(PendingTurn::Stepped { ticket, search });
                    return false;
                }
                self.apply_search_result(ticket, search.finish().best)
            }
        }
    }

    /// Blocks until the running search answers, then applies it like
    /// [`Self::poll_engine_turn`].
    pub fn wait_engine_turn(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        match pending {
            #[cfg(not(target_arch = "wasm32"))]
            PendingTurn::Thread(search) => {
                let ticket = search.ticket();
                match search.wait() {
                    Poll::Ready(choice) => self.apply_search_result(ticket, choice),
                    _ => false,
                }
            }
            PendingTurn::Stepped { ticket, search } => {
                self.apply_search_result(ticket, search.finish().best)
            }
        }
    }

    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    fn ticket(&self) -> SearchTicket {
        SearchTicket {
            position: *self.position(),
            ply: self.history.len(),
        }
    }

    fn is_current(&self, ticket: SearchTicket) -> bool {
        self.at_end() && ticket == self.ticket()
    }

    fn apply_search_result(&mut self, ticket: SearchTicket, choice: Option<Move>) -> bool {
        if !self.is_current(ticket) {
            debug!(ply = ticket.ply, "discarding stale search result");
            return false;
        }
        self.step(choice).is_some()
    }

    fn cancel_search(&mut self) {
        // A worker thread finishes on its own; its answer goes nowhere.
        self.pending = None;
    }

    pub fn view(&self) -> GameView {
        let snapshot = self.current();
        let board = &snapshot.position.board;
        let (black_count, white_count) = board.count();
        let flipped: Vec<Coord> = self
            .cursor
            .checked_sub(1)
            .and_then(|i| self.log.get(i))
            .and_then(|entry| entry.mv)
            .map(|mv| mv.flipped().collect())
            .unwrap_or_default();

        GameView {
            board: board.to_array().to_vec(),
            turn: snapshot.position.to_move,
            status: snapshot.status,
            status_text: snapshot.status.describe(),
            black_count,
            white_count,
            legal_moves: self.legal_moves(),
            flipped,
            eval: self.current_eval(),
            probability: self.probability(),
            cursor: self.cursor,
            last_index: self.last_index(),
            at_end: self.at_end(),
            human_turn: self.is_human_turn(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn side_index(player: Player) -> usize {
    match player {
        Player::Black => 0,
        Player::White => 1,
    }
}

fn game_over(board: &Board) -> GameStatus {
    let (black, white) = board.count();
    GameStatus::GameOver {
        black,
        white,
        winner: Winner::from_counts(black, white),
    }
}

/// Status after `mover` has played onto `board`.
fn next_status(board: &Board, mover: Player) -> GameStatus {
    let opponent = mover.opponent();
    if board.is_terminal() {
        game_over(board)
    } else if board.has_moves(opponent) {
        GameStatus::Playing { turn: opponent }
    } else if board.has_moves(mover) {
        GameStatus::Passed {
            from: opponent,
            to: mover,
        }
    } else {
        game_over(board)
    }
}
