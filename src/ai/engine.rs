//! Selectable move choosers and the registry that names them.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::ai::search::{DeepeningSearch, Searcher};
use crate::board::Position;
use crate::config::SearchConfig;
use crate::types::Move;

pub const HUMAN_ID: &str = "human";
pub const MINIMAX_ID: &str = "minimax";

/// A side's move chooser.
///
/// `select_move` never fails. `None` means either "pass" (no legal moves) or,
/// for human engines, "the host supplies the move".
pub trait Engine: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn is_human(&self) -> bool;
    fn select_move(&self, position: &Position, legal: &[Move]) -> Option<Move>;

    /// A search the caller advances itself, for hosts without threads.
    /// Engines that cannot be stepped return `None`.
    fn begin_search(&self, _position: &Position, _legal: &[Move]) -> Option<DeepeningSearch> {
        None
    }
}

/// Placeholder for a side driven by UI input.
#[derive(Debug, Default, Clone, Copy)]
pub struct HumanEngine;

impl Engine for HumanEngine {
    fn id(&self) -> &str {
        HUMAN_ID
    }

    fn name(&self) -> &str {
        "Human"
    }

    fn is_human(&self) -> bool {
        true
    }

    fn select_move(&self, _position: &Position, _legal: &[Move]) -> Option<Move> {
        None
    }
}

/// Computer player backed by the alpha-beta searcher.
#[derive(Debug, Clone, Copy)]
pub struct MinimaxEngine {
    config: SearchConfig,
}

impl MinimaxEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }
}

impl Default for MinimaxEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl Engine for MinimaxEngine {
    fn id(&self) -> &str {
        MINIMAX_ID
    }

    fn name(&self) -> &str {
        "Minimax (strong)"
    }

    fn is_human(&self) -> bool {
        false
    }

    fn select_move(&self, position: &Position, legal: &[Move]) -> Option<Move> {
        if legal.is_empty() {
            return None;
        }
        Searcher::new(self.config).select_move(position, legal)
    }

    fn begin_search(&self, position: &Position, legal: &[Move]) -> Option<DeepeningSearch> {
        Some(DeepeningSearch::new(self.config, *position, legal.to_vec()))
    }
}

/// Fixed, ordered catalogue of engines.
pub struct EngineRegistry {
    engines: Vec<Arc<dyn Engine>>,
}

impl EngineRegistry {
    /// Human first, then the searcher configured with `config`.
    pub fn with_search_config(config: SearchConfig) -> Self {
        Self {
            engines: vec![
                Arc::new(HumanEngine),
                Arc::new(MinimaxEngine::new(config)),
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Engine>> {
        self.engines.iter().find(|engine| engine.id() == id).cloned()
    }

    /// Unknown ids count as human.
    pub fn is_human(&self, id: &str) -> bool {
        self.get(id).is_none_or(|engine| engine.is_human())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Engine>> {
        self.engines.iter()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_search_config(SearchConfig::default())
    }
}

static REGISTRY: Lazy<EngineRegistry> = Lazy::new(EngineRegistry::default);

/// The built-in registry with the standard search profile.
pub fn registry() -> &'static EngineRegistry {
    &REGISTRY
}

pub fn get_engine(id: &str) -> Option<Arc<dyn Engine>> {
    REGISTRY.get(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_human_then_minimax() {
        let ids: Vec<&str> = registry().iter().map(|engine| engine.id()).collect();

        assert_eq!(ids, vec![HUMAN_ID, MINIMAX_ID]);
    }

    #[test]
    fn lookup_by_id_and_unknown_ids_are_human() {
        assert!(get_engine(MINIMAX_ID).is_some_and(|engine| !engine.is_human()));
        assert!(get_engine("stockfish").is_none());
        assert!(registry().is_human("stockfish"));
        assert!(registry().is_human(HUMAN_ID));
        assert!(!registry().is_human(MINIMAX_ID));
    }

    #[test]
    fn human_engine_never_chooses() {
        let position = Position::initial();
        let legal = position.legal_moves();

        assert_eq!(HumanEngine.select_move(&position, &legal), None);
    }

    #[test]
    fn minimax_returns_none_without_moves_and_a_legal_move_otherwise() {
        let engine = MinimaxEngine::new(SearchConfig {
            budget_ms: 50,
            max_depth: 3,
            ..SearchConfig::default()
        });
        let position = Position::initial();
        let legal = position.legal_moves();

        assert_eq!(engine.select_move(&position, &[]), None);
        let mv = engine.select_move(&position, &legal).unwrap();
        assert!(legal.contains(&mv));
    }

    #[test]
    fn only_the_searcher_can_be_stepped() {
        let position = Position::initial();
        let legal = position.legal_moves();

        assert!(HumanEngine.begin_search(&position, &legal).is_none());
        let stepped = MinimaxEngine::default()
            .begin_search(&position, &legal)
            .unwrap();
        assert_eq!(stepped.position(), &position);
        assert!(!stepped.is_done());
    }
}
