//! Search and session settings.
//!
//! Every field has a default, so a host may pass a partial object (or nothing)
//! and get the standard profile: an 800 ms budget, depths 2 through 6 and the
//! default evaluation weights.

use std::time::Duration;

use serde::Deserialize;

use crate::ai::eval::EvalWeights;
use crate::error::{GameError, GameResult};

pub const DEFAULT_BUDGET_MS: u64 = 800;
pub const DEFAULT_MIN_DEPTH: u8 = 2;
pub const DEFAULT_MAX_DEPTH: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// Wall-clock budget per move.
    pub budget_ms: u64,
    /// First iterative-deepening depth.
    pub min_depth: u8,
    /// Last iterative-deepening depth.
    pub max_depth: u8,
    pub weights: EvalWeights,
}

impl SearchConfig {
    pub const fn standard() -> Self {
        Self {
            budget_ms: DEFAULT_BUDGET_MS,
            min_depth: DEFAULT_MIN_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
            weights: EvalWeights::DEFAULT,
        }
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.min_depth == 0 {
            return Err(GameError::InvalidConfig(
                "minDepth must be at least 1".to_string(),
            ));
        }
        if self.min_depth > self.max_depth {
            return Err(GameError::InvalidConfig(format!(
                "minDepth {} exceeds maxDepth {}",
                self.min_depth, self.max_depth
            )));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Engine id for black.
    pub black: String,
    /// Engine id for white.
    pub white: String,
    pub search: SearchConfig,
    /// Play a cue when discs flip.
    pub sound: bool,
}

impl SessionConfig {
    pub fn validate(&self) -> GameResult<()> {
        self.search.validate()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            black: crate::ai::engine::HUMAN_ID.to_string(),
            white: crate::ai::engine::HUMAN_ID.to_string(),
            search: SearchConfig::default(),
            sound: true,
        }
    }
}
