pub mod engine;
pub mod eval;
pub mod search;
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use engine::{Engine, EngineRegistry, HumanEngine, MinimaxEngine, get_engine};
pub use eval::{EvalWeights, evaluate, to_probability};
pub use search::{DeepeningSearch, SearchReport, SearchTicket, Searcher};
