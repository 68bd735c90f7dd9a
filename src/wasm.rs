use std::sync::Arc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::SessionConfig;
use crate::error::GameError;
use crate::game::GameSession;
use crate::sfx::QueuedCues;
use crate::types::{Coord, Player};

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineInfo {
    id: String,
    name: String,
    is_human: bool,
}

/// Browser-facing handle around a [`GameSession`].
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
    cues: Arc<QueuedCues>,
}

#[wasm_bindgen]
impl WasmGame {
    /// `config` may be `undefined` or a partial `SessionConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmGame, JsValue> {
        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|err| GameError::InvalidConfig(err.to_string()))?
        };
        let mut session = GameSession::new(config)?;

        let cues = Arc::new(QueuedCues::default());
        session.set_cue_sink(cues.clone());

        Ok(Self { session, cues })
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.session.view())?)
    }

    pub fn log(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.session.log())?)
    }

    pub fn place(&mut self, row: u8, col: u8) -> Result<(), JsValue> {
        let at = Coord::new(row, col)?;
        self.session.play_at(at)?;
        Ok(())
    }

    /// Passes for the side to move; ignored while it has a legal move.
    pub fn pass_turn(&mut self) -> bool {
        self.session.pass_turn()
    }

    /// Starts the computer side's search. The host then calls
    /// `poll_engine_turn` from a timer until it reports a move, staying
    /// responsive in between. Returns whether the game advanced at once
    /// (forced pass).
    pub fn start_engine_turn(&mut self) -> bool {
        self.session.start_engine_turn()
    }

    /// Runs one more search iteration. Returns whether the game advanced.
    pub fn poll_engine_turn(&mut self) -> bool {
        self.session.poll_engine_turn()
    }

    pub fn is_searching(&self) -> bool {
        self.session.is_searching()
    }

    pub fn is_human_turn(&self) -> bool {
        self.session.is_human_turn()
    }

    pub fn set_engine(&mut self, player: u8, id: &str) -> Result<(), JsValue> {
        let player = Player::from_code(player)?;
        self.session.set_engine(player, id);
        Ok(())
    }

    pub fn engines(&self) -> Result<JsValue, JsValue> {
        let engines: Vec<EngineInfo> = self
            .session
            .registry()
            .iter()
            .map(|engine| EngineInfo {
                id: engine.id().to_string(),
                name: engine.name().to_string(),
                is_human: engine.is_human(),
            })
            .collect();
        Ok(serde_wasm_bindgen::to_value(&engines)?)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn first(&mut self) {
        self.session.first();
    }

    pub fn prev(&mut self) {
        self.session.prev();
    }

    pub fn next(&mut self) {
        self.session.next();
    }

    pub fn last(&mut self) {
        self.session.last();
    }

    pub fn seek(&mut self, index: usize) {
        self.session.seek(index);
    }

    pub fn advance_replay(&mut self) -> bool {
        self.session.advance_replay()
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.session.set_sound(enabled);
    }

    /// Blips queued since the last call, for the host's audio context.
    pub fn take_cues(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.cues.drain())?)
    }
}
