//! Browser bindings (wasm32 only)
//!
//! A thin JSON bridge over `Arcade` for the presentation layer. Progression
//! and settings persist to LocalStorage.

use wasm_bindgen::prelude::*;

use crate::persistence::LocalStorage;
use crate::{Arcade, GameKind, InputEvent};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Arcade runtime starting...");
}

#[wasm_bindgen]
pub struct WebArcade {
    inner: Arcade,
}

#[wasm_bindgen]
impl WebArcade {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebArcade {
        Self {
            inner: Arcade::new(Box::new(LocalStorage)),
        }
    }

    #[wasm_bindgen(js_name = startMatch)]
    pub fn start_match(&mut self, game: &str, opponent: usize, level: u8) -> Result<(), JsValue> {
        let game = GameKind::from_name(game).ok_or_else(|| JsValue::from_str(&format!("unknown game {game}")))?;
        self.inner
            .start_match(game, opponent, level)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Forward an input event given as JSON, e.g. `{"Tap":{"pos":[40,60]}}`
    pub fn input(&mut self, event_json: &str) -> Result<bool, JsValue> {
        let event: InputEvent = serde_json::from_str(event_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let outcome = self.inner.on_input(&event).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(outcome == crate::InputOutcome::Applied)
    }

    pub fn tick(&mut self) {
        self.inner.on_tick();
    }

    /// Current snapshot as JSON, or `null` on the menu
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.inner.snapshot()).unwrap_or_else(|_| "null".to_string())
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        serde_json::to_string(&self.inner.drain_events()).unwrap_or_else(|_| "[]".to_string())
    }

    #[wasm_bindgen(js_name = exitToMenu)]
    pub fn exit_to_menu(&mut self) {
        self.inner.exit_to_menu();
    }

    /// Progression record for `game` as JSON
    pub fn progression(&self, game: &str) -> Result<String, JsValue> {
        let game = GameKind::from_name(game).ok_or_else(|| JsValue::from_str(&format!("unknown game {game}")))?;
        serde_json::to_string(self.inner.ledger(game).record()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = isUnlocked)]
    pub fn is_unlocked(&self, game: &str, opponent: usize, level: u8) -> bool {
        GameKind::from_name(game).is_some_and(|g| self.inner.ledger(g).is_level_unlocked(opponent, level))
    }

    #[wasm_bindgen(js_name = resetProgress)]
    pub fn reset_progress(&mut self, game: &str) {
        if let Some(game) = GameKind::from_name(game) {
            self.inner.reset_progress(game);
        }
    }
}

impl Default for WebArcade {
    fn default() -> Self {
        Self::new()
    }
}
