//! Runtime settings
//!
//! Persisted as JSON next to progression under `<prefix>:settings`.
//! Unknown or missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_TICK_HZ;
use crate::persistence::{KvStore, StoreError, load_json, save_json};

pub const DEFAULT_PREFIX: &str = "arcade";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Simulation ticks per second
    pub tick_hz: u32,
    /// Countdown before a match goes live
    pub countdown_secs: f32,
    /// Fixed seed for every match; None draws from entropy
    pub seed: Option<u64>,
    /// First segment of every storage key
    pub namespace_prefix: String,
    /// Live entity cap per session
    pub max_live_entities: usize,

    // === Accessibility ===
    /// Suppress dim and flash effects
    pub reduced_motion: bool,

    // === Development ===
    /// Ignore unlock gating
    pub unlock_all: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            countdown_secs: 3.0,
            seed: None,
            namespace_prefix: DEFAULT_PREFIX.to_string(),
            max_live_entities: 48,
            reduced_motion: false,
            unlock_all: false,
        }
    }
}

impl Settings {
    /// Settings always live under the default prefix so they can be found
    /// before the configured prefix is known
    pub fn storage_key() -> String {
        format!("{DEFAULT_PREFIX}:settings")
    }

    pub fn load(store: &dyn KvStore) -> Self {
        load_json::<Self>(store, &Self::storage_key()).sanitized()
    }

    pub fn save(&self, store: &mut dyn KvStore) -> Result<(), StoreError> {
        save_json(store, &Self::storage_key(), self)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Countdown length in whole ticks
    pub fn countdown_ticks(&self) -> u32 {
        (self.countdown_secs.max(0.0) * self.tick_hz as f32).round() as u32
    }

    fn sanitized(mut self) -> Self {
        self.tick_hz = self.tick_hz.clamp(10, 240);
        if !self.countdown_secs.is_finite() {
            self.countdown_secs = Self::default().countdown_secs;
        }
        self.countdown_secs = self.countdown_secs.clamp(0.0, 10.0);
        self.max_live_entities = self.max_live_entities.max(1);
        if self.namespace_prefix.is_empty() {
            self.namespace_prefix = DEFAULT_PREFIX.to_string();
        }
        self
    }
}
