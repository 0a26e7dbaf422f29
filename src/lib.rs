//! Arcade Runtime - shared core for a set of casual arcade mini-games
//!
//! Core modules:
//! - `sim`: Per-session simulation (entities, interactions, timed attempts, match state)
//! - `games`: Rulesets for each mini-game, built on top of `sim`
//! - `difficulty`: Opponent/level difficulty curves and flow adjustment
//! - `progression`: Star-point ledger with unlock gating
//! - `persistence`: Key-value storage backends (memory, file, LocalStorage)
//! - `arcade`: Controller tying sessions, progression and settings together
//! - `autoplay`: Snapshot-driven bot for headless runs

pub mod arcade;
pub mod autoplay;
pub mod difficulty;
pub mod games;
pub mod persistence;
pub mod progression;
pub mod rng;
pub mod roster;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use arcade::{Arcade, MatchReport, Screen, StartError};
pub use games::GameKind;
pub use progression::{Award, ProgressionLedger, ProgressionRecord};
pub use settings::Settings;
pub use sim::{InputEvent, InputOutcome, InputRejected, MatchResult, Snapshot};

/// Game configuration constants
pub mod consts {
    /// Default simulation rate (ticks per second)
    pub const DEFAULT_TICK_HZ: u32 = 60;

    /// Play field is expressed in percentages of the visible area
    pub const FIELD_WIDTH: f32 = 100.0;
    pub const FIELD_HEIGHT: f32 = 100.0;

    /// Opponent roster size per game
    pub const OPPONENT_COUNT: usize = 10;
    /// Levels run 1..=MAX_LEVEL
    pub const MAX_LEVEL: u8 = 10;

    /// Progression counter ceiling per opponent (10 stars x 4 points)
    pub const MAX_STAR_POINTS: u8 = 40;
    pub const POINTS_PER_STAR: u8 = 4;

    /// Combined difficulty never exceeds this fraction
    pub const MAX_DIFFICULTY: f32 = 0.95;

    /// Bounded retries for spawns that need a free spot
    pub const MAX_SPAWN_ATTEMPTS: u32 = 100;

    /// Stun duration (48 ticks at 60 Hz)
    pub const STUN_SECS: f32 = 0.8;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Seconds to whole ticks at the given rate (at least one tick)
#[inline]
pub fn secs_to_ticks(secs: f32, tick_hz: u32) -> u32 {
    ((secs * tick_hz as f32).round() as u32).max(1)
}
