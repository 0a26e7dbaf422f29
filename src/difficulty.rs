//! Difficulty curves
//!
//! Maps (opponent index, level, in-match pressure) to concrete simulation
//! parameters. Each game supplies a `DifficultyTable`; the evaluation is the
//! same everywhere:
//!
//! ```text
//! total = clamp(opponent * opponent_step + (level - 1) * level_step + elapsed * ramp, 0, 0.95)
//! field = lerp(curve.easy, curve.hard, total)
//! ```
//!
//! Curves that hurt the player (spawn rate, opponent power) rise from `easy`
//! to `hard`; curves that help (tolerance, player power) fall.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_DIFFICULTY;
use crate::lerp;

/// A single monotonic parameter curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub easy: f32,
    pub hard: f32,
}

impl Curve {
    pub const fn new(easy: f32, hard: f32) -> Self {
        Self { easy, hard }
    }

    #[inline]
    pub fn at(&self, total: f32) -> f32 {
        lerp(self.easy, self.hard, total)
    }
}

/// Win threshold: `base + level * per_level + opponent * per_opponent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFormula {
    pub base: u32,
    pub per_level: u32,
    pub per_opponent: u32,
}

impl TargetFormula {
    pub fn target(&self, opponent: usize, level: u8) -> u32 {
        self.base + level as u32 * self.per_level + opponent as u32 * self.per_opponent
    }
}

/// Per-game coefficient table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable {
    /// Contribution per opponent index
    pub opponent_step: f32,
    /// Contribution per level above 1
    pub level_step: f32,
    /// Contribution per second of active play
    pub ramp_per_sec: f32,
    /// Spawns per second (rising)
    pub spawn_rate: Curve,
    /// Entity / meter speed (rising)
    pub speed: Curve,
    /// Opponent strength (rising)
    pub opponent_power: Curve,
    /// Player-favourable window or radius scale (falling)
    pub tolerance: Curve,
    /// Per-action player contribution (falling)
    pub player_power: Curve,
    pub target: TargetFormula,
    /// Whether the flow adjuster feeds into spawn rate and speed
    pub uses_flow: bool,
}

/// In-match inputs to the evaluator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pressure {
    pub elapsed_secs: f32,
    pub flow: f32,
}

impl Default for Pressure {
    fn default() -> Self {
        Self {
            elapsed_secs: 0.0,
            flow: 1.0,
        }
    }
}

/// Concrete parameters for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Combined difficulty in [0, MAX_DIFFICULTY]
    pub total: f32,
    pub spawn_rate: f32,
    pub speed: f32,
    pub opponent_power: f32,
    pub tolerance: f32,
    pub player_power: f32,
    pub win_target: u32,
}

/// Combined difficulty before per-field transforms
pub fn total_difficulty(table: &DifficultyTable, opponent: usize, level: u8, elapsed_secs: f32) -> f32 {
    let level_above_one = level.saturating_sub(1) as f32;
    let raw = opponent as f32 * table.opponent_step
        + level_above_one * table.level_step
        + elapsed_secs.max(0.0) * table.ramp_per_sec;
    raw.clamp(0.0, MAX_DIFFICULTY)
}

pub fn evaluate(table: &DifficultyTable, opponent: usize, level: u8, pressure: Pressure) -> DifficultyParams {
    let total = total_difficulty(table, opponent, level, pressure.elapsed_secs);
    let flow = if table.uses_flow { pressure.flow } else { 1.0 };

    DifficultyParams {
        total,
        spawn_rate: table.spawn_rate.at(total) * flow,
        speed: table.speed.at(total) * flow,
        opponent_power: table.opponent_power.at(total),
        tolerance: table.tolerance.at(total),
        player_power: table.player_power.at(total),
        win_target: table.target.target(opponent, level),
    }
}

impl DifficultyParams {
    /// Ticks between spawns at the current rate (0 spawn rate never spawns)
    pub fn spawn_interval_ticks(&self, tick_hz: u32) -> Option<u32> {
        if self.spawn_rate <= 0.0 {
            return None;
        }
        Some(((tick_hz as f32 / self.spawn_rate).round() as u32).max(1))
    }
}

pub const FLOW_MIN: f32 = 0.7;
pub const FLOW_MAX: f32 = 1.3;
pub const FLOW_SUCCESS_STEP: f32 = 0.05;
pub const FLOW_FAILURE_STEP: f32 = 0.1;

/// Session-local rubber band: success chains push difficulty up, misses
/// ease it off faster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowAdjuster {
    value: f32,
}

impl Default for FlowAdjuster {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

impl FlowAdjuster {
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn on_success(&mut self) {
        self.value = (self.value + FLOW_SUCCESS_STEP).min(FLOW_MAX);
    }

    pub fn on_failure(&mut self) {
        self.value = (self.value - FLOW_FAILURE_STEP).max(FLOW_MIN);
    }
}
