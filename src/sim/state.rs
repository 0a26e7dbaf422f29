//! Match state and core session types
//!
//! `MatchState` is everything a ruleset is allowed to touch: score, combo,
//! health, timers, difficulty parameters, the entity store, scheduled
//! effects and the session RNG. It is owned by exactly one `MatchSession`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{ComboChange, Interaction, Outcome};
use super::effects::{EffectKind, ScheduledEffects};
use super::entity::{Entity, EntityStore};
use crate::difficulty::{DifficultyParams, DifficultyTable, FlowAdjuster, Pressure, evaluate};
use crate::games::{GameDetail, GameKind};
use crate::rng::GameRng;
use crate::roster::{Gimmick, Opponent};

/// Phase of a running match. Menu/selection lives outside the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Fixed delay before play starts
    Countdown,
    /// Ticks advance the simulation; input is accepted
    Active,
    Paused,
    /// Result decided
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Lose,
}

/// Per-game terminal conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndRules {
    /// Match ends when this runs out; win iff score >= target
    pub time_limit_secs: Option<u32>,
    /// Starting health; `None` means the game has no health loss condition
    pub health: Option<i32>,
    /// Win as soon as the score reaches the target
    pub win_on_target: bool,
}

/// Direction input for grid and lane games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Grid step (y grows downward)
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Input forwarded from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer/tap at a play-field position
    Tap { pos: Vec2 },
    /// Continuous horizontal pointer position
    Steer { x: f32 },
    Direction(Direction),
    /// Generic action button (swing, shoot, lock, pull)
    Press,
    /// Place a wager
    Bet { amount: u32 },
    /// Toggle pause
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputOutcome {
    Applied,
    /// Not interactive right now; nothing changed
    Ignored,
}

/// Inputs refused with a message for the player. State is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputRejected {
    #[error("bet of {bet} exceeds balance of {balance}")]
    InsufficientBalance { bet: u32, balance: i64 },

    #[error("bet must be at least 1")]
    EmptyBet,

    #[error("a round is already in progress")]
    RoundInProgress,
}

/// Notable things that happened since the last drain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged(MatchPhase),
    Interaction(Outcome),
    Gimmick(Gimmick),
    EffectEnded(EffectKind),
    Finished(MatchResult),
}

/// Everything needed to create a session
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub session: u32,
    pub game: GameKind,
    pub opponent: Opponent,
    pub level: u8,
    pub tick_hz: u32,
    pub countdown_ticks: u32,
    pub seed: u64,
    pub max_entities: usize,
    pub reduced_motion: bool,
}

#[derive(Debug, Clone)]
pub struct MatchState {
    pub session: u32,
    pub game: GameKind,
    pub opponent: Opponent,
    pub level: u8,
    pub tick_hz: u32,
    pub phase: MatchPhase,
    pub countdown_ticks: u32,
    /// Active ticks elapsed
    pub time_ticks: u64,
    pub score: i64,
    pub combo: u32,
    pub best_combo: u32,
    /// Lives, stamina or coins depending on the game
    pub health: i32,
    pub max_health: i32,
    pub params: DifficultyParams,
    pub flow: FlowAdjuster,
    pub entities: EntityStore,
    pub effects: ScheduledEffects,
    pub rng: GameRng,
    pub result: Option<MatchResult>,
    pub end_rules: EndRules,
    pub reduced_motion: bool,
    table: DifficultyTable,
    events: Vec<GameEvent>,
}

impl MatchState {
    pub fn new(config: MatchConfig) -> Self {
        let table = config.game.difficulty_table();
        let end_rules = config.game.end_rules();
        let params = evaluate(&table, config.opponent.index, config.level, Pressure::default());
        let health = end_rules.health.unwrap_or(0);

        Self {
            session: config.session,
            game: config.game,
            opponent: config.opponent,
            level: config.level,
            tick_hz: config.tick_hz.max(1),
            phase: MatchPhase::Countdown,
            countdown_ticks: config.countdown_ticks,
            time_ticks: 0,
            score: 0,
            combo: 0,
            best_combo: 0,
            health,
            max_health: health,
            params,
            flow: FlowAdjuster::default(),
            entities: EntityStore::new(config.session, config.max_entities),
            effects: ScheduledEffects::default(),
            rng: GameRng::new(config.seed),
            result: None,
            end_rules,
            reduced_motion: config.reduced_motion,
            table,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.time_ticks as f32 / self.tick_hz as f32
    }

    pub fn time_limit_ticks(&self) -> Option<u64> {
        self.end_rules
            .time_limit_secs
            .map(|secs| secs as u64 * self.tick_hz as u64)
    }

    pub fn time_left_secs(&self) -> Option<f32> {
        self.time_limit_ticks()
            .map(|limit| limit.saturating_sub(self.time_ticks) as f32 / self.tick_hz as f32)
    }

    pub fn target(&self) -> u32 {
        self.params.win_target
    }

    /// Re-evaluate difficulty for the current elapsed time and flow
    pub fn refresh_params(&mut self) {
        let pressure = Pressure {
            elapsed_secs: self.elapsed_secs(),
            flow: self.flow.value(),
        };
        self.params = evaluate(&self.table, self.opponent.index, self.level, pressure);
        if self.effects.is_active(EffectKind::Surge) {
            self.params.opponent_power *= 2.0;
            self.params.speed *= 1.25;
        }
    }

    /// Apply an interaction's score, health and combo changes
    pub fn apply(&mut self, interaction: &Interaction) {
        self.score = (self.score + interaction.score_delta).max(0);
        self.health += interaction.health_delta;
        match interaction.combo {
            ComboChange::Increment => {
                self.combo += 1;
                self.best_combo = self.best_combo.max(self.combo);
                self.flow.on_success();
            }
            ComboChange::Reset => {
                self.combo = 0;
                self.flow.on_failure();
            }
            ComboChange::Unchanged => {}
        }
        self.events.push(GameEvent::Interaction(interaction.outcome.clone()));
    }

    /// Decide the match. Later calls are ignored.
    pub fn finish(&mut self, result: MatchResult) {
        if self.result.is_some() {
            return;
        }
        log::info!(
            "Match {} finished: {:?} (score {} / target {})",
            self.session,
            result,
            self.score,
            self.target()
        );
        self.result = Some(result);
        self.set_phase(MatchPhase::Finished);
        self.events.push(GameEvent::Finished(result));
    }

    /// Finish with a win when the score has reached the target, else a loss
    pub fn finish_against_target(&mut self) {
        let result = if self.score >= self.target() as i64 {
            MatchResult::Win
        } else {
            MatchResult::Lose
        };
        self.finish(result);
    }

    pub fn set_phase(&mut self, phase: MatchPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.events.push(GameEvent::PhaseChanged(phase));
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Schedule an effect; cosmetic ones are skipped under reduced motion
    pub fn schedule_effect(&mut self, kind: EffectKind, ticks: u32) {
        if self.reduced_motion && kind.is_cosmetic() {
            return;
        }
        self.effects.schedule(kind, ticks);
    }

    pub fn is_stunned(&self) -> bool {
        self.effects.is_active(EffectKind::Stun)
    }

    pub fn controls_reversed(&self) -> bool {
        self.effects.is_active(EffectKind::ReverseControls)
    }

    /// Mirror a steering x when controls are reversed
    pub fn steer_x(&self, x: f32) -> f32 {
        if self.controls_reversed() {
            crate::consts::FIELD_WIDTH - x
        } else {
            x
        }
    }

    pub fn steer_direction(&self, dir: Direction) -> Direction {
        if self.controls_reversed() {
            dir.opposite()
        } else {
            dir
        }
    }

    /// Opponent takes a fraction of the current score
    pub fn steal_score(&mut self, fraction: f32) -> i64 {
        let stolen = (self.score as f32 * fraction.clamp(0.0, 1.0)).floor() as i64;
        self.score -= stolen;
        stolen
    }

    pub fn snapshot(&self, detail: GameDetail) -> Snapshot {
        Snapshot {
            session: self.session,
            game: self.game,
            opponent: self.opponent.index,
            level: self.level,
            phase: self.phase,
            result: self.result,
            score: self.score,
            target: self.target(),
            combo: self.combo,
            best_combo: self.best_combo,
            health: self.health,
            max_health: self.max_health,
            countdown_secs: self.countdown_ticks as f32 / self.tick_hz as f32,
            elapsed_secs: self.elapsed_secs(),
            time_left_secs: self.time_left_secs(),
            flow: self.flow.value(),
            entities: self.entities.iter_active().cloned().collect(),
            effects: self.effects.active(),
            detail,
        }
    }
}

/// Read-only view for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session: u32,
    pub game: GameKind,
    pub opponent: usize,
    pub level: u8,
    pub phase: MatchPhase,
    pub result: Option<MatchResult>,
    pub score: i64,
    pub target: u32,
    pub combo: u32,
    pub best_combo: u32,
    pub health: i32,
    pub max_health: i32,
    pub countdown_secs: f32,
    pub elapsed_secs: f32,
    pub time_left_secs: Option<f32>,
    pub flow: f32,
    pub entities: Vec<Entity>,
    pub effects: Vec<EffectKind>,
    pub detail: GameDetail,
}
