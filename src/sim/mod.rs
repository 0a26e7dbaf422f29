//! Per-session simulation module
//!
//! Everything that happens inside one match lives here:
//! - Fixed-rate ticks only; no wall-clock reads
//! - One seeded RNG per session
//! - Stable iteration order (entities kept in spawn order)
//! - No rendering or platform dependencies

pub mod attempt;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod state;
pub mod tick;

pub use attempt::{AttemptMeter, AttemptPhase, MeterMotion, MeterTick};
pub use collision::{
    ComboChange, Disposition, Interaction, KindRule, Outcome, QualityTier, TierThresholds, combo_multiplier, grade,
    quality, resolve_contact, resolve_tap,
};
pub use effects::{EffectKind, ScheduledEffects};
pub use entity::{BoundaryPolicy, Bounds, Damage, Entity, EntityId, EntityKind, EntityStore, Formation, Motion, SpawnTimer};
pub use state::{
    Direction, EndRules, GameEvent, InputEvent, InputOutcome, InputRejected, MatchConfig, MatchPhase, MatchResult,
    MatchState, Snapshot,
};
pub use tick::{MatchSession, earned_points, handle_input, tick};
