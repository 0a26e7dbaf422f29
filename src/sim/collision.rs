//! Interaction resolution
//!
//! Two halves:
//! - Precision checks: turn (target, actual, window) into a quality score and
//!   bucket it into a tier. Used by timing games (swing, power meter) and by
//!   positional taps (beach ball).
//! - Entity interactions: decide what a tap or contact does to the entity it
//!   lands on, and how score, health and combo move as a result.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Damage, Entity, EntityId, EntityKind, EntityStore};

/// Bucketed outcome of a precision check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Miss,
    Okay,
    Good,
    Perfect,
}

impl QualityTier {
    pub fn is_hit(&self) -> bool {
        *self != QualityTier::Miss
    }
}

/// Tier thresholds. A quality must be strictly greater than a threshold to
/// reach that tier, so `quality == best` is `Good`, not `Perfect`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub best: f32,
    pub mid: f32,
    pub low: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            best: 0.85,
            mid: 0.6,
            low: 0.35,
        }
    }
}

impl TierThresholds {
    pub fn tier(&self, quality: f32) -> QualityTier {
        if quality > self.best {
            QualityTier::Perfect
        } else if quality > self.mid {
            QualityTier::Good
        } else if quality > self.low {
            QualityTier::Okay
        } else {
            QualityTier::Miss
        }
    }
}

/// `1 - |actual - target| / window`, clamped to [0, 1].
/// A non-positive window only rewards an exact match.
pub fn quality(target: f32, actual: f32, window: f32) -> f32 {
    let error = (actual - target).abs();
    if window <= 0.0 {
        return if error == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - error / window).clamp(0.0, 1.0)
}

/// Quality and tier in one call with the default thresholds
pub fn grade(target: f32, actual: f32, window: f32) -> (f32, QualityTier) {
    let q = quality(target, actual, window);
    (q, TierThresholds::default().tier(q))
}

/// How an entity kind reacts to being hit or caught
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// Worth points; builds combo
    Good,
    /// Hurts the player
    Hazard,
    /// Must not be hit; costs points and combo
    Friendly,
}

/// Per-kind interaction rule supplied by a ruleset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindRule {
    pub disposition: Disposition,
    /// Points on removal (Good) or penalty (Friendly)
    pub points: i64,
    /// Points per surviving hit on a multi-HP entity
    pub hit_points: i64,
    /// Health lost (Hazard)
    pub damage: i32,
    /// Chain reaction radius; zero disables
    pub chain_radius: f32,
}

impl KindRule {
    pub const fn good(points: i64) -> Self {
        Self {
            disposition: Disposition::Good,
            points,
            hit_points: 0,
            damage: 0,
            chain_radius: 0.0,
        }
    }

    pub const fn hazard(damage: i32) -> Self {
        Self {
            disposition: Disposition::Hazard,
            points: 0,
            hit_points: 0,
            damage,
            chain_radius: 0.0,
        }
    }

    pub const fn friendly(penalty: i64) -> Self {
        Self {
            disposition: Disposition::Friendly,
            points: penalty,
            hit_points: 0,
            damage: 0,
            chain_radius: 0.0,
        }
    }

    pub const fn with_chain(mut self, radius: f32) -> Self {
        self.chain_radius = radius;
        self
    }

    pub const fn with_hit_points(mut self, points: i64) -> Self {
        self.hit_points = points;
        self
    }
}

/// What happened in an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Good entity removed
    Hit { kind: EntityKind },
    /// Multi-HP entity hit but still alive
    Damaged { kind: EntityKind, hp_left: u8 },
    /// Chain reaction took out extra entities
    Chain { kind: EntityKind, extra: usize },
    /// Hazard hit or caught
    Hazard { kind: EntityKind },
    /// Friendly entity hit
    FriendlyFire { kind: EntityKind },
    /// Good entity left play without being handled
    Escaped { kind: EntityKind },
    /// Hazard passed the player without contact
    Dodged { kind: EntityKind },
    /// Precision action graded into a tier
    Graded { tier: QualityTier },
    /// Wager settled; positive deltas are winnings
    Wager { delta: i64 },
    /// Tap or action connected with nothing
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboChange {
    Increment,
    Reset,
    Unchanged,
}

/// Everything a single interaction does to the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub outcome: Outcome,
    pub entity: Option<EntityId>,
    pub score_delta: i64,
    pub health_delta: i32,
    pub combo: ComboChange,
    pub removed: Vec<EntityId>,
}

impl Interaction {
    /// Nothing hit; resets combo and optionally costs health
    pub fn miss(health_penalty: i32) -> Self {
        Self {
            outcome: Outcome::Miss,
            entity: None,
            score_delta: 0,
            health_delta: -health_penalty,
            combo: ComboChange::Reset,
            removed: Vec::new(),
        }
    }

    /// A precision action graded into a tier. Hits build combo; misses reset it.
    pub fn graded(tier: QualityTier, points: i64) -> Self {
        Self {
            outcome: Outcome::Graded { tier },
            entity: None,
            score_delta: points,
            health_delta: 0,
            combo: if tier.is_hit() {
                ComboChange::Increment
            } else {
                ComboChange::Reset
            },
            removed: Vec::new(),
        }
    }

    /// An entity left play unhandled. Good kinds break the combo;
    /// hazards and friendlies slipping away are harmless.
    pub fn escaped(entity: &Entity, rule: &KindRule, health_penalty: i32) -> Self {
        match rule.disposition {
            Disposition::Good => Self {
                outcome: Outcome::Escaped { kind: entity.kind },
                entity: Some(entity.id),
                score_delta: 0,
                health_delta: -health_penalty,
                combo: ComboChange::Reset,
                removed: vec![entity.id],
            },
            _ => Self {
                outcome: Outcome::Escaped { kind: entity.kind },
                entity: Some(entity.id),
                score_delta: 0,
                health_delta: 0,
                combo: ComboChange::Unchanged,
                removed: vec![entity.id],
            },
        }
    }

    /// A hazard slipped past; counts toward the streak
    pub fn dodged(entity: &Entity, points: i64, combo: u32) -> Self {
        Self {
            outcome: Outcome::Dodged { kind: entity.kind },
            entity: Some(entity.id),
            score_delta: points * combo_multiplier(combo),
            health_delta: 0,
            combo: ComboChange::Increment,
            removed: vec![entity.id],
        }
    }

    pub fn is_success(&self) -> bool {
        self.combo == ComboChange::Increment
    }

    pub fn is_failure(&self) -> bool {
        self.combo == ComboChange::Reset
    }
}

/// Score multiplier for the current streak: x1, then +1 every 5 up to x4
pub fn combo_multiplier(combo: u32) -> i64 {
    1 + (combo / 5).min(3) as i64
}

/// Resolve a tap at `point` against the store. The nearest active entity
/// whose radius (times `radius_scale`) covers the point is affected.
pub fn resolve_tap<R>(store: &mut EntityStore, point: Vec2, radius_scale: f32, combo: u32, rules: R) -> Interaction
where
    R: Fn(EntityKind) -> KindRule,
{
    let Some(target) = store.nearest_hit(point, radius_scale).map(|e| e.id) else {
        return Interaction::miss(0);
    };
    resolve_contact(store, target, combo, rules)
}

/// Resolve a direct interaction with one entity (tap already matched,
/// or a passive catch/collision).
pub fn resolve_contact<R>(store: &mut EntityStore, id: EntityId, combo: u32, rules: R) -> Interaction
where
    R: Fn(EntityKind) -> KindRule,
{
    let Some(entity) = store.get(id) else {
        return Interaction::miss(0);
    };
    let kind = entity.kind;
    let center = entity.pos;
    let rule = rules(kind);

    match rule.disposition {
        Disposition::Hazard => {
            store.remove(id);
            Interaction {
                outcome: Outcome::Hazard { kind },
                entity: Some(id),
                score_delta: 0,
                health_delta: -rule.damage,
                combo: ComboChange::Reset,
                removed: vec![id],
            }
        }
        Disposition::Friendly => {
            store.remove(id);
            Interaction {
                outcome: Outcome::FriendlyFire { kind },
                entity: Some(id),
                score_delta: -rule.points,
                health_delta: 0,
                combo: ComboChange::Reset,
                removed: vec![id],
            }
        }
        Disposition::Good => {
            let multiplier = combo_multiplier(combo);
            match store.damage(id, 1) {
                Damage::Survived(hp_left) => Interaction {
                    outcome: Outcome::Damaged { kind, hp_left },
                    entity: Some(id),
                    score_delta: rule.hit_points * multiplier,
                    health_delta: 0,
                    combo: ComboChange::Increment,
                    removed: Vec::new(),
                },
                Damage::Destroyed(_) => {
                    let mut removed = vec![id];
                    let mut score = rule.points * multiplier;
                    let mut outcome = Outcome::Hit { kind };

                    if rule.chain_radius > 0.0 {
                        // Chain reaction only takes out other good, single-HP entities.
                        // A worn-down boss is still multi-HP.
                        let chained = store.remove_where(|e| {
                            e.is_active()
                                && e.max_hp <= 1
                                && e.pos.distance(center) <= rule.chain_radius
                                && rules(e.kind).disposition == Disposition::Good
                        });
                        for other in &chained {
                            score += rules(other.kind).points * multiplier;
                            removed.push(other.id);
                        }
                        if !chained.is_empty() {
                            outcome = Outcome::Chain {
                                kind,
                                extra: chained.len(),
                            };
                        }
                    }

                    Interaction {
                        outcome,
                        entity: Some(id),
                        score_delta: score,
                        health_delta: 0,
                        combo: ComboChange::Increment,
                        removed,
                    }
                }
                Damage::Missing => Interaction::miss(0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Motion;
    use proptest::prelude::*;

    fn rules(kind: EntityKind) -> KindRule {
        match kind {
            EntityKind::Fly => KindRule::good(10),
            EntityKind::ElectricFly => KindRule::good(15).with_chain(12.0),
            EntityKind::BossBug => KindRule::good(100).with_hit_points(5),
            EntityKind::Ladybug => KindRule::friendly(25),
            EntityKind::Bee => KindRule::hazard(1),
            _ => KindRule::good(1),
        }
    }

    fn spawn(store: &mut EntityStore, kind: EntityKind, x: f32, y: f32) -> EntityId {
        store
            .spawn(kind, Vec2::new(x, y), Vec2::ZERO, Motion::Static, 4.0)
            .unwrap()
    }

    #[test]
    fn test_quality_edges() {
        assert_eq!(quality(0.5, 0.5, 0.2), 1.0);
        assert_eq!(quality(0.5, 0.9, 0.2), 0.0);
        assert!((quality(0.5, 0.6, 0.2) - 0.5).abs() < 1e-6);
        assert_eq!(quality(0.5, 0.5, 0.0), 1.0);
        assert_eq!(quality(0.5, 0.51, 0.0), 0.0);
    }

    #[test]
    fn test_tier_boundaries_are_exclusive() {
        let t = TierThresholds::default();
        assert_eq!(t.tier(0.85), QualityTier::Good);
        assert_eq!(t.tier(0.850_01), QualityTier::Perfect);
        assert_eq!(t.tier(0.6), QualityTier::Okay);
        assert_eq!(t.tier(0.600_01), QualityTier::Good);
        assert_eq!(t.tier(0.35), QualityTier::Miss);
        assert_eq!(t.tier(0.350_01), QualityTier::Okay);
        assert_eq!(t.tier(0.0), QualityTier::Miss);
        assert_eq!(t.tier(1.0), QualityTier::Perfect);
    }

    #[test]
    fn test_tap_nothing_is_miss() {
        let mut store = EntityStore::new(1, 16);
        spawn(&mut store, EntityKind::Fly, 80.0, 80.0);
        let result = resolve_tap(&mut store, Vec2::new(10.0, 10.0), 1.0, 3, rules);
        assert_eq!(result.outcome, Outcome::Miss);
        assert_eq!(result.combo, ComboChange::Reset);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_tap_picks_nearest() {
        let mut store = EntityStore::new(1, 16);
        let far = spawn(&mut store, EntityKind::Fly, 53.0, 50.0);
        let near = spawn(&mut store, EntityKind::Fly, 51.0, 50.0);
        let result = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 0, rules);
        assert_eq!(result.entity, Some(near));
        assert!(store.get(far).is_some());
    }

    #[test]
    fn test_radius_scale_shrinks_hit_zone() {
        let mut store = EntityStore::new(1, 16);
        spawn(&mut store, EntityKind::Fly, 53.0, 50.0);
        let shrunk = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 0.5, 0, rules);
        assert_eq!(shrunk.outcome, Outcome::Miss);
        let full = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 0, rules);
        assert!(full.is_success());
    }

    #[test]
    fn test_friendly_fire_resets_and_penalizes() {
        let mut store = EntityStore::new(1, 16);
        spawn(&mut store, EntityKind::Ladybug, 50.0, 50.0);
        let result = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 7, rules);
        assert_eq!(result.combo, ComboChange::Reset);
        assert_eq!(result.score_delta, -25);
        assert!(store.is_empty());
    }

    #[test]
    fn test_hazard_costs_health() {
        let mut store = EntityStore::new(1, 16);
        let id = spawn(&mut store, EntityKind::Bee, 50.0, 50.0);
        let result = resolve_contact(&mut store, id, 2, rules);
        assert_eq!(result.health_delta, -1);
        assert_eq!(result.combo, ComboChange::Reset);
    }

    #[test]
    fn test_boss_takes_multiple_hits() {
        let mut store = EntityStore::new(1, 16);
        let boss = store.build(EntityKind::BossBug, Vec2::new(50.0, 50.0), Vec2::ZERO, Motion::Static, 8.0);
        let id = store.insert(boss.with_hp(3)).unwrap();

        let first = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 0, rules);
        assert_eq!(first.outcome, Outcome::Damaged { kind: EntityKind::BossBug, hp_left: 2 });
        assert_eq!(first.score_delta, 5);
        assert!(first.is_success());
        resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 1, rules);
        let last = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 2, rules);
        assert_eq!(last.outcome, Outcome::Hit { kind: EntityKind::BossBug });
        assert_eq!(last.score_delta, 100);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_electric_chain_clears_neighbours() {
        let mut store = EntityStore::new(1, 16);
        spawn(&mut store, EntityKind::ElectricFly, 50.0, 50.0);
        let a = spawn(&mut store, EntityKind::Fly, 58.0, 50.0);
        let b = spawn(&mut store, EntityKind::Fly, 50.0, 41.0);
        let friend = spawn(&mut store, EntityKind::Ladybug, 45.0, 50.0);
        let distant = spawn(&mut store, EntityKind::Fly, 90.0, 90.0);

        let result = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 0, rules);
        assert_eq!(result.outcome, Outcome::Chain { kind: EntityKind::ElectricFly, extra: 2 });
        assert_eq!(result.score_delta, 15 + 10 + 10);
        assert!(result.removed.contains(&a) && result.removed.contains(&b));
        assert!(store.get(friend).is_some());
        assert!(store.get(distant).is_some());
    }

    #[test]
    fn test_chain_spares_damaged_boss() {
        let mut store = EntityStore::new(1, 16);
        let boss = store.build(EntityKind::BossBug, Vec2::new(55.0, 50.0), Vec2::ZERO, Motion::Static, 8.0);
        let boss = store.insert(boss.with_hp(5)).unwrap();
        assert!(matches!(store.damage(boss, 4), Damage::Survived(1)));
        spawn(&mut store, EntityKind::ElectricFly, 50.0, 50.0);

        let result = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 0, rules);
        assert_eq!(result.outcome, Outcome::Hit { kind: EntityKind::ElectricFly });
        assert_eq!(result.score_delta, 15);
        assert!(!result.removed.contains(&boss));
        assert_eq!(store.get(boss).map(|e| e.hp), Some(1));
    }

    #[test]
    fn test_combo_multiplier_applies() {
        let mut store = EntityStore::new(1, 16);
        spawn(&mut store, EntityKind::Fly, 50.0, 50.0);
        let result = resolve_tap(&mut store, Vec2::new(50.0, 50.0), 1.0, 10, rules);
        assert_eq!(result.score_delta, 30);
        assert_eq!(combo_multiplier(0), 1);
        assert_eq!(combo_multiplier(4), 1);
        assert_eq!(combo_multiplier(5), 2);
        assert_eq!(combo_multiplier(100), 4);
    }

    #[test]
    fn test_escape_rules() {
        let mut store = EntityStore::new(1, 16);
        let fly = store.build(EntityKind::Fly, Vec2::ZERO, Vec2::ZERO, Motion::Static, 1.0);
        let bee = store.build(EntityKind::Bee, Vec2::ZERO, Vec2::ZERO, Motion::Static, 1.0);
        assert_eq!(Interaction::escaped(&fly, &rules(fly.kind), 0).combo, ComboChange::Reset);
        assert_eq!(Interaction::escaped(&bee, &rules(bee.kind), 0).combo, ComboChange::Unchanged);
    }

    proptest! {
        #[test]
        fn prop_grading_is_deterministic(target in 0.0f32..1.0, actual in 0.0f32..1.0, window in 0.01f32..1.0) {
            let first = grade(target, actual, window);
            let second = grade(target, actual, window);
            prop_assert_eq!(first, second);
            prop_assert!((0.0..=1.0).contains(&first.0));
        }

        #[test]
        fn prop_closer_is_never_worse(target in 0.0f32..1.0, err in 0.0f32..0.5, extra in 0.0f32..0.5, window in 0.01f32..1.0) {
            let (_, near) = grade(target, target + err, window);
            let (_, far) = grade(target, target + err + extra, window);
            prop_assert!(near >= far);
        }
    }
}
