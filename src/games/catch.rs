//! Honey catch
//!
//! Items fall from the top of the field; the player steers a basket along
//! the bottom. Honey and golden pots score, bees and rocks cost a life.
//! Letting good items drop breaks the streak.

use glam::Vec2;

use super::{GameDetail, Ruleset, apply_default_gimmick};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::roster::Gimmick;
use crate::sim::{
    Bounds, EndRules, EntityId, EntityKind, InputEvent, InputOutcome, InputRejected, Interaction, KindRule,
    MatchState, Motion, SpawnTimer, resolve_contact,
};

pub const OPPONENTS: [&str; 10] = [
    "Bumble",
    "Clover",
    "Pip the Cub",
    "Marmalade",
    "Old Grizz",
    "Hornet Queen",
    "Badger Bill",
    "Thistle",
    "Raccoon Rex",
    "The Beekeeper",
];

/// `tolerance` is the basket half width, `player_power` scales basket speed,
/// `opponent_power` is the hazard share of spawns.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.002,
    spawn_rate: Curve::new(1.2, 3.5),
    speed: Curve::new(25.0, 60.0),
    opponent_power: Curve::new(0.2, 0.5),
    tolerance: Curve::new(10.0, 5.0),
    player_power: Curve::new(1.0, 0.6),
    target: TargetFormula {
        base: 150,
        per_level: 25,
        per_opponent: 30,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: Some(60),
    health: Some(3),
    win_on_target: false,
};

pub const BASKET_Y: f32 = 88.0;
/// Vertical reach of the basket mouth
pub const CATCH_DEPTH: f32 = 3.0;
const BASKET_SPEED: f32 = 160.0;
const SPAWN_Y: f32 = -3.0;
const SWERVE_SPEED: f32 = 20.0;

fn kind_rule(kind: EntityKind) -> KindRule {
    match kind {
        EntityKind::Honey => KindRule::good(10),
        EntityKind::Golden => KindRule::good(50),
        EntityKind::Bee | EntityKind::Rock => KindRule::hazard(1),
        _ => KindRule::good(0),
    }
}

fn radius(kind: EntityKind) -> f32 {
    match kind {
        EntityKind::Golden => 2.5,
        EntityKind::Rock => 3.5,
        _ => 3.0,
    }
}

#[derive(Debug, Clone)]
pub struct CatchRules {
    basket_x: f32,
    target_x: f32,
    half_width: f32,
    spawner: SpawnTimer,
}

impl CatchRules {
    pub fn new() -> Self {
        Self {
            basket_x: 50.0,
            target_x: 50.0,
            half_width: TABLE.tolerance.easy,
            spawner: SpawnTimer::default(),
        }
    }

    fn spawn_item(&self, state: &mut MatchState) {
        let hazard_share = state.params.opponent_power.clamp(0.0, 0.9);
        let table = [
            (EntityKind::Honey, (1.0 - hazard_share) * 0.9),
            (EntityKind::Golden, (1.0 - hazard_share) * 0.1),
            (EntityKind::Bee, hazard_share * 0.6),
            (EntityKind::Rock, hazard_share * 0.4),
        ];
        let Some(kind) = state.rng.weighted_pick(&table) else {
            return;
        };
        let x = state.rng.range(6.0, 94.0);
        let fall = state.params.speed
            * match kind {
                EntityKind::Golden => 1.4,
                EntityKind::Rock => 1.2,
                _ => 1.0,
            };
        let motion = if kind == EntityKind::Bee {
            Motion::Wave {
                amplitude: 6.0,
                frequency: 0.8,
                anchor_x: x,
            }
        } else {
            Motion::Linear
        };
        state
            .entities
            .spawn(kind, Vec2::new(x, SPAWN_Y), Vec2::new(0.0, fall), motion, radius(kind));
    }

    fn in_basket(&self, pos: Vec2, radius: f32) -> bool {
        (pos.y - BASKET_Y).abs() <= CATCH_DEPTH && (pos.x - self.basket_x).abs() <= self.half_width + radius
    }
}

impl Default for CatchRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for CatchRules {
    fn begin(&mut self, state: &mut MatchState) {
        self.basket_x = 50.0;
        self.target_x = 50.0;
        self.half_width = state.params.tolerance;
        self.spawner = SpawnTimer::default();
        self.spawner.prime();
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();
        self.half_width = state.params.tolerance;

        let max_step = BASKET_SPEED * state.params.player_power * dt;
        let delta = (self.target_x - self.basket_x).clamp(-max_step, max_step);
        self.basket_x = (self.basket_x + delta).clamp(self.half_width, 100.0 - self.half_width);

        for _ in 0..self.spawner.due(state.params.spawn_rate, dt) {
            self.spawn_item(state);
        }

        let caught: Vec<EntityId> = state
            .entities
            .iter_active()
            .filter(|e| self.in_basket(e.pos, e.radius))
            .map(|e| e.id)
            .collect();
        for id in caught {
            let interaction = resolve_contact(&mut state.entities, id, state.combo, kind_rule);
            state.apply(&interaction);
        }

        for dropped in state.entities.remove_expired(&Bounds::field(), 5.0) {
            let interaction = Interaction::escaped(&dropped, &kind_rule(dropped.kind), 0);
            state.apply(&interaction);
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        let x = match event {
            InputEvent::Steer { x } => *x,
            InputEvent::Tap { pos } => pos.x,
            _ => return Ok(InputOutcome::Ignored),
        };
        self.target_x = state.steer_x(x).clamp(0.0, 100.0);
        Ok(InputOutcome::Applied)
    }

    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        match gimmick {
            // Falling items start at zero sideways speed, so flipping does nothing
            Gimmick::Swerve => {
                let pushes: Vec<f32> = (0..state.entities.len())
                    .map(|_| state.rng.range(-SWERVE_SPEED, SWERVE_SPEED))
                    .collect();
                for (entity, push) in state.entities.iter_mut().zip(pushes) {
                    entity.vel.x += push;
                }
            }
            other => apply_default_gimmick(state, other),
        }
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Catch {
            basket_x: self.basket_x,
            basket_half_width: self.half_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;
    use crate::games::testing::started;
    use crate::sim::{MatchResult, tick};

    fn drop_at(state: &mut MatchState, kind: EntityKind, x: f32, y: f32) -> EntityId {
        state
            .entities
            .spawn(kind, Vec2::new(x, y), Vec2::ZERO, Motion::Static, radius(kind))
            .unwrap()
    }

    #[test]
    fn test_catching_honey_scores() {
        let mut rules = CatchRules::new();
        let mut state = started(GameKind::Catch, 0, 1, &mut rules);
        state.entities.clear();
        drop_at(&mut state, EntityKind::Honey, 50.0, BASKET_Y);
        tick(&mut state, &mut rules);
        assert!(state.score >= 10);
        assert_eq!(state.combo, 1);
    }

    #[test]
    fn test_rocks_drain_lives_to_loss() {
        let mut rules = CatchRules::new();
        let mut state = started(GameKind::Catch, 0, 1, &mut rules);
        for _ in 0..3 {
            state.entities.clear();
            drop_at(&mut state, EntityKind::Rock, 50.0, BASKET_Y);
            tick(&mut state, &mut rules);
        }
        assert_eq!(state.health, 0);
        assert_eq!(state.result, Some(MatchResult::Lose));
    }

    #[test]
    fn test_dropped_honey_resets_combo() {
        let mut rules = CatchRules::new();
        let mut state = started(GameKind::Catch, 0, 1, &mut rules);
        state.entities.clear();
        state.combo = 4;
        state
            .entities
            .spawn(EntityKind::Honey, Vec2::new(5.0, 108.0), Vec2::new(0.0, 30.0), Motion::Linear, 3.0);
        tick(&mut state, &mut rules);
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn test_basket_follows_steer() {
        let mut rules = CatchRules::new();
        let mut state = started(GameKind::Catch, 0, 1, &mut rules);
        rules.input(&mut state, &InputEvent::Steer { x: 80.0 }).unwrap();
        for _ in 0..60 {
            tick(&mut state, &mut rules);
        }
        let GameDetail::Catch { basket_x, .. } = rules.detail() else {
            panic!("wrong detail");
        };
        assert!((basket_x - 80.0).abs() < 0.5);
    }

    #[test]
    fn test_reversed_steer() {
        let mut rules = CatchRules::new();
        let mut state = started(GameKind::Catch, 0, 1, &mut rules);
        state.schedule_effect(crate::sim::EffectKind::ReverseControls, 600);
        rules.input(&mut state, &InputEvent::Steer { x: 20.0 }).unwrap();
        assert_eq!(rules.target_x, 80.0);
    }
}
