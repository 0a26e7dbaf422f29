//! Tunnel runner
//!
//! Three lanes rush toward the player. Rows of barriers block one or two
//! lanes; coins sit in the open ones. Switching lanes dodges. Distance,
//! dodges and coins all score, and reaching the target distance wins.
//! Three hits and the run is over.

use glam::Vec2;

use super::{GameDetail, Ruleset};
use crate::consts::FIELD_WIDTH;
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::sim::{
    Bounds, Direction, EndRules, EntityId, EntityKind, InputEvent, InputOutcome, InputRejected, Interaction, KindRule,
    MatchState, Motion, SpawnTimer, resolve_contact,
};

pub const OPPONENTS: [&str; 10] = [
    "Mole Rat",
    "Tunnel Tom",
    "Gopher Gus",
    "Miner Mae",
    "Rail Runner",
    "Cave Bat",
    "Drillbit",
    "Rockfall Rosa",
    "The Excavator",
    "Deep Dark",
];

/// `speed` is approach speed, `opponent_power` the chance a row blocks two
/// lanes, `tolerance` the collision depth, `player_power` the coin chance.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.004,
    spawn_rate: Curve::new(0.8, 2.2),
    speed: Curve::new(35.0, 85.0),
    opponent_power: Curve::new(0.0, 0.5),
    tolerance: Curve::new(6.0, 3.0),
    player_power: Curve::new(0.4, 0.2),
    target: TargetFormula {
        base: 300,
        per_level: 40,
        per_opponent: 50,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: None,
    health: Some(3),
    win_on_target: true,
};

pub const LANES: u8 = 3;
pub const PLAYER_Y: f32 = 90.0;
/// Field units travelled per point of distance score
const UNITS_PER_POINT: f32 = 10.0;
const DODGE_POINTS: i64 = 2;

fn kind_rule(kind: EntityKind) -> KindRule {
    match kind {
        EntityKind::Barrier => KindRule::hazard(1),
        EntityKind::Coin => KindRule::good(5),
        _ => KindRule::good(0),
    }
}

pub fn lane_center(lane: u8) -> f32 {
    let width = FIELD_WIDTH / LANES as f32;
    width * (lane as f32 + 0.5)
}

pub fn lane_at(x: f32) -> u8 {
    let width = FIELD_WIDTH / LANES as f32;
    ((x / width).floor().max(0.0) as u8).min(LANES - 1)
}

#[derive(Debug, Clone)]
pub struct TunnelRules {
    lane: u8,
    distance: f32,
    banked: f32,
    rows: SpawnTimer,
}

impl TunnelRules {
    pub fn new() -> Self {
        Self {
            lane: 1,
            distance: 0.0,
            banked: 0.0,
            rows: SpawnTimer::default(),
        }
    }

    pub fn lane(&self) -> u8 {
        self.lane
    }

    fn spawn_row(&self, state: &mut MatchState) {
        let double = state.rng.chance(state.params.opponent_power);
        let first = state.rng.int(0, LANES as i32 - 1) as u8;
        let mut blocked = vec![first];
        if double {
            let offset = state.rng.int(1, LANES as i32 - 1) as u8;
            blocked.push((first + offset) % LANES);
        }

        let speed = state.params.speed;
        for lane in 0..LANES {
            let kind = if blocked.contains(&lane) {
                EntityKind::Barrier
            } else if state.rng.chance(state.params.player_power) {
                EntityKind::Coin
            } else {
                continue;
            };
            state.entities.spawn(
                kind,
                Vec2::new(lane_center(lane), 0.0),
                Vec2::new(0.0, speed),
                Motion::Linear,
                4.0,
            );
        }
    }

    fn set_lane(&mut self, lane: u8) -> InputOutcome {
        let lane = lane.min(LANES - 1);
        if lane == self.lane {
            return InputOutcome::Ignored;
        }
        self.lane = lane;
        InputOutcome::Applied
    }
}

impl Default for TunnelRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for TunnelRules {
    fn begin(&mut self, _state: &mut MatchState) {
        *self = Self::new();
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();
        let speed = state.params.speed;

        // Distance score accrues in whole points
        let travelled = speed * dt;
        self.distance += travelled;
        self.banked += travelled / UNITS_PER_POINT;
        let whole = self.banked.floor();
        self.banked -= whole;
        state.score += whole as i64;

        // Everything in the tunnel rides the current speed
        for entity in state.entities.iter_mut() {
            entity.vel.y = speed;
        }

        for _ in 0..self.rows.due(state.params.spawn_rate, dt) {
            self.spawn_row(state);
        }

        let depth = state.params.tolerance;
        let player_x = lane_center(self.lane);
        let contacts: Vec<EntityId> = state
            .entities
            .iter_active()
            .filter(|e| (e.pos.y - PLAYER_Y).abs() <= depth && (e.pos.x - player_x).abs() < 1.0)
            .map(|e| e.id)
            .collect();
        for id in contacts {
            let interaction = resolve_contact(&mut state.entities, id, state.combo, kind_rule);
            state.apply(&interaction);
        }

        let passed: Vec<EntityId> = state
            .entities
            .iter_active()
            .filter(|e| e.pos.y > PLAYER_Y + depth)
            .map(|e| e.id)
            .collect();
        for id in passed {
            let Some(entity) = state.entities.remove(id) else {
                continue;
            };
            let interaction = match entity.kind {
                EntityKind::Barrier => Interaction::dodged(&entity, DODGE_POINTS, state.combo),
                _ => Interaction::escaped(&entity, &kind_rule(entity.kind), 0),
            };
            state.apply(&interaction);
        }

        state.entities.remove_expired(&Bounds::field(), 10.0);
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        let outcome = match event {
            InputEvent::Direction(dir) => match state.steer_direction(*dir) {
                Direction::Left => self.set_lane(self.lane.saturating_sub(1)),
                Direction::Right => self.set_lane(self.lane + 1),
                Direction::Up | Direction::Down => InputOutcome::Ignored,
            },
            InputEvent::Steer { x } => self.set_lane(lane_at(state.steer_x(*x))),
            InputEvent::Tap { pos } => self.set_lane(lane_at(state.steer_x(pos.x))),
            _ => InputOutcome::Ignored,
        };
        Ok(outcome)
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Tunnel {
            lane: self.lane,
            lanes: LANES,
            distance: self.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;
    use crate::games::testing::started;
    use crate::sim::{EffectKind, tick};

    fn place(state: &mut MatchState, kind: EntityKind, lane: u8, y: f32) {
        state
            .entities
            .spawn(kind, Vec2::new(lane_center(lane), y), Vec2::ZERO, Motion::Linear, 4.0)
            .unwrap();
    }

    #[test]
    fn test_lane_mapping() {
        assert_eq!(lane_at(0.0), 0);
        assert_eq!(lane_at(50.0), 1);
        assert_eq!(lane_at(99.9), 2);
        assert_eq!(lane_at(150.0), 2);
        assert_eq!(lane_at(-5.0), 0);
        for lane in 0..LANES {
            assert_eq!(lane_at(lane_center(lane)), lane);
        }
    }

    #[test]
    fn test_lane_changes_clamp() {
        let mut rules = TunnelRules::new();
        let mut state = started(GameKind::Tunnel, 0, 1, &mut rules);
        let left = InputEvent::Direction(Direction::Left);
        assert_eq!(rules.input(&mut state, &left), Ok(InputOutcome::Applied));
        assert_eq!(rules.input(&mut state, &left), Ok(InputOutcome::Ignored));
        assert_eq!(rules.lane(), 0);
    }

    #[test]
    fn test_reversed_lane_change() {
        let mut rules = TunnelRules::new();
        let mut state = started(GameKind::Tunnel, 0, 1, &mut rules);
        state.schedule_effect(EffectKind::ReverseControls, 100);
        rules.input(&mut state, &InputEvent::Direction(Direction::Left)).unwrap();
        assert_eq!(rules.lane(), 2);
    }

    #[test]
    fn test_barrier_in_lane_hurts() {
        let mut rules = TunnelRules::new();
        let mut state = started(GameKind::Tunnel, 0, 1, &mut rules);
        state.entities.clear();
        place(&mut state, EntityKind::Barrier, 1, PLAYER_Y - 1.0);
        tick(&mut state, &mut rules);
        assert_eq!(state.health, 2);
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn test_barrier_in_other_lane_is_dodged() {
        let mut rules = TunnelRules::new();
        let mut state = started(GameKind::Tunnel, 0, 1, &mut rules);
        state.entities.clear();
        place(&mut state, EntityKind::Barrier, 0, PLAYER_Y + 6.5);
        tick(&mut state, &mut rules);
        assert_eq!(state.health, 3);
        assert_eq!(state.combo, 1);
        assert!(state.score >= DODGE_POINTS);
    }

    #[test]
    fn test_distance_scores() {
        let mut rules = TunnelRules::new();
        let mut state = started(GameKind::Tunnel, 0, 1, &mut rules);
        for _ in 0..120 {
            tick(&mut state, &mut rules);
            state.entities.clear();
        }
        // About two seconds at the base speed
        assert!(state.score >= 6, "score {}", state.score);
    }
}
