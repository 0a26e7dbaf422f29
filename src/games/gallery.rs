//! Bug shooting gallery
//!
//! Bugs cross the field in singles or formations; the player taps to swat
//! them. Roaches zigzag, electric flies chain into neighbours, ladybugs
//! must be spared. A multi-hit boss appears once at half time; bringing it
//! down ends the match early, won if the score has reached the target.

use glam::Vec2;

use super::{GameDetail, Ruleset};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::secs_to_ticks;
use crate::sim::{
    Bounds, EndRules, EntityKind, Formation, InputEvent, InputOutcome, InputRejected, Interaction, KindRule,
    MatchState, Motion, Outcome, SpawnTimer, resolve_tap,
};

pub const OPPONENTS: [&str; 10] = [
    "Gnat",
    "Mosquito Mo",
    "Cricket",
    "Dragonfly",
    "Stag Beetle",
    "Wasp Sergeant",
    "Locust Swarm",
    "Moth Matriarch",
    "Scarab King",
    "The Hive Mind",
];

/// `tolerance` scales hit radii, `player_power` is the bug lifetime in
/// seconds, `opponent_power` is the ladybug share of single spawns.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.003,
    spawn_rate: Curve::new(0.8, 2.5),
    speed: Curve::new(12.0, 35.0),
    opponent_power: Curve::new(0.05, 0.2),
    tolerance: Curve::new(1.4, 0.8),
    player_power: Curve::new(5.0, 2.5),
    target: TargetFormula {
        base: 200,
        per_level: 30,
        per_opponent: 40,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: Some(45),
    health: None,
    win_on_target: false,
};

const CHAIN_RADIUS: f32 = 14.0;
const FORMATION_SPACING: f32 = 7.0;
const FORMATION_STAGGER_SECS: f32 = 0.15;
const ZIGZAG_SECS: f32 = 0.5;
/// Formations enter partly off screen
const OFFSCREEN_MARGIN: f32 = 20.0;

fn kind_rule(kind: EntityKind) -> KindRule {
    match kind {
        EntityKind::Fly => KindRule::good(10),
        EntityKind::Roach => KindRule::good(20),
        EntityKind::ElectricFly => KindRule::good(15).with_chain(CHAIN_RADIUS),
        EntityKind::BossBug => KindRule::good(100).with_hit_points(5),
        EntityKind::Ladybug => KindRule::friendly(25),
        _ => KindRule::good(0),
    }
}

/// Boss hit points grow with opponent and level
pub fn boss_hp(opponent: usize, level: u8) -> u8 {
    (5 + opponent / 2 + level as usize / 3).min(u8::MAX as usize) as u8
}

#[derive(Debug, Clone, Default)]
pub struct GalleryRules {
    spawner: SpawnTimer,
    shots: u32,
    hits: u32,
    boss_spawned: bool,
    boss_hp: Option<u8>,
}

impl GalleryRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry point on the left or right edge, heading inward
    fn entry(&self, state: &mut MatchState) -> (Vec2, Vec2) {
        let from_left = state.rng.chance(0.5);
        let y = state.rng.range(12.0, 70.0);
        let speed = state.params.speed;
        if from_left {
            (Vec2::new(-2.0, y), Vec2::new(speed, 0.0))
        } else {
            (Vec2::new(102.0, y), Vec2::new(-speed, 0.0))
        }
    }

    fn spawn_single(&self, state: &mut MatchState) {
        let friendly = state.params.opponent_power.clamp(0.0, 0.5);
        let table = [
            (EntityKind::Fly, (1.0 - friendly) * 0.55),
            (EntityKind::Roach, (1.0 - friendly) * 0.3),
            (EntityKind::ElectricFly, (1.0 - friendly) * 0.15),
            (EntityKind::Ladybug, friendly),
        ];
        let Some(kind) = state.rng.weighted_pick(&table) else {
            return;
        };
        let (pos, vel) = self.entry(state);
        let ttl = secs_to_ticks(state.params.player_power, state.tick_hz);
        let (motion, vel) = match kind {
            EntityKind::Fly => (
                Motion::Wave {
                    amplitude: 4.0,
                    frequency: 0.6,
                    anchor_x: pos.x,
                },
                vel,
            ),
            EntityKind::Roach => (
                Motion::Zigzag {
                    interval_ticks: secs_to_ticks(ZIGZAG_SECS, state.tick_hz),
                },
                vel * 1.3 + Vec2::new(0.0, state.rng.range(-6.0, 6.0)),
            ),
            EntityKind::ElectricFly => {
                let center = Vec2::new(state.rng.range(25.0, 75.0), pos.y);
                (
                    Motion::Orbit {
                        center,
                        radius: 8.0,
                        angular_speed: 2.0,
                        angle: 0.0,
                    },
                    vel,
                )
            }
            _ => (Motion::Linear, vel * 0.8),
        };
        let entity = state.entities.build(kind, pos, vel, motion, 3.5).with_ttl(ttl);
        state.entities.insert(entity);
    }

    fn spawn_formation(&self, state: &mut MatchState) {
        let Some(&formation) = state.rng.pick(&Formation::ALL) else {
            return;
        };
        let (pos, vel) = self.entry(state);
        let ttl = secs_to_ticks(state.params.player_power * 1.5, state.tick_hz);
        let template = state
            .entities
            .build(EntityKind::Fly, pos, vel, Motion::Linear, 3.5)
            .with_ttl(ttl);
        let stagger = secs_to_ticks(FORMATION_STAGGER_SECS, state.tick_hz);
        state
            .entities
            .spawn_formation(&template, formation, FORMATION_SPACING, stagger);
    }

    fn spawn_boss(&mut self, state: &mut MatchState) {
        let hp = boss_hp(state.opponent.index, state.level);
        let center = Vec2::new(50.0, 35.0);
        let boss = state
            .entities
            .build(
                EntityKind::BossBug,
                center + Vec2::new(18.0, 0.0),
                Vec2::ZERO,
                Motion::Orbit {
                    center,
                    radius: 18.0,
                    angular_speed: 0.8,
                    angle: 0.0,
                },
                7.0,
            )
            .with_hp(hp);
        if state.entities.insert(boss).is_some() {
            log::debug!("Session {}: boss spawned with {} hp", state.session, hp);
            self.boss_hp = Some(hp);
        }
        self.boss_spawned = true;
    }
}

impl Ruleset for GalleryRules {
    fn begin(&mut self, _state: &mut MatchState) {
        *self = Self::default();
        self.spawner.prime();
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();

        for _ in 0..self.spawner.due(state.params.spawn_rate, dt) {
            let formation_chance = 0.2 + state.params.total * 0.2;
            if state.rng.chance(formation_chance) {
                self.spawn_formation(state);
            } else {
                self.spawn_single(state);
            }
        }

        if !self.boss_spawned {
            let half_time = state.time_limit_ticks().map(|t| t / 2).unwrap_or(u64::MAX);
            if state.time_ticks >= half_time {
                self.spawn_boss(state);
            }
        }

        for gone in state.entities.remove_expired(&Bounds::field(), OFFSCREEN_MARGIN) {
            let interaction = Interaction::escaped(&gone, &kind_rule(gone.kind), 0);
            state.apply(&interaction);
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        let InputEvent::Tap { pos } = event else {
            return Ok(InputOutcome::Ignored);
        };
        self.shots += 1;
        let interaction = resolve_tap(&mut state.entities, *pos, state.params.tolerance, state.combo, kind_rule);
        match &interaction.outcome {
            Outcome::Damaged {
                kind: EntityKind::BossBug,
                hp_left,
            } => self.boss_hp = Some(*hp_left),
            Outcome::Hit {
                kind: EntityKind::BossBug,
            } => self.boss_hp = Some(0),
            _ => {}
        }
        if interaction.is_success() {
            self.hits += 1;
        }
        state.apply(&interaction);
        if self.boss_hp == Some(0) {
            log::debug!("Session {}: boss down", state.session);
            state.finish_against_target();
        }
        Ok(InputOutcome::Applied)
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Gallery {
            shots: self.shots,
            hits: self.hits,
            boss_hp: self.boss_hp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;
    use crate::games::testing::started;
    use crate::sim::{MatchPhase, MatchResult, tick};

    fn place(state: &mut MatchState, kind: EntityKind, x: f32, y: f32) {
        state
            .entities
            .spawn(kind, Vec2::new(x, y), Vec2::ZERO, Motion::Static, 3.5)
            .unwrap();
    }

    #[test]
    fn test_swat_fly() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        state.entities.clear();
        place(&mut state, EntityKind::Fly, 40.0, 40.0);
        rules
            .input(&mut state, &InputEvent::Tap { pos: Vec2::new(41.0, 40.0) })
            .unwrap();
        assert_eq!(state.score, 10);
        assert_eq!(state.combo, 1);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_ladybug_costs_points() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        state.entities.clear();
        state.score = 100;
        state.combo = 3;
        place(&mut state, EntityKind::Ladybug, 60.0, 60.0);
        rules
            .input(&mut state, &InputEvent::Tap { pos: Vec2::new(60.0, 60.0) })
            .unwrap();
        assert_eq!(state.score, 75);
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn test_whiff_resets_combo() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        state.entities.clear();
        state.combo = 5;
        rules
            .input(&mut state, &InputEvent::Tap { pos: Vec2::new(5.0, 95.0) })
            .unwrap();
        assert_eq!(state.combo, 0);
        let GameDetail::Gallery { shots, hits, .. } = rules.detail() else {
            panic!("wrong detail");
        };
        assert_eq!((shots, hits), (1, 0));
    }

    #[test]
    fn test_boss_spawns_once_at_half_time() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 4, 3, &mut rules);
        let half = state.time_limit_ticks().unwrap() / 2;
        state.time_ticks = half - 1;
        tick(&mut state, &mut rules);
        assert_eq!(state.entities.count_kind(EntityKind::BossBug), 1);
        tick(&mut state, &mut rules);
        assert_eq!(state.entities.count_kind(EntityKind::BossBug), 1);

        let GameDetail::Gallery { boss_hp, .. } = rules.detail() else {
            panic!("wrong detail");
        };
        assert_eq!(boss_hp, Some(super::boss_hp(4, 3)));
    }

    fn boss_position(state: &MatchState) -> Vec2 {
        state
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::BossBug)
            .map(|e| e.pos)
            .expect("boss on the field")
    }

    fn down_the_boss(rules: &mut GalleryRules, state: &mut MatchState) {
        state.entities.clear();
        rules.spawn_boss(state);
        let pos = boss_position(state);
        for _ in 0..boss_hp(0, 1) {
            rules.input(state, &InputEvent::Tap { pos }).unwrap();
        }
    }

    #[test]
    fn test_boss_kill_ends_match_with_win_at_target() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        state.score = i64::from(state.target());
        down_the_boss(&mut rules, &mut state);

        assert_eq!(state.entities.count_kind(EntityKind::BossBug), 0);
        assert_eq!(state.phase, MatchPhase::Finished);
        assert_eq!(state.result, Some(MatchResult::Win));
        let GameDetail::Gallery { boss_hp, .. } = rules.detail() else {
            panic!("wrong detail");
        };
        assert_eq!(boss_hp, Some(0));
    }

    #[test]
    fn test_boss_kill_below_target_loses() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        down_the_boss(&mut rules, &mut state);
        assert!(state.score < i64::from(state.target()));
        assert_eq!(state.result, Some(MatchResult::Lose));
    }

    #[test]
    fn test_wounded_boss_keeps_match_running() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        state.entities.clear();
        rules.spawn_boss(&mut state);
        let pos = boss_position(&state);
        rules.input(&mut state, &InputEvent::Tap { pos }).unwrap();
        assert_eq!(state.phase, MatchPhase::Active);
        assert!(state.result.is_none());
    }

    #[test]
    fn test_boss_hp_scales() {
        assert_eq!(boss_hp(0, 1), 5);
        assert!(boss_hp(9, 10) > boss_hp(0, 1));
    }

    #[test]
    fn test_escaped_fly_breaks_streak() {
        let mut rules = GalleryRules::new();
        let mut state = started(GameKind::Gallery, 0, 1, &mut rules);
        state.entities.clear();
        state.combo = 2;
        let fly = state
            .entities
            .build(EntityKind::Fly, Vec2::new(50.0, 50.0), Vec2::ZERO, Motion::Static, 3.5)
            .with_ttl(1);
        state.entities.insert(fly);
        tick(&mut state, &mut rules);
        assert_eq!(state.combo, 0);
    }
}
