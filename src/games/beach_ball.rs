//! Beach ball keep-up
//!
//! One ball under gravity. Tapping near it bats it back up; the closer the
//! tap the better the touch. The ball touching the sand costs a life.
//! Early opponents play with walls that bounce the ball back, later ones
//! leave the sides open so a wide ball is lost too.

use glam::Vec2;

use super::{GameDetail, Ruleset, apply_default_gimmick};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::roster::Gimmick;
use crate::secs_to_ticks;
use crate::sim::{
    BoundaryPolicy, EffectKind, EndRules, EntityId, EntityKind, InputEvent, InputOutcome, InputRejected, Interaction,
    MatchState, Motion, QualityTier, grade,
};

pub const OPPONENTS: [&str; 10] = [
    "Sunny",
    "Coral",
    "Surfer Sid",
    "Seagull Steve",
    "Tidal Tina",
    "Riptide",
    "Sandstorm",
    "Crab King",
    "Typhoon",
    "The Lifeguard",
];

/// `speed` is gravity, `tolerance` the tap reach, `player_power` the launch
/// speed of a touch, `opponent_power` the breeze strength.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.003,
    spawn_rate: Curve::new(0.0, 0.0),
    speed: Curve::new(35.0, 80.0),
    opponent_power: Curve::new(0.0, 25.0),
    tolerance: Curve::new(14.0, 8.0),
    player_power: Curve::new(75.0, 55.0),
    target: TargetFormula {
        base: 30,
        per_level: 5,
        per_opponent: 6,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: Some(45),
    health: Some(3),
    win_on_target: false,
};

/// Opponents from this index on play without side walls
pub const OPEN_SIDES_FROM: usize = 5;
pub const BALL_RADIUS: f32 = 5.0;
const SERVE_POS: Vec2 = Vec2::new(50.0, 20.0);
const KICK: f32 = 4.0;
const WIND_SECS: f32 = 2.0;
/// Share of the breeze that blows even without a gust
const BREEZE_SHARE: f32 = 0.2;

pub fn wall_policy(opponent: usize) -> BoundaryPolicy {
    if opponent < OPEN_SIDES_FROM {
        BoundaryPolicy::Bounce
    } else {
        BoundaryPolicy::Miss
    }
}

pub fn touch_points(tier: QualityTier) -> i64 {
    match tier {
        QualityTier::Perfect => 3,
        QualityTier::Good => 2,
        QualityTier::Okay => 1,
        QualityTier::Miss => 0,
    }
}

#[derive(Debug, Clone)]
pub struct BeachBallRules {
    ball: Option<EntityId>,
    walls: BoundaryPolicy,
    wind_dir: f32,
    touches: u32,
    last_pos: Option<Vec2>,
}

impl BeachBallRules {
    pub fn new() -> Self {
        Self {
            ball: None,
            walls: BoundaryPolicy::Bounce,
            wind_dir: 1.0,
            touches: 0,
            last_pos: None,
        }
    }

    fn serve(&mut self, state: &mut MatchState) {
        if let Some(old) = self.ball.take() {
            state.entities.remove(old);
        }
        self.ball = state.entities.spawn(
            EntityKind::Ball,
            SERVE_POS,
            Vec2::ZERO,
            Motion::Ballistic {
                gravity: state.params.speed,
            },
            BALL_RADIUS,
        );
        self.last_pos = self.ball_pos(state);
    }

    fn drop_ball(&mut self, state: &mut MatchState) {
        log::debug!("Session {}: ball dropped", state.session);
        state.apply(&Interaction::miss(1));
        self.serve(state);
    }

    fn ball_pos(&self, state: &MatchState) -> Option<Vec2> {
        self.ball.and_then(|id| state.entities.get(id)).map(|e| e.pos)
    }
}

impl Default for BeachBallRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for BeachBallRules {
    fn begin(&mut self, state: &mut MatchState) {
        *self = Self::new();
        self.walls = wall_policy(state.opponent.index);
        self.serve(state);
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();
        let gravity = state.params.speed;
        let gust = if state.effects.is_active(EffectKind::Wind) {
            1.0
        } else {
            BREEZE_SHARE
        };
        let push = self.wind_dir * state.params.opponent_power * gust * dt;
        let walls = self.walls;

        let Some(ball) = self.ball.and_then(|id| state.entities.get_mut(id)) else {
            self.serve(state);
            return;
        };
        ball.motion = Motion::Ballistic { gravity };
        ball.vel.x += push;

        if ball.pos.y - BALL_RADIUS < 0.0 {
            ball.pos.y = BALL_RADIUS;
            ball.vel.y = ball.vel.y.abs();
        }

        let off_side = ball.pos.x < BALL_RADIUS || ball.pos.x > FIELD_WIDTH - BALL_RADIUS;
        let lost = match walls {
            _ if !off_side => false,
            BoundaryPolicy::Bounce | BoundaryPolicy::Wrap => {
                ball.pos.x = ball.pos.x.clamp(BALL_RADIUS, FIELD_WIDTH - BALL_RADIUS);
                ball.vel.x = -ball.vel.x;
                false
            }
            BoundaryPolicy::Miss => ball.pos.x < -BALL_RADIUS || ball.pos.x > FIELD_WIDTH + BALL_RADIUS,
        };

        if lost || ball.pos.y > FIELD_HEIGHT {
            self.drop_ball(state);
        }
        self.last_pos = self.ball_pos(state);
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        let InputEvent::Tap { pos } = event else {
            return Ok(InputOutcome::Ignored);
        };
        let tap = Vec2::new(state.steer_x(pos.x), pos.y);
        let Some(ball_pos) = self.ball_pos(state) else {
            return Ok(InputOutcome::Ignored);
        };

        let (q, tier) = grade(0.0, tap.distance(ball_pos), state.params.tolerance);
        if tier.is_hit() {
            let launch = state.params.player_power * (0.8 + 0.2 * q);
            if let Some(ball) = self.ball.and_then(|id| state.entities.get_mut(id)) {
                ball.vel.y = -launch;
                ball.vel.x = (ball_pos.x - tap.x) * KICK;
            }
            self.touches += 1;
        }
        state.apply(&Interaction::graded(tier, touch_points(tier)));
        Ok(InputOutcome::Applied)
    }

    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        match gimmick {
            Gimmick::Swerve => {
                self.wind_dir = if state.rng.chance(0.5) { 1.0 } else { -1.0 };
                state.schedule_effect(EffectKind::Wind, secs_to_ticks(WIND_SECS, state.tick_hz));
            }
            other => apply_default_gimmick(state, other),
        }
    }

    fn detail(&self) -> GameDetail {
        GameDetail::BeachBall {
            walls: self.walls,
            touches: self.touches,
            ball: self.last_pos,
        }
    }
}
