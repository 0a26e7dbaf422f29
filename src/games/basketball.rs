//! Free-throw basketball
//!
//! A power meter bounces between empty and full; the player locks it as
//! close to the sweet spot as they can. Swish, good and rim shots score
//! 3, 2 and 1. The defender nudges the sweet spot around, and streaks feed
//! the flow adjuster so the meter speeds up for players who are on fire.

use super::{GameDetail, Ruleset};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::secs_to_ticks;
use crate::sim::{
    AttemptMeter, EndRules, InputEvent, InputOutcome, InputRejected, Interaction, MatchState, MeterMotion, MeterTick,
    QualityTier, grade,
};

pub const OPPONENTS: [&str; 10] = [
    "Rookie Ray",
    "Hoops Hana",
    "Dunkin' Dave",
    "Skyhook",
    "Brickwall Betty",
    "The Blur",
    "Crossover Cruz",
    "Fadeaway",
    "Big Red",
    "The Commissioner",
];

/// `speed` is meter sweeps per second, `tolerance` the grading window,
/// `opponent_power` how far the defender pushes the sweet spot.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.002,
    spawn_rate: Curve::new(0.0, 0.0),
    speed: Curve::new(0.7, 1.8),
    opponent_power: Curve::new(0.0, 0.3),
    tolerance: Curve::new(0.3, 0.1),
    player_power: Curve::new(1.0, 1.0),
    target: TargetFormula {
        base: 20,
        per_level: 3,
        per_opponent: 4,
    },
    uses_flow: true,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: Some(60),
    health: None,
    win_on_target: false,
};

const HOLD_SECS: f32 = 0.6;

pub fn shot_points(tier: QualityTier) -> i64 {
    match tier {
        QualityTier::Perfect => 3,
        QualityTier::Good => 2,
        QualityTier::Okay => 1,
        QualityTier::Miss => 0,
    }
}

#[derive(Debug, Clone)]
pub struct BasketballRules {
    meter: AttemptMeter,
    sweet_base: f32,
    sweet_spot: f32,
    window: f32,
    shots: u32,
}

impl BasketballRules {
    pub fn new() -> Self {
        Self {
            meter: AttemptMeter::new(MeterMotion::PingPong),
            sweet_base: 0.7,
            sweet_spot: 0.7,
            window: TABLE.tolerance.easy,
            shots: 0,
        }
    }

    fn next_shot(&mut self, state: &mut MatchState) {
        self.sweet_base = state.rng.range(0.55, 0.85);
        self.sweet_spot = self.sweet_base;
        self.meter.start(state.params.speed);
    }
}

impl Default for BasketballRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for BasketballRules {
    fn begin(&mut self, state: &mut MatchState) {
        *self = Self::new();
        self.next_shot(state);
    }

    fn tick(&mut self, state: &mut MatchState) {
        self.window = state.params.tolerance;

        // Defender sway
        let sway = (state.elapsed_secs() * 2.0).sin() * state.params.opponent_power * 0.15;
        self.sweet_spot = (self.sweet_base + sway).clamp(0.05, 0.95);

        if self.meter.tick(state.dt()) == MeterTick::Ready {
            self.next_shot(state);
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        if !matches!(event, InputEvent::Press) {
            return Ok(InputOutcome::Ignored);
        }
        let Some(value) = self.meter.lock() else {
            return Ok(InputOutcome::Ignored);
        };
        let (_, tier) = grade(self.sweet_spot, value, self.window);
        self.shots += 1;
        state.apply(&Interaction::graded(tier, shot_points(tier)));
        self.meter.resolve(secs_to_ticks(HOLD_SECS, state.tick_hz));
        Ok(InputOutcome::Applied)
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Meter {
            phase: self.meter.phase(),
            value: self.meter.value(),
            target: self.sweet_spot,
            window: self.window,
            attempts: self.shots,
            attempts_left: None,
        }
    }
}
