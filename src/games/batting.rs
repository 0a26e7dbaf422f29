//! Batting cage
//!
//! Ten pitches. Each pitch sweeps the swing meter once from release to the
//! plate; the player swings to lock it. Hitting the contact point scores a
//! home run (4), a double (2) or a single (1). Letting a pitch go past is a
//! strike. Breaking balls and swerving opponents shift the contact point.

use super::{GameDetail, Ruleset, apply_default_gimmick};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::roster::Gimmick;
use crate::secs_to_ticks;
use crate::sim::{
    AttemptMeter, AttemptPhase, EndRules, InputEvent, InputOutcome, InputRejected, Interaction, MatchState,
    MeterMotion, MeterTick, QualityTier, grade,
};

pub const OPPONENTS: [&str; 10] = [
    "Lefty Lou",
    "Knuckles",
    "Curveball Carla",
    "Slider Sam",
    "Fastball Fran",
    "The Spitter",
    "Screwball Steve",
    "Heater Hank",
    "Ace Alvarez",
    "Cy the Great",
];

/// `speed` is pitch sweeps per second, `tolerance` the grading window,
/// `opponent_power` the chance a pitch breaks.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.0,
    spawn_rate: Curve::new(0.0, 0.0),
    speed: Curve::new(0.6, 1.5),
    opponent_power: Curve::new(0.0, 0.6),
    tolerance: Curve::new(0.25, 0.08),
    player_power: Curve::new(1.0, 1.0),
    target: TargetFormula {
        base: 10,
        per_level: 1,
        per_opponent: 2,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: None,
    health: None,
    win_on_target: false,
};

pub const PITCHES: u32 = 10;
/// Meter position where bat meets ball
pub const CONTACT_POINT: f32 = 0.8;
const BREAK_RANGE: f32 = 0.08;
const PITCH_GAP_SECS: f32 = 0.75;
const HOLD_SECS: f32 = 0.5;

pub fn hit_points(tier: QualityTier) -> i64 {
    match tier {
        QualityTier::Perfect => 4,
        QualityTier::Good => 2,
        QualityTier::Okay => 1,
        QualityTier::Miss => 0,
    }
}

#[derive(Debug, Clone)]
pub struct BattingRules {
    meter: AttemptMeter,
    contact: f32,
    window: f32,
    thrown: u32,
    gap_ticks: u32,
    swerve_next: bool,
}

impl BattingRules {
    pub fn new() -> Self {
        Self {
            meter: AttemptMeter::new(MeterMotion::Sweep),
            contact: CONTACT_POINT,
            window: TABLE.tolerance.easy,
            thrown: 0,
            gap_ticks: 0,
            swerve_next: false,
        }
    }

    pub fn pitches_left(&self) -> u32 {
        PITCHES - self.thrown
    }

    /// True while a pitch is in flight and can be swung at
    pub fn can_swing(&self) -> bool {
        self.meter.phase() == AttemptPhase::Committing
    }

    fn pitch(&mut self, state: &mut MatchState) {
        self.contact = CONTACT_POINT;
        let breaking = state.rng.chance(state.params.opponent_power);
        if breaking || self.swerve_next {
            self.contact += state.rng.range(-BREAK_RANGE, BREAK_RANGE);
            self.swerve_next = false;
        }
        self.window = state.params.tolerance;
        self.meter.start(state.params.speed);
        self.thrown += 1;
        log::trace!("Session {}: pitch {} contact {:.2}", state.session, self.thrown, self.contact);
    }
}

impl Default for BattingRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for BattingRules {
    fn begin(&mut self, state: &mut MatchState) {
        *self = Self::new();
        self.gap_ticks = secs_to_ticks(PITCH_GAP_SECS, state.tick_hz);
    }

    fn tick(&mut self, state: &mut MatchState) {
        if self.meter.tick(state.dt()) == MeterTick::Overrun {
            // Watched it go by
            state.apply(&Interaction::graded(QualityTier::Miss, 0));
            self.meter.resolve(secs_to_ticks(HOLD_SECS, state.tick_hz));
        }

        if !self.meter.is_idle() {
            return;
        }
        if self.thrown >= PITCHES {
            state.finish_against_target();
        } else if self.gap_ticks == 0 {
            self.pitch(state);
            self.gap_ticks = secs_to_ticks(PITCH_GAP_SECS, state.tick_hz);
        } else {
            self.gap_ticks -= 1;
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        if !matches!(event, InputEvent::Press) {
            return Ok(InputOutcome::Ignored);
        }
        let Some(value) = self.meter.lock() else {
            return Ok(InputOutcome::Ignored);
        };
        let (_, tier) = grade(self.contact, value, self.window);
        state.apply(&Interaction::graded(tier, hit_points(tier)));
        self.meter.resolve(secs_to_ticks(HOLD_SECS, state.tick_hz));
        Ok(InputOutcome::Applied)
    }

    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        match gimmick {
            Gimmick::Swerve => self.swerve_next = true,
            other => apply_default_gimmick(state, other),
        }
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Meter {
            phase: self.meter.phase(),
            value: self.meter.value(),
            target: self.contact,
            window: self.window,
            attempts: self.thrown,
            attempts_left: Some(self.pitches_left()),
        }
    }
}
