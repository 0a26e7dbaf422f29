//! Arm wrestling
//!
//! A tug between -1 (opponent pins) and +1 (player pins). The opponent pulls
//! steadily; each press pushes back but costs stamina, which recovers over
//! time. A pin scores the time left plus the stamina in reserve; the match
//! is won only when that score reaches the target. When the clock runs out
//! a player still ahead is scored on stamina alone, and a player behind loses.

use super::{FLASH_SECS, GameDetail, Ruleset, apply_default_gimmick};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::roster::Gimmick;
use crate::secs_to_ticks;
use crate::sim::{EffectKind, EndRules, InputEvent, InputOutcome, InputRejected, MatchResult, MatchState};

pub const OPPONENTS: [&str; 10] = [
    "Noodle Arms",
    "Farmer Fred",
    "Lumberjack Lou",
    "Iron Irma",
    "The Blacksmith",
    "Bone Crusher",
    "Grip Master",
    "Titan Tess",
    "The Mountain",
    "Champion Kang",
];

/// `opponent_power` is pull per second, `player_power` push per press,
/// `speed` stamina cost per press, `tolerance` stamina regained per second.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.004,
    spawn_rate: Curve::new(0.0, 0.0),
    speed: Curve::new(4.0, 9.0),
    opponent_power: Curve::new(0.08, 0.35),
    tolerance: Curve::new(20.0, 8.0),
    player_power: Curve::new(0.06, 0.03),
    target: TargetFormula {
        base: 150,
        per_level: 10,
        per_opponent: 15,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: Some(30),
    health: None,
    win_on_target: false,
};

pub const MAX_STAMINA: f32 = 100.0;
const STEAL_STAMINA: f32 = 25.0;

/// Score for a pin: ten per second left plus remaining stamina
pub fn pin_score(secs_left: f32, stamina: f32) -> i64 {
    (secs_left.max(0.0) * 10.0 + stamina.max(0.0)).round() as i64
}

#[derive(Debug, Clone)]
pub struct ArmWrestleRules {
    position: f32,
    stamina: f32,
    taps: u32,
}

impl ArmWrestleRules {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            stamina: MAX_STAMINA,
            taps: 0,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }
}

impl Default for ArmWrestleRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for ArmWrestleRules {
    fn begin(&mut self, _state: &mut MatchState) {
        *self = Self::new();
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();
        self.position -= state.params.opponent_power * dt;
        self.stamina = (self.stamina + state.params.tolerance * dt).min(MAX_STAMINA);

        if self.position <= -1.0 {
            self.position = -1.0;
            state.finish(MatchResult::Lose);
            return;
        }

        // Time up: score the lead before the generic check sees a zero score
        if state.time_limit_ticks().is_some_and(|limit| state.time_ticks >= limit) {
            if self.position > 0.0 {
                state.score = pin_score(0.0, self.stamina);
                state.finish_against_target();
            } else {
                state.finish(MatchResult::Lose);
            }
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        if !matches!(event, InputEvent::Press) {
            return Ok(InputOutcome::Ignored);
        }
        let cost = state.params.speed;
        if self.stamina < cost {
            return Ok(InputOutcome::Ignored);
        }
        self.stamina -= cost;
        self.position += state.params.player_power;
        self.taps += 1;

        if self.position >= 1.0 {
            self.position = 1.0;
            let secs_left = state.time_left_secs().unwrap_or(0.0);
            state.score = pin_score(secs_left, self.stamina);
            state.finish_against_target();
        }
        Ok(InputOutcome::Applied)
    }

    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        match gimmick {
            Gimmick::StatSteal => {
                self.stamina = (self.stamina - STEAL_STAMINA).max(0.0);
                state.schedule_effect(EffectKind::Flash, secs_to_ticks(FLASH_SECS, state.tick_hz));
            }
            other => apply_default_gimmick(state, other),
        }
    }

    fn detail(&self) -> GameDetail {
        GameDetail::ArmWrestle {
            position: self.position,
            stamina: self.stamina,
            taps: self.taps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;
    use crate::games::testing::started;
    use crate::sim::{MatchPhase, earned_points, tick};

    #[test]
    fn test_rapid_presses_pin_opponent() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 0, 1, &mut rules);
        for _ in 0..10_000 {
            if state.phase == MatchPhase::Finished {
                break;
            }
            tick(&mut state, &mut rules);
            let _ = rules.input(&mut state, &InputEvent::Press);
        }
        assert_eq!(state.result, Some(MatchResult::Win));
        assert_eq!(rules.position(), 1.0);
        assert!(state.score > 200, "pinned early with time to spare");
    }

    #[test]
    fn test_idle_player_gets_pinned() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 9, 10, &mut rules);
        for _ in 0..10_000 {
            if state.phase == MatchPhase::Finished {
                break;
            }
            tick(&mut state, &mut rules);
        }
        assert_eq!(state.result, Some(MatchResult::Lose));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_exhausted_press_ignored() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 0, 1, &mut rules);
        rules.stamina = 1.0;
        assert_eq!(rules.input(&mut state, &InputEvent::Press), Ok(InputOutcome::Ignored));
        assert_eq!(rules.taps, 0);
    }

    #[test]
    fn test_time_up_lead_below_target_loses() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 0, 1, &mut rules);
        rules.position = 0.5;
        rules.stamina = 40.0;
        state.time_ticks = state.time_limit_ticks().unwrap() - 1;
        tick(&mut state, &mut rules);
        assert!(state.score < i64::from(state.target()));
        assert_eq!(state.result, Some(MatchResult::Lose));
        assert_eq!(earned_points(MatchResult::Lose, state.score, state.target()), 0);
    }

    #[test]
    fn test_late_pin_below_target_loses() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 0, 1, &mut rules);
        rules.position = 0.99;
        rules.stamina = 20.0;
        // Two seconds left: 20 + (20 - cost) falls short of the target
        state.time_ticks = state.time_limit_ticks().unwrap() - 2 * 60;
        assert_eq!(rules.input(&mut state, &InputEvent::Press), Ok(InputOutcome::Applied));
        assert_eq!(rules.position(), 1.0);
        assert!(state.score < i64::from(state.target()));
        assert_eq!(state.result, Some(MatchResult::Lose));
    }

    #[test]
    fn test_early_pin_reaches_target() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 0, 1, &mut rules);
        rules.position = 0.99;
        assert_eq!(rules.input(&mut state, &InputEvent::Press), Ok(InputOutcome::Applied));
        assert!(state.score >= i64::from(state.target()));
        assert_eq!(state.result, Some(MatchResult::Win));
    }

    #[test]
    fn test_stat_steal_drains_stamina() {
        let mut rules = ArmWrestleRules::new();
        let mut state = started(GameKind::ArmWrestle, 0, 1, &mut rules);
        rules.gimmick(&mut state, Gimmick::StatSteal);
        assert_eq!(rules.stamina, MAX_STAMINA - STEAL_STAMINA);
    }

    #[test]
    fn test_pin_score() {
        assert_eq!(pin_score(20.0, 55.0), 255);
        assert_eq!(pin_score(-1.0, 10.0), 10);
    }
}
