//! Session tick and input routing
//!
//! Advances one `MatchSession` by a single fixed step. Order within an
//! active tick:
//! 1. scheduled effects count down
//! 2. difficulty parameters are re-evaluated
//! 3. opponent gimmick fires (on its interval)
//! 4. entities move
//! 5. the ruleset runs its per-tick logic
//! 6. terminal conditions are checked

use super::state::{GameEvent, InputEvent, InputOutcome, InputRejected, MatchConfig, MatchPhase, MatchResult, MatchState, Snapshot};
use crate::games::{Ruleset, ruleset_for};
use crate::secs_to_ticks;

/// A running match: generic state plus the game's ruleset.
/// Dropping the session drops every entity and scheduled effect with it.
#[derive(Debug)]
pub struct MatchSession {
    pub state: MatchState,
    rules: Box<dyn Ruleset>,
}

impl MatchSession {
    pub fn new(config: MatchConfig) -> Self {
        let rules = ruleset_for(config.game);
        let state = MatchState::new(config);
        log::info!(
            "Session {} created: {:?} vs {} (opponent {}, level {})",
            state.session,
            state.game,
            state.opponent.name,
            state.opponent.index,
            state.level
        );
        Self { state, rules }
    }

    pub fn id(&self) -> u32 {
        self.state.session
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.state.result
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(self.rules.detail())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Advance by one fixed step
    pub fn tick(&mut self) {
        tick(&mut self.state, self.rules.as_mut());
    }

    /// Route one input event
    pub fn input(&mut self, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        handle_input(&mut self.state, self.rules.as_mut(), event)
    }
}

pub fn tick(state: &mut MatchState, rules: &mut dyn Ruleset) {
    match state.phase {
        MatchPhase::Paused | MatchPhase::Finished => {}
        MatchPhase::Countdown => {
            state.countdown_ticks = state.countdown_ticks.saturating_sub(1);
            if state.countdown_ticks == 0 {
                begin_active(state, rules);
            }
        }
        MatchPhase::Active => {
            state.time_ticks += 1;

            for ended in state.effects.tick() {
                state.emit(GameEvent::EffectEnded(ended));
            }

            state.refresh_params();

            let interval = u64::from(secs_to_ticks(state.opponent.gimmick_interval_secs, state.tick_hz));
            if state.opponent.has_gimmicks() && state.time_ticks % interval == 0 {
                let gimmicks = state.opponent.gimmicks;
                if let Some(&gimmick) = state.rng.pick(gimmicks) {
                    log::debug!("Session {}: gimmick {:?}", state.session, gimmick);
                    state.emit(GameEvent::Gimmick(gimmick));
                    rules.gimmick(state, gimmick);
                }
            }

            let dt = state.dt();
            state.entities.tick(dt);
            rules.tick(state);
            check_terminal(state);
        }
    }
}

fn begin_active(state: &mut MatchState, rules: &mut dyn Ruleset) {
    state.score = 0;
    state.combo = 0;
    state.best_combo = 0;
    state.health = state.max_health;
    state.time_ticks = 0;
    state.entities.clear();
    state.effects.clear();
    state.refresh_params();
    state.set_phase(MatchPhase::Active);
    rules.begin(state);
}

fn check_terminal(state: &mut MatchState) {
    if state.result.is_some() {
        return;
    }
    let rules = state.end_rules;
    let target = state.target() as i64;

    if rules.health.is_some() && state.health <= 0 {
        state.finish(MatchResult::Lose);
    } else if rules.win_on_target && state.score >= target {
        state.finish(MatchResult::Win);
    } else if let Some(limit) = state.time_limit_ticks() {
        if state.time_ticks >= limit {
            state.finish_against_target();
        }
    }
}

pub fn handle_input(
    state: &mut MatchState,
    rules: &mut dyn Ruleset,
    event: &InputEvent,
) -> Result<InputOutcome, InputRejected> {
    if matches!(event, InputEvent::Pause) {
        return Ok(toggle_pause(state));
    }
    if state.phase != MatchPhase::Active || state.is_stunned() {
        return Ok(InputOutcome::Ignored);
    }
    let outcome = rules.input(state, event)?;
    check_terminal(state);
    Ok(outcome)
}

fn toggle_pause(state: &mut MatchState) -> InputOutcome {
    match state.phase {
        MatchPhase::Active => {
            state.set_phase(MatchPhase::Paused);
            InputOutcome::Applied
        }
        MatchPhase::Paused => {
            state.set_phase(MatchPhase::Active);
            InputOutcome::Applied
        }
        _ => InputOutcome::Ignored,
    }
}

/// Progression points earned by a finished match.
///
/// Losses earn nothing. A win earns 1, 2 at 1.25x the target, 3 at 1.5x and
/// the maximum 4 (one full star) at 2x or more.
pub fn earned_points(result: MatchResult, score: i64, target: u32) -> u8 {
    if result == MatchResult::Lose {
        return 0;
    }
    let target = target.max(1) as f64;
    let ratio = score.max(0) as f64 / target;
    if ratio >= 2.0 {
        4
    } else if ratio >= 1.5 {
        3
    } else if ratio >= 1.25 {
        2
    } else {
        1
    }
}
