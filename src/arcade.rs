//! Arcade controller
//!
//! Owns settings, the key-value store, one progression ledger per game and
//! the current screen. The presentation layer talks only to this type:
//! start a match, forward input, tick at a fixed rate, read snapshots.

use serde::Serialize;
use thiserror::Error;

use crate::consts::{MAX_LEVEL, OPPONENT_COUNT};
use crate::games::GameKind;
use crate::games::dice::STARTING_COINS;
use crate::persistence::{KvStore, StoreError};
use crate::progression::ProgressionLedger;
use crate::rng::GameRng;
use crate::settings::Settings;
use crate::sim::{
    GameEvent, InputEvent, InputOutcome, InputRejected, MatchConfig, MatchResult, MatchSession, Snapshot,
    earned_points,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("no opponent {0} (expected 0..{OPPONENT_COUNT})")]
    UnknownOpponent(usize),
    #[error("level {0} is outside 1..={MAX_LEVEL}")]
    InvalidLevel(u8),
    #[error("opponent {0} is locked")]
    OpponentLocked(usize),
    #[error("level {level} is locked against opponent {opponent}")]
    LevelLocked { opponent: usize, level: u8 },
}

/// Summary shown after a match ends
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub session: u32,
    pub game: GameKind,
    pub opponent: usize,
    pub level: u8,
    pub result: MatchResult,
    pub score: i64,
    pub target: u32,
    pub best_combo: u32,
    pub points_earned: u8,
    pub star_points: u8,
    pub stars: u8,
    /// This match mastered the opponent and opened the next one
    pub unlocked_next: bool,
    pub snapshot: Snapshot,
}

#[derive(Debug)]
pub enum Screen {
    Menu,
    Playing(MatchSession),
    Report(MatchReport),
}

pub struct Arcade {
    settings: Settings,
    store: Box<dyn KvStore>,
    ledgers: [ProgressionLedger; 9],
    screen: Screen,
    last_session: u32,
    seeds: GameRng,
    /// Events from a finished session, kept until the next drain
    pending_events: Vec<GameEvent>,
}

impl std::fmt::Debug for Arcade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arcade")
            .field("settings", &self.settings)
            .field("screen", &self.screen)
            .field("last_session", &self.last_session)
            .finish_non_exhaustive()
    }
}

impl Arcade {
    /// Load settings and progression from `store`
    pub fn new(store: Box<dyn KvStore>) -> Self {
        let settings = Settings::load(store.as_ref());
        Self::with_settings(store, settings)
    }

    /// Use explicit settings instead of the stored ones
    pub fn with_settings(store: Box<dyn KvStore>, settings: Settings) -> Self {
        let ledgers = GameKind::ALL.map(|game| {
            let mut ledger = ProgressionLedger::load(store.as_ref(), &settings.namespace_prefix, game);
            ledger.set_unlock_all(settings.unlock_all);
            ledger
        });
        let seeds = match settings.seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        };
        log::info!("Arcade ready ({} games, prefix {:?})", ledgers.len(), settings.namespace_prefix);

        Self {
            settings,
            store,
            ledgers,
            screen: Screen::Menu,
            last_session: 0,
            seeds,
            pending_events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist settings. Takes effect from the next match.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), StoreError> {
        for ledger in self.ledgers.iter_mut() {
            ledger.set_unlock_all(settings.unlock_all);
        }
        self.settings = settings;
        self.settings.save(self.store.as_mut())
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.screen, Screen::Playing(_))
    }

    pub fn report(&self) -> Option<&MatchReport> {
        match &self.screen {
            Screen::Report(report) => Some(report),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&MatchSession> {
        match &self.screen {
            Screen::Playing(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut MatchSession> {
        match &mut self.screen {
            Screen::Playing(session) => Some(session),
            _ => None,
        }
    }

    pub fn ledger(&self, game: GameKind) -> &ProgressionLedger {
        &self.ledgers[game.index()]
    }

    /// Start a new match, discarding whatever was running
    pub fn start_match(&mut self, game: GameKind, opponent: usize, level: u8) -> Result<(), StartError> {
        if opponent >= OPPONENT_COUNT {
            return Err(StartError::UnknownOpponent(opponent));
        }
        if !(1..=MAX_LEVEL).contains(&level) {
            return Err(StartError::InvalidLevel(level));
        }
        let ledger = self.ledger(game);
        if !ledger.is_unlocked(opponent) {
            return Err(StartError::OpponentLocked(opponent));
        }
        if !ledger.is_level_unlocked(opponent, level) {
            return Err(StartError::LevelLocked { opponent, level });
        }

        // The old session (entities, effects, ruleset) is gone before the
        // new one exists
        if let Screen::Playing(old) = std::mem::replace(&mut self.screen, Screen::Menu) {
            log::info!("Session {} abandoned", old.id());
        }
        self.pending_events.clear();

        let Some(profile) = game.roster().into_iter().nth(opponent) else {
            return Err(StartError::UnknownOpponent(opponent));
        };
        self.last_session += 1;
        let seed = self.settings.seed.unwrap_or_else(|| self.seeds.next_seed());
        let config = MatchConfig {
            session: self.last_session,
            game,
            opponent: profile,
            level,
            tick_hz: self.settings.tick_hz,
            countdown_ticks: self.settings.countdown_ticks(),
            seed,
            max_entities: self.settings.max_live_entities,
            reduced_motion: self.settings.reduced_motion,
        };
        self.screen = Screen::Playing(MatchSession::new(config));
        Ok(())
    }

    /// Forward one input event to the running match
    pub fn on_input(&mut self, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        let outcome = match &mut self.screen {
            Screen::Playing(session) => session.input(event)?,
            _ => return Ok(InputOutcome::Ignored),
        };
        self.settle_if_finished();
        Ok(outcome)
    }

    /// Advance the running match by one fixed step
    pub fn on_tick(&mut self) {
        if let Screen::Playing(session) = &mut self.screen {
            session.tick();
        }
        self.settle_if_finished();
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        match &self.screen {
            Screen::Menu => None,
            Screen::Playing(session) => Some(session.snapshot()),
            Screen::Report(report) => Some(report.snapshot.clone()),
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        if let Screen::Playing(session) = &mut self.screen {
            events.extend(session.drain_events());
        }
        events
    }

    /// Leave the current match or report; an unfinished match earns nothing
    pub fn exit_to_menu(&mut self) {
        if let Screen::Playing(session) = &self.screen {
            log::info!("Session {} left before finishing", session.id());
        }
        self.screen = Screen::Menu;
        self.pending_events.clear();
    }

    pub fn reset_progress(&mut self, game: GameKind) {
        self.ledgers[game.index()].reset(self.store.as_mut());
    }

    // Award exactly once: the session leaves the screen as it is settled
    fn settle_if_finished(&mut self) {
        let finished = matches!(&self.screen, Screen::Playing(session) if session.result().is_some());
        if !finished {
            return;
        }
        let Screen::Playing(mut session) = std::mem::replace(&mut self.screen, Screen::Menu) else {
            return;
        };
        let Some(result) = session.result() else {
            return;
        };

        self.pending_events.extend(session.drain_events());
        let snapshot = session.snapshot();
        let state = &session.state;
        let points = earned_points(result, state.score, state.target());
        let currency = match state.game {
            GameKind::Dice => (state.health - STARTING_COINS) as i64,
            _ => 0,
        };

        let ledger = &mut self.ledgers[state.game.index()];
        let award = ledger.settle_match(
            self.store.as_mut(),
            state.opponent.index,
            points,
            result == MatchResult::Win,
            currency,
        );
        let unlocked_next = award.is_some_and(|a| a.newly_mastered()) && state.opponent.index + 1 < OPPONENT_COUNT;

        log::info!(
            "Session {} finished: {:?}, score {} / {}, +{} star points",
            state.session,
            result,
            state.score,
            state.target(),
            points
        );

        self.screen = Screen::Report(MatchReport {
            session: state.session,
            game: state.game,
            opponent: state.opponent.index,
            level: state.level,
            result,
            score: state.score,
            target: state.target(),
            best_combo: state.best_combo,
            points_earned: points,
            star_points: ledger.points(state.opponent.index),
            stars: ledger.stars(state.opponent.index),
            unlocked_next,
            snapshot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_STAR_POINTS;
    use crate::persistence::MemoryStore;
    use crate::sim::MatchPhase;

    fn arcade() -> Arcade {
        let settings = Settings {
            seed: Some(7),
            countdown_secs: 0.0,
            ..Default::default()
        };
        Arcade::with_settings(Box::new(MemoryStore::new()), settings)
    }

    #[test]
    fn test_starts_on_menu() {
        let arcade = arcade();
        assert!(matches!(arcade.screen(), Screen::Menu));
        assert!(arcade.snapshot().is_none());
    }

    #[test]
    fn test_start_validation() {
        let mut arcade = arcade();
        assert_eq!(
            arcade.start_match(GameKind::Catch, 10, 1),
            Err(StartError::UnknownOpponent(10))
        );
        assert_eq!(arcade.start_match(GameKind::Catch, 0, 0), Err(StartError::InvalidLevel(0)));
        assert_eq!(arcade.start_match(GameKind::Catch, 0, 11), Err(StartError::InvalidLevel(11)));
        assert_eq!(arcade.start_match(GameKind::Catch, 1, 1), Err(StartError::OpponentLocked(1)));
        assert_eq!(
            arcade.start_match(GameKind::Catch, 0, 2),
            Err(StartError::LevelLocked { opponent: 0, level: 2 })
        );
        assert!(!arcade.is_playing());
        assert!(arcade.start_match(GameKind::Catch, 0, 1).is_ok());
        assert!(arcade.is_playing());
    }

    #[test]
    fn test_session_ids_increase() {
        let mut arcade = arcade();
        arcade.start_match(GameKind::Snake, 0, 1).unwrap();
        let first = arcade.session().unwrap().id();
        arcade.start_match(GameKind::Snake, 0, 1).unwrap();
        let second = arcade.session().unwrap().id();
        assert!(second > first);
    }

    #[test]
    fn test_input_outside_match_ignored() {
        let mut arcade = arcade();
        assert_eq!(arcade.on_input(&InputEvent::Press), Ok(InputOutcome::Ignored));
        arcade.on_tick();
        assert!(matches!(arcade.screen(), Screen::Menu));
    }

    #[test]
    fn test_finished_match_settles_once() {
        let mut arcade = arcade();
        arcade.start_match(GameKind::Catch, 0, 1).unwrap();
        arcade.on_tick();
        {
            let state = &mut arcade.session_mut().unwrap().state;
            state.score = i64::from(state.target()) * 2;
            state.finish(MatchResult::Win);
        }
        arcade.on_tick();
        let report = arcade.report().unwrap();
        assert_eq!(report.result, MatchResult::Win);
        assert_eq!(report.points_earned, 4);
        assert_eq!(report.stars, 1);
        assert_eq!(report.snapshot.phase, MatchPhase::Finished);

        // Further ticks on the report screen change nothing
        for _ in 0..10 {
            arcade.on_tick();
        }
        assert_eq!(arcade.ledger(GameKind::Catch).points(0), 4);
        assert_eq!(arcade.ledger(GameKind::Catch).record().total_runs, 1);
        assert!(
            arcade
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Finished(MatchResult::Win)))
        );
    }

    #[test]
    fn test_abandoned_match_awards_nothing() {
        let mut arcade = arcade();
        arcade.start_match(GameKind::Tunnel, 0, 1).unwrap();
        for _ in 0..30 {
            arcade.on_tick();
        }
        arcade.exit_to_menu();
        assert!(matches!(arcade.screen(), Screen::Menu));
        assert_eq!(arcade.ledger(GameKind::Tunnel).record().total_runs, 0);
    }

    #[test]
    fn test_mastery_reported() {
        let mut arcade = arcade();
        for _ in 0..10 {
            arcade.start_match(GameKind::Basketball, 0, 1).unwrap();
            arcade.on_tick();
            let state = &mut arcade.session_mut().unwrap().state;
            state.score = i64::from(state.target()) * 3;
            state.finish(MatchResult::Win);
            arcade.on_tick();
        }
        let report = arcade.report().unwrap();
        assert_eq!(report.star_points, MAX_STAR_POINTS);
        assert!(report.unlocked_next);
        assert!(arcade.ledger(GameKind::Basketball).is_unlocked(1));
        assert!(arcade.start_match(GameKind::Basketball, 1, 1).is_ok());
    }

    #[test]
    fn test_reset_progress() {
        let mut arcade = arcade();
        arcade.start_match(GameKind::Catch, 0, 1).unwrap();
        arcade.on_tick();
        arcade.session_mut().unwrap().state.finish(MatchResult::Win);
        arcade.on_tick();
        assert!(arcade.ledger(GameKind::Catch).points(0) > 0);
        arcade.reset_progress(GameKind::Catch);
        assert_eq!(arcade.ledger(GameKind::Catch).points(0), 0);
    }

    #[test]
    fn test_unlock_all_setting() {
        let mut arcade = arcade();
        let settings = Settings {
            unlock_all: true,
            ..arcade.settings().clone()
        };
        arcade.update_settings(settings).unwrap();
        assert!(arcade.start_match(GameKind::Gallery, 9, 10).is_ok());
    }
}
