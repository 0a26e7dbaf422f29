//! Star-point progression ledger
//!
//! One bounded counter per opponent (0..=40, four points per star),
//! persisted per game under `<prefix>:<namespace>:progress`. Counters only
//! move up, except on an explicit reset.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_LEVEL, MAX_STAR_POINTS, OPPONENT_COUNT, POINTS_PER_STAR};
use crate::games::GameKind;
use crate::persistence::{KvStore, load_json, save_json, storage_key};

/// Persisted progression for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecord {
    pub star_points: [u8; OPPONENT_COUNT],
    #[serde(default)]
    pub total_runs: u32,
    #[serde(default)]
    pub total_wins: u32,
    /// Net winnings banked across runs (dice)
    #[serde(default)]
    pub currency_won: i64,
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self {
            star_points: [0; OPPONENT_COUNT],
            total_runs: 0,
            total_wins: 0,
            currency_won: 0,
        }
    }
}

impl ProgressionRecord {
    /// Clamp counters a hand-edited save may have pushed out of range
    fn sanitized(mut self) -> Self {
        for points in self.star_points.iter_mut() {
            *points = (*points).min(MAX_STAR_POINTS);
        }
        self
    }
}

/// What one award changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub opponent: usize,
    pub before: u8,
    pub after: u8,
    pub stars_before: u8,
    pub stars_after: u8,
}

impl Award {
    pub fn gained(&self) -> u8 {
        self.after - self.before
    }

    pub fn newly_mastered(&self) -> bool {
        self.before < MAX_STAR_POINTS && self.after >= MAX_STAR_POINTS
    }
}

#[derive(Debug, Clone)]
pub struct ProgressionLedger {
    game: GameKind,
    key: String,
    record: ProgressionRecord,
    unlock_all: bool,
}

impl ProgressionLedger {
    /// Load the ledger for `game`; absent or malformed records start fresh
    pub fn load(store: &dyn KvStore, prefix: &str, game: GameKind) -> Self {
        let key = storage_key(prefix, game.namespace(), "progress");
        let record = load_json::<ProgressionRecord>(store, &key).sanitized();
        Self {
            game,
            key,
            record,
            unlock_all: false,
        }
    }

    /// Bypass unlock gating (development)
    pub fn set_unlock_all(&mut self, unlock_all: bool) {
        self.unlock_all = unlock_all;
    }

    pub fn game(&self) -> GameKind {
        self.game
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn record(&self) -> &ProgressionRecord {
        &self.record
    }

    pub fn points(&self, opponent: usize) -> u8 {
        self.record.star_points.get(opponent).copied().unwrap_or(0)
    }

    pub fn stars(&self, opponent: usize) -> u8 {
        self.points(opponent) / POINTS_PER_STAR
    }

    /// Opponent 0 is always open; each later one needs the previous mastered
    pub fn is_unlocked(&self, opponent: usize) -> bool {
        if opponent >= OPPONENT_COUNT {
            return false;
        }
        self.unlock_all || opponent == 0 || self.is_mastered(opponent - 1)
    }

    /// Level 1 is always open; level L needs L-1 stars on this opponent
    pub fn is_level_unlocked(&self, opponent: usize, level: u8) -> bool {
        if !(1..=MAX_LEVEL).contains(&level) || !self.is_unlocked(opponent) {
            return false;
        }
        self.unlock_all || level == 1 || self.stars(opponent) >= level - 1
    }

    pub fn is_mastered(&self, opponent: usize) -> bool {
        self.points(opponent) >= MAX_STAR_POINTS
    }

    /// Highest level currently playable against `opponent`
    pub fn max_level(&self, opponent: usize) -> u8 {
        (1..=MAX_LEVEL)
            .rev()
            .find(|&level| self.is_level_unlocked(opponent, level))
            .unwrap_or(1)
    }

    /// Add earned points, clamped at the ceiling, and persist
    pub fn award(&mut self, store: &mut dyn KvStore, opponent: usize, points: u8) -> Option<Award> {
        let award = self.apply_award(opponent, points)?;
        self.save(store);
        Some(award)
    }

    /// Count a finished run and bank any winnings, then persist
    pub fn record_run(&mut self, store: &mut dyn KvStore, won: bool, currency: i64) {
        self.apply_run(won, currency);
        self.save(store);
    }

    /// Award and run bookkeeping for one finished match in a single write
    pub fn settle_match(
        &mut self,
        store: &mut dyn KvStore,
        opponent: usize,
        points: u8,
        won: bool,
        currency: i64,
    ) -> Option<Award> {
        let award = self.apply_award(opponent, points);
        self.apply_run(won, currency);
        self.save(store);
        award
    }

    /// Wipe this game's progression
    pub fn reset(&mut self, store: &mut dyn KvStore) {
        self.record = ProgressionRecord::default();
        if let Err(err) = store.remove(&self.key) {
            log::warn!("Could not clear {}: {err}", self.key);
        }
        log::info!("Progression reset for {}", self.game);
    }

    fn apply_award(&mut self, opponent: usize, points: u8) -> Option<Award> {
        let Some(counter) = self.record.star_points.get_mut(opponent) else {
            log::warn!("Award for unknown opponent {opponent} in {}", self.game);
            return None;
        };
        let before = *counter;
        *counter = before.saturating_add(points).min(MAX_STAR_POINTS);
        let after = *counter;

        let award = Award {
            opponent,
            before,
            after,
            stars_before: before / POINTS_PER_STAR,
            stars_after: after / POINTS_PER_STAR,
        };
        log::info!(
            "{} opponent {opponent}: +{} star points ({before} -> {after})",
            self.game,
            award.gained()
        );
        Some(award)
    }

    fn apply_run(&mut self, won: bool, currency: i64) {
        self.record.total_runs = self.record.total_runs.saturating_add(1);
        if won {
            self.record.total_wins = self.record.total_wins.saturating_add(1);
        }
        if currency > 0 {
            self.record.currency_won = self.record.currency_won.saturating_add(currency);
        }
    }

    // Write failures are logged and dropped; the in-memory record stays
    // authoritative for the rest of the process
    fn save(&self, store: &mut dyn KvStore) {
        if let Err(err) = save_json(store, &self.key, &self.record) {
            log::warn!("Could not save progression for {}: {err}", self.game);
        }
    }
}
