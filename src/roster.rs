//! Opponent profiles
//!
//! Every game has a fixed roster of ten opponents. Names differ per game;
//! the numeric tunables and gimmick tags follow a shared progression so that
//! opponent `i` is always at least as nasty as opponent `i - 1`.

use serde::{Deserialize, Serialize};

use crate::consts::OPPONENT_COUNT;

/// Special mechanics an opponent can trigger during a match.
/// An opponent carries a set of tags; they compose rather than exclude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gimmick {
    /// Periodically dims the screen
    Dim,
    /// Targets or the ball change direction abruptly
    Swerve,
    /// Player input is ignored for a short time
    Stun,
    /// Steering and direction inputs are mirrored
    ReverseControls,
    /// Opponent takes some of the player's score or stamina
    StatSteal,
    /// Opponent briefly doubles its power or speed
    Speedup,
}

impl Gimmick {
    pub const ALL: [Gimmick; 6] = [
        Gimmick::Dim,
        Gimmick::Swerve,
        Gimmick::Stun,
        Gimmick::ReverseControls,
        Gimmick::StatSteal,
        Gimmick::Speedup,
    ];
}

const NO_GIMMICKS: &[Gimmick] = &[];

/// Gimmick tags by roster slot. The last slot carries every tag.
const GIMMICKS_BY_SLOT: [&[Gimmick]; OPPONENT_COUNT] = [
    NO_GIMMICKS,
    NO_GIMMICKS,
    NO_GIMMICKS,
    &[Gimmick::Dim],
    &[Gimmick::Swerve],
    &[Gimmick::Stun],
    &[Gimmick::ReverseControls, Gimmick::Dim],
    &[Gimmick::StatSteal, Gimmick::Swerve],
    &[Gimmick::Speedup, Gimmick::Stun, Gimmick::Swerve],
    &Gimmick::ALL,
];

/// Static opponent descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opponent {
    pub index: usize,
    pub name: &'static str,
    pub gimmicks: &'static [Gimmick],
    /// Active seconds between gimmick triggers
    pub gimmick_interval_secs: f32,
    /// Chance of a best-of-two re-roll (dice)
    pub luck: f32,
    /// Chance of a best-of-three re-roll (dice)
    pub cheat_chance: f32,
}

impl Opponent {
    pub fn has(&self, gimmick: Gimmick) -> bool {
        self.gimmicks.contains(&gimmick)
    }

    pub fn has_gimmicks(&self) -> bool {
        !self.gimmicks.is_empty()
    }
}

/// Build the ten-entry roster for a set of display names
pub fn build_roster(names: &[&'static str; OPPONENT_COUNT]) -> Vec<Opponent> {
    names
        .iter()
        .enumerate()
        .map(|(index, &name)| Opponent {
            index,
            name,
            gimmicks: GIMMICKS_BY_SLOT[index],
            // 8 s for the first gimmick opponent, down to 4 s for the boss
            gimmick_interval_secs: 8.0 - index.saturating_sub(3) as f32 * (2.0 / 3.0),
            luck: index as f32 * 0.05,
            cheat_chance: if index >= 5 {
                (index - 4) as f32 * 0.08
            } else {
                0.0
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; OPPONENT_COUNT] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];

    #[test]
    fn test_roster_shape() {
        let roster = build_roster(&NAMES);
        assert_eq!(roster.len(), OPPONENT_COUNT);
        for (i, opp) in roster.iter().enumerate() {
            assert_eq!(opp.index, i);
        }
        assert!(!roster[0].has_gimmicks());
        assert_eq!(roster[9].gimmicks.len(), Gimmick::ALL.len());
    }

    #[test]
    fn test_roster_tunables_monotonic() {
        let roster = build_roster(&NAMES);
        for pair in roster.windows(2) {
            assert!(pair[1].luck >= pair[0].luck);
            assert!(pair[1].cheat_chance >= pair[0].cheat_chance);
            assert!(pair[1].gimmick_interval_secs <= pair[0].gimmick_interval_secs);
        }
        assert_eq!(roster[3].gimmick_interval_secs, 8.0);
        assert!((roster[9].gimmick_interval_secs - 4.0).abs() < 1e-5);
        assert_eq!(roster[4].cheat_chance, 0.0);
        assert!(roster[5].cheat_chance > 0.0);
    }
}
