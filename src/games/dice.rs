//! Dice duel
//!
//! Each round the player wagers coins, then stops three tumbling dice. The
//! opponent rolls too; lucky opponents take the better of two rolls and
//! cheats the best of three. Triples beat pairs beat plain totals. Coins are
//! the health pool: going broke loses, reaching the winnings target wins.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{GameDetail, Ruleset, STEAL_FRACTION, apply_default_gimmick};
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::rng::GameRng;
use crate::roster::{Gimmick, Opponent};
use crate::secs_to_ticks;
use crate::sim::{
    AttemptMeter, AttemptPhase, ComboChange, EndRules, InputEvent, InputOutcome, InputRejected, Interaction,
    MatchState, MeterMotion, MeterTick, Outcome,
};

pub const OPPONENTS: [&str; 10] = [
    "Granny Gert",
    "Lucky Lenny",
    "Snake Eyes",
    "Card Shark Carl",
    "Madame Fortune",
    "Loaded Larry",
    "The Croupier",
    "Double Down Dee",
    "Boxcar Bruno",
    "The House",
];

/// `speed` is tumble face changes per second, `opponent_power` the chance
/// a drawn round goes to the house.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.0,
    spawn_rate: Curve::new(0.0, 0.0),
    speed: Curve::new(10.0, 16.0),
    opponent_power: Curve::new(0.0, 0.3),
    tolerance: Curve::new(1.0, 1.0),
    player_power: Curve::new(1.0, 1.0),
    target: TargetFormula {
        base: 60,
        per_level: 10,
        per_opponent: 15,
    },
    uses_flow: false,
};

pub const STARTING_COINS: i32 = 100;
pub const MAX_ROUNDS: u32 = 20;

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: None,
    health: Some(STARTING_COINS),
    win_on_target: true,
};

const SETTLE_SECS: f32 = 0.75;

/// Hand categories, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hand {
    Total,
    Pair,
    Triple,
}

/// Comparable strength of a roll. Field order gives the ordering:
/// hand first, then the matched face (or total), then the kicker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiceRank {
    pub hand: Hand,
    pub primary: u8,
    pub kicker: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll(pub [u8; 3]);

impl DiceRoll {
    pub fn roll(rng: &mut GameRng) -> Self {
        Self([rng.int(1, 6) as u8, rng.int(1, 6) as u8, rng.int(1, 6) as u8])
    }

    pub fn total(&self) -> u8 {
        self.0.iter().sum()
    }

    pub fn rank(&self) -> DiceRank {
        let [a, b, c] = self.0;
        if a == b && b == c {
            return DiceRank {
                hand: Hand::Triple,
                primary: a,
                kicker: 0,
            };
        }
        let pair = if a == b || a == c {
            Some((a, if a == b { c } else { b }))
        } else if b == c {
            Some((b, a))
        } else {
            None
        };
        match pair {
            Some((face, kicker)) => DiceRank {
                hand: Hand::Pair,
                primary: face,
                kicker,
            },
            None => DiceRank {
                hand: Hand::Total,
                primary: self.total(),
                kicker: 0,
            },
        }
    }
}

/// The opponent's roll. The cheat check comes first and always consumes
/// one draw; the luck check follows only if the cheat did not fire.
pub fn opponent_roll(rng: &mut GameRng, opponent: &Opponent) -> DiceRoll {
    let rank = |roll: &DiceRoll| roll.rank();
    if rng.chance(opponent.cheat_chance) {
        rng.best_of(3, DiceRoll::roll, rank)
    } else if rng.chance(opponent.luck) {
        rng.best_of(2, DiceRoll::roll, rank)
    } else {
        DiceRoll::roll(rng)
    }
}

#[derive(Debug, Clone)]
pub struct DiceRules {
    meter: AttemptMeter,
    bet: Option<u32>,
    tumbling: DiceRoll,
    face_timer: f32,
    player: Option<DiceRoll>,
    opponent: Option<DiceRoll>,
    rounds: u32,
    balance: i64,
}

impl DiceRules {
    pub fn new() -> Self {
        Self {
            meter: AttemptMeter::new(MeterMotion::PingPong),
            bet: None,
            tumbling: DiceRoll([1, 1, 1]),
            face_timer: 0.0,
            player: None,
            opponent: None,
            rounds: 0,
            balance: STARTING_COINS as i64,
        }
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds
    }

    /// Score tracks net winnings and never drops below zero
    fn sync_score(state: &mut MatchState) {
        state.score = (state.health - STARTING_COINS).max(0) as i64;
    }

    fn settle(&mut self, state: &mut MatchState, bet: u32, player: DiceRoll) {
        let opponent = opponent_roll(&mut state.rng, &state.opponent);
        let house_takes_tie = state.rng.chance(state.params.opponent_power);
        let outcome = match player.rank().cmp(&opponent.rank()) {
            Ordering::Greater => Ordering::Greater,
            Ordering::Less => Ordering::Less,
            Ordering::Equal if house_takes_tie => Ordering::Less,
            Ordering::Equal => Ordering::Equal,
        };
        let (coins, combo) = match outcome {
            Ordering::Greater => (bet as i32, ComboChange::Increment),
            Ordering::Less => (-(bet as i32), ComboChange::Reset),
            Ordering::Equal => (0, ComboChange::Unchanged),
        };

        // Score is net winnings, floored at zero
        let new_score = (state.health + coins - STARTING_COINS).max(0) as i64;
        let interaction = Interaction {
            outcome: Outcome::Wager { delta: coins as i64 },
            entity: None,
            score_delta: new_score - state.score,
            health_delta: coins,
            combo,
            removed: Vec::new(),
        };
        state.apply(&interaction);

        log::debug!(
            "Session {}: round {} {:?} vs {:?} -> {:+}",
            state.session,
            self.rounds + 1,
            player.0,
            opponent.0,
            coins
        );
        self.player = Some(player);
        self.opponent = Some(opponent);
        self.rounds += 1;
        self.balance = state.health as i64;
    }
}

impl Default for DiceRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for DiceRules {
    fn begin(&mut self, state: &mut MatchState) {
        *self = Self::new();
        self.balance = state.health as i64;
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();

        if self.meter.is_idle() && self.bet.is_some() {
            self.meter.start(state.params.speed);
            self.player = None;
            self.opponent = None;
        }

        if self.meter.phase() == AttemptPhase::Committing {
            self.face_timer += state.params.speed * dt;
            while self.face_timer >= 1.0 {
                self.face_timer -= 1.0;
                self.tumbling = DiceRoll::roll(&mut state.rng);
            }
        }

        if self.meter.tick(dt) == MeterTick::Ready && self.rounds >= MAX_ROUNDS {
            state.finish_against_target();
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        match event {
            InputEvent::Bet { amount } => {
                if self.bet.is_some() || !self.meter.is_idle() || self.rounds >= MAX_ROUNDS {
                    return Err(InputRejected::RoundInProgress);
                }
                if *amount == 0 {
                    return Err(InputRejected::EmptyBet);
                }
                let balance = state.health as i64;
                if *amount as i64 > balance {
                    return Err(InputRejected::InsufficientBalance { bet: *amount, balance });
                }
                self.bet = Some(*amount);
                Ok(InputOutcome::Applied)
            }
            InputEvent::Press => {
                let Some(bet) = self.bet else {
                    return Ok(InputOutcome::Ignored);
                };
                if self.meter.lock().is_none() {
                    return Ok(InputOutcome::Ignored);
                }
                self.bet = None;
                self.settle(state, bet, self.tumbling);
                self.meter.resolve(secs_to_ticks(SETTLE_SECS, state.tick_hz));
                Ok(InputOutcome::Applied)
            }
            _ => Ok(InputOutcome::Ignored),
        }
    }

    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        match gimmick {
            // Steals coins rather than score; score follows the purse. Coins
            // already wagered are off the table.
            Gimmick::StatSteal => {
                let staked = self.bet.map_or(0, |bet| bet as i32);
                let exposed = (state.health - staked).max(0);
                let stolen = (exposed as f32 * STEAL_FRACTION).floor() as i32;
                state.health -= stolen;
                Self::sync_score(state);
                self.balance = state.health as i64;
                log::debug!("Session {}: opponent pocketed {} coins", state.session, stolen);
            }
            other => apply_default_gimmick(state, other),
        }
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Dice {
            phase: self.meter.phase(),
            balance: self.balance,
            bet: self.bet,
            tumbling: self.tumbling.0,
            player: self.player.map(|r| r.0),
            opponent: self.opponent.map(|r| r.0),
            round: self.rounds,
            rounds_left: MAX_ROUNDS.saturating_sub(self.rounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;
    use crate::games::testing::{config, started};
    use crate::roster::build_roster;
    use crate::sim::tick;

    fn rank(dice: [u8; 3]) -> DiceRank {
        DiceRoll(dice).rank()
    }

    #[test]
    fn test_rank_ordering() {
        assert!(rank([2, 2, 2]) > rank([6, 6, 5]));
        assert!(rank([6, 6, 6]) > rank([1, 1, 1]));
        assert!(rank([1, 1, 2]) > rank([6, 5, 4]));
        assert!(rank([3, 3, 5]) > rank([3, 3, 4]));
        assert!(rank([4, 2, 4]) > rank([3, 3, 6]));
        assert!(rank([6, 5, 3]) > rank([6, 4, 3]));
        assert_eq!(rank([1, 2, 3]), rank([3, 1, 2]));
    }

    #[test]
    fn test_pair_detection_any_position() {
        for dice in [[5, 5, 1], [5, 1, 5], [1, 5, 5]] {
            let r = rank(dice);
            assert_eq!(r.hand, Hand::Pair);
            assert_eq!(r.primary, 5);
            assert_eq!(r.kicker, 1);
        }
    }

    #[test]
    fn test_cheater_takes_best_of_three() {
        let mut opponent = build_roster(&OPPONENTS)[9].clone();
        opponent.cheat_chance = 1.0;
        for seed in 0..200 {
            let mut rng = GameRng::new(seed);
            let mut probe = rng.clone();
            assert!(probe.chance(1.0));
            let samples = [DiceRoll::roll(&mut probe), DiceRoll::roll(&mut probe), DiceRoll::roll(&mut probe)];
            let best = samples.iter().map(|r| r.rank()).max().unwrap();

            let roll = opponent_roll(&mut rng, &opponent);
            assert_eq!(roll.rank(), best, "seed {seed}");
            assert!(samples.contains(&roll));
        }
    }

    #[test]
    fn test_honest_opponent_rolls_once() {
        let opponent = build_roster(&OPPONENTS)[0].clone();
        let mut rng = GameRng::new(5);
        let mut probe = rng.clone();
        probe.chance(0.0);
        probe.chance(0.0);
        let expected = DiceRoll::roll(&mut probe);
        assert_eq!(opponent_roll(&mut rng, &opponent), expected);
    }

    #[test]
    fn test_bet_validation() {
        let mut rules = DiceRules::new();
        let mut state = started(GameKind::Dice, 0, 1, &mut rules);
        assert_eq!(
            rules.input(&mut state, &InputEvent::Bet { amount: 0 }),
            Err(InputRejected::EmptyBet)
        );
        assert_eq!(
            rules.input(&mut state, &InputEvent::Bet { amount: 101 }),
            Err(InputRejected::InsufficientBalance { bet: 101, balance: 100 })
        );
        assert_eq!(
            rules.input(&mut state, &InputEvent::Bet { amount: 100 }),
            Ok(InputOutcome::Applied)
        );
        assert_eq!(
            rules.input(&mut state, &InputEvent::Bet { amount: 5 }),
            Err(InputRejected::RoundInProgress)
        );
        assert_eq!(state.health, 100, "rejections leave the purse alone");
    }

    #[test]
    fn test_press_without_bet_ignored() {
        let mut rules = DiceRules::new();
        let mut state = started(GameKind::Dice, 0, 1, &mut rules);
        tick(&mut state, &mut rules);
        assert_eq!(rules.input(&mut state, &InputEvent::Press), Ok(InputOutcome::Ignored));
    }

    #[test]
    fn test_round_settles_bet() {
        let mut rules = DiceRules::new();
        let mut state = started(GameKind::Dice, 0, 1, &mut rules);
        rules.input(&mut state, &InputEvent::Bet { amount: 10 }).unwrap();
        for _ in 0..5 {
            tick(&mut state, &mut rules);
        }
        assert_eq!(rules.input(&mut state, &InputEvent::Press), Ok(InputOutcome::Applied));
        assert_eq!(rules.rounds_played(), 1);
        assert!([90, 100, 110].contains(&state.health));
        assert_eq!(state.score, (state.health - STARTING_COINS).max(0) as i64);
        assert_eq!(
            rules.input(&mut state, &InputEvent::Bet { amount: 10 }),
            Err(InputRejected::RoundInProgress),
            "still settling"
        );
    }

    #[test]
    fn test_steal_spares_the_stake() {
        let mut rules = DiceRules::new();
        let mut state = started(GameKind::Dice, 0, 1, &mut rules);
        rules.input(&mut state, &InputEvent::Bet { amount: 100 }).unwrap();
        rules.gimmick(&mut state, Gimmick::StatSteal);
        assert_eq!(state.health, 100, "all-in purse is untouchable");

        let mut rules = DiceRules::new();
        let mut state = started(GameKind::Dice, 0, 1, &mut rules);
        rules.input(&mut state, &InputEvent::Bet { amount: 50 }).unwrap();
        rules.gimmick(&mut state, Gimmick::StatSteal);
        assert_eq!(state.health, 95);
        assert_eq!(rules.balance, 95);
    }

    #[test]
    fn test_losing_after_steal_never_goes_negative() {
        for seed in 0..50 {
            let mut rules = DiceRules::new();
            let mut state = MatchState::new(config(GameKind::Dice, 0, 1, seed));
            tick(&mut state, &mut rules);
            rules.input(&mut state, &InputEvent::Bet { amount: 100 }).unwrap();
            rules.gimmick(&mut state, Gimmick::StatSteal);
            for _ in 0..5 {
                tick(&mut state, &mut rules);
            }
            rules.input(&mut state, &InputEvent::Press).unwrap();
            assert!(state.health >= 0, "seed {seed}: purse went to {}", state.health);
        }
    }

    #[test]
    fn test_all_in_loss_ends_match() {
        let mut rules = DiceRules::new();
        let mut state = started(GameKind::Dice, 0, 1, &mut rules);
        state.health = 1;
        for _ in 0..2_000 {
            if state.result.is_some() {
                break;
            }
            if rules.bet.is_none() && rules.meter.is_idle() {
                let amount = state.health.max(1) as u32;
                rules.input(&mut state, &InputEvent::Bet { amount }).unwrap();
            }
            tick(&mut state, &mut rules);
            let _ = rules.input(&mut state, &InputEvent::Press);
        }
        assert!(state.result.is_some());
    }
}
