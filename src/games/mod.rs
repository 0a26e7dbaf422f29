//! Game rulesets
//!
//! Each mini-game is a `Ruleset` on top of the shared `sim` core. A ruleset
//! owns only its game-specific state (basket position, snake body, dice
//! wager); score, combo, health, entities and timers live in `MatchState`.

pub mod arm_wrestle;
pub mod basketball;
pub mod batting;
pub mod beach_ball;
pub mod catch;
pub mod dice;
pub mod gallery;
pub mod snake;
pub mod tunnel;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyTable;
use crate::roster::{Gimmick, Opponent, build_roster};
use crate::secs_to_ticks;
use crate::sim::{
    AttemptPhase, BoundaryPolicy, Direction, EffectKind, EndRules, InputEvent, InputOutcome, InputRejected, MatchState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Catch,
    Gallery,
    Basketball,
    Batting,
    Dice,
    Snake,
    BeachBall,
    ArmWrestle,
    Tunnel,
}

impl GameKind {
    pub const ALL: [GameKind; 9] = [
        GameKind::Catch,
        GameKind::Gallery,
        GameKind::Basketball,
        GameKind::Batting,
        GameKind::Dice,
        GameKind::Snake,
        GameKind::BeachBall,
        GameKind::ArmWrestle,
        GameKind::Tunnel,
    ];

    /// Storage namespace; keeps each game's saves apart
    pub fn namespace(&self) -> &'static str {
        match self {
            GameKind::Catch => "catch",
            GameKind::Gallery => "gallery",
            GameKind::Basketball => "basketball",
            GameKind::Batting => "batting",
            GameKind::Dice => "dice",
            GameKind::Snake => "snake",
            GameKind::BeachBall => "beach_ball",
            GameKind::ArmWrestle => "arm_wrestle",
            GameKind::Tunnel => "tunnel",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|g| g.namespace() == name)
    }

    pub fn difficulty_table(&self) -> DifficultyTable {
        match self {
            GameKind::Catch => catch::TABLE,
            GameKind::Gallery => gallery::TABLE,
            GameKind::Basketball => basketball::TABLE,
            GameKind::Batting => batting::TABLE,
            GameKind::Dice => dice::TABLE,
            GameKind::Snake => snake::TABLE,
            GameKind::BeachBall => beach_ball::TABLE,
            GameKind::ArmWrestle => arm_wrestle::TABLE,
            GameKind::Tunnel => tunnel::TABLE,
        }
    }

    pub fn end_rules(&self) -> EndRules {
        match self {
            GameKind::Catch => catch::END_RULES,
            GameKind::Gallery => gallery::END_RULES,
            GameKind::Basketball => basketball::END_RULES,
            GameKind::Batting => batting::END_RULES,
            GameKind::Dice => dice::END_RULES,
            GameKind::Snake => snake::END_RULES,
            GameKind::BeachBall => beach_ball::END_RULES,
            GameKind::ArmWrestle => arm_wrestle::END_RULES,
            GameKind::Tunnel => tunnel::END_RULES,
        }
    }

    pub fn roster(&self) -> Vec<Opponent> {
        let names = match self {
            GameKind::Catch => &catch::OPPONENTS,
            GameKind::Gallery => &gallery::OPPONENTS,
            GameKind::Basketball => &basketball::OPPONENTS,
            GameKind::Batting => &batting::OPPONENTS,
            GameKind::Dice => &dice::OPPONENTS,
            GameKind::Snake => &snake::OPPONENTS,
            GameKind::BeachBall => &beach_ball::OPPONENTS,
            GameKind::ArmWrestle => &arm_wrestle::OPPONENTS,
            GameKind::Tunnel => &tunnel::OPPONENTS,
        };
        build_roster(names)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Game-specific logic driven by the session tick
pub trait Ruleset: fmt::Debug + Send {
    /// Called once when the countdown ends
    fn begin(&mut self, state: &mut MatchState);

    /// Called every active tick after entities have moved
    fn tick(&mut self, state: &mut MatchState);

    /// Called for each input while the match is active and the player is not stunned
    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected>;

    /// Opponent gimmick fired
    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        apply_default_gimmick(state, gimmick);
    }

    /// Game-specific view for the snapshot
    fn detail(&self) -> GameDetail;
}

pub fn ruleset_for(game: GameKind) -> Box<dyn Ruleset> {
    match game {
        GameKind::Catch => Box::new(catch::CatchRules::new()),
        GameKind::Gallery => Box::new(gallery::GalleryRules::new()),
        GameKind::Basketball => Box::new(basketball::BasketballRules::new()),
        GameKind::Batting => Box::new(batting::BattingRules::new()),
        GameKind::Dice => Box::new(dice::DiceRules::new()),
        GameKind::Snake => Box::new(snake::SnakeRules::new()),
        GameKind::BeachBall => Box::new(beach_ball::BeachBallRules::new()),
        GameKind::ArmWrestle => Box::new(arm_wrestle::ArmWrestleRules::new()),
        GameKind::Tunnel => Box::new(tunnel::TunnelRules::new()),
    }
}

pub const DIM_SECS: f32 = 1.5;
pub const REVERSE_SECS: f32 = 3.0;
pub const SURGE_SECS: f32 = 2.0;
pub const FLASH_SECS: f32 = 0.3;
pub const STEAL_FRACTION: f32 = 0.1;

/// Generic gimmick handling shared by most games
pub fn apply_default_gimmick(state: &mut MatchState, gimmick: Gimmick) {
    let hz = state.tick_hz;
    match gimmick {
        Gimmick::Dim => state.schedule_effect(EffectKind::Dim, secs_to_ticks(DIM_SECS, hz)),
        Gimmick::Swerve => {
            for entity in state.entities.iter_mut() {
                entity.vel.x = -entity.vel.x;
            }
        }
        Gimmick::Stun => state.schedule_effect(EffectKind::Stun, secs_to_ticks(crate::consts::STUN_SECS, hz)),
        Gimmick::ReverseControls => state.schedule_effect(EffectKind::ReverseControls, secs_to_ticks(REVERSE_SECS, hz)),
        Gimmick::StatSteal => {
            let stolen = state.steal_score(STEAL_FRACTION);
            log::debug!("Session {}: opponent stole {} points", state.session, stolen);
            state.schedule_effect(EffectKind::Flash, secs_to_ticks(FLASH_SECS, hz));
        }
        Gimmick::Speedup => state.schedule_effect(EffectKind::Surge, secs_to_ticks(SURGE_SECS, hz)),
    }
}

/// Per-game extras for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameDetail {
    Catch {
        basket_x: f32,
        basket_half_width: f32,
    },
    Gallery {
        shots: u32,
        hits: u32,
        boss_hp: Option<u8>,
    },
    Meter {
        phase: AttemptPhase,
        value: f32,
        target: f32,
        window: f32,
        attempts: u32,
        attempts_left: Option<u32>,
    },
    Dice {
        phase: AttemptPhase,
        balance: i64,
        bet: Option<u32>,
        tumbling: [u8; 3],
        player: Option<[u8; 3]>,
        opponent: Option<[u8; 3]>,
        round: u32,
        rounds_left: u32,
    },
    Snake {
        cols: i32,
        rows: i32,
        body: Vec<(i32, i32)>,
        heading: Direction,
        walls: BoundaryPolicy,
    },
    BeachBall {
        walls: BoundaryPolicy,
        touches: u32,
        ball: Option<Vec2>,
    },
    ArmWrestle {
        position: f32,
        stamina: f32,
        taps: u32,
    },
    Tunnel {
        lane: u8,
        lanes: u8,
        distance: f32,
    },
}
