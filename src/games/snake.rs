//! Snake
//!
//! Grid game on a 20x20 board. Apples grow the snake and score; golden
//! apples are worth more but vanish; poison shrinks the snake and breaks
//! the streak. Gentle opponents let the snake wrap around the edges, the
//! rest make the walls deadly. Crashing ends the run.

use std::collections::VecDeque;

use glam::Vec2;

use super::{GameDetail, Ruleset, apply_default_gimmick};
use crate::consts::MAX_SPAWN_ATTEMPTS;
use crate::difficulty::{Curve, DifficultyTable, TargetFormula};
use crate::roster::Gimmick;
use crate::secs_to_ticks;
use crate::sim::{
    BoundaryPolicy, Bounds, Direction, EndRules, EntityId, EntityKind, InputEvent, InputOutcome, InputRejected,
    Interaction, KindRule, MatchState, Motion, SpawnTimer, resolve_contact,
};

pub const OPPONENTS: [&str; 10] = [
    "Garden Worm",
    "Grass Snake",
    "Slinky",
    "Copperhead",
    "Sidewinder",
    "Mamba",
    "Cobra Queen",
    "Python Pete",
    "Basilisk",
    "Ouroboros",
];

/// `speed` is cells per second, `opponent_power` the poison share of bonus
/// spawns, `tolerance` the golden apple lifetime in seconds.
pub const TABLE: DifficultyTable = DifficultyTable {
    opponent_step: 0.06,
    level_step: 0.035,
    ramp_per_sec: 0.001,
    spawn_rate: Curve::new(0.1, 0.3),
    speed: Curve::new(6.0, 14.0),
    opponent_power: Curve::new(0.1, 0.35),
    tolerance: Curve::new(6.0, 3.0),
    player_power: Curve::new(1.0, 1.0),
    target: TargetFormula {
        base: 100,
        per_level: 15,
        per_opponent: 20,
    },
    uses_flow: false,
};

pub const END_RULES: EndRules = EndRules {
    time_limit_secs: None,
    health: Some(1),
    win_on_target: true,
};

pub const COLS: i32 = 20;
pub const ROWS: i32 = 20;
/// Opponents from this index on make the walls deadly
pub const DEADLY_WALLS_FROM: usize = 5;
const START_LENGTH: usize = 3;
const POISON_SHRINK: usize = 2;
const MIN_LENGTH: usize = 2;
const POISON_SECS: f32 = 8.0;

pub type Cell = (i32, i32);

fn kind_rule(kind: EntityKind) -> KindRule {
    match kind {
        EntityKind::Apple => KindRule::good(10),
        EntityKind::GoldenApple => KindRule::good(30),
        EntityKind::Poison => KindRule::hazard(0),
        _ => KindRule::good(0),
    }
}

pub fn wall_policy(opponent: usize) -> BoundaryPolicy {
    if opponent < DEADLY_WALLS_FROM {
        BoundaryPolicy::Wrap
    } else {
        BoundaryPolicy::Miss
    }
}

fn cell_pos(cell: Cell) -> Vec2 {
    Vec2::new(cell.0 as f32, cell.1 as f32)
}

#[derive(Debug, Clone)]
pub struct SnakeRules {
    body: VecDeque<Cell>,
    heading: Direction,
    queued: Direction,
    walls: BoundaryPolicy,
    grow: usize,
    stepper: SpawnTimer,
    bonus: SpawnTimer,
}

impl SnakeRules {
    pub fn new() -> Self {
        Self {
            body: VecDeque::new(),
            heading: Direction::Right,
            queued: Direction::Right,
            walls: BoundaryPolicy::Wrap,
            grow: 0,
            stepper: SpawnTimer::default(),
            bonus: SpawnTimer::default(),
        }
    }

    pub fn body(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn occupied_by_body(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Place food on a free cell. Gives up quietly after a bounded number
    /// of tries when the board is crowded.
    pub fn spawn_food(&self, state: &mut MatchState, kind: EntityKind) -> Option<EntityId> {
        let taken: Vec<Vec2> = state.entities.iter().map(|e| e.pos).collect();
        let cell = state.rng.sample_until(
            MAX_SPAWN_ATTEMPTS,
            |rng| (rng.int(0, COLS - 1), rng.int(0, ROWS - 1)),
            |cell| !self.occupied_by_body(*cell) && !taken.contains(&cell_pos(*cell)),
        );
        let Some(cell) = cell else {
            log::debug!("Session {}: no free cell for {:?}", state.session, kind);
            return None;
        };
        let mut food = state.entities.build(kind, cell_pos(cell), Vec2::ZERO, Motion::Static, 0.5);
        match kind {
            EntityKind::GoldenApple => food = food.with_ttl(secs_to_ticks(state.params.tolerance, state.tick_hz)),
            EntityKind::Poison => food = food.with_ttl(secs_to_ticks(POISON_SECS, state.tick_hz)),
            _ => {}
        }
        state.entities.insert(food)
    }

    /// Next head cell, or `None` if the snake would leave a deadly board
    fn advance(&self, head: Cell) -> Option<Cell> {
        let (dx, dy) = self.heading.delta();
        let (x, y) = (head.0 + dx, head.1 + dy);
        match self.walls {
            BoundaryPolicy::Wrap => Some((x.rem_euclid(COLS), y.rem_euclid(ROWS))),
            _ if (0..COLS).contains(&x) && (0..ROWS).contains(&y) => Some((x, y)),
            _ => None,
        }
    }

    fn crash(&self, state: &mut MatchState) {
        log::debug!("Session {}: snake crashed at length {}", state.session, self.body.len());
        state.apply(&Interaction::miss(state.health.max(1)));
    }

    /// Move one cell. Returns false when the snake crashed.
    fn step(&mut self, state: &mut MatchState) -> bool {
        self.heading = self.queued;
        let Some(head) = self.head() else {
            return false;
        };
        let Some(next) = self.advance(head) else {
            self.crash(state);
            return false;
        };

        // The tail moves out of the way unless the snake is growing
        let tail_moves = self.grow == 0;
        let hits_body = self
            .body
            .iter()
            .enumerate()
            .any(|(i, &c)| c == next && !(tail_moves && i == self.body.len() - 1));
        if hits_body {
            self.crash(state);
            return false;
        }

        self.body.push_front(next);
        if self.grow > 0 {
            self.grow -= 1;
        } else {
            self.body.pop_back();
        }

        let eaten: Vec<EntityId> = state
            .entities
            .iter_active()
            .filter(|e| e.pos == cell_pos(next))
            .map(|e| e.id)
            .collect();
        for id in eaten {
            let Some(kind) = state.entities.get(id).map(|e| e.kind) else {
                continue;
            };
            let interaction = resolve_contact(&mut state.entities, id, state.combo, kind_rule);
            state.apply(&interaction);
            match kind {
                EntityKind::Apple => self.grow += 1,
                EntityKind::GoldenApple => self.grow += 2,
                EntityKind::Poison => {
                    for _ in 0..POISON_SHRINK {
                        if self.body.len() > MIN_LENGTH {
                            self.body.pop_back();
                        }
                    }
                }
                _ => {}
            }
        }
        true
    }
}

impl Default for SnakeRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Ruleset for SnakeRules {
    fn begin(&mut self, state: &mut MatchState) {
        *self = Self::new();
        self.walls = wall_policy(state.opponent.index);
        let mid = (COLS / 2, ROWS / 2);
        self.body = (0..START_LENGTH as i32).map(|i| (mid.0 - i, mid.1)).collect();
        self.spawn_food(state, EntityKind::Apple);
    }

    fn tick(&mut self, state: &mut MatchState) {
        let dt = state.dt();

        for _ in 0..self.stepper.due(state.params.speed, dt) {
            if !self.step(state) {
                return;
            }
        }

        if state.entities.count_kind(EntityKind::Apple) == 0 {
            self.spawn_food(state, EntityKind::Apple);
        }
        for _ in 0..self.bonus.due(state.params.spawn_rate, dt) {
            let poison = state.params.opponent_power.clamp(0.0, 1.0);
            let kind = state
                .rng
                .weighted_pick(&[(EntityKind::GoldenApple, 1.0 - poison), (EntityKind::Poison, poison)])
                .unwrap_or(EntityKind::GoldenApple);
            self.spawn_food(state, kind);
        }

        let board = Bounds::new(Vec2::ZERO, Vec2::new((COLS - 1) as f32, (ROWS - 1) as f32));
        for gone in state.entities.remove_expired(&board, 0.0) {
            let interaction = Interaction::escaped(&gone, &kind_rule(gone.kind), 0);
            state.apply(&interaction);
        }
    }

    fn input(&mut self, state: &mut MatchState, event: &InputEvent) -> Result<InputOutcome, InputRejected> {
        let InputEvent::Direction(dir) = event else {
            return Ok(InputOutcome::Ignored);
        };
        let dir = state.steer_direction(*dir);
        if dir == self.heading.opposite() {
            return Ok(InputOutcome::Ignored);
        }
        self.queued = dir;
        Ok(InputOutcome::Applied)
    }

    fn gimmick(&mut self, state: &mut MatchState, gimmick: Gimmick) {
        match gimmick {
            // Food hops to a new cell
            Gimmick::Swerve => {
                let food: Vec<(EntityId, EntityKind)> = state.entities.iter().map(|e| (e.id, e.kind)).collect();
                for (id, kind) in food {
                    state.entities.remove(id);
                    self.spawn_food(state, kind);
                }
            }
            other => apply_default_gimmick(state, other),
        }
    }

    fn detail(&self) -> GameDetail {
        GameDetail::Snake {
            cols: COLS,
            rows: ROWS,
            body: self.body.iter().copied().collect(),
            heading: self.heading,
            walls: self.walls,
        }
    }
}
