//! Autoplay bot
//!
//! Reads a `Snapshot` and picks at most one input per tick. Used by the
//! headless simulator and by tests that need a match to run to completion.
//! `skill` in 0..1 sets how close to perfect the bot waits before
//! committing to timed actions.

use glam::Vec2;

use crate::games::GameDetail;
use crate::games::tunnel::{PLAYER_Y, lane_at};
use crate::rng::GameRng;
use crate::sim::{AttemptPhase, BoundaryPolicy, Direction, EntityKind, InputEvent, MatchPhase, Snapshot, quality};

/// Ticks between gallery shots
const SHOT_COOLDOWN: u32 = 8;
/// How far ahead the tunnel bot looks for barriers
const LOOKAHEAD: f32 = 35.0;

#[derive(Debug, Clone)]
pub struct Autoplay {
    skill: f32,
    rng: GameRng,
    cooldown: u32,
}

impl Autoplay {
    pub fn new(skill: f32, seed: u64) -> Self {
        Self {
            skill: skill.clamp(0.0, 1.0),
            rng: GameRng::new(seed),
            cooldown: 0,
        }
    }

    pub fn skill(&self) -> f32 {
        self.skill
    }

    /// Input for this tick, if any
    pub fn choose(&mut self, snapshot: &Snapshot) -> Option<InputEvent> {
        if snapshot.phase != MatchPhase::Active {
            return None;
        }
        self.cooldown = self.cooldown.saturating_sub(1);

        match &snapshot.detail {
            GameDetail::Catch { basket_x, .. } => self.catch(snapshot, *basket_x),
            GameDetail::Gallery { .. } => self.gallery(snapshot),
            GameDetail::Meter {
                phase,
                value,
                target,
                window,
                ..
            } => {
                let ready = *phase == AttemptPhase::Committing && quality(*target, *value, *window) >= self.skill;
                ready.then_some(InputEvent::Press)
            }
            GameDetail::Dice {
                phase, balance, bet, ..
            } => match (phase, bet) {
                (AttemptPhase::Idle, None) if *balance > 0 => Some(InputEvent::Bet {
                    amount: (*balance / 10).max(1) as u32,
                }),
                (AttemptPhase::Committing, Some(_)) => Some(InputEvent::Press),
                _ => None,
            },
            GameDetail::Snake {
                cols,
                rows,
                body,
                heading,
                walls,
            } => self.snake(snapshot, *cols, *rows, body, *heading, *walls),
            GameDetail::BeachBall { .. } => {
                let ball = snapshot.entities.iter().find(|e| e.kind == EntityKind::Ball)?;
                let falling = ball.vel.y > 0.0 && ball.pos.y > 55.0;
                falling.then(|| InputEvent::Tap {
                    pos: ball.pos + self.jitter(2.0),
                })
            }
            GameDetail::ArmWrestle { .. } => Some(InputEvent::Press),
            GameDetail::Tunnel { lane, lanes, .. } => self.tunnel(snapshot, *lane, *lanes),
        }
    }

    fn jitter(&mut self, amount: f32) -> Vec2 {
        let spread = amount * (1.0 - self.skill);
        Vec2::new(self.rng.range(-spread, spread), self.rng.range(-spread, spread))
    }

    fn catch(&mut self, snapshot: &Snapshot, basket_x: f32) -> Option<InputEvent> {
        // Lowest good item first; it lands soonest
        let goal = snapshot
            .entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Honey | EntityKind::Golden))
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))?;
        let x = goal.pos.x;
        ((x - basket_x).abs() > 0.5).then_some(InputEvent::Steer { x })
    }

    fn gallery(&mut self, snapshot: &Snapshot) -> Option<InputEvent> {
        if self.cooldown > 0 {
            return None;
        }
        let target = snapshot
            .entities
            .iter()
            .filter(|e| e.kind != EntityKind::Ladybug && e.pos.x > 0.0 && e.pos.x < 100.0)
            .max_by_key(|e| e.age_ticks)?;
        self.cooldown = SHOT_COOLDOWN;
        Some(InputEvent::Tap {
            pos: target.pos + self.jitter(3.0),
        })
    }

    fn snake(
        &mut self,
        snapshot: &Snapshot,
        cols: i32,
        rows: i32,
        body: &[(i32, i32)],
        heading: Direction,
        walls: BoundaryPolicy,
    ) -> Option<InputEvent> {
        let &(hx, hy) = body.first()?;
        let food = snapshot
            .entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Apple | EntityKind::GoldenApple))
            .min_by_key(|e| (e.pos.x as i32 - hx).abs() + (e.pos.y as i32 - hy).abs())
            .map(|e| (e.pos.x as i32, e.pos.y as i32));
        let deadly_walls = walls == BoundaryPolicy::Miss;

        let safe = |dir: Direction| {
            let (dx, dy) = dir.delta();
            let (mut x, mut y) = (hx + dx, hy + dy);
            if deadly_walls {
                if !(0..cols).contains(&x) || !(0..rows).contains(&y) {
                    return None;
                }
            } else {
                x = x.rem_euclid(cols);
                y = y.rem_euclid(rows);
            }
            // The tail moves out of the way this step
            let blocked = body[..body.len().saturating_sub(1)].contains(&(x, y));
            (!blocked).then_some((x, y))
        };

        let mut options: Vec<(Direction, i32)> = [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
            .into_iter()
            .filter(|d| *d != heading.opposite())
            .filter_map(|d| {
                let (x, y) = safe(d)?;
                let cost = food.map_or(0, |(fx, fy)| (fx - x).abs() + (fy - y).abs());
                Some((d, cost))
            })
            .collect();
        // Prefer keeping the heading on ties
        options.sort_by_key(|(d, cost)| (*cost, *d != heading));

        let (best, _) = options.first().copied()?;
        (best != heading).then_some(InputEvent::Direction(best))
    }

    fn tunnel(&mut self, snapshot: &Snapshot, lane: u8, lanes: u8) -> Option<InputEvent> {
        let blocked = |l: u8| {
            snapshot.entities.iter().any(|e| {
                e.kind == EntityKind::Barrier && lane_at(e.pos.x) == l && e.pos.y < PLAYER_Y && e.pos.y > PLAYER_Y - LOOKAHEAD
            })
        };
        if !blocked(lane) {
            return None;
        }
        let left = lane.checked_sub(1).filter(|l| !blocked(*l));
        let right = (lane + 1 < lanes).then_some(lane + 1).filter(|l| !blocked(*l));
        match (left, right) {
            (Some(_), _) => Some(InputEvent::Direction(Direction::Left)),
            (None, Some(_)) => Some(InputEvent::Direction(Direction::Right)),
            (None, None) => None,
        }
    }
}
