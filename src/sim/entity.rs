//! Transient entities and the per-session entity store
//!
//! Entities are small: a kind tag, position/velocity, a motion pattern,
//! optional lifetime and hit points. The store keeps them in spawn order
//! (ids are monotonically increasing) so iteration is stable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Entity identifier. Embeds the owning session so an id can never be
/// confused with one from an earlier match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub session: u32,
    pub serial: u32,
}

/// Every kind of entity any game spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    // Catch
    Honey,
    Golden,
    Bee,
    Rock,
    // Gallery
    Fly,
    Roach,
    ElectricFly,
    BossBug,
    Ladybug,
    // Beach ball
    Ball,
    // Snake
    Apple,
    GoldenApple,
    Poison,
    // Tunnel
    Barrier,
    Coin,
}

/// How an entity moves each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Not moved by the store (grid items, externally driven objects)
    Static,
    /// Straight line along velocity
    Linear,
    /// Linear drift plus a sinusoidal sideways offset
    Wave { amplitude: f32, frequency: f32, anchor_x: f32 },
    /// Horizontal velocity flips every `interval_ticks`
    Zigzag { interval_ticks: u32 },
    /// Circles around `center`
    Orbit { center: Vec2, radius: f32, angular_speed: f32, angle: f32 },
    /// Heads toward `target` at `speed`
    Seek { target: Vec2, speed: f32 },
    /// Linear plus constant downward acceleration
    Ballistic { gravity: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub motion: Motion,
    pub hp: u8,
    pub max_hp: u8,
    /// Ticks since the entity became active
    pub age_ticks: u32,
    /// Remaining lifetime; `None` lives until removed
    pub ttl_ticks: Option<u32>,
    /// Formation stagger: the entity is inert until this reaches zero
    pub delay_ticks: u32,
}

impl Entity {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.delay_ticks == 0
    }

    pub fn is_expired(&self) -> bool {
        self.ttl_ticks == Some(0)
    }

    pub fn with_hp(mut self, hp: u8) -> Self {
        self.hp = hp.max(1);
        self.max_hp = self.hp;
        self
    }

    pub fn with_ttl(mut self, ticks: u32) -> Self {
        self.ttl_ticks = Some(ticks);
        self
    }

    pub fn with_delay(mut self, ticks: u32) -> Self {
        self.delay_ticks = ticks;
        self
    }

    fn advance(&mut self, dt: f32) {
        let age_secs = self.age_ticks as f32 * dt;
        match &mut self.motion {
            Motion::Static => {}
            Motion::Linear => self.pos += self.vel * dt,
            Motion::Wave {
                amplitude,
                frequency,
                anchor_x,
            } => {
                *anchor_x += self.vel.x * dt;
                self.pos.y += self.vel.y * dt;
                self.pos.x = *anchor_x + *amplitude * (std::f32::consts::TAU * *frequency * age_secs).sin();
            }
            Motion::Zigzag { interval_ticks } => {
                if *interval_ticks > 0 && self.age_ticks > 0 && self.age_ticks % *interval_ticks == 0 {
                    self.vel.x = -self.vel.x;
                }
                self.pos += self.vel * dt;
            }
            Motion::Orbit {
                center,
                radius,
                angular_speed,
                angle,
            } => {
                *angle += *angular_speed * dt;
                self.pos = *center + Vec2::new(angle.cos(), angle.sin()) * *radius;
            }
            Motion::Seek { target, speed } => {
                let to_target = *target - self.pos;
                let step = *speed * dt;
                if to_target.length() <= step {
                    self.pos = *target;
                    self.vel = Vec2::ZERO;
                } else {
                    self.vel = to_target.normalize() * *speed;
                    self.pos += self.vel * dt;
                }
            }
            Motion::Ballistic { gravity } => {
                self.vel.y += *gravity * dt;
                self.pos += self.vel * dt;
            }
        }
    }
}

/// Axis-aligned play bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// The standard percentage play field
    pub fn field() -> Self {
        Self::new(
            Vec2::ZERO,
            Vec2::new(crate::consts::FIELD_WIDTH, crate::consts::FIELD_HEIGHT),
        )
    }

    /// True if `pos` lies inside the bounds grown by `margin` on every side
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= self.min.x - margin
            && pos.x <= self.max.x + margin
            && pos.y >= self.min.y - margin
            && pos.y <= self.max.y + margin
    }
}

/// What happens when something reaches a side of the play field.
/// Chosen per game, sometimes per opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Reflect off the edge
    Bounce,
    /// Re-enter from the opposite edge
    Wrap,
    /// Leaving counts as a miss
    Miss,
}

/// Formation templates for fan-out spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formation {
    /// Five abreast
    Line,
    /// Rows of 1, 2 and 3
    Triangle,
    /// Two by two
    Square,
}

impl Formation {
    pub const ALL: [Formation; 3] = [Formation::Line, Formation::Triangle, Formation::Square];

    /// Member offsets from the formation anchor, `spacing` apart
    pub fn offsets(&self, spacing: f32) -> Vec<Vec2> {
        match self {
            Formation::Line => (0..5).map(|i| Vec2::new((i as f32 - 2.0) * spacing, 0.0)).collect(),
            Formation::Triangle => {
                let mut offsets = Vec::with_capacity(6);
                for row in 0..3 {
                    let count = row + 1;
                    for col in 0..count {
                        let x = (col as f32 - (count - 1) as f32 / 2.0) * spacing;
                        offsets.push(Vec2::new(x, row as f32 * spacing));
                    }
                }
                offsets
            }
            Formation::Square => vec![
                Vec2::new(-spacing / 2.0, 0.0),
                Vec2::new(spacing / 2.0, 0.0),
                Vec2::new(-spacing / 2.0, spacing),
                Vec2::new(spacing / 2.0, spacing),
            ],
        }
    }
}

/// Result of damaging an entity
#[derive(Debug, Clone)]
pub enum Damage {
    /// Entity survived with this many hit points
    Survived(u8),
    /// Entity reached zero and was removed
    Destroyed(Entity),
    /// No such entity
    Missing,
}

/// Session-owned collection of live entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    session: u32,
    next_serial: u32,
    capacity: usize,
    entities: Vec<Entity>,
}

impl EntityStore {
    pub fn new(session: u32, capacity: usize) -> Self {
        Self {
            session,
            next_serial: 1,
            capacity,
            entities: Vec::new(),
        }
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    fn next_id(&mut self) -> EntityId {
        let id = EntityId {
            session: self.session,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        id
    }

    /// Build an entity without inserting it; finish with `insert`
    pub fn build(&mut self, kind: EntityKind, pos: Vec2, vel: Vec2, motion: Motion, radius: f32) -> Entity {
        Entity {
            id: self.next_id(),
            kind,
            pos,
            vel,
            radius,
            motion,
            hp: 1,
            max_hp: 1,
            age_ticks: 0,
            ttl_ticks: None,
            delay_ticks: 0,
        }
    }

    /// Insert a built entity. Returns `None` (and drops it) when the store is full.
    pub fn insert(&mut self, entity: Entity) -> Option<EntityId> {
        if self.entities.len() >= self.capacity {
            log::debug!("Entity store full ({}), dropping {:?}", self.capacity, entity.kind);
            return None;
        }
        let id = entity.id;
        self.entities.push(entity);
        Some(id)
    }

    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2, vel: Vec2, motion: Motion, radius: f32) -> Option<EntityId> {
        let entity = self.build(kind, pos, vel, motion, radius);
        self.insert(entity)
    }

    /// Fan one template out into a formation. Member `i` waits
    /// `i * stagger_ticks` before it becomes active.
    pub fn spawn_formation(
        &mut self,
        template: &Entity,
        formation: Formation,
        spacing: f32,
        stagger_ticks: u32,
    ) -> Vec<EntityId> {
        let mut ids = Vec::new();
        for (i, offset) in formation.offsets(spacing).into_iter().enumerate() {
            let mut member = template.clone();
            member.id = self.next_id();
            member.pos += offset;
            if let Motion::Wave { anchor_x, .. } = &mut member.motion {
                *anchor_x += offset.x;
            }
            member.delay_ticks = template.delay_ticks + i as u32 * stagger_ticks;
            match self.insert(member) {
                Some(id) => ids.push(id),
                None => break,
            }
        }
        log::debug!("Spawned {:?} formation of {} {:?}", formation, ids.len(), template.kind);
        ids
    }

    /// Advance every entity by one tick. Staggered entities only count
    /// down their delay.
    pub fn tick(&mut self, dt: f32) {
        for entity in &mut self.entities {
            if entity.delay_ticks > 0 {
                entity.delay_ticks -= 1;
                continue;
            }
            entity.advance(dt);
            entity.age_ticks += 1;
            if let Some(ttl) = entity.ttl_ticks.as_mut() {
                *ttl = ttl.saturating_sub(1);
            }
        }
    }

    /// Drop entities whose lifetime ran out or that left `bounds`
    /// (grown by `margin`). Returns the removed entities in spawn order.
    pub fn remove_expired(&mut self, bounds: &Bounds, margin: f32) -> Vec<Entity> {
        let mut removed = Vec::new();
        self.entities.retain(|e| {
            let gone = e.is_active() && (e.is_expired() || !bounds.contains(e.pos, margin + e.radius));
            if gone {
                removed.push(e.clone());
            }
            !gone
        });
        removed
    }

    /// Remove entities matching `predicate`, returning them
    pub fn remove_where<F: Fn(&Entity) -> bool>(&mut self, predicate: F) -> Vec<Entity> {
        let mut removed = Vec::new();
        self.entities.retain(|e| {
            if predicate(e) {
                removed.push(e.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    /// Active entities within `radius` of `point`, nearest first
    pub fn query_near(&self, point: Vec2, radius: f32) -> Vec<&Entity> {
        let mut hits: Vec<&Entity> = self
            .iter_active()
            .filter(|e| e.pos.distance(point) <= radius)
            .collect();
        hits.sort_by(|a, b| {
            a.pos
                .distance_squared(point)
                .partial_cmp(&b.pos.distance_squared(point))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }

    /// Nearest active entity whose own radius (scaled) covers `point`
    pub fn nearest_hit(&self, point: Vec2, radius_scale: f32) -> Option<&Entity> {
        self.iter_active()
            .filter(|e| e.pos.distance(point) <= e.radius * radius_scale)
            .min_by(|a, b| {
                a.pos
                    .distance_squared(point)
                    .partial_cmp(&b.pos.distance_squared(point))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Decrement hit points; remove at zero
    pub fn damage(&mut self, id: EntityId, amount: u8) -> Damage {
        let Some(idx) = self.entities.iter().position(|e| e.id == id) else {
            return Damage::Missing;
        };
        let entity = &mut self.entities[idx];
        entity.hp = entity.hp.saturating_sub(amount);
        if entity.hp == 0 {
            Damage::Destroyed(self.entities.remove(idx))
        } else {
            Damage::Survived(entity.hp)
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_active())
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Converts a spawn rate into whole spawns per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    accumulator: f32,
}

impl SpawnTimer {
    /// Accumulate `rate * dt` and return how many spawns are due
    pub fn due(&mut self, rate: f32, dt: f32) -> u32 {
        self.accumulator += rate.max(0.0) * dt;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as u32
    }

    /// Force the next `due` call to fire
    pub fn prime(&mut self) {
        self.accumulator = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn store() -> EntityStore {
        EntityStore::new(1, 64)
    }

    #[test]
    fn test_linear_motion() {
        let mut store = store();
        let id = store
            .spawn(EntityKind::Fly, Vec2::new(10.0, 10.0), Vec2::new(60.0, 0.0), Motion::Linear, 3.0)
            .unwrap();
        for _ in 0..60 {
            store.tick(DT);
        }
        let e = store.get(id).unwrap();
        assert!((e.pos.x - 70.0).abs() < 0.01);
        assert_eq!(e.age_ticks, 60);
    }

    #[test]
    fn test_zigzag_flips() {
        let mut store = store();
        let id = store
            .spawn(
                EntityKind::Roach,
                Vec2::new(50.0, 50.0),
                Vec2::new(30.0, 0.0),
                Motion::Zigzag { interval_ticks: 10 },
                3.0,
            )
            .unwrap();
        for _ in 0..11 {
            store.tick(DT);
        }
        assert!(store.get(id).unwrap().vel.x < 0.0);
    }

    #[test]
    fn test_wave_stays_near_anchor() {
        let mut store = store();
        let id = store
            .spawn(
                EntityKind::Bee,
                Vec2::new(50.0, 0.0),
                Vec2::new(0.0, 20.0),
                Motion::Wave {
                    amplitude: 5.0,
                    frequency: 1.0,
                    anchor_x: 50.0,
                },
                3.0,
            )
            .unwrap();
        for _ in 0..90 {
            store.tick(DT);
            let e = store.get(id).unwrap();
            assert!((e.pos.x - 50.0).abs() <= 5.0 + 1e-3);
        }
        assert!(store.get(id).unwrap().pos.y > 25.0);
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let mut store = store();
        let center = Vec2::new(50.0, 50.0);
        let id = store
            .spawn(
                EntityKind::Fly,
                center + Vec2::new(10.0, 0.0),
                Vec2::ZERO,
                Motion::Orbit {
                    center,
                    radius: 10.0,
                    angular_speed: 2.0,
                    angle: 0.0,
                },
                3.0,
            )
            .unwrap();
        for _ in 0..45 {
            store.tick(DT);
        }
        assert!((store.get(id).unwrap().pos.distance(center) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_seek_arrives() {
        let mut store = store();
        let target = Vec2::new(20.0, 0.0);
        let id = store
            .spawn(
                EntityKind::Fly,
                Vec2::ZERO,
                Vec2::ZERO,
                Motion::Seek { target, speed: 60.0 },
                3.0,
            )
            .unwrap();
        for _ in 0..30 {
            store.tick(DT);
        }
        assert_eq!(store.get(id).unwrap().pos, target);
    }

    #[test]
    fn test_remove_expired_by_ttl_and_bounds() {
        let mut store = store();
        let short = store.build(EntityKind::Fly, Vec2::new(50.0, 50.0), Vec2::ZERO, Motion::Linear, 2.0);
        let short = store.insert(short.with_ttl(2)).unwrap();
        let outside = store
            .spawn(EntityKind::Rock, Vec2::new(50.0, 99.0), Vec2::new(0.0, 600.0), Motion::Linear, 2.0)
            .unwrap();
        let stays = store
            .spawn(EntityKind::Honey, Vec2::new(50.0, 10.0), Vec2::ZERO, Motion::Linear, 2.0)
            .unwrap();

        store.tick(DT);
        store.tick(DT);
        let removed: Vec<EntityId> = store
            .remove_expired(&Bounds::field(), 0.0)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert!(removed.contains(&short));
        assert!(removed.contains(&outside));
        assert!(store.get(stays).is_some());
    }

    #[test]
    fn test_boss_hp_counts_down() {
        let mut store = store();
        let boss = store.build(EntityKind::BossBug, Vec2::new(50.0, 50.0), Vec2::ZERO, Motion::Static, 8.0);
        let id = store.insert(boss.with_hp(3)).unwrap();
        assert!(matches!(store.damage(id, 1), Damage::Survived(2)));
        assert!(matches!(store.damage(id, 1), Damage::Survived(1)));
        assert!(matches!(store.damage(id, 1), Damage::Destroyed(_)));
        assert!(store.get(id).is_none());
        assert!(matches!(store.damage(id, 1), Damage::Missing));
    }

    #[test]
    fn test_formation_staggers_members() {
        let mut store = store();
        let template = store.build(EntityKind::Fly, Vec2::new(50.0, 20.0), Vec2::ZERO, Motion::Linear, 3.0);
        let ids = store.spawn_formation(&template, Formation::Triangle, 6.0, 5);
        assert_eq!(ids.len(), 6);
        let delays: Vec<u32> = ids.iter().map(|id| store.get(*id).unwrap().delay_ticks).collect();
        assert_eq!(delays, vec![0, 5, 10, 15, 20, 25]);

        // Staggered members are not queryable until their delay elapses
        assert_eq!(store.iter_active().count(), 1);
        for _ in 0..5 {
            store.tick(DT);
        }
        assert_eq!(store.iter_active().count(), 2);
    }

    #[test]
    fn test_formation_shapes() {
        assert_eq!(Formation::Line.offsets(4.0).len(), 5);
        assert_eq!(Formation::Triangle.offsets(4.0).len(), 6);
        assert_eq!(Formation::Square.offsets(4.0).len(), 4);
    }

    #[test]
    fn test_capacity_bound() {
        let mut store = EntityStore::new(1, 2);
        assert!(store.spawn(EntityKind::Fly, Vec2::ZERO, Vec2::ZERO, Motion::Static, 1.0).is_some());
        assert!(store.spawn(EntityKind::Fly, Vec2::ZERO, Vec2::ZERO, Motion::Static, 1.0).is_some());
        assert!(store.spawn(EntityKind::Fly, Vec2::ZERO, Vec2::ZERO, Motion::Static, 1.0).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_query_near_sorted() {
        let mut store = store();
        let far = store
            .spawn(EntityKind::Fly, Vec2::new(8.0, 0.0), Vec2::ZERO, Motion::Static, 1.0)
            .unwrap();
        let near = store
            .spawn(EntityKind::Fly, Vec2::new(2.0, 0.0), Vec2::ZERO, Motion::Static, 1.0)
            .unwrap();
        store
            .spawn(EntityKind::Fly, Vec2::new(30.0, 0.0), Vec2::ZERO, Motion::Static, 1.0)
            .unwrap();
        let hits: Vec<EntityId> = store.query_near(Vec2::ZERO, 10.0).iter().map(|e| e.id).collect();
        assert_eq!(hits, vec![near, far]);
    }

    #[test]
    fn test_spawn_timer() {
        let mut timer = SpawnTimer::default();
        let total: u32 = (0..120).map(|_| timer.due(2.0, DT)).sum();
        assert!((3..=4).contains(&total));
    }
}
