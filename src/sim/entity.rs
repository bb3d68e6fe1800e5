//! Entities and their per-tick motion
//!
//! Every thing in the world is an [`Entity`]: a bounding square at a
//! position plus an [`EntityKind`] carrying the variant's state. Fixed
//! kinds (checkpoints, energy sources) never move; mobile kinds (drones,
//! robots, shockwaves) integrate heading and speed each tick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use super::bezier::CubicBezier;
use super::strategy::Strategy;
use crate::consts::*;
use crate::{heading_to_vector, normalize_heading};

new_key_type! {
    /// Stable generational handle for an entity in the world
    pub struct EntityId;
}

/// Packed 0xRRGGBB display color (not used by the simulation)
pub type Color = u32;

pub mod colors {
    use super::Color;

    pub const BLUE: Color = 0x0000ff;
    pub const RED: Color = 0xff0000;
    pub const GRAY: Color = 0x808080;
    pub const GREEN: Color = 0x00ff00;
    /// Energy source once drained
    pub const LIGHT_RED: Color = 0xf56969;
}

/// Heading (compass degrees) and speed (units/second)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    heading: f32,
    speed: f32,
}

impl Motion {
    pub fn new(heading: f32, speed: f32) -> Self {
        Self {
            heading: normalize_heading(heading),
            speed: speed.max(0.0),
        }
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set heading, normalized to [0, 360)
    pub fn set_heading(&mut self, heading: f32) {
        self.heading = normalize_heading(heading);
    }

    /// Set speed, negative values clamp to zero
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Position after travelling `dt` seconds along the current heading
    pub fn advance(&self, pos: Vec2, dt: f32) -> Vec2 {
        pos + heading_to_vector(self.heading) * self.speed * dt
    }
}

/// A numbered checkpoint ("base")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub index: u32,
    pub selected: bool,
}

/// A one-shot energy pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySource {
    capacity: f32,
    pub selected: bool,
}

impl EnergySource {
    pub fn new(capacity: f32) -> Self {
        Self {
            capacity: capacity.max(0.0),
            selected: false,
        }
    }

    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    pub fn has_energy(&self) -> bool {
        self.capacity > 0.0
    }

    /// Take the entire remaining capacity, leaving the source empty for good
    pub fn drain(&mut self) -> f32 {
        std::mem::take(&mut self.capacity)
    }
}

/// A roaming obstacle that wobbles its heading and bounces off world edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub motion: Motion,
    /// World extent the drone bounces inside (origin at 0,0)
    pub bounds: Vec2,
}

impl Drone {
    pub fn advance(&mut self, pos: Vec2, dt: f32, rng: &mut impl Rng) -> Vec2 {
        let mut wobble = rng.random_range(0..DRONE_MAX_WOBBLE) as f32;
        if rng.random_bool(0.5) {
            wobble = -wobble;
        }
        self.motion.set_heading(self.motion.heading + wobble);

        let next = self.motion.advance(pos, dt);

        // Reflect instead of clamping; the drone may overshoot for a tick
        if next.x >= self.bounds.x || next.x <= 0.0 {
            self.motion.set_heading(-self.motion.heading);
        }
        if next.y >= self.bounds.y || next.y <= 0.0 {
            self.motion.set_heading(180.0 - self.motion.heading);
        }
        next
    }
}

/// Who drives a robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pilot {
    Player,
    Autonomous(Strategy),
}

/// A steerable robot with energy, damage, and checkpoint progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub motion: Motion,
    pub pilot: Pilot,
    steering: f32,
    max_speed: f32,
    energy: f32,
    damage: f32,
    max_damage: f32,
    last_checkpoint: u32,
}

impl Agent {
    pub fn new(pilot: Pilot, speed: f32, heading: f32, max_damage: f32) -> Self {
        Self {
            motion: Motion::new(heading, speed.clamp(0.0, INITIAL_MAX_SPEED)),
            pilot,
            steering: 0.0,
            max_speed: INITIAL_MAX_SPEED,
            energy: INITIAL_ENERGY,
            damage: 0.0,
            max_damage,
            last_checkpoint: 0,
        }
    }

    /// Start with `index` already counted as reached
    pub fn with_last_checkpoint(mut self, index: u32) -> Self {
        self.last_checkpoint = index;
        self
    }

    pub fn steering(&self) -> f32 {
        self.steering
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn max_damage(&self) -> f32 {
        self.max_damage
    }

    pub fn last_checkpoint(&self) -> u32 {
        self.last_checkpoint
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self.pilot {
            Pilot::Autonomous(strategy) => Some(strategy),
            Pilot::Player => None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.pilot == Pilot::Player
    }

    pub fn is_dead(&self) -> bool {
        self.damage >= self.max_damage || self.energy <= 0.0
    }

    pub fn steer_left(&mut self) {
        self.steering = (self.steering - STEER_INCREMENT).max(-MAX_STEER);
    }

    pub fn steer_right(&mut self) {
        self.steering = (self.steering + STEER_INCREMENT).min(MAX_STEER);
    }

    /// Set speed within [0, max_speed]
    pub fn set_speed(&mut self, speed: f32) {
        self.motion.set_speed(speed.min(self.max_speed));
    }

    /// Lower or raise the speed cap; the current speed is re-clamped
    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.max_speed = max_speed.max(0.0);
        self.set_speed(self.motion.speed());
    }

    /// Accumulate damage; the speed cap shrinks linearly toward zero
    pub fn take_damage(&mut self, amount: f32) {
        self.damage += amount.max(0.0);
        let remaining = 1.0 - self.damage / self.max_damage;
        self.set_max_speed(INITIAL_MAX_SPEED * remaining);
    }

    pub fn charge(&mut self, amount: f32) {
        self.energy += amount;
    }

    /// Record arrival at checkpoint `index`; only the next one in sequence counts
    pub fn reach_checkpoint(&mut self, index: u32) -> bool {
        if index == self.last_checkpoint + 1 {
            self.last_checkpoint = index;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, pos: Vec2, dt: f32) -> Vec2 {
        if self.is_dead() {
            return pos;
        }

        self.motion.set_heading(self.motion.heading + self.steering * dt);
        let next = self.motion.advance(pos, dt);
        self.energy -= ENERGY_CONSUMPTION_RATE * dt;

        // Opponents are kept topped up and only ever die from damage
        if matches!(self.pilot, Pilot::Autonomous(_)) {
            self.energy = INITIAL_ENERGY;
        }
        next
    }
}

/// Decorative shockwave left behind by a crash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shockwave {
    pub motion: Motion,
    /// Control points relative to the shockwave position
    pub curve: CubicBezier,
    ttl_ms: i64,
}

impl Shockwave {
    pub fn new(heading: f32, curve: CubicBezier) -> Self {
        Self {
            motion: Motion::new(heading, SHOCKWAVE_SPEED),
            curve,
            ttl_ms: SHOCKWAVE_TTL_MS,
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    pub fn is_expired(&self) -> bool {
        self.ttl_ms <= 0
    }

    pub fn advance(&mut self, pos: Vec2, dt: f32, elapsed_ms: u64) -> Vec2 {
        self.ttl_ms -= elapsed_ms as i64;
        self.motion.advance(pos, dt)
    }
}

/// Variant state of an entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Checkpoint(Checkpoint),
    EnergySource(EnergySource),
    Obstacle(Drone),
    Agent(Agent),
    Effect(Shockwave),
}

/// Anything that exists in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Vec2,
    /// Side length of the bounding square
    pub size: f32,
    pub color: Color,
    pub kind: EntityKind,
}

impl Entity {
    pub fn checkpoint(pos: Vec2, index: u32) -> Self {
        Self {
            pos,
            size: CHECKPOINT_SIZE,
            color: colors::BLUE,
            kind: EntityKind::Checkpoint(Checkpoint {
                index,
                selected: false,
            }),
        }
    }

    /// Energy source whose capacity equals its size
    pub fn energy_source(pos: Vec2, size: f32) -> Self {
        Self {
            pos,
            size,
            color: colors::GREEN,
            kind: EntityKind::EnergySource(EnergySource::new(size)),
        }
    }

    pub fn drone(pos: Vec2, size: f32, motion: Motion, bounds: Vec2) -> Self {
        Self {
            pos,
            size,
            color: colors::GRAY,
            kind: EntityKind::Obstacle(Drone { motion, bounds }),
        }
    }

    pub fn agent(pos: Vec2, agent: Agent) -> Self {
        Self {
            pos,
            size: ROBOT_SIZE,
            color: colors::RED,
            kind: EntityKind::Agent(agent),
        }
    }

    pub fn player(pos: Vec2) -> Self {
        Self::agent(
            pos,
            Agent::new(Pilot::Player, PLAYER_START_SPEED, 0.0, PLAYER_MAX_DAMAGE),
        )
    }

    pub fn opponent(pos: Vec2, strategy: Strategy) -> Self {
        Self::agent(
            pos,
            Agent::new(
                Pilot::Autonomous(strategy),
                INITIAL_MAX_SPEED,
                0.0,
                OPPONENT_MAX_DAMAGE,
            ),
        )
    }

    pub fn shockwave(pos: Vec2, heading: f32, curve: CubicBezier) -> Self {
        Self {
            pos,
            size: SHOCKWAVE_SIZE,
            color: colors::BLUE,
            kind: EntityKind::Effect(Shockwave::new(heading, curve)),
        }
    }

    pub fn as_agent(&self) -> Option<&Agent> {
        match &self.kind {
            EntityKind::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn as_agent_mut(&mut self) -> Option<&mut Agent> {
        match &mut self.kind {
            EntityKind::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Checkpoint(_) | EntityKind::EnergySource(_)
        )
    }

    /// Robots and drones: bodies whose crashes leave shockwaves
    pub fn is_substantial(&self) -> bool {
        matches!(self.kind, EntityKind::Agent(_) | EntityKind::Obstacle(_))
    }

    /// Effects are decorative and take no part in collisions
    pub fn is_collidable(&self) -> bool {
        !matches!(self.kind, EntityKind::Effect(_))
    }

    pub fn motion(&self) -> Option<&Motion> {
        match &self.kind {
            EntityKind::Obstacle(drone) => Some(&drone.motion),
            EntityKind::Agent(agent) => Some(&agent.motion),
            EntityKind::Effect(wave) => Some(&wave.motion),
            EntityKind::Checkpoint(_) | EntityKind::EnergySource(_) => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        match &self.kind {
            EntityKind::Checkpoint(cp) => cp.selected,
            EntityKind::EnergySource(src) => src.selected,
            _ => false,
        }
    }

    /// Set the selection highlight; only fixed entities can be selected
    pub fn set_selected(&mut self, selected: bool) {
        match &mut self.kind {
            EntityKind::Checkpoint(cp) => cp.selected = selected,
            EntityKind::EnergySource(src) => src.selected = selected,
            _ => {}
        }
    }

    /// Whether `point` lies inside the bounding square (edges inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size / 2.0;
        (point.x - self.pos.x).abs() <= half && (point.y - self.pos.y).abs() <= half
    }

    /// Advance one tick; fixed entities stay put
    pub fn advance(&mut self, elapsed_ms: u64, rng: &mut impl Rng) {
        let dt = elapsed_ms as f32 / 1000.0;
        self.pos = match &mut self.kind {
            EntityKind::Checkpoint(_) | EntityKind::EnergySource(_) => self.pos,
            EntityKind::Obstacle(drone) => drone.advance(self.pos, dt, rng),
            EntityKind::Agent(agent) => agent.advance(self.pos, dt),
            EntityKind::Effect(wave) => wave.advance(self.pos, dt, elapsed_ms),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use super::Strategy;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player_agent() -> Agent {
        Agent::new(Pilot::Player, PLAYER_START_SPEED, 0.0, PLAYER_MAX_DAMAGE)
    }

    #[test]
    fn test_motion_moves_along_heading() {
        let motion = Motion::new(90.0, 50.0);
        let next = motion.advance(Vec2::ZERO, 2.0);
        assert!((next.x - 100.0).abs() < 1e-3);
        assert!(next.y.abs() < 1e-3);
    }

    #[test]
    fn test_negative_speed_clamps_to_zero() {
        let mut motion = Motion::new(0.0, 10.0);
        motion.set_speed(-5.0);
        assert_eq!(motion.speed(), 0.0);

        let mut agent = player_agent();
        agent.set_speed(-30.0);
        assert_eq!(agent.motion.speed(), 0.0);
    }

    #[test]
    fn test_speed_capped_by_max_speed() {
        let mut agent = player_agent();
        agent.set_speed(1000.0);
        assert_eq!(agent.motion.speed(), INITIAL_MAX_SPEED);
    }

    #[test]
    fn test_steering_is_clamped() {
        let mut agent = player_agent();
        for _ in 0..20 {
            agent.steer_left();
        }
        assert_eq!(agent.steering(), -MAX_STEER);
        for _ in 0..40 {
            agent.steer_right();
        }
        assert_eq!(agent.steering(), MAX_STEER);
    }

    #[test]
    fn test_damage_lowers_max_speed() {
        let mut agent = Agent::new(
            Pilot::Autonomous(Strategy::Race),
            INITIAL_MAX_SPEED,
            0.0,
            OPPONENT_MAX_DAMAGE,
        );
        agent.take_damage(CRASH_DAMAGE);
        agent.take_damage(CRASH_DAMAGE);
        assert_eq!(agent.damage(), 40.0);
        assert!((agent.max_speed() - 84.0).abs() < 1e-3);
        assert!(agent.motion.speed() <= agent.max_speed());
        assert!(!agent.is_dead());
    }

    #[test]
    fn test_dead_agent_does_not_move_or_drain() {
        let mut agent = Agent::new(
            Pilot::Autonomous(Strategy::Pursuit),
            INITIAL_MAX_SPEED,
            0.0,
            OPPONENT_MAX_DAMAGE,
        );
        for _ in 0..13 {
            agent.take_damage(CRASH_DAMAGE);
        }
        assert!(agent.is_dead());
        assert_eq!(agent.max_speed(), 0.0);

        let pos = Vec2::new(10.0, 20.0);
        let energy = agent.energy();
        assert_eq!(agent.advance(pos, 1.0), pos);
        assert_eq!(agent.energy(), energy);
    }

    #[test]
    fn test_out_of_energy_is_dead() {
        let mut agent = player_agent();
        agent.charge(-INITIAL_ENERGY);
        assert!(agent.is_dead());
    }

    #[test]
    fn test_player_drains_energy_while_moving() {
        let mut agent = player_agent();
        agent.advance(Vec2::ZERO, 2.0);
        assert!((agent.energy() - (INITIAL_ENERGY - 2.0 * ENERGY_CONSUMPTION_RATE)).abs() < 1e-3);
    }

    #[test]
    fn test_opponent_energy_is_refilled() {
        let mut agent = Agent::new(
            Pilot::Autonomous(Strategy::Race),
            INITIAL_MAX_SPEED,
            0.0,
            OPPONENT_MAX_DAMAGE,
        );
        agent.advance(Vec2::ZERO, 3.0);
        assert_eq!(agent.energy(), INITIAL_ENERGY);
    }

    #[test]
    fn test_steering_turns_heading() {
        let mut agent = player_agent();
        agent.steer_right();
        agent.steer_right();
        agent.advance(Vec2::ZERO, 1.0);
        assert!((agent.motion.heading() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_checkpoints_in_order_only() {
        let mut agent = player_agent();
        assert!(!agent.reach_checkpoint(2));
        assert_eq!(agent.last_checkpoint(), 0);
        assert!(agent.reach_checkpoint(1));
        assert!(!agent.reach_checkpoint(1));
        assert!(!agent.reach_checkpoint(3));
        assert!(agent.reach_checkpoint(2));
        assert_eq!(agent.last_checkpoint(), 2);
    }

    #[test]
    fn test_energy_source_drains_once() {
        let mut source = EnergySource::new(75.0);
        assert!(source.has_energy());
        assert_eq!(source.drain(), 75.0);
        assert!(!source.has_energy());
        assert_eq!(source.drain(), 0.0);
    }

    #[test]
    fn test_drone_reflects_off_edges() {
        let mut rng = Pcg32::seed_from_u64(7);
        let bounds = Vec2::new(500.0, 500.0);

        // Heading east off the right edge
        let mut drone = Drone {
            motion: Motion::new(90.0, 100.0),
            bounds,
        };
        let next = drone.advance(Vec2::new(499.0, 250.0), 0.1, &mut rng);
        assert!(next.x >= bounds.x);
        let h = drone.motion.heading();
        assert!(h > 180.0, "heading should point west, got {h}");

        // Heading north off the top edge
        let mut drone = Drone {
            motion: Motion::new(0.0, 100.0),
            bounds,
        };
        drone.advance(Vec2::new(250.0, 499.0), 0.1, &mut rng);
        let h = drone.motion.heading();
        assert!(h > 90.0 && h < 270.0, "heading should point south, got {h}");
    }

    #[test]
    fn test_shockwave_expires() {
        let curve = CubicBezier::new(Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::ONE);
        let mut wave = Shockwave::new(0.0, curve);
        wave.advance(Vec2::ZERO, 4.0, 4000);
        assert!(!wave.is_expired());
        wave.advance(Vec2::ZERO, 4.0, 4000);
        assert!(wave.is_expired());
    }

    #[test]
    fn test_contains_point() {
        let cp = Entity::checkpoint(Vec2::new(100.0, 100.0), 1);
        assert!(cp.contains(Vec2::new(140.0, 60.0)));
        assert!(cp.contains(Vec2::new(150.0, 150.0)));
        assert!(!cp.contains(Vec2::new(151.0, 100.0)));
    }

    proptest! {
        #[test]
        fn prop_steer_left_then_right_restores(presses in 0usize..7) {
            let mut agent = player_agent();
            for _ in 0..presses {
                agent.steer_right();
            }
            let before = agent.steering();
            agent.steer_left();
            agent.steer_right();
            prop_assert_eq!(agent.steering(), before);
        }

        #[test]
        fn prop_damage_is_monotonic(hits in proptest::collection::vec(0.0f32..60.0, 1..20)) {
            let mut agent = Agent::new(
                Pilot::Autonomous(Strategy::Race),
                INITIAL_MAX_SPEED,
                0.0,
                OPPONENT_MAX_DAMAGE,
            );
            for hit in hits {
                let (damage, max_speed) = (agent.damage(), agent.max_speed());
                agent.take_damage(hit);
                prop_assert!(agent.damage() >= damage);
                prop_assert!(agent.max_speed() <= max_speed);
                if hit >= 0.01 && max_speed > 0.0 {
                    prop_assert!(agent.max_speed() < max_speed);
                }
                prop_assert!(agent.max_speed() >= 0.0);
            }
        }
    }
}
