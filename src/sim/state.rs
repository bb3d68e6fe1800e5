//! World state and core simulation types
//!
//! [`World`] is the explicit simulation context: it owns the entity arena,
//! collision history, RNG, clock, and lives, and exposes the player controls
//! and display queries. Stepping lives in [`super::tick`].

use std::cell::RefCell;
use std::collections::HashSet;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use super::bezier::CubicBezier;
use super::collision::CollisionHistory;
use super::entity::{Agent, Entity, EntityId, EntityKind, Motion, Pilot};
use super::strategy::{Strategy, Targets};
use crate::INVALID_LOCATION;
use crate::consts::*;
use crate::settings::Settings;

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Player reached the final checkpoint; clock in whole seconds
    PlayerWon { clock_secs: u64 },
    /// An opponent reached the final checkpoint first
    OpponentWon,
    /// The player ran out of lives
    PlayerLost,
}

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Ticks are ignored; fixed entities may be selected
    Paused,
    Over(Outcome),
}

/// Audio cue requested by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Crash,
    Charge,
    Explosion,
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A robot crashed into a drone or another robot and took damage
    Crash { agent: EntityId, damage: f32 },
    /// A robot drained an energy source
    Charged { agent: EntityId, amount: f32 },
    CheckpointReached { agent: EntityId, index: u32 },
    ShockwaveSpawned { id: EntityId, pos: Vec2 },
    EnergySourceSpawned { id: EntityId, pos: Vec2 },
    ShockwaveExpired { id: EntityId },
    /// The player died and the world was rebuilt
    LifeLost { lives_remaining: u32 },
}

impl GameEvent {
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            GameEvent::Crash { .. } => Some(SoundCue::Crash),
            GameEvent::Charged { .. } => Some(SoundCue::Charge),
            GameEvent::LifeLost { .. } => Some(SoundCue::Explosion),
            _ => None,
        }
    }
}

/// What a tick changed, for the presentation layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    /// Set once the match has ended
    pub outcome: Option<Outcome>,
}

/// Player readouts for the score display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub last_checkpoint: u32,
    pub energy: f32,
    pub damage: f32,
    pub speed: f32,
    pub heading: f32,
    pub steering: f32,
}

/// Serializable view of the whole world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub clock_secs: u64,
    pub lives: u32,
    pub phase: GamePhase,
    pub sound_enabled: bool,
    pub player: Option<PlayerStats>,
    pub entities: Vec<(EntityId, Entity)>,
}

/// The simulation context
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) settings: Settings,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) player: Option<EntityId>,
    pub(crate) history: CollisionHistory,
    pub(crate) rng: Pcg32,
    pub(crate) clock_secs: u64,
    pub(crate) clock_ms: u64,
    pub(crate) lives: u32,
    pub(crate) phase: GamePhase,
    sound_enabled: bool,
    /// Missing checkpoint indices already reported, so lookups warn once
    missing_checkpoints: RefCell<HashSet<u32>>,
}

impl World {
    /// Create an empty world sized from `settings`
    pub fn new(settings: Settings) -> Self {
        Self {
            width: settings.world_width,
            height: settings.world_height,
            rng: Pcg32::seed_from_u64(settings.seed),
            lives: settings.lives,
            sound_enabled: settings.sound_enabled,
            settings,
            entities: SlotMap::with_key(),
            player: None,
            history: CollisionHistory::default(),
            clock_secs: 0,
            clock_ms: 0,
            phase: GamePhase::Playing,
            missing_checkpoints: RefCell::default(),
        }
    }

    /// Create a world populated with the standard layout
    pub fn initialized(settings: Settings) -> Self {
        let (width, height) = (settings.world_width, settings.world_height);
        let mut world = Self::new(settings);
        world.initialize_world(width, height);
        world
    }

    /// Replace all entities with a fresh layout for the given bounds
    pub fn initialize_world(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.entities.clear();
        self.history.clear();
        self.player = None;
        self.missing_checkpoints.get_mut().clear();

        for index in 1..=self.settings.checkpoint_count {
            let pos = self.random_position();
            self.entities.insert(Entity::checkpoint(pos, index));
        }

        // The player starts on the first checkpoint with it already counted
        let start = self.checkpoint_position(1);
        let player = Agent::new(Pilot::Player, PLAYER_START_SPEED, 0.0, PLAYER_MAX_DAMAGE)
            .with_last_checkpoint(1);
        self.player = Some(self.entities.insert(Entity::agent(start, player)));

        let offsets = [
            Vec2::new(OPPONENT_SPAWN_OFFSET, OPPONENT_SPAWN_OFFSET),
            Vec2::new(OPPONENT_SPAWN_OFFSET, -OPPONENT_SPAWN_OFFSET),
            Vec2::new(-OPPONENT_SPAWN_OFFSET, OPPONENT_SPAWN_OFFSET),
        ];
        let roster = self.settings.opponents.clone();
        for (i, strategy) in roster.into_iter().enumerate() {
            let offset = offsets[i % offsets.len()];
            let opponent = Agent::new(
                Pilot::Autonomous(strategy),
                INITIAL_MAX_SPEED,
                0.0,
                OPPONENT_MAX_DAMAGE,
            )
            .with_last_checkpoint(1);
            self.entities.insert(Entity::agent(start + offset, opponent));
        }

        for _ in 0..CHARGED_ENERGY_SOURCES {
            self.spawn_energy_source();
        }

        for _ in 0..self.settings.obstacle_count {
            let size = self.random_int(PICKUP_MIN_SIZE, PICKUP_MAX_SIZE) as f32;
            let pos = self.random_position();
            let speed = self.random_int(DRONE_MIN_SPEED, DRONE_MAX_SPEED) as f32;
            let heading = self.random_int(0, 360) as f32;
            let bounds = Vec2::new(self.width, self.height);
            self.entities
                .insert(Entity::drone(pos, size, Motion::new(heading, speed), bounds));
        }

        log::info!(
            "World initialized: {}x{}, {} entities, {} lives",
            self.width,
            self.height,
            self.entities.len(),
            self.lives
        );
    }

    /// Rebuild the standard layout with the current bounds
    pub fn reinitialize(&mut self) {
        self.initialize_world(self.width, self.height);
    }

    /// Add an entity, returning its handle
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        self.entities.insert(entity)
    }

    /// Mark `id` as the player-controlled robot
    pub fn set_player(&mut self, id: EntityId) -> bool {
        let is_agent = self
            .entities
            .get(id)
            .is_some_and(|e| e.as_agent().is_some());
        if is_agent {
            self.player = Some(id);
        }
        is_agent
    }

    pub(crate) fn random_int(&mut self, start: i32, end: i32) -> i32 {
        if end <= start {
            return start;
        }
        self.rng.random_range(start..end)
    }

    pub(crate) fn random_position(&mut self) -> Vec2 {
        let x = self.random_int(0, self.width as i32);
        let y = self.random_int(0, self.height as i32);
        Vec2::new(x as f32, y as f32)
    }

    pub(crate) fn spawn_energy_source(&mut self) -> (EntityId, Vec2) {
        let size = self.random_int(PICKUP_MIN_SIZE, PICKUP_MAX_SIZE) as f32;
        let pos = self.random_position();
        (self.entities.insert(Entity::energy_source(pos, size)), pos)
    }

    pub(crate) fn spawn_shockwave(&mut self, pos: Vec2) -> EntityId {
        let heading = self.random_int(0, 360) as f32;
        let extent = SHOCKWAVE_SIZE as i32;
        let mut corner = || {
            let x = self.random_int(-extent, extent) as f32;
            let y = self.random_int(-extent, extent) as f32;
            Vec2::new(x, y)
        };
        let curve = CubicBezier::new(corner(), corner(), corner(), corner());
        self.entities.insert(Entity::shockwave(pos, heading, curve))
    }

    /// Add elapsed time, carrying whole seconds into the clock
    pub(crate) fn advance_clock(&mut self, elapsed_ms: u64) {
        self.clock_ms += elapsed_ms;
        self.clock_secs += self.clock_ms / 1000;
        self.clock_ms %= 1000;
    }

    /// Lose a life: rebuild the world and end the match when none remain
    pub(crate) fn start_next_life(&mut self) -> Option<Outcome> {
        self.reinitialize();
        self.lives = self.lives.saturating_sub(1);
        log::info!("Player robot disabled, {} lives remaining", self.lives);

        if self.lives == 0 {
            let outcome = Outcome::PlayerLost;
            self.phase = GamePhase::Over(outcome);
            log::info!("Game over, you failed!");
            return Some(outcome);
        }
        None
    }

    // --- Player controls ---

    fn player_agent_mut(&mut self) -> Option<&mut Agent> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let id = self.player?;
        self.entities.get_mut(id)?.as_agent_mut()
    }

    /// Raise the player's speed by one increment (capped at max speed)
    pub fn accelerate(&mut self) -> bool {
        let step = self.settings.speed_increment;
        let Some(agent) = self.player_agent_mut() else {
            return false;
        };
        agent.set_speed(agent.motion.speed() + step);
        log::debug!("Player speed is now {}", agent.motion.speed());
        true
    }

    /// Lower the player's speed by one increment (floored at zero)
    pub fn brake(&mut self) -> bool {
        let step = self.settings.speed_increment;
        let Some(agent) = self.player_agent_mut() else {
            return false;
        };
        agent.set_speed(agent.motion.speed() - step);
        log::debug!("Player speed is now {}", agent.motion.speed());
        true
    }

    pub fn steer_left(&mut self) -> bool {
        let Some(agent) = self.player_agent_mut() else {
            return false;
        };
        agent.steer_left();
        log::debug!("Player steering is now {}", agent.steering());
        true
    }

    pub fn steer_right(&mut self) -> bool {
        let Some(agent) = self.player_agent_mut() else {
            return false;
        };
        agent.steer_right();
        log::debug!("Player steering is now {}", agent.steering());
        true
    }

    /// Flip every opponent between pursuit and race; returns how many flipped
    pub fn toggle_agent_strategies(&mut self) -> usize {
        let mut flipped = 0;
        for agent in self.entities.values_mut().filter_map(Entity::as_agent_mut) {
            if let Pilot::Autonomous(strategy) = agent.pilot {
                agent.pilot = Pilot::Autonomous(strategy.flipped());
                flipped += 1;
            }
        }
        log::info!("Strategies flipped for {flipped} robots");
        flipped
    }

    // --- Phase ---

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
        }
    }

    /// Resume play, clearing any selection made while paused
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.deselect_all();
            self.phase = GamePhase::Playing;
        }
    }

    /// Select the fixed entity under `point` while paused
    pub fn select_at(&mut self, point: Vec2) -> Option<EntityId> {
        if !self.is_paused() {
            return None;
        }
        let hit = self
            .entities
            .iter()
            .find(|(_, e)| e.is_fixed() && e.contains(point))
            .map(|(id, _)| id)?;
        self.deselect_all();
        if let Some(entity) = self.entities.get_mut(hit) {
            entity.set_selected(true);
        }
        Some(hit)
    }

    pub fn deselect_all(&mut self) {
        for entity in self.entities.values_mut() {
            entity.set_selected(false);
        }
    }

    // --- Queries ---

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Elapsed game time in whole seconds
    pub fn clock_secs(&self) -> u64 {
        self.clock_secs
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&Agent> {
        self.entities.get(self.player?)?.as_agent()
    }

    pub fn player_last_checkpoint(&self) -> u32 {
        self.player().map_or(0, |a| a.last_checkpoint())
    }

    pub fn player_energy(&self) -> f32 {
        self.player().map_or(0.0, |a| a.energy())
    }

    pub fn player_damage(&self) -> f32 {
        self.player().map_or(0.0, |a| a.damage())
    }

    pub fn player_stats(&self) -> Option<PlayerStats> {
        self.player().map(|a| PlayerStats {
            last_checkpoint: a.last_checkpoint(),
            energy: a.energy(),
            damage: a.damage(),
            speed: a.motion.speed(),
            heading: a.motion.heading(),
            steering: a.steering(),
        })
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Iterate live entities; valid until the next tick
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Energy sources that still hold capacity
    pub fn charged_energy_sources(&self) -> usize {
        self.entities
            .values()
            .filter(|e| matches!(&e.kind, EntityKind::EnergySource(src) if src.has_energy()))
            .count()
    }

    /// Strategy held by an opponent, if `id` is one
    pub fn strategy_of(&self, id: EntityId) -> Option<Strategy> {
        self.entities.get(id)?.as_agent()?.strategy()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            clock_secs: self.clock_secs,
            lives: self.lives,
            phase: self.phase,
            sound_enabled: self.sound_enabled,
            player: self.player_stats(),
            entities: self.entities.iter().map(|(id, e)| (id, e.clone())).collect(),
        }
    }
}

impl Targets for World {
    fn player_position(&self) -> Vec2 {
        self.player
            .and_then(|id| self.entities.get(id))
            .map_or(INVALID_LOCATION, |e| e.pos)
    }

    fn checkpoint_position(&self, index: u32) -> Vec2 {
        let found = self.entities.values().find_map(|e| match &e.kind {
            EntityKind::Checkpoint(cp) if cp.index == index => Some(e.pos),
            _ => None,
        });
        found.unwrap_or_else(|| {
            if self.missing_checkpoints.borrow_mut().insert(index) {
                log::warn!("Couldn't find location for checkpoint #{index}");
            }
            INVALID_LOCATION
        })
    }
}
