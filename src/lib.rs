//! Robo Track - A top-down checkpoint racing simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, steering, collisions, world tick)
//! - `settings`: Runtime world rules loaded from JSON
//! - `audio`: Sound cue dispatch for the presentation layer
//! - `error`: Errors for the fallible edges (settings I/O)

pub mod audio;
pub mod error;
pub mod settings;
pub mod sim;

pub use error::SettingsError;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Degrees in a full turn of the compass
    pub const FULL_TURN: f32 = 360.0;

    /// Robot defaults (player and opponents share a chassis)
    pub const ROBOT_SIZE: f32 = 100.0;
    pub const INITIAL_MAX_SPEED: f32 = 100.0;
    pub const INITIAL_ENERGY: f32 = 500.0;
    /// Energy drained per second of movement
    pub const ENERGY_CONSUMPTION_RATE: f32 = 5.0;
    /// Steering change per control action (degrees/second)
    pub const STEER_INCREMENT: f32 = 5.0;
    /// Steering magnitude cap (degrees/second)
    pub const MAX_STEER: f32 = 40.0;
    /// Damage taken by a robot per crash
    pub const CRASH_DAMAGE: f32 = 20.0;

    /// Player robot
    pub const PLAYER_MAX_DAMAGE: f32 = 100.0;
    pub const PLAYER_START_SPEED: f32 = 10.0;

    /// Opponent robots
    pub const OPPONENT_MAX_DAMAGE: f32 = 250.0;
    /// Spawn offset of opponents from the player on each axis
    pub const OPPONENT_SPAWN_OFFSET: f32 = 200.0;

    /// Checkpoints
    pub const CHECKPOINT_SIZE: f32 = 100.0;

    /// Energy sources and drones are sized in [MIN, MAX)
    pub const PICKUP_MIN_SIZE: i32 = 50;
    pub const PICKUP_MAX_SIZE: i32 = 120;
    /// Number of charged energy sources kept alive at the end of every tick
    pub const CHARGED_ENERGY_SOURCES: usize = 2;

    /// Drone speed range [MIN, MAX)
    pub const DRONE_MIN_SPEED: i32 = 30;
    pub const DRONE_MAX_SPEED: i32 = 60;
    /// Largest random heading wobble applied per tick (degrees)
    pub const DRONE_MAX_WOBBLE: i32 = 5;

    /// Shockwave effect
    pub const SHOCKWAVE_SIZE: f32 = 100.0;
    pub const SHOCKWAVE_SPEED: f32 = 100.0;
    pub const SHOCKWAVE_TTL_MS: i64 = 8000;
    /// Absolute tolerance for the "straight enough" control-polygon test
    pub const CURVE_TOLERANCE: f32 = 0.001;
    /// Recursion cap for curve subdivision
    pub const MAX_SUBDIVISION_DEPTH: u32 = 16;
}

/// Location returned when a lookup names a checkpoint that does not exist
pub const INVALID_LOCATION: Vec2 = Vec2::new(-1.0, -1.0);

/// Normalize a heading to [0, 360) degrees
#[inline]
pub fn normalize_heading(heading: f32) -> f32 {
    let h = heading.rem_euclid(consts::FULL_TURN);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= consts::FULL_TURN { 0.0 } else { h }
}

/// Unit direction for a compass heading (0 = North, clockwise, +y is North)
#[inline]
pub fn heading_to_vector(heading: f32) -> Vec2 {
    let theta = (90.0 - heading).to_radians();
    Vec2::new(theta.cos(), theta.sin())
}

/// Compass heading in [0, 360) pointing from `from` toward `to`
#[inline]
pub fn compass_heading(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    normalize_heading(d.x.atan2(d.y).to_degrees())
}
