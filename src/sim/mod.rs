//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - Entity set is never mutated while it is being iterated
//! - No rendering, audio, or platform dependencies

pub mod bezier;
pub mod collision;
pub mod entity;
pub mod state;
pub mod strategy;
pub mod tick;

pub use bezier::{CubicBezier, Segment};
pub use collision::{CollisionHistory, overlaps};
pub use entity::{
    Agent, Checkpoint, Color, Drone, EnergySource, Entity, EntityId, EntityKind, Motion, Pilot,
    Shockwave,
};
pub use state::{
    GameEvent, GamePhase, Outcome, PlayerStats, SoundCue, TickReport, World, WorldSnapshot,
};
pub use strategy::{Strategy, Targets, TurnDirection, TurnPlan, plan_turn, steer_toward};
pub use tick::tick;
