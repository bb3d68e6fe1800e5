//! Steering decisions for autonomous robots
//!
//! A strategy picks a target point; the shared turn planner then decides
//! whether steering left or right reaches the desired heading sooner and
//! whether the turn is sharp enough to slow down for.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Agent;
use crate::compass_heading;
use crate::consts::{FULL_TURN, MAX_STEER};

/// Read access to the world positions a strategy can aim for
pub trait Targets {
    fn player_position(&self) -> Vec2;
    /// Position of checkpoint `index`, or [`crate::INVALID_LOCATION`] if absent
    fn checkpoint_position(&self, index: u32) -> Vec2;
}

/// Per-tick decision behavior of an autonomous robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Chase the player's current position
    Pursuit,
    /// Head for the next checkpoint in sequence
    Race,
}

impl Strategy {
    /// The counterpart used by the global strategy flip
    pub fn flipped(self) -> Self {
        match self {
            Strategy::Pursuit => Strategy::Race,
            Strategy::Race => Strategy::Pursuit,
        }
    }

    /// Where an agent running this strategy wants to go
    pub fn target(&self, agent: &Agent, targets: &impl Targets) -> Vec2 {
        match self {
            Strategy::Pursuit => targets.player_position(),
            Strategy::Race => targets.checkpoint_position(agent.last_checkpoint() + 1),
        }
    }
}

/// Which way to turn the wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

/// Result of comparing the two ways around the compass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnPlan {
    /// Degrees to reach the desired heading turning counter-clockwise
    pub left_amount: f32,
    /// Degrees to reach the desired heading turning clockwise
    pub right_amount: f32,
    pub direction: TurnDirection,
    /// The shorter arc is at least the steering cap; slow down for it
    pub sharp: bool,
}

/// Plan a turn from `heading` to `desired` (both compass degrees)
pub fn plan_turn(heading: f32, desired: f32) -> TurnPlan {
    let right_amount = (desired - heading).rem_euclid(FULL_TURN);
    let left_amount = FULL_TURN - right_amount;

    let direction = if right_amount <= left_amount {
        TurnDirection::Right
    } else {
        TurnDirection::Left
    };

    TurnPlan {
        left_amount,
        right_amount,
        direction,
        sharp: right_amount.min(left_amount) >= MAX_STEER,
    }
}

/// Steer one increment toward `target`, halving speed on sharp turns
pub fn steer_toward(agent: &mut Agent, pos: Vec2, target: Vec2) -> TurnPlan {
    let desired = compass_heading(pos, target);
    let plan = plan_turn(agent.motion.heading(), desired);

    if plan.sharp {
        agent.set_speed(agent.max_speed() / 2.0);
    } else {
        agent.set_speed(agent.max_speed());
    }

    match plan.direction {
        TurnDirection::Right => agent.steer_right(),
        TurnDirection::Left => agent.steer_left(),
    }
    plan
}
