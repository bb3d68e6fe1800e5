//! Per-frame simulation tick
//!
//! Each tick runs, in order: move every mobile entity (checking for a
//! winner after each move), the collision pass, energy-source top-up and
//! shockwave expiry, then the player death check.

use super::collision::collision_pass;
use super::entity::{EntityId, EntityKind};
use super::state::{GameEvent, GamePhase, Outcome, TickReport, World};
use super::strategy::steer_toward;
use crate::consts::CHARGED_ENERGY_SOURCES;

/// Advance the world by `elapsed_ms` of wall time
///
/// Paused worlds are left untouched. Once the match is over every call
/// just repeats the outcome.
pub fn tick(world: &mut World, elapsed_ms: u64) -> TickReport {
    let mut report = TickReport::default();

    match world.phase {
        GamePhase::Paused => return report,
        GamePhase::Over(outcome) => {
            report.outcome = Some(outcome);
            return report;
        }
        GamePhase::Playing => {}
    }

    world.advance_clock(elapsed_ms);

    if let Some(outcome) = move_entities(world, elapsed_ms) {
        world.phase = GamePhase::Over(outcome);
        report.outcome = Some(outcome);
        return report;
    }

    collision_pass(world, &mut report.events);
    replenish_energy_sources(world, &mut report.events);
    remove_expired_effects(world, &mut report.events);
    world.history.retain_live(&world.entities);

    if world.player().is_some_and(|p| p.is_dead()) {
        log::info!("Robot is unable to move, starting next life");
        let outcome = world.start_next_life();
        report.events.push(GameEvent::LifeLost {
            lives_remaining: world.lives,
        });
        report.outcome = outcome;
    }

    report
}

/// Move everything, returning an outcome as soon as a robot finishes
fn move_entities(world: &mut World, elapsed_ms: u64) -> Option<Outcome> {
    let ids: Vec<EntityId> = world.entities.keys().collect();
    let final_checkpoint = world.settings.checkpoint_count;

    for id in ids {
        // Strategies read the world before this robot moves
        let target = world.entities.get(id).and_then(|e| {
            let agent = e.as_agent()?;
            let strategy = agent.strategy()?;
            Some(strategy.target(agent, &*world))
        });

        let Some(entity) = world.entities.get_mut(id) else {
            continue;
        };
        if entity.motion().is_none() {
            continue;
        }

        let pos = entity.pos;
        if let (Some(target), Some(agent)) = (target, entity.as_agent_mut()) {
            steer_toward(agent, pos, target);
        }
        entity.advance(elapsed_ms, &mut world.rng);

        let finished = entity
            .as_agent()
            .filter(|agent| agent.last_checkpoint() >= final_checkpoint)
            .map(|agent| agent.is_player());

        match finished {
            Some(true) => {
                log::info!("Game over, you win! Total time: {}", world.clock_secs);
                return Some(Outcome::PlayerWon {
                    clock_secs: world.clock_secs,
                });
            }
            Some(false) => {
                log::info!("Game over, a non-player robot wins!");
                return Some(Outcome::OpponentWon);
            }
            None => {}
        }
    }
    None
}

/// Keep exactly the required number of charged energy sources
fn replenish_energy_sources(world: &mut World, events: &mut Vec<GameEvent>) {
    let charged = world.charged_energy_sources();
    for _ in charged..CHARGED_ENERGY_SOURCES {
        let (id, pos) = world.spawn_energy_source();
        events.push(GameEvent::EnergySourceSpawned { id, pos });
    }
}

fn remove_expired_effects(world: &mut World, events: &mut Vec<GameEvent>) {
    let expired: Vec<EntityId> = world
        .entities
        .iter()
        .filter(|(_, e)| matches!(&e.kind, EntityKind::Effect(wave) if wave.is_expired()))
        .map(|(id, _)| id)
        .collect();

    for id in expired {
        world.entities.remove(id);
        events.push(GameEvent::ShockwaveExpired { id });
    }
}
