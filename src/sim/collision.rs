//! Collision detection and response
//!
//! Bodies are axis-aligned squares. Collisions are edge-triggered: each
//! entity remembers which others it is already touching, and a contact is
//! handled only on the tick it begins. Response is one-sided; each robot
//! reacts to what it hit, and the other side reacts on its own turn.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use slotmap::SlotMap;

use super::entity::{Entity, EntityId, EntityKind, colors};
use super::state::{GameEvent, World};
use crate::consts::CRASH_DAMAGE;

/// Whether two bounding squares overlap (touching edges count)
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    let (ha, hb) = (a.size / 2.0, b.size / 2.0);

    let (a_left, a_right) = (a.pos.x - ha, a.pos.x + ha);
    let (b_left, b_right) = (b.pos.x - hb, b.pos.x + hb);
    if a_left > b_right || a_right < b_left {
        return false;
    }

    let (a_bottom, a_top) = (a.pos.y - ha, a.pos.y + ha);
    let (b_bottom, b_top) = (b.pos.y - hb, b.pos.y + hb);
    !(a_top < b_bottom || a_bottom > b_top)
}

/// Per-entity record of the contacts already handled
#[derive(Debug, Clone, Default)]
pub struct CollisionHistory {
    contacts: HashMap<EntityId, HashSet<EntityId>>,
}

impl CollisionHistory {
    /// Whether `first` has already handled touching `second`
    pub fn contains(&self, first: EntityId, second: EntityId) -> bool {
        self.contacts
            .get(&first)
            .is_some_and(|others| others.contains(&second))
    }

    pub fn insert(&mut self, first: EntityId, second: EntityId) {
        self.contacts.entry(first).or_default().insert(second);
    }

    pub fn remove(&mut self, first: EntityId, second: EntityId) {
        if let Some(others) = self.contacts.get_mut(&first) {
            others.remove(&second);
        }
    }

    /// Drop every record that mentions an entity no longer alive
    pub fn retain_live<V>(&mut self, live: &SlotMap<EntityId, V>) {
        self.contacts.retain(|id, _| live.contains_key(*id));
        for others in self.contacts.values_mut() {
            others.retain(|id| live.contains_key(*id));
        }
        self.contacts.retain(|_, others| !others.is_empty());
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    /// Number of ongoing one-way contacts
    pub fn len(&self) -> usize {
        self.contacts.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// React to `first` newly touching `second`; only robots react
fn handle_collision(
    entities: &mut SlotMap<EntityId, Entity>,
    first: EntityId,
    second: EntityId,
    events: &mut Vec<GameEvent>,
) {
    let Some([me, other]) = entities.get_disjoint_mut([first, second]) else {
        return;
    };
    let EntityKind::Agent(agent) = &mut me.kind else {
        return;
    };

    match &mut other.kind {
        EntityKind::Obstacle(_) | EntityKind::Agent(_) => {
            agent.take_damage(CRASH_DAMAGE);
            log::debug!("Robot {first:?} crashed, damage now {}", agent.damage());
            events.push(GameEvent::Crash {
                agent: first,
                damage: CRASH_DAMAGE,
            });
        }
        EntityKind::Checkpoint(checkpoint) => {
            if agent.reach_checkpoint(checkpoint.index) {
                log::debug!("Robot {first:?} reached checkpoint {}", checkpoint.index);
                events.push(GameEvent::CheckpointReached {
                    agent: first,
                    index: checkpoint.index,
                });
            }
        }
        EntityKind::EnergySource(source) => {
            if source.has_energy() {
                let amount = source.drain();
                agent.charge(amount);
                other.color = colors::LIGHT_RED;
                events.push(GameEvent::Charged {
                    agent: first,
                    amount,
                });
            }
        }
        EntityKind::Effect(_) => {}
    }
}

/// Test every ordered pair once and handle new contacts
///
/// Shockwaves for robot/drone crashes are spawned after the pass so the
/// entity set is not modified mid-iteration.
pub(crate) fn collision_pass(world: &mut World, events: &mut Vec<GameEvent>) {
    let ids: Vec<EntityId> = world
        .entities
        .iter()
        .filter(|(_, e)| e.is_collidable())
        .map(|(id, _)| id)
        .collect();

    let mut shockwaves: Vec<Vec2> = Vec::new();

    for &first in &ids {
        for &second in &ids {
            if first == second {
                continue;
            }
            let (Some(a), Some(b)) = (world.entities.get(first), world.entities.get(second)) else {
                continue;
            };

            if !overlaps(a, b) {
                world.history.remove(first, second);
                continue;
            }
            if world.history.contains(first, second) {
                continue;
            }

            let substantial = a.is_substantial() && b.is_substantial();
            let at = a.pos;

            handle_collision(&mut world.entities, first, second, events);
            world.history.insert(first, second);

            // The reverse pairing already produced this contact's shockwave
            if substantial && !world.history.contains(second, first) {
                shockwaves.push(at);
            }
        }
    }

    for pos in shockwaves {
        let id = world.spawn_shockwave(pos);
        events.push(GameEvent::ShockwaveSpawned { id, pos });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{CHECKPOINT_SIZE, INITIAL_ENERGY};
    use crate::settings::Settings;
    use crate::sim::entity::Motion;
    use crate::sim::strategy::Strategy;

    fn empty_world() -> World {
        World::new(Settings {
            seed: 42,
            ..Default::default()
        })
    }

    fn shockwave_count(world: &World) -> usize {
        world
            .entities()
            .filter(|(_, e)| matches!(e.kind, EntityKind::Effect(_)))
            .count()
    }

    #[test]
    fn test_overlap_boxes() {
        let a = Entity::checkpoint(Vec2::new(0.0, 0.0), 1);
        let touching = Entity::checkpoint(Vec2::new(CHECKPOINT_SIZE, 0.0), 2);
        let apart = Entity::checkpoint(Vec2::new(CHECKPOINT_SIZE + 1.0, 0.0), 3);
        let diagonal = Entity::checkpoint(Vec2::new(90.0, -90.0), 4);

        assert!(overlaps(&a, &touching));
        assert!(!overlaps(&a, &apart));
        assert!(overlaps(&a, &diagonal));
        assert!(overlaps(&diagonal, &a));
    }

    #[test]
    fn test_history_records_pairs() {
        let mut world = empty_world();
        let a = world.spawn(Entity::checkpoint(Vec2::ZERO, 1));
        let b = world.spawn(Entity::checkpoint(Vec2::ONE, 2));

        let mut history = CollisionHistory::default();
        history.insert(a, b);
        assert!(history.contains(a, b));
        assert!(!history.contains(b, a));

        world.entities.remove(b);
        history.retain_live(&world.entities);
        assert!(history.is_empty());
    }

    #[test]
    fn test_crash_handled_once_per_contact() {
        let mut world = empty_world();
        let robot = world.spawn(Entity::player(Vec2::new(100.0, 100.0)));
        world.spawn(Entity::drone(
            Vec2::new(120.0, 100.0),
            60.0,
            Motion::new(0.0, 0.0),
            Vec2::new(1000.0, 1000.0),
        ));

        let mut events = Vec::new();
        for _ in 0..5 {
            collision_pass(&mut world, &mut events);
        }

        let crashes = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Crash { .. }))
            .count();
        assert_eq!(crashes, 1);
        assert_eq!(world.entity(robot).unwrap().as_agent().unwrap().damage(), CRASH_DAMAGE);
        assert_eq!(shockwave_count(&world), 1);
    }

    #[test]
    fn test_separation_rearms_collision() {
        let mut world = empty_world();
        let robot = world.spawn(Entity::player(Vec2::new(100.0, 100.0)));
        let drone = world.spawn(Entity::drone(
            Vec2::new(120.0, 100.0),
            60.0,
            Motion::new(0.0, 0.0),
            Vec2::new(1000.0, 1000.0),
        ));

        let mut events = Vec::new();
        collision_pass(&mut world, &mut events);
        collision_pass(&mut world, &mut events);

        world.entities[drone].pos = Vec2::new(500.0, 500.0);
        collision_pass(&mut world, &mut events);
        assert!(!world.history.contains(robot, drone));

        world.entities[drone].pos = Vec2::new(120.0, 100.0);
        collision_pass(&mut world, &mut events);
        collision_pass(&mut world, &mut events);

        let crashes = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Crash { .. }))
            .count();
        assert_eq!(crashes, 2);
        assert_eq!(
            world.entity(robot).unwrap().as_agent().unwrap().damage(),
            2.0 * CRASH_DAMAGE
        );
        assert_eq!(shockwave_count(&world), 2);
    }

    #[test]
    fn test_robot_pair_spawns_one_shockwave_and_both_take_damage() {
        let mut world = empty_world();
        let a = world.spawn(Entity::player(Vec2::new(100.0, 100.0)));
        let b = world.spawn(Entity::opponent(Vec2::new(150.0, 150.0), Strategy::Pursuit));

        let mut events = Vec::new();
        collision_pass(&mut world, &mut events);

        assert_eq!(shockwave_count(&world), 1);
        for id in [a, b] {
            assert_eq!(world.entity(id).unwrap().as_agent().unwrap().damage(), CRASH_DAMAGE);
        }
    }

    #[test]
    fn test_checkpoint_out_of_order_ignored() {
        let mut world = empty_world();
        let robot = world.spawn(Entity::player(Vec2::new(0.0, 0.0)));
        world.spawn(Entity::checkpoint(Vec2::new(10.0, 10.0), 2));

        let mut events = Vec::new();
        collision_pass(&mut world, &mut events);
        assert_eq!(world.entity(robot).unwrap().as_agent().unwrap().last_checkpoint(), 0);
        assert!(events.is_empty());
        assert_eq!(shockwave_count(&world), 0);
    }

    #[test]
    fn test_energy_transfer_is_all_or_nothing() {
        let mut world = empty_world();
        let robot = world.spawn(Entity::player(Vec2::new(0.0, 0.0)));
        let source = world.spawn(Entity::energy_source(Vec2::new(10.0, 0.0), 80.0));

        let mut events = Vec::new();
        collision_pass(&mut world, &mut events);
        assert_eq!(
            world.entity(robot).unwrap().as_agent().unwrap().energy(),
            INITIAL_ENERGY + 80.0
        );
        let EntityKind::EnergySource(src) = &world.entity(source).unwrap().kind else {
            panic!("expected energy source");
        };
        assert!(!src.has_energy());
        assert_eq!(world.entity(source).unwrap().color, colors::LIGHT_RED);

        // Re-touching a drained source gives nothing
        world.history.clear();
        collision_pass(&mut world, &mut events);
        assert_eq!(
            world.entity(robot).unwrap().as_agent().unwrap().energy(),
            INITIAL_ENERGY + 80.0
        );
        let charges = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Charged { .. }))
            .count();
        assert_eq!(charges, 1);
    }
}
