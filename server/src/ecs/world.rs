use emberfall_shared::types::TilePoint;
use emberfall_shared::SpatialGrid;

use crate::ecs::dirty::DirtyTracker;
use crate::ecs::entity::Entity;
use crate::ecs::events::EventQueue;
use crate::ecs::registry::Registry;

/// The authoritative world: the component registry, the spatial index,
/// the event queue, and the dirty tracker. Owned and mutated exclusively
/// by the logic thread.
pub struct World {
    pub registry: Registry,
    pub grid: SpatialGrid<Entity>,
    pub events: EventQueue,
    pub dirty: DirtyTracker,
    /// Seconds of simulated time since the world was created.
    pub elapsed_secs: f64,
}

impl World {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            grid: SpatialGrid::new(1),
            events: EventQueue::new(),
            dirty: DirtyTracker::new(),
            elapsed_secs: 0.0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        (self.elapsed_secs * 1000.0) as u64
    }

    /// Moves an entity's transform and keeps the spatial index in step.
    /// Returns false for entities without a transform.
    pub fn set_position(&mut self, entity: Entity, position: TilePoint) -> bool {
        let Some(transform) = self.registry.transforms.get_mut(entity) else {
            return false;
        };
        let old = transform.position;
        transform.position = position;
        self.grid.move_to(entity, old, position);
        true
    }

    /// Destroys an entity and removes it from the spatial index.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if let Some(transform) = self.registry.transforms.get(entity) {
            self.grid.unindex(entity, transform.position);
        }
        self.registry.destroy(entity)
    }

    /// Spawns an entity with a transform and indexes it.
    pub fn spawn_at(&mut self, position: TilePoint, map_id: u32) -> Entity {
        let entity = self.registry.create();
        self.registry.transforms.insert(
            entity,
            crate::ecs::components::Transform {
                position,
                map_id,
                ..Default::default()
            },
        );
        self.grid.index(entity, position);
        entity
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_indexes_and_despawn_unindexes() {
        let mut world = World::new();
        let entity = world.spawn_at(TilePoint::new(4, 4), 1);
        assert_eq!(world.grid.query_at(TilePoint::new(4, 4)), vec![entity]);

        assert!(world.despawn(entity));
        assert!(world.grid.query_at(TilePoint::new(4, 4)).is_empty());
        assert!(!world.registry.is_alive(entity));
    }

    #[test]
    fn set_position_moves_the_grid_entry() {
        let mut world = World::new();
        let entity = world.spawn_at(TilePoint::new(0, 0), 1);
        assert!(world.set_position(entity, TilePoint::new(9, 9)));
        assert!(world.grid.query_at(TilePoint::new(0, 0)).is_empty());
        assert_eq!(world.grid.query_at(TilePoint::new(9, 9)), vec![entity]);
    }
}
