//! The server-authoritative entity mirror. Every mutation originates
//! from a server message; the mirror only adds smoothing and spatial
//! indexing on top.

use std::collections::HashMap;

use emberfall_shared::protocol::messages::game::{EntityKind, EntitySnapshot};
use emberfall_shared::types::{Rect, TilePoint};
use emberfall_shared::SpatialGrid;

use crate::interpolate::EntityInterpolator;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityStats {
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub level: u16,
}

/// One mirrored entity: discrete tile state plus the interpolator that
/// smooths it for rendering.
#[derive(Clone, Debug)]
pub struct Entity {
    pub id: u64,
    pub kind: EntityKind,
    pub name: String,
    pub position: TilePoint,
    pub direction: u8,
    pub stats: EntityStats,
    pub template_id: u32,
    pub monster_state: u8,
    pub target_id: u64,
    pub interpolator: EntityInterpolator,
}

impl Entity {
    pub fn from_snapshot(snapshot: &EntitySnapshot) -> Self {
        let mut entity = Self {
            id: snapshot.entity_id,
            kind: snapshot.kind,
            name: snapshot.name.clone(),
            position: TilePoint::new(snapshot.x, snapshot.y),
            direction: snapshot.direction,
            stats: EntityStats {
                hp: snapshot.hp,
                max_hp: snapshot.max_hp,
                mp: snapshot.mp,
                max_mp: snapshot.max_mp,
                level: snapshot.level,
            },
            template_id: snapshot.template_id,
            monster_state: 0,
            target_id: 0,
            interpolator: EntityInterpolator::default(),
        };
        entity.interpolator.set_initial(entity.position);
        entity
    }
}

/// id -> entity table with a uniform spatial grid for range, position,
/// and view queries.
pub struct EntityMirror {
    entities: HashMap<u64, Entity>,
    grid: SpatialGrid<u64>,
    cell_size: i32,
}

impl EntityMirror {
    pub fn new(cell_size: i32) -> Self {
        Self {
            entities: HashMap::new(),
            grid: SpatialGrid::new(cell_size),
            cell_size,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.grid = SpatialGrid::new(self.cell_size);
    }

    /// Inserts a new entity. Returns false (and changes nothing) when
    /// the id already exists.
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity.id) {
            return false;
        }
        let id = entity.id;
        let position = entity.position;
        self.entities.insert(id, entity);
        self.grid.index(id, position);
        true
    }

    pub fn remove_entity(&mut self, id: u64) -> bool {
        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };
        self.grid.unindex(id, entity.position);
        true
    }

    /// Applies a full snapshot. A known entity interpolates toward the
    /// new state rather than snapping; an unknown one is added.
    pub fn update_entity(&mut self, snapshot: &EntitySnapshot) {
        match self.entities.get_mut(&snapshot.entity_id) {
            Some(entity) => {
                let old_position = entity.position;
                entity.kind = snapshot.kind;
                entity.name = snapshot.name.clone();
                entity.position = TilePoint::new(snapshot.x, snapshot.y);
                entity.direction = snapshot.direction;
                entity.stats = EntityStats {
                    hp: snapshot.hp,
                    max_hp: snapshot.max_hp,
                    mp: snapshot.mp,
                    max_mp: snapshot.max_mp,
                    level: snapshot.level,
                };
                entity.template_id = snapshot.template_id;
                entity
                    .interpolator
                    .receive_state(entity.position, snapshot.server_time_ms);
                let new_position = entity.position;
                self.grid
                    .move_to(snapshot.entity_id, old_position, new_position);
            }
            None => {
                self.add_entity(Entity::from_snapshot(snapshot));
            }
        }
    }

    /// Applies a position-only update.
    pub fn update_entity_position(
        &mut self,
        id: u64,
        position: TilePoint,
        direction: u8,
        server_time_ms: u64,
    ) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        let old_position = entity.position;
        entity.position = position;
        entity.direction = direction;
        entity.interpolator.receive_state(position, server_time_ms);
        self.grid.move_to(id, old_position, position);
        true
    }

    pub fn update_entity_stats(&mut self, id: u64, stats: EntityStats) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        entity.stats = stats;
        true
    }

    /// Advances every entity's interpolator.
    pub fn update_interpolators(&mut self, delta_ms: f32) {
        for entity in self.entities.values_mut() {
            entity.interpolator.update(delta_ms);
        }
    }

    /// Entities within the square of `radius` tiles around `center`.
    pub fn query_range(&self, center: TilePoint, radius: i32) -> Vec<&Entity> {
        self.grid
            .query_range(center, radius)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .collect()
    }

    /// Entities standing exactly on `position`.
    pub fn query_at(&self, position: TilePoint) -> Vec<&Entity> {
        self.grid
            .query_at(position)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .collect()
    }

    /// Entities overlapping the padded camera rectangle, stable-sorted
    /// by (y, x, id) for deterministic render order.
    pub fn entities_in_view(&self, camera_bounds: Rect, padding: i32) -> Vec<&Entity> {
        self.grid
            .query_view(camera_bounds, padding)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .collect()
    }
}

impl Default for EntityMirror {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: u64, x: i32, y: i32) -> EntitySnapshot {
        EntitySnapshot {
            entity_id: id,
            kind: EntityKind::Monster,
            name: format!("m{id}"),
            x,
            y,
            direction: 0,
            map_id: 1,
            hp: 10,
            max_hp: 10,
            mp: 0,
            max_mp: 0,
            level: 1,
            template_id: 7,
            server_time_ms: 1_000,
        }
    }

    #[test]
    fn add_remove_and_duplicate_adds() {
        let mut mirror = EntityMirror::default();
        assert!(mirror.add_entity(Entity::from_snapshot(&snapshot(1, 2, 3))));
        assert!(!mirror.add_entity(Entity::from_snapshot(&snapshot(1, 9, 9))));
        assert_eq!(mirror.len(), 1);

        assert!(mirror.remove_entity(1));
        assert!(!mirror.remove_entity(1));
        assert!(mirror.is_empty());
    }

    #[test]
    fn update_known_entity_interpolates_not_snaps() {
        let mut mirror = EntityMirror::default();
        mirror.update_entity(&snapshot(1, 0, 0));

        let mut moved = snapshot(1, 10, 0);
        moved.server_time_ms = 1_100;
        mirror.update_entity(&moved);

        let entity = mirror.get(1).unwrap();
        // Discrete position is authoritative immediately...
        assert_eq!(entity.position, TilePoint::new(10, 0));
        // ...while the rendered position is still traveling.
        assert!(entity.interpolator.position().x < 10.0);
    }

    #[test]
    fn view_query_is_y_major_sorted() {
        let mut mirror = EntityMirror::default();
        mirror.update_entity(&snapshot(5, 4, 2));
        mirror.update_entity(&snapshot(2, 1, 1));
        mirror.update_entity(&snapshot(9, 0, 2));

        let ids: Vec<u64> = mirror
            .entities_in_view(Rect::new(0, 0, 10, 10), 0)
            .iter()
            .map(|entity| entity.id)
            .collect();
        assert_eq!(ids, vec![2, 9, 5]);
    }

    #[test]
    fn position_update_moves_the_grid_entry() {
        let mut mirror = EntityMirror::default();
        mirror.update_entity(&snapshot(3, 1, 1));
        assert!(mirror.update_entity_position(3, TilePoint::new(6, 6), 4, 2_000));

        assert!(mirror.query_at(TilePoint::new(1, 1)).is_empty());
        assert_eq!(mirror.query_at(TilePoint::new(6, 6)).len(), 1);
        assert!(!mirror.update_entity_position(99, TilePoint::new(0, 0), 0, 0));
    }
}
