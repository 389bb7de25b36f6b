use std::collections::HashMap;

use crate::ecs::entity::Entity;

/// Which persistence aggregates of a character have diverged from the
/// durable store. Systems set flags after mutation; the repository reads
/// and clears them when it flushes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub attributes: bool,
    pub items: bool,
    pub equipment: bool,
    pub skills: bool,
}

impl DirtyFlags {
    pub fn any(self) -> bool {
        self.attributes || self.items || self.equipment || self.skills
    }
}

#[derive(Default)]
pub struct DirtyTracker {
    flags: HashMap<Entity, DirtyFlags>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_attributes(&mut self, entity: Entity) {
        self.flags.entry(entity).or_default().attributes = true;
    }

    pub fn mark_items(&mut self, entity: Entity) {
        self.flags.entry(entity).or_default().items = true;
    }

    pub fn mark_equipment(&mut self, entity: Entity) {
        self.flags.entry(entity).or_default().equipment = true;
    }

    pub fn mark_skills(&mut self, entity: Entity) {
        self.flags.entry(entity).or_default().skills = true;
    }

    pub fn flags(&self, entity: Entity) -> DirtyFlags {
        self.flags.get(&entity).copied().unwrap_or_default()
    }

    /// Reads and clears the flags for one entity.
    pub fn take(&mut self, entity: Entity) -> DirtyFlags {
        self.flags.remove(&entity).unwrap_or_default()
    }

    /// Entities with at least one dirty aggregate.
    pub fn dirty_entities(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .flags
            .iter()
            .filter(|(_, flags)| flags.any())
            .map(|(entity, _)| *entity)
            .collect();
        entities.sort();
        entities
    }

    pub fn clear(&mut self, entity: Entity) {
        self.flags.remove(&entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_reads_and_clears() {
        let mut tracker = DirtyTracker::new();
        let entity = Entity::from_bits(5);
        tracker.mark_attributes(entity);
        tracker.mark_skills(entity);

        let flags = tracker.take(entity);
        assert!(flags.attributes && flags.skills);
        assert!(!flags.items && !flags.equipment);
        assert!(!tracker.flags(entity).any());
    }
}
