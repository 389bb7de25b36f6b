use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use emberfall_shared::FLUSH_INTERVAL;

use crate::persist::cache::Cache;
use crate::persist::data::{CharacterData, EquipmentSlotData, InventorySlotData};
use crate::persist::database::Database;
use crate::persist::error::PersistError;

/// Cache-first repository over a character store.
///
/// Reads hit the cache and fall back to the database (refilling the
/// cache). Saves go to the cache and mark the id dirty; the durable
/// write happens later in [`CharacterRepository::flush_dirty_characters`]
/// inside one transaction per character. A dirty id is only dropped
/// after its transaction commits.
pub struct CharacterRepository<D: Database, C: Cache> {
    db: D,
    cache: C,
    dirty: BTreeSet<u32>,
    flush_interval: Duration,
    last_flush: Option<Instant>,
}

impl<D: Database, C: Cache> CharacterRepository<D, C> {
    pub fn new(db: D, cache: C) -> Self {
        Self {
            db,
            cache,
            dirty: BTreeSet::new(),
            flush_interval: FLUSH_INTERVAL,
            last_flush: None,
        }
    }

    pub fn set_flush_interval(&mut self, interval: Duration) {
        self.flush_interval = interval;
    }

    pub fn db(&mut self) -> &mut D {
        &mut self.db
    }

    pub fn cache(&mut self) -> &mut C {
        &mut self.cache
    }

    pub fn dirty_ids(&self) -> Vec<u32> {
        self.dirty.iter().copied().collect()
    }

    pub fn mark_dirty(&mut self, character_id: u32) {
        self.dirty.insert(character_id);
    }

    /// Cache-first character load; a miss reads the database and refills
    /// the cache.
    pub fn load_character(&mut self, character_id: u32) -> Result<CharacterData, PersistError> {
        if self.cache.is_ready() {
            if let Some(data) = self.cache.get_character(character_id) {
                debug!("character {character_id} loaded from cache");
                return Ok(data);
            }
        }

        let data = self.db.load_character(character_id)?;
        if self.cache.is_ready() {
            self.cache.cache_character(&data);
        }
        debug!("character {character_id} loaded from database");
        Ok(data)
    }

    /// The write-behind save: cache write plus a dirty marker. Falls
    /// back to a synchronous database write when the cache is down.
    pub fn save_character(&mut self, data: &CharacterData) -> Result<(), PersistError> {
        if self.cache.is_ready() {
            if !self.cache.cache_character(data) {
                warn!("failed to cache character {}", data.id);
            }
            self.dirty.insert(data.id);
            return Ok(());
        }

        self.db.save_character(data).inspect_err(|err| {
            error!("failed to save character {}: {err}", data.id);
        })
    }

    pub fn delete_character(&mut self, character_id: u32) -> Result<(), PersistError> {
        if self.cache.is_ready() {
            self.cache.delete_character(character_id);
        }
        self.dirty.remove(&character_id);
        self.db.delete_character(character_id)
    }

    pub fn load_equipment(
        &mut self,
        character_id: u32,
    ) -> Result<Vec<EquipmentSlotData>, PersistError> {
        if self.cache.is_ready() {
            if let Some(equipment) = self.cache.get_equipment(character_id) {
                return Ok(equipment);
            }
        }
        self.db.load_equipment(character_id)
    }

    pub fn save_equipment(
        &mut self,
        character_id: u32,
        equipment: &[EquipmentSlotData],
    ) -> Result<(), PersistError> {
        if self.cache.is_ready() {
            if !self.cache.cache_equipment(character_id, equipment) {
                warn!("failed to cache equipment for character {character_id}");
            }
            self.dirty.insert(character_id);
            return Ok(());
        }
        self.db.save_equipment(character_id, equipment)
    }

    pub fn load_inventory(
        &mut self,
        character_id: u32,
    ) -> Result<Vec<InventorySlotData>, PersistError> {
        if self.cache.is_ready() {
            if let Some(inventory) = self.cache.get_inventory(character_id) {
                return Ok(inventory);
            }
        }
        self.db.load_inventory(character_id)
    }

    pub fn save_inventory(
        &mut self,
        character_id: u32,
        inventory: &[InventorySlotData],
    ) -> Result<(), PersistError> {
        if self.cache.is_ready() {
            if !self.cache.cache_inventory(character_id, inventory) {
                warn!("failed to cache inventory for character {character_id}");
            }
            self.dirty.insert(character_id);
            return Ok(());
        }
        self.db.save_inventory(character_id, inventory)
    }

    /// Writes all three aggregates inside one transaction, rolling back
    /// on the first failure. The cache is refreshed only after commit.
    pub fn save_character_full(
        &mut self,
        data: &CharacterData,
        equipment: &[EquipmentSlotData],
        inventory: &[InventorySlotData],
    ) -> Result<(), PersistError> {
        self.db.begin_transaction()?;

        if let Err(err) = self.db.save_character(data) {
            let _ = self.db.rollback();
            return Err(err);
        }
        if let Err(err) = self.db.save_equipment(data.id, equipment) {
            let _ = self.db.rollback();
            return Err(err);
        }
        if let Err(err) = self.db.save_inventory(data.id, inventory) {
            let _ = self.db.rollback();
            return Err(err);
        }
        if let Err(err) = self.db.commit() {
            let _ = self.db.rollback();
            return Err(err);
        }

        if self.cache.is_ready() {
            self.cache.cache_character(data);
            self.cache.cache_equipment(data.id, equipment);
            self.cache.cache_inventory(data.id, inventory);
        }

        info!("character {} saved transactionally", data.id);
        Ok(())
    }

    /// Throttled write-behind flush. A dirty id survives every failure
    /// mode (cache miss, transaction error) and is only removed once its
    /// transaction commits.
    pub fn flush_dirty_characters(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let now = Instant::now();
        if let Some(last_flush) = self.last_flush {
            if now.duration_since(last_flush) < self.flush_interval {
                return;
            }
        }
        self.last_flush = Some(now);

        if !self.cache.is_ready() {
            warn!("cache not ready, skipping dirty flush");
            return;
        }

        let candidates: Vec<u32> = self.dirty.iter().copied().collect();
        for character_id in candidates {
            let (Some(data), Some(equipment), Some(inventory)) = (
                self.cache.get_character(character_id),
                self.cache.get_equipment(character_id),
                self.cache.get_inventory(character_id),
            ) else {
                warn!("cache miss while flushing character {character_id}, retrying later");
                continue;
            };

            match self.save_character_full(&data, &equipment, &inventory) {
                Ok(()) => {
                    self.dirty.remove(&character_id);
                }
                Err(err) => {
                    error!("failed to flush character {character_id}: {err}");
                }
            }
        }
    }
}
