use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::persist::data::{CharacterData, EquipmentSlotData, InventorySlotData};

/// The KV cache in front of the database. Values are JSON documents
/// under `char:{id}`-style keys; sessions carry a TTL, character keys do
/// not. `is_ready` gates the write-behind path: when the cache is down,
/// the repository falls back to synchronous database writes.
pub trait Cache: Send {
    fn is_ready(&self) -> bool;

    // Sessions (TTL)
    fn set_session(&mut self, account_id: u64, token: &str, ttl: Duration) -> bool;
    fn get_session(&mut self, account_id: u64) -> Option<String>;
    fn delete_session(&mut self, account_id: u64) -> bool;

    // Character aggregates
    fn cache_character(&mut self, data: &CharacterData) -> bool;
    fn get_character(&mut self, character_id: u32) -> Option<CharacterData>;
    fn delete_character(&mut self, character_id: u32) -> bool;

    fn cache_equipment(&mut self, character_id: u32, equipment: &[EquipmentSlotData]) -> bool;
    fn get_equipment(&mut self, character_id: u32) -> Option<Vec<EquipmentSlotData>>;

    fn cache_inventory(&mut self, character_id: u32, inventory: &[InventorySlotData]) -> bool;
    fn get_inventory(&mut self, character_id: u32) -> Option<Vec<InventorySlotData>>;

    // Per-map player sets
    fn add_player_to_map(&mut self, map_id: u32, character_id: u32) -> bool;
    fn remove_player_from_map(&mut self, map_id: u32, character_id: u32) -> bool;
    fn get_map_players(&mut self, map_id: u32) -> Vec<u32>;
}

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-memory cache with optional per-entry TTL.
#[derive(Default)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
    map_players: HashMap<u32, HashSet<u32>>,
    ready: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            map_players: HashMap::new(),
            ready: true,
        }
    }

    /// A cache that reports not-ready, for exercising the synchronous
    /// fallback path.
    pub fn offline() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    fn set_json<T: Serialize>(&mut self, key: String, value: &T, ttl: Option<Duration>) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => {
                self.entries.insert(
                    key,
                    CacheEntry {
                        value: json,
                        expires_at: ttl.map(|ttl| Instant::now() + ttl),
                    },
                );
                true
            }
            Err(err) => {
                warn!("cache serialization failed for {key}: {err}");
                false
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let expired = self
            .entries
            .get(key)?
            .expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at);
        if expired {
            self.entries.remove(key);
            return None;
        }
        let entry = self.entries.get(key)?;
        match serde_json::from_str(&entry.value) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("cache deserialization failed for {key}: {err}");
                None
            }
        }
    }

    fn character_key(character_id: u32) -> String {
        format!("char:{character_id}")
    }

    fn equipment_key(character_id: u32) -> String {
        format!("char:{character_id}:equip")
    }

    fn inventory_key(character_id: u32) -> String {
        format!("char:{character_id}:inv")
    }

    fn session_key(account_id: u64) -> String {
        format!("session:{account_id}")
    }
}

impl Cache for MemoryCache {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn set_session(&mut self, account_id: u64, token: &str, ttl: Duration) -> bool {
        self.set_json(Self::session_key(account_id), &token.to_string(), Some(ttl))
    }

    fn get_session(&mut self, account_id: u64) -> Option<String> {
        self.get_json(&Self::session_key(account_id))
    }

    fn delete_session(&mut self, account_id: u64) -> bool {
        self.entries.remove(&Self::session_key(account_id)).is_some()
    }

    fn cache_character(&mut self, data: &CharacterData) -> bool {
        self.set_json(Self::character_key(data.id), data, None)
    }

    fn get_character(&mut self, character_id: u32) -> Option<CharacterData> {
        self.get_json(&Self::character_key(character_id))
    }

    fn delete_character(&mut self, character_id: u32) -> bool {
        let existed = self
            .entries
            .remove(&Self::character_key(character_id))
            .is_some();
        self.entries.remove(&Self::equipment_key(character_id));
        self.entries.remove(&Self::inventory_key(character_id));
        existed
    }

    fn cache_equipment(&mut self, character_id: u32, equipment: &[EquipmentSlotData]) -> bool {
        self.set_json(Self::equipment_key(character_id), &equipment.to_vec(), None)
    }

    fn get_equipment(&mut self, character_id: u32) -> Option<Vec<EquipmentSlotData>> {
        self.get_json(&Self::equipment_key(character_id))
    }

    fn cache_inventory(&mut self, character_id: u32, inventory: &[InventorySlotData]) -> bool {
        self.set_json(Self::inventory_key(character_id), &inventory.to_vec(), None)
    }

    fn get_inventory(&mut self, character_id: u32) -> Option<Vec<InventorySlotData>> {
        self.get_json(&Self::inventory_key(character_id))
    }

    fn add_player_to_map(&mut self, map_id: u32, character_id: u32) -> bool {
        self.map_players
            .entry(map_id)
            .or_default()
            .insert(character_id)
    }

    fn remove_player_from_map(&mut self, map_id: u32, character_id: u32) -> bool {
        self.map_players
            .get_mut(&map_id)
            .is_some_and(|players| players.remove(&character_id))
    }

    fn get_map_players(&mut self, map_id: u32) -> Vec<u32> {
        let mut players: Vec<u32> = self
            .map_players
            .get(&map_id)
            .map(|players| players.iter().copied().collect())
            .unwrap_or_default();
        players.sort();
        players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_round_trip() {
        let mut cache = MemoryCache::new();
        let data = CharacterData {
            id: 9,
            name: "cached".into(),
            ..Default::default()
        };
        assert!(cache.cache_character(&data));
        assert_eq!(cache.get_character(9), Some(data));
        assert!(cache.delete_character(9));
        assert_eq!(cache.get_character(9), None);
    }

    #[test]
    fn sessions_expire() {
        let mut cache = MemoryCache::new();
        assert!(cache.set_session(42, "token", Duration::from_secs(0)));
        // A zero TTL is already expired.
        assert_eq!(cache.get_session(42), None);

        assert!(cache.set_session(42, "token", Duration::from_secs(60)));
        assert_eq!(cache.get_session(42), Some("token".into()));
    }

    #[test]
    fn map_player_sets() {
        let mut cache = MemoryCache::new();
        assert!(cache.add_player_to_map(3, 55));
        assert!(cache.add_player_to_map(3, 56));
        assert!(!cache.add_player_to_map(3, 55));
        assert_eq!(cache.get_map_players(3), vec![55, 56]);
        assert!(cache.remove_player_from_map(3, 55));
        assert_eq!(cache.get_map_players(3), vec![56]);
    }
}
