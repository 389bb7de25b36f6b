//! Write-behind ordering: the cache absorbs saves immediately, the
//! database sees one transaction per character at flush time, and dirty
//! ids survive failures.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use emberfall_server::persist::{
    AccountData, Cache, CharacterData, CharacterRepository, CharacterSkillData, Database,
    EquipmentSlotData, InventorySlotData, MemoryCache, MemoryDatabase, PersistError,
};

/// Wraps the in-memory database, recording call order and optionally
/// failing a named call.
struct RecordingDatabase {
    inner: MemoryDatabase,
    calls: Arc<Mutex<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl RecordingDatabase {
    fn new(calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            inner: MemoryDatabase::new(),
            calls,
            fail_on: None,
        }
    }

    fn record(&self, call: &str) -> Result<(), PersistError> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.fail_on == Some(call) {
            return Err(PersistError::DatabaseError(format!("injected: {call}")));
        }
        Ok(())
    }
}

impl Database for RecordingDatabase {
    fn save_character(&mut self, data: &CharacterData) -> Result<(), PersistError> {
        self.record("save_character")?;
        self.inner.save_character(data)
    }

    fn load_character(&mut self, character_id: u32) -> Result<CharacterData, PersistError> {
        self.inner.load_character(character_id)
    }

    fn load_characters_by_account(
        &mut self,
        account_id: u64,
    ) -> Result<Vec<CharacterData>, PersistError> {
        self.inner.load_characters_by_account(account_id)
    }

    fn delete_character(&mut self, character_id: u32) -> Result<(), PersistError> {
        self.inner.delete_character(character_id)
    }

    fn character_name_exists(&mut self, name: &str) -> Result<bool, PersistError> {
        self.inner.character_name_exists(name)
    }

    fn next_character_id(&mut self) -> Result<u32, PersistError> {
        self.inner.next_character_id()
    }

    fn begin_transaction(&mut self) -> Result<(), PersistError> {
        self.record("begin")?;
        self.inner.begin_transaction()
    }

    fn commit(&mut self) -> Result<(), PersistError> {
        self.record("commit")?;
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), PersistError> {
        self.record("rollback")?;
        self.inner.rollback()
    }

    fn save_equipment(
        &mut self,
        character_id: u32,
        equipment: &[EquipmentSlotData],
    ) -> Result<(), PersistError> {
        self.record("save_equipment")?;
        self.inner.save_equipment(character_id, equipment)
    }

    fn save_inventory(
        &mut self,
        character_id: u32,
        inventory: &[InventorySlotData],
    ) -> Result<(), PersistError> {
        self.record("save_inventory")?;
        self.inner.save_inventory(character_id, inventory)
    }

    fn save_skills(
        &mut self,
        character_id: u32,
        skills: &[CharacterSkillData],
    ) -> Result<(), PersistError> {
        self.inner.save_skills(character_id, skills)
    }

    fn load_account(&mut self, username: &str) -> Result<AccountData, PersistError> {
        self.inner.load_account(username)
    }

    fn create_account(&mut self, account: &AccountData) -> Result<(), PersistError> {
        self.inner.create_account(account)
    }
}

fn character(id: u32) -> CharacterData {
    CharacterData {
        id,
        account_id: 1,
        name: format!("flusher{id}"),
        ..Default::default()
    }
}

#[test]
fn flush_runs_one_transaction_in_aggregate_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let db = RecordingDatabase::new(calls.clone());
    let mut repository = CharacterRepository::new(db, MemoryCache::new());
    repository.set_flush_interval(Duration::ZERO);

    repository.save_character(&character(55)).unwrap();
    repository.save_equipment(55, &[]).unwrap();
    repository.save_inventory(55, &[]).unwrap();
    // Nothing has touched the database yet.
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(repository.cache().get_character(55), Some(character(55)));

    repository.flush_dirty_characters();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "begin".to_string(),
            "save_character".to_string(),
            "save_equipment".to_string(),
            "save_inventory".to_string(),
            "commit".to_string(),
        ]
    );
    assert!(repository.dirty_ids().is_empty());
    assert_eq!(repository.db().load_character(55).unwrap(), character(55));
}

#[test]
fn failed_transaction_rolls_back_and_keeps_the_dirty_id() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut db = RecordingDatabase::new(calls.clone());
    db.fail_on = Some("save_inventory");
    let mut repository = CharacterRepository::new(db, MemoryCache::new());
    repository.set_flush_interval(Duration::ZERO);

    repository.save_character(&character(9)).unwrap();
    repository.save_equipment(9, &[]).unwrap();
    repository.save_inventory(9, &[]).unwrap();

    repository.flush_dirty_characters();

    let recorded = calls.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            "begin".to_string(),
            "save_character".to_string(),
            "save_equipment".to_string(),
            "save_inventory".to_string(),
            "rollback".to_string(),
        ]
    );
    // The id stays dirty and the cache still holds the data for retry.
    assert_eq!(repository.dirty_ids(), vec![9]);
    assert_eq!(repository.cache().get_character(9), Some(character(9)));
    assert_eq!(
        repository.db().load_character(9),
        Err(PersistError::CharacterNotFound)
    );
}

#[test]
fn flush_throttle_holds_between_intervals() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let db = RecordingDatabase::new(calls.clone());
    let mut repository = CharacterRepository::new(db, MemoryCache::new());
    repository.set_flush_interval(Duration::from_secs(3600));

    repository.save_character(&character(2)).unwrap();
    repository.save_equipment(2, &[]).unwrap();
    repository.save_inventory(2, &[]).unwrap();

    // First flush runs immediately; the second is inside the interval.
    repository.flush_dirty_characters();
    let after_first = calls.lock().unwrap().len();
    assert!(after_first > 0);

    repository.save_character(&character(3)).unwrap();
    repository.flush_dirty_characters();
    assert_eq!(calls.lock().unwrap().len(), after_first);
    assert_eq!(repository.dirty_ids(), vec![3]);
}
