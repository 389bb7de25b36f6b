use std::collections::HashMap;

use crate::persist::data::{
    AccountData, CharacterData, CharacterSkillData, EquipmentSlotData, InventorySlotData,
};
use crate::persist::error::PersistError;

/// The transactional relational store behind the repository. Aggregate
/// loads default to `NotImplemented` so partial backends can come up
/// before their schema is wired.
pub trait Database: Send {
    // Characters
    fn save_character(&mut self, data: &CharacterData) -> Result<(), PersistError>;
    fn load_character(&mut self, character_id: u32) -> Result<CharacterData, PersistError>;
    fn load_characters_by_account(
        &mut self,
        account_id: u64,
    ) -> Result<Vec<CharacterData>, PersistError>;
    fn delete_character(&mut self, character_id: u32) -> Result<(), PersistError>;
    fn character_name_exists(&mut self, name: &str) -> Result<bool, PersistError>;
    fn next_character_id(&mut self) -> Result<u32, PersistError>;

    // Transactions
    fn begin_transaction(&mut self) -> Result<(), PersistError>;
    fn commit(&mut self) -> Result<(), PersistError>;
    fn rollback(&mut self) -> Result<(), PersistError>;

    // Aggregates
    fn save_equipment(
        &mut self,
        character_id: u32,
        equipment: &[EquipmentSlotData],
    ) -> Result<(), PersistError>;
    fn save_inventory(
        &mut self,
        character_id: u32,
        inventory: &[InventorySlotData],
    ) -> Result<(), PersistError>;
    fn save_skills(
        &mut self,
        character_id: u32,
        skills: &[CharacterSkillData],
    ) -> Result<(), PersistError>;

    fn load_equipment(&mut self, _character_id: u32) -> Result<Vec<EquipmentSlotData>, PersistError> {
        Err(PersistError::NotImplemented)
    }

    fn load_inventory(&mut self, _character_id: u32) -> Result<Vec<InventorySlotData>, PersistError> {
        Err(PersistError::NotImplemented)
    }

    fn load_skills(&mut self, _character_id: u32) -> Result<Vec<CharacterSkillData>, PersistError> {
        Err(PersistError::NotImplemented)
    }

    // Accounts
    fn load_account(&mut self, username: &str) -> Result<AccountData, PersistError>;
    fn create_account(&mut self, account: &AccountData) -> Result<(), PersistError>;
}

#[derive(Clone, Default)]
struct Tables {
    characters: HashMap<u32, CharacterData>,
    equipment: HashMap<u32, Vec<EquipmentSlotData>>,
    inventory: HashMap<u32, Vec<InventorySlotData>>,
    skills: HashMap<u32, Vec<CharacterSkillData>>,
    accounts: HashMap<String, AccountData>,
}

/// In-memory store. Transactions snapshot the whole table set; rollback
/// restores the snapshot.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Tables,
    snapshot: Option<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character_count(&self) -> usize {
        self.tables.characters.len()
    }
}

impl Database for MemoryDatabase {
    fn save_character(&mut self, data: &CharacterData) -> Result<(), PersistError> {
        self.tables.characters.insert(data.id, data.clone());
        Ok(())
    }

    fn load_character(&mut self, character_id: u32) -> Result<CharacterData, PersistError> {
        self.tables
            .characters
            .get(&character_id)
            .cloned()
            .ok_or(PersistError::CharacterNotFound)
    }

    fn load_characters_by_account(
        &mut self,
        account_id: u64,
    ) -> Result<Vec<CharacterData>, PersistError> {
        let mut characters: Vec<CharacterData> = self
            .tables
            .characters
            .values()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect();
        characters.sort_by_key(|c| c.id);
        Ok(characters)
    }

    fn delete_character(&mut self, character_id: u32) -> Result<(), PersistError> {
        self.tables.characters.remove(&character_id);
        self.tables.equipment.remove(&character_id);
        self.tables.inventory.remove(&character_id);
        self.tables.skills.remove(&character_id);
        Ok(())
    }

    fn character_name_exists(&mut self, name: &str) -> Result<bool, PersistError> {
        Ok(self.tables.characters.values().any(|c| c.name == name))
    }

    fn next_character_id(&mut self) -> Result<u32, PersistError> {
        Ok(self
            .tables
            .characters
            .keys()
            .max()
            .map_or(1, |max| max + 1))
    }

    fn begin_transaction(&mut self) -> Result<(), PersistError> {
        if self.snapshot.is_some() {
            return Err(PersistError::DatabaseError(
                "transaction already open".into(),
            ));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PersistError> {
        if self.snapshot.take().is_none() {
            return Err(PersistError::DatabaseError("no open transaction".into()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PersistError> {
        match self.snapshot.take() {
            Some(snapshot) => {
                self.tables = snapshot;
                Ok(())
            }
            None => Err(PersistError::DatabaseError("no open transaction".into())),
        }
    }

    fn save_equipment(
        &mut self,
        character_id: u32,
        equipment: &[EquipmentSlotData],
    ) -> Result<(), PersistError> {
        self.tables
            .equipment
            .insert(character_id, equipment.to_vec());
        Ok(())
    }

    fn save_inventory(
        &mut self,
        character_id: u32,
        inventory: &[InventorySlotData],
    ) -> Result<(), PersistError> {
        self.tables
            .inventory
            .insert(character_id, inventory.to_vec());
        Ok(())
    }

    fn save_skills(
        &mut self,
        character_id: u32,
        skills: &[CharacterSkillData],
    ) -> Result<(), PersistError> {
        self.tables.skills.insert(character_id, skills.to_vec());
        Ok(())
    }

    fn load_equipment(&mut self, character_id: u32) -> Result<Vec<EquipmentSlotData>, PersistError> {
        Ok(self
            .tables
            .equipment
            .get(&character_id)
            .cloned()
            .unwrap_or_default())
    }

    fn load_inventory(&mut self, character_id: u32) -> Result<Vec<InventorySlotData>, PersistError> {
        Ok(self
            .tables
            .inventory
            .get(&character_id)
            .cloned()
            .unwrap_or_default())
    }

    fn load_skills(&mut self, character_id: u32) -> Result<Vec<CharacterSkillData>, PersistError> {
        Ok(self
            .tables
            .skills
            .get(&character_id)
            .cloned()
            .unwrap_or_default())
    }

    fn load_account(&mut self, username: &str) -> Result<AccountData, PersistError> {
        self.tables
            .accounts
            .get(username)
            .cloned()
            .ok_or(PersistError::AccountNotFound)
    }

    fn create_account(&mut self, account: &AccountData) -> Result<(), PersistError> {
        if self.tables.accounts.contains_key(&account.username) {
            return Err(PersistError::AccountAlreadyExists);
        }
        self.tables
            .accounts
            .insert(account.username.clone(), account.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_the_snapshot() {
        let mut db = MemoryDatabase::new();
        db.save_character(&CharacterData {
            id: 1,
            name: "keep".into(),
            ..Default::default()
        })
        .unwrap();

        db.begin_transaction().unwrap();
        db.save_character(&CharacterData {
            id: 2,
            name: "discard".into(),
            ..Default::default()
        })
        .unwrap();
        db.rollback().unwrap();

        assert!(db.load_character(1).is_ok());
        assert_eq!(db.load_character(2), Err(PersistError::CharacterNotFound));
    }

    #[test]
    fn duplicate_accounts_are_rejected() {
        let mut db = MemoryDatabase::new();
        let account = AccountData {
            id: 1,
            username: "ember".into(),
            ..Default::default()
        };
        db.create_account(&account).unwrap();
        assert_eq!(
            db.create_account(&account),
            Err(PersistError::AccountAlreadyExists)
        );
    }
}
