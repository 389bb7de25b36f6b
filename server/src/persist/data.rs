use serde::{Deserialize, Serialize};

use emberfall_shared::types::{CharacterClass, CharacterId, Gender, MapId};

/// The persisted character row: identity, attributes, and location. The
/// equipment/inventory/skill aggregates are separate tables keyed by
/// `character_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterData {
    pub id: CharacterId,
    pub account_id: u64,
    pub name: String,
    pub class: CharacterClass,
    pub gender: Gender,
    pub level: u16,
    pub exp: u64,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub speed: i32,
    pub gold: i64,
    pub map_id: MapId,
    pub x: i32,
    pub y: i32,
    pub created_at: i64,
    pub last_login: i64,
}

impl CharacterData {
    /// Class-preset starting values for a freshly created character.
    pub fn new_for_class(
        id: CharacterId,
        account_id: u64,
        name: String,
        class: CharacterClass,
        gender: Gender,
    ) -> Self {
        let (hp, mp, attack, defense, magic_attack, magic_defense) = match class {
            CharacterClass::Warrior => (120, 40, 12, 8, 2, 4),
            CharacterClass::Mage => (70, 110, 5, 4, 14, 8),
            CharacterClass::Taoist => (90, 80, 8, 6, 9, 9),
        };
        Self {
            id,
            account_id,
            name,
            class,
            gender,
            level: 1,
            hp,
            max_hp: hp,
            mp,
            max_mp: mp,
            attack,
            defense,
            magic_attack,
            magic_defense,
            speed: 100,
            map_id: 1,
            x: 50,
            y: 50,
            ..Default::default()
        }
    }
}

/// One equipped item row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSlotData {
    pub slot: u8,
    pub item_template_id: u32,
    pub instance_id: u64,
    pub durability: i32,
    pub enhancement_level: i8,
}

/// One bag item row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySlotData {
    pub slot: i32,
    pub item_template_id: u32,
    pub instance_id: u64,
    pub quantity: i32,
    pub durability: i32,
    pub enhancement_level: i8,
}

/// One learned-skill row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterSkillData {
    pub skill_id: u32,
    pub level: i32,
    pub experience: i32,
}

/// One account row. `username` is unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub created_at: i64,
    pub last_login: i64,
    pub banned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_data_round_trips_through_json() {
        let data = CharacterData::new_for_class(
            55,
            42,
            "Aldric".into(),
            CharacterClass::Warrior,
            Gender::Male,
        );
        let json = serde_json::to_string(&data).unwrap();
        let back: CharacterData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn class_presets_differ() {
        let warrior = CharacterData::new_for_class(
            1,
            1,
            "w".into(),
            CharacterClass::Warrior,
            Gender::Male,
        );
        let mage =
            CharacterData::new_for_class(2, 1, "m".into(), CharacterClass::Mage, Gender::Female);
        assert!(warrior.max_hp > mage.max_hp);
        assert!(mage.magic_attack > warrior.magic_attack);
    }
}
