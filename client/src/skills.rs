//! Client-side skill state: the learned list with hotkey bindings and
//! the cooldown clocks the UI reads. Authoritative values arrive in
//! skill responses; this mirror only counts time down between them.

use std::collections::HashMap;

/// One skill as the client knows it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KnownSkill {
    pub skill_id: u32,
    pub level: u8,
    /// Hotkey binding: 0 unbound, 1..=8 bound.
    pub hotkey: u8,
}

/// The character's skill book.
#[derive(Default)]
pub struct SkillBook {
    skills: HashMap<u32, KnownSkill>,
    /// skill_id -> remaining cooldown in milliseconds.
    cooldowns: HashMap<u32, f32>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn learn(&mut self, skill_id: u32, level: u8) {
        let entry = self.skills.entry(skill_id).or_insert(KnownSkill {
            skill_id,
            level,
            hotkey: 0,
        });
        entry.level = level;
    }

    pub fn forget(&mut self, skill_id: u32) -> bool {
        self.cooldowns.remove(&skill_id);
        self.skills.remove(&skill_id).is_some()
    }

    pub fn get(&self, skill_id: u32) -> Option<KnownSkill> {
        self.skills.get(&skill_id).copied()
    }

    /// Binds a hotkey (1..=8), stealing it from any other skill. Zero
    /// unbinds.
    pub fn bind_hotkey(&mut self, skill_id: u32, hotkey: u8) -> bool {
        if hotkey > 8 || !self.skills.contains_key(&skill_id) {
            return false;
        }
        if hotkey != 0 {
            for skill in self.skills.values_mut() {
                if skill.hotkey == hotkey {
                    skill.hotkey = 0;
                }
            }
        }
        if let Some(skill) = self.skills.get_mut(&skill_id) {
            skill.hotkey = hotkey;
        }
        true
    }

    pub fn skill_on_hotkey(&self, hotkey: u8) -> Option<KnownSkill> {
        if hotkey == 0 {
            return None;
        }
        self.skills
            .values()
            .find(|skill| skill.hotkey == hotkey)
            .copied()
    }

    /// Starts a cooldown as confirmed by the server.
    pub fn start_cooldown(&mut self, skill_id: u32, cooldown_ms: u32) {
        if cooldown_ms > 0 {
            self.cooldowns.insert(skill_id, cooldown_ms as f32);
        }
    }

    pub fn is_ready(&self, skill_id: u32) -> bool {
        !self.cooldowns.contains_key(&skill_id)
    }

    pub fn remaining_cooldown_ms(&self, skill_id: u32) -> f32 {
        self.cooldowns.get(&skill_id).copied().unwrap_or(0.0)
    }

    /// Counts cooldowns down; expired ones are dropped.
    pub fn update(&mut self, delta_ms: f32) {
        self.cooldowns.retain(|_, remaining| {
            *remaining -= delta_ms;
            *remaining > 0.0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkeys_are_exclusive() {
        let mut book = SkillBook::new();
        book.learn(101, 1);
        book.learn(102, 1);

        assert!(book.bind_hotkey(101, 3));
        assert!(book.bind_hotkey(102, 3));
        assert_eq!(book.skill_on_hotkey(3).unwrap().skill_id, 102);
        assert_eq!(book.get(101).unwrap().hotkey, 0);

        assert!(!book.bind_hotkey(101, 9));
        assert!(!book.bind_hotkey(999, 1));
    }

    #[test]
    fn cooldowns_tick_down_and_expire() {
        let mut book = SkillBook::new();
        book.learn(101, 1);
        book.start_cooldown(101, 1_500);

        assert!(!book.is_ready(101));
        book.update(1_000.0);
        assert_eq!(book.remaining_cooldown_ms(101), 500.0);
        book.update(600.0);
        assert!(book.is_ready(101));
    }

    #[test]
    fn relearning_updates_the_level() {
        let mut book = SkillBook::new();
        book.learn(101, 1);
        book.learn(101, 2);
        assert_eq!(book.get(101).unwrap().level, 2);
        assert_eq!(book.len(), 1);

        assert!(book.forget(101));
        assert!(book.is_empty());
    }
}
