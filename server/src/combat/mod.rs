//! The combat resolver. Every hp/mp mutation in the world routes through
//! this module so the invariants (`0 <= hp <= max_hp`, minimum 1 damage
//! on a landed hit, death exactly at hp 0) hold globally.

pub mod attack_type;
pub mod resolver;
pub mod rng;

pub use attack_type::{attack_modifier, AttackModifier, AttackType};
pub use resolver::*;
pub use rng::{CombatRng, ScriptedRng, SeededRng};

use thiserror::Error;

use crate::systems::{System, SystemContext};

/// Schedule member that ages timed status effects (stun, poison) and
/// drops the expired ones. Runs first each tick so effects applied last
/// tick gate this tick's AI and movement.
pub struct CombatTickSystem;

impl System for CombatTickSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        let dt = ctx.dt;
        for (_, effects) in ctx.world.registry.effects.iter_mut() {
            effects.tick(dt);
        }
    }
}

/// Tunable combat constants. The formula shape is fixed; these numbers
/// are data.
#[derive(Clone, Copy, Debug)]
pub struct CombatConfig {
    pub base_miss_chance: f32,
    pub base_critical_chance: f32,
    pub critical_multiplier: f32,
    /// Damage varies uniformly within `+/- variance_pct` of the base.
    pub variance_pct: f32,
    pub default_melee_range: i32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_miss_chance: 0.05,
            base_critical_chance: 0.05,
            critical_multiplier: 1.5,
            variance_pct: 0.1,
            default_melee_range: 1,
        }
    }
}

/// Outcome of one damage computation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DamageResult {
    pub base_damage: i32,
    pub variance: i32,
    pub final_damage: i32,
    pub is_critical: bool,
    pub is_miss: bool,
}

impl DamageResult {
    pub fn miss() -> Self {
        Self {
            is_miss: true,
            ..Default::default()
        }
    }
}

/// Why an attack could not be resolved. These map one-to-one onto client
/// response codes and are never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttackError {
    #[error("attacker is missing or dead")]
    AttackerInvalid,
    #[error("target not found")]
    TargetNotFound,
    #[error("target is dead")]
    TargetDead,
    #[error("target out of range")]
    TargetOutOfRange,
}

/// A resolved attack against the primary target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackOutcome {
    pub damage: DamageResult,
    pub target_died: bool,
}
