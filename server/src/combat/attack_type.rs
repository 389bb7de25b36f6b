/// Attack shape selected by the client (or a monster skill). Unknown wire
/// values decay to `Normal`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttackType {
    #[default]
    Normal,
    /// Two independent strikes on the same target.
    TwinStrike,
    /// Square AOE centered on the target.
    Sweep,
    /// Single slow hit at increased damage, easier to evade.
    Heavy,
    /// Extended reach at reduced damage.
    Lunge,
}

impl AttackType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AttackType::TwinStrike,
            2 => AttackType::Sweep,
            3 => AttackType::Heavy,
            4 => AttackType::Lunge,
            _ => AttackType::Normal,
        }
    }
}

/// Per-shape modifiers applied around the core damage pipeline. Each
/// sub-hit resolves independently; the primary target's totals are
/// aggregated into the single reported result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackModifier {
    pub hit_count: u32,
    /// Chebyshev radius around the target; `None` means single-target.
    pub aoe_radius: Option<i32>,
    /// Overrides the attacker's range when larger.
    pub range_override: Option<i32>,
    pub damage_scalar: f32,
    /// Added to (positive) or subtracted from (negative) the miss chance.
    pub miss_chance_delta: f32,
}

pub fn attack_modifier(attack_type: AttackType) -> AttackModifier {
    match attack_type {
        AttackType::Normal => AttackModifier {
            hit_count: 1,
            aoe_radius: None,
            range_override: None,
            damage_scalar: 1.0,
            miss_chance_delta: 0.0,
        },
        AttackType::TwinStrike => AttackModifier {
            hit_count: 2,
            aoe_radius: None,
            range_override: None,
            damage_scalar: 0.6,
            miss_chance_delta: 0.0,
        },
        AttackType::Sweep => AttackModifier {
            hit_count: 1,
            aoe_radius: Some(2),
            range_override: None,
            damage_scalar: 0.8,
            miss_chance_delta: 0.0,
        },
        AttackType::Heavy => AttackModifier {
            hit_count: 1,
            aoe_radius: None,
            range_override: None,
            damage_scalar: 1.6,
            miss_chance_delta: 0.1,
        },
        AttackType::Lunge => AttackModifier {
            hit_count: 1,
            aoe_radius: None,
            range_override: Some(3),
            damage_scalar: 0.75,
            miss_chance_delta: -0.02,
        },
    }
}
