use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of every combat roll. Production injects a seeded [`SeededRng`];
/// tests inject [`ScriptedRng`] for deterministic outcomes.
pub trait CombatRng {
    /// Uniform float in `[0, 1)`.
    fn chance(&mut self) -> f32;

    /// Uniform float in `[low, high]`.
    fn range_f32(&mut self, low: f32, high: f32) -> f32;

    /// Uniform integer in `[low, high]`.
    fn range_i32(&mut self, low: i32, high: i32) -> i32;
}

/// The production roll source.
pub struct SeededRng {
    rng: SmallRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl CombatRng for SeededRng {
    fn chance(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn range_i32(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Test double that replays a scripted sequence of rolls. `chance` and
/// `range_f32` consume from the same script; once exhausted, rolls fall
/// back to fixed mid-range values.
#[derive(Default)]
pub struct ScriptedRng {
    rolls: VecDeque<f32>,
}

impl ScriptedRng {
    pub fn new(rolls: impl IntoIterator<Item = f32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    pub fn push(&mut self, roll: f32) {
        self.rolls.push_back(roll);
    }
}

impl CombatRng for ScriptedRng {
    fn chance(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(0.999)
    }

    fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        let t = self.rolls.pop_front().unwrap_or(0.5);
        low + (high - low) * t.clamp(0.0, 1.0)
    }

    fn range_i32(&mut self, low: i32, high: i32) -> i32 {
        let t = self.rolls.pop_front().unwrap_or(0.5);
        let span = (high - low) as f32;
        low + (span * t.clamp(0.0, 1.0)).round() as i32
    }
}
