//! Position smoothing between authoritative server updates. Tiles stay
//! the unit: interpolation produces fractional tile positions for the
//! renderer and rounds back for logic queries.

use emberfall_shared::types::TilePoint;

/// Default interpolation window for direct position targets.
pub const DEFAULT_INTERPOLATION_MS: f32 = 200.0;
/// Fallback window for server-state interpolation when the update
/// interval is unknown.
pub const DEFAULT_ENTITY_INTERPOLATION_MS: f32 = 100.0;

/// Fractional tile position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionF {
    pub x: f32,
    pub y: f32,
}

impl PositionF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_tile(tile: TilePoint) -> Self {
        Self {
            x: tile.x as f32,
            y: tile.y as f32,
        }
    }

    pub fn to_tile(self) -> TilePoint {
        if !self.x.is_finite() || !self.y.is_finite() {
            return TilePoint::new(0, 0);
        }
        TilePoint::new(self.x.round() as i32, self.y.round() as i32)
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

pub fn lerp_position(start: PositionF, end: PositionF, t: f32) -> PositionF {
    PositionF::new(lerp(start.x, end.x, t), lerp(start.y, end.y, t))
}

/// Cubic ease-in/ease-out.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Ken Perlin's quintic variant.
pub fn smootherstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Drives a position toward an explicit target over a fixed duration,
/// linearly or with smoothstep easing.
#[derive(Clone, Debug)]
pub struct PositionInterpolator {
    current: PositionF,
    start: PositionF,
    target: PositionF,
    duration_ms: f32,
    elapsed_ms: f32,
    interpolating: bool,
    smoothing: bool,
}

impl Default for PositionInterpolator {
    fn default() -> Self {
        Self {
            current: PositionF::default(),
            start: PositionF::default(),
            target: PositionF::default(),
            duration_ms: 0.0,
            elapsed_ms: 0.0,
            interpolating: false,
            smoothing: true,
        }
    }
}

impl PositionInterpolator {
    pub fn new(initial: TilePoint) -> Self {
        let position = PositionF::from_tile(initial);
        Self {
            current: position,
            start: position,
            target: position,
            ..Default::default()
        }
    }

    /// Starts interpolating from the current position to `target`.
    pub fn set_target(&mut self, target: TilePoint, duration_ms: f32) {
        self.start = self.current;
        self.target = PositionF::from_tile(target);
        self.duration_ms = duration_ms.max(0.0);
        self.elapsed_ms = 0.0;
        self.interpolating = true;
    }

    /// Snaps to a position with no interpolation.
    pub fn set_immediate(&mut self, position: TilePoint) {
        self.current = PositionF::from_tile(position);
        self.start = self.current;
        self.target = self.current;
        self.interpolating = false;
        self.elapsed_ms = 0.0;
    }

    pub fn update(&mut self, delta_ms: f32) {
        if !self.interpolating {
            return;
        }
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms >= self.duration_ms {
            self.current = self.target;
            self.interpolating = false;
            return;
        }
        let mut t = self.elapsed_ms / self.duration_ms;
        if self.smoothing {
            t = smoothstep(t);
        }
        self.current = lerp_position(self.start, self.target, t);
    }

    pub fn position(&self) -> PositionF {
        self.current
    }

    pub fn tile_position(&self) -> TilePoint {
        self.current.to_tile()
    }

    pub fn target(&self) -> PositionF {
        self.target
    }

    pub fn is_interpolating(&self) -> bool {
        self.interpolating
    }

    pub fn progress(&self) -> f32 {
        if !self.interpolating || self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).min(1.0)
    }

    pub fn set_smoothing(&mut self, enable: bool) {
        self.smoothing = enable;
    }

    pub fn remaining_ms(&self) -> f32 {
        if !self.interpolating {
            return 0.0;
        }
        (self.duration_ms - self.elapsed_ms).max(0.0)
    }
}

/// Interpolates an entity between authoritative server states. The
/// window is derived from consecutive server timestamps; an optional
/// delay trades latency for smoothness under jitter.
#[derive(Clone, Debug)]
pub struct EntityInterpolator {
    current: PositionF,
    start: PositionF,
    target: PositionF,
    target_time_ms: u64,
    previous_time_ms: u64,
    elapsed_ms: f32,
    duration_ms: f32,
    delay_ms: f32,
    has_target: bool,
}

impl Default for EntityInterpolator {
    fn default() -> Self {
        Self {
            current: PositionF::default(),
            start: PositionF::default(),
            target: PositionF::default(),
            target_time_ms: 0,
            previous_time_ms: 0,
            elapsed_ms: 0.0,
            duration_ms: DEFAULT_ENTITY_INTERPOLATION_MS,
            delay_ms: 0.0,
            has_target: false,
        }
    }
}

impl EntityInterpolator {
    pub fn set_initial(&mut self, position: TilePoint) {
        self.current = PositionF::from_tile(position);
        self.start = self.current;
        self.target = self.current;
        self.has_target = false;
        self.previous_time_ms = 0;
        self.target_time_ms = 0;
    }

    /// Feeds one authoritative state. The interpolation window becomes
    /// the spacing between this and the previous server timestamp.
    pub fn receive_state(&mut self, position: TilePoint, server_time_ms: u64) {
        self.previous_time_ms = self.target_time_ms;
        self.target = PositionF::from_tile(position);
        self.target_time_ms = server_time_ms;

        if self.previous_time_ms > 0 && server_time_ms > self.previous_time_ms {
            self.duration_ms = (server_time_ms - self.previous_time_ms) as f32;
        }

        self.start = self.current;
        self.elapsed_ms = -self.delay_ms;
        self.has_target = true;
    }

    pub fn update(&mut self, delta_ms: f32) {
        if !self.has_target {
            return;
        }
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms <= 0.0 {
            return;
        }
        if self.duration_ms > 0.0 {
            let t = (self.elapsed_ms / self.duration_ms).min(1.0);
            self.current = lerp_position(self.start, self.target, t);
        } else {
            self.current = self.target;
        }
    }

    pub fn position(&self) -> PositionF {
        self.current
    }

    pub fn tile_position(&self) -> TilePoint {
        self.current.to_tile()
    }

    pub fn set_interpolation_delay(&mut self, delay_ms: f32) {
        self.delay_ms = delay_ms.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_the_target_within_the_window() {
        let mut interpolator = PositionInterpolator::new(TilePoint::new(0, 0));
        interpolator.set_target(TilePoint::new(10, 0), 200.0);

        interpolator.update(100.0);
        let halfway = interpolator.position();
        assert!(halfway.x > 0.0 && halfway.x < 10.0);

        interpolator.update(150.0);
        assert_eq!(interpolator.tile_position(), TilePoint::new(10, 0));
        assert!(!interpolator.is_interpolating());
    }

    #[test]
    fn linear_mode_is_proportional() {
        let mut interpolator = PositionInterpolator::new(TilePoint::new(0, 0));
        interpolator.set_smoothing(false);
        interpolator.set_target(TilePoint::new(8, 0), 100.0);
        interpolator.update(25.0);
        assert!((interpolator.position().x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn set_immediate_cancels_interpolation() {
        let mut interpolator = PositionInterpolator::new(TilePoint::new(0, 0));
        interpolator.set_target(TilePoint::new(5, 5), 200.0);
        interpolator.set_immediate(TilePoint::new(2, 2));
        interpolator.update(100.0);
        assert_eq!(interpolator.tile_position(), TilePoint::new(2, 2));
    }

    #[test]
    fn entity_interpolator_derives_duration_from_timestamps() {
        let mut interpolator = EntityInterpolator::default();
        interpolator.set_initial(TilePoint::new(0, 0));

        interpolator.receive_state(TilePoint::new(4, 0), 1_000);
        interpolator.receive_state(TilePoint::new(8, 0), 1_400);

        // 400 ms window: half way after 200 ms.
        interpolator.update(200.0);
        let position = interpolator.position();
        assert!(position.x > 3.9 && position.x < 8.0);

        interpolator.update(400.0);
        assert_eq!(interpolator.tile_position(), TilePoint::new(8, 0));
    }

    #[test]
    fn interpolation_delay_postpones_movement() {
        let mut interpolator = EntityInterpolator::default();
        interpolator.set_initial(TilePoint::new(0, 0));
        interpolator.set_interpolation_delay(100.0);
        interpolator.receive_state(TilePoint::new(5, 0), 1_000);

        interpolator.update(50.0);
        assert_eq!(interpolator.tile_position(), TilePoint::new(0, 0));

        interpolator.update(200.0);
        assert!(interpolator.position().x > 0.0);
    }
}
