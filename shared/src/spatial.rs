use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::types::{Rect, TilePoint};

/// Uniform-cell spatial index mapping tile positions to entity-id sets.
///
/// Every indexed id occupies exactly one cell at a time; `move_to` is
/// unindex-then-index so observers on either cell see a consistent
/// membership. Negative coordinates are outside every map and are ignored.
pub struct SpatialGrid<K> {
    cell_size: i32,
    cells: HashMap<(i32, i32), HashSet<K>>,
    positions: HashMap<K, TilePoint>,
}

impl<K> SpatialGrid<K>
where
    K: Copy + Eq + Hash + Ord,
{
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.positions.contains_key(&key)
    }

    pub fn position_of(&self, key: K) -> Option<TilePoint> {
        self.positions.get(&key).copied()
    }

    fn cell_for(&self, position: TilePoint) -> (i32, i32) {
        if self.cell_size <= 1 {
            (position.x, position.y)
        } else {
            (position.x / self.cell_size, position.y / self.cell_size)
        }
    }

    /// Adds `key` at `position`. Re-indexing an already-present key moves
    /// it instead.
    pub fn index(&mut self, key: K, position: TilePoint) {
        if position.x < 0 || position.y < 0 {
            return;
        }
        if let Some(old) = self.positions.get(&key).copied() {
            self.move_to(key, old, position);
            return;
        }
        let cell = self.cell_for(position);
        self.cells.entry(cell).or_default().insert(key);
        self.positions.insert(key, position);
    }

    pub fn unindex(&mut self, key: K, position: TilePoint) {
        // The stored position is authoritative when the caller's copy
        // has gone stale.
        let position = self.positions.get(&key).copied().unwrap_or(position);
        if position.x < 0 || position.y < 0 {
            return;
        }
        let cell = self.cell_for(position);
        if let Some(set) = self.cells.get_mut(&cell) {
            set.remove(&key);
            if set.is_empty() {
                self.cells.remove(&cell);
            }
        }
        self.positions.remove(&key);
    }

    /// Moves `key` between cells; a no-op when the cell does not change
    /// (the stored position is still refreshed).
    pub fn move_to(&mut self, key: K, old_position: TilePoint, new_position: TilePoint) {
        let old_cell = self.cell_for(old_position);
        let new_cell = self.cell_for(new_position);
        if old_cell == new_cell {
            if new_position.x >= 0 && new_position.y >= 0 && self.positions.contains_key(&key) {
                self.positions.insert(key, new_position);
            }
            return;
        }
        self.unindex(key, old_position);
        self.index(key, new_position);
    }

    /// All ids within the square `[center - radius, center + radius]` on
    /// both axes. A negative radius yields nothing.
    pub fn query_range(&self, center: TilePoint, radius: i32) -> Vec<K> {
        if radius < 0 || self.positions.is_empty() {
            return Vec::new();
        }

        let min_x = center.x - radius;
        let max_x = center.x + radius;
        let min_y = center.y - radius;
        let max_y = center.y + radius;
        self.collect_in_bounds(min_x, min_y, max_x, max_y)
    }

    /// All ids whose stored position equals `position` exactly.
    pub fn query_at(&self, position: TilePoint) -> Vec<K> {
        let cell = self.cell_for(position);
        let Some(set) = self.cells.get(&cell) else {
            return Vec::new();
        };
        set.iter()
            .copied()
            .filter(|key| self.positions.get(key) == Some(&position))
            .collect()
    }

    /// Rectangular view query returning a deterministic render order:
    /// stable-sorted by (y, x, id).
    pub fn query_view(&self, bounds: Rect, padding: i32) -> Vec<K> {
        if self.positions.is_empty() {
            return Vec::new();
        }
        let bounds = bounds.padded(padding);
        let mut result = self.collect_in_bounds(
            bounds.x,
            bounds.y,
            bounds.x + bounds.width,
            bounds.y + bounds.height,
        );
        result.sort_by(|a, b| {
            let pa = self.positions[a];
            let pb = self.positions[b];
            pa.y.cmp(&pb.y).then(pa.x.cmp(&pb.x)).then(a.cmp(b))
        });
        result
    }

    fn collect_in_bounds(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Vec<K> {
        let min_cell = self.cell_for(TilePoint::new(min_x, min_y));
        let max_cell = self.cell_for(TilePoint::new(max_x, max_y));

        let mut result = Vec::new();
        for cy in min_cell.1..=max_cell.1 {
            for cx in min_cell.0..=max_cell.0 {
                let Some(set) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for key in set {
                    let Some(pos) = self.positions.get(key) else {
                        continue;
                    };
                    if pos.x >= min_x && pos.x <= max_x && pos.y >= min_y && pos.y <= max_y {
                        result.push(*key);
                    }
                }
            }
        }
        result
    }
}
