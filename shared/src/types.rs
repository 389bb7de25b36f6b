use serde::{Deserialize, Serialize};

/// Map identifier.
pub type MapId = u32;

/// Persistent character identifier.
pub type CharacterId = u32;

/// A tile coordinate on a map. Tiles are the authoritative unit of
/// position; pixel positions only exist inside the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Chebyshev (chessboard) distance between two tiles. Attack ranges and
/// AOE squares are measured this way: diagonals count as one step.
pub fn chebyshev_distance(a: TilePoint, b: TilePoint) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    dx.max(dy)
}

/// Euclidean distance between two tiles, used by chase/leash checks.
pub fn euclidean_distance(a: TilePoint, b: TilePoint) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dy = (a.y - b.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Eight-way facing, clockwise from north.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Direction::NorthEast,
            2 => Direction::East,
            3 => Direction::SouthEast,
            4 => Direction::South,
            5 => Direction::SouthWest,
            6 => Direction::West,
            7 => Direction::NorthWest,
            _ => Direction::North,
        }
    }

    /// Facing from one tile toward another. Straight axes win over
    /// diagonals only when the delta is axis-aligned.
    pub fn between(from: TilePoint, to: TilePoint) -> Self {
        let dx = (to.x - from.x).signum();
        let dy = (to.y - from.y).signum();
        match (dx, dy) {
            (0, -1) => Direction::North,
            (1, -1) => Direction::NorthEast,
            (1, 0) => Direction::East,
            (1, 1) => Direction::SouthEast,
            (0, 1) => Direction::South,
            (-1, 1) => Direction::SouthWest,
            (-1, 0) => Direction::West,
            (-1, -1) => Direction::NorthWest,
            _ => Direction::North,
        }
    }
}

/// Character class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CharacterClass {
    #[default]
    Warrior = 0,
    Mage = 1,
    Taoist = 2,
}

/// Character gender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Gender {
    #[default]
    Male = 0,
    Female = 1,
}

/// Equipment slot indices. The order is the persisted slot order and must
/// not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EquipSlot {
    Weapon = 0,
    Armor = 1,
    Helmet = 2,
    Boots = 3,
    RingLeft = 4,
    RingRight = 5,
    Necklace = 6,
    BraceletLeft = 7,
    BraceletRight = 8,
    Belt = 9,
    Amulet = 10,
    Talisman = 11,
    Charm = 12,
}

impl EquipSlot {
    pub fn from_index(index: usize) -> Option<Self> {
        use EquipSlot::*;
        const SLOTS: [EquipSlot; crate::constants::EQUIP_SLOT_COUNT] = [
            Weapon,
            Armor,
            Helmet,
            Boots,
            RingLeft,
            RingRight,
            Necklace,
            BraceletLeft,
            BraceletRight,
            Belt,
            Amulet,
            Talisman,
            Charm,
        ];
        SLOTS.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// An axis-aligned tile rectangle, used for camera/view queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grows the rectangle by `padding` tiles on every side.
    pub fn padded(self, padding: i32) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2,
            height: self.height + padding * 2,
        }
    }

    pub fn contains(&self, point: TilePoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chebyshev_counts_diagonals_as_one() {
        assert_eq!(
            chebyshev_distance(TilePoint::new(0, 0), TilePoint::new(3, 3)),
            3
        );
        assert_eq!(
            chebyshev_distance(TilePoint::new(0, 0), TilePoint::new(0, 5)),
            5
        );
        assert_eq!(
            chebyshev_distance(TilePoint::new(2, 2), TilePoint::new(-1, 0)),
            3
        );
    }

    #[test]
    fn direction_between_tiles() {
        let origin = TilePoint::new(5, 5);
        assert_eq!(
            Direction::between(origin, TilePoint::new(5, 0)),
            Direction::North
        );
        assert_eq!(
            Direction::between(origin, TilePoint::new(9, 9)),
            Direction::SouthEast
        );
        assert_eq!(
            Direction::between(origin, TilePoint::new(0, 5)),
            Direction::West
        );
    }

    #[test]
    fn equip_slot_round_trips_through_index() {
        for index in 0..crate::constants::EQUIP_SLOT_COUNT {
            let slot = EquipSlot::from_index(index).unwrap();
            assert_eq!(slot.index(), index);
        }
        assert_eq!(EquipSlot::from_index(13), None);
    }
}
