// Core types shared across the task core.
//
// Defines grid coordinates (`TileCoord`), the four-way `Facing` direction,
// and the agent-visible `Tool` / `Animation` identifiers that timed tasks
// drive as side effects. All types derive `Serialize` and `Deserialize` so
// higher layers can ship them over the wire or log them as data.
//
// **Critical constraint: determinism.** Everything here has a total order
// where it is used as a map key. No floating point in key types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position on the 2D tile grid. Each component is in tile units.
///
/// Screen-style conventions:
/// - X: east  (positive) / west  (negative)
/// - Y: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two coordinates.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// Four-way facing direction for agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    North,
    South,
    East,
    West,
}

impl Facing {
    /// The facing that points from `from` toward `to`, chosen along the
    /// dominant axis. Ties favor the horizontal axis. Callers only invoke
    /// this when the two coordinates differ.
    pub fn toward(from: TileCoord, to: TileCoord) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx.abs() >= dy.abs() {
            if dx >= 0 { Self::East } else { Self::West }
        } else if dy > 0 {
            Self::South
        } else {
            Self::North
        }
    }
}

// ---------------------------------------------------------------------------
// Agent-visible identifiers
// ---------------------------------------------------------------------------

/// Equipment an agent can hold while working. Timed tasks equip the tool
/// they require during their begin phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    Hands,
    Axe,
    Pick,
    Hammer,
}

/// Animation loops an agent can play. Purely cosmetic from the sim's point
/// of view — the renderer maps these to sprite sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    Idle,
    Walk,
    Work,
    Magic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_coord_manhattan_distance() {
        let a = TileCoord::new(0, 0);
        let b = TileCoord::new(3, -4);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
    }

    #[test]
    fn tile_coord_ordering() {
        // Verify TileCoord has a total order (needed for BTreeMap keys).
        let a = TileCoord::new(0, 0);
        let b = TileCoord::new(1, 0);
        assert!(a < b);
    }

    #[test]
    fn tile_coord_display() {
        assert_eq!(TileCoord::new(-2, 5).to_string(), "(-2, 5)");
    }

    #[test]
    fn facing_picks_dominant_axis() {
        let origin = TileCoord::new(0, 0);
        assert_eq!(Facing::toward(origin, TileCoord::new(5, 2)), Facing::East);
        assert_eq!(Facing::toward(origin, TileCoord::new(-5, 2)), Facing::West);
        assert_eq!(Facing::toward(origin, TileCoord::new(1, 4)), Facing::South);
        assert_eq!(Facing::toward(origin, TileCoord::new(1, -4)), Facing::North);
    }

    #[test]
    fn facing_ties_favor_horizontal() {
        let origin = TileCoord::new(0, 0);
        assert_eq!(Facing::toward(origin, TileCoord::new(3, 3)), Facing::East);
        assert_eq!(Facing::toward(origin, TileCoord::new(-3, 3)), Facing::West);
    }

    #[test]
    fn facing_serialization_roundtrip() {
        let json = serde_json::to_string(&Facing::North).unwrap();
        let restored: Facing = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, Facing::North);
    }
}
