//! Hex coordinate system for battle maps (axial coordinates)
//!
//! Uses axial coordinates (q, r) on a flat-topped grid. The map is the set of
//! hexes within `map_radius` of the origin.

use serde::{Deserialize, Serialize};

/// Axial hex coordinate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct HexCoordinate {
    pub q: i32,
    pub r: i32,
}

impl HexCoordinate {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Manhattan distance in hex space
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Get all 6 neighboring hex coordinates, in `Facing::all()` order
    pub fn neighbors(&self) -> [HexCoordinate; 6] {
        Facing::all().map(|facing| self.step(facing))
    }

    /// The adjacent hex in a direction
    pub fn step(&self, facing: Facing) -> HexCoordinate {
        let offset = facing.offset();
        HexCoordinate::new(self.q + offset.q, self.r + offset.r)
    }

    /// Is `coord` within `radius` hexes of this center?
    pub fn in_radius(&self, radius: u32, coord: &HexCoordinate) -> bool {
        self.distance(coord) <= radius
    }

    /// Get all hexes within range (inclusive), ordered by (q, r)
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoordinate> {
        let range = range as i32;
        let mut results = Vec::new();
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                results.push(HexCoordinate::new(self.q + q, self.r + r));
            }
        }
        results
    }
}

impl std::fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Direction a unit faces (one per hexside, clockwise from north)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    #[default]
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Facing {
    /// Get the hex offset for this direction
    pub fn offset(&self) -> HexCoordinate {
        match self {
            Facing::North => HexCoordinate::new(0, -1),
            Facing::NorthEast => HexCoordinate::new(1, -1),
            Facing::SouthEast => HexCoordinate::new(1, 0),
            Facing::South => HexCoordinate::new(0, 1),
            Facing::SouthWest => HexCoordinate::new(-1, 1),
            Facing::NorthWest => HexCoordinate::new(-1, 0),
        }
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        self.rotate(3)
    }

    /// Rotate clockwise by `steps` hexsides
    pub fn rotate(&self, steps: i32) -> Self {
        let index = (self.index() as i32 + steps).rem_euclid(6) as usize;
        Facing::all()[index]
    }

    fn index(&self) -> usize {
        match self {
            Facing::North => 0,
            Facing::NorthEast => 1,
            Facing::SouthEast => 2,
            Facing::South => 3,
            Facing::SouthWest => 4,
            Facing::NorthWest => 5,
        }
    }

    /// All directions, clockwise from north
    pub fn all() -> [Facing; 6] {
        [
            Facing::North,
            Facing::NorthEast,
            Facing::SouthEast,
            Facing::South,
            Facing::SouthWest,
            Facing::NorthWest,
        ]
    }

    /// Direction whose single step from `from` ends closest to `to`.
    ///
    /// Ties resolve in clockwise order from north. `None` when the hexes coincide.
    pub fn toward(from: HexCoordinate, to: HexCoordinate) -> Option<Facing> {
        if from == to {
            return None;
        }
        Facing::all()
            .into_iter()
            .min_by_key(|facing| from.step(*facing).distance(&to))
    }
}

/// Which side of a target an attack comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackArc {
    Front,
    Left,
    Right,
    Rear,
}

/// Arc of the target that the attacker stands in.
///
/// The front arc spans the front hexside and both front-quarter hexsides;
/// each side arc is one rear-quarter hexside; the rear arc is the rear hexside.
pub fn attack_arc(
    target_position: HexCoordinate,
    target_facing: Facing,
    attacker_position: HexCoordinate,
) -> AttackArc {
    let Some(direction) = Facing::toward(target_position, attacker_position) else {
        return AttackArc::Front;
    };
    let relative = (direction.index() + 6 - target_facing.index()) % 6;
    match relative {
        0 | 1 | 5 => AttackArc::Front,
        2 => AttackArc::Right,
        4 => AttackArc::Left,
        _ => AttackArc::Rear,
    }
}
