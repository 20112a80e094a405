//! Mech hit locations, structure table and hit-location tables
//!
//! Replaces free-form location strings with a closed set. The topology
//! decides which locations a unit actually has.

use serde::{Deserialize, Serialize};

use crate::battle::constants::HEAD_MAX_ARMOR;
use crate::battle::hex::AttackArc;

/// Hit locations across all supported topologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechLocation {
    Head,
    CenterTorso,
    LeftTorso,
    RightTorso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    FrontLeftLeg,
    FrontRightLeg,
    RearLeftLeg,
    RearRightLeg,
}

impl MechLocation {
    /// Torsos carry separate rear armor
    pub fn has_rear_armor(&self) -> bool {
        matches!(
            self,
            MechLocation::CenterTorso | MechLocation::LeftTorso | MechLocation::RightTorso
        )
    }

    pub fn is_leg(&self) -> bool {
        matches!(
            self,
            MechLocation::LeftLeg
                | MechLocation::RightLeg
                | MechLocation::FrontLeftLeg
                | MechLocation::FrontRightLeg
                | MechLocation::RearLeftLeg
                | MechLocation::RearRightLeg
        )
    }

    pub fn is_arm(&self) -> bool {
        matches!(self, MechLocation::LeftArm | MechLocation::RightArm)
    }

    /// Where damage goes when this location is already destroyed
    pub fn transfer_target(&self) -> Option<MechLocation> {
        match self {
            MechLocation::LeftArm | MechLocation::LeftLeg => Some(MechLocation::LeftTorso),
            MechLocation::RightArm | MechLocation::RightLeg => Some(MechLocation::RightTorso),
            MechLocation::FrontLeftLeg | MechLocation::RearLeftLeg => {
                Some(MechLocation::LeftTorso)
            }
            MechLocation::FrontRightLeg | MechLocation::RearRightLeg => {
                Some(MechLocation::RightTorso)
            }
            MechLocation::LeftTorso | MechLocation::RightTorso => Some(MechLocation::CenterTorso),
            MechLocation::Head | MechLocation::CenterTorso => None,
        }
    }

    /// Short code used in unit sheets ("CT", "LA", ...)
    pub fn code(&self) -> &'static str {
        match self {
            MechLocation::Head => "HD",
            MechLocation::CenterTorso => "CT",
            MechLocation::LeftTorso => "LT",
            MechLocation::RightTorso => "RT",
            MechLocation::LeftArm => "LA",
            MechLocation::RightArm => "RA",
            MechLocation::LeftLeg => "LL",
            MechLocation::RightLeg => "RL",
            MechLocation::FrontLeftLeg => "FLL",
            MechLocation::FrontRightLeg => "FRL",
            MechLocation::RearLeftLeg => "RLL",
            MechLocation::RearRightLeg => "RRL",
        }
    }

    /// snake_case name, as used in data files and events
    pub fn name(&self) -> &'static str {
        match self {
            MechLocation::Head => "head",
            MechLocation::CenterTorso => "center_torso",
            MechLocation::LeftTorso => "left_torso",
            MechLocation::RightTorso => "right_torso",
            MechLocation::LeftArm => "left_arm",
            MechLocation::RightArm => "right_arm",
            MechLocation::LeftLeg => "left_leg",
            MechLocation::RightLeg => "right_leg",
            MechLocation::FrontLeftLeg => "front_left_leg",
            MechLocation::FrontRightLeg => "front_right_leg",
            MechLocation::RearLeftLeg => "rear_left_leg",
            MechLocation::RearRightLeg => "rear_right_leg",
        }
    }

    pub fn all() -> [MechLocation; 12] {
        [
            MechLocation::Head,
            MechLocation::CenterTorso,
            MechLocation::LeftTorso,
            MechLocation::RightTorso,
            MechLocation::LeftArm,
            MechLocation::RightArm,
            MechLocation::LeftLeg,
            MechLocation::RightLeg,
            MechLocation::FrontLeftLeg,
            MechLocation::FrontRightLeg,
            MechLocation::RearLeftLeg,
            MechLocation::RearRightLeg,
        ]
    }
}

impl std::fmt::Display for MechLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MechLocation {
    type Err = String;

    /// Accepts the snake_case name or the short code, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        MechLocation::all()
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(needle) || l.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown location '{}'", s))
    }
}

/// Body plan selecting which locations exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    Biped,
    Quad,
}

impl Topology {
    pub fn locations(&self) -> &'static [MechLocation] {
        match self {
            Topology::Biped => &[
                MechLocation::Head,
                MechLocation::CenterTorso,
                MechLocation::LeftTorso,
                MechLocation::RightTorso,
                MechLocation::LeftArm,
                MechLocation::RightArm,
                MechLocation::LeftLeg,
                MechLocation::RightLeg,
            ],
            Topology::Quad => &[
                MechLocation::Head,
                MechLocation::CenterTorso,
                MechLocation::LeftTorso,
                MechLocation::RightTorso,
                MechLocation::FrontLeftLeg,
                MechLocation::FrontRightLeg,
                MechLocation::RearLeftLeg,
                MechLocation::RearRightLeg,
            ],
        }
    }

    pub fn has_location(&self, location: MechLocation) -> bool {
        self.locations().contains(&location)
    }

    pub fn legs(&self) -> impl Iterator<Item = MechLocation> + '_ {
        self.locations().iter().copied().filter(|l| l.is_leg())
    }

    /// Leg losses at which the unit can no longer stand
    pub fn crippling_leg_losses(&self) -> usize {
        match self {
            Topology::Biped => 2,
            Topology::Quad => 3,
        }
    }

    /// Map a biped hit-table result onto this topology
    fn adapt(&self, location: MechLocation) -> MechLocation {
        match (self, location) {
            (Topology::Quad, MechLocation::LeftArm) => MechLocation::FrontLeftLeg,
            (Topology::Quad, MechLocation::RightArm) => MechLocation::FrontRightLeg,
            (Topology::Quad, MechLocation::LeftLeg) => MechLocation::RearLeftLeg,
            (Topology::Quad, MechLocation::RightLeg) => MechLocation::RearRightLeg,
            _ => location,
        }
    }
}

/// Internal structure rows: (tonnage, head, center torso, side torso, arm, leg)
const STRUCTURE_TABLE: [(u32, u32, u32, u32, u32, u32); 17] = [
    (20, 3, 6, 5, 3, 4),
    (25, 3, 8, 6, 4, 6),
    (30, 3, 10, 7, 5, 7),
    (35, 3, 11, 8, 6, 8),
    (40, 3, 12, 10, 6, 10),
    (45, 3, 14, 11, 7, 11),
    (50, 3, 16, 12, 8, 12),
    (55, 3, 18, 13, 9, 13),
    (60, 3, 20, 14, 10, 14),
    (65, 3, 21, 15, 10, 15),
    (70, 3, 22, 15, 11, 15),
    (75, 3, 23, 16, 12, 16),
    (80, 3, 25, 17, 13, 17),
    (85, 3, 27, 18, 14, 18),
    (90, 3, 29, 19, 15, 19),
    (95, 3, 30, 20, 16, 20),
    (100, 3, 31, 21, 17, 21),
];

/// Internal structure points for a location at a given tonnage.
///
/// Tonnage is clamped to 20..=100 and rounded down to a 5-ton bracket.
/// Quad legs (front and rear) use the leg column.
pub fn internal_structure(tonnage: u32, location: MechLocation) -> u32 {
    let bracket = (tonnage.clamp(20, 100) / 5) * 5;
    let row = STRUCTURE_TABLE
        .iter()
        .find(|row| row.0 == bracket)
        .copied()
        .unwrap_or(STRUCTURE_TABLE[0]);
    let (_, head, center, side, arm, leg) = row;
    match location {
        MechLocation::Head => head,
        MechLocation::CenterTorso => center,
        MechLocation::LeftTorso | MechLocation::RightTorso => side,
        MechLocation::LeftArm | MechLocation::RightArm => arm,
        _ => leg,
    }
}

/// Maximum front+rear armor a location may carry
pub fn max_armor(tonnage: u32, location: MechLocation) -> u32 {
    match location {
        MechLocation::Head => HEAD_MAX_ARMOR,
        _ => internal_structure(tonnage, location) * 2,
    }
}

/// Biped hit table by 2d6 roll (index 0 = roll of 2)
const FRONT_TABLE: [MechLocation; 11] = [
    MechLocation::CenterTorso,
    MechLocation::RightArm,
    MechLocation::RightArm,
    MechLocation::RightLeg,
    MechLocation::RightTorso,
    MechLocation::CenterTorso,
    MechLocation::LeftTorso,
    MechLocation::LeftLeg,
    MechLocation::LeftArm,
    MechLocation::LeftArm,
    MechLocation::Head,
];

const LEFT_TABLE: [MechLocation; 11] = [
    MechLocation::LeftTorso,
    MechLocation::LeftLeg,
    MechLocation::LeftArm,
    MechLocation::LeftArm,
    MechLocation::LeftLeg,
    MechLocation::LeftTorso,
    MechLocation::CenterTorso,
    MechLocation::RightTorso,
    MechLocation::RightArm,
    MechLocation::RightLeg,
    MechLocation::Head,
];

const RIGHT_TABLE: [MechLocation; 11] = [
    MechLocation::RightTorso,
    MechLocation::RightLeg,
    MechLocation::RightArm,
    MechLocation::RightArm,
    MechLocation::RightLeg,
    MechLocation::RightTorso,
    MechLocation::CenterTorso,
    MechLocation::LeftTorso,
    MechLocation::LeftArm,
    MechLocation::LeftLeg,
    MechLocation::Head,
];

/// Result of a hit-location roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitLocation {
    pub location: MechLocation,
    /// Strikes rear torso armor
    pub rear: bool,
}

/// Resolve a 2d6 roll (2..=12) into a hit location for the given arc and topology
pub fn hit_location(roll: u32, arc: AttackArc, topology: Topology) -> HitLocation {
    let index = (roll.clamp(2, 12) - 2) as usize;
    let location = match arc {
        AttackArc::Front | AttackArc::Rear => FRONT_TABLE[index],
        AttackArc::Left => LEFT_TABLE[index],
        AttackArc::Right => RIGHT_TABLE[index],
    };
    let location = topology.adapt(location);
    HitLocation {
        location,
        rear: arc == AttackArc::Rear && location.has_rear_armor(),
    }
}
