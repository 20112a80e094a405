//! Weapon records and range brackets
//!
//! `WeaponSpec` is the immutable compendium entry; `MountedWeapon` is one
//! instance bolted into a location of a specific unit.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{LONG_RANGE_MODIFIER, MEDIUM_RANGE_MODIFIER, SHORT_RANGE_MODIFIER};
use crate::combat::location::MechLocation;

/// Range band a shot falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBracket {
    Short,
    Medium,
    Long,
}

impl RangeBracket {
    pub fn to_hit_modifier(&self) -> u32 {
        match self {
            RangeBracket::Short => SHORT_RANGE_MODIFIER,
            RangeBracket::Medium => MEDIUM_RANGE_MODIFIER,
            RangeBracket::Long => LONG_RANGE_MODIFIER,
        }
    }
}

/// Immutable weapon stat block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub id: String,
    pub name: String,
    pub short_range: u32,
    pub medium_range: u32,
    pub long_range: u32,
    pub damage: u32,
    /// Heat generated per shot
    pub heat: u32,
    /// 0 = no minimum range
    #[serde(default)]
    pub minimum_range: u32,
    /// Shots per ton of ammunition; -1 = unlimited (energy)
    #[serde(default = "unlimited_ammo")]
    pub ammo_per_ton: i32,
}

fn unlimited_ammo() -> i32 {
    -1
}

impl WeaponSpec {
    pub fn needs_ammo(&self) -> bool {
        self.ammo_per_ton > 0
    }

    pub fn max_range(&self) -> u32 {
        self.long_range
    }

    /// Range bracket for a shot at `distance`, or `None` if it cannot engage.
    ///
    /// A nonzero minimum range excludes every distance up to and including it.
    pub fn bracket(&self, distance: u32) -> Option<RangeBracket> {
        if self.minimum_range > 0 && distance <= self.minimum_range {
            return None;
        }
        if distance <= self.short_range {
            Some(RangeBracket::Short)
        } else if distance <= self.medium_range {
            Some(RangeBracket::Medium)
        } else if distance <= self.long_range {
            Some(RangeBracket::Long)
        } else {
            None
        }
    }

    /// Common weapon: Medium Laser
    pub fn medium_laser() -> Self {
        Self {
            id: "medium-laser".into(),
            name: "Medium Laser".into(),
            short_range: 3,
            medium_range: 6,
            long_range: 9,
            damage: 5,
            heat: 3,
            minimum_range: 0,
            ammo_per_ton: -1,
        }
    }

    /// Common weapon: LRM-10 (minimum range 6)
    pub fn lrm_10() -> Self {
        Self {
            id: "lrm-10".into(),
            name: "LRM 10".into(),
            short_range: 7,
            medium_range: 14,
            long_range: 21,
            damage: 6,
            heat: 4,
            minimum_range: 6,
            ammo_per_ton: 12,
        }
    }
}

/// A weapon instance mounted on a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedWeapon {
    /// Unique within the unit
    pub id: String,
    pub spec: WeaponSpec,
    pub location: MechLocation,
    /// Knocked out by a critical hit
    pub destroyed: bool,
}

impl MountedWeapon {
    pub fn new(id: impl Into<String>, spec: WeaponSpec, location: MechLocation) -> Self {
        Self {
            id: id.into(),
            spec,
            location,
            destroyed: false,
        }
    }
}

/// One ton of ammunition feeding a weapon type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoBin {
    pub id: String,
    /// Weapon spec id this ammunition feeds
    pub weapon_id: String,
    pub location: MechLocation,
    pub shots: u32,
}
