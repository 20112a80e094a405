//! Damage allocation: armor first, then internal structure
//!
//! Allocation is computed against a unit snapshot and carried in the
//! `DamageApplied` event; the reducer only copies the remaining values back.
//! Overflow past a location's structure is discarded.

use serde::{Deserialize, Serialize};

use crate::combat::location::MechLocation;
use crate::combat::unit::AdaptedUnit;

/// How a single hit split across one location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageAllocation {
    pub location: MechLocation,
    pub rear: bool,
    pub damage: u32,
    pub armor_damage: u32,
    pub structure_damage: u32,
    pub armor_remaining: u32,
    pub structure_remaining: u32,
    /// Structure reached zero on this hit
    pub location_destroyed: bool,
}

impl DamageAllocation {
    /// Damage that had nowhere to go
    pub fn discarded(&self) -> u32 {
        self.damage - self.armor_damage - self.structure_damage
    }
}

/// Follow the transfer chain past destroyed locations.
///
/// Returns `None` when the chain ends at a destroyed location with no
/// further transfer (the unit is already dead).
pub fn resolve_transfer(unit: &AdaptedUnit, location: MechLocation) -> Option<MechLocation> {
    let mut current = location;
    while unit.location_destroyed(current) {
        current = current.transfer_target()?;
    }
    Some(current)
}

/// Split `damage` across armor then structure at one location
pub fn allocate_damage(
    unit: &AdaptedUnit,
    location: MechLocation,
    rear: bool,
    damage: u32,
) -> DamageAllocation {
    let armor = if rear {
        unit.rear_armor.get(&location).copied().unwrap_or(0)
    } else {
        unit.armor.get(&location).copied().unwrap_or(0)
    };
    let structure = unit.structure.get(&location).copied().unwrap_or(0);

    let armor_damage = damage.min(armor);
    let structure_damage = (damage - armor_damage).min(structure);

    DamageAllocation {
        location,
        rear,
        damage,
        armor_damage,
        structure_damage,
        armor_remaining: armor - armor_damage,
        structure_remaining: structure - structure_damage,
        location_destroyed: structure > 0 && structure_damage == structure,
    }
}

/// Internal damage that bypasses armor (ammunition explosions)
pub fn allocate_structure_damage(
    unit: &AdaptedUnit,
    location: MechLocation,
    damage: u32,
) -> DamageAllocation {
    let armor = unit.armor.get(&location).copied().unwrap_or(0);
    let structure = unit.structure.get(&location).copied().unwrap_or(0);
    let structure_damage = damage.min(structure);

    DamageAllocation {
        location,
        rear: false,
        damage,
        armor_damage: 0,
        structure_damage,
        armor_remaining: armor,
        structure_remaining: structure - structure_damage,
        location_destroyed: structure > 0 && structure_damage == structure,
    }
}
