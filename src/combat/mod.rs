//! Combat data model: locations, weapons, runtime units and damage
//!
//! Everything here is pure data and pure functions over it. Randomness and
//! event emission live in `battle::resolution`.

pub mod adapter;
pub mod compendium;
pub mod damage;
pub mod location;
pub mod unit;
pub mod weapons;

pub use adapter::{default_facing, AdaptOptions, UnitAdapter};
pub use compendium::{Compendium, EquipmentKind, MountedEquipment, StaticCompendium, UnitDefinition};
pub use damage::{allocate_damage, DamageAllocation};
pub use location::{hit_location, HitLocation, MechLocation, Topology};
pub use unit::{
    AdaptedUnit, DestructionReason, LockState, MovementProfile, MovementType, PilotSkills,
    PilotState,
};
pub use weapons::{AmmoBin, MountedWeapon, RangeBracket, WeaponSpec};
