//! Runtime combat unit
//!
//! `AdaptedUnit` carries identity (id, side, chassis) next to the mutable
//! combat fields that events change: position, heat, armor, structure,
//! criticals, pilot condition and the per-phase lock state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    DEFAULT_GUNNERY, DEFAULT_PILOTING, JUMPED_MODIFIER, MIN_JUMP_HEAT, PILOT_LETHAL_WOUNDS,
    RAN_MODIFIER, RUN_HEAT, WALKED_MODIFIER, WALK_HEAT,
};
use crate::battle::hex::{Facing, HexCoordinate};
use crate::combat::location::{MechLocation, Topology};
use crate::combat::weapons::{AmmoBin, MountedWeapon};
use crate::core::types::{Side, UnitId};

/// How a unit moved this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    #[default]
    Stationary,
    Walk,
    Run,
    Jump,
}

impl MovementType {
    /// Heat generated by moving this way
    pub fn heat(&self, hexes: u32) -> u32 {
        match self {
            MovementType::Stationary => 0,
            MovementType::Walk => WALK_HEAT,
            MovementType::Run => RUN_HEAT,
            MovementType::Jump => hexes.max(MIN_JUMP_HEAT),
        }
    }

    /// To-hit penalty for firing after moving this way
    pub fn attacker_modifier(&self) -> u32 {
        match self {
            MovementType::Stationary => 0,
            MovementType::Walk => WALKED_MODIFIER,
            MovementType::Run => RAN_MODIFIER,
            MovementType::Jump => JUMPED_MODIFIER,
        }
    }
}

/// Simultaneous-resolution commitment for the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Awaiting this phase's action
    #[default]
    Pending,
    /// Action declared, waiting for the other units
    Planned,
    /// All units committed; movement is final
    Locked,
    /// Action resolved this phase
    Resolved,
}

impl LockState {
    pub fn has_committed(&self) -> bool {
        !matches!(self, LockState::Pending)
    }
}

/// Movement points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MovementProfile {
    pub walk: u32,
    pub run: u32,
    pub jump: u32,
}

impl MovementProfile {
    /// run = ceil(walk * 1.5)
    pub fn from_walk(walk: u32, jump: u32) -> Self {
        Self {
            walk,
            run: (walk * 3).div_ceil(2),
            jump,
        }
    }
}

/// Pilot gunnery/piloting skill (lower is better)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotSkills {
    pub gunnery: u32,
    pub piloting: u32,
}

impl Default for PilotSkills {
    fn default() -> Self {
        Self {
            gunnery: DEFAULT_GUNNERY,
            piloting: DEFAULT_PILOTING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotState {
    pub skills: PilotSkills,
    pub wounds: u32,
    pub conscious: bool,
}

impl PilotState {
    pub fn new(skills: PilotSkills) -> Self {
        Self {
            skills,
            wounds: 0,
            conscious: true,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.wounds >= PILOT_LETHAL_WOUNDS
    }
}

/// Non-weapon, non-ammo equipment categories that matter in combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    HeatSink,
    JumpJet,
    Other,
}

/// A mounted piece of equipment that can take a critical hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    pub id: String,
    pub kind: SlotKind,
    pub location: MechLocation,
}

/// Why a unit counts as destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructionReason {
    HeadDestroyed,
    CenterTorsoDestroyed,
    LegsDestroyed,
    PilotKilled,
}

/// Something in a location that a critical hit can strike
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriticalSlot {
    Weapon(String),
    Ammo(String),
    Equipment(String),
}

impl CriticalSlot {
    pub fn id(&self) -> &str {
        match self {
            CriticalSlot::Weapon(id) | CriticalSlot::Ammo(id) | CriticalSlot::Equipment(id) => id,
        }
    }
}

/// The mutable runtime unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptedUnit {
    pub id: UnitId,
    pub definition_id: String,
    pub name: String,
    pub side: Side,
    pub topology: Topology,
    pub tonnage: u32,

    // Position
    pub position: HexCoordinate,
    pub facing: Facing,

    // Turn-scoped counters
    pub heat: u32,
    pub heat_this_turn: u32,
    pub movement_this_turn: MovementType,
    pub hexes_moved_this_turn: u32,

    // Damage
    pub armor: BTreeMap<MechLocation, u32>,
    pub rear_armor: BTreeMap<MechLocation, u32>,
    pub structure: BTreeMap<MechLocation, u32>,
    pub destroyed_locations: BTreeSet<MechLocation>,
    pub destroyed_equipment: BTreeSet<String>,

    // Loadout
    pub weapons: Vec<MountedWeapon>,
    pub ammo_bins: Vec<AmmoBin>,
    pub equipment: Vec<EquipmentSlot>,
    pub movement: MovementProfile,
    /// Dissipation from engine-integral sinks
    pub base_heat_sinks: u32,

    pub pilot: PilotState,
    pub shutdown: bool,
    pub destroyed: bool,
    pub lock_state: LockState,
}

impl AdaptedUnit {
    pub fn location_destroyed(&self, location: MechLocation) -> bool {
        self.destroyed_locations.contains(&location)
            || self.structure.get(&location).copied() == Some(0)
    }

    /// Destruction rule: a pure function of the damage maps and pilot
    pub fn destruction_reason(&self) -> Option<DestructionReason> {
        if self.location_destroyed(MechLocation::Head) {
            return Some(DestructionReason::HeadDestroyed);
        }
        if self.location_destroyed(MechLocation::CenterTorso) {
            return Some(DestructionReason::CenterTorsoDestroyed);
        }
        let legs_lost = self
            .topology
            .legs()
            .filter(|leg| self.location_destroyed(*leg))
            .count();
        if legs_lost >= self.topology.crippling_leg_losses() {
            return Some(DestructionReason::LegsDestroyed);
        }
        if self.pilot.is_dead() {
            return Some(DestructionReason::PilotKilled);
        }
        None
    }

    /// Can this unit take actions at all?
    pub fn is_operable(&self) -> bool {
        !self.destroyed && !self.shutdown && self.pilot.conscious
    }

    pub fn weapon(&self, weapon_id: &str) -> Option<&MountedWeapon> {
        self.weapons.iter().find(|w| w.id == weapon_id)
    }

    fn slot_live(&self, id: &str, location: MechLocation) -> bool {
        !self.destroyed_equipment.contains(id) && !self.location_destroyed(location)
    }

    /// Shots left for a weapon type across all live bins
    pub fn ammo_remaining(&self, weapon_spec_id: &str) -> u32 {
        self.ammo_bins
            .iter()
            .filter(|bin| bin.weapon_id == weapon_spec_id && self.slot_live(&bin.id, bin.location))
            .map(|bin| bin.shots)
            .sum()
    }

    /// Remaining shots keyed by weapon spec id
    pub fn ammo_by_weapon(&self) -> BTreeMap<String, u32> {
        let mut ammo = BTreeMap::new();
        for weapon in self.weapons.iter().filter(|w| w.spec.needs_ammo()) {
            ammo.insert(weapon.spec.id.clone(), self.ammo_remaining(&weapon.spec.id));
        }
        ammo
    }

    /// Bin the next shot of a weapon type is drawn from
    pub fn feeding_bin(&self, weapon_spec_id: &str) -> Option<&AmmoBin> {
        self.ammo_bins.iter().find(|bin| {
            bin.weapon_id == weapon_spec_id
                && bin.shots > 0
                && self.slot_live(&bin.id, bin.location)
        })
    }

    /// Weapon is intact, its location stands, and it has ammunition
    pub fn can_fire(&self, weapon: &MountedWeapon) -> bool {
        if weapon.destroyed || self.location_destroyed(weapon.location) {
            return false;
        }
        !weapon.spec.needs_ammo() || self.ammo_remaining(&weapon.spec.id) > 0
    }

    pub fn usable_weapons(&self) -> impl Iterator<Item = &MountedWeapon> {
        self.weapons.iter().filter(|w| self.can_fire(w))
    }

    /// Heat dissipated per Heat phase
    pub fn dissipation(&self) -> u32 {
        let extra = self
            .equipment
            .iter()
            .filter(|slot| slot.kind == SlotKind::HeatSink && self.slot_live(&slot.id, slot.location))
            .count() as u32;
        self.base_heat_sinks + extra
    }

    fn legs_lost(&self) -> u32 {
        self.topology
            .legs()
            .filter(|leg| self.location_destroyed(*leg))
            .count() as u32
    }

    /// Walking MP after leg damage
    pub fn walk_mp(&self) -> u32 {
        let lost = self.legs_lost();
        if lost == 0 {
            return self.movement.walk;
        }
        match self.topology {
            Topology::Biped => self.movement.walk.min(1),
            Topology::Quad => self.movement.walk.saturating_sub(lost),
        }
    }

    pub fn run_mp(&self) -> u32 {
        if self.legs_lost() > 0 {
            return self.walk_mp();
        }
        self.movement.run
    }

    /// Jump MP from intact jump jets
    pub fn jump_mp(&self) -> u32 {
        let live = self
            .equipment
            .iter()
            .filter(|slot| slot.kind == SlotKind::JumpJet && self.slot_live(&slot.id, slot.location))
            .count() as u32;
        live.min(self.movement.jump)
    }

    /// Everything in a location a critical hit can strike, in mount order
    pub fn critical_candidates(&self, location: MechLocation) -> Vec<CriticalSlot> {
        let mut slots = Vec::new();
        for weapon in &self.weapons {
            if weapon.location == location && !weapon.destroyed {
                slots.push(CriticalSlot::Weapon(weapon.id.clone()));
            }
        }
        for bin in &self.ammo_bins {
            if bin.location == location && !self.destroyed_equipment.contains(&bin.id) {
                slots.push(CriticalSlot::Ammo(bin.id.clone()));
            }
        }
        for slot in &self.equipment {
            if slot.location == location && !self.destroyed_equipment.contains(&slot.id) {
                slots.push(CriticalSlot::Equipment(slot.id.clone()));
            }
        }
        slots
    }

    pub fn total_armor(&self) -> u32 {
        self.armor.values().sum::<u32>() + self.rear_armor.values().sum::<u32>()
    }

    pub fn total_structure(&self) -> u32 {
        self.structure.values().sum()
    }

    /// Remaining damage capacity (armor + structure)
    pub fn durability(&self) -> u32 {
        self.total_armor() + self.total_structure()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_unit;
    use super::*;
    use crate::combat::weapons::WeaponSpec;

    #[test]
    fn test_run_is_ceil_walk_times_one_and_half() {
        assert_eq!(MovementProfile::from_walk(4, 0).run, 6);
        assert_eq!(MovementProfile::from_walk(5, 0).run, 8);
        assert_eq!(MovementProfile::from_walk(3, 0).run, 5);
        assert_eq!(MovementProfile::from_walk(0, 0).run, 0);
    }

    #[test]
    fn test_intact_unit_not_destroyed() {
        let unit = sample_unit("a", Side::Player, HexCoordinate::origin());
        assert_eq!(unit.destruction_reason(), None);
        assert!(unit.is_operable());
    }

    #[test]
    fn test_center_torso_loss_destroys() {
        let mut unit = sample_unit("a", Side::Player, HexCoordinate::origin());
        unit.structure.insert(MechLocation::CenterTorso, 0);
        assert_eq!(
            unit.destruction_reason(),
            Some(DestructionReason::CenterTorsoDestroyed)
        );
    }

    #[test]
    fn test_one_leg_cripples_two_legs_destroy_biped() {
        let mut unit = sample_unit("a", Side::Player, HexCoordinate::origin());
        unit.structure.insert(MechLocation::LeftLeg, 0);
        assert_eq!(unit.destruction_reason(), None);
        assert_eq!(unit.walk_mp(), 1);
        assert_eq!(unit.run_mp(), 1);
        unit.structure.insert(MechLocation::RightLeg, 0);
        assert_eq!(
            unit.destruction_reason(),
            Some(DestructionReason::LegsDestroyed)
        );
    }

    #[test]
    fn test_arm_loss_disables_weapon() {
        let mut unit = sample_unit("a", Side::Player, HexCoordinate::origin());
        assert_eq!(unit.usable_weapons().count(), 1);
        unit.structure.insert(MechLocation::RightArm, 0);
        assert_eq!(unit.usable_weapons().count(), 0);
        assert_eq!(unit.destruction_reason(), None);
    }

    #[test]
    fn test_ammo_weapon_needs_live_bin() {
        let mut unit = sample_unit("a", Side::Player, HexCoordinate::origin());
        unit.weapons.push(MountedWeapon::new(
            "lrm-10",
            WeaponSpec::lrm_10(),
            MechLocation::LeftTorso,
        ));
        assert!(!unit.can_fire(&unit.weapons[1]));
        unit.ammo_bins.push(AmmoBin {
            id: "ammo-lrm-10".into(),
            weapon_id: "lrm-10".into(),
            location: MechLocation::LeftTorso,
            shots: 12,
        });
        assert!(unit.can_fire(&unit.weapons[1]));
        assert_eq!(unit.ammo_remaining("lrm-10"), 12);
        unit.destroyed_equipment.insert("ammo-lrm-10".into());
        assert_eq!(unit.ammo_remaining("lrm-10"), 0);
    }

    #[test]
    fn test_pilot_death_destroys() {
        let mut unit = sample_unit("a", Side::Player, HexCoordinate::origin());
        unit.pilot.wounds = 6;
        assert_eq!(unit.destruction_reason(), Some(DestructionReason::PilotKilled));
    }

    #[test]
    fn test_movement_heat() {
        assert_eq!(MovementType::Stationary.heat(0), 0);
        assert_eq!(MovementType::Walk.heat(4), 1);
        assert_eq!(MovementType::Run.heat(6), 2);
        assert_eq!(MovementType::Jump.heat(1), 3);
        assert_eq!(MovementType::Jump.heat(5), 5);
    }
}
