//! Unit adapter - bridges compendium stat blocks to runtime combat units
//!
//! Converts an immutable `UnitDefinition` plus placement options into an
//! `AdaptedUnit` with its own armor, structure, weapons and ammunition.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::hex::{Facing, HexCoordinate};
use crate::combat::compendium::{Compendium, EquipmentKind, UnitDefinition};
use crate::combat::location::{internal_structure, max_armor, MechLocation};
use crate::combat::unit::{
    AdaptedUnit, EquipmentSlot, LockState, MovementProfile, MovementType, PilotSkills,
    PilotState, SlotKind,
};
use crate::combat::weapons::{AmmoBin, MountedWeapon};
use crate::core::error::{Result, TacticsError};
use crate::core::types::{Side, UnitId};

/// Placement and pilot for one unit entering a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptOptions {
    pub unit_id: UnitId,
    pub side: Side,
    pub position: HexCoordinate,
    /// `None` = side default (Player north, Opponent south)
    #[serde(default)]
    pub facing: Option<Facing>,
    #[serde(default)]
    pub pilot: PilotSkills,
    /// Armor already lost per location
    #[serde(default)]
    pub initial_damage: BTreeMap<MechLocation, u32>,
}

impl AdaptOptions {
    pub fn new(unit_id: impl Into<UnitId>, side: Side, position: HexCoordinate) -> Self {
        Self {
            unit_id: unit_id.into(),
            side,
            position,
            facing: None,
            pilot: PilotSkills::default(),
            initial_damage: BTreeMap::new(),
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn with_pilot(mut self, pilot: PilotSkills) -> Self {
        self.pilot = pilot;
        self
    }

    pub fn with_initial_damage(mut self, location: MechLocation, damage: u32) -> Self {
        self.initial_damage.insert(location, damage);
        self
    }
}

/// Default facing for a side
pub fn default_facing(side: Side) -> Facing {
    match side {
        Side::Player => Facing::North,
        Side::Opponent => Facing::South,
    }
}

/// Adapter over a compendium
pub struct UnitAdapter<'a, C: Compendium + ?Sized> {
    compendium: &'a C,
}

impl<'a, C: Compendium + ?Sized> UnitAdapter<'a, C> {
    pub fn new(compendium: &'a C) -> Self {
        Self { compendium }
    }

    /// Look up `definition_id` and adapt it
    pub fn adapt(&self, definition_id: &str, options: AdaptOptions) -> Result<AdaptedUnit> {
        let definition = self
            .compendium
            .unit(definition_id)
            .ok_or_else(|| TacticsError::not_found("unit", definition_id))?;
        self.adapt_definition(definition, options)
    }

    /// Adapt a definition that is already in hand
    pub fn adapt_definition(
        &self,
        definition: &UnitDefinition,
        options: AdaptOptions,
    ) -> Result<AdaptedUnit> {
        let topology = definition.topology;

        // Structure and armor
        let mut structure = BTreeMap::new();
        let mut armor = BTreeMap::new();
        let mut rear_armor = BTreeMap::new();
        for location in topology.locations() {
            let location = *location;
            structure.insert(location, internal_structure(definition.tonnage, location));

            let maximum = max_armor(definition.tonnage, location);
            let front = definition.armor.get(&location).copied().unwrap_or(0).min(maximum);
            armor.insert(location, front);
            if location.has_rear_armor() {
                let rear = definition
                    .rear_armor
                    .get(&location)
                    .copied()
                    .unwrap_or(0)
                    .min(maximum - front);
                rear_armor.insert(location, rear);
            }
        }
        reject_foreign_locations(definition, definition.armor.keys())?;
        reject_foreign_locations(definition, definition.rear_armor.keys())?;

        // Pre-existing damage only ever lowers armor
        reject_foreign_locations(definition, options.initial_damage.keys())?;
        for (location, damage) in &options.initial_damage {
            if let Some(points) = armor.get_mut(location) {
                *points = points.saturating_sub(*damage);
            }
        }

        // Equipment
        let mut ids = InstanceIds::default();
        let mut weapons = Vec::new();
        let mut ammo_bins = Vec::new();
        let mut equipment = Vec::new();
        let mut jump_jets = 0;
        for item in &definition.equipment {
            if !topology.has_location(item.location) {
                return Err(TacticsError::InvalidConfig(format!(
                    "unit '{}' mounts {} in {}, which a {:?} does not have",
                    definition.id, item.id, item.location, topology
                )));
            }
            match &item.kind {
                EquipmentKind::Weapon => {
                    let spec = self
                        .compendium
                        .weapon(&item.id)
                        .ok_or_else(|| TacticsError::not_found("weapon", item.id.clone()))?;
                    weapons.push(MountedWeapon::new(
                        ids.next(&item.id),
                        spec.clone(),
                        item.location,
                    ));
                }
                EquipmentKind::Ammo { weapon_id } => {
                    let spec = self
                        .compendium
                        .weapon(weapon_id)
                        .ok_or_else(|| TacticsError::not_found("weapon", weapon_id.clone()))?;
                    if !spec.needs_ammo() {
                        return Err(TacticsError::InvalidConfig(format!(
                            "unit '{}' carries ammunition for {}, which uses none",
                            definition.id, weapon_id
                        )));
                    }
                    ammo_bins.push(AmmoBin {
                        id: ids.next(&item.id),
                        weapon_id: weapon_id.clone(),
                        location: item.location,
                        shots: spec.ammo_per_ton as u32,
                    });
                }
                EquipmentKind::HeatSink => equipment.push(EquipmentSlot {
                    id: ids.next(&item.id),
                    kind: SlotKind::HeatSink,
                    location: item.location,
                }),
                EquipmentKind::JumpJet => {
                    jump_jets += 1;
                    equipment.push(EquipmentSlot {
                        id: ids.next(&item.id),
                        kind: SlotKind::JumpJet,
                        location: item.location,
                    });
                }
                EquipmentKind::Other => equipment.push(EquipmentSlot {
                    id: ids.next(&item.id),
                    kind: SlotKind::Other,
                    location: item.location,
                }),
            }
        }

        let walk = definition.walk()?;
        let facing = options.facing.unwrap_or_else(|| default_facing(options.side));

        Ok(AdaptedUnit {
            id: options.unit_id,
            definition_id: definition.id.clone(),
            name: definition.display_name(),
            side: options.side,
            topology,
            tonnage: definition.tonnage,
            position: options.position,
            facing,
            heat: 0,
            heat_this_turn: 0,
            movement_this_turn: MovementType::Stationary,
            hexes_moved_this_turn: 0,
            armor,
            rear_armor,
            structure,
            destroyed_locations: BTreeSet::new(),
            destroyed_equipment: BTreeSet::new(),
            weapons,
            ammo_bins,
            equipment,
            movement: MovementProfile::from_walk(walk, jump_jets),
            base_heat_sinks: definition.heat_sinks,
            pilot: PilotState::new(options.pilot),
            shutdown: false,
            destroyed: false,
            lock_state: LockState::Pending,
        })
    }
}

fn reject_foreign_locations<'l>(
    definition: &UnitDefinition,
    mut locations: impl Iterator<Item = &'l MechLocation>,
) -> Result<()> {
    match locations.find(|l| !definition.topology.has_location(**l)) {
        Some(location) => Err(TacticsError::InvalidConfig(format!(
            "unit '{}' has no {} location",
            definition.id, location
        ))),
        None => Ok(()),
    }
}

/// Per-unit instance ids: first mount keeps the base id, repeats get `-2`, `-3`, ...
#[derive(Default)]
struct InstanceIds {
    seen: AHashMap<String, u32>,
}

impl InstanceIds {
    fn next(&mut self, base: &str) -> String {
        let count = self.seen.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{}-{}", base, count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::compendium::StaticCompendium;

    fn options(side: Side) -> AdaptOptions {
        AdaptOptions::new("unit-1", side, HexCoordinate::new(0, 3))
    }

    #[test]
    fn test_adapt_hunchback() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let unit = adapter.adapt("hunchback-hbk-4g", options(Side::Player)).unwrap();

        assert_eq!(unit.tonnage, 50);
        assert_eq!(unit.movement.walk, 4);
        assert_eq!(unit.movement.run, 6);
        assert_eq!(unit.movement.jump, 0);
        assert_eq!(unit.facing, Facing::North);
        assert_eq!(unit.structure[&MechLocation::CenterTorso], 16);
        assert_eq!(unit.armor[&MechLocation::CenterTorso], 26);
        assert_eq!(unit.rear_armor[&MechLocation::CenterTorso], 5);
        assert_eq!(unit.ammo_remaining("ac-20"), 10);
        assert_eq!(unit.dissipation(), 13);
    }

    #[test]
    fn test_duplicate_weapons_get_distinct_ids() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let unit = adapter.adapt("hunchback-hbk-4g", options(Side::Player)).unwrap();
        let ids: Vec<&str> = unit.weapons.iter().map(|w| w.id.as_str()).collect();
        assert!(ids.contains(&"medium-laser"));
        assert!(ids.contains(&"medium-laser-2"));
        let bins: Vec<&str> = unit.ammo_bins.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(bins, vec!["ammo-ac-20", "ammo-ac-20-2"]);
    }

    #[test]
    fn test_opponent_faces_south() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let unit = adapter.adapt("locust-lct-1v", options(Side::Opponent)).unwrap();
        assert_eq!(unit.facing, Facing::South);

        let turned = adapter
            .adapt(
                "locust-lct-1v",
                options(Side::Opponent).with_facing(Facing::NorthEast),
            )
            .unwrap();
        assert_eq!(turned.facing, Facing::NorthEast);
    }

    #[test]
    fn test_initial_damage_clamps_at_zero() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let pristine = adapter.adapt("atlas-as7-d", options(Side::Player)).unwrap();
        let damaged = adapter
            .adapt(
                "atlas-as7-d",
                options(Side::Player).with_initial_damage(MechLocation::Head, 999),
            )
            .unwrap();

        assert_eq!(damaged.armor[&MechLocation::Head], 0);
        assert_eq!(damaged.structure, pristine.structure);
        for location in damaged.topology.locations() {
            if *location != MechLocation::Head {
                assert_eq!(damaged.armor[location], pristine.armor[location]);
            }
        }
    }

    #[test]
    fn test_jump_jets_and_explicit_walk() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let unit = adapter.adapt("griffin-grf-1n", options(Side::Player)).unwrap();
        assert_eq!(unit.movement.walk, 5);
        assert_eq!(unit.movement.run, 8);
        assert_eq!(unit.movement.jump, 5);
        assert_eq!(unit.jump_mp(), 5);
    }

    #[test]
    fn test_quad_has_four_legs() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let unit = adapter.adapt("goliath-gol-1h", options(Side::Player)).unwrap();
        assert!(unit.structure.contains_key(&MechLocation::RearLeftLeg));
        assert!(!unit.structure.contains_key(&MechLocation::LeftArm));
    }

    #[test]
    fn test_unknown_unit_is_not_found() {
        let compendium = StaticCompendium::builtin().unwrap();
        let adapter = UnitAdapter::new(&compendium);
        let result = adapter.adapt("timber-wolf", options(Side::Player));
        assert!(matches!(result, Err(TacticsError::NotFound { kind: "unit", .. })));
    }

    #[test]
    fn test_unknown_weapon_is_not_found() {
        let mut compendium = StaticCompendium::builtin().unwrap();
        let mut definition = compendium.unit("locust-lct-1v").unwrap().clone();
        definition.id = "locust-custom".into();
        definition.equipment.push(crate::combat::compendium::MountedEquipment {
            id: "gauss-rifle".into(),
            location: MechLocation::CenterTorso,
            kind: EquipmentKind::Weapon,
        });
        compendium.insert_unit(definition);

        let adapter = UnitAdapter::new(&compendium);
        let result = adapter.adapt("locust-custom", options(Side::Player));
        assert!(matches!(result, Err(TacticsError::NotFound { kind: "weapon", .. })));
    }

    #[test]
    fn test_armor_above_maximum_is_clamped() {
        let mut compendium = StaticCompendium::builtin().unwrap();
        let mut definition = compendium.unit("locust-lct-1v").unwrap().clone();
        definition.id = "locust-overarmored".into();
        definition.armor.insert(MechLocation::Head, 40);
        definition.armor.insert(MechLocation::CenterTorso, 40);
        compendium.insert_unit(definition);

        let adapter = UnitAdapter::new(&compendium);
        let unit = adapter.adapt("locust-overarmored", options(Side::Player)).unwrap();
        assert_eq!(unit.armor[&MechLocation::Head], 9);
        assert_eq!(unit.armor[&MechLocation::CenterTorso], 12);
        assert_eq!(unit.rear_armor[&MechLocation::CenterTorso], 0);
    }
}
