//! Unit and weapon master data
//!
//! The compendium is a read-only lookup of stat blocks by id. The engine
//! only depends on the `Compendium` trait; `StaticCompendium` is the
//! TOML-backed implementation shipped with the crate.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::battle::constants::DEFAULT_HEAT_SINKS;
use crate::combat::location::{MechLocation, Topology};
use crate::combat::weapons::WeaponSpec;
use crate::core::error::{Result, TacticsError};

/// Built-in master data
const BUILTIN_COMPENDIUM: &str = include_str!("../../data/compendium.toml");

/// Master-data lookup used by the unit adapter
pub trait Compendium {
    fn unit(&self, id: &str) -> Option<&UnitDefinition>;
    fn weapon(&self, id: &str) -> Option<&WeaponSpec>;
}

/// What a mounted item is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EquipmentKind {
    Weapon,
    /// One ton of ammunition for the named weapon spec
    Ammo { weapon_id: String },
    HeatSink,
    JumpJet,
    Other,
}

/// One line of a unit's equipment list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedEquipment {
    /// Weapon spec id for weapons; free-form for everything else
    pub id: String,
    pub location: MechLocation,
    #[serde(flatten)]
    pub kind: EquipmentKind,
}

/// Immutable stat block for a unit variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub id: String,
    pub chassis: String,
    pub model: String,
    pub tonnage: u32,
    #[serde(default)]
    pub topology: Topology,
    #[serde(default)]
    pub engine_rating: Option<u32>,
    /// Overrides `engine_rating / tonnage` when present
    #[serde(default)]
    pub walk_mp: Option<u32>,
    /// Engine-integral heat sinks
    #[serde(default = "default_heat_sinks")]
    pub heat_sinks: u32,
    #[serde(deserialize_with = "location_map")]
    pub armor: BTreeMap<MechLocation, u32>,
    #[serde(default, deserialize_with = "location_map")]
    pub rear_armor: BTreeMap<MechLocation, u32>,
    #[serde(default)]
    pub equipment: Vec<MountedEquipment>,
}

fn default_heat_sinks() -> u32 {
    DEFAULT_HEAT_SINKS
}

/// Location-keyed maps are written with string keys in data files
fn location_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<MechLocation, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, u32>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            key.parse::<MechLocation>()
                .map(|location| (location, value))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

impl UnitDefinition {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.chassis, self.model)
    }

    /// Walking MP: explicit, else engine rating / tonnage
    pub fn walk(&self) -> Result<u32> {
        if let Some(walk) = self.walk_mp {
            return Ok(walk);
        }
        match self.engine_rating {
            Some(rating) if self.tonnage > 0 => Ok(rating / self.tonnage),
            _ => Err(TacticsError::InvalidConfig(format!(
                "unit '{}' has neither walk_mp nor engine_rating",
                self.id
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CompendiumFile {
    #[serde(default)]
    weapons: Vec<WeaponSpec>,
    #[serde(default)]
    units: Vec<UnitDefinition>,
}

/// In-memory compendium
#[derive(Debug, Clone, Default)]
pub struct StaticCompendium {
    units: AHashMap<String, UnitDefinition>,
    weapons: AHashMap<String, WeaponSpec>,
}

impl StaticCompendium {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compendium embedded in the crate
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_COMPENDIUM)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CompendiumFile = toml::from_str(contents)?;
        let mut compendium = Self::new();
        for weapon in file.weapons {
            compendium.insert_weapon(weapon);
        }
        for unit in file.units {
            compendium.insert_unit(unit);
        }
        Ok(compendium)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn insert_weapon(&mut self, weapon: WeaponSpec) {
        self.weapons.insert(weapon.id.clone(), weapon);
    }

    pub fn insert_unit(&mut self, unit: UnitDefinition) {
        self.units.insert(unit.id.clone(), unit);
    }

    /// Unit ids in sorted order
    pub fn unit_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.units.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn weapon_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.weapons.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Compendium for StaticCompendium {
    fn unit(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.get(id)
    }

    fn weapon(&self, id: &str) -> Option<&WeaponSpec> {
        self.weapons.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parses() {
        let compendium = StaticCompendium::builtin().unwrap();
        assert!(compendium.unit("hunchback-hbk-4g").is_some());
        assert!(compendium.weapon("medium-laser").is_some());
        assert!(compendium.unit("no-such-mech").is_none());
    }

    #[test]
    fn test_builtin_references_resolve() {
        let compendium = StaticCompendium::builtin().unwrap();
        for id in compendium.unit_ids() {
            let unit = compendium.unit(id).unwrap();
            assert!(unit.walk().is_ok(), "{} has no walk MP", id);
            for item in &unit.equipment {
                assert!(
                    unit.topology.has_location(item.location),
                    "{}: {} mounted in {}",
                    id,
                    item.id,
                    item.location
                );
                match &item.kind {
                    EquipmentKind::Weapon => assert!(compendium.weapon(&item.id).is_some()),
                    EquipmentKind::Ammo { weapon_id } => {
                        assert!(compendium.weapon(weapon_id).is_some())
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_walk_from_engine_rating() {
        let toml = r#"
[[units]]
id = "test"
chassis = "Test"
model = "T-1"
tonnage = 50
engine_rating = 200

[units.armor]
head = 9
CT = 20
"#;
        let compendium = StaticCompendium::from_toml_str(toml).unwrap();
        let unit = compendium.unit("test").unwrap();
        assert_eq!(unit.walk().unwrap(), 4);
        assert_eq!(unit.heat_sinks, 10);
        assert_eq!(unit.armor.get(&MechLocation::CenterTorso), Some(&20));
    }

    #[test]
    fn test_missing_movement_is_config_error() {
        let toml = r#"
[[units]]
id = "test"
chassis = "Test"
model = "T-1"
tonnage = 50

[units.armor]
head = 9
"#;
        let compendium = StaticCompendium::from_toml_str(toml).unwrap();
        let result = compendium.unit("test").unwrap().walk();
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_location_key_rejected() {
        let toml = r#"
[[units]]
id = "test"
chassis = "Test"
model = "T-1"
tonnage = 50
walk_mp = 4

[units.armor]
tail = 9
"#;
        assert!(StaticCompendium::from_toml_str(toml).is_err());
    }
}
