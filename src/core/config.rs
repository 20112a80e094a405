//! Game configuration
//!
//! Map size, turn limit and RNG seed. Loadable from TOML so batch runs can be
//! driven from a file; every field has a default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::constants::{DEFAULT_MAP_RADIUS, DEFAULT_TURN_LIMIT, MAX_MAP_RADIUS};
use crate::core::error::{Result, TacticsError};

/// Configuration for a single game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Radius of the hex map around (0, 0)
    pub map_radius: u32,

    /// Turn on which the game is decided by survivors (0 = unlimited)
    pub turn_limit: u32,

    /// RNG seed. `None` means "seed from the wall clock" at engine creation.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_radius: DEFAULT_MAP_RADIUS,
            turn_limit: DEFAULT_TURN_LIMIT,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_map_radius(mut self, map_radius: u32) -> Self {
        self.map_radius = map_radius;
        self
    }

    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn has_turn_limit(&self) -> bool {
        self.turn_limit > 0
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.map_radius == 0 {
            return Err(TacticsError::InvalidConfig(
                "map_radius must be at least 1".into(),
            ));
        }

        if self.map_radius > MAX_MAP_RADIUS {
            return Err(TacticsError::InvalidConfig(format!(
                "map_radius ({}) exceeds maximum ({})",
                self.map_radius, MAX_MAP_RADIUS
            )));
        }

        Ok(())
    }

    /// The seed to use, resolving `None` from the system clock
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        })
    }
}
