//! AI personality configuration loaded from TOML
//!
//! Personalities define behavior tendencies, tactical preferences,
//! heat discipline and difficulty modifiers.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::combat::weapons::{RangeBracket, WeaponSpec};
use crate::core::error::Result;

/// Behavioral tendencies (0.0 to 1.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Tendency to close the distance (0.0 = stand-off, 1.0 = brawler)
    pub aggression: f32,
    /// Reluctance to run or jump (extra heat, easier to hit back)
    pub caution: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            aggression: 0.5,
            caution: 0.5,
        }
    }
}

/// Tactical preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// Range band to fight at
    pub preferred_range: RangeBracket,
    /// Concentrate fire on the most damaged enemy
    pub focus_fire: bool,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            preferred_range: RangeBracket::Medium,
            focus_fire: true,
        }
    }
}

/// Heat discipline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Heat the unit is willing to end the turn at
    pub tolerance: u32,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self { tolerance: 8 }
    }
}

/// Difficulty modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Mistake probability (0.0 = perfect, 1.0 = always mistakes)
    pub mistake_chance: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            mistake_chance: 0.05,
        }
    }
}

/// Complete AI personality configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPersonality {
    /// Name of this personality (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub heat: HeatConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            behavior: BehaviorConfig::default(),
            preferences: PreferencesConfig::default(),
            heat: HeatConfig::default(),
            difficulty: DifficultyConfig::default(),
        }
    }
}

impl AiPersonality {
    pub fn from_toml_str(name: &str, contents: &str) -> Result<Self> {
        let mut personality: AiPersonality = toml::from_str(contents)?;
        personality.name = name.to_string();
        Ok(personality)
    }

    /// Hex distance this personality wants to fight at with `weapon`
    pub fn engagement_distance(&self, weapon: &WeaponSpec) -> u32 {
        let band = match self.preferences.preferred_range {
            RangeBracket::Short => weapon.short_range,
            RangeBracket::Medium => weapon.medium_range,
            RangeBracket::Long => weapon.long_range,
        };
        let pull = (1.5 - self.behavior.aggression.clamp(0.0, 1.0)) as f64;
        let distance = (band as f64 * pull).round() as u32;
        distance.max(weapon.minimum_range + 1).max(1)
    }
}

/// Load personality from TOML file
///
/// Loads from `data/ai_personalities/{name}.toml`
pub fn load_personality(name: &str) -> Result<AiPersonality> {
    let contents = fs::read_to_string(personality_path(name))?;
    AiPersonality::from_toml_str(name, &contents)
}

/// Get path to personality file
fn personality_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai_personalities").join(format!("{}.toml", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_personality() {
        let personality = load_personality("default").expect("Should load default personality");
        assert_eq!(personality.name, "default");
        assert!(personality.behavior.aggression >= 0.0);
        assert!(personality.behavior.aggression <= 1.0);
    }

    #[test]
    fn test_load_aggressive_personality() {
        let personality = load_personality("aggressive").expect("Should load aggressive personality");
        assert!(personality.behavior.aggression > 0.5, "Aggressive should have high aggression");
        assert!(personality.behavior.caution < 0.5, "Aggressive should have low caution");
        assert_eq!(personality.preferences.preferred_range, RangeBracket::Short);
    }

    #[test]
    fn test_missing_personality_is_error() {
        assert!(load_personality("no-such-personality").is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let personality =
            AiPersonality::from_toml_str("sparse", "[behavior]\naggression = 0.9\n").unwrap();
        assert_eq!(personality.behavior.aggression, 0.9);
        assert_eq!(personality.behavior.caution, 0.5);
        assert_eq!(personality.heat.tolerance, 8);
    }

    #[test]
    fn test_engagement_distance_respects_minimum_range() {
        let mut personality = AiPersonality::default();
        personality.preferences.preferred_range = RangeBracket::Short;
        personality.behavior.aggression = 1.0;
        assert_eq!(personality.engagement_distance(&WeaponSpec::medium_laser()), 2);
        assert_eq!(personality.engagement_distance(&WeaponSpec::lrm_10()), 7);
    }
}
