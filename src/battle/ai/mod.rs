//! Battle AI decision-making
//!
//! Architecture: Trait + Data hybrid
//! - BattleAI trait defines interface for swappable implementations
//! - AiPersonality struct holds TOML-loaded weights/preferences
//! - DecisionContext provides the read-only state for one side

mod commander;
mod decision_context;
mod personality;

pub use commander::AiCommander;
pub use decision_context::DecisionContext;
pub use personality::{
    load_personality, AiPersonality, BehaviorConfig, DifficultyConfig, HeatConfig,
    PreferencesConfig,
};

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoordinate;
use crate::battle::validation::AvailableActions;
use crate::combat::unit::AdaptedUnit;
use crate::core::types::UnitId;

/// What the AI wants one unit to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    Move {
        destination: HexCoordinate,
    },
    Attack {
        target_id: UnitId,
        weapon_ids: Vec<String>,
    },
    Pass,
}

/// Trait for battle AI implementations
///
/// Implementations pick from `actions`; the session re-validates and treats
/// anything illegal as a pass.
pub trait BattleAI {
    /// Pick a destination during the Movement phase
    fn decide_movement(
        &mut self,
        context: &DecisionContext,
        unit: &AdaptedUnit,
        actions: &AvailableActions,
    ) -> Decision;

    /// Pick a target and weapons during the WeaponAttack phase
    fn decide_attack(
        &mut self,
        context: &DecisionContext,
        unit: &AdaptedUnit,
        actions: &AvailableActions,
    ) -> Decision;

    fn name(&self) -> &str;
}
