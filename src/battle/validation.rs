//! Legal actions for a unit in the current phase
//!
//! The same rules back `available_actions` (for UIs and the AI) and the
//! checks the resolvers run before accepting an action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoordinate;
use crate::battle::movement::movement_options;
use crate::battle::phase::GamePhase;
use crate::battle::state::GameState;
use crate::combat::unit::AdaptedUnit;
use crate::core::error::{Result, TacticsError};
use crate::core::types::UnitId;

/// An enemy the unit can fire on, and with what
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOption {
    pub unit_id: UnitId,
    pub distance: u32,
    /// Mounted weapon ids that can engage this target
    pub weapons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableActions {
    pub valid_moves: Vec<HexCoordinate>,
    pub valid_targets: Vec<TargetOption>,
}

impl AvailableActions {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_moves.is_empty() && self.valid_targets.is_empty()
    }

    pub fn target(&self, unit_id: &UnitId) -> Option<&TargetOption> {
        self.valid_targets.iter().find(|t| &t.unit_id == unit_id)
    }

    pub fn can_move_to(&self, hex: HexCoordinate) -> bool {
        self.valid_moves.contains(&hex)
    }
}

/// Weapons on `attacker` that can fire at `target` from where they stand
pub fn engageable_weapons(attacker: &AdaptedUnit, target: &AdaptedUnit) -> Vec<String> {
    let distance = attacker.position.distance(&target.position);
    attacker
        .usable_weapons()
        .filter(|weapon| weapon.spec.bracket(distance).is_some())
        .map(|weapon| weapon.id.clone())
        .collect()
}

/// Enemy units in range of at least one usable weapon, nearest first
pub fn attack_targets(state: &GameState, attacker: &AdaptedUnit) -> Vec<TargetOption> {
    let mut targets: Vec<TargetOption> = state
        .living_units(attacker.side.opponent())
        .filter_map(|target| {
            let weapons = engageable_weapons(attacker, target);
            (!weapons.is_empty()).then(|| TargetOption {
                unit_id: target.id.clone(),
                distance: attacker.position.distance(&target.position),
                weapons,
            })
        })
        .collect();
    targets.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.unit_id.cmp(&b.unit_id)));
    targets
}

/// Legal moves and targets for a unit right now.
///
/// Unknown, destroyed, disabled or already-committed units get empty results.
pub fn available_actions(state: &GameState, unit_id: &UnitId) -> AvailableActions {
    let Some(unit) = state.unit(unit_id) else {
        return AvailableActions::empty();
    };
    if state.is_completed() || !unit.is_operable() || unit.lock_state.has_committed() {
        return AvailableActions::empty();
    }

    match state.phase {
        GamePhase::Movement => AvailableActions {
            valid_moves: movement_options(state, unit).into_keys().collect(),
            valid_targets: Vec::new(),
        },
        GamePhase::WeaponAttack => AvailableActions {
            valid_moves: Vec::new(),
            valid_targets: attack_targets(state, unit),
        },
        _ => AvailableActions::empty(),
    }
}

/// Reject anything that is not in the attacker's current target list
pub fn validate_attack(
    state: &GameState,
    attacker_id: &UnitId,
    target_id: &UnitId,
    weapon_ids: &[String],
) -> Result<()> {
    let attacker = state
        .unit(attacker_id)
        .ok_or_else(|| TacticsError::invalid_action(format!("unknown unit '{}'", attacker_id)))?;
    if state.is_completed() {
        return Err(TacticsError::invalid_action("game is already over"));
    }
    if state.phase != GamePhase::WeaponAttack {
        return Err(TacticsError::invalid_action(format!(
            "cannot attack during the {} phase",
            state.phase
        )));
    }
    if !attacker.is_operable() {
        return Err(TacticsError::invalid_action(format!(
            "unit '{}' cannot act",
            attacker_id
        )));
    }
    if attacker.lock_state.has_committed() {
        return Err(TacticsError::invalid_action(format!(
            "unit '{}' has already attacked this phase",
            attacker_id
        )));
    }
    if weapon_ids.is_empty() {
        return Err(TacticsError::invalid_action("no weapons selected"));
    }

    let actions = available_actions(state, attacker_id);
    let option = actions.target(target_id).ok_or_else(|| {
        TacticsError::invalid_action(format!(
            "'{}' is not a valid target for '{}'",
            target_id, attacker_id
        ))
    })?;
    for (index, weapon_id) in weapon_ids.iter().enumerate() {
        if !option.weapons.contains(weapon_id) {
            return Err(TacticsError::invalid_action(format!(
                "weapon '{}' cannot engage '{}'",
                weapon_id, target_id
            )));
        }
        if weapon_ids[..index].contains(weapon_id) {
            return Err(TacticsError::invalid_action(format!(
                "weapon '{}' selected twice",
                weapon_id
            )));
        }
    }

    // Mounts of one weapon type draw on the same bins
    let mut shots_needed: BTreeMap<&str, u32> = BTreeMap::new();
    for weapon in weapon_ids.iter().filter_map(|id| attacker.weapon(id)) {
        if weapon.spec.needs_ammo() {
            *shots_needed.entry(weapon.spec.id.as_str()).or_default() += 1;
        }
    }
    for (spec_id, needed) in shots_needed {
        let remaining = attacker.ammo_remaining(spec_id);
        if needed > remaining {
            return Err(TacticsError::invalid_action(format!(
                "'{}' needs {} shots of {} ammunition but has {}",
                attacker_id, needed, spec_id, remaining
            )));
        }
    }
    Ok(())
}
