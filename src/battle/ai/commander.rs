//! AI Commander - default battle AI implementation
//!
//! Moves each unit toward the range band its personality prefers and fires
//! whatever keeps it under its heat tolerance.

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::personality::AiPersonality;
use crate::battle::ai::{BattleAI, Decision};
use crate::battle::movement::{movement_options, MoveOption};
use crate::battle::validation::{AvailableActions, TargetOption};
use crate::combat::unit::{AdaptedUnit, MovementType};
use crate::combat::weapons::MountedWeapon;
use crate::core::rng::DiceRng;

/// AI Commander implementing BattleAI trait
pub struct AiCommander {
    personality: AiPersonality,
    rng: DiceRng,
}

impl AiCommander {
    /// Create a new AI commander with default seed
    pub fn new(personality: AiPersonality) -> Self {
        Self::with_seed(personality, 42)
    }

    /// Create with specific RNG seed for deterministic behavior
    pub fn with_seed(personality: AiPersonality, seed: u64) -> Self {
        Self {
            personality,
            rng: DiceRng::new(seed),
        }
    }

    pub fn personality(&self) -> &AiPersonality {
        &self.personality
    }

    /// Roll for making a mistake based on difficulty settings
    fn makes_mistake(&mut self) -> bool {
        let chance = self.personality.difficulty.mistake_chance.clamp(0.0, 1.0) as f64;
        chance > 0.0 && self.rng.chance(chance)
    }

    /// Hex distance this unit wants to keep from its nearest enemy
    fn desired_distance(&self, unit: &AdaptedUnit) -> u32 {
        unit.usable_weapons()
            .max_by(|a, b| {
                a.spec
                    .damage
                    .cmp(&b.spec.damage)
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|weapon| self.personality.engagement_distance(&weapon.spec))
            .unwrap_or(1)
    }

    /// Lower is better
    fn move_cost(&self, unit: &AdaptedUnit, option: &MoveOption, enemy_distance: u32, desired: u32) -> f32 {
        let range_error = (enemy_distance as f32 - desired as f32).abs();
        let heat = option.movement_type.heat(option.hexes) as f32;
        let overheating = unit.heat > self.personality.heat.tolerance;
        let heat_weight = if overheating { 2.0 } else { 0.25 };
        let mut cost = range_error + heat * heat_weight * self.personality.behavior.caution;
        if option.movement_type == MovementType::Jump {
            cost += self.personality.behavior.caution;
        }
        cost
    }

    /// Select best target based on personality weights
    fn select_target<'a>(
        &self,
        context: &DecisionContext,
        targets: &'a [TargetOption],
    ) -> Option<&'a TargetOption> {
        let focus = if self.personality.preferences.focus_fire {
            1.0
        } else {
            0.2
        };

        let mut best_score = f32::MIN;
        let mut best_target = None;
        for target in targets {
            let Some(enemy) = context.unit(&target.unit_id) else {
                continue;
            };
            let mut score = 0.0;

            // Damaged targets are attractive
            score -= enemy.durability() as f32 / 100.0 * focus;

            // Close targets are easier
            score -= target.distance as f32 * 0.1;

            // More guns on target
            score += target.weapons.len() as f32 * 0.05;

            if score > best_score {
                best_score = score;
                best_target = Some(target);
            }
        }
        best_target
    }

    /// Best damage-per-heat weapons that stay under the heat tolerance
    fn select_weapons(&self, unit: &AdaptedUnit, target: &TargetOption) -> Vec<String> {
        let mut candidates: Vec<&MountedWeapon> = target
            .weapons
            .iter()
            .filter_map(|id| unit.weapon(id))
            .collect();
        candidates.sort_by(|a, b| {
            efficiency(b)
                .total_cmp(&efficiency(a))
                .then_with(|| a.id.cmp(&b.id))
        });

        let baseline = unit.heat
            + unit.heat_this_turn
            + unit.movement_this_turn.heat(unit.hexes_moved_this_turn);
        let mut projected = baseline.saturating_sub(unit.dissipation());
        let mut ammo = unit.ammo_by_weapon();
        let mut chosen = Vec::new();
        for weapon in candidates {
            if let Some(shots) = ammo.get_mut(&weapon.spec.id) {
                if *shots == 0 {
                    continue;
                }
            }
            let after = projected + weapon.spec.heat;
            if chosen.is_empty() || after <= self.personality.heat.tolerance {
                projected = after;
                if let Some(shots) = ammo.get_mut(&weapon.spec.id) {
                    *shots -= 1;
                }
                chosen.push(weapon.id.clone());
            }
        }

        // Fire in mount order
        target
            .weapons
            .iter()
            .filter(|id| chosen.contains(id))
            .cloned()
            .collect()
    }
}

fn efficiency(weapon: &MountedWeapon) -> f32 {
    weapon.spec.damage as f32 / weapon.spec.heat.max(1) as f32
}

impl BattleAI for AiCommander {
    fn decide_movement(
        &mut self,
        context: &DecisionContext,
        unit: &AdaptedUnit,
        actions: &AvailableActions,
    ) -> Decision {
        if actions.valid_moves.is_empty() {
            return Decision::Pass;
        }
        if self.makes_mistake() {
            let index = self.rng.pick(actions.valid_moves.len());
            return Decision::Move {
                destination: actions.valid_moves[index],
            };
        }

        let Some(enemy) = context.nearest_enemy(unit) else {
            return Decision::Move {
                destination: unit.position,
            };
        };
        let desired = self.desired_distance(unit);
        let options = movement_options(context.state, unit);

        let mut best_cost = f32::MAX;
        let mut best = unit.position;
        for destination in &actions.valid_moves {
            let Some(option) = options.get(destination) else {
                continue;
            };
            let distance = destination.distance(&enemy.position);
            let cost = self.move_cost(unit, option, distance, desired);
            if cost < best_cost {
                best_cost = cost;
                best = *destination;
            }
        }
        Decision::Move { destination: best }
    }

    fn decide_attack(
        &mut self,
        context: &DecisionContext,
        unit: &AdaptedUnit,
        actions: &AvailableActions,
    ) -> Decision {
        if actions.valid_targets.is_empty() || self.makes_mistake() {
            return Decision::Pass;
        }
        let Some(target) = self.select_target(context, &actions.valid_targets) else {
            return Decision::Pass;
        };
        let weapon_ids = self.select_weapons(unit, target);
        if weapon_ids.is_empty() {
            return Decision::Pass;
        }
        Decision::Attack {
            target_id: target.unit_id.clone(),
            weapon_ids,
        }
    }

    fn name(&self) -> &str {
        &self.personality.name
    }
}
