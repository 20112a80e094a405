//! Combat resolution: to-hit, damage, criticals, heat and initiative
//!
//! Resolvers read the current state, draw from the session RNG and return
//! the events that describe the outcome. They never touch the session's
//! state directly; a `ResolutionBuffer` folds each emitted event into a
//! scratch copy so later steps of the same action see earlier results.

use crate::battle::constants::{
    stepped_lookup, AMMO_EXPLOSION_PILOT_WOUNDS, AUTOMATIC_SHUTDOWN_HEAT, CONSCIOUSNESS_TARGETS,
    CRITICAL_HIT_TARGET, HEAD_HIT_PILOT_WOUNDS, HEAT_FIRE_MODIFIERS, PILOT_LETHAL_WOUNDS,
    SHUTDOWN_AVOID_TARGETS, SHUTDOWN_CHECK_HEAT, TARGET_JUMPED_BONUS, TARGET_MOVEMENT_MODIFIERS,
};
use crate::battle::events::GameEventKind;
use crate::battle::hex::attack_arc;
use crate::battle::phase::GamePhase;
use crate::battle::state::GameState;
use crate::battle::validation::validate_attack;
use crate::combat::damage::{allocate_damage, allocate_structure_damage, resolve_transfer};
use crate::combat::location::{hit_location, MechLocation};
use crate::combat::unit::{AdaptedUnit, CriticalSlot, LockState, MovementType};
use crate::combat::weapons::RangeBracket;
use crate::core::error::{Result, TacticsError};
use crate::core::rng::DiceRng;
use crate::core::types::{Side, UnitId};

/// Scratch state plus the events emitted so far for one action
pub struct ResolutionBuffer {
    state: GameState,
    events: Vec<GameEventKind>,
}

impl ResolutionBuffer {
    pub fn new(state: &GameState) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
        }
    }

    /// Record an event and fold it into the scratch state
    pub fn emit(&mut self, kind: GameEventKind) {
        self.state.apply_kind(&kind);
        self.events.push(kind);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    fn unit(&self, id: &UnitId) -> Result<&AdaptedUnit> {
        self.state
            .unit(id)
            .ok_or_else(|| TacticsError::invalid_action(format!("unknown unit '{}'", id)))
    }

    pub fn into_events(self) -> Vec<GameEventKind> {
        self.events
    }
}

/// Target number for one weapon: hit on 2d6 >= this
pub fn target_number(attacker: &AdaptedUnit, target: &AdaptedUnit, bracket: RangeBracket) -> u32 {
    let mut number = attacker.pilot.skills.gunnery;
    number += bracket.to_hit_modifier();
    number += attacker.movement_this_turn.attacker_modifier();
    number += stepped_lookup(&TARGET_MOVEMENT_MODIFIERS, target.hexes_moved_this_turn);
    if target.movement_this_turn == MovementType::Jump {
        number += TARGET_JUMPED_BONUS;
    }
    number += stepped_lookup(&HEAT_FIRE_MODIFIERS, attacker.heat);
    number
}

/// Resolve one unit's weapon attack against one target
pub fn resolve_attack(
    state: &GameState,
    rng: &mut DiceRng,
    attacker_id: &UnitId,
    target_id: &UnitId,
    weapon_ids: &[String],
) -> Result<Vec<GameEventKind>> {
    validate_attack(state, attacker_id, target_id, weapon_ids)?;

    let mut buffer = ResolutionBuffer::new(state);
    let attacker = buffer.unit(attacker_id)?;
    let heat_generated = weapon_ids
        .iter()
        .filter_map(|id| attacker.weapon(id))
        .map(|w| w.spec.heat)
        .sum();
    buffer.emit(GameEventKind::AttackDeclared {
        attacker_id: attacker_id.clone(),
        target_id: target_id.clone(),
        weapon_ids: weapon_ids.to_vec(),
        heat_generated,
    });

    for weapon_id in weapon_ids {
        let attacker = buffer.unit(attacker_id)?;
        let target = buffer.unit(target_id)?;
        let Some(weapon) = attacker.weapon(weapon_id) else {
            continue;
        };
        let distance = attacker.position.distance(&target.position);
        let Some(bracket) = weapon.spec.bracket(distance) else {
            continue;
        };

        let damage = weapon.spec.damage;
        let ammo_bin = if weapon.spec.needs_ammo() {
            let bin = attacker.feeding_bin(&weapon.spec.id).ok_or_else(|| {
                TacticsError::invalid_action(format!("'{}' is out of ammunition", weapon_id))
            })?;
            Some(bin.id.clone())
        } else {
            None
        };
        let number = target_number(attacker, target, bracket);
        let roll = rng.roll_2d6();
        let hit = roll >= number && !target.destroyed;

        let location = if hit {
            let arc = attack_arc(target.position, target.facing, attacker.position);
            let struck = hit_location(rng.roll_2d6(), arc, target.topology);
            resolve_transfer(target, struck.location).map(|location| {
                // Transferred hits land on front armor
                let rear = struck.rear && location == struck.location;
                (location, rear)
            })
        } else {
            None
        };

        tracing::debug!(
            "{} fires {} at {} (range {}, {:?}): rolled {} vs {} -> {}",
            attacker_id,
            weapon_id,
            target_id,
            distance,
            bracket,
            roll,
            number,
            if hit { "hit" } else { "miss" }
        );

        buffer.emit(GameEventKind::AttackResolved {
            attacker_id: attacker_id.clone(),
            target_id: target_id.clone(),
            weapon_id: weapon_id.clone(),
            roll,
            target_number: number,
            hit,
            location: location.map(|(l, _)| l),
            ammo_bin,
        });

        if let Some((location, rear)) = location {
            apply_damage(&mut buffer, rng, target_id, location, rear, damage)?;
        }
    }

    Ok(buffer.into_events())
}

/// Damage one location and play out everything that follows from it
pub fn apply_damage(
    buffer: &mut ResolutionBuffer,
    rng: &mut DiceRng,
    unit_id: &UnitId,
    location: MechLocation,
    rear: bool,
    damage: u32,
) -> Result<()> {
    let was_destroyed = buffer.unit(unit_id)?.destroyed;

    let allocation = allocate_damage(buffer.unit(unit_id)?, location, rear, damage);
    buffer.emit(GameEventKind::damage(unit_id.clone(), allocation));

    if location == MechLocation::Head && allocation.structure_damage > 0 {
        wound_pilot(buffer, rng, unit_id, HEAD_HIT_PILOT_WOUNDS)?;
    }
    if allocation.location_destroyed {
        roll_critical(buffer, rng, unit_id, location)?;
    }

    let unit = buffer.unit(unit_id)?;
    if !was_destroyed && unit.destroyed {
        if let Some(reason) = unit.destruction_reason() {
            tracing::debug!("{} destroyed ({:?})", unit_id, reason);
            buffer.emit(GameEventKind::UnitDestroyed {
                unit_id: unit_id.clone(),
                reason,
            });
        }
    }
    Ok(())
}

/// A destroyed location may take one critical hit on a live item
fn roll_critical(
    buffer: &mut ResolutionBuffer,
    rng: &mut DiceRng,
    unit_id: &UnitId,
    location: MechLocation,
) -> Result<()> {
    let candidates = buffer.unit(unit_id)?.critical_candidates(location);
    if candidates.is_empty() || rng.roll_2d6() < CRITICAL_HIT_TARGET {
        return Ok(());
    }
    let slot = candidates[rng.pick(candidates.len())].clone();

    // Snapshot the bin before the critical marks it
    let explosion = match &slot {
        CriticalSlot::Ammo(bin_id) => {
            let unit = buffer.unit(unit_id)?;
            unit.ammo_bins
                .iter()
                .find(|bin| &bin.id == bin_id && bin.shots > 0)
                .map(|bin| {
                    let per_shot = unit
                        .weapons
                        .iter()
                        .find(|w| w.spec.id == bin.weapon_id)
                        .map(|w| w.spec.damage)
                        .unwrap_or(0);
                    (bin.id.clone(), bin.shots * per_shot)
                })
        }
        _ => None,
    };

    buffer.emit(GameEventKind::CriticalHit {
        unit_id: unit_id.clone(),
        location,
        equipment_id: slot.id().to_string(),
    });

    if let Some((bin_id, damage)) = explosion {
        tracing::debug!("{} ammo explosion in {} ({} damage)", unit_id, location, damage);
        buffer.emit(GameEventKind::AmmoExplosion {
            unit_id: unit_id.clone(),
            location,
            bin_id,
            damage,
        });
        if damage > 0 {
            let allocation =
                allocate_structure_damage(buffer.unit(unit_id)?, MechLocation::CenterTorso, damage);
            buffer.emit(GameEventKind::damage(unit_id.clone(), allocation));
        }
        wound_pilot(buffer, rng, unit_id, AMMO_EXPLOSION_PILOT_WOUNDS)?;
    }
    Ok(())
}

/// Add wounds and roll to stay conscious
fn wound_pilot(
    buffer: &mut ResolutionBuffer,
    rng: &mut DiceRng,
    unit_id: &UnitId,
    wounds: u32,
) -> Result<()> {
    let pilot = buffer.unit(unit_id)?.pilot;
    let total = (pilot.wounds + wounds).min(PILOT_LETHAL_WOUNDS);
    let conscious = if total >= PILOT_LETHAL_WOUNDS || !pilot.conscious {
        false
    } else {
        let index = (total as usize).clamp(1, CONSCIOUSNESS_TARGETS.len()) - 1;
        rng.roll_2d6() >= CONSCIOUSNESS_TARGETS[index]
    };
    buffer.emit(GameEventKind::PilotHit {
        unit_id: unit_id.clone(),
        wounds: total,
        conscious,
    });
    Ok(())
}

/// Heat buildup, dissipation and shutdown checks on entering the Heat phase
pub fn resolve_heat(buffer: &mut ResolutionBuffer, rng: &mut DiceRng) {
    let units: Vec<AdaptedUnit> = buffer
        .state()
        .units
        .values()
        .filter(|u| !u.destroyed)
        .cloned()
        .collect();

    for unit in units {
        let generated = unit.movement_this_turn.heat(unit.hexes_moved_this_turn) + unit.heat_this_turn;
        let dissipated = unit.dissipation();
        let heat = (unit.heat + generated).saturating_sub(dissipated);
        buffer.emit(GameEventKind::HeatApplied {
            unit_id: unit.id.clone(),
            generated,
            dissipated,
            heat,
        });

        if unit.shutdown {
            if heat < SHUTDOWN_CHECK_HEAT {
                buffer.emit(GameEventKind::UnitStartup {
                    unit_id: unit.id.clone(),
                });
            }
            continue;
        }

        let shuts_down = if heat >= AUTOMATIC_SHUTDOWN_HEAT {
            true
        } else if heat >= SHUTDOWN_CHECK_HEAT {
            rng.roll_2d6() < stepped_lookup(&SHUTDOWN_AVOID_TARGETS, heat)
        } else {
            false
        };
        if shuts_down {
            tracing::debug!("{} shuts down at heat {}", unit.id, heat);
            buffer.emit(GameEventKind::UnitShutdown {
                unit_id: unit.id.clone(),
                heat,
            });
        }
    }
}

/// 2d6 per side, re-rolling ties
pub fn roll_initiative(rng: &mut DiceRng) -> GameEventKind {
    loop {
        let player_roll = rng.roll_2d6();
        let opponent_roll = rng.roll_2d6();
        if player_roll == opponent_roll {
            continue;
        }
        let winner = if player_roll > opponent_roll {
            Side::Player
        } else {
            Side::Opponent
        };
        return GameEventKind::InitiativeRolled {
            player_roll,
            opponent_roll,
            winner,
        };
    }
}

/// Events for one `advance_phase` call
pub fn resolve_phase_advance(state: &GameState, rng: &mut DiceRng) -> Result<Vec<GameEventKind>> {
    if state.is_completed() {
        return Err(TacticsError::invalid_action("game is already over"));
    }

    let mut buffer = ResolutionBuffer::new(state);
    let from = state.phase;
    let to = from.next();

    match from {
        GamePhase::Initiative => buffer.emit(roll_initiative(rng)),
        GamePhase::Movement => {
            // Anyone still waiting on the lock commits now
            let planned: Vec<UnitId> = state
                .units
                .values()
                .filter(|u| u.lock_state == LockState::Planned)
                .map(|u| u.id.clone())
                .collect();
            if !planned.is_empty() {
                buffer.emit(GameEventKind::MovementLocked { unit_ids: planned });
            }
        }
        GamePhase::End => buffer.emit(GameEventKind::TurnEnded { turn: state.turn }),
        GamePhase::WeaponAttack | GamePhase::Heat => {}
    }

    if from.wraps_turn() {
        buffer.emit(GameEventKind::TurnStarted {
            turn: state.turn + 1,
        });
    }
    buffer.emit(GameEventKind::PhaseChanged { from, to });

    if to == GamePhase::Heat {
        resolve_heat(&mut buffer, rng);
    }

    Ok(buffer.into_events())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoordinate;
    use crate::combat::unit::test_support::sample_unit;
    use crate::combat::unit::DestructionReason;
    use crate::combat::weapons::{AmmoBin, MountedWeapon, WeaponSpec};

    fn duel(distance: i32) -> GameState {
        let mut state = GameState::initial();
        let player = sample_unit("p1", Side::Player, HexCoordinate::new(0, distance));
        let opponent = sample_unit("o1", Side::Opponent, HexCoordinate::new(0, 0));
        state.units.insert(player.id.clone(), player);
        state.units.insert(opponent.id.clone(), opponent);
        state.phase = GamePhase::WeaponAttack;
        state
    }

    #[test]
    fn test_target_number_components() {
        let state = duel(3);
        let attacker = state.unit(&UnitId::from("p1")).unwrap().clone();
        let mut target = state.unit(&UnitId::from("o1")).unwrap().clone();
        assert_eq!(target_number(&attacker, &target, RangeBracket::Short), 4);
        assert_eq!(target_number(&attacker, &target, RangeBracket::Long), 8);

        target.movement_this_turn = MovementType::Jump;
        target.hexes_moved_this_turn = 5;
        assert_eq!(target_number(&attacker, &target, RangeBracket::Short), 7);

        let mut hot = attacker.clone();
        hot.heat = 13;
        hot.movement_this_turn = MovementType::Run;
        assert_eq!(target_number(&hot, &target, RangeBracket::Short), 11);
    }

    #[test]
    fn test_attack_emits_declared_then_resolved() {
        let state = duel(3);
        let mut rng = DiceRng::new(7);
        let events = resolve_attack(
            &state,
            &mut rng,
            &UnitId::from("p1"),
            &UnitId::from("o1"),
            &["medium-laser".to_string()],
        )
        .unwrap();

        assert!(matches!(
            events[0],
            GameEventKind::AttackDeclared {
                heat_generated: 3,
                ..
            }
        ));
        assert!(matches!(events[1], GameEventKind::AttackResolved { .. }));
    }

    #[test]
    fn test_attack_is_deterministic() {
        let state = duel(2);
        let weapons = ["medium-laser".to_string()];
        let run = |seed| {
            let mut rng = DiceRng::new(seed);
            resolve_attack(&state, &mut rng, &UnitId::from("p1"), &UnitId::from("o1"), &weapons)
                .unwrap()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_out_of_range_attack_rejected() {
        let state = duel(12);
        let mut rng = DiceRng::new(1);
        let result = resolve_attack(
            &state,
            &mut rng,
            &UnitId::from("p1"),
            &UnitId::from("o1"),
            &["medium-laser".to_string()],
        );
        assert!(matches!(result, Err(TacticsError::InvalidAction(_))));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_ammo_consumed_on_fire() {
        let mut state = duel(8);
        let player = state.units.get_mut(&UnitId::from("p1")).unwrap();
        player.weapons.push(MountedWeapon::new(
            "lrm-10",
            WeaponSpec::lrm_10(),
            MechLocation::LeftTorso,
        ));
        player.ammo_bins.push(AmmoBin {
            id: "ammo-lrm-10".into(),
            weapon_id: "lrm-10".into(),
            location: MechLocation::LeftTorso,
            shots: 12,
        });
        let mut rng = DiceRng::new(3);
        let events = resolve_attack(
            &state,
            &mut rng,
            &UnitId::from("p1"),
            &UnitId::from("o1"),
            &["lrm-10".to_string()],
        )
        .unwrap();
        for event in &events {
            state.apply_kind(event);
        }
        assert_eq!(state.unit(&UnitId::from("p1")).unwrap().ammo_remaining("lrm-10"), 11);
    }

    fn with_lrm_pair(state: &mut GameState, shots: u32) {
        let player = state.units.get_mut(&UnitId::from("p1")).unwrap();
        let mounts = [
            ("lrm-10", MechLocation::LeftTorso),
            ("lrm-10-2", MechLocation::RightTorso),
        ];
        for (id, location) in mounts {
            player.weapons.push(MountedWeapon::new(id, WeaponSpec::lrm_10(), location));
        }
        player.ammo_bins.push(AmmoBin {
            id: "ammo-lrm-10".into(),
            weapon_id: "lrm-10".into(),
            location: MechLocation::LeftTorso,
            shots,
        });
    }

    #[test]
    fn test_shared_bin_cannot_feed_more_shots_than_it_holds() {
        let mut state = duel(8);
        with_lrm_pair(&mut state, 1);
        let both = ["lrm-10".to_string(), "lrm-10-2".to_string()];
        for seed in 0..20 {
            let mut rng = DiceRng::new(seed);
            let result =
                resolve_attack(&state, &mut rng, &UnitId::from("p1"), &UnitId::from("o1"), &both);
            assert!(matches!(result, Err(TacticsError::InvalidAction(_))));
            assert_eq!(rng.draws(), 0);
        }

        // One mount may still fire the last shot
        let mut rng = DiceRng::new(4);
        let events = resolve_attack(
            &state,
            &mut rng,
            &UnitId::from("p1"),
            &UnitId::from("o1"),
            &["lrm-10-2".to_string()],
        )
        .unwrap();
        assert!(matches!(
            events[0],
            GameEventKind::AttackDeclared {
                heat_generated: 4,
                ..
            }
        ));
        for event in &events {
            state.apply_kind(event);
        }
        let player = state.unit(&UnitId::from("p1")).unwrap();
        assert_eq!(player.ammo_remaining("lrm-10"), 0);
        assert_eq!(player.usable_weapons().filter(|w| w.spec.needs_ammo()).count(), 0);
    }

    #[test]
    fn test_shared_bin_feeds_both_mounts_when_stocked() {
        let mut state = duel(8);
        with_lrm_pair(&mut state, 2);
        let mut rng = DiceRng::new(4);
        let events = resolve_attack(
            &state,
            &mut rng,
            &UnitId::from("p1"),
            &UnitId::from("o1"),
            &["lrm-10".to_string(), "lrm-10-2".to_string()],
        )
        .unwrap();
        let fed = events
            .iter()
            .filter(|e| matches!(e, GameEventKind::AttackResolved { ammo_bin: Some(_), .. }))
            .count();
        assert_eq!(fed, 2);
        for event in &events {
            state.apply_kind(event);
        }
        assert_eq!(state.unit(&UnitId::from("p1")).unwrap().ammo_remaining("lrm-10"), 0);
    }

    /// Destroy `location` on o1 with each seed until a critical hit lands
    fn first_critical(state: &GameState, location: MechLocation) -> Vec<GameEventKind> {
        for seed in 0..200 {
            let mut rng = DiceRng::new(seed);
            let mut buffer = ResolutionBuffer::new(state);
            apply_damage(&mut buffer, &mut rng, &UnitId::from("o1"), location, false, 500).unwrap();
            let events = buffer.into_events();
            if events.iter().any(|e| matches!(e, GameEventKind::CriticalHit { .. })) {
                return events;
            }
        }
        panic!("no critical hit in 200 seeds");
    }

    #[test]
    fn test_ammo_critical_explodes_into_center_torso() {
        let mut state = duel(3);
        {
            let target = state.units.get_mut(&UnitId::from("o1")).unwrap();
            target.weapons.push(MountedWeapon::new(
                "lrm-10",
                WeaponSpec::lrm_10(),
                MechLocation::LeftTorso,
            ));
            target.ammo_bins.push(AmmoBin {
                id: "ammo-lrm-10".into(),
                weapon_id: "lrm-10".into(),
                location: MechLocation::LeftArm,
                shots: 12,
            });
        }

        let events = first_critical(&state, MechLocation::LeftArm);
        let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "damage_applied",
                "critical_hit",
                "ammo_explosion",
                "damage_applied",
                "pilot_hit",
                "unit_destroyed"
            ]
        );
        assert!(matches!(
            &events[2],
            GameEventKind::AmmoExplosion { bin_id, damage: 72, .. } if bin_id == "ammo-lrm-10"
        ));
        assert!(matches!(
            events[3],
            GameEventKind::DamageApplied {
                location: MechLocation::CenterTorso,
                armor_damage: 0,
                structure_remaining: 0,
                location_destroyed: true,
                ..
            }
        ));
        assert!(matches!(events[4], GameEventKind::PilotHit { wounds: 2, .. }));
        assert!(matches!(
            events[5],
            GameEventKind::UnitDestroyed {
                reason: DestructionReason::CenterTorsoDestroyed,
                ..
            }
        ));

        for event in &events {
            state.apply_kind(event);
        }
        let target = state.unit(&UnitId::from("o1")).unwrap();
        assert!(target.destroyed);
        assert_eq!(target.ammo_remaining("lrm-10"), 0);
    }

    #[test]
    fn test_weapon_critical_disables_weapon() {
        let state = duel(3);
        let events = first_critical(&state, MechLocation::RightArm);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEventKind::CriticalHit { equipment_id, .. } if equipment_id == "medium-laser"
        )));
        assert!(!events.iter().any(|e| matches!(e, GameEventKind::AmmoExplosion { .. })));

        // A critical alone knocks the weapon out even with its location intact
        let mut state = duel(3);
        state.apply_kind(&GameEventKind::CriticalHit {
            unit_id: UnitId::from("o1"),
            location: MechLocation::RightArm,
            equipment_id: "medium-laser".into(),
        });
        let target = state.unit(&UnitId::from("o1")).unwrap();
        assert!(!target.location_destroyed(MechLocation::RightArm));
        assert!(target.weapon("medium-laser").unwrap().destroyed);
        assert_eq!(target.usable_weapons().count(), 0);
        assert!(!target.destroyed);
    }

    #[test]
    fn test_head_structure_hit_wounds_pilot() {
        let state = duel(3);
        let target = state.unit(&UnitId::from("o1")).unwrap();
        let head_armor = target.armor[&MechLocation::Head];
        assert!(target.structure[&MechLocation::Head] > 1);

        for seed in 0..20 {
            let mut rng = DiceRng::new(seed);
            let mut buffer = ResolutionBuffer::new(&state);
            apply_damage(
                &mut buffer,
                &mut rng,
                &UnitId::from("o1"),
                MechLocation::Head,
                false,
                head_armor + 1,
            )
            .unwrap();
            // The consciousness roll is the only draw
            let expected = DiceRng::new(seed).roll_2d6() >= CONSCIOUSNESS_TARGETS[0];
            let events = buffer.into_events();
            assert_eq!(events.len(), 2);
            assert_eq!(
                events[1],
                GameEventKind::PilotHit {
                    unit_id: UnitId::from("o1"),
                    wounds: 1,
                    conscious: expected,
                }
            );
        }
    }

    #[test]
    fn test_armor_only_head_hit_leaves_pilot_alone() {
        let state = duel(3);
        let mut rng = DiceRng::new(2);
        let mut buffer = ResolutionBuffer::new(&state);
        apply_damage(&mut buffer, &mut rng, &UnitId::from("o1"), MechLocation::Head, false, 1).unwrap();
        assert!(!buffer
            .into_events()
            .iter()
            .any(|e| matches!(e, GameEventKind::PilotHit { .. })));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_sixth_wound_kills_pilot_and_unit() {
        let mut state = duel(3);
        state.units.get_mut(&UnitId::from("o1")).unwrap().pilot.wounds = 5;
        let head_armor = state.unit(&UnitId::from("o1")).unwrap().armor[&MechLocation::Head];

        let mut rng = DiceRng::new(6);
        let mut buffer = ResolutionBuffer::new(&state);
        apply_damage(
            &mut buffer,
            &mut rng,
            &UnitId::from("o1"),
            MechLocation::Head,
            false,
            head_armor + 1,
        )
        .unwrap();
        let events = buffer.into_events();
        assert_eq!(
            events[1],
            GameEventKind::PilotHit {
                unit_id: UnitId::from("o1"),
                wounds: PILOT_LETHAL_WOUNDS,
                conscious: false,
            }
        );
        assert_eq!(
            events[2],
            GameEventKind::UnitDestroyed {
                unit_id: UnitId::from("o1"),
                reason: DestructionReason::PilotKilled,
            }
        );

        // The reducer reaches the same verdict from the pilot hit alone
        let mut folded = duel(3);
        folded.apply_kind(&events[1]);
        let target = folded.unit(&UnitId::from("o1")).unwrap();
        assert!(target.destroyed);
        assert_eq!(target.destruction_reason(), Some(DestructionReason::PilotKilled));
    }

    #[test]
    fn test_lethal_damage_emits_unit_destroyed_once() {
        let state = duel(1);
        let mut rng = DiceRng::new(5);
        let mut buffer = ResolutionBuffer::new(&state);
        let target = UnitId::from("o1");
        apply_damage(&mut buffer, &mut rng, &target, MechLocation::CenterTorso, false, 500).unwrap();
        apply_damage(&mut buffer, &mut rng, &target, MechLocation::LeftTorso, false, 500).unwrap();
        let destroyed = buffer
            .into_events()
            .iter()
            .filter(|e| matches!(e, GameEventKind::UnitDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn test_heat_dissipates_and_shuts_down() {
        let mut state = duel(3);
        {
            let unit = state.units.get_mut(&UnitId::from("p1")).unwrap();
            unit.heat = 25;
            unit.heat_this_turn = 20;
        }
        let mut rng = DiceRng::new(9);
        let mut buffer = ResolutionBuffer::new(&state);
        resolve_heat(&mut buffer, &mut rng);
        let unit = buffer.state().unit(&UnitId::from("p1")).unwrap();
        assert_eq!(unit.heat, 35);
        assert!(unit.shutdown);

        let calm = buffer.state().unit(&UnitId::from("o1")).unwrap();
        assert_eq!(calm.heat, 0);
        assert!(!calm.shutdown);
    }

    #[test]
    fn test_shutdown_unit_restarts_when_cool() {
        let mut state = duel(3);
        {
            let unit = state.units.get_mut(&UnitId::from("p1")).unwrap();
            unit.heat = 15;
            unit.shutdown = true;
        }
        let mut rng = DiceRng::new(9);
        let mut buffer = ResolutionBuffer::new(&state);
        resolve_heat(&mut buffer, &mut rng);
        let unit = buffer.state().unit(&UnitId::from("p1")).unwrap();
        assert_eq!(unit.heat, 5);
        assert!(!unit.shutdown);
    }

    #[test]
    fn test_initiative_never_ties() {
        let mut rng = DiceRng::new(123);
        for _ in 0..50 {
            match roll_initiative(&mut rng) {
                GameEventKind::InitiativeRolled {
                    player_roll,
                    opponent_roll,
                    winner,
                } => {
                    assert_ne!(player_roll, opponent_roll);
                    let expected = if player_roll > opponent_roll {
                        Side::Player
                    } else {
                        Side::Opponent
                    };
                    assert_eq!(winner, expected);
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_end_phase_wraps_turn() {
        let mut state = duel(3);
        state.phase = GamePhase::End;
        state.turn = 4;
        let mut rng = DiceRng::new(1);
        let events = resolve_phase_advance(&state, &mut rng).unwrap();
        assert_eq!(
            events,
            vec![
                GameEventKind::TurnEnded { turn: 4 },
                GameEventKind::TurnStarted { turn: 5 },
                GameEventKind::PhaseChanged {
                    from: GamePhase::End,
                    to: GamePhase::Initiative
                },
            ]
        );
    }
}
