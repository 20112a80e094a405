//! Movement reachability and resolution
//!
//! Ground movement is a breadth-first flood over the map, blocked by living
//! enemy units. Jumping ignores blockers and reaches any hex within jump MP.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::battle::events::GameEventKind;
use crate::battle::hex::{Facing, HexCoordinate};
use crate::battle::phase::GamePhase;
use crate::battle::resolution::ResolutionBuffer;
use crate::battle::state::GameState;
use crate::combat::unit::{AdaptedUnit, LockState, MovementType};
use crate::core::error::{Result, TacticsError};
use crate::core::types::UnitId;

/// One legal way to reach a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOption {
    pub destination: HexCoordinate,
    pub movement_type: MovementType,
    /// Hexes entered (path length on the ground, straight distance when jumping)
    pub hexes: u32,
}

/// Ground steps to every hex reachable within `mp`
pub fn ground_reach(state: &GameState, unit: &AdaptedUnit, mp: u32) -> BTreeMap<HexCoordinate, u32> {
    let origin = HexCoordinate::origin();
    let radius = state.config.map_radius;

    let mut steps = BTreeMap::new();
    let mut frontier = VecDeque::new();
    steps.insert(unit.position, 0);
    frontier.push_back(unit.position);

    while let Some(current) = frontier.pop_front() {
        let cost = steps[&current];
        if cost >= mp {
            continue;
        }
        for neighbor in current.neighbors() {
            if steps.contains_key(&neighbor) || !origin.in_radius(radius, &neighbor) {
                continue;
            }
            let blocked = state
                .occupant(neighbor, &unit.id)
                .is_some_and(|other| other.side != unit.side);
            if blocked {
                continue;
            }
            steps.insert(neighbor, cost + 1);
            frontier.push_back(neighbor);
        }
    }
    steps
}

/// Cheapest movement option for every legal destination
pub fn movement_options(state: &GameState, unit: &AdaptedUnit) -> BTreeMap<HexCoordinate, MoveOption> {
    let mut options = BTreeMap::new();
    options.insert(
        unit.position,
        MoveOption {
            destination: unit.position,
            movement_type: MovementType::Stationary,
            hexes: 0,
        },
    );

    let walk = unit.walk_mp();
    for (hex, steps) in ground_reach(state, unit, unit.run_mp()) {
        if steps == 0 || state.occupant(hex, &unit.id).is_some() {
            continue;
        }
        let movement_type = if steps <= walk {
            MovementType::Walk
        } else {
            MovementType::Run
        };
        options.insert(
            hex,
            MoveOption {
                destination: hex,
                movement_type,
                hexes: steps,
            },
        );
    }

    for (hex, distance) in jump_reach(state, unit) {
        if state.occupant(hex, &unit.id).is_some() {
            continue;
        }
        options.entry(hex).or_insert(MoveOption {
            destination: hex,
            movement_type: MovementType::Jump,
            hexes: distance,
        });
    }
    options
}

fn jump_reach(state: &GameState, unit: &AdaptedUnit) -> Vec<(HexCoordinate, u32)> {
    let jump = unit.jump_mp();
    if jump == 0 {
        return Vec::new();
    }
    let origin = HexCoordinate::origin();
    unit.position
        .hexes_in_range(jump)
        .into_iter()
        .filter(|hex| *hex != unit.position && origin.in_radius(state.config.map_radius, hex))
        .map(|hex| (hex, unit.position.distance(&hex)))
        .collect()
}

/// The option for `destination` using a specific movement type
pub fn forced_option(
    state: &GameState,
    unit: &AdaptedUnit,
    destination: HexCoordinate,
    movement_type: MovementType,
) -> Option<MoveOption> {
    let option = |hexes| MoveOption {
        destination,
        movement_type,
        hexes,
    };
    if destination != unit.position && state.occupant(destination, &unit.id).is_some() {
        return None;
    }
    match movement_type {
        MovementType::Stationary => (destination == unit.position).then(|| option(0)),
        MovementType::Walk | MovementType::Run => {
            let mp = if movement_type == MovementType::Walk {
                unit.walk_mp()
            } else {
                unit.run_mp()
            };
            ground_reach(state, unit, mp)
                .get(&destination)
                .copied()
                .filter(|steps| *steps > 0)
                .map(option)
        }
        MovementType::Jump => jump_reach(state, unit)
            .into_iter()
            .find(|(hex, _)| *hex == destination)
            .map(|(_, distance)| option(distance)),
    }
}

/// Check that `unit_id` may declare movement right now
pub fn check_can_move<'a>(state: &'a GameState, unit_id: &UnitId) -> Result<&'a AdaptedUnit> {
    let unit = state
        .unit(unit_id)
        .ok_or_else(|| TacticsError::invalid_action(format!("unknown unit '{}'", unit_id)))?;
    if state.is_completed() {
        return Err(TacticsError::invalid_action("game is already over"));
    }
    if state.phase != GamePhase::Movement {
        return Err(TacticsError::invalid_action(format!(
            "cannot move during the {} phase",
            state.phase
        )));
    }
    if !unit.is_operable() {
        return Err(TacticsError::invalid_action(format!(
            "unit '{}' cannot act",
            unit_id
        )));
    }
    if unit.lock_state.has_committed() {
        return Err(TacticsError::invalid_action(format!(
            "unit '{}' has already moved this phase",
            unit_id
        )));
    }
    Ok(unit)
}

/// Resolve a movement declaration
///
/// With `movement_type = None` the cheapest type that reaches the hex is used.
pub fn resolve_movement(
    state: &GameState,
    unit_id: &UnitId,
    destination: HexCoordinate,
    movement_type: Option<MovementType>,
) -> Result<Vec<GameEventKind>> {
    let unit = check_can_move(state, unit_id)?;
    let option = match movement_type {
        Some(forced) => forced_option(state, unit, destination, forced),
        None => movement_options(state, unit).get(&destination).copied(),
    }
    .ok_or_else(|| {
        TacticsError::invalid_action(format!(
            "unit '{}' cannot reach {}",
            unit_id, destination
        ))
    })?;

    let facing = Facing::toward(unit.position, destination).unwrap_or(unit.facing);
    tracing::debug!(
        "{} {:?} {} -> {} ({} hexes)",
        unit_id,
        option.movement_type,
        unit.position,
        destination,
        option.hexes
    );

    let mut buffer = ResolutionBuffer::new(state);
    buffer.emit(GameEventKind::MovementDeclared {
        unit_id: unit_id.clone(),
        from: unit.position,
        to: destination,
        facing,
        movement_type: option.movement_type,
        hexes_moved: option.hexes,
    });

    // Lock everyone once the last operable unit has committed
    let scratch = buffer.state();
    let all_committed = scratch
        .units
        .values()
        .filter(|u| u.is_operable())
        .all(|u| u.lock_state.has_committed());
    if all_committed {
        let unit_ids: Vec<UnitId> = scratch
            .units
            .values()
            .filter(|u| u.lock_state == LockState::Planned)
            .map(|u| u.id.clone())
            .collect();
        buffer.emit(GameEventKind::MovementLocked { unit_ids });
    }

    Ok(buffer.into_events())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::unit::test_support::sample_unit;
    use crate::core::types::Side;

    fn movement_state(units: Vec<AdaptedUnit>) -> GameState {
        let mut state = GameState::initial();
        for unit in units {
            state.units.insert(unit.id.clone(), unit);
        }
        state.phase = GamePhase::Movement;
        state
    }

    #[test]
    fn test_walk_and_run_bands() {
        let unit = sample_unit("p1", Side::Player, HexCoordinate::origin());
        let state = movement_state(vec![unit.clone()]);
        let options = movement_options(&state, &unit);

        assert_eq!(options[&HexCoordinate::origin()].movement_type, MovementType::Stationary);
        assert_eq!(options[&HexCoordinate::new(0, -4)].movement_type, MovementType::Walk);
        assert_eq!(options[&HexCoordinate::new(0, -6)].movement_type, MovementType::Run);
        assert!(!options.contains_key(&HexCoordinate::new(0, -7)));
    }

    #[test]
    fn test_reach_respects_map_radius() {
        let unit = sample_unit("p1", Side::Player, HexCoordinate::new(0, 7));
        let state = movement_state(vec![unit.clone()]);
        for hex in movement_options(&state, &unit).keys() {
            assert!(HexCoordinate::origin().in_radius(7, hex));
        }
    }

    #[test]
    fn test_occupied_hex_is_not_a_destination() {
        let unit = sample_unit("p1", Side::Player, HexCoordinate::origin());
        let friend = sample_unit("p2", Side::Player, HexCoordinate::new(0, -1));
        let state = movement_state(vec![unit.clone(), friend]);
        let options = movement_options(&state, &unit);
        assert!(!options.contains_key(&HexCoordinate::new(0, -1)));
        // Friends can be moved through
        assert_eq!(options[&HexCoordinate::new(0, -2)].hexes, 2);
    }

    #[test]
    fn test_enemies_block_ground_paths() {
        let unit = sample_unit("p1", Side::Player, HexCoordinate::origin());
        let mut units = vec![unit.clone()];
        for (i, hex) in HexCoordinate::origin().neighbors().into_iter().enumerate() {
            units.push(sample_unit(&format!("o{}", i), Side::Opponent, hex));
        }
        let state = movement_state(units);
        let options = movement_options(&state, &unit);
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn test_jump_reaches_over_blockers() {
        let mut unit = sample_unit("p1", Side::Player, HexCoordinate::origin());
        unit.movement.jump = 3;
        unit.equipment = (0..3)
            .map(|i| crate::combat::unit::EquipmentSlot {
                id: format!("jump-jet-{}", i),
                kind: crate::combat::unit::SlotKind::JumpJet,
                location: crate::combat::location::MechLocation::CenterTorso,
            })
            .collect();
        unit.movement.walk = 0;
        unit.movement.run = 0;
        let state = movement_state(vec![unit.clone()]);
        let option = movement_options(&state, &unit)[&HexCoordinate::new(0, -3)];
        assert_eq!(option.movement_type, MovementType::Jump);
        assert_eq!(option.hexes, 3);
    }

    #[test]
    fn test_last_commit_locks_movement() {
        let a = sample_unit("p1", Side::Player, HexCoordinate::new(0, 3));
        let b = sample_unit("o1", Side::Opponent, HexCoordinate::new(0, -3));
        let mut state = movement_state(vec![a, b]);

        let first = resolve_movement(&state, &UnitId::from("p1"), HexCoordinate::new(0, 2), None).unwrap();
        assert_eq!(first.len(), 1);
        for event in &first {
            state.apply_kind(event);
        }

        let second =
            resolve_movement(&state, &UnitId::from("o1"), HexCoordinate::new(0, -3), None).unwrap();
        assert_eq!(second.len(), 2);
        assert!(matches!(second[1], GameEventKind::MovementLocked { ref unit_ids } if unit_ids.len() == 2));
    }

    #[test]
    fn test_move_sets_facing_toward_destination() {
        let unit = sample_unit("p1", Side::Player, HexCoordinate::origin());
        let state = movement_state(vec![unit]);
        let events =
            resolve_movement(&state, &UnitId::from("p1"), HexCoordinate::new(0, 2), None).unwrap();
        match &events[0] {
            GameEventKind::MovementDeclared { facing, .. } => assert_eq!(*facing, Facing::South),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_second_move_rejected() {
        let a = sample_unit("p1", Side::Player, HexCoordinate::new(0, 3));
        let b = sample_unit("o1", Side::Opponent, HexCoordinate::new(0, -3));
        let mut state = movement_state(vec![a, b]);
        for event in resolve_movement(&state, &UnitId::from("p1"), HexCoordinate::new(0, 2), None).unwrap() {
            state.apply_kind(&event);
        }
        let again = resolve_movement(&state, &UnitId::from("p1"), HexCoordinate::new(0, 1), None);
        assert!(matches!(again, Err(TacticsError::InvalidAction(_))));
    }

    #[test]
    fn test_forced_run_needs_ground_path() {
        let unit = sample_unit("p1", Side::Player, HexCoordinate::origin());
        let state = movement_state(vec![unit.clone()]);
        let run = forced_option(&state, &unit, HexCoordinate::new(0, -2), MovementType::Run);
        assert_eq!(run.map(|o| o.movement_type), Some(MovementType::Run));
        let jump = forced_option(&state, &unit, HexCoordinate::new(0, -2), MovementType::Jump);
        assert!(jump.is_none());
    }
}
