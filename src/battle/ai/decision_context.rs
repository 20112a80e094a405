//! AI's view of the game state for one side

use crate::battle::phase::GamePhase;
use crate::battle::state::GameState;
use crate::combat::unit::AdaptedUnit;
use crate::core::types::{Side, UnitId};

/// AI's decision-making context
///
/// Full information: both sides see the whole map.
pub struct DecisionContext<'a> {
    pub state: &'a GameState,
    pub side: Side,
}

impl<'a> DecisionContext<'a> {
    pub fn new(state: &'a GameState, side: Side) -> Self {
        Self { state, side }
    }

    /// Get all living own units
    pub fn own_units(&self) -> Vec<&'a AdaptedUnit> {
        self.state.living_units(self.side).collect()
    }

    /// Get all living enemy units
    pub fn enemy_units(&self) -> Vec<&'a AdaptedUnit> {
        self.state.living_units(self.side.opponent()).collect()
    }

    /// Get any unit by ID
    pub fn unit(&self, unit_id: &UnitId) -> Option<&'a AdaptedUnit> {
        self.state.unit(unit_id)
    }

    /// Closest living enemy to `unit`, ties broken by id
    pub fn nearest_enemy(&self, unit: &AdaptedUnit) -> Option<&'a AdaptedUnit> {
        self.enemy_units()
            .into_iter()
            .min_by(|a, b| {
                let da = unit.position.distance(&a.position);
                let db = unit.position.distance(&b.position);
                da.cmp(&db).then_with(|| a.id.cmp(&b.id))
            })
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    /// Own living units / enemy living units
    pub fn strength_ratio(&self) -> f32 {
        let enemy = self.state.survivors(self.side.opponent());
        if enemy == 0 {
            return f32::MAX;
        }
        self.state.survivors(self.side) as f32 / enemy as f32
    }
}
