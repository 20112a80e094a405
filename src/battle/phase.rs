//! Turn phases
//!
//! Initiative -> Movement -> WeaponAttack -> Heat -> End, then the next
//! turn's Initiative.

use serde::{Deserialize, Serialize};

/// Phase of a game turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Initiative,
    Movement,
    WeaponAttack,
    Heat,
    End,
}

impl GamePhase {
    /// The phase that follows this one
    pub fn next(&self) -> GamePhase {
        match self {
            GamePhase::Initiative => GamePhase::Movement,
            GamePhase::Movement => GamePhase::WeaponAttack,
            GamePhase::WeaponAttack => GamePhase::Heat,
            GamePhase::Heat => GamePhase::End,
            GamePhase::End => GamePhase::Initiative,
        }
    }

    /// Does leaving this phase start a new turn?
    pub fn wraps_turn(&self) -> bool {
        matches!(self, GamePhase::End)
    }

    /// Phases in which units commit an action
    pub fn is_action_phase(&self) -> bool {
        matches!(self, GamePhase::Movement | GamePhase::WeaponAttack)
    }

    pub fn all() -> [GamePhase; 5] {
        [
            GamePhase::Initiative,
            GamePhase::Movement,
            GamePhase::WeaponAttack,
            GamePhase::Heat,
            GamePhase::End,
        ]
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GamePhase::Initiative => "initiative",
            GamePhase::Movement => "movement",
            GamePhase::WeaponAttack => "weapon_attack",
            GamePhase::Heat => "heat",
            GamePhase::End => "end",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_visits_every_phase_once() {
        let mut phase = GamePhase::Initiative;
        let mut visited = Vec::new();
        for _ in 0..5 {
            phase = phase.next();
            visited.push(phase);
        }
        assert_eq!(
            visited,
            vec![
                GamePhase::Movement,
                GamePhase::WeaponAttack,
                GamePhase::Heat,
                GamePhase::End,
                GamePhase::Initiative
            ]
        );
    }

    #[test]
    fn test_only_end_wraps() {
        for phase in GamePhase::all() {
            assert_eq!(phase.wraps_turn(), phase == GamePhase::End);
        }
    }
}
