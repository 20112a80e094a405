//! Game events - the append-only record of a game
//!
//! Every state change is one of these. `GameState` is rebuilt by folding
//! them in sequence order; nothing else mutates state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::hex::{Facing, HexCoordinate};
use crate::battle::outcome::{EndReason, Winner};
use crate::battle::phase::GamePhase;
use crate::combat::damage::DamageAllocation;
use crate::combat::location::MechLocation;
use crate::combat::unit::{AdaptedUnit, DestructionReason, MovementType};
use crate::core::config::GameConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::{SessionId, Side, UnitId};

/// What happened, with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GameEventKind {
    GameCreated {
        session_id: SessionId,
        seed: u64,
        config: GameConfig,
        units: Vec<AdaptedUnit>,
    },
    GameStarted,
    TurnStarted {
        turn: u32,
    },
    InitiativeRolled {
        player_roll: u32,
        opponent_roll: u32,
        winner: Side,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    MovementDeclared {
        unit_id: UnitId,
        from: HexCoordinate,
        to: HexCoordinate,
        facing: Facing,
        movement_type: MovementType,
        hexes_moved: u32,
    },
    MovementLocked {
        unit_ids: Vec<UnitId>,
    },
    AttackDeclared {
        attacker_id: UnitId,
        target_id: UnitId,
        weapon_ids: Vec<String>,
        heat_generated: u32,
    },
    AttackResolved {
        attacker_id: UnitId,
        target_id: UnitId,
        weapon_id: String,
        roll: u32,
        target_number: u32,
        hit: bool,
        location: Option<MechLocation>,
        /// Ammo bin the shot was drawn from
        ammo_bin: Option<String>,
    },
    DamageApplied {
        unit_id: UnitId,
        location: MechLocation,
        rear: bool,
        damage: u32,
        armor_damage: u32,
        structure_damage: u32,
        armor_remaining: u32,
        structure_remaining: u32,
        location_destroyed: bool,
    },
    CriticalHit {
        unit_id: UnitId,
        location: MechLocation,
        equipment_id: String,
    },
    AmmoExplosion {
        unit_id: UnitId,
        location: MechLocation,
        bin_id: String,
        damage: u32,
    },
    PilotHit {
        unit_id: UnitId,
        wounds: u32,
        conscious: bool,
    },
    HeatApplied {
        unit_id: UnitId,
        generated: u32,
        dissipated: u32,
        heat: u32,
    },
    UnitShutdown {
        unit_id: UnitId,
        heat: u32,
    },
    UnitStartup {
        unit_id: UnitId,
    },
    UnitDestroyed {
        unit_id: UnitId,
        reason: DestructionReason,
    },
    TurnEnded {
        turn: u32,
    },
    GameEnded {
        winner: Winner,
        reason: EndReason,
    },
}

impl GameEventKind {
    /// Build a `DamageApplied` from an allocation
    pub fn damage(unit_id: UnitId, allocation: DamageAllocation) -> Self {
        GameEventKind::DamageApplied {
            unit_id,
            location: allocation.location,
            rear: allocation.rear,
            damage: allocation.damage,
            armor_damage: allocation.armor_damage,
            structure_damage: allocation.structure_damage,
            armor_remaining: allocation.armor_remaining,
            structure_remaining: allocation.structure_remaining,
            location_destroyed: allocation.location_destroyed,
        }
    }

    /// snake_case event type name
    pub fn name(&self) -> &'static str {
        match self {
            GameEventKind::GameCreated { .. } => "game_created",
            GameEventKind::GameStarted => "game_started",
            GameEventKind::TurnStarted { .. } => "turn_started",
            GameEventKind::InitiativeRolled { .. } => "initiative_rolled",
            GameEventKind::PhaseChanged { .. } => "phase_changed",
            GameEventKind::MovementDeclared { .. } => "movement_declared",
            GameEventKind::MovementLocked { .. } => "movement_locked",
            GameEventKind::AttackDeclared { .. } => "attack_declared",
            GameEventKind::AttackResolved { .. } => "attack_resolved",
            GameEventKind::DamageApplied { .. } => "damage_applied",
            GameEventKind::CriticalHit { .. } => "critical_hit",
            GameEventKind::AmmoExplosion { .. } => "ammo_explosion",
            GameEventKind::PilotHit { .. } => "pilot_hit",
            GameEventKind::HeatApplied { .. } => "heat_applied",
            GameEventKind::UnitShutdown { .. } => "unit_shutdown",
            GameEventKind::UnitStartup { .. } => "unit_startup",
            GameEventKind::UnitDestroyed { .. } => "unit_destroyed",
            GameEventKind::TurnEnded { .. } => "turn_ended",
            GameEventKind::GameEnded { .. } => "game_ended",
        }
    }
}

/// One immutable log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// `<session id>-<sequence>`
    pub id: String,
    /// 1-based, gapless
    pub sequence: u64,
    /// Turn and phase in effect when the event was recorded
    pub turn: u32,
    pub phase: GamePhase,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: GameEventKind,
}

/// Ordered, append-only list of events for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new event and return it
    pub fn append(
        &mut self,
        session_id: SessionId,
        turn: u32,
        phase: GamePhase,
        timestamp: DateTime<Utc>,
        kind: GameEventKind,
    ) -> &GameEvent {
        let sequence = self.next_sequence();
        self.events.push(GameEvent {
            id: format!("{}-{}", session_id, sequence),
            sequence,
            turn,
            phase,
            timestamp,
            kind,
        });
        let last = self.events.len() - 1;
        &self.events[last]
    }

    pub fn next_sequence(&self) -> u64 {
        self.events.len() as u64 + 1
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&GameEvent> {
        self.events.last()
    }

    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.events)?)
    }

    /// Parse an exported log, rejecting gaps or reordering
    pub fn from_json(json: &str) -> Result<Self> {
        let events: Vec<GameEvent> = serde_json::from_str(json)?;
        Self::from_events(events)
    }

    pub fn from_events(events: Vec<GameEvent>) -> Result<Self> {
        for (index, event) in events.iter().enumerate() {
            let expected = index as u64 + 1;
            if event.sequence != expected {
                return Err(TacticsError::InvalidConfig(format!(
                    "event log out of order: expected sequence {}, found {}",
                    expected, event.sequence
                )));
            }
        }
        Ok(Self { events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, FixedClock};

    #[test]
    fn test_sequences_are_gapless_from_one() {
        let clock = FixedClock::epoch();
        let session = SessionId::from_random_bytes([7; 16]);
        let mut log = EventLog::new();
        log.append(session, 1, GamePhase::Initiative, clock.now(), GameEventKind::GameStarted);
        log.append(
            session,
            1,
            GamePhase::Initiative,
            clock.now(),
            GameEventKind::TurnStarted { turn: 1 },
        );
        let sequences: Vec<u64> = log.events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(log.events()[1].id, format!("{}-2", session));
    }

    #[test]
    fn test_event_wire_shape() {
        let clock = FixedClock::epoch();
        let mut log = EventLog::new();
        log.append(
            SessionId::nil(),
            3,
            GamePhase::End,
            clock.now(),
            GameEventKind::TurnEnded { turn: 3 },
        );
        let value = serde_json::to_value(&log.events()[0]).unwrap();
        assert_eq!(value["type"], "turn_ended");
        assert_eq!(value["payload"]["turn"], 3);
        assert_eq!(value["phase"], "end");
        assert_eq!(value["sequence"], 1);
    }

    #[test]
    fn test_json_round_trip_preserves_log() {
        let clock = FixedClock::epoch();
        let mut log = EventLog::new();
        log.append(
            SessionId::nil(),
            1,
            GamePhase::Initiative,
            clock.now(),
            GameEventKind::PhaseChanged {
                from: GamePhase::Initiative,
                to: GamePhase::Movement,
            },
        );
        let parsed = EventLog::from_json(&log.to_json().unwrap()).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn test_from_events_rejects_gap() {
        let clock = FixedClock::epoch();
        let mut log = EventLog::new();
        log.append(SessionId::nil(), 1, GamePhase::Initiative, clock.now(), GameEventKind::GameStarted);
        let mut events = log.into_events();
        events[0].sequence = 2;
        assert!(matches!(
            EventLog::from_events(events),
            Err(TacticsError::InvalidConfig(_))
        ));
    }
}
