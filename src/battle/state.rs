//! Derived game state
//!
//! `GameState` is only ever produced by folding events through `apply`.
//! `derive_state` over any prefix of a log reproduces the state that
//! existed when the last event of that prefix was appended.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::events::{GameEvent, GameEventKind};
use crate::battle::hex::HexCoordinate;
use crate::battle::outcome::GameResult;
use crate::battle::phase::GamePhase;
use crate::combat::unit::{AdaptedUnit, LockState, MovementType};
use crate::core::config::GameConfig;
use crate::core::types::{SessionId, Side, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Active,
    Completed,
}

/// Authoritative state of one game, derived from its events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub session_id: SessionId,
    pub seed: u64,
    pub config: GameConfig,
    pub status: GameStatus,
    pub phase: GamePhase,
    pub turn: u32,
    pub units: BTreeMap<UnitId, AdaptedUnit>,
    /// Winner of this turn's initiative roll
    pub initiative: Option<Side>,
    pub result: Option<GameResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Sequence of the last applied event (0 = none)
    pub last_sequence: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

impl GameState {
    /// The empty state every fold starts from
    pub fn initial() -> Self {
        Self {
            session_id: SessionId::nil(),
            seed: 0,
            config: GameConfig::default(),
            status: GameStatus::Active,
            phase: GamePhase::Initiative,
            turn: 1,
            units: BTreeMap::new(),
            initiative: None,
            result: None,
            started_at: None,
            ended_at: None,
            last_sequence: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }

    pub fn unit(&self, id: &UnitId) -> Option<&AdaptedUnit> {
        self.units.get(id)
    }

    /// Units of one side, in id order
    pub fn side_units(&self, side: Side) -> impl Iterator<Item = &AdaptedUnit> {
        self.units.values().filter(move |u| u.side == side)
    }

    pub fn living_units(&self, side: Side) -> impl Iterator<Item = &AdaptedUnit> {
        self.side_units(side).filter(|u| !u.destroyed)
    }

    pub fn survivors(&self, side: Side) -> usize {
        self.living_units(side).count()
    }

    pub fn destroyed_count(&self, side: Side) -> usize {
        self.side_units(side).filter(|u| u.destroyed).count()
    }

    /// Living unit standing on `hex`, other than `except`
    pub fn occupant(&self, hex: HexCoordinate, except: &UnitId) -> Option<&AdaptedUnit> {
        self.units
            .values()
            .find(|u| !u.destroyed && u.position == hex && &u.id != except)
    }

    /// Fold one event into the state
    pub fn apply(&mut self, event: &GameEvent) {
        self.last_sequence = event.sequence;
        match &event.kind {
            GameEventKind::GameStarted => self.started_at = Some(event.timestamp),
            GameEventKind::GameEnded { .. } => self.ended_at = Some(event.timestamp),
            _ => {}
        }
        self.apply_kind(&event.kind);
    }

    /// Apply an event payload without sequence or timestamp bookkeeping
    pub fn apply_kind(&mut self, kind: &GameEventKind) {
        match kind {
            GameEventKind::GameCreated {
                session_id,
                seed,
                config,
                units,
            } => {
                self.session_id = *session_id;
                self.seed = *seed;
                self.config = config.clone();
                self.status = GameStatus::Active;
                self.phase = GamePhase::Initiative;
                self.turn = 1;
                self.units = units.iter().map(|u| (u.id.clone(), u.clone())).collect();
            }
            GameEventKind::GameStarted => {}
            GameEventKind::TurnStarted { turn } => {
                self.turn = *turn;
                self.initiative = None;
            }
            GameEventKind::InitiativeRolled { winner, .. } => {
                self.initiative = Some(*winner);
            }
            GameEventKind::PhaseChanged { to, .. } => {
                self.phase = *to;
                if to.is_action_phase() {
                    for unit in self.units.values_mut() {
                        unit.lock_state = LockState::Pending;
                    }
                }
                if *to == GamePhase::End {
                    for unit in self.units.values_mut() {
                        unit.movement_this_turn = MovementType::Stationary;
                        unit.hexes_moved_this_turn = 0;
                        unit.heat_this_turn = 0;
                    }
                }
            }
            GameEventKind::MovementDeclared {
                unit_id,
                to,
                facing,
                movement_type,
                hexes_moved,
                ..
            } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.position = *to;
                    unit.facing = *facing;
                    unit.movement_this_turn = *movement_type;
                    unit.hexes_moved_this_turn = *hexes_moved;
                    unit.lock_state = LockState::Planned;
                }
            }
            GameEventKind::MovementLocked { unit_ids } => {
                for id in unit_ids {
                    if let Some(unit) = self.units.get_mut(id) {
                        unit.lock_state = LockState::Locked;
                    }
                }
            }
            GameEventKind::AttackDeclared {
                attacker_id,
                heat_generated,
                ..
            } => {
                if let Some(unit) = self.units.get_mut(attacker_id) {
                    unit.heat_this_turn += heat_generated;
                    unit.lock_state = LockState::Resolved;
                }
            }
            GameEventKind::AttackResolved {
                attacker_id,
                ammo_bin: Some(bin_id),
                ..
            } => {
                if let Some(unit) = self.units.get_mut(attacker_id) {
                    if let Some(bin) = unit.ammo_bins.iter_mut().find(|b| &b.id == bin_id) {
                        bin.shots = bin.shots.saturating_sub(1);
                    }
                }
            }
            GameEventKind::AttackResolved { .. } => {}
            GameEventKind::DamageApplied {
                unit_id,
                location,
                rear,
                armor_remaining,
                structure_remaining,
                location_destroyed,
                ..
            } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    if *rear {
                        unit.rear_armor.insert(*location, *armor_remaining);
                    } else {
                        unit.armor.insert(*location, *armor_remaining);
                    }
                    unit.structure.insert(*location, *structure_remaining);
                    if *location_destroyed || *structure_remaining == 0 {
                        unit.destroyed_locations.insert(*location);
                    }
                    refresh_destroyed(unit);
                }
            }
            GameEventKind::CriticalHit {
                unit_id,
                equipment_id,
                ..
            } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    if let Some(weapon) = unit.weapons.iter_mut().find(|w| &w.id == equipment_id) {
                        weapon.destroyed = true;
                    }
                    unit.destroyed_equipment.insert(equipment_id.clone());
                }
            }
            GameEventKind::AmmoExplosion { unit_id, bin_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    if let Some(bin) = unit.ammo_bins.iter_mut().find(|b| &b.id == bin_id) {
                        bin.shots = 0;
                    }
                    unit.destroyed_equipment.insert(bin_id.clone());
                }
            }
            GameEventKind::PilotHit {
                unit_id,
                wounds,
                conscious,
            } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.pilot.wounds = *wounds;
                    unit.pilot.conscious = *conscious;
                    refresh_destroyed(unit);
                }
            }
            GameEventKind::HeatApplied { unit_id, heat, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.heat = *heat;
                }
            }
            GameEventKind::UnitShutdown { unit_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.shutdown = true;
                }
            }
            GameEventKind::UnitStartup { unit_id } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.shutdown = false;
                }
            }
            GameEventKind::UnitDestroyed { unit_id, .. } => {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.destroyed = true;
                }
            }
            GameEventKind::TurnEnded { .. } => {}
            GameEventKind::GameEnded { winner, reason } => {
                self.status = GameStatus::Completed;
                self.result = Some(GameResult {
                    winner: *winner,
                    reason: *reason,
                });
            }
        }
    }
}

/// `destroyed` follows the destruction rule; once set it stays set
fn refresh_destroyed(unit: &mut AdaptedUnit) {
    if unit.destruction_reason().is_some() {
        unit.destroyed = true;
    }
}

/// Fold a sequence of events from the initial state
pub fn derive_state(events: &[GameEvent]) -> GameState {
    let mut state = GameState::initial();
    for event in events {
        state.apply(event);
    }
    state
}
