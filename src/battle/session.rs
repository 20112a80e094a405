//! Game sessions
//!
//! `GameSession` is the event log plus the state derived from it.
//! `InteractiveSession` wraps one with the RNG, clock and AIs needed to
//! drive it one action at a time.

use serde::Serialize;

use crate::battle::ai::{BattleAI, Decision, DecisionContext};
use crate::battle::events::{EventLog, GameEvent, GameEventKind};
use crate::battle::hex::HexCoordinate;
use crate::battle::movement::resolve_movement;
use crate::battle::outcome::{calculate_game_outcome, determine_winner, GameOutcome, GameResult};
use crate::battle::phase::GamePhase;
use crate::battle::resolution::{resolve_attack, resolve_phase_advance};
use crate::battle::state::{derive_state, GameState};
use crate::battle::validation::{available_actions, AvailableActions};
use crate::combat::unit::MovementType;
use crate::core::clock::Clock;
use crate::core::config::GameConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::rng::DiceRng;
use crate::core::types::{SessionId, Side, UnitId};

/// One game: its log and the state derived from it
#[derive(Debug, Clone, Serialize)]
pub struct GameSession {
    id: SessionId,
    config: GameConfig,
    log: EventLog,
    #[serde(skip)]
    current_state: GameState,
}

impl GameSession {
    pub(crate) fn new(id: SessionId, config: GameConfig) -> Self {
        Self {
            id,
            config,
            log: EventLog::new(),
            current_state: GameState::initial(),
        }
    }

    /// Rebuild a session from an exported log
    pub fn from_log(log: EventLog) -> Result<Self> {
        if log.is_empty() {
            return Err(TacticsError::InvalidConfig("event log is empty".into()));
        }
        let state = derive_state(log.events());
        Ok(Self {
            id: state.session_id,
            config: state.config.clone(),
            log,
            current_state: state,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn events(&self) -> &[GameEvent] {
        self.log.events()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn state(&self) -> &GameState {
        &self.current_state
    }

    pub fn is_completed(&self) -> bool {
        self.current_state.is_completed()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        calculate_game_outcome(&self.current_state)
    }

    pub fn events_json(&self) -> Result<String> {
        self.log.to_json()
    }

    /// Append events and fold them into the current state
    ///
    /// Each event is stamped with the turn and phase in force before it.
    pub(crate) fn record(&mut self, clock: &dyn Clock, kinds: Vec<GameEventKind>) -> usize {
        let count = kinds.len();
        for kind in kinds {
            assert!(
                !self.current_state.is_completed(),
                "event {} appended after the game ended",
                kind.name()
            );
            let event = self.log.append(
                self.id,
                self.current_state.turn,
                self.current_state.phase,
                clock.now(),
                kind,
            );
            self.current_state.apply(event);
            assert_eq!(self.current_state.last_sequence, self.log.len() as u64);
        }
        count
    }
}

/// A session driven one call at a time
pub struct InteractiveSession {
    session: GameSession,
    rng: DiceRng,
    clock: Box<dyn Clock>,
    player_ai: Box<dyn BattleAI>,
    opponent_ai: Box<dyn BattleAI>,
}

impl InteractiveSession {
    pub(crate) fn new(
        session: GameSession,
        rng: DiceRng,
        clock: Box<dyn Clock>,
        player_ai: Box<dyn BattleAI>,
        opponent_ai: Box<dyn BattleAI>,
    ) -> Self {
        Self {
            session,
            rng,
            clock,
            player_ai,
            opponent_ai,
        }
    }

    pub fn get_state(&self) -> &GameState {
        self.session.state()
    }

    pub fn get_session(&self) -> &GameSession {
        &self.session
    }

    pub fn into_session(self) -> GameSession {
        self.session
    }

    /// Legal moves or targets for a unit in the current phase
    pub fn get_available_actions(&self, unit_id: &UnitId) -> AvailableActions {
        available_actions(self.session.state(), unit_id)
    }

    /// Move a unit using the cheapest movement type that reaches `destination`
    pub fn apply_movement(&mut self, unit_id: &UnitId, destination: HexCoordinate) -> Result<&[GameEvent]> {
        let events = resolve_movement(self.session.state(), unit_id, destination, None)?;
        Ok(self.commit(events))
    }

    /// Move a unit with a specific movement type
    pub fn apply_movement_with(
        &mut self,
        unit_id: &UnitId,
        destination: HexCoordinate,
        movement_type: MovementType,
    ) -> Result<&[GameEvent]> {
        let events = resolve_movement(self.session.state(), unit_id, destination, Some(movement_type))?;
        Ok(self.commit(events))
    }

    pub fn apply_attack(
        &mut self,
        unit_id: &UnitId,
        target_id: &UnitId,
        weapon_ids: &[String],
    ) -> Result<&[GameEvent]> {
        let events = resolve_attack(self.session.state(), &mut self.rng, unit_id, target_id, weapon_ids)?;
        Ok(self.commit(events))
    }

    pub fn advance_phase(&mut self) -> Result<&[GameEvent]> {
        let events = resolve_phase_advance(self.session.state(), &mut self.rng)?;
        Ok(self.commit(events))
    }

    /// Let the side's AI act for every unit that still can this phase.
    ///
    /// Returns the number of events appended. Outside the Movement and
    /// WeaponAttack phases there is nothing to decide.
    pub fn run_ai_turn(&mut self, side: Side) -> Result<usize> {
        if self.is_game_over() {
            return Err(TacticsError::invalid_action("game is already over"));
        }
        let phase = self.session.state().phase;
        if !phase.is_action_phase() {
            return Ok(0);
        }

        let pending: Vec<UnitId> = self
            .session
            .state()
            .living_units(side)
            .filter(|u| u.is_operable() && !u.lock_state.has_committed())
            .map(|u| u.id.clone())
            .collect();

        let before = self.session.events().len();
        for unit_id in pending {
            if self.is_game_over() {
                break;
            }
            self.run_ai_unit(side, phase, &unit_id);
        }
        Ok(self.session.events().len() - before)
    }

    fn run_ai_unit(&mut self, side: Side, phase: GamePhase, unit_id: &UnitId) {
        let actions = self.get_available_actions(unit_id);
        if actions.is_empty() {
            return;
        }
        let state = self.session.state();
        let Some(unit) = state.unit(unit_id) else {
            return;
        };
        let context = DecisionContext::new(state, side);
        let ai = match side {
            Side::Player => &mut self.player_ai,
            Side::Opponent => &mut self.opponent_ai,
        };
        let decision = match phase {
            GamePhase::Movement => ai.decide_movement(&context, unit, &actions),
            _ => ai.decide_attack(&context, unit, &actions),
        };
        let ai_name = ai.name().to_string();

        let outcome = match (&decision, phase) {
            (Decision::Pass, _) => Ok(()),
            (Decision::Move { destination }, GamePhase::Movement) => {
                self.apply_movement(unit_id, *destination).map(|_| ())
            }
            (
                Decision::Attack {
                    target_id,
                    weapon_ids,
                },
                GamePhase::WeaponAttack,
            ) => self.apply_attack(unit_id, target_id, weapon_ids).map(|_| ()),
            _ => Err(TacticsError::invalid_action(format!(
                "{:?} is not allowed during the {} phase",
                decision, phase
            ))),
        };
        if let Err(err) = outcome {
            tracing::warn!("AI '{}' decision for {} rejected, passing: {}", ai_name, unit_id, err);
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.session.is_completed()
    }

    /// `None` until the game has ended
    pub fn get_result(&self) -> Option<GameOutcome> {
        self.session.outcome()
    }

    /// End the game with `result` unless it has already ended
    pub(crate) fn conclude(&mut self, result: GameResult) {
        if self.is_game_over() {
            return;
        }
        self.record_end(result);
    }

    /// Record events, then end the game if they finished it
    fn commit(&mut self, events: Vec<GameEventKind>) -> &[GameEvent] {
        let start = self.session.events().len();
        self.session.record(self.clock.as_ref(), events);
        self.finish_if_over();
        &self.session.events()[start..]
    }

    pub(crate) fn finish_if_over(&mut self) {
        if self.is_game_over() {
            return;
        }
        if let Some(result) = determine_winner(self.session.state(), self.session.config()) {
            self.record_end(result);
        }
    }

    fn record_end(&mut self, result: GameResult) {
        let state = self.session.state();
        tracing::info!(
            "Game {} over on turn {}: {} ({:?})",
            self.session.id(),
            state.turn,
            result.winner,
            result.reason
        );
        self.session.record(
            self.clock.as_ref(),
            vec![GameEventKind::GameEnded {
                winner: result.winner,
                reason: result.reason,
            }],
        );
    }
}
