//! Replay cursor over a recorded log
//!
//! Any position in the log can be materialized by folding the prefix up to
//! it. Stepping forward applies one event at a time.

use crate::battle::events::{EventLog, GameEvent, GameEventKind};
use crate::battle::state::{derive_state, GameState};
use crate::core::error::{Result, TacticsError};

pub struct Replay {
    events: Vec<GameEvent>,
    /// Number of events folded into `state`
    position: usize,
    state: GameState,
}

impl Replay {
    pub fn new(events: Vec<GameEvent>) -> Result<Self> {
        let log = EventLog::from_events(events)?;
        Ok(Self {
            events: log.into_events(),
            position: 0,
            state: GameState::initial(),
        })
    }

    pub fn from_log(log: &EventLog) -> Self {
        Self {
            events: log.events().to_vec(),
            position: 0,
            state: GameState::initial(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sequence of the last applied event (0 before the first)
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.events.len()
    }

    /// Apply the next event, returning it
    pub fn step(&mut self) -> Option<&GameEvent> {
        let event = self.events.get(self.position)?;
        self.state.apply(event);
        self.position += 1;
        Some(event)
    }

    /// State right after the event with `sequence` (0 = before any event)
    pub fn seek(&mut self, sequence: u64) -> Result<&GameState> {
        let target = usize::try_from(sequence)
            .ok()
            .filter(|target| *target <= self.events.len())
            .ok_or_else(|| {
                TacticsError::invalid_action(format!(
                    "sequence {} is beyond the end of the log ({} events)",
                    sequence,
                    self.events.len()
                ))
            })?;

        if target < self.position {
            self.state = derive_state(&self.events[..target]);
            self.position = target;
        }
        while self.position < target {
            self.step();
        }
        Ok(&self.state)
    }

    /// Sequence of each `TurnStarted` event, in order
    pub fn turn_boundaries(&self) -> Vec<(u32, u64)> {
        self.events
            .iter()
            .filter_map(|event| match event.kind {
                GameEventKind::TurnStarted { turn } => Some((turn, event.sequence)),
                _ => None,
            })
            .collect()
    }

    /// State at the start of `turn`
    pub fn seek_turn(&mut self, turn: u32) -> Result<&GameState> {
        let sequence = self
            .turn_boundaries()
            .into_iter()
            .find(|(t, _)| *t == turn)
            .map(|(_, sequence)| sequence)
            .ok_or_else(|| TacticsError::not_found("turn", turn.to_string()))?;
        self.seek(sequence)
    }
}
