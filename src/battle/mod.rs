//! Battle system - turn-based hex combat driven by an event log
//!
//! Every state change is an event. Resolvers turn actions into events,
//! sessions append them, and `GameState` is whatever folding them yields.
//!
//! Turn structure:
//! - Initiative: each side rolls 2d6, ties re-roll
//! - Movement: every unit declares a destination, then all lock together
//! - WeaponAttack: every unit may fire once
//! - Heat: buildup, dissipation and shutdown checks
//! - End: turn counters reset

pub mod ai;
pub mod constants;
pub mod engine;
pub mod events;
pub mod hex;
pub mod movement;
pub mod outcome;
pub mod phase;
pub mod replay;
pub mod resolution;
pub mod session;
pub mod state;
pub mod validation;

// Re-exports for convenient access
pub use ai::{load_personality, AiCommander, AiPersonality, BattleAI, Decision, DecisionContext};
pub use constants::*;
pub use engine::{deployment_hexes, GameEngine, Roster, RosterEntry};
pub use events::{EventLog, GameEvent, GameEventKind};
pub use hex::{attack_arc, AttackArc, Facing, HexCoordinate};
pub use movement::{movement_options, resolve_movement, MoveOption};
pub use outcome::{
    calculate_game_outcome, determine_winner, is_game_over, EndReason, GameOutcome, GameResult,
    SideSummary, Winner,
};
pub use phase::GamePhase;
pub use replay::Replay;
pub use resolution::{resolve_attack, resolve_phase_advance, target_number};
pub use session::{GameSession, InteractiveSession};
pub use state::{derive_state, GameState, GameStatus};
pub use validation::{available_actions, AvailableActions, TargetOption};
