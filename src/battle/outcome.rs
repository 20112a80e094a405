//! Game-over detection and outcome reporting
//!
//! `is_game_over` and `determine_winner` are pure functions of state and
//! config. `calculate_game_outcome` layers reporting data on top.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::state::GameState;
use crate::core::config::GameConfig;
use crate::core::types::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player,
    Opponent,
    Draw,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Player => Winner::Player,
            Side::Opponent => Winner::Opponent,
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Player => f.write_str("player"),
            Winner::Opponent => f.write_str("opponent"),
            Winner::Draw => f.write_str("draw"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Elimination,
    MutualDestruction,
    TurnLimitDecision,
    TurnLimitDraw,
}

/// Terminal classification of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Winner,
    pub reason: EndReason,
}

/// Has either side been wiped out, or the turn limit been reached?
pub fn is_game_over(state: &GameState, config: &GameConfig) -> bool {
    let eliminated = Side::all().iter().any(|side| state.survivors(*side) == 0);
    eliminated || (config.has_turn_limit() && state.turn >= config.turn_limit)
}

/// Winner of a finished game, `None` while it is still running
pub fn determine_winner(state: &GameState, config: &GameConfig) -> Option<GameResult> {
    if !is_game_over(state, config) {
        return None;
    }
    if let Some(result) = elimination_result(state) {
        return Some(result);
    }
    Some(decide_by_survivors(state))
}

fn elimination_result(state: &GameState) -> Option<GameResult> {
    let player_alive = state.survivors(Side::Player) > 0;
    let opponent_alive = state.survivors(Side::Opponent) > 0;
    match (player_alive, opponent_alive) {
        (false, false) => Some(GameResult {
            winner: Winner::Draw,
            reason: EndReason::MutualDestruction,
        }),
        (true, false) => Some(GameResult {
            winner: Winner::Player,
            reason: EndReason::Elimination,
        }),
        (false, true) => Some(GameResult {
            winner: Winner::Opponent,
            reason: EndReason::Elimination,
        }),
        (true, true) => None,
    }
}

/// Turn-limit rule: more survivors wins, equal counts draw
pub fn decide_by_survivors(state: &GameState) -> GameResult {
    if let Some(result) = elimination_result(state) {
        return result;
    }
    let player = state.survivors(Side::Player);
    let opponent = state.survivors(Side::Opponent);
    if player > opponent {
        GameResult {
            winner: Winner::Player,
            reason: EndReason::TurnLimitDecision,
        }
    } else if opponent > player {
        GameResult {
            winner: Winner::Opponent,
            reason: EndReason::TurnLimitDecision,
        }
    } else {
        GameResult {
            winner: Winner::Draw,
            reason: EndReason::TurnLimitDraw,
        }
    }
}

/// Per-side tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideSummary {
    pub destroyed: usize,
    pub surviving: usize,
}

impl SideSummary {
    fn of(state: &GameState, side: Side) -> Self {
        Self {
            destroyed: state.destroyed_count(side),
            surviving: state.survivors(side),
        }
    }
}

/// Reporting summary of a completed game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Winner,
    pub reason: EndReason,
    pub description: String,
    pub player: SideSummary,
    pub opponent: SideSummary,
    pub turns_played: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: i64,
}

/// Summarize a completed game. `None` until a result has been recorded.
pub fn calculate_game_outcome(state: &GameState) -> Option<GameOutcome> {
    let result = state.result?;
    let player = SideSummary::of(state, Side::Player);
    let opponent = SideSummary::of(state, Side::Opponent);
    let duration_ms = match (state.started_at, state.ended_at) {
        (Some(start), Some(end)) => (end - start).num_milliseconds().max(0),
        _ => 0,
    };

    Some(GameOutcome {
        winner: result.winner,
        reason: result.reason,
        description: describe(result, state.turn, player, opponent),
        player,
        opponent,
        turns_played: state.turn,
        started_at: state.started_at,
        ended_at: state.ended_at,
        duration_ms,
    })
}

fn describe(result: GameResult, turn: u32, player: SideSummary, opponent: SideSummary) -> String {
    match result.reason {
        EndReason::Elimination => format!(
            "{} wins by elimination on turn {}",
            capitalize(result.winner),
            turn
        ),
        EndReason::MutualDestruction => {
            format!("Both sides destroyed on turn {}; the game is a draw", turn)
        }
        EndReason::TurnLimitDecision => format!(
            "{} wins on survivors at the turn limit ({} to {})",
            capitalize(result.winner),
            player.surviving.max(opponent.surviving),
            player.surviving.min(opponent.surviving)
        ),
        EndReason::TurnLimitDraw => format!(
            "Turn limit reached with {} survivors each; the game is a draw",
            player.surviving
        ),
    }
}

fn capitalize(winner: Winner) -> &'static str {
    match winner {
        Winner::Player => "Player",
        Winner::Opponent => "Opponent",
        Winner::Draw => "Nobody",
    }
}
