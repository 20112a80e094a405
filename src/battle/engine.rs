//! Game engine - builds sessions and plays them out
//!
//! The engine owns configuration and master data. Every session it creates
//! gets its own RNG, log and AIs; engines and sessions share nothing mutable.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::battle::ai::{AiCommander, AiPersonality, BattleAI};
use crate::battle::constants::UNLIMITED_TURN_CAP;
use crate::battle::events::GameEventKind;
use crate::battle::hex::{Facing, HexCoordinate};
use crate::battle::outcome::decide_by_survivors;
use crate::battle::session::{GameSession, InteractiveSession};
use crate::combat::adapter::{AdaptOptions, UnitAdapter};
use crate::combat::compendium::{Compendium, StaticCompendium};
use crate::combat::location::MechLocation;
use crate::combat::unit::{AdaptedUnit, PilotSkills};
use crate::core::clock::{Clock, FixedClock, SystemClock};
use crate::core::config::GameConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::rng::DiceRng;
use crate::core::types::{SessionId, Side, UnitId};

/// One unit in a side's starting lineup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Compendium unit id
    pub definition_id: String,
    /// `None` = `<side>-<n>`
    #[serde(default)]
    pub unit_id: Option<UnitId>,
    #[serde(default)]
    pub pilot: PilotSkills,
    /// `None` = next free deployment hex on the side's map edge
    #[serde(default)]
    pub position: Option<HexCoordinate>,
    #[serde(default)]
    pub facing: Option<Facing>,
    #[serde(default)]
    pub initial_damage: Vec<(MechLocation, u32)>,
}

impl RosterEntry {
    pub fn new(definition_id: impl Into<String>) -> Self {
        Self {
            definition_id: definition_id.into(),
            unit_id: None,
            pilot: PilotSkills::default(),
            position: None,
            facing: None,
            initial_damage: Vec::new(),
        }
    }

    pub fn with_unit_id(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.unit_id = Some(unit_id.into());
        self
    }

    pub fn with_pilot(mut self, pilot: PilotSkills) -> Self {
        self.pilot = pilot;
        self
    }

    pub fn with_position(mut self, position: HexCoordinate) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn with_initial_damage(mut self, location: MechLocation, damage: u32) -> Self {
        self.initial_damage.push((location, damage));
        self
    }
}

/// A side's starting lineup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    /// One default entry per compendium id
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(RosterEntry::new).collect())
    }

    pub fn push(&mut self, entry: RosterEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds sessions over a compendium
pub struct GameEngine<C: Compendium = StaticCompendium> {
    config: GameConfig,
    seed: u64,
    compendium: C,
    player_personality: AiPersonality,
    opponent_personality: AiPersonality,
    deterministic_clock: bool,
}

impl GameEngine<StaticCompendium> {
    /// Engine over the built-in compendium
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_compendium(config, StaticCompendium::builtin()?)
    }
}

impl<C: Compendium> GameEngine<C> {
    pub fn with_compendium(config: GameConfig, compendium: C) -> Result<Self> {
        config.validate()?;
        let seed = config.resolve_seed();
        let config = config.with_seed(seed);
        Ok(Self {
            config,
            seed,
            compendium,
            player_personality: AiPersonality::default(),
            opponent_personality: AiPersonality::default(),
            deterministic_clock: false,
        })
    }

    pub fn with_personalities(mut self, player: AiPersonality, opponent: AiPersonality) -> Self {
        self.player_personality = player;
        self.opponent_personality = opponent;
        self
    }

    /// Stamp events from a fixed clock so repeated runs produce identical logs
    pub fn with_deterministic_clock(mut self, deterministic: bool) -> Self {
        self.deterministic_clock = deterministic;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn compendium(&self) -> &C {
        &self.compendium
    }

    /// New session at turn 1, Initiative phase, driven by the default AIs
    pub fn create_interactive_session(
        &self,
        player: &Roster,
        opponent: &Roster,
    ) -> Result<InteractiveSession> {
        let player_ai = AiCommander::with_seed(self.player_personality.clone(), self.seed.wrapping_add(1));
        let opponent_ai =
            AiCommander::with_seed(self.opponent_personality.clone(), self.seed.wrapping_add(2));
        self.create_session_with_ai(player, opponent, Box::new(player_ai), Box::new(opponent_ai))
    }

    /// New session with caller-supplied AIs
    pub fn create_session_with_ai(
        &self,
        player: &Roster,
        opponent: &Roster,
        player_ai: Box<dyn BattleAI>,
        opponent_ai: Box<dyn BattleAI>,
    ) -> Result<InteractiveSession> {
        let units = self.deploy(player, opponent)?;

        let mut rng = DiceRng::new(self.seed);
        let session_id = SessionId::from_random_bytes(rng.random_bytes());
        let clock: Box<dyn Clock> = if self.deterministic_clock {
            Box::new(FixedClock::epoch())
        } else {
            Box::new(SystemClock)
        };

        tracing::info!(
            "Game {} created: seed {}, radius {}, turn limit {}, {} v {} units",
            session_id,
            self.seed,
            self.config.map_radius,
            self.config.turn_limit,
            player.len(),
            opponent.len()
        );

        let mut session = GameSession::new(session_id, self.config.clone());
        session.record(
            clock.as_ref(),
            vec![
                GameEventKind::GameCreated {
                    session_id,
                    seed: self.seed,
                    config: self.config.clone(),
                    units,
                },
                GameEventKind::GameStarted,
                GameEventKind::TurnStarted { turn: 1 },
            ],
        );

        let mut interactive = InteractiveSession::new(session, rng, clock, player_ai, opponent_ai);
        interactive.finish_if_over();
        Ok(interactive)
    }

    /// Play a game out with the AIs and return the finished session
    pub fn run_to_completion(&self, player: &Roster, opponent: &Roster) -> Result<GameSession> {
        let mut session = self.create_interactive_session(player, opponent)?;
        let cap = (!self.config.has_turn_limit()).then_some(UNLIMITED_TURN_CAP);

        while !session.is_game_over() {
            if let Some(cap) = cap {
                if session.get_state().turn >= cap {
                    let result = decide_by_survivors(session.get_state());
                    tracing::info!("Turn cap {} reached", cap);
                    session.conclude(result);
                    break;
                }
            }

            let state = session.get_state();
            if state.phase.is_action_phase() {
                // Initiative loser acts first
                let first = state
                    .initiative
                    .map(|winner| winner.opponent())
                    .unwrap_or(Side::Player);
                for side in [first, first.opponent()] {
                    if session.is_game_over() {
                        break;
                    }
                    session.run_ai_turn(side)?;
                }
                if session.is_game_over() {
                    break;
                }
            }
            session.advance_phase()?;
        }

        Ok(session.into_session())
    }

    /// Adapt both rosters and place them on the map
    fn deploy(&self, player: &Roster, opponent: &Roster) -> Result<Vec<AdaptedUnit>> {
        if player.is_empty() || opponent.is_empty() {
            return Err(TacticsError::InvalidConfig(
                "both sides need at least one unit".into(),
            ));
        }

        let radius = self.config.map_radius;
        let origin = HexCoordinate::origin();
        let mut occupied = BTreeSet::new();
        for entry in player.entries.iter().chain(&opponent.entries) {
            if let Some(position) = entry.position {
                if !origin.in_radius(radius, &position) {
                    return Err(TacticsError::InvalidConfig(format!(
                        "{} is outside the map (radius {})",
                        position, radius
                    )));
                }
                if !occupied.insert(position) {
                    return Err(TacticsError::InvalidConfig(format!(
                        "two units placed on {}",
                        position
                    )));
                }
            }
        }

        let adapter = UnitAdapter::new(&self.compendium);
        let mut ids = BTreeSet::new();
        let mut units = Vec::with_capacity(player.len() + opponent.len());
        for (side, roster) in [(Side::Player, player), (Side::Opponent, opponent)] {
            let mut slots = deployment_hexes(radius, side).into_iter();
            for (index, entry) in roster.entries.iter().enumerate() {
                let unit_id = entry
                    .unit_id
                    .clone()
                    .unwrap_or_else(|| UnitId::new(format!("{}-{}", side, index + 1)));
                if !ids.insert(unit_id.clone()) {
                    return Err(TacticsError::InvalidConfig(format!(
                        "duplicate unit id '{}'",
                        unit_id
                    )));
                }

                let position = match entry.position {
                    Some(position) => position,
                    None => {
                        let free = slots.by_ref().find(|hex| !occupied.contains(hex));
                        let hex = free.ok_or_else(|| {
                            TacticsError::InvalidConfig(format!(
                                "no room to deploy {} on a radius {} map",
                                unit_id, radius
                            ))
                        })?;
                        occupied.insert(hex);
                        hex
                    }
                };

                let mut options = AdaptOptions::new(unit_id, side, position).with_pilot(entry.pilot);
                if let Some(facing) = entry.facing {
                    options = options.with_facing(facing);
                }
                for (location, damage) in &entry.initial_damage {
                    options = options.with_initial_damage(*location, *damage);
                }
                units.push(adapter.adapt(&entry.definition_id, options)?);
            }
        }
        Ok(units)
    }
}

/// Deployment order for a side: the player fills the south edge from the
/// center outward, the opponent the mirrored north edge
pub fn deployment_hexes(radius: u32, side: Side) -> Vec<HexCoordinate> {
    let mut hexes = HexCoordinate::origin().hexes_in_range(radius);
    hexes.sort_by_key(|hex| (-hex.r, hex.q.abs(), hex.q));
    if side == Side::Opponent {
        for hex in &mut hexes {
            *hex = HexCoordinate::new(-hex.q, -hex.r);
        }
    }
    hexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::phase::GamePhase;
    use crate::battle::state::GameStatus;

    fn engine(seed: u64) -> GameEngine {
        GameEngine::new(GameConfig::default().with_seed(seed))
            .unwrap()
            .with_deterministic_clock(true)
    }

    #[test]
    fn test_deployment_starts_at_south_center() {
        let player = deployment_hexes(7, Side::Player);
        assert_eq!(player[0], HexCoordinate::new(0, 7));
        assert_eq!(player[1], HexCoordinate::new(-1, 7));
        let opponent = deployment_hexes(7, Side::Opponent);
        assert_eq!(opponent[0], HexCoordinate::new(0, -7));
        assert_eq!(opponent[1], HexCoordinate::new(1, -7));
    }

    #[test]
    fn test_new_session_starting_state() {
        let engine = engine(1);
        let session = engine
            .create_interactive_session(
                &Roster::from_ids(["hunchback-hbk-4g"]),
                &Roster::from_ids(["griffin-grf-1n"]),
            )
            .unwrap();
        let state = session.get_state();
        assert_eq!(state.phase, GamePhase::Initiative);
        assert_eq!(state.status, GameStatus::Active);
        assert_eq!(state.turn, 1);
        assert!(!session.is_game_over());
        assert!(session.get_result().is_none());
        assert_eq!(session.get_session().events().len(), 3);
        assert!(state.unit(&UnitId::from("player-1")).is_some());
        assert!(state.unit(&UnitId::from("opponent-1")).is_some());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let result = engine(1).create_interactive_session(&Roster::default(), &Roster::from_ids(["locust-lct-1v"]));
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let player = Roster::new(vec![RosterEntry::new("locust-lct-1v").with_unit_id("alpha")]);
        let opponent = Roster::new(vec![RosterEntry::new("locust-lct-1v").with_unit_id("alpha")]);
        let result = engine(1).create_interactive_session(&player, &opponent);
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_definition_is_not_found() {
        let result = engine(1).create_interactive_session(
            &Roster::from_ids(["timber-wolf"]),
            &Roster::from_ids(["locust-lct-1v"]),
        );
        assert!(matches!(result, Err(TacticsError::NotFound { .. })));
    }

    #[test]
    fn test_explicit_position_outside_map_rejected() {
        let player = Roster::new(vec![
            RosterEntry::new("locust-lct-1v").with_position(HexCoordinate::new(0, 20))
        ]);
        let result = engine(1).create_interactive_session(&player, &Roster::from_ids(["locust-lct-1v"]));
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_session_id_follows_seed() {
        let roster = Roster::from_ids(["locust-lct-1v"]);
        let a = engine(5).create_interactive_session(&roster, &roster).unwrap();
        let b = engine(5).create_interactive_session(&roster, &roster).unwrap();
        let c = engine(6).create_interactive_session(&roster, &roster).unwrap();
        assert_eq!(a.get_session().id(), b.get_session().id());
        assert_ne!(a.get_session().id(), c.get_session().id());
    }

    #[test]
    fn test_unlimited_game_terminates() {
        let engine = GameEngine::new(GameConfig::default().with_seed(3).with_turn_limit(0))
            .unwrap()
            .with_deterministic_clock(true);
        let session = engine
            .run_to_completion(
                &Roster::from_ids(["locust-lct-1v"]),
                &Roster::from_ids(["locust-lct-1v"]),
            )
            .unwrap();
        assert!(session.is_completed());
        assert!(session.state().turn <= UNLIMITED_TURN_CAP);
    }
}
