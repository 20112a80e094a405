//! Headless Battle Runner
//!
//! Runs AI vs AI games and prints the outcome as JSON or text.

use std::path::PathBuf;

use clap::Parser;
use mech_tactics::battle::{load_personality, AiPersonality, GameEngine, GameOutcome, Roster};
use mech_tactics::core::{GameConfig, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless Battle Runner - AI vs AI games
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run AI vs AI mech battles and report the outcome")]
struct Args {
    /// Game config TOML (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Map radius in hexes
    #[arg(long)]
    map_radius: Option<u32>,

    /// Turn limit (0 = unlimited)
    #[arg(long)]
    turn_limit: Option<u32>,

    /// Player unit ids from the compendium (repeatable)
    #[arg(long = "player", default_values_t = vec!["hunchback-hbk-4g".to_string()])]
    player: Vec<String>,

    /// Opponent unit ids from the compendium (repeatable)
    #[arg(long = "opponent", default_values_t = vec!["griffin-grf-1n".to_string()])]
    opponent: Vec<String>,

    /// Player AI personality name (loaded from data/ai_personalities/)
    #[arg(long, default_value = "default")]
    player_ai: String,

    /// Opponent AI personality name (loaded from data/ai_personalities/)
    #[arg(long, default_value = "default")]
    opponent_ai: String,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Include the full event log (single game only)
    #[arg(long)]
    events: bool,

    /// Number of games to run; seeds count up from --seed
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct GameReport {
    seed: u64,
    session_id: String,
    events: usize,
    outcome: Option<GameOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<serde_json::Value>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "mech_tactics=debug"
    } else {
        "mech_tactics=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(radius) = args.map_radius {
        config = config.with_map_radius(radius);
    }
    if let Some(limit) = args.turn_limit {
        config = config.with_turn_limit(limit);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    let base_seed = config.resolve_seed();

    let player_personality = personality(&args.player_ai);
    let opponent_personality = personality(&args.opponent_ai);
    let player = Roster::from_ids(args.player.iter().cloned());
    let opponent = Roster::from_ids(args.opponent.iter().cloned());

    let games = args.games.max(1);
    let reports: Vec<Result<GameReport>> = (0..games)
        .into_par_iter()
        .map(|game| -> Result<GameReport> {
            let seed = base_seed.wrapping_add(game as u64);
            let engine = GameEngine::new(config.clone().with_seed(seed))?
                .with_personalities(player_personality.clone(), opponent_personality.clone());
            let session = engine.run_to_completion(&player, &opponent)?;
            let log = if args.events && games == 1 {
                Some(serde_json::to_value(session.events())?)
            } else {
                None
            };
            Ok(GameReport {
                seed,
                session_id: session.id().to_string(),
                events: session.events().len(),
                outcome: session.outcome(),
                log,
            })
        })
        .collect();
    let reports = reports.into_iter().collect::<Result<Vec<_>>>()?;

    if args.format == "text" {
        for report in &reports {
            print_text(report);
        }
    } else if reports.len() == 1 {
        println!("{}", serde_json::to_string_pretty(&reports[0])?);
    } else {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn personality(name: &str) -> AiPersonality {
    load_personality(name).unwrap_or_else(|e| {
        tracing::warn!("Failed to load personality '{}': {}; using default", name, e);
        AiPersonality::default()
    })
}

fn print_text(report: &GameReport) {
    println!("=== Game {} (seed {}) ===", report.session_id, report.seed);
    match &report.outcome {
        Some(outcome) => {
            println!("{}", outcome.description);
            println!(
                "Player: {} surviving, {} destroyed",
                outcome.player.surviving, outcome.player.destroyed
            );
            println!(
                "Opponent: {} surviving, {} destroyed",
                outcome.opponent.surviving, outcome.opponent.destroyed
            );
            println!("Turns: {}, events: {}", outcome.turns_played, report.events);
        }
        None => println!("Game did not finish ({} events)", report.events),
    }
    if let Some(log) = &report.log {
        println!("{}", log);
    }
}
