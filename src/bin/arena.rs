//! Arena CLI — run predictor-vs-bot experiments from the command line.
//!
//! Usage:
//!   cargo run --release --bin arena -- --p1 predictor --p2 cycle --rounds 1000
//!   cargo run --release --bin arena -- --p2 frequency --matches 50 --json

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rps_predictor::engine::arena::run_arena;
use rps_predictor::engine::bot_profiles::{load_default_profiles, load_profiles, BotProfilesFile};
use rps_predictor::engine::bot_strategy::StrategyFactory;

#[derive(Parser)]
#[command(name = "arena", about = "Run Rock-Paper-Scissors bot-vs-bot matches")]
struct Cli {
    /// Player one: profile name or strategy type
    #[arg(long, default_value = "predictor")]
    p1: String,

    /// Player two: profile name or strategy type
    #[arg(long, default_value = "cycle")]
    p2: String,

    /// Rounds per match (default from the profile file, else 1000)
    #[arg(long)]
    rounds: Option<usize>,

    /// Number of independent matches (default from the profile file, else 10)
    #[arg(long)]
    matches: Option<usize>,

    /// Base seed; in match i player one gets seed + i, player two gets (seed + i) XOR a fixed mix
    #[arg(long)]
    seed: Option<u64>,

    /// Path to rps_profiles.toml (default: auto-discover)
    #[arg(long, env = "RPS_PROFILES")]
    profiles: Option<PathBuf>,

    /// Print the result as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

fn build_entrant(
    profiles: &BotProfilesFile,
    name: &str,
) -> Result<StrategyFactory, Box<dyn std::error::Error>> {
    let profile = profiles.resolve(name);
    if !profiles.profiles.contains_key(name) {
        tracing::warn!(name, "no profile with this name, treating it as a strategy type");
    }
    eprintln!(
        "  {}: type={}{}",
        name,
        profile.strategy_type,
        profile
            .description
            .as_deref()
            .map(|d| format!(" ({})", d))
            .unwrap_or_default(),
    );
    Ok(profile.build_factory(name)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path)?,
        None => load_default_profiles(),
    };

    let rounds = cli.rounds.unwrap_or(profiles.arena.rounds);
    let matches = cli.matches.unwrap_or(profiles.arena.matches);
    let seed = cli.seed.unwrap_or(profiles.arena.seed);

    eprintln!("Arena: {} matches x {} rounds, seed={}", matches, rounds, seed);

    // Mirror matches need distinct names.
    let (p1_name, p2_name) = if cli.p1 == cli.p2 {
        (format!("{}#1", cli.p1), format!("{}#2", cli.p2))
    } else {
        (cli.p1.clone(), cli.p2.clone())
    };

    let strategies: Vec<(String, StrategyFactory)> = vec![
        (p1_name, build_entrant(&profiles, &cli.p1)?),
        (p2_name, build_entrant(&profiles, &cli.p2)?),
    ];
    eprintln!();

    let progress_cb = |done: usize, total: usize| {
        eprint!("\r  [{}/{}] matches completed", done, total);
    };

    let result = run_arena(&strategies, matches, seed, rounds, Some(&progress_cb));

    eprintln!("\r                                        "); // clear progress line
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
    }
    Ok(())
}
