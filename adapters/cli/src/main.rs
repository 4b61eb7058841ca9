#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Blast Arena matches headlessly.

mod frame;

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use blast_arena_core::{AgentId, ArenaConfig, Event, RoundState};
use blast_arena_system_round::{HumanInput, Round};
use blast_arena_world::{query, Board, World};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Command-line arguments accepted by the Blast Arena binary.
#[derive(Debug, Parser)]
#[command(name = "blast-arena", about = "Headless Blast Arena simulation", version)]
struct Cli {
    /// Enables debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Plays one or more rounds with bot-controlled agents.
    Run(RunArgs),
    /// Prints the default arena configuration as TOML.
    Config,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Seed for arena generation.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of rounds to play; scores carry over between rounds.
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// TOML file overriding the default rules.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ASCII layout (`#` wall, `+` destructible, `.` floor) used instead of a
    /// generated arena.
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,

    /// Aborts a round that is still running after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Prints an ASCII frame after every tick.
    #[arg(long)]
    frames: bool,
}

/// Entry point for the Blast Arena command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(&args),
        Commands::Config => {
            let rendered = toml::to_string_pretty(&ArenaConfig::default())
                .context("failed to serialise the default configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let world = match args.layout.as_deref() {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read layout {}", path.display()))?;
            let board = Board::parse(&text)
                .with_context(|| format!("invalid layout {}", path.display()))?;
            World::with_layout(config, board, None).context("layout does not fit the rules")?
        }
        None => World::new(config, args.seed).context("invalid arena configuration")?,
    };

    let mut round = Round::new(world);
    for index in 0..args.rounds {
        if index > 0 {
            let _ = round.restart_round();
        }
        let winner = play_round(&mut round, args);
        let world = round.world();
        println!(
            "round {}: winner {}",
            query::round_index(world),
            winner.map_or_else(|| "none".to_owned(), |id| id.get().to_string())
        );
        for agent in query::agent_view(world).iter() {
            println!("  agent {} ({:?}): {}", agent.id.get(), agent.kind, agent.score);
        }
    }
    Ok(())
}

/// Steps the round until it ends or hits the tick limit, returning the winner.
fn play_round(round: &mut Round, args: &RunArgs) -> Option<AgentId> {
    let start = query::tick_index(round.world());
    let mut winner = None;
    while query::round_state(round.world()) != RoundState::RoundOver {
        let elapsed = query::tick_index(round.world()).saturating_sub(start);
        if args.max_ticks.is_some_and(|limit| elapsed >= limit) {
            warn!(ticks = elapsed, "round aborted at the tick limit");
            return None;
        }

        let events = round.step(HumanInput::default());
        for event in events {
            if let Event::RoundEnded { winner: ended } = event {
                winner = *ended;
            }
        }
        if args.frames {
            println!("{}", frame::render(round.world()));
        }
    }
    info!(
        ticks = query::tick_index(round.world()).saturating_sub(start),
        "round finished"
    );
    winner
}

fn load_config(path: Option<&Path>) -> Result<ArenaConfig> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ArenaConfig =
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}
