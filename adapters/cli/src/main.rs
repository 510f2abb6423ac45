#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Merge Defence session.

mod autoplay;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use merge_defence_config::GameConfig;
use merge_defence_core::SessionSummary;
use merge_defence_system_simulation::Simulation;
use merge_defence_world::query;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::autoplay::Autoplay;

/// Runs a Merge Defence session driven by the built-in autoplay policy.
#[derive(Debug, Parser)]
#[command(name = "merge-defence", version, about)]
struct Cli {
    /// TOML configuration replacing the built-in tables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Multiplier applied to every frame.
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,
    /// Upper bound on simulated frames.
    #[arg(long, default_value_t = 200_000)]
    max_ticks: u64,
    /// Waits out every preparation delay instead of skipping it.
    #[arg(long)]
    no_skip: bool,
    /// Raises the default log level to debug.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Merge Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => GameConfig::builtin().context("loading built-in configuration")?,
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut simulation = Simulation::new(config).context("building simulation")?;
    simulation
        .set_time_scale(cli.time_scale)
        .context("applying time scale")?;
    println!("{}", query::welcome_banner(simulation.world()));

    let summary = run(&mut simulation, &cli);
    print_summary(&summary);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(simulation: &mut Simulation, cli: &Cli) -> SessionSummary {
    let policy = Autoplay::new(!cli.no_skip);
    let frame = Duration::from_millis(cli.tick_ms);
    let mut actions = Vec::new();
    let mut events = Vec::new();

    for _ in 0..cli.max_ticks {
        policy.plan(simulation.world(), &mut actions);
        for action in actions.drain(..) {
            if let Err(reason) = simulation.perform(action, &mut events) {
                debug!(?action, %reason, "autoplay action rejected");
            }
        }

        simulation.tick(frame, &mut events);
        events.clear();
        if simulation.is_finished() {
            break;
        }
    }

    let summary = simulation.summary();
    info!(
        outcome = ?summary.outcome,
        wave = summary.wave,
        score = summary.score,
        "autoplay stopped"
    );
    summary
}

fn print_summary(summary: &SessionSummary) {
    let outcome = summary
        .outcome
        .map_or_else(|| "unfinished".to_owned(), |outcome| format!("{outcome:?}"));
    let grade = summary
        .highest_grade
        .map_or_else(|| "none".to_owned(), |grade| format!("{grade:?}"));
    println!("outcome:       {outcome}");
    println!("wave:          {}/{}", summary.wave, summary.total_waves);
    println!("kills:         {}", summary.kills);
    println!("merges:        {}", summary.merges);
    println!("score:         {}", summary.score);
    println!("gold:          {}", summary.gold);
    println!("lives:         {}", summary.lives);
    println!("highest grade: {grade}");
}
