// mnp entry point.
//
// Startup sequence:
// 1. Parse arguments and initialize tracing (stderr, so stdout stays JSON)
// 2. Load config
// 3. Open the league database, or load a JSON snapshot
// 4. Run one analysis or listing and print the result

mod cli;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use mnp_core::analysis::{matchup, player, recommend, scout};
use mnp_core::config::{self, Config};
use mnp_core::db::SqliteStore;
use mnp_core::memory::MemoryStore;
use mnp_core::model::LeagueData;
use mnp_core::Store;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing
    init_tracing(cli.log_level.as_deref())?;

    // 2. Load config
    let config = match &cli.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => config::load_config().context("failed to load configuration")?,
    };
    debug!("Analysis config: {:?}", config.analysis);

    // 3. Open the store
    let store = open_store(&cli, &config)?;

    // 4. Run the command
    let analysis = &config.analysis;
    match cli.command {
        Command::Scout { team, venue } => {
            emit(&scout::analyze(store.as_ref(), analysis, &team, venue.as_deref())?)
        }
        Command::Matchup {
            venue,
            team1,
            team2,
        } => emit(&matchup::analyze(
            store.as_ref(),
            analysis,
            &venue,
            &team1,
            &team2,
        )?),
        Command::Recommend {
            team,
            machine,
            venue,
            opponent,
        } => {
            let mode = cli::recommend_mode(venue, opponent);
            emit(&recommend::analyze(
                store.as_ref(),
                analysis,
                &team,
                &machine,
                mode,
            )?)
        }
        Command::Player { name, venue } => {
            emit(&player::analyze(store.as_ref(), analysis, &name, venue.as_deref())?)
        }
        Command::Teams { search } => emit(&store.list_teams(search.as_deref())?),
        Command::Venues { search } => emit(&store.list_venues(search.as_deref())?),
        Command::Machines { search } => emit(&store.list_machines(search.as_deref())?),
        Command::Players { search } => emit(&store.list_players(search.as_deref())?),
    }
}

fn open_store(cli: &Cli, config: &Config) -> anyhow::Result<Box<dyn Store>> {
    if let Some(path) = &cli.snapshot {
        let league = load_snapshot(path)?;
        info!(
            "Loaded snapshot {}: {} scores",
            path.display(),
            league.scores.len()
        );
        return Ok(Box::new(MemoryStore::new(league)));
    }

    let db_path = cli.db.as_deref().unwrap_or(&config.database.path);
    let store = SqliteStore::open(db_path)
        .with_context(|| format!("failed to open database at {db_path}"))?;
    info!("Database opened at {db_path}");
    Ok(Box::new(store))
}

fn load_snapshot(path: &Path) -> anyhow::Result<LeagueData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))
}

fn emit<T: Serialize>(report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}

/// Log to stderr. `--log-level` wins over `RUST_LOG`, which wins over the
/// default of info for this binary and the core library.
fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = match level {
        Some(level) => EnvFilter::new(format!("mnp={level},mnp_core={level},warn")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mnp=info,mnp_core=info,warn")),
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
