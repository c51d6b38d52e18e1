// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mnp_core::analysis::recommend::RecommendMode;

/// Pinball league scouting and lineup analysis.
///
/// Every command prints its report as JSON on stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "mnp", version)]
#[command(after_help = "\
Examples:
  mnp teams trash                       Find a team key by name
  mnp scout TTT                         A team's machines, strongest first
  mnp scout TTT --venue STN             Only the machines at STN
  mnp matchup STN TTT KNR               TTT vs KNR on STN's machines
  mnp recommend TTT TAF --opponent KNR  Who should play TAF against KNR
  mnp player \"Alice\" --venue STN        One player's record at STN")]
pub struct Cli {
    /// Config file (default: platform config dir, e.g. ~/.config/mnp/mnp.toml)
    #[arg(long, global = true, env = "MNP_CONFIG")]
    pub config: Option<PathBuf>,

    /// League database (overrides [database].path)
    #[arg(long, global = true, env = "MNP_DB")]
    pub db: Option<String>,

    /// Read a JSON league snapshot instead of the database
    #[arg(long, global = true, conflicts_with = "db")]
    pub snapshot: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// A team's performance on every machine it has played
    Scout {
        /// Team key (e.g. TTT)
        team: String,

        /// Restrict to the machines at this venue
        #[arg(long)]
        venue: Option<String>,
    },

    /// Two teams head-to-head on a venue's machines
    Matchup {
        /// Venue key
        venue: String,
        /// First team key; positive edges favor this team
        team1: String,
        /// Second team key
        team2: String,
    },

    /// Which players should play a machine
    Recommend {
        /// Team key
        team: String,

        /// Machine key (e.g. TAF)
        machine: String,

        /// Only count games at this venue
        #[arg(long)]
        venue: Option<String>,

        /// Compare against this team's players
        #[arg(long)]
        opponent: Option<String>,
    },

    /// One player's performance on every machine they have played
    Player {
        /// Player name, exactly as recorded
        name: String,

        /// Restrict to the machines at this venue
        #[arg(long)]
        venue: Option<String>,
    },

    /// List current-season teams
    Teams {
        /// Search term (matches key or name)
        search: Option<String>,
    },

    /// List venues
    Venues {
        /// Search term (matches key or name)
        search: Option<String>,
    },

    /// List machines that have been played
    Machines {
        /// Search term (matches key or name)
        search: Option<String>,
    },

    /// List current-season players
    Players {
        /// Search term (matches player name, team key, or team name)
        search: Option<String>,
    },
}

/// Map `--venue` / `--opponent` onto a recommend mode. An opponent takes
/// precedence; the venue then narrows both sides.
pub fn recommend_mode(venue: Option<String>, opponent: Option<String>) -> RecommendMode {
    match (opponent, venue) {
        (Some(opponent), venue) => RecommendMode::VsOpponent { opponent, venue },
        (None, Some(venue)) => RecommendMode::AtVenue { venue },
        (None, None) => RecommendMode::Basic,
    }
}
