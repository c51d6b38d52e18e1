// The four comparative analyses, plus the enrichment and summary helpers
// they share.
//
// Every entry point takes a `Store`, the analysis config, and plain keys, and
// returns a serializable report. None of them cache or mutate anything.

pub mod matchup;
pub mod player;
pub mod recommend;
pub mod scout;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::cohort::TeamCohort;
use crate::compare::relative_strength;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::model::Score;
use crate::stats::LikelyPlayer;
use crate::store::{MachineStats, Store};

/// Display name for a machine, or its key when the name is unknown.
pub fn machine_name(names: &HashMap<String, String>, key: &str) -> String {
    names.get(key).cloned().unwrap_or_else(|| key.to_string())
}

/// A resolved team as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub key: String,
    pub name: String,
    pub season: u32,
}

impl From<&TeamCohort> for TeamRef {
    fn from(team: &TeamCohort) -> Self {
        TeamRef {
            key: team.team_key.clone(),
            name: team.team_name.clone(),
            season: team.season,
        }
    }
}

/// Resolve a team key or fail with `TeamNotFound`.
pub(crate) fn require_team<S: Store + ?Sized>(
    store: &S,
    team_key: &str,
) -> Result<TeamCohort, AnalysisError> {
    store
        .team_cohort(team_key)?
        .ok_or_else(|| AnalysisError::TeamNotFound(team_key.to_string()))
}

// ---------------------------------------------------------------------------
// Per-machine rows
// ---------------------------------------------------------------------------

/// One machine's stats measured against the league.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineReport {
    pub machine_key: String,
    pub machine_name: String,
    pub games: usize,
    pub p50: Score,
    pub p90: Score,
    /// League-wide P50 on this machine. Absent when nobody on a current
    /// roster has played it.
    pub league_p50: Option<Score>,
    /// Percent above (or below) the league P50. Zero when there is no baseline.
    pub relative_strength: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub likely_players: Vec<LikelyPlayer>,
    /// Set on global rows in venue mode when there are no games at the venue.
    pub no_venue_data: bool,
}

/// Attach machine names and the league baseline to raw machine stats.
pub(crate) fn enrich(
    stats: Vec<MachineStats>,
    baseline: &HashMap<String, Score>,
    names: &HashMap<String, String>,
) -> Vec<MachineReport> {
    stats
        .into_iter()
        .map(|s| {
            let league_p50 = baseline.get(&s.machine_key).copied();
            MachineReport {
                machine_name: machine_name(names, &s.machine_key),
                games: s.stat.games,
                p50: s.stat.p50,
                p90: s.stat.p90,
                league_p50,
                relative_strength: relative_strength(
                    s.stat.p50 as f64,
                    league_p50.unwrap_or(0) as f64,
                ),
                likely_players: s.likely_players,
                no_venue_data: false,
                machine_key: s.machine_key,
            }
        })
        .collect()
}

/// Keep only the stats for machines at a venue.
pub(crate) fn restrict_to(stats: Vec<MachineStats>, machines: &BTreeSet<String>) -> Vec<MachineStats> {
    stats
        .into_iter()
        .filter(|s| machines.contains(&s.machine_key))
        .collect()
}

/// Flag global rows whose machine has no venue-scoped entry.
pub(crate) fn mark_no_venue_data(global: &mut [MachineReport], venue: &[MachineReport]) {
    let at_venue: BTreeSet<&str> = venue.iter().map(|r| r.machine_key.as_str()).collect();
    for row in global.iter_mut() {
        row.no_venue_data = !at_venue.contains(row.machine_key.as_str());
    }
}

// ---------------------------------------------------------------------------
// Strongest / weakest
// ---------------------------------------------------------------------------

/// Machine names ranked by relative strength.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrengthSummary {
    pub strongest: Vec<String>,
    /// Weakest first. Only filled when more machines qualify than fit in
    /// `strongest`, and may overlap it.
    pub weakest: Vec<String>,
}

/// Rank machines with at least `min_games` games by relative strength.
pub(crate) fn summarize(rows: &[MachineReport], config: &AnalysisConfig) -> StrengthSummary {
    let mut ranked: Vec<&MachineReport> = rows
        .iter()
        .filter(|r| r.games >= config.min_games)
        .collect();
    ranked.sort_by(|a, b| {
        b.relative_strength
            .partial_cmp(&a.relative_strength)
            .unwrap_or(Ordering::Equal)
    });

    let n = config.summary_size;
    let strongest = ranked
        .iter()
        .take(n)
        .map(|r| r.machine_name.clone())
        .collect();
    let weakest = if ranked.len() > n {
        ranked
            .iter()
            .rev()
            .take(n)
            .map(|r| r.machine_name.clone())
            .collect()
    } else {
        Vec::new()
    };

    StrengthSummary { strongest, weakest }
}
