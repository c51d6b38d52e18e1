// Matchup: two teams head-to-head on the machines at a venue.
//
// Each side is represented by its likely players on a machine; the edge
// compares the mean P50 of those players.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{machine_name, require_team, TeamRef};
use crate::cohort::Cohort;
use crate::compare::{confidence, edge_percent, likely_score, Confidence, Edge, Side};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::model::Score;
use crate::stats::LikelyPlayer;
use crate::store::{MachineQuery, MachineStats, Store};

/// One team's numbers on one machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideStats {
    pub games: usize,
    pub p50: Score,
    /// Mean P50 of the likely players.
    pub likely_score: Option<f64>,
    pub likely_players: Vec<LikelyPlayer>,
}

impl From<MachineStats> for SideStats {
    fn from(stats: MachineStats) -> Self {
        SideStats {
            games: stats.stat.games,
            p50: stats.stat.p50,
            likely_score: likely_score(&stats.likely_players),
            likely_players: stats.likely_players,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineMatchup {
    pub machine_key: String,
    pub machine_name: String,
    /// `None` when the team has never played the machine.
    pub team1: Option<SideStats>,
    pub team2: Option<SideStats>,
    /// Positive favors team 1.
    pub edge: Edge,
    pub confidence: Confidence,
}

/// Machine names grouped by which team holds the edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchupSummary {
    pub team1_advantages: Vec<String>,
    pub team2_advantages: Vec<String>,
    pub contested: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupReport {
    pub venue: String,
    pub team1: TeamRef,
    pub team2: TeamRef,
    /// Team 1's biggest edge first.
    pub machines: Vec<MachineMatchup>,
    pub summary: MatchupSummary,
}

/// Compare `team1_key` against `team2_key` on `venue_key`'s machines.
pub fn analyze<S: Store + ?Sized>(
    store: &S,
    config: &AnalysisConfig,
    venue_key: &str,
    team1_key: &str,
    team2_key: &str,
) -> Result<MatchupReport, AnalysisError> {
    let team1 = require_team(store, team1_key)?;
    let team2 = require_team(store, team2_key)?;
    info!("Matchup {} vs {} at {}", team1.team_key, team2.team_key, venue_key);

    let machines = store.venue_machines(venue_key)?;
    let names = store.machine_names()?;

    let stats_for = |cohort: &Cohort| {
        store.machine_stats(&MachineQuery {
            cohort,
            venue: None,
            likely_players: config.likely_players,
        })
    };
    let stats1 = by_machine(stats_for(&Cohort::roster(&team1))?, &machines);
    let stats2 = by_machine(stats_for(&Cohort::roster(&team2))?, &machines);

    let mut rows = compare_machines(stats1, stats2, &names, config);
    rows.sort_by(|a, b| Edge::descending(&a.edge, &b.edge));
    for row in &rows {
        debug!(
            "{}: edge {:?}, {} confidence",
            row.machine_key,
            row.edge,
            row.confidence.label()
        );
    }
    let summary = partition(&rows);

    Ok(MatchupReport {
        venue: venue_key.to_string(),
        team1: TeamRef::from(&team1),
        team2: TeamRef::from(&team2),
        machines: rows,
        summary,
    })
}

/// Index machine stats by key, keeping only machines at the venue.
fn by_machine(stats: Vec<MachineStats>, machines: &BTreeSet<String>) -> HashMap<String, MachineStats> {
    stats
        .into_iter()
        .filter(|s| machines.contains(&s.machine_key))
        .map(|s| (s.machine_key.clone(), s))
        .collect()
}

/// Build a comparison for every machine at least one side has played, in
/// machine-key order.
fn compare_machines(
    mut stats1: HashMap<String, MachineStats>,
    mut stats2: HashMap<String, MachineStats>,
    names: &HashMap<String, String>,
    config: &AnalysisConfig,
) -> Vec<MachineMatchup> {
    let keys: BTreeSet<String> = stats1.keys().chain(stats2.keys()).cloned().collect();
    keys.into_iter()
        .map(|key| {
            let side1 = stats1.remove(&key).map(SideStats::from);
            let side2 = stats2.remove(&key).map(SideStats::from);

            let likely1 = side1.as_ref().map_or(&[][..], |s| &s.likely_players[..]);
            let likely2 = side2.as_ref().map_or(&[][..], |s| &s.likely_players[..]);
            let score1 = likely_score(likely1).unwrap_or(0.0);
            let score2 = likely_score(likely2).unwrap_or(0.0);

            MachineMatchup {
                machine_name: machine_name(names, &key),
                machine_key: key,
                edge: edge_percent(score1, score2),
                confidence: confidence(likely1, likely2, &config.confidence),
                team1: side1,
                team2: side2,
            }
        })
        .collect()
}

fn partition(rows: &[MachineMatchup]) -> MatchupSummary {
    let mut summary = MatchupSummary::default();
    for row in rows {
        let name = row.machine_name.clone();
        match row.edge.favors() {
            Some(Side::First) => summary.team1_advantages.push(name),
            Some(Side::Second) => summary.team2_advantages.push(name),
            None => summary.contested.push(name),
        }
    }
    summary
}
