// Scout: one team's performance across machines, optionally narrowed to the
// machines at a venue.

use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{
    enrich, mark_no_venue_data, require_team, restrict_to, summarize, MachineReport,
    StrengthSummary, TeamRef,
};
use crate::cohort::Cohort;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::stats::Percentile;
use crate::store::{MachineQuery, Store};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoutReport {
    pub team: TeamRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Stats from matches played at the venue. Only present in venue mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_stats: Option<Vec<MachineReport>>,
    /// All-venue stats; restricted to the venue's machines in venue mode.
    pub global_stats: Vec<MachineReport>,
    pub summary: StrengthSummary,
}

/// Scout `team_key`, optionally at `venue`.
pub fn analyze<S: Store + ?Sized>(
    store: &S,
    config: &AnalysisConfig,
    team_key: &str,
    venue: Option<&str>,
) -> Result<ScoutReport, AnalysisError> {
    let team = require_team(store, team_key)?;
    info!(
        "Scouting {} (season {}, {} players){}",
        team.team_key,
        team.season,
        team.players.len(),
        venue.map(|v| format!(" at {v}")).unwrap_or_default()
    );

    let baseline = store.league_baseline(Percentile::P50)?;
    let names = store.machine_names()?;
    let cohort = Cohort::roster(&team);

    let global = store.machine_stats(&MachineQuery {
        cohort: &cohort,
        venue: None,
        likely_players: config.likely_players,
    })?;

    let (global_stats, venue_stats) = match venue {
        None => (enrich(global, &baseline, &names), None),
        Some(venue_key) => {
            let machines = store.venue_machines(venue_key)?;
            debug!("{venue_key} has {} machines", machines.len());

            let at_venue = store.machine_stats(&MachineQuery {
                cohort: &cohort,
                venue: Some(venue_key),
                likely_players: config.likely_players,
            })?;
            let venue_rows = enrich(restrict_to(at_venue, &machines), &baseline, &names);
            let mut global_rows = enrich(restrict_to(global, &machines), &baseline, &names);
            mark_no_venue_data(&mut global_rows, &venue_rows);
            (global_rows, Some(venue_rows))
        }
    };

    let summary = summarize(&global_stats, config);
    Ok(ScoutReport {
        team: TeamRef::from(&team),
        venue: venue.map(str::to_string),
        venue_stats,
        global_stats,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_store;

    #[test]
    fn global_scout_of_fixture_team() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "TTT", None).unwrap();

        assert_eq!(report.team.name, "The Trailer Trashers");
        assert_eq!(report.team.season, 23);
        assert!(report.venue_stats.is_none());

        let keys: Vec<&str> = report
            .global_stats
            .iter()
            .map(|r| r.machine_key.as_str())
            .collect();
        assert_eq!(keys, vec!["TAF", "MM", "TZ"]);

        let taf = &report.global_stats[0];
        assert_eq!(taf.machine_name, "The Addams Family");
        assert_eq!((taf.games, taf.p50, taf.p90), (3, 400, 500));
        assert_eq!(taf.league_p50, Some(300));
        assert!((taf.relative_strength - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(taf.likely_players.len(), 2);
        assert_eq!(taf.likely_players[0].name, "Bob");

        // Only TAF reaches three games.
        assert_eq!(report.summary.strongest, vec!["The Addams Family"]);
        assert!(report.summary.weakest.is_empty());
    }

    #[test]
    fn venue_scout_restricts_to_venue_machines() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "TTT", Some("STN")).unwrap();

        let global: Vec<&str> = report
            .global_stats
            .iter()
            .map(|r| r.machine_key.as_str())
            .collect();
        assert_eq!(global, vec!["TAF", "TZ"]);
        assert!(report.global_stats.iter().all(|r| !r.no_venue_data));

        let venue_rows = report.venue_stats.unwrap();
        assert_eq!(venue_rows.len(), 2);
        assert_eq!(venue_rows[0].machine_key, "TAF");
    }

    #[test]
    fn venue_without_matches_flags_every_machine() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "TTT", Some("GPA")).unwrap();

        assert!(report.venue_stats.as_ref().unwrap().is_empty());
        let global: Vec<&str> = report
            .global_stats
            .iter()
            .map(|r| r.machine_key.as_str())
            .collect();
        assert_eq!(global, vec!["MM", "TZ"]);
        assert!(report.global_stats.iter().all(|r| r.no_venue_data));
    }

    #[test]
    fn unknown_venue_is_empty_not_error() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "TTT", Some("XXX")).unwrap();
        assert!(report.global_stats.is_empty());
        assert_eq!(report.summary, StrengthSummary::default());
    }

    #[test]
    fn unknown_team_is_not_found() {
        let store = fixture_store();
        let err = analyze(&store, &AnalysisConfig::default(), "NOPE", None).unwrap_err();
        assert!(matches!(err, AnalysisError::TeamNotFound(key) if key == "NOPE"));
    }
}
