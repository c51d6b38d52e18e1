// Player: one individual's record across machines.

use serde::Serialize;
use tracing::info;

use crate::analysis::{
    enrich, mark_no_venue_data, restrict_to, summarize, MachineReport, StrengthSummary,
};
use crate::cohort::{Cohort, PlayerTeam};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::stats::Percentile;
use crate::store::{MachineQuery, Store};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerReport {
    pub name: String,
    /// Most recent team. Absent when the player was never rostered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<PlayerTeam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_stats: Option<Vec<MachineReport>>,
    /// All-venue stats; restricted to the venue's machines in venue mode.
    pub global_stats: Vec<MachineReport>,
    pub summary: StrengthSummary,
}

/// Profile `player` across machines, optionally at `venue`.
pub fn analyze<S: Store + ?Sized>(
    store: &S,
    config: &AnalysisConfig,
    player: &str,
    venue: Option<&str>,
) -> Result<PlayerReport, AnalysisError> {
    if !store.player_known(player)? {
        return Err(AnalysisError::PlayerNotFound(player.to_string()));
    }
    info!("Profiling {player}");

    let baseline = store.league_baseline(Percentile::P50)?;
    let names = store.machine_names()?;
    let cohort = Cohort::single(player);
    let global = store.machine_stats(&MachineQuery {
        cohort: &cohort,
        venue: None,
        likely_players: 0,
    })?;
    let (global_stats, venue_stats) = match venue {
        None => (enrich(global, &baseline, &names), None),
        Some(venue_key) => {
            let machines = store.venue_machines(venue_key)?;
            let at_venue = store.machine_stats(&MachineQuery {
                cohort: &cohort,
                venue: Some(venue_key),
                likely_players: 0,
            })?;
            let venue_rows = enrich(restrict_to(at_venue, &machines), &baseline, &names);
            let mut global_rows = enrich(restrict_to(global, &machines), &baseline, &names);
            mark_no_venue_data(&mut global_rows, &venue_rows);
            (global_rows, Some(venue_rows))
        }
    };

    let team = store.player_current_team(player)?;
    let summary = summarize(&global_stats, config);
    Ok(PlayerReport {
        name: player.to_string(),
        team,
        venue: venue.map(str::to_string),
        venue_stats,
        global_stats,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::ScoreRecord;
    use crate::testing::{fixture_league, fixture_store};

    #[test]
    fn profile_of_rostered_player() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "Alice", None).unwrap();

        let team = report.team.unwrap();
        assert_eq!(team.team_key, "TTT");
        assert_eq!(team.team_name, "The Trailer Trashers");

        assert_eq!(report.global_stats.len(), 3);
        let mm = report
            .global_stats
            .iter()
            .find(|r| r.machine_key == "MM")
            .unwrap();
        assert_eq!((mm.games, mm.p50), (1, 600));
        assert_eq!(mm.league_p50, Some(600));
        assert!(mm.likely_players.is_empty());
        // No machine has three games.
        assert!(report.summary.strongest.is_empty());
    }

    #[test]
    fn rostered_player_without_scores_is_empty() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "Erin", None).unwrap();
        assert_eq!(report.team.unwrap().team_key, "KNR");
        assert!(report.global_stats.is_empty());
    }

    #[test]
    fn unrostered_player_has_no_team() {
        let mut league = fixture_league();
        league.scores.push(ScoreRecord {
            player: "Sub".into(),
            team_key: "KNR".into(),
            season: 23,
            machine_key: "TZ".into(),
            venue_key: "STN".into(),
            score: 90,
        });
        let store = MemoryStore::new(league);
        let report = analyze(&store, &AnalysisConfig::default(), "Sub", None).unwrap();
        assert!(report.team.is_none());
        assert_eq!(report.global_stats.len(), 1);
    }

    #[test]
    fn venue_mode_flags_machines_not_played_there() {
        let store = fixture_store();
        let report = analyze(&store, &AnalysisConfig::default(), "Alice", Some("GPA")).unwrap();
        let keys: Vec<&str> = report
            .global_stats
            .iter()
            .map(|r| r.machine_key.as_str())
            .collect();
        assert_eq!(keys, vec!["MM", "TZ"]);
        assert!(report.global_stats.iter().all(|r| r.no_venue_data));
        assert!(report.venue_stats.unwrap().is_empty());
    }

    #[test]
    fn unknown_player_is_not_found() {
        let store = fixture_store();
        let err = analyze(&store, &AnalysisConfig::default(), "Nobody", None).unwrap_err();
        assert!(matches!(err, AnalysisError::PlayerNotFound(name) if name == "Nobody"));
    }
}
