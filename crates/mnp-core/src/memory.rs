// In-memory `Store` over a complete league snapshot.
//
// Every query is a scan over the snapshot's score rows. Leagues are small
// (a few hundred players, tens of thousands of games) so no indexes are kept.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::catalog::{self, MachineListing, PlayerListing, TeamListing, VenueListing};
use crate::cohort::{self, Cohort, PlayerTeam, TeamCohort};
use crate::model::{LeagueData, Score, ScoreRecord};
use crate::stats::Percentile;
use crate::store::{
    build_baseline, build_machine_stats, build_player_stats, MachineQuery, MachineStats,
    PlayerStats, ScoreRow, Store, StoreResult,
};

/// Immutable after construction, so shareable across threads without locking.
pub struct MemoryStore {
    data: LeagueData,
}

impl MemoryStore {
    pub fn new(data: LeagueData) -> Self {
        debug!(
            "MemoryStore: {} scores, {} roster rows, {} machines",
            data.scores.len(),
            data.rosters.len(),
            data.machines.len()
        );
        MemoryStore { data }
    }

    /// Scores by cohort players, optionally restricted to matches at `venue`.
    fn cohort_scores<'a>(
        &'a self,
        cohort: &'a Cohort,
        venue: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ScoreRecord> + 'a {
        self.data.scores.iter().filter(move |s| {
            cohort.contains(&s.player) && venue.map_or(true, |v| s.venue_key == v)
        })
    }
}

impl Store for MemoryStore {
    fn team_cohort(&self, team_key: &str) -> StoreResult<Option<TeamCohort>> {
        Ok(cohort::resolve_team(
            &self.data.teams,
            &self.data.rosters,
            team_key,
        ))
    }

    fn venue_machines(&self, venue_key: &str) -> StoreResult<BTreeSet<String>> {
        Ok(cohort::venue_machine_set(
            &self.data.venue_machines,
            venue_key,
        ))
    }

    fn machine_names(&self) -> StoreResult<HashMap<String, String>> {
        Ok(self
            .data
            .machines
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn league_baseline(&self, percentile: Percentile) -> StoreResult<HashMap<String, Score>> {
        let players = cohort::league_players(&self.data.rosters);
        let rows = self
            .data
            .scores
            .iter()
            .filter(|s| players.contains(&s.player))
            .map(|s| (s.machine_key.clone(), s.score));
        Ok(build_baseline(rows, percentile))
    }

    fn machine_stats(&self, query: &MachineQuery<'_>) -> StoreResult<Vec<MachineStats>> {
        let rows = self.cohort_scores(query.cohort, query.venue).map(|s| ScoreRow {
            machine_key: s.machine_key.clone(),
            player: s.player.clone(),
            score: s.score,
        });
        Ok(build_machine_stats(rows, query.likely_players))
    }

    fn player_stats(
        &self,
        cohort: &Cohort,
        machine_key: &str,
        venue: Option<&str>,
    ) -> StoreResult<Vec<PlayerStats>> {
        let rows = self
            .cohort_scores(cohort, venue)
            .filter(|s| s.machine_key == machine_key)
            .map(|s| (s.player.clone(), s.score));
        Ok(build_player_stats(rows))
    }

    fn player_current_team(&self, player: &str) -> StoreResult<Option<PlayerTeam>> {
        Ok(cohort::player_team(
            &self.data.teams,
            &self.data.rosters,
            player,
        ))
    }

    fn player_known(&self, player: &str) -> StoreResult<bool> {
        Ok(self.data.rosters.iter().any(|r| r.player == player)
            || self.data.scores.iter().any(|s| s.player == player))
    }

    fn list_teams(&self, search: Option<&str>) -> StoreResult<Vec<TeamListing>> {
        Ok(catalog::list_teams(&self.data.teams, &self.data.venues, search))
    }

    fn list_venues(&self, search: Option<&str>) -> StoreResult<Vec<VenueListing>> {
        Ok(catalog::list_venues(
            &self.data.venues,
            &self.data.venue_machines,
            search,
        ))
    }

    fn list_machines(&self, search: Option<&str>) -> StoreResult<Vec<MachineListing>> {
        Ok(catalog::list_machines(
            &self.data.machines,
            &self.data.scores,
            search,
        ))
    }

    fn list_players(&self, search: Option<&str>) -> StoreResult<Vec<PlayerListing>> {
        Ok(catalog::list_players(
            &self.data.teams,
            &self.data.rosters,
            search,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{AggregateStat, LikelyPlayer};
    use crate::testing::fixture_store;

    fn ttt(store: &MemoryStore) -> Cohort {
        Cohort::roster(&store.team_cohort("TTT").unwrap().unwrap())
    }

    #[test]
    fn team_machine_stats_ordered_by_games() {
        let store = fixture_store();
        let cohort = ttt(&store);
        let stats = store
            .machine_stats(&MachineQuery {
                cohort: &cohort,
                venue: None,
                likely_players: 2,
            })
            .unwrap();

        let keys: Vec<&str> = stats.iter().map(|s| s.machine_key.as_str()).collect();
        assert_eq!(keys, vec!["TAF", "MM", "TZ"]);
        assert_eq!(stats[0].stat, AggregateStat { games: 3, p50: 400, p90: 500 });
        assert_eq!(
            stats[0].likely_players,
            vec![
                LikelyPlayer { name: "Bob".into(), games: 2, p50: 350 },
                LikelyPlayer { name: "Alice".into(), games: 1, p50: 500 },
            ]
        );
        assert_eq!(stats[1].stat, AggregateStat { games: 1, p50: 600, p90: 600 });
        assert_eq!(stats[2].stat, AggregateStat { games: 1, p50: 100, p90: 100 });
    }

    #[test]
    fn old_season_players_excluded_from_cohort() {
        let store = fixture_store();
        let cohort = ttt(&store);
        assert!(!cohort.contains("Zed"));
    }

    #[test]
    fn venue_filter_uses_match_location() {
        let store = fixture_store();
        let cohort = ttt(&store);
        let at_gpa = store
            .machine_stats(&MachineQuery {
                cohort: &cohort,
                venue: Some("GPA"),
                likely_players: 2,
            })
            .unwrap();
        assert!(at_gpa.is_empty());
    }

    #[test]
    fn league_baseline_over_current_rosters() {
        let store = fixture_store();
        let p50 = store.league_baseline(Percentile::P50).unwrap();
        assert_eq!(p50["TAF"], 300);
        assert_eq!(p50["TZ"], 100);
        assert_eq!(p50["MM"], 600);
    }

    #[test]
    fn player_stats_for_one_machine() {
        let store = fixture_store();
        let cohort = ttt(&store);
        let stats = store.player_stats(&cohort, "TAF", None).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "Alice");
        assert_eq!(stats[0].stat, AggregateStat { games: 1, p50: 500, p90: 500 });
        assert_eq!(stats[1].name, "Bob");
        assert_eq!(stats[1].stat, AggregateStat { games: 2, p50: 350, p90: 400 });
    }

    #[test]
    fn unknown_machine_has_no_player_stats() {
        let store = fixture_store();
        let cohort = ttt(&store);
        assert!(store.player_stats(&cohort, "NOPE", None).unwrap().is_empty());
    }

    #[test]
    fn player_known_covers_rosters_and_scores() {
        let store = fixture_store();
        assert!(store.player_known("Alice").unwrap());
        assert!(store.player_known("Zed").unwrap());
        assert!(!store.player_known("Nobody").unwrap());
    }
}
