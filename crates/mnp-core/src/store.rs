// The read contract between the analyses and whatever holds league data.
//
// Implementations: `memory::MemoryStore` (an in-memory league snapshot) and
// `db::SqliteStore` (a synced SQLite database). The analyses only ever see
// `&impl Store`, so either can back them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{MachineListing, PlayerListing, TeamListing, VenueListing};
use crate::cohort::{Cohort, PlayerTeam, TeamCohort};
use crate::model::Score;
use crate::stats::{aggregate_groups, select_likely_players, AggregateStat, LikelyPlayer, Percentile};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The store could not answer a query. Fatal to the current request; the
/// analyses never retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{context}: {source}")]
    Sqlite {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("league database not found at {0}")]
    Missing(String),

    #[error("store connection lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Result rows
// ---------------------------------------------------------------------------

/// A cohort's aggregate on one machine, with the players most likely to play it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineStats {
    pub machine_key: String,
    pub stat: AggregateStat,
    pub likely_players: Vec<LikelyPlayer>,
}

/// One player's aggregate on one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub name: String,
    pub stat: AggregateStat,
}

/// Parameters for [`Store::machine_stats`].
#[derive(Debug, Clone, Copy)]
pub struct MachineQuery<'a> {
    pub cohort: &'a Cohort,
    /// Only count games from matches played at this venue.
    pub venue: Option<&'a str>,
    /// Likely players to select per machine.
    pub likely_players: usize,
}

/// A single fetched score, before aggregation.
#[derive(Debug, Clone)]
pub struct ScoreRow {
    pub machine_key: String,
    pub player: String,
    pub score: Score,
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

pub trait Store: Send + Sync {
    /// Resolve a team key to its most recent roster. `None` if the key is unknown.
    fn team_cohort(&self, team_key: &str) -> StoreResult<Option<TeamCohort>>;

    /// Machines ever installed at a venue. Empty for unknown venues.
    fn venue_machines(&self, venue_key: &str) -> StoreResult<BTreeSet<String>>;

    /// Machine key -> display name.
    fn machine_names(&self) -> StoreResult<HashMap<String, String>>;

    /// League-wide percentile per machine, over every player on a
    /// current-season roster.
    fn league_baseline(&self, percentile: Percentile) -> StoreResult<HashMap<String, Score>>;

    /// Per-machine aggregates for a cohort, ordered by games descending then
    /// machine key.
    fn machine_stats(&self, query: &MachineQuery<'_>) -> StoreResult<Vec<MachineStats>>;

    /// Per-player aggregates for a cohort on one machine, ordered by P50
    /// descending.
    fn player_stats(
        &self,
        cohort: &Cohort,
        machine_key: &str,
        venue: Option<&str>,
    ) -> StoreResult<Vec<PlayerStats>>;

    /// The team a player was most recently rostered on.
    fn player_current_team(&self, player: &str) -> StoreResult<Option<PlayerTeam>>;

    /// Whether the player has any roster or score history at all.
    fn player_known(&self, player: &str) -> StoreResult<bool>;

    // Listings take an optional case-insensitive search term; see `catalog`.

    /// Teams in the latest season, ordered by key.
    fn list_teams(&self, search: Option<&str>) -> StoreResult<Vec<TeamListing>>;

    /// All venues, ordered by key.
    fn list_venues(&self, search: Option<&str>) -> StoreResult<Vec<VenueListing>>;

    /// Machines with at least one recorded game, ordered by key.
    fn list_machines(&self, search: Option<&str>) -> StoreResult<Vec<MachineListing>>;

    /// Current-season roster entries, ordered by player name then team key.
    fn list_players(&self, search: Option<&str>) -> StoreResult<Vec<PlayerListing>>;
}

// ---------------------------------------------------------------------------
// Shared aggregation
// ---------------------------------------------------------------------------

/// Aggregate fetched score rows into per-machine stats with likely players.
pub fn build_machine_stats(
    rows: impl IntoIterator<Item = ScoreRow>,
    likely_limit: usize,
) -> Vec<MachineStats> {
    let mut per_machine: BTreeMap<String, Vec<Score>> = BTreeMap::new();
    let mut per_player: BTreeMap<String, Vec<(String, Score)>> = BTreeMap::new();
    for row in rows {
        per_machine
            .entry(row.machine_key.clone())
            .or_default()
            .push(row.score);
        per_player
            .entry(row.machine_key)
            .or_default()
            .push((row.player, row.score));
    }

    let mut stats: Vec<MachineStats> = per_machine
        .into_iter()
        .filter_map(|(machine_key, scores)| {
            let stat = AggregateStat::from_scores(scores)?;
            let players = per_player.remove(&machine_key).unwrap_or_default();
            let likely_players = select_likely_players(aggregate_groups(players), likely_limit);
            Some(MachineStats {
                machine_key,
                stat,
                likely_players,
            })
        })
        .collect();

    stats.sort_by(|a, b| {
        b.stat
            .games
            .cmp(&a.stat.games)
            .then_with(|| a.machine_key.cmp(&b.machine_key))
    });
    stats
}

/// Aggregate `(player, score)` rows into per-player stats, best P50 first.
pub fn build_player_stats(rows: impl IntoIterator<Item = (String, Score)>) -> Vec<PlayerStats> {
    let mut stats: Vec<PlayerStats> = aggregate_groups(rows)
        .into_iter()
        .map(|(name, stat)| PlayerStats { name, stat })
        .collect();
    stats.sort_by(|a, b| {
        b.stat
            .p50
            .cmp(&a.stat.p50)
            .then_with(|| b.stat.games.cmp(&a.stat.games))
            .then_with(|| a.name.cmp(&b.name))
    });
    stats
}

/// Aggregate `(machine, score)` rows into one percentile per machine.
pub fn build_baseline(
    rows: impl IntoIterator<Item = (String, Score)>,
    percentile: Percentile,
) -> HashMap<String, Score> {
    aggregate_groups(rows)
        .into_iter()
        .map(|(machine, stat)| (machine, stat.value(percentile)))
        .collect()
}
