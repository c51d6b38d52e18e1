// Raw league facts consumed by the stores: scores, rosters, and reference data.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A raw pinball score. Scores are whole numbers and routinely exceed `u32`.
pub type Score = i64;

/// One player's score on one game. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub player: String,
    /// Team key the player represented when the game was played.
    pub team_key: String,
    pub season: u32,
    pub machine_key: String,
    /// Venue of the match the game belonged to.
    pub venue_key: String,
    pub score: Score,
}

/// A player's membership on a team key for one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMembership {
    pub player: String,
    pub team_key: String,
    pub season: u32,
}

/// Display name of a team key in a given season. Names can change between
/// seasons while the key stays the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSeason {
    pub key: String,
    pub season: u32,
    pub name: String,
    /// Venue key the team hosts its home matches at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_venue: Option<String>,
}

/// A complete league snapshot, as handed to [`crate::memory::MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueData {
    /// Machine key -> display name.
    pub machines: BTreeMap<String, String>,
    /// Venue key -> display name.
    #[serde(default)]
    pub venues: BTreeMap<String, String>,
    /// Venue key -> machine keys ever installed there.
    pub venue_machines: BTreeMap<String, BTreeSet<String>>,
    pub teams: Vec<TeamSeason>,
    pub rosters: Vec<RosterMembership>,
    pub scores: Vec<ScoreRecord>,
}
