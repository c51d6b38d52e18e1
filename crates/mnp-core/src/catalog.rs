// Reference-data listings: the team, venue, machine, and player keys the
// analyses take as input.
//
// Every listing accepts an optional search term, matched case-insensitively
// (ASCII) as a substring of the entity's key or name. An empty term lists
// everything.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::cohort;
use crate::model::{RosterMembership, ScoreRecord, TeamSeason};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueListing {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamListing {
    pub key: String,
    pub name: String,
    pub season: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_venue: Option<VenueListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineListing {
    pub key: String,
    pub name: String,
}

/// A current-season roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerListing {
    pub name: String,
    pub team_key: String,
    pub team_name: String,
}

/// Lowercased search term, or `None` when the search matches everything.
pub(crate) fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
}

fn matches(term: Option<&str>, fields: &[&str]) -> bool {
    match term {
        None => true,
        Some(term) => fields
            .iter()
            .any(|f| f.to_ascii_lowercase().contains(term)),
    }
}

// ---------------------------------------------------------------------------
// Listings over snapshot rows
// ---------------------------------------------------------------------------

/// Teams in the latest season with any team row, ordered by key.
pub fn list_teams(
    teams: &[TeamSeason],
    venues: &BTreeMap<String, String>,
    search: Option<&str>,
) -> Vec<TeamListing> {
    let Some(season) = teams.iter().map(|t| t.season).max() else {
        return Vec::new();
    };
    let term = search_term(search);

    let mut listings: Vec<TeamListing> = teams
        .iter()
        .filter(|t| t.season == season)
        .filter(|t| matches(term.as_deref(), &[t.key.as_str(), t.name.as_str()]))
        .map(|t| TeamListing {
            key: t.key.clone(),
            name: t.name.clone(),
            season,
            home_venue: t.home_venue.as_ref().map(|key| VenueListing {
                key: key.clone(),
                name: venues.get(key).cloned().unwrap_or_else(|| key.clone()),
            }),
        })
        .collect();
    listings.sort_by(|a, b| a.key.cmp(&b.key));
    listings
}

/// Every known venue, ordered by key. Venues that only appear in machine
/// lineups are named by their key.
pub fn list_venues(
    venues: &BTreeMap<String, String>,
    venue_machines: &BTreeMap<String, BTreeSet<String>>,
    search: Option<&str>,
) -> Vec<VenueListing> {
    let term = search_term(search);
    let keys: BTreeSet<&String> = venues.keys().chain(venue_machines.keys()).collect();
    keys.into_iter()
        .map(|key| VenueListing {
            key: key.clone(),
            name: venues.get(key).cloned().unwrap_or_else(|| key.clone()),
        })
        .filter(|v| matches(term.as_deref(), &[v.key.as_str(), v.name.as_str()]))
        .collect()
}

/// Named machines that have been played at least once, ordered by key.
pub fn list_machines(
    machines: &BTreeMap<String, String>,
    scores: &[ScoreRecord],
    search: Option<&str>,
) -> Vec<MachineListing> {
    let term = search_term(search);
    let played: BTreeSet<&str> = scores.iter().map(|s| s.machine_key.as_str()).collect();
    machines
        .iter()
        .filter(|(key, _)| played.contains(key.as_str()))
        .filter(|(key, name)| matches(term.as_deref(), &[key.as_str(), name.as_str()]))
        .map(|(key, name)| MachineListing {
            key: key.clone(),
            name: name.clone(),
        })
        .collect()
}

/// Current-season roster entries ordered by player name, then team key.
/// The search matches player name, team key, or team name.
pub fn list_players(
    teams: &[TeamSeason],
    rosters: &[RosterMembership],
    search: Option<&str>,
) -> Vec<PlayerListing> {
    let Some(season) = cohort::current_season(rosters) else {
        return Vec::new();
    };
    let term = search_term(search);

    let entries: BTreeSet<(String, String)> = rosters
        .iter()
        .filter(|r| r.season == season)
        .map(|r| (r.player.clone(), r.team_key.clone()))
        .collect();
    entries
        .into_iter()
        .map(|(name, team_key)| {
            let team_name = cohort::team_name(teams, &team_key, season);
            PlayerListing {
                name,
                team_key,
                team_name,
            }
        })
        .filter(|p| {
            matches(
                term.as_deref(),
                &[p.name.as_str(), p.team_key.as_str(), p.team_name.as_str()],
            )
        })
        .collect()
}
