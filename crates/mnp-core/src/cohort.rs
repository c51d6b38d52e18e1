// Cohort resolution: which players make up a team key's current roster, and
// which machines a venue offers.
//
// Team keys are reused across seasons, sometimes by entirely different
// rosters. A key always resolves in two steps: key -> latest season that used
// it, then (key, season) -> players. Nothing is ever keyed by team key alone.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{RosterMembership, TeamSeason};

/// The players counted as a team key's current roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamCohort {
    pub team_key: String,
    /// Display name for the resolved season, falling back to the key.
    pub team_name: String,
    pub season: u32,
    pub players: BTreeSet<String>,
}

/// A player's most recent team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerTeam {
    pub team_key: String,
    pub team_name: String,
}

/// The set of players whose scores are aggregated together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Cohort {
    players: BTreeSet<String>,
}

impl Cohort {
    /// The cohort of a team's current roster.
    pub fn roster(team: &TeamCohort) -> Self {
        Cohort {
            players: team.players.clone(),
        }
    }

    /// A cohort of exactly one player.
    pub fn single(player: &str) -> Self {
        Cohort {
            players: BTreeSet::from([player.to_string()]),
        }
    }

    pub fn contains(&self, player: &str) -> bool {
        self.players.contains(player)
    }

    pub fn players(&self) -> &BTreeSet<String> {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolution over roster rows
// ---------------------------------------------------------------------------

/// Highest season in which `team_key` appears, from either a team row or a
/// roster row.
pub fn latest_season(teams: &[TeamSeason], rosters: &[RosterMembership], team_key: &str) -> Option<u32> {
    let from_teams = teams.iter().filter(|t| t.key == team_key).map(|t| t.season);
    let from_rosters = rosters
        .iter()
        .filter(|r| r.team_key == team_key)
        .map(|r| r.season);
    from_teams.chain(from_rosters).max()
}

/// Display name of `team_key` in `season`, or the key itself when the season
/// has no team row.
pub fn team_name(teams: &[TeamSeason], team_key: &str, season: u32) -> String {
    teams
        .iter()
        .find(|t| t.key == team_key && t.season == season)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| team_key.to_string())
}

/// Resolve `team_key` to the roster of its most recent season. Returns `None`
/// if the key never appears.
pub fn resolve_team(
    teams: &[TeamSeason],
    rosters: &[RosterMembership],
    team_key: &str,
) -> Option<TeamCohort> {
    let season = latest_season(teams, rosters, team_key)?;
    let players = rosters
        .iter()
        .filter(|r| r.team_key == team_key && r.season == season)
        .map(|r| r.player.clone())
        .collect();
    Some(TeamCohort {
        team_key: team_key.to_string(),
        team_name: team_name(teams, team_key, season),
        season,
        players,
    })
}

/// The highest season number with any roster row.
pub fn current_season(rosters: &[RosterMembership]) -> Option<u32> {
    rosters.iter().map(|r| r.season).max()
}

/// Every player rostered on any team in the current season. League-wide
/// baselines are computed over this set.
pub fn league_players(rosters: &[RosterMembership]) -> BTreeSet<String> {
    let Some(season) = current_season(rosters) else {
        return BTreeSet::new();
    };
    rosters
        .iter()
        .filter(|r| r.season == season)
        .map(|r| r.player.clone())
        .collect()
}

/// The team a player was most recently rostered on. Ties within a season
/// resolve to the lowest team key.
pub fn player_team(
    teams: &[TeamSeason],
    rosters: &[RosterMembership],
    player: &str,
) -> Option<PlayerTeam> {
    let latest = rosters
        .iter()
        .filter(|r| r.player == player)
        .max_by(|a, b| a.season.cmp(&b.season).then_with(|| b.team_key.cmp(&a.team_key)))?;
    Some(PlayerTeam {
        team_key: latest.team_key.clone(),
        team_name: team_name(teams, &latest.team_key, latest.season),
    })
}

/// Machines ever associated with a venue. Unknown venues have no machines.
pub fn venue_machine_set(
    venue_machines: &BTreeMap<String, BTreeSet<String>>,
    venue_key: &str,
) -> BTreeSet<String> {
    venue_machines.get(venue_key).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(player: &str, team_key: &str, season: u32) -> RosterMembership {
        RosterMembership {
            player: player.into(),
            team_key: team_key.into(),
            season,
        }
    }

    fn team(key: &str, season: u32, name: &str) -> TeamSeason {
        TeamSeason {
            key: key.into(),
            season,
            name: name.into(),
            home_venue: None,
        }
    }

    #[test]
    fn reused_key_resolves_to_latest_roster() {
        let teams = vec![team("TTT", 10, "Old Trashers"), team("TTT", 23, "The Trailer Trashers")];
        let rosters = vec![
            member("Zed", "TTT", 10),
            member("Yolanda", "TTT", 10),
            member("Alice", "TTT", 23),
            member("Bob", "TTT", 23),
        ];

        let cohort = resolve_team(&teams, &rosters, "TTT").unwrap();
        assert_eq!(cohort.season, 23);
        assert_eq!(cohort.team_name, "The Trailer Trashers");
        assert_eq!(
            cohort.players,
            BTreeSet::from(["Alice".to_string(), "Bob".to_string()])
        );
    }

    #[test]
    fn unknown_key_is_none() {
        let rosters = vec![member("Alice", "TTT", 23)];
        assert!(resolve_team(&[], &rosters, "NOPE").is_none());
    }

    #[test]
    fn team_row_without_roster_resolves_empty() {
        let teams = vec![team("NEW", 24, "Newcomers")];
        let rosters = vec![member("Alice", "NEW", 23)];
        let cohort = resolve_team(&teams, &rosters, "NEW").unwrap();
        assert_eq!(cohort.season, 24);
        assert!(cohort.players.is_empty());
    }

    #[test]
    fn team_name_falls_back_to_key() {
        assert_eq!(team_name(&[], "KNR", 23), "KNR");
    }

    #[test]
    fn league_players_use_current_season_only() {
        let rosters = vec![
            member("Alice", "TTT", 23),
            member("Carol", "KNR", 23),
            member("Retired", "KNR", 22),
        ];
        let players = league_players(&rosters);
        assert_eq!(
            players,
            BTreeSet::from(["Alice".to_string(), "Carol".to_string()])
        );
    }

    #[test]
    fn league_players_empty_without_rosters() {
        assert!(league_players(&[]).is_empty());
    }

    #[test]
    fn player_team_picks_most_recent_membership() {
        let teams = vec![team("KNR", 23, "Knight Riders")];
        let rosters = vec![member("Carol", "TTT", 20), member("Carol", "KNR", 23)];
        let pt = player_team(&teams, &rosters, "Carol").unwrap();
        assert_eq!(pt.team_key, "KNR");
        assert_eq!(pt.team_name, "Knight Riders");
        assert!(player_team(&teams, &rosters, "Nobody").is_none());
    }

    #[test]
    fn player_team_tie_prefers_lowest_key() {
        let rosters = vec![member("Dual", "ZZZ", 23), member("Dual", "AAA", 23)];
        assert_eq!(player_team(&[], &rosters, "Dual").unwrap().team_key, "AAA");
    }

    #[test]
    fn unknown_venue_has_no_machines() {
        let mut venues = BTreeMap::new();
        venues.insert("STN".to_string(), BTreeSet::from(["TAF".to_string()]));
        assert_eq!(venue_machine_set(&venues, "STN").len(), 1);
        assert!(venue_machine_set(&venues, "XXX").is_empty());
    }

    #[test]
    fn cohort_membership() {
        let single = Cohort::single("Alice");
        assert!(single.contains("Alice"));
        assert!(!single.contains("Bob"));
        assert!(!single.is_empty());
        assert!(Cohort::default().is_empty());
    }
}
