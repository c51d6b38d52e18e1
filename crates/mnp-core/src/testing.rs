// Shared league fixture for unit tests.
//
// Season 23: TTT (Alice, Bob) hosts KNR (Carol, Dave, Erin) at STN. Erin is
// rostered but has never played. Zed played for TTT back in season 10 when the
// key belonged to a different roster.

use std::collections::{BTreeMap, BTreeSet};

use crate::memory::MemoryStore;
use crate::model::{LeagueData, RosterMembership, Score, ScoreRecord, TeamSeason};

fn score(player: &str, team_key: &str, season: u32, machine: &str, score: Score) -> ScoreRecord {
    ScoreRecord {
        player: player.into(),
        team_key: team_key.into(),
        season,
        machine_key: machine.into(),
        venue_key: "STN".into(),
        score,
    }
}

fn member(player: &str, team_key: &str, season: u32) -> RosterMembership {
    RosterMembership {
        player: player.into(),
        team_key: team_key.into(),
        season,
    }
}

fn team(key: &str, season: u32, name: &str, home_venue: &str) -> TeamSeason {
    TeamSeason {
        key: key.into(),
        season,
        name: name.into(),
        home_venue: Some(home_venue.into()),
    }
}

fn machines(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

pub(crate) fn fixture_league() -> LeagueData {
    LeagueData {
        machines: BTreeMap::from([
            ("TAF".to_string(), "The Addams Family".to_string()),
            ("TZ".to_string(), "Twilight Zone".to_string()),
            ("MM".to_string(), "Medieval Madness".to_string()),
        ]),
        venues: BTreeMap::from([
            ("STN".to_string(), "Shorty's".to_string()),
            ("GPA".to_string(), "Georgetown Pizza and Arcade".to_string()),
        ]),
        venue_machines: BTreeMap::from([
            ("STN".to_string(), machines(&["TAF", "TZ"])),
            ("GPA".to_string(), machines(&["MM", "TZ"])),
        ]),
        teams: vec![
            team("TTT", 10, "Old Trashers", "STN"),
            team("TTT", 23, "The Trailer Trashers", "STN"),
            team("KNR", 23, "Knight Riders", "GPA"),
        ],
        rosters: vec![
            member("Zed", "TTT", 10),
            member("Alice", "TTT", 23),
            member("Bob", "TTT", 23),
            member("Carol", "KNR", 23),
            member("Dave", "KNR", 23),
            member("Erin", "KNR", 23),
        ],
        scores: vec![
            score("Zed", "TTT", 10, "TAF", 9_999),
            score("Alice", "TTT", 23, "TAF", 500),
            score("Bob", "TTT", 23, "TAF", 400),
            score("Carol", "KNR", 23, "TAF", 300),
            score("Dave", "KNR", 23, "TAF", 200),
            score("Alice", "TTT", 23, "TZ", 100),
            score("Carol", "KNR", 23, "TZ", 150),
            score("Bob", "TTT", 23, "TAF", 350),
            score("Dave", "KNR", 23, "TAF", 250),
            score("Alice", "TTT", 23, "MM", 600),
            score("Carol", "KNR", 23, "MM", 700),
        ],
    }
}

pub(crate) fn fixture_store() -> MemoryStore {
    MemoryStore::new(fixture_league())
}
