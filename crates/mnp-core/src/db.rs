// SQLite-backed `Store` over a synced league database.
//
// The schema mirrors what the sync job writes. Databases on disk are opened
// read-only. Queries only fetch raw score rows; percentiles are computed by
// `stats` so both stores agree exactly.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use tracing::debug;

use crate::catalog::{self, MachineListing, PlayerListing, TeamListing, VenueListing};
use crate::cohort::{Cohort, PlayerTeam, TeamCohort};
use crate::model::Score;
use crate::stats::Percentile;
use crate::store::{
    build_baseline, build_machine_stats, build_player_stats, MachineQuery, MachineStats,
    PlayerStats, ScoreRow, Store, StoreError, StoreResult,
};

/// Attach a static description to a rusqlite failure.
trait QueryContext<T> {
    fn context(self, context: &'static str) -> StoreResult<T>;
}

impl<T> QueryContext<T> for Result<T, rusqlite::Error> {
    fn context(self, context: &'static str) -> StoreResult<T> {
        self.map_err(|source| StoreError::Sqlite { context, source })
    }
}

/// Highest season with any roster row. League-wide baselines use its rosters.
const CURRENT_SEASON_SQL: &str = "
    SELECT MAX(s.number)
    FROM rosters r
    JOIN teams t   ON t.id = r.team_id
    JOIN seasons s ON s.id = t.season_id";

/// Latest season with any team row. Team listings use it.
const LATEST_TEAM_SEASON_SQL: &str = "
    SELECT MAX(s.number)
    FROM teams t
    JOIN seasons s ON s.id = t.season_id";

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append a case-insensitive substring match over `columns` for `search`.
fn push_search(sql: &mut String, args: &mut Vec<String>, search: Option<&str>, columns: &[&str]) {
    let Some(term) = catalog::search_term(search) else {
        return;
    };
    let pattern = format!("%{}%", escape_like(&term));
    let clauses: Vec<String> = columns
        .iter()
        .map(|c| format!("LOWER({c}) LIKE ? ESCAPE '\\'"))
        .collect();
    sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
    args.extend(columns.iter().map(|_| pattern.clone()));
}

/// Create every table and index the queries expect. Idempotent.
fn create_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("failed to set database pragmas")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS machines (
            key  TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS seasons (
            id     INTEGER PRIMARY KEY,
            number INTEGER NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS players (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS venues (
            id   INTEGER PRIMARY KEY,
            key  TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        );

        -- Team keys repeat across seasons, possibly with a new roster.
        CREATE TABLE IF NOT EXISTS teams (
            id            INTEGER PRIMARY KEY,
            key           TEXT NOT NULL,
            name          TEXT NOT NULL,
            season_id     INTEGER NOT NULL REFERENCES seasons(id),
            home_venue_id INTEGER REFERENCES venues(id),
            UNIQUE(key, season_id)
        );

        CREATE TABLE IF NOT EXISTS venue_machines (
            venue_id    INTEGER NOT NULL REFERENCES venues(id),
            machine_key TEXT NOT NULL REFERENCES machines(key),
            season_id   INTEGER NOT NULL REFERENCES seasons(id),
            PRIMARY KEY (venue_id, machine_key, season_id)
        );

        CREATE TABLE IF NOT EXISTS rosters (
            player_id INTEGER NOT NULL REFERENCES players(id),
            team_id   INTEGER NOT NULL REFERENCES teams(id),
            role      TEXT NOT NULL DEFAULT 'P',
            PRIMARY KEY (player_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            id           INTEGER PRIMARY KEY,
            key          TEXT NOT NULL UNIQUE,
            season_id    INTEGER NOT NULL REFERENCES seasons(id),
            week         INTEGER NOT NULL,
            home_team_id INTEGER NOT NULL REFERENCES teams(id),
            away_team_id INTEGER NOT NULL REFERENCES teams(id),
            venue_id     INTEGER REFERENCES venues(id)
        );

        CREATE TABLE IF NOT EXISTS games (
            id          INTEGER PRIMARY KEY,
            match_id    INTEGER NOT NULL REFERENCES matches(id),
            round       INTEGER NOT NULL,
            machine_key TEXT
        );

        -- score is NULL for games that were never finished.
        CREATE TABLE IF NOT EXISTS game_results (
            game_id   INTEGER NOT NULL REFERENCES games(id),
            player_id INTEGER NOT NULL REFERENCES players(id),
            team_id   INTEGER NOT NULL REFERENCES teams(id),
            position  INTEGER NOT NULL,
            score     INTEGER,
            PRIMARY KEY (game_id, player_id)
        );

        CREATE INDEX IF NOT EXISTS idx_game_results_player ON game_results(player_id);
        CREATE INDEX IF NOT EXISTS idx_games_machine ON games(machine_key);
        CREATE INDEX IF NOT EXISTS idx_teams_season ON teams(season_id);
        ",
    )
    .context("failed to create database schema")
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open an existing league database read-only. A missing file is an
    /// error; analyses never create databases.
    pub fn open(path: &str) -> StoreResult<Self> {
        if !Path::new(path).is_file() {
            return Err(StoreError::Missing(path.to_string()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("failed to open database")?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("failed to set busy timeout")?;

        debug!("Opened league database at {path} (read-only)");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An empty in-memory database with the league schema.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection. A poisoned lock is reported rather
    /// than propagated as a panic.
    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn list<T, F>(&self, sql: &str, args: &[String], map: F) -> StoreResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(sql)
            .context("failed to prepare listing query")?;
        let rows = stmt
            .query_map(params_from_iter(args), map)
            .context("failed to run listing query")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to map listing rows")?;
        Ok(rows)
    }

    /// Raw scores for a cohort, optionally narrowed to one machine and to
    /// matches played at one venue.
    fn cohort_scores(
        &self,
        cohort: &Cohort,
        machine_key: Option<&str>,
        venue_key: Option<&str>,
    ) -> StoreResult<Vec<ScoreRow>> {
        if cohort.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; cohort.players().len()].join(", ");
        let mut sql = format!(
            "SELECT g.machine_key, p.name, gr.score
             FROM game_results gr
             JOIN players p   ON p.id = gr.player_id
             JOIN games g     ON g.id = gr.game_id
             JOIN matches m   ON m.id = g.match_id
             LEFT JOIN venues v ON v.id = m.venue_id
             WHERE gr.score IS NOT NULL
               AND g.machine_key IS NOT NULL
               AND p.name IN ({placeholders})"
        );
        let mut args: Vec<&str> = cohort.players().iter().map(String::as_str).collect();
        if let Some(machine_key) = machine_key {
            sql.push_str(" AND g.machine_key = ?");
            args.push(machine_key);
        }
        if let Some(venue_key) = venue_key {
            sql.push_str(" AND v.key = ?");
            args.push(venue_key);
        }

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&sql)
            .context("failed to prepare cohort score query")?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(ScoreRow {
                    machine_key: row.get(0)?,
                    player: row.get(1)?,
                    score: row.get(2)?,
                })
            })
            .context("failed to query cohort scores")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to map cohort score rows")?;

        debug!(
            "Fetched {} scores for {} players (machine={:?}, venue={:?})",
            rows.len(),
            cohort.players().len(),
            machine_key,
            venue_key
        );
        Ok(rows)
    }
}

impl Store for SqliteStore {
    fn team_cohort(&self, team_key: &str) -> StoreResult<Option<TeamCohort>> {
        let conn = self.conn()?;

        let latest: Option<(u32, String)> = conn
            .query_row(
                "SELECT s.number, t.name
                 FROM teams t
                 JOIN seasons s ON s.id = t.season_id
                 WHERE t.key = ?1
                 ORDER BY s.number DESC
                 LIMIT 1",
                params![team_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to resolve team season")?;

        let Some((season, team_name)) = latest else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT p.name
                 FROM rosters r
                 JOIN players p ON p.id = r.player_id
                 JOIN teams t   ON t.id = r.team_id
                 JOIN seasons s ON s.id = t.season_id
                 WHERE t.key = ?1 AND s.number = ?2",
            )
            .context("failed to prepare roster query")?;
        let players = stmt
            .query_map(params![team_key, season], |row| row.get::<_, String>(0))
            .context("failed to query roster")?
            .collect::<Result<BTreeSet<_>, _>>()
            .context("failed to map roster rows")?;

        Ok(Some(TeamCohort {
            team_key: team_key.to_string(),
            team_name,
            season,
            players,
        }))
    }

    fn venue_machines(&self, venue_key: &str) -> StoreResult<BTreeSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT vm.machine_key
                 FROM venue_machines vm
                 JOIN venues v ON v.id = vm.venue_id
                 WHERE v.key = ?1",
            )
            .context("failed to prepare venue machines query")?;
        let machines = stmt
            .query_map(params![venue_key], |row| row.get::<_, String>(0))
            .context("failed to query venue machines")?
            .collect::<Result<BTreeSet<_>, _>>()
            .context("failed to map venue machine rows")?;
        Ok(machines)
    }

    fn machine_names(&self) -> StoreResult<HashMap<String, String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT key, name FROM machines")
            .context("failed to prepare machine names query")?;
        let names = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to query machine names")?
            .collect::<Result<HashMap<String, String>, _>>()
            .context("failed to map machine name rows")?;
        Ok(names)
    }

    fn league_baseline(&self, percentile: Percentile) -> StoreResult<HashMap<String, Score>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT g.machine_key, gr.score
             FROM game_results gr
             JOIN games g ON g.id = gr.game_id
             WHERE gr.score IS NOT NULL
               AND g.machine_key IS NOT NULL
               AND gr.player_id IN (
                   SELECT r.player_id
                   FROM rosters r
                   JOIN teams t   ON t.id = r.team_id
                   JOIN seasons s ON s.id = t.season_id
                   WHERE s.number = ({CURRENT_SEASON_SQL})
               )"
        );
        let mut stmt = conn
            .prepare(&sql)
            .context("failed to prepare league baseline query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Score>(1)?)))
            .context("failed to query league scores")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to map league score rows")?;

        debug!("League baseline over {} scores", rows.len());
        Ok(build_baseline(rows, percentile))
    }

    fn machine_stats(&self, query: &MachineQuery<'_>) -> StoreResult<Vec<MachineStats>> {
        let rows = self.cohort_scores(query.cohort, None, query.venue)?;
        Ok(build_machine_stats(rows, query.likely_players))
    }

    fn player_stats(
        &self,
        cohort: &Cohort,
        machine_key: &str,
        venue: Option<&str>,
    ) -> StoreResult<Vec<PlayerStats>> {
        let rows = self.cohort_scores(cohort, Some(machine_key), venue)?;
        Ok(build_player_stats(rows.into_iter().map(|r| (r.player, r.score))))
    }

    fn player_current_team(&self, player: &str) -> StoreResult<Option<PlayerTeam>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT t.key, t.name
             FROM rosters r
             JOIN players p ON p.id = r.player_id
             JOIN teams t   ON t.id = r.team_id
             JOIN seasons s ON s.id = t.season_id
             WHERE p.name = ?1
             ORDER BY s.number DESC, t.key ASC
             LIMIT 1",
            params![player],
            |row| {
                Ok(PlayerTeam {
                    team_key: row.get(0)?,
                    team_name: row.get(1)?,
                })
            },
        )
        .optional()
        .context("failed to query player team")
    }

    fn player_known(&self, player: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM players p
                 WHERE p.name = ?1
                   AND (EXISTS(SELECT 1 FROM rosters r WHERE r.player_id = p.id)
                        OR EXISTS(SELECT 1 FROM game_results gr WHERE gr.player_id = p.id))
             )",
            params![player],
            |row| row.get(0),
        )
        .context("failed to check player existence")
    }

    fn list_teams(&self, search: Option<&str>) -> StoreResult<Vec<TeamListing>> {
        let mut sql = format!(
            "SELECT t.key, t.name, s.number, v.key, v.name
             FROM teams t
             JOIN seasons s     ON s.id = t.season_id
             LEFT JOIN venues v ON v.id = t.home_venue_id
             WHERE s.number = ({LATEST_TEAM_SEASON_SQL})"
        );
        let mut args = Vec::new();
        push_search(&mut sql, &mut args, search, &["t.key", "t.name"]);
        sql.push_str(" ORDER BY t.key");

        self.list(&sql, &args, |row| {
            let venue_key: Option<String> = row.get(3)?;
            let venue_name: Option<String> = row.get(4)?;
            Ok(TeamListing {
                key: row.get(0)?,
                name: row.get(1)?,
                season: row.get(2)?,
                home_venue: venue_key
                    .zip(venue_name)
                    .map(|(key, name)| VenueListing { key, name }),
            })
        })
    }

    fn list_venues(&self, search: Option<&str>) -> StoreResult<Vec<VenueListing>> {
        let mut sql = String::from("SELECT key, name FROM venues WHERE 1 = 1");
        let mut args = Vec::new();
        push_search(&mut sql, &mut args, search, &["key", "name"]);
        sql.push_str(" ORDER BY key");

        self.list(&sql, &args, |row| {
            Ok(VenueListing {
                key: row.get(0)?,
                name: row.get(1)?,
            })
        })
    }

    fn list_machines(&self, search: Option<&str>) -> StoreResult<Vec<MachineListing>> {
        let mut sql = String::from(
            "SELECT m.key, m.name
             FROM machines m
             WHERE m.key IN (SELECT machine_key FROM games WHERE machine_key IS NOT NULL)",
        );
        let mut args = Vec::new();
        push_search(&mut sql, &mut args, search, &["m.key", "m.name"]);
        sql.push_str(" ORDER BY m.key");

        self.list(&sql, &args, |row| {
            Ok(MachineListing {
                key: row.get(0)?,
                name: row.get(1)?,
            })
        })
    }

    fn list_players(&self, search: Option<&str>) -> StoreResult<Vec<PlayerListing>> {
        let mut sql = format!(
            "SELECT DISTINCT p.name, t.key, t.name
             FROM rosters r
             JOIN players p ON p.id = r.player_id
             JOIN teams t   ON t.id = r.team_id
             JOIN seasons s ON s.id = t.season_id
             WHERE s.number = ({CURRENT_SEASON_SQL})"
        );
        let mut args = Vec::new();
        push_search(&mut sql, &mut args, search, &["p.name", "t.key", "t.name"]);
        sql.push_str(" ORDER BY p.name, t.key");

        self.list(&sql, &args, |row| {
            Ok(PlayerListing {
                name: row.get(0)?,
                team_key: row.get(1)?,
                team_name: row.get(2)?,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
