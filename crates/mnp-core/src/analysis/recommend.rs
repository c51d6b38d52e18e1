// Recommend: which of a team's players should play a given machine.
//
// Three modes, each its own function: the team's players everywhere, the
// team's players at one venue (with the global list as a fallback), or the
// team's players against an opponent's.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{machine_name, require_team, TeamRef};
use crate::cohort::{Cohort, TeamCohort};
use crate::compare::relative_strength;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::model::Score;
use crate::stats::Percentile;
use crate::store::{PlayerStats, Store};

/// What to compare the team's players against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecommendMode {
    Basic,
    AtVenue { venue: String },
    VsOpponent { opponent: String, venue: Option<String> },
}

/// A player's record on the machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecommendation {
    pub name: String,
    pub games: usize,
    pub p50: Score,
    pub p90: Score,
    pub league_p50: Option<Score>,
    pub relative_strength: f64,
    /// Set on global rows in venue mode when the player has no games there.
    pub no_venue_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Strong,
    Weak,
    Contested,
}

impl Verdict {
    /// Classify the P50 gap between the two best players.
    pub fn from_diff(diff: Score, margin: Score) -> Self {
        if diff > margin {
            Verdict::Strong
        } else if diff < -margin {
            Verdict::Weak
        } else {
            Verdict::Contested
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Strong => "strong pick",
            Verdict::Weak => "weak pick",
            Verdict::Contested => "contested",
        }
    }
}

/// How our best player on the machine compares to theirs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub our_best: String,
    pub their_best: String,
    /// Positive when our best outscores theirs.
    pub diff: Score,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendReport {
    pub team: TeamRef,
    pub machine_key: String,
    pub machine_name: String,
    pub mode: RecommendMode,
    /// The team's players, best P50 first. Venue-filtered in opponent mode
    /// when a venue is given.
    pub team_stats: Vec<PlayerRecommendation>,
    /// Only present in venue mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_stats: Option<Vec<PlayerRecommendation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<TeamRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_stats: Option<Vec<PlayerRecommendation>>,
    /// Only in opponent mode, and only when both sides have players.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,
}

/// Everything the three modes share.
struct Request<'a, S: ?Sized> {
    store: &'a S,
    config: &'a AnalysisConfig,
    team: &'a TeamCohort,
    machine_key: &'a str,
    league_p50: Option<Score>,
}

impl<S: Store + ?Sized> Request<'_, S> {
    fn player_stats(
        &self,
        team: &TeamCohort,
        venue: Option<&str>,
    ) -> Result<Vec<PlayerStats>, AnalysisError> {
        let stats = self
            .store
            .player_stats(&Cohort::roster(team), self.machine_key, venue)?;
        Ok(stats)
    }

    fn enrich(&self, stats: &[PlayerStats]) -> Vec<PlayerRecommendation> {
        let baseline = self.league_p50.unwrap_or(0) as f64;
        stats
            .iter()
            .map(|s| PlayerRecommendation {
                name: s.name.clone(),
                games: s.stat.games,
                p50: s.stat.p50,
                p90: s.stat.p90,
                league_p50: self.league_p50,
                relative_strength: relative_strength(s.stat.p50 as f64, baseline),
                no_venue_data: false,
            })
            .collect()
    }
}

/// The report fields a mode fills in.
#[derive(Default)]
struct ModeResult {
    team_stats: Vec<PlayerRecommendation>,
    venue_stats: Option<Vec<PlayerRecommendation>>,
    opponent: Option<TeamRef>,
    opponent_stats: Option<Vec<PlayerRecommendation>>,
    assessment: Option<Assessment>,
}

/// Recommend `team_key`'s players for `machine_key`.
pub fn analyze<S: Store + ?Sized>(
    store: &S,
    config: &AnalysisConfig,
    team_key: &str,
    machine_key: &str,
    mode: RecommendMode,
) -> Result<RecommendReport, AnalysisError> {
    let team = require_team(store, team_key)?;
    info!("Recommending {} players for {} ({:?})", team.team_key, machine_key, mode);

    let league_p50 = store
        .league_baseline(Percentile::P50)?
        .get(machine_key)
        .copied();
    let names = store.machine_names()?;

    let req = Request {
        store,
        config,
        team: &team,
        machine_key,
        league_p50,
    };
    let result = match &mode {
        RecommendMode::Basic => basic(&req)?,
        RecommendMode::AtVenue { venue } => at_venue(&req, venue)?,
        RecommendMode::VsOpponent { opponent, venue } => {
            vs_opponent(&req, opponent, venue.as_deref())?
        }
    };

    Ok(RecommendReport {
        team: TeamRef::from(&team),
        machine_key: machine_key.to_string(),
        machine_name: machine_name(&names, machine_key),
        mode,
        team_stats: result.team_stats,
        venue_stats: result.venue_stats,
        opponent: result.opponent,
        opponent_stats: result.opponent_stats,
        assessment: result.assessment,
    })
}

fn basic<S: Store + ?Sized>(req: &Request<'_, S>) -> Result<ModeResult, AnalysisError> {
    let stats = req.player_stats(req.team, None)?;
    Ok(ModeResult {
        team_stats: req.enrich(&stats),
        ..ModeResult::default()
    })
}

fn at_venue<S: Store + ?Sized>(
    req: &Request<'_, S>,
    venue: &str,
) -> Result<ModeResult, AnalysisError> {
    let venue_stats = req.player_stats(req.team, Some(venue))?;
    let global_stats = req.player_stats(req.team, None)?;

    let at_venue: BTreeSet<&str> = venue_stats.iter().map(|s| s.name.as_str()).collect();
    let mut team_stats = req.enrich(&global_stats);
    for row in team_stats.iter_mut() {
        row.no_venue_data = !at_venue.contains(row.name.as_str());
    }
    debug!(
        "{} of {} players have games at {venue}",
        at_venue.len(),
        team_stats.len()
    );

    Ok(ModeResult {
        team_stats,
        venue_stats: Some(req.enrich(&venue_stats)),
        ..ModeResult::default()
    })
}

fn vs_opponent<S: Store + ?Sized>(
    req: &Request<'_, S>,
    opponent_key: &str,
    venue: Option<&str>,
) -> Result<ModeResult, AnalysisError> {
    let opponent = require_team(req.store, opponent_key)?;
    let ours = req.player_stats(req.team, venue)?;
    let theirs = req.player_stats(&opponent, venue)?;

    let assessment = assess(&ours, &theirs, req.config.verdict_margin);
    if let Some(a) = &assessment {
        info!(
            "{} vs {} on {}: {} ({:+})",
            a.our_best,
            a.their_best,
            req.machine_key,
            a.verdict.label(),
            a.diff
        );
    }

    Ok(ModeResult {
        team_stats: req.enrich(&ours),
        opponent: Some(TeamRef::from(&opponent)),
        opponent_stats: Some(req.enrich(&theirs)),
        assessment,
        ..ModeResult::default()
    })
}

/// Compare the best player on each side. Both lists are best P50 first, as
/// `Store::player_stats` returns them. `None` if either side is empty.
pub fn assess(ours: &[PlayerStats], theirs: &[PlayerStats], margin: Score) -> Option<Assessment> {
    let our_best = ours.first()?;
    let their_best = theirs.first()?;
    let diff = our_best.stat.p50 - their_best.stat.p50;
    Some(Assessment {
        our_best: our_best.name.clone(),
        their_best: their_best.name.clone(),
        diff,
        verdict: Verdict::from_diff(diff, margin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::AggregateStat;
    use crate::testing::fixture_store;

    fn ps(name: &str, p50: Score) -> PlayerStats {
        PlayerStats {
            name: name.into(),
            stat: AggregateStat { games: 1, p50, p90: p50 },
        }
    }

    #[test]
    fn basic_lists_players_best_first() {
        let store = fixture_store();
        let report = analyze(
            &store,
            &AnalysisConfig::default(),
            "TTT",
            "TAF",
            RecommendMode::Basic,
        )
        .unwrap();

        assert_eq!(report.machine_name, "The Addams Family");
        let names: Vec<&str> = report.team_stats.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(report.team_stats[1].games, 2);
        assert_eq!(report.team_stats[1].p50, 350);
        assert_eq!(report.team_stats[0].league_p50, Some(300));
        assert!(report.venue_stats.is_none());
        assert!(report.assessment.is_none());
    }

    #[test]
    fn at_venue_flags_players_without_venue_games() {
        let store = fixture_store();
        let report = analyze(
            &store,
            &AnalysisConfig::default(),
            "TTT",
            "TAF",
            RecommendMode::AtVenue { venue: "GPA".into() },
        )
        .unwrap();

        assert!(report.venue_stats.as_ref().unwrap().is_empty());
        assert_eq!(report.team_stats.len(), 2);
        assert!(report.team_stats.iter().all(|p| p.no_venue_data));

        let at_stn = analyze(
            &store,
            &AnalysisConfig::default(),
            "TTT",
            "TAF",
            RecommendMode::AtVenue { venue: "STN".into() },
        )
        .unwrap();
        assert_eq!(at_stn.venue_stats.as_ref().unwrap().len(), 2);
        assert!(at_stn.team_stats.iter().all(|p| !p.no_venue_data));
    }

    #[test]
    fn vs_opponent_assesses_best_players() {
        let store = fixture_store();
        let report = analyze(
            &store,
            &AnalysisConfig::default(),
            "TTT",
            "TAF",
            RecommendMode::VsOpponent {
                opponent: "KNR".into(),
                venue: None,
            },
        )
        .unwrap();

        assert_eq!(report.opponent.as_ref().unwrap().key, "KNR");
        let assessment = report.assessment.unwrap();
        assert_eq!(assessment.our_best, "Alice");
        assert_eq!(assessment.their_best, "Carol");
        assert_eq!(assessment.diff, 200);
        assert_eq!(assessment.verdict, Verdict::Contested);
    }

    #[test]
    fn vs_opponent_without_games_has_no_assessment() {
        let store = fixture_store();
        let report = analyze(
            &store,
            &AnalysisConfig::default(),
            "TTT",
            "TAF",
            RecommendMode::VsOpponent {
                opponent: "KNR".into(),
                venue: Some("GPA".into()),
            },
        )
        .unwrap();
        assert!(report.team_stats.is_empty());
        assert!(report.opponent_stats.as_ref().unwrap().is_empty());
        assert!(report.assessment.is_none());
    }

    #[test]
    fn unknown_opponent_is_not_found() {
        let store = fixture_store();
        let err = analyze(
            &store,
            &AnalysisConfig::default(),
            "TTT",
            "TAF",
            RecommendMode::VsOpponent {
                opponent: "NOPE".into(),
                venue: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::TeamNotFound(k) if k == "NOPE"));
    }

    #[test]
    fn verdict_margin_is_strict() {
        let margin = 1_000_000;
        assert_eq!(Verdict::from_diff(1_000_000, margin), Verdict::Contested);
        assert_eq!(Verdict::from_diff(-1_000_000, margin), Verdict::Contested);
        assert_eq!(Verdict::from_diff(1_000_001, margin), Verdict::Strong);
        assert_eq!(Verdict::from_diff(-1_000_001, margin), Verdict::Weak);
    }

    #[test]
    fn assess_needs_both_sides() {
        let ours = vec![ps("A", 5_000_000), ps("B", 1_000_000)];
        let theirs = vec![ps("C", 2_000_000)];
        let a = assess(&ours, &theirs, 1_000_000).unwrap();
        assert_eq!(a.our_best, "A");
        assert_eq!(a.diff, 3_000_000);
        assert_eq!(a.verdict, Verdict::Strong);
        assert!(assess(&ours, &[], 1_000_000).is_none());
        assert!(assess(&[], &theirs, 1_000_000).is_none());
    }
}
