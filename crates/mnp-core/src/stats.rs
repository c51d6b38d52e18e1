// Nearest-rank percentile aggregation over raw scores.
//
// Percentiles are picked from the sorted sample without interpolation: the
// rank for fraction p is floor(p * (N + 1)), clamped to [1, N]. Ranks are
// computed in integer arithmetic so boundaries never drift with float error.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Score;

// ---------------------------------------------------------------------------
// Percentile selection
// ---------------------------------------------------------------------------

/// The percentiles the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Percentile {
    P50,
    P90,
}

impl Percentile {
    /// The percentile as an exact fraction `(numerator, denominator)`.
    fn ratio(self) -> (usize, usize) {
        match self {
            Percentile::P50 => (1, 2),
            Percentile::P90 => (9, 10),
        }
    }

    /// 1-based nearest rank of this percentile in a sample of `n` values.
    /// Returns `None` for an empty sample.
    pub fn rank(self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        let (num, den) = self.ratio();
        Some((num * (n + 1) / den).clamp(1, n))
    }

    /// Pick this percentile from an ascending-sorted sample.
    pub fn select(self, sorted: &[Score]) -> Option<Score> {
        self.rank(sorted.len()).map(|rank| sorted[rank - 1])
    }
}

// ---------------------------------------------------------------------------
// Aggregate stats
// ---------------------------------------------------------------------------

/// Games played plus P50/P90 for one group of scores.
///
/// There is no zero-games value: an empty group has no `AggregateStat` at all,
/// so callers can't mistake "no data" for a score of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateStat {
    pub games: usize,
    pub p50: Score,
    pub p90: Score,
}

impl AggregateStat {
    /// Aggregate an unordered collection of scores. Returns `None` when the
    /// collection is empty.
    pub fn from_scores(scores: impl IntoIterator<Item = Score>) -> Option<Self> {
        let mut sorted: Vec<Score> = scores.into_iter().collect();
        sorted.sort_unstable();
        Some(AggregateStat {
            games: sorted.len(),
            p50: Percentile::P50.select(&sorted)?,
            p90: Percentile::P90.select(&sorted)?,
        })
    }

    pub fn value(&self, percentile: Percentile) -> Score {
        match percentile {
            Percentile::P50 => self.p50,
            Percentile::P90 => self.p90,
        }
    }
}

/// Group `(key, score)` rows and aggregate each group.
pub fn aggregate_groups<K: Ord>(
    rows: impl IntoIterator<Item = (K, Score)>,
) -> BTreeMap<K, AggregateStat> {
    let mut groups: BTreeMap<K, Vec<Score>> = BTreeMap::new();
    for (key, score) in rows {
        groups.entry(key).or_default().push(score);
    }
    groups
        .into_iter()
        .filter_map(|(key, scores)| AggregateStat::from_scores(scores).map(|stat| (key, stat)))
        .collect()
}

// ---------------------------------------------------------------------------
// Likely players
// ---------------------------------------------------------------------------

/// A player expected to play a machine, judged by how often they have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikelyPlayer {
    pub name: String,
    pub games: usize,
    pub p50: Score,
}

/// Order players by games played descending, then P50 descending. Name breaks
/// any remaining tie so output is deterministic.
pub fn by_volume(a: &LikelyPlayer, b: &LikelyPlayer) -> Ordering {
    b.games
        .cmp(&a.games)
        .then_with(|| b.p50.cmp(&a.p50))
        .then_with(|| a.name.cmp(&b.name))
}

/// Pick the `limit` most likely players from per-player aggregates.
pub fn select_likely_players(
    per_player: impl IntoIterator<Item = (String, AggregateStat)>,
    limit: usize,
) -> Vec<LikelyPlayer> {
    let mut players: Vec<LikelyPlayer> = per_player
        .into_iter()
        .map(|(name, stat)| LikelyPlayer {
            name,
            games: stat.games,
            p50: stat.p50,
        })
        .collect();
    players.sort_by(by_volume);
    players.truncate(limit);
    players
}
