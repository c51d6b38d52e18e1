// Comparison primitives: a value against a league baseline, and two values
// against each other.

use std::cmp::Ordering;
use std::ops::Neg;

use serde::Serialize;

use crate::config::ConfidenceConfig;
use crate::stats::LikelyPlayer;

// ---------------------------------------------------------------------------
// Relative strength
// ---------------------------------------------------------------------------

/// Percentage by which `value` deviates from `baseline`.
///
/// Returns 0.0 when the baseline is zero, meaning "no comparison available".
pub fn relative_strength(value: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (value - baseline) / baseline * 100.0
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// One side of a two-way comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// How much one side's value exceeds the other's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Edge {
    /// Both sides equal, including both having no data.
    Even,
    /// One side has data and the other has none. The side with data wins
    /// outright; there is no meaningful percentage.
    Lopsided(Side),
    /// Percentage by which the stronger side exceeds the weaker. Positive
    /// favors the first side.
    Percent(f64),
}

impl Edge {
    /// The side this edge favors, or `None` when even.
    pub fn favors(&self) -> Option<Side> {
        match *self {
            Edge::Even => None,
            Edge::Lopsided(side) => Some(side),
            Edge::Percent(p) if p > 0.0 => Some(Side::First),
            Edge::Percent(p) if p < 0.0 => Some(Side::Second),
            Edge::Percent(_) => None,
        }
    }

    /// Key for ordering edges from the first side's strongest advantage to
    /// the second side's strongest advantage.
    pub fn sort_key(&self) -> f64 {
        match *self {
            Edge::Even => 0.0,
            Edge::Lopsided(Side::First) => f64::INFINITY,
            Edge::Lopsided(Side::Second) => f64::NEG_INFINITY,
            Edge::Percent(p) => p,
        }
    }

    /// Descending order: first side's biggest edge first.
    pub fn descending(a: &Edge, b: &Edge) -> Ordering {
        b.sort_key()
            .partial_cmp(&a.sort_key())
            .unwrap_or(Ordering::Equal)
    }
}

impl Neg for Edge {
    type Output = Edge;

    /// The same comparison seen from the other side.
    fn neg(self) -> Edge {
        match self {
            Edge::Even => Edge::Even,
            Edge::Lopsided(side) => Edge::Lopsided(side.other()),
            Edge::Percent(p) => Edge::Percent(-p),
        }
    }
}

/// Edge of `a` over `b`, measured against the smaller of the two.
pub fn edge_percent(a: f64, b: f64) -> Edge {
    if a == b {
        return Edge::Even;
    }
    let lo = a.min(b);
    if lo == 0.0 {
        return if a > b {
            Edge::Lopsided(Side::First)
        } else {
            Edge::Lopsided(Side::Second)
        };
    }
    Edge::Percent((a - b) / lo * 100.0)
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// How much data backs an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Classify an average games-played figure.
    pub fn from_average_games(avg: f64, thresholds: &ConfidenceConfig) -> Self {
        if avg >= thresholds.high_games {
            Confidence::High
        } else if avg >= thresholds.medium_games {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Average games played across a cohort's likely players. No players
/// averages to zero.
pub fn average_games(players: &[LikelyPlayer]) -> f64 {
    if players.is_empty() {
        return 0.0;
    }
    let total: usize = players.iter().map(|p| p.games).sum();
    total as f64 / players.len() as f64
}

/// Confidence in an edge between two cohorts, limited by the thinner one.
pub fn confidence(
    first: &[LikelyPlayer],
    second: &[LikelyPlayer],
    thresholds: &ConfidenceConfig,
) -> Confidence {
    let min_avg = average_games(first).min(average_games(second));
    Confidence::from_average_games(min_avg, thresholds)
}

/// Mean P50 of a cohort's likely players, or `None` without any.
pub fn likely_score(players: &[LikelyPlayer]) -> Option<f64> {
    if players.is_empty() {
        return None;
    }
    let sum: f64 = players.iter().map(|p| p.p50 as f64).sum();
    Some(sum / players.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lp(games: usize, p50: i64) -> LikelyPlayer {
        LikelyPlayer {
            name: format!("p{games}-{p50}"),
            games,
            p50,
        }
    }

    #[test]
    fn relative_strength_basic() {
        assert_eq!(relative_strength(1_500_000.0, 1_000_000.0), 50.0);
        assert_eq!(relative_strength(750_000.0, 1_000_000.0), -25.0);
        assert_eq!(relative_strength(1_000_000.0, 1_000_000.0), 0.0);
    }

    #[test]
    fn relative_strength_zero_baseline_is_no_comparison() {
        assert_eq!(relative_strength(500_000.0, 0.0), 0.0);
    }

    #[test]
    fn relative_strength_strictly_increasing() {
        let baseline = 300.0;
        let mut prev = f64::NEG_INFINITY;
        for v in (0..2_000).step_by(7) {
            let rs = relative_strength(v as f64, baseline);
            assert!(rs > prev, "value {v} gave {rs} after {prev}");
            prev = rs;
        }
    }

    #[test]
    fn edge_uses_smaller_value_as_denominator() {
        assert_eq!(edge_percent(60.0, 40.0), Edge::Percent(50.0));
        assert_eq!(edge_percent(40.0, 60.0), Edge::Percent(-50.0));
    }

    #[test]
    fn edge_equal_values_are_even() {
        assert_eq!(edge_percent(0.0, 0.0), Edge::Even);
        assert_eq!(edge_percent(7.0, 7.0), Edge::Even);
    }

    #[test]
    fn edge_one_sided_is_lopsided() {
        assert_eq!(edge_percent(100.0, 0.0), Edge::Lopsided(Side::First));
        assert_eq!(edge_percent(0.0, 100.0), Edge::Lopsided(Side::Second));
    }

    #[test]
    fn edge_is_antisymmetric() {
        let values = [0.0, 1.0, 150.0, 2_500_000.0, 40_000_000.0];
        for &a in &values {
            for &b in &values {
                if a == 0.0 && b == 0.0 {
                    continue;
                }
                assert_eq!(edge_percent(a, b), -edge_percent(b, a), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn edge_ordering_puts_lopsided_at_extremes() {
        let mut edges = vec![
            Edge::Percent(-10.0),
            Edge::Lopsided(Side::Second),
            Edge::Even,
            Edge::Lopsided(Side::First),
            Edge::Percent(25.0),
        ];
        edges.sort_by(Edge::descending);
        assert_eq!(
            edges,
            vec![
                Edge::Lopsided(Side::First),
                Edge::Percent(25.0),
                Edge::Even,
                Edge::Percent(-10.0),
                Edge::Lopsided(Side::Second),
            ]
        );
    }

    #[test]
    fn edge_favors() {
        assert_eq!(Edge::Even.favors(), None);
        assert_eq!(Edge::Percent(3.0).favors(), Some(Side::First));
        assert_eq!(Edge::Percent(-3.0).favors(), Some(Side::Second));
        assert_eq!(Edge::Lopsided(Side::Second).favors(), Some(Side::Second));
    }

    #[test]
    fn confidence_threshold_boundaries() {
        let t = ConfidenceConfig::default();
        assert_eq!(Confidence::from_average_games(2.9, &t), Confidence::Low);
        assert_eq!(Confidence::from_average_games(3.0, &t), Confidence::Medium);
        assert_eq!(Confidence::from_average_games(9.9, &t), Confidence::Medium);
        assert_eq!(Confidence::from_average_games(10.0, &t), Confidence::High);
    }

    #[test]
    fn confidence_uses_thinner_cohort() {
        let t = ConfidenceConfig::default();
        let deep = vec![lp(12, 1), lp(8, 1)];
        let thin = vec![lp(4, 1)];
        assert_eq!(confidence(&deep, &deep, &t), Confidence::High);
        assert_eq!(confidence(&deep, &thin, &t), Confidence::Medium);
        assert_eq!(confidence(&deep, &[], &t), Confidence::Low);
    }

    #[test]
    fn likely_score_is_mean_p50() {
        assert_eq!(likely_score(&[lp(12, 60), lp(8, 40)]), Some(50.0));
        assert_eq!(likely_score(&[]), None);
    }
}
