//! Metric computation over survivor sets.
//!
//! Every ratio here can be undefined (a zero or empty denominator), and an
//! undefined ratio is carried as [`Metric::NotApplicable`], never as 0.0. A
//! query with no expected paths has no recall, and conflating that with
//! "recall of zero" is precisely the false-negative class these metrics
//! exist to surface. `NotApplicable` is local to one cell; it never aborts
//! the evaluation of other cells.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// A ratio metric, or the explicit undefined sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "Option<f64>")]
pub enum Metric {
    Value(f64),
    NotApplicable,
}

impl Metric {
    /// `numerator / denominator`, or `NotApplicable` when the denominator
    /// is zero.
    pub fn ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Metric::NotApplicable
        } else {
            Metric::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotApplicable => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{v:.6}"),
            Metric::NotApplicable => write!(f, "NA"),
        }
    }
}

impl FromStr for Metric {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("na") {
            Ok(Metric::NotApplicable)
        } else {
            s.parse::<f64>().map(Metric::Value)
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => Metric::Value(v),
            None => Metric::NotApplicable,
        }
    }
}

// JSON carries `NotApplicable` as null; text outputs render it as `NA`.
impl Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Metric::Value(v) => serializer.serialize_some(v),
            Metric::NotApplicable => serializer.serialize_none(),
        }
    }
}

/// Whether path counts weight each record by its `num_paths` multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Each record counts `num_paths` times.
    #[default]
    Weighted,
    /// Each record counts once.
    Unweighted,
}

/// Raw counts behind one (query, combination) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    pub paths_total: u64,
    pub paths_kept: u64,
    /// Paths whose node set intersects the expected-node set.
    pub expected_total: u64,
    pub expected_kept: u64,
    /// Unique expected nodes appearing anywhere in the query's paths.
    pub nodes_total: u64,
    pub nodes_kept: u64,
}

/// One output row: a query, a combination, its counts, and the five
/// derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub query_id: String,
    /// `none`, or member names joined by `+`.
    pub combination: String,
    pub filter_count: usize,
    #[serde(flatten)]
    pub counts: CellCounts,
    pub recall: Metric,
    pub precision: Metric,
    pub enrichment: Metric,
    pub retention_rate: Metric,
    pub expected_node_recall: Metric,
}

impl MetricsRow {
    /// Derive a row from its counts and the query's empty-combination
    /// baseline precision.
    pub fn compute(
        query_id: impl Into<String>,
        combination: impl Into<String>,
        filter_count: usize,
        counts: CellCounts,
        baseline_precision: Metric,
    ) -> Self {
        let recall = if counts.expected_total == 0 {
            Metric::NotApplicable
        } else {
            Metric::ratio(counts.expected_kept, counts.expected_total)
        };
        // Precision is undefined for an inert or expected-free query even
        // when paths survive; keeping 37 wrong paths is not 0% precision,
        // it is unmeasurable.
        let precision = if counts.expected_total == 0 {
            Metric::NotApplicable
        } else {
            Metric::ratio(counts.expected_kept, counts.paths_kept)
        };
        let enrichment = match (precision, baseline_precision) {
            (Metric::Value(after), Metric::Value(before)) if before > 0.0 => {
                Metric::Value(after / before)
            }
            _ => Metric::NotApplicable,
        };
        let retention_rate = Metric::ratio(counts.paths_kept, counts.paths_total);
        let expected_node_recall = Metric::ratio(counts.nodes_kept, counts.nodes_total);

        Self {
            query_id: query_id.into(),
            combination: combination.into(),
            filter_count,
            counts,
            recall,
            precision,
            enrichment,
            retention_rate,
            expected_node_recall,
        }
    }

    /// Combination-empty baseline precision for this query, from total
    /// counts alone.
    pub fn baseline_precision(counts: &CellCounts) -> Metric {
        if counts.expected_total == 0 {
            Metric::NotApplicable
        } else {
            Metric::ratio(counts.expected_total, counts.paths_total)
        }
    }
}
