//! Filter sweep evaluation over a canonical path corpus.
//!
//! Inputs arrive pre-normalized (every identifier rewritten to its
//! equivalence representative); this crate applies named path filters in
//! every admissible combination and scores each combination per query.
//!
//! Pipeline: [`FilterRegistry`] names the predicates,
//! [`CombinationEvaluator`] derives per-combination survivor sets from one
//! filter pass per filter, and [`MetricsRow`] turns survivor counts into
//! recall, precision, enrichment, retention, and expected-node recall.
//! Queries are independent and evaluated in parallel.

pub mod characteristics;
pub mod combinations;
pub mod filters;
pub mod metrics;

use std::collections::BTreeSet;

use rayon::prelude::*;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use pathfilter_model::{PathRecord, Query, QueryCorpus};

pub use characteristics::{NodeCharacteristics, DEFAULT_INFORMATION_CONTENT};
pub use combinations::{combination_label, CombinationEvaluator, CombinationResult};
pub use filters::{Filter, FilterCategory, FilterContext, FilterKind, FilterRegistry};
pub use metrics::{CellCounts, Metric, MetricsRow, Weighting};

#[derive(Debug, Error)]
pub enum EvalError {
    /// A requested filter name is not in the registry.
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
    /// Two node-characteristic filters were requested in one combination.
    #[error("node filters `{first}` and `{second}` cannot share a combination")]
    ExclusiveNodeFilters { first: String, second: String },
    /// The node-characteristics table could not be parsed.
    #[error("characteristics table line {line}: {reason}")]
    Characteristics { line: usize, reason: String },
}

/// Sweep-wide evaluation settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    pub weighting: Weighting,
    /// Cap on combination size; `None` sweeps every subset.
    pub max_combination_size: Option<usize>,
}

fn bitmap_count(survivors: &RoaringBitmap, paths: &[PathRecord], weighting: Weighting) -> u64 {
    match weighting {
        Weighting::Weighted => survivors
            .iter()
            .map(|index| paths[index as usize].num_paths)
            .sum(),
        Weighting::Unweighted => survivors.len(),
    }
}

/// Per-query denominators and expected-node bitmaps, fixed across every
/// combination.
struct RowBuilder<'a> {
    paths: &'a [PathRecord],
    weighting: Weighting,
    paths_total: u64,
    expected_total: u64,
    nodes_total: u64,
    baseline_precision: Metric,
    expected_bitmap: RoaringBitmap,
    node_bitmaps: Vec<RoaringBitmap>,
}

impl<'a> RowBuilder<'a> {
    fn new(query: &Query, paths: &'a [PathRecord], config: &EvalConfig) -> Self {
        let expected = query.expected_node_set();
        let mut expected_bitmap = RoaringBitmap::new();
        for (index, path) in paths.iter().enumerate() {
            if path.contains_any(&expected) {
                expected_bitmap.insert(index as u32);
            }
        }
        // One bitmap per expected node, to count surviving nodes by
        // intersection instead of per-combination path scans.
        let node_bitmaps: Vec<RoaringBitmap> = expected
            .iter()
            .map(|node| {
                let mut bitmap = RoaringBitmap::new();
                for (index, path) in paths.iter().enumerate() {
                    if path.nodes.contains(node) {
                        bitmap.insert(index as u32);
                    }
                }
                bitmap
            })
            .filter(|bitmap| !bitmap.is_empty())
            .collect();

        let mut universe = RoaringBitmap::new();
        universe.insert_range(0..paths.len() as u32);
        let paths_total = bitmap_count(&universe, paths, config.weighting);
        let expected_total = bitmap_count(&expected_bitmap, paths, config.weighting);
        let nodes_total = node_bitmaps.len() as u64;
        let baseline_precision = MetricsRow::baseline_precision(&CellCounts {
            paths_total,
            paths_kept: paths_total,
            expected_total,
            expected_kept: expected_total,
            nodes_total,
            nodes_kept: nodes_total,
        });

        Self {
            paths,
            weighting: config.weighting,
            paths_total,
            expected_total,
            nodes_total,
            baseline_precision,
            expected_bitmap,
            node_bitmaps,
        }
    }

    fn row(&self, query_id: &str, combination: &CombinationResult) -> MetricsRow {
        let counts = CellCounts {
            paths_total: self.paths_total,
            paths_kept: match self.weighting {
                Weighting::Weighted => combination.kept_weight,
                Weighting::Unweighted => combination.kept_records,
            },
            expected_total: self.expected_total,
            expected_kept: bitmap_count(
                &(&combination.survivors & &self.expected_bitmap),
                self.paths,
                self.weighting,
            ),
            nodes_total: self.nodes_total,
            nodes_kept: self
                .node_bitmaps
                .iter()
                .filter(|bitmap| bitmap.intersection_len(&combination.survivors) > 0)
                .count() as u64,
        };
        MetricsRow::compute(
            query_id,
            combination.label(),
            combination.members.len(),
            counts,
            self.baseline_precision,
        )
    }
}

/// Evaluate every admissible combination of `selection` on one query.
///
/// Returns one row per combination, the empty combination first. An inert
/// query still yields rows; its recall and precision are not-applicable in
/// each of them.
pub fn evaluate_query(
    query: &Query,
    paths: &[PathRecord],
    registry: &FilterRegistry,
    selection: &BTreeSet<String>,
    characteristics: Option<&NodeCharacteristics>,
    config: &EvalConfig,
) -> Result<Vec<MetricsRow>, EvalError> {
    let ctx = FilterContext {
        query_id: &query.id,
        characteristics,
    };
    let mut evaluator = CombinationEvaluator::new(registry, selection, &ctx, paths)?;
    let builder = RowBuilder::new(query, paths, config);
    Ok(evaluator
        .enumerate(config.max_combination_size)
        .iter()
        .map(|combination| builder.row(&query.id, combination))
        .collect())
}

/// Evaluate an explicit list of combinations on one query, instead of the
/// full sweep. Each combination is validated before any corpus scan.
pub fn evaluate_query_combinations(
    query: &Query,
    paths: &[PathRecord],
    registry: &FilterRegistry,
    combinations: &[BTreeSet<String>],
    characteristics: Option<&NodeCharacteristics>,
    config: &EvalConfig,
) -> Result<Vec<MetricsRow>, EvalError> {
    let mut selection = BTreeSet::new();
    for members in combinations {
        registry.validate_combination(members)?;
        selection.extend(members.iter().cloned());
    }

    let ctx = FilterContext {
        query_id: &query.id,
        characteristics,
    };
    let mut evaluator = CombinationEvaluator::new(registry, &selection, &ctx, paths)?;
    let builder = RowBuilder::new(query, paths, config);
    combinations
        .iter()
        .map(|members| {
            let result = evaluator.combination(members)?;
            Ok(builder.row(&query.id, &result))
        })
        .collect()
}

/// Evaluate the full corpus, one query at a time in parallel.
///
/// Rows come back grouped by query in corpus order, each query's rows in
/// the deterministic enumeration order.
pub fn evaluate_corpus(
    corpus: &QueryCorpus,
    registry: &FilterRegistry,
    selection: &BTreeSet<String>,
    characteristics: Option<&NodeCharacteristics>,
    config: &EvalConfig,
) -> Result<Vec<MetricsRow>, EvalError> {
    registry.validate_names(selection)?;

    let per_query: Vec<Vec<MetricsRow>> = corpus
        .queries
        .par_iter()
        .map(|query| {
            evaluate_query(
                query,
                corpus.paths_for(&query.id),
                registry,
                selection,
                characteristics,
                config,
            )
        })
        .collect::<Result<_, _>>()?;

    let rows: Vec<MetricsRow> = per_query.into_iter().flatten().collect();
    info!(
        queries = corpus.queries.len(),
        filters = selection.len(),
        rows = rows.len(),
        "sweep evaluated"
    );
    Ok(rows)
}

/// Evaluate an explicit list of combinations across the whole corpus.
pub fn evaluate_corpus_combinations(
    corpus: &QueryCorpus,
    registry: &FilterRegistry,
    combinations: &[BTreeSet<String>],
    characteristics: Option<&NodeCharacteristics>,
    config: &EvalConfig,
) -> Result<Vec<MetricsRow>, EvalError> {
    for members in combinations {
        registry.validate_combination(members)?;
    }

    let per_query: Vec<Vec<MetricsRow>> = corpus
        .queries
        .par_iter()
        .map(|query| {
            evaluate_query_combinations(
                query,
                corpus.paths_for(&query.id),
                registry,
                combinations,
                characteristics,
                config,
            )
        })
        .collect::<Result<_, _>>()?;

    let rows: Vec<MetricsRow> = per_query.into_iter().flatten().collect();
    info!(
        queries = corpus.queries.len(),
        combinations = combinations.len(),
        rows = rows.len(),
        "strategy evaluation complete"
    );
    Ok(rows)
}

/// The winning combination for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCombination {
    pub query_id: String,
    pub combination: String,
    pub enrichment: Metric,
    pub recall: Metric,
}

/// Pick, per query, the combination with the highest enrichment.
///
/// A best enrichment at or below 1.0 means no filtering helps and the empty
/// combination wins. Ties prefer fewer filters, then higher recall, then
/// lexically smaller labels. Queries whose enrichment is nowhere defined
/// (inert queries among them) fall back to the empty combination with a
/// not-applicable score. Output is sorted by enrichment descending,
/// not-applicable last.
pub fn best_combinations(rows: &[MetricsRow]) -> Vec<BestCombination> {
    // First-seen order; rows read back from a re-sorted results file may
    // interleave queries.
    let mut query_ids: Vec<&str> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for row in rows {
        if seen.insert(row.query_id.as_str()) {
            query_ids.push(row.query_id.as_str());
        }
    }

    let mut out = Vec::new();
    for query_id in query_ids {
        let query_rows: Vec<&MetricsRow> =
            rows.iter().filter(|r| r.query_id == query_id).collect();
        let baseline = query_rows.iter().find(|r| r.combination == "none");

        let mut best: Option<&MetricsRow> = None;
        for row in query_rows.iter().copied().filter(|r| r.combination != "none") {
            let Some(enrichment) = row.enrichment.value() else {
                continue;
            };
            let better = match best {
                None => true,
                Some(current) => {
                    let current_enrichment = current
                        .enrichment
                        .value()
                        .unwrap_or(f64::NEG_INFINITY);
                    let key = |r: &MetricsRow| {
                        (
                            r.filter_count,
                            std::cmp::Reverse(
                                r.recall
                                    .value()
                                    .map(ordered_float)
                                    .unwrap_or(u64::MIN),
                            ),
                            r.combination.clone(),
                        )
                    };
                    enrichment > current_enrichment
                        || (enrichment == current_enrichment && key(row) < key(current))
                }
            };
            if better {
                best = Some(row);
            }
        }

        let winner = match best {
            Some(row) if row.enrichment.value().is_some_and(|e| e > 1.0) => BestCombination {
                query_id: query_id.to_string(),
                combination: row.combination.clone(),
                enrichment: row.enrichment,
                recall: row.recall,
            },
            _ => BestCombination {
                query_id: query_id.to_string(),
                combination: "none".to_string(),
                enrichment: baseline.map_or(Metric::NotApplicable, |r| r.enrichment),
                recall: baseline.map_or(Metric::NotApplicable, |r| r.recall),
            },
        };
        out.push(winner);
    }

    out.sort_by(|a, b| {
        let rank = |m: Metric| m.value().map(ordered_float);
        rank(b.enrichment)
            .cmp(&rank(a.enrichment))
            .then_with(|| a.query_id.cmp(&b.query_id))
    });
    out
}

/// Total-order key for a non-NaN finite metric value.
fn ordered_float(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 0 {
        bits | (1 << 63)
    } else {
        !bits
    }
}
