//! The equivalence resolver: rewrite a whole corpus to canonical form.
//!
//! Two passes. Pass one scans the query definitions and every path record
//! to collect the full set of distinct raw identifiers; pass two issues a
//! single normalizer batch and rewrites every occurrence by lookup. The
//! collect-then-rewrite shape is the dominant performance property of the
//! pipeline: it collapses one oracle round-trip per path into one per
//! corpus, and any rework of this module must keep it.
//!
//! Identifiers the oracle explicitly marks unresolved keep their raw form;
//! an unknown identifier can then only ever match itself. Nothing is
//! fabricated, nothing is dropped.

use std::collections::HashMap;

use tracing::info;

use pathfilter_model::{fold_category_label, Curie, PathRecord, Query, QueryCorpus};

use crate::oracle::NormalizationOracle;
use crate::{NormalizeError, Normalizer, Resolution};

/// A corpus whose identifier-bearing fields are all canonical, plus counts
/// describing what the rewrite did.
#[derive(Debug, Clone)]
pub struct NormalizedCorpus {
    pub corpus: QueryCorpus,
    /// Distinct raw identifiers seen across the corpus.
    pub distinct_identifiers: usize,
    /// Identifiers rewritten to a different canonical form.
    pub rewritten: usize,
    /// Identifiers the oracle marked unresolved (kept raw).
    pub unresolved: usize,
}

fn rewrite(curie: &Curie, table: &HashMap<Curie, Resolution>) -> Curie {
    match table.get(curie) {
        Some(Some(clique)) => clique.canonical.clone(),
        // Unresolved or (unreachably) unseen: keep the raw identifier.
        _ => curie.clone(),
    }
}

fn rewrite_all(curies: &[Curie], table: &HashMap<Curie, Resolution>) -> Vec<Curie> {
    curies.iter().map(|c| rewrite(c, table)).collect()
}

fn rewrite_query(query: &Query, table: &HashMap<Curie, Resolution>) -> Query {
    Query {
        id: query.id.clone(),
        start_label: query.start_label.clone(),
        start_curies: rewrite_all(&query.start_curies, table),
        end_label: query.end_label.clone(),
        end_curies: rewrite_all(&query.end_curies, table),
        expected_nodes: query
            .expected_nodes
            .iter()
            .map(|(label, curies)| (label.clone(), rewrite_all(curies, table)))
            .collect(),
    }
}

fn rewrite_record(record: &PathRecord, table: &HashMap<Curie, Resolution>) -> PathRecord {
    PathRecord {
        labels: record.labels.clone(),
        nodes: rewrite_all(&record.nodes, table),
        categories: record
            .categories
            .iter()
            .map(|c| fold_category_label(c).to_string())
            .collect(),
        hop_predicates: record.hop_predicates.clone(),
        num_paths: record.num_paths,
        has_gene: record.has_gene,
    }
}

/// Rewrite every identifier-bearing field of `corpus` to canonical form,
/// and fold node type labels to their canonical equivalence labels.
///
/// Fails whole (no partial corpus) if the corpus is invalid or the oracle
/// batch fails. Idempotent: resolving an already-canonical corpus changes
/// nothing, since a canonical identifier resolves to itself.
pub fn resolve_corpus<O: NormalizationOracle>(
    corpus: &QueryCorpus,
    normalizer: &Normalizer<O>,
) -> Result<NormalizedCorpus, NormalizeError> {
    corpus.validate()?;

    // Pass 1: collect.
    let distinct = corpus.distinct_identifiers();
    let distinct_identifiers = distinct.len();

    // One batch call for everything.
    let table = normalizer.resolve_all(&distinct)?;

    let rewritten = table
        .iter()
        .filter(|(raw, res)| matches!(res, Some(clique) if clique.canonical != **raw))
        .count();
    let unresolved = table.values().filter(|res| res.is_none()).count();
    info!(
        distinct_identifiers,
        rewritten, unresolved, "resolved corpus identifiers"
    );

    // Pass 2: rewrite by lookup.
    let queries = corpus.queries.iter().map(|q| rewrite_query(q, &table)).collect();
    let paths = corpus
        .paths
        .iter()
        .map(|(query_id, records)| {
            let records = records.iter().map(|r| rewrite_record(r, &table)).collect();
            (query_id.clone(), records)
        })
        .collect();

    Ok(NormalizedCorpus {
        corpus: QueryCorpus { queries, paths },
        distinct_identifiers,
        rewritten,
        unresolved,
    })
}
