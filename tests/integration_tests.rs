//! Integration tests for the complete path filtering pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - JSON corpus → Equivalence Resolver → canonical corpus
//! - Canonical corpus → Combination Evaluator → result rows
//! - Result rows → best combination per query
//!
//! Run with: cargo test --test integration_tests

use std::collections::{BTreeSet, HashMap};

use approx::assert_relative_eq;
use tempfile::tempdir;

use pathfilter_eval::{
    best_combinations, evaluate_corpus, EvalConfig, FilterRegistry, Metric,
};
use pathfilter_model::{Curie, QueryCorpus};
use pathfilter_normalize::{
    resolve_corpus, CliqueCache, EquivalenceClique, NormalizationOracle, NormalizeError,
    Normalizer, Resolution,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Raw corpus as it would arrive on disk: synonym identifiers in the paths,
/// canonical ones in the query expectations.
const RAW_CORPUS: &str = r#"{
  "queries": [
    {
      "id": "PFTQ-1-c",
      "start_label": "imatinib",
      "start_curies": ["CHEBI:31690"],
      "end_label": "asthma",
      "end_curies": ["MONDO:0004979"],
      "expected_nodes": {
        "Histamine": ["CHEBI:18295"],
        "KIT": ["NCBIGene:3815"]
      }
    }
  ],
  "paths": {
    "PFTQ-1-c": [
      {
        "labels": "imatinib -> histamine -> asthma",
        "nodes": ["CHEBI:31690", "MESH:D006632", "MONDO:0004979"],
        "categories": ["biolink:SmallMolecule", "biolink:SmallMolecule", "biolink:Disease"],
        "hop_predicates": [["biolink:affects"], ["biolink:treats"]],
        "num_paths": 2,
        "has_gene": false
      },
      {
        "labels": "imatinib -> KIT -> asthma",
        "nodes": ["CHEBI:31690", "PR:000009716", "MONDO:0004979"],
        "categories": ["biolink:SmallMolecule", "biolink:Protein", "biolink:Disease"],
        "hop_predicates": [["biolink:interacts_with"], ["biolink:related_to"]],
        "num_paths": 1,
        "has_gene": true
      },
      {
        "labels": "imatinib -> lung -> asthma",
        "nodes": ["CHEBI:31690", "UBERON:0002048", "MONDO:0004979"],
        "categories": ["biolink:SmallMolecule", "biolink:GrossAnatomicalStructure", "biolink:Disease"],
        "hop_predicates": [["biolink:related_to"], ["biolink:related_to"]],
        "num_paths": 4,
        "has_gene": false
      }
    ]
  }
}"#;

/// Fixed synonym table standing in for the normalization service.
struct TableOracle {
    synonyms: HashMap<&'static str, &'static str>,
}

impl TableOracle {
    fn new() -> Self {
        Self {
            synonyms: HashMap::from([
                ("MESH:D006632", "CHEBI:18295"),
                ("PR:000009716", "NCBIGene:3815"),
            ]),
        }
    }
}

impl NormalizationOracle for TableOracle {
    fn resolve(&self, curies: &[Curie]) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
        let mut out = HashMap::new();
        for curie in curies {
            let canonical = self
                .synonyms
                .get(curie.as_str())
                .copied()
                .unwrap_or(curie.as_str());
            out.insert(
                curie.clone(),
                Some(EquivalenceClique {
                    canonical: Curie::parse(canonical).map_err(|_| {
                        NormalizeError::OracleUnavailable {
                            reason: "bad canonical id".to_string(),
                        }
                    })?,
                    label: None,
                    types: vec!["biolink:NamedThing".to_string()],
                    information_content: None,
                }),
            );
        }
        Ok(out)
    }
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Raw JSON → canonical corpus → sweep → best combination
// ============================================================================

#[test]
fn full_pipeline_from_raw_json_to_best_combination() {
    let corpus: QueryCorpus = serde_json::from_str(RAW_CORPUS).unwrap();
    let normalizer = Normalizer::new(TableOracle::new(), CliqueCache::new());
    let normalized = resolve_corpus(&corpus, &normalizer).unwrap();

    // The synonym paths now match the expected nodes directly.
    let paths = &normalized.corpus.paths["PFTQ-1-c"];
    assert_eq!(paths[0].nodes[1], Curie::parse("CHEBI:18295").unwrap());
    assert_eq!(paths[1].nodes[1], Curie::parse("NCBIGene:3815").unwrap());

    let registry = FilterRegistry::with_structural();
    let rows = evaluate_corpus(
        &normalized.corpus,
        &registry,
        &names(&["no_related_to"]),
        None,
        &EvalConfig::default(),
    )
    .unwrap();
    assert_eq!(rows.len(), 2);

    // Weighted counts: 7 path instances, 3 of them on expected nodes.
    let baseline = &rows[0];
    assert_eq!(baseline.combination, "none");
    assert_eq!(baseline.counts.paths_total, 7);
    assert_eq!(baseline.counts.expected_total, 3);
    assert_eq!(baseline.recall, Metric::Value(1.0));

    // Both the lung path and the KIT path carry a bare related_to hop, so
    // only the histamine path survives.
    let filtered = &rows[1];
    assert_eq!(filtered.combination, "no_related_to");
    assert_eq!(filtered.counts.paths_kept, 2);
    assert_eq!(filtered.counts.expected_kept, 2);
    assert_eq!(filtered.precision, Metric::Value(1.0));
    // Precision moves from 3/7 to 1: enrichment 7/3.
    assert_relative_eq!(filtered.enrichment.value().unwrap(), 7.0 / 3.0);
    // KIT's only carrier path is gone.
    assert_eq!(filtered.counts.nodes_total, 2);
    assert_eq!(filtered.counts.nodes_kept, 1);

    let best = best_combinations(&rows);
    assert_eq!(best[0].combination, "no_related_to");
}

// ============================================================================
// Canonicalization is idempotent across a persisted cache
// ============================================================================

#[test]
fn persisted_cache_survives_a_second_run() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("cliques.json");

    let corpus: QueryCorpus = serde_json::from_str(RAW_CORPUS).unwrap();
    let normalizer = Normalizer::new(TableOracle::new(), CliqueCache::new());
    let first = resolve_corpus(&corpus, &normalizer).unwrap();
    assert!(first.rewritten > 0);
    normalizer.cache().save(&cache_path).unwrap();

    // Second run: warm cache, already-canonical corpus, zero rewrites,
    // and the oracle is never consulted.
    struct NeverOracle;
    impl NormalizationOracle for NeverOracle {
        fn resolve(
            &self,
            _curies: &[Curie],
        ) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
            Err(NormalizeError::OracleUnavailable {
                reason: "should not be called".to_string(),
            })
        }
    }
    let warm = Normalizer::new(NeverOracle, CliqueCache::load(&cache_path).unwrap());
    let second = resolve_corpus(&first.corpus, &warm).unwrap();
    assert_eq!(second.rewritten, 0);
    assert_eq!(
        serde_json::to_value(&first.corpus).unwrap(),
        serde_json::to_value(&second.corpus).unwrap()
    );
}

// ============================================================================
// Inert queries flow through the whole pipeline as not-applicable
// ============================================================================

#[test]
fn inert_query_yields_na_rows_end_to_end() {
    let mut corpus: QueryCorpus = serde_json::from_str(RAW_CORPUS).unwrap();
    corpus.queries[0].expected_nodes.clear();

    let normalizer = Normalizer::new(TableOracle::new(), CliqueCache::new());
    let normalized = resolve_corpus(&corpus, &normalizer).unwrap();

    let registry = FilterRegistry::with_structural();
    let rows = evaluate_corpus(
        &normalized.corpus,
        &registry,
        &names(&["no_related_to", "no_expression"]),
        None,
        &EvalConfig::default(),
    )
    .unwrap();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert_eq!(row.recall, Metric::NotApplicable);
        assert_eq!(row.precision, Metric::NotApplicable);
        assert!(row.retention_rate.is_applicable());
    }

    let best = best_combinations(&rows);
    assert_eq!(best[0].combination, "none");
    assert_eq!(best[0].enrichment, Metric::NotApplicable);
}
