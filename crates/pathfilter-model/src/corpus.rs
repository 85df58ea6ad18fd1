//! Queries, path records, and the evaluation corpus.
//!
//! The corpus arrives already parsed (spreadsheet ingestion is an external
//! collaborator); this module owns the in-memory shape and load-time
//! validation. Records are immutable after load.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::curie::Curie;
use crate::types::TypeClass;
use crate::ModelError;

/// A test query: fixed start/end concepts plus the curated expected
/// intermediate nodes a good path should visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Stable query id, e.g. `PFTQ-1-c`.
    pub id: String,
    pub start_label: String,
    pub start_curies: Vec<Curie>,
    pub end_label: String,
    pub end_curies: Vec<Curie>,
    /// Expected node label -> identifiers. Built only from curated rows
    /// that carried an explicit identifier.
    #[serde(default)]
    pub expected_nodes: BTreeMap<String, Vec<Curie>>,
}

impl Query {
    /// All expected-node identifiers, flattened.
    pub fn expected_node_set(&self) -> BTreeSet<Curie> {
        self.expected_nodes.values().flatten().cloned().collect()
    }

    /// A query with no expected nodes is inert: recall and precision are
    /// undefined for it and it is excluded from cross-query aggregates.
    pub fn is_inert(&self) -> bool {
        self.expected_nodes.values().all(|v| v.is_empty())
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.start_curies.is_empty() || self.end_curies.is_empty() {
            return Err(ModelError::InvalidRecord {
                context: self.id.clone(),
                reason: "query is missing start or end identifiers".to_string(),
            });
        }
        Ok(())
    }
}

/// One aggregated path between a query's start and end concepts.
///
/// A record stands for `num_paths` underlying graph paths sharing the same
/// node sequence; metrics weight by that multiplicity unless configured
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    /// Human-readable node labels, e.g. `asthma -> Artenimol -> ATG12 -> Imatinib`.
    pub labels: String,
    /// Node identifiers in path order.
    pub nodes: Vec<Curie>,
    /// Biolink category per node, parallel to `nodes`.
    pub categories: Vec<String>,
    /// Predicate set per hop; `hop_predicates.len() == nodes.len() - 1`.
    pub hop_predicates: Vec<BTreeSet<String>>,
    /// How many underlying graph paths this record aggregates.
    pub num_paths: u64,
    /// Whether an intermediate gene appears on the path.
    #[serde(default)]
    pub has_gene: bool,
}

impl PathRecord {
    pub fn validate(&self, context: &str) -> Result<(), ModelError> {
        let fail = |reason: String| ModelError::InvalidRecord {
            context: context.to_string(),
            reason,
        };
        if self.nodes.is_empty() {
            return Err(fail("path has no nodes".to_string()));
        }
        if self.categories.len() != self.nodes.len() {
            return Err(fail(format!(
                "{} categories for {} nodes",
                self.categories.len(),
                self.nodes.len()
            )));
        }
        if self.hop_predicates.len() != self.nodes.len() - 1 {
            return Err(fail(format!(
                "{} hop predicate sets for {} nodes",
                self.hop_predicates.len(),
                self.nodes.len()
            )));
        }
        if self.num_paths == 0 {
            return Err(fail("num_paths must be positive".to_string()));
        }
        Ok(())
    }

    /// Intermediate nodes: everything but the query-fixed endpoints.
    pub fn intermediate_nodes(&self) -> &[Curie] {
        let len = self.nodes.len();
        if len <= 2 {
            &[]
        } else {
            &self.nodes[1..len - 1]
        }
    }

    /// Folded type sequence (chemical/gene fold).
    pub fn folded_types(&self) -> Vec<TypeClass<'_>> {
        self.categories.iter().map(|c| TypeClass::fold(c)).collect()
    }

    /// Does this path visit any of the given nodes?
    pub fn contains_any(&self, nodes: &BTreeSet<Curie>) -> bool {
        self.nodes.iter().any(|n| nodes.contains(n))
    }
}

/// The full evaluation corpus: queries plus their path records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryCorpus {
    pub queries: Vec<Query>,
    /// Query id -> path records loaded for that query.
    pub paths: BTreeMap<String, Vec<PathRecord>>,
}

impl QueryCorpus {
    /// Validate every query and record; fails on the first broken one.
    pub fn validate(&self) -> Result<(), ModelError> {
        for query in &self.queries {
            query.validate()?;
        }
        for (query_id, records) in &self.paths {
            for (i, record) in records.iter().enumerate() {
                record.validate(&format!("{query_id}[{i}]"))?;
            }
        }
        Ok(())
    }

    pub fn paths_for(&self, query_id: &str) -> &[PathRecord] {
        self.paths.get(query_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every distinct identifier appearing anywhere in the corpus: query
    /// start/end/expected sets and every path node. This is the set the
    /// equivalence resolver sends to the normalizer in one batch.
    pub fn distinct_identifiers(&self) -> BTreeSet<Curie> {
        let mut out = BTreeSet::new();
        for query in &self.queries {
            out.extend(query.start_curies.iter().cloned());
            out.extend(query.end_curies.iter().cloned());
            for curies in query.expected_nodes.values() {
                out.extend(curies.iter().cloned());
            }
        }
        for records in self.paths.values() {
            for record in records {
                out.extend(record.nodes.iter().cloned());
            }
        }
        out
    }
}
