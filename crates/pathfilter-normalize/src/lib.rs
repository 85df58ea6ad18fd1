//! Identifier normalization for the PathFilter pipeline.
//!
//! Biomedical knowledge graphs name one concept many ways (`MESH:D014867`
//! and `CHEBI:15377` are both water). Comparing path nodes against expected
//! answer nodes is only correct after every identifier has been rewritten to
//! the *preferred* member of its equivalence clique, as judged by an
//! external normalization service.
//!
//! Pieces, leaves first:
//!
//! - [`oracle::NormalizationOracle`]: the batch `CURIE -> clique` lookup,
//!   with [`oracle::NodeNormClient`] as the HTTP implementation
//! - [`cache::CliqueCache`]: an explicit, injectable memo of oracle answers
//!   with optional on-disk persistence between runs
//! - [`Normalizer`]: oracle + cache, deduplicating so an identifier is
//!   resolved at most once per process
//! - [`resolver::resolve_corpus`]: the two-pass collect-then-rewrite step
//!   that turns one oracle call per path into one call per corpus
//!
//! Failure is all-or-nothing: a malformed identifier or an unreachable
//! oracle aborts the whole normalization pass. No partial corpus is ever
//! handed downstream, and no canonical id is ever fabricated.

pub mod cache;
pub mod oracle;
pub mod resolver;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pathfilter_model::{Curie, ModelError};

pub use cache::CliqueCache;
pub use oracle::{NodeNormClient, NormalizationOracle, DEFAULT_BATCH_SIZE, DEFAULT_ORACLE_URL};
pub use resolver::{resolve_corpus, NormalizedCorpus};

/// The set of raw identifiers an oracle judges to denote one concept.
///
/// Immutable once fetched; keyed by its canonical (preferred) identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceClique {
    /// The preferred member of the clique.
    pub canonical: Curie,
    /// Preferred human-readable label, when the oracle knows one.
    #[serde(default)]
    pub label: Option<String>,
    /// Biolink types, most specific first.
    #[serde(default)]
    pub types: Vec<String>,
    /// Specificity score (information content); higher is more specific.
    #[serde(default)]
    pub information_content: Option<f64>,
}

/// Errors from the normalization subsystem.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Carried through from identifier validation; fails the whole batch.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The oracle could not be reached, or returned a partial or
    /// unusable response. Never retried against stale cache state.
    #[error("normalization oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    /// The on-disk cache could not be read or written.
    #[error("cache file {path}: {source}")]
    CachePersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The on-disk cache exists but does not parse.
    #[error("cache file {path} is corrupt: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolution outcome for one raw identifier: its clique, or the oracle's
/// explicit unresolved marker.
pub type Resolution = Option<EquivalenceClique>;

/// Batch normalizer: an oracle behind a process-lifetime cache.
///
/// The cache is required for the one-batch-call contract, not merely an
/// optimization: resolving an already-seen identifier must not issue a
/// second oracle call even across separate `resolve_all` invocations.
pub struct Normalizer<O> {
    oracle: O,
    cache: CliqueCache,
}

impl<O: NormalizationOracle> Normalizer<O> {
    pub fn new(oracle: O, cache: CliqueCache) -> Self {
        Self { oracle, cache }
    }

    /// Resolve every identifier in `curies`, consulting the oracle only for
    /// identifiers the cache has never seen. The oracle is called at most
    /// once (its implementation may chunk internally).
    pub fn resolve_all(
        &self,
        curies: &BTreeSet<Curie>,
    ) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
        self.cache.resolve_through(&self.oracle, curies)
    }

    /// Canonical form of a single already-resolved identifier, from cache
    /// only. `None` when the identifier has not been resolved this run.
    pub fn cached_canonical(&self, curie: &Curie) -> Option<Curie> {
        self.cache
            .get(curie)
            .flatten()
            .map(|clique| clique.canonical)
    }

    pub fn cache(&self) -> &CliqueCache {
        &self.cache
    }

    /// Hand the cache back, e.g. to persist it after a run.
    pub fn into_cache(self) -> CliqueCache {
        self.cache
    }
}
