//! The normalization oracle: batch `CURIE -> equivalence clique` lookups.
//!
//! [`NodeNormClient`] talks to an SRI node-normalizer-compatible HTTP
//! endpoint. Conflation flags are fixed and always on: gene/protein and
//! drug/chemical conflation is what makes a path node and a curated
//! expected node land in the same clique, and turning it off silently
//! reintroduces the false-negative class this system exists to eliminate.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use pathfilter_model::Curie;

use crate::{EquivalenceClique, NormalizeError, Resolution};

/// Default public endpoint of the SRI node normalizer.
pub const DEFAULT_ORACLE_URL: &str = "https://nodenormalization-sri.renci.org/get_normalized_nodes";

/// Default request ceiling before the client chunks a batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Batch resolution of raw identifiers to equivalence cliques.
///
/// The returned map carries one entry per *requested* identifier:
/// `Some(clique)` or the oracle's explicit unresolved marker (`None`).
/// A response missing a requested identifier is a partial result and must
/// fail the whole batch.
pub trait NormalizationOracle {
    fn resolve(&self, curies: &[Curie]) -> Result<HashMap<Curie, Resolution>, NormalizeError>;
}

impl<T: NormalizationOracle + ?Sized> NormalizationOracle for &T {
    fn resolve(&self, curies: &[Curie]) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
        (**self).resolve(curies)
    }
}

#[derive(Serialize)]
struct NodeNormRequest<'a> {
    curies: &'a [&'a str],
    conflate: bool,
    drug_chemical_conflate: bool,
}

#[derive(Deserialize)]
struct NodeNormEntry {
    id: NodeNormId,
    #[serde(default, rename = "type")]
    types: Vec<String>,
    #[serde(default)]
    information_content: Option<f64>,
}

#[derive(Deserialize)]
struct NodeNormId {
    identifier: String,
    #[serde(default)]
    label: Option<String>,
}

/// HTTP client for the node normalization service.
pub struct NodeNormClient {
    client: reqwest::blocking::Client,
    url: String,
    batch_size: usize,
}

impl NodeNormClient {
    pub fn new(url: impl Into<String>, batch_size: usize) -> Self {
        Self {
            client: reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
            url: url.into(),
            batch_size: batch_size.max(1),
        }
    }

    fn resolve_chunk(&self, chunk: &[Curie]) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
        let unavailable = |reason: String| NormalizeError::OracleUnavailable { reason };

        let curie_strs: Vec<&str> = chunk.iter().map(Curie::as_str).collect();
        let request = NodeNormRequest {
            curies: &curie_strs,
            conflate: true,
            drug_chemical_conflate: true,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| unavailable(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("{} returned {status}", self.url)));
        }
        let mut body: HashMap<String, Option<NodeNormEntry>> = response
            .json()
            .map_err(|e| unavailable(format!("unparseable response: {e}")))?;

        let mut out = HashMap::with_capacity(chunk.len());
        for curie in chunk {
            let Some(entry) = body.remove(curie.as_str()) else {
                // Partial responses fail the batch; guessing would fabricate
                // canonical ids for the missing identifiers.
                return Err(unavailable(format!(
                    "partial response: no entry for {curie}"
                )));
            };
            let resolution = match entry {
                None => None,
                Some(entry) => {
                    let canonical = Curie::parse(&entry.id.identifier).map_err(|_| {
                        unavailable(format!(
                            "oracle returned malformed canonical id `{}` for {curie}",
                            entry.id.identifier
                        ))
                    })?;
                    Some(EquivalenceClique {
                        canonical,
                        label: entry.id.label,
                        types: entry.types,
                        information_content: entry.information_content,
                    })
                }
            };
            out.insert(curie.clone(), resolution);
        }
        Ok(out)
    }
}

impl Default for NodeNormClient {
    fn default() -> Self {
        Self::new(DEFAULT_ORACLE_URL, DEFAULT_BATCH_SIZE)
    }
}

impl NormalizationOracle for NodeNormClient {
    /// Resolve a batch, chunking deterministically when it exceeds the
    /// service's ceiling: input is sorted, chunks are contiguous, results
    /// merge in order. Any failed chunk fails the whole batch.
    fn resolve(&self, curies: &[Curie]) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
        if curies.is_empty() {
            return Ok(HashMap::new());
        }
        let mut sorted: Vec<Curie> = curies.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut out = HashMap::with_capacity(sorted.len());
        for chunk in sorted.chunks(self.batch_size) {
            debug!(chunk_len = chunk.len(), url = %self.url, "resolving chunk");
            out.extend(self.resolve_chunk(chunk)?);
        }
        Ok(out)
    }
}
