//! The clique cache: an explicit, injectable memo of oracle answers.
//!
//! Created at run start, optionally persisted to disk between runs, never
//! ambient/global state. Interior locking lets parallel per-query workers
//! share one cache without issuing duplicate oracle calls; in the normal
//! pipeline the cache is fully populated before any fan-out.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use tracing::{debug, info};

use pathfilter_model::Curie;

use crate::oracle::NormalizationOracle;
use crate::{NormalizeError, Resolution};

/// Memoized oracle answers, keyed by raw identifier. The unresolved marker
/// is cached too: an identifier the oracle does not know stays unknown for
/// the lifetime of the cache and is not re-asked.
#[derive(Default)]
pub struct CliqueCache {
    entries: RwLock<HashMap<Curie, Resolution>>,
}

impl CliqueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache persisted by [`CliqueCache::save`]. A missing file is
    /// an empty cache, not an error.
    pub fn load(path: &Path) -> Result<Self, NormalizeError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path).map_err(|source| NormalizeError::CachePersist {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: BTreeMap<Curie, Resolution> =
            serde_json::from_str(&text).map_err(|source| NormalizeError::CacheCorrupt {
                path: path.to_path_buf(),
                source,
            })?;
        info!(entries = entries.len(), path = %path.display(), "loaded clique cache");
        Ok(Self {
            entries: RwLock::new(entries.into_iter().collect()),
        })
    }

    /// Persist the cache as sorted JSON (stable across runs for diffing).
    pub fn save(&self, path: &Path) -> Result<(), NormalizeError> {
        let persist_err = |source| NormalizeError::CachePersist {
            path: path.to_path_buf(),
            source,
        };
        let entries = self.entries.read();
        let sorted: BTreeMap<&Curie, &Resolution> = entries.iter().collect();
        let text = serde_json::to_string_pretty(&sorted)
            .map_err(|e| persist_err(std::io::Error::other(e)))?;
        fs::write(path, text).map_err(persist_err)?;
        info!(entries = entries.len(), path = %path.display(), "saved clique cache");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, curie: &Curie) -> bool {
        self.entries.read().contains_key(curie)
    }

    /// Cached resolution for one identifier. Outer `None`: never resolved.
    /// Inner `None`: resolved, and the oracle marked it unresolved.
    pub fn get(&self, curie: &Curie) -> Option<Resolution> {
        self.entries.read().get(curie).cloned()
    }

    /// Resolve `curies`, consulting `oracle` only for cache misses.
    ///
    /// Misses are batched into a single oracle call; a failed call caches
    /// nothing. The hit/miss split holds a read lock only, so concurrent
    /// readers on a warm cache never contend.
    pub fn resolve_through<O: NormalizationOracle>(
        &self,
        oracle: &O,
        curies: &BTreeSet<Curie>,
    ) -> Result<HashMap<Curie, Resolution>, NormalizeError> {
        let mut out = HashMap::with_capacity(curies.len());
        let mut misses: Vec<Curie> = Vec::new();
        {
            let entries = self.entries.read();
            for curie in curies {
                match entries.get(curie) {
                    Some(resolution) => {
                        out.insert(curie.clone(), resolution.clone());
                    }
                    None => misses.push(curie.clone()),
                }
            }
        }
        debug!(hits = out.len(), misses = misses.len(), "clique cache lookup");

        if misses.is_empty() {
            return Ok(out);
        }

        let resolved = oracle.resolve(&misses)?;
        // The oracle contract guarantees one entry per requested id; enforce
        // it here so a buggy implementation cannot smuggle in a partial map.
        for miss in &misses {
            if !resolved.contains_key(miss) {
                return Err(NormalizeError::OracleUnavailable {
                    reason: format!("oracle dropped {miss} from its response"),
                });
            }
        }

        let mut entries = self.entries.write();
        for (curie, resolution) in resolved {
            entries.insert(curie.clone(), resolution.clone());
            out.insert(curie, resolution);
        }
        Ok(out)
    }
}
