//! The combination evaluator: every filter subset, one corpus scan total.
//!
//! All filters are pure AND-composable predicates, so the survivor set of a
//! combination equals the intersection of its constituent filters' survivor
//! sets, and the empty combination keeps everything. The evaluator exploits
//! that monotone algebra: it applies each filter to the corpus exactly once,
//! recording survivors as a Roaring bitmap of record indices, then derives
//! every combination by bitmap intersection. Cost is
//! O(paths x filters + combinations x filters); the naive
//! O(paths x filters x combinations) re-filtering is exactly what this
//! module exists to avoid, and predicates are never re-applied per
//! combination.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use roaring::RoaringBitmap;
use tracing::debug;

use pathfilter_model::PathRecord;

use crate::filters::{FilterCategory, FilterContext, FilterRegistry};
use crate::EvalError;

/// Display label for a combination: `none`, or sorted members joined by `+`.
pub fn combination_label(members: &BTreeSet<String>) -> String {
    if members.is_empty() {
        "none".to_string()
    } else {
        members.iter().cloned().collect::<Vec<_>>().join("+")
    }
}

/// Survivors of one filter combination over one query's paths.
#[derive(Debug, Clone)]
pub struct CombinationResult {
    pub members: BTreeSet<String>,
    /// Indices of surviving path records.
    pub survivors: RoaringBitmap,
    /// Surviving records, unweighted.
    pub kept_records: u64,
    /// Surviving records weighted by multiplicity.
    pub kept_weight: u64,
}

impl CombinationResult {
    pub fn label(&self) -> String {
        combination_label(&self.members)
    }
}

/// Per-query evaluator holding the per-filter survivor bitmaps.
#[derive(Debug)]
pub struct CombinationEvaluator {
    /// Full record index set (the empty combination's survivors).
    universe: RoaringBitmap,
    /// Record multiplicities, by index.
    weights: Vec<u64>,
    /// One survivor bitmap per selected filter, computed in a single pass.
    per_filter: BTreeMap<String, RoaringBitmap>,
    structural: Vec<String>,
    node: Vec<String>,
    memo: AHashMap<Vec<String>, RoaringBitmap>,
}

impl CombinationEvaluator {
    /// Apply each selected filter once over `paths`. This is the only place
    /// predicates run.
    pub fn new(
        registry: &FilterRegistry,
        selection: &BTreeSet<String>,
        ctx: &FilterContext<'_>,
        paths: &[PathRecord],
    ) -> Result<Self, EvalError> {
        registry.validate_names(selection)?;

        let mut universe = RoaringBitmap::new();
        universe.insert_range(0..paths.len() as u32);
        let weights = paths.iter().map(|p| p.num_paths).collect();

        let mut per_filter = BTreeMap::new();
        let mut structural = Vec::new();
        let mut node = Vec::new();
        for name in selection {
            let filter = registry.get(name).expect("validated above");
            match filter.category() {
                FilterCategory::PathStructural => structural.push(name.clone()),
                FilterCategory::NodeCharacteristic => node.push(name.clone()),
            }
            let mut survivors = RoaringBitmap::new();
            for (index, path) in paths.iter().enumerate() {
                if filter.keeps(path, ctx) {
                    survivors.insert(index as u32);
                }
            }
            debug!(
                filter = name.as_str(),
                query = ctx.query_id,
                kept = survivors.len(),
                total = paths.len(),
                "filter pass"
            );
            per_filter.insert(name.clone(), survivors);
        }

        Ok(Self {
            universe,
            weights,
            per_filter,
            structural,
            node,
            memo: AHashMap::new(),
        })
    }

    pub fn universe(&self) -> &RoaringBitmap {
        &self.universe
    }

    /// Survivor bitmap of a single filter, as computed by the initial pass.
    pub fn filter_survivors(&self, name: &str) -> Option<&RoaringBitmap> {
        self.per_filter.get(name)
    }

    fn weight_of(&self, survivors: &RoaringBitmap) -> u64 {
        survivors
            .iter()
            .map(|index| self.weights[index as usize])
            .sum()
    }

    fn intersect(&mut self, members: &BTreeSet<String>) -> RoaringBitmap {
        let key: Vec<String> = members.iter().cloned().collect();
        if let Some(hit) = self.memo.get(&key) {
            return hit.clone();
        }
        let mut survivors = self.universe.clone();
        for name in members {
            survivors &= &self.per_filter[name];
        }
        self.memo.insert(key, survivors.clone());
        survivors
    }

    fn result_for(&mut self, members: BTreeSet<String>) -> CombinationResult {
        let survivors = self.intersect(&members);
        let kept_records = survivors.len();
        let kept_weight = self.weight_of(&survivors);
        CombinationResult {
            members,
            survivors,
            kept_records,
            kept_weight,
        }
    }

    /// Survivors of one explicitly requested combination.
    ///
    /// Fails on unknown members or on two node filters together, before
    /// touching any bitmap.
    pub fn combination(
        &mut self,
        members: &BTreeSet<String>,
    ) -> Result<CombinationResult, EvalError> {
        let mut node_filter: Option<&str> = None;
        for name in members {
            if !self.per_filter.contains_key(name) {
                return Err(EvalError::UnknownFilter(name.clone()));
            }
            if self.node.iter().any(|n| n == name) {
                if let Some(first) = node_filter {
                    return Err(EvalError::ExclusiveNodeFilters {
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
                node_filter = Some(name);
            }
        }
        Ok(self.result_for(members.clone()))
    }

    /// Every admissible combination: each subset of the structural filters,
    /// alone and paired with each node filter in turn. Combinations with
    /// two node filters are never generated. The empty combination comes
    /// first; order is deterministic (size, then label).
    pub fn enumerate(&mut self, max_size: Option<usize>) -> Vec<CombinationResult> {
        let structural = self.structural.clone();
        let node = self.node.clone();
        let mut out = Vec::new();

        for mask in 0u64..(1u64 << structural.len()) {
            let mut members: BTreeSet<String> = structural
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| name.clone())
                .collect();

            if members.len() <= max_size.unwrap_or(usize::MAX) {
                out.push(self.result_for(members.clone()));
            }
            for node_name in &node {
                members.insert(node_name.clone());
                if members.len() <= max_size.unwrap_or(usize::MAX) {
                    out.push(self.result_for(members.clone()));
                }
                members.remove(node_name);
            }
        }

        out.sort_by(|a, b| {
            (a.members.len(), a.label()).cmp(&(b.members.len(), b.label()))
        });
        out
    }
}
