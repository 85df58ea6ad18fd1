//! The filter registry: named, stateless predicates over path records.
//!
//! Filters split into two categories:
//!
//! - **Path-structural**: decide from fields intrinsic to the record (type
//!   sequence, hop predicates, position).
//! - **Node-characteristic**: threshold families over the auxiliary
//!   [`NodeCharacteristics`](crate::NodeCharacteristics) table, restricted
//!   to intermediate node positions. Endpoints are query-fixed; filtering
//!   on them would vacuously change the query.
//!
//! Node-characteristic filters are mutually exclusive with each other in a
//! combination (two degree ceilings mean nothing together); the combination
//! evaluator enforces this via [`Filter::category`] before enumerating.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use pathfilter_model::{PathRecord, TypeClass};

use crate::characteristics::NodeCharacteristics;
use crate::EvalError;

/// What a filter looks at, and therefore how it combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    PathStructural,
    NodeCharacteristic,
}

/// Per-query inputs a predicate may consult beyond the record itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub query_id: &'a str,
    pub characteristics: Option<&'a NodeCharacteristics>,
}

/// Tagged predicate dispatch; each variant is one filter's semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Folded node types pairwise distinct.
    NoDupeTypes,
    /// Folded non-gene types pairwise distinct; gene may repeat.
    NoDupeButGene,
    /// No strict 2-periodic A-B-A-B alternation (disease/phenotype folded).
    NoAbab,
    /// Repeated folded types may only occupy adjacent positions.
    NoNonconsecutiveDupe,
    /// No hop uses an `expressed_in` predicate.
    NoExpression,
    /// No hop collapses to the bare generic `related_to` predicate.
    NoRelatedTo,
    /// Path does not end phenotype -> chemical.
    NoEndPheno,
    /// Path does not start disease -> chemical.
    NoChemicalStart,
    /// No predicate appears in more than one hop.
    NoRepeatPredicates,
    /// Every intermediate node at least this specific.
    MinInformationContent { threshold: f64 },
    /// Every intermediate node at most this connected.
    MaxDegree { threshold: u64 },
    /// Every intermediate node on at most this many of the query's paths.
    MaxPathCount { threshold: u64 },
}

/// A named, pure predicate over a single path record.
#[derive(Debug, Clone)]
pub struct Filter {
    name: String,
    kind: FilterKind,
}

fn all_distinct<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, a)| items[i + 1..].iter().all(|b| a != b))
}

/// Every repeated value occupies adjacent positions only.
fn repeats_are_consecutive<T: PartialEq>(items: &[T]) -> bool {
    for (i, item) in items.iter().enumerate() {
        for (j, other) in items.iter().enumerate().skip(i + 2) {
            if item == other && items[i..j].iter().any(|mid| mid != item) {
                return false;
            }
        }
    }
    true
}

impl Filter {
    fn new(name: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn no_dupe_types() -> Self {
        Self::new("no_dupe_types", FilterKind::NoDupeTypes)
    }
    pub fn no_dupe_but_gene() -> Self {
        Self::new("no_dupe_but_gene", FilterKind::NoDupeButGene)
    }
    pub fn no_abab() -> Self {
        Self::new("no_abab", FilterKind::NoAbab)
    }
    pub fn no_nonconsecutive_dupe() -> Self {
        Self::new("no_nonconsecutive_dupe", FilterKind::NoNonconsecutiveDupe)
    }
    pub fn no_expression() -> Self {
        Self::new("no_expression", FilterKind::NoExpression)
    }
    pub fn no_related_to() -> Self {
        Self::new("no_related_to", FilterKind::NoRelatedTo)
    }
    pub fn no_end_pheno() -> Self {
        Self::new("no_end_pheno", FilterKind::NoEndPheno)
    }
    pub fn no_chemical_start() -> Self {
        Self::new("no_chemical_start", FilterKind::NoChemicalStart)
    }
    pub fn no_repeat_predicates() -> Self {
        Self::new("no_repeat_predicates", FilterKind::NoRepeatPredicates)
    }

    pub fn min_information_content(threshold: f64) -> Self {
        Self::new(
            format!("min_ic_{}", threshold.trunc() as i64),
            FilterKind::MinInformationContent { threshold },
        )
    }
    pub fn max_degree(threshold: u64) -> Self {
        Self::new(
            format!("max_degree_{threshold}"),
            FilterKind::MaxDegree { threshold },
        )
    }
    pub fn max_path_count(threshold: u64) -> Self {
        Self::new(
            format!("max_path_count_{threshold}"),
            FilterKind::MaxPathCount { threshold },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn category(&self) -> FilterCategory {
        match self.kind {
            FilterKind::MinInformationContent { .. }
            | FilterKind::MaxDegree { .. }
            | FilterKind::MaxPathCount { .. } => FilterCategory::NodeCharacteristic,
            _ => FilterCategory::PathStructural,
        }
    }

    /// Does this filter keep `path`?
    pub fn keeps(&self, path: &PathRecord, ctx: &FilterContext<'_>) -> bool {
        match &self.kind {
            FilterKind::NoDupeTypes => all_distinct(&path.folded_types()),
            FilterKind::NoDupeButGene => {
                let non_gene: Vec<TypeClass<'_>> = path
                    .folded_types()
                    .into_iter()
                    .filter(|t| *t != TypeClass::Gene)
                    .collect();
                all_distinct(&non_gene)
            }
            FilterKind::NoAbab => {
                let classes: Vec<TypeClass<'_>> = path
                    .categories
                    .iter()
                    .map(|c| TypeClass::fold_with_disease(c))
                    .collect();
                let [a, b, c, d] = classes.as_slice() else {
                    return true;
                };
                !(a == c && b == d && a != b)
            }
            FilterKind::NoNonconsecutiveDupe => repeats_are_consecutive(&path.folded_types()),
            FilterKind::NoExpression => !path
                .hop_predicates
                .iter()
                .flatten()
                .any(|p| p.contains("expressed_in")),
            FilterKind::NoRelatedTo => !path
                .hop_predicates
                .iter()
                .any(|hop| hop.len() == 1 && hop.contains("biolink:related_to")),
            FilterKind::NoEndPheno => {
                let n = path.categories.len();
                if n < 2 {
                    return true;
                }
                !(path.categories[n - 2] == "biolink:PhenotypicFeature"
                    && TypeClass::fold(&path.categories[n - 1]) == TypeClass::Chemical)
            }
            FilterKind::NoChemicalStart => {
                let [first, second, ..] = path.categories.as_slice() else {
                    return true;
                };
                !(first == "biolink:Disease" && TypeClass::fold(second) == TypeClass::Chemical)
            }
            FilterKind::NoRepeatPredicates => {
                let mut seen = BTreeSet::new();
                path.hop_predicates
                    .iter()
                    .flatten()
                    .all(|p| seen.insert(p.as_str()))
            }
            FilterKind::MinInformationContent { threshold } => {
                let Some(chars) = ctx.characteristics else {
                    return true;
                };
                path.intermediate_nodes()
                    .iter()
                    .all(|n| chars.information_content(n) >= *threshold)
            }
            FilterKind::MaxDegree { threshold } => {
                let Some(chars) = ctx.characteristics else {
                    return true;
                };
                path.intermediate_nodes()
                    .iter()
                    .all(|n| chars.degree(n) <= *threshold)
            }
            FilterKind::MaxPathCount { threshold } => {
                let Some(chars) = ctx.characteristics else {
                    return true;
                };
                path.intermediate_nodes()
                    .iter()
                    .all(|n| chars.path_count(ctx.query_id, n) <= *threshold)
            }
        }
    }
}

/// Name -> filter lookup, plus selection validation.
#[derive(Debug, Default, Clone)]
pub struct FilterRegistry {
    filters: BTreeMap<String, Filter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every path-structural filter.
    pub fn with_structural() -> Self {
        let mut out = Self::new();
        for filter in [
            Filter::no_dupe_types(),
            Filter::no_dupe_but_gene(),
            Filter::no_abab(),
            Filter::no_nonconsecutive_dupe(),
            Filter::no_expression(),
            Filter::no_related_to(),
            Filter::no_end_pheno(),
            Filter::no_chemical_start(),
            Filter::no_repeat_predicates(),
        ] {
            out.register(filter);
        }
        out
    }

    pub fn register(&mut self, filter: Filter) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The default sweep: every registered filter except the deliberately
    /// aggressive `no_chemical_start`, which is offered by name only.
    pub fn default_sweep(&self) -> BTreeSet<String> {
        self.filters
            .keys()
            .filter(|name| *name != "no_chemical_start")
            .cloned()
            .collect()
    }

    /// Reject unknown names. A selection may hold several node filters;
    /// they are alternatives across combinations, not companions.
    pub fn validate_names(&self, names: &BTreeSet<String>) -> Result<(), EvalError> {
        for name in names {
            if self.get(name).is_none() {
                return Err(EvalError::UnknownFilter(name.clone()));
            }
        }
        Ok(())
    }

    /// Reject unknown names and mutually exclusive node filters in one
    /// explicitly requested combination, before any corpus scan happens.
    pub fn validate_combination(&self, names: &BTreeSet<String>) -> Result<(), EvalError> {
        self.validate_names(names)?;
        let mut node_filter: Option<&str> = None;
        for name in names {
            let filter = self.get(name).expect("validated above");
            if filter.category() == FilterCategory::NodeCharacteristic {
                if let Some(first) = node_filter {
                    return Err(EvalError::ExclusiveNodeFilters {
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
                node_filter = Some(name);
            }
        }
        Ok(())
    }
}
