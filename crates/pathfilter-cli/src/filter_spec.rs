//! Parsing of the `--filters` argument.
//!
//! Accepted forms:
//! - `all-combinations` (the default): sweep every admissible subset of the
//!   registry's default selection.
//! - A `|`-separated list of strategies, each of which is `default`,
//!   `strict`, `none`, or a comma-separated list of filter names; each
//!   strategy is evaluated as one explicit combination.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};

use pathfilter_eval::FilterRegistry;

/// The canonical starter strategy.
const DEFAULT_STRATEGY: &[&str] = &["no_dupe_types", "no_expression", "no_related_to"];

/// `default` plus the phenotype-ending cut.
const STRICT_STRATEGY: &[&str] = &["no_dupe_types", "no_expression", "no_related_to", "no_end_pheno"];

/// What the evaluate command should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPlan {
    /// Enumerate every admissible combination of the selection.
    Sweep(BTreeSet<String>),
    /// Evaluate exactly these combinations.
    Strategies(Vec<BTreeSet<String>>),
}

fn named_strategy(spec: &str) -> Option<BTreeSet<String>> {
    let members: &[&str] = match spec {
        "default" => DEFAULT_STRATEGY,
        "strict" => STRICT_STRATEGY,
        "none" | "all_paths" => &[],
        _ => return None,
    };
    Some(members.iter().map(|s| s.to_string()).collect())
}

pub fn parse_filter_spec(spec: &str, registry: &FilterRegistry) -> Result<FilterPlan> {
    let spec = spec.trim();
    if spec.is_empty() {
        bail!("empty --filters specification");
    }
    if spec == "all-combinations" || spec == "all_combinations" {
        return Ok(FilterPlan::Sweep(registry.default_sweep()));
    }

    let mut strategies = Vec::new();
    for part in spec.split('|') {
        let part = part.trim();
        let members = match named_strategy(part) {
            Some(members) => members,
            None => part
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        };
        registry.validate_combination(&members).with_context(|| {
            let available: Vec<&str> = registry.names().collect();
            format!(
                "invalid strategy `{part}` (available filters: {}, plus default, strict, none)",
                available.join(", ")
            )
        })?;
        strategies.push(members);
    }
    Ok(FilterPlan::Strategies(strategies))
}
