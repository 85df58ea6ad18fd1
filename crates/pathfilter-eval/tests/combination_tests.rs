use std::collections::BTreeSet;

use roaring::RoaringBitmap;

use pathfilter_eval::{
    combination_label, CombinationEvaluator, EvalError, Filter, FilterContext, FilterRegistry,
    NodeCharacteristics,
};
use pathfilter_model::{Curie, PathRecord};

fn curie(s: &str) -> Curie {
    Curie::parse(s).unwrap()
}

fn record(nodes: &[&str], categories: &[&str], hops: &[&[&str]]) -> PathRecord {
    PathRecord {
        labels: nodes.join(" -> "),
        nodes: nodes.iter().map(|n| curie(n)).collect(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        hop_predicates: hops
            .iter()
            .map(|hop| hop.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>())
            .collect(),
        num_paths: 1,
        has_gene: false,
    }
}

fn plain_record(tag: usize) -> PathRecord {
    record(
        &["CHEBI:1", &format!("NCBIGene:{tag}"), "MONDO:1"],
        &["biolink:SmallMolecule", "biolink:Gene", "biolink:Disease"],
        &[&["biolink:affects"], &["biolink:treats"]],
    )
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn ctx() -> FilterContext<'static> {
    FilterContext {
        query_id: "Q1",
        characteristics: None,
    }
}

#[test]
fn structural_sweep_produces_every_subset() {
    let registry = FilterRegistry::with_structural();
    let paths: Vec<PathRecord> = (0..5).map(plain_record).collect();
    let selection = names(&["no_expression", "no_related_to", "no_abab"]);

    let mut evaluator = CombinationEvaluator::new(&registry, &selection, &ctx(), &paths).unwrap();
    let results = evaluator.enumerate(None);
    assert_eq!(results.len(), 8);
    assert_eq!(results[0].label(), "none");
    // Every subset appears exactly once.
    let labels: BTreeSet<String> = results.iter().map(|r| r.label()).collect();
    assert_eq!(labels.len(), 8);
}

#[test]
fn pair_survivors_equal_the_intersection() {
    // Ten paths; one tainted by an expression hop, a disjoint one by a
    // bare related_to hop.
    let mut paths: Vec<PathRecord> = (0..10).map(plain_record).collect();
    paths[2].hop_predicates[0] = BTreeSet::from(["biolink:expressed_in".to_string()]);
    paths[7].hop_predicates[1] = BTreeSet::from(["biolink:related_to".to_string()]);

    let registry = FilterRegistry::with_structural();
    let selection = names(&["no_expression", "no_related_to"]);
    let mut evaluator = CombinationEvaluator::new(&registry, &selection, &ctx(), &paths).unwrap();

    let f1 = evaluator.filter_survivors("no_expression").unwrap().clone();
    let f2 = evaluator.filter_survivors("no_related_to").unwrap().clone();
    assert_eq!(f1.len(), 9);
    assert_eq!(f2.len(), 9);

    let pair = evaluator
        .combination(&names(&["no_expression", "no_related_to"]))
        .unwrap();
    assert_eq!(pair.survivors, &f1 & &f2);
    assert_eq!(pair.kept_records, 8);
}

#[test]
fn empty_combination_keeps_the_universe() {
    let registry = FilterRegistry::with_structural();
    let paths: Vec<PathRecord> = (0..4).map(plain_record).collect();
    let mut evaluator =
        CombinationEvaluator::new(&registry, &names(&["no_abab"]), &ctx(), &paths).unwrap();

    let empty = evaluator.combination(&BTreeSet::new()).unwrap();
    let mut universe = RoaringBitmap::new();
    universe.insert_range(0..4);
    assert_eq!(empty.survivors, universe);
    assert_eq!(empty.label(), "none");
}

#[test]
fn node_filters_multiply_instead_of_combining() {
    let mut registry = FilterRegistry::with_structural();
    registry.register(Filter::max_degree(100));
    registry.register(Filter::max_degree(1000));

    let chars = NodeCharacteristics::new();
    let local_ctx = FilterContext {
        query_id: "Q1",
        characteristics: Some(&chars),
    };
    let paths: Vec<PathRecord> = (0..3).map(plain_record).collect();
    let selection = names(&["no_expression", "no_abab", "max_degree_100", "max_degree_1000"]);
    let mut evaluator =
        CombinationEvaluator::new(&registry, &selection, &local_ctx, &paths).unwrap();

    // 2^2 structural subsets, each bare or with exactly one node filter.
    let results = evaluator.enumerate(None);
    assert_eq!(results.len(), 4 * 3);
    assert!(results.iter().all(|r| {
        let nodes = r
            .members
            .iter()
            .filter(|m| m.starts_with("max_degree"))
            .count();
        nodes <= 1
    }));
}

#[test]
fn two_node_filters_in_one_combination_are_rejected() {
    let mut registry = FilterRegistry::with_structural();
    registry.register(Filter::max_degree(100));
    registry.register(Filter::max_path_count(500));

    let requested = names(&["max_degree_100", "max_path_count_500"]);
    // Rejected by the registry pre-scan.
    let err = registry.validate_combination(&requested).unwrap_err();
    assert!(matches!(err, EvalError::ExclusiveNodeFilters { .. }));

    // And by the evaluator, before any intersection.
    let paths: Vec<PathRecord> = (0..3).map(plain_record).collect();
    let chars = NodeCharacteristics::new();
    let local_ctx = FilterContext {
        query_id: "Q1",
        characteristics: Some(&chars),
    };
    let mut evaluator =
        CombinationEvaluator::new(&registry, &requested, &local_ctx, &paths).unwrap();
    assert!(matches!(
        evaluator.combination(&requested),
        Err(EvalError::ExclusiveNodeFilters { .. })
    ));
}

#[test]
fn unknown_filter_is_rejected_before_any_scan() {
    let registry = FilterRegistry::with_structural();
    let paths: Vec<PathRecord> = (0..2).map(plain_record).collect();
    let err = CombinationEvaluator::new(&registry, &names(&["no_such_filter"]), &ctx(), &paths)
        .unwrap_err();
    assert!(matches!(err, EvalError::UnknownFilter(name) if name == "no_such_filter"));
}

#[test]
fn max_size_caps_enumeration() {
    let registry = FilterRegistry::with_structural();
    let paths: Vec<PathRecord> = (0..2).map(plain_record).collect();
    let selection = names(&["no_expression", "no_related_to", "no_abab"]);
    let mut evaluator = CombinationEvaluator::new(&registry, &selection, &ctx(), &paths).unwrap();

    let results = evaluator.enumerate(Some(1));
    // Empty plus the three singletons.
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.members.len() <= 1));
}

#[test]
fn labels_are_sorted_and_joined() {
    assert_eq!(combination_label(&BTreeSet::new()), "none");
    assert_eq!(
        combination_label(&names(&["no_related_to", "no_abab"])),
        "no_abab+no_related_to"
    );
}

#[test]
fn weighted_counts_track_multiplicity() {
    let mut paths: Vec<PathRecord> = (0..3).map(plain_record).collect();
    paths[0].num_paths = 10;
    paths[1].hop_predicates[0] = BTreeSet::from(["biolink:expressed_in".to_string()]);

    let registry = FilterRegistry::with_structural();
    let mut evaluator =
        CombinationEvaluator::new(&registry, &names(&["no_expression"]), &ctx(), &paths).unwrap();
    let result = evaluator.combination(&names(&["no_expression"])).unwrap();
    assert_eq!(result.kept_records, 2);
    assert_eq!(result.kept_weight, 11);
}
