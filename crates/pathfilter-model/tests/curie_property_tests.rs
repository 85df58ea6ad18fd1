use proptest::prelude::*;

use pathfilter_model::{is_valid_curie, parse_path_curies, Curie};

fn prefix_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9._-]{0,8}"
}

fn local_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._-]{1,12}"
}

proptest! {
    #[test]
    fn well_formed_curies_round_trip(prefix in prefix_strategy(), local in local_strategy()) {
        let raw = format!("{prefix}:{local}");
        prop_assert!(is_valid_curie(&raw));
        let curie = Curie::parse(&raw).unwrap();
        prop_assert_eq!(curie.as_str(), raw.as_str());
        prop_assert_eq!(curie.prefix(), prefix.as_str());
        prop_assert_eq!(curie.local(), local.as_str());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed(prefix in prefix_strategy(), local in local_strategy()) {
        let raw = format!("  {prefix}:{local}\t");
        let trimmed = format!("{prefix}:{local}");
        let curie = Curie::parse(&raw).unwrap();
        prop_assert_eq!(curie.as_str(), trimmed.as_str());
    }

    #[test]
    fn extra_colons_are_rejected(
        prefix in prefix_strategy(),
        mid in local_strategy(),
        local in local_strategy(),
    ) {
        let raw = format!("{prefix}:{mid}:{local}");
        prop_assert!(Curie::parse(&raw).is_err());
    }

    #[test]
    fn path_cells_split_losslessly(
        curies in prop::collection::vec(
            (prefix_strategy(), local_strategy()).prop_map(|(p, l)| format!("{p}:{l}")),
            1..6,
        ),
    ) {
        let cell = curies.join(" --> ");
        let parsed = parse_path_curies(&cell).unwrap();
        let strs: Vec<&str> = parsed.iter().map(Curie::as_str).collect();
        prop_assert_eq!(strs, curies.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
