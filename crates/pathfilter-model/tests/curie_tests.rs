use pathfilter_model::{is_valid_curie, parse_concatenated, parse_path_curies, Curie};

fn strs(curies: &[Curie]) -> Vec<&str> {
    curies.iter().map(|c| c.as_str()).collect()
}

#[test]
fn valid_curie_shapes() {
    assert!(is_valid_curie("CHEBI:31690"));
    assert!(is_valid_curie("UNII:7SE5582Q2P"));
    assert!(is_valid_curie("UniProtKB:P04637"));
    assert!(is_valid_curie("A1BG.x_y-z:123"));
}

#[test]
fn invalid_curie_shapes() {
    assert!(!is_valid_curie(""));
    assert!(!is_valid_curie("no_colon"));
    assert!(!is_valid_curie("two:colons:here"));
    assert!(!is_valid_curie(":123"));
    assert!(!is_valid_curie("CHEBI:"));
    assert!(!is_valid_curie("chebi:31690"));
    assert!(!is_valid_curie("CHEBI:316 90"));
}

#[test]
fn parse_rejects_malformed() {
    assert!(Curie::parse("CHEBI:31690").is_ok());
    assert!(Curie::parse("not a curie").is_err());
}

#[test]
fn parse_trims_whitespace() {
    let c = Curie::parse("  CHEBI:31690 ").unwrap();
    assert_eq!(c.as_str(), "CHEBI:31690");
    assert_eq!(c.prefix(), "CHEBI");
    assert_eq!(c.local(), "31690");
}

#[test]
fn single_curie() {
    assert_eq!(strs(&parse_concatenated("CHEBI:31690")), ["CHEBI:31690"]);
}

#[test]
fn two_mondo_curies_run_together() {
    assert_eq!(
        strs(&parse_concatenated("MONDO:0004979MONDO:0004784")),
        ["MONDO:0004979", "MONDO:0004784"]
    );
}

#[test]
fn mixed_prefixes_run_together() {
    assert_eq!(
        strs(&parse_concatenated("CHEBI:18295PR:000049994")),
        ["CHEBI:18295", "PR:000049994"]
    );
}

#[test]
fn uppercase_local_part_after_boundary() {
    assert_eq!(
        strs(&parse_concatenated("NCBIGene:3815NCIT:C39712")),
        ["NCBIGene:3815", "NCIT:C39712"]
    );
}

#[test]
fn repeated_prefix_run_together() {
    assert_eq!(
        strs(&parse_concatenated("NCBIGene:54716NCBIGene:27240")),
        ["NCBIGene:54716", "NCBIGene:27240"]
    );
}

#[test]
fn long_concatenation() {
    assert_eq!(
        strs(&parse_concatenated(
            "NCBIGene:22983NCBIGene:23139NCBIGene:23031NCBIGene:375449"
        )),
        ["NCBIGene:22983", "NCBIGene:23139", "NCBIGene:23031", "NCBIGene:375449"]
    );
}

#[test]
fn ensembl_locals_with_embedded_uppercase() {
    assert_eq!(
        strs(&parse_concatenated(
            "ENSEMBL:ENSG00000229666ENSEMBL:ENSG00000269145"
        )),
        ["ENSEMBL:ENSG00000229666", "ENSEMBL:ENSG00000269145"]
    );
}

#[test]
fn alphanumeric_local_not_split() {
    assert_eq!(strs(&parse_concatenated("UNII:7SE5582Q2P")), ["UNII:7SE5582Q2P"]);
}

#[test]
fn chv_and_umls_prefixes() {
    assert_eq!(
        strs(&parse_concatenated("CHV:0000014716NCBIGene:3815")),
        ["CHV:0000014716", "NCBIGene:3815"]
    );
    assert_eq!(
        strs(&parse_concatenated("NCBIGene:4254UMLS:C4743026")),
        ["NCBIGene:4254", "UMLS:C4743026"]
    );
}

#[test]
fn blank_cells_yield_nothing() {
    assert!(parse_concatenated("").is_empty());
    assert!(parse_concatenated("   ").is_empty());
    assert!(parse_concatenated("nan").is_empty());
}

#[test]
fn annotated_cell_with_glued_prefix() {
    assert_eq!(
        strs(&parse_concatenated(
            "NCBIGene:2739 -> human geneAraPort:AT3G14420 -> Arabidopsis gene"
        )),
        ["NCBIGene:2739", "AraPort:AT3G14420"]
    );
}

#[test]
fn annotated_cell_rescues_known_prefix() {
    assert_eq!(
        strs(&parse_concatenated("RNFT2NCBIGene:84900 -> some gene")),
        ["NCBIGene:84900"]
    );
}

#[test]
fn path_cells_split_on_arrow() {
    let nodes = parse_path_curies(
        "CHEBI:15647 --> NCBIGene:100133941 --> NCBIGene:4907 --> UNII:31YO63LBSN",
    )
    .unwrap();
    assert_eq!(
        strs(&nodes),
        ["CHEBI:15647", "NCBIGene:100133941", "NCBIGene:4907", "UNII:31YO63LBSN"]
    );
}

#[test]
fn path_cells_tolerate_extra_whitespace() {
    let nodes =
        parse_path_curies("CHEBI:15647  -->  NCBIGene:100133941  -->  UNII:31YO63LBSN").unwrap();
    assert_eq!(strs(&nodes), ["CHEBI:15647", "NCBIGene:100133941", "UNII:31YO63LBSN"]);
}

#[test]
fn path_cells_fail_on_malformed_node() {
    assert!(parse_path_curies("CHEBI:15647 --> not a curie").is_err());
}

#[test]
fn empty_path_cell() {
    assert!(parse_path_curies("").unwrap().is_empty());
}

#[test]
fn curie_serde_round_trip() {
    let c = Curie::parse("MONDO:0004979").unwrap();
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "\"MONDO:0004979\"");
    let back: Curie = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
}

#[test]
fn curie_serde_rejects_malformed() {
    assert!(serde_json::from_str::<Curie>("\"garbage\"").is_err());
}
