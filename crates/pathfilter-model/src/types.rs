//! Node-type equivalence folding.
//!
//! Filters reason over folded type classes, not raw biolink categories: the
//! graph labels chemically equivalent nodes with several subtypes, and a
//! gene and its protein product are one concept for filtering purposes.
//!
//! Two folding levels exist, matching what each filter needs:
//! - [`TypeClass::fold`]: chemical subtypes collapse, protein folds into
//!   gene. Used by the duplicate-type filters.
//! - [`TypeClass::fold_with_disease`]: additionally folds phenotypic
//!   features into the disease class. Used by the alternation filter,
//!   where `Disease -> Gene -> PhenotypicFeature -> Gene` is still the
//!   back-and-forth shape being rejected.

/// Biolink categories treated as one chemical class.
const CHEMICAL_CATEGORIES: &[&str] = &[
    "biolink:ChemicalEntity",
    "biolink:SmallMolecule",
    "biolink:MolecularMixture",
    "biolink:ComplexMolecularMixture",
];

/// A folded node-type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass<'a> {
    Chemical,
    Gene,
    DiseaseLike,
    Other(&'a str),
}

impl<'a> TypeClass<'a> {
    /// Chemical/gene folding. Disease and phenotype stay distinct here.
    pub fn fold(category: &'a str) -> Self {
        if CHEMICAL_CATEGORIES.contains(&category) {
            TypeClass::Chemical
        } else if category == "biolink:Gene" || category == "biolink:Protein" {
            TypeClass::Gene
        } else {
            TypeClass::Other(category)
        }
    }

    /// Chemical/gene folding plus disease/phenotype folding.
    pub fn fold_with_disease(category: &'a str) -> Self {
        if category == "biolink:Disease" || category == "biolink:PhenotypicFeature" {
            TypeClass::DiseaseLike
        } else {
            Self::fold(category)
        }
    }
}

/// Fold a raw biolink category label to its canonical folded label.
///
/// The equivalence resolver applies this once to every path record's type
/// sequence so downstream consumers see canonical labels; folding again is
/// a no-op.
pub fn fold_category_label(category: &str) -> &str {
    match TypeClass::fold(category) {
        TypeClass::Chemical => "biolink:ChemicalEntity",
        TypeClass::Gene => "biolink:Gene",
        TypeClass::DiseaseLike | TypeClass::Other(_) => category,
    }
}
