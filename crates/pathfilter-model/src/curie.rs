//! CURIE parsing and validation.
//!
//! The query spreadsheets this corpus comes from are hand-curated, and the
//! identifier cells are messy: multiple CURIEs run together without a
//! delimiter (`MONDO:0004979MONDO:0004784`), and some cells interleave
//! free-text annotations with ` -> ` markers
//! (`NCBIGene:2739 -> human geneAraPort:AT3G14420 -> Arabidopsis gene`).
//!
//! [`parse_concatenated`] recovers the individual identifiers from such
//! cells. Path-node cells are cleaner and use an explicit ` --> ` separator;
//! [`parse_path_curies`] handles those and is strict.

use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Characters allowed in a CURIE prefix or local part.
fn is_curie_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Validate that a string is a properly formatted CURIE.
///
/// A valid CURIE has exactly one colon, a non-empty prefix starting with an
/// uppercase letter, a non-empty local part, and only `[A-Za-z0-9._-]` on
/// both sides.
pub fn is_valid_curie(s: &str) -> bool {
    let mut parts = s.splitn(2, ':');
    let (Some(prefix), Some(local)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.contains(':') {
        return false;
    }
    let Some(first) = prefix.chars().next() else {
        return false;
    };
    if !first.is_ascii_uppercase() || local.is_empty() {
        return false;
    }
    prefix.chars().all(is_curie_char) && local.chars().all(is_curie_char)
}

/// A validated compact identifier of the form `PREFIX:LOCAL`.
///
/// Downstream of the equivalence resolver, every `Curie` is the *preferred*
/// member of its equivalence clique; the type itself only guarantees the
/// syntactic shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Curie(String);

impl Curie {
    /// Parse and validate a CURIE string.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let trimmed = s.trim();
        if !is_valid_curie(trimmed) {
            return Err(ModelError::MalformedIdentifier(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace prefix (the part before the colon).
    pub fn prefix(&self) -> &str {
        self.0.split(':').next().unwrap_or("")
    }

    /// The local identifier (the part after the colon).
    pub fn local(&self) -> &str {
        self.0.splitn(2, ':').nth(1).unwrap_or("")
    }
}

impl fmt::Display for Curie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Curie {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Curie::parse(&value)
    }
}

impl From<Curie> for String {
    fn from(value: Curie) -> Self {
        value.0
    }
}

impl Borrow<str> for Curie {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Curie {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Prefixes we recognise when a cell glues annotation text directly onto a
/// CURIE (`RNFT2NCBIGene:123` really means `NCBIGene:123`).
const KNOWN_PREFIXES: &[&str] = &[
    "NCBIGene",
    "MONDO",
    "CHEBI",
    "UMLS",
    "GO",
    "PR",
    "UniProtKB",
    "ENSEMBL",
    "NCIT",
    "AraPort",
];

fn curie_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z][A-Za-z0-9._-]*:[A-Za-z0-9._-]+").expect("curie token re"))
}

fn curie_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z][A-Za-z0-9._-]*:").expect("curie prefix re"))
}

/// Boundary where a *new* CURIE prefix starts inside a run-together cell.
///
/// Local parts freely contain digits and isolated capitals, so the boundary
/// is deliberately stricter than a full prefix: an uppercase letter followed
/// by letters only, then a colon.
fn prefix_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z]*:").expect("prefix boundary re"))
}

/// Rescue a CURIE whose prefix has annotation text glued onto the front.
fn rescue_known_prefix(token: &str) -> String {
    let Some((prefix, local)) = token.split_once(':') else {
        return token.to_string();
    };
    for known in KNOWN_PREFIXES {
        if prefix.len() > known.len() && prefix.ends_with(known) {
            return format!("{known}:{local}");
        }
    }
    token.to_string()
}

/// Extract CURIEs from a cell that mixes ` -> ` annotation markers with
/// identifiers. Tokens must start the part or follow whitespace, a digit, or
/// a lowercase letter (so `geneAraPort:AT3G14420` yields `AraPort:AT3G14420`).
fn parse_annotated(cell: &str) -> Vec<Curie> {
    let re = curie_token_re();
    let mut out = Vec::new();
    for part in cell.split(" -> ") {
        for m in re.find_iter(part) {
            let ok_start = m.start() == 0
                || part[..m.start()]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_whitespace() || c.is_ascii_digit() || c.is_lowercase());
            if !ok_start {
                continue;
            }
            let token = rescue_known_prefix(m.as_str());
            if let Ok(curie) = Curie::parse(&token) {
                out.push(curie);
            }
        }
    }
    out
}

/// Parse a cell containing one or more concatenated CURIEs.
///
/// Invalid fragments are skipped (this parser is deliberately lenient: the
/// cells are curated free-form text, and dropping garbage here is the whole
/// point); strict validation belongs to [`Curie::parse`].
///
/// ```
/// use pathfilter_model::parse_concatenated;
///
/// let curies = parse_concatenated("MONDO:0004979MONDO:0004784");
/// let strs: Vec<&str> = curies.iter().map(|c| c.as_str()).collect();
/// assert_eq!(strs, ["MONDO:0004979", "MONDO:0004784"]);
/// ```
pub fn parse_concatenated(cell: &str) -> Vec<Curie> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Vec::new();
    }

    if cell.contains(" -> ") {
        let curies = parse_annotated(cell);
        if !curies.is_empty() {
            return curies;
        }
    }

    // Run-together cells: each CURIE's local part extends lazily until the
    // next prefix boundary or the end of the cell. A local part interrupted
    // by anything else is not a CURIE and the scan resumes one char later.
    let prefix_re = curie_prefix_re();
    let boundary_re = prefix_boundary_re();
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(m) = prefix_re.find_at(cell, pos) {
        let local_start = m.end();
        let mut end = local_start;
        let mut token_end = None;
        loop {
            if end > local_start && (end == cell.len() || boundary_re.is_match(&cell[end..])) {
                token_end = Some(end);
                break;
            }
            match cell[end..].chars().next() {
                Some(c) if is_curie_char(c) => end += c.len_utf8(),
                _ => break,
            }
        }
        match token_end {
            Some(end) => {
                if let Ok(curie) = Curie::parse(&cell[m.start()..end]) {
                    out.push(curie);
                }
                pos = end;
            }
            None => pos = m.start() + 1,
        }
    }
    out
}

/// Parse a path-node cell into its node CURIEs.
///
/// Path cells use an explicit ` --> ` separator and every entry must be a
/// well-formed CURIE; a malformed entry fails the whole cell.
pub fn parse_path_curies(cell: &str) -> Result<Vec<Curie>, ModelError> {
    cell.split(" --> ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Curie::parse)
        .collect()
}
