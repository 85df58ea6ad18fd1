//! PathFilter data model.
//!
//! Shared types for the filter-evaluation pipeline:
//!
//! - [`Curie`]: validated compact identifiers (`PREFIX:LOCAL`), plus the
//!   parsers that recover identifiers from messy spreadsheet cells
//! - [`TypeClass`]: the fixed node-type equivalence folding that filters
//!   reason over (chemical subtypes collapse, protein folds into gene)
//! - [`Query`] / [`PathRecord`] / [`QueryCorpus`]: the evaluation corpus as
//!   handed over by the (out-of-scope) spreadsheet ingestion step
//!
//! Everything here is plain data: no I/O, no network. Upstream records that
//! fail validation are a load-time error ([`ModelError::InvalidRecord`]),
//! never a runtime filter concern.

pub mod corpus;
pub mod curie;
pub mod types;

use thiserror::Error;

pub use corpus::{PathRecord, Query, QueryCorpus};
pub use curie::{is_valid_curie, parse_concatenated, parse_path_curies, Curie};
pub use types::{fold_category_label, TypeClass};

/// Errors raised while building or validating the data model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An identifier that is not a well-formed `PREFIX:LOCAL` CURIE.
    ///
    /// Malformed identifiers fail the operation that saw them; they are
    /// never silently dropped.
    #[error("malformed identifier `{0}`: not a valid CURIE")]
    MalformedIdentifier(String),

    /// A structurally invalid record from the upstream corpus source.
    #[error("invalid record for `{context}`: {reason}")]
    InvalidRecord { context: String, reason: String },
}
