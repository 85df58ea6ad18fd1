//! Auxiliary per-node characteristics consumed by node filters.
//!
//! An external pipeline step computes, for the nodes appearing in each
//! query's paths, their graph degree, information content, and per-query
//! path count, and hands them over as a TSV table. The table is optional:
//! without it, node-characteristic filters are simply not offered.
//!
//! Lookups default in the maximally permissive direction. A node missing
//! from the table must never manufacture a rejection: missing information
//! content reads as highly specific, missing degree and path count read as
//! zero.

use ahash::AHashMap;

use pathfilter_model::Curie;

use crate::EvalError;

/// Information content assumed for nodes absent from the table.
pub const DEFAULT_INFORMATION_CONTENT: f64 = 100.0;

/// Per-node characteristics: `(query, node) -> {degree, specificity}`.
///
/// Degree and information content are global per node; path counts are
/// query-specific.
#[derive(Debug, Default, Clone)]
pub struct NodeCharacteristics {
    information_content: AHashMap<Curie, f64>,
    degree: AHashMap<Curie, u64>,
    path_count: AHashMap<(String, Curie), u64>,
}

impl NodeCharacteristics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the collaborator's TSV export. Expected header columns:
    /// `CURIE`, `Query`, `Information_content`, `Node_degree`, `Path_Count`.
    /// Empty cells are simply absent measurements.
    pub fn from_tsv(text: &str) -> Result<Self, EvalError> {
        let mut lines = text.lines().enumerate();
        let (_, header) = lines.next().ok_or(EvalError::Characteristics {
            line: 0,
            reason: "empty table".to_string(),
        })?;
        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
        let col = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| EvalError::Characteristics {
                    line: 1,
                    reason: format!("missing column `{name}`"),
                })
        };
        let curie_col = col("CURIE")?;
        let query_col = col("Query")?;
        let ic_col = col("Information_content")?;
        let degree_col = col("Node_degree")?;
        let count_col = col("Path_Count")?;

        let mut out = Self::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let field = |i: usize| fields.get(i).copied().unwrap_or("");

            let node = Curie::parse(field(curie_col)).map_err(|e| EvalError::Characteristics {
                line: line_no,
                reason: e.to_string(),
            })?;
            let query = field(query_col).to_string();

            let parse_err = |what: &str, value: &str| EvalError::Characteristics {
                line: line_no,
                reason: format!("unparseable {what} `{value}`"),
            };
            let ic_cell = field(ic_col);
            if !ic_cell.is_empty() {
                let ic = ic_cell
                    .parse::<f64>()
                    .map_err(|_| parse_err("information content", ic_cell))?;
                out.information_content.entry(node.clone()).or_insert(ic);
            }
            let degree_cell = field(degree_col);
            if !degree_cell.is_empty() {
                let degree = degree_cell
                    .parse::<u64>()
                    .map_err(|_| parse_err("degree", degree_cell))?;
                out.degree.entry(node.clone()).or_insert(degree);
            }
            let count_cell = field(count_col);
            if !count_cell.is_empty() {
                let count = count_cell
                    .parse::<u64>()
                    .map_err(|_| parse_err("path count", count_cell))?;
                out.path_count.insert((query, node), count);
            }
        }
        Ok(out)
    }

    pub fn set_information_content(&mut self, node: Curie, ic: f64) {
        self.information_content.insert(node, ic);
    }

    pub fn set_degree(&mut self, node: Curie, degree: u64) {
        self.degree.insert(node, degree);
    }

    pub fn set_path_count(&mut self, query: impl Into<String>, node: Curie, count: u64) {
        self.path_count.insert((query.into(), node), count);
    }

    /// Information content; missing reads as highly specific.
    pub fn information_content(&self, node: &Curie) -> f64 {
        self.information_content
            .get(node)
            .copied()
            .unwrap_or(DEFAULT_INFORMATION_CONTENT)
    }

    /// Graph degree; missing reads as unconnected.
    pub fn degree(&self, node: &Curie) -> u64 {
        self.degree.get(node).copied().unwrap_or(0)
    }

    /// Per-query path count; missing reads as zero.
    pub fn path_count(&self, query: &str, node: &Curie) -> u64 {
        self.path_count
            .get(&(query.to_string(), node.clone()))
            .copied()
            .unwrap_or(0)
    }
}
