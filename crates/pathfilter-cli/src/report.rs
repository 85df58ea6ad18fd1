//! Result table IO and console rendering.
//!
//! The flat result table is TSV, one row per (query, combination). An
//! undefined metric is written as the literal `NA`, never as a number, and
//! read back as [`Metric::NotApplicable`].

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use pathfilter_eval::{BestCombination, CellCounts, Metric, MetricsRow};

const COLUMNS: &[&str] = &[
    "query",
    "combination",
    "filter_count",
    "paths_total",
    "paths_kept",
    "expected_total",
    "expected_kept",
    "nodes_total",
    "nodes_kept",
    "recall",
    "precision",
    "enrichment",
    "retention_rate",
    "expected_node_recall",
];

pub fn render_rows(rows: &[MetricsRow]) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.join("\t"));
    out.push('\n');
    for row in rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.query_id,
            row.combination,
            row.filter_count,
            row.counts.paths_total,
            row.counts.paths_kept,
            row.counts.expected_total,
            row.counts.expected_kept,
            row.counts.nodes_total,
            row.counts.nodes_kept,
            row.recall,
            row.precision,
            row.enrichment,
            row.retention_rate,
            row.expected_node_recall,
        );
    }
    out
}

pub fn write_rows(path: &Path, rows: &[MetricsRow]) -> Result<()> {
    fs::write(path, render_rows(rows))
        .with_context(|| format!("writing results to {}", path.display()))
}

pub fn read_rows(path: &Path) -> Result<Vec<MetricsRow>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading results from {}", path.display()))?;
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().context("empty results file")?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let col = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .with_context(|| format!("results file missing column `{name}`"))
    };
    let idx: Vec<usize> = COLUMNS.iter().map(|name| col(name)).collect::<Result<_>>()?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < columns.len() {
            bail!("results line {}: truncated row", line_no + 1);
        }
        let field = |slot: usize| fields[idx[slot]];
        let int = |slot: usize| -> Result<u64> {
            field(slot)
                .parse()
                .with_context(|| format!("results line {}: bad count `{}`", line_no + 1, field(slot)))
        };
        let metric = |slot: usize| -> Result<Metric> {
            field(slot)
                .parse()
                .with_context(|| format!("results line {}: bad metric `{}`", line_no + 1, field(slot)))
        };
        rows.push(MetricsRow {
            query_id: field(0).to_string(),
            combination: field(1).to_string(),
            filter_count: int(2)? as usize,
            counts: CellCounts {
                paths_total: int(3)?,
                paths_kept: int(4)?,
                expected_total: int(5)?,
                expected_kept: int(6)?,
                nodes_total: int(7)?,
                nodes_kept: int(8)?,
            },
            recall: metric(9)?,
            precision: metric(10)?,
            enrichment: metric(11)?,
            retention_rate: metric(12)?,
            expected_node_recall: metric(13)?,
        });
    }
    Ok(rows)
}

fn metric_cell(metric: Metric) -> String {
    match metric.value() {
        Some(v) => format!("{v:.4}"),
        None => "NA".dimmed().to_string(),
    }
}

/// Compact per-query console table, for small result sets.
pub fn print_rows(rows: &[MetricsRow]) {
    println!(
        "{:<12} {:<40} {:>12} {:>8} {:>10} {:>10} {:>10}",
        "query".bold(),
        "combination".bold(),
        "kept/total".bold(),
        "recall".bold(),
        "precision".bold(),
        "enrichment".bold(),
        "retention".bold(),
    );
    for row in rows {
        println!(
            "{:<12} {:<40} {:>5}/{:<6} {:>8} {:>10} {:>10} {:>10}",
            row.query_id,
            row.combination,
            row.counts.paths_kept,
            row.counts.paths_total,
            metric_cell(row.recall),
            metric_cell(row.precision),
            metric_cell(row.enrichment),
            metric_cell(row.retention_rate),
        );
    }
}

pub fn render_best(best: &[BestCombination]) -> String {
    let mut out = String::from("query\tbest_combination\tenrichment\trecall\n");
    for row in best {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            row.query_id, row.combination, row.enrichment, row.recall
        );
    }
    out
}

pub fn print_best(best: &[BestCombination]) {
    println!(
        "{:<12} {:<40} {:>10} {:>8}",
        "query".bold(),
        "best combination".bold(),
        "enrichment".bold(),
        "recall".bold(),
    );
    for row in best {
        let combination = if row.combination == "none" {
            row.combination.yellow().to_string()
        } else {
            row.combination.green().to_string()
        };
        println!(
            "{:<12} {:<40} {:>10} {:>8}",
            row.query_id,
            combination,
            metric_cell(row.enrichment),
            metric_cell(row.recall),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> MetricsRow {
        MetricsRow {
            query_id: "Q1".to_string(),
            combination: "no_expression".to_string(),
            filter_count: 1,
            counts: CellCounts {
                paths_total: 10,
                paths_kept: 8,
                expected_total: 4,
                expected_kept: 3,
                nodes_total: 2,
                nodes_kept: 2,
            },
            recall: Metric::Value(0.75),
            precision: Metric::Value(0.375),
            enrichment: Metric::NotApplicable,
            retention_rate: Metric::Value(0.8),
            expected_node_recall: Metric::Value(1.0),
        }
    }

    #[test]
    fn tsv_round_trips_including_the_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.tsv");
        let rows = vec![sample_row()];
        write_rows(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\tNA\t"));

        let back = read_rows(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.tsv");
        fs::write(&path, "query\tcombination\nQ1\tnone\n").unwrap();
        assert!(read_rows(&path).is_err());
    }
}
