//! Path filter CLI
//!
//! Three-step workflow over a path corpus:
//! - `normalize`: rewrite every identifier in the corpus to its equivalence
//!   representative via the node normalization service, with a persistent
//!   clique cache.
//! - `evaluate`: sweep filter combinations over the canonical corpus and
//!   write the flat result table.
//! - `best`: reduce a result table to the winning combination per query.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use pathfilter_eval::{
    best_combinations, evaluate_corpus, evaluate_corpus_combinations, EvalConfig, Filter,
    FilterRegistry, NodeCharacteristics, Weighting,
};
use pathfilter_model::{PathRecord, Query, QueryCorpus};
use pathfilter_normalize::{
    resolve_corpus, CliqueCache, NodeNormClient, Normalizer, DEFAULT_BATCH_SIZE,
    DEFAULT_ORACLE_URL,
};

mod filter_spec;
mod report;

use filter_spec::FilterPlan;

#[derive(Parser)]
#[command(name = "pathfilter")]
#[command(
    author,
    version,
    about = "Normalize and evaluate path filtering strategies over a knowledge-graph path corpus"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a raw corpus to canonical identifiers via the normalization service.
    Normalize {
        /// Query definitions (JSON array of queries)
        #[arg(long)]
        queries: PathBuf,
        /// Path records (JSON object: query id -> array of path records)
        #[arg(long)]
        paths: PathBuf,
        /// Directory for the canonical corpus
        #[arg(long)]
        out_dir: PathBuf,
        /// Persistent clique cache file (loaded if present, saved after)
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Normalization service endpoint
        #[arg(long, default_value = DEFAULT_ORACLE_URL)]
        url: String,
        /// Identifiers per service request
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Sweep filter combinations over a canonical corpus.
    Evaluate {
        /// Canonical corpus (corpus.json, or the directory holding it)
        #[arg(long)]
        corpus: PathBuf,
        /// Evaluate a single query id instead of the whole corpus
        #[arg(long)]
        query: Option<String>,
        /// `all-combinations`, or `|`-separated strategies (`default`,
        /// `strict`, `none`, or comma-separated filter names)
        #[arg(long, default_value = "all-combinations")]
        filters: String,
        /// Node characteristics TSV; enables node-characteristic filters
        #[arg(long)]
        characteristics: Option<PathBuf>,
        /// Register a minimum information content filter (repeatable)
        #[arg(long = "min-ic")]
        min_ic: Vec<f64>,
        /// Register a maximum node degree filter (repeatable)
        #[arg(long = "max-degree")]
        max_degree: Vec<u64>,
        /// Register a maximum per-query path count filter (repeatable)
        #[arg(long = "max-path-count")]
        max_path_count: Vec<u64>,
        /// Cap on filters per combination
        #[arg(long)]
        max_size: Option<usize>,
        /// `weighted` counts each record by its path multiplicity
        #[arg(long, default_value = "weighted")]
        weighting: String,
        /// Result table (TSV); console table when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Reduce a result table to the best combination per query.
    Best {
        /// Result table from `evaluate`
        #[arg(long)]
        results: PathBuf,
        /// Best-combination table (TSV); console only when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize {
            queries,
            paths,
            out_dir,
            cache,
            url,
            batch_size,
        } => cmd_normalize(&queries, &paths, &out_dir, cache.as_deref(), &url, batch_size),
        Commands::Evaluate {
            corpus,
            query,
            filters,
            characteristics,
            min_ic,
            max_degree,
            max_path_count,
            max_size,
            weighting,
            out,
        } => cmd_evaluate(EvaluateArgs {
            corpus,
            query,
            filters,
            characteristics,
            min_ic,
            max_degree,
            max_path_count,
            max_size,
            weighting,
            out,
        }),
        Commands::Best { results, out } => cmd_best(&results, out.as_deref()),
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {what} from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {what} from {}", path.display()))
}

fn cmd_normalize(
    queries: &Path,
    paths: &Path,
    out_dir: &Path,
    cache_path: Option<&Path>,
    url: &str,
    batch_size: usize,
) -> Result<()> {
    let queries: Vec<Query> = load_json(queries, "query definitions")?;
    let paths: BTreeMap<String, Vec<PathRecord>> = load_json(paths, "path records")?;
    let corpus = QueryCorpus { queries, paths };

    let cache = match cache_path {
        Some(path) => CliqueCache::load(path)?,
        None => CliqueCache::new(),
    };
    let cached_before = cache.len();
    let client = NodeNormClient::new(url, batch_size);
    let normalizer = Normalizer::new(client, cache);

    let normalized = resolve_corpus(&corpus, &normalizer)?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let corpus_path = out_dir.join("corpus.json");
    let json = serde_json::to_string_pretty(&normalized.corpus)?;
    fs::write(&corpus_path, json)
        .with_context(|| format!("writing canonical corpus to {}", corpus_path.display()))?;

    if let Some(path) = cache_path {
        normalizer.cache().save(path)?;
    }

    println!("{}", "Normalization complete".green().bold());
    println!(
        "  {} distinct identifiers ({} already cached)",
        normalized.distinct_identifiers, cached_before
    );
    println!("  {} rewritten to canonical form", normalized.rewritten);
    if normalized.unresolved > 0 {
        println!(
            "  {}",
            format!("{} identifiers unknown to the service (kept raw)", normalized.unresolved)
                .yellow()
        );
    }
    println!("  canonical corpus: {}", corpus_path.display());
    Ok(())
}

struct EvaluateArgs {
    corpus: PathBuf,
    query: Option<String>,
    filters: String,
    characteristics: Option<PathBuf>,
    min_ic: Vec<f64>,
    max_degree: Vec<u64>,
    max_path_count: Vec<u64>,
    max_size: Option<usize>,
    weighting: String,
    out: Option<PathBuf>,
}

fn parse_weighting(arg: &str) -> Result<Weighting> {
    match arg {
        "weighted" => Ok(Weighting::Weighted),
        "unweighted" => Ok(Weighting::Unweighted),
        other => bail!("unknown weighting `{other}` (expected weighted or unweighted)"),
    }
}

fn cmd_evaluate(args: EvaluateArgs) -> Result<()> {
    let corpus_path = if args.corpus.is_dir() {
        args.corpus.join("corpus.json")
    } else {
        args.corpus.clone()
    };
    let mut corpus: QueryCorpus = load_json(&corpus_path, "canonical corpus")?;
    corpus.validate()?;

    if let Some(id) = &args.query {
        corpus.queries.retain(|q| &q.id == id);
        if corpus.queries.is_empty() {
            bail!("query {id} not found in {}", corpus_path.display());
        }
        corpus.paths.retain(|query_id, _| query_id == id);
    }

    let characteristics = args
        .characteristics
        .as_deref()
        .map(|path| -> Result<NodeCharacteristics> {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading characteristics from {}", path.display()))?;
            Ok(NodeCharacteristics::from_tsv(&text)?)
        })
        .transpose()?;

    let mut registry = FilterRegistry::with_structural();
    let node_thresholds =
        !args.min_ic.is_empty() || !args.max_degree.is_empty() || !args.max_path_count.is_empty();
    if node_thresholds && characteristics.is_none() {
        bail!("node filter thresholds require --characteristics");
    }
    for threshold in &args.min_ic {
        registry.register(Filter::min_information_content(*threshold));
    }
    for threshold in &args.max_degree {
        registry.register(Filter::max_degree(*threshold));
    }
    for threshold in &args.max_path_count {
        registry.register(Filter::max_path_count(*threshold));
    }

    let plan = filter_spec::parse_filter_spec(&args.filters, &registry)?;
    let config = EvalConfig {
        weighting: parse_weighting(&args.weighting)?,
        max_combination_size: args.max_size,
    };

    let rows = match &plan {
        FilterPlan::Sweep(selection) => evaluate_corpus(
            &corpus,
            &registry,
            selection,
            characteristics.as_ref(),
            &config,
        )?,
        FilterPlan::Strategies(strategies) => evaluate_corpus_combinations(
            &corpus,
            &registry,
            strategies,
            characteristics.as_ref(),
            &config,
        )?,
    };

    let inert = corpus.queries.iter().filter(|q| q.is_inert()).count();
    println!(
        "{}",
        format!(
            "Evaluated {} queries, {} result rows",
            corpus.queries.len(),
            rows.len()
        )
        .green()
        .bold()
    );
    if inert > 0 {
        println!(
            "  {}",
            format!("{inert} queries have no expected nodes; their recall/precision are NA")
                .yellow()
        );
    }

    match &args.out {
        Some(path) => {
            report::write_rows(path, &rows)?;
            println!("  results: {}", path.display());
        }
        None => report::print_rows(&rows),
    }
    Ok(())
}

fn cmd_best(results: &Path, out: Option<&Path>) -> Result<()> {
    let rows = report::read_rows(results)?;
    if rows.is_empty() {
        return Err(anyhow!("no result rows in {}", results.display()));
    }
    let best = best_combinations(&rows);

    if let Some(path) = out {
        fs::write(path, report::render_best(&best))
            .with_context(|| format!("writing best combinations to {}", path.display()))?;
        println!("  best combinations: {}", path.display());
    }
    report::print_best(&best);

    let applicable: Vec<f64> = best.iter().filter_map(|b| b.enrichment.value()).collect();
    if !applicable.is_empty() {
        let mean = applicable.iter().sum::<f64>() / applicable.len() as f64;
        println!();
        println!(
            "{} queries, mean best enrichment {:.4}",
            applicable.len(),
            mean
        );
    }
    Ok(())
}
