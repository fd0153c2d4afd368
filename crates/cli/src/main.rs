//! # code-atlas
//!
//! Command-line front end for the index pipeline: `build` turns a repository
//! into a published index directory, `search` queries one and writes a trace
//! of how each result earned its place.

mod config;
mod provider;
mod scan;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use atlas_indexer::IndexBuilder;
use atlas_model::BuildReport;
use atlas_search::{Ranker, SearchIndex, TraceAssembler};
use atlas_store::write_json;

#[derive(Parser)]
#[command(name = "code-atlas", version, about = "Hierarchical code index and search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a repository into a queryable artifact directory.
    Build {
        /// Repository root to index.
        repo: PathBuf,
        /// Directory the index is published into.
        #[arg(long, default_value = "./index")]
        out: PathBuf,
        /// Summarizer model, overriding config and environment.
        #[arg(long)]
        model: Option<String>,
        /// Whether nodes are enriched with generated summaries.
        #[arg(long, value_enum, default_value_t = Summaries::Off)]
        summaries: Summaries,
        /// Explicit config file instead of ./code-atlas.toml.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Query a published index.
    Search {
        /// Natural-language or keyword query.
        query: String,
        /// Index directory produced by `build`.
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        /// Number of results to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Summaries {
    On,
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            repo,
            out,
            model,
            summaries,
            config,
        } => run_build(&repo, &out, model, summaries, config.as_deref()).await,
        Commands::Search { query, index, top } => run_search(&query, &index, top),
    }
}

async fn run_build(
    repo: &Path,
    out: &Path,
    model: Option<String>,
    summaries: Summaries,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let mut config = config::load(config_path)?;
    if let Some(model) = model {
        config.model = model;
    }

    let repo = repo
        .canonicalize()
        .with_context(|| format!("repository {} not found", repo.display()))?;
    let repo_name = repo
        .file_name()
        .map_or_else(|| "repo".to_string(), |name| name.to_string_lossy().into_owned());

    let sources = scan::scan_repository(&repo)?;
    println!("Scanning {}: {} source files", repo.display(), sources.len());

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, finishing in-flight work");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let bar = ProgressBar::new(sources.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} files")?);
    let progress = bar.clone();

    let mut builder = IndexBuilder::new(config.clone())
        .with_progress(Arc::new(move |done, _total| progress.set_position(done as u64)));
    if summaries == Summaries::On {
        let provider = provider::OpenAiProvider::from_env(&config.model)?;
        builder = builder.with_provider(Arc::new(provider));
    }

    let report = builder.build(&repo_name, sources, out, cancel.as_ref()).await?;
    bar.finish_and_clear();
    print_report(&report, out);
    Ok(())
}

fn print_report(report: &BuildReport, out: &Path) {
    println!(
        "Files:     {} indexed, {} degraded, {} skipped",
        report.files_indexed, report.files_degraded, report.files_skipped
    );
    println!(
        "Graph:     {} nodes, {} edges ({} resolved, {} ambiguous, {} unknown)",
        report.nodes,
        report.edges,
        report.resolved_edges,
        report.ambiguous_edges,
        report.not_found_edges
    );
    if report.callsite_cap_hits > 0 {
        println!("           {} callers hit the callsite cap", report.callsite_cap_hits);
    }
    println!(
        "Summaries: {} done, {} failed, {} skipped",
        report.summaries_done, report.summaries_failed, report.summaries_skipped
    );
    println!(
        "Published: {} in {:.1}s",
        out.display(),
        report.elapsed_ms as f64 / 1000.0
    );
}

fn run_search(query: &str, index_dir: &Path, top: usize) -> anyhow::Result<()> {
    let index = SearchIndex::load(index_dir)
        .with_context(|| format!("no index at {}", index_dir.display()))?;

    let ranking = Ranker::new(&index).search(query, top);
    if ranking.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for hit in &ranking.results {
        let node = index.require(&hit.id)?;
        println!(
            "{:>8.3}  {:<8}  {}  {}",
            hit.score,
            node.kind.as_str(),
            node.path,
            node.name
        );
    }

    let trace = TraceAssembler::new(&index).assemble(query, &ranking);
    let trace_path = index_dir.join("trace.json");
    write_json(&trace_path, &trace)?;
    println!("Trace written to {}", trace_path.display());
    Ok(())
}
