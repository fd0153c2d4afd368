use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use atlas_adapters::{AdapterRegistry, Language};
use atlas_hierarchy::{
    build_file_tree, CallerCalls, Declaration, FileTree, Resolver, Scaffold, SymbolTable,
};
use atlas_model::{BuildConfig, BuildReport, CallEdge, Node, NodeId, NodeKind};
use atlas_search::{
    document_text, Bm25Levels, IndexMeta, BM25_FILE, EDGES_FILE, META_FILE, NODES_FILE,
};
use atlas_store::{write_json, write_jsonl, Staging};
use atlas_summarize::{
    compress_input, Scheduler, SummarizeOptions, Summarizer, WorkItem, WorkState,
};

use crate::error::{BuildError, Result};
use crate::source::SourceFile;

/// Bound on concurrently processed files during the structural phase. File
/// work is CPU-bound parsing, so this is about memory, not throughput.
pub const FILE_PARALLELISM: usize = 32;

/// Called after each file completes the structural phase: (done, total).
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Orchestrates a full build in three strictly ordered phases.
///
/// Phase A parses files in parallel and builds per-file subtrees; its tasks
/// share nothing and return owned results. A single-threaded tail then wires
/// the scaffold, the build-wide symbol table, and call resolution. Phase B
/// runs all summarization as one bounded-concurrency batch. Phase C
/// consolidates deterministically and publishes atomically; the previous
/// index survives any failure before the final swap.
pub struct IndexBuilder {
    config: BuildConfig,
    provider: Option<Arc<dyn Summarizer>>,
    progress: Option<ProgressFn>,
}

/// What one file contributes after Phase A. Text is kept until work
/// gathering because summary inputs slice original lines, not excerpts.
struct FileOutcome {
    rel_path: String,
    text: String,
    tree: FileTree,
    lang: Language,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            provider: None,
            progress: None,
        }
    }

    /// Attach the external summarizer. Without one, Phase B is skipped and
    /// all nodes stay summaryless.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn Summarizer>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run the whole pipeline and publish into `out_dir`.
    pub async fn build(
        &self,
        repo_name: &str,
        mut files: Vec<SourceFile>,
        out_dir: &Path,
        cancel: &AtomicBool,
    ) -> Result<BuildReport> {
        let started = Instant::now();
        if files.is_empty() {
            return Err(BuildError::NoSources);
        }
        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        files.dedup_by(|a, b| a.rel_path == b.rel_path);

        let mut report = BuildReport {
            files_scanned: files.len(),
            ..BuildReport::default()
        };
        log::info!("indexing {} ({} files)", repo_name, files.len());

        let paths: Vec<String> = files.iter().map(|f| f.rel_path.clone()).collect();
        let mut scaffold = Scaffold::new(repo_name, &paths);

        // Phase A: parallel structural build over files.
        let outcomes = self.structural_phase(files, &scaffold, &mut report).await?;
        if outcomes.is_empty() {
            return Err(BuildError::NoSources);
        }
        if cancel.load(Ordering::Relaxed) {
            return Err(BuildError::Cancelled);
        }

        // Single-threaded tail: wire files into the scaffold, build the
        // symbol table, resolve call sites.
        for outcome in &outcomes {
            scaffold.attach_file(&outcome.rel_path, outcome.tree.file_id().clone());
        }
        let table = symbol_table(&outcomes);
        log::debug!("symbol table holds {} declarations", table.len());

        let callers = collect_callers(&outcomes);
        let resolver = Resolver::new(table, self.config.callsite_cap);
        let resolution = resolver.resolve(&callers);
        report.edges = resolution.edges.len();
        report.resolved_edges = resolution.resolved;
        report.ambiguous_edges = resolution.ambiguous;
        report.not_found_edges = resolution.not_found;
        report.callsite_cap_hits = resolution.truncated.len();

        // Consolidate the node set; duplicate ids are fatal before any
        // summarizer call gets spent on them.
        let text_by_path: HashMap<String, String> = outcomes
            .iter()
            .map(|o| (o.rel_path.clone(), o.text.clone()))
            .collect();
        let langs: BTreeSet<&'static str> =
            outcomes.iter().map(|o| o.lang.as_str()).collect();
        let mut nodes = consolidate(scaffold, outcomes)?;
        let index_of: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        for caller in &resolution.truncated {
            if let Some(&idx) = index_of.get(caller) {
                nodes[idx].calls_truncated = true;
            }
        }
        report.nodes = nodes.len();

        // Barrier: only now is summarization work gathered, repo-wide.
        if let Some(provider) = &self.provider {
            let items = gather_summary_work(&nodes, &text_by_path, self.config.min_summary_lines);
            if items.is_empty() {
                log::debug!("no nodes eligible for summarization");
            } else {
                log::info!("summarizing {} nodes", items.len());
                let scheduler =
                    Scheduler::new(Arc::clone(provider), SummarizeOptions::from(&self.config));
                let batch = scheduler.run(items, cancel).await;
                report.summaries_done = batch.done;
                report.summaries_failed = batch.failed;
                report.summaries_skipped = batch.skipped;
                for item in batch.items {
                    let Some(&idx) = index_of.get(&item.id) else {
                        continue;
                    };
                    match item.state {
                        WorkState::Done => nodes[idx].summary = item.result,
                        WorkState::Failed => nodes[idx].summary_failed = true,
                        _ => {}
                    }
                }
            }
        }

        // A cancelled build never publishes; the previous index stays.
        if cancel.load(Ordering::Relaxed) {
            log::warn!("build cancelled, discarding unpublished artifacts");
            return Err(BuildError::Cancelled);
        }

        // Phase C: term index, artifacts, atomic publish.
        let mut bm25 = Bm25Levels::new(self.config.bm25_k1, self.config.bm25_b);
        for node in &nodes {
            bm25.add_document(node.kind, node.id.clone(), &document_text(node));
        }
        bm25.finalize();

        let meta = IndexMeta {
            version: IndexMeta::VERSION,
            repo: repo_name.to_string(),
            root: nodes[0].id.clone(),
            nodes: nodes.len(),
            edges: resolution.edges.len(),
            langs: langs.into_iter().map(str::to_string).collect(),
            decay: self.config.decay,
            bm25_k1: self.config.bm25_k1,
            bm25_b: self.config.bm25_b,
        };

        let staging = Staging::begin(out_dir)?;
        let wrote = write_artifacts(&staging, &nodes, &resolution.edges, &bm25, &meta);
        match wrote {
            Ok(()) => staging.commit()?,
            Err(err) => {
                staging.abort();
                return Err(err);
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "build complete: {} nodes, {} edges ({} resolved), {} summaries, {} ms",
            report.nodes,
            report.edges,
            report.resolved_edges,
            report.summaries_done,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Parse every file under a concurrency bound. Tasks return owned
    /// outcomes; nothing is shared while they run.
    async fn structural_phase(
        &self,
        files: Vec<SourceFile>,
        scaffold: &Scaffold,
        report: &mut BuildReport,
    ) -> Result<Vec<FileOutcome>> {
        let total = files.len();
        let semaphore = Arc::new(Semaphore::new(FILE_PARALLELISM));
        let mut handles = Vec::with_capacity(total);

        for file in files {
            // The semaphore is never closed while we hold it.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let parent = scaffold.parent_for(&file.rel_path).clone();
            let handle = tokio::spawn(async move {
                let outcome = process_file(file, &parent).await;
                drop(permit);
                outcome
            });
            handles.push(handle);
        }

        let mut outcomes = Vec::with_capacity(total);
        for (done, handle) in handles.into_iter().enumerate() {
            match handle.await? {
                Some(outcome) => {
                    if outcome.tree.parse_failed {
                        report.files_degraded += 1;
                    } else {
                        report.files_indexed += 1;
                    }
                    outcomes.push(outcome);
                }
                None => report.files_skipped += 1,
            }
            if let Some(progress) = &self.progress {
                progress(done + 1, total);
            }
        }
        outcomes.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(outcomes)
    }
}

/// Read and parse one file. IO failures skip the file entirely; parse
/// failures degrade it into a bare File node inside `build_file_tree`.
async fn process_file(file: SourceFile, parent: &NodeId) -> Option<FileOutcome> {
    let text = match tokio::fs::read_to_string(&file.abs_path).await {
        Ok(text) => text,
        Err(err) => {
            log::warn!("skipping unreadable file {}: {}", file.rel_path, err);
            return None;
        }
    };
    let lang = Language::from_path(&file.rel_path);
    let Some(adapter) = AdapterRegistry::global().for_language(lang) else {
        log::warn!("skipping {}: no adapter for {}", file.rel_path, lang.as_str());
        return None;
    };
    let parsed = adapter.parse(&text);
    let tree = build_file_tree(&file.rel_path, lang, parent, &text, parsed);
    Some(FileOutcome {
        rel_path: file.rel_path,
        text,
        tree,
        lang,
    })
}

/// Every named declaration in the build: classes, functions, and nested
/// functions, in file order.
fn symbol_table(outcomes: &[FileOutcome]) -> SymbolTable {
    let mut table = SymbolTable::new();
    for outcome in outcomes {
        for node in &outcome.tree.nodes {
            if matches!(
                node.kind,
                NodeKind::Class | NodeKind::Function | NodeKind::Block
            ) {
                table.insert(Declaration::new(
                    node.id.clone(),
                    node.name.clone(),
                    node.path.clone(),
                ));
            }
        }
    }
    table
}

/// Group call sites by caller, preserving source order within each caller
/// and file order across callers.
fn collect_callers(outcomes: &[FileOutcome]) -> Vec<CallerCalls> {
    let mut order: Vec<NodeId> = Vec::new();
    let mut by_caller: HashMap<NodeId, CallerCalls> = HashMap::new();
    for outcome in outcomes {
        for (caller, site) in &outcome.tree.calls {
            let entry = by_caller.entry(caller.clone()).or_insert_with(|| {
                order.push(caller.clone());
                CallerCalls {
                    caller: caller.clone(),
                    path: outcome.rel_path.clone(),
                    sites: Vec::new(),
                }
            });
            entry.sites.push(site.clone());
        }
    }
    order
        .into_iter()
        .filter_map(|id| by_caller.remove(&id))
        .collect()
}

/// Flatten scaffold and file subtrees into the final node list, repo root
/// first, file subtrees in path order. Duplicate ids abort the build: two
/// distinct constructs hashed to one identity and the artifact would be
/// ambiguous.
fn consolidate(scaffold: Scaffold, outcomes: Vec<FileOutcome>) -> Result<Vec<Node>> {
    let mut nodes = scaffold.into_nodes();
    for outcome in outcomes {
        nodes.extend(outcome.tree.nodes);
    }
    let mut seen: HashMap<&NodeId, ()> = HashMap::with_capacity(nodes.len());
    for node in &nodes {
        if seen.insert(&node.id, ()).is_some() {
            return Err(BuildError::DuplicateNode(node.id.clone()));
        }
    }
    Ok(nodes)
}

/// Pick the nodes worth summarizing and slice their source text. Files,
/// classes, and functions qualify once they span at least `min_lines`.
fn gather_summary_work(
    nodes: &[Node],
    text_by_path: &HashMap<String, String>,
    min_lines: usize,
) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for node in nodes {
        if !matches!(
            node.kind,
            NodeKind::File | NodeKind::Class | NodeKind::Function
        ) {
            continue;
        }
        if node.loc() < min_lines || node.summary.is_some() {
            continue;
        }
        let Some(span) = node.span else {
            continue;
        };
        let Some(text) = text_by_path.get(&node.path) else {
            continue;
        };
        let lines: Vec<&str> = text
            .lines()
            .skip(span.start.saturating_sub(1))
            .take(span.end - span.start + 1)
            .collect();
        let input = compress_input(&lines.join("\n"));
        items.push(WorkItem::new(node.id.clone(), input));
    }
    items
}

fn write_artifacts(
    staging: &Staging,
    nodes: &[Node],
    edges: &[CallEdge],
    bm25: &Bm25Levels,
    meta: &IndexMeta,
) -> Result<()> {
    write_jsonl(&staging.dir().join(NODES_FILE), nodes)?;
    write_jsonl(&staging.dir().join(EDGES_FILE), edges)?;
    write_json(&staging.dir().join(BM25_FILE), bm25)?;
    write_json(&staging.dir().join(META_FILE), meta)?;
    Ok(())
}
