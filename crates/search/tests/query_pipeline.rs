//! End-to-end query path: artifacts on disk, loaded index, ranked query,
//! assembled trace.

use atlas_model::{CallEdge, CalleeRef, Node, NodeId, NodeKind, Span};
use atlas_search::{
    document_text, Bm25Levels, IndexMeta, Ranker, SearchIndex, TraceAssembler, BM25_FILE,
    EDGES_FILE, META_FILE, NODES_FILE,
};
use atlas_store::{write_json, write_jsonl};

struct Repo {
    nodes: Vec<Node>,
    edges: Vec<CallEdge>,
}

impl Repo {
    fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Repo, ".", "fixture", None)],
            edges: Vec::new(),
        }
    }

    fn add(&mut self, kind: NodeKind, path: &str, name: &str, parent: usize) -> usize {
        let mut node = Node::new(kind, path, name, Some(Span::new(1, 40)));
        node.parent = Some(self.nodes[parent].id.clone());
        let id = node.id.clone();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        self.nodes.len() - 1
    }

    fn call(&mut self, caller: usize, callee: usize, symbol: &str) {
        self.edges.push(CallEdge {
            caller: self.nodes[caller].id.clone(),
            callee: CalleeRef::Resolved {
                id: self.nodes[callee].id.clone(),
                symbol: symbol.to_string(),
            },
            path: self.nodes[caller].path.clone(),
            line: 7,
            snippet: format!("{symbol}()"),
        });
    }

    fn write_to(self, dir: &std::path::Path, target: usize) -> (NodeId, NodeId) {
        let root = self.nodes[0].id.clone();
        let mut bm25 = Bm25Levels::new(1.5, 0.75);
        for node in &self.nodes {
            bm25.add_document(node.kind, node.id.clone(), &document_text(node));
        }
        bm25.finalize();
        let meta = IndexMeta {
            version: IndexMeta::VERSION,
            repo: "fixture".to_string(),
            root: root.clone(),
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            langs: vec!["python".to_string()],
            decay: 0.6,
            bm25_k1: 1.5,
            bm25_b: 0.75,
        };
        let target = self.nodes[target].id.clone();
        write_jsonl(&dir.join(NODES_FILE), &self.nodes).unwrap();
        write_jsonl(&dir.join(EDGES_FILE), &self.edges).unwrap();
        write_json(&dir.join(BM25_FILE), &bm25).unwrap();
        write_json(&dir.join(META_FILE), &meta).unwrap();
        (root, target)
    }
}

fn seeded_dir() -> (tempfile::TempDir, NodeId, NodeId) {
    let mut repo = Repo::new();
    let file = repo.add(NodeKind::File, "svc/worker.py", "worker.py", 0);
    let handler = repo.add(NodeKind::Function, "svc/worker.py", "drain_queue", file);
    repo.nodes[handler].summary =
        Some("drains the retry queue and acknowledges processed messages".to_string());
    let helper = repo.add(NodeKind::Function, "svc/worker.py", "ack_message", file);
    repo.call(handler, helper, "ack_message");

    let other = repo.add(NodeKind::File, "svc/metrics.py", "metrics.py", 0);
    repo.add(NodeKind::Function, "svc/metrics.py", "emit_gauge", other);

    let dir = tempfile::tempdir().unwrap();
    let (root, target) = repo.write_to(dir.path(), handler);
    (dir, root, target)
}

#[test]
fn loaded_index_answers_queries_from_summaries() {
    let (dir, _root, target) = seeded_dir();
    let index = SearchIndex::load(dir.path()).unwrap();

    let ranking = Ranker::new(&index).search("retry queue", 5);
    assert!(!ranking.results.is_empty());
    assert_eq!(ranking.results[0].id, target, "summary match should lead");
    assert_eq!(ranking.results[0].kind, NodeKind::Function);
}

#[test]
fn trace_for_a_query_walks_back_to_the_root() {
    let (dir, root, target) = seeded_dir();
    let index = SearchIndex::load(dir.path()).unwrap();

    let ranking = Ranker::new(&index).search("retry queue", 5);
    let trace = TraceAssembler::new(&index).assemble("retry queue", &ranking);

    let entry = trace
        .results
        .iter()
        .find(|e| e.target == target)
        .expect("target entry in trace");
    assert_eq!(entry.chain.first().unwrap().id, root);
    assert_eq!(entry.chain.last().unwrap().id, target);
    assert_eq!(entry.calls_out.len(), 1, "outgoing call edge attached");
}

#[test]
fn results_stay_capped_and_ordered() {
    let (dir, _, _) = seeded_dir();
    let index = SearchIndex::load(dir.path()).unwrap();

    let ranking = Ranker::new(&index).search("svc", 2);
    assert!(ranking.results.len() <= 2);
    for pair in ranking.results.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores must be descending");
    }
}
