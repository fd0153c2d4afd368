use std::collections::HashMap;

use serde::Serialize;

use atlas_model::{NodeId, NodeKind};

use crate::index::SearchIndex;
use crate::tokens::tokenize;

/// Top candidates kept per level before aggregation.
pub const LEVEL_CANDIDATES: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub id: NodeId,
    pub score: f64,
    pub kind: NodeKind,
}

/// Output of one query: the ranked list plus the per-node level scores the
/// trace assembler annotates ancestor chains with.
#[derive(Debug, Default)]
pub struct Ranking {
    pub results: Vec<RankedResult>,
    pub terms: Vec<String>,
    own: HashMap<NodeId, f64>,
}

impl Ranking {
    /// The node's own level score, before any descendant contribution.
    #[must_use]
    pub fn own_score(&self, id: &NodeId) -> f64 {
        self.own.get(id).copied().unwrap_or(0.0)
    }
}

/// Scores a query against every level of the index and folds descendant
/// relevance upward.
///
/// A node's aggregate is its own level score plus `decay` times the peak
/// score found anywhere beneath it, where the peak itself decays per level
/// crossed. Deeply nested hits therefore surface their containers without
/// drowning out containers that match in their own right.
#[derive(Debug)]
pub struct Ranker<'a> {
    index: &'a SearchIndex,
    decay: f64,
}

impl<'a> Ranker<'a> {
    /// Rank with the decay the index was built with.
    #[must_use]
    pub fn new(index: &'a SearchIndex) -> Self {
        Self {
            index,
            decay: index.meta().decay,
        }
    }

    #[must_use]
    pub fn with_decay(index: &'a SearchIndex, decay: f64) -> Self {
        Self { index, decay }
    }

    #[must_use]
    pub fn search(&self, query: &str, top_k: usize) -> Ranking {
        let terms = tokenize(query);
        if terms.is_empty() {
            log::debug!("query produced no terms: {query:?}");
            return Ranking::default();
        }

        let mut own: HashMap<NodeId, f64> = HashMap::new();
        for kind in NodeKind::ALL {
            let Some(level) = self.index.bm25().level(kind) else {
                continue;
            };
            let mut scored = level.scored_candidates(&terms);
            scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            scored.truncate(LEVEL_CANDIDATES);
            own.extend(scored);
        }

        let mut best: HashMap<NodeId, f64> = HashMap::new();
        self.fill_best(&self.index.root().id, &own, &mut best);

        let mut results: Vec<RankedResult> = Vec::new();
        for (id, below) in &best {
            let aggregate = own.get(id).copied().unwrap_or(0.0) + below;
            if aggregate <= 0.0 {
                continue;
            }
            let Some(node) = self.index.node(id) else {
                continue;
            };
            results.push(RankedResult {
                id: id.clone(),
                score: aggregate,
                kind: node.kind,
            });
        }

        // Score descending; exact ties prefer the more specific level, then
        // lexical id order pins the result fully.
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.kind.depth().cmp(&a.kind.depth()))
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(top_k);

        log::debug!(
            "query {:?}: {} terms, {} results",
            query,
            terms.len(),
            results.len()
        );
        Ranking {
            results,
            terms,
            own,
        }
    }

    /// Post-order walk filling `best` (the decayed peak beneath each node);
    /// returns the subtree peak including the node's own score.
    fn fill_best(
        &self,
        id: &NodeId,
        own: &HashMap<NodeId, f64>,
        best: &mut HashMap<NodeId, f64>,
    ) -> f64 {
        let mut below = 0.0f64;
        for child in self.index.children_of(id) {
            let peak = self.fill_best(child, own, best);
            below = below.max(self.decay * peak);
        }
        best.insert(id.clone(), below);
        own.get(id).copied().unwrap_or(0.0).max(below)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bm25::Bm25Levels;
    use crate::docs::document_text;
    use crate::index::IndexMeta;
    use atlas_model::{Node, Span};
    use pretty_assertions::assert_eq;

    struct Fixture {
        nodes: Vec<Node>,
    }

    impl Fixture {
        fn new() -> Self {
            let repo = Node::new(NodeKind::Repo, ".", "demo", None);
            Self { nodes: vec![repo] }
        }

        fn add(&mut self, kind: NodeKind, path: &str, name: &str, parent_idx: usize) -> usize {
            let span = Span::new(1, 30);
            let mut node = Node::new(kind, path, name, Some(span));
            node.parent = Some(self.nodes[parent_idx].id.clone());
            let id = node.id.clone();
            self.nodes.push(node);
            self.nodes[parent_idx].children.push(id);
            self.nodes.len() - 1
        }

        fn id(&self, idx: usize) -> NodeId {
            self.nodes[idx].id.clone()
        }

        fn build(self) -> SearchIndex {
            let root = self.nodes[0].id.clone();
            let mut bm25 = Bm25Levels::new(1.5, 0.75);
            for node in &self.nodes {
                bm25.add_document(node.kind, node.id.clone(), &document_text(node));
            }
            bm25.finalize();
            let meta = IndexMeta {
                version: IndexMeta::VERSION,
                repo: "demo".to_string(),
                root,
                nodes: self.nodes.len(),
                edges: 0,
                langs: vec!["rust".to_string()],
                decay: 0.6,
                bm25_k1: 1.5,
                bm25_b: 0.75,
            };
            SearchIndex::from_parts(self.nodes, Vec::new(), bm25, meta).unwrap()
        }
    }

    #[test]
    fn summarized_function_ranks_in_top_three() {
        let mut fx = Fixture::new();
        let file_a = fx.add(NodeKind::File, "src/parse.rs", "parse.rs", 0);
        let target = fx.add(NodeKind::Function, "src/parse.rs", "parse_stream", file_a);
        fx.nodes[target].summary =
            Some("parses input and recovers from malformed tokens".to_string());
        let file_b = fx.add(NodeKind::File, "src/render.rs", "render.rs", 0);
        fx.add(NodeKind::Function, "src/render.rs", "draw_frame", file_b);
        fx.add(NodeKind::Function, "src/render.rs", "clear_screen", file_b);
        let file_c = fx.add(NodeKind::File, "src/io.rs", "io.rs", 0);
        fx.add(NodeKind::Function, "src/io.rs", "read_bytes", file_c);

        let target_id = fx.id(target);
        let index = fx.build();
        let ranking = Ranker::new(&index).search("parse error handling", 10);

        let top3: Vec<&NodeId> = ranking.results.iter().take(3).map(|r| &r.id).collect();
        assert!(top3.contains(&&target_id), "expected target in top 3");
    }

    #[test]
    fn nested_hit_lifts_its_ancestors() {
        let mut fx = Fixture::new();
        let pkg = fx.add(NodeKind::Package, "net", "net", 0);
        let file = fx.add(NodeKind::File, "net/tcp.rs", "tcp.rs", pkg);
        let func = fx.add(NodeKind::Function, "net/tcp.rs", "open_socket", file);
        fx.nodes[func].summary = Some("dials a remote quicksilver endpoint".to_string());
        let other = fx.add(NodeKind::File, "misc.rs", "misc.rs", 0);
        fx.add(NodeKind::Function, "misc.rs", "noop", other);

        let func_id = fx.id(func);
        let file_id = fx.id(file);
        let pkg_id = fx.id(pkg);
        let index = fx.build();
        let ranking = Ranker::new(&index).search("quicksilver", 10);

        let ids: Vec<&NodeId> = ranking.results.iter().map(|r| &r.id).collect();
        assert!(ids.contains(&&func_id));
        // Ancestors surface through the decayed contribution alone.
        assert!(ids.contains(&&file_id));
        assert!(ids.contains(&&pkg_id));

        let score_of = |id: &NodeId| {
            ranking
                .results
                .iter()
                .find(|r| &r.id == id)
                .map(|r| r.score)
                .unwrap()
        };
        assert!(score_of(&func_id) > score_of(&file_id));
        assert!(score_of(&file_id) > score_of(&pkg_id));
    }

    #[test]
    fn exact_ties_prefer_the_deeper_node() {
        let mut fx = Fixture::new();
        // The file and function corpora get identical document multisets, so
        // the matching file and matching function score exactly the same.
        let quiet_parent = fx.add(NodeKind::File, "src/a.rs", "a.rs", 0);
        let func = fx.add(NodeKind::Function, "src/a.rs", "zeppelin", quiet_parent);
        fx.add(NodeKind::Function, "src/a.rs", "a_rs", quiet_parent);
        let file = fx.add(NodeKind::File, "src/a.rs", "zeppelin", 0);

        let func_id = fx.id(func);
        let file_id = fx.id(file);
        let index = fx.build();

        // Decay zero keeps ancestor lift out of the comparison.
        let ranking = Ranker::with_decay(&index, 0.0).search("zeppelin", 10);
        let func_pos = ranking.results.iter().position(|r| r.id == func_id);
        let file_pos = ranking.results.iter().position(|r| r.id == file_id);
        let (func_pos, file_pos) = (func_pos.unwrap(), file_pos.unwrap());
        assert_eq!(
            ranking.results[func_pos].score, ranking.results[file_pos].score,
            "fixture should produce an exact tie"
        );
        assert!(func_pos < file_pos, "deeper node should rank first");
    }

    #[test]
    fn ranking_is_deterministic() {
        let build_ids = || {
            let mut fx = Fixture::new();
            let file = fx.add(NodeKind::File, "src/x.rs", "x.rs", 0);
            for name in ["alpha_parse", "beta_parse", "gamma_parse", "delta_parse"] {
                fx.add(NodeKind::Function, "src/x.rs", name, file);
            }
            let index = fx.build();
            let ranking = Ranker::new(&index).search("parse", 10);
            ranking
                .results
                .iter()
                .map(|r| r.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(build_ids(), build_ids());
    }

    #[test]
    fn empty_or_symbol_queries_return_nothing() {
        let mut fx = Fixture::new();
        let file = fx.add(NodeKind::File, "src/x.rs", "x.rs", 0);
        fx.add(NodeKind::Function, "src/x.rs", "anything", file);
        let index = fx.build();

        assert!(Ranker::new(&index).search("", 10).results.is_empty());
        assert!(Ranker::new(&index).search("=> ::", 10).results.is_empty());
    }

    #[test]
    fn top_k_caps_the_result_list() {
        let mut fx = Fixture::new();
        let file = fx.add(NodeKind::File, "src/x.rs", "x.rs", 0);
        for i in 0..8 {
            fx.add(NodeKind::Function, "src/x.rs", &format!("parse_{i}"), file);
        }
        let index = fx.build();
        let ranking = Ranker::new(&index).search("parse", 3);
        assert_eq!(ranking.results.len(), 3);
    }

    #[test]
    fn own_scores_are_exposed_for_tracing() {
        let mut fx = Fixture::new();
        let file = fx.add(NodeKind::File, "src/x.rs", "x.rs", 0);
        let func = fx.add(NodeKind::Function, "src/x.rs", "lonely_needle", file);
        let func_id = fx.id(func);
        let repo_id = fx.id(0);
        let index = fx.build();

        let ranking = Ranker::new(&index).search("needle", 10);
        assert!(ranking.own_score(&func_id) > 0.0);
        assert_eq!(ranking.own_score(&repo_id), 0.0);
    }
}
