use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use atlas_model::{CallEdge, Node, NodeId};
use atlas_store::{read_json, read_jsonl};

use crate::bm25::Bm25Levels;
use crate::error::{Result, SearchError};

pub const NODES_FILE: &str = "nodes.jsonl";
pub const EDGES_FILE: &str = "edges.jsonl";
pub const BM25_FILE: &str = "bm25.json";
pub const META_FILE: &str = "meta.json";

/// Build facts persisted alongside the artifacts. Ranking reads its default
/// parameters from here so queries score with the same tuning the index was
/// built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub repo: String,
    pub root: NodeId,
    pub nodes: usize,
    pub edges: usize,
    pub langs: Vec<String>,
    pub decay: f64,
    pub bm25_k1: f64,
    pub bm25_b: f64,
}

impl IndexMeta {
    pub const VERSION: u32 = 1;
}

/// A published index loaded for querying: the node map, call edges, and the
/// per-level term index. Read-only; a rebuild produces a whole new directory
/// to load.
#[derive(Debug)]
pub struct SearchIndex {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    edges: Vec<CallEdge>,
    bm25: Bm25Levels,
    meta: IndexMeta,
}

impl SearchIndex {
    pub fn load(dir: &Path) -> Result<Self> {
        let nodes: Vec<Node> = read_jsonl(&dir.join(NODES_FILE))?;
        let edges: Vec<CallEdge> = read_jsonl(&dir.join(EDGES_FILE))?;
        let bm25: Bm25Levels = read_json(&dir.join(BM25_FILE))?;
        let meta: IndexMeta = read_json(&dir.join(META_FILE))?;
        log::info!(
            "loaded index from {}: {} nodes, {} edges",
            dir.display(),
            nodes.len(),
            edges.len()
        );
        Self::from_parts(nodes, edges, bm25, meta)
    }

    /// Assemble an index from in-memory parts. Fails when no repo root is
    /// present, since navigation and aggregation both start there.
    pub fn from_parts(
        nodes: Vec<Node>,
        edges: Vec<CallEdge>,
        bm25: Bm25Levels,
        meta: IndexMeta,
    ) -> Result<Self> {
        let root = nodes
            .iter()
            .find(|n| n.is_root())
            .map(|n| n.id.clone())
            .ok_or(SearchError::MissingRoot)?;
        let nodes = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        Ok(Self {
            nodes,
            root,
            edges,
            bm25,
            meta,
        })
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn require(&self, id: &NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| SearchError::UnknownNode(id.clone()))
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        // The constructor guarantees the root id is in the map.
        &self.nodes[&self.root]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    #[must_use]
    pub fn bm25(&self) -> &Bm25Levels {
        &self.bm25
    }

    #[must_use]
    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Nodes from the repo root down to `id` inclusive, in that order.
    /// Unknown ids yield an empty chain.
    #[must_use]
    pub fn ancestry(&self, id: &NodeId) -> Vec<&Node> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes.get(id);
        // Parent links form a tree; the length bound stops a corrupt
        // artifact from looping forever.
        while let Some(node) = cursor {
            chain.push(node);
            if chain.len() > self.nodes.len() {
                log::warn!("parent cycle detected at node {}", node.id);
                break;
            }
            cursor = node.parent.as_ref().and_then(|p| self.nodes.get(p));
        }
        chain.reverse();
        chain
    }

    /// Child ids of `id` in source order.
    #[must_use]
    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }
}
