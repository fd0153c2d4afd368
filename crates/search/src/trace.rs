use serde::Serialize;

use atlas_model::{CallEdge, CalleeRef, NodeId, NodeKind, Span};

use crate::index::SearchIndex;
use crate::rank::Ranking;

/// One ancestor on the path from the repo root to a result, carrying its
/// own level score so a consumer can see where the relevance came from.
#[derive(Debug, Clone, Serialize)]
pub struct TraceHop {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TraceEntry {
    pub target: NodeId,
    pub score: f64,
    /// Repo root first, the result node last.
    pub chain: Vec<TraceHop>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls_out: Vec<CallEdge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls_in: Vec<CallEdge>,
}

/// The explainable view of one query: per-result ancestor chains plus the
/// call edges touching each result. Pure data for a rendering consumer.
#[derive(Debug, Serialize)]
pub struct Trace {
    pub query: String,
    pub results: Vec<TraceEntry>,
}

#[derive(Debug)]
pub struct TraceAssembler<'a> {
    index: &'a SearchIndex,
}

impl<'a> TraceAssembler<'a> {
    #[must_use]
    pub fn new(index: &'a SearchIndex) -> Self {
        Self { index }
    }

    #[must_use]
    pub fn assemble(&self, query: &str, ranking: &Ranking) -> Trace {
        let results = ranking
            .results
            .iter()
            .map(|result| {
                let chain = self
                    .index
                    .ancestry(&result.id)
                    .into_iter()
                    .map(|node| TraceHop {
                        id: node.id.clone(),
                        kind: node.kind,
                        name: node.name.clone(),
                        path: node.path.clone(),
                        span: node.span,
                        score: ranking.own_score(&node.id),
                        summary: node.summary.clone(),
                    })
                    .collect();
                let calls_out = self
                    .index
                    .edges()
                    .iter()
                    .filter(|e| e.caller == result.id)
                    .cloned()
                    .collect();
                let calls_in = self
                    .index
                    .edges()
                    .iter()
                    .filter(|e| {
                        matches!(&e.callee, CalleeRef::Resolved { id, .. } if *id == result.id)
                    })
                    .cloned()
                    .collect();
                TraceEntry {
                    target: result.id.clone(),
                    score: result.score,
                    chain,
                    calls_out,
                    calls_in,
                }
            })
            .collect();
        Trace {
            query: query.to_string(),
            results,
        }
    }
}
