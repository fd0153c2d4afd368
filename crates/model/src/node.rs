use serde::{Deserialize, Serialize};

use crate::id::{stable_node_id, NodeId};

/// Hierarchy level of a node. Declaration order is depth order: `Repo` is
/// the shallowest level and `Block` the deepest, which `Ord` reflects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Repo,
    Package,
    File,
    Class,
    Function,
    Block,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repo => "repo",
            Self::Package => "package",
            Self::File => "file",
            Self::Class => "class",
            Self::Function => "function",
            Self::Block => "block",
        }
    }

    /// Depth rank of the level, 0 at the repo root.
    #[must_use]
    pub const fn depth(self) -> u8 {
        match self {
            Self::Repo => 0,
            Self::Package => 1,
            Self::File => 2,
            Self::Class => 3,
            Self::Function => 4,
            Self::Block => 5,
        }
    }

    /// All levels, shallowest first.
    pub const ALL: [NodeKind; 6] = [
        Self::Repo,
        Self::Package,
        Self::File,
        Self::Class,
        Self::Function,
        Self::Block,
    ];
}

/// Line span of a construct, 1-based and inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether `other` lies entirely inside this span.
    #[must_use]
    pub const fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Number of lines covered.
    #[must_use]
    pub const fn lines(self) -> usize {
        self.end - self.start + 1
    }
}

/// One function parameter, as far as the grammar exposes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_default: bool,
}

/// Structured documentation metadata extracted alongside a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raises: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_method: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl DocMeta {
    /// True when no field carries information; such metadata is omitted from
    /// node records entirely.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
            && self.returns.is_none()
            && self.raises.is_empty()
            && self.decorators.is_empty()
            && !self.is_async
            && !self.is_method
            && self.owner.is_none()
    }
}

/// One entry in the hierarchical code model.
///
/// Nodes are created by the hierarchy builder, enriched in place by the
/// resolver (edges, truncation flag) and the summarization pipeline
/// (summary, degraded flag), then frozen into the published index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Child ids in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    /// Bounded raw-text excerpt feeding the searchable document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The file failed to parse; this node has no children.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub parse_failed: bool,
    /// Summarization was attempted and exhausted its retries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub summary_failed: bool,
    /// The per-caller callsite cap dropped some of this node's call edges.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub calls_truncated: bool,
}

impl Node {
    /// Create a node with its stable id derived from the identity tuple.
    /// All enrichment fields start empty.
    #[must_use]
    pub fn new(kind: NodeKind, path: &str, name: &str, span: Option<Span>) -> Self {
        let name_for_id = if name.is_empty() { None } else { Some(name) };
        Self {
            id: stable_node_id(kind, path, name_for_id, span),
            parent: None,
            kind,
            name: name.to_string(),
            path: path.to_string(),
            lang: None,
            span,
            signature: None,
            children: Vec::new(),
            excerpt: String::new(),
            doc: None,
            summary: None,
            parse_failed: false,
            summary_failed: false,
            calls_truncated: false,
        }
    }

    /// Lines covered by this node's span, 0 when spanless (repo/package).
    #[must_use]
    pub fn loc(&self) -> usize {
        self.span.map_or(0, Span::lines)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_ord_matches_depth() {
        for pair in NodeKind::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].depth() < pair[1].depth());
        }
    }

    #[test]
    fn span_containment() {
        let outer = Span::new(1, 100);
        let inner = Span::new(10, 20);
        assert!(outer.contains(inner));
        assert!(outer.contains(outer));
        assert!(!inner.contains(outer));
        assert!(!Span::new(5, 15).contains(Span::new(10, 20)));
    }

    #[test]
    fn node_round_trips_through_json() {
        let mut node = Node::new(
            NodeKind::Function,
            "src/parse.rs",
            "parse_header",
            Some(Span::new(12, 40)),
        );
        node.lang = Some("rust".to_string());
        node.signature = Some("fn parse_header(input: &[u8]) -> Result<Header>".to_string());
        node.doc = Some(DocMeta {
            params: vec![Param {
                name: "input".to_string(),
                annotation: Some("&[u8]".to_string()),
                has_default: false,
            }],
            returns: Some("Result<Header>".to_string()),
            ..DocMeta::default()
        });

        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn empty_flags_are_omitted_from_json() {
        let node = Node::new(NodeKind::File, "src/a.rs", "a.rs", Some(Span::new(1, 3)));
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("parse_failed"));
        assert!(!json.contains("summary_failed"));
        assert!(!json.contains("calls_truncated"));
        assert!(!json.contains("children"));
    }
}
