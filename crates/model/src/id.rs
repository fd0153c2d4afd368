use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::node::{NodeKind, Span};

/// Stable identifier of a node, unique within a build.
///
/// Ids are SHA-256 hex over the node's identity tuple, so an unchanged
/// construct keeps its id across rebuilds and across parallel schedules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Derive the stable id for a node from its identity tuple.
///
/// The tuple is joined with tabs before hashing; the fields themselves never
/// contain tabs (paths are `/`-separated relative paths, names are source
/// identifiers), so the encoding is unambiguous.
#[must_use]
pub fn stable_node_id(kind: NodeKind, path: &str, name: Option<&str>, span: Option<Span>) -> NodeId {
    let (start, end) = span.map_or((0, 0), |s| (s.start, s.end));
    let raw = format!(
        "{}\t{}\t{}\t{}\t{}",
        kind.as_str(),
        path,
        name.unwrap_or(""),
        start,
        end
    );
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    NodeId(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_is_deterministic() {
        let a = stable_node_id(
            NodeKind::Function,
            "src/lib.rs",
            Some("parse"),
            Some(Span::new(10, 42)),
        );
        let b = stable_node_id(
            NodeKind::Function,
            "src/lib.rs",
            Some("parse"),
            Some(Span::new(10, 42)),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn id_depends_on_every_field() {
        let base = stable_node_id(
            NodeKind::Function,
            "src/lib.rs",
            Some("parse"),
            Some(Span::new(10, 42)),
        );
        let other_kind = stable_node_id(
            NodeKind::Class,
            "src/lib.rs",
            Some("parse"),
            Some(Span::new(10, 42)),
        );
        let other_path = stable_node_id(
            NodeKind::Function,
            "src/main.rs",
            Some("parse"),
            Some(Span::new(10, 42)),
        );
        let other_name = stable_node_id(
            NodeKind::Function,
            "src/lib.rs",
            Some("render"),
            Some(Span::new(10, 42)),
        );
        let other_span = stable_node_id(
            NodeKind::Function,
            "src/lib.rs",
            Some("parse"),
            Some(Span::new(10, 43)),
        );
        assert!(base != other_kind);
        assert!(base != other_path);
        assert!(base != other_name);
        assert!(base != other_span);
    }

    #[test]
    fn id_is_hex_sha256() {
        let id = stable_node_id(NodeKind::Repo, ".", Some("atlas"), None);
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
