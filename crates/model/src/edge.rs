use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Why a call site could not be linked to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Several equally qualified declarations match the callee name.
    Ambiguous,
    /// No declaration in the build matches the callee name.
    NotFound,
}

impl UnresolvedReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ambiguous => "ambiguous",
            Self::NotFound => "not_found",
        }
    }
}

/// Target of a call edge: either a declaration in the build or the literal
/// callee text with the reason resolution fell short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalleeRef {
    Resolved { id: NodeId, symbol: String },
    Unresolved { symbol: String, reason: UnresolvedReason },
}

impl CalleeRef {
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Resolved { symbol, .. } | Self::Unresolved { symbol, .. } => symbol,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// One call reference from a caller's body. Every detected call site becomes
/// exactly one edge record; resolution outcomes are data, never errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: NodeId,
    pub callee: CalleeRef,
    pub path: String,
    pub line: usize,
    pub snippet: String,
}
