use thiserror::Error;

use atlas_model::{DocMeta, NodeKind, Span};

/// One call expression detected inside a function or method body. The
/// resolver links these against the build-wide symbol table later; here the
/// callee is just the literal trailing identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub symbol: String,
    pub line: usize,
    pub snippet: String,
}

/// A language construct normalized out of per-language syntax.
///
/// Records arrive in source order (outer constructs before the constructs
/// they contain), with spans taken directly from parse positions. Only
/// `Class`, `Function`, and `Block` kinds occur; the hierarchy builder
/// supplies the repo/package/file levels itself.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub kind: NodeKind,
    pub name: String,
    pub span: Span,
    pub signature: Option<String>,
    pub doc: DocMeta,
    pub calls: Vec<CallSite>,
}

impl NormalizedRecord {
    #[must_use]
    pub fn new(kind: NodeKind, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            span,
            signature: None,
            doc: DocMeta::default(),
            calls: Vec::new(),
        }
    }
}

/// Signal that a file could not be structurally parsed. The hierarchy
/// builder recovers this into a degraded File node with zero children; it is
/// never fatal to a build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("syntax errors prevented structural parse")]
    Syntax,
    #[error("parser produced no tree")]
    NoTree,
    #[error("grammar unavailable: {0}")]
    Grammar(String),
}
