//! # Atlas Indexer
//!
//! The full build pipeline from source files to a published index.
//!
//! ```text
//! Source files
//!     │
//!     ├──> Phase A: parallel structural build
//!     │      └─> per-file trees, symbol table, resolved call edges
//!     │
//!     ├──> Phase B: global bounded summarization (one batch)
//!     │      └─> summaries matched back by node id
//!     │
//!     └──> Phase C: deterministic consolidation
//!            └─> nodes.jsonl / edges.jsonl / bm25.json / meta.json,
//!                staged then atomically published
//! ```
//!
//! Phase boundaries are strict: summarization work is gathered only after
//! every file has finished structural build and resolution, so the whole
//! repo becomes one concurrent batch instead of many per-file ones.

mod build;
mod error;
mod source;

pub use build::{IndexBuilder, ProgressFn, FILE_PARALLELISM};
pub use error::{BuildError, Result};
pub use source::SourceFile;
