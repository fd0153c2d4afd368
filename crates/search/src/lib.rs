//! # Atlas Search
//!
//! Multi-resolution ranking over a published index.
//!
//! ```text
//! query ──> tokenize ──> per-level BM25 ──> decayed aggregation ──> results
//!                                                                     │
//!                              trace (ancestor chains + edges) <──────┘
//! ```
//!
//! Every hierarchy level is its own BM25 corpus: a block's term rarity is
//! measured against other blocks, never against files. Aggregation then adds
//! a decayed contribution from each node's single best-scoring descendant,
//! so a sharply matching function can lift its file and package into view.

mod bm25;
mod docs;
mod error;
mod index;
mod rank;
mod tokens;
mod trace;

pub use bm25::{Bm25Index, Bm25Levels, LIMIT_TERMS};
pub use docs::document_text;
pub use error::{Result, SearchError};
pub use index::{IndexMeta, SearchIndex, BM25_FILE, EDGES_FILE, META_FILE, NODES_FILE};
pub use rank::{RankedResult, Ranker, Ranking, LEVEL_CANDIDATES};
pub use tokens::{split_identifier, tokenize};
pub use trace::{Trace, TraceAssembler, TraceEntry, TraceHop};
