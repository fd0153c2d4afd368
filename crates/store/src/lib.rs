//! # Atlas Store
//!
//! Flat-file persistence for index artifacts: JSONL record streams for
//! nodes and edges, single JSON documents for the term index and metadata,
//! and a staging directory that swaps into place atomically so readers only
//! ever see a complete index.

mod error;
mod jsonl;
mod publish;

pub use error::{Result, StoreError};
pub use jsonl::{read_json, read_jsonl, write_json, write_jsonl};
pub use publish::Staging;
