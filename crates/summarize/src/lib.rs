//! # Atlas Summarize
//!
//! Batch enrichment of index nodes with natural-language summaries.
//!
//! ```text
//! WorkItems ──> Scheduler ──> bounded workers (C) ──> Summarizer provider
//!                  │                                        │
//!                  └── retries w/ backoff <── retryable ────┘
//! ```
//!
//! The scheduler runs one global batch after structural indexing completes:
//! every item is driven to a terminal state (done or failed) independently,
//! so a single slow or broken item never holds up the rest. Cancellation
//! stops dispatch but lets in-flight calls finish; undispatched items stay
//! pending and are reported as skipped.

mod error;
mod input;
mod item;
mod scheduler;

pub use error::{Result, SummarizeError};
pub use input::{compress_input, INPUT_CHAR_CAP};
pub use item::{WorkItem, WorkState};
pub use scheduler::{BatchOutcome, Scheduler, SummarizeOptions, Summarizer};
