use std::time::Duration;

/// Tunable values the build pipeline consumes. Loading these from files,
/// environment, or flags is the caller's concern; the core sees values only.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Bounded concurrency of the summarization pool.
    pub concurrency: usize,
    /// Per-request timeout for the external summarizer.
    pub timeout: Duration,
    /// Retries after the first attempt for retryable failures.
    pub retries: u32,
    /// Maximum call edges retained per caller.
    pub callsite_cap: usize,
    /// Minimum lines a node must span to be summarized.
    pub min_summary_lines: usize,
    /// Decay applied per hierarchy step when a descendant's score is
    /// propagated to an ancestor. Must lie in (0, 1).
    pub decay: f64,
    /// BM25 term-frequency saturation.
    pub bm25_k1: f64,
    /// BM25 length normalization.
    pub bm25_b: f64,
    /// Model identifier handed to the external summarizer.
    pub model: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            concurrency: 50,
            timeout: Duration::from_secs(30),
            retries: 2,
            callsite_cap: 200,
            min_summary_lines: 20,
            decay: 0.6,
            bm25_k1: 1.5,
            bm25_b: 0.75,
            model: "gpt-4o-mini".to_string(),
        }
    }
}
