use serde::{Deserialize, Serialize};

/// What a completed build produced, including everything that degraded along
/// the way. Degradation counts are informational; they never fail a build on
/// their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    /// Files that produced a bare degraded File node after a parse failure.
    pub files_degraded: usize,
    /// Unreadable files skipped before parsing.
    pub files_skipped: usize,
    pub nodes: usize,
    pub edges: usize,
    pub resolved_edges: usize,
    pub ambiguous_edges: usize,
    pub not_found_edges: usize,
    /// Callers whose edge list hit the per-caller cap.
    pub callsite_cap_hits: usize,
    pub summaries_done: usize,
    pub summaries_failed: usize,
    /// Work items never dispatched (summaries off, or cancellation).
    pub summaries_skipped: usize,
    pub elapsed_ms: u64,
}

impl BuildReport {
    #[must_use]
    pub fn unresolved_edges(&self) -> usize {
        self.ambiguous_edges + self.not_found_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unresolved_is_sum_of_reasons() {
        let report = BuildReport {
            ambiguous_edges: 3,
            not_found_edges: 4,
            ..BuildReport::default()
        };
        assert_eq!(report.unresolved_edges(), 7);
    }
}
