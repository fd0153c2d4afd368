use thiserror::Error;

use atlas_model::NodeId;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Build-fatal failures. Everything recoverable (parse failures, unresolved
/// edges, summary failures) becomes flags and counts on the affected nodes;
/// only an empty build, a broken consolidation, or publish IO aborts a run.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    StoreError(#[from] atlas_store::StoreError),

    #[error("Index error: {0}")]
    IndexError(#[from] atlas_search::SearchError),

    #[error("Worker task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("No source files could be indexed")]
    NoSources,

    #[error("Duplicate node id in consolidated build: {0}")]
    DuplicateNode(NodeId),

    #[error("Build cancelled before publish")]
    Cancelled,
}
