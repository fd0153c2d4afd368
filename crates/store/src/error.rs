use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed record at {path}:{line}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("artifact not found: {0}")]
    Missing(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;
