use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("store error: {0}")]
    Store(#[from] atlas_store::StoreError),
    #[error("index has no repo root node")]
    MissingRoot,
    #[error("node not present in index: {0}")]
    UnknownNode(atlas_model::NodeId),
}

pub type Result<T> = std::result::Result<T, SearchError>;
