use std::path::PathBuf;

/// One file selected for indexing. `rel_path` is the repo-relative,
/// `/`-separated path used for node identity; `abs_path` is where the bytes
/// actually live. Traversal and filtering happen in the caller, which keeps
/// builds reproducible from an explicit file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
}

impl SourceFile {
    #[must_use]
    pub fn new(rel_path: impl Into<String>, abs_path: impl Into<PathBuf>) -> Self {
        Self {
            rel_path: rel_path.into(),
            abs_path: abs_path.into(),
        }
    }
}
