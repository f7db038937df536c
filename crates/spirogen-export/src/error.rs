use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("layout \"{name}\" has no geometric elements to export")]
    Empty { name: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
