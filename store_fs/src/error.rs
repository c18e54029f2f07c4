use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<FsError> for statkit_store::StoreError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::Serialization(reason) => statkit_store::StoreError::Serialization(reason),
            FsError::Malformed { .. } => statkit_store::StoreError::Serialization(e.to_string()),
            FsError::Io { .. } => statkit_store::StoreError::Backend(e.to_string()),
        }
    }
}
