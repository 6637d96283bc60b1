use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fetch failed for group `{group}`: {details}")]
    Fetch { group: String, details: String },
    #[error("invalid index for group `{group}`: {details}")]
    InvalidIndex { group: String, details: String },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn fetch(group: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Fetch {
            group: group.into(),
            details: details.into(),
        }
    }

    pub fn invalid_index(group: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidIndex {
            group: group.into(),
            details: details.into(),
        }
    }

    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}
