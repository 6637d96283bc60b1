use std::path::PathBuf;

use thiserror::Error;

use crate::state::LoadState;

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module key `{key}` missing from downloaded content")]
    MissingKey { key: String },
    #[error("local module file not found: `{path}`")]
    FileNotFound { path: PathBuf },
    #[error("invalid loader state: expected {expected}, was {actual}")]
    InvalidState {
        expected: LoadState,
        actual: LoadState,
    },
    #[error("module is not loaded")]
    NotLoaded,
    #[error("entry point `{symbol}` not found in module `{module}`")]
    EntryPointNotFound { module: String, symbol: String },
    #[error("entry point of module `{module}` returned status {status}")]
    EntryFailed { module: String, status: i32 },
    #[error("failed to load module `{module}` into the process: {details}")]
    Library { module: String, details: String },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] hotmod_store::StoreError),
}

impl LoadError {
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn invalid_state(expected: LoadState, actual: LoadState) -> Self {
        Self::InvalidState { expected, actual }
    }

    pub fn entry_point_not_found(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::EntryPointNotFound {
            module: module.into(),
            symbol: symbol.into(),
        }
    }

    pub fn library(module: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Library {
            module: module.into(),
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
