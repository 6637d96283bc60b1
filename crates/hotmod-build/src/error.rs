use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The compile step finished without producing a single module
    /// artifact; the packaging pipeline must not run.
    #[error("compilation produced no module artifacts in `{staging_dir}`")]
    NoOutput { staging_dir: PathBuf },
    #[error("compiler backend failed: {source}")]
    Backend {
        #[source]
        source: anyhow::Error,
    },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// A configured module is missing its binary or symbol artifact.
    /// Publishing is all-or-nothing, so nothing was written.
    #[error("missing {kind} artifact for module `{module}` at `{path}`")]
    MissingArtifact {
        module: String,
        kind: &'static str,
        path: PathBuf,
    },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content index refresh failed: {0}")]
    Refresh(#[from] hotmod_store::StoreError),
}

impl PublishError {
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("unsupported build target `{target}`")]
    UnsupportedPlatform { target: String },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileError {
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

/// One library the reconciler could not bring over; recorded in the report
/// while the remaining libraries are still processed.
#[derive(Debug, Error)]
#[error("`{library}`: {details}")]
pub struct ReconcileItemError {
    pub library: String,
    pub details: String,
}

impl ReconcileItemError {
    pub fn missing_source(library: impl Into<String>, path: &Path) -> Self {
        Self {
            library: library.into(),
            details: format!("source artifact not found at `{}`", path.display()),
        }
    }

    pub fn io(library: impl Into<String>, error: &std::io::Error) -> Self {
        Self {
            library: library.into(),
            details: error.to_string(),
        }
    }
}
