use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hotmod_core::strip_packed_suffix;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::{ArtifactMap, ContentStore};

/// Content store backed by the packaged content tree on the local
/// filesystem; one directory per artifact group.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentStore for DirStore {
    async fn fetch_group(&self, group: &str) -> Result<ArtifactMap> {
        let dir = self.root.join(group);
        let mut out = ArtifactMap::new();
        if !dir.exists() {
            debug!(
                target: "hotmod_store::dir",
                group,
                dir = %dir.display(),
                "group directory absent, yielding empty artifact map"
            );
            return Ok(out);
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| StoreError::io_at(&dir, source))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| StoreError::io_at(&dir, source))?
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| StoreError::io_at(&path, source))?;
            out.insert(strip_packed_suffix(file_name).to_string(), bytes);
        }

        debug!(
            target: "hotmod_store::dir",
            group,
            artifacts = out.len(),
            "fetched artifact group from local content tree"
        );
        Ok(out)
    }

    fn refresh(&self) -> Result<()> {
        // Reads always hit the filesystem directly; there is no index to
        // invalidate.
        Ok(())
    }
}
