use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use hotmod_core::strip_packed_suffix;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::{ArtifactMap, ContentStore};

/// Per-group artifact listing served by the content host at
/// `<base>/<group>/index.json`.
#[derive(Debug, Deserialize)]
struct GroupIndex {
    artifacts: Vec<String>,
}

/// Content store backed by a remote content host.
///
/// Each group is described by an `index.json` naming its artifacts; blobs
/// are fetched individually and written through to a local cache directory
/// so a later offline inspection can see what the host served. The index is
/// memoized per group until [`ContentStore::refresh`] is called.
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
    cache_dir: Option<PathBuf>,
    index_cache: Mutex<HashMap<String, Vec<String>>>,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            cache_dir: None,
            index_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Enables write-through caching of fetched blobs under `cache_dir`.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    async fn fetch_index(&self, group: &str) -> Result<Vec<String>> {
        if let Some(names) = self.index_cache.lock().get(group) {
            return Ok(names.clone());
        }

        let url = format!("{}/{group}/index.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| StoreError::fetch(group, error.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(
                target: "hotmod_store::http",
                group,
                url = %url,
                "group index absent on content host"
            );
            return Ok(Vec::new());
        }
        let response = response
            .error_for_status()
            .map_err(|error| StoreError::fetch(group, error.to_string()))?;
        let index: GroupIndex = response
            .json()
            .await
            .map_err(|error| StoreError::invalid_index(group, error.to_string()))?;

        self.index_cache
            .lock()
            .insert(group.to_string(), index.artifacts.clone());
        Ok(index.artifacts)
    }

    async fn fetch_blob(&self, group: &str, name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{group}/{name}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| StoreError::fetch(group, error.to_string()))?
            .error_for_status()
            .map_err(|error| StoreError::fetch(group, error.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|error| StoreError::fetch(group, error.to_string()))?
            .to_vec();

        if let Some(cache_dir) = &self.cache_dir {
            let group_dir = cache_dir.join(group);
            let target = group_dir.join(name);
            let cached: Result<()> = async {
                tokio::fs::create_dir_all(&group_dir)
                    .await
                    .map_err(|source| StoreError::io_at(&group_dir, source))?;
                tokio::fs::write(&target, &bytes)
                    .await
                    .map_err(|source| StoreError::io_at(&target, source))
            }
            .await;
            if let Err(error) = cached {
                warn!(
                    target: "hotmod_store::http",
                    group,
                    artifact = name,
                    "failed to write blob to cache: {error}"
                );
            }
        }

        Ok(bytes)
    }
}

#[async_trait]
impl ContentStore for HttpStore {
    async fn fetch_group(&self, group: &str) -> Result<ArtifactMap> {
        let names = self.fetch_index(group).await?;
        let mut out = ArtifactMap::with_capacity(names.len());
        for name in &names {
            let bytes = self.fetch_blob(group, name).await?;
            out.insert(strip_packed_suffix(name).to_string(), bytes);
        }
        debug!(
            target: "hotmod_store::http",
            group,
            artifacts = out.len(),
            "fetched artifact group from content host"
        );
        Ok(out)
    }

    fn refresh(&self) -> Result<()> {
        self.index_cache.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let store = HttpStore::new("http://content.example/v1/");
        assert_eq!(store.base_url, "http://content.example/v1");
    }

    #[test]
    fn refresh_clears_the_index_cache() {
        let store = HttpStore::new("http://content.example");
        store
            .index_cache
            .lock()
            .insert("code".to_string(), vec!["HotUpdate.dll.bytes".to_string()]);
        store.refresh().expect("refresh");
        assert!(store.index_cache.lock().is_empty());
    }
}
