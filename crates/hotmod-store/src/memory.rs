use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::{ArtifactMap, ContentStore};

/// In-memory content store for tests and local tooling. Records every
/// fetch and refresh so callers can assert on store traffic.
#[derive(Default)]
pub struct MemoryStore {
    groups: Mutex<HashMap<String, ArtifactMap>>,
    failing_groups: Mutex<HashMap<String, String>>,
    fetched: Mutex<Vec<String>>,
    refreshes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, group: &str, artifact_key: &str, bytes: impl Into<Vec<u8>>) {
        self.groups
            .lock()
            .entry(group.to_string())
            .or_default()
            .insert(artifact_key.to_string(), bytes.into());
    }

    /// Makes every subsequent fetch of `group` fail with `details`.
    pub fn fail_group(&self, group: &str, details: &str) {
        self.failing_groups
            .lock()
            .insert(group.to_string(), details.to_string());
    }

    /// Groups fetched so far, in call order.
    pub fn fetched_groups(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().len()
    }

    pub fn refresh_count(&self) -> usize {
        *self.refreshes.lock()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_group(&self, group: &str) -> Result<ArtifactMap> {
        self.fetched.lock().push(group.to_string());
        if let Some(details) = self.failing_groups.lock().get(group) {
            return Err(StoreError::fetch(group, details.clone()));
        }
        Ok(self.groups.lock().get(group).cloned().unwrap_or_default())
    }

    fn refresh(&self) -> Result<()> {
        *self.refreshes.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_fetches_and_serves_inserted_artifacts() {
        let store = MemoryStore::new();
        store.insert("code", "HotUpdate.dll", b"bin".as_slice());

        let artifacts = store.fetch_group("code").await.expect("fetch");
        assert_eq!(artifacts["HotUpdate.dll"], b"bin");
        assert_eq!(store.fetched_groups(), vec!["code".to_string()]);
    }

    #[tokio::test]
    async fn failing_group_errors_and_still_records_the_fetch() {
        let store = MemoryStore::new();
        store.fail_group("code", "content host unreachable");

        let error = store.fetch_group("code").await.expect_err("must fail");
        assert!(matches!(error, StoreError::Fetch { .. }));
        assert_eq!(store.fetch_count(), 1);
    }
}
