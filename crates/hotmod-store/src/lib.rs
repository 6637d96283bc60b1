//! Content-store access for packaged module artifacts.
//!
//! A store hands out whole artifact groups: every blob stored under one
//! logical path prefix, keyed by artifact name with the packaging suffix
//! stripped (`HotUpdate.dll.bytes` keys as `HotUpdate.dll`). Implementations
//! cover the locally bundled content tree ([`DirStore`]), a remote content
//! host with a write-through cache ([`HttpStore`]), and an in-memory fake
//! for tests ([`MemoryStore`]).

mod dir_store;
pub mod error;
mod http_store;
mod memory;

use std::collections::HashMap;

use async_trait::async_trait;

pub use dir_store::DirStore;
pub use error::{Result, StoreError};
pub use http_store::HttpStore;
pub use memory::MemoryStore;

/// Map of artifact key to raw content bytes.
pub type ArtifactMap = HashMap<String, Vec<u8>>;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetches every artifact stored under the logical `group` prefix.
    ///
    /// A group that simply has no artifacts yields an empty map; transport
    /// and index failures are errors.
    async fn fetch_group(&self, group: &str) -> Result<ArtifactMap>;

    /// Invalidates any index the store holds so the next fetch observes
    /// freshly published artifacts.
    fn refresh(&self) -> Result<()>;
}
