use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Logical group holding the hot-update module binaries.
pub const CODE_GROUP: &str = "code";
/// Logical group holding the trimmed base-runtime metadata artifacts.
pub const AOT_GROUP: &str = "aot";

/// Suffix every packaged artifact carries so the content pipeline treats it
/// as an opaque binary blob.
pub const PACKED_SUFFIX: &str = ".bytes";

pub const DEFAULT_MODULE_NAME: &str = "HotUpdate";

/// Base-runtime libraries whose trimmed metadata must ship alongside the
/// module for its type references to resolve at runtime.
pub const AOT_LIBRARY_SET: &[&str] = &["mscorlib.dll", "System.dll", "System.Core.dll"];

/// `<Name>.dll.bytes` — packaged file name of a module binary.
pub fn module_binary_file(module_name: &str) -> String {
    format!("{module_name}.dll{PACKED_SUFFIX}")
}

/// `<Name>.pdb.bytes` — packaged file name of a module symbol blob.
pub fn module_symbol_file(module_name: &str) -> String {
    format!("{module_name}.pdb{PACKED_SUFFIX}")
}

/// `<Name>.dll` — key the content store reports a module binary under.
pub fn module_binary_key(module_name: &str) -> String {
    format!("{module_name}.dll")
}

/// `<Library>.bytes` — packaged file name of a metadata artifact.
pub fn packed_artifact_name(library: &str) -> String {
    format!("{library}{PACKED_SUFFIX}")
}

/// Strips the packaging suffix from a stored file name, yielding the logical
/// artifact key (`HotUpdate.dll.bytes` -> `HotUpdate.dll`).
pub fn strip_packed_suffix(file_name: &str) -> &str {
    file_name.strip_suffix(PACKED_SUFFIX).unwrap_or(file_name)
}

/// Where packaged content lives on disk, both for the publisher writing it
/// and for the local-fallback read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLayout {
    pub content_root: PathBuf,
}

impl ContentLayout {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    pub fn code_dir(&self) -> PathBuf {
        self.content_root.join(CODE_GROUP)
    }

    pub fn aot_dir(&self) -> PathBuf {
        self.content_root.join(AOT_GROUP)
    }

    /// Local-fallback path of a module binary.
    pub fn module_binary_path(&self, module_name: &str) -> PathBuf {
        self.code_dir().join(module_binary_file(module_name))
    }
}

impl Default for ContentLayout {
    fn default() -> Self {
        Self::new(Path::new("bundles"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packaged_names_follow_the_store_convention() {
        assert_eq!(module_binary_file("HotUpdate"), "HotUpdate.dll.bytes");
        assert_eq!(module_symbol_file("HotUpdate"), "HotUpdate.pdb.bytes");
        assert_eq!(module_binary_key("HotUpdate"), "HotUpdate.dll");
        assert_eq!(packed_artifact_name("mscorlib.dll"), "mscorlib.dll.bytes");
    }

    #[test]
    fn strip_packed_suffix_only_removes_the_trailing_suffix() {
        assert_eq!(strip_packed_suffix("HotUpdate.dll.bytes"), "HotUpdate.dll");
        assert_eq!(strip_packed_suffix("HotUpdate.dll"), "HotUpdate.dll");
        assert_eq!(strip_packed_suffix("bytes"), "bytes");
    }

    #[test]
    fn layout_paths_are_rooted_at_the_content_root() {
        let layout = ContentLayout::new("/srv/content");
        assert_eq!(layout.code_dir(), PathBuf::from("/srv/content/code"));
        assert_eq!(layout.aot_dir(), PathBuf::from("/srv/content/aot"));
        assert_eq!(
            layout.module_binary_path("HotUpdate"),
            PathBuf::from("/srv/content/code/HotUpdate.dll.bytes")
        );
    }
}
