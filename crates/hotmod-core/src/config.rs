use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::DEFAULT_MODULE_NAME;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at `{path}`: {source}")]
    JsonAt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How the content-delivery layer sources its artifacts. Consumed by the
/// store initializer, not by the loader itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Serve artifacts straight from the working tree, no packaging step.
    Simulate,
    /// Everything ships inside the host package; nothing is fetched.
    Offline,
    /// Artifacts are fetched from a remote content host.
    Host,
}

/// One hot-update module: its logical name and the cargo package that
/// builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub package: String,
}

/// Offline build tooling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_modules")]
    pub modules: Vec<ModuleSpec>,
    /// Where compiled module artifacts are staged before publishing.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Root of the trimmed base-runtime metadata tree, one folder per
    /// platform under it.
    #[serde(default = "default_aot_source_root")]
    pub aot_source_root: PathBuf,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            modules: default_modules(),
            staging_dir: default_staging_dir(),
            aot_source_root: default_aot_source_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Source of truth for whether the module is fetched over the network
    /// (`true`) or read from the locally bundled content (`false`).
    pub enable_remote: bool,
    pub operating_mode: OperatingMode,
    /// Root of the packaged content tree.
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
    /// Base URL of the remote content host; required when `enable_remote`
    /// and `operating_mode` is `host`.
    #[serde(default)]
    pub remote_root: Option<String>,
    #[serde(default)]
    pub build: BuildSettings,
}

impl GlobalConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::IoAt {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::JsonAt {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            enable_remote: false,
            operating_mode: OperatingMode::Offline,
            content_root: default_content_root(),
            remote_root: None,
            build: BuildSettings::default(),
        }
    }
}

fn default_content_root() -> PathBuf {
    PathBuf::from("bundles")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("target/hotmod-stage")
}

fn default_aot_source_root() -> PathBuf {
    PathBuf::from("metadata/stripped")
}

fn default_modules() -> Vec<ModuleSpec> {
    vec![ModuleSpec {
        name: DEFAULT_MODULE_NAME.to_string(),
        package: "hello-module".to_string(),
    }]
}
