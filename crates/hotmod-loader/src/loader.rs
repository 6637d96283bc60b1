use std::fmt;
use std::sync::Arc;

use hotmod_core::{
    AOT_GROUP, AOT_LIBRARY_SET, CODE_GROUP, ContentLayout, GlobalConfig, module_binary_key,
};
use hotmod_store::{ArtifactMap, ContentStore};
use tracing::{error, info, warn};

use crate::error::{LoadError, Result};
use crate::runtime::{ModuleHandle, ModuleRuntime};
use crate::state::LoadState;

/// Where the resident module's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleOrigin {
    Remote,
    LocalFallback,
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleOrigin::Remote => f.write_str("remote"),
            ModuleOrigin::LocalFallback => f.write_str("local-fallback"),
        }
    }
}

/// The single module resident in this process.
#[derive(Debug)]
pub struct Module {
    name: String,
    origin: ModuleOrigin,
    handle: Box<dyn ModuleHandle>,
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> ModuleOrigin {
        self.origin
    }
}

/// Owns the hot-update module lifecycle: fetches the packaged artifacts,
/// selects the byte source, maps the module into the process, and invokes
/// its entry point. One instance per process run; the resident module slot
/// and the state machine are exclusively owned here.
///
/// Collaborators are injected at construction; the loader never reaches for
/// process-wide state.
pub struct CodeLoader {
    store: Arc<dyn ContentStore>,
    runtime: Arc<dyn ModuleRuntime>,
    layout: ContentLayout,
    module_name: String,
    state: LoadState,
    enable_remote: bool,
    downloaded_code: ArtifactMap,
    module: Option<Module>,
}

impl CodeLoader {
    pub fn new(
        store: Arc<dyn ContentStore>,
        runtime: Arc<dyn ModuleRuntime>,
        layout: ContentLayout,
        module_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            runtime,
            layout,
            module_name: module_name.into(),
            state: LoadState::Idle,
            enable_remote: false,
            downloaded_code: ArtifactMap::new(),
            module: None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Fetches the module code group and the base-runtime metadata group
    /// from the content store in one awaited batch.
    ///
    /// Single-flight: only legal from `Idle`. With remote delivery disabled
    /// this is a no-op success; the module is read from the bundled content
    /// at load time instead. Any fetch failure is terminal for this loader
    /// and propagates to the caller unchanged; nothing is retried here.
    pub async fn download(&mut self, config: &GlobalConfig) -> Result<()> {
        if self.state != LoadState::Idle {
            return Err(LoadError::invalid_state(LoadState::Idle, self.state));
        }
        self.enable_remote = config.enable_remote;
        self.state = LoadState::Downloading;

        if !self.enable_remote {
            info!(
                target: "hotmod_loader::download",
                module = %self.module_name,
                "remote delivery disabled, module will load from bundled content"
            );
            self.state = LoadState::Downloaded;
            return Ok(());
        }

        let fetched = tokio::try_join!(
            self.store.fetch_group(CODE_GROUP),
            self.store.fetch_group(AOT_GROUP)
        );
        let (code, aot) = match fetched {
            Ok(groups) => groups,
            Err(source) => {
                self.state = LoadState::Failed;
                error!(
                    target: "hotmod_loader::download",
                    module = %self.module_name,
                    "download stage failed: {source}"
                );
                return Err(source.into());
            }
        };

        warn_missing_aot_artifacts(&aot);
        info!(
            target: "hotmod_loader::download",
            module = %self.module_name,
            code_artifacts = code.len(),
            aot_artifacts = aot.len(),
            "module content downloaded"
        );
        self.downloaded_code = code;
        self.state = LoadState::Downloaded;
        Ok(())
    }

    /// Maps the module into the process from the downloaded content or the
    /// local fallback file, depending on how [`CodeLoader::download`] was
    /// configured. Only legal from `Downloaded`; a repeat call is a
    /// contract violation and leaves the resident module untouched.
    pub fn load_module(&mut self) -> Result<()> {
        if self.state != LoadState::Downloaded {
            return Err(LoadError::invalid_state(LoadState::Downloaded, self.state));
        }

        let (bytes, origin) = self.select_module_bytes()?;
        let handle = self.runtime.load(&self.module_name, &bytes).map_err(|source| {
            error!(
                target: "hotmod_loader::load",
                module = %self.module_name,
                origin = %origin,
                "load stage failed: {source}"
            );
            source
        })?;

        info!(
            target: "hotmod_loader::load",
            module = %self.module_name,
            origin = %origin,
            bytes = bytes.len(),
            "module loaded"
        );
        self.module = Some(Module {
            name: self.module_name.clone(),
            origin,
            handle,
        });
        self.state = LoadState::Loaded;
        Ok(())
    }

    /// The resident module. Never triggers a load.
    pub fn module(&self) -> Result<&Module> {
        self.module.as_ref().ok_or(LoadError::NotLoaded)
    }

    /// Invokes the resident module's entry point. A zero status activates
    /// the module; anything else fails the loader terminally.
    pub fn activate(&mut self) -> Result<()> {
        if self.state != LoadState::Loaded {
            return Err(LoadError::invalid_state(LoadState::Loaded, self.state));
        }
        let module = self.module.as_ref().ok_or(LoadError::NotLoaded)?;

        let status = match module.handle.invoke_entry() {
            Ok(status) => status,
            Err(source) => {
                self.state = LoadState::Failed;
                error!(
                    target: "hotmod_loader::activate",
                    module = %self.module_name,
                    "entry-point stage failed: {source}"
                );
                return Err(source);
            }
        };
        if status != 0 {
            self.state = LoadState::Failed;
            let source = LoadError::EntryFailed {
                module: self.module_name.clone(),
                status,
            };
            error!(
                target: "hotmod_loader::activate",
                module = %self.module_name,
                status,
                "entry-point stage failed: {source}"
            );
            return Err(source);
        }

        info!(
            target: "hotmod_loader::activate",
            module = %self.module_name,
            "module activated"
        );
        self.state = LoadState::Activated;
        Ok(())
    }

    fn select_module_bytes(&self) -> Result<(Vec<u8>, ModuleOrigin)> {
        if self.enable_remote {
            let key = module_binary_key(&self.module_name);
            let bytes = self
                .downloaded_code
                .get(&key)
                .ok_or_else(|| LoadError::missing_key(&key))?;
            return Ok((bytes.clone(), ModuleOrigin::Remote));
        }

        let path = self.layout.module_binary_path(&self.module_name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::file_not_found(path));
            }
            Err(source) => return Err(LoadError::io_at(path, source)),
        };
        Ok((bytes, ModuleOrigin::LocalFallback))
    }
}

/// The metadata set is fixed; a missing member is not fatal to the fetch
/// pipeline, but the module's type references will fail to resolve later,
/// so say so now.
fn warn_missing_aot_artifacts(aot: &ArtifactMap) {
    for library in AOT_LIBRARY_SET {
        if !aot.contains_key(*library) {
            warn!(
                target: "hotmod_loader::download",
                library,
                "base-runtime metadata artifact missing from downloaded content"
            );
        }
    }
}
