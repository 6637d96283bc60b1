use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use hotmod_module_api::{HOTMOD_MODULE_ENTRY_SYMBOL, ModuleEntryFn};
use libloading::{Library, Symbol};
use tracing::debug;

use crate::error::{LoadError, Result};

/// Turns raw module bytes into an executable module resident in the
/// process. Seam between the loader state machine and the platform's
/// dynamic-library machinery.
pub trait ModuleRuntime: Send + Sync {
    /// Loads `bytes` as module `name` and resolves its entry point.
    fn load(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn ModuleHandle>>;
}

/// A module resident in the process.
pub trait ModuleHandle: Send + std::fmt::Debug {
    /// Invokes the module's parameterless entry point and returns its
    /// status code.
    fn invoke_entry(&self) -> Result<i32>;
}

static SHADOW_SEQ: AtomicU64 = AtomicU64::new(0);

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn dynamic_library_ext() -> &'static str {
    match std::env::consts::OS {
        "windows" => "dll",
        "linux" => "so",
        "macos" => "dylib",
        _ => "bin",
    }
}

/// `<ts>-<pid>-<seq>-<Name>.<ext>` — unique per load so a crashed run's
/// leftovers never collide with the current process.
fn shadow_file_name(module_name: &str) -> String {
    let seq = SHADOW_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{seq}-{module_name}.{}",
        now_unix_ms(),
        std::process::id(),
        dynamic_library_ext()
    )
}

/// Loads modules through the operating system's dynamic loader.
///
/// The module arrives as bytes (downloaded or read from the bundled
/// content), so it is first written to a private shadow file and then
/// mapped from there. The entry symbol is resolved at load time; a module
/// without it never becomes resident.
pub struct NativeModuleRuntime {
    shadow_dir: PathBuf,
}

impl NativeModuleRuntime {
    pub fn new(shadow_dir: impl Into<PathBuf>) -> Self {
        Self {
            shadow_dir: shadow_dir.into(),
        }
    }

    pub fn shadow_dir(&self) -> &Path {
        &self.shadow_dir
    }

    fn write_shadow(&self, module_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.shadow_dir)
            .map_err(|source| LoadError::io_at(&self.shadow_dir, source))?;
        let path = self.shadow_dir.join(shadow_file_name(module_name));
        std::fs::write(&path, bytes).map_err(|source| LoadError::io_at(&path, source))?;
        Ok(path)
    }
}

impl ModuleRuntime for NativeModuleRuntime {
    fn load(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn ModuleHandle>> {
        let shadow_path = self.write_shadow(name, bytes)?;

        // SAFETY: loading a dynamic library and resolving its entrypoint is
        // inherently unsafe; the module is trusted host code by contract.
        let library = unsafe { Library::new(&shadow_path) }
            .map_err(|error| LoadError::library(name, error.to_string()))?;

        // SAFETY: symbol type matches the module ABI contract.
        let entry: Symbol<'_, ModuleEntryFn> = unsafe {
            library
                .get(HOTMOD_MODULE_ENTRY_SYMBOL.as_bytes())
                .map_err(|_| LoadError::entry_point_not_found(name, HOTMOD_MODULE_ENTRY_SYMBOL))?
        };
        let entry = *entry;

        debug!(
            target: "hotmod_loader::runtime",
            module = name,
            shadow = %shadow_path.display(),
            "module mapped into process"
        );
        Ok(Box::new(NativeModuleHandle {
            module_name: name.to_string(),
            entry,
            shadow_path,
            _library: library,
        }))
    }
}

#[derive(Debug)]
struct NativeModuleHandle {
    module_name: String,
    /// Raw entry pointer; valid for as long as `_library` stays mapped.
    entry: ModuleEntryFn,
    shadow_path: PathBuf,
    _library: Library,
}

impl ModuleHandle for NativeModuleHandle {
    fn invoke_entry(&self) -> Result<i32> {
        debug!(
            target: "hotmod_loader::runtime",
            module = %self.module_name,
            shadow = %self.shadow_path.display(),
            "invoking module entry point"
        );
        // SAFETY: `entry` was resolved from `_library`, which this handle
        // keeps mapped; the entry point takes no arguments by contract.
        Ok(unsafe { (self.entry)() })
    }
}
