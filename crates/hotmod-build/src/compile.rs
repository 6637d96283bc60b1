use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use hotmod_core::ModuleSpec;
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchGuard, Dispatcher, ambient_dispatcher};
use crate::error::CompileError;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub modules: Vec<ModuleSpec>,
    /// Where the backend leaves the canonical `<Name>.dll` / `<Name>.pdb`
    /// pairs.
    pub staging_dir: PathBuf,
    /// Development build: unoptimized, with full debug info.
    pub development: bool,
}

/// One compiled module pair in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub module: String,
    pub binary_path: PathBuf,
    pub symbol_path: PathBuf,
}

/// Produces module binaries in the staging directory. Seam between the
/// compile step and the actual toolchain.
pub trait CompilerBackend: Send + Sync {
    fn compile(&self, options: &CompileOptions) -> anyhow::Result<()>;
}

/// Compiles the configured modules and reports the staged artifacts.
///
/// The backend runs with `dispatcher` installed as the thread's ambient
/// dispatch context; whatever was ambient before is restored on every exit
/// path. Zero staged artifacts is [`CompileError::NoOutput`] so the caller
/// can abort the packaging pipeline cleanly.
pub fn compile_modules(
    backend: &dyn CompilerBackend,
    dispatcher: Dispatcher,
    options: &CompileOptions,
) -> Result<Vec<BuildArtifact>, CompileError> {
    std::fs::create_dir_all(&options.staging_dir)
        .map_err(|source| CompileError::io_at(&options.staging_dir, source))?;

    {
        let _guard = DispatchGuard::enter(dispatcher);
        backend
            .compile(options)
            .map_err(|source| CompileError::Backend { source })?;
    }

    let artifacts = collect_artifacts(options);
    if artifacts.is_empty() {
        return Err(CompileError::NoOutput {
            staging_dir: options.staging_dir.clone(),
        });
    }
    info!(
        target: "hotmod_build::compile",
        artifacts = artifacts.len(),
        staging_dir = %options.staging_dir.display(),
        "module compilation finished"
    );
    Ok(artifacts)
}

fn collect_artifacts(options: &CompileOptions) -> Vec<BuildArtifact> {
    let mut out = Vec::new();
    for spec in &options.modules {
        let binary_path = options.staging_dir.join(format!("{}.dll", spec.name));
        if !binary_path.exists() {
            debug!(
                target: "hotmod_build::compile",
                module = %spec.name,
                "no staged binary for module"
            );
            continue;
        }
        out.push(BuildArtifact {
            module: spec.name.clone(),
            binary_path,
            symbol_path: options.staging_dir.join(format!("{}.pdb", spec.name)),
        });
    }
    out
}

/// Backend that builds each module's cargo package as a cdylib and stages
/// the result under the canonical artifact names.
pub struct CargoBackend {
    workspace_dir: PathBuf,
    target_dir: PathBuf,
}

impl CargoBackend {
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        let workspace_dir = workspace_dir.into();
        let target_dir = workspace_dir.join("target");
        Self {
            workspace_dir,
            target_dir,
        }
    }

    fn built_library_path(&self, package: &str, profile: &str) -> PathBuf {
        let lib_stem = package.replace('-', "_");
        self.target_dir.join(profile).join(format!(
            "{}{lib_stem}{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        ))
    }

    fn stage_symbols(
        &self,
        spec: &ModuleSpec,
        built: &Path,
        profile: &str,
        staging_dir: &Path,
    ) -> anyhow::Result<()> {
        let staged = staging_dir.join(format!("{}.pdb", spec.name));

        // Windows toolchains emit split debug info next to the library;
        // elsewhere it stays in the binary and objcopy extracts it.
        let lib_stem = spec.package.replace('-', "_");
        let pdb = self.target_dir.join(profile).join(format!("{lib_stem}.pdb"));
        if pdb.exists() {
            std::fs::copy(&pdb, &staged)
                .with_context(|| format!("stage symbols for `{}`", spec.name))?;
            return Ok(());
        }

        let status = Command::new("objcopy")
            .arg("--only-keep-debug")
            .arg(built)
            .arg(&staged)
            .status();
        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                warn!(
                    target: "hotmod_build::compile",
                    module = %spec.name,
                    code = status.code().unwrap_or(-1),
                    "objcopy failed, no symbol artifact staged"
                );
                Ok(())
            }
            Err(error) => {
                warn!(
                    target: "hotmod_build::compile",
                    module = %spec.name,
                    "objcopy unavailable ({error}), no symbol artifact staged"
                );
                Ok(())
            }
        }
    }
}

impl CompilerBackend for CargoBackend {
    fn compile(&self, options: &CompileOptions) -> anyhow::Result<()> {
        let profile = if options.development {
            "debug"
        } else {
            "release"
        };
        for spec in &options.modules {
            let mut cmd = Command::new("cargo");
            cmd.current_dir(&self.workspace_dir)
                .arg("build")
                .arg("-p")
                .arg(&spec.package);
            if !options.development {
                cmd.arg("--release");
            }
            let status = cmd
                .status()
                .with_context(|| format!("spawn cargo build for `{}`", spec.package))?;
            if !status.success() {
                bail!(
                    "cargo build for `{}` exited with {}",
                    spec.package,
                    status.code().unwrap_or(-1)
                );
            }

            let built = self.built_library_path(&spec.package, profile);
            if !built.exists() {
                bail!(
                    "built library for `{}` not found at `{}`",
                    spec.package,
                    built.display()
                );
            }
            let staged = options.staging_dir.join(format!("{}.dll", spec.name));
            std::fs::copy(&built, &staged)
                .with_context(|| format!("stage binary for `{}`", spec.name))?;
            self.stage_symbols(spec, &built, profile, &options.staging_dir)?;

            if let Some(dispatcher) = ambient_dispatcher() {
                let module = spec.name.clone();
                dispatcher.dispatch(move || {
                    info!(
                        target: "hotmod_build::compile",
                        module = %module,
                        "module staged"
                    );
                });
            }
        }
        Ok(())
    }
}
