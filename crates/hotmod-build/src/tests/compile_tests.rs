use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::bail;
use hotmod_core::ModuleSpec;

use crate::compile::{CompileOptions, CompilerBackend, compile_modules};
use crate::dispatch::{ambient_dispatcher, dispatch_channel};
use crate::error::CompileError;

fn spec(name: &str) -> ModuleSpec {
    ModuleSpec {
        name: name.to_string(),
        package: name.to_lowercase(),
    }
}

fn options(staging_dir: &Path, modules: &[&str]) -> CompileOptions {
    CompileOptions {
        modules: modules.iter().map(|name| spec(name)).collect(),
        staging_dir: staging_dir.to_path_buf(),
        development: false,
    }
}

/// Backend that stages the configured pairs, records whether an ambient
/// dispatcher was installed while it ran, and optionally fails.
struct StagingBackend {
    stage: Vec<String>,
    stage_symbols: bool,
    fail: bool,
    saw_ambient: Arc<AtomicBool>,
}

impl StagingBackend {
    fn staging(modules: &[&str]) -> Self {
        Self {
            stage: modules.iter().map(|name| name.to_string()).collect(),
            stage_symbols: true,
            fail: false,
            saw_ambient: Arc::new(AtomicBool::new(false)),
        }
    }

    fn empty() -> Self {
        Self::staging(&[])
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }
}

impl CompilerBackend for StagingBackend {
    fn compile(&self, options: &CompileOptions) -> anyhow::Result<()> {
        self.saw_ambient
            .store(ambient_dispatcher().is_some(), Ordering::SeqCst);
        if self.fail {
            bail!("toolchain exploded");
        }
        for name in &self.stage {
            std::fs::write(options.staging_dir.join(format!("{name}.dll")), b"bin")?;
            if self.stage_symbols {
                std::fs::write(options.staging_dir.join(format!("{name}.pdb")), b"sym")?;
            }
            if let Some(dispatcher) = ambient_dispatcher() {
                let module = name.clone();
                dispatcher.dispatch(move || {
                    // Progress notice on the host dispatch thread.
                    let _ = module;
                });
            }
        }
        Ok(())
    }
}

#[test]
fn staged_modules_are_reported_as_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = StagingBackend::staging(&["HotUpdate"]);
    let (dispatcher, pump) = dispatch_channel();

    let artifacts = compile_modules(&backend, dispatcher, &options(dir.path(), &["HotUpdate"]))
        .expect("compile");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].module, "HotUpdate");
    assert_eq!(artifacts[0].binary_path, dir.path().join("HotUpdate.dll"));
    assert_eq!(artifacts[0].symbol_path, dir.path().join("HotUpdate.pdb"));
    assert!(backend.saw_ambient.load(Ordering::SeqCst));
    assert_eq!(pump.run_pending(), 1);
}

#[test]
fn zero_staged_artifacts_is_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = StagingBackend::empty();
    let (dispatcher, _pump) = dispatch_channel();

    let error = compile_modules(&backend, dispatcher, &options(dir.path(), &["HotUpdate"]))
        .expect_err("must fail");
    assert!(matches!(error, CompileError::NoOutput { .. }));
}

#[test]
fn backend_failure_surfaces_and_restores_the_ambient_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = StagingBackend::failing();
    let (dispatcher, _pump) = dispatch_channel();

    let error = compile_modules(&backend, dispatcher, &options(dir.path(), &["HotUpdate"]))
        .expect_err("must fail");
    assert!(matches!(error, CompileError::Backend { .. }));
    assert!(ambient_dispatcher().is_none());
}

#[test]
fn ambient_context_is_restored_after_a_successful_compile() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = StagingBackend::staging(&["HotUpdate"]);
    let (dispatcher, _pump) = dispatch_channel();

    compile_modules(&backend, dispatcher, &options(dir.path(), &["HotUpdate"]))
        .expect("compile");
    assert!(ambient_dispatcher().is_none());
}

#[test]
fn only_configured_modules_are_collected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = StagingBackend::staging(&["HotUpdate", "Stray"]);
    let (dispatcher, _pump) = dispatch_channel();

    let artifacts = compile_modules(&backend, dispatcher, &options(dir.path(), &["HotUpdate"]))
        .expect("compile");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].module, "HotUpdate");
}
