use std::path::Path;
use std::sync::Arc;

use hotmod_core::{ContentLayout, DEFAULT_MODULE_NAME, GlobalConfig, OperatingMode};
use hotmod_module_api::HOTMOD_MODULE_ENTRY_SYMBOL;
use hotmod_store::MemoryStore;
use parking_lot::Mutex;

use crate::error::{LoadError, Result};
use crate::loader::{CodeLoader, ModuleOrigin};
use crate::runtime::{ModuleHandle, ModuleRuntime};
use crate::state::LoadState;

#[derive(Default, Debug)]
struct FakeRuntimeState {
    loads: Mutex<Vec<String>>,
    reject_entry_symbol: Mutex<bool>,
    entry_status: Mutex<i32>,
    entry_error: Mutex<bool>,
    invocations: Mutex<usize>,
}

#[derive(Default)]
struct FakeRuntime {
    state: Arc<FakeRuntimeState>,
}

impl FakeRuntime {
    fn state(&self) -> Arc<FakeRuntimeState> {
        Arc::clone(&self.state)
    }
}

impl ModuleRuntime for FakeRuntime {
    fn load(&self, name: &str, _bytes: &[u8]) -> Result<Box<dyn ModuleHandle>> {
        self.state.loads.lock().push(name.to_string());
        if *self.state.reject_entry_symbol.lock() {
            return Err(LoadError::entry_point_not_found(
                name,
                HOTMOD_MODULE_ENTRY_SYMBOL,
            ));
        }
        Ok(Box::new(FakeHandle {
            module: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct FakeHandle {
    module: String,
    state: Arc<FakeRuntimeState>,
}

impl ModuleHandle for FakeHandle {
    fn invoke_entry(&self) -> Result<i32> {
        *self.state.invocations.lock() += 1;
        if *self.state.entry_error.lock() {
            return Err(LoadError::library(&self.module, "entry point trapped"));
        }
        Ok(*self.state.entry_status.lock())
    }
}

fn config(enable_remote: bool, content_root: &Path) -> GlobalConfig {
    GlobalConfig {
        enable_remote,
        operating_mode: if enable_remote {
            OperatingMode::Host
        } else {
            OperatingMode::Offline
        },
        content_root: content_root.to_path_buf(),
        ..GlobalConfig::default()
    }
}

fn new_loader(
    store: &Arc<MemoryStore>,
    runtime: FakeRuntime,
    content_root: &Path,
) -> CodeLoader {
    CodeLoader::new(
        Arc::clone(store) as Arc<dyn hotmod_store::ContentStore>,
        Arc::new(runtime),
        ContentLayout::new(content_root),
        DEFAULT_MODULE_NAME,
    )
}

fn write_local_module(content_root: &Path) {
    let code_dir = content_root.join("code");
    std::fs::create_dir_all(&code_dir).expect("create code dir");
    std::fs::write(code_dir.join("HotUpdate.dll.bytes"), b"module bytes")
        .expect("write module file");
}

#[tokio::test]
async fn local_fallback_end_to_end_reaches_activated_without_fetching() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let runtime = FakeRuntime::default();
    let runtime_state = runtime.state();
    let mut loader = new_loader(&store, runtime, dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download is a no-op success");
    assert_eq!(store.fetch_count(), 0);
    assert_eq!(loader.state(), LoadState::Downloaded);

    loader.load_module().expect("load module");
    assert_eq!(
        loader.module().expect("module resident").origin(),
        ModuleOrigin::LocalFallback
    );

    loader.activate().expect("activate");
    assert_eq!(loader.state(), LoadState::Activated);
    assert_eq!(*runtime_state.invocations.lock(), 1);
}

#[tokio::test]
async fn local_fallback_without_the_bundled_file_is_file_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryStore::new());
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    let error = loader.load_module().expect_err("must fail");
    assert!(matches!(error, LoadError::FileNotFound { .. }));
    assert!(loader.module().is_err());
}

#[tokio::test]
async fn remote_module_loads_from_downloaded_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryStore::new());
    store.insert("code", "HotUpdate.dll", b"remote bytes".as_slice());
    store.insert("aot", "mscorlib.dll", b"metadata".as_slice());
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    loader
        .download(&config(true, dir.path()))
        .await
        .expect("download");
    let fetched = store.fetched_groups();
    assert_eq!(fetched.len(), 2);
    assert!(fetched.contains(&"code".to_string()));
    assert!(fetched.contains(&"aot".to_string()));

    loader.load_module().expect("load module");
    assert_eq!(
        loader.module().expect("module resident").origin(),
        ModuleOrigin::Remote
    );
}

#[tokio::test]
async fn remote_content_missing_the_module_key_is_missing_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryStore::new());
    store.insert("code", "Other.dll", b"unrelated".as_slice());
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    loader
        .download(&config(true, dir.path()))
        .await
        .expect("download");
    let error = loader.load_module().expect_err("must fail");
    match error {
        LoadError::MissingKey { key } => assert_eq!(key, "HotUpdate.dll"),
        other => panic!("expected MissingKey, got {other}"),
    }
}

#[tokio::test]
async fn fetch_failure_fails_the_loader_terminally() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryStore::new());
    store.fail_group("code", "content host unreachable");
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    let error = loader
        .download(&config(true, dir.path()))
        .await
        .expect_err("must fail");
    assert!(matches!(error, LoadError::Store(_)));
    assert_eq!(loader.state(), LoadState::Failed);

    // Every later stage is a contract violation once the loader failed.
    let error = loader.load_module().expect_err("must fail");
    assert!(matches!(error, LoadError::InvalidState { .. }));
}

#[tokio::test]
async fn second_download_is_an_invalid_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("first download");
    let error = loader
        .download(&config(false, dir.path()))
        .await
        .expect_err("must fail");
    match error {
        LoadError::InvalidState { expected, actual } => {
            assert_eq!(expected, LoadState::Idle);
            assert_eq!(actual, LoadState::Downloaded);
        }
        other => panic!("expected InvalidState, got {other}"),
    }
}

#[tokio::test]
async fn load_before_download_is_an_invalid_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryStore::new());
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    let error = loader.load_module().expect_err("must fail");
    match error {
        LoadError::InvalidState { expected, actual } => {
            assert_eq!(expected, LoadState::Downloaded);
            assert_eq!(actual, LoadState::Idle);
        }
        other => panic!("expected InvalidState, got {other}"),
    }
}

#[tokio::test]
async fn second_load_is_rejected_and_keeps_the_resident_module() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let runtime = FakeRuntime::default();
    let runtime_state = runtime.state();
    let mut loader = new_loader(&store, runtime, dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    loader.load_module().expect("first load");
    let resident = loader.module().expect("module resident") as *const _;

    let error = loader.load_module().expect_err("must fail");
    assert!(matches!(error, LoadError::InvalidState { .. }));
    assert_eq!(runtime_state.loads.lock().len(), 1);
    assert_eq!(loader.module().expect("module resident") as *const _, resident);
}

#[tokio::test]
async fn module_accessor_is_not_loaded_until_load_succeeds_then_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let mut loader = new_loader(&store, FakeRuntime::default(), dir.path());

    assert!(matches!(
        loader.module().expect_err("must fail"),
        LoadError::NotLoaded
    ));

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    loader.load_module().expect("load module");

    let first = loader.module().expect("module resident") as *const _;
    let second = loader.module().expect("module resident") as *const _;
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_entry_symbol_surfaces_as_entry_point_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let runtime = FakeRuntime::default();
    *runtime.state.reject_entry_symbol.lock() = true;
    let mut loader = new_loader(&store, runtime, dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    let error = loader.load_module().expect_err("must fail");
    assert!(matches!(error, LoadError::EntryPointNotFound { .. }));
}

#[tokio::test]
async fn nonzero_entry_status_fails_activation_terminally() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let runtime = FakeRuntime::default();
    *runtime.state.entry_status.lock() = 3;
    let mut loader = new_loader(&store, runtime, dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    loader.load_module().expect("load module");
    let error = loader.activate().expect_err("must fail");
    match error {
        LoadError::EntryFailed { status, .. } => assert_eq!(status, 3),
        other => panic!("expected EntryFailed, got {other}"),
    }
    assert_eq!(loader.state(), LoadState::Failed);
}

#[tokio::test]
async fn entry_invocation_error_fails_activation_terminally() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let runtime = FakeRuntime::default();
    *runtime.state.entry_error.lock() = true;
    let mut loader = new_loader(&store, runtime, dir.path());

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    loader.load_module().expect("load module");
    let error = loader.activate().expect_err("must fail");
    assert!(matches!(error, LoadError::Library { .. }));
    assert_eq!(loader.state(), LoadState::Failed);
}

#[tokio::test]
async fn activate_requires_a_loaded_module_and_runs_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_local_module(dir.path());
    let store = Arc::new(MemoryStore::new());
    let runtime = FakeRuntime::default();
    let runtime_state = runtime.state();
    let mut loader = new_loader(&store, runtime, dir.path());

    let error = loader.activate().expect_err("must fail");
    assert!(matches!(error, LoadError::InvalidState { .. }));

    loader
        .download(&config(false, dir.path()))
        .await
        .expect("download");
    loader.load_module().expect("load module");
    loader.activate().expect("activate");

    let error = loader.activate().expect_err("must fail");
    assert!(matches!(error, LoadError::InvalidState { .. }));
    assert_eq!(*runtime_state.invocations.lock(), 1);
}
