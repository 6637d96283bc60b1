use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use hotmod_build::{
    CargoBackend, CompileOptions, PublishOptions, ReconcileOptions, compile_and_publish,
    dispatch_channel, reconcile_platform,
};
use hotmod_core::{AOT_LIBRARY_SET, ContentLayout, GlobalConfig, OperatingMode};
use hotmod_loader::{CodeLoader, NativeModuleRuntime};
use hotmod_store::{ContentStore, DirStore, HttpStore};
use tracing::{info, warn};

pub fn compile(config: &GlobalConfig, development: bool) -> Result<()> {
    let layout = ContentLayout::new(&config.content_root);
    let store = DirStore::new(&config.content_root);
    // Pick up anything published since the last run before compiling
    // against it.
    store.refresh().context("refresh content index")?;

    let (dispatcher, pump) = dispatch_channel();
    let backend = CargoBackend::new(std::env::current_dir().context("resolve working dir")?);
    let compile_options = CompileOptions {
        modules: config.build.modules.clone(),
        staging_dir: config.build.staging_dir.clone(),
        development,
    };
    let publish_options = PublishOptions {
        code_dir: layout.code_dir(),
    };

    let artifacts = compile_and_publish(
        &backend,
        dispatcher,
        &compile_options,
        &publish_options,
        &store,
    )?;
    pump.run_pending();

    info!(
        target: "hotmod_cli::compile",
        modules = artifacts.len(),
        "compile finished"
    );
    Ok(())
}

pub fn reconcile(config: &GlobalConfig, target: &str) -> Result<()> {
    let layout = ContentLayout::new(&config.content_root);
    let options = ReconcileOptions {
        source_root: config.build.aot_source_root.clone(),
        dest_dir: layout.aot_dir(),
        libraries: AOT_LIBRARY_SET.iter().map(|name| name.to_string()).collect(),
    };

    let report = reconcile_platform(target, &options)?;
    for error in &report.errors {
        warn!(target: "hotmod_cli::reconcile", "skipped: {error}");
    }
    info!(
        target: "hotmod_cli::reconcile",
        copied = report.copied,
        skipped = report.errors.len(),
        "reconcile finished"
    );
    Ok(())
}

pub async fn start(config: &GlobalConfig) -> Result<()> {
    let store = build_store(config)?;
    let runtime = Arc::new(NativeModuleRuntime::new(
        std::env::temp_dir().join("hotmod-shadow"),
    ));
    let layout = ContentLayout::new(&config.content_root);
    let module_name = config
        .build
        .modules
        .first()
        .map(|spec| spec.name.clone())
        .unwrap_or_else(|| hotmod_core::DEFAULT_MODULE_NAME.to_string());

    let mut loader = CodeLoader::new(store, runtime, layout, module_name);
    loader
        .download(config)
        .await
        .context("download module content")?;
    loader.load_module().context("load hot-update module")?;
    loader.activate().context("activate hot-update module")?;

    info!(
        target: "hotmod_cli::start",
        module = loader.module_name(),
        origin = %loader.module()?.origin(),
        "startup finished, module activated"
    );
    Ok(())
}

fn build_store(config: &GlobalConfig) -> Result<Arc<dyn ContentStore>> {
    if config.enable_remote && config.operating_mode == OperatingMode::Host {
        let remote_root = config
            .remote_root
            .as_deref()
            .ok_or_else(|| anyhow!("`remote_root` must be set in host mode"))?;
        let cache_dir = std::env::temp_dir().join("hotmod-cache");
        return Ok(Arc::new(
            HttpStore::new(remote_root).with_cache_dir(cache_dir),
        ));
    }
    Ok(Arc::new(DirStore::new(&config.content_root)))
}
