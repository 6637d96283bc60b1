use anyhow::Result;
use hotmod_store::ContentStore;
use tracing::info;

use crate::compile::{BuildArtifact, CompileOptions, CompilerBackend, compile_modules};
use crate::dispatch::Dispatcher;
use crate::publish::{PublishOptions, publish_modules};

/// Full offline module pipeline: compile, then publish.
///
/// A compile failure (including zero produced artifacts) aborts before the
/// publish step, so the content directory and the store index are never
/// touched by a build that produced nothing.
pub fn compile_and_publish(
    backend: &dyn CompilerBackend,
    dispatcher: Dispatcher,
    compile_options: &CompileOptions,
    publish_options: &PublishOptions,
    store: &dyn ContentStore,
) -> Result<Vec<BuildArtifact>> {
    let artifacts = compile_modules(backend, dispatcher, compile_options)?;
    publish_modules(&artifacts, publish_options, store)?;
    info!(
        target: "hotmod_build::pipeline",
        modules = artifacts.len(),
        "compile and publish finished"
    );
    Ok(artifacts)
}
