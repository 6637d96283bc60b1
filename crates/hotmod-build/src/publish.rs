use std::path::PathBuf;

use hotmod_store::ContentStore;
use tracing::{debug, info};

use crate::compile::BuildArtifact;
use crate::error::PublishError;

#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Destination directory read by the content pipeline.
    pub code_dir: PathBuf,
}

/// Copies the staged module pairs into the content directory under the
/// packaged names and refreshes the store index.
///
/// All-or-nothing: the full binary+symbol set of every artifact is
/// verified before a single byte lands in `code_dir`; a missing artifact
/// aborts with nothing written and the index untouched. Previously
/// published pairs are replaced for the targeted modules only.
pub fn publish_modules(
    artifacts: &[BuildArtifact],
    options: &PublishOptions,
    store: &dyn ContentStore,
) -> Result<(), PublishError> {
    for artifact in artifacts {
        if !artifact.binary_path.exists() {
            return Err(PublishError::MissingArtifact {
                module: artifact.module.clone(),
                kind: "binary",
                path: artifact.binary_path.clone(),
            });
        }
        if !artifact.symbol_path.exists() {
            return Err(PublishError::MissingArtifact {
                module: artifact.module.clone(),
                kind: "symbol",
                path: artifact.symbol_path.clone(),
            });
        }
    }

    std::fs::create_dir_all(&options.code_dir)
        .map_err(|source| PublishError::io_at(&options.code_dir, source))?;

    for artifact in artifacts {
        let binary_target = options
            .code_dir
            .join(hotmod_core::module_binary_file(&artifact.module));
        let symbol_target = options
            .code_dir
            .join(hotmod_core::module_symbol_file(&artifact.module));

        for stale in [&binary_target, &symbol_target] {
            match std::fs::remove_file(stale) {
                Ok(()) => debug!(
                    target: "hotmod_build::publish",
                    path = %stale.display(),
                    "removed previously published artifact"
                ),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(PublishError::io_at(stale, source)),
            }
        }

        std::fs::copy(&artifact.binary_path, &binary_target)
            .map_err(|source| PublishError::io_at(&binary_target, source))?;
        std::fs::copy(&artifact.symbol_path, &symbol_target)
            .map_err(|source| PublishError::io_at(&symbol_target, source))?;
        info!(
            target: "hotmod_build::publish",
            module = %artifact.module,
            binary = %binary_target.display(),
            "module published"
        );
    }

    store.refresh()?;
    Ok(())
}
