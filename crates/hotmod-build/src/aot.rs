use std::path::PathBuf;

use hotmod_core::{packed_artifact_name, resolve_platform_folder};
use tracing::{info, warn};

use crate::error::{ReconcileError, ReconcileItemError};

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Root of the trimmed base-runtime metadata tree; one folder per
    /// platform under it.
    pub source_root: PathBuf,
    /// Destination directory read by the content pipeline.
    pub dest_dir: PathBuf,
    /// The base-runtime libraries the module's type references need.
    pub libraries: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub copied: usize,
    pub errors: Vec<ReconcileItemError>,
}

/// Brings the trimmed base-runtime metadata for `build_target` into the
/// content directory under the packaged artifact names.
///
/// An unknown build target aborts the whole run. A library missing from
/// the source tree is recorded and skipped; the rest still reconcile, and
/// the caller decides whether partial success is acceptable. Copies and
/// renames overwrite whatever was published before.
pub fn reconcile_platform(
    build_target: &str,
    options: &ReconcileOptions,
) -> Result<ReconcileReport, ReconcileError> {
    let Some(folder) = resolve_platform_folder(build_target) else {
        return Err(ReconcileError::UnsupportedPlatform {
            target: build_target.to_string(),
        });
    };
    let source_dir = options.source_root.join(folder);
    std::fs::create_dir_all(&options.dest_dir)
        .map_err(|source| ReconcileError::io_at(&options.dest_dir, source))?;

    let mut report = ReconcileReport::default();
    for library in &options.libraries {
        let source = source_dir.join(library);
        if !source.exists() {
            warn!(
                target: "hotmod_build::aot",
                library = %library,
                path = %source.display(),
                "metadata source artifact missing"
            );
            report
                .errors
                .push(ReconcileItemError::missing_source(library, &source));
            continue;
        }

        let copied = options.dest_dir.join(library);
        if let Err(error) = std::fs::copy(&source, &copied) {
            warn!(
                target: "hotmod_build::aot",
                library = %library,
                "metadata copy failed: {error}"
            );
            report.errors.push(ReconcileItemError::io(library, &error));
            continue;
        }

        // Destructive rename into the packaged name: a stale target from a
        // previous run is removed first.
        let packed = options.dest_dir.join(packed_artifact_name(library));
        if packed.exists() {
            if let Err(error) = std::fs::remove_file(&packed) {
                report.errors.push(ReconcileItemError::io(library, &error));
                continue;
            }
        }
        if let Err(error) = std::fs::rename(&copied, &packed) {
            warn!(
                target: "hotmod_build::aot",
                library = %library,
                "metadata rename failed: {error}"
            );
            report.errors.push(ReconcileItemError::io(library, &error));
            continue;
        }

        report.copied += 1;
    }

    info!(
        target: "hotmod_build::aot",
        build_target,
        platform_folder = folder,
        copied = report.copied,
        errors = report.errors.len(),
        "metadata reconciliation finished"
    );
    Ok(report)
}
