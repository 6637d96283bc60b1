//! Offline half of the hot-update pipeline: compile application logic into
//! portable module binaries, publish them into the packaged content tree,
//! and reconcile the trimmed base-runtime metadata the modules depend on.

mod aot;
mod compile;
pub mod dispatch;
mod error;
mod pipeline;
mod publish;

pub use aot::{ReconcileOptions, ReconcileReport, reconcile_platform};
pub use compile::{BuildArtifact, CargoBackend, CompileOptions, CompilerBackend, compile_modules};
pub use dispatch::{DispatchGuard, DispatchPump, Dispatcher, ambient_dispatcher, dispatch_channel};
pub use error::{CompileError, PublishError, ReconcileError, ReconcileItemError};
pub use pipeline::compile_and_publish;
pub use publish::{PublishOptions, publish_modules};

#[cfg(test)]
mod tests;
