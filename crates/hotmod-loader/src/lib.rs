//! Runtime half of the hot-update pipeline: download the packaged module,
//! map it into the process, and activate it through its entry point.
//!
//! The [`CodeLoader`] is a strict state machine
//! (`Idle -> Downloading -> Downloaded -> Loaded -> Activated`, terminal
//! `Failed`); the host's startup sequence drives it once per process run.

pub mod error;
mod loader;
mod runtime;
mod state;

pub use error::{LoadError, Result};
pub use loader::{CodeLoader, Module, ModuleOrigin};
pub use runtime::{ModuleHandle, ModuleRuntime, NativeModuleRuntime};
pub use state::LoadState;

#[cfg(test)]
mod tests;
