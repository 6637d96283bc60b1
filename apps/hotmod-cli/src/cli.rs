use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hotmod")]
#[command(about = "Build, package, and activate hot-update code modules")]
pub struct Cli {
    /// Override the global config file path.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile the hot-update modules and publish them into the content
    /// directory.
    Compile {
        /// Build unoptimized modules with full debug info.
        #[arg(long)]
        development: bool,
    },
    /// Copy the trimmed base-runtime metadata for a build target into the
    /// content directory.
    Reconcile {
        /// Build target identifier (android, ios, windows, macos, webgl).
        #[arg(long)]
        target: String,
    },
    /// Run the startup sequence: download the module content, load the
    /// module, and invoke its entry point.
    Start,
}
