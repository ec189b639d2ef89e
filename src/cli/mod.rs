//! cli
//!
//! Command-line interface layer for canvaswork.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve configuration defaults
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the [`crate::unpack`] pipeline; it performs no decomposition itself.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Run as if started in this directory.
    pub cwd: Option<std::path::PathBuf>,
    /// Output verbosity derived from `--quiet` / `--debug`.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        cwd: cli.cwd.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
