//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into the pipeline
//! 3. Formats and displays output
//!
//! Handlers do not decompose anything directly.

mod completion;
mod unpack_cmd;

pub use completion::completion;
pub use unpack_cmd::unpack;

use anyhow::Result;

use super::args::Command;
use super::Context;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Unpack {
            source,
            output,
            clobber,
            only_extract,
            app_name,
            rename_old_postfix,
            rename_new_postfix,
        } => unpack(
            ctx,
            &source,
            output.as_deref(),
            clobber,
            only_extract,
            app_name,
            rename_old_postfix,
            rename_new_postfix,
        ),
        Command::Completion { shell } => completion(shell),
    }
}
