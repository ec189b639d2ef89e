//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Canvaswork - A Rust-native CLI for unpacking canvas app bundles
#[derive(Parser, Debug)]
#[command(name = "cvw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if canvaswork was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Unpack a packaged app into a source-controlled directory tree
    #[command(
        name = "unpack",
        long_about = "Unpack a packaged app into a source-controlled directory tree.\n\n\
            A .zip source is a package holding one or more apps; any other source \
            is a single app archive. Each UI control becomes a directory with its \
            formula logic in a code file and its residual structure in a data file, \
            and every control tree is verified to round-trip byte-for-byte before \
            it is taken apart.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Unpack an exported package next to it
    cvw unpack MyApp.zip

    # Re-unpack over a previous output tree
    cvw unpack MyApp.zip MyAppSrc --clobber

    # Stop after raw extraction (keep the control trees as JSON)
    cvw unpack MyApp.msapp raw --only-extract

    # Bulk-rename copied controls while unpacking
    cvw unpack MyApp.zip --rename-old-postfix _1 --rename-new-postfix _Copy"
    )]
    Unpack {
        /// Package (.zip) or single app archive to unpack
        source: PathBuf,

        /// Output directory (defaults to the source file stem)
        output: Option<PathBuf>,

        /// Delete the existing output tree before starting
        #[arg(long)]
        clobber: bool,

        /// Stop after raw container extraction; skip tree decomposition
        #[arg(long)]
        only_extract: bool,

        /// Output name override for the unpacked app
        #[arg(long = "name", value_name = "NAME")]
        app_name: Option<String>,

        /// Literal substring replaced in raw screen JSON before parsing
        #[arg(long, value_name = "OLD", requires = "rename_new_postfix")]
        rename_old_postfix: Option<String>,

        /// Replacement for the renamed substring (empty removes it)
        #[arg(long, value_name = "NEW", requires = "rename_old_postfix")]
        rename_new_postfix: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_unpack_flags() {
        let cli = Cli::try_parse_from([
            "cvw",
            "unpack",
            "App.zip",
            "out",
            "--clobber",
            "--name",
            "Renamed",
        ])
        .unwrap();
        match cli.command {
            Command::Unpack {
                source,
                output,
                clobber,
                app_name,
                ..
            } => {
                assert_eq!(source, PathBuf::from("App.zip"));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(clobber);
                assert_eq!(app_name.as_deref(), Some("Renamed"));
            }
            other => panic!("expected unpack, got {other:?}"),
        }
    }

    #[test]
    fn rename_postfixes_require_each_other() {
        assert!(Cli::try_parse_from(["cvw", "unpack", "App.zip", "--rename-old-postfix", "_1"])
            .is_err());
        assert!(Cli::try_parse_from([
            "cvw",
            "unpack",
            "App.zip",
            "--rename-old-postfix",
            "_1",
            "--rename-new-postfix",
            "_2"
        ])
        .is_ok());
    }
}
