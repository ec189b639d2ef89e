//! Canvaswork - A Rust-native CLI for unpacking canvas app bundles
//!
//! Canvaswork decomposes a packaged application bundle (a zip container
//! holding one or more JSON-serialized UI-control trees) into a
//! human-editable, version-control-friendly directory tree: each control
//! becomes a directory with its formula logic in a code file and its
//! residual structure in a data file.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the pipeline)
//! - [`unpack`] - Decomposition pipeline: verify, walk, extract auto values, relocate
//! - [`core`] - Domain types, schemas, path routing, JSON formatting
//! - [`container`] - Zip container extraction
//! - [`ui`] - User-facing output utilities
//!
//! # Correctness Invariants
//!
//! Canvaswork maintains the following invariants:
//!
//! 1. A control is decomposed only after its source bytes round-trip through
//!    the serializer unchanged
//! 2. Every volatile field removed from a data file has exactly one catalog
//!    entry, recorded in traversal order
//! 3. Output file and directory names derive solely from control and rule
//!    names, so unchanged input reproduces an identical tree

pub mod cli;
pub mod container;
pub mod core;
pub mod ui;
pub mod unpack;
