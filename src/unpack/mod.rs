//! unpack
//!
//! The decomposition pipeline.
//!
//! # Lifecycle
//!
//! clobber -> extract container -> per bundle entry: parse manifest ->
//! extract app archive -> verify + walk each control tree -> write the
//! auto-value catalog -> relocate metadata.
//!
//! The pipeline is fully sequential and synchronous. A fatal error aborts
//! the remaining decomposition for the current app; in a multi-app package
//! the remaining entries still run and the failure is reported at the end.
//! Clobber is not transactional: when a run fails partway, the previous
//! output is already gone and the new output is partial.

pub mod autovalues;
pub mod relocate;
pub mod verify;
pub mod walker;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::container::{self, ExtractError};
use crate::core::manifest::{self, ManifestError};
use crate::core::paths::{self, AppPaths};
use crate::core::types::DocVersion;
use crate::ui::output::{self, Verbosity};

use autovalues::AutoValueCatalog;
use relocate::RelocateError;
use verify::VerifyError;
use walker::WalkError;

/// Recognized unpack options.
#[derive(Debug, Clone, Default)]
pub struct UnpackOptions {
    /// Delete the existing output tree before starting.
    pub clobber: bool,
    /// Stop after raw container extraction; skip tree decomposition.
    pub only_extract: bool,
    /// Output name override; the manifest's display name otherwise.
    pub app_name: Option<String>,
    /// Literal substring replaced in raw screen JSON before parsing.
    pub rename_old_postfix: Option<String>,
    /// Replacement for `rename_old_postfix`; empty removes the substring.
    pub rename_new_postfix: Option<String>,
}

/// Errors from the unpack pipeline.
#[derive(Debug, Error)]
pub enum UnpackError {
    #[error("invalid container: {0}")]
    Validation(String),

    #[error("{failed} of {total} bundle entries failed to unpack")]
    EntriesFailed { failed: usize, total: usize },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse control tree '{path}': {source}")]
    Screen {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize auto values: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Relocate(#[from] RelocateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Unpack a container into a directory tree.
///
/// A `.zip` source is a package holding one or more bundle entries; any
/// other source is a single app archive. With `only_extract` set the
/// control trees are left as raw JSON.
pub fn unpack(
    source: &Path,
    output: &Path,
    options: &UnpackOptions,
    verbosity: Verbosity,
) -> Result<(), UnpackError> {
    if options.clobber && output.exists() {
        output::print(format!("Deleting files in {}", output.display()), verbosity);
        fs::remove_dir_all(output)?;
    }

    output::print(
        format!(
            "Extracting files from {} to {}",
            source.display(),
            output.display()
        ),
        verbosity,
    );
    container::extract(source, output, true)?;

    let is_package = source
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if is_package {
        unpack_package(output, options, verbosity)
    } else if options.only_extract {
        Ok(())
    } else {
        decompose_app(output, options, verbosity)
    }
}

/// Unpack every bundle entry of an extracted package.
///
/// A failing entry aborts only itself; remaining entries still unpack and
/// the failures are reported once all have run.
fn unpack_package(
    output: &Path,
    options: &UnpackOptions,
    verbosity: Verbosity,
) -> Result<(), UnpackError> {
    if !paths::package_root(output).is_dir() {
        return Err(UnpackError::Validation(format!(
            "missing root folder \"{}\"",
            paths::PACKAGE_ROOT
        )));
    }

    let apps_dir = paths::package_apps_dir(output);
    let mut entries: Vec<PathBuf> = fs::read_dir(&apps_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    entries.sort();

    let total = entries.len();
    let mut failed = 0;
    for entry in &entries {
        if let Err(err) = unpack_entry(entry, output, &apps_dir, options, verbosity) {
            output::error(format!(
                "failed to unpack bundle entry '{}': {}",
                entry.display(),
                err
            ));
            failed += 1;
        }
    }

    if failed > 0 {
        Err(UnpackError::EntriesFailed { failed, total })
    } else {
        Ok(())
    }
}

/// Unpack one bundle entry: manifest -> app archive -> metadata relocation.
fn unpack_entry(
    entry_dir: &Path,
    output: &Path,
    apps_dir: &Path,
    options: &UnpackOptions,
    verbosity: Verbosity,
) -> Result<(), UnpackError> {
    let manifest_path = paths::entry_manifest_path(entry_dir).ok_or_else(|| {
        UnpackError::Validation(format!("unnamed bundle entry '{}'", entry_dir.display()))
    })?;
    let manifest_text = read_text(&manifest_path)?;
    let manifest = manifest::parse_manifest(&manifest_text)?;

    let name = manifest.output_name(options.app_name.as_deref());
    let app_output = paths::apps_output_dir(output).join(name);
    output::print(
        format!(
            "Extracting App {} - {}",
            manifest.display_name, manifest.description
        ),
        verbosity,
    );

    let msapp_path = apps_dir.join(&manifest.ms_app_path);
    unpack(&msapp_path, &app_output, options, verbosity)?;
    relocate::move_metadata_files(
        &manifest,
        &AppPaths::new(&app_output),
        &msapp_path,
        verbosity,
    )?;
    Ok(())
}

/// Decompose an extracted app: screens, components, then the logo rename.
fn decompose_app(
    app_dir: &Path,
    options: &UnpackOptions,
    verbosity: Verbosity,
) -> Result<(), UnpackError> {
    let app_paths = AppPaths::new(app_dir);
    let header_text = read_text(&app_paths.header_path())?;
    let header = manifest::parse_header(&header_text)?;

    decompose_tree(
        &app_paths.controls_dir(),
        &app_paths.code_dir(),
        &header.doc_version,
        options,
        verbosity,
    )?;
    decompose_tree(
        &app_paths.components_dir(),
        &app_paths.component_code_dir(),
        &header.doc_version,
        options,
        verbosity,
    )?;

    relocate::rename_logo(&app_paths, verbosity)?;
    Ok(())
}

/// Decompose one batch of raw top-level control trees into `code_dir`.
///
/// Each file is verified against its own bytes before its tree is taken
/// apart; the catalog covers the whole batch and lands at the code root.
/// The consumed raw directory is removed at the end. A missing source
/// directory skips the batch silently (apps without components are common).
fn decompose_tree(
    controls_dir: &Path,
    code_dir: &Path,
    doc_version: &DocVersion,
    options: &UnpackOptions,
    verbosity: Verbosity,
) -> Result<(), UnpackError> {
    if !controls_dir.is_dir() {
        return Ok(());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(controls_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut catalog = AutoValueCatalog::new();
    for file in &files {
        output::print(format!("Extracting file {}", file.display()), verbosity);
        let mut text = read_text(file)?;
        if let Some(old) = options.rename_old_postfix.as_deref().filter(|old| !old.trim().is_empty()) {
            let new = options.rename_new_postfix.as_deref().unwrap_or_default();
            output::print(
                format!("Renaming Controls from \"{}\" to \"{}\"", old, new),
                verbosity,
            );
            text = text.replace(old, new);
        }
        let screen: Value = serde_json::from_str(&text).map_err(|source| UnpackError::Screen {
            path: file.clone(),
            source,
        })?;

        // Hard gate: nothing is written for a tree that fails to round-trip.
        verify::verify_screen(&screen, &text, file, doc_version)?;
        walker::decompose_screen(&screen, code_dir, &mut catalog)?;
    }

    fs::create_dir_all(code_dir)?;
    fs::write(paths::auto_values_path(code_dir), catalog.serialize()?)?;
    fs::remove_dir_all(controls_dir)?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String, UnpackError> {
    fs::read_to_string(path).map_err(|source| UnpackError::Read {
        path: path.to_path_buf(),
        source,
    })
}
