//! unpack::relocate
//!
//! Canonical placement of loose container resource files.
//!
//! # Overview
//!
//! The files left beside a consumed app archive carry machine-generated
//! names (`abc123.png`). The manifest declares which of them matter - the
//! background image and the icon set - so relocation moves every loose file
//! into the metadata directory under its canonical name when the manifest
//! maps it, or its own name when it does not. Separately, the resource
//! publish info names an optional logo file that is renamed in place.
//!
//! Single-line JSON files are rewritten with a pretty twin during
//! relocation so later diffs stay reviewable; the original line is kept as
//! the unformatted record of truth.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::jsonfmt;
use crate::core::manifest::{self, AppManifest, ManifestError};
use crate::core::paths::{self, AppPaths};
use crate::ui::output::{self, Verbosity};

/// Errors from metadata relocation.
#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("failed to read publish info '{path}': {source}")]
    PublishInfoRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to pretty-print relocated file '{path}': {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Move the loose files beside a consumed app archive into the metadata
/// directory, under canonical names where the manifest declares them.
///
/// The archive itself is deleted first; it has been fully decomposed by the
/// time relocation runs. Pre-existing destination files are overwritten.
pub fn move_metadata_files(
    manifest: &AppManifest,
    app_paths: &AppPaths,
    msapp_path: &Path,
    verbosity: Verbosity,
) -> Result<(), RelocateError> {
    let metadata_dir = app_paths.metadata_dir();
    fs::create_dir_all(&metadata_dir)?;

    let source_dir = msapp_path.parent().unwrap_or(Path::new("."));
    output::print(
        format!(
            "Copying metadata files from {} to {}",
            source_dir.display(),
            metadata_dir.display()
        ),
        verbosity,
    );
    fs::remove_file(msapp_path)?;

    let mapping = metadata_file_mappings(manifest);
    // Manifest values may address files relative to the apps root
    // (`<entry>/<name>`) or by bare name.
    let apps_root = source_dir.parent();

    let mut files: Vec<PathBuf> = fs::read_dir(source_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for file in files {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = apps_root
            .and_then(|root| file.strip_prefix(root).ok())
            .map(|rel| rel.to_string_lossy().replace('\\', "/"));

        let mapped = relative
            .as_deref()
            .and_then(|rel| mapping.get(rel))
            .or_else(|| mapping.get(file_name.as_str()));
        let destination = match mapped {
            Some(canonical) => metadata_dir.join(canonical),
            None => metadata_dir.join(&file_name),
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        if destination.exists() {
            fs::remove_file(&destination)?;
        }
        fs::rename(&file, &destination)?;

        format_json_file(&destination)?;
    }

    Ok(())
}

/// Canonical destinations declared by the manifest, keyed by the loose
/// file reference the manifest uses.
///
/// An icon key ending in `Uri` is rewritten to a `.png` name without the
/// suffix (`SmallIconUri` -> `Icons/Small.png`); other keys keep their name.
pub fn metadata_file_mappings(manifest: &AppManifest) -> HashMap<String, PathBuf> {
    let mut mapping = HashMap::new();
    if let Some(background) = &manifest.background_image {
        mapping.insert(
            background.clone(),
            PathBuf::from(paths::BACKGROUND_IMAGE_FILE),
        );
    }
    for (key, value) in &manifest.icons {
        let Some(file) = value.as_str() else { continue };
        let name = match key.strip_suffix("Uri") {
            Some(stem) => format!("{}.png", stem),
            None => key.clone(),
        };
        mapping.insert(file.to_string(), Path::new(paths::ICONS_DIR).join(name));
    }
    mapping
}

/// Give a relocated single-line JSON file a pretty twin (see
/// [`jsonfmt::annotate_single_line`]). Multi-line and non-JSON files pass
/// through untouched.
fn format_json_file(path: &Path) -> Result<(), RelocateError> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        return Ok(());
    }

    let text = fs::read_to_string(path)?;
    let annotated = jsonfmt::annotate_single_line(&text).map_err(|source| {
        RelocateError::Format {
            path: path.to_path_buf(),
            source,
        }
    })?;
    if let Some(annotated) = annotated {
        fs::write(path, annotated)?;
    }
    Ok(())
}

/// Rename the machine-named logo file to its canonical name, preserving
/// the extension. The logo is optional; missing publish info is an error.
pub fn rename_logo(app_paths: &AppPaths, verbosity: Verbosity) -> Result<(), RelocateError> {
    let publish_info_path = app_paths.publish_info_path();
    output::print(
        format!("Extracting file {}", publish_info_path.display()),
        verbosity,
    );
    let text =
        fs::read_to_string(&publish_info_path).map_err(|source| RelocateError::PublishInfoRead {
            path: publish_info_path.clone(),
            source,
        })?;
    let info = manifest::parse_publish_info(&text)?;

    let Some(logo) = info.logo_file_name() else {
        return Ok(());
    };

    let resources = app_paths.resources_dir();
    let from = resources.join(logo);
    let mut canonical = String::from(paths::LOGO_STEM);
    if let Some(extension) = from.extension() {
        canonical.push('.');
        canonical.push_str(&extension.to_string_lossy());
    }
    let to = resources.join(canonical);

    output::print(
        format!(
            "Renaming auto named file '{}' to '{}'",
            from.display(),
            to.display()
        ),
        verbosity,
    );
    if to.exists() {
        fs::remove_file(&to)?;
    }
    fs::rename(&from, &to)?;
    Ok(())
}
