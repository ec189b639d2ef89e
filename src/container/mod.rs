//! container
//!
//! Zip container extraction.
//!
//! # Overview
//!
//! Both container levels are zip archives: the outer package and the
//! per-app control-tree blob. Blob archives in the wild carry nonstandard
//! entry names - backslash separators and occasional absolute paths - so
//! every entry name is sanitized into a safe relative path before any
//! filesystem write. An entry that cannot be made safe fails the
//! extraction; nothing is silently skipped.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors from container extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("archive entry has unsafe name: {0}")]
    UnsafeEntry(String),

    #[error("destination file already exists: {0}")]
    Collision(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Extract a zip archive into a destination directory.
///
/// Entry names are sanitized first (see [`sanitize_entry_name`]). With
/// `overwrite` unset, a pre-existing destination file fails the extraction.
pub fn extract(archive: &Path, dest: &Path, overwrite: bool) -> Result<(), ExtractError> {
    let file = File::open(archive).map_err(|source| ExtractError::Archive {
        path: archive.to_path_buf(),
        source: zip::result::ZipError::Io(source),
    })?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| ExtractError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;

    fs::create_dir_all(dest)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|source| ExtractError::Archive {
            path: archive.to_path_buf(),
            source,
        })?;
        let raw_name = entry.name().to_string();
        let relative = sanitize_entry_name(&raw_name)
            .ok_or_else(|| ExtractError::UnsafeEntry(raw_name.clone()))?;
        let target = dest.join(relative);

        if entry.is_dir() || raw_name.ends_with('\\') {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if target.exists() && !overwrite {
            return Err(ExtractError::Collision(target));
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

/// Turn an archive entry name into a safe relative path.
///
/// Backslash separators are normalized to `/`. Returns `None` when the name
/// is empty after normalization, is absolute, or steps outside its root via
/// `..`.
pub fn sanitize_entry_name(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let candidate = Path::new(&normalized);

    let mut safe = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => safe.push(part),
            Component::CurDir => {}
            // Absolute markers and parent traversal escape the root.
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => return None,
        }
    }

    if safe.as_os_str().is_empty() {
        None
    } else {
        Some(safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn write_archive(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("test.zip");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn sanitize_accepts_nested_names() {
        assert_eq!(
            sanitize_entry_name("Controls/1.json"),
            Some(PathBuf::from("Controls/1.json"))
        );
    }

    #[test]
    fn sanitize_normalizes_backslashes() {
        assert_eq!(
            sanitize_entry_name(r"Resources\PublishInfo.json"),
            Some(PathBuf::from("Resources/PublishInfo.json"))
        );
    }

    #[test]
    fn sanitize_rejects_escapes() {
        assert_eq!(sanitize_entry_name("../evil.json"), None);
        assert_eq!(sanitize_entry_name("a/../../evil.json"), None);
        assert_eq!(sanitize_entry_name("/etc/passwd"), None);
        assert_eq!(sanitize_entry_name(""), None);
        assert_eq!(sanitize_entry_name("."), None);
    }

    #[test]
    fn extracts_entries_with_parents() {
        let work = tempfile::tempdir().unwrap();
        let archive = write_archive(
            work.path(),
            &[
                ("Header.json", r#"{"DocVersion":"1.333"}"#),
                (r"Controls\1.json", "{}"),
            ],
        );
        let dest = work.path().join("out");
        extract(&archive, &dest, true).unwrap();
        assert!(dest.join("Header.json").exists());
        assert!(dest.join("Controls/1.json").exists());
    }

    #[test]
    fn refuses_traversal_entries() {
        let work = tempfile::tempdir().unwrap();
        let archive = write_archive(work.path(), &[("../evil.json", "{}")]);
        let dest = work.path().join("out");
        let err = extract(&archive, &dest, true).unwrap_err();
        assert!(matches!(err, ExtractError::UnsafeEntry(_)));
        assert!(!work.path().join("evil.json").exists());
    }

    #[test]
    fn collision_without_overwrite_fails() {
        let work = tempfile::tempdir().unwrap();
        let archive = write_archive(work.path(), &[("a.json", "{}")]);
        let dest = work.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.json"), "old").unwrap();
        let err = extract(&archive, &dest, false).unwrap_err();
        assert!(matches!(err, ExtractError::Collision(_)));

        extract(&archive, &dest, true).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a.json")).unwrap(), "{}");
    }
}
