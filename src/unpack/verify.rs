//! unpack::verify
//!
//! Round-trip verification gate.
//!
//! # Overview
//!
//! Decomposition is only safe if parsing lost nothing, so before a
//! top-level control is taken apart its parsed form is serialized straight
//! back - in the source's own shape - and compared byte-for-byte against
//! the source text. An exact match proceeds silently. Any drift is treated
//! as unsafe to proceed: either the document predates the supported floor
//! (reported as such), or diagnostic artifacts are written and the exact
//! divergence is reported.
//!
//! # Invariants
//!
//! - Runs strictly before any decomposition output for the control
//! - Never mutates the parsed tree
//! - Must be deterministic

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::core::jsonfmt::{self, JsonFormat};
use crate::core::types::DocVersion;

/// Errors from round-trip verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(
        "the document version is too old: document version {found}, minimum version {minimum}"
    )]
    VersionTooOld { found: DocVersion, minimum: DocVersion },

    #[error(
        "unable to reserialize '{file}' to match source: {raw}; formatted twins: {formatted}; \
         see '{original}' (extracted) vs '{reserialized}' (output)"
    )]
    Mismatch {
        file: PathBuf,
        raw: Divergence,
        formatted: Divergence,
        original: PathBuf,
        reserialized: PathBuf,
    },

    #[error("failed to reserialize '{file}': {source}")]
    Serialize {
        file: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Location of the first differing character between two texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    /// Absolute byte offset of the first difference.
    pub offset: usize,
    /// Zero-based line of the first difference.
    pub line: usize,
    /// Column within that line.
    pub column: usize,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "character at position {} on line {} at {}",
            self.offset, self.line, self.column
        )
    }
}

/// One known upstream serializer quirk: a trigger line that is always
/// paired with a companion null field on the following line, even when the
/// companion is logically absent.
struct SerializerQuirk {
    /// Start of the trigger line, after indentation.
    anchor: &'static str,
    /// Companion line content, placed at the trigger's indentation.
    companion: &'static str,
}

/// Compensations applied to reserialized text before comparison. New
/// quirks are new entries here, not new string surgery.
const QUIRKS: &[SerializerQuirk] = &[SerializerQuirk {
    anchor: "\"DynamicControlDefinitionJson\": ",
    companion: "\"TemplateDisplayName\": null,",
}];

/// Verify that `screen` reserializes to exactly `source`.
///
/// Runs once per top-level control, before any decomposition output. On
/// mismatch below the supported document version the error names both
/// versions; otherwise diagnostic files are written next to `file` (raw and
/// pretty twins of both sides) and the error carries both divergences.
pub fn verify_screen(
    screen: &Value,
    source: &str,
    file: &Path,
    doc_version: &DocVersion,
) -> Result<(), VerifyError> {
    let format = jsonfmt::detect(source);
    let rendered = jsonfmt::to_text(screen, format).map_err(|source| VerifyError::Serialize {
        file: file.to_path_buf(),
        source,
    })?;
    let rendered = apply_quirks(rendered, format);

    if source == rendered {
        return Ok(());
    }

    let minimum = DocVersion::minimum_supported();
    if *doc_version < minimum {
        return Err(VerifyError::VersionTooOld {
            found: doc_version.clone(),
            minimum,
        });
    }

    let original = suffixed(file, "original");
    let reserialized = suffixed(file, "reserialized");
    let original_twin = write_with_pretty_twin(&original, source, file)?;
    let reserialized_twin = write_with_pretty_twin(&reserialized, &rendered, file)?;

    Err(VerifyError::Mismatch {
        file: file.to_path_buf(),
        raw: first_divergence(source, &rendered, false),
        formatted: first_divergence(&original_twin, &reserialized_twin, true),
        original,
        reserialized,
    })
}

/// `<file>.<suffix>` alongside the source file.
fn suffixed(file: &Path, suffix: &str) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `text` to `path` and a pretty `.json` twin beside it, returning
/// the twin's content. Single-line text gains the unformatted marker.
fn write_with_pretty_twin(
    path: &Path,
    text: &str,
    file: &Path,
) -> Result<String, VerifyError> {
    fs::write(path, text)?;
    let twin = match jsonfmt::annotate_single_line(text) {
        Ok(Some(annotated)) => annotated,
        Ok(None) => text.to_string(),
        Err(source) => {
            return Err(VerifyError::Serialize {
                file: file.to_path_buf(),
                source,
            })
        }
    };
    fs::write(suffixed(path, "json"), &twin)?;
    Ok(twin)
}

/// Insert missing companion lines required by upstream serializer quirks.
///
/// Line-oriented, so compact documents are returned unchanged. Idempotent:
/// a trigger whose companion already follows is left alone.
fn apply_quirks(text: String, format: JsonFormat) -> String {
    let Some(newline) = format.newline() else {
        return text;
    };
    let newline = newline.as_str();

    if !QUIRKS.iter().any(|quirk| text.contains(quirk.anchor)) {
        return text;
    }

    let mut lines: Vec<String> = text.split(newline).map(str::to_string).collect();
    for quirk in QUIRKS {
        let mut index = 0;
        while index < lines.len() {
            let line = &lines[index];
            if line.trim_start().starts_with(quirk.anchor) {
                let already_paired = lines
                    .get(index + 1)
                    .map(|next| next.trim_start().starts_with(quirk.companion))
                    .unwrap_or(false);
                if !already_paired {
                    let indent = line.len() - line.trim_start().len();
                    lines.insert(index + 1, format!("{}{}", " ".repeat(indent), quirk.companion));
                }
                index += 1;
            }
            index += 1;
        }
    }
    lines.join(newline)
}

/// Locate the first differing character, tracking lines as encountered.
///
/// With `skip_first_line` set, differences on line 0 are ignored: the
/// formatted twins of single-line sources both open with the unformatted
/// marker line, which always differs.
fn first_divergence(a: &str, b: &str, skip_first_line: bool) -> Divergence {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    let shortest = a_bytes.len().min(b_bytes.len());

    let mut line = 0;
    let mut column = 0;
    for i in 0..shortest {
        if a_bytes[i] == b'\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }

        if a_bytes[i] == b_bytes[i] {
            continue;
        }
        if skip_first_line && line == 0 {
            continue;
        }
        return Divergence {
            offset: i,
            line,
            column,
        };
    }

    // No difference within the common prefix; the texts differ in length.
    Divergence {
        offset: shortest,
        line,
        column,
    }
}
