//! core::manifest
//!
//! Bundle manifest, document header, and publish info schemas.
//!
//! # Overview
//!
//! Three small JSON documents steer an unpack:
//!
//! - the bundle entry's manifest (`<id>/<id>.json`) names the app, the
//!   `.msapp` blob, and the loose resource files worth canonical names
//! - `Header.json` carries the document format version that gates
//!   verification strictness
//! - `Resources/PublishInfo.json` optionally names a logo file
//!
//! Unknown fields are ignored: these documents grow over time and the
//! unpacker only depends on the fields below.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::DocVersion;

/// Errors from manifest parsing.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse app manifest: {0}")]
    Manifest(serde_json::Error),

    #[error("failed to parse document header: {0}")]
    Header(serde_json::Error),

    #[error("failed to parse publish info: {0}")]
    PublishInfo(serde_json::Error),
}

/// A bundle entry's manifest.
///
/// # Example
///
/// ```
/// use canvaswork::core::manifest::parse_manifest;
///
/// let manifest = parse_manifest(
///     r#"{"DisplayName":"My App","MsAppPath":"abc/doc.msapp",
///        "BackgroundImage":"abc/bg.png","Icons":{"SmallIconUri":"abc123.png"}}"#,
/// ).unwrap();
/// assert_eq!(manifest.display_name, "My App");
/// assert_eq!(manifest.output_name(None), "My App");
/// assert_eq!(manifest.output_name(Some("Renamed")), "Renamed");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AppManifest {
    /// Human-readable app name; default output directory name.
    #[serde(rename = "DisplayName")]
    pub display_name: String,

    /// Free-form description, shown while unpacking.
    #[serde(rename = "Description", default)]
    pub description: String,

    /// Path of the control-tree blob, relative to the apps directory.
    #[serde(rename = "MsAppPath")]
    pub ms_app_path: String,

    /// Manifest-declared background image file, if any.
    #[serde(rename = "BackgroundImage", default)]
    pub background_image: Option<String>,

    /// Icon logical-key -> loose file name.
    #[serde(rename = "Icons", default)]
    pub icons: Map<String, Value>,
}

impl AppManifest {
    /// The output directory name: explicit override if supplied, else the
    /// manifest's display name.
    pub fn output_name<'a>(&'a self, override_name: Option<&'a str>) -> &'a str {
        match override_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.display_name,
        }
    }
}

/// The document header of an extracted app.
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    /// Document format version, e.g. `"1.333"`.
    #[serde(rename = "DocVersion")]
    pub doc_version: DocVersion,
}

/// Resource publish info; names the optional logo file.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishInfo {
    #[serde(rename = "LogoFileName", default)]
    logo_file_name: Option<String>,
}

impl PublishInfo {
    /// The logo file name, if one is declared and non-empty.
    pub fn logo_file_name(&self) -> Option<&str> {
        self.logo_file_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Parse a bundle entry's manifest.
pub fn parse_manifest(text: &str) -> Result<AppManifest, ManifestError> {
    serde_json::from_str(text).map_err(ManifestError::Manifest)
}

/// Parse a document header.
pub fn parse_header(text: &str) -> Result<Header, ManifestError> {
    serde_json::from_str(text).map_err(ManifestError::Header)
}

/// Parse resource publish info.
pub fn parse_publish_info(text: &str) -> Result<PublishInfo, ManifestError> {
    serde_json::from_str(text).map_err(ManifestError::PublishInfo)
}
