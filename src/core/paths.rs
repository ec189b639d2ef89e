//! core::paths
//!
//! Centralized path routing for container and output layouts.
//!
//! # Architecture
//!
//! Every location inside an extracted container or an unpacked app tree is
//! computed here. **Hard rule:** no code outside this module may join layout
//! literals onto a path; all locations go through [`AppPaths`] or the
//! package-level helpers.
//!
//! # Container Layout (as extracted)
//!
//! - `Microsoft.PowerApps/apps/<id>/` - one bundle entry per directory
//! - `<id>/<id>.json` - the entry's manifest
//! - `Controls/`, `Components/` - raw control-tree JSON
//! - `Header.json` - document version
//! - `Resources/PublishInfo.json` - logo reference
//!
//! # Output Layout (per app)
//!
//! - `Apps/<name>/Code/<Control>/.../<Control>.js` + `<Control>.json`
//! - `Apps/<name>/ComponentCode/` - parallel tree for reusable components
//! - `Code/AutoValues.json` - extracted volatile values
//! - `Apps/<name>/MetadataFiles/` - relocated resources

use std::path::{Path, PathBuf};

/// Required root directory of a package container.
pub const PACKAGE_ROOT: &str = "Microsoft.PowerApps";
/// Directory under [`PACKAGE_ROOT`] holding one subdirectory per app.
pub const PACKAGE_APPS: &str = "apps";
/// Output directory collecting unpacked apps.
pub const APPS_OUTPUT: &str = "Apps";

/// Extension for rendered rule-body code files.
pub const CODE_FILE_EXT: &str = "js";
/// Extension for residual data files.
pub const DATA_FILE_EXT: &str = "json";
/// File name of the serialized auto-value catalog.
pub const AUTO_VALUES_FILE: &str = "AutoValues.json";
/// Canonical name for the relocated background image.
pub const BACKGROUND_IMAGE_FILE: &str = "BackgroundImage.png";
/// Subdirectory of the metadata tree holding relocated icons.
pub const ICONS_DIR: &str = "Icons";
/// Canonical stem for the relocated logo (source extension preserved).
pub const LOGO_STEM: &str = "Logo";

/// Path routing for a single extracted app.
///
/// # Invariants
///
/// - All paths are derived from the app directory alone
/// - No code outside this module computes layout joins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Root of the extracted (and decomposed) app.
    app_dir: PathBuf,
}

impl AppPaths {
    /// Create path routing rooted at an app directory.
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    /// The app root directory.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Raw screen-control trees, consumed by decomposition.
    pub fn controls_dir(&self) -> PathBuf {
        self.app_dir.join("Controls")
    }

    /// Raw component-control trees, consumed by decomposition.
    pub fn components_dir(&self) -> PathBuf {
        self.app_dir.join("Components")
    }

    /// Decomposed screen code and data files.
    pub fn code_dir(&self) -> PathBuf {
        self.app_dir.join("Code")
    }

    /// Decomposed component code and data files.
    pub fn component_code_dir(&self) -> PathBuf {
        self.app_dir.join("ComponentCode")
    }

    /// The document header carrying the format version.
    pub fn header_path(&self) -> PathBuf {
        self.app_dir.join("Header.json")
    }

    /// Destination for relocated loose container files.
    pub fn metadata_dir(&self) -> PathBuf {
        self.app_dir.join("MetadataFiles")
    }

    /// Resource files shipped inside the app archive.
    pub fn resources_dir(&self) -> PathBuf {
        self.app_dir.join("Resources")
    }

    /// Publish info describing the optional logo.
    pub fn publish_info_path(&self) -> PathBuf {
        self.resources_dir().join("PublishInfo.json")
    }
}

/// The package root directory inside an extracted container.
pub fn package_root(extract_dir: &Path) -> PathBuf {
    extract_dir.join(PACKAGE_ROOT)
}

/// The per-app source directories inside an extracted container.
pub fn package_apps_dir(extract_dir: &Path) -> PathBuf {
    package_root(extract_dir).join(PACKAGE_APPS)
}

/// The manifest of a bundle entry, named after its directory.
pub fn entry_manifest_path(entry_dir: &Path) -> Option<PathBuf> {
    let name = entry_dir.file_name()?;
    let mut file = name.to_os_string();
    file.push(".json");
    Some(entry_dir.join(file))
}

/// The output directory collecting unpacked apps.
pub fn apps_output_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(APPS_OUTPUT)
}

/// The code file for a control inside its own directory.
pub fn code_file(control_dir: &Path, control_name: &str) -> PathBuf {
    control_dir.join(format!("{}.{}", control_name, CODE_FILE_EXT))
}

/// The residual data file for a control inside its own directory.
pub fn data_file(control_dir: &Path, control_name: &str) -> PathBuf {
    control_dir.join(format!("{}.{}", control_name, DATA_FILE_EXT))
}

/// The auto-value catalog at the root of a decomposed code tree.
pub fn auto_values_path(code_dir: &Path) -> PathBuf {
    code_dir.join(AUTO_VALUES_FILE)
}
