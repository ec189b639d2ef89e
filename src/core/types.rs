//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`DocVersion`] - Dotted numeric document format version
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid document version: {0}")]
    InvalidDocVersion(String),
}

/// Oldest document format version whose serialization is trusted to
/// round-trip byte-for-byte.
pub const MINIMUM_DOC_VERSION: &str = "1.280";

/// A document format version such as `1.333`.
///
/// Versions are dotted sequences of decimal components, compared
/// componentwise: `1.280 < 1.281 < 1.281.2 < 2.0`.
///
/// # Example
///
/// ```
/// use canvaswork::core::types::DocVersion;
///
/// let old: DocVersion = "1.279".parse().unwrap();
/// let floor: DocVersion = "1.280".parse().unwrap();
/// assert!(old < floor);
/// assert_eq!(floor.to_string(), "1.280");
///
/// assert!("".parse::<DocVersion>().is_err());
/// assert!("1.x".parse::<DocVersion>().is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocVersion {
    components: Vec<u64>,
    raw: String,
}

impl DocVersion {
    /// Parse a dotted numeric version string.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidDocVersion`] if the string is empty or
    /// any component is not a decimal number.
    pub fn new(raw: &str) -> Result<Self, TypeError> {
        if raw.is_empty() {
            return Err(TypeError::InvalidDocVersion(raw.to_string()));
        }
        let components = raw
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| TypeError::InvalidDocVersion(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            components,
            raw: raw.to_string(),
        })
    }

    /// The minimum supported document version.
    pub fn minimum_supported() -> Self {
        // The constant is well-formed; parsing it cannot fail.
        Self::new(MINIMUM_DOC_VERSION).unwrap()
    }

    /// The original version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// Equality follows the components, consistent with Ord: "1.0" == "1.00".
impl PartialEq for DocVersion {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for DocVersion {}

impl PartialOrd for DocVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Componentwise; a shorter version is older than its extension
        // (1.280 < 1.280.0), matching the upstream version comparer.
        self.components.cmp(&other.components)
    }
}

impl fmt::Display for DocVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DocVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocVersion {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DocVersion> for String {
    fn from(value: DocVersion) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_versions() {
        let v = DocVersion::new("1.333").unwrap();
        assert_eq!(v.as_str(), "1.333");
        assert_eq!(v.to_string(), "1.333");
    }

    #[test]
    fn rejects_invalid_versions() {
        assert!(DocVersion::new("").is_err());
        assert!(DocVersion::new("1.").is_err());
        assert!(DocVersion::new("1.two").is_err());
        assert!(DocVersion::new("-1.2").is_err());
    }

    #[test]
    fn orders_componentwise() {
        let a = DocVersion::new("1.279").unwrap();
        let b = DocVersion::new("1.280").unwrap();
        let c = DocVersion::new("1.280.1").unwrap();
        let d = DocVersion::new("2.0").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
        // Numeric comparison, not lexicographic on the string
        let wide = DocVersion::new("1.1000").unwrap();
        assert!(b < wide);
    }

    #[test]
    fn shorter_version_is_older_than_extension() {
        let short = DocVersion::new("1.280").unwrap();
        let long = DocVersion::new("1.280.0").unwrap();
        assert!(short < long);
    }

    #[test]
    fn minimum_supported_parses() {
        assert_eq!(DocVersion::minimum_supported().as_str(), MINIMUM_DOC_VERSION);
    }

    #[test]
    fn equality_ignores_component_padding() {
        assert_eq!(
            DocVersion::new("1.0").unwrap(),
            DocVersion::new("1.00").unwrap()
        );
        assert_ne!(
            DocVersion::new("1.0").unwrap(),
            DocVersion::new("1.0.0").unwrap()
        );
    }

    #[test]
    fn serde_round_trip() {
        let v: DocVersion = serde_json::from_str("\"1.333\"").unwrap();
        assert_eq!(v.as_str(), "1.333");
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"1.333\"");
        assert!(serde_json::from_str::<DocVersion>("\"abc\"").is_err());
    }
}
