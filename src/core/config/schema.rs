//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Unknown keys are rejected at parse time so a typo in a config file
//! surfaces as an error instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [unpack]
/// clobber = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Unpack defaults
    pub unpack: Option<UnpackDefaults>,
}

impl GlobalConfig {
    /// Default for the `--clobber` flag when the flag is not given.
    pub fn clobber_default(&self) -> bool {
        self.unpack
            .as_ref()
            .and_then(|unpack| unpack.clobber)
            .unwrap_or(false)
    }
}

/// Defaults applied to the `unpack` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UnpackDefaults {
    /// Delete an existing output tree before unpacking
    pub clobber: Option<bool>,
}
