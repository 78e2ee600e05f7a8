//! Conversion settings shared by every adapter and the driver.

use crate::io::OasisOptions;
use crate::topology::validation::ValidationOptions;

/// Settings for one [`Converter`](crate::convert::Converter).
///
/// Deserializes from any serde format; missing fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub validation: ValidationOptions,
    pub oasis: OasisOptions,
    /// Version string written into output headers; the crate version when unset.
    pub tool_version: Option<String>,
}

impl ConversionConfig {
    pub fn tool_version(&self) -> &str {
        self.tool_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }

    pub fn with_oasis(mut self, oasis: OasisOptions) -> Self {
        self.oasis = oasis;
        self
    }

    pub fn with_validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }
}
