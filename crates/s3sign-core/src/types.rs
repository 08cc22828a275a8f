//! Common AWS type definitions shared across the workspace.

use std::fmt;

use crate::error::{CoreError, CoreResult};

/// AWS Region identifier, as it appears in a SigV4 credential scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when the caller does not pick one.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region without validation.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Create a region that is safe to embed in a credential scope.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRegion`] if the region is empty, contains a
    /// `/` (the scope separator), or contains whitespace.
    pub fn parse(region: impl Into<String>) -> CoreResult<Self> {
        let region = region.into();
        if region.is_empty() || region.contains('/') || region.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidRegion(region));
        }
        Ok(Self(region))
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AwsRegion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
