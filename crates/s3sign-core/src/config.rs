//! Signer configuration.
//!
//! Provides [`SignerConfig`], the settings a harness or client needs to sign
//! requests against an S3-compatible endpoint. Values are loaded from
//! environment variables, matching the names the AWS tooling and MinIO test
//! harnesses already use.

use std::fmt;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{CoreError, CoreResult};
use crate::types::AwsRegion;

/// Configuration for signing requests.
///
/// The secret key is never serialized and is redacted from `Debug` output.
///
/// # Examples
///
/// ```
/// use s3sign_core::SignerConfig;
///
/// let config = SignerConfig::default();
/// assert_eq!(config.default_region.as_str(), "us-east-1");
/// assert_eq!(config.service, "s3");
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct SignerConfig {
    /// Base URL of the S3-compatible endpoint (e.g. `"http://localhost:9000"`).
    #[builder(default = String::from("http://localhost:9000"), setter(into))]
    pub endpoint: String,

    /// Access key identifier placed in the credential scope.
    #[builder(default = String::from("minioadmin"), setter(into))]
    pub access_key_id: String,

    /// Secret key used to derive signing keys.
    #[serde(skip_serializing)]
    #[builder(default = String::from("minioadmin"), setter(into))]
    pub secret_access_key: String,

    /// Region used in the signing scope when the caller does not override it.
    #[builder(default)]
    pub default_region: AwsRegion,

    /// Service name used in the signing scope.
    #[builder(default = SignerConfig::DEFAULT_SERVICE.to_owned(), setter(into))]
    pub service: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"), setter(into))]
    pub log_level: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("default_region", &self.default_region)
            .field("service", &self.service)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl SignerConfig {
    /// Service signed for when the caller does not pick one.
    pub const DEFAULT_SERVICE: &str = "s3";

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_ENDPOINT_URL` | `http://localhost:9000` |
    /// | `AWS_ACCESS_KEY_ID` | `minioadmin` |
    /// | `AWS_SECRET_ACCESS_KEY` | `minioadmin` |
    /// | `DEFAULT_REGION` / `AWS_REGION` | `us-east-1` |
    /// | `S3SIGN_SERVICE` | `s3` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Examples
    ///
    /// ```
    /// use s3sign_core::SignerConfig;
    ///
    /// let config = SignerConfig::from_env();
    /// assert!(!config.endpoint.is_empty());
    /// ```
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("AWS_ACCESS_KEY_ID") {
            config.access_key_id = v;
        }
        if let Ok(v) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            config.secret_access_key = v;
        }
        if let Ok(v) = std::env::var("DEFAULT_REGION").or_else(|_| std::env::var("AWS_REGION")) {
            config.default_region = AwsRegion::new(v);
        }
        if let Ok(v) = std::env::var("S3SIGN_SERVICE") {
            config.service = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Load configuration from a JSON document (camelCase keys).
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config = serde_json::from_str(json).context("failed to parse signer configuration")?;
        Ok(config)
    }

    /// Check that the configuration can produce a well-formed signing scope.
    pub fn validate(&self) -> CoreResult<()> {
        if self.access_key_id.is_empty() {
            return Err(CoreError::Config("access key id is empty".to_owned()));
        }
        if self.secret_access_key.is_empty() {
            return Err(CoreError::Config("secret access key is empty".to_owned()));
        }
        AwsRegion::parse(self.default_region.as_str())?;
        if self.service.is_empty() || self.service.contains('/') {
            return Err(CoreError::Config(format!(
                "invalid service name: {:?}",
                self.service
            )));
        }
        Ok(())
    }
}
