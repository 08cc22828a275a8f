//! Signing credentials and secret lookup.
//!
//! [`Credentials`] is the access key pair a signer holds. [`CredentialProvider`]
//! resolves secret keys by access key ID on the verifying side, with
//! [`StaticCredentialProvider`] as the in-memory implementation used by tests
//! and by round-trip checks.

use std::collections::HashMap;
use std::fmt;

use s3sign_core::SignerConfig;

use crate::error::AuthError;

/// An access key pair.
///
/// The secret is never printed: the `Debug` output redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    /// Create credentials from an access key ID and its secret.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Credentials configured in a [`SignerConfig`].
    #[must_use]
    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new(&config.access_key_id, &config.secret_access_key)
    }

    /// The public access key ID.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Trait for looking up secret access keys by access key ID.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret access key for the given access key ID.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the access key ID is not recognized.
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError>;
}

/// In-memory credential provider keyed by access key ID.
///
/// # Examples
///
/// ```
/// use s3sign_auth::credentials::{CredentialProvider, Credentials, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::from_credentials([Credentials::new("AKID", "secret")]);
/// assert_eq!(provider.get_secret_key("AKID").unwrap(), "secret");
/// ```
#[derive(Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Create a provider from `(access_key_id, secret_key)` pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }

    /// Create a provider from [`Credentials`] values.
    pub fn from_credentials(credentials: impl IntoIterator<Item = Credentials>) -> Self {
        Self::new(
            credentials
                .into_iter()
                .map(|c| (c.access_key_id, c.secret_access_key)),
        )
    }
}

impl fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("access_key_ids", &self.credentials.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError> {
        self.credentials
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key_id.to_owned()))
    }
}
