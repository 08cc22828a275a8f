//! Error types for SigV4 signing and verification.
//!
//! Signing failures are represented by [`SignError`]; failures while checking
//! a transmitted request against its signature are represented by
//! [`AuthError`].

/// Errors that abort signing a request.
///
/// There is no partial signature: any of these stops the pipeline before the
/// `Authorization` header is produced.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The target URL could not be parsed or lacks a scheme or host.
    #[error("Invalid URL {0:?}")]
    InvalidUrl(String),

    /// The method token is not a valid HTTP method.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A caller-supplied header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Reading the request body for hashing, or rewinding it afterwards, failed.
    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] std::io::Error),
}

/// Errors that can occur while verifying an AWS Signature Version 4 request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required HTTP header referenced in `SignedHeaders` is missing.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Credential` component does not match the expected format
    /// (`AKID/date/region/service/aws4_request`).
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The `x-amz-date` day is not the date in the credential scope.
    #[error("Request date {date} does not match credential scope date {scope_date}")]
    RequestDateMismatch {
        /// Value of the `x-amz-date` header.
        date: String,
        /// Date component of the credential scope.
        scope_date: String,
    },

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
