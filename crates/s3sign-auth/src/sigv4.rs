//! AWS Signature Version 4 key derivation, signing, and verification.
//!
//! Signing a canonical request takes three steps:
//!
//! 1. Build the string to sign from the timestamp, credential scope, and the
//!    SHA-256 of the canonical request.
//! 2. Derive the signing key from the secret key through a four-step
//!    HMAC-SHA256 chain over the scope components.
//! 3. HMAC the string to sign with the signing key and hex-encode the result.
//!
//! The resulting signature is carried in the `Authorization` header built by
//! [`build_authorization_header`]. [`verify_sigv4`] runs the same computation
//! from a transmitted request, which is how round trips are checked.

use std::fmt;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::uri::{Authority, Scheme};
use s3sign_core::{AwsRegion, SignerConfig};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{
    CanonicalParts, HOST_HEADER, HeaderSet, build_canonical_headers, build_canonical_query_string,
    build_canonical_request, build_canonical_uri, canonical_header_value,
};
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::hash::{hash_payload, hmac_sha256};

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Literal that terminates every credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Service identifier of the S3 API.
pub const S3_SERVICE: &str = SignerConfig::DEFAULT_SERVICE;

/// Region used when the caller does not pick one.
pub const DEFAULT_REGION: &str = AwsRegion::DEFAULT;

/// `x-amz-date` format: ISO 8601 basic, UTC.
pub const ISO8601_BASIC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date format used in the credential scope.
pub const YYYYMMDD_FORMAT: &str = "%Y%m%d";

/// The validity context of a signature: `date/region/service/aws4_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningScope {
    /// Date component (`YYYYMMDD`).
    pub date: String,
    /// Region component.
    pub region: String,
    /// Service component.
    pub service: String,
}

impl SigningScope {
    /// Create a scope from its components.
    #[must_use]
    pub fn new(
        date: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Create a scope for the day of `instant`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use s3sign_auth::sigv4::SigningScope;
    ///
    /// let instant = Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap();
    /// let scope = SigningScope::for_instant(&instant, "us-east-1", "s3");
    /// assert_eq!(scope.to_string(), "20130524/us-east-1/s3/aws4_request");
    /// ```
    #[must_use]
    pub fn for_instant(instant: &DateTime<Utc>, region: &str, service: &str) -> Self {
        Self::new(instant.format(YYYYMMDD_FORMAT).to_string(), region, service)
    }
}

impl fmt::Display for SigningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date, self.region, self.service
        )
    }
}

/// Format `instant` as an `x-amz-date` timestamp.
#[must_use]
pub fn format_amz_date(instant: &DateTime<Utc>) -> String {
    instant.format(ISO8601_BASIC_FORMAT).to_string()
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
///
/// # Examples
///
/// ```
/// use s3sign_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
///
/// # Examples
///
/// ```
/// use s3sign_auth::sigv4::derive_signing_key;
///
/// let key = derive_signing_key(
///     "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
///     "20130524",
///     "us-east-1",
///     "s3",
/// );
/// assert_eq!(key.len(), 32);
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Compute the HMAC-SHA256 signature of `data` using the given `signing_key`.
///
/// Returns the hex-encoded signature.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Sign a canonical request.
///
/// `timestamp` must be the `x-amz-date` value sent with the request, and
/// `scope` must have been built from the same instant.
#[must_use]
pub fn sign(
    canonical_request: &str,
    timestamp: &str,
    scope: &SigningScope,
    signing_key: &[u8],
) -> String {
    let string_to_sign = build_string_to_sign(
        timestamp,
        &scope.to_string(),
        &hash_payload(canonical_request.as_bytes()),
    );
    compute_signature(signing_key, &string_to_sign)
}

/// Format the value of the `Authorization` header.
///
/// # Examples
///
/// ```
/// use s3sign_auth::sigv4::{SigningScope, build_authorization_header};
///
/// let scope = SigningScope::new("20130524", "us-east-1", "s3");
/// assert_eq!(
///     build_authorization_header("AKID", &scope, "host;x-amz-date", "abcd"),
///     "AWS4-HMAC-SHA256 Credential=AKID/20130524/us-east-1/s3/aws4_request, \
///      SignedHeaders=host;x-amz-date, Signature=abcd"
/// );
/// ```
#[must_use]
pub fn build_authorization_header(
    access_key_id: &str,
    scope: &SigningScope,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={access_key_id}/{scope}, SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// The result of a successful SigV4 verification.
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The access key ID that signed the request.
    pub access_key_id: String,
    /// The AWS region from the credential scope.
    pub region: String,
    /// The AWS service from the credential scope.
    pub service: String,
    /// The list of headers that were included in the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed components of an AWS SigV4 `Authorization` header.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256 Credential=AKID/20130524/us-east-1/s3/aws4_request,
///   SignedHeaders=host;x-amz-content-sha256;x-amz-date,
///   Signature=<hex-signature>
/// ```
#[derive(Debug, Clone)]
pub struct ParsedAuth {
    /// The access key ID.
    pub access_key_id: String,
    /// The credential scope.
    pub scope: SigningScope,
    /// The list of signed header names (lowercase).
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

/// Parse an AWS SigV4 `Authorization` header value into its components.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the header format is invalid,
/// or [`AuthError::UnsupportedAlgorithm`] if the algorithm is not `AWS4-HMAC-SHA256`.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuth, AuthError> {
    let (algorithm, rest) = header.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;

    if algorithm != ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;

    for part in rest.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("Credential=") {
            credential = Some(value);
        } else if let Some(value) = part.strip_prefix("SignedHeaders=") {
            signed_headers = Some(value);
        } else if let Some(value) = part.strip_prefix("Signature=") {
            signature = Some(value);
        }
    }

    let credential = credential.ok_or(AuthError::InvalidAuthHeader)?;
    let signed_headers = signed_headers.ok_or(AuthError::InvalidAuthHeader)?;
    let signature = signature.ok_or(AuthError::InvalidAuthHeader)?;

    // AKID/date/region/service/aws4_request
    let cred_parts: Vec<&str> = credential.splitn(5, '/').collect();
    if cred_parts.len() != 5 || cred_parts[4] != SCOPE_TERMINATOR {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuth {
        access_key_id: cred_parts[0].to_owned(),
        scope: SigningScope::new(cred_parts[1], cred_parts[2], cred_parts[3]),
        signed_headers: signed_headers.split(';').map(ToOwned::to_owned).collect(),
        signature: signature.to_owned(),
    })
}

/// Verify an AWS SigV4-signed HTTP request.
///
/// The canonical request is rebuilt from the transmitted method, path, query,
/// and the headers named in `SignedHeaders`, with that list signed in the
/// order it was sent. The `host` entry comes from the request URI's authority
/// when present, otherwise from the `Host` header.
///
/// # Errors
///
/// Returns an [`AuthError`] if:
/// - The `Authorization` header is missing or malformed
/// - The access key is not found
/// - Required signed headers are missing
/// - The `x-amz-date` day differs from the credential scope date
/// - The signature does not match
pub fn verify_sigv4(
    parts: &http::request::Parts,
    payload_hash: &str,
    credential_provider: &dyn CredentialProvider,
) -> Result<AuthResult, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parsed = parse_authorization_header(auth_header)?;
    let secret_key = credential_provider.get_secret_key(&parsed.access_key_id)?;
    let timestamp = header_str(&parts.headers, "x-amz-date")?;
    if timestamp.get(..8) != Some(parsed.scope.date.as_str()) {
        return Err(AuthError::RequestDateMismatch {
            date: timestamp.to_owned(),
            scope_date: parsed.scope.date.clone(),
        });
    }

    debug!(
        access_key_id = %parsed.access_key_id,
        scope = %parsed.scope,
        "Verifying SigV4 signature"
    );

    let host = request_host(parts)?;
    let signed_header_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let header_set = collect_signed_headers(&parts.headers, &signed_header_refs, &host)?;

    let canonical = CanonicalParts {
        uri: build_canonical_uri(parts.uri.path()),
        query: build_canonical_query_string(parts.uri.query().unwrap_or("")),
        headers: build_canonical_headers(&header_set),
        signed_headers: parsed.signed_headers.join(";"),
    };
    let canonical_request =
        build_canonical_request(parts.method.as_str(), &canonical, payload_hash);

    debug!(canonical_request = %canonical_request, "Rebuilt canonical request");

    let signing_key = derive_signing_key(
        &secret_key,
        &parsed.scope.date,
        &parsed.scope.region,
        &parsed.scope.service,
    );
    let expected_signature = sign(&canonical_request, timestamp, &parsed.scope, &signing_key);

    if parsed
        .signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into()
    {
        debug!(access_key_id = %parsed.access_key_id, "Signature verification succeeded");
        Ok(AuthResult {
            access_key_id: parsed.access_key_id,
            region: parsed.scope.region,
            service: parsed.scope.service,
            signed_headers: parsed.signed_headers,
        })
    } else {
        debug!(
            expected = %expected_signature,
            provided = %parsed.signature,
            "Signature mismatch"
        );
        Err(AuthError::SignatureDoesNotMatch)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))?
        .to_str()
        .map_err(|_| AuthError::MissingHeader(name.to_owned()))
}

fn request_host(parts: &http::request::Parts) -> Result<String, AuthError> {
    if let Some(authority) = parts.uri.authority() {
        return Ok(host_with_port(parts.uri.scheme(), authority));
    }
    header_str(&parts.headers, HOST_HEADER).map(ToOwned::to_owned)
}

/// The host component of an authority, with its port unless it is the
/// scheme's default (80 for `http`, 443 for `https`).
///
/// HTTP clients drop a default port from the `Host` they send, so it is left
/// out here too. User information is never part of the signed host.
#[must_use]
pub fn host_with_port(scheme: Option<&Scheme>, authority: &Authority) -> String {
    let default_port = match scheme.map(Scheme::as_str) {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    };
    match authority.port() {
        Some(port) if Some(port.as_u16()) != default_port => {
            format!("{}:{}", authority.host(), port.as_str())
        }
        _ => authority.host().to_owned(),
    }
}

/// Collect header values for the specified signed headers.
fn collect_signed_headers(
    headers: &HeaderMap,
    signed_headers: &[&str],
    host: &str,
) -> Result<HeaderSet, AuthError> {
    let mut set = HeaderSet::new();
    for &name in signed_headers {
        if name == HOST_HEADER {
            set.insert(HOST_HEADER.to_owned(), vec![host.to_owned()]);
            continue;
        }
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|value| canonical_header_value(&String::from_utf8_lossy(value.as_bytes())))
            .collect();
        if values.is_empty() {
            return Err(AuthError::MissingHeader(name.to_owned()));
        }
        set.insert(name.to_owned(), values);
    }
    Ok(set)
}
