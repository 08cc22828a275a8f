//! Outbound request signing.
//!
//! A [`RequestDescriptor`] describes a request before signing: method, target
//! URL, headers, and an optional seekable body. [`RequestSigner`] turns it into
//! a [`SignedRequest`] carrying the `x-amz-date`, `x-amz-content-sha256`,
//! `Content-Md5`, and `Authorization` headers, with the URI rewritten to the
//! exact path and query that were signed.

use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{AUTHORIZATION, CONTENT_LENGTH};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use s3sign_core::{AwsRegion, SignerConfig};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use crate::canonical::{build_canonical_request, canonicalize};
use crate::credentials::Credentials;
use crate::error::SignError;
use crate::hash::{EMPTY_PAYLOAD_SHA256, content_md5, hash_payload};
use crate::sigv4::{
    S3_SERVICE, SigningScope, build_authorization_header, build_string_to_sign,
    compute_signature, derive_signing_key, format_amz_date, host_with_port,
};

/// Header carrying the request timestamp.
pub const X_AMZ_DATE: &str = "x-amz-date";
/// Header carrying the hex SHA-256 of the payload.
pub const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";
/// Header carrying the base64 MD5 of the payload.
pub const CONTENT_MD5: &str = "content-md5";

/// An outbound HTTP request before signing.
///
/// `R` is the body source. It must be seekable so the body can be replayed
/// after it has been read for hashing.
#[derive(Debug)]
pub struct RequestDescriptor<R = io::Empty> {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    content_length: Option<u64>,
    body: Option<R>,
}

impl RequestDescriptor<io::Empty> {
    /// Describe a request without a body.
    ///
    /// An empty `method` means `POST`. The URL must be absolute and already
    /// percent-encoded where it contains characters outside the URI grammar.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidMethod`] for a malformed method token and
    /// [`SignError::InvalidUrl`] when the URL cannot be parsed or lacks a
    /// scheme or host.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3sign_auth::signer::RequestDescriptor;
    ///
    /// let desc = RequestDescriptor::new("", "http://localhost:9000/bucket").unwrap();
    /// assert_eq!(desc.method().as_str(), "POST");
    /// assert!(RequestDescriptor::new("GET", "/relative").is_err());
    /// ```
    pub fn new(method: &str, url: &str) -> Result<Self, SignError> {
        let method = if method.is_empty() {
            Method::POST
        } else {
            Method::from_bytes(method.as_bytes())
                .map_err(|_| SignError::InvalidMethod(method.to_owned()))?
        };

        let uri: Uri = url
            .parse()
            .map_err(|_| SignError::InvalidUrl(url.to_owned()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(SignError::InvalidUrl(url.to_owned()));
        }

        Ok(Self {
            method,
            uri,
            headers: HeaderMap::new(),
            content_length: None,
            body: None,
        })
    }
}

impl<R> RequestDescriptor<R> {
    /// Append a header. Repeated names keep every value, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidHeader`] if the name or value is not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, SignError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| SignError::InvalidHeader(name.to_owned()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| SignError::InvalidHeader(name.to_owned()))?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    /// Set the declared content length. Without it, the length of the body
    /// read for hashing is used.
    #[must_use]
    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    /// Attach a body.
    pub fn with_body<B: Read + Seek>(self, body: B) -> RequestDescriptor<B> {
        RequestDescriptor {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            content_length: self.content_length,
            body: Some(body),
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Headers supplied so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// A signed request together with the intermediate signing artifacts.
#[derive(Debug)]
pub struct SignedRequest<R> {
    /// The request to transmit. The body, if any, is positioned at its start.
    pub request: http::Request<Option<R>>,
    /// The canonical request that was hashed.
    pub canonical_request: String,
    /// The string to sign.
    pub string_to_sign: String,
    /// The hex-encoded signature.
    pub signature: String,
}

impl<R: Read> SignedRequest<R> {
    /// The `Authorization` header value.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Read the body into memory, for transports that need an owned body.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::BodyRead`] if reading the body fails.
    pub fn into_buffered(self) -> Result<http::Request<Bytes>, SignError> {
        let (parts, body) = self.request.into_parts();
        let bytes = match body {
            Some(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Bytes::from(buf)
            }
            None => Bytes::new(),
        };
        Ok(http::Request::from_parts(parts, bytes))
    }
}

/// Signs requests with one credential pair for one region and service.
///
/// # Examples
///
/// ```
/// use s3sign_auth::credentials::Credentials;
/// use s3sign_auth::signer::{RequestDescriptor, RequestSigner};
///
/// let signer = RequestSigner::builder()
///     .credentials(Credentials::new("AKID", "secret"))
///     .build();
/// let desc = RequestDescriptor::new("GET", "http://localhost:9000/bucket/key").unwrap();
/// let signed = signer.sign(desc).unwrap();
/// assert!(signed.authorization().unwrap().starts_with("AWS4-HMAC-SHA256 Credential=AKID/"));
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RequestSigner {
    /// The access key pair.
    credentials: Credentials,

    /// Region placed in the credential scope.
    #[builder(default)]
    region: AwsRegion,

    /// Service placed in the credential scope.
    #[builder(default = S3_SERVICE.to_owned(), setter(into))]
    service: String,
}

impl RequestSigner {
    /// Create a signer from the credentials, region and service in `config`.
    #[must_use]
    pub fn from_config(config: &SignerConfig) -> Self {
        Self {
            credentials: Credentials::from_config(config),
            region: config.default_region.clone(),
            service: config.service.clone(),
        }
    }

    /// The region used in the credential scope.
    #[must_use]
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// The access key ID requests are signed with.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        self.credentials.access_key_id()
    }

    /// Sign `desc` at the current time.
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::sign_at`].
    pub fn sign<R: Read + Seek>(
        &self,
        desc: RequestDescriptor<R>,
    ) -> Result<SignedRequest<R>, SignError> {
        self.sign_at(desc, Utc::now())
    }

    /// Sign `desc` as of `instant`.
    ///
    /// The body is read to the end for hashing and then rewound to the
    /// position it was at when signing began.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::BodyRead`] if reading or rewinding the body fails.
    /// No partial signature is produced.
    pub fn sign_at<R: Read + Seek>(
        &self,
        desc: RequestDescriptor<R>,
        instant: DateTime<Utc>,
    ) -> Result<SignedRequest<R>, SignError> {
        let RequestDescriptor {
            method,
            uri,
            mut headers,
            content_length,
            mut body,
        } = desc;

        let timestamp = format_amz_date(&instant);
        headers.insert(X_AMZ_DATE, header_value(&timestamp)?);

        let (payload_hash, body_len) = match body.as_mut() {
            Some(reader) => {
                let start = reader.stream_position()?;
                let mut payload = Vec::new();
                reader.read_to_end(&mut payload)?;
                reader.seek(SeekFrom::Start(start))?;
                trace!(len = payload.len(), "hashed request body");
                headers.insert(CONTENT_MD5, header_value(&content_md5(&payload))?);
                (hash_payload(&payload), payload.len() as u64)
            }
            None => (EMPTY_PAYLOAD_SHA256.to_owned(), 0),
        };
        headers.insert(X_AMZ_CONTENT_SHA256, header_value(&payload_hash)?);

        let content_length = content_length.unwrap_or(body_len);
        if content_length > 0 || body.is_some() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
        }

        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| SignError::InvalidUrl(uri.to_string()))?;
        let host = host_with_port(uri.scheme(), &authority);
        let parts = canonicalize(uri.path(), uri.query(), &headers, &host);
        let canonical_request = build_canonical_request(method.as_str(), &parts, &payload_hash);

        let scope = SigningScope::for_instant(&instant, self.region.as_str(), &self.service);
        let signing_key = derive_signing_key(
            self.credentials.secret_access_key(),
            &scope.date,
            &scope.region,
            &scope.service,
        );
        let string_to_sign = build_string_to_sign(
            &timestamp,
            &scope.to_string(),
            &hash_payload(canonical_request.as_bytes()),
        );
        let signature = compute_signature(&signing_key, &string_to_sign);

        let authorization = build_authorization_header(
            self.credentials.access_key_id(),
            &scope,
            &parts.signed_headers,
            &signature,
        );
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        debug!(
            method = %method,
            host = %host,
            signed_headers = %parts.signed_headers,
            canonical_request = %canonical_request,
            "Signed request"
        );

        let path_and_query = if parts.query.is_empty() {
            parts.uri
        } else {
            format!("{}?{}", parts.uri, parts.query)
        };
        let mut builder = Uri::builder().authority(authority);
        if let Some(scheme) = uri.scheme() {
            builder = builder.scheme(scheme.clone());
        }
        let signed_uri = builder
            .path_and_query(path_and_query)
            .build()
            .map_err(|_| SignError::InvalidUrl(uri.to_string()))?;

        let mut request = http::Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = signed_uri;
        *request.headers_mut() = headers;

        Ok(SignedRequest {
            request,
            canonical_request,
            string_to_sign,
            signature,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SignError> {
    HeaderValue::from_str(value).map_err(|_| SignError::InvalidHeader(value.to_owned()))
}
