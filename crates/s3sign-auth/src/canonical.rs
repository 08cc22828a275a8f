//! Canonical request construction for AWS Signature Version 4.
//!
//! This module implements the canonical request format as specified by AWS:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! `CanonicalHeaders` is a block in which every `name:value` line, including
//! the last one, ends with `\n`; the separator after it therefore produces an
//! empty line. Signer and verifier must produce this byte sequence exactly, so
//! it is assembled through [`CanonicalBuffer`].

use std::collections::BTreeMap;

use http::HeaderMap;

use crate::encode::{decode_query_component, reencode_path, reencode_query_component};

/// Headers that never take part in the signature.
///
/// `authorization` carries the signature itself; the others are commonly
/// rewritten by transports and proxies.
pub const IGNORED_HEADERS: &[&str] = &[
    "authorization",
    "content-type",
    "content-length",
    "user-agent",
];

/// Name of the synthesized header that carries the target host.
pub const HOST_HEADER: &str = "host";

/// Lower-cased header names mapped to their values in original order.
///
/// A `BTreeMap` keeps names sorted byte-wise, independent of insertion order.
pub type HeaderSet = BTreeMap<String, Vec<String>>;

/// The four canonical strings derived from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalParts {
    /// Percent-encoded path.
    pub uri: String,
    /// Sorted, percent-encoded query string.
    pub query: String,
    /// Canonical headers block, one `name:values\n` line per header.
    pub headers: String,
    /// Semicolon-joined, sorted, lower-case header names.
    pub signed_headers: String,
}

/// Ordered buffer used to assemble canonical strings byte for byte.
#[derive(Debug, Default)]
pub struct CanonicalBuffer {
    buf: String,
}

impl CanonicalBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `line` followed by `\n`.
    pub fn push_line(&mut self, line: &str) -> &mut Self {
        self.buf.push_str(line);
        self.buf.push('\n');
        self
    }

    /// Append `name:value1,value2,...\n`.
    pub fn push_header(&mut self, name: &str, values: &[String]) -> &mut Self {
        self.buf.push_str(name);
        self.buf.push(':');
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                self.buf.push(',');
            }
            self.buf.push_str(value);
        }
        self.buf.push('\n');
        self
    }

    /// Append `text` without a trailing newline.
    pub fn push_str(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self
    }

    /// Consume the buffer and return the assembled string.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Build every canonical component of a request at once.
///
/// `host` is the URL's host (with port, when the URL has one). It always
/// becomes the `host` entry of the header set, replacing any literal `Host`
/// header in `headers`.
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use s3sign_auth::canonical::canonicalize;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-amz-date", "20130524T000000Z".parse().unwrap());
/// let parts = canonicalize("/bucket/obj name", Some("b=2&a=1"), &headers, "localhost:9000");
///
/// assert_eq!(parts.uri, "/bucket/obj%20name");
/// assert_eq!(parts.query, "a=1&b=2");
/// assert_eq!(parts.headers, "host:localhost:9000\nx-amz-date:20130524T000000Z\n");
/// assert_eq!(parts.signed_headers, "host;x-amz-date");
/// ```
#[must_use]
pub fn canonicalize(
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    host: &str,
) -> CanonicalParts {
    let selected = select_headers(
        headers
            .iter()
            .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()))),
        host,
    );

    CanonicalParts {
        uri: build_canonical_uri(path),
        query: build_canonical_query_string(query.unwrap_or("")),
        headers: build_canonical_headers(&selected),
        signed_headers: selected
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";"),
    }
}

/// Build the full canonical request string from its components.
///
/// # Examples
///
/// ```
/// use s3sign_auth::canonical::{CanonicalParts, build_canonical_request};
///
/// let parts = CanonicalParts {
///     uri: "/test.txt".to_owned(),
///     query: String::new(),
///     headers: "host:examplebucket.s3.amazonaws.com\n".to_owned(),
///     signed_headers: "host".to_owned(),
/// };
/// let canonical = build_canonical_request("GET", &parts, "UNSIGNED-PAYLOAD");
/// assert_eq!(
///     canonical,
///     "GET\n/test.txt\n\nhost:examplebucket.s3.amazonaws.com\n\nhost\nUNSIGNED-PAYLOAD"
/// );
/// ```
#[must_use]
pub fn build_canonical_request(method: &str, parts: &CanonicalParts, payload_hash: &str) -> String {
    let mut buffer = CanonicalBuffer::new();
    buffer
        .push_line(method)
        .push_line(&parts.uri)
        .push_line(&parts.query)
        .push_line(&parts.headers)
        .push_line(&parts.signed_headers)
        .push_str(payload_hash);
    buffer.finish()
}

/// Build the canonical URI from the request path.
///
/// The path is decoded and percent-encoded again, so an already-encoded path
/// is not encoded twice. Forward slashes are preserved. Empty paths are
/// normalized to `/`.
///
/// # Examples
///
/// ```
/// use s3sign_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/test.txt"), "/test.txt");
/// assert_eq!(build_canonical_uri("/bucket/obj%20name"), "/bucket/obj%20name");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }
    reencode_path(path)
}

/// Build the canonical query string from a raw (as-transmitted) query.
///
/// Keys are compared after decoding and sorted byte-wise. Each key is
/// written once per value, values keep their original order, and keys and
/// values are percent-encoded with spaces as `%20`. A parameter without `=`
/// has an empty value.
///
/// # Examples
///
/// ```
/// use s3sign_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(""), "");
/// assert_eq!(build_canonical_query_string("b=2&a=1"), "a=1&b=2");
/// assert_eq!(build_canonical_query_string("uploads"), "uploads=");
/// assert_eq!(build_canonical_query_string("prefix=a+b"), "prefix=a%20b");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    // decoded key -> (encoded key, encoded values)
    let mut params: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();

    for param in query.split('&').filter(|s| !s.is_empty()) {
        let (raw_key, raw_value) = param.split_once('=').unwrap_or((param, ""));
        let sort_key = decode_query_component(raw_key).unwrap_or_else(|| raw_key.to_owned());
        params
            .entry(sort_key)
            .or_insert_with(|| (reencode_query_component(raw_key), Vec::new()))
            .1
            .push(reencode_query_component(raw_value));
    }

    params
        .values()
        .flat_map(|(key, values)| values.iter().map(move |value| format!("{key}={value}")))
        .collect::<Vec<_>>()
        .join("&")
}

/// Select the headers that take part in the signature.
///
/// Ignored headers are dropped, names are lower-cased, values for the same
/// name are kept in their original order, and the `host` entry is always
/// present with the value `host`.
///
/// # Examples
///
/// ```
/// use s3sign_auth::canonical::select_headers;
///
/// let set = select_headers([("User-Agent", "curl"), ("X-Amz-Meta-A", "1")], "example.com");
/// assert_eq!(set.keys().collect::<Vec<_>>(), ["host", "x-amz-meta-a"]);
/// ```
#[must_use]
pub fn select_headers<I, N, V>(headers: I, host: &str) -> HeaderSet
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<str>,
{
    let mut selected = HeaderSet::new();
    for (name, value) in headers {
        let name = name.as_ref().to_ascii_lowercase();
        if name == HOST_HEADER || is_ignored_header(&name) {
            continue;
        }
        selected
            .entry(name)
            .or_default()
            .push(canonical_header_value(value.as_ref()));
    }
    selected.insert(HOST_HEADER.to_owned(), vec![host.to_owned()]);
    selected
}

/// Build the canonical headers block from a selected header set.
///
/// Every line, including the last one, ends with `\n`.
///
/// # Examples
///
/// ```
/// use s3sign_auth::canonical::{build_canonical_headers, select_headers};
///
/// let set = select_headers([("x-amz-date", "20130524T000000Z")], "example.com");
/// assert_eq!(
///     build_canonical_headers(&set),
///     "host:example.com\nx-amz-date:20130524T000000Z\n"
/// );
/// ```
#[must_use]
pub fn build_canonical_headers(headers: &HeaderSet) -> String {
    let mut buffer = CanonicalBuffer::new();
    for (name, values) in headers {
        buffer.push_header(name, values);
    }
    buffer.finish()
}

/// Build the signed headers string as a semicolon-separated list of lowercase header names.
///
/// The header names are sorted lexicographically.
///
/// # Examples
///
/// ```
/// use s3sign_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(
///     build_signed_headers_string(&["x-amz-date", "host"]),
///     "host;x-amz-date"
/// );
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.join(";")
}

/// Whether `name` (lower-case) is excluded from signing.
#[must_use]
pub fn is_ignored_header(name: &str) -> bool {
    IGNORED_HEADERS.contains(&name)
}

/// Trim a header value and collapse inner whitespace runs to a single space.
#[must_use]
pub fn canonical_header_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_was_space = false;
    for ch in value.trim().chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
