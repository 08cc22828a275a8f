//! Percent-encoding for SigV4 canonical URIs and query strings.
//!
//! Unreserved characters (`A-Z`, `a-z`, `0-9`, `-`, `_`, `.`, `~`) pass
//! through untouched. Every other character is written as the `%XX` escapes
//! of its UTF-8 bytes, with upper-case hex digits. Path encoding additionally
//! keeps `/`; query component encoding escapes it.
//!
//! Inputs that already consist only of unreserved characters are returned
//! borrowed, without running the byte-wise encoder.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;
use tracing::warn;

/// Characters that must be escaped in a query key or value.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters that must be escaped in a URI path. Forward slashes are kept.
const PATH_ENCODE_SET: &AsciiSet = &COMPONENT_ENCODE_SET.remove(b'/');

static UNRESERVED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_.~/]+$").expect("unreserved path pattern"));

static UNRESERVED_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_.~]+$").expect("unreserved component pattern"));

/// Percent-encode a path, preserving `/`.
///
/// # Examples
///
/// ```
/// use s3sign_auth::encode::uri_encode_path;
///
/// assert_eq!(uri_encode_path("/bucket/obj name"), "/bucket/obj%20name");
/// assert_eq!(uri_encode_path("/bucket/día"), "/bucket/d%C3%ADa");
/// ```
#[must_use]
pub fn uri_encode_path(text: &str) -> Cow<'_, str> {
    if UNRESERVED_PATH.is_match(text) {
        return Cow::Borrowed(text);
    }
    utf8_percent_encode(text, PATH_ENCODE_SET).into()
}

/// Percent-encode a single query key or value. `/` is escaped as `%2F`.
///
/// # Examples
///
/// ```
/// use s3sign_auth::encode::uri_encode_component;
///
/// assert_eq!(uri_encode_component("a b+c/d"), "a%20b%2Bc%2Fd");
/// ```
#[must_use]
pub fn uri_encode_component(text: &str) -> Cow<'_, str> {
    if UNRESERVED_COMPONENT.is_match(text) {
        return Cow::Borrowed(text);
    }
    utf8_percent_encode(text, COMPONENT_ENCODE_SET).into()
}

/// Rewrite any `+` left by a form-style encoder into `%20`.
#[must_use]
pub fn plus_to_percent20(text: &str) -> Cow<'_, str> {
    if text.contains('+') {
        Cow::Owned(text.replace('+', "%20"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Decode an as-transmitted path and encode it again in canonical form.
///
/// `/bucket/obj%20name` and `/bucket/obj name` both become
/// `/bucket/obj%20name`, and lower-case escapes come out upper-case.
///
/// If the decoded bytes are not valid UTF-8 the raw path is returned
/// unchanged.
#[must_use]
pub fn reencode_path(raw: &str) -> String {
    if UNRESERVED_PATH.is_match(raw) {
        return raw.to_owned();
    }
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => plus_to_percent20(&uri_encode_path(&decoded)).into_owned(),
        Err(e) => {
            warn!(
                path = raw,
                error = %e,
                "path is not valid UTF-8 once decoded, signing it as-is"
            );
            raw.to_owned()
        }
    }
}

/// Decode an as-transmitted query key or value and encode it again in
/// canonical form.
///
/// A raw `+` stands for a space (form encoding), so `a+b` and `a%20b` both
/// become `a%20b`, while `%2B` stays a literal plus and becomes `%2B`.
///
/// If the decoded bytes are not valid UTF-8 the raw text is returned
/// unchanged apart from the `+` to `%20` rewrite.
#[must_use]
pub fn reencode_query_component(raw: &str) -> String {
    if UNRESERVED_COMPONENT.is_match(raw) {
        return raw.to_owned();
    }
    match decode_query_component(raw) {
        Some(decoded) => uri_encode_component(&decoded).into_owned(),
        None => {
            warn!(
                component = raw,
                "query component is not valid UTF-8 once decoded, signing it as-is"
            );
            plus_to_percent20(raw).into_owned()
        }
    }
}

/// Decode a raw query key or value, treating `+` as a space.
///
/// Returns `None` if the decoded bytes are not valid UTF-8.
///
/// # Examples
///
/// ```
/// use s3sign_auth::encode::decode_query_component;
///
/// assert_eq!(decode_query_component("a+b%2Bc").as_deref(), Some("a b+c"));
/// assert_eq!(decode_query_component("%FF"), None);
/// ```
#[must_use]
pub fn decode_query_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}
