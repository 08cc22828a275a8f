//! Digest helpers used while signing.
//!
//! SHA-256 produces the payload hash that is part of every canonical request,
//! HMAC-SHA256 drives key derivation and the final signature, and MD5 feeds
//! the `Content-Md5` integrity header (never the signature itself).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex SHA-256 of the zero-length byte sequence.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Compute the raw SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Compute the SHA-256 hash of the given payload and return it as a hex string.
///
/// This is the value of the `x-amz-content-sha256` header.
///
/// # Examples
///
/// ```
/// use s3sign_auth::hash::hash_payload;
///
/// // SHA-256 of empty payload
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Compute the base64-encoded MD5 of `data`, the value of `Content-Md5`.
///
/// # Examples
///
/// ```
/// use s3sign_auth::hash::content_md5;
///
/// assert_eq!(content_md5(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
/// ```
#[must_use]
pub fn content_md5(data: &[u8]) -> String {
    BASE64_STANDARD.encode(md5::Md5::digest(data))
}

/// Compute HMAC-SHA256 and return the raw bytes.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
