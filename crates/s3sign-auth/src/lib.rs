//! AWS Signature Version 4 request signing for S3-compatible APIs.
//!
//! Given an HTTP method, a target URL, headers, an optional body, and a
//! credential pair, this crate produces a request carrying a valid SigV4
//! `Authorization` header. The same canonicalization also runs in reverse:
//! [`verify_sigv4`] recomputes the signature of a transmitted request, which
//! is how round trips are checked.
//!
//! # Usage
//!
//! ```rust
//! use std::io::Cursor;
//!
//! use s3sign_auth::{Credentials, RequestDescriptor, RequestSigner};
//! use s3sign_auth::target::put_object_url;
//!
//! let signer = RequestSigner::builder()
//!     .credentials(Credentials::new("minioadmin", "minioadmin"))
//!     .build();
//!
//! let url = put_object_url("http://localhost:9000", "bucket", "dir/obj name");
//! let desc = RequestDescriptor::new("PUT", &url)
//!     .unwrap()
//!     .with_body(Cursor::new(b"hello".to_vec()));
//!
//! let signed = signer.sign(desc).unwrap();
//! assert!(signed.request.headers().contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`hash`] - SHA-256, MD5 and HMAC-SHA256 primitives
//! - [`encode`] - Percent-encoding for paths and query components
//! - [`canonical`] - Canonical request construction
//! - [`sigv4`] - Key derivation, signing, and verification
//! - [`credentials`] - Access key pairs and secret lookup
//! - [`signer`] - The end-to-end request signing pipeline
//! - [`target`] - Path-style URLs for S3 operations
//! - [`error`] - Signing and verification error types

pub mod canonical;
pub mod credentials;
pub mod encode;
pub mod error;
pub mod hash;
pub mod signer;
pub mod sigv4;
pub mod target;

pub use credentials::{CredentialProvider, Credentials, StaticCredentialProvider};
pub use error::{AuthError, SignError};
pub use hash::hash_payload;
pub use signer::{RequestDescriptor, RequestSigner, SignedRequest};
pub use sigv4::{AuthResult, SigningScope, verify_sigv4};
