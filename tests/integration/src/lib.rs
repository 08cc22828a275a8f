//! Integration tests for s3sign.
//!
//! The signing tests run offline. The bucket, object and multipart tests
//! send signed requests to a running S3-compatible server (MinIO by default,
//! at `S3_ENDPOINT_URL`) and are marked `#[ignore]` so they don't run during
//! normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p s3sign-integration -- --ignored
//! ```

use std::io::Cursor;
use std::sync::{LazyLock, Mutex, Once};

use quick_xml::Reader;
use quick_xml::events::{BytesRef, Event};
use s3sign_auth::target::{
    abort_multipart_url, delete_bucket_url, delete_object_url, list_multipart_uploads_url,
    list_objects_url, make_bucket_url,
};
use s3sign_auth::{RequestDescriptor, RequestSigner};
use s3sign_core::{NameGenerator, SignerConfig};

static INIT: Once = Once::new();

static NAMES: LazyLock<Mutex<NameGenerator>> =
    LazyLock::new(|| Mutex::new(NameGenerator::from_entropy()));

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Signer configuration from the environment.
#[must_use]
pub fn test_config() -> SignerConfig {
    init_tracing();
    SignerConfig::from_env()
}

/// A `reqwest` client that signs every request it sends.
#[derive(Debug, Clone)]
pub struct SignedClient {
    http: reqwest::Client,
    signer: RequestSigner,
    endpoint: String,
}

impl SignedClient {
    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The signer used for every request.
    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Sign and send a request, returning the status and body text.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> (reqwest::StatusCode, http::HeaderMap, String) {
        let mut desc = RequestDescriptor::new(method, url)
            .unwrap_or_else(|e| panic!("invalid request {method} {url}: {e}"));
        for (name, value) in headers {
            desc = desc
                .with_header(name, value)
                .unwrap_or_else(|e| panic!("invalid header {name}: {e}"));
        }

        let request = match body {
            Some(bytes) => self
                .signer
                .sign(desc.with_body(Cursor::new(bytes.to_vec())))
                .and_then(s3sign_auth::SignedRequest::into_buffered),
            None => self
                .signer
                .sign(desc)
                .and_then(s3sign_auth::SignedRequest::into_buffered),
        }
        .unwrap_or_else(|e| panic!("failed to sign {method} {url}: {e}"));

        self.transmit(request).await
    }

    /// Send an already signed request as is.
    pub async fn transmit(
        &self,
        request: http::Request<bytes::Bytes>,
    ) -> (reqwest::StatusCode, http::HeaderMap, String) {
        let (parts, body) = request.into_parts();
        let response = self
            .http
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to send request: {e}"));

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .unwrap_or_else(|e| panic!("failed to read response: {e}"));
        tracing::debug!(%status, body = %text, "response");
        (status, headers, text)
    }
}

/// Create a signed client for the configured endpoint.
#[must_use]
pub fn signed_client() -> SignedClient {
    let config = test_config();
    SignedClient {
        http: reqwest::Client::new(),
        signer: RequestSigner::from_config(&config),
        endpoint: config.endpoint,
    }
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let mut names = NAMES.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    names.unique_name(&format!("test-{prefix}-"))
}

/// Generate a unique object key for a test.
#[must_use]
pub fn test_object_name(prefix: &str) -> String {
    let mut names = NAMES.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    names.unique_name(prefix)
}

/// Text of every `<tag>` element in an XML document, with entity and
/// character references resolved.
#[must_use]
pub fn xml_values(xml: &str, tag: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut values = Vec::new();
    let mut current: Option<String> = None;
    loop {
        match reader
            .read_event()
            .unwrap_or_else(|e| panic!("malformed XML: {e}"))
        {
            Event::Start(e) if e.local_name().as_ref() == tag.as_bytes() => {
                current = Some(String::new());
            }
            Event::Empty(e) if e.local_name().as_ref() == tag.as_bytes() => {
                values.push(String::new());
            }
            Event::End(e) if e.local_name().as_ref() == tag.as_bytes() => {
                if let Some(text) = current.take() {
                    values.push(text);
                }
            }
            Event::Text(e) => {
                if let Some(text) = current.as_mut() {
                    let decoded = e.decode().unwrap_or_else(|err| panic!("{err}"));
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .unwrap_or_else(|err| panic!("{err}"));
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&e.decode().unwrap_or_else(|err| panic!("{err}")));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&resolve_reference(&e));
                }
            }
            Event::Eof => return values,
            _ => {}
        }
    }
}

/// Resolve a `&name;` or `&#NN;` reference found in element text.
fn resolve_reference(reference: &BytesRef<'_>) -> String {
    if let Some(ch) = reference
        .resolve_char_ref()
        .unwrap_or_else(|e| panic!("bad character reference: {e}"))
    {
        return ch.to_string();
    }
    let name = reference.decode().unwrap_or_else(|e| panic!("{e}"));
    quick_xml::escape::resolve_predefined_entity(&name)
        .unwrap_or_else(|| panic!("unknown entity &{name};"))
        .to_owned()
}

/// Create a bucket and return its name. Caller is responsible for cleanup.
pub async fn create_test_bucket(client: &SignedClient, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    let (status, _, body) = client
        .send("PUT", &make_bucket_url(client.endpoint(), &name), &[], None)
        .await;
    assert!(status.is_success(), "failed to create bucket {name}: {body}");
    name
}

/// Delete all objects and pending uploads in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &SignedClient, bucket: &str) {
    let endpoint = client.endpoint().to_owned();

    let (status, _, listing) = client
        .send("GET", &list_objects_url(&endpoint, bucket, "1000"), &[], None)
        .await;
    if !status.is_success() {
        return; // Bucket may not exist.
    }
    for key in xml_values(&listing, "Key") {
        let _ = client
            .send("DELETE", &delete_object_url(&endpoint, bucket, &key), &[], None)
            .await;
    }

    let (_, _, uploads) = client
        .send("GET", &list_multipart_uploads_url(&endpoint, bucket), &[], None)
        .await;
    let keys = xml_values(&uploads, "Key");
    let ids = xml_values(&uploads, "UploadId");
    for (key, id) in keys.iter().zip(&ids) {
        let _ = client
            .send("DELETE", &abort_multipart_url(&endpoint, bucket, key, id), &[], None)
            .await;
    }

    let _ = client
        .send("DELETE", &delete_bucket_url(&endpoint, bucket), &[], None)
        .await;
}

mod test_bucket;
mod test_multipart;
mod test_signing;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_resolve_character_references_in_xml_values() {
        let listing = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
            <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
            <Contents><Key>it&#39;s &#34;q&#34;</Key><Size>1</Size></Contents>\
            <Contents><Key>a &amp; b &lt;c&gt;</Key></Contents>\
            <Contents><Key>&#x65E5;&#26412;</Key></Contents>\
            </ListBucketResult>";
        assert_eq!(
            xml_values(listing, "Key"),
            vec!["it's \"q\"", "a & b <c>", "日本"]
        );
        assert_eq!(xml_values(listing, "Size"), vec!["1"]);
    }

    #[test]
    fn test_should_return_nothing_for_missing_tags() {
        assert!(xml_values("<Error><Code>NoSuchBucket</Code></Error>", "UploadId").is_empty());
        assert_eq!(xml_values("<r><Key/></r>", "Key"), vec![String::new()]);
    }
}
