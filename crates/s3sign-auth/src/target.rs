//! Target URL construction for S3 operations.
//!
//! URLs are path-style: `{endpoint}/{bucket}/{object}?{query}`. Object names
//! are percent-encoded with `/` kept, so keys with spaces or non-ASCII
//! characters produce URLs that [`crate::signer::RequestDescriptor::new`]
//! accepts and that sign to the same canonical path a server rebuilds.

use std::collections::BTreeMap;

use crate::encode::uri_encode_path;

/// Encode query parameters, sorted by key.
///
/// Values for a repeated key keep their order. Keys and values use path
/// encoding, so `/` is left as is.
///
/// # Examples
///
/// ```
/// use s3sign_auth::target::query_encode;
///
/// assert_eq!(query_encode([("uploads", "")]), "uploads=");
/// assert_eq!(
///     query_encode([("uploadId", "a b"), ("partNumber", "1")]),
///     "partNumber=1&uploadId=a%20b"
/// );
/// ```
#[must_use]
pub fn query_encode<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut sorted: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        sorted.entry(key).or_default().push(value);
    }
    sorted
        .into_iter()
        .flat_map(|(key, values)| {
            let key = uri_encode_path(key);
            values
                .into_iter()
                .map(move |value| format!("{key}={}", uri_encode_path(value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Build a path-style target URL.
///
/// The bucket segment is omitted when `bucket` is empty, the object segment
/// when `object` is empty, and the query when `query` has no parameters.
///
/// # Examples
///
/// ```
/// use s3sign_auth::target::make_target_url;
///
/// assert_eq!(
///     make_target_url("http://localhost:9000", "bucket", "dir/obj name", &[]),
///     "http://localhost:9000/bucket/dir/obj%20name"
/// );
/// assert_eq!(make_target_url("http://localhost:9000", "", "", &[]), "http://localhost:9000/");
/// ```
#[must_use]
pub fn make_target_url(
    endpoint: &str,
    bucket: &str,
    object: &str,
    query: &[(&str, &str)],
) -> String {
    let mut url = format!("{}/", endpoint.trim_end_matches('/'));
    if !bucket.is_empty() {
        url.push_str(bucket);
        url.push('/');
    }
    if !object.is_empty() {
        url.push_str(&uri_encode_path(object));
    }
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query_encode(query.iter().copied()));
    }
    url
}

/// URL for uploading an object.
#[must_use]
pub fn put_object_url(endpoint: &str, bucket: &str, object: &str) -> String {
    make_target_url(endpoint, bucket, object, &[])
}

/// URL for fetching an object.
#[must_use]
pub fn get_object_url(endpoint: &str, bucket: &str, object: &str) -> String {
    make_target_url(endpoint, bucket, object, &[])
}

/// URL for deleting an object.
#[must_use]
pub fn delete_object_url(endpoint: &str, bucket: &str, object: &str) -> String {
    make_target_url(endpoint, bucket, object, &[])
}

/// URL for `HEAD` on an object.
#[must_use]
pub fn head_object_url(endpoint: &str, bucket: &str, object: &str) -> String {
    make_target_url(endpoint, bucket, object, &[])
}

/// URL for creating a bucket.
#[must_use]
pub fn make_bucket_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[])
}

/// URL for `HEAD` on a bucket.
#[must_use]
pub fn head_bucket_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[])
}

/// URL for deleting a bucket.
#[must_use]
pub fn delete_bucket_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[])
}

/// URL for listing all buckets.
#[must_use]
pub fn list_buckets_url(endpoint: &str) -> String {
    make_target_url(endpoint, "", "", &[])
}

/// URL for listing the objects of a bucket. An empty `max_keys` is omitted.
#[must_use]
pub fn list_objects_url(endpoint: &str, bucket: &str, max_keys: &str) -> String {
    if max_keys.is_empty() {
        make_target_url(endpoint, bucket, "", &[])
    } else {
        make_target_url(endpoint, bucket, "", &[("max-keys", max_keys)])
    }
}

/// URL for setting a bucket policy.
#[must_use]
pub fn put_policy_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[("policy", "")])
}

/// URL for fetching a bucket policy.
#[must_use]
pub fn get_policy_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[("policy", "")])
}

/// URL for deleting a bucket policy.
#[must_use]
pub fn delete_policy_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[("policy", "")])
}

/// URL for initiating a multipart upload.
#[must_use]
pub fn new_multipart_url(endpoint: &str, bucket: &str, object: &str) -> String {
    make_target_url(endpoint, bucket, object, &[("uploads", "")])
}

/// URL for uploading one part of a multipart upload.
#[must_use]
pub fn part_upload_url(
    endpoint: &str,
    bucket: &str,
    object: &str,
    upload_id: &str,
    part_number: &str,
) -> String {
    make_target_url(
        endpoint,
        bucket,
        object,
        &[("uploadId", upload_id), ("partNumber", part_number)],
    )
}

/// URL for aborting a multipart upload.
#[must_use]
pub fn abort_multipart_url(endpoint: &str, bucket: &str, object: &str, upload_id: &str) -> String {
    make_target_url(endpoint, bucket, object, &[("uploadId", upload_id)])
}

/// URL for completing a multipart upload.
#[must_use]
pub fn complete_multipart_url(
    endpoint: &str,
    bucket: &str,
    object: &str,
    upload_id: &str,
) -> String {
    make_target_url(endpoint, bucket, object, &[("uploadId", upload_id)])
}

/// URL for listing the in-progress multipart uploads of a bucket.
#[must_use]
pub fn list_multipart_uploads_url(endpoint: &str, bucket: &str) -> String {
    make_target_url(endpoint, bucket, "", &[("uploads", "")])
}

/// URL for listing the parts of a multipart upload.
#[must_use]
pub fn list_parts_url(
    endpoint: &str,
    bucket: &str,
    object: &str,
    upload_id: &str,
    max_parts: &str,
) -> String {
    make_target_url(
        endpoint,
        bucket,
        object,
        &[("uploadId", upload_id), ("max-parts", max_parts)],
    )
}
