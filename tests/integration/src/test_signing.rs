//! Offline signing round trips through the public API.

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::{TimeZone, Utc};
    use s3sign_auth::target::{part_upload_url, put_object_url};
    use s3sign_auth::{
        Credentials, RequestDescriptor, RequestSigner, StaticCredentialProvider, verify_sigv4,
    };

    const ENDPOINT: &str = "http://localhost:9000";

    fn signer() -> RequestSigner {
        RequestSigner::builder()
            .credentials(Credentials::new("minioadmin", "minioadmin"))
            .build()
    }

    fn provider() -> StaticCredentialProvider {
        StaticCredentialProvider::from_credentials([Credentials::new("minioadmin", "minioadmin")])
    }

    #[test]
    fn test_should_verify_unicode_object_put() {
        let url = put_object_url(ENDPOINT, "bucket", "папка/日本語 file+1.txt");
        let desc = RequestDescriptor::new("PUT", &url)
            .unwrap()
            .with_header("x-amz-meta-note", "signed  value")
            .unwrap()
            .with_body(Cursor::new(b"payload".to_vec()));
        let signed = signer().sign(desc).unwrap();

        let payload_hash = signed.request.headers()["x-amz-content-sha256"]
            .to_str()
            .unwrap()
            .to_owned();
        let (parts, _) = signed.request.into_parts();
        let result = verify_sigv4(&parts, &payload_hash, &provider()).unwrap();
        assert_eq!(result.access_key_id, "minioadmin");
    }

    #[test]
    fn test_should_verify_multipart_part_upload() {
        let url = part_upload_url(ENDPOINT, "bucket", "big object", "2~abc/def", "7");
        let desc = RequestDescriptor::new("PUT", &url)
            .unwrap()
            .with_body(Cursor::new(vec![b'x'; 4096]));
        let signed = signer().sign(desc).unwrap();

        let payload_hash = signed.request.headers()["x-amz-content-sha256"]
            .to_str()
            .unwrap()
            .to_owned();
        let (parts, _) = signed.request.into_parts();
        assert!(verify_sigv4(&parts, &payload_hash, &provider()).is_ok());
    }

    #[test]
    fn test_should_sign_identically_from_concurrent_threads() {
        let instant = Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).unwrap();
        let signer = signer();

        let authorizations: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let desc = RequestDescriptor::new("GET", &format!("{ENDPOINT}/bucket/key"))
                            .unwrap();
                        signer
                            .sign_at(desc, instant)
                            .unwrap()
                            .authorization()
                            .unwrap()
                            .to_owned()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(authorizations.windows(2).all(|w| w[0] == w[1]));
        assert!(authorizations[0].contains("/20240229/us-east-1/s3/aws4_request"));
    }

    #[test]
    fn test_should_reject_signature_from_other_secret() {
        let desc = RequestDescriptor::new("DELETE", &put_object_url(ENDPOINT, "b", "k")).unwrap();
        let signed = RequestSigner::builder()
            .credentials(Credentials::new("minioadmin", "not-the-secret"))
            .build()
            .sign(desc)
            .unwrap();

        let (parts, _) = signed.request.into_parts();
        let result = verify_sigv4(&parts, s3sign_auth::hash::EMPTY_PAYLOAD_SHA256, &provider());
        assert!(matches!(
            result,
            Err(s3sign_auth::AuthError::SignatureDoesNotMatch)
        ));
    }
}
