//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use reqwest::StatusCode;
    use s3sign_auth::target::{
        abort_multipart_url, complete_multipart_url, get_object_url, list_multipart_uploads_url,
        list_parts_url, new_multipart_url, part_upload_url,
    };

    use crate::{
        SignedClient, cleanup_bucket, create_test_bucket, signed_client, test_object_name,
        xml_values,
    };

    /// Every part except the last must be at least 5 MiB.
    const PART_SIZE: usize = 5 * 1024 * 1024;

    async fn initiate(client: &SignedClient, bucket: &str, key: &str) -> String {
        let (status, _, body) = client
            .send("POST", &new_multipart_url(client.endpoint(), bucket, key), &[], None)
            .await;
        assert_eq!(status, StatusCode::OK, "initiate failed: {body}");
        xml_values(&body, "UploadId")
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no UploadId in {body}"))
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_upload_list_and_complete_parts() {
        let client = signed_client();
        let bucket = create_test_bucket(&client, "multipart").await;
        let key = test_object_name("multi part/объект-");
        let upload_id = initiate(&client, &bucket, &key).await;

        let parts: [Vec<u8>; 2] = [vec![b'a'; PART_SIZE], b"tail".to_vec()];
        let mut etags = Vec::new();
        for (i, data) in parts.iter().enumerate() {
            let part_number = (i + 1).to_string();
            let url = part_upload_url(client.endpoint(), &bucket, &key, &upload_id, &part_number);
            let (status, headers, body) = client
                .send("PUT", &url, &[], Some(data.as_slice()))
                .await;
            assert_eq!(status, StatusCode::OK, "part {part_number} failed: {body}");
            let etag = headers["etag"].to_str().unwrap().to_owned();
            etags.push(etag);
        }

        let (status, _, body) = client
            .send(
                "GET",
                &list_parts_url(client.endpoint(), &bucket, &key, &upload_id, "1"),
                &[],
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(xml_values(&body, "PartNumber"), vec!["1"]);
        assert_eq!(xml_values(&body, "IsTruncated"), vec!["true"]);

        let mut complete = String::from("<CompleteMultipartUpload>");
        for (i, etag) in etags.iter().enumerate() {
            let _ = write!(
                complete,
                "<Part><PartNumber>{}</PartNumber><ETag>{etag}</ETag></Part>",
                i + 1
            );
        }
        complete.push_str("</CompleteMultipartUpload>");

        let (status, _, body) = client
            .send(
                "POST",
                &complete_multipart_url(client.endpoint(), &bucket, &key, &upload_id),
                &[],
                Some(complete.as_bytes()),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "complete failed: {body}");

        let (status, headers, _) = client
            .send("HEAD", &get_object_url(client.endpoint(), &bucket, &key), &[], None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers["content-length"],
            (PART_SIZE + 4).to_string().as_str()
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_and_abort_uploads() {
        let client = signed_client();
        let bucket = create_test_bucket(&client, "abort").await;
        let key = test_object_name("aborted-");
        let upload_id = initiate(&client, &bucket, &key).await;

        let (status, _, body) = client
            .send(
                "GET",
                &list_multipart_uploads_url(client.endpoint(), &bucket),
                &[],
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(xml_values(&body, "UploadId").contains(&upload_id));

        let (status, _, _) = client
            .send(
                "DELETE",
                &abort_multipart_url(client.endpoint(), &bucket, &key, &upload_id),
                &[],
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, _, body) = client
            .send(
                "GET",
                &list_multipart_uploads_url(client.endpoint(), &bucket),
                &[],
                None,
            )
            .await;
        assert!(!xml_values(&body, "UploadId").contains(&upload_id));

        cleanup_bucket(&client, &bucket).await;
    }
}
