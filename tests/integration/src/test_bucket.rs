//! Bucket integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use s3sign_auth::target::{
        delete_policy_url, get_policy_url, head_bucket_url, list_buckets_url, put_policy_url,
    };

    use crate::{cleanup_bucket, create_test_bucket, signed_client, xml_values};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_delete_bucket() {
        let client = signed_client();
        let bucket = create_test_bucket(&client, "create").await;

        let (status, _, _) = client
            .send("HEAD", &head_bucket_url(client.endpoint(), &bucket), &[], None)
            .await;
        assert_eq!(status, StatusCode::OK);

        cleanup_bucket(&client, &bucket).await;

        let (status, _, _) = client
            .send("HEAD", &head_bucket_url(client.endpoint(), &bucket), &[], None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_buckets() {
        let client = signed_client();
        let b1 = create_test_bucket(&client, "list1").await;
        let b2 = create_test_bucket(&client, "list2").await;

        let (status, _, body) = client
            .send("GET", &list_buckets_url(client.endpoint()), &[], None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let names = xml_values(&body, "Name");
        assert!(names.contains(&b1), "should contain {b1}");
        assert!(names.contains(&b2), "should contain {b2}");

        cleanup_bucket(&client, &b1).await;
        cleanup_bucket(&client, &b2).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_get_and_delete_bucket_policy() {
        let client = signed_client();
        let bucket = create_test_bucket(&client, "policy").await;
        let policy = format!(
            r#"{{"Version":"2012-10-17","Statement":[{{"Effect":"Allow","Principal":{{"AWS":["*"]}},"Action":["s3:GetObject"],"Resource":["arn:aws:s3:::{bucket}/*"]}}]}}"#
        );

        let (status, _, body) = client
            .send(
                "PUT",
                &put_policy_url(client.endpoint(), &bucket),
                &[],
                Some(policy.as_bytes()),
            )
            .await;
        assert!(status.is_success(), "put policy failed: {body}");

        let (status, _, body) = client
            .send("GET", &get_policy_url(client.endpoint(), &bucket), &[], None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("s3:GetObject"));

        let (status, _, _) = client
            .send("DELETE", &delete_policy_url(client.endpoint(), &bucket), &[], None)
            .await;
        assert!(status.is_success());

        cleanup_bucket(&client, &bucket).await;
    }
}
