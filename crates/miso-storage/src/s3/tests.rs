//! Unit tests for the S3 backend, run against a wiremock S3 endpoint

use super::*;

use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, SharedCredentialsProvider};
use wiremock::matchers::{method, path, path_regex, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "registry";

fn test_storage(endpoint: &str, request_timeout: Option<Duration>) -> S3Storage {
    let creds = Credentials::new("test-access-key", "test-secret-key", None, None, "miso-tests");
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .credentials_provider(SharedCredentialsProvider::new(creds))
        .build();

    S3Storage::new(
        Client::from_conf(config),
        S3Settings {
            bucket: BUCKET.to_string(),
            presign_expiry: Duration::from_secs(900),
            request_timeout,
        },
    )
}

fn list_page(prefix: &str, keys: &[&str], next_token: Option<&str>) -> String {
    let contents: String = keys
        .iter()
        .map(|key| format!("<Contents><Key>{}</Key><Size>12</Size></Contents>", key))
        .collect();
    let truncation = match next_token {
        Some(token) => format!(
            "<IsTruncated>true</IsTruncated><NextContinuationToken>{}</NextContinuationToken>",
            token
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{}</Name><Prefix>{}</Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>{}{}</ListBucketResult>"#,
        BUCKET,
        prefix,
        keys.len(),
        truncation,
        contents
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

#[tokio::test]
async fn test_list_follows_continuation_tokens() {
    let mock_server = MockServer::start().await;
    let prefix = "providers/acme/widget/";

    Mock::given(method("GET"))
        .and(path_regex(r"^/registry/?$"))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", prefix))
        .and(query_param_is_missing("continuation-token"))
        .respond_with(xml(list_page(
            prefix,
            &["providers/acme/widget/1.0.0/linux/amd64/terraform-provider-widget_v1.0.0"],
            Some("page-2"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/registry/?$"))
        .and(query_param("continuation-token", "page-2"))
        .respond_with(xml(list_page(
            prefix,
            &["providers/acme/widget/1.1.0/linux/amd64/terraform-provider-widget_v1.1.0"],
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    let keys = storage.list(prefix).await.unwrap();

    assert_eq!(
        keys,
        vec![
            "providers/acme/widget/1.0.0/linux/amd64/terraform-provider-widget_v1.0.0",
            "providers/acme/widget/1.1.0/linux/amd64/terraform-provider-widget_v1.1.0",
        ]
    );
}

#[tokio::test]
async fn test_list_no_matches_is_empty() {
    let mock_server = MockServer::start().await;
    let prefix = "modules/ns/m/p/";

    Mock::given(method("GET"))
        .and(path_regex(r"^/registry/?$"))
        .and(query_param("prefix", prefix))
        .respond_with(xml(list_page(prefix, &[], None)))
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    assert!(storage.list(prefix).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_empty_prefix_skips_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    assert!(storage.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_access_denied_is_object_access_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/registry/?$"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(
            r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    match storage.list("providers/ns/t/").await {
        Err(MisoError::ObjectAccess { operation, key, .. }) => {
            assert_eq!(operation, StorageOperation::List);
            assert_eq!(key, "providers/ns/t/");
        }
        other => panic!("Expected ObjectAccess error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_buffer_and_stream_return_object_bytes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/registry/modules/ns/m/p/1.0.0/module.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"file content".to_vec()))
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);

    let buffer = storage.get_buffer("modules/ns/m/p/1.0.0/module.zip").await.unwrap();
    assert_eq!(&buffer[..], b"file content");

    let stream = storage.get_stream("modules/ns/m/p/1.0.0/module.zip").await.unwrap();
    let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"file content".to_vec());
}

#[tokio::test]
async fn test_get_missing_key_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(
            r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    let result = storage.get_buffer("modules/ns/m/p/9.9.9/module.zip").await;

    assert!(matches!(result, Err(MisoError::ObjectAccess { .. })));
}

#[tokio::test]
async fn test_request_timeout_is_storage_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"late".to_vec())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), Some(Duration::from_millis(100)));
    let result = storage.get_buffer("providers/ns/t/1.0.0/linux/amd64/terraform-provider-t_v1.0.0").await;

    assert!(matches!(result, Err(MisoError::StorageUnavailable { .. })));
}

#[tokio::test]
async fn test_presigned_url_is_signed_get_for_key() {
    let storage = test_storage("http://localhost:9000", None);
    let url = storage
        .presigned_url("providers/ns/t/1.0.0/linux/amd64/terraform-provider-t_v1.0.0")
        .await
        .unwrap();

    assert!(url.starts_with(
        "http://localhost:9000/registry/providers/ns/t/1.0.0/linux/amd64/terraform-provider-t_v1.0.0?"
    ));
    assert!(url.contains("X-Amz-Expires=900"));
    assert!(url.contains("X-Amz-Signature="));
}

#[tokio::test]
async fn test_empty_key_writes_are_noops() {
    let storage = test_storage("http://localhost:9", None);

    assert!(storage.put("", crate::bytes_stream("ignored")).await.is_ok());
    assert!(storage.delete("").await.is_ok());
}

#[tokio::test]
async fn test_put_uploads_object_under_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/registry/modules/ns/m/p/1.0.0/module.zip"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    storage
        .put("modules/ns/m/p/1.0.0/module.zip", crate::bytes_stream("file content"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_access_denied_is_write_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(
            r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    match storage.put("modules/ns/m/p/1.0.0/module.zip", crate::bytes_stream("x")).await {
        Err(MisoError::ObjectAccess { operation, key, .. }) => {
            assert_eq!(operation, StorageOperation::Write);
            assert_eq!(key, "modules/ns/m/p/1.0.0/module.zip");
        }
        other => panic!("Expected ObjectAccess error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_removes_object_under_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(
            "/registry/providers/ns/t/1.0.0/linux/amd64/terraform-provider-t_v1.0.0",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = test_storage(&mock_server.uri(), None);
    storage
        .delete("providers/ns/t/1.0.0/linux/amd64/terraform-provider-t_v1.0.0")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_storage_unavailable() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let storage = test_storage(&endpoint, None);
    let result = storage.get_buffer("modules/ns/m/p/1.0.0/module.zip").await;

    assert!(
        matches!(result, Err(MisoError::StorageUnavailable { .. })),
        "Expected StorageUnavailable error, got {:?}",
        result
    );
}
