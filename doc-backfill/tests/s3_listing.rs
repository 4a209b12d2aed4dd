use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::types::Object;
use doc_backfill::listing::{key_page_from_output, S3KeyLister};
use doc_backfill::load_config::StorageSection;
use doc_backfill_core::contract::{KeyLister, ListPageRequest};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Storage settings pointing the SDK at a local mock server.
pub fn storage_for(server: &MockServer) -> StorageSection {
    StorageSection {
        bucket: "legacy-bucket".into(),
        region: Some("us-east-1".into()),
        endpoint: Some(server.uri()),
        access_key: Some("test-access-key".into()),
        secret_key: Some("test-secret-key".into()),
    }
}

fn list_response(keys: &[&str], next_token: Option<&str>) -> ResponseTemplate {
    let contents: String = keys
        .iter()
        .map(|k| format!("<Contents><Key>{k}</Key><Size>1</Size></Contents>"))
        .collect();
    let truncation = match next_token {
        Some(token) => format!(
            "<IsTruncated>true</IsTruncated><NextContinuationToken>{token}</NextContinuationToken>"
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>legacy-bucket</Name><Prefix>seller/</Prefix><KeyCount>{}</KeyCount><MaxKeys>20</MaxKeys>{truncation}{contents}</ListBucketResult>"#,
        keys.len()
    );
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

fn request(token: Option<&str>) -> ListPageRequest {
    ListPageRequest {
        bucket: "legacy-bucket".into(),
        prefix: "seller/".into(),
        max_keys: 20,
        continuation_token: token.map(str::to_owned),
    }
}

#[test]
fn test_key_page_from_output_keeps_order_and_token() {
    let output = ListObjectsV2Output::builder()
        .contents(Object::builder().key("seller/1/a/GST/x.pdf").build())
        .contents(Object::builder().build())
        .contents(Object::builder().key("iocc/y.pdf").build())
        .is_truncated(true)
        .next_continuation_token("next")
        .build();

    let page = key_page_from_output(&output);
    assert_eq!(page.keys, vec!["seller/1/a/GST/x.pdf", "iocc/y.pdf"]);
    assert!(page.is_truncated);
    assert_eq!(page.next_cursor(), Some("next"));
}

#[test]
fn test_key_page_from_empty_output_is_last_page() {
    let page = key_page_from_output(&ListObjectsV2Output::builder().build());
    assert!(page.keys.is_empty());
    assert!(!page.is_truncated);
    assert_eq!(page.next_cursor(), None);
}

#[tokio::test]
async fn test_list_page_sends_prefix_max_keys_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy-bucket/"))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", "seller/"))
        .and(query_param("max-keys", "20"))
        .and(query_param("continuation-token", "t1"))
        .respond_with(list_response(&["seller/5/a/PAN/p.pdf"], None))
        .expect(1)
        .mount(&server)
        .await;

    let lister = S3KeyLister::connect(&storage_for(&server)).await;
    let page = lister
        .list_page(request(Some("t1")))
        .await
        .expect("listing should succeed");

    assert_eq!(page.keys, vec!["seller/5/a/PAN/p.pdf"]);
    assert_eq!(page.next_cursor(), None);
}

#[tokio::test]
async fn test_list_page_reports_truncation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy-bucket/"))
        .respond_with(list_response(&["seller/1/a/GST/1.pdf", "seller/1/a/GST/2.pdf"], Some("t1")))
        .mount(&server)
        .await;

    let lister = S3KeyLister::connect(&storage_for(&server)).await;
    let page = lister.list_page(request(None)).await.unwrap();

    assert_eq!(page.keys.len(), 2);
    assert_eq!(page.next_cursor(), Some("t1"));
}

#[tokio::test]
async fn test_service_error_becomes_list_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy-bucket/"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(
            r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>InternalError</Code><Message>We encountered an internal error.</Message></Error>"#,
            "application/xml",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let lister = S3KeyLister::connect(&storage_for(&server)).await;
    let err = lister.list_page(request(None)).await.unwrap_err();

    assert_eq!(err.bucket, "legacy-bucket");
    assert_eq!(err.prefix, "seller/");
    assert!(!err.message.is_empty());
}
