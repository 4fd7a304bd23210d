//! Tests for loading request options from JSON documents.

use std::io::Write;
use tempfile::NamedTempFile;
use xhrnet::transport::{Reply, ScriptedHost};
use xhrnet::{NetError, RequestOptions, ResponseType, XhrClient};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults_from_file() {
    let file = write_config(
        r#"{
            "headers": {"X-Requested-With": "XMLHttpRequest"},
            "responseType": "text",
            "cache": false,
            "charset": "ISO-8859-1"
        }"#,
    );

    let options = RequestOptions::from_json_file(file.path()).unwrap();
    let host = ScriptedHost::new();
    host.enqueue(Reply::new(200).body("{}"));
    let client = XhrClient::builder()
        .transport(host.clone())
        .defaults(options)
        .build();

    assert_eq!(client.defaults().response_type, ResponseType::Text);
    assert!(!client.defaults().cache);

    let _pending = client.get("http://x/feed").send().unwrap();
    let exchange = host.last_exchange().unwrap();
    assert!(exchange.opened_url().unwrap().starts_with("http://x/feed?_="));
    assert_eq!(
        exchange.sent_header("Content-Type").as_deref(),
        Some("application/x-www-form-urlencoded; charset=ISO-8859-1")
    );
    assert_eq!(
        exchange.sent_header("X-Requested-With").as_deref(),
        Some("XMLHttpRequest")
    );
}

#[test]
fn test_request_from_file() {
    let file = write_config(
        r#"{"url": "http://x/submit", "method": "PUT", "data": {"a": "1", "b": "x y"}, "async": false}"#,
    );

    let options = RequestOptions::from_json_file(file.path()).unwrap();
    let host = ScriptedHost::new();
    host.enqueue(Reply::new(204));
    let client = XhrClient::builder().transport(host.clone()).build();

    let mut pending = client.request(options).unwrap();
    assert_eq!(pending.try_settlement().unwrap().unwrap().status(), 204);
    assert_eq!(
        host.last_exchange().unwrap().sent_body().as_deref(),
        Some("a=1&b=x%20y")
    );
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = RequestOptions::from_json_file(dir.path().join("absent.json")).unwrap_err();
    match err {
        NetError::InvalidConfig { message } => assert!(message.contains("absent.json")),
        other => panic!("Expected InvalidConfig, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_reports_position() {
    let file = write_config("{\n  \"url\": \n}");
    let err = RequestOptions::from_json_file(file.path()).unwrap_err();
    match err {
        NetError::InvalidConfig { message } => assert!(message.contains(":3:"), "{}", message),
        other => panic!("Expected InvalidConfig, got {:?}", other),
    }
}

#[test]
fn test_unknown_option_rejected() {
    let file = write_config(r#"{"timeout": 30}"#);
    assert!(matches!(
        RequestOptions::from_json_file(file.path()),
        Err(NetError::InvalidConfig { .. })
    ));
}
