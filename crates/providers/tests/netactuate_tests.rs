//! NetActuate provider against a mock API

use acmehook_core::{ApiKey, DnsProvider, ProviderError};
use acmehook_providers::NetActuateProvider;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";

fn provider(server: &MockServer) -> NetActuateProvider {
    NetActuateProvider::with_base_url(server.uri(), None).unwrap()
}

async fn mount_zones(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/dns/zones"))
        .and(query_param("type", "NATIVE"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "message": "",
            "code": 200,
            "data": [
                {"name": "other.net", "type": "NATIVE", "id": 11, "ttl": 3600},
                {"name": "Example.com", "type": "NATIVE", "id": 296650, "ttl": 3600}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_zone_lookup_is_case_insensitive() {
    let server = MockServer::start().await;
    mount_zones(&server).await;

    let zone_id = provider(&server)
        .zone_id(&ApiKey::new(API_KEY), "example.com.")
        .await
        .unwrap();
    assert_eq!(zone_id, "296650");
}

#[tokio::test]
async fn test_unknown_zone() {
    let server = MockServer::start().await;
    mount_zones(&server).await;

    let err = provider(&server)
        .list_records(&ApiKey::new(API_KEY), "missing.org")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ZoneNotFound { ref zone } if zone == "missing.org"));
}

#[tokio::test]
async fn test_add_record_posts_absolute_name() {
    let server = MockServer::start().await;
    mount_zones(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/dns/record"))
        .and(query_param("domain_id", "296650"))
        .and(query_param("name", "_acme-challenge.example.com"))
        .and(query_param("type", "TXT"))
        .and(query_param("record_content", "digest"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "code": 200,
            "data": {"id": 9001, "name": "_acme-challenge.example.com", "type": "TXT", "content": "digest", "domain_id": 296650, "ttl": 3600}
        })))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server)
        .add_record(
            &ApiKey::new(API_KEY),
            "example.com",
            "TXT",
            "_acme-challenge",
            "digest",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_record_requires_payload_success() {
    let server = MockServer::start().await;
    mount_zones(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/dns/record"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "failure",
            "message": "Record already exists",
            "code": 409
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .add_record(&ApiKey::new(API_KEY), "example.com", "TXT", "x", "v")
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected { code, detail } => {
            assert_eq!(code, "409");
            assert_eq!(detail, "Record already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_and_delete_records() {
    let server = MockServer::start().await;
    mount_zones(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/dns/records/296650"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "message": "",
            "code": 200,
            "data": [
                {"id": 1, "name": "_acme-challenge.example.com", "type": "TXT", "content": "A", "ttl": 3600},
                {"id": 2, "name": "www.example.com", "type": "A", "content": "192.0.2.1", "ttl": 3600}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/dns/record/1"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "code": "200",
            "data": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let key = ApiKey::new(API_KEY);

    let records = provider.list_records(&key, "example.com").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].value, "A");

    provider
        .delete_record(&key, "example.com", &records[0].id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = provider(&server)
        .delete_record(&ApiKey::new(API_KEY), "example.com", "77")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Transport {
            status: Some(404),
            ..
        }
    ));
}
