mod common;

use common::{gateway, gateway_with_delay};
use std::time::Duration;

use mailsort::error::AppError;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/gmail/v1/users/me/messages";

fn message_body(id: &str, sender: &str, subject: &str) -> serde_json::Value {
    json!({
        "id": id,
        "payload": {
            "headers": [
                { "name": "From", "value": sender },
                { "name": "Subject", "value": subject },
            ],
        },
    })
}

#[tokio::test]
async fn attaches_bearer_token_and_parses_item_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": "m1" }, { "id": "m2" }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, probe) = gateway(&server.uri(), &["t1"]);
    let ids = gateway.list_items(10, None).await.expect("list");

    assert_eq!(ids, ["m1", "m2"]);
    assert_eq!(probe.grant_count(), 1);
}

#[tokio::test]
async fn refreshes_once_and_retries_on_401() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": "m1" }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, probe) = gateway(&server.uri(), &["t1", "t2"]);
    let ids = gateway.list_items(10, None).await.expect("list");

    assert_eq!(ids, ["m1"]);
    assert_eq!(probe.grant_count(), 2);
    assert_eq!(probe.invalidated(), ["t1"]);
}

#[tokio::test]
async fn second_401_after_refresh_is_auth_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let (gateway, probe) = gateway(&server.uri(), &["t1", "t2"]);
    let result = gateway.list_items(10, None).await;

    assert!(matches!(result, Err(AppError::AuthExhausted)));
    // Exactly one original attempt plus one retry reached the wire.
    assert_eq!(server.received_requests().await.expect("requests").len(), 2);
    assert_eq!(probe.grant_count(), 2);
}

#[tokio::test]
async fn non_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "backend exploded", "status": "INTERNAL" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, probe) = gateway(&server.uri(), &["t1"]);
    let result = gateway.list_items(10, None).await;

    match result {
        Err(AppError::RemoteApi { status, detail }) => {
            assert_eq!(status, 500);
            assert!(detail.contains("backend exploded"));
        }
        other => panic!("expected RemoteApi, got {other:?}"),
    }
    assert_eq!(probe.grant_count(), 1);
}

#[tokio::test]
async fn transport_failure_is_not_retried() {
    // Nothing listens on port 1.
    let (gateway, probe) = gateway("http://127.0.0.1:1", &["t1"]);
    let result = gateway.list_items(10, None).await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    assert_eq!(probe.grant_count(), 1);
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/m1"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/m1"))
        .and(header("authorization", "Bearer t2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(message_body("m1", "x@y.com", "hello")),
        )
        .expect(2)
        .mount(&server)
        .await;

    // Delay each grant so both callers hit the refresh gate while the
    // first refresh is still in flight.
    let (gateway, probe) =
        gateway_with_delay(&server.uri(), &["t1", "t2"], Duration::from_millis(25));

    // Seed the credential before racing, then race two requests.
    gateway.auth().authenticate(true).await.expect("seed");

    let first = tokio::spawn({
        let gateway = gateway.clone();
        async move { gateway.get_metadata("m1").await }
    });
    let second = tokio::spawn({
        let gateway = gateway.clone();
        async move { gateway.get_metadata("m1").await }
    });

    let a = first.await.expect("join").expect("first request");
    let b = second.await.expect("join").expect("second request");

    assert_eq!(a.sender, "x@y.com");
    assert_eq!(b.sender, "x@y.com");
    // One seed grant plus exactly one refresh grant.
    assert_eq!(probe.grant_count(), 2);
    assert_eq!(probe.invalidated(), ["t1"]);
}

#[tokio::test]
async fn metadata_is_normalized_from_wire_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/m7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m7",
            "payload": {
                "headers": [
                    { "name": "FROM", "value": "  alice@example.com  " },
                ],
                "parts": [
                    { "filename": "cat.png", "mimeType": "image/png" },
                ],
            },
        })))
        .mount(&server)
        .await;

    let (gateway, _probe) = gateway(&server.uri(), &["t1"]);
    let metadata = gateway.get_metadata("m7").await.expect("metadata");

    assert_eq!(metadata.sender, "alice@example.com");
    assert_eq!(metadata.subject, "");
    assert!(metadata.has_non_downloadable_parts);
}

#[tokio::test]
async fn ensure_label_prefers_existing_and_creates_when_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": [
                { "id": "L1", "name": "Finance", "type": "user" },
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "L2", "name": "Travel", "type": "user",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, _probe) = gateway(&server.uri(), &["t1"]);

    let existing = gateway.ensure_label("finance").await.expect("existing");
    assert_eq!(existing.id, "L1");

    let created = gateway.ensure_label("Travel").await.expect("created");
    assert_eq!(created.id, "L2");
}
