//! In-process tests of the HTTP surface against in-memory adapters.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::prelude::*;
use serde_json::{json, Value};
use shared_crypto::{AsymmetricCodec, RsaOaepCodec, RSA_OAEP_512};
use sn_01_dispatch::error::StoreResult;
use sn_01_dispatch::{
    Device, DispatcherConfig, MessageStore, MockGatewayClient, MockMessageStore,
    NotificationDispatcher,
};
use sn_02_subscriptions::{NotificationPayload, SubscriptionBroker};
use sn_03_api_gateway::{
    build_router, ApiConfig, AppState, TrustedHeaderAuthenticator, DEFAULT_SUBSCRIBER_HEADER,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tower::ServiceExt;

const RSA_PKCS8: &str = include_str!("../../shared-crypto/tests/fixtures/rsa_pkcs8.pem");
const TTL: Duration = Duration::from_secs(60);

struct TestApp {
    router: Router,
    store: Arc<MockMessageStore>,
    gateway: Arc<MockGatewayClient>,
    broker: Arc<SubscriptionBroker>,
    codec: Arc<RsaOaepCodec>,
}

fn app(max_subscriptions: usize) -> TestApp {
    let codec = Arc::new(RsaOaepCodec::from_pem(RSA_PKCS8).unwrap());
    let store = Arc::new(MockMessageStore::new());
    let gateway = Arc::new(MockGatewayClient::new());
    let broker = Arc::new(SubscriptionBroker::new(max_subscriptions));

    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&codec),
        Arc::clone(&store),
        Arc::clone(&gateway),
        DispatcherConfig {
            public_host: "https://relay.example:80".into(),
            ..Default::default()
        },
    );

    let state = AppState::new(
        Arc::new(dispatcher),
        store.clone(),
        Arc::clone(&broker),
        codec.public_key_pem().unwrap(),
        ApiConfig {
            notification_ttl: TTL,
            ..Default::default()
        },
    );
    let auth = Arc::new(TrustedHeaderAuthenticator::new(DEFAULT_SUBSCRIBER_HEADER).unwrap());

    TestApp {
        router: build_router(state, auth),
        store,
        gateway,
        broker,
        codec,
    }
}

impl TestApp {
    async fn call(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, subscriber: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = subscriber {
            builder = builder.header(DEFAULT_SUBSCRIBER_HEADER, id);
        }
        self.call(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, body: impl Into<Body>, subscriber: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = subscriber {
            builder = builder.header(DEFAULT_SUBSCRIBER_HEADER, id);
        }
        self.call(builder.body(body.into()).unwrap()).await
    }

    fn descriptor(&self, pushkey: &str, unique_id: Option<&str>) -> Value {
        let device = Device {
            app_id: "local.id".into(),
            pushkey: pushkey.into(),
            unique_id: unique_id.map(str::to_string),
        };
        let ciphertext = self.codec.encrypt(&serde_json::to_vec(&device).unwrap()).unwrap();
        json!({"ciphertext": BASE64_STANDARD.encode(ciphertext), "alg": RSA_OAEP_512})
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_status() {
    let app = app(0);

    let response = app.get("/status", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "up and running"}));
}

#[tokio::test]
async fn test_public_key_pem() {
    let app = app(0);

    let response = app.get("/api/v1/public", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-pem-file");
    assert_eq!(body_text(response).await, app.codec.public_key_pem().unwrap());
}

#[tokio::test]
async fn test_send_rejects_bad_requests() {
    let app = app(0);

    let invalid_json = app.post("/api/v1/", "{not json", None).await;
    assert_eq!(invalid_json.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(invalid_json).await["error"], "bad_request");

    let no_devices = app
        .post(
            "/api/v1/",
            json!({"message": {"id": "1"}, "metadata": {"devices": []}}).to_string(),
            None,
        )
        .await;
    assert_eq!(no_devices.status(), StatusCode::BAD_REQUEST);

    let empty_message = app
        .post(
            "/api/v1/",
            json!({"message": {}, "metadata": {"devices": [app.descriptor("kA", None)]}}).to_string(),
            None,
        )
        .await;
    assert_eq!(empty_message.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_send_returns_per_device_results() {
    let app = app(0);
    let good = app.descriptor("kA", Some("did:1"));
    let bad = json!({"ciphertext": BASE64_STANDARD.encode("mockedInvalidCipherText"), "alg": RSA_OAEP_512});

    let response = app
        .post(
            "/api/v1/",
            json!({"message": {"my_cat": "123321"}, "metadata": {"devices": [good.clone(), bad]}}).to_string(),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let results = body_json(response).await;
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[0]["device"], good);
    assert!(results[0].get("reason").is_none());
    assert_eq!(results[1]["status"], "failed");
    assert_eq!(results[1]["reason"], "service couldn't decrypt the device token");
    assert_eq!(app.gateway.call_count(), 1);
}

#[tokio::test]
async fn test_get_envelope_v1_and_v2() {
    let app = app(0);
    let stored = r#"{"body":{"my_cat":"123321"},"metadata":{"is_read":false,"read_at":null}}"#;
    app.store.set("did:1+a", stored.as_bytes().to_vec(), TTL).await.unwrap();

    let v1 = app.get("/api/v1/did:1+a", None).await;
    assert_eq!(v1.status(), StatusCode::OK);
    assert_eq!(body_json(v1).await, json!({"my_cat": "123321"}));

    let v2 = app.get("/api/v2/notifications/did:1+a", None).await;
    assert_eq!(v2.status(), StatusCode::OK);
    assert_eq!(
        body_json(v2).await,
        json!({"body": {"my_cat": "123321"}, "metadata": {"is_read": false, "read_at": null}})
    );
}

#[tokio::test]
async fn test_get_legacy_value() {
    let app = app(0);
    app.store.set("legacy", br#"{"id":"old"}"#.to_vec(), TTL).await.unwrap();

    let v1 = app.get("/api/v1/legacy", None).await;
    assert_eq!(body_json(v1).await, json!({"id": "old"}));

    let v2 = app.get("/api/v2/notifications/legacy", None).await;
    assert_eq!(
        body_json(v2).await,
        json!({"body": {"id": "old"}, "metadata": {"is_read": false, "read_at": null}})
    );
}

#[tokio::test]
async fn test_get_missing_and_store_failure() {
    let app = app(0);

    let missing = app.get("/api/v1/nope", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error"], "not_found");

    app.store.fail_reads(true);
    let failed = app.get("/api/v2/notifications/nope", None).await;
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_list_requires_identity() {
    let app = app(0);

    let response = app.get("/api/v2/notifications", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "no subscriber id in context");
}

#[tokio::test]
async fn test_list_own_notifications() {
    let app = app(0);
    let envelope = r#"{"body":{"n":1},"metadata":{"is_read":false,"read_at":null}}"#;
    app.store.set("did:1+a", envelope.as_bytes().to_vec(), TTL).await.unwrap();
    app.store.set("did:1+b", br#"{"n":2}"#.to_vec(), TTL).await.unwrap();
    app.store.set("did:10+c", envelope.as_bytes().to_vec(), TTL).await.unwrap();

    let response = app.get("/api/v2/notifications", Some("did:1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(
        listed,
        json!([
            {"id": "did:1+a", "body": {"n": 1}, "metadata": {"is_read": false, "read_at": null}},
            {"id": "did:1+b", "body": {"n": 2}, "metadata": {"is_read": false, "read_at": null}}
        ])
    );

    let nobody = app.get("/api/v2/notifications", Some("did:2")).await;
    assert_eq!(nobody.status(), StatusCode::NOT_FOUND);
}

struct MisalignedStore;

#[async_trait]
impl MessageStore for MisalignedStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> StoreResult<()> {
        Ok(())
    }

    async fn delete(&self, _keys: &[String]) -> StoreResult<()> {
        Ok(())
    }

    async fn get_all_by_prefix(&self, _prefix: &str) -> StoreResult<(Vec<Vec<u8>>, Vec<String>)> {
        Ok((vec![b"{}".to_vec(), b"{}".to_vec()], vec!["did:1+a".into()]))
    }
}

#[tokio::test]
async fn test_list_misaligned_store_is_server_error() {
    let base = app(0);
    let codec = RsaOaepCodec::from_pem(RSA_PKCS8).unwrap();
    let dispatcher = NotificationDispatcher::new(
        Arc::new(codec.clone()),
        Arc::new(MisalignedStore),
        Arc::new(MockGatewayClient::new()),
        DispatcherConfig::default(),
    );
    let state = AppState::new(
        Arc::new(dispatcher),
        Arc::new(MisalignedStore),
        base.broker.clone(),
        codec.public_key_pem().unwrap(),
        ApiConfig::default(),
    );
    let auth = Arc::new(TrustedHeaderAuthenticator::new(DEFAULT_SUBSCRIBER_HEADER).unwrap());
    let router = build_router(state, auth);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v2/notifications")
                .header(DEFAULT_SUBSCRIBER_HEADER, "did:1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "invalid cache state");
}

#[tokio::test]
async fn test_ack_marks_read() {
    let app = app(0);
    app.store.set("did:1+a", br#"{"id":"old"}"#.to_vec(), TTL).await.unwrap();

    let response = app.post("/api/v2/notifications/did:1+a/ack", Body::empty(), Some("did:1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));

    let stored = body_json(app.get("/api/v2/notifications/did:1+a", None).await).await;
    assert_eq!(stored["body"], json!({"id": "old"}));
    assert_eq!(stored["metadata"]["is_read"], true);
    assert!(stored["metadata"]["read_at"].is_string());
}

#[tokio::test]
async fn test_ack_errors() {
    let app = app(0);

    let anonymous = app.post("/api/v2/notifications/x/ack", Body::empty(), None).await;
    assert_eq!(anonymous.status(), StatusCode::BAD_REQUEST);

    let missing = app.post("/api/v2/notifications/did:1+x/ack", Body::empty(), Some("did:1")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    app.store.set("did:1+x", br#"{"id":"1"}"#.to_vec(), TTL).await.unwrap();
    app.store.fail_writes(true);
    let failed = app.post("/api/v2/notifications/did:1+x/ack", Body::empty(), Some("did:1")).await;
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_ack_of_another_subscribers_key_is_not_found() {
    let app = app(0);
    app.store.set("did:2+a", br#"{"id":"1"}"#.to_vec(), TTL).await.unwrap();
    app.store.set("did:10+b", br#"{"id":"2"}"#.to_vec(), TTL).await.unwrap();
    app.store.set("c", br#"{"id":"3"}"#.to_vec(), TTL).await.unwrap();
    let writes_before = app.store.write_count();

    let foreign = app.post("/api/v2/notifications/did:2+a/ack", Body::empty(), Some("did:1")).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    let lookalike = app.post("/api/v2/notifications/did:10+b/ack", Body::empty(), Some("did:1")).await;
    assert_eq!(lookalike.status(), StatusCode::NOT_FOUND);
    let ungrouped = app.post("/api/v2/notifications/c/ack", Body::empty(), Some("did:1")).await;
    assert_eq!(ungrouped.status(), StatusCode::NOT_FOUND);

    assert_eq!(app.store.write_count(), writes_before);
    let stored = body_json(app.get("/api/v2/notifications/did:2+a", None).await).await;
    assert_eq!(stored["metadata"]["is_read"], false);
}

#[tokio::test]
async fn test_subscribe_streams_events() {
    let app = app(0);

    let response = app.get("/api/v2/subscribe", Some("did:1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()[header::CONNECTION], "keep-alive");
    assert_eq!(app.broker.subscription_count("did:1"), 1);

    app.broker.notify("did:1", &NotificationPayload::new("42"));

    let mut frames = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(&frame[..], b"event: new_notifications\ndata: {\"id\":\"42\"}\n\n");

    drop(frames);
    for _ in 0..200 {
        if app.broker.subscription_count("did:1") == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("live stream never released its subscription");
}

#[tokio::test]
async fn test_subscribe_errors() {
    let app = app(1);

    let anonymous = app.get("/api/v2/subscribe", None).await;
    assert_eq!(anonymous.status(), StatusCode::BAD_REQUEST);

    // a limit of 1 admits two open streams
    let first = app.get("/api/v2/subscribe", Some("did:1")).await;
    let second = app.get("/api/v2/subscribe", Some("did:1")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let third = app.get("/api/v2/subscribe", Some("did:1")).await;
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(third).await["error"], "max_subscriptions_reached");
    assert_eq!(app.broker.subscription_count("did:1"), 2);
}
