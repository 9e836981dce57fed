//! Integration tests for the probes and the webhook server
//!
//! The catalog API is mocked with wiremock. Inbound probes run against the
//! real router, either through `oneshot` or a live server on an ephemeral
//! port.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use proptest::prelude::*;
use ringside_config::ConnectionConfig;
use ringside_probe::client::{CatalogClient, MediaStreamClient, WebhookClient, DEFAULT_API_VERSION};
use ringside_probe::contracts::*;
use ringside_probe::engine::{CatalogProbe, Probe, SmsProbe, StreamProbe};
use ringside_probe::handler::{create_router, AppState};
use ringside_probe::normalize::normalize_sms;
use ringside_probe::plan::{ProbePlan, ProbeSpec};
use ringside_probe::ProbeError;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::{self, protocol::frame::coding::CloseCode};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Catalog API
// ---------------------------------------------------------------------------

fn catalog_client(server: &MockServer) -> CatalogClient {
    CatalogClient::new(server.uri(), "sandbox-token").with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_catalog_item_references_server_assigned_category() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/object"))
        .and(header_eq("authorization", "Bearer sandbox-token"))
        .and(header_eq("square-version", DEFAULT_API_VERSION))
        .and(body_partial_json(json!({
            "object": { "type": "CATEGORY", "category_data": { "name": "Plumbing" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "catalog_object": { "type": "CATEGORY", "id": "CAT123", "version": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/object"))
        .and(body_partial_json(json!({
            "object": {
                "type": "ITEM",
                "item_data": { "name": "Drain cleaning", "category_id": "CAT123" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "catalog_object": { "type": "ITEM", "id": "ITEM456" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = CatalogProbe::new(catalog_client(&server), "Plumbing", "Drain cleaning", "Clears drains")
        .run()
        .await;

    assert!(report.passed(), "report: {:?}", report);
    assert_eq!(
        report.step("create_category").unwrap().detail.as_deref(),
        Some("id=CAT123")
    );
    assert_eq!(
        report.step("create_item").unwrap().detail.as_deref(),
        Some("id=ITEM456 category_id=CAT123")
    );

    // Every request carried its own idempotency key
    let requests = server.received_requests().await.unwrap();
    let keys: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["idempotency_key"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(keys.len(), 2);
    assert_ne!(keys[0], keys[1]);
}

#[tokio::test]
async fn test_catalog_category_failure_sends_no_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/catalog/object"))
        .and(body_partial_json(json!({ "object": { "type": "CATEGORY" } })))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"errors\":[{\"code\":\"UNAUTHORIZED\"}]}"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "object": { "type": "ITEM" } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = CatalogProbe::new(catalog_client(&server), "Plumbing", "Drain cleaning", "")
        .run()
        .await;

    assert!(!report.passed());
    assert_eq!(report.error_kind.as_deref(), Some("api"));
    assert!(report.error.as_deref().unwrap().contains("UNAUTHORIZED"));
    assert_eq!(report.step("create_item").unwrap().status, StepStatus::Skipped);
}

#[tokio::test]
async fn test_catalog_unauthorized_is_api_error_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = catalog_client(&server)
        .create_category("Plumbing")
        .await
        .unwrap_err();

    match err {
        ProbeError::Api { status, body } => {
            assert_eq!(status, Some(401));
            assert_eq!(body, "unauthorized");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_catalog_malformed_body_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = catalog_client(&server)
        .create_category("Plumbing")
        .await
        .unwrap_err();

    assert!(matches!(err, ProbeError::Api { status: None, .. }));
}

#[tokio::test]
async fn test_catalog_temp_id_echo_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "catalog_object": { "id": "#category-unresolved" }
        })))
        .mount(&server)
        .await;

    let err = catalog_client(&server)
        .create_category("Plumbing")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "api");
}

#[tokio::test]
async fn test_catalog_timeout_is_terminal_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "object": { "type": "CATEGORY" } })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "catalog_object": { "id": "CAT123" } }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "object": { "type": "ITEM" } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = CatalogClient::new(server.uri(), "sandbox-token")
        .with_timeout(Duration::from_millis(200));

    let err = client.create_category("Plumbing").await.unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert!(err.to_string().contains("timed out"));

    let report = CatalogProbe::new(client, "Plumbing", "Drain cleaning", "")
        .run()
        .await;
    assert!(!report.passed());
    assert_eq!(report.error_kind.as_deref(), Some("transport"));
    assert_eq!(report.step("create_category").unwrap().status, StepStatus::Failed);
    assert_eq!(report.step("create_item").unwrap().status, StepStatus::Skipped);
}

#[tokio::test]
async fn test_catalog_unreachable_is_transport_error() {
    let client = CatalogClient::new("http://127.0.0.1:9", "token")
        .with_timeout(Duration::from_millis(500));

    let err = client.create_category("Plumbing").await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[test]
fn test_item_with_unresolved_category_id_is_rejected() {
    let err = ItemDraft::with_category_id("Drain cleaning", "", "#category-1234").unwrap_err();
    assert!(err.is_user_error());

    let err = ItemDraft::with_category_id("Drain cleaning", "", "").unwrap_err();
    assert!(err.is_user_error());

    assert!(ItemDraft::with_category_id("Drain cleaning", "", "CAT123").is_ok());
}

// ---------------------------------------------------------------------------
// Webhook handlers
// ---------------------------------------------------------------------------

fn local_connection() -> ConnectionConfig {
    ConnectionConfig {
        endpoint: "http://127.0.0.1:54321".to_string(),
        credential: "local-anon-key".to_string(),
    }
}

fn router() -> axum::Router {
    create_router(Arc::new(AppState::new(local_connection()).unwrap()))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_sms_webhook_relay_fields() {
    let response = router()
        .oneshot(
            Request::post("/webhook/sms")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("from=%2B19404656984&message=pipe+burst"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "SMS received");
    assert_eq!(json["from"], "+19404656984");
    assert_eq!(json["body"], "pipe burst");
    assert!(json["to"].is_null());
}

#[tokio::test]
async fn test_sms_webhook_missing_body_defaults_to_empty() {
    let response = router()
        .oneshot(
            Request::post("/webhook/sms")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("From=%2B18175550100&To=%2B19404656984"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["from"], "+18175550100");
    assert_eq!(json["to"], "+19404656984");
    assert_eq!(json["body"], "");
}

#[tokio::test]
async fn test_health_shape_is_fixed() {
    let app = router();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json,
            serde_json::to_value(HealthResponse::healthy()).unwrap()
        );
    }
}

#[tokio::test]
async fn test_metrics_count_sms_requests() {
    let state = Arc::new(AppState::new(local_connection()).unwrap());
    let app = create_router(state.clone());

    app.clone()
        .oneshot(
            Request::post("/webhook/sms")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("From=%2B1&Body=hi"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(state.metrics.request_count("sms", "ok"), 1);

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ringside_webhook_requests_total{endpoint=\"sms\",result=\"ok\"} 1"));
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

fn optional_value() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-z0-9+ ]{1,12}".prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn prop_first_present_alias_wins(
        from_primary in optional_value(),
        from_fallback in optional_value(),
        body_primary in optional_value(),
        body_fallback in optional_value(),
    ) {
        let mut fields = HashMap::new();
        for (name, value) in [
            ("From", &from_primary),
            ("from", &from_fallback),
            ("Body", &body_primary),
            ("message", &body_fallback),
        ] {
            if let Some(v) = value {
                fields.insert(name.to_string(), v.clone());
            }
        }

        let message = normalize_sms(&fields);

        let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let expected_from = present(&from_primary).or_else(|| present(&from_fallback));
        let expected_body = present(&body_primary)
            .or_else(|| present(&body_fallback))
            .unwrap_or_default();

        prop_assert_eq!(message.from, expected_from);
        prop_assert_eq!(message.body, expected_body);
    }
}

// ---------------------------------------------------------------------------
// Live server
// ---------------------------------------------------------------------------

async fn spawn_server() -> (SocketAddr, Arc<AppState>) {
    let state = Arc::new(AppState::new(local_connection()).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, state)
}

async fn wait_for_stream_outcome(state: &AppState, outcome: &str) -> u64 {
    for _ in 0..100 {
        let count = state.metrics.stream_count(outcome);
        if count > 0 {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    state.metrics.stream_count(outcome)
}

#[tokio::test]
async fn test_stream_probe_event_order() {
    for frames in [0u32, 1, 5] {
        let (addr, state) = spawn_server().await;
        let client = MediaStreamClient::new(format!("http://{}", addr))
            .with_timeout(Duration::from_secs(5));

        let report = StreamProbe::new(client, format!("CA-order-{}", frames))
            .with_frames(frames)
            .with_pacing(Duration::from_millis(1))
            .run()
            .await;

        assert!(report.passed(), "report: {:?}", report);

        let mut expected = vec!["start"];
        expected.extend(std::iter::repeat("media").take(frames as usize));
        expected.push("stop");
        assert_eq!(
            report.step("close").unwrap().detail.as_deref(),
            Some(expected.join(",").as_str())
        );

        assert_eq!(wait_for_stream_outcome(&state, "completed").await, 1);
        assert_eq!(state.metrics.stream_event_count("start"), 1);
        assert_eq!(state.metrics.stream_event_count("media"), frames as u64);
        assert_eq!(state.metrics.stream_event_count("stop"), 1);
    }
}

#[tokio::test]
async fn test_media_before_start_is_rejected() {
    let (addr, state) = spawn_server().await;
    let url = format!("ws://{}/media-stream/CA-early", addr);
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

    let media = StreamEvent::Media {
        stream_sid: "MZ-early".to_string(),
        media: MediaPayload::inbound(1, 20, &silence(DEFAULT_CHUNK_BYTES)),
    };
    socket
        .send(tungstenite::Message::Text(media.to_frame().unwrap()))
        .await
        .unwrap();

    let mut close_code = None;
    while let Some(message) = socket.next().await {
        match message {
            Ok(tungstenite::Message::Close(frame)) => {
                close_code = frame.map(|f| f.code);
                break;
            }
            Ok(_) => continue,
            Err(_) => break,
        }
    }

    assert_eq!(close_code, Some(CloseCode::Policy));
    assert_eq!(wait_for_stream_outcome(&state, "rejected").await, 1);
    assert_eq!(state.metrics.stream_event_count("media"), 0);
}

#[tokio::test]
async fn test_sms_probe_round_trip() {
    let (addr, state) = spawn_server().await;

    for dialect in [SmsDialect::Twilio, SmsDialect::Relay] {
        let client = WebhookClient::new(format!("http://{}", addr));
        let message = SmsMessage::new("+19404656984", "+18175550100", "pipe burst");

        let report = SmsProbe::new(client, message, dialect).run().await;
        assert!(report.passed(), "{:?}: {:?}", dialect, report);
        assert_eq!(report.steps.len(), 3);
    }

    assert_eq!(state.metrics.request_count("sms", "ok"), 2);
    assert_eq!(state.metrics.request_count("health", "ok"), 2);
}

#[tokio::test]
async fn test_sms_probe_against_missing_server_fails_at_health() {
    let client = WebhookClient::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500));
    let message = SmsMessage::new("+19404656984", "+18175550100", "pipe burst");

    let report = SmsProbe::new(client, message, SmsDialect::Twilio).run().await;

    assert!(!report.passed());
    assert_eq!(report.error_kind.as_deref(), Some("transport"));
    assert_eq!(report.step("post_sms").unwrap().status, StepStatus::Skipped);
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_plan_file_runs_against_live_server() {
    let (addr, _state) = spawn_server().await;

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    let plan = json!({
        "fail_fast": false,
        "timeout_ms": 5000,
        "probes": [
            { "kind": "health", "base_url": format!("http://{}", addr) },
            {
                "kind": "sms",
                "base_url": format!("http://{}", addr),
                "from": "+19404656984",
                "body": "pipe burst",
                "dialect": "relay"
            },
            {
                "kind": "stream",
                "base_url": format!("http://{}", addr),
                "call_sid": "CA-plan",
                "frames": 2,
                "pacing_ms": 1
            }
        ]
    });
    write!(file, "{}", plan).unwrap();

    let plan = ProbePlan::from_file(file.path()).unwrap();
    assert!(matches!(plan.probes[1], ProbeSpec::Sms { dialect: SmsDialect::Relay, .. }));

    let summary = plan.build_engine().unwrap().run().await;
    assert!(summary.all_passed(), "summary: {:?}", summary);
    assert_eq!(summary.passed, 3);
}

#[test]
fn test_empty_plan_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "probes: []").unwrap();

    let err = ProbePlan::from_file(file.path()).unwrap_err();
    assert!(err.is_user_error());
}
