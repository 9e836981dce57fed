//! Webhook server
//!
//! The minimal provider-facing server the inbound probes exercise:
//! - GET /health - liveness, always 200
//! - POST /webhook/sms - form-encoded SMS webhook, normalized and acknowledged
//! - GET /media-stream/:call_id - WebSocket media stream, order-checked
//! - GET /metrics - Prometheus text exposition

mod media;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use ringside_config::ConnectionConfig;
use tower_http::trace::TraceLayer;

use crate::contracts::*;
use crate::normalize::normalize_sms;
use crate::telemetry::WebhookMetrics;

/// Application state
///
/// Holds the data store connection resolved at startup; handlers only ever
/// borrow it.
#[derive(Debug)]
pub struct AppState {
    pub connection: Arc<ConnectionConfig>,
    pub metrics: WebhookMetrics,
}

impl AppState {
    pub fn new(connection: ConnectionConfig) -> Result<Self, prometheus::Error> {
        let metrics = WebhookMetrics::new()?;
        metrics.record_data_store(&connection.endpoint);
        Ok(Self {
            connection: Arc::new(connection),
            metrics,
        })
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook/sms", post(sms_webhook))
        .route("/media-stream/:call_id", get(media::media_stream))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    state.metrics.record_request("health", "ok");
    Json(HealthResponse::healthy())
}

/// SMS webhook endpoint
///
/// A form that cannot be read is answered with 500 and an error payload.
async fn sms_webhook(
    State(state): State<Arc<AppState>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> (StatusCode, Json<SmsWebhookResponse>) {
    match form {
        Ok(Form(fields)) => {
            let message = normalize_sms(&fields);
            tracing::info!(
                from = message.from.as_deref().unwrap_or("-"),
                to = message.to.as_deref().unwrap_or("-"),
                body_len = message.body.len(),
                "SMS webhook received"
            );
            state.metrics.record_request("sms", "ok");
            (StatusCode::OK, Json(SmsWebhookResponse::received(message)))
        }
        Err(rejection) => {
            tracing::error!(error = %rejection.body_text(), "Failed to process SMS webhook");
            state.metrics.record_request("sms", "error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SmsWebhookResponse::failed(rejection.body_text())),
            )
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn local_connection() -> ConnectionConfig {
        ConnectionConfig {
            endpoint: "http://127.0.0.1:54321".to_string(),
            credential: "local-anon-key".to_string(),
        }
    }

    fn router() -> Router {
        create_router(Arc::new(AppState::new(local_connection()).unwrap()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_sms_without_form_content_type_is_500() {
        let response = router()
            .oneshot(
                Request::post("/webhook/sms")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"from\":\"+1\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_metrics_expose_data_store_endpoint() {
        let state = Arc::new(AppState::new(local_connection()).unwrap());
        assert_eq!(state.connection.endpoint, "http://127.0.0.1:54321");

        let response = create_router(state)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.contains("ringside_data_store_info{endpoint=\"http://127.0.0.1:54321\"} 1"));
        assert!(!text.contains("local-anon-key"));
    }
}
