use std::sync::Arc;

use anyhow::Context;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use protocol::config::{normalize, AnalysisConfig};
use protocol::validate::missing_fields;
use protocol::{AnalysisRequest, ANALYZE_PATH, CONFIG_PATH};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::backend::ReportBackend;
use crate::error::ProxyError;

const SERVICE_NAME: &str = "LocalRankLens API";

#[derive(Clone)]
pub(crate) struct AppState {
    backend: Arc<dyn ReportBackend>,
}

impl AppState {
    pub(crate) fn new(backend: Arc<dyn ReportBackend>) -> Self {
        Self { backend }
    }
}

pub(crate) fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(health))
        .route(ANALYZE_PATH, post(analyze))
        .route(CONFIG_PATH, post(generate_config))
        .with_state(state)
        .layer(middleware::from_fn(log_http_request));
    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn log_http_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        "http request"
    );
    response
}

/// Parses the body and rejects it before any backend work if a required
/// field is missing or falsy.
fn validated_payload(body: &[u8]) -> Result<Value, ProxyError> {
    let payload: Value = serde_json::from_slice(body).context("failed to parse request body")?;
    let missing = missing_fields(&payload);
    if !missing.is_empty() {
        return Err(ProxyError::Validation(missing));
    }
    Ok(payload)
}

async fn analyze(State(state): State<AppState>, body: Bytes) -> Result<Response, ProxyError> {
    let payload = validated_payload(&body)?;
    tracing::info!(
        backend = state.backend.name(),
        business_name = payload["business_name"].as_str().unwrap_or("-"),
        "starting analysis"
    );
    let artifact = state.backend.generate(body).await?;
    tracing::info!(
        backend = state.backend.name(),
        bytes = artifact.body.len(),
        filename = %artifact.filename,
        "analysis complete"
    );
    Ok(artifact.into_response())
}

async fn generate_config(body: Bytes) -> Result<Json<AnalysisConfig>, ProxyError> {
    let payload = validated_payload(&body)?;
    let request: AnalysisRequest =
        serde_json::from_value(payload).context("failed to decode analysis request")?;
    let config = normalize(&request).ok_or(ProxyError::NoKeywords)?;
    Ok(Json(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReportArtifact;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use protocol::ReportKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::ServiceExt;

    enum Reply {
        Report(&'static [u8], ReportKind),
        BackendError(u16, &'static str),
        Transport,
    }

    struct FakeBackend {
        reply: Reply,
        calls: AtomicUsize,
        last_payload: Mutex<Option<Bytes>>,
    }

    impl FakeBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_payload: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ReportBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn generate(&self, payload: Bytes) -> Result<ReportArtifact, ProxyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_payload.lock().unwrap() = Some(payload);
            match self.reply {
                Reply::Report(body, kind) => Ok(ReportArtifact::new(body, kind)),
                Reply::BackendError(status, body) => Err(ProxyError::Backend {
                    status,
                    body: body.to_string(),
                }),
                Reply::Transport => Err(anyhow::anyhow!("connection reset").into()),
            }
        }
    }

    fn app(backend: Arc<FakeBackend>) -> Router {
        router(AppState::new(backend), false)
    }

    fn post_json(path: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_payload() -> Value {
        json!({
            "business_name": "Revive Irrigation",
            "location": {"city": "Spokane", "state": "WA"},
            "keywords": {"core": ["sprinkler repair Spokane", "irrigation Spokane"]},
            "output_prefix": "revive-irrigation",
        })
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_without_backend_call() {
        let cases = [
            json!({"location": {"city": "Spokane", "state": "WA"}, "keywords": {"core": ["a"]}}),
            json!({"business_name": "X", "location": {"state": "WA"}, "keywords": {"core": ["a"]}}),
            json!({"business_name": "X", "location": {"city": "Spokane", "state": ""}, "keywords": "a"}),
            json!({"business_name": "X", "location": {"city": "Spokane", "state": "WA"}}),
            json!({"business_name": "X", "location": {"city": "Spokane", "state": "WA"}, "keywords": ""}),
        ];
        let backend = FakeBackend::new(Reply::Report(b"<html></html>", ReportKind::Html));
        for payload in cases {
            let response = app(Arc::clone(&backend))
                .oneshot(post_json(ANALYZE_PATH, payload.to_string()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            let message = body["error"].as_str().unwrap();
            assert!(message.starts_with("Missing required fields: "), "{message}");
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_payload_passes_report_through() {
        let report: &'static [u8] = b"<html><body>Competitors: 3</body></html>";
        let backend = FakeBackend::new(Reply::Report(report, ReportKind::Html));
        let raw = valid_payload().to_string();
        let response = app(Arc::clone(&backend))
            .oneshot(post_json(ANALYZE_PATH, raw.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/html");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"localranklens-report.html\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), report.len());
        assert_eq!(&body[..], report);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let forwarded = backend.last_payload.lock().unwrap().clone().unwrap();
        assert_eq!(&forwarded[..], raw.as_bytes());
    }

    #[tokio::test]
    async fn flat_keyword_string_is_accepted() {
        let backend = FakeBackend::new(Reply::Report(b"%PDF-1.4", ReportKind::Pdf));
        let payload = json!({
            "business_name": "Revive Irrigation",
            "location": {"city": "Spokane", "state": "WA"},
            "keywords": "sprinkler repair\nlawn aeration",
        });
        let response = app(Arc::clone(&backend))
            .oneshot(post_json(ANALYZE_PATH, payload.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/pdf");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backend_error_status_is_propagated() {
        let backend = FakeBackend::new(Reply::BackendError(502, "serpapi down"));
        let response = app(backend)
            .oneshot(post_json(ANALYZE_PATH, valid_payload().to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Backend analysis failed: serpapi down");
    }

    #[tokio::test]
    async fn transport_errors_become_generic_500() {
        let backend = FakeBackend::new(Reply::Transport);
        let response = app(backend)
            .oneshot(post_json(ANALYZE_PATH, valid_payload().to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn malformed_json_is_generic_500() {
        let backend = FakeBackend::new(Reply::Report(b"", ReportKind::Html));
        let response = app(Arc::clone(&backend))
            .oneshot(post_json(ANALYZE_PATH, "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn health_reports_service() {
        let backend = FakeBackend::new(Reply::Transport);
        let response = app(backend)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn config_endpoint_normalizes_without_backend() {
        let backend = FakeBackend::new(Reply::Transport);
        let payload = json!({
            "business_name": "Bob's Plumbing & Heating",
            "location": {"city": "Spokane", "state": "WA"},
            "keywords": "drain cleaning\nwater heater repair\nsewer line",
        });
        let response = app(Arc::clone(&backend))
            .oneshot(post_json(CONFIG_PATH, payload.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["output_prefix"], "bob's-plumbing-and-heating");
        assert_eq!(body["keywords"]["core"], json!(["drain cleaning"]));
        assert_eq!(body["keywords"]["upsell"], json!(["water heater repair"]));
        assert_eq!(body["keywords"]["emergency"], json!(["sewer line"]));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn config_endpoint_rejects_blank_keywords() {
        let backend = FakeBackend::new(Reply::Transport);
        let payload = json!({
            "business_name": "Acme",
            "location": {"city": "Spokane", "state": "WA"},
            "keywords": " \n ",
        });
        let response = app(backend)
            .oneshot(post_json(CONFIG_PATH, payload.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "No valid keywords provided");
    }

    #[tokio::test]
    async fn cors_layer_answers_preflight() {
        let backend = FakeBackend::new(Reply::Transport);
        let response = router(AppState::new(backend), true)
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri(ANALYZE_PATH)
                    .header("origin", "https://localranklens.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
