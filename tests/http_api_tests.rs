// Router-level tests for the token gateway
//
// The vendor boundary is mocked behind the VendorApi trait; requests go
// through the real router and handlers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use parley::error::TransportError;
use parley::{AdmissionGate, AppState, ChatRequest, TokenRequest, Upstream, VendorApi};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Vendor stub: canned replies plus call counters
struct MockVendor {
    session_reply: Option<Upstream>,
    chat_reply: Option<Upstream>,
    session_calls: AtomicUsize,
}

impl MockVendor {
    fn new(session_reply: Option<Upstream>, chat_reply: Option<Upstream>) -> Self {
        Self {
            session_reply,
            chat_reply,
            session_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl VendorApi for MockVendor {
    async fn create_session(&self, _req: &TokenRequest) -> Result<Upstream, TransportError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.session_reply
            .clone()
            .ok_or_else(|| TransportError("connection refused".to_string()))
    }

    async fn chat_completion(&self, _req: &ChatRequest) -> Result<Upstream, TransportError> {
        self.chat_reply
            .clone()
            .ok_or_else(|| TransportError("connection refused".to_string()))
    }
}

fn router(gate: Arc<AdmissionGate>, vendor: Arc<MockVendor>) -> Router {
    parley::create_router(AppState::new(gate, vendor))
}

fn token_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"model": "m", "voice": "v", "instructions": "i"}).to_string(),
        ))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_token_relays_vendor_body_and_increments_gate() {
    let vendor_body = json!({"id": "sess_1", "client_secret": {"value": "abc"}});
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        Some(Upstream {
            status: 200,
            body: vendor_body.clone(),
        }),
        None,
    ));

    let response = router(gate.clone(), vendor.clone())
        .oneshot(token_request())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, vendor_body);
    assert_eq!(gate.active(), 1);
    assert_eq!(vendor.session_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_rejected_when_gate_full_without_vendor_call() {
    let gate = Arc::new(AdmissionGate::new(20));
    for _ in 0..20 {
        gate.register();
    }
    let vendor = Arc::new(MockVendor::new(
        Some(Upstream {
            status: 200,
            body: json!({"client_secret": {"value": "abc"}}),
        }),
        None,
    ));

    let response = router(gate.clone(), vendor.clone())
        .oneshot(token_request())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_json(response).await,
        json!({"error": "API is overloaded, please wait a bit"})
    );
    assert_eq!(
        vendor.session_calls.load(Ordering::SeqCst),
        0,
        "vendor must not be called when the gate is full"
    );
    assert_eq!(gate.active(), 20);
}

#[tokio::test]
async fn test_twenty_first_request_rejected() {
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        Some(Upstream {
            status: 200,
            body: json!({"client_secret": {"value": "abc"}}),
        }),
        None,
    ));
    let app = router(gate.clone(), vendor.clone());

    for _ in 0..20 {
        let response = app.clone().oneshot(token_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(gate.active(), 20);

    let response = app.oneshot(token_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(vendor.session_calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_token_relays_vendor_error_verbatim() {
    let vendor_body = json!({"error": {"message": "invalid api key", "type": "auth"}});
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        Some(Upstream {
            status: 401,
            body: vendor_body.clone(),
        }),
        None,
    ));

    let response = router(gate.clone(), vendor)
        .oneshot(token_request())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, vendor_body);
    assert_eq!(gate.active(), 0, "a rejected session must not hold a slot");
}

#[tokio::test]
async fn test_token_transport_failure_maps_to_500() {
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(None, None));

    let response = router(gate.clone(), vendor)
        .oneshot(token_request())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert_eq!(gate.active(), 0);
}

#[tokio::test]
async fn test_end_decrements_and_floors_at_zero() {
    let gate = Arc::new(AdmissionGate::new(20));
    gate.register();
    gate.register();
    let vendor = Arc::new(MockVendor::new(None, None));
    let app = router(gate.clone(), vendor);

    for expected in [1usize, 0, 0] {
        let response = app.clone().oneshot(post("/end")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
        assert_eq!(gate.active(), expected);
    }
}

#[tokio::test]
async fn test_balanced_token_and_end_calls_return_to_zero() {
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        Some(Upstream {
            status: 200,
            body: json!({"client_secret": {"value": "abc"}}),
        }),
        None,
    ));
    let app = router(gate.clone(), vendor);

    for _ in 0..5 {
        app.clone().oneshot(token_request()).await.unwrap();
    }
    assert_eq!(gate.active(), 5);

    for _ in 0..5 {
        app.clone().oneshot(post("/end")).await.unwrap();
    }
    assert_eq!(gate.active(), 0);
}

#[tokio::test]
async fn test_prompt_returns_trimmed_instruction() {
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        None,
        Some(Upstream {
            status: 200,
            body: json!({
                "choices": [{"message": {"role": "assistant", "content": "  Ask about travel.  "}}]
            }),
        }),
    ));

    let response = router(gate, vendor).oneshot(get("/prompt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"instruction": "Ask about travel."})
    );
}

#[tokio::test]
async fn test_prompt_empty_choices_returns_fallback() {
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        None,
        Some(Upstream {
            status: 200,
            body: json!({"choices": []}),
        }),
    ));

    let response = router(gate, vendor).oneshot(get("/prompt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"instruction": "No instruction generated."})
    );
}

#[tokio::test]
async fn test_prompt_relays_vendor_error() {
    let vendor_body = json!({"error": {"message": "rate limited"}});
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(
        None,
        Some(Upstream {
            status: 429,
            body: vendor_body.clone(),
        }),
    ));

    let response = router(gate, vendor).oneshot(get("/prompt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await, vendor_body);
}

#[tokio::test]
async fn test_health_check() {
    let gate = Arc::new(AdmissionGate::new(20));
    let vendor = Arc::new(MockVendor::new(None, None));

    let response = router(gate, vendor).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
