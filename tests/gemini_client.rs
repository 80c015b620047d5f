//! `GeminiClient` against a local stand-in for the `generateContent` endpoint.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use ecoguard::schema::RiskLevel;
use ecoguard::{AnalysisClient, AnalysisMode, AnalysisResult, AppError, Config, GeminiClient, UploadedImage};
use serde_json::{json, Value};

#[derive(Clone)]
struct Mock {
    status: StatusCode,
    body: String,
    delay: Duration,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn generate(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, String) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.seen.lock().unwrap().push((key, payload));
    tokio::time::sleep(mock.delay).await;
    (mock.status, mock.body.clone())
}

async fn spawn(mock: Mock) -> String {
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn mock(status: StatusCode, body: String) -> Mock {
    Mock {
        status,
        body,
        delay: Duration::ZERO,
        seen: Arc::new(Mutex::new(Vec::new())),
    }
}

fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn client(base_url: String, timeout: Duration) -> GeminiClient {
    let config = Config {
        api_key: "test-key".into(),
        model: "gemini-test".into(),
        base_url,
        bind_addr: "127.0.0.1:0".into(),
        request_timeout: timeout,
        session_ttl: Duration::from_secs(60),
        max_sessions: 1,
    };
    GeminiClient::new(&config).unwrap()
}

fn image() -> UploadedImage {
    UploadedImage {
        payload: vec![0x89, 0x50, 0x4e, 0x47],
        preview: "data:image/png;base64,iVBORw==".into(),
        mime_type: "image/png".into(),
        size_bytes: 4,
        width: 1,
        height: 1,
    }
}

#[tokio::test]
async fn disease_reply_is_parsed_and_request_is_well_formed() {
    let reply = r#"{"overallRiskLevel":"High","predictedDiseases":[{"name":"Cholera","cause":"Contaminated stagnant water","preventionTips":["Boil water","Avoid contact with standing water"]}]}"#;
    let mock = mock(StatusCode::OK, envelope(reply));
    let seen = mock.seen.clone();
    let client = client(spawn(mock).await, Duration::from_secs(5));

    let result = client.analyze(AnalysisMode::Disease, &image()).await.unwrap();
    let AnalysisResult::Disease(disease) = result else {
        panic!("expected disease result");
    };
    assert_eq!(disease.overall_risk_level, RiskLevel::High);
    assert_eq!(disease.predicted_diseases[0].prevention_tips.len(), 2);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (key, payload) = &seen[0];
    assert_eq!(key.as_deref(), Some("test-key"));
    let parts = &payload["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "iVBORw==");
    assert_eq!(parts[1]["text"], AnalysisMode::Disease.prompt());
    assert_eq!(payload["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn fenced_waste_reply_is_accepted() {
    let reply = "```json\n{\"wasteType\":\"Glass\",\"recycling\":{\"possible\":true,\"instructions\":\"Rinse\"},\"reuse\":\"Vase\",\"disposal\":\"Glass bin\",\"environmentalImpact\":\"Does not degrade\",\"healthRisks\":[]}\n```";
    let client = client(spawn(mock(StatusCode::OK, envelope(reply))).await, Duration::from_secs(5));

    let result = client.analyze(AnalysisMode::Waste, &image()).await.unwrap();
    assert_eq!(result.mode(), AnalysisMode::Waste);
}

#[tokio::test]
async fn error_status_is_a_request_error() {
    let body = json!({"error": {"code": 403, "message": "API key not valid"}}).to_string();
    let client = client(spawn(mock(StatusCode::FORBIDDEN, body)).await, Duration::from_secs(5));

    let err = client.analyze(AnalysisMode::Waste, &image()).await.unwrap_err();
    assert!(matches!(err, AppError::RequestError(_)), "{:?}", err);
}

#[tokio::test]
async fn non_conforming_reply_is_a_parse_error() {
    let client = client(
        spawn(mock(StatusCode::OK, envelope(r#"{"wasteType":"Plastic"}"#))).await,
        Duration::from_secs(5),
    );

    let err = client.analyze(AnalysisMode::Waste, &image()).await.unwrap_err();
    assert!(matches!(err, AppError::ResponseParseError(_)), "{:?}", err);
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mut slow = mock(StatusCode::OK, envelope("{}"));
    slow.delay = Duration::from_secs(3);
    let client = client(spawn(slow).await, Duration::from_millis(200));

    let err = client.analyze(AnalysisMode::Disease, &image()).await.unwrap_err();
    assert!(matches!(err, AppError::RequestError(_)), "{:?}", err);
}

#[tokio::test]
async fn unreachable_upstream_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(format!("http://{}", addr), Duration::from_secs(2));

    let err = client.analyze(AnalysisMode::Waste, &image()).await.unwrap_err();
    assert!(matches!(err, AppError::RequestError(_)), "{:?}", err);
}

#[tokio::test]
async fn empty_payload_is_refused_locally() {
    let mock = mock(StatusCode::OK, envelope("{}"));
    let seen = mock.seen.clone();
    let client = client(spawn(mock).await, Duration::from_secs(5));

    let mut empty = image();
    empty.payload.clear();
    let err = client.analyze(AnalysisMode::Waste, &empty).await.unwrap_err();
    assert!(matches!(err, AppError::RequestError(_)));
    assert!(seen.lock().unwrap().is_empty());
}
