//! HTTP integration tests for the Mind Mosaic API
//!
//! The model and completion API are replaced with in-process fakes; requests go
//! through the full Axum router via `oneshot`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use mosaic_core::{
    CompletionBackend, CompletionError, CompletionRequest, MosaicConfig, MosaicServices,
    ScoringError, TraitClassifier,
};
use mosaic_core::config::SessionConfig;
use mosaic_server::http::{build_router, run_session_sweeper, HttpState};
use serde_json::{json, Value};
use tower::ServiceExt;

const ANSWERS: [&str; 5] = [
    "I love planning",
    "Chaos is fun",
    "I stay calm",
    "I enjoy parties",
    "I trust people",
];

// ===========================================================================
// Fakes
// ===========================================================================

/// Logits derived from the text, so equal text always scores equally.
struct HashClassifier;

#[async_trait]
impl TraitClassifier for HashClassifier {
    async fn logits(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        let seed = text.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        Ok((0..5).map(|i| ((seed >> (i * 3)) % 7) as f32 * 0.5).collect())
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Scores like `HashClassifier` but fails the call it has been armed for.
struct FlakyClassifier {
    calls: AtomicUsize,
    fail_at: AtomicUsize,
}

impl FlakyClassifier {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_at: AtomicUsize::new(usize::MAX),
        }
    }

    /// Let `skip` more calls succeed, then fail exactly one.
    fn fail_after(&self, skip: usize) {
        let next = self.calls.load(Ordering::SeqCst);
        self.fail_at.store(next + skip, Ordering::SeqCst);
    }
}

#[async_trait]
impl TraitClassifier for FlakyClassifier {
    async fn logits(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == self.fail_at.load(Ordering::SeqCst) {
            return Err(ScoringError::OnnxInference("boom".to_string()));
        }
        HashClassifier.logits(text).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[derive(Default)]
struct ScriptedBackend {
    calls: AtomicUsize,
    prompts: Mutex<Vec<CompletionRequest>>,
    fail: bool,
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(CompletionError::Api {
                code: 503,
                message: "service unavailable".to_string(),
            });
        }
        if request.prompt.contains("post about personal growth") {
            Ok("Plans made, chaos embraced, calm kept. #growth 🚀".to_string())
        } else {
            Ok(format!("Every step counts {n} 🌱✨"))
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn app_with(backend: Arc<ScriptedBackend>) -> Router {
    let services = MosaicServices::new(Arc::new(HashClassifier), backend);
    build_router(Arc::new(HttpState::new(services, MosaicConfig::default())))
}

fn flaky_app(classifier: Arc<FlakyClassifier>, backend: Arc<ScriptedBackend>) -> Router {
    let services = MosaicServices::new(classifier, backend);
    build_router(Arc::new(HttpState::new(services, MosaicConfig::default())))
}

// ===========================================================================
// Request helpers
// ===========================================================================

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn act(app: &Router, id: &str, action: Value) -> (StatusCode, Value) {
    send_json(app, "POST", &format!("/sessions/{id}/actions"), Some(action)).await
}

/// Create a session, start it and answer all five questions.
async fn completed_session(app: &Router) -> String {
    let (status, body) = send_json(app, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["session_id"].as_str().unwrap().to_string();

    let (status, _) = act(app, &id, json!({"action": "start"})).await;
    assert_eq!(status, StatusCode::OK);
    for answer in ANSWERS {
        let (status, _) = act(app, &id, json!({"action": "answer", "response": answer})).await;
        assert_eq!(status, StatusCode::OK);
    }
    id
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_version_endpoint() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (status, body) = send_json(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
    assert_eq!(body["protocol"], "mosaic/1");
}

#[tokio::test]
async fn test_health_endpoint_reports_services() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["classifier"], "hash");
    assert_eq!(body["completion_model"], "scripted");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_new_session_shows_welcome_quote() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (status, body) = send_json(&app, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["view"], "welcome");
    assert!(body["quote"].as_str().unwrap().starts_with("Every step counts"));
    assert_eq!(body["sidebar"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_question_flow_tracks_progress() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (_, body) = send_json(&app, "POST", "/sessions", None).await;
    let id = body["session_id"].as_str().unwrap().to_string();

    let (status, body) = act(&app, &id, json!({"action": "start"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "question");
    assert_eq!(body["index"], 0);
    assert_eq!(body["sidebar"].as_array().unwrap().len(), 4);

    let mut prompts = std::collections::HashSet::new();
    prompts.insert(body["prompt"].as_str().unwrap().to_string());

    for (i, answer) in ANSWERS.iter().enumerate().take(4) {
        let (_, body) = act(&app, &id, json!({"action": "answer", "response": answer})).await;
        assert_eq!(body["view"], "question");
        assert_eq!(body["index"], i + 1);
        prompts.insert(body["prompt"].as_str().unwrap().to_string());
    }
    assert_eq!(prompts.len(), 5, "questions must be distinct");

    let (_, body) = act(&app, &id, json!({"action": "answer", "response": ANSWERS[4]})).await;
    assert_eq!(body["view"], "home");

    let (status, body) = act(&app, &id, json!({"action": "answer", "response": "extra"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_start_twice_conflicts() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (_, body) = send_json(&app, "POST", "/sessions", None).await;
    let id = body["session_id"].as_str().unwrap().to_string();

    act(&app, &id, json!({"action": "start"})).await;
    let (status, _) = act(&app, &id, json!({"action": "start"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_personality_report_end_to_end() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let id = completed_session(&app).await;

    let (status, body) = act(
        &app,
        &id,
        json!({"action": "navigate", "page": "📋 Personality Report"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "personality_report");

    let metrics = body["metrics"].as_array().unwrap();
    let chart = body["chart"].as_array().unwrap();
    assert_eq!(metrics.len(), 5);
    assert_eq!(chart.len(), 5);

    let expected = ["agreeableness", "openness", "conscientiousness", "extraversion", "neuroticism"];
    for ((metric, bar), name) in metrics.iter().zip(chart).zip(expected) {
        assert_eq!(bar["trait"], name);
        assert_eq!(metric["label"], name.to_uppercase());
    }
    let total: f64 = chart.iter().map(|b| b["score"].as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_download_report_end_to_end() {
    let backend = Arc::new(ScriptedBackend::default());
    let app = app_with(backend.clone());
    let id = completed_session(&app).await;

    let (_, body) = act(&app, &id, json!({"action": "navigate", "page": "📥 Download Report"})).await;
    assert_eq!(body["view"], "download_report");
    assert_eq!(body["file_name"], "personacraft_pro_report.pdf");
    let href = body["href"].as_str().unwrap().to_string();

    let req = Request::builder().uri(&href).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("personacraft_pro_report.pdf"));

    let pdf = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let text = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned();
    for label in ["AGREEABLENESS: ", "OPENNESS: ", "CONSCIENTIOUSNESS: ", "EXTRAVERSION: ", "NEUROTICISM: "] {
        assert!(text.contains(label), "missing {label}");
    }
    assert!(text.contains("Personalized Quote:"));
    assert!(text.contains("Every step counts"));
}

#[tokio::test]
async fn test_report_before_completion_conflicts() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (_, body) = send_json(&app, "POST", "/sessions", None).await;
    let id = body["session_id"].as_str().unwrap().to_string();
    act(&app, &id, json!({"action": "start"})).await;

    let (status, _) = send(&app, "GET", &format!("/sessions/{id}/report"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_page_switches_keep_scores_stable() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let id = completed_session(&app).await;

    let (_, first) = act(&app, &id, json!({"action": "navigate", "page": "personality_report"})).await;
    for page in ["💡 Success Tips", "📱 Social Media Post", "📥 Download Report"] {
        let (status, _) = act(&app, &id, json!({"action": "navigate", "page": page})).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, second) = act(&app, &id, json!({"action": "navigate", "page": "personality_report"})).await;

    assert_eq!(first["metrics"], second["metrics"]);
    assert_eq!(first["chart"], second["chart"]);
}

#[tokio::test]
async fn test_generate_post_request_and_cache() {
    let backend = Arc::new(ScriptedBackend::default());
    let app = app_with(backend.clone());
    let id = completed_session(&app).await;

    act(&app, &id, json!({"action": "navigate", "page": "📱 Social Media Post"})).await;
    let (status, body) = act(
        &app,
        &id,
        json!({"action": "generate_post", "platform": "LinkedIn", "tone": "🎯 Serious"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "social_media_post");
    assert!(body["post"].as_str().unwrap().contains("#growth"));

    {
        let prompts = backend.prompts.lock().unwrap();
        let request = prompts.last().unwrap();
        assert!(request.prompt.contains("Create a serious LinkedIn post"));
        assert!(request.prompt.contains("Format: professional networking style"));
        assert!(request.prompt.contains("Max length: 280 characters"));
        assert_eq!(request.temperature, 0.5);
    }

    // The cached post survives a re-render.
    let (_, body) = send_json(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert!(body["post"].as_str().unwrap().contains("#growth"));
}

#[tokio::test]
async fn test_invalid_platform_is_rejected() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let id = completed_session(&app).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/actions"),
        Some(json!({"action": "generate_post", "platform": "MySpace", "tone": "funny"})),
    )
    .await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn test_completion_failure_surfaces_as_bad_gateway() {
    let backend = Arc::new(ScriptedBackend {
        fail: true,
        ..Default::default()
    });
    let app = app_with(backend.clone());

    let (status, body) = send_json(&app, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("service unavailable"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1, "no retries");

    let (_, health) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions"], 0);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let uri = format!("/sessions/{}", uuid::Uuid::new_v4());
    let (status, body) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_end_session() {
    let app = app_with(Arc::new(ScriptedBackend::default()));
    let (_, body) = send_json(&app, "POST", "/sessions", None).await;
    let id = body["session_id"].as_str().unwrap().to_string();

    let (status, body) = send_json(&app, "DELETE", &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ended"], true);

    let (status, _) = send_json(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_final_answer_can_be_retried() {
    let classifier = Arc::new(FlakyClassifier::new());
    let app = flaky_app(classifier.clone(), Arc::new(ScriptedBackend::default()));
    let (_, body) = send_json(&app, "POST", "/sessions", None).await;
    let id = body["session_id"].as_str().unwrap().to_string();

    act(&app, &id, json!({"action": "start"})).await;
    for answer in &ANSWERS[..4] {
        let (status, _) = act(&app, &id, json!({"action": "answer", "response": answer})).await;
        assert_eq!(status, StatusCode::OK);
    }

    classifier.fail_after(0);
    let (status, body) = act(&app, &id, json!({"action": "answer", "response": ANSWERS[4]})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("boom"));

    let (_, body) = send_json(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(body["view"], "question");
    assert_eq!(body["index"], 4);

    let (status, body) = act(&app, &id, json!({"action": "answer", "response": ANSWERS[4]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "home");

    let (status, _) = act(&app, &id, json!({"action": "answer", "response": "extra"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_failed_post_render_does_not_cache_post() {
    let classifier = Arc::new(FlakyClassifier::new());
    let backend = Arc::new(ScriptedBackend::default());
    let app = flaky_app(classifier.clone(), backend.clone());
    let id = completed_session(&app).await;
    act(&app, &id, json!({"action": "navigate", "page": "📱 Social Media Post"})).await;

    // Scoring for the prompt succeeds; scoring for the screen fails.
    classifier.fail_after(1);
    let (status, _) = act(
        &app,
        &id,
        json!({"action": "generate_post", "platform": "Twitter", "tone": "funny"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2, "welcome quote and post");

    let (status, body) = send_json(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "social_media_post");
    assert!(body["post"].is_null());
}

#[tokio::test]
async fn test_failed_navigation_keeps_previous_page() {
    let classifier = Arc::new(FlakyClassifier::new());
    let app = flaky_app(classifier.clone(), Arc::new(ScriptedBackend::default()));
    let id = completed_session(&app).await;
    act(&app, &id, json!({"action": "navigate", "page": "💡 Success Tips"})).await;

    classifier.fail_after(0);
    let (status, _) = act(&app, &id, json!({"action": "navigate", "page": "📥 Download Report"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, body) = send_json(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(body["view"], "success_tips");
    assert_eq!(body["page"], "💡 Success Tips");
}

#[tokio::test]
async fn test_sweeper_expires_idle_sessions() {
    let services = MosaicServices::new(
        Arc::new(HashClassifier),
        Arc::new(ScriptedBackend::default()),
    );
    let state = Arc::new(HttpState::new(services, MosaicConfig::default()));

    let mut stale = state.store.create().await;
    stale.last_active_at = chrono::Utc::now() - chrono::Duration::hours(2);
    state.store.commit(stale.clone()).await.unwrap();
    let fresh = state.store.create().await;

    let (tx, rx) = tokio::sync::broadcast::channel(1);
    let sweeper = tokio::spawn(run_session_sweeper(
        Arc::clone(&state),
        SessionConfig {
            idle_timeout_seconds: 3600,
            sweep_interval_seconds: 1,
        },
        rx,
    ));

    // The first tick fires immediately.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(state.store.len().await, 1);
    assert!(state.store.get(fresh.id).await.is_ok());
    assert!(state.store.get(stale.id).await.is_err());

    tx.send(()).unwrap();
    sweeper.await.unwrap();
}
