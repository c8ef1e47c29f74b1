// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use food_analyzer::config::Config;
use food_analyzer::db::MemoryStore;
use food_analyzer::routes::create_router;
use food_analyzer::services::{AnalyzerError, ImageInput, VisionAnalyzer};
use food_analyzer::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOUNDARY: &str = "food-analyzer-test-boundary";

/// Vision analyzer that returns a canned reply and records what it was sent.
pub struct FakeAnalyzer {
    reply: Result<Value, String>,
    calls: AtomicUsize,
    last_mime: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl FakeAnalyzer {
    pub fn replying(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply),
            calls: AtomicUsize::new(0),
            last_mime: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_mime: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_mime(&self) -> Option<String> {
        self.last_mime.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionAnalyzer for FakeAnalyzer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn analyze(&self, image: &ImageInput<'_>) -> Result<Value, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_mime.lock().unwrap() = Some(image.mime_type.to_string());
        self.reply.clone().map_err(|body| AnalyzerError::Provider {
            provider: "fake",
            status: 503,
            body,
        })
    }
}

/// The grilled salmon estimate used across tests.
#[allow(dead_code)]
pub fn salmon_reply() -> Value {
    json!({
        "detectedFood": "Grilled salmon with rice",
        "confidence": 0.92,
        "totalCalories": 520,
        "protein": 38,
        "carbs": 45,
        "fats": 18,
        "fiber": 2,
        "ingredients": ["salmon", "white rice", "lemon"],
        "portionSize": "1 plate (350g)"
    })
}

/// A running app plus the handles tests inspect.
pub struct TestApp {
    pub router: axum::Router,
    #[allow(dead_code)]
    pub state: Arc<AppState>,
    pub analyzer: Arc<FakeAnalyzer>,
    pub upload_dir: TempDir,
}

#[allow(dead_code)]
impl TestApp {
    /// Number of files left in the upload directory.
    pub fn leftover_uploads(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }

    /// Send one request through a fresh clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Create a test app backed by an in-memory store and the given analyzer.
#[allow(dead_code)]
pub fn create_test_app(analyzer: Arc<FakeAnalyzer>) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = Config {
        upload_dir: upload_dir.path().to_path_buf(),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        analyzer.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        analyzer,
        upload_dir,
    }
}

/// Build a multipart body with a single file part.
#[allow(dead_code)]
pub fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"meal.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart body to `uri`.
#[allow(dead_code)]
pub fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A small JPEG-looking payload; the fake analyzer never decodes it.
#[allow(dead_code)]
pub fn jpeg_bytes() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(&[0u8; 256]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
