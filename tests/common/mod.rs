#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose};
use tokio::sync::Mutex;
use tower::ServiceExt;

use coloring_book_backend::{AppConfig, AppState, build_app};

pub const TEST_API_KEY: &str = "sk-test-key";

/// 伪造的外部生成服务。
///
/// 按上传内容决定行为：
/// - `fail...`   生成接口返回 500
/// - `nourl...`  生成接口返回 200 但无 url
/// - `gone...`   返回的 url 下载时 404
/// - `slow...`   生成前等待 200ms
/// - `hang...`   生成前等待 10s（用于触发客户端超时）
/// - 其它        成功，结果内容为 `generated:{原始内容}`
#[derive(Default)]
pub struct FakeUpstream {
    pub generate_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    pub images: Mutex<Vec<String>>,
    results: Mutex<Vec<Vec<u8>>>,
    addr: std::sync::OnceLock<SocketAddr>,
}

impl FakeUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr.get().expect("fake upstream started"))
    }

    pub fn total_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst) + self.download_calls.load(Ordering::SeqCst)
    }
}

async fn fake_generate(
    State(fake): State<Arc<FakeUpstream>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    fake.generate_calls.fetch_add(1, Ordering::SeqCst);

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TEST_API_KEY}"))
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }

    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    let image = body["image"].as_str().unwrap_or_default().to_string();
    fake.prompts.lock().await.push(prompt);
    fake.images.lock().await.push(image.clone());

    let encoded = image.split_once(";base64,").map(|(_, b)| b).unwrap_or_default();
    let original = general_purpose::STANDARD
        .decode(encoded)
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default();

    if original.starts_with("slow") {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    if original.starts_with("hang") {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }
    if original.starts_with("fail") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": {"message": "boom"}})),
        )
            .into_response();
    }
    if original.starts_with("nourl") {
        return Json(serde_json::json!({"data": [{}]})).into_response();
    }

    let url = if original.starts_with("gone") {
        format!("{}/files/missing", fake.base_url())
    } else {
        let mut results = fake.results.lock().await;
        results.push(format!("generated:{original}").into_bytes());
        format!("{}/files/{}", fake.base_url(), results.len() - 1)
    };
    Json(serde_json::json!({"created": 0, "data": [{"url": url}]})).into_response()
}

async fn fake_download(
    State(fake): State<Arc<FakeUpstream>>,
    Path(id): Path<String>,
) -> Response {
    fake.download_calls.fetch_add(1, Ordering::SeqCst);
    let results = fake.results.lock().await;
    match id.parse::<usize>().ok().and_then(|i| results.get(i)) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn start_fake_upstream() -> Arc<FakeUpstream> {
    let fake = Arc::new(FakeUpstream::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    fake.addr
        .set(listener.local_addr().expect("local addr"))
        .expect("set addr once");

    let router = Router::new()
        .route("/v1/images/generations", post(fake_generate))
        .route("/files/:id", get(fake_download))
        .with_state(fake.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    fake
}

pub fn test_config(fake: &FakeUpstream, api_key: Option<&str>) -> AppConfig {
    let mut config = AppConfig::default();
    config.openai.base_url = fake.base_url();
    config.openai.api_key = api_key.map(str::to_string);
    config.openai.generate_timeout_secs = 5;
    config.openai.fetch_timeout_secs = 5;
    config
}

pub fn make_app(config: &AppConfig) -> Router {
    let state = AppState::from_config(config).expect("build state");
    build_app(state, config)
}

/// 手工拼装 multipart/form-data 请求体
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "----coloring-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/process-images")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .expect("build multipart request")
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("call app");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, headers, bytes.to_vec())
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("parse json body")
}

/// 解出 zip 中的 (条目名, 内容)，保持写入顺序
pub fn unzip(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open zip");
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).expect("zip entry");
            let mut content = String::new();
            entry.read_to_string(&mut content).expect("read entry");
            (entry.name().to_string(), content)
        })
        .collect()
}
