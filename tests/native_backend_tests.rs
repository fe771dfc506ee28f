//! Drives `NativeBackend` against this crate's own `cdylib`, which exports
//! `generate_image_ffi` / `generate_variations_ffi` backed by the HTTP client.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use image::{DynamicImage, Rgba, RgbaImage};
use karlo_rs::{
    imaging, GenerationBackend, GenerationClient, NativeBackend, Outcome, SessionConfig,
    StatusCode,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const CREDENTIAL: &str = "689f8a838197c912e9255e8ef26d3234";
const PROMPT: &str = "A computer, in new york, with a dog, rainy, steampunk";

/// The cdylib sits next to the test binary's `deps/` directory, or inside it.
fn cdylib_path() -> PathBuf {
    let file_name = libloading::library_filename("karlo_rs");
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    let candidates = [deps.join(&file_name), deps.parent().unwrap().join(&file_name)];
    candidates
        .iter()
        .find(|path| path.exists())
        .cloned()
        .unwrap_or_else(|| panic!("cdylib not built, looked in {:?}", candidates))
}

fn load_backend() -> NativeBackend {
    let path = cdylib_path();
    let backend = unsafe { NativeBackend::load(&path) }.unwrap();
    assert_eq!(backend.path(), path.as_path());
    backend
}

#[derive(Clone, Default)]
struct SeenT2i {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn t2i(State(seen): State<SeenT2i>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let count = body["prompt"]["batch_size"].as_u64().unwrap_or(0);
    seen.requests.lock().unwrap().push((
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    ));

    let png = imaging::encode_png_base64(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        6,
        6,
        Rgba([90, 90, 200, 255]),
    )))
    .unwrap();
    let images: Vec<Value> = (0..count).map(|_| json!({ "image": png })).collect();
    Json(json!({ "images": images }))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_source_image_returns_failure_status() {
    let backend = load_backend();
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("output_variation");

    let status = backend
        .generate_variations("/nonexistent.png", prefix.to_str().unwrap(), CREDENTIAL, 2)
        .await
        .unwrap();

    assert_eq!(status, StatusCode::FAILURE);
    assert_eq!(status, StatusCode::from(1));
    assert!(!dir.path().join("output_variation_1.png").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_through_native_library() {
    // Only /t2i exists, so the variations call gets a 404 and fails.
    let seen = SeenT2i::default();
    let app = Router::new().route("/t2i", post(t2i)).with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Read by the library's own config loader inside the foreign call.
    std::env::set_var("KARLO_BASE_URL", &base_url);

    let client = GenerationClient::new(Arc::new(load_backend()));
    assert_eq!(client.backend().name(), "native");

    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("imgs/output");
    let session = SessionConfig::new(PROMPT, prefix.to_str().unwrap()).with_batch_size(2);

    let mut out = Vec::new();
    let report = client.run_session(&session, CREDENTIAL, &mut out).await.unwrap();

    assert_eq!(report.image, Outcome::Success);
    assert_eq!(report.variations, Outcome::Failure);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Image generation succeeded.\nVariations generation failed.\n"
    );

    // Arguments crossed the C boundary unchanged and in order.
    let requests = seen.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let expected_auth = format!("KakaoAK {}", CREDENTIAL);
    assert_eq!(requests[0].0.as_deref(), Some(expected_auth.as_str()));
    assert_eq!(
        requests[0].1,
        json!({ "prompt": { "text": PROMPT, "batch_size": 2 } })
    );
    assert!(dir.path().join("imgs/output_1.png").exists());
    assert!(dir.path().join("imgs/output_2.png").exists());
    assert!(!dir.path().join("imgs/output_variation_1.png").exists());
}
