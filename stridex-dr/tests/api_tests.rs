//! Integration tests for stridex-dr API endpoints
//!
//! Each test builds the router over a temporary data folder.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use stridex_common::DiscoveryLimits;
use stridex_dr::{build_router, AppState};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const PAD_S1: &str = r#"{"meta":{"patient":{"id":"S1"},"age":64},"labels":{"annotation":{"class":1,"side":"left"},"diagnosis_text":"early OA"},"data":{"gait_pad":{"values":{"velocity":133.4,"step_length":{"L":61.2,"R":60.5},"stance_phase_rate":{"L":60,"R":62},"swing_phase_rate":{"L":40,"R":38}}}}}"#;
const INSOLE_S1: &str = r#"{"meta":{"id":"S1"},"data":{"smart_insole":{"values":{"day_2":{"balance":{"L":48,"R":52}},"day_1":{"balance":{"L":50,"R":50}}}}}}"#;
const IMU_S2: &str = r#"{"meta":{"id":"S2"},"data":{"imu_sensor":{"values":{"gait_cycle":{"L":1.1,"R":1.2}}}}}"#;

fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("Should write fixture");
}

/// Test helper: Create app over a populated data folder
async fn setup_app(dir: &TempDir) -> (axum::Router, AppState) {
    write_file(dir.path(), "a_pad_s1.json", PAD_S1);
    write_file(dir.path(), "b_insole_s1.json", INSOLE_S1);
    write_file(dir.path(), "c_imu_s2.json", IMU_S2);

    let state = AppState::new(dir.path().to_path_buf(), DiscoveryLimits::default());
    state.rebuild_index().await.expect("Should build index");
    (build_router(state.clone()), state)
}

/// Test helper: Create request
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Build a multipart upload request
fn upload_request(files: &[(&str, &str)]) -> Request<Body> {
    let boundary = "stridex-test-boundary";
    let mut body = String::new();
    for (name, contents) in files {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/json\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "stridex-dr");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
}

// =============================================================================
// Subjects
// =============================================================================

#[tokio::test]
async fn test_list_subjects_sorted_with_sensors() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/api/subjects")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["subjects"][0]["id"], "S1");
    assert_eq!(body["subjects"][0]["sensors"], serde_json::json!(["PAD", "INSOLE"]));
    assert_eq!(body["subjects"][0]["meta"]["age"], 64);
    assert_eq!(body["subjects"][1]["id"], "S2");
    assert_eq!(body["subjects"][1]["sensors"], serde_json::json!(["IMU"]));
}

#[tokio::test]
async fn test_get_subject_merges_files() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/api/subjects/S1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["id"], "S1");
    assert_eq!(body["gait_pad"]["velocity"]["left"], 133.4);
    assert!(body["gait_pad"]["velocity"]["right"].is_null());
    assert_eq!(body["gait_pad"]["step_length"]["right"], 60.5);
    assert_eq!(body["insole_days"][0]["day_index"], 1);
    assert_eq!(body["insole_days"][1]["day_index"], 2);
    assert_eq!(body["gait_cycle"]["left"]["stance"], 60.0);
    assert_eq!(
        body["source_files"],
        serde_json::json!(["a_pad_s1.json", "b_insole_s1.json"])
    );
}

#[tokio::test]
async fn test_patient_alias_route() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/api/patient/S2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["imu"]["gait_cycle"]["right"], 1.2);
}

#[tokio::test]
async fn test_unknown_subject_is_404() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/api/subjects/NOPE")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_label_summary() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app
        .oneshot(test_request("GET", "/api/subjects/S1/labels/summary"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["summary"]["class"], "1 (knee osteoarthritis)");
    assert_eq!(body["summary"]["side"], "left");
    assert!(body["summary"]["region"].is_null());
    assert_eq!(body["summary"]["diagnosis_text"], "early OA");
}

// =============================================================================
// Catalog and inspection
// =============================================================================

#[tokio::test]
async fn test_catalog() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/api/catalog")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["imu"].as_array().unwrap().len(), 4);
    assert_eq!(body["gait_pad"][1]["key"], "velocity");
    assert_eq!(body["smart_insole"][7]["key"], "foot_angle");
}

#[tokio::test]
async fn test_inspect_jsonl_body() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_app(&dir).await;

    let body = format!("{}\nnot json\n{}\n", PAD_S1, IMU_S2);
    let request = Request::builder()
        .method("POST")
        .uri("/api/inspect?name=batch.jsonl")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = extract_json(response.into_body()).await;
    assert_eq!(report["layout"], "records");
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);
    assert_eq!(report["family"], "gait_pad");
    assert!(report["candidate_count"].as_u64().unwrap() > 0);
    assert!(report["candidates"][0]["path"].as_str().unwrap().starts_with("root/records/[0]"));

    // inspection does not touch the index
    assert_eq!(state.index.read().await.len(), 2);
}

#[tokio::test]
async fn test_inspect_empty_body_rejected() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("POST", "/api/inspect")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Upload and clear
// =============================================================================

#[tokio::test]
async fn test_upload_adds_subject_and_rejects_unsupported() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_app(&dir).await;

    let request = upload_request(&[
        ("s3.json", r#"{"meta":{"id":"S3"},"data":{"gait_pad":{"values":{"velocity":99}}}}"#),
        ("notes.txt", "hello"),
    ]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["uploaded_files"], serde_json::json!(["s3.json"]));
    assert_eq!(body["rejected_files"][0]["name"], "notes.txt");
    assert_eq!(body["total_subjects"], 3);
    assert_eq!(body["loaded"], 4);
    assert_eq!(body["total"], 4);

    assert!(dir.path().join("s3.json").exists());
    assert!(!dir.path().join("notes.txt").exists());
    assert!(state.index.read().await.subject("S3").is_some());
}

#[tokio::test]
async fn test_upload_reports_broken_file() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir).await;

    let response = app.oneshot(upload_request(&[("broken.json", "{oops")])).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["loaded"], 3);
    assert_eq!(body["total"], 4);
    assert!(body["errors"][0].as_str().unwrap().starts_with("broken.json:"));
}

#[tokio::test]
async fn test_clear_data() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_app(&dir).await;
    write_file(dir.path(), "keep.txt", "not data");

    let response = app.oneshot(test_request("POST", "/api/clear-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["removed_files"].as_array().unwrap().len(), 3);
    assert!(state.index.read().await.is_empty());
    assert!(dir.path().join("keep.txt").exists());
}

#[tokio::test]
async fn test_upload_waits_for_folder_lock() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_app(&dir).await;

    let held = state.folder_lock.lock().await;
    let request = upload_request(&[("s3.json", r#"{"meta":{"id":"S3"}}"#)]);
    let pending = tokio::spawn(app.oneshot(request));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());
    assert!(!dir.path().join("s3.json").exists());

    drop(held);
    let response = pending.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.index.read().await.subject("S3").is_some());
}

#[tokio::test]
async fn test_concurrent_uploads_keep_every_subject() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_app(&dir).await;

    let first = upload_request(&[("s3.json", r#"{"meta":{"id":"S3"}}"#)]);
    let second = upload_request(&[("s4.json", r#"{"meta":{"id":"S4"}}"#)]);
    let (a, b) = tokio::join!(app.clone().oneshot(first), app.oneshot(second));
    assert_eq!(a.unwrap().status(), StatusCode::OK);
    assert_eq!(b.unwrap().status(), StatusCode::OK);

    let index = state.index.read().await;
    assert_eq!(index.len(), 4);
    assert!(index.subject("S3").is_some());
    assert!(index.subject("S4").is_some());
}

#[tokio::test]
async fn test_rebuild_after_clear_stays_empty() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_app(&dir).await;

    let (cleared, rebuilt) = tokio::join!(
        app.oneshot(test_request("POST", "/api/clear-data")),
        state.rebuild_index()
    );
    assert_eq!(cleared.unwrap().status(), StatusCode::OK);
    rebuilt.unwrap();

    // whichever ran second, the index matches the emptied folder
    assert!(state.index.read().await.is_empty());
}
