//! Integration tests for the ingestion endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, against a queue file in a temp directory.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use worldlab_ingest::{IngestState, build_router};
use worldlab_store::FileInputQueue;

fn make_state(assign_trace_ids: bool) -> (TempDir, Arc<IngestState>) {
    let dir = tempfile::tempdir().unwrap();
    let queue = FileInputQueue::new(dir.path().join("input_queue.jsonl"));
    (dir, Arc::new(IngestState::new(queue, assign_trace_ids)))
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/inputs")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn post_json(value: &Value) -> Request<Body> {
    post(serde_json::to_vec(value).unwrap())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn queued(state: &IngestState) -> usize {
    state.queue.read_since(0).unwrap().0.len()
}

fn reading() -> Value {
    json!({
        "source": "plugin",
        "channel": "equipment",
        "name": "TEMP_READING",
        "data": {"temp_c": 95.5},
    })
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let (_dir, state) = make_state(false);
    let app = build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({"status": "ok"}));
}

// ---------------------------------------------------------------------------
// POST /v1/inputs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_input_is_appended() {
    let (_dir, state) = make_state(false);
    let app = build_router(Arc::clone(&state));

    let response = app.oneshot(post_json(&reading())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], json!(true));
    assert_eq!(json["trace_id"], Value::Null);
    assert!(
        json["queue_path"]
            .as_str()
            .unwrap()
            .ends_with("input_queue.jsonl")
    );

    let (inputs, cursor) = state.queue.read_since(0).unwrap();
    assert_eq!(cursor, 1);
    assert_eq!(inputs[0].channel, "equipment");
    assert_eq!(inputs[0].name, "TEMP_READING");
    assert_eq!(inputs[0].data.get("temp_c"), Some(&json!(95.5)));
}

#[tokio::test]
async fn inputs_are_appended_in_order() {
    let (_dir, state) = make_state(false);

    for name in ["A", "B", "C"] {
        let body = json!({"source": "human", "channel": "ops", "name": name});
        let response = build_router(Arc::clone(&state))
            .oneshot(post_json(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let (inputs, _) = state.queue.read_since(0).unwrap();
    let names: Vec<&str> = inputs.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let (_dir, state) = make_state(false);
    let app = build_router(Arc::clone(&state));

    let mut body = reading();
    body["priority"] = json!("high");
    let response = app.oneshot(post_json(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(queued(&state), 0);
}

#[tokio::test]
async fn unknown_source_is_rejected() {
    let (_dir, state) = make_state(false);
    let app = build_router(Arc::clone(&state));

    let mut body = reading();
    body["source"] = json!("robot");
    let response = app.oneshot(post_json(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], json!(422));
    assert!(json["error"].as_str().unwrap().contains("source"));
    assert_eq!(queued(&state), 0);
}

#[tokio::test]
async fn empty_and_oversized_fields_are_rejected() {
    let (_dir, state) = make_state(false);

    let cases = [
        json!({"source": "plugin", "channel": "", "name": "X"}),
        json!({"source": "plugin", "channel": "ops", "name": "N".repeat(65)}),
        json!({"source": "plugin", "channel": "ops", "name": "X", "trace_id": ""}),
        json!({"source": "plugin", "channel": "ops", "name": "X", "trace_id": "t".repeat(129)}),
    ];
    for body in cases {
        let response = build_router(Arc::clone(&state))
            .oneshot(post_json(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }
    assert_eq!(queued(&state), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (_dir, state) = make_state(false);
    let app = build_router(Arc::clone(&state));

    let response = app.oneshot(post("{\"source\": \"plugin\",")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], json!(422));
    assert!(json["error"].is_string());
    assert_eq!(queued(&state), 0);
}

#[tokio::test]
async fn non_object_data_is_rejected() {
    let (_dir, state) = make_state(false);
    let app = build_router(Arc::clone(&state));

    let mut body = reading();
    body["data"] = json!([1, 2, 3]);
    let response = app.oneshot(post_json(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(queued(&state), 0);
}

#[tokio::test]
async fn trace_id_is_minted_when_enabled() {
    let (_dir, state) = make_state(true);
    let app = build_router(Arc::clone(&state));

    let response = app.oneshot(post_json(&reading())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let minted = json["trace_id"].as_str().unwrap().to_owned();
    assert!(uuid::Uuid::parse_str(&minted).is_ok());

    let (inputs, _) = state.queue.read_since(0).unwrap();
    assert_eq!(inputs[0].trace_id.as_deref(), Some(minted.as_str()));
}

#[tokio::test]
async fn supplied_trace_id_is_kept() {
    let (_dir, state) = make_state(true);
    let app = build_router(Arc::clone(&state));

    let mut body = reading();
    body["trace_id"] = json!("TR-42");
    let response = app.oneshot(post_json(&body)).await.unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["trace_id"], json!("TR-42"));
    let (inputs, _) = state.queue.read_since(0).unwrap();
    assert_eq!(inputs[0].trace_id.as_deref(), Some("TR-42"));
}

#[tokio::test]
async fn unwritable_queue_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the queue file should be.
    let queue = FileInputQueue::new(dir.path());
    let state = Arc::new(IngestState::new(queue, false));

    let response = build_router(state)
        .oneshot(post_json(&reading()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], json!(500));
}
