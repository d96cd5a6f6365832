//! End-to-end tests for RunSync.
//!
//! A single axum server plays the backend: `POST /api/v1/runs` creates the
//! run and `/runs/:id` streams scripted frames over a real WebSocket. The
//! tests verify that the store ends up in the state the frames describe.

mod common;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use vv_core::config::ClientConfig;
use vv_core::gateway::{ApiClient, CredentialStore};
use vv_core::state::StudioStore;
use vv_core::sync::{RunFollower, RunSync};
use vv_core::transport::WsConnector;
use vv_protocol::api_models::CreateRunRequest;
use vv_protocol::run_models::{Run, RunStatus, StageRef};

struct Backend {
    frames: Vec<String>,
    /// Upgrades beyond this many are answered with 503.
    accept_limit: usize,
    connections: AtomicUsize,
}

async fn stream(
    ws: WebSocketUpgrade,
    Path(run_id): Path<String>,
    State(backend): State<Arc<Backend>>,
) -> Response {
    let seen = backend.connections.fetch_add(1, Ordering::SeqCst) + 1;
    if seen > backend.accept_limit {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| play(socket, run_id, backend))
        .into_response()
}

async fn play(mut socket: WebSocket, run_id: String, backend: Arc<Backend>) {
    // The backend greets every connection with a frame the client ignores.
    let hello = json!({ "type": "connected", "data": { "runId": run_id } }).to_string();
    if socket.send(Message::Text(hello)).await.is_err() {
        return;
    }
    for frame in &backend.frames {
        if socket.send(Message::Text(frame.clone())).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn start_backend(frames: Vec<String>, accept_limit: usize) -> (ClientConfig, Arc<Backend>) {
    init_tracing();
    let backend = Arc::new(Backend {
        frames,
        accept_limit,
        connections: AtomicUsize::new(0),
    });
    let router = Router::new()
        .route(
            "/api/v1/runs",
            post(|| async { Json(ok_envelope(pending_run_json("r1"))) }),
        )
        .route("/runs/:id", get(stream))
        .with_state(Arc::clone(&backend));
    let addr = serve(router).await;
    (config_for(addr), backend)
}

fn run_sync(config: &ClientConfig, data_dir: &std::path::Path) -> RunSync {
    let api = ApiClient::new(config, CredentialStore::new(data_dir));
    RunSync::new(config.clone(), api, Arc::new(WsConnector))
}

async fn wait(follower: &mut RunFollower, store: &mut StudioStore) -> anyhow::Result<Run> {
    tokio::time::timeout(Duration::from_secs(10), follower.wait(store))
        .await
        .expect("follower should finish within 10s")
}

#[tokio::test]
async fn test_failed_run_keeps_progress() {
    let frames = vec![
        frame(&update_message("r1", RunStatus::MeshRecon, 0.42).with_seq(1)),
        frame(&error_message("r1", "OOM").with_seq(2)),
    ];
    let (config, _backend) = start_backend(frames, usize::MAX).await;
    let data_dir = tempdir().expect("Failed to create temp dir");
    let sync = run_sync(&config, data_dir.path());
    let mut store = StudioStore::new();

    let mut follower = sync
        .start(&mut store, &CreateRunRequest::for_prompt("p1"))
        .await
        .expect("Run should start");
    assert_eq!(store.active_run("r1").map(|r| r.status), Some(RunStatus::Pending));

    let run = wait(&mut follower, &mut store).await.expect("Run should finish");

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.progress, 0.42);
    assert_eq!(run.error.as_deref(), Some("OOM"));
    assert_eq!(store.current_run(), Some(&run));
    assert!(store.active_runs().is_empty());
    assert!(follower.is_finished());
}

#[tokio::test]
async fn test_completed_run_ignores_stale_and_malformed_frames() {
    let frames = vec![
        frame(&update_message("r1", RunStatus::Planning, 0.1).with_seq(1)),
        "{ definitely not json".to_string(),
        frame(&update_message("r1", RunStatus::TextureBake, 0.7).with_seq(3)),
        // Arrives late; older than what was already applied.
        frame(&update_message("r1", RunStatus::CoarseGen, 0.3).with_seq(2)),
        frame(&complete_message("r1").with_seq(4)),
        frame(&update_message("r1", RunStatus::Export, 0.9).with_seq(5)),
    ];
    let (config, _backend) = start_backend(frames, usize::MAX).await;
    let data_dir = tempdir().expect("Failed to create temp dir");
    let sync = run_sync(&config, data_dir.path());
    let mut store = StudioStore::new();

    let mut follower = sync
        .start(&mut store, &CreateRunRequest::for_prompt("p1"))
        .await
        .expect("Run should start");
    let run = wait(&mut follower, &mut store).await.expect("Run should finish");

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.progress, 1.0);
    assert_eq!(run.last_seq, Some(4));
    assert_eq!(
        run.current_stage.as_ref().map(StageRef::id),
        Some(RunStatus::TextureBake.as_str())
    );
    assert_eq!(
        run.result.as_ref().map(|r| r.model_url.as_str()),
        Some("https://cdn.example.com/r1/model.glb")
    );
}

#[tokio::test]
async fn test_stream_that_never_finishes_gives_up() {
    let frames = vec![frame(&update_message("r1", RunStatus::Planning, 0.2))];
    // The first connection streams one update and closes; every later
    // upgrade is refused, so only the reconnects count against the maximum.
    let (mut config, backend) = start_backend(frames, 1).await;
    config.max_reconnect_attempts = 2;
    let data_dir = tempdir().expect("Failed to create temp dir");
    let sync = run_sync(&config, data_dir.path());
    let mut store = StudioStore::new();

    let mut follower = sync
        .start(&mut store, &CreateRunRequest::for_prompt("p1"))
        .await
        .expect("Run should start");
    let err = wait(&mut follower, &mut store)
        .await
        .expect_err("Stream should give up");

    assert!(err.to_string().contains("Lost the stream for run r1"), "got: {err}");
    assert_eq!(backend.connections.load(Ordering::SeqCst), 3);
    assert!(err.to_string().contains("after 2 reconnect attempts"), "got: {err}");
    assert_eq!(store.active_run("r1").map(|r| r.progress), Some(0.2));
}
