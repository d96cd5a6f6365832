//! Test fixtures for runs, prompts and stream frames.

use serde_json::{json, Value};
use std::net::SocketAddr;
use vv_core::config::ClientConfig;
use vv_protocol::prompt_models::Prompt;
use vv_protocol::run_models::{GenerationResult, Run, RunStatus, Stage, StageRef, StageStatus};
use vv_protocol::transport::{
    GenerationComplete, GenerationError, GenerationUpdate, TransportMessage, TransportPayload,
};

/// A client config pointing both origins at `addr`, with quick reconnects.
#[allow(dead_code)]
pub fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        api_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}"),
        request_timeout_secs: 5,
        reconnect_interval_ms: 20,
        max_reconnect_attempts: 0,
    }
}

#[allow(dead_code)]
pub fn sample_prompt(id: &str, text: &str) -> Prompt {
    Prompt {
        id: id.to_string(),
        user_id: "u1".to_string(),
        text: text.to_string(),
        reference_images: Vec::new(),
        parameters: Default::default(),
        tags: vec!["props".to_string()],
        is_public: false,
        created_at: None,
        updated_at: None,
        usage_count: 0,
    }
}

#[allow(dead_code)]
pub fn sample_stage(id: &str, status: StageStatus, progress: f64) -> Stage {
    Stage {
        id: id.to_string(),
        name: id.replace('_', " "),
        status,
        progress,
        started_at: None,
        completed_at: None,
        error: None,
        output: None,
    }
}

#[allow(dead_code)]
pub fn sample_result(run_id: &str) -> GenerationResult {
    GenerationResult {
        model_url: format!("https://cdn.example.com/{run_id}/model.glb"),
        thumbnail_url: format!("https://cdn.example.com/{run_id}/thumb.png"),
        metadata: json!({ "vertices": 48210 }),
        files: Vec::new(),
        statistics: Value::Null,
    }
}

#[allow(dead_code)]
pub fn update_message(run_id: &str, status: RunStatus, progress: f64) -> TransportMessage {
    let stages = vec![sample_stage(status.as_str(), StageStatus::Running, progress)];
    TransportMessage::new(TransportPayload::GenerationUpdate(GenerationUpdate {
        run_id: run_id.to_string(),
        status,
        progress,
        current_stage: Some(StageRef::Id(status.as_str().to_string())),
        stages,
        estimated_time_remaining: Some(42.0),
    }))
}

#[allow(dead_code)]
pub fn complete_message(run_id: &str) -> TransportMessage {
    TransportMessage::new(TransportPayload::GenerationComplete(GenerationComplete {
        run_id: run_id.to_string(),
        result: sample_result(run_id),
    }))
}

#[allow(dead_code)]
pub fn error_message(run_id: &str, error: &str) -> TransportMessage {
    TransportMessage::new(TransportPayload::GenerationError(GenerationError {
        run_id: run_id.to_string(),
        error: error.to_string(),
        stage: None,
    }))
}

/// Serialize a message the way the backend puts it on the wire.
#[allow(dead_code)]
pub fn frame(message: &TransportMessage) -> String {
    serde_json::to_string(message).expect("Failed to serialize frame")
}

/// A pending run as the REST API returns it right after creation.
#[allow(dead_code)]
pub fn pending_run_json(id: &str) -> Value {
    json!({ "id": id, "status": "pending", "progress": 0 })
}

/// Wrap `data` in a successful envelope.
#[allow(dead_code)]
pub fn ok_envelope(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

#[allow(dead_code)]
pub fn pending_run(id: &str) -> Run {
    Run::new(id)
}
