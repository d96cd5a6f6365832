use vv_protocol::*;

#[test]
fn test_generation_update_deserialization_from_wire() {
    let frame = r#"{
        "type": "generation_update",
        "data": {
            "runId": "r1",
            "status": "mesh_recon",
            "progress": 0.42,
            "currentStage": {"id": "s3", "name": "Mesh reconstruction", "status": "running", "progress": 0.1},
            "stages": [
                {"id": "s1", "name": "Planning", "status": "completed", "progress": 1.0},
                {"id": "s2", "name": "Coarse generation", "status": "completed", "progress": 1.0},
                {"id": "s3", "name": "Mesh reconstruction", "status": "running", "progress": 0.1}
            ],
            "estimatedTimeRemaining": 84.5
        },
        "timestamp": "2024-05-01T12:00:00Z",
        "seq": 7
    }"#;

    let message: TransportMessage = serde_json::from_str(frame).expect("Failed to deserialize frame");

    assert_eq!(message.run_id(), "r1");
    assert_eq!(message.kind(), "generation_update");
    assert_eq!(message.seq, Some(7));
    assert!(message.timestamp.is_some());

    match message.payload {
        TransportPayload::GenerationUpdate(update) => {
            assert_eq!(update.status, RunStatus::MeshRecon);
            assert_eq!(update.stages.len(), 3);
            assert_eq!(update.stages[2].status, StageStatus::Running);
            assert_eq!(update.current_stage.as_ref().map(StageRef::id), Some("s3"));
            assert_eq!(update.estimated_time_remaining, Some(84.5));
        }
        other => panic!("Wrong variant: {other:?}"),
    }
}

#[test]
fn test_generation_error_accepts_snake_case_run_id() {
    let frame = r#"{"type": "generation_error", "data": {"run_id": "r9", "error": "OOM", "stage": "texture_bake"}}"#;

    let message: TransportMessage = serde_json::from_str(frame).expect("Failed to deserialize frame");

    assert_eq!(message.run_id(), "r9");
    assert!(message.timestamp.is_none());
    assert!(matches!(
        message.payload,
        TransportPayload::GenerationError(GenerationError { ref error, .. }) if error == "OOM"
    ));
}

#[test]
fn test_unknown_frame_type_is_rejected() {
    // The backend greets new connections with a frame the run stream does not model.
    let frame = r#"{"type": "connected", "data": {"run_id": "r1", "message": "Connected"}}"#;

    assert!(serde_json::from_str::<TransportMessage>(frame).is_err());
}

#[test]
fn test_transport_message_serialization_shape() {
    let message = TransportMessage::new(TransportPayload::GenerationError(GenerationError {
        run_id: "r1".to_string(),
        error: "boom".to_string(),
        stage: None,
    }))
    .with_seq(3);

    let json = serde_json::to_value(&message).expect("Failed to serialize TransportMessage");

    assert_eq!(json["type"], "generation_error");
    assert_eq!(json["data"]["runId"], "r1");
    assert_eq!(json["seq"], 3);
    assert!(json.get("timestamp").is_none());
}

#[test]
fn test_run_status_serialization() {
    let json = serde_json::to_value(RunStatus::TextureBake).expect("Failed to serialize RunStatus");
    assert_eq!(json, "texture_bake");

    let deserialized: RunStatus = serde_json::from_value(json).expect("Failed to deserialize RunStatus");
    assert_eq!(deserialized, RunStatus::TextureBake);
    assert_eq!(deserialized.to_string(), "texture_bake");
}

#[test]
fn test_run_status_terminality() {
    for status in [RunStatus::Completed, RunStatus::Failed, RunStatus::Cancelled] {
        assert!(status.is_terminal(), "{status} should be terminal");
    }
    for status in [RunStatus::Pending, RunStatus::Planning, RunStatus::Publish] {
        assert!(status.is_active(), "{status} should be active");
    }
}

#[test]
fn test_minimal_run_snapshot_deserialization() {
    let json = r#"{"id": "r1", "status": "pending", "progress": 0}"#;

    let run: Run = serde_json::from_str(json).expect("Failed to deserialize Run");

    assert_eq!(run.id, "r1");
    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.progress, 0.0);
    assert!(run.stages.is_empty());
    assert!(run.current_stage.is_none());
}

#[test]
fn test_run_current_stage_as_identifier() {
    let json = r#"{"id": "r1", "status": "planning", "progress": 0.1, "currentStage": "planning"}"#;

    let run: Run = serde_json::from_str(json).expect("Failed to deserialize Run");

    assert_eq!(run.current_stage, Some(StageRef::Id("planning".to_string())));
    assert_eq!(run.current_stage.as_ref().map(StageRef::label), Some("planning"));
}

#[test]
fn test_api_envelope_deserialization() {
    let json = r#"{"success": true, "data": {"id": "r1", "status": "pending", "progress": 0}}"#;
    let envelope: ApiResponse<Run> = serde_json::from_str(json).expect("Failed to deserialize envelope");
    assert!(envelope.success);
    assert_eq!(envelope.data.map(|run| run.id), Some("r1".to_string()));

    let json = r#"{"success": false, "message": "Prompt not found"}"#;
    let envelope: ApiResponse<Run> = serde_json::from_str(json).expect("Failed to deserialize envelope");
    assert!(!envelope.success);
    assert!(envelope.data.is_none());
    assert_eq!(envelope.reason(), Some("Prompt not found"));
}

#[test]
fn test_paginated_prompts_deserialization() {
    let json = r#"{
        "items": [{"id": "p1", "text": "a brass astrolabe", "tags": ["props"]}],
        "total": 1, "page": 1, "limit": 20, "hasNext": false, "hasPrev": false
    }"#;

    let page: Paginated<Prompt> = serde_json::from_str(json).expect("Failed to deserialize page");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].parameters, GenerationParameters::default());
    assert_eq!(page.items[0].tags, vec!["props".to_string()]);
}

#[test]
fn test_create_run_request_serialization() {
    let request = CreateRunRequest {
        prompt_id: "p1".to_string(),
        parameters: Some(ParameterOverrides {
            quality: Some(Quality::High),
            ..ParameterOverrides::default()
        }),
    };

    let json = serde_json::to_value(&request).expect("Failed to serialize CreateRunRequest");

    assert_eq!(json["promptId"], "p1");
    assert_eq!(json["parameters"]["quality"], "high");
    assert!(json["parameters"].get("scale").is_none());
}

#[test]
fn test_studio_settings_defaults_fill_missing_fields() {
    let settings: StudioSettings =
        serde_json::from_str(r#"{"maxHistorySize": 10}"#).expect("Failed to deserialize settings");

    assert_eq!(settings.max_history_size, 10);
    assert!(settings.auto_save);
    assert_eq!(settings.auto_save_interval, 30_000);
    assert_eq!(settings.default_export_format, ExportFormat::Glb);
}

#[test]
fn test_scene_object_type_field() {
    let object = SceneObject::new("o1", "Astrolabe", SceneObjectKind::Mesh);

    let json = serde_json::to_value(&object).expect("Failed to serialize SceneObject");

    assert_eq!(json["type"], "mesh");
    assert_eq!(json["transform"]["scale"], serde_json::json!([1.0, 1.0, 1.0]));
}
