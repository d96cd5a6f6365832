//! Generation run state models.
//!
//! This module defines the structures for tracking a text-to-3D generation
//! run as it moves through its pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::prompt_models::ExportFormat;

/// Lifecycle status of a generation run.
///
/// Non-terminal statuses name the pipeline stage the run is in, in pipeline
/// order:
/// Pending -> Planning -> CoarseGen -> MeshRecon -> UvUnwrap -> TextureBake
/// -> QaSafety -> Optimize -> Export -> Publish
///
/// Terminal statuses:
/// - Completed: the run produced a result
/// - Failed: the run stopped with an error
/// - Cancelled: the run was cancelled by the user
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run has been accepted but not scheduled yet.
    #[default]
    Pending,
    Planning,
    CoarseGen,
    MeshRecon,
    UvUnwrap,
    TextureBake,
    QaSafety,
    Optimize,
    Export,
    Publish,
    /// Run finished and carries a result.
    Completed,
    /// Run stopped with an error.
    Failed,
    /// Run was cancelled before finishing.
    Cancelled,
}

impl RunStatus {
    /// Whether no further transitions are accepted from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the run is still moving through its stages.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// The wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Planning => "planning",
            Self::CoarseGen => "coarse_gen",
            Self::MeshRecon => "mesh_recon",
            Self::UvUnwrap => "uv_unwrap",
            Self::TextureBake => "texture_bake",
            Self::QaSafety => "qa_safety",
            Self::Optimize => "optimize",
            Self::Export => "export",
            Self::Publish => "publish",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single stage within a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A named phase of a generation run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,

    /// Human-readable stage name shown on the timeline.
    pub name: String,

    #[serde(default)]
    pub status: StageStatus,

    /// Stage-local progress in [0, 1].
    #[serde(default)]
    pub progress: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stage output as produced by the backend; opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

/// Reference to the stage a run is currently in.
///
/// The studio stream sends the full stage object while the REST schema
/// only carries the stage identifier, so both shapes are accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(untagged)]
pub enum StageRef {
    Detailed(Stage),
    Id(String),
}

impl StageRef {
    /// The identifier of the referenced stage.
    pub fn id(&self) -> &str {
        match self {
            Self::Detailed(stage) => &stage.id,
            Self::Id(id) => id,
        }
    }

    /// A display label: the stage name when known, else the identifier.
    pub fn label(&self) -> &str {
        match self {
            Self::Detailed(stage) => &stage.name,
            Self::Id(id) => id,
        }
    }
}

/// A downloadable file produced by a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ModelFile {
    pub id: String,
    pub name: String,
    pub format: ExportFormat,
    pub url: String,
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub optimized: bool,
}

/// The output of a completed run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub model_url: String,
    pub thumbnail_url: String,

    /// Mesh metadata (vertex/face counts, bounding box, materials).
    #[serde(default)]
    pub metadata: serde_json::Value,

    #[serde(default)]
    pub files: Vec<ModelFile>,

    /// Timing and resource statistics.
    #[serde(default)]
    pub statistics: serde_json::Value,
}

/// The client-side state of one generation run.
///
/// A run is created through the REST API and afterwards only changes by
/// applying stream messages through the reducer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default)]
    pub status: RunStatus,

    /// Overall progress in [0, 1].
    #[serde(default)]
    pub progress: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageRef>,

    /// Stages in the order fixed by the server at run creation.
    #[serde(default)]
    pub stages: Vec<Stage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Estimated seconds until completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<f64>,

    /// Sequence number of the last stream message applied to this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seq: Option<u64>,
}

impl Run {
    /// A fresh pending run with no stages.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt_id: None,
            user_id: None,
            status: RunStatus::Pending,
            progress: 0.0,
            current_stage: None,
            stages: Vec::new(),
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
            estimated_time_remaining: None,
            last_seq: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
