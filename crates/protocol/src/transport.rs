//! Run progress stream protocol.
//!
//! This module defines the messages the backend pushes over the per-run
//! WebSocket (`{ws_base}/runs/{run_id}`).
//!
//! Every frame is a JSON object with a `type` discriminator, a `data`
//! payload and a `timestamp`; newer servers also attach a monotonically
//! increasing `seq`:
//! ```json
//! {
//!   "type": "generation_update",
//!   "data": {
//!     "runId": "r1",
//!     "status": "mesh_recon",
//!     "progress": 0.42,
//!     "stages": []
//!   },
//!   "timestamp": "2024-05-01T12:00:00Z",
//!   "seq": 7
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::run_models::{GenerationResult, RunStatus, Stage, StageRef};

/// Progress snapshot for a run that is still moving through its stages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct GenerationUpdate {
    #[serde(alias = "run_id")]
    pub run_id: String,
    pub status: RunStatus,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageRef>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<f64>,
}

/// Final result of a run that completed successfully.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct GenerationComplete {
    #[serde(alias = "run_id")]
    pub run_id: String,
    pub result: GenerationResult,
}

/// Failure report for a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct GenerationError {
    #[serde(alias = "run_id")]
    pub run_id: String,
    pub error: String,
    /// Stage the failure happened in, when the backend knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// The variant-specific part of a stream frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TransportPayload {
    /// The run advanced; carries the full stage list.
    GenerationUpdate(GenerationUpdate),
    /// The run completed and produced a result.
    GenerationComplete(GenerationComplete),
    /// The run failed.
    GenerationError(GenerationError),
}

/// One inbound frame on a run stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransportMessage {
    #[serde(flatten)]
    pub payload: TransportPayload,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Per-run sequence number; absent on servers that do not order frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl TransportMessage {
    pub fn new(payload: TransportPayload) -> Self {
        Self {
            payload,
            timestamp: None,
            seq: None,
        }
    }

    /// Attach a timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach a sequence number.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// The run this message refers to.
    pub fn run_id(&self) -> &str {
        match &self.payload {
            TransportPayload::GenerationUpdate(update) => &update.run_id,
            TransportPayload::GenerationComplete(complete) => &complete.run_id,
            TransportPayload::GenerationError(error) => &error.run_id,
        }
    }

    /// The wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self.payload {
            TransportPayload::GenerationUpdate(_) => "generation_update",
            TransportPayload::GenerationComplete(_) => "generation_complete",
            TransportPayload::GenerationError(_) => "generation_error",
        }
    }
}
