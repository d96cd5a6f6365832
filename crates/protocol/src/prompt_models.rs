//! Prompt and generation parameter models.
//!
//! A prompt is the text (plus optional reference images) a user submits to
//! start generation runs, together with the parameters the runs use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Target file format for exported models.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Gltf,
    #[default]
    Glb,
    Obj,
    Fbx,
    Usd,
    Blend,
}

/// Quality preset trading generation time for detail.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Draft,
    #[default]
    Standard,
    High,
    Ultra,
}

/// A named style preset selectable in the prompt panel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStyle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Parameters a prompt's runs are generated with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationParameters {
    /// Uniform scale of the produced model.
    pub scale: f64,
    /// Upper bound on the polygon count.
    pub poly_budget: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<GenerationStyle>,
    pub export_format: ExportFormat,
    pub quality: Quality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            scale: 1.0,
            poly_budget: 50_000,
            style: None,
            export_format: ExportFormat::default(),
            quality: Quality::default(),
            seed: None,
            guidance_scale: None,
            steps: None,
        }
    }
}

/// Per-run overrides of a prompt's parameters; unset fields are omitted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct ParameterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly_budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_format: Option<ExportFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// A stored prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub text: String,
    #[serde(default)]
    pub reference_images: Vec<String>,
    #[serde(default)]
    pub parameters: GenerationParameters,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_count: u64,
}

/// Body for creating or updating a prompt.
///
/// On update, only the fields that are set are sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct PromptDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<GenerationParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl PromptDraft {
    /// A draft carrying only prompt text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}
