//! Studio view-state models.
//!
//! These structures describe the workspace around a run: panel layout,
//! camera, viewport, scene selection and user settings. UI, camera and
//! settings are persisted between sessions; the rest lives only as long as
//! the studio process.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::prompt_models::{ExportFormat, Quality};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    System,
}

/// How the viewport camera responds to input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    #[default]
    Orbit,
    Fly,
    Walk,
}

/// Panel layout and viewport overlays.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct UiState {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub inspector_collapsed: bool,
    pub timeline_collapsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_object: Option<String>,
    pub camera_mode: CameraMode,
    pub grid_visible: bool,
    pub axes_visible: bool,
    pub wireframe_mode: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            sidebar_collapsed: false,
            inspector_collapsed: false,
            timeline_collapsed: false,
            selected_object: None,
            camera_mode: CameraMode::Orbit,
            grid_visible: true,
            axes_visible: true,
            wireframe_mode: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraState {
    pub position: [f64; 3],
    pub target: [f64; 3],
    /// Vertical field of view in degrees.
    pub fov: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov: 75.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            pixel_ratio: 1.0,
        }
    }
}

/// Whether adding to the selection replaces it or extends it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    /// Selected scene object ids, in selection order.
    pub objects: Vec<String>,
    pub mode: SelectionMode,
}

/// User settings for the studio.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioSettings {
    pub auto_save: bool,
    /// Milliseconds between automatic saves.
    pub auto_save_interval: u64,
    /// Capacity of the undo stack.
    pub max_history_size: usize,
    pub default_quality: Quality,
    pub default_export_format: ExportFormat,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval: 30_000,
            max_history_size: 50,
            default_quality: Quality::Standard,
            default_export_format: ExportFormat::Glb,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Transform {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum SceneObjectKind {
    Mesh,
    Light,
    Camera,
    Group,
}

/// An object placed in the studio scene.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SceneObjectKind,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl SceneObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: SceneObjectKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            transform: Transform::default(),
            visible: true,
        }
    }
}
