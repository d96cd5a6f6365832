//! Studio state store.
//!
//! The StudioStore is the single owner of everything the studio views
//! render: the run being watched, the other active runs, prompt history,
//! scene and selection, camera and viewport, the undo/redo history and the
//! user's settings. It is a plain value mutated through `&mut self`, so
//! whoever holds it is the only writer and updates apply in call order.

use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use vv_protocol::prompt_models::Prompt;
use vv_protocol::run_models::Run;
use vv_protocol::studio_models::{
    CameraState, SceneObject, SelectionMode, SelectionState, StudioSettings, Transform, UiState,
    ViewportState,
};
use vv_protocol::transport::TransportMessage;

use crate::state::persistence::{self, PersistResult, PersistedState};
use crate::state::reducer;

/// Number of prompts kept in the history.
pub const PROMPT_HISTORY_CAPACITY: usize = 10;

/// Number of runs tracked in the active list.
pub const ACTIVE_RUNS_CAPACITY: usize = 32;

/// Undo and redo stacks of opaque actions.
///
/// The most recent entry of each stack is at the back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    undo_stack: VecDeque<Value>,
    redo_stack: VecDeque<Value>,
}

impl HistoryState {
    /// Undo entries, oldest first.
    pub fn undo_stack(&self) -> impl Iterator<Item = &Value> {
        self.undo_stack.iter()
    }

    /// Redo entries, oldest first.
    pub fn redo_stack(&self) -> impl Iterator<Item = &Value> {
        self.redo_stack.iter()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn truncate_to(&mut self, capacity: usize) {
        while self.undo_stack.len() > capacity {
            self.undo_stack.pop_front();
        }
    }
}

/// Owner of all studio state.
#[derive(Debug, Clone, Default)]
pub struct StudioStore {
    ui: UiState,
    scene_objects: Vec<SceneObject>,
    selected_object_id: Option<String>,
    current_run: Option<Run>,
    active_runs: Vec<Run>,
    current_prompt: Option<Prompt>,
    prompt_history: Vec<Prompt>,
    camera: CameraState,
    viewport: ViewportState,
    selection: SelectionState,
    history: HistoryState,
    settings: StudioSettings,

    /// Where the persisted subset is written; `None` keeps everything in memory.
    storage: Option<PathBuf>,
    /// Set when a persisted sub-state changed since the last flush.
    dirty: bool,
}

impl StudioStore {
    /// Create an in-memory store with default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store backed by the snapshot file at `path`.
    ///
    /// The persisted subset is loaded from the file (defaults when it is
    /// missing or invalid); everything else starts from defaults.
    pub fn with_storage(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = persistence::load_snapshot(&path);
        let mut store = Self {
            storage: Some(path),
            ..Self::default()
        };
        store.restore(snapshot);
        store
    }

    /// Create a store backed by the standard snapshot file in `data_dir`.
    pub fn open(data_dir: &Path) -> Self {
        Self::with_storage(persistence::storage_path(data_dir))
    }

    fn restore(&mut self, snapshot: PersistedState) {
        self.ui = snapshot.ui;
        self.settings = snapshot.settings;
        self.camera = snapshot.camera;
        self.prompt_history = snapshot.prompt_history;
        self.prompt_history.truncate(PROMPT_HISTORY_CAPACITY);
    }

    /// The persisted subset of the current state.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            ui: self.ui.clone(),
            settings: self.settings.clone(),
            camera: self.camera.clone(),
            prompt_history: self.prompt_history.clone(),
        }
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage.as_deref()
    }

    /// Whether persisted state changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the persisted subset if it changed.
    ///
    /// # Returns
    ///
    /// `true` if a snapshot was written.
    pub fn flush(&mut self) -> PersistResult<bool> {
        let Some(path) = self.storage.as_deref() else {
            return Ok(false);
        };
        if !self.dirty {
            return Ok(false);
        }
        persistence::save_snapshot(path, &self.snapshot())?;
        self.dirty = false;
        Ok(true)
    }

    /// Restore every sub-state to its default.
    pub fn reset(&mut self) {
        let storage = self.storage.take();
        *self = Self {
            storage,
            dirty: true,
            ..Self::default()
        };
    }

    // UI

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn update_ui(&mut self, update: impl FnOnce(&mut UiState)) {
        update(&mut self.ui);
        self.dirty = true;
    }

    // Scene

    pub fn scene_objects(&self) -> &[SceneObject] {
        &self.scene_objects
    }

    pub fn selected_object_id(&self) -> Option<&str> {
        self.selected_object_id.as_deref()
    }

    pub fn add_scene_object(&mut self, object: SceneObject) {
        self.scene_objects.push(object);
    }

    /// Remove an object; clears the selected object if it was this one.
    pub fn remove_scene_object(&mut self, id: &str) {
        self.scene_objects.retain(|object| object.id != id);
        if self.selected_object_id.as_deref() == Some(id) {
            self.selected_object_id = None;
        }
    }

    /// Patch a scene object in place. Returns `false` when no object matched.
    pub fn update_scene_object(&mut self, id: &str, update: impl FnOnce(&mut SceneObject)) -> bool {
        match self.scene_objects.iter_mut().find(|object| object.id == id) {
            Some(object) => {
                update(object);
                true
            }
            None => false,
        }
    }

    pub fn update_object_transform(&mut self, id: &str, update: impl FnOnce(&mut Transform)) -> bool {
        self.update_scene_object(id, |object| update(&mut object.transform))
    }

    pub fn select_object(&mut self, id: Option<String>) {
        self.selected_object_id = id;
    }

    // Runs

    pub fn current_run(&self) -> Option<&Run> {
        self.current_run.as_ref()
    }

    pub fn set_current_run(&mut self, run: Option<Run>) {
        self.current_run = run;
    }

    pub fn active_runs(&self) -> &[Run] {
        &self.active_runs
    }

    pub fn active_run(&self, id: &str) -> Option<&Run> {
        self.active_runs.iter().find(|run| run.id == id)
    }

    /// Append a run to the active list.
    ///
    /// A run already in the list is replaced in place. When the list is
    /// full the oldest entry is dropped.
    pub fn add_active_run(&mut self, run: Run) {
        if let Some(existing) = self.active_runs.iter_mut().find(|r| r.id == run.id) {
            *existing = run;
            return;
        }
        self.active_runs.push(run);
        if self.active_runs.len() > ACTIVE_RUNS_CAPACITY {
            self.active_runs.remove(0);
        }
    }

    pub fn remove_active_run(&mut self, id: &str) {
        self.active_runs.retain(|run| run.id != id);
    }

    /// Patch an active run in place. Returns `false` when no run matched.
    pub fn update_active_run(&mut self, id: &str, update: impl FnOnce(&mut Run)) -> bool {
        match self.active_runs.iter_mut().find(|run| run.id == id) {
            Some(run) => {
                update(run);
                true
            }
            None => false,
        }
    }

    /// Make `run` the current run and track it while it is active.
    ///
    /// Used with snapshots returned by the REST API before the stream
    /// takes over.
    pub fn track_run(&mut self, run: Run) {
        if run.is_terminal() {
            self.remove_active_run(&run.id);
        } else {
            self.add_active_run(run.clone());
        }
        self.current_run = Some(run);
    }

    /// Forget a run the user dismissed.
    pub fn clear_run(&mut self, id: &str) {
        self.remove_active_run(id);
        if self.current_run.as_ref().is_some_and(|run| run.id == id) {
            self.current_run = None;
        }
    }

    /// Fold a stream message into the matching run.
    ///
    /// The message is reduced against the active entry for its run (or the
    /// current run). The result replaces the current run when it matches
    /// and the active entry; terminal runs leave the active list. Updates
    /// for unknown runs are adopted into the active list; a completion or
    /// error for an unknown run has nothing to retire and is dropped.
    ///
    /// # Returns
    ///
    /// `true` if any run state changed.
    pub fn apply_message(&mut self, message: &TransportMessage) -> bool {
        let run_id = message.run_id();

        let prior = self
            .active_run(run_id)
            .or_else(|| self.current_run.as_ref().filter(|run| run.id == run_id));
        let next = reducer::reduce(prior, message);

        if prior == Some(&next) {
            tracing::debug!(run_id, kind = message.kind(), seq = ?message.seq, "stream message not applied");
            return false;
        }
        if prior.is_none() {
            if next.is_terminal() {
                tracing::debug!(run_id, kind = message.kind(), "terminal message for unknown run");
                return false;
            }
            tracing::debug!(run_id, "adopting run first seen on the stream");
        }

        if self.current_run.as_ref().is_some_and(|run| run.id == run_id) {
            self.current_run = Some(next.clone());
        }

        if next.is_terminal() {
            self.remove_active_run(run_id);
        } else {
            self.add_active_run(next);
        }
        true
    }

    // Prompts

    pub fn current_prompt(&self) -> Option<&Prompt> {
        self.current_prompt.as_ref()
    }

    pub fn set_current_prompt(&mut self, prompt: Option<Prompt>) {
        self.current_prompt = prompt;
    }

    /// Prompt history, most recent first.
    pub fn prompt_history(&self) -> &[Prompt] {
        &self.prompt_history
    }

    /// Prepend a prompt, keeping the ten most recent.
    pub fn add_to_prompt_history(&mut self, prompt: Prompt) {
        self.prompt_history.insert(0, prompt);
        self.prompt_history.truncate(PROMPT_HISTORY_CAPACITY);
        self.dirty = true;
    }

    pub fn clear_prompt_history(&mut self) {
        self.prompt_history.clear();
        self.dirty = true;
    }

    // Camera and viewport

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn update_camera(&mut self, update: impl FnOnce(&mut CameraState)) {
        update(&mut self.camera);
        self.dirty = true;
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn update_viewport(&mut self, update: impl FnOnce(&mut ViewportState)) {
        update(&mut self.viewport);
    }

    // Selection

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Switch selection mode. Going to single mode keeps only the most
    /// recent selected object.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection.mode = mode;
        if mode == SelectionMode::Single && self.selection.objects.len() > 1 {
            let last = self.selection.objects.pop();
            self.selection.objects = last.into_iter().collect();
        }
    }

    /// Add an object to the selection.
    ///
    /// In single mode the selection becomes just this object; in multiple
    /// mode the object is added unless already selected.
    pub fn add_to_selection(&mut self, object_id: impl Into<String>) {
        let object_id = object_id.into();
        match self.selection.mode {
            SelectionMode::Single => self.selection.objects = vec![object_id],
            SelectionMode::Multiple => {
                if !self.selection.objects.contains(&object_id) {
                    self.selection.objects.push(object_id);
                }
            }
        }
    }

    pub fn remove_from_selection(&mut self, object_id: &str) {
        self.selection.objects.retain(|id| id != object_id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.objects.clear();
    }

    // History

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    /// Record an action; drops the oldest entries beyond
    /// `settings.max_history_size` and clears the redo stack.
    pub fn add_to_history(&mut self, action: Value) {
        self.history.undo_stack.push_back(action);
        self.history.truncate_to(self.settings.max_history_size);
        self.history.redo_stack.clear();
    }

    /// Move the most recent action from the undo stack to the redo stack.
    ///
    /// Returns the moved action, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&Value> {
        let action = self.history.undo_stack.pop_back()?;
        self.history.redo_stack.push_back(action);
        self.history.redo_stack.back()
    }

    /// Move the most recently undone action back onto the undo stack.
    pub fn redo(&mut self) -> Option<&Value> {
        let action = self.history.redo_stack.pop_back()?;
        self.history.undo_stack.push_back(action);
        self.history.undo_stack.back()
    }

    // Settings

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut StudioSettings)) {
        update(&mut self.settings);
        self.history.truncate_to(self.settings.max_history_size);
        self.dirty = true;
    }
}
