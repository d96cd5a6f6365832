//! Run synchronization.
//!
//! `RunSync` ties the REST gateway, the run stream and the studio store
//! together for one run: it creates (or looks up) the run over REST, records
//! the snapshot in the store, then opens the run's stream. The returned
//! `RunFollower` folds stream events into the store until the run reaches
//! a terminal state or the stream gives up.

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use vv_protocol::api_models::CreateRunRequest;
use vv_protocol::run_models::Run;

use crate::config::ClientConfig;
use crate::gateway::ApiClient;
use crate::state::StudioStore;
use crate::transport::{ConnectionSnapshot, Connector, SocketEvent, SocketManager};

/// Starts and follows runs.
pub struct RunSync {
    config: ClientConfig,
    api: ApiClient,
    connector: Arc<dyn Connector>,
}

impl RunSync {
    /// Create a RunSync.
    ///
    /// # Arguments
    ///
    /// * `config` - Where the stream lives and how to reconnect
    /// * `api` - REST client used to create and look up runs
    /// * `connector` - Opens stream connections
    pub fn new(config: ClientConfig, api: ApiClient, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            api,
            connector,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Create a run and start following it.
    ///
    /// This method:
    /// 1. Creates the run over REST
    /// 2. Makes it the store's current run and tracks it as active
    /// 3. Opens the run's stream
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be created.
    pub async fn start(&self, store: &mut StudioStore, request: &CreateRunRequest) -> Result<RunFollower> {
        let run = self
            .api
            .create_run(request)
            .await
            .with_context(|| format!("Failed to create run for prompt {}", request.prompt_id))?;

        tracing::info!(run_id = %run.id, prompt_id = %request.prompt_id, "run created");
        Ok(self.attach(store, run))
    }

    /// Follow an existing run, starting from its current REST snapshot.
    pub async fn follow(&self, store: &mut StudioStore, run_id: &str) -> Result<RunFollower> {
        let run = self
            .api
            .get_run(run_id)
            .await
            .with_context(|| format!("Failed to fetch run {run_id}"))?;

        Ok(self.attach(store, run))
    }

    /// Track `run` in the store and open its stream.
    ///
    /// A run that is already terminal is tracked but no stream is opened.
    pub fn attach(&self, store: &mut StudioStore, run: Run) -> RunFollower {
        let run_id = run.id.clone();
        let finished = run.is_terminal();
        store.track_run(run);

        let (mut socket, events) =
            SocketManager::new(Arc::clone(&self.connector), self.config.socket_config());
        if finished {
            tracing::debug!(%run_id, "run already finished, not opening a stream");
        } else {
            socket.connect(self.config.run_stream_url(&run_id));
        }

        RunFollower {
            run_id,
            socket,
            events,
            finished,
        }
    }
}

/// Folds one run's stream into the store.
pub struct RunFollower {
    run_id: String,
    socket: SocketManager,
    events: UnboundedReceiver<SocketEvent>,
    finished: bool,
}

impl RunFollower {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Whether the run ended or the stream gave up.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn connection(&self) -> ConnectionSnapshot {
        self.socket.snapshot()
    }

    /// Wait for the next stream event without touching the store.
    ///
    /// Returns `None` once the follower is finished.
    pub async fn recv(&mut self) -> Option<SocketEvent> {
        if self.finished {
            return None;
        }
        self.events.recv().await
    }

    /// Apply an event received with [`recv`](Self::recv) to the store.
    ///
    /// The stream is closed as soon as the followed run is terminal.
    pub async fn apply(&mut self, store: &mut StudioStore, event: &SocketEvent) {
        match event {
            SocketEvent::Message(message) => {
                store.apply_message(message);
                if message.run_id() == self.run_id && is_terminal(store, &self.run_id) {
                    tracing::info!(run_id = %self.run_id, "run finished");
                    self.stop().await;
                }
            }
            SocketEvent::RetriesExhausted => self.finished = true,
            _ => {}
        }
    }

    /// Receive and apply the next event.
    pub async fn next(&mut self, store: &mut StudioStore) -> Option<SocketEvent> {
        let event = self.recv().await?;
        self.apply(store, &event).await;
        Some(event)
    }

    /// Apply events until the follower finishes and return the final run.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream gave up before the run ended.
    pub async fn wait(&mut self, store: &mut StudioStore) -> Result<Run> {
        while self.next(store).await.is_some() {}

        let run = tracked(store, &self.run_id)
            .cloned()
            .ok_or_else(|| anyhow!("Run {} is no longer tracked", self.run_id))?;
        if !run.is_terminal() {
            let connection = self.socket.snapshot();
            bail!(
                "Lost the stream for run {} after {} reconnect attempts: {}",
                self.run_id,
                connection.retry_count,
                connection.last_error.as_deref().unwrap_or("connection closed")
            );
        }
        Ok(run)
    }

    /// Close the stream and stop following.
    pub async fn stop(&mut self) {
        self.socket.disconnect().await;
        self.finished = true;
    }
}

fn tracked<'a>(store: &'a StudioStore, run_id: &str) -> Option<&'a Run> {
    store
        .current_run()
        .filter(|run| run.id == run_id)
        .or_else(|| store.active_run(run_id))
}

/// Terminal runs leave the active list, so a run that is neither current
/// nor active has ended.
fn is_terminal(store: &StudioStore, run_id: &str) -> bool {
    tracked(store, run_id).map_or(true, Run::is_terminal)
}
