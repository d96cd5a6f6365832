//! Socket manager for one run stream.
//!
//! A `SocketManager` owns at most one live connection. A single driver task
//! connects, pumps frames, and on close waits a fixed interval before trying
//! again, up to a configured number of attempts. Everything it observes is
//! reported as a [`SocketEvent`] on an unbounded channel, and the connection
//! state is published on a `watch` channel.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use vv_protocol::transport::TransportMessage;

use crate::transport::connector::{Connection, Connector};
use crate::transport::error::{TransportError, TransportResult};

/// Reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConfig {
    /// Fixed delay between a close and the next attempt.
    pub reconnect_interval: Duration,
    /// Attempts allowed after the first one before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_millis(5_000),
            max_reconnect_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Never connected.
    #[default]
    Idle,
    Connecting,
    Open,
    /// Waiting out the reconnect interval.
    Reconnecting,
    /// Disconnected on request.
    Closed,
    /// Gave up after the last reconnect attempt.
    Exhausted,
}

/// Observable connection state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

/// Notifications from the driver task.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Connected,
    Message(TransportMessage),
    Disconnected,
    Error(String),
    ReconnectScheduled { attempt: u32, delay: Duration },
    RetriesExhausted,
}

/// Manages the connection for one stream URL.
pub struct SocketManager {
    connector: Arc<dyn Connector>,
    config: SocketConfig,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    state: Arc<watch::Sender<ConnectionSnapshot>>,
    outbound_tx: Option<mpsc::UnboundedSender<String>>,
    cancel_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl SocketManager {
    /// Create a manager and the receiver for its events.
    pub fn new(
        connector: Arc<dyn Connector>,
        config: SocketConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SocketEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        let manager = Self {
            connector,
            config,
            events_tx,
            state: Arc::new(state),
            outbound_tx: None,
            cancel_tx: None,
            task: None,
        };
        (manager, events_rx)
    }

    /// Start connecting to `url`.
    ///
    /// Does nothing while a driver task is already running.
    pub fn connect(&mut self, url: impl Into<String>) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            url: url.into(),
            connector: Arc::clone(&self.connector),
            config: self.config,
            events: self.events_tx.clone(),
            state: Arc::clone(&self.state),
            cancel: cancel_rx,
            outbound: outbound_rx,
        };

        self.cancel_tx = Some(cancel_tx);
        self.outbound_tx = Some(outbound_tx);
        self.task = Some(tokio::spawn(driver.run()));
    }

    /// Stop reconnecting, close the connection and wait for the driver task.
    pub async fn disconnect(&mut self) {
        if let Some(cancel) = self.cancel_tx.take() {
            let _ = cancel.send(true);
        }
        self.outbound_tx = None;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "socket task ended abnormally");
            }
        }
    }

    /// Serialize `payload` and queue it on the open connection.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NotConnected` when no connection is open;
    /// the error is also recorded in the connection snapshot.
    pub fn send<T: Serialize>(&self, payload: &T) -> TransportResult<()> {
        let outbound = match &self.outbound_tx {
            Some(tx) if self.is_connected() => tx,
            _ => {
                let error = TransportError::NotConnected;
                self.state
                    .send_modify(|snapshot| snapshot.last_error = Some(error.to_string()));
                return Err(error);
            }
        };

        let text = serde_json::to_string(payload)?;
        outbound
            .send(text)
            .map_err(|_| TransportError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().status == ConnectionStatus::Open
    }

    /// Current connection state.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.borrow().clone()
    }

    /// Watch connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.state.subscribe()
    }
}

impl Drop for SocketManager {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel_tx.take() {
            let _ = cancel.send(true);
        }
    }
}

enum PumpExit {
    Closed,
    Cancelled,
}

/// State owned by the driver task.
struct Driver {
    url: String,
    connector: Arc<dyn Connector>,
    config: SocketConfig,
    events: mpsc::UnboundedSender<SocketEvent>,
    state: Arc<watch::Sender<ConnectionSnapshot>>,
    cancel: watch::Receiver<bool>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Driver {
    async fn run(mut self) {
        let mut retries: u32 = 0;

        loop {
            if self.is_cancelled() {
                break;
            }

            self.state.send_modify(|snapshot| {
                snapshot.status = ConnectionStatus::Connecting;
                snapshot.retry_count = retries;
            });
            tracing::debug!(url = %self.url, attempt = retries, "connecting");

            let connected = tokio::select! {
                result = self.connector.connect(&self.url) => result,
                _ = cancelled(&mut self.cancel) => break,
            };

            match connected {
                Ok(mut connection) => {
                    retries = 0;
                    self.state.send_modify(|snapshot| {
                        snapshot.status = ConnectionStatus::Open;
                        snapshot.retry_count = 0;
                        snapshot.last_error = None;
                    });
                    tracing::info!(url = %self.url, "run stream connected");
                    self.emit(SocketEvent::Connected);

                    let exit = self.pump(connection.as_mut()).await;
                    connection.close().await;
                    self.emit(SocketEvent::Disconnected);

                    if let PumpExit::Cancelled = exit {
                        break;
                    }
                    tracing::info!(url = %self.url, "run stream closed");
                }
                Err(e) => self.record_error(e),
            }

            if self.is_cancelled() {
                break;
            }

            if retries >= self.config.max_reconnect_attempts {
                self.state
                    .send_modify(|snapshot| snapshot.status = ConnectionStatus::Exhausted);
                tracing::warn!(url = %self.url, attempts = retries, "giving up on run stream");
                self.emit(SocketEvent::RetriesExhausted);
                return;
            }

            retries += 1;
            let delay = self.config.reconnect_interval;
            self.state.send_modify(|snapshot| {
                snapshot.status = ConnectionStatus::Reconnecting;
                snapshot.retry_count = retries;
            });
            tracing::info!(url = %self.url, attempt = retries, ?delay, "reconnect scheduled");
            self.emit(SocketEvent::ReconnectScheduled {
                attempt: retries,
                delay,
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled(&mut self.cancel) => break,
            }
        }

        self.state
            .send_modify(|snapshot| snapshot.status = ConnectionStatus::Closed);
        tracing::debug!(url = %self.url, "socket task stopped");
    }

    async fn pump(&mut self, connection: &mut dyn Connection) -> PumpExit {
        loop {
            tokio::select! {
                frame = connection.recv() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => self.record_error(e),
                    None => return PumpExit::Closed,
                },
                Some(text) = self.outbound.recv() => {
                    if let Err(e) = connection.send_text(text).await {
                        self.record_error(e);
                    }
                }
                _ = cancelled(&mut self.cancel) => return PumpExit::Cancelled,
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<TransportMessage>(text) {
            Ok(message) => {
                tracing::trace!(kind = message.kind(), run_id = message.run_id(), "frame received");
                self.emit(SocketEvent::Message(message));
            }
            Err(e) => {
                tracing::warn!(error = %e, frame = text, "discarding malformed frame");
            }
        }
    }

    fn record_error(&self, error: TransportError) {
        let message = error.to_string();
        tracing::warn!(url = %self.url, error = %message, "run stream error");
        self.state
            .send_modify(|snapshot| snapshot.last_error = Some(message.clone()));
        self.emit(SocketEvent::Error(message));
    }

    fn emit(&self, event: SocketEvent) {
        // Nobody listening is not an error.
        let _ = self.events.send(event);
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.cancel.has_changed().is_err()
    }
}

/// Resolves once cancellation is requested or the manager is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}
