//! Scripted in-memory connector.
//!
//! Each connect attempt consumes the next scripted outcome; once the script
//! runs out every attempt is refused.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use vv_core::transport::{Connection, Connector, TransportError, TransportResult};

/// What a single connect attempt does.
#[allow(dead_code)]
pub enum MockOutcome {
    /// Fail the attempt with this reason.
    Refuse(String),
    /// Open, deliver these frames, then close.
    Frames(Vec<String>),
    /// Open and deliver frames sent on the channel until it is dropped.
    Live(mpsc::UnboundedReceiver<String>),
    /// Open and yield each item in turn, `Err` as a protocol error, then
    /// stay open without further frames.
    Faulty(Vec<Result<String, String>>),
}

pub struct MockConnector {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    attempts: AtomicUsize,
    urls: Mutex<Vec<String>>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new(outcomes: Vec<MockOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            attempts: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// A connector that refuses every attempt.
    pub fn refusing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls lock poisoned").clone()
    }

    /// Frames written by the client, across all connections.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> TransportResult<Box<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().expect("urls lock poisoned").push(url.to_string());

        let outcome = self
            .outcomes
            .lock()
            .expect("outcomes lock poisoned")
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Refuse("connection refused".to_string()));

        let source = match outcome {
            MockOutcome::Refuse(reason) => {
                return Err(TransportError::Connect {
                    url: url.to_string(),
                    reason,
                })
            }
            MockOutcome::Frames(frames) => FrameSource::Scripted(frames.into()),
            MockOutcome::Live(rx) => FrameSource::Live(rx),
            MockOutcome::Faulty(items) => FrameSource::Faulty(items.into()),
        };

        Ok(Box::new(MockConnection {
            source,
            sent: Arc::clone(&self.sent),
        }))
    }
}

enum FrameSource {
    Scripted(VecDeque<String>),
    Live(mpsc::UnboundedReceiver<String>),
    Faulty(VecDeque<Result<String, String>>),
}

struct MockConnection {
    source: FrameSource,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn recv(&mut self) -> Option<TransportResult<String>> {
        match &mut self.source {
            FrameSource::Scripted(frames) => frames.pop_front().map(Ok),
            FrameSource::Live(rx) => rx.recv().await.map(Ok),
            FrameSource::Faulty(items) => match items.pop_front() {
                Some(item) => Some(item.map_err(TransportError::Protocol)),
                None => std::future::pending().await,
            },
        }
    }

    async fn send_text(&mut self, text: String) -> TransportResult<()> {
        self.sent.lock().expect("sent lock poisoned").push(text);
        Ok(())
    }

    async fn close(&mut self) {}
}
