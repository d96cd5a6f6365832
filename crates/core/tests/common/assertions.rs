//! Helpers for collecting and checking socket events.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use vv_core::transport::SocketEvent;

/// Receive events until one matches `stop`, returning all of them.
///
/// Panics if the channel closes first or nothing matches within ten
/// minutes of (possibly paused) test time.
#[allow(dead_code)]
pub async fn collect_until(
    events: &mut UnboundedReceiver<SocketEvent>,
    stop: impl Fn(&SocketEvent) -> bool,
) -> Vec<SocketEvent> {
    let mut seen = Vec::new();
    let wait = async {
        while let Some(event) = events.recv().await {
            let done = stop(&event);
            seen.push(event);
            if done {
                return true;
            }
        }
        false
    };

    let matched = tokio::time::timeout(Duration::from_secs(600), wait)
        .await
        .unwrap_or(false);
    assert!(matched, "Expected event never arrived, saw: {seen:?}");
    seen
}

#[allow(dead_code)]
pub fn count_reconnects(events: &[SocketEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SocketEvent::ReconnectScheduled { .. }))
        .count()
}

#[allow(dead_code)]
pub fn count_messages(events: &[SocketEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SocketEvent::Message(_)))
        .count()
}

#[allow(dead_code)]
pub fn has_error(events: &[SocketEvent]) -> bool {
    events.iter().any(|e| matches!(e, SocketEvent::Error(_)))
}
