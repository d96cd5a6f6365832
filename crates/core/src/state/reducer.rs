//! Run state reducer.
//!
//! This module folds run stream messages into run state. It is a pure
//! function of its inputs: no clock, no I/O, no logging. Given the same
//! prior run and message it always yields the same next run.

use vv_protocol::run_models::{Run, RunStatus};
use vv_protocol::transport::{
    GenerationComplete, GenerationError, GenerationUpdate, TransportMessage, TransportPayload,
};

/// Compute the next state of a run from a stream message.
///
/// # Arguments
///
/// * `prior` - The locally held run state, if any
/// * `message` - The inbound stream message
///
/// # Returns
///
/// The next run state. When the message cannot be applied (terminal run,
/// stale sequence number, different run) the prior state is returned
/// unchanged. When there is no prior state, a run is synthesized from the
/// message's run identifier.
pub fn reduce(prior: Option<&Run>, message: &TransportMessage) -> Run {
    let Some(prior) = prior else {
        let seed = Run::new(message.run_id());
        return apply(seed, message);
    };

    if !accepts(prior, message) {
        return prior.clone();
    }

    apply(prior.clone(), message)
}

/// Whether `message` may change `run` at all.
pub fn accepts(run: &Run, message: &TransportMessage) -> bool {
    if run.id != message.run_id() {
        return false;
    }

    // Terminal runs accept nothing, regardless of ordering.
    if run.is_terminal() {
        return false;
    }

    !is_stale(run, message)
}

/// A frame is stale when both sides carry sequence numbers and the frame's
/// is not newer than the last one applied.
fn is_stale(run: &Run, message: &TransportMessage) -> bool {
    match (run.last_seq, message.seq) {
        (Some(last), Some(seq)) => seq <= last,
        _ => false,
    }
}

fn apply(mut run: Run, message: &TransportMessage) -> Run {
    match &message.payload {
        TransportPayload::GenerationUpdate(update) => apply_update(&mut run, update),
        TransportPayload::GenerationComplete(complete) => {
            apply_complete(&mut run, complete, message)
        }
        TransportPayload::GenerationError(error) => apply_error(&mut run, error, message),
    }

    if message.seq.is_some() {
        run.last_seq = message.seq;
    }
    run
}

fn apply_update(run: &mut Run, update: &GenerationUpdate) {
    run.status = update.status;
    run.progress = clamp_progress(update.progress);
    run.current_stage = update.current_stage.clone();
    // Last writer wins: the stage list is replaced, never merged. Stage order
    // and forward-only stage status are kept by the server; only `is_stale`
    // guards them here.
    run.stages = update.stages.clone();
    run.estimated_time_remaining = update.estimated_time_remaining;
}

fn apply_complete(run: &mut Run, complete: &GenerationComplete, message: &TransportMessage) {
    run.status = RunStatus::Completed;
    run.progress = 1.0;
    run.result = Some(complete.result.clone());
    run.estimated_time_remaining = None;
    run.completed_at = message.timestamp.or(run.completed_at);
}

fn apply_error(run: &mut Run, error: &GenerationError, message: &TransportMessage) {
    run.status = RunStatus::Failed;
    run.error = Some(error.error.clone());
    run.estimated_time_remaining = None;
    run.completed_at = message.timestamp.or(run.completed_at);
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}
