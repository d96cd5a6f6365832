//! Studio state.
//!
//! This module provides:
//! - A pure reducer folding run stream messages into run state
//! - The studio store owning all session and persisted state
//! - The persisted snapshot and its on-disk format

pub mod persistence;
pub mod reducer;
pub mod store;

pub use persistence::{PersistError, PersistResult, PersistedState};
pub use reducer::reduce;
pub use store::{HistoryState, StudioStore};
