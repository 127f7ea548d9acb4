//! Error types for batched prediction calls.

use thiserror::Error;

/// Errors that can occur while fanning prediction calls out over worker threads.
///
/// Per-device failures are reported in the per-slot results instead, so one
/// rejected design does not discard the rest of the batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("The batch must contain at least one device")]
    EmptyBatch,

    #[error("Thread count must be at least 1, got {count}")]
    InvalidThreadCount { count: usize },

    #[error("A worker thread panicked during batch prediction")]
    ThreadPanicked,
}
