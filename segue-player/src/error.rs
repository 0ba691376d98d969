//! Error types for segue-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Queue mutation errors
///
/// Raised synchronously for out-of-range indices. Navigating past either
/// end of the queue is a silent no-op and never produces one of these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Index does not address an existing entry
    #[error("Index {index} out of range (queue has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Insert position past the end of the queue
    #[error("Insert position {index} out of range (queue has {len} items)")]
    InsertOutOfRange { index: usize, len: usize },
}

/// Main error type for segue-player
#[derive(Error, Debug)]
pub enum Error {
    /// Queue management errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command sent after the playback timeline shut down
    #[error("Player has stopped")]
    PlayerStopped,

    /// Errors from shared segue-common helpers
    #[error(transparent)]
    Common(#[from] segue_common::Error),
}

/// Convenience Result type using segue-player Error
pub type Result<T> = std::result::Result<T, Error>;
