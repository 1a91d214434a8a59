//! Error types for the assertion tracker.

use thiserror::Error;

/// Errors raised while ingesting assertions or talking to the dispatcher.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("assertion {sequence}: execution digest differs from the proposed digest")]
    DigestMismatch { sequence: u64 },

    #[error("assertion {sequence}: new log count {new} exceeds total log count {total}")]
    NewLogCountOutOfRange { sequence: u64, new: usize, total: usize },

    #[error("dispatcher is not running")]
    DispatcherClosed,

    #[error("dispatcher dropped the response channel")]
    ResponseDropped,

    #[error("instance creation tx hash source closed before yielding a value")]
    InstanceHashUnavailable,

    #[error("config error: {0}")]
    Config(String),
}

impl TrackerError {
    /// Returns `true` for protocol-consistency violations that must stop ingestion.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DigestMismatch { .. } | Self::NewLogCountOutOfRange { .. }
        )
    }
}

/// Failure to decode a raw transaction outcome into an [`Outcome`](crate::decoder::Outcome).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed outcome: {0}")]
    Malformed(String),

    #[error("unknown outcome kind: {0}")]
    UnknownKind(String),

    #[error("invalid JSON outcome: {0}")]
    Json(#[from] serde_json::Error),
}
