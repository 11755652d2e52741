//! Widget error types.

use std::time::Duration;

use modamatch_core::MessageType;
use modamatch_core::protocol::ProtocolError;
use serde_json::Value;
use thiserror::Error;

/// Errors from a messenger call.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// No response arrived before the deadline.
    #[error("No response to {kind} within {after:?}")]
    Timeout { kind: MessageType, after: Duration },

    /// The host answered with `isError`; the payload is the host's error body.
    #[error("Host operation failed: {0}")]
    HostOperationFailed(Value),

    /// The frame could not be posted to the host page.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The messenger was shut down while the call was pending.
    #[error("Messenger closed")]
    Closed,

    /// Encoding the request or decoding the payload failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The payload did not have the expected shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Errors from durable settings storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
