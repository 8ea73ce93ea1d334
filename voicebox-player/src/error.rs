//! Error types for voicebox-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Queue-index and state-guard violations are reported
//! synchronously to the caller as typed failures; they never crash the
//! engine. Transport errors that arrive asynchronously are not represented
//! here at all — they become forced skips inside the engine and surface as
//! `TransportFailed` events.

use thiserror::Error;

/// Convenience Result type using the voicebox-player error
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Main error type for voicebox-player operations
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Queue index outside `[0, len)`
    #[error("queue index {0} out of range")]
    OutOfRange(usize),

    /// Operation requires a current track but the queue has none
    #[error("queue is empty")]
    EmptyQueue,

    /// Transport operation attempted with no active voice connection
    #[error("no active voice connection")]
    NotConnected,

    /// Voice channel join did not complete within the configured bound
    #[error("voice connection timed out")]
    ConnectionTimeout,

    /// The transport is already bound to a different voice channel
    #[error("already connected to another voice channel")]
    AlreadyConnectedElsewhere,

    /// The transport refused the join for lack of permission
    #[error("permission denied by voice transport")]
    PermissionDenied,

    /// Media lookup failed
    #[error("track resolution failed: {0}")]
    Resolution(String),

    /// A synchronous transport call failed
    #[error("voice transport error: {0}")]
    Transport(String),

    /// Invalid one-shot schedule parameters
    #[error("invalid schedule: {0}")]
    Schedule(String),

    /// Command sent to a disposed or dead engine actor
    #[error("playback engine is no longer running")]
    EngineClosed,
}
