//! Media resolution boundary
//!
//! Turning a free-form query into a playable track (metadata plus transport
//! handle) is the only operation in the system expected to take non-trivial
//! wall-clock time. The command facade resolves *before* entering the
//! per-guild serialization point, so a slow lookup never blocks another
//! caller's command — only the final `enqueue` goes through the engine.

use async_trait::async_trait;
use thiserror::Error;
use voicebox_common::types::{Track, UserRef};

use crate::error::PlayerError;

/// Media lookup failure
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Nothing matched the query
    #[error("no track matched the query")]
    NotFound,

    /// The lookup itself failed (network, upstream service, ...)
    #[error("resolution failed: {0}")]
    Failed(String),
}

impl From<ResolveError> for PlayerError {
    fn from(e: ResolveError) -> Self {
        PlayerError::Resolution(e.to_string())
    }
}

/// Async media resolver
///
/// Implementations may be slow; they are always invoked outside any engine
/// lock.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(
        &self,
        query: &str,
        requester: &UserRef,
    ) -> std::result::Result<Track, ResolveError>;
}
