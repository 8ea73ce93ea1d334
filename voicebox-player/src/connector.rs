//! Voice transport boundary
//!
//! The engine never touches the voice network directly. Everything it needs
//! from a transport — joining a channel, starting and stopping audio output —
//! goes through the `VoiceConnector` capability object, and everything the
//! transport reports back arrives as a `TransportSignal` delivered into the
//! engine's command channel.
//!
//! One connector instance belongs to exactly one guild's engine; connectors
//! are never shared.

use async_trait::async_trait;
use uuid::Uuid;
use voicebox_common::types::{ChannelId, Track};

use crate::error::Result;

/// Asynchronous outcome signals from the voice transport
///
/// Signals carry the id of the track they concern so the engine can discard
/// stale reports (e.g. a completion signal for a track the user already
/// skipped past).
#[derive(Debug, Clone)]
pub enum TransportSignal {
    /// The track played to completion
    TrackFinished { track_id: Uuid },
    /// The transport failed mid-track; the engine treats this as a forced
    /// skip so a bad track never wedges the queue
    TrackErrored { track_id: Uuid, message: String },
}

impl TransportSignal {
    /// Shorthand used by transports reporting natural completion
    pub fn finished(track_id: Uuid) -> Self {
        TransportSignal::TrackFinished { track_id }
    }

    /// Shorthand used by transports reporting mid-track failure
    pub fn errored(track_id: Uuid, message: impl Into<String>) -> Self {
        TransportSignal::TrackErrored {
            track_id,
            message: message.into(),
        }
    }

    pub fn track_id(&self) -> Uuid {
        match self {
            TransportSignal::TrackFinished { track_id }
            | TransportSignal::TrackErrored { track_id, .. } => *track_id,
        }
    }
}

/// External voice transport capability
///
/// `play`/`pause`/`resume`/`stop` are fire-and-forget from the engine's point
/// of view: completion and failure come back later as `TransportSignal`s
/// (delivered via `PlayerHandle::notify`).
///
/// `connect` failure modes: `AlreadyConnectedElsewhere`, `PermissionDenied`,
/// or a transport-specific error. The engine itself bounds the call with the
/// configured connect timeout.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    /// Join a voice channel
    async fn connect(&self, channel: ChannelId) -> Result<()>;

    /// Start audio output for a track
    async fn play(&self, track: &Track) -> Result<()>;

    /// Suspend audio output
    async fn pause(&self) -> Result<()>;

    /// Resume suspended output
    async fn resume(&self) -> Result<()>;

    /// Stop audio output without leaving the channel
    async fn stop(&self) -> Result<()>;

    /// Leave the voice channel and release transport resources
    async fn disconnect(&self) -> Result<()>;
}
