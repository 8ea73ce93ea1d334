//! Shared identity and track types
//!
//! These are the vocabulary types every voicebox crate speaks: tenant
//! identities, track metadata, and the two small state enums the playback
//! engine is built around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Guild (tenant) identifier
///
/// Each guild has at most one playback engine and one voice connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Voice channel identifier within a guild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the user that issued a command or requested a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Opaque token the voice transport knows how to play
///
/// The playback engine never inspects this; it is produced by the track
/// resolver and handed through to `VoiceConnector::play` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableHandle(pub String);

/// A playable unit of media with title/url/requester metadata
///
/// Immutable once created. Owned by the queue that holds it; never shared
/// across guilds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique id, assigned at resolution time
    pub id: Uuid,
    pub title: String,
    pub source_url: String,
    pub requested_by: UserRef,
    /// Transport-opaque playback token
    pub handle: PlayableHandle,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        source_url: impl Into<String>,
        requested_by: UserRef,
        handle: PlayableHandle,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            source_url: source_url.into(),
            requested_by,
            handle,
        }
    }
}

/// Cursor advancement policy applied when a track completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Advance by one; stop past the end of the queue
    #[default]
    None,
    /// Replay the same cursor position
    Track,
    /// Advance by one, wrapping to the first item after the last
    Queue,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMode::None => write!(f, "none"),
            LoopMode::Track => write!(f, "track"),
            LoopMode::Queue => write!(f, "queue"),
        }
    }
}

impl FromStr for LoopMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(LoopMode::None),
            "track" => Ok(LoopMode::Track),
            "queue" => Ok(LoopMode::Queue),
            other => Err(Error::InvalidInput(format!("unknown loop mode: {other}"))),
        }
    }
}

/// Playback state of a guild's engine
///
/// Exactly one engine is in exactly one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_mode_round_trips_through_str() {
        for mode in [LoopMode::None, LoopMode::Track, LoopMode::Queue] {
            let parsed: LoopMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn loop_mode_rejects_unknown_names() {
        assert!("shuffle".parse::<LoopMode>().is_err());
    }

    #[test]
    fn loop_mode_parse_is_case_insensitive() {
        assert_eq!("QUEUE".parse::<LoopMode>().unwrap(), LoopMode::Queue);
    }

    #[test]
    fn track_ids_are_unique() {
        let requester = UserRef {
            id: 1,
            name: "tester".to_string(),
        };
        let a = Track::new(
            "a",
            "https://example.com/a",
            requester.clone(),
            PlayableHandle("a".to_string()),
        );
        let b = Track::new(
            "b",
            "https://example.com/b",
            requester,
            PlayableHandle("b".to_string()),
        );
        assert_ne!(a.id, b.id);
    }
}
