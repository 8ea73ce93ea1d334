//! # Voicebox Common Library
//!
//! Shared code for the voicebox playback engine crates including:
//! - Identity and track types (GuildId, Track, LoopMode, ...)
//! - Event types (PlayerEvent enum) and the broadcast EventBus
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::{ChannelId, GuildId, LoopMode, PlaybackState, PlayableHandle, Track, UserRef};
