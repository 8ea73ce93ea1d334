//! # Voicebox Player Library (voicebox-player)
//!
//! Per-guild playback core for the voicebox engine.
//!
//! **Purpose:** Maintain an ordered track queue per guild, drive playback
//! through an external voice transport, and expose transport-independent
//! commands that are safe to invoke concurrently from many guilds and, within
//! a guild, from many simultaneous callers.
//!
//! **Architecture:** One actor task per guild consuming a command channel.
//! User commands and asynchronous transport signals are variants of the same
//! message enum, so every mutation of a guild's queue and playback state is
//! totally ordered. Cross-guild operations run fully in parallel.
//!
//! The chat transport, the voice transport, and media resolution are external
//! collaborators consumed through the `VoiceConnector` and `TrackResolver`
//! traits.

pub mod commands;
pub mod connector;
pub mod engine;
pub mod error;
pub mod queue;
pub mod registry;
pub mod resolver;
pub mod scheduler;

pub use commands::{Enqueued, GuildCommands, QueueItemView};
pub use connector::{TransportSignal, VoiceConnector};
pub use engine::{PlayerHandle, QueueSnapshot};
pub use error::{PlayerError, Result};
pub use registry::{ConnectorFactory, EngineRegistry};
pub use resolver::{ResolveError, TrackResolver};
pub use scheduler::{OneShotScheduler, ScheduleSpec, ScheduledAction};
