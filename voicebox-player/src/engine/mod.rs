//! Per-guild playback engine
//!
//! **Module structure:**
//! - `command.rs`: command message enum, queue snapshot, `PlayerHandle`
//! - `core.rs`: actor task, playback state machine, loop-mode advancement
//!
//! One engine actor runs per guild. All mutating operations — user commands
//! and asynchronous transport signals alike — travel through a single command
//! channel and execute one at a time, so queue mutation and "now playing"
//! advancement are race-free within a guild. Engines for different guilds are
//! fully independent.

mod command;
mod core;

pub use command::{PlayerHandle, QueueSnapshot};
pub(crate) use core::spawn;
