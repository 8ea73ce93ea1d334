//! Shared fixtures for voicebox-player integration tests
//!
//! `MockConnector` stands in for the voice transport: it records every call
//! in order, can be told to fail `play` for specific titles, and can delay
//! `connect` to provoke the join timeout.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;
use voicebox_common::config::BotConfig;
use voicebox_common::events::EventBus;
use voicebox_common::types::{ChannelId, GuildId, PlayableHandle, Track, UserRef};
use voicebox_player::{
    EngineRegistry, PlayerError, ResolveError, Result, TrackResolver, VoiceConnector,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(ChannelId),
    Play(Uuid),
    Pause,
    Resume,
    Stop,
    Disconnect,
}

#[derive(Default)]
pub struct MockConnector {
    calls: Mutex<Vec<Call>>,
    fail_play_titles: Mutex<HashSet<String>>,
    connect_delay: Mutex<Option<Duration>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `play` fail for every track with this title
    pub fn fail_play_for(&self, title: &str) {
        let mut titles = self.fail_play_titles.lock().unwrap();
        titles.insert(title.to_string());
    }

    pub fn delay_connect(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Ids passed to `play`, in call order
    pub fn played(&self) -> Vec<Uuid> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Play(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VoiceConnector for MockConnector {
    async fn connect(&self, channel: ChannelId) -> Result<()> {
        let delay = *self.connect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Call::Connect(channel));
        Ok(())
    }

    async fn play(&self, track: &Track) -> Result<()> {
        let failing = self.fail_play_titles.lock().unwrap().contains(&track.title);
        if failing {
            return Err(PlayerError::Transport(format!(
                "refusing to play {}",
                track.title
            )));
        }
        self.record(Call::Play(track.id));
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(Call::Pause);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.record(Call::Resume);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(Call::Stop);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record(Call::Disconnect);
        Ok(())
    }
}

/// Resolver that fabricates a track from the query string
#[derive(Default)]
pub struct MockResolver {
    unknown_queries: Mutex<HashSet<String>>,
}

impl MockResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_unknown(&self, query: &str) {
        self.unknown_queries
            .lock()
            .unwrap()
            .insert(query.to_string());
    }
}

#[async_trait]
impl TrackResolver for MockResolver {
    async fn resolve(
        &self,
        query: &str,
        requester: &UserRef,
    ) -> std::result::Result<Track, ResolveError> {
        if self.unknown_queries.lock().unwrap().contains(query) {
            return Err(ResolveError::NotFound);
        }
        Ok(track_for(query, requester))
    }
}

pub fn requester() -> UserRef {
    UserRef {
        id: 42,
        name: "tester".to_string(),
    }
}

pub fn track(title: &str) -> Track {
    track_for(title, &requester())
}

fn track_for(title: &str, requested_by: &UserRef) -> Track {
    Track::new(
        title,
        format!("https://example.com/{title}"),
        requested_by.clone(),
        PlayableHandle(title.to_string()),
    )
}

/// Opt-in test logging via `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry whose every guild shares the given mock connector
pub fn registry_with(connector: Arc<MockConnector>) -> (Arc<EngineRegistry>, Arc<EventBus>) {
    registry_with_config(connector, BotConfig::default())
}

pub fn registry_with_config(
    connector: Arc<MockConnector>,
    config: BotConfig,
) -> (Arc<EngineRegistry>, Arc<EventBus>) {
    init_tracing();
    let events = Arc::new(EventBus::new(config.event_capacity));
    let factory: voicebox_player::ConnectorFactory = {
        let connector = Arc::clone(&connector);
        Arc::new(move |_guild: GuildId| Arc::clone(&connector) as Arc<dyn VoiceConnector>)
    };
    let registry = Arc::new(EngineRegistry::new(&config, factory, Arc::clone(&events)));
    (registry, events)
}
