//! Registry and command-facade integration tests
//!
//! Covers engine lifecycle (lazy creation, sharing, disposal) and the
//! facade's caller-facing conventions: 1-based positions and resolve-first
//! `play`.

mod helpers;

use std::sync::Arc;

use helpers::{registry_with, requester, track, Call, MockConnector, MockResolver};
use voicebox_common::events::PlayerEvent;
use voicebox_common::types::{ChannelId, GuildId, LoopMode, PlaybackState};
use voicebox_player::{GuildCommands, PlayerError};

const GUILD: GuildId = GuildId(1);
const OTHER_GUILD: GuildId = GuildId(2);
const CHANNEL: ChannelId = ChannelId(10);

fn commands(connector: Arc<MockConnector>) -> (GuildCommands, Arc<MockResolver>) {
    let (registry, _events) = registry_with(connector);
    let resolver = MockResolver::new();
    (
        GuildCommands::new(registry, Arc::clone(&resolver) as Arc<dyn voicebox_player::TrackResolver>),
        resolver,
    )
}

#[tokio::test]
async fn concurrent_first_commands_share_one_engine() {
    let connector = MockConnector::new();
    let (registry, _events) = registry_with(connector);

    let (first, second) = tokio::join!(registry.get(GUILD), registry.get(GUILD));
    assert_eq!(registry.len().await, 1);

    // Both handles reach the same actor
    first.connect(CHANNEL).await.unwrap();
    first.enqueue(track("a")).await.unwrap();
    let snapshot = second.snapshot().await.unwrap();
    assert_eq!(snapshot.tracks.len(), 1);
}

#[tokio::test]
async fn guilds_are_isolated() {
    let connector = MockConnector::new();
    let (registry, _events) = registry_with(connector);

    let one = registry.get(GUILD).await;
    let two = registry.get(OTHER_GUILD).await;
    one.connect(CHANNEL).await.unwrap();
    one.enqueue(track("a")).await.unwrap();

    assert_eq!(registry.len().await, 2);
    assert!(two.snapshot().await.unwrap().tracks.is_empty());
    assert_eq!(two.snapshot().await.unwrap().state, PlaybackState::Idle);
}

#[tokio::test]
async fn dispose_releases_transport_and_kills_the_handle() {
    let connector = MockConnector::new();
    let (registry, events) = registry_with(Arc::clone(&connector));
    let mut rx = events.subscribe();

    let handle = registry.get(GUILD).await;
    handle.connect(CHANNEL).await.unwrap();
    handle.enqueue(track("a")).await.unwrap();

    registry.dispose(GUILD).await;

    assert!(!registry.contains(GUILD).await);
    assert!(connector.count(&Call::Disconnect) >= 1);
    assert!(matches!(
        handle.snapshot().await,
        Err(PlayerError::EngineClosed)
    ));

    let mut disposed = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, PlayerEvent::EngineDisposed { guild_id, .. } if guild_id == GUILD) {
            disposed = true;
        }
    }
    assert!(disposed);

    // A later get builds a fresh engine with an empty queue
    let fresh = registry.get(GUILD).await;
    assert!(fresh.snapshot().await.unwrap().tracks.is_empty());
}

#[tokio::test]
async fn dispose_of_unknown_guild_is_a_noop() {
    let connector = MockConnector::new();
    let (registry, _events) = registry_with(connector);

    registry.dispose(GuildId(999)).await;
    assert_eq!(registry.len().await, 0);
}

#[tokio::test]
async fn play_resolves_joins_and_reports_a_one_based_position() {
    let connector = MockConnector::new();
    let (commands, _resolver) = commands(Arc::clone(&connector));

    let first = commands
        .play(GUILD, CHANNEL, "song-a", &requester())
        .await
        .unwrap();
    assert_eq!(first.position, 1);
    assert_eq!(first.track.title, "song-a");
    assert_eq!(connector.count(&Call::Connect(CHANNEL)), 1);

    let second = commands
        .play(GUILD, CHANNEL, "song-b", &requester())
        .await
        .unwrap();
    assert_eq!(second.position, 2);
    // Second play reuses the existing connection
    assert_eq!(connector.count(&Call::Connect(CHANNEL)), 1);
    assert_eq!(connector.played(), vec![first.track.id]);
}

#[tokio::test]
async fn play_with_unresolvable_query_changes_nothing() {
    let connector = MockConnector::new();
    let (commands, resolver) = commands(Arc::clone(&connector));
    resolver.mark_unknown("gone");

    let err = commands
        .play(GUILD, CHANNEL, "gone", &requester())
        .await
        .unwrap_err();
    assert!(matches!(err, PlayerError::Resolution(_)));
    // Resolution happens before any engine work
    assert!(connector.calls().is_empty());
    assert!(!commands.registry().contains(GUILD).await);
}

#[tokio::test]
async fn listing_uses_one_based_positions() {
    let connector = MockConnector::new();
    let (commands, _resolver) = commands(connector);

    for query in ["a", "b", "c"] {
        commands.play(GUILD, CHANNEL, query, &requester()).await.unwrap();
    }
    commands.jump(GUILD, 2).await.unwrap();

    let rows = commands.list(GUILD).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].position, 1);
    assert!(rows[1].is_current);
    assert_eq!(rows[1].title, "b");
}

#[tokio::test]
async fn remove_and_jump_reject_position_zero() {
    let connector = MockConnector::new();
    let (commands, _resolver) = commands(connector);
    commands.play(GUILD, CHANNEL, "a", &requester()).await.unwrap();

    assert!(matches!(
        commands.remove(GUILD, 0).await,
        Err(PlayerError::OutOfRange(0))
    ));
    assert!(matches!(
        commands.jump(GUILD, 0).await,
        Err(PlayerError::OutOfRange(0))
    ));
    // Position 1 is the first track
    commands.jump(GUILD, 1).await.unwrap();
}

#[tokio::test]
async fn remove_converts_positions_to_indices() {
    let connector = MockConnector::new();
    let (commands, _resolver) = commands(connector);
    for query in ["a", "b", "c"] {
        commands.play(GUILD, CHANNEL, query, &requester()).await.unwrap();
    }

    commands.remove(GUILD, 2).await.unwrap();

    let titles: Vec<_> = commands
        .list(GUILD)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.title)
        .collect();
    assert_eq!(titles, ["a", "c"]);
}

#[tokio::test]
async fn now_playing_tracks_the_engine_state() {
    let connector = MockConnector::new();
    let (commands, _resolver) = commands(connector);

    assert_eq!(commands.now_playing(GUILD).await.unwrap(), None);

    commands.play(GUILD, CHANNEL, "a", &requester()).await.unwrap();
    let current = commands.now_playing(GUILD).await.unwrap().unwrap();
    assert_eq!(current.title, "a");

    commands.stop(GUILD).await.unwrap();
    assert_eq!(commands.now_playing(GUILD).await.unwrap(), None);
}

#[tokio::test]
async fn loop_mode_and_leave_round_trip() {
    let connector = MockConnector::new();
    let (commands, _resolver) = commands(Arc::clone(&connector));
    commands.play(GUILD, CHANNEL, "a", &requester()).await.unwrap();

    commands.set_loop_mode(GUILD, LoopMode::Queue).await.unwrap();
    commands.leave(GUILD).await.unwrap();

    assert!(connector.count(&Call::Disconnect) >= 1);
    let rows = commands.list(GUILD).await.unwrap();
    assert!(rows.is_empty());
}
