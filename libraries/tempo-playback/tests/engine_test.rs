//! Engine integration tests against hand-written fakes

mod common;

use common::{context, track, tracks, Call, Harness};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempo_core::{PlaybackState, RepeatMode, TrackId, TrackOrigin};
use tempo_playback::{
    EngineSlot, Interaction, Notice, NoticeBoard, PlayFailure, PlaybackError, PlayerState,
    ResourceEvent,
};
use tempo_storage::{keys, FileStorage, MemoryStorage, SharedStore, WriteOutcome};

// ===== Autoplay gate =====

#[tokio::test]
async fn restored_playing_state_waits_for_interaction() {
    let harness = Harness::new();
    let mut state = PlaybackState::default();
    state.current = Some(track("a"));
    state.is_playing = true;
    harness.store.write(keys::PLAYBACK_STATE, &state);

    harness.engine.restore().await;
    harness.loaded().await;

    assert_eq!(harness.resource.plays(), 0);
    assert_eq!(harness.engine.player_state(), PlayerState::Ready);
    assert!(harness.engine.intends_to_play());
    assert!(harness.state().is_playing, "store keeps the intended state");

    harness
        .engine
        .notify_user_interaction(Interaction::Touch)
        .await;

    assert_eq!(harness.resource.plays(), 1);
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn restore_resumes_at_persisted_position() {
    let harness = Harness::new();
    let mut state = PlaybackState::default();
    state.current = Some(track("a"));
    state.position_secs = 42.0;
    harness.store.write(keys::PLAYBACK_STATE, &state);

    harness.engine.restore().await;
    harness.loaded().await;

    assert!(harness.resource.calls().contains(&Call::Seek(42.0)));
}

#[tokio::test]
async fn autoplay_block_closes_gate_and_keeps_intent() {
    let harness = Harness::started().await;
    harness.resource.fail_next_play(PlayFailure::NotAllowed("gesture required".into()));

    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    assert_eq!(harness.resource.plays(), 1);
    assert!(!harness.engine.is_gate_open());
    assert!(harness.engine.intends_to_play());
    assert_ne!(harness.engine.player_state(), PlayerState::Playing);

    harness
        .engine
        .notify_user_interaction(Interaction::Pointer)
        .await;

    assert_eq!(harness.resource.plays(), 2);
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn play_is_deferred_until_resource_ready() {
    let harness = Harness::started().await;

    harness.engine.play_track(track("a")).await;
    assert_eq!(harness.engine.player_state(), PlayerState::Loading);
    assert_eq!(harness.resource.plays(), 0);

    harness
        .engine
        .handle_resource_event(ResourceEvent::CanPlayThrough)
        .await;

    assert_eq!(harness.resource.plays(), 1);
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

// ===== Loading =====

#[tokio::test]
async fn loading_sets_source_then_reloads() {
    let harness = Harness::started().await;

    harness.engine.play_track(track("a")).await;

    assert_eq!(
        harness.resource.calls(),
        vec![
            Call::SetSource("http://localhost:8080/api/stream/music/a.mp3".into()),
            Call::Reload
        ]
    );
}

#[tokio::test]
async fn switching_tracks_reuses_the_single_resource() {
    let harness = Harness::started().await;

    harness.engine.play_track(track("a")).await;
    harness.loaded().await;
    harness.engine.play_track(track("b")).await;
    harness.loaded().await;

    assert_eq!(harness.resource.sources().len(), 2);
    assert_eq!(harness.current_id().as_deref(), Some("b"));
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn replaying_current_track_restarts_it() {
    let harness = Harness::started().await;
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    harness.engine.play_track(track("a")).await;

    assert_eq!(harness.resource.sources().len(), 1);
    assert!(harness.resource.calls().contains(&Call::Seek(0.0)));
}

#[tokio::test]
async fn unresolvable_track_pauses_with_notice() {
    let harness = Harness::started().await;
    let missing = tempo_core::Track::new("x", "Gone", "Artist", TrackOrigin::Offline);

    harness.engine.play_track(missing).await;

    assert!(harness.resource.sources().is_empty());
    assert_eq!(harness.engine.player_state(), PlayerState::Paused);
    assert_eq!(harness.current_id().as_deref(), Some("x"));
    assert!(matches!(
        harness.notices.drain().as_slice(),
        [Notice::TrackUnavailable { .. }]
    ));
}

#[tokio::test]
async fn offline_track_plays_from_download() {
    let harness = Harness::started().await;
    harness
        .offline
        .files
        .lock()
        .unwrap()
        .insert(TrackId::new("x"), "file:///downloads/x.mp3".into());

    harness
        .engine
        .play_track(tempo_core::Track::new("x", "Kept", "Artist", TrackOrigin::Offline))
        .await;

    assert_eq!(harness.resource.sources(), vec!["file:///downloads/x.mp3".to_string()]);
}

// ===== Errors =====

#[tokio::test]
async fn resource_error_pauses_without_advancing() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    harness
        .engine
        .handle_resource_event(ResourceEvent::Error {
            message: "decode failed".into(),
        })
        .await;

    assert_eq!(harness.engine.player_state(), PlayerState::Paused);
    assert_eq!(harness.current_id().as_deref(), Some("a"));
    assert!(harness.engine.intends_to_play());
    assert!(harness.state().is_playing);
}

#[tokio::test]
async fn retry_after_resource_error_reloads_first() {
    let harness = Harness::started().await;
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;
    harness
        .engine
        .handle_resource_event(ResourceEvent::Error {
            message: "network".into(),
        })
        .await;
    let reloads = harness.resource.count(|c| *c == Call::Reload);

    // The stored intent is still "playing", so one tap retries
    harness.engine.toggle_play_pause().await;

    assert_eq!(harness.resource.count(|c| *c == Call::Reload), reloads + 1);
    assert_eq!(harness.engine.player_state(), PlayerState::Loading);

    harness.loaded().await;
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn play_failure_pauses_and_reports() {
    let harness = Harness::started().await;
    let mut events = harness.engine.subscribe_events();
    harness.resource.fail_next_play(PlayFailure::Resource("unsupported codec".into()));

    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    assert_eq!(harness.engine.player_state(), PlayerState::Paused);
    let mut saw_error = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, tempo_playback::PlaybackEvent::Error { .. }) {
            saw_error = true;
        }
    }
    assert!(saw_error);
}

#[tokio::test]
async fn resource_error_holds_through_unrelated_store_writes() {
    let harness = Harness::started().await;
    let _observer = harness.engine.spawn_observer();
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    harness
        .engine
        .handle_resource_event(ResourceEvent::Error {
            message: "decode failed".into(),
        })
        .await;
    let reloads = harness.resource.count(|c| *c == Call::Reload);
    let plays = harness.resource.plays();

    harness.engine.toggle_shuffle();
    harness.engine.add_to_queue(track("b"));
    harness
        .engine
        .handle_resource_event(ResourceEvent::TimeUpdate { position_secs: 5.0 })
        .await;
    harness
        .engine
        .notify_user_interaction(Interaction::Pointer)
        .await;
    harness
        .engine
        .handle_resource_event(ResourceEvent::CanPlayThrough)
        .await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert_eq!(harness.resource.count(|c| *c == Call::Reload), reloads);
    assert_eq!(harness.resource.plays(), plays);
    assert_eq!(harness.engine.player_state(), PlayerState::Paused);
    assert_eq!(harness.current_id().as_deref(), Some("a"));

    // Only an explicit play lifts the hold
    harness.engine.toggle_play_pause().await;
    assert_eq!(harness.resource.count(|c| *c == Call::Reload), reloads + 1);
    harness.loaded().await;
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn skipping_clears_error_hold() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;
    harness
        .engine
        .handle_resource_event(ResourceEvent::Error {
            message: "network".into(),
        })
        .await;

    harness.engine.next().await;
    harness.loaded().await;

    assert_eq!(harness.current_id().as_deref(), Some("b"));
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn error_events_carry_resource_error_text() {
    let harness = Harness::started().await;
    let mut events = harness.engine.subscribe_events();
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    harness
        .engine
        .handle_resource_event(ResourceEvent::Error {
            message: "decode failed".into(),
        })
        .await;

    let mut messages = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let tempo_playback::PlaybackEvent::Error { message } = event {
            messages.push(message);
        }
    }
    assert_eq!(messages, vec!["Audio resource error: decode failed".to_string()]);
}

// ===== Stale attempts =====

#[tokio::test]
async fn pause_during_pending_attempt_wins() {
    let harness = Harness::started().await;
    harness.engine.play_track(track("a")).await;
    // Loading: no attempt yet
    let release = harness.resource.hold_play();

    let engine = harness.engine.clone();
    let pending = tokio::spawn(async move {
        engine
            .handle_resource_event(ResourceEvent::MetadataLoaded {
                duration_secs: Some(100.0),
            })
            .await;
    });
    tokio::task::yield_now().await;
    assert_eq!(harness.resource.plays(), 1);

    harness.engine.toggle_play_pause().await;
    release.notify_one();
    pending.await.unwrap();

    assert_ne!(harness.engine.player_state(), PlayerState::Playing);
    assert!(!harness.state().is_playing);
    assert_eq!(harness.resource.calls().last(), Some(&Call::Pause));
}

#[tokio::test]
async fn concurrent_play_requests_are_dropped() {
    let harness = Harness::started().await;
    harness.engine.play_track(track("a")).await;
    let release = harness.resource.hold_play();

    let engine = harness.engine.clone();
    let pending = tokio::spawn(async move { engine.handle_resource_event(ResourceEvent::CanPlayThrough).await });
    tokio::task::yield_now().await;

    harness
        .engine
        .notify_user_interaction(Interaction::Pointer)
        .await;
    harness.loaded().await;
    release.notify_one();
    pending.await.unwrap();

    assert_eq!(harness.resource.plays(), 1);
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

// ===== Advance =====

#[tokio::test]
async fn ended_advances_linearly_then_stops() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    harness.finish_track().await;
    assert_eq!(harness.current_id().as_deref(), Some("b"));
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);

    harness.finish_track().await;
    assert_eq!(harness.current_id(), None);
    assert!(!harness.state().is_playing);
    assert_eq!(harness.engine.player_state(), PlayerState::Idle);
}

#[tokio::test]
async fn repeat_all_wraps_to_first() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.cycle_repeat_mode();
    assert_eq!(harness.state().repeat, RepeatMode::All);

    harness.engine.play_track(track("b")).await;
    harness.loaded().await;
    harness.finish_track().await;

    assert_eq!(harness.current_id().as_deref(), Some("a"));
}

#[tokio::test]
async fn repeat_one_replays_current_track() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.cycle_repeat_mode();
    harness.engine.cycle_repeat_mode();
    assert_eq!(harness.state().repeat, RepeatMode::One);

    harness.engine.play_track(track("a")).await;
    harness.loaded().await;
    harness
        .engine
        .handle_resource_event(ResourceEvent::Ended)
        .await;

    assert_eq!(harness.current_id().as_deref(), Some("a"));
    assert_eq!(harness.resource.sources().len(), 1);
    assert!(harness.resource.calls().contains(&Call::Seek(0.0)));
    assert_eq!(harness.resource.plays(), 2);
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn manual_next_ignores_repeat_one() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.cycle_repeat_mode();
    harness.engine.cycle_repeat_mode();

    harness.engine.play_track(track("a")).await;
    harness.engine.next().await;

    assert_eq!(harness.current_id().as_deref(), Some("b"));
}

#[tokio::test]
async fn toggle_with_nothing_loaded_starts_context() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));

    harness.engine.toggle_play_pause().await;

    assert_eq!(harness.current_id().as_deref(), Some("a"));
    assert!(harness.state().is_playing);
}

#[tokio::test]
async fn selected_context_overrides_library() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b", "c"]));
    let playlist = context("p1", &["x", "b", "y"]);

    harness.engine.play_from_context(playlist, track("b")).await;
    harness.engine.next().await;
    assert_eq!(harness.current_id().as_deref(), Some("y"));

    harness.engine.clear_selected_context();
    harness.engine.play_track(track("b")).await;
    harness.engine.next().await;
    assert_eq!(harness.current_id().as_deref(), Some("c"));
}

#[tokio::test]
async fn previous_goes_back_or_rewinds() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("b")).await;

    harness.engine.previous().await;
    assert_eq!(harness.current_id().as_deref(), Some("a"));

    harness.engine.seek(30.0);
    harness.engine.previous().await;
    assert_eq!(harness.current_id().as_deref(), Some("a"));
    assert_eq!(harness.resource.calls().last(), Some(&Call::Seek(0.0)));
    assert_eq!(harness.state().position_secs, 0.0);
}

#[tokio::test]
async fn previous_rewinds_track_outside_context() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("z")).await;

    harness.engine.previous().await;

    assert_eq!(harness.current_id().as_deref(), Some("z"));
    assert_eq!(harness.resource.calls().last(), Some(&Call::Seek(0.0)));
}

// ===== Queue =====

#[tokio::test]
async fn queue_plays_before_context() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    harness.engine.play_track(track("a")).await;
    harness.engine.add_to_queue(track("q"));

    harness.engine.next().await;
    assert_eq!(harness.current_id().as_deref(), Some("q"));
    assert!(harness.engine.queue_snapshot().is_empty());
}

#[tokio::test]
async fn queue_drain_restores_playlist_context() {
    let harness = Harness::started().await;
    harness.engine.set_library(tracks(&["a", "b"]));
    let playlist = context("p1", &["x", "y", "z"]);

    harness.engine.play_from_context(playlist, track("y")).await;
    harness.engine.add_to_queue(track("t"));
    harness.engine.clear_selected_context();
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    harness.finish_track().await;
    assert_eq!(harness.current_id().as_deref(), Some("t"));
    assert_eq!(harness.selected_context_id(), None);

    harness.finish_track().await;
    assert_eq!(harness.current_id().as_deref(), Some("x"));
    assert_eq!(harness.selected_context_id().as_deref(), Some("p1"));

    harness.finish_track().await;
    assert_eq!(harness.current_id().as_deref(), Some("y"));
}

#[tokio::test]
async fn clear_queue_removes_entries() {
    let harness = Harness::started().await;
    harness.engine.add_to_queue(track("a"));
    harness.engine.add_to_queue(track("a"));
    assert_eq!(harness.engine.queue_snapshot().len(), 2);

    harness.engine.clear_queue();
    assert!(harness.engine.queue_snapshot().is_empty());
}

// ===== Side effects =====

#[tokio::test]
async fn recently_played_does_not_block_playback() {
    let harness = Harness::started().await;
    harness
        .catalog
        .hang_recently_played
        .store(true, Ordering::SeqCst);

    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn recently_played_failure_is_ignored() {
    let harness = Harness::started().await;
    harness.catalog.fail.store(true, Ordering::SeqCst);

    harness.engine.play_track(track("a")).await;
    harness.loaded().await;
    tokio::task::yield_now().await;

    assert_eq!(harness.catalog.recently_played.load(Ordering::SeqCst), 1);
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);
}

#[tokio::test]
async fn position_persisted_on_whole_seconds() {
    let harness = Harness::started().await;
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    for (position, expected) in [(1.2, 1.2), (1.7, 1.2), (2.1, 2.1)] {
        harness
            .engine
            .handle_resource_event(ResourceEvent::TimeUpdate {
                position_secs: position,
            })
            .await;
        assert_eq!(harness.state().position_secs, expected);
    }
}

#[tokio::test]
async fn seek_is_clamped_to_duration() {
    let harness = Harness::started().await;
    harness.engine.play_track(track("a")).await;
    harness.loaded().await;

    harness.engine.seek(500.0);
    assert_eq!(harness.state().position_secs, 200.0);

    harness.engine.seek(-3.0);
    assert_eq!(harness.state().position_secs, 0.0);
}

#[tokio::test]
async fn observer_follows_external_store_writes() {
    let harness = Harness::started().await;
    let _observer = harness.engine.spawn_observer();

    // Another surface writes the store directly
    let mut state = harness.state();
    state.current = Some(track("ext"));
    state.is_playing = true;
    harness.store.write(keys::PLAYBACK_STATE, &state);

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        harness.resource.sources(),
        vec!["http://localhost:8080/api/stream/music/ext.mp3".to_string()]
    );
}

// ===== Engine slot =====

#[tokio::test]
async fn enqueue_before_install_is_recoverable() {
    let slot = EngineSlot::new();
    let notices = NoticeBoard::new();

    let result = slot.add_to_queue(track("a"), &notices);

    assert!(matches!(result, Err(PlaybackError::QueueSystemUnavailable)));
    assert_eq!(notices.drain(), vec![Notice::QueueUnavailable]);

    let harness = Harness::started().await;
    slot.install(harness.engine.clone());
    assert_eq!(slot.add_to_queue(track("a"), &notices).unwrap(), 1);
    assert!(matches!(notices.drain().as_slice(), [Notice::AddedToQueue { .. }]));

    slot.teardown();
    assert!(slot.add_to_queue(track("b"), &notices).is_err());
}

// ===== Persistence =====

#[tokio::test]
async fn state_survives_reload_from_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    {
        let backend = Arc::new(FileStorage::open(dir.path(), None).unwrap());
        let harness = Harness::with_backend(backend);
        harness.engine.restore().await;
        harness.engine.notify_user_interaction(Interaction::Pointer).await;
        harness.engine.play_track(track("a")).await;
        harness.engine.add_to_queue(track("q"));
    }

    let store = SharedStore::new(Arc::new(FileStorage::open(dir.path(), None).unwrap()));
    let state: PlaybackState = store.read_or_default(keys::PLAYBACK_STATE);
    assert_eq!(state.current.map(|t| t.id), Some(TrackId::new("a")));
    assert!(state.is_playing);

    let restored = Harness::with_backend(Arc::new(FileStorage::open(dir.path(), None).unwrap()));
    restored.engine.restore().await;
    assert_eq!(restored.engine.queue_snapshot().len(), 1);
    assert!(restored.engine.intends_to_play());
    assert!(!restored.engine.is_gate_open());
}

#[tokio::test]
async fn huge_library_is_compacted_not_fatal() {
    let backend = Arc::new(MemoryStorage::with_quota(256 * 1024));
    let harness = Harness::with_backend(backend);
    harness.engine.restore().await;
    harness.engine.notify_user_interaction(Interaction::Pointer).await;

    let library: Vec<_> = (0..10_000).map(|i| track(&format!("t{i}"))).collect();
    harness.engine.set_library(library);

    let state = harness.state();
    assert_eq!(state.library.len(), 500);

    harness.engine.play_track(track("t3")).await;
    harness.loaded().await;
    assert_eq!(harness.current_id().as_deref(), Some("t3"));
    assert_eq!(harness.engine.player_state(), PlayerState::Playing);

    harness.engine.next().await;
    assert_eq!(harness.current_id().as_deref(), Some("t4"));
}

#[tokio::test]
async fn evicting_queue_for_state_posts_notice() {
    let harness = Harness::with_backend(Arc::new(MemoryStorage::with_quota(1500)));
    harness.engine.restore().await;
    harness.engine.play_track(track("a")).await;
    for i in 0..10 {
        harness.engine.add_to_queue(track(&format!("q{i}")));
    }
    assert_eq!(harness.engine.queue_snapshot().len(), 10);

    harness
        .engine
        .set_library(tracks(&["l0", "l1", "l2", "l3", "l4", "l5"]));

    assert_eq!(harness.state().library.len(), 6);
    assert!(harness.engine.queue_snapshot().is_empty());
    assert!(harness.notices.drain().contains(&Notice::QueueDropped));
}

#[test]
fn oversized_selected_context_is_compacted() {
    let store = SharedStore::new(Arc::new(MemoryStorage::with_quota(256 * 1024)));
    let ids: Vec<String> = (0..10_000).map(|i| format!("t{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let big = context("big", &refs);

    let outcome = store.write(keys::SELECTED_PLAYLIST, &Some(big));

    assert_eq!(outcome, WriteOutcome::Compacted);
    let stored: Option<tempo_core::PlaylistContext> = store.read(keys::SELECTED_PLAYLIST, None);
    assert_eq!(stored.unwrap().tracks.len(), 500);
}
