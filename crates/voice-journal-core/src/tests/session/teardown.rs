use crate::{
    DeviceOperation, SessionMode, SessionState, SessionUpdate,
    tests::support::{DeviceCall, Harness, ScriptedDevice},
};

use std::sync::Arc;

/// WHAT: Shutdown while recording stops the recorder and drops the clip
/// WHY: An interrupted recording is not a finished journal entry
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_shutdown_then_recorder_stopped_and_nothing_cataloged() {
    // Given: A recording in progress
    let h = Harness::new();
    h.manager.begin_recording().await.unwrap();

    // When: Shutting down
    h.manager.shutdown().await;

    // Then: Stopped, idle, nothing cataloged
    assert_eq!(
        h.device.device_calls(),
        vec![DeviceCall::StartRecorder, DeviceCall::StopRecorder]
    );
    assert_eq!(h.manager.state(), SessionState::Idle);
    assert!(h.catalog.is_empty());
    h.assert_listeners_settled();
}

/// WHAT: Shutdown while playing stops the player
/// WHY: Audio must not keep playing after the session is gone
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_when_shutdown_then_player_stopped() {
    // Given: A playback in progress and an observer
    let h = Harness::new();
    let id = h.record_clip().await;
    h.manager.begin_playback(id).await.unwrap();
    let mut updates = h.manager.subscribe();

    // When: Shutting down
    h.manager.shutdown().await;

    // Then: Player stopped, idle, observers told
    assert_eq!(h.device.device_calls().last(), Some(&DeviceCall::StopPlayer));
    assert_eq!(h.manager.state(), SessionState::Idle);
    h.assert_listeners_settled();
    assert!(matches!(
        updates.recv().await.unwrap(),
        SessionUpdate::StateChanged(s) if s.mode == SessionMode::Idle
    ));
}

/// WHAT: A failing stop during shutdown is swallowed
/// WHY: Teardown is best-effort and must always finish
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stop_fails_when_shutdown_then_still_idle() {
    // Given: A recording whose stop will fail
    let h = Harness::new();
    h.manager.begin_recording().await.unwrap();
    h.device.fail(DeviceOperation::StopRecorder);

    // When: Shutting down
    h.manager.shutdown().await;

    // Then: Idle with nothing attached
    assert_eq!(h.manager.state(), SessionState::Idle);
    h.assert_listeners_settled();
}

/// WHAT: Shutdown when idle touches nothing
/// WHY: Quitting an idle journal should be instant
#[tokio::test]
async fn given_idle_when_shutdown_then_no_device_calls() {
    // Given: An idle session
    let h = Harness::new();

    // When: Shutting down twice
    h.manager.shutdown().await;
    h.manager.shutdown().await;

    // Then: The device was never called
    assert!(h.device.calls().is_empty());
}

/// WHAT: Shutdown during a pending start waits, then tears it down
/// WHY: A start completing after teardown would leave the device bound
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_start_pending_when_shutdown_then_runs_after_start_and_stops() {
    // Given: A recorder start held open
    let h = Harness::new();
    let release = h.device.hold_next_start();
    let manager = Arc::clone(&h.manager);
    let begin = tokio::spawn(async move { manager.begin_recording().await });
    while !h.manager.is_busy() {
        tokio::task::yield_now().await;
    }

    // When: Shutting down while it is pending
    let manager = Arc::clone(&h.manager);
    let shutdown = tokio::spawn(async move { manager.shutdown().await });
    tokio::task::yield_now().await;
    release.notify_one();
    begin.await.unwrap().unwrap();
    shutdown.await.unwrap();

    // Then: Start, then stop, and idle
    assert_eq!(
        h.device.device_calls(),
        vec![DeviceCall::StartRecorder, DeviceCall::StopRecorder]
    );
    assert_eq!(h.manager.state(), SessionState::Idle);
    h.assert_listeners_settled();
}

/// WHAT: Dropping an active manager detaches its listeners
/// WHY: The device may outlive the manager and must not call into it
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_when_manager_dropped_then_device_has_no_subscriptions() {
    // Given: A playback in progress
    let h = Harness::new();
    let id = h.record_clip().await;
    h.manager.begin_playback(id).await.unwrap();
    let device = Arc::clone(&h.device);

    // When: Dropping the manager without shutdown
    drop(h);

    // Then: Nothing is left subscribed
    assert!(device.subscribed().is_empty());
}

async fn until_last_call(device: &ScriptedDevice, call: &DeviceCall) -> bool {
    for _ in 0..16 {
        if device.device_calls().last() == Some(call) {
            return true;
        }
        tokio::task::yield_now().await;
    }
    false
}

/// WHAT: Dropping a recording manager still stops the recorder
/// WHY: The microphone must not stay open after its owner is gone
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_manager_dropped_then_recorder_stopped() {
    // Given: A recording in progress
    let h = Harness::new();
    h.manager.begin_recording().await.unwrap();
    let device = Arc::clone(&h.device);

    // When: Dropping the manager without shutdown
    drop(h);

    // Then: A stop reaches the device
    assert!(until_last_call(&device, &DeviceCall::StopRecorder).await);
    assert!(device.subscribed().is_empty());
}

/// WHAT: Dropping a playing manager still stops the player
/// WHY: Audio must not keep playing after its owner is gone
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_when_manager_dropped_then_player_stopped() {
    // Given: A playback in progress
    let h = Harness::new();
    let id = h.record_clip().await;
    h.manager.begin_playback(id).await.unwrap();
    let device = Arc::clone(&h.device);

    // When: Dropping the manager without shutdown
    drop(h);

    // Then: A stop reaches the device
    assert!(until_last_call(&device, &DeviceCall::StopPlayer).await);
}

/// WHAT: Dropping an idle manager issues no device calls
/// WHY: Nothing is running, so nothing needs stopping
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_when_manager_dropped_then_no_stop_issued() {
    // Given: An idle manager
    let h = Harness::new();
    let device = Arc::clone(&h.device);

    // When: Dropping it
    drop(h);
    tokio::task::yield_now().await;

    // Then: The device was never called
    assert!(device.device_calls().is_empty());
}
