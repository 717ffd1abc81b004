use crate::{
    DeviceOperation, ErrorKind, Listener, RecordingId, SessionMode, SessionState, SessionUpdate,
    tests::support::{DeviceCall, Harness, ScriptedDevice, ScriptedPermission},
};

/// WHAT: Playing a cataloged recording binds the device to it
/// WHY: The snapshot is what the presentation layer highlights
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_cataloged_recording_when_beginning_playback_then_playing_that_recording() {
    // Given: One recording at rec1.m4a
    let h = Harness::with(
        ScriptedDevice::new().with_recorder_paths(&["rec1.m4a"]),
        ScriptedPermission::granting(),
    );
    let id = h.record_clip().await;

    // When: Playing it
    h.manager.begin_playback(id).await.unwrap();

    // Then: Playing that id, with the player pointed at its path
    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.mode, SessionMode::Playing);
    assert_eq!(snapshot.recording_id_if_playing, Some(id));
    assert_eq!(h.manager.current_recording_id(), Some(id));
    assert!(
        h.device
            .calls()
            .contains(&DeviceCall::StartPlayer("rec1.m4a".to_string()))
    );
    h.assert_listeners_settled();
}

/// WHAT: An unknown id is refused without touching the device
/// WHY: Playback must only ever target a cataloged recording
#[tokio::test]
async fn given_unknown_id_when_beginning_playback_then_not_found_and_idle() {
    // Given: An empty catalog
    let h = Harness::new();
    let unknown = RecordingId::new();

    // When: Playing an id that was never cataloged
    let result = h.manager.begin_playback(unknown).await;

    // Then: NotFound, idle, nothing asked of the device
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::NotFound));
    assert_eq!(h.manager.state(), SessionState::Idle);
    assert!(h.device.calls().is_empty());
}

/// WHAT: Busy recording outranks an unknown id
/// WHY: The device check comes before the catalog lookup
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_beginning_playback_of_unknown_id_then_busy_recording() {
    // Given: A recording in progress
    let h = Harness::new();
    h.manager.begin_recording().await.unwrap();
    let calls_before = h.device.calls().len();

    // When: Playing an unknown id
    let result = h.manager.begin_playback(RecordingId::new()).await;

    // Then: BusyRecording and no device traffic
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::BusyRecording));
    assert_eq!(h.manager.mode(), SessionMode::Recording);
    assert_eq!(h.device.calls().len(), calls_before);
}

/// WHAT: Switching recordings stops the old playback before starting the new one
/// WHY: Two playbacks must never be active at once
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_a_when_beginning_playback_of_b_then_stop_precedes_start() {
    // Given: Two recordings, A playing
    let h = Harness::with(
        ScriptedDevice::new().with_recorder_paths(&["a.m4a", "b.m4a"]),
        ScriptedPermission::granting(),
    );
    let a = h.record_clip().await;
    let b = h.record_clip().await;
    h.manager.begin_playback(a).await.unwrap();

    // When: Switching to B
    h.manager.begin_playback(b).await.unwrap();

    // Then: stop(A) strictly before start(B), never overlapping
    let calls = h.device.device_calls();
    let tail = &calls[calls.len() - 3..];
    assert_eq!(
        tail,
        &[
            DeviceCall::StartPlayer("a.m4a".to_string()),
            DeviceCall::StopPlayer,
            DeviceCall::StartPlayer("b.m4a".to_string()),
        ]
    );
    assert_eq!(h.device.max_in_flight(), 1);
    assert_eq!(h.manager.current_recording_id(), Some(b));
    h.assert_listeners_settled();
}

/// WHAT: Replaying the same recording restarts it
/// WHY: Selecting the current row again rewinds rather than erroring
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_a_when_beginning_playback_of_a_again_then_restarted() {
    // Given: A playing
    let h = Harness::new();
    let a = h.record_clip().await;
    let first = h.manager.begin_playback(a).await.unwrap();

    // When: Playing A again
    let second = h.manager.begin_playback(a).await.unwrap();

    // Then: A new session for the same recording
    assert_ne!(first, second);
    assert_eq!(h.manager.current_recording_id(), Some(a));
    assert_eq!(h.manager.state().session_id(), Some(second));
    let starts = h
        .device
        .device_calls()
        .into_iter()
        .filter(|c| matches!(c, DeviceCall::StartPlayer(_)))
        .count();
    assert_eq!(starts, 2);
    h.assert_listeners_settled();
}

/// WHAT: A failed player start leaves the session idle with no listeners
/// WHY: The playback listeners attached for the attempt must not leak
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_start_player_fails_when_beginning_playback_then_idle_without_listeners() {
    // Given: A recording and a failing player
    let h = Harness::new();
    let id = h.record_clip().await;
    h.device.fail(DeviceOperation::StartPlayer);

    // When: Playing it
    let result = h.manager.begin_playback(id).await;

    // Then: DeviceFailure, idle, nothing attached
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::DeviceFailure));
    assert_eq!(h.manager.state(), SessionState::Idle);
    assert!(h.manager.attached_listeners().is_empty());
    h.assert_listeners_settled();
}

/// WHAT: A failed stop while switching ends idle and never starts the new clip
/// WHY: Starting B over a player that may still hold A would double-bind
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stop_player_fails_when_switching_then_idle_and_b_never_started() {
    // Given: A playing, stop will fail
    let h = Harness::with(
        ScriptedDevice::new().with_recorder_paths(&["a.m4a", "b.m4a"]),
        ScriptedPermission::granting(),
    );
    let a = h.record_clip().await;
    let b = h.record_clip().await;
    h.manager.begin_playback(a).await.unwrap();
    h.device.fail(DeviceOperation::StopPlayer);

    // When: Switching to B
    let result = h.manager.begin_playback(b).await;

    // Then: DeviceFailure, idle, B never started
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::DeviceFailure));
    assert_eq!(h.manager.state(), SessionState::Idle);
    assert!(
        !h.device
            .calls()
            .contains(&DeviceCall::StartPlayer("b.m4a".to_string()))
    );
    h.assert_listeners_settled();
}

/// WHAT: Ending playback stops the player and returns to idle
/// WHY: The user can always interrupt playback
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_when_ending_playback_then_idle_and_listeners_detached() {
    // Given: A playback in progress
    let h = Harness::new();
    let id = h.record_clip().await;
    h.manager.begin_playback(id).await.unwrap();

    // When: Ending it
    h.manager.end_playback().await.unwrap();

    // Then: Idle, player stopped, listeners gone
    assert_eq!(h.manager.state(), SessionState::Idle);
    assert_eq!(h.device.device_calls().last(), Some(&DeviceCall::StopPlayer));
    h.assert_listeners_settled();
}

/// WHAT: A failed player stop still lands idle
/// WHY: The session must never be left half bound
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stop_player_fails_when_ending_playback_then_device_failure_and_idle() {
    // Given: A playback whose stop will fail
    let h = Harness::new();
    let id = h.record_clip().await;
    h.manager.begin_playback(id).await.unwrap();
    h.device.fail(DeviceOperation::StopPlayer);

    // When: Ending it
    let result = h.manager.end_playback().await;

    // Then: DeviceFailure, but idle with nothing attached
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::DeviceFailure));
    assert_eq!(h.manager.state(), SessionState::Idle);
    h.assert_listeners_settled();
}

/// WHAT: Ending playback while idle does nothing
/// WHY: A stray stop must not reach the device
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_when_ending_playback_then_noop() {
    // Given: An idle session
    let h = Harness::new();

    // When: Ending playback
    h.manager.end_playback().await.unwrap();

    // Then: No device traffic
    assert!(h.device.calls().is_empty());
}

/// WHAT: Ending playback while recording leaves the recording alone
/// WHY: A stop for the other mode must not interrupt capture
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_ending_playback_then_recording_continues() {
    // Given: A recording in progress
    let h = Harness::new();
    h.manager.begin_recording().await.unwrap();
    let before = h.manager.state();

    // When: Ending playback
    h.manager.end_playback().await.unwrap();

    // Then: Still recording the same session
    assert_eq!(h.manager.state(), before);
    h.assert_listeners_settled();
}

/// WHAT: Switching publishes only the final Playing snapshot
/// WHY: Observers should not flash through Idle on a switch
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_a_when_switching_to_b_then_single_state_change_for_b() {
    // Given: A playing and an observer subscribed afterwards
    let h = Harness::new();
    let a = h.record_clip().await;
    let b = h.record_clip().await;
    h.manager.begin_playback(a).await.unwrap();
    let mut updates = h.manager.subscribe();

    // When: Switching to B
    h.manager.begin_playback(b).await.unwrap();

    // Then: One state change naming B
    let update = updates.recv().await.unwrap();
    assert!(matches!(
        update,
        SessionUpdate::StateChanged(s) if s.recording_id_if_playing == Some(b)
    ));
    assert!(updates.try_recv().is_err());
}

/// WHAT: Playback attaches progress and finished listeners before starting
/// WHY: A short clip may finish before start returns
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_when_beginning_playback_then_listeners_attached_before_player_starts() {
    // Given: One recording
    let h = Harness::with(
        ScriptedDevice::new().with_recorder_paths(&["rec1.m4a"]),
        ScriptedPermission::granting(),
    );
    let id = h.record_clip().await;
    let offset = h.device.calls().len();

    // When: Playing it
    h.manager.begin_playback(id).await.unwrap();

    // Then: Both subscriptions precede the start call
    let calls = h.device.calls();
    let playback_calls: Vec<_> = calls[offset..]
        .iter()
        .filter(|c| !matches!(c, DeviceCall::SetMeteringInterval(_)))
        .cloned()
        .collect();
    assert_eq!(
        playback_calls,
        vec![
            DeviceCall::Subscribe(Listener::PlaybackProgress),
            DeviceCall::Subscribe(Listener::PlaybackFinished),
            DeviceCall::StartPlayer("rec1.m4a".to_string()),
        ]
    );
}
