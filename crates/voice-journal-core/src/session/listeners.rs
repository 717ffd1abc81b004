use crate::{
    AudioDevice, PlaybackFinishedHandler, PlaybackProgressHandler, RecordProgressHandler,
    SessionState,
};

use std::collections::BTreeSet;

use tracing::{debug, trace};

/// A device event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Listener {
    /// Record-progress ticks.
    RecordProgress,
    /// Playback-progress ticks.
    PlaybackProgress,
    /// Playback-finished notification.
    PlaybackFinished,
}

impl Listener {
    /// Subscriptions a settled session in `state` must have attached.
    pub fn required_by(state: &SessionState) -> &'static [Listener] {
        match state {
            SessionState::Idle => &[],
            SessionState::Recording { .. } => &[Listener::RecordProgress],
            SessionState::Playing { .. } => {
                &[Listener::PlaybackProgress, Listener::PlaybackFinished]
            }
        }
    }
}

/// Subscriptions currently attached to the device.
///
/// Every subscribe/unsubscribe on the device goes through here, so the set
/// always mirrors what the device holds. Attaching a listener that is
/// already attached replaces the handler instead of stacking a duplicate.
#[derive(Debug, Default)]
pub(crate) struct ListenerSet {
    attached: BTreeSet<Listener>,
}

impl ListenerSet {
    pub(crate) fn attach_record_progress(
        &mut self,
        device: &dyn AudioDevice,
        handler: RecordProgressHandler,
    ) {
        self.detach(device, Listener::RecordProgress);
        device.subscribe_record_progress(handler);
        self.attached.insert(Listener::RecordProgress);
        trace!("Record-progress listener attached");
    }

    pub(crate) fn attach_playback(
        &mut self,
        device: &dyn AudioDevice,
        progress: PlaybackProgressHandler,
        finished: PlaybackFinishedHandler,
    ) {
        self.detach_playback(device);
        device.subscribe_playback_progress(progress);
        self.attached.insert(Listener::PlaybackProgress);
        device.subscribe_playback_finished(finished);
        self.attached.insert(Listener::PlaybackFinished);
        trace!("Playback listeners attached");
    }

    pub(crate) fn detach(&mut self, device: &dyn AudioDevice, listener: Listener) {
        if !self.attached.remove(&listener) {
            return;
        }
        match listener {
            Listener::RecordProgress => device.unsubscribe_record_progress(),
            Listener::PlaybackProgress => device.unsubscribe_playback_progress(),
            Listener::PlaybackFinished => device.unsubscribe_playback_finished(),
        }
        trace!(?listener, "Listener detached");
    }

    pub(crate) fn detach_playback(&mut self, device: &dyn AudioDevice) {
        self.detach(device, Listener::PlaybackProgress);
        self.detach(device, Listener::PlaybackFinished);
    }

    pub(crate) fn detach_all(&mut self, device: &dyn AudioDevice) {
        let attached: Vec<Listener> = self.attached.iter().copied().collect();
        for listener in attached {
            self.detach(device, listener);
        }
        debug!("All listeners detached");
    }

    pub(crate) fn attached(&self) -> Vec<Listener> {
        self.attached.iter().copied().collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}
