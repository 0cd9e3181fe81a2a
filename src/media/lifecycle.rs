use std::collections::BTreeMap;

use crate::{
    config::{MediaConfig, ResumePolicy},
    foundation::core::ElementId,
    media::{
        loader::{AttachOutcome, attach, preload},
        stall::{StallMonitor, StalledSet},
        state::{MediaElement, MediaEvent, MediaOp, PlayAttempt, PlaybackState, ReadyState},
    },
    observe::IntersectionEntry,
    registry::VideoDesc,
};

/// Owns every lazy video and decides when to load, play, pause and recover it.
#[derive(Debug)]
pub struct MediaLifecycle {
    elements: BTreeMap<ElementId, MediaElement>,
    stalled: StalledSet,
    monitor: StallMonitor,
    policy: ResumePolicy,
    gesture_armed: bool,
}

impl MediaLifecycle {
    /// Register the page's videos. The returned ops mute every element up front.
    pub fn new(videos: &[VideoDesc], cfg: &MediaConfig) -> (Self, Vec<MediaOp>) {
        let mut ops = Vec::with_capacity(videos.len());
        let elements = videos
            .iter()
            .map(|v| {
                ops.push(MediaOp::AssertAutoplay { target: v.id });
                (v.id, MediaElement::new(v.id, v.sources.clone()))
            })
            .collect();
        let lifecycle = Self {
            elements,
            stalled: StalledSet::default(),
            monitor: StallMonitor::new(cfg.stall_interval_ms),
            policy: cfg.resume_policy,
            gesture_armed: true,
        };
        (lifecycle, ops)
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.keys().copied()
    }

    pub fn element(&self, id: ElementId) -> Option<&MediaElement> {
        self.elements.get(&id)
    }

    pub fn stalled(&self) -> &StalledSet {
        &self.stalled
    }

    pub fn is_gesture_armed(&self) -> bool {
        self.gesture_armed
    }

    /// Entry from the wide preload margin. Hosts observe these once.
    pub fn on_preload_entry(&mut self, entry: &IntersectionEntry) -> Vec<MediaOp> {
        let mut ops = Vec::new();
        if !entry.is_intersecting {
            return ops;
        }
        if let Some(el) = self.elements.get_mut(&entry.target) {
            preload(el, &mut ops);
        }
        ops
    }

    /// Entry from the playback margin: attach, play or pause.
    pub fn on_playback_entry(&mut self, entry: &IntersectionEntry) -> Vec<MediaOp> {
        let mut ops = Vec::new();
        let policy = self.policy;
        let Some(el) = self.elements.get_mut(&entry.target) else {
            return ops;
        };

        if entry.is_intersecting {
            el.in_view = true;
            if !el.loaded() {
                Self::load_for_playback(el, &mut self.stalled, &mut ops);
            } else if el.paused {
                if el.ended || (policy == ResumePolicy::Restart && el.current_time > 0.0) {
                    ops.push(MediaOp::Seek {
                        target: el.id,
                        to: 0.0,
                    });
                    el.current_time = 0.0;
                    el.ended = false;
                }
                try_play(el, &mut ops);
            }
        } else {
            el.in_view = false;
            if el.loaded() {
                ops.push(MediaOp::Pause { target: el.id });
                el.paused = true;
                if el.state == PlaybackState::Playing {
                    el.state = PlaybackState::Paused;
                }
                tracing::trace!(target_id = el.id.0, "left playback margin");
            }
        }
        ops
    }

    /// A preloaded element only needs metadata to count as ready here;
    /// fresh attachments wait for `canplay`.
    fn load_for_playback(el: &mut MediaElement, stalled: &mut StalledSet, ops: &mut Vec<MediaOp>) {
        match attach(el, ops) {
            AttachOutcome::AlreadyAttached => {}
            AttachOutcome::ReusedPreload if el.ready_state >= ReadyState::Metadata => {
                become_ready(el, stalled, ops);
            }
            AttachOutcome::ReusedPreload | AttachOutcome::Fresh => {
                if el.ready_state >= ReadyState::FutureData {
                    become_ready(el, stalled, ops);
                } else {
                    el.awaiting_ready = true;
                }
            }
        }
    }

    #[tracing::instrument(level = "trace", skip(self), fields(target_id = target.0))]
    pub fn on_media_event(&mut self, target: ElementId, event: MediaEvent) -> Vec<MediaOp> {
        let mut ops = Vec::new();
        let Some(el) = self.elements.get_mut(&target) else {
            return ops;
        };

        match event {
            MediaEvent::LoadedMetadata => el.raise_ready(ReadyState::Metadata),
            MediaEvent::LoadedData => {
                el.raise_ready(ReadyState::CurrentData);
                if el.awaiting_ready {
                    become_ready(el, &mut self.stalled, &mut ops);
                }
            }
            MediaEvent::CanPlay => {
                el.raise_ready(ReadyState::FutureData);
                if el.recovery_armed {
                    el.recovery_armed = false;
                    tracing::debug!(target_id = el.id.0, "recovered from stall");
                    become_ready(el, &mut self.stalled, &mut ops);
                } else if el.awaiting_ready {
                    become_ready(el, &mut self.stalled, &mut ops);
                }
            }
            MediaEvent::Playing => {
                self.stalled.remove(el.id);
                el.paused = false;
                el.ended = false;
                el.attempt = PlayAttempt::Idle;
                el.state = PlaybackState::Playing;
            }
            MediaEvent::Pause => {
                el.paused = true;
                if el.state == PlaybackState::Playing {
                    el.state = PlaybackState::Paused;
                }
            }
            MediaEvent::Ended => {
                el.ended = true;
                el.paused = true;
                if el.state == PlaybackState::Playing {
                    el.state = PlaybackState::Paused;
                }
            }
            // Stall tracking starts once the playback path owns the element.
            MediaEvent::Stalled | MediaEvent::Error if el.loaded() => {
                if self.stalled.insert(el.id) {
                    tracing::debug!(target_id = el.id.0, ?event, "media stalled");
                }
                el.state = PlaybackState::Stalled;
            }
            MediaEvent::Stalled | MediaEvent::Error => {}
            MediaEvent::PlayRejected => match el.attempt {
                // The exit pause aborts a pending play; no retry off-screen.
                PlayAttempt::First if !el.in_view => el.attempt = PlayAttempt::Idle,
                PlayAttempt::First => {
                    el.attempt = PlayAttempt::Retried;
                    ops.push(MediaOp::AssertAutoplay { target: el.id });
                    ops.push(MediaOp::Play { target: el.id });
                }
                PlayAttempt::Retried | PlayAttempt::Idle => {
                    el.attempt = PlayAttempt::Idle;
                    tracing::debug!(target_id = el.id.0, "play rejected twice, giving up");
                }
            },
            MediaEvent::TimeUpdate { time } => {
                if time.is_finite() {
                    el.current_time = time.max(0.0);
                }
            }
        }
        ops
    }

    /// Periodic host timer. Runs the stall sweep when a period has elapsed.
    pub fn on_timer(&mut self, now_ms: f64) -> Vec<MediaOp> {
        if !self.monitor.due(now_ms) {
            return Vec::new();
        }
        self.recover_stalled()
    }

    /// Force a reload of every stalled element that is in view.
    /// Off-screen stalls are left alone until they re-enter.
    pub fn recover_stalled(&mut self) -> Vec<MediaOp> {
        let mut ops = Vec::new();
        if self.stalled.is_empty() {
            return ops;
        }
        for id in self.stalled.snapshot() {
            let Some(el) = self.elements.get_mut(&id) else {
                self.stalled.remove(id);
                continue;
            };
            if !el.in_view {
                continue;
            }
            ops.push(MediaOp::AssertAutoplay { target: id });
            ops.push(MediaOp::Load { target: id });
            el.recovery_armed = true;
            el.ready_state = ReadyState::Nothing;
            tracing::debug!(target_id = id.0, "reloading stalled media");
        }
        ops
    }

    /// First click/touch/scroll on the page: a real gesture can unlock
    /// playback that scripted attempts could not. Fires once.
    pub fn on_user_gesture(&mut self) -> Vec<MediaOp> {
        if !std::mem::replace(&mut self.gesture_armed, false) {
            return Vec::new();
        }
        let mut ops = self.replay_paused_in_view();
        ops.extend(self.recover_stalled());
        ops
    }

    pub fn on_visibility_change(&mut self, hidden: bool) -> Vec<MediaOp> {
        if hidden {
            return Vec::new();
        }
        self.replay_paused_in_view()
    }

    fn replay_paused_in_view(&mut self) -> Vec<MediaOp> {
        let mut ops = Vec::new();
        for el in self.elements.values_mut() {
            if el.loaded() && el.in_view && el.paused {
                try_play(el, &mut ops);
            }
        }
        ops
    }
}

fn become_ready(el: &mut MediaElement, stalled: &mut StalledSet, ops: &mut Vec<MediaOp>) {
    el.awaiting_ready = false;
    stalled.remove(el.id);
    el.state = PlaybackState::Ready;
    if el.in_view {
        try_play(el, ops);
    }
}

/// Mute attributes are re-asserted before every attempt; one automatic retry.
fn try_play(el: &mut MediaElement, ops: &mut Vec<MediaOp>) {
    ops.push(MediaOp::AssertAutoplay { target: el.id });
    ops.push(MediaOp::Play { target: el.id });
    el.attempt = PlayAttempt::First;
}

#[cfg(test)]
#[path = "../../tests/unit/media/lifecycle.rs"]
mod tests;
