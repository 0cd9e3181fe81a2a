use super::*;
use crate::media::state::SourcePair;

const V: ElementId = ElementId(10);

fn lifecycle(policy: ResumePolicy) -> MediaLifecycle {
    let videos = vec![VideoDesc {
        id: V,
        sources: SourcePair {
            webm: Some("clip.webm".into()),
            mp4: Some("clip.mp4".into()),
        },
    }];
    let cfg = MediaConfig {
        resume_policy: policy,
        ..MediaConfig::default()
    };
    let (lc, ops) = MediaLifecycle::new(&videos, &cfg);
    assert_eq!(ops, vec![MediaOp::AssertAutoplay { target: V }]);
    lc
}

fn entry(on: bool) -> IntersectionEntry {
    IntersectionEntry {
        target: V,
        is_intersecting: on,
        ratio: if on { 1.0 } else { 0.0 },
    }
}

fn plays(ops: &[MediaOp]) -> usize {
    ops.iter()
        .filter(|op| matches!(op, MediaOp::Play { .. }))
        .count()
}

fn playing(policy: ResumePolicy) -> MediaLifecycle {
    let mut lc = lifecycle(policy);
    lc.on_playback_entry(&entry(true));
    lc.on_media_event(V, MediaEvent::CanPlay);
    lc.on_media_event(V, MediaEvent::Playing);
    lc
}

#[test]
fn entering_view_attaches_then_plays_when_ready() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    let ops = lc.on_playback_entry(&entry(true));
    assert!(ops.contains(&MediaOp::Load { target: V }));
    assert_eq!(plays(&ops), 0);
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Loading);

    let ops = lc.on_media_event(V, MediaEvent::CanPlay);
    assert_eq!(
        ops,
        vec![
            MediaOp::AssertAutoplay { target: V },
            MediaOp::Play { target: V }
        ]
    );
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Ready);

    // `loadeddata` after `canplay` must not start a second attempt.
    assert!(lc.on_media_event(V, MediaEvent::LoadedData).is_empty());

    lc.on_media_event(V, MediaEvent::Playing);
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Playing);
}

#[test]
fn ready_while_out_of_view_does_not_play() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    lc.on_playback_entry(&entry(true));
    lc.on_playback_entry(&entry(false));
    let ops = lc.on_media_event(V, MediaEvent::CanPlay);
    assert_eq!(plays(&ops), 0);
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Ready);
}

#[test]
fn leaving_view_pauses_immediately() {
    let mut lc = playing(ResumePolicy::Resume);
    let ops = lc.on_playback_entry(&entry(false));
    assert_eq!(ops, vec![MediaOp::Pause { target: V }]);
    let el = lc.element(V).unwrap();
    assert_eq!(el.state, PlaybackState::Paused);
    assert!(!el.in_view);
}

#[test]
fn resume_policy_keeps_position() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_media_event(V, MediaEvent::TimeUpdate { time: 4.5 });
    lc.on_playback_entry(&entry(false));
    let ops = lc.on_playback_entry(&entry(true));
    assert!(!ops.iter().any(|op| matches!(op, MediaOp::Seek { .. })));
    assert_eq!(plays(&ops), 1);
    assert_eq!(lc.element(V).unwrap().current_time, 4.5);
}

#[test]
fn restart_policy_rewinds_before_replay() {
    let mut lc = playing(ResumePolicy::Restart);
    lc.on_media_event(V, MediaEvent::TimeUpdate { time: 4.5 });
    lc.on_playback_entry(&entry(false));
    let ops = lc.on_playback_entry(&entry(true));
    assert_eq!(ops[0], MediaOp::Seek { target: V, to: 0.0 });
    assert_eq!(plays(&ops), 1);
    assert_eq!(lc.element(V).unwrap().current_time, 0.0);
}

#[test]
fn ended_video_always_rewinds() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_media_event(V, MediaEvent::TimeUpdate { time: 9.0 });
    lc.on_media_event(V, MediaEvent::Ended);
    lc.on_playback_entry(&entry(false));
    let ops = lc.on_playback_entry(&entry(true));
    assert_eq!(ops[0], MediaOp::Seek { target: V, to: 0.0 });
}

#[test]
fn rejected_play_retries_exactly_once() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    lc.on_playback_entry(&entry(true));
    lc.on_media_event(V, MediaEvent::CanPlay);

    let ops = lc.on_media_event(V, MediaEvent::PlayRejected);
    assert_eq!(
        ops,
        vec![
            MediaOp::AssertAutoplay { target: V },
            MediaOp::Play { target: V }
        ]
    );
    assert!(lc.on_media_event(V, MediaEvent::PlayRejected).is_empty());
    assert!(lc.on_media_event(V, MediaEvent::PlayRejected).is_empty());
}

#[test]
fn stalled_then_playing_leaves_the_set_before_the_next_tick() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_timer(0.0);
    lc.on_media_event(V, MediaEvent::Stalled);
    assert!(lc.stalled().contains(V));
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Stalled);

    lc.on_media_event(V, MediaEvent::Playing);
    assert!(!lc.stalled().contains(V));
    assert!(lc.on_timer(3000.0).is_empty());
}

#[test]
fn stall_recovery_reloads_in_view_and_plays_on_canplay() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_timer(0.0);
    lc.on_media_event(V, MediaEvent::Error);

    assert!(lc.on_timer(1000.0).is_empty());
    let ops = lc.on_timer(3000.0);
    assert_eq!(
        ops,
        vec![
            MediaOp::AssertAutoplay { target: V },
            MediaOp::Load { target: V }
        ]
    );
    assert!(lc.stalled().contains(V));

    let ops = lc.on_media_event(V, MediaEvent::CanPlay);
    assert_eq!(plays(&ops), 1);
    assert!(lc.stalled().is_empty());
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Ready);
}

#[test]
fn stalls_are_retried_every_period_while_in_view() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_timer(0.0);
    lc.on_media_event(V, MediaEvent::Stalled);
    assert_eq!(lc.on_timer(3000.0).len(), 2);
    assert_eq!(lc.on_timer(6000.0).len(), 2);
    assert_eq!(lc.on_timer(9000.0).len(), 2);
}

#[test]
fn off_screen_stalls_are_left_alone() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_timer(0.0);
    lc.on_media_event(V, MediaEvent::Stalled);
    lc.on_playback_entry(&entry(false));
    assert!(lc.on_timer(3000.0).is_empty());
    assert!(lc.stalled().contains(V));
}

#[test]
fn recovery_canplay_after_leaving_view_stays_paused() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_timer(0.0);
    lc.on_media_event(V, MediaEvent::Stalled);
    assert_eq!(lc.on_timer(3000.0).len(), 2);
    assert_eq!(
        lc.on_playback_entry(&entry(false)),
        vec![MediaOp::Pause { target: V }]
    );

    let ops = lc.on_media_event(V, MediaEvent::CanPlay);
    assert_eq!(plays(&ops), 0);
    assert!(lc.stalled().is_empty());
    assert_eq!(lc.element(V).unwrap().state, PlaybackState::Ready);

    // Coming back still plays.
    assert_eq!(plays(&lc.on_playback_entry(&entry(true))), 1);
}

#[test]
fn rejection_after_leaving_view_is_not_retried() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    lc.on_playback_entry(&entry(true));
    assert_eq!(plays(&lc.on_media_event(V, MediaEvent::CanPlay)), 1);
    lc.on_playback_entry(&entry(false));

    assert!(lc.on_media_event(V, MediaEvent::PlayRejected).is_empty());
    assert_eq!(lc.element(V).unwrap().attempt, PlayAttempt::Idle);

    // A fresh entry gets its own retry.
    lc.on_playback_entry(&entry(true));
    assert_eq!(plays(&lc.on_media_event(V, MediaEvent::PlayRejected)), 1);
}

#[test]
fn preload_errors_are_not_tracked() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    lc.on_preload_entry(&entry(true));
    lc.on_media_event(V, MediaEvent::Error);
    assert!(lc.stalled().is_empty());
}

#[test]
fn preloaded_with_metadata_plays_on_entry_without_reloading() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    let ops = lc.on_preload_entry(&entry(true));
    assert!(ops.contains(&MediaOp::Load { target: V }));
    lc.on_media_event(V, MediaEvent::LoadedMetadata);

    let ops = lc.on_playback_entry(&entry(true));
    assert!(!ops.iter().any(|op| matches!(
        op,
        MediaOp::Load { .. } | MediaOp::AppendSource { .. }
    )));
    assert_eq!(plays(&ops), 1);
}

#[test]
fn preloaded_without_metadata_waits_for_ready() {
    let mut lc = lifecycle(ResumePolicy::Resume);
    lc.on_preload_entry(&entry(true));
    let ops = lc.on_playback_entry(&entry(true));
    assert_eq!(plays(&ops), 0);
    let ops = lc.on_media_event(V, MediaEvent::LoadedData);
    assert_eq!(plays(&ops), 1);
}

#[test]
fn user_gesture_is_one_shot() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_media_event(V, MediaEvent::Pause);
    let ops = lc.on_user_gesture();
    assert_eq!(plays(&ops), 1);
    assert!(!lc.is_gesture_armed());
    assert!(lc.on_user_gesture().is_empty());
}

#[test]
fn visibility_return_replays_paused_in_view() {
    let mut lc = playing(ResumePolicy::Resume);
    lc.on_media_event(V, MediaEvent::Pause);
    assert!(lc.on_visibility_change(true).is_empty());
    assert_eq!(plays(&lc.on_visibility_change(false)), 1);
}
