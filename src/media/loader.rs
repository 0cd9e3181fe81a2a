use crate::media::state::{Attachment, MediaElement, MediaOp, PlaybackState};

/// Result of [`attach`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Sources were already owned by the playback path.
    AlreadyAttached,
    /// Sources were appended and a load was requested.
    Fresh,
    /// Sources from the eager path were reused; nothing appended, no reload.
    ReusedPreload,
}

fn append_sources(el: &MediaElement, ops: &mut Vec<MediaOp>) {
    for (kind, url) in el.sources.descriptors() {
        ops.push(MediaOp::AppendSource {
            target: el.id,
            kind,
            url: url.to_string(),
        });
    }
}

/// Eager near-viewport path: attach sources and start buffering before the
/// element is play-eligible. No-op once loaded or already preloading.
pub fn preload(el: &mut MediaElement, ops: &mut Vec<MediaOp>) -> bool {
    if el.attachment != Attachment::None {
        return false;
    }
    el.attachment = Attachment::Preloaded;
    ops.push(MediaOp::AssertAutoplay { target: el.id });
    append_sources(el, ops);
    ops.push(MediaOp::SetPreloadAuto { target: el.id });
    ops.push(MediaOp::Load { target: el.id });
    tracing::trace!(target_id = el.id.0, "preload sources");
    true
}

/// Playback path: take ownership of the element's sources exactly once.
pub fn attach(el: &mut MediaElement, ops: &mut Vec<MediaOp>) -> AttachOutcome {
    let reused_preload = match el.attachment {
        Attachment::Attached { .. } => return AttachOutcome::AlreadyAttached,
        Attachment::Preloaded => true,
        Attachment::None => false,
    };
    el.attachment = Attachment::Attached { reused_preload };
    ops.push(MediaOp::AssertAutoplay { target: el.id });
    if !reused_preload {
        append_sources(el, ops);
    }
    ops.push(MediaOp::SetPreloadAuto { target: el.id });
    if !reused_preload {
        ops.push(MediaOp::Load { target: el.id });
    }
    if el.state == PlaybackState::Unloaded {
        el.state = PlaybackState::Loading;
    }
    tracing::trace!(target_id = el.id.0, reused_preload, "attach sources");
    if reused_preload {
        AttachOutcome::ReusedPreload
    } else {
        AttachOutcome::Fresh
    }
}
