use crate::foundation::core::ElementId;

/// Mirror of the media element's `readyState` ladder.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    #[default]
    Nothing,
    Metadata,
    CurrentData,
    FutureData,
    EnoughData,
}

impl ReadyState {
    pub fn from_raw(v: u16) -> Self {
        match v {
            0 => Self::Nothing,
            1 => Self::Metadata,
            2 => Self::CurrentData,
            3 => Self::FutureData,
            _ => Self::EnoughData,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Stalled,
}

/// How the element's sources got attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    None,
    /// Sources appended and buffering by the eager near-viewport path.
    Preloaded,
    /// Owned by the playback path; `loaded` in page terms.
    Attached { reused_preload: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Webm,
    Mp4,
}

impl SourceKind {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourcePair {
    #[serde(default)]
    pub webm: Option<String>,
    #[serde(default)]
    pub mp4: Option<String>,
}

impl SourcePair {
    pub fn is_empty(&self) -> bool {
        self.webm.is_none() && self.mp4.is_none()
    }

    /// Source descriptors in attachment order: webm first, mp4 as fallback.
    pub fn descriptors(&self) -> impl Iterator<Item = (SourceKind, &str)> {
        [
            (SourceKind::Webm, self.webm.as_deref()),
            (SourceKind::Mp4, self.mp4.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, url)| url.map(|u| (kind, u)))
    }
}

/// Side effects the host applies to a video element, in emission order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MediaOp {
    /// Force muted, inline, no-loop. Precedes every play attempt.
    AssertAutoplay { target: ElementId },
    AppendSource {
        target: ElementId,
        kind: SourceKind,
        url: String,
    },
    SetPreloadAuto { target: ElementId },
    Load { target: ElementId },
    Play { target: ElementId },
    Pause { target: ElementId },
    Seek { target: ElementId, to: f64 },
}

/// Notifications the host forwards from a video element.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaEvent {
    LoadedMetadata,
    LoadedData,
    CanPlay,
    Playing,
    Pause,
    Ended,
    Stalled,
    Error,
    /// The play request was refused (autoplay policy, aborted load, ...).
    PlayRejected,
    TimeUpdate { time: f64 },
}

/// Remaining automatic retries for the current play attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum PlayAttempt {
    #[default]
    Idle,
    First,
    Retried,
}

/// One video element as the lifecycle sees it.
#[derive(Clone, Debug)]
pub struct MediaElement {
    pub id: ElementId,
    pub sources: SourcePair,
    pub attachment: Attachment,
    pub state: PlaybackState,
    pub in_view: bool,
    pub ready_state: ReadyState,
    pub paused: bool,
    pub ended: bool,
    pub current_time: f64,
    pub(crate) attempt: PlayAttempt,
    /// Waiting for the first `canplay`/`loadeddata` after attaching.
    pub(crate) awaiting_ready: bool,
    /// A stall recovery reload is in flight; the next `canplay` replays if in view.
    pub(crate) recovery_armed: bool,
}

impl MediaElement {
    pub fn new(id: ElementId, sources: SourcePair) -> Self {
        Self {
            id,
            sources,
            attachment: Attachment::None,
            state: PlaybackState::Unloaded,
            in_view: false,
            ready_state: ReadyState::Nothing,
            paused: true,
            ended: false,
            current_time: 0.0,
            attempt: PlayAttempt::Idle,
            awaiting_ready: false,
            recovery_armed: false,
        }
    }

    pub fn loaded(&self) -> bool {
        matches!(self.attachment, Attachment::Attached { .. })
    }

    pub fn preloading(&self) -> bool {
        matches!(
            self.attachment,
            Attachment::Preloaded
                | Attachment::Attached {
                    reused_preload: true
                }
        )
    }

    pub(crate) fn raise_ready(&mut self, at_least: ReadyState) {
        self.ready_state = self.ready_state.max(at_least);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_orders_like_the_ladder() {
        assert!(ReadyState::Nothing < ReadyState::Metadata);
        assert!(ReadyState::CurrentData < ReadyState::FutureData);
        assert_eq!(ReadyState::from_raw(3), ReadyState::FutureData);
        assert_eq!(ReadyState::from_raw(9), ReadyState::EnoughData);
    }

    #[test]
    fn descriptors_prefer_webm_and_skip_missing() {
        let both = SourcePair {
            webm: Some("a.webm".into()),
            mp4: Some("a.mp4".into()),
        };
        let kinds: Vec<_> = both.descriptors().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![SourceKind::Webm, SourceKind::Mp4]);

        let mp4_only = SourcePair {
            webm: None,
            mp4: Some("b.mp4".into()),
        };
        let urls: Vec<_> = mp4_only.descriptors().map(|(_, u)| u).collect();
        assert_eq!(urls, vec!["b.mp4"]);
    }

    #[test]
    fn raise_ready_never_lowers() {
        let mut el = MediaElement::new(ElementId(1), SourcePair::default());
        el.raise_ready(ReadyState::FutureData);
        el.raise_ready(ReadyState::Metadata);
        assert_eq!(el.ready_state, ReadyState::FutureData);
    }
}
