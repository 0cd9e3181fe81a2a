//! Viewport-driven video lifecycle: source attachment, playback decisions and
//! stall recovery.

pub mod lifecycle;
pub mod loader;
pub mod stall;
pub mod state;

pub use lifecycle::MediaLifecycle;
pub use loader::AttachOutcome;
pub use stall::{StallMonitor, StalledSet};
pub use state::{
    Attachment, MediaElement, MediaEvent, MediaOp, PlaybackState, ReadyState, SourceKind,
    SourcePair,
};
