//! Vitrine drives the client-side behavior of a showcase page: lazy video
//! playback tied to the viewport, scroll-driven hero bleed, sticky navigation
//! and a cursor-reactive canvas reveal.
//!
//! Components are plain state machines. They consume host events and layout
//! queries and return [`Effects`] (DOM patches, media operations and canvas
//! commands) for the host to apply:
//!
//! - Build a [`Registry`] of page elements and an [`EngineConfig`]
//! - Create a [`Page`] against a [`LayoutProbe`]
//! - Feed it [`PageEvent`]s and apply what comes back
#![forbid(unsafe_code)]

pub mod anim_ease;
pub mod assets;
pub mod config;
pub mod dom;
mod foundation;
pub mod hero;
pub mod layout;
pub mod media;
pub mod nav;
pub mod observe;
pub mod page;
pub mod registry;
pub mod render;
pub mod reveal;
pub mod script;
pub mod snap;
pub mod title;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use anim_ease::Ease;
pub use config::EngineConfig;
pub use dom::{ClassName, DomPatch, StyleProp};
pub use foundation::core::{
    ElementId, FrameClock, FrameGate, FrameTiming, Point, Rect, Size, Vec2, Viewport,
};
pub use foundation::error::{VitrineError, VitrineResult};
pub use layout::{LayoutProbe, StaticLayout};
pub use page::{Effects, ObserverKind, ObserverSpec, Page, PageContext, PageEvent};
pub use registry::Registry;
pub use render::{CpuSurface, FrameRGBA, RevealSurface};
pub use script::{PageManifest, Script, Step, StepOutput};
