use crate::{config::SnapConfig, dom::DomPatch};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKey {
    ArrowDown,
    PageDown,
    Space,
    Other,
}

impl SnapKey {
    pub fn from_code(code: &str) -> Self {
        match code {
            "ArrowDown" => Self::ArrowDown,
            "PageDown" => Self::PageDown,
            "Space" => Self::Space,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapInput {
    Wheel { delta_y: f64 },
    TouchStart { y: f64 },
    TouchMove { y: f64 },
    Key { key: SnapKey },
}

/// What the host should do with the input event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapOutcome {
    pub prevent_default: bool,
    pub scroll: Option<DomPatch>,
}

/// Page position facts needed to decide a snap.
#[derive(Clone, Copy, Debug)]
pub struct SnapContext {
    pub scroll_y: f64,
    pub viewport_height: f64,
    /// Viewport-relative top of the first section header.
    pub header_top: f64,
}

/// One-shot scroll snap from the title area to the first section header.
///
/// Once it fires, or once it is disarmed, every further input is ignored; the
/// host removes its listeners when [`is_armed`](Self::is_armed) turns false.
#[derive(Clone, Debug)]
pub struct SnapInterceptor {
    armed: bool,
    touch_start_y: f64,
    cfg: SnapConfig,
}

impl SnapInterceptor {
    /// A deep link to anything but the title starts out disarmed.
    pub fn new(initial_hash: Option<&str>, cfg: &SnapConfig) -> Self {
        let deep_link = initial_hash.is_some_and(|h| !h.is_empty() && h != "#title");
        Self {
            armed: !deep_link,
            touch_start_y: 0.0,
            cfg: cfg.clone(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn on_input(&mut self, input: SnapInput, ctx: SnapContext) -> SnapOutcome {
        if let SnapInput::TouchStart { y } = input {
            self.touch_start_y = y;
            return SnapOutcome::default();
        }
        if !self.armed || ctx.scroll_y >= ctx.viewport_height * self.cfg.title_fraction {
            return SnapOutcome::default();
        }
        let wants_down = match input {
            SnapInput::Wheel { delta_y } => delta_y > 0.0,
            SnapInput::TouchMove { y } => self.touch_start_y - y > self.cfg.touch_threshold_px,
            SnapInput::Key { key } => key != SnapKey::Other,
            SnapInput::TouchStart { .. } => false,
        };
        if !wants_down {
            return SnapOutcome::default();
        }

        self.armed = false;
        let top = ctx.header_top + ctx.scroll_y - self.cfg.header_offset_px;
        tracing::debug!(top, "snap to first section");
        SnapOutcome {
            prevent_default: true,
            scroll: Some(DomPatch::ScrollTo { top, smooth: true }),
        }
    }
}
