use crate::{
    config::RevealConfig,
    foundation::core::{FrameClock, FrameTiming},
};

/// Per-zone frame loop: runs only while the zone is on screen.
#[derive(Clone, Debug)]
pub struct AnimationDriver {
    active: bool,
    frame_pending: bool,
    clock: FrameClock,
    max_dpr: f64,
}

impl AnimationDriver {
    pub fn new(cfg: &RevealConfig) -> Self {
        Self {
            active: false,
            frame_pending: false,
            clock: FrameClock::new(cfg.max_dt_ms),
            max_dpr: cfg.max_device_pixel_ratio,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Device pixel ratio actually used for the backing store.
    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
            return 1.0;
        }
        device_pixel_ratio.min(self.max_dpr)
    }

    /// Start (or restart) the loop with a fresh time origin. `true` when the
    /// host must request a frame.
    pub fn activate(&mut self) -> bool {
        self.active = true;
        self.clock.reset();
        self.request()
    }

    /// Stop the loop and drop any pending frame. `true` if it was running.
    pub fn deactivate(&mut self) -> bool {
        self.frame_pending = false;
        std::mem::replace(&mut self.active, false)
    }

    /// Frame callback. `None` while inactive.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameTiming> {
        self.frame_pending = false;
        if !self.active {
            return None;
        }
        Some(self.clock.tick(now_ms))
    }

    /// Schedule the next frame; `true` if none was pending.
    pub fn request(&mut self) -> bool {
        if !self.active || self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        true
    }
}
