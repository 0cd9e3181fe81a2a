use crate::foundation::error::{VitrineError, VitrineResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Opaque handle to one page element, issued once by the [`Registry`](crate::Registry).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ElementId(pub u32);

/// Visible layout viewport in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a validated viewport (finite, non-negative extents).
    pub fn new(width: f64, height: f64) -> VitrineResult<Self> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(VitrineError::validation(
                "viewport extents must be finite and >= 0",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Collapses any number of requests into one computation per animation frame.
///
/// `arm` is called from scroll/resize handlers; it returns `true` only for the
/// first request since the last frame, which is when the host must schedule a
/// frame. `take` is called inside the frame callback and resets the flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameGate {
    ticking: bool,
}

impl FrameGate {
    pub fn arm(&mut self) -> bool {
        if self.ticking {
            return false;
        }
        self.ticking = true;
        true
    }

    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.ticking, false)
    }

    pub fn is_armed(&self) -> bool {
        self.ticking
    }
}

/// Timing of one animation frame relative to the clock's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    /// Seconds since the origin frame.
    pub elapsed_s: f64,
    /// Milliseconds since the previous frame, clamped to the clock's maximum.
    pub dt_ms: f64,
}

/// Frame clock whose origin is the first frame after construction or [`reset`](Self::reset).
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    origin: Option<f64>,
    prev: f64,
    max_dt_ms: f64,
}

impl FrameClock {
    pub fn new(max_dt_ms: f64) -> Self {
        Self {
            origin: None,
            prev: 0.0,
            max_dt_ms,
        }
    }

    pub fn reset(&mut self) {
        self.origin = None;
    }

    pub fn tick(&mut self, now_ms: f64) -> FrameTiming {
        let origin = match self.origin {
            Some(origin) => origin,
            None => {
                self.origin = Some(now_ms);
                self.prev = now_ms;
                now_ms
            }
        };
        let dt_ms = (now_ms - self.prev).clamp(0.0, self.max_dt_ms);
        self.prev = now_ms;
        FrameTiming {
            elapsed_s: (now_ms - origin) / 1000.0,
            dt_ms,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
