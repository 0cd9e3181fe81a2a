use crate::{
    config::RevealConfig,
    foundation::core::{FrameTiming, Point, Size},
};

/// Move `focus` toward `target` by `rate * dt_ms` of the remaining distance.
///
/// The factor is capped at 1, so a long frame lands on the target instead of
/// overshooting it.
pub fn smooth_toward(focus: Point, target: Point, rate: f64, dt_ms: f64) -> Point {
    let k = (rate * dt_ms).clamp(0.0, 1.0);
    focus.lerp(target, k)
}

/// Position on the idle orbit used by touch devices.
pub fn orbit(extent: Size, radius_frac: f64, speed: f64, elapsed_s: f64) -> Point {
    let r = extent.width.min(extent.height) * radius_frac;
    let angle = elapsed_s * speed;
    Point::new(
        extent.width / 2.0 + r * angle.cos(),
        extent.height / 2.0 + r * angle.sin(),
    )
}

/// Smoothed focus point of one reveal zone, in zone-local coordinates.
#[derive(Clone, Debug)]
pub struct FocusSampler {
    focus: Point,
    coarse: bool,
    rate: f64,
    orbit_radius: f64,
    orbit_speed: f64,
}

impl FocusSampler {
    pub fn new(start: Point, coarse: bool, cfg: &RevealConfig) -> Self {
        Self {
            focus: start,
            coarse,
            rate: cfg.ease_rate,
            orbit_radius: cfg.orbit_radius,
            orbit_speed: cfg.orbit_speed,
        }
    }

    pub fn focus(&self) -> Point {
        self.focus
    }

    pub fn is_coarse(&self) -> bool {
        self.coarse
    }

    /// Re-center vertically after the zone is resized.
    pub fn recenter_y(&mut self, zone_height: f64) {
        self.focus.y = zone_height / 2.0;
    }

    /// Advance one frame. `pointer` is in viewport coordinates and `zone_top`
    /// is the zone's current viewport-relative top.
    pub fn sample(
        &mut self,
        pointer: Point,
        zone_top: f64,
        extent: Size,
        timing: FrameTiming,
    ) -> Point {
        self.focus = if self.coarse {
            orbit(extent, self.orbit_radius, self.orbit_speed, timing.elapsed_s)
        } else {
            let target = Point::new(pointer.x, pointer.y - zone_top);
            smooth_toward(self.focus, target, self.rate, timing.dt_ms)
        };
        self.focus
    }
}
