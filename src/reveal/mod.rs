//! Cursor-reactive canvas reveal: a drifting grid of images that swell around
//! a smoothed focus point.

pub mod driver;
pub mod focus;
pub mod grid;
pub mod images;

pub use driver::AnimationDriver;
pub use focus::{FocusSampler, orbit, smooth_toward};
pub use grid::{GridParams, SpriteDraw, cell_centers, layout, wrap};
pub use images::{ImagePool, ImageState, PoolImage, ReadyImage};

use crate::{
    config::RevealConfig,
    foundation::core::{ElementId, Point, Size, Viewport},
    layout::LayoutProbe,
    registry::RevealZoneDesc,
};

/// Canvas work for the host, in emission order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CanvasCommand {
    /// Resize the backing store to `css_size * pixel_ratio` and the element to `css_size`.
    Resize {
        canvas: ElementId,
        css_size: Size,
        pixel_ratio: f64,
    },
    Clear {
        canvas: ElementId,
    },
    /// Clear, then draw every sprite (CSS pixels, scaled by the pixel ratio).
    Draw {
        canvas: ElementId,
        pixel_ratio: f64,
        sprites: Vec<SpriteDraw>,
    },
}

/// One reveal zone: its image pool, focus sampler and frame loop.
#[derive(Debug)]
pub struct RevealZone {
    desc: RevealZoneDesc,
    pool: ImagePool,
    sampler: FocusSampler,
    driver: AnimationDriver,
    css_size: Size,
    pixel_ratio: f64,
    cfg: RevealConfig,
}

impl RevealZone {
    pub fn new(
        desc: RevealZoneDesc,
        viewport: Viewport,
        coarse_pointer: bool,
        cfg: &RevealConfig,
    ) -> Self {
        let pool = ImagePool::new(&desc.prefix, desc.count);
        let start = Point::new(viewport.width / 2.0, 0.0);
        Self {
            desc,
            pool,
            sampler: FocusSampler::new(start, coarse_pointer, cfg),
            driver: AnimationDriver::new(cfg),
            css_size: Size::ZERO,
            pixel_ratio: 1.0,
            cfg: cfg.clone(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.desc.id
    }

    pub fn canvas(&self) -> ElementId {
        self.desc.canvas
    }

    pub fn pool(&self) -> &ImagePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ImagePool {
        &mut self.pool
    }

    pub fn focus(&self) -> Point {
        self.sampler.focus()
    }

    pub fn css_size(&self) -> Size {
        self.css_size
    }

    pub fn is_active(&self) -> bool {
        self.driver.is_active()
    }

    /// Match the canvas to the viewport width and the zone height.
    pub fn resize(&mut self, probe: &dyn LayoutProbe) -> CanvasCommand {
        let height = probe
            .client_rect(self.desc.id)
            .map_or(0.0, |r| r.height());
        self.css_size = Size::new(probe.viewport().width, height);
        self.pixel_ratio = self.driver.pixel_ratio(probe.device_pixel_ratio());
        self.sampler.recenter_y(height);
        CanvasCommand::Resize {
            canvas: self.desc.canvas,
            css_size: self.css_size,
            pixel_ratio: self.pixel_ratio,
        }
    }

    /// Zone visibility changed. Returns the canvas work and whether a frame
    /// must be requested.
    pub fn on_intersection(
        &mut self,
        is_intersecting: bool,
        probe: &dyn LayoutProbe,
    ) -> (Vec<CanvasCommand>, bool) {
        if is_intersecting {
            let resize = self.resize(probe);
            let request = self.driver.activate();
            tracing::debug!(zone = self.desc.id.0, "reveal zone active");
            (vec![resize], request)
        } else {
            (vec![self.deactivate()], false)
        }
    }

    /// Stop the frame loop and wipe the canvas.
    pub fn deactivate(&mut self) -> CanvasCommand {
        if self.driver.deactivate() {
            tracing::debug!(zone = self.desc.id.0, "reveal zone idle");
        }
        CanvasCommand::Clear {
            canvas: self.desc.canvas,
        }
    }

    /// Run one frame. `None` while inactive; otherwise the draw (possibly with
    /// no sprites) and the next frame is already requested.
    #[tracing::instrument(level = "trace", skip(self, probe), fields(zone = self.desc.id.0))]
    pub fn on_frame(
        &mut self,
        now_ms: f64,
        pointer: Point,
        probe: &dyn LayoutProbe,
    ) -> Option<CanvasCommand> {
        let timing = self.driver.frame(now_ms)?;
        let zone_top = probe.client_rect(self.desc.id).map_or(0.0, |r| r.y0);
        let focus = self
            .sampler
            .sample(pointer, zone_top, self.css_size, timing);

        let params = GridParams::resolve(self.css_size.width, &self.cfg);
        let ready = self.pool.ready();
        let sprites = layout(&params, self.css_size, timing.elapsed_s, focus, &ready);
        self.driver.request();
        Some(CanvasCommand::Draw {
            canvas: self.desc.canvas,
            pixel_ratio: self.pixel_ratio,
            sprites,
        })
    }

    pub fn wants_frame(&self) -> bool {
        self.driver.is_frame_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{foundation::core::Rect, layout::StaticLayout};

    const ZONE: ElementId = ElementId(7);
    const CANVAS: ElementId = ElementId(8);

    fn zone() -> (RevealZone, StaticLayout) {
        let desc = RevealZoneDesc {
            id: ZONE,
            canvas: CANVAS,
            prefix: "reveal/".into(),
            count: 2,
        };
        let mut layout = StaticLayout::new(Viewport::new(1000.0, 800.0).unwrap())
            .with_box(ZONE, Rect::new(0.0, 2000.0, 1000.0, 2600.0));
        layout.device_pixel_ratio = 3.0;
        layout.scroll_y = 1700.0;
        let z = RevealZone::new(desc, layout.viewport, false, &RevealConfig::default());
        (z, layout)
    }

    #[test]
    fn activation_resizes_and_requests_a_frame() {
        let (mut z, layout) = zone();
        let (cmds, request) = z.on_intersection(true, &layout);
        assert!(request);
        assert_eq!(
            cmds,
            vec![CanvasCommand::Resize {
                canvas: CANVAS,
                css_size: Size::new(1000.0, 600.0),
                pixel_ratio: 2.0,
            }]
        );
        assert_eq!(z.focus(), Point::new(500.0, 300.0));
        assert!(z.wants_frame());
    }

    #[test]
    fn frames_draw_nothing_until_images_load() {
        let (mut z, layout) = zone();
        assert!(z.on_frame(0.0, Point::ZERO, &layout).is_none());

        z.on_intersection(true, &layout);
        let Some(CanvasCommand::Draw { sprites, .. }) =
            z.on_frame(16.0, Point::new(500.0, 600.0), &layout)
        else {
            panic!("expected a draw");
        };
        assert!(sprites.is_empty());
        assert!(z.wants_frame());

        z.pool_mut().mark_loaded(1, 100, 100);
        let Some(CanvasCommand::Draw { sprites, .. }) =
            z.on_frame(32.0, Point::new(500.0, 600.0), &layout)
        else {
            panic!("expected a draw");
        };
        assert!(!sprites.is_empty());
        assert!(sprites.iter().all(|s| s.image == 1));
    }

    #[test]
    fn deactivation_clears_and_stops() {
        let (mut z, layout) = zone();
        z.on_intersection(true, &layout);
        let (cmds, request) = z.on_intersection(false, &layout);
        assert!(!request);
        assert_eq!(cmds, vec![CanvasCommand::Clear { canvas: CANVAS }]);
        assert!(!z.wants_frame());
        assert!(z.on_frame(48.0, Point::ZERO, &layout).is_none());
    }
}
