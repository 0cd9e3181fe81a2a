//! Drifting image grid whose cells grow near the focus point.

use crate::{
    anim_ease::Ease,
    config::RevealConfig,
    foundation::core::{Point, Rect, Size},
    reveal::images::ReadyImage,
};

/// Grid geometry resolved for one viewport width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridParams {
    pub cell: f64,
    pub step: f64,
    pub max_distance: f64,
    pub max_scale: f64,
    pub min_scale: f64,
    /// Drift velocity in px/s.
    pub drift_x: f64,
    pub drift_y: f64,
    pub ease: Ease,
}

impl GridParams {
    pub fn resolve(viewport_width: f64, cfg: &RevealConfig) -> Self {
        let cell = viewport_width * cfg.cell;
        Self {
            cell,
            step: cell + viewport_width * cfg.gap,
            max_distance: viewport_width * cfg.max_distance,
            max_scale: cfg.max_scale,
            min_scale: cfg.min_scale,
            drift_x: cfg.drift,
            drift_y: cfg.drift * cfg.drift_y_ratio,
            ease: cfg.ease,
        }
    }

    /// Column and row counts, each iterated from -1.
    pub fn dims(&self, extent: Size) -> (i64, i64) {
        let cols = (extent.width / self.step).ceil() as i64 + 2;
        let rows = (extent.height / self.step).ceil() as i64 + 2;
        (cols, rows)
    }

    /// Scale of a cell `distance` px from the focus; `None` when it is not drawn.
    pub fn scale_at(&self, distance: f64) -> Option<f64> {
        if distance >= self.max_distance {
            return None;
        }
        let s = (self.max_scale * (1.0 - self.ease.apply(distance / self.max_distance))).max(0.0);
        (s > self.min_scale).then_some(s)
    }
}

/// Wrap `v` into `[min, max)`.
pub fn wrap(min: f64, max: f64, v: f64) -> f64 {
    min + (v - min).rem_euclid(max - min)
}

/// One image to draw, in canvas CSS pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SpriteDraw {
    /// Pool index of the image.
    pub image: usize,
    pub rect: Rect,
}

/// Wrapped cell centers after `elapsed_s` of drift, in running index order.
///
/// Centers stay in `[-step, extent + step)` on each axis, and every point of
/// the canvas has a center within one step of it.
pub fn cell_centers(params: &GridParams, extent: Size, elapsed_s: f64) -> Vec<Point> {
    let step = params.step;
    let (cols, rows) = params.dims(extent);
    let shift_x = elapsed_s * params.drift_x;
    let shift_y = elapsed_s * params.drift_y;
    (-1..rows)
        .flat_map(|r| (-1..cols).map(move |c| (c, r)))
        .map(|(c, r)| {
            Point::new(
                wrap(-step, extent.width + step, c as f64 * step + shift_x),
                wrap(-step, extent.height + step, r as f64 * step + shift_y),
            )
        })
        .collect()
}

/// Lay out one frame of the grid over a canvas of `extent`.
///
/// Images cycle through `ready` by running cell index, so a cell keeps its
/// image whether or not its neighbours are drawn.
pub fn layout(
    params: &GridParams,
    extent: Size,
    elapsed_s: f64,
    focus: Point,
    ready: &[ReadyImage],
) -> Vec<SpriteDraw> {
    if ready.is_empty() || params.step <= 0.0 || extent.height <= 0.0 {
        return Vec::new();
    }
    cell_centers(params, extent, elapsed_s)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, center)| {
            let scale = params.scale_at((center - focus).hypot())?;
            let img = ready[idx % ready.len()];
            let w = params.cell * scale;
            let h = w * img.aspect();
            Some(SpriteDraw {
                image: img.index,
                rect: Rect::from_center_size(center, (w, h)),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/grid.rs"]
mod tests;
