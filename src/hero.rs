//! Scroll-driven full-bleed expansion for hero containers.
//!
//! As a hero rises through the lower half of the viewport it widens
//! symmetrically from its column width to the full client width.

use crate::{
    anim_ease::Ease,
    config::HeroConfig,
    dom::{DomPatch, StyleProp},
    foundation::core::{ElementId, FrameGate, Size},
    layout::LayoutProbe,
    registry::Registry,
};

/// Bleed progress in `[0, 1]` for a hero whose top edge sits at `rect_top`.
///
/// Zero when the top edge is at the bottom of the viewport, one once it has
/// travelled half a viewport upward.
pub fn bleed_progress(viewport_height: f64, rect_top: f64, ease: Ease) -> f64 {
    if viewport_height <= 0.0 {
        return 0.0;
    }
    let raw = (viewport_height - rect_top) / (viewport_height / 2.0);
    ease.apply(raw.clamp(0.0, 1.0))
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeroTarget {
    pub id: ElementId,
    pub graphic: Option<ElementId>,
    /// Extra width currently forced onto the hero; `None` means natural layout.
    pub current_extra: Option<f64>,
    pub graphic_lock: Option<Size>,
}

#[derive(Debug)]
pub struct HeroBleed {
    wrap: ElementId,
    targets: Vec<HeroTarget>,
    natural_width: f64,
    gate: FrameGate,
    cfg: HeroConfig,
}

impl HeroBleed {
    /// `None` when the page has no content wrapper or no heroes.
    pub fn new(registry: &Registry, cfg: &HeroConfig) -> Option<Self> {
        let Some(wrap) = registry.content_wrap else {
            tracing::debug!("no content wrapper, hero bleed disabled");
            return None;
        };
        if registry.heroes.is_empty() {
            tracing::debug!("no hero targets, hero bleed disabled");
            return None;
        }
        let targets = registry
            .heroes
            .iter()
            .map(|h| HeroTarget {
                id: h.id,
                graphic: h.graphic,
                current_extra: None,
                graphic_lock: None,
            })
            .collect();
        Some(Self {
            wrap,
            targets,
            natural_width: 0.0,
            gate: FrameGate::default(),
            cfg: cfg.clone(),
        })
    }

    pub fn targets(&self) -> &[HeroTarget] {
        &self.targets
    }

    pub fn natural_width(&self) -> f64 {
        self.natural_width
    }

    /// Scroll handler; `true` when the host must schedule a frame.
    pub fn on_scroll(&mut self) -> bool {
        self.gate.arm()
    }

    pub fn on_frame(&mut self, probe: &dyn LayoutProbe) -> Vec<DomPatch> {
        if !self.gate.take() {
            return Vec::new();
        }
        self.update(probe)
    }

    pub fn on_resize(&mut self, probe: &dyn LayoutProbe) -> Vec<DomPatch> {
        let mut patches = self.remeasure(probe);
        patches.extend(self.update(probe));
        patches
    }

    /// Drop all overrides, re-read the natural column width and pin each
    /// graphic wrapper at its at-rest size.
    pub fn remeasure(&mut self, probe: &dyn LayoutProbe) -> Vec<DomPatch> {
        let mut patches = Vec::new();
        self.natural_width = probe.content_width(self.wrap).unwrap_or(0.0).max(0.0);

        for t in &mut self.targets {
            patches.push(DomPatch::px(
                t.id,
                StyleProp::HeroNaturalWidth,
                self.natural_width,
                false,
            ));
            let Some(gw) = t.graphic else {
                continue;
            };
            for prop in [StyleProp::Width, StyleProp::MaxWidth, StyleProp::MarginLeft] {
                patches.push(DomPatch::remove(t.id, prop));
            }
            patches.push(DomPatch::remove(gw, StyleProp::MaxWidth));
            patches.push(DomPatch::remove(gw, StyleProp::MaxHeight));
            t.current_extra = None;
            t.graphic_lock = probe.rest_size(gw);
        }

        for t in &self.targets {
            if let (Some(gw), Some(size)) = (t.graphic, t.graphic_lock) {
                patches.push(DomPatch::px(gw, StyleProp::MaxWidth, size.width, false));
                patches.push(DomPatch::px(gw, StyleProp::MaxHeight, size.height, false));
            }
        }
        tracing::trace!(natural_width = self.natural_width, "hero remeasured");
        patches
    }

    pub fn update(&mut self, probe: &dyn LayoutProbe) -> Vec<DomPatch> {
        let mut patches = Vec::new();
        let view_h = probe.viewport().height;
        let extra_max = probe.client_width() - self.natural_width;
        if extra_max <= 0.0 {
            return patches;
        }

        for t in &mut self.targets {
            let Some(rect) = probe.client_rect(t.id) else {
                continue;
            };
            let progress = if rect.y1 <= 0.0 || rect.y0 >= view_h {
                0.0
            } else {
                bleed_progress(view_h, rect.y0, self.cfg.ease)
            };

            if progress < self.cfg.min_progress {
                if t.current_extra.take().is_some() {
                    for prop in [StyleProp::Width, StyleProp::MaxWidth, StyleProp::MarginLeft] {
                        patches.push(DomPatch::remove(t.id, prop));
                    }
                }
                continue;
            }

            let extra = extra_max * progress;
            patches.push(DomPatch::px(
                t.id,
                StyleProp::Width,
                self.natural_width + extra,
                true,
            ));
            patches.push(DomPatch::style(t.id, StyleProp::MaxWidth, "none", true));
            patches.push(DomPatch::px(t.id, StyleProp::MarginLeft, -extra / 2.0, true));
            t.current_extra = Some(extra);
        }
        patches
    }
}

#[cfg(test)]
#[path = "../tests/unit/hero.rs"]
mod tests;
