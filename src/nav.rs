//! Sticky navigation: expand/collapse state and active-section tracking.

use crate::{
    config::NavConfig,
    dom::{ClassName, DomPatch, StyleProp},
    foundation::core::{ElementId, FrameGate, Viewport},
    observe::IntersectionEntry,
    registry::{NavDesc, Registry, SectionDesc},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct NavState {
    pub expanded: bool,
    /// Near the page end; overrides `expanded`.
    pub at_end: bool,
    /// Set once the page has loaded; from then on CSS classes alone drive the
    /// collapsed look and inline overrides are cleared.
    pub ready: bool,
}

#[derive(Debug)]
pub struct NavTracker {
    desc: NavDesc,
    first_section: ElementId,
    end_section: Option<ElementId>,
    state: NavState,
    gate: FrameGate,
    cfg: NavConfig,
}

/// Inputs for one nav evaluation, all in document coordinates.
#[derive(Clone, Copy, Debug)]
pub struct NavInputs {
    pub scroll_y: f64,
    pub viewport: Viewport,
    pub first_section_top: f64,
    pub end_section_top: Option<f64>,
}

impl NavTracker {
    /// `None` without a nav bar or first section. The returned patches put the
    /// nav into its collapsed initial state.
    pub fn new(registry: &Registry, cfg: &NavConfig) -> Option<(Self, Vec<DomPatch>)> {
        let (Some(desc), Some(first_section)) = (registry.nav.clone(), registry.first_section)
        else {
            tracing::debug!("no sticky nav, nav tracking disabled");
            return None;
        };
        let mut nav = Self {
            desc,
            first_section,
            end_section: registry.end_section,
            state: NavState::default(),
            gate: FrameGate::default(),
            cfg: cfg.clone(),
        };
        let patches = nav.apply(false, false);
        Some((nav, patches))
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn first_section(&self) -> ElementId {
        self.first_section
    }

    pub fn end_section(&self) -> Option<ElementId> {
        self.end_section
    }

    pub fn on_scroll(&mut self) -> bool {
        self.gate.arm()
    }

    pub fn on_frame(&mut self, inputs: NavInputs) -> Vec<DomPatch> {
        if !self.gate.take() {
            return Vec::new();
        }
        self.evaluate(inputs)
    }

    /// Page load: evaluate once, then hand the collapsed look over to CSS.
    pub fn mark_ready(&mut self, inputs: NavInputs) -> Vec<DomPatch> {
        let mut patches = self.evaluate(inputs);
        self.state.ready = true;
        self.clear_inline(&mut patches);
        patches
    }

    pub fn evaluate(&mut self, inputs: NavInputs) -> Vec<DomPatch> {
        if inputs.first_section_top < self.cfg.min_section_top {
            return Vec::new();
        }
        let mobile = inputs.viewport.width < self.cfg.mobile_breakpoint;
        let at_end = !mobile
            && inputs.end_section_top.is_some_and(|top| {
                inputs.scroll_y > top - inputs.viewport.height * self.cfg.end_fraction
            });
        let expanded =
            !at_end && inputs.scroll_y > inputs.first_section_top - self.cfg.expand_offset;

        let mut patches = self.apply(expanded, at_end);
        if self.state.ready && !at_end {
            self.clear_inline(&mut patches);
        }
        patches
    }

    fn apply(&mut self, expanded: bool, at_end: bool) -> Vec<DomPatch> {
        let root = self.desc.root;
        let mut patches = vec![DomPatch::class(root, ClassName::AtEnd, at_end)];
        self.state.at_end = at_end;
        self.state.expanded = expanded && !at_end;

        if at_end {
            patches.push(DomPatch::class(root, ClassName::Expanded, false));
            self.collapse(&mut patches);
            for &side in &self.desc.sides {
                patches.push(DomPatch::ClearStyle { target: side });
            }
        } else if expanded {
            patches.push(DomPatch::class(root, ClassName::Expanded, true));
            self.clear_inline(&mut patches);
        } else {
            patches.push(DomPatch::class(root, ClassName::Expanded, false));
            self.collapse(&mut patches);
            for &side in &self.desc.sides {
                patches.push(DomPatch::remove(side, StyleProp::Opacity));
                patches.push(DomPatch::remove(side, StyleProp::MaxWidth));
            }
        }
        patches
    }

    fn collapse(&self, patches: &mut Vec<DomPatch>) {
        patches.push(DomPatch::style(self.desc.links, StyleProp::MaxWidth, "0", true));
        patches.push(DomPatch::style(self.desc.links, StyleProp::Opacity, "0", true));
        patches.push(DomPatch::style(self.desc.card, StyleProp::FlexGrow, "0", true));
    }

    fn clear_inline(&self, patches: &mut Vec<DomPatch>) {
        patches.push(DomPatch::ClearStyle {
            target: self.desc.links,
        });
        patches.push(DomPatch::ClearStyle {
            target: self.desc.card,
        });
        for &side in &self.desc.sides {
            patches.push(DomPatch::ClearStyle { target: side });
        }
    }
}

/// Highlights the nav link of the section being read and keeps the URL
/// fragment in sync with it.
#[derive(Debug)]
pub struct SectionTracker {
    links: Vec<ElementId>,
    link_targets: Vec<String>,
    sections: Vec<SectionDesc>,
    active: Option<usize>,
    last_hash: Option<String>,
    lock_until: Option<f64>,
    ratios: Vec<(String, f64)>,
    gate: FrameGate,
    cfg: NavConfig,
}

impl SectionTracker {
    pub fn new(registry: &Registry, initial_hash: Option<&str>, cfg: &NavConfig) -> Self {
        Self {
            links: registry.nav_links.clone(),
            link_targets: registry.link_targets.clone(),
            sections: registry.sections.clone(),
            active: None,
            last_hash: initial_hash.filter(|h| !h.is_empty()).map(str::to_string),
            lock_until: None,
            ratios: Vec::new(),
            gate: FrameGate::default(),
            cfg: cfg.clone(),
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn sections(&self) -> &[SectionDesc] {
        &self.sections
    }

    pub fn is_locked(&self, now_ms: f64) -> bool {
        self.lock_until.is_some_and(|until| now_ms < until)
    }

    /// Nav click: highlight immediately and hold off scroll-driven tracking
    /// while the smooth scroll runs.
    pub fn on_click(&mut self, index: usize, now_ms: f64) -> Vec<DomPatch> {
        self.lock_until = Some(now_ms + self.cfg.click_lock_ms);
        if let Some(anchor) = self.link_targets.get(index) {
            self.last_hash = Some(format!("#{anchor}"));
        }
        self.set_active(Some(index))
    }

    pub fn on_scroll(&mut self, now_ms: f64) -> bool {
        if self.is_locked(now_ms) {
            return false;
        }
        self.gate.arm()
    }

    /// Scroll-position scan: the last section whose top (minus the header
    /// offset) has passed the scroll position is current.
    pub fn on_frame(
        &mut self,
        scroll_y: f64,
        mut offset_top: impl FnMut(ElementId) -> Option<f64>,
    ) -> Vec<DomPatch> {
        if !self.gate.take() {
            return Vec::new();
        }
        let current = self
            .sections
            .iter()
            .rev()
            .find(|s| offset_top(s.id).is_some_and(|top| top - self.cfg.hash_offset <= scroll_y))
            .map(|s| s.anchor.clone());

        let mut patches = Vec::new();
        match current {
            Some(anchor) => {
                self.replace_hash(Some(format!("#{anchor}")), &mut patches);
                let idx = self.link_index(&anchor);
                patches.extend(self.set_active(idx));
            }
            None => {
                self.replace_hash(None, &mut patches);
                patches.extend(self.set_active(None));
            }
        }
        patches
    }

    /// Visibility-ratio path: the section with the largest visible ratio wins,
    /// provided it clears the minimum.
    pub fn on_ratio_entries(
        &mut self,
        entries: &[IntersectionEntry],
        now_ms: f64,
    ) -> Vec<DomPatch> {
        if self.is_locked(now_ms) {
            return Vec::new();
        }
        for entry in entries {
            let Some(anchor) = self
                .sections
                .iter()
                .find(|s| s.id == entry.target)
                .map(|s| s.anchor.clone())
            else {
                continue;
            };
            match self.ratios.iter_mut().find(|(a, _)| *a == anchor) {
                Some(slot) => slot.1 = entry.ratio,
                None => self.ratios.push((anchor, entry.ratio)),
            }
        }

        let mut best: Option<(&str, f64)> = None;
        for (anchor, ratio) in &self.ratios {
            if *ratio > best.map_or(0.0, |(_, r)| r) {
                best = Some((anchor.as_str(), *ratio));
            }
        }
        let index = match best {
            Some((anchor, ratio)) if ratio > self.cfg.active_ratio_min => self.link_index(anchor),
            _ => None,
        };
        self.set_active(index)
    }

    fn link_index(&self, anchor: &str) -> Option<usize> {
        self.link_targets.iter().position(|t| t == anchor)
    }

    fn replace_hash(&mut self, hash: Option<String>, patches: &mut Vec<DomPatch>) {
        if self.last_hash == hash {
            return;
        }
        self.last_hash = hash.clone();
        patches.push(DomPatch::ReplaceHash { hash });
    }

    fn set_active(&mut self, index: Option<usize>) -> Vec<DomPatch> {
        let index = index.filter(|&i| i < self.links.len());
        self.active = index;
        self.links
            .iter()
            .enumerate()
            .map(|(i, &link)| DomPatch::class(link, ClassName::Active, Some(i) == index))
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/unit/nav.rs"]
mod tests;
