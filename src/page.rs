//! Composition root: owns every component and routes host events to them.

use std::collections::BTreeMap;

use crate::{
    config::EngineConfig,
    dom::{ClassName, DomPatch},
    foundation::{
        core::{ElementId, Point, Viewport},
        error::{VitrineError, VitrineResult},
    },
    hero::HeroBleed,
    layout::LayoutProbe,
    media::{MediaEvent, MediaLifecycle, MediaOp},
    nav::{NavInputs, NavTracker, SectionTracker},
    observe::{IntersectionEntry, IntersectionTracker, RootMargin},
    registry::Registry,
    reveal::{CanvasCommand, RevealZone},
    snap::{SnapContext, SnapInput, SnapInterceptor},
    title::TitleSequence,
};

/// State shared by every component, owned by the [`Page`].
#[derive(Clone, Debug, PartialEq)]
pub struct PageContext {
    pub viewport: Viewport,
    /// Last pointer position in viewport coordinates.
    pub pointer: Point,
    pub coarse_pointer: bool,
    /// Latest host timestamp seen, in ms.
    pub now_ms: f64,
    pub hidden: bool,
}

impl PageContext {
    pub fn from_probe(probe: &dyn LayoutProbe) -> Self {
        let viewport = probe.viewport();
        Self {
            viewport,
            pointer: viewport.center(),
            coarse_pointer: probe.coarse_pointer(),
            now_ms: 0.0,
            hidden: false,
        }
    }
}

/// The intersection observers a page needs.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ObserverKind {
    MediaPreload,
    MediaPlayback,
    RevealZone,
    ScrollReveal,
    SectionRatio,
}

/// Observer setup for hosts with a native intersection observer.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverSpec {
    pub kind: ObserverKind,
    pub margin: RootMargin,
    pub thresholds: Vec<f64>,
    pub targets: Vec<ElementId>,
    /// Unobserve each target after its first intersecting entry.
    pub once: bool,
}

/// Host events, in the order they happen.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// Window `load`.
    Load { now_ms: f64 },
    Scroll { now_ms: f64 },
    Resize,
    Frame { now_ms: f64 },
    /// Periodic host timer (stall sweep, title hold).
    Timer { now_ms: f64 },
    PointerMove { x: f64, y: f64 },
    /// Click or touch anywhere on the page.
    Gesture,
    VisibilityChange { hidden: bool },
    /// Window `pagehide`. A persisted page enters the back/forward cache and
    /// may come back; anything else is final.
    PageHide { persisted: bool },
    /// Window `pageshow`; `persisted` marks a back/forward cache restore.
    PageShow { persisted: bool },
    Intersections {
        kind: ObserverKind,
        entries: Vec<IntersectionEntry>,
        #[serde(default)]
        now_ms: f64,
    },
    Media { target: ElementId, event: MediaEvent },
    /// Wheel, touch or key input that may trigger the title snap.
    Input { input: SnapInput },
    NavClick { index: usize, now_ms: f64 },
    TransitionEnd {
        target: ElementId,
        property: String,
        now_ms: f64,
    },
    ImageLoaded {
        zone: ElementId,
        index: usize,
        width: u32,
        height: u32,
    },
    ImageFailed { zone: ElementId, index: usize },
}

impl PageEvent {
    fn timestamp(&self) -> Option<f64> {
        match self {
            Self::Load { now_ms }
            | Self::Scroll { now_ms }
            | Self::Frame { now_ms }
            | Self::Timer { now_ms }
            | Self::NavClick { now_ms, .. }
            | Self::TransitionEnd { now_ms, .. } => Some(*now_ms),
            Self::Intersections { now_ms, .. } if *now_ms > 0.0 => Some(*now_ms),
            _ => None,
        }
    }
}

/// Everything the host must do in response to one event.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Effects {
    pub dom: Vec<DomPatch>,
    pub media: Vec<MediaOp>,
    pub canvas: Vec<CanvasCommand>,
    pub request_frame: bool,
    pub prevent_default: bool,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.dom.is_empty()
            && self.media.is_empty()
            && self.canvas.is_empty()
            && !self.request_frame
            && !self.prevent_default
    }

    pub fn merge(&mut self, other: Effects) {
        self.dom.extend(other.dom);
        self.media.extend(other.media);
        self.canvas.extend(other.canvas);
        self.request_frame |= other.request_frame;
        self.prevent_default |= other.prevent_default;
    }
}

pub struct Page {
    ctx: PageContext,
    media: MediaLifecycle,
    hero: Option<HeroBleed>,
    nav: Option<NavTracker>,
    sections: SectionTracker,
    snap: Option<(SnapInterceptor, ElementId)>,
    title: Option<TitleSequence>,
    zones: Vec<RevealZone>,
    observers: Vec<ObserverSpec>,
    trackers: BTreeMap<ObserverKind, IntersectionTracker>,
    torn_down: bool,
}

impl Page {
    /// Build every component present in `registry`. The returned effects put
    /// the page into its initial state.
    pub fn new(
        registry: &Registry,
        cfg: &EngineConfig,
        initial_hash: Option<&str>,
        probe: &dyn LayoutProbe,
    ) -> VitrineResult<(Self, Effects)> {
        registry.validate()?;
        cfg.validate()?;
        let ctx = PageContext::from_probe(probe);
        let mut effects = Effects::default();

        let (media, ops) = MediaLifecycle::new(&registry.videos, &cfg.media);
        effects.media = ops;

        let mut hero = HeroBleed::new(registry, &cfg.hero);
        if let Some(hero) = hero.as_mut() {
            effects.dom.extend(hero.on_resize(probe));
        }

        let nav = NavTracker::new(registry, &cfg.nav).map(|(nav, patches)| {
            effects.dom.extend(patches);
            nav
        });
        let sections = SectionTracker::new(registry, initial_hash, &cfg.nav);
        let snap = registry
            .snap_header
            .map(|header| (SnapInterceptor::new(initial_hash, &cfg.snap), header));
        let title = TitleSequence::new(&registry.titles, &cfg.title);
        let zones = registry
            .reveal_zones
            .iter()
            .map(|z| RevealZone::new(z.clone(), ctx.viewport, ctx.coarse_pointer, &cfg.reveal))
            .collect();

        let observers = observer_specs(registry, cfg)?;
        let trackers = observers
            .iter()
            .map(|spec| {
                let mut tracker = IntersectionTracker::new(spec.margin, &spec.thresholds);
                for &id in &spec.targets {
                    tracker.observe(id, spec.once);
                }
                (spec.kind, tracker)
            })
            .collect();

        tracing::debug!(
            videos = registry.videos.len(),
            heroes = registry.heroes.len(),
            zones = registry.reveal_zones.len(),
            "page initialized"
        );
        let page = Self {
            ctx,
            media,
            hero,
            nav,
            sections,
            snap,
            title,
            zones,
            observers,
            trackers,
            torn_down: false,
        };
        Ok((page, effects))
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    pub fn media(&self) -> &MediaLifecycle {
        &self.media
    }

    pub fn hero(&self) -> Option<&HeroBleed> {
        self.hero.as_ref()
    }

    pub fn nav(&self) -> Option<&NavTracker> {
        self.nav.as_ref()
    }

    pub fn sections(&self) -> &SectionTracker {
        &self.sections
    }

    pub fn snap(&self) -> Option<&SnapInterceptor> {
        self.snap.as_ref().map(|(s, _)| s)
    }

    pub fn title(&self) -> Option<&TitleSequence> {
        self.title.as_ref()
    }

    pub fn zones(&self) -> &[RevealZone] {
        &self.zones
    }

    pub fn observers(&self) -> &[ObserverSpec] {
        &self.observers
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[tracing::instrument(level = "trace", skip(self, probe))]
    pub fn handle(&mut self, event: PageEvent, probe: &dyn LayoutProbe) -> Effects {
        let mut fx = Effects::default();
        if self.torn_down {
            return fx;
        }
        if let Some(now) = event.timestamp() {
            self.ctx.now_ms = now;
        }

        match event {
            PageEvent::Load { .. } => {
                if let Some(inputs) = self.nav_inputs(probe)
                    && let Some(nav) = self.nav.as_mut()
                {
                    fx.dom.extend(nav.mark_ready(inputs));
                }
                if let Some(title) = self.title.as_mut() {
                    fx.dom.extend(title.start());
                }
            }
            PageEvent::Scroll { now_ms } => {
                fx.media.extend(self.media.on_user_gesture());
                let mut request = false;
                if let Some(hero) = self.hero.as_mut() {
                    request |= hero.on_scroll();
                }
                if let Some(nav) = self.nav.as_mut() {
                    request |= nav.on_scroll();
                }
                request |= self.sections.on_scroll(now_ms);
                fx.request_frame = request;
            }
            PageEvent::Resize => {
                self.ctx.viewport = probe.viewport();
                if let Some(hero) = self.hero.as_mut() {
                    fx.dom.extend(hero.on_resize(probe));
                }
                for zone in &mut self.zones {
                    fx.canvas.push(zone.resize(probe));
                }
            }
            PageEvent::Frame { now_ms } => self.frame(now_ms, probe, &mut fx),
            PageEvent::Timer { now_ms } => {
                fx.media.extend(self.media.on_timer(now_ms));
                if let Some(title) = self.title.as_mut() {
                    fx.dom.extend(title.tick(now_ms));
                }
            }
            PageEvent::PointerMove { x, y } => {
                if !self.ctx.coarse_pointer {
                    self.ctx.pointer = Point::new(x, y);
                }
            }
            PageEvent::Gesture => fx.media.extend(self.media.on_user_gesture()),
            PageEvent::VisibilityChange { hidden } => {
                self.ctx.hidden = hidden;
                fx.media.extend(self.media.on_visibility_change(hidden));
            }
            PageEvent::PageHide { persisted: false } => fx.merge(self.teardown()),
            PageEvent::PageHide { persisted: true } => self.ctx.hidden = true,
            PageEvent::PageShow { persisted } => {
                if persisted {
                    self.ctx.hidden = false;
                    fx.media.extend(self.media.on_visibility_change(false));
                    fx.request_frame = self.zones.iter().any(|z| z.wants_frame());
                }
            }
            PageEvent::Intersections { kind, entries, .. } => {
                self.route_entries(kind, &entries, probe, &mut fx);
            }
            PageEvent::Media { target, event } => {
                fx.media.extend(self.media.on_media_event(target, event));
            }
            PageEvent::Input { input } => {
                if matches!(input, SnapInput::TouchStart { .. }) {
                    fx.media.extend(self.media.on_user_gesture());
                }
                if let Some((snap, header)) = self.snap.as_mut() {
                    let ctx = SnapContext {
                        scroll_y: probe.scroll_y(),
                        viewport_height: self.ctx.viewport.height,
                        header_top: probe.client_rect(*header).map_or(0.0, |r| r.y0),
                    };
                    let out = snap.on_input(input, ctx);
                    fx.prevent_default = out.prevent_default;
                    fx.dom.extend(out.scroll);
                }
            }
            PageEvent::NavClick { index, now_ms } => {
                fx.dom.extend(self.sections.on_click(index, now_ms));
            }
            PageEvent::TransitionEnd {
                target,
                property,
                now_ms,
            } => {
                if let Some(title) = self.title.as_mut() {
                    fx.dom
                        .extend(title.on_transition_end(target, &property, now_ms));
                }
            }
            PageEvent::ImageLoaded {
                zone,
                index,
                width,
                height,
            } => {
                if let Some(z) = self.zones.iter_mut().find(|z| z.id() == zone) {
                    z.pool_mut().mark_loaded(index, width, height);
                }
            }
            PageEvent::ImageFailed { zone, index } => {
                if let Some(z) = self.zones.iter_mut().find(|z| z.id() == zone) {
                    z.pool_mut().mark_failed(index);
                }
            }
        }
        fx
    }

    /// Headless hosts: evaluate every observer against `probe` and route the
    /// resulting entries as if a native observer had delivered them.
    pub fn drive_intersections(&mut self, probe: &dyn LayoutProbe) -> Effects {
        let mut fx = Effects::default();
        if self.torn_down {
            return fx;
        }
        let viewport = probe.viewport();
        let batches: Vec<(ObserverKind, Vec<IntersectionEntry>)> = self
            .trackers
            .iter_mut()
            .map(|(&kind, tracker)| (kind, tracker.update(viewport, |id| probe.client_rect(id))))
            .filter(|(_, entries)| !entries.is_empty())
            .collect();
        for (kind, entries) in batches {
            self.route_entries(kind, &entries, probe, &mut fx);
        }
        fx
    }

    /// Stop every loop and release the page. Further events are ignored.
    pub fn teardown(&mut self) -> Effects {
        let mut fx = Effects::default();
        if std::mem::replace(&mut self.torn_down, true) {
            return fx;
        }
        for zone in &mut self.zones {
            if zone.is_active() {
                fx.canvas.push(zone.deactivate());
            }
        }
        for id in self.media.ids().collect::<Vec<_>>() {
            if self.media.element(id).is_some_and(|el| el.loaded() && !el.paused) {
                fx.media.push(MediaOp::Pause { target: id });
            }
        }
        self.trackers.clear();
        tracing::debug!("page torn down");
        fx
    }

    fn nav_inputs(&self, probe: &dyn LayoutProbe) -> Option<NavInputs> {
        let nav = self.nav.as_ref()?;
        Some(NavInputs {
            scroll_y: probe.scroll_y(),
            viewport: probe.viewport(),
            first_section_top: probe.offset_top(nav.first_section())?,
            end_section_top: nav.end_section().and_then(|id| probe.offset_top(id)),
        })
    }

    fn frame(&mut self, now_ms: f64, probe: &dyn LayoutProbe, fx: &mut Effects) {
        if let Some(hero) = self.hero.as_mut() {
            fx.dom.extend(hero.on_frame(probe));
        }
        if let Some(inputs) = self.nav_inputs(probe)
            && let Some(nav) = self.nav.as_mut()
        {
            fx.dom.extend(nav.on_frame(inputs));
        }
        fx.dom.extend(
            self.sections
                .on_frame(probe.scroll_y(), |id| probe.offset_top(id)),
        );

        let pointer = self.ctx.pointer;
        for zone in &mut self.zones {
            if let Some(cmd) = zone.on_frame(now_ms, pointer, probe) {
                fx.canvas.push(cmd);
            }
            fx.request_frame |= zone.wants_frame();
        }
    }

    fn route_entries(
        &mut self,
        kind: ObserverKind,
        entries: &[IntersectionEntry],
        probe: &dyn LayoutProbe,
        fx: &mut Effects,
    ) {
        match kind {
            ObserverKind::MediaPreload => {
                for e in entries {
                    fx.media.extend(self.media.on_preload_entry(e));
                }
            }
            ObserverKind::MediaPlayback => {
                for e in entries {
                    fx.media.extend(self.media.on_playback_entry(e));
                }
            }
            ObserverKind::RevealZone => {
                for e in entries {
                    if let Some(zone) = self.zones.iter_mut().find(|z| z.id() == e.target) {
                        let (cmds, request) = zone.on_intersection(e.is_intersecting, probe);
                        fx.canvas.extend(cmds);
                        fx.request_frame |= request;
                    }
                }
            }
            ObserverKind::ScrollReveal => {
                for e in entries.iter().filter(|e| e.is_intersecting) {
                    fx.dom.push(DomPatch::class(e.target, ClassName::Visible, true));
                }
            }
            ObserverKind::SectionRatio => {
                if !entries.is_empty() {
                    fx.dom
                        .extend(self.sections.on_ratio_entries(entries, self.ctx.now_ms));
                }
            }
        }
    }
}

fn observer_specs(registry: &Registry, cfg: &EngineConfig) -> VitrineResult<Vec<ObserverSpec>> {
    let parse = |s: &str| -> VitrineResult<RootMargin> {
        s.parse()
            .map_err(|e| VitrineError::config(format!("root margin '{s}': {e}")))
    };
    let videos: Vec<ElementId> = registry.videos.iter().map(|v| v.id).collect();
    let mut specs = Vec::new();
    if !videos.is_empty() {
        specs.push(ObserverSpec {
            kind: ObserverKind::MediaPreload,
            margin: parse(&cfg.media.preload_margin)?,
            thresholds: vec![0.0],
            targets: videos.clone(),
            once: true,
        });
        specs.push(ObserverSpec {
            kind: ObserverKind::MediaPlayback,
            margin: parse(&cfg.media.playback_margin)?,
            thresholds: vec![0.0],
            targets: videos,
            once: false,
        });
    }
    if !registry.reveal_zones.is_empty() {
        specs.push(ObserverSpec {
            kind: ObserverKind::RevealZone,
            margin: RootMargin::default(),
            thresholds: vec![cfg.reveal.activation_threshold],
            targets: registry.reveal_zones.iter().map(|z| z.id).collect(),
            once: false,
        });
    }
    if !registry.scroll_reveals.is_empty() {
        specs.push(ObserverSpec {
            kind: ObserverKind::ScrollReveal,
            margin: RootMargin::default(),
            thresholds: vec![cfg.scroll_reveal.threshold],
            targets: registry.scroll_reveals.clone(),
            once: true,
        });
    }
    if !registry.nav_links.is_empty() && !registry.sections.is_empty() {
        specs.push(ObserverSpec {
            kind: ObserverKind::SectionRatio,
            margin: RootMargin::default(),
            thresholds: cfg.nav.ratio_thresholds.clone(),
            targets: registry.sections.iter().map(|s| s.id).collect(),
            once: false,
        });
    }
    Ok(specs)
}
