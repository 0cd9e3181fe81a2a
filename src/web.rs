//! Browser host: resolves the page's elements, forwards DOM events to a
//! [`Page`] and applies the resulting [`Effects`].
//!
//! All state lives behind one `Rc`. Event closures hold a `Weak` back to it,
//! borrow the page only while handling, then apply effects with the borrow
//! released.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use js_sys::{Array, Function, Promise};
use wasm_bindgen::{JsCast, prelude::*};
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, Element, Event, EventTarget,
    HtmlCanvasElement, HtmlElement, HtmlImageElement, HtmlSourceElement, HtmlVideoElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent,
    MouseEvent, PageTransitionEvent, ScrollBehavior, ScrollRestoration, ScrollToOptions,
    TouchEvent, TransitionEvent, WheelEvent, Window,
};

use crate::{
    config::EngineConfig,
    dom::DomPatch,
    foundation::core::{ElementId, Rect, Size, Viewport},
    layout::LayoutProbe,
    media::{MediaEvent, MediaOp, ReadyState, SourcePair},
    observe::IntersectionEntry,
    page::{Effects, Page, PageEvent},
    registry::{HeroDesc, IdAllocator, NavDesc, Registry, RevealZoneDesc, SectionDesc, VideoDesc},
    reveal::CanvasCommand,
    snap::{SnapInput, SnapKey},
};

const ID_ATTR: &str = "data-vitrine-id";
const TIMER_MS: i32 = 100;

fn js_error(msg: impl Into<String>) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// Every element handed to the engine, indexed by its [`ElementId`].
#[derive(Default)]
struct ElementTable {
    ids: IdAllocator,
    elements: Vec<Element>,
}

impl ElementTable {
    fn register(&mut self, el: &Element) -> Result<ElementId, JsValue> {
        if let Some(id) = self.id_of(el) {
            return Ok(id);
        }
        let id = self.ids.alloc();
        el.set_attribute(ID_ATTR, &id.0.to_string())?;
        self.elements.push(el.clone());
        Ok(id)
    }

    fn id_of(&self, el: &Element) -> Option<ElementId> {
        let id = ElementId(el.get_attribute(ID_ATTR)?.parse().ok()?);
        (self.elements.get(id.0 as usize)? == el).then_some(id)
    }

    fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    fn html(&self, id: ElementId) -> Option<&HtmlElement> {
        self.get(id)?.dyn_ref::<HtmlElement>()
    }
}

fn query_all(root: &JsValue, selector: &str) -> Result<Vec<Element>, JsValue> {
    let list = if let Some(doc) = root.dyn_ref::<Document>() {
        doc.query_selector_all(selector)?
    } else if let Some(el) = root.dyn_ref::<Element>() {
        el.query_selector_all(selector)?
    } else {
        return Err(js_error("query root must be a document or an element"));
    };
    Ok((0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|n| n.dyn_into::<Element>().ok())
        .collect())
}

fn data_attr(el: &Element, name: &str) -> Option<String> {
    el.get_attribute(name).filter(|v| !v.trim().is_empty())
}

/// Walk the document once and resolve every element the engine touches.
fn build_registry(doc: &Document, table: &mut ElementTable) -> Result<Registry, JsValue> {
    let root: &JsValue = doc.as_ref();
    let mut registry = Registry::default();

    for el in query_all(root, ".lazy-video")? {
        let sources = SourcePair {
            webm: data_attr(&el, "data-src-webm"),
            mp4: data_attr(&el, "data-src-mp4"),
        };
        if sources.is_empty() {
            tracing::debug!("skipping .lazy-video without sources");
            continue;
        }
        registry.videos.push(VideoDesc {
            id: table.register(&el)?,
            sources,
        });
    }

    if let Some(wrap) = doc.query_selector(".content-wrap")? {
        registry.content_wrap = Some(table.register(&wrap)?);
    }
    for section in query_all(root, ".case-study:not(#section-4)")? {
        let Some(hero) = section.query_selector(".hero")? else {
            continue;
        };
        let graphic = match hero.query_selector(".hero-graphic-wrap")? {
            Some(gw) => Some(table.register(&gw)?),
            None => None,
        };
        registry.heroes.push(HeroDesc {
            id: table.register(&hero)?,
            graphic,
        });
    }

    for zone in query_all(root, ".cursor-reveal-zone")? {
        let Some(canvas) = zone.query_selector(".reveal-canvas")? else {
            continue;
        };
        let count = data_attr(&zone, "data-reveal-count")
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0);
        registry.reveal_zones.push(RevealZoneDesc {
            id: table.register(&zone)?,
            canvas: table.register(&canvas)?,
            prefix: zone.get_attribute("data-reveal-prefix").unwrap_or_default(),
            count,
        });
    }

    if let Some(nav) = doc.query_selector(".sticky-nav")?
        && let Some(links) = nav.query_selector(".nav-links")?
        && let Some(card) = nav.query_selector(".nav-card")?
    {
        let mut sides = Vec::new();
        for side in query_all(nav.as_ref(), ".nav-side")? {
            sides.push(table.register(&side)?);
        }
        registry.nav = Some(NavDesc {
            root: table.register(&nav)?,
            links: table.register(&links)?,
            card: table.register(&card)?,
            sides,
        });
    }
    if let Some(first) = doc.query_selector("#section-1")? {
        registry.first_section = Some(table.register(&first)?);
    }
    if let Some(end) = doc.query_selector(".end-section")? {
        registry.end_section = Some(table.register(&end)?);
    }

    for link in query_all(root, ".nav-link")? {
        let target = link
            .get_attribute("href")
            .and_then(|h| h.strip_prefix('#').map(str::to_string))
            .unwrap_or_default();
        registry.nav_links.push(table.register(&link)?);
        registry.link_targets.push(target);
    }
    for section in query_all(root, ".case-study, .interstitial-title")? {
        let anchor = section.id();
        if anchor.is_empty() {
            continue;
        }
        registry.sections.push(SectionDesc {
            id: table.register(&section)?,
            anchor,
        });
    }

    for el in query_all(root, ".animate-on-scroll, .title-reveal, .interstitial-title .blur-in")? {
        registry.scroll_reveals.push(table.register(&el)?);
    }
    for el in query_all(root, ".title-area > .blur-in")? {
        registry.titles.push(table.register(&el)?);
    }
    if let Some(header) = doc.query_selector("#section-1 .section-header")? {
        registry.snap_header = Some(table.register(&header)?);
    }

    tracing::debug!(elements = table.elements.len(), "registry built from document");
    Ok(registry)
}

/// Live layout queries against the document.
struct DomProbe<'a> {
    window: &'a Window,
    document: &'a Document,
    table: &'a ElementTable,
}

impl DomProbe<'_> {
    fn px(value: &str) -> f64 {
        value.trim().trim_end_matches("px").parse().unwrap_or(0.0)
    }
}

impl LayoutProbe for DomProbe<'_> {
    fn viewport(&self) -> Viewport {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(dim(self.window.inner_width()), dim(self.window.inner_height())).unwrap_or(
            Viewport {
                width: 0.0,
                height: 0.0,
            },
        )
    }

    fn client_width(&self) -> f64 {
        self.document
            .document_element()
            .map_or_else(|| self.viewport().width, |el| el.client_width() as f64)
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn client_rect(&self, id: ElementId) -> Option<Rect> {
        let r = self.table.get(id)?.get_bounding_client_rect();
        Some(Rect::new(r.x(), r.y(), r.x() + r.width(), r.y() + r.height()))
    }

    fn offset_top(&self, id: ElementId) -> Option<f64> {
        let r = self.table.get(id)?.get_bounding_client_rect();
        Some(r.y() + self.scroll_y())
    }

    fn content_width(&self, id: ElementId) -> Option<f64> {
        let el = self.table.get(id)?;
        let style = self.window.get_computed_style(el).ok()??;
        let pad = |side: &str| {
            style
                .get_property_value(side)
                .map_or(0.0, |v| Self::px(&v))
        };
        Some(el.client_width() as f64 - pad("padding-left") - pad("padding-right"))
    }

    /// Drops the size locks on the element and on its hero for the duration
    /// of the measurement, then puts them back.
    fn rest_size(&self, id: ElementId) -> Option<Size> {
        let el = self.table.get(id)?;
        let mut held: Vec<(HtmlElement, &str, String, String)> = Vec::new();
        let mut release = |target: &Element, props: &[&'static str]| {
            let Some(html) = target.dyn_ref::<HtmlElement>() else {
                return;
            };
            let style = html.style();
            for &prop in props {
                let value = style.get_property_value(prop).unwrap_or_default();
                if value.is_empty() {
                    continue;
                }
                let priority = style.get_property_priority(prop);
                let _ = style.remove_property(prop);
                held.push((html.clone(), prop, value, priority));
            }
        };
        release(el, &["max-width", "max-height"]);
        if let Ok(Some(hero)) = el.closest(".hero") {
            release(&hero, &["width", "max-width", "margin-left"]);
        }

        let r = el.get_bounding_client_rect();
        let size = Size::new(r.width(), r.height());
        for (html, prop, value, priority) in held {
            let _ = html
                .style()
                .set_property_with_priority(prop, &value, &priority);
        }
        Some(size)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn coarse_pointer(&self) -> bool {
        self.window
            .match_media("(pointer: coarse)")
            .ok()
            .flatten()
            .is_some_and(|m| m.matches())
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

struct Observer {
    inner: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

struct Host {
    window: Window,
    document: Document,
    table: ElementTable,
    page: RefCell<Page>,
    contexts: HashMap<ElementId, CanvasRenderingContext2d>,
    images: RefCell<HashMap<(ElementId, usize), HtmlImageElement>>,
    observers: RefCell<Vec<Observer>>,
    listeners: RefCell<Vec<Listener>>,
    snap_listeners: RefCell<Vec<Listener>>,
    image_callbacks: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
    raf: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    timer: RefCell<Option<(i32, Closure<dyn FnMut()>)>>,
    frame_pending: Cell<bool>,
}

impl Host {
    fn probe(&self) -> DomProbe<'_> {
        DomProbe {
            window: &self.window,
            document: &self.document,
            table: &self.table,
        }
    }

    fn now(&self) -> f64 {
        self.window
            .performance()
            .map_or_else(js_sys::Date::now, |p| p.now())
    }

    fn dispatch(self: &Rc<Self>, event: PageEvent) -> Effects {
        let fx = {
            let probe = self.probe();
            self.page.borrow_mut().handle(event, &probe)
        };
        self.apply(&fx);
        fx
    }

    fn apply(self: &Rc<Self>, fx: &Effects) {
        for patch in &fx.dom {
            if let Err(err) = self.apply_patch(patch) {
                tracing::debug!(?err, "dom patch failed");
            }
        }
        for op in &fx.media {
            if let Err(err) = self.apply_media(op) {
                tracing::debug!(?err, "media op failed");
            }
        }
        for cmd in &fx.canvas {
            if let Err(err) = self.apply_canvas(cmd) {
                tracing::debug!(?err, "canvas command failed");
            }
        }
        if fx.request_frame {
            self.schedule_frame();
        }
    }

    fn apply_patch(&self, patch: &DomPatch) -> Result<(), JsValue> {
        match patch {
            DomPatch::SetStyle {
                target,
                prop,
                value,
                important,
            } => {
                if let Some(el) = self.table.html(*target) {
                    let priority = if *important { "important" } else { "" };
                    el.style()
                        .set_property_with_priority(prop.css_name(), value, priority)?;
                }
            }
            DomPatch::RemoveStyle { target, prop } => {
                if let Some(el) = self.table.html(*target) {
                    el.style().remove_property(prop.css_name())?;
                }
            }
            DomPatch::ClearStyle { target } => {
                if let Some(el) = self.table.html(*target) {
                    el.style().set_css_text("");
                }
            }
            DomPatch::SetClass { target, class, on } => {
                if let Some(el) = self.table.get(*target) {
                    el.class_list().toggle_with_force(class.as_str(), *on)?;
                }
            }
            DomPatch::ReplaceHash { hash } => {
                let url = match hash {
                    Some(h) => h.clone(),
                    None => {
                        let loc = self.window.location();
                        format!("{}{}", loc.pathname()?, loc.search()?)
                    }
                };
                self.window
                    .history()?
                    .replace_state_with_url(&JsValue::NULL, "", Some(&url))?;
            }
            DomPatch::ScrollTo { top, smooth } => {
                let opts = ScrollToOptions::new();
                opts.set_top(*top);
                opts.set_behavior(if *smooth {
                    ScrollBehavior::Smooth
                } else {
                    ScrollBehavior::Auto
                });
                self.window.scroll_to_with_scroll_to_options(&opts);
            }
        }
        Ok(())
    }

    fn video(&self, id: ElementId) -> Option<&HtmlVideoElement> {
        self.table.get(id)?.dyn_ref::<HtmlVideoElement>()
    }

    fn apply_media(self: &Rc<Self>, op: &MediaOp) -> Result<(), JsValue> {
        match op {
            MediaOp::AssertAutoplay { target } => {
                if let Some(v) = self.video(*target) {
                    v.set_muted(true);
                    v.set_default_muted(true);
                    v.set_loop(false);
                    v.remove_attribute("loop")?;
                    v.set_attribute("muted", "")?;
                    v.set_attribute("playsinline", "")?;
                }
            }
            MediaOp::AppendSource { target, kind, url } => {
                if let Some(v) = self.video(*target) {
                    let source = self
                        .document
                        .create_element("source")?
                        .dyn_into::<HtmlSourceElement>()?;
                    source.set_src(url);
                    source.set_type(kind.mime());
                    v.append_child(&source)?;
                }
            }
            MediaOp::SetPreloadAuto { target } => {
                if let Some(v) = self.video(*target) {
                    v.set_preload("auto");
                }
            }
            MediaOp::Load { target } => {
                if let Some(v) = self.video(*target) {
                    v.load();
                }
            }
            MediaOp::Play { target } => {
                if let Some(v) = self.video(*target) {
                    let promise: Promise = v.play()?;
                    let weak = Rc::downgrade(self);
                    let id = *target;
                    let rejected = Closure::once(move |_err: JsValue| {
                        if let Some(host) = weak.upgrade() {
                            host.dispatch(PageEvent::Media {
                                target: id,
                                event: MediaEvent::PlayRejected,
                            });
                        }
                    });
                    let _ = promise.catch(&rejected);
                    rejected.forget();
                }
            }
            MediaOp::Pause { target } => {
                if let Some(v) = self.video(*target) {
                    v.pause()?;
                }
            }
            MediaOp::Seek { target, to } => {
                if let Some(v) = self.video(*target) {
                    v.set_current_time(*to);
                }
            }
        }
        Ok(())
    }

    fn apply_canvas(&self, cmd: &CanvasCommand) -> Result<(), JsValue> {
        match cmd {
            CanvasCommand::Resize {
                canvas,
                css_size,
                pixel_ratio,
            } => {
                let Some(el) = self
                    .table
                    .get(*canvas)
                    .and_then(|e| e.dyn_ref::<HtmlCanvasElement>())
                else {
                    return Ok(());
                };
                el.set_width((css_size.width * pixel_ratio).round().max(0.0) as u32);
                el.set_height((css_size.height * pixel_ratio).round().max(0.0) as u32);
                let style = el.style();
                style.set_property("width", &format!("{}px", css_size.width))?;
                style.set_property("height", &format!("{}px", css_size.height))?;
            }
            CanvasCommand::Clear { canvas } => {
                if let Some((ctx, el)) = self.context(*canvas) {
                    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
                    ctx.clear_rect(0.0, 0.0, el.width() as f64, el.height() as f64);
                }
            }
            CanvasCommand::Draw {
                canvas,
                pixel_ratio,
                sprites,
            } => {
                let Some((ctx, el)) = self.context(*canvas) else {
                    return Ok(());
                };
                ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
                ctx.clear_rect(0.0, 0.0, el.width() as f64, el.height() as f64);
                ctx.set_transform(*pixel_ratio, 0.0, 0.0, *pixel_ratio, 0.0, 0.0)?;
                let zone = self.zone_of_canvas(*canvas);
                let images = self.images.borrow();
                for sprite in sprites {
                    let Some(img) = zone.and_then(|z| images.get(&(z, sprite.image))) else {
                        continue;
                    };
                    let r = sprite.rect;
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        img,
                        r.x0,
                        r.y0,
                        r.width(),
                        r.height(),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn context(&self, canvas: ElementId) -> Option<(&CanvasRenderingContext2d, HtmlCanvasElement)> {
        let ctx = self.contexts.get(&canvas)?;
        Some((ctx, ctx.canvas()?))
    }

    fn zone_of_canvas(&self, canvas: ElementId) -> Option<ElementId> {
        self.page
            .borrow()
            .zones()
            .iter()
            .find(|z| z.canvas() == canvas)
            .map(|z| z.id())
    }

    fn schedule_frame(&self) {
        if self.frame_pending.replace(true) {
            return;
        }
        let raf = self.raf.borrow();
        let Some(cb) = raf.as_ref() else {
            self.frame_pending.set(false);
            return;
        };
        if self
            .window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .is_err()
        {
            self.frame_pending.set(false);
        }
    }

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        mut handler: impl FnMut(&Rc<Host>, Event) + 'static,
    ) -> Result<Listener, JsValue> {
        let weak = Rc::downgrade(self);
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(host) = weak.upgrade() {
                handler(&host, event);
            }
        });
        let opts = AddEventListenerOptions::new();
        opts.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            closure.as_ref().unchecked_ref(),
            &opts,
        )?;
        Ok(Listener {
            target: target.clone(),
            kind,
            closure,
        })
    }

    fn keep(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn install_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        let win: EventTarget = self.window.clone().into();
        let doc: EventTarget = self.document.clone().into();

        self.keep(self.listen(&win, "load", true, |h, _| {
            h.dispatch(PageEvent::Load { now_ms: h.now() });
        })?);
        self.keep(self.listen(&win, "scroll", true, |h, _| {
            h.dispatch(PageEvent::Scroll { now_ms: h.now() });
        })?);
        self.keep(self.listen(&win, "resize", true, |h, _| {
            h.dispatch(PageEvent::Resize);
        })?);
        self.keep(self.listen(&win, "mousemove", true, |h, e| {
            if let Some(m) = e.dyn_ref::<MouseEvent>() {
                h.dispatch(PageEvent::PointerMove {
                    x: m.client_x() as f64,
                    y: m.client_y() as f64,
                });
            }
        })?);
        for kind in ["click", "touchstart"] {
            self.keep(self.listen(&doc, kind, true, |h, _| {
                h.dispatch(PageEvent::Gesture);
            })?);
        }
        self.keep(self.listen(&doc, "visibilitychange", true, |h, _| {
            let hidden = h.document.hidden();
            h.dispatch(PageEvent::VisibilityChange { hidden });
        })?);
        self.keep(self.listen(&win, "pagehide", true, |h, e| {
            let persisted = e
                .dyn_ref::<PageTransitionEvent>()
                .is_some_and(|p| p.persisted());
            h.dispatch(PageEvent::PageHide { persisted });
            if h.page.borrow().is_torn_down() {
                h.teardown();
            }
        })?);
        self.keep(self.listen(&win, "pageshow", true, |h, e| {
            let persisted = e
                .dyn_ref::<PageTransitionEvent>()
                .is_some_and(|p| p.persisted());
            h.dispatch(PageEvent::PageShow { persisted });
        })?);

        self.install_media_listeners()?;
        self.install_nav_listeners()?;
        self.install_title_listeners()?;
        self.install_snap_listeners()?;
        Ok(())
    }

    fn install_media_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        let ids: Vec<ElementId> = self.page.borrow().media().ids().collect();
        for id in ids {
            let Some(el) = self.table.get(id) else {
                continue;
            };
            let target: EventTarget = el.clone().into();
            for kind in [
                "loadedmetadata",
                "loadeddata",
                "canplay",
                "playing",
                "pause",
                "ended",
                "stalled",
                "error",
                "timeupdate",
            ] {
                self.keep(self.listen(&target, kind, true, move |h, _| {
                    let Some(event) = h.media_event(id, kind) else {
                        return;
                    };
                    h.dispatch(PageEvent::Media { target: id, event });
                })?);
            }
        }
        Ok(())
    }

    fn media_event(&self, id: ElementId, kind: &str) -> Option<MediaEvent> {
        Some(match kind {
            "loadedmetadata" => MediaEvent::LoadedMetadata,
            "loadeddata" => MediaEvent::LoadedData,
            "canplay" => MediaEvent::CanPlay,
            "playing" => MediaEvent::Playing,
            "pause" => MediaEvent::Pause,
            "ended" => MediaEvent::Ended,
            "stalled" => MediaEvent::Stalled,
            "error" => MediaEvent::Error,
            "timeupdate" => MediaEvent::TimeUpdate {
                time: self.video(id)?.current_time(),
            },
            _ => return None,
        })
    }

    fn install_nav_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        let links: Vec<Element> = query_all(self.document.as_ref(), ".nav-link")?;
        for (index, link) in links.iter().enumerate() {
            let target: EventTarget = link.clone().into();
            self.keep(self.listen(&target, "click", true, move |h, _| {
                h.dispatch(PageEvent::NavClick {
                    index,
                    now_ms: h.now(),
                });
            })?);
        }
        Ok(())
    }

    fn install_title_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        for el in query_all(self.document.as_ref(), ".title-area > .blur-in")? {
            let Some(id) = self.table.id_of(&el) else {
                continue;
            };
            let target: EventTarget = el.into();
            self.keep(self.listen(&target, "transitionend", true, move |h, e| {
                let Some(t) = e.dyn_ref::<TransitionEvent>() else {
                    return;
                };
                h.dispatch(PageEvent::TransitionEnd {
                    target: id,
                    property: t.property_name(),
                    now_ms: h.now(),
                });
            })?);
        }
        Ok(())
    }

    /// Wheel, touch and key listeners for the title snap. They come off as
    /// soon as the snap fires or is disarmed.
    fn install_snap_listeners(self: &Rc<Self>) -> Result<(), JsValue> {
        let armed = self.page.borrow().snap().is_some_and(|s| s.is_armed());
        if !armed {
            return Ok(());
        }
        let win: EventTarget = self.window.clone().into();
        let snap = |h: &Rc<Host>, e: Event, input: SnapInput| {
            let fx = h.dispatch(PageEvent::Input { input });
            if fx.prevent_default {
                e.prevent_default();
            }
            let still_armed = h.page.borrow().snap().is_some_and(|s| s.is_armed());
            if !still_armed {
                for l in h.snap_listeners.borrow().iter() {
                    l.detach();
                }
            }
        };
        let mut listeners = vec![
            self.listen(&win, "wheel", false, move |h, e| {
                if let Some(w) = e.dyn_ref::<WheelEvent>() {
                    let input = SnapInput::Wheel {
                        delta_y: w.delta_y(),
                    };
                    snap(h, e, input);
                }
            })?,
            self.listen(&win, "touchstart", true, move |h, e| {
                if let Some(y) = touch_y(&e) {
                    snap(h, e, SnapInput::TouchStart { y });
                }
            })?,
            self.listen(&win, "touchmove", false, move |h, e| {
                if let Some(y) = touch_y(&e) {
                    snap(h, e, SnapInput::TouchMove { y });
                }
            })?,
        ];
        listeners.push(self.listen(&win, "keydown", false, move |h, e| {
            if let Some(k) = e.dyn_ref::<KeyboardEvent>() {
                let input = SnapInput::Key {
                    key: SnapKey::from_code(&k.code()),
                };
                snap(h, e, input);
            }
        })?);
        *self.snap_listeners.borrow_mut() = listeners;
        Ok(())
    }

    fn install_observers(self: &Rc<Self>) -> Result<(), JsValue> {
        let specs = self.page.borrow().observers().to_vec();
        for spec in specs {
            let weak = Rc::downgrade(self);
            let kind = spec.kind;
            let once = spec.once;
            let floor = spec.thresholds.iter().copied().fold(f64::INFINITY, f64::min);
            let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
                move |entries: Array, observer: IntersectionObserver| {
                    let Some(host) = weak.upgrade() else {
                        return;
                    };
                    let entries = host.collect_entries(&entries, &observer, floor, once);
                    if entries.is_empty() {
                        return;
                    }
                    host.dispatch(PageEvent::Intersections {
                        kind,
                        entries,
                        now_ms: host.now(),
                    });
                },
            );
            let init = IntersectionObserverInit::new();
            init.set_root_margin(&spec.margin.to_string());
            let thresholds: Array = spec
                .thresholds
                .iter()
                .map(|&t| JsValue::from_f64(t))
                .collect();
            init.set_threshold(&thresholds);
            let inner = IntersectionObserver::new_with_options(
                callback.as_ref().unchecked_ref::<Function>(),
                &init,
            )?;
            for id in &spec.targets {
                if let Some(el) = self.table.get(*id) {
                    inner.observe(el);
                }
            }
            tracing::debug!(?kind, targets = spec.targets.len(), "observer installed");
            self.observers.borrow_mut().push(Observer {
                inner,
                _callback: callback,
            });
        }
        Ok(())
    }

    /// Native entries to engine entries. `floor` is the lowest threshold:
    /// an element counts as intersecting only once it reaches it.
    fn collect_entries(
        &self,
        entries: &Array,
        observer: &IntersectionObserver,
        floor: f64,
        once: bool,
    ) -> Vec<IntersectionEntry> {
        let floor = if floor.is_finite() { floor } else { 0.0 };
        entries
            .iter()
            .filter_map(|v| v.dyn_into::<IntersectionObserverEntry>().ok())
            .filter_map(|e| {
                let target = e.target();
                let id = self.table.id_of(&target)?;
                let ratio = e.intersection_ratio();
                let is_intersecting = e.is_intersecting() && (floor <= 0.0 || ratio >= floor);
                if once && is_intersecting {
                    observer.unobserve(&target);
                }
                Some(IntersectionEntry {
                    target: id,
                    is_intersecting,
                    ratio,
                })
            })
            .collect()
    }

    fn load_reveal_images(self: &Rc<Self>) -> Result<(), JsValue> {
        let pools: Vec<(ElementId, Vec<String>)> = self
            .page
            .borrow()
            .zones()
            .iter()
            .map(|z| (z.id(), z.pool().urls().map(str::to_string).collect()))
            .collect();
        for (zone, urls) in pools {
            for (index, url) in urls.into_iter().enumerate() {
                let img = HtmlImageElement::new()?;
                let weak = Rc::downgrade(self);
                let loaded = img.clone();
                let on_load = Closure::<dyn FnMut(Event)>::new(move |_| {
                    if let Some(host) = weak.upgrade() {
                        host.dispatch(PageEvent::ImageLoaded {
                            zone,
                            index,
                            width: loaded.natural_width(),
                            height: loaded.natural_height(),
                        });
                    }
                });
                let weak = Rc::downgrade(self);
                let on_error = Closure::<dyn FnMut(Event)>::new(move |_| {
                    if let Some(host) = weak.upgrade() {
                        host.dispatch(PageEvent::ImageFailed { zone, index });
                    }
                });
                img.set_onload(Some(on_load.as_ref().unchecked_ref()));
                img.set_onerror(Some(on_error.as_ref().unchecked_ref()));
                img.set_src(&url);
                self.images.borrow_mut().insert((zone, index), img);
                self.image_callbacks
                    .borrow_mut()
                    .extend([on_load, on_error]);
            }
        }
        Ok(())
    }

    fn start_loops(self: &Rc<Self>) -> Result<(), JsValue> {
        let weak = Rc::downgrade(self);
        *self.raf.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |now: f64| {
            if let Some(host) = weak.upgrade() {
                host.frame_pending.set(false);
                host.dispatch(PageEvent::Frame { now_ms: now });
            }
        }));

        let weak = Rc::downgrade(self);
        let tick = Closure::<dyn FnMut()>::new(move || {
            if let Some(host) = weak.upgrade() {
                host.dispatch(PageEvent::Timer { now_ms: host.now() });
            }
        });
        let handle = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                TIMER_MS,
            )?;
        *self.timer.borrow_mut() = Some((handle, tick));
        Ok(())
    }

    /// Detach everything. Closures stay owned by the host so a listener may
    /// trigger its own teardown.
    fn teardown(self: &Rc<Self>) {
        let fx = self.page.borrow_mut().teardown();
        self.apply(&fx);
        for l in self.listeners.borrow().iter() {
            l.detach();
        }
        for l in self.snap_listeners.borrow().iter() {
            l.detach();
        }
        for o in self.observers.borrow().iter() {
            o.inner.disconnect();
        }
        if let Some((handle, _)) = self.timer.borrow().as_ref() {
            self.window.clear_interval_with_handle(*handle);
        }
    }
}

fn touch_y(e: &Event) -> Option<f64> {
    let t = e.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some(t.client_y() as f64)
}

/// Handle returned to JavaScript; dropping it tears the page down.
#[wasm_bindgen]
pub struct VitrineHost {
    inner: Rc<Host>,
}

#[wasm_bindgen]
impl VitrineHost {
    /// Resolve the document, build the page and start listening.
    /// `config_json` overrides [`EngineConfig`] defaults.
    pub fn mount(config_json: Option<String>) -> Result<VitrineHost, JsValue> {
        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let document = window.document().ok_or_else(|| js_error("no document"))?;
        let cfg = match config_json {
            Some(s) => EngineConfig::from_json_str(&s).map_err(|e| js_error(e.to_string()))?,
            None => EngineConfig::default(),
        };

        let mut table = ElementTable::default();
        let registry = build_registry(&document, &mut table)?;

        let mut contexts = HashMap::new();
        for zone in &registry.reveal_zones {
            let Some(canvas) = table
                .get(zone.canvas)
                .and_then(|e| e.dyn_ref::<HtmlCanvasElement>())
            else {
                continue;
            };
            let ctx = canvas
                .get_context("2d")?
                .ok_or_else(|| js_error("2d context unavailable"))?
                .dyn_into::<CanvasRenderingContext2d>()?;
            contexts.insert(zone.canvas, ctx);
        }

        let hash = window.location().hash().unwrap_or_default();
        let initial_hash = (!hash.is_empty()).then_some(hash.as_str());
        let (page, init) = {
            let probe = DomProbe {
                window: &window,
                document: &document,
                table: &table,
            };
            Page::new(&registry, &cfg, initial_hash, &probe)
                .map_err(|e| js_error(e.to_string()))?
        };

        let inner = Rc::new(Host {
            window,
            document,
            table,
            page: RefCell::new(page),
            contexts,
            images: RefCell::default(),
            observers: RefCell::default(),
            listeners: RefCell::default(),
            snap_listeners: RefCell::default(),
            image_callbacks: RefCell::default(),
            raf: RefCell::default(),
            timer: RefCell::default(),
            frame_pending: Cell::new(false),
        });
        inner.restore_initial_scroll(initial_hash)?;
        inner.start_loops()?;
        inner.apply(&init);
        inner.install_listeners()?;
        inner.install_observers()?;
        inner.load_reveal_images()?;
        Ok(VitrineHost { inner })
    }

    /// Current media ready states, for debugging from the console.
    #[wasm_bindgen(js_name = mediaSnapshot)]
    pub fn media_snapshot(&self) -> Result<JsValue, JsValue> {
        let page = self.inner.page.borrow();
        let states: Vec<(u32, String, bool)> = page
            .media()
            .ids()
            .filter_map(|id| page.media().element(id))
            .map(|el| {
                let ready = ReadyState::from_raw(
                    self.inner.video(el.id).map_or(0, |v| v.ready_state()),
                );
                (el.id.0, format!("{:?}/{ready:?}", el.state), el.in_view)
            })
            .collect();
        serde_json::to_string(&states)
            .map(|s| JsValue::from_str(&s))
            .map_err(|e| js_error(e.to_string()))
    }

    pub fn teardown(&self) {
        self.inner.teardown();
    }
}

impl Drop for VitrineHost {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl Host {
    /// Start at the fragment's element when it exists, else at the top.
    fn restore_initial_scroll(&self, initial_hash: Option<&str>) -> Result<(), JsValue> {
        self.window
            .history()?
            .set_scroll_restoration(ScrollRestoration::Manual)?;
        let target = initial_hash
            .and_then(|h| h.strip_prefix('#'))
            .and_then(|id| self.document.get_element_by_id(id));
        match target {
            Some(el) => el.scroll_into_view(),
            None => self.window.scroll_to_with_x_and_y(0.0, 0.0),
        }
        Ok(())
    }
}
