use super::*;
use crate::{
    foundation::core::{Rect, Viewport},
    layout::{ElementBox, StaticLayout},
    registry::HeroDesc,
};

const WRAP: ElementId = ElementId(1);
const HERO: ElementId = ElementId(2);
const GRAPHIC: ElementId = ElementId(3);

fn setup(hero_top: f64) -> (HeroBleed, StaticLayout) {
    let registry = Registry {
        content_wrap: Some(WRAP),
        heroes: vec![HeroDesc {
            id: HERO,
            graphic: Some(GRAPHIC),
        }],
        ..Registry::default()
    };
    let mut layout = StaticLayout::new(Viewport::new(1200.0, 800.0).unwrap());
    layout.insert(ElementBox {
        id: WRAP,
        rect: Rect::new(100.0, 0.0, 1100.0, 5000.0),
        content_width: Some(800.0),
        rest_size: None,
    });
    layout.insert(ElementBox {
        id: HERO,
        rect: Rect::new(200.0, hero_top, 1000.0, hero_top + 500.0),
        content_width: None,
        rest_size: None,
    });
    layout.insert(ElementBox {
        id: GRAPHIC,
        rect: Rect::new(200.0, hero_top, 1000.0, hero_top + 450.0),
        content_width: None,
        rest_size: Some(Size::new(800.0, 450.0)),
    });
    let mut hero = HeroBleed::new(&registry, &HeroConfig::default()).unwrap();
    hero.remeasure(&layout);
    (hero, layout)
}

fn width_of(patches: &[DomPatch]) -> Option<&str> {
    patches.iter().find_map(|p| match p {
        DomPatch::SetStyle {
            target,
            prop: StyleProp::Width,
            value,
            important: true,
        } if *target == HERO => Some(value.as_str()),
        _ => None,
    })
}

#[test]
fn progress_endpoints_and_midpoint() {
    let e = Ease::Smoothstep;
    assert_eq!(bleed_progress(800.0, 800.0, e), 0.0);
    assert_eq!(bleed_progress(800.0, 0.0, e), 1.0);
    assert_eq!(bleed_progress(800.0, 400.0, e), 1.0);
    assert_eq!(bleed_progress(800.0, 1200.0, e), 0.0);
    assert_eq!(bleed_progress(0.0, 0.0, e), 0.0);
}

#[test]
fn progress_is_monotonic_as_the_hero_rises() {
    let mut prev = -1.0;
    for i in 0..=800 {
        let top = 800.0 - f64::from(i);
        let p = bleed_progress(800.0, top, Ease::Smoothstep);
        assert!(p >= prev, "p dropped at top={top}");
        assert!((0.0..=1.0).contains(&p));
        prev = p;
    }
}

#[test]
fn remeasure_pins_graphic_and_exports_natural_width() {
    let (mut hero, layout) = setup(2000.0);
    let patches = hero.remeasure(&layout);
    assert_eq!(hero.natural_width(), 800.0);
    assert!(patches.contains(&DomPatch::px(
        HERO,
        StyleProp::HeroNaturalWidth,
        800.0,
        false
    )));
    let remove_at = patches
        .iter()
        .position(|p| *p == DomPatch::remove(GRAPHIC, StyleProp::MaxWidth))
        .unwrap();
    let lock_at = patches
        .iter()
        .position(|p| *p == DomPatch::px(GRAPHIC, StyleProp::MaxWidth, 800.0, false))
        .unwrap();
    assert!(remove_at < lock_at);
    assert!(patches.contains(&DomPatch::px(
        GRAPHIC,
        StyleProp::MaxHeight,
        450.0,
        false
    )));
    assert_eq!(hero.targets()[0].graphic_lock, Some(Size::new(800.0, 450.0)));
}

#[test]
fn half_viewport_rise_applies_full_bleed() {
    let (mut hero, mut layout) = setup(1400.0);
    layout.scroll_y = 1000.0; // hero top at 400 = vh / 2
    let patches = hero.update(&layout);
    assert_eq!(width_of(&patches), Some("1200px"));
    assert!(patches.contains(&DomPatch::style(HERO, StyleProp::MaxWidth, "none", true)));
    assert!(patches.contains(&DomPatch::px(HERO, StyleProp::MarginLeft, -200.0, true)));
    assert_eq!(hero.targets()[0].current_extra, Some(400.0));
}

#[test]
fn partial_rise_is_symmetric() {
    let (mut hero, mut layout) = setup(1400.0);
    layout.scroll_y = 800.0; // top at 600: raw 0.5, smoothstep 0.5
    let patches = hero.update(&layout);
    assert_eq!(width_of(&patches), Some("1000px"));
    assert!(patches.contains(&DomPatch::px(HERO, StyleProp::MarginLeft, -100.0, true)));
}

#[test]
fn leaving_the_viewport_removes_the_override_once() {
    let (mut hero, mut layout) = setup(1400.0);
    layout.scroll_y = 1000.0;
    hero.update(&layout);

    layout.scroll_y = 0.0; // top at 1400, below the fold
    let patches = hero.update(&layout);
    assert_eq!(patches.len(), 3);
    assert!(patches.contains(&DomPatch::remove(HERO, StyleProp::Width)));
    assert!(hero.targets()[0].current_extra.is_none());
    assert!(hero.update(&layout).is_empty());
}

#[test]
fn tiny_progress_counts_as_none() {
    let (mut hero, mut layout) = setup(1400.0);
    layout.scroll_y = 601.0; // top at 799: raw 0.0025
    assert!(hero.update(&layout).is_empty());
}

#[test]
fn no_room_to_bleed_is_a_noop() {
    let (mut hero, mut layout) = setup(1400.0);
    layout.client_width = Some(800.0);
    layout.scroll_y = 1000.0;
    assert!(hero.update(&layout).is_empty());
}

#[test]
fn scroll_frames_compute_once_per_frame() {
    let (mut hero, mut layout) = setup(1400.0);
    layout.scroll_y = 1000.0;
    assert!(hero.on_scroll());
    assert!(!hero.on_scroll());
    assert!(!hero.on_frame(&layout).is_empty());
    assert!(hero.on_frame(&layout).is_empty());
}

#[test]
fn missing_wrapper_disables_the_component() {
    let registry = Registry {
        heroes: vec![HeroDesc {
            id: HERO,
            graphic: None,
        }],
        ..Registry::default()
    };
    assert!(HeroBleed::new(&registry, &HeroConfig::default()).is_none());
}
