use super::*;

const ROOT: ElementId = ElementId(1);
const LINKS: ElementId = ElementId(2);
const CARD: ElementId = ElementId(3);
const SIDE: ElementId = ElementId(4);
const S1: ElementId = ElementId(10);
const END: ElementId = ElementId(11);

fn registry() -> Registry {
    Registry {
        nav: Some(NavDesc {
            root: ROOT,
            links: LINKS,
            card: CARD,
            sides: vec![SIDE],
        }),
        first_section: Some(S1),
        end_section: Some(END),
        nav_links: vec![ElementId(20), ElementId(21), ElementId(22)],
        link_targets: vec![
            "section-1".into(),
            "section-2".into(),
            "section-3".into(),
        ],
        sections: vec![
            SectionDesc {
                id: ElementId(30),
                anchor: "section-1".into(),
            },
            SectionDesc {
                id: ElementId(31),
                anchor: "section-2".into(),
            },
            SectionDesc {
                id: ElementId(32),
                anchor: "section-3".into(),
            },
        ],
        ..Registry::default()
    }
}

fn inputs(scroll_y: f64, width: f64) -> NavInputs {
    NavInputs {
        scroll_y,
        viewport: Viewport::new(width, 800.0).unwrap(),
        first_section_top: 1000.0,
        end_section_top: Some(5000.0),
    }
}

fn has_class(patches: &[DomPatch], class: ClassName, on: bool) -> bool {
    patches.contains(&DomPatch::class(ROOT, class, on))
}

#[test]
fn starts_collapsed() {
    let (nav, patches) = NavTracker::new(&registry(), &NavConfig::default()).unwrap();
    assert_eq!(nav.state(), NavState::default());
    assert!(has_class(&patches, ClassName::Expanded, false));
    assert!(patches.contains(&DomPatch::style(LINKS, StyleProp::MaxWidth, "0", true)));
    assert!(patches.contains(&DomPatch::style(CARD, StyleProp::FlexGrow, "0", true)));
}

#[test]
fn expands_past_first_section_and_yields_to_at_end() {
    let (mut nav, _) = NavTracker::new(&registry(), &NavConfig::default()).unwrap();

    nav.evaluate(inputs(850.0, 1280.0));
    assert!(!nav.state().expanded);

    let p = nav.evaluate(inputs(950.0, 1280.0));
    assert!(nav.state().expanded);
    assert!(has_class(&p, ClassName::Expanded, true));
    assert!(p.contains(&DomPatch::ClearStyle { target: LINKS }));

    // end top 5000, half viewport 400: at-end beyond 4600.
    let p = nav.evaluate(inputs(4700.0, 1280.0));
    let s = nav.state();
    assert!(s.at_end);
    assert!(!s.expanded);
    assert!(has_class(&p, ClassName::AtEnd, true));
    assert!(has_class(&p, ClassName::Expanded, false));
}

#[test]
fn mobile_never_reaches_at_end() {
    let (mut nav, _) = NavTracker::new(&registry(), &NavConfig::default()).unwrap();
    nav.evaluate(inputs(4700.0, 600.0));
    assert!(!nav.state().at_end);
    assert!(nav.state().expanded);
}

#[test]
fn shallow_first_section_skips_evaluation() {
    let (mut nav, _) = NavTracker::new(&registry(), &NavConfig::default()).unwrap();
    let mut i = inputs(950.0, 1280.0);
    i.first_section_top = 150.0;
    assert!(nav.evaluate(i).is_empty());
}

#[test]
fn ready_clears_collapse_overrides() {
    let (mut nav, _) = NavTracker::new(&registry(), &NavConfig::default()).unwrap();
    let p = nav.mark_ready(inputs(0.0, 1280.0));
    assert!(nav.state().ready);
    let last_collapse = p
        .iter()
        .rposition(|x| *x == DomPatch::style(LINKS, StyleProp::MaxWidth, "0", true))
        .unwrap();
    let clear = p
        .iter()
        .rposition(|x| *x == DomPatch::ClearStyle { target: LINKS })
        .unwrap();
    assert!(clear > last_collapse);

    // At the end the collapse overrides stay.
    let p = nav.evaluate(inputs(4700.0, 1280.0));
    assert!(!p.contains(&DomPatch::ClearStyle { target: LINKS }));
}

#[test]
fn nav_frame_is_gated() {
    let (mut nav, _) = NavTracker::new(&registry(), &NavConfig::default()).unwrap();
    assert!(nav.on_frame(inputs(950.0, 1280.0)).is_empty());
    assert!(nav.on_scroll());
    assert!(!nav.on_scroll());
    assert!(!nav.on_frame(inputs(950.0, 1280.0)).is_empty());
}

fn tops(id: ElementId) -> Option<f64> {
    match id.0 {
        30 => Some(1000.0),
        31 => Some(3000.0),
        32 => Some(5000.0),
        _ => None,
    }
}

fn active_link(patches: &[DomPatch]) -> Option<ElementId> {
    patches.iter().find_map(|p| match p {
        DomPatch::SetClass {
            target,
            class: ClassName::Active,
            on: true,
        } => Some(*target),
        _ => None,
    })
}

#[test]
fn scroll_scan_tracks_section_and_hash() {
    let mut t = SectionTracker::new(&registry(), None, &NavConfig::default());

    assert!(t.on_scroll(0.0));
    let p = t.on_frame(3100.0, tops);
    assert!(p.contains(&DomPatch::ReplaceHash {
        hash: Some("#section-2".into())
    }));
    assert_eq!(active_link(&p), Some(ElementId(21)));
    assert_eq!(t.active(), Some(1));

    // Same section again: no duplicate hash write.
    t.on_scroll(10.0);
    let p = t.on_frame(3200.0, tops);
    assert!(!p.iter().any(|x| matches!(x, DomPatch::ReplaceHash { .. })));

    // Above every section: hash stripped, nothing active.
    t.on_scroll(20.0);
    let p = t.on_frame(0.0, tops);
    assert!(p.contains(&DomPatch::ReplaceHash { hash: None }));
    assert_eq!(active_link(&p), None);
}

#[test]
fn header_offset_counts_toward_the_next_section() {
    let mut t = SectionTracker::new(&registry(), None, &NavConfig::default());
    t.on_scroll(0.0);
    t.on_frame(2890.0, tops);
    assert_eq!(t.active(), Some(1));
}

#[test]
fn click_locks_tracking() {
    let mut t = SectionTracker::new(&registry(), None, &NavConfig::default());
    let p = t.on_click(2, 1000.0);
    assert_eq!(active_link(&p), Some(ElementId(22)));
    assert!(!t.on_scroll(1500.0));
    let entry = IntersectionEntry {
        target: ElementId(30),
        is_intersecting: true,
        ratio: 0.9,
    };
    assert!(t.on_ratio_entries(&[entry], 1500.0).is_empty());
    assert!(t.on_scroll(1800.0));

    // The click already recorded the hash.
    let p = t.on_frame(5100.0, tops);
    assert!(!p.iter().any(|x| matches!(x, DomPatch::ReplaceHash { .. })));
}

#[test]
fn ratio_map_picks_the_most_visible_section() {
    let mut t = SectionTracker::new(&registry(), None, &NavConfig::default());
    let e = |id: u32, ratio: f64| IntersectionEntry {
        target: ElementId(id),
        is_intersecting: ratio > 0.0,
        ratio,
    };
    let p = t.on_ratio_entries(&[e(30, 0.2), e(31, 0.6)], 0.0);
    assert_eq!(active_link(&p), Some(ElementId(21)));

    let p = t.on_ratio_entries(&[e(31, 0.1)], 0.0);
    assert_eq!(active_link(&p), Some(ElementId(20)));

    let p = t.on_ratio_entries(&[e(30, 0.01), e(31, 0.0)], 0.0);
    assert_eq!(active_link(&p), None);
    assert_eq!(t.active(), None);
}
