use super::*;

fn at(top: f64) -> impl FnMut(ElementId) -> Option<Rect> {
    move |_| Some(Rect::new(0.0, top, 10.0, top + 100.0))
}

fn vp() -> Viewport {
    Viewport::new(1000.0, 800.0).unwrap()
}

#[test]
fn margin_shorthand_parses_one_to_four_components() {
    let m: RootMargin = "200% 0px".parse().unwrap();
    assert_eq!(m.top, MarginLen::Percent(200.0));
    assert_eq!(m.right, MarginLen::Px(0.0));
    assert_eq!(m.bottom, MarginLen::Percent(200.0));
    assert_eq!(m.left, MarginLen::Px(0.0));

    let m: RootMargin = "10px".parse().unwrap();
    assert_eq!(m.left, MarginLen::Px(10.0));

    let m: RootMargin = "1px 2px 3px 4px".parse().unwrap();
    assert_eq!(m.bottom, MarginLen::Px(3.0));
    assert_eq!(m.left, MarginLen::Px(4.0));

    assert!("".parse::<RootMargin>().is_err());
    assert!("5em".parse::<RootMargin>().is_err());
    assert!("1px 1px 1px 1px 1px".parse::<RootMargin>().is_err());
}

#[test]
fn percent_margins_resolve_per_axis() {
    let m: RootMargin = "50% 0px".parse().unwrap();
    let r = m.expand(vp());
    assert_eq!(r, Rect::new(0.0, -400.0, 1000.0, 1200.0));
}

#[test]
fn ratio_is_covered_fraction() {
    let root = vp().rect();
    let (hit, ratio) = intersection_ratio(Rect::new(0.0, 700.0, 100.0, 900.0), root);
    assert!(hit);
    assert!((ratio - 0.5).abs() < 1e-12);

    let (hit, ratio) = intersection_ratio(Rect::new(0.0, 900.0, 100.0, 1000.0), root);
    assert!(!hit);
    assert_eq!(ratio, 0.0);
}

#[test]
fn emits_on_first_evaluation_and_only_on_crossings() {
    let mut t = IntersectionTracker::new(RootMargin::default(), &[0.1]);
    let id = ElementId(1);
    t.observe(id, false);

    let mut top = 2000.0;
    let run = |t: &mut IntersectionTracker, top: f64| {
        t.update(vp(), |_| Some(Rect::new(0.0, top, 100.0, top + 100.0)))
    };

    let e = run(&mut t, top);
    assert_eq!(e.len(), 1);
    assert!(!e[0].is_intersecting);

    top = 1500.0;
    assert!(run(&mut t, top).is_empty());

    // 5% visible: below the threshold.
    top = 795.0;
    assert!(run(&mut t, top).is_empty());

    top = 750.0;
    let e = run(&mut t, top);
    assert_eq!(e.len(), 1);
    assert!(e[0].is_intersecting);
    assert!((e[0].ratio - 0.5).abs() < 1e-12);

    top = 100.0;
    assert!(run(&mut t, top).is_empty());

    top = -500.0;
    let e = run(&mut t, top);
    assert_eq!(e.len(), 1);
    assert!(!e[0].is_intersecting);
}

#[test]
fn once_targets_are_dropped_after_intersecting() {
    let mut t = IntersectionTracker::new(RootMargin::default(), &[0.1]);
    t.observe(ElementId(7), true);
    let e = t.update(vp(), |_| Some(Rect::new(0.0, 10.0, 10.0, 20.0)));
    assert_eq!(e.len(), 1);
    assert!(!t.is_observing(ElementId(7)));
    assert!(t.update(vp(), |_| Some(Rect::new(0.0, 10.0, 10.0, 20.0))).is_empty());
}

#[test]
fn multi_threshold_reports_each_band() {
    let mut t = IntersectionTracker::new(RootMargin::default(), &[0.0, 0.5, 1.0]);
    t.observe(ElementId(1), false);
    assert_eq!(t.update(vp(), at(780.0)).len(), 1); // 20%
    assert!(t.update(vp(), at(760.0)).is_empty()); // 40%, same band
    let e = t.update(vp(), at(740.0)); // 60%
    assert_eq!(e.len(), 1);
    assert!(e[0].ratio > 0.5);
    let e = t.update(vp(), at(0.0));
    assert_eq!(e.len(), 1);
    assert_eq!(e[0].ratio, 1.0);
}

#[test]
fn detached_elements_are_skipped() {
    let mut t = IntersectionTracker::new(RootMargin::default(), &[0.0]);
    t.observe(ElementId(1), false);
    assert!(t.update(vp(), |_| None).is_empty());
}
