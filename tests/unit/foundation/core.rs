use super::*;

#[test]
fn viewport_rejects_non_finite() {
    assert!(Viewport::new(f64::NAN, 10.0).is_err());
    assert!(Viewport::new(10.0, -1.0).is_err());
    let vp = Viewport::new(800.0, 600.0).unwrap();
    assert_eq!(vp.center(), Point::new(400.0, 300.0));
}

#[test]
fn frame_gate_collapses_requests_until_taken() {
    let mut gate = FrameGate::default();
    assert!(gate.arm());
    assert!(!gate.arm());
    assert!(!gate.arm());
    assert!(gate.take());
    assert!(!gate.take());
    assert!(gate.arm());
}

#[test]
fn frame_clock_starts_at_zero_and_clamps_dt() {
    let mut clock = FrameClock::new(50.0);
    let t = clock.tick(1000.0);
    assert_eq!(t.elapsed_s, 0.0);
    assert_eq!(t.dt_ms, 0.0);

    let t = clock.tick(1016.0);
    assert_eq!(t.dt_ms, 16.0);
    assert!((t.elapsed_s - 0.016).abs() < 1e-12);

    let t = clock.tick(5000.0);
    assert_eq!(t.dt_ms, 50.0);
}

#[test]
fn frame_clock_reset_moves_origin() {
    let mut clock = FrameClock::new(50.0);
    clock.tick(0.0);
    clock.tick(2000.0);
    clock.reset();
    let t = clock.tick(9000.0);
    assert_eq!(t.elapsed_s, 0.0);
    assert_eq!(t.dt_ms, 0.0);
}
