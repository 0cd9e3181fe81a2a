use super::*;

fn params() -> GridParams {
    // 1000 px viewport: cell 75, step 135, max distance 300.
    GridParams::resolve(1000.0, &RevealConfig::default())
}

fn ready(indices: &[usize]) -> Vec<ReadyImage> {
    indices
        .iter()
        .map(|&index| ReadyImage {
            index,
            width: 200,
            height: 100,
        })
        .collect()
}

fn sprite_at(sprites: &[SpriteDraw], center: Point) -> Option<&SpriteDraw> {
    sprites
        .iter()
        .find(|s| (s.rect.center() - center).hypot() < 1e-9)
}

#[test]
fn resolves_viewport_relative_geometry() {
    let p = params();
    assert!((p.cell - 75.0).abs() < 1e-9);
    assert!((p.step - 135.0).abs() < 1e-9);
    assert!((p.max_distance - 300.0).abs() < 1e-9);
    assert!((p.drift_y + 35.0).abs() < 1e-9);
    assert_eq!(p.dims(Size::new(1000.0, 600.0)), (10, 7));
}

#[test]
fn scale_is_full_at_focus_and_zero_at_max_distance() {
    let p = params();
    assert_eq!(p.scale_at(0.0), Some(4.0));
    assert_eq!(p.scale_at(150.0), Some(2.0));
    assert_eq!(p.scale_at(300.0), None);
    assert_eq!(p.scale_at(1000.0), None);
    // Smoothstep tail drops under the minimum before the edge.
    assert_eq!(p.scale_at(299.0), None);
}

#[test]
fn wrap_stays_in_half_open_range() {
    assert_eq!(wrap(-135.0, 1135.0, -136.0), 1134.0);
    assert_eq!(wrap(-135.0, 1135.0, 1135.0), -135.0);
    assert_eq!(wrap(-135.0, 1135.0, 500.0), 500.0);
}

#[test]
fn focused_cell_draws_at_max_scale() {
    let sprites = layout(
        &params(),
        Size::new(1000.0, 600.0),
        0.0,
        Point::ZERO,
        &ready(&[0]),
    );
    let s = sprite_at(&sprites, Point::ZERO).unwrap();
    assert!((s.rect.width() - 300.0).abs() < 1e-9);
    assert!((s.rect.height() - 150.0).abs() < 1e-9);
    for s in &sprites {
        assert!(s.rect.width() <= 300.0 + 1e-9);
    }
}

#[test]
fn grid_drifts_right_and_up() {
    let sprites = layout(
        &params(),
        Size::new(1000.0, 600.0),
        1.0,
        Point::new(50.0, -35.0),
        &ready(&[0]),
    );
    let s = sprite_at(&sprites, Point::new(50.0, -35.0)).unwrap();
    assert!((s.rect.width() - 300.0).abs() < 1e-9);
}

#[test]
fn images_cycle_by_running_cell_index() {
    let sprites = layout(
        &params(),
        Size::new(1000.0, 600.0),
        0.0,
        Point::new(67.5, 0.0),
        &ready(&[0, 2]),
    );
    // Row 0 starts at index 11 (row -1 has eleven cells), so (0,0) is 12.
    assert_eq!(sprite_at(&sprites, Point::ZERO).unwrap().image, 0);
    assert_eq!(
        sprite_at(&sprites, Point::new(135.0, 0.0)).unwrap().image,
        2
    );
}

#[test]
fn nothing_ready_draws_nothing() {
    let sprites = layout(
        &params(),
        Size::new(1000.0, 600.0),
        0.0,
        Point::ZERO,
        &[],
    );
    assert!(sprites.is_empty());
}

#[test]
fn drifting_cells_always_cover_the_canvas() {
    let p = params();
    let step = p.step;
    for extent in [
        Size::new(1000.0, 600.0),
        Size::new(1000.0, 800.0),
        Size::new(640.0, 1130.0),
    ] {
        let (cols, rows) = p.dims(extent);
        for i in 0..200 {
            let elapsed_s = i as f64 * 0.37;
            let centers = cell_centers(&p, extent, elapsed_s);
            assert_eq!(centers.len(), ((cols + 1) * (rows + 1)) as usize);

            for c in &centers {
                assert!(c.x >= -step && c.x < extent.width + step, "{c:?} at {elapsed_s}s");
                assert!(c.y >= -step && c.y < extent.height + step, "{c:?} at {elapsed_s}s");
            }

            let mut x = 0.0;
            while x <= extent.width {
                assert!(
                    centers.iter().any(|c| (c.x - x).abs() <= step),
                    "column gap at x={x} after {elapsed_s}s"
                );
                x += 10.0;
            }
            let mut y = 0.0;
            while y <= extent.height {
                assert!(
                    centers.iter().any(|c| (c.y - y).abs() <= step),
                    "row gap at y={y} after {elapsed_s}s"
                );
                y += 10.0;
            }
        }
    }
}

#[test]
fn far_focus_draws_nothing_but_keeps_the_grid() {
    let extent = Size::new(1000.0, 600.0);
    let far = Point::new(1.0e6, 1.0e6);
    assert!(layout(&params(), extent, 3.0, far, &ready(&[0])).is_empty());
    assert!(!cell_centers(&params(), extent, 3.0).is_empty());
}
