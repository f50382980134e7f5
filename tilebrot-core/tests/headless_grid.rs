use tilebrot_core::{Complex, Escape, Evaluator, Mandelbrot, ViewParams};

/// Evaluate every pixel of a view into a flat row-major Vec.
fn evaluate_grid<E: Evaluator>(evaluator: &E, view: &ViewParams) -> Vec<Escape> {
    let mut results = Vec::with_capacity(view.pixel_count());
    for y in 0..view.height {
        for x in 0..view.width {
            results.push(evaluator.evaluate(view.pixel_to_plane(x, y), view.max_steps));
        }
    }
    results
}

#[test]
fn default_view_has_inside_and_outside_points() {
    let view = ViewParams::initial(120, 80).unwrap();
    let results = evaluate_grid(&Mandelbrot, &view);

    assert_eq!(results.len(), 120 * 80);
    let inside = results.iter().filter(|r| r.is_inside()).count();
    let escaped = results.len() - inside;
    assert!(inside > 0, "the default view should show part of the set");
    assert!(escaped > 0, "the default view should show escaping points");
}

#[test]
fn eight_by_eight_scenario() {
    let view = ViewParams::new(8, 8, Complex::new(-0.5, 0.0), 1.0, 1024).unwrap();
    let results = evaluate_grid(&Mandelbrot, &view);

    for (x, y) in [(0, 0), (7, 0), (0, 7), (7, 7)] {
        let r = results[view.index(x, y)];
        assert!(!r.is_inside(), "corner ({x}, {y}) should escape");
        assert!(r.value() > 0.0);
    }

    let (cx, cy) = view.plane_to_pixel(Complex::new(-0.5, 0.0));
    assert_eq!(results[view.index(cx as u32, cy as u32)].value(), 0.0);
}

#[test]
fn grid_evaluation_is_deterministic() {
    let view = ViewParams::new(64, 48, Complex::new(-0.75, 0.1), 12.0, 500).unwrap();
    let run1 = evaluate_grid(&Mandelbrot, &view);
    let run2 = evaluate_grid(&Mandelbrot, &view);
    let bits = |r: &[Escape]| r.iter().map(|e| e.value().to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&run1), bits(&run2));
}
