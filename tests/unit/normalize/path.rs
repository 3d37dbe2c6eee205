use super::*;

fn k(x: f64, y: f64) -> Knot {
    Knot {
        x,
        y,
        ..Knot::default()
    }
}

fn sub(points: Vec<Knot>, closed: Option<bool>) -> SourceSubpath {
    SourceSubpath {
        points,
        closed,
        ..SourceSubpath::default()
    }
}

#[test]
fn straight_triangle_is_local_and_closed() {
    let paths = [sub(vec![k(110.0, 20.0), k(150.0, 20.0), k(130.0, 60.0)], None)];
    let d = subpaths_to_path_data(&paths, Bounds::new(100.0, 10.0, 50.0, 50.0))
        .unwrap()
        .unwrap();
    assert_eq!(d, "M 10.00 10.00 L 50.00 10.00 L 30.00 50.00 Z");
}

#[test]
fn curved_segments_use_facing_handles() {
    let a = Knot {
        after_x: Some(5.0),
        after_y: Some(-5.0),
        ..k(0.0, 0.0)
    };
    let b = Knot {
        before_x: Some(15.0),
        before_y: Some(-5.0),
        ..k(20.0, 0.0)
    };
    let paths = [sub(vec![a, b], None)];
    let d = subpaths_to_path_data(&paths, Bounds::new(0.0, 0.0, 20.0, 5.0))
        .unwrap()
        .unwrap();
    // Two knots never close.
    assert_eq!(d, "M 0.00 0.00 C 5.00 -5.00 15.00 -5.00 20.00 0.00");
}

#[test]
fn curved_closing_segment_returns_to_first_knot() {
    let first = Knot {
        before_x: Some(-4.0),
        before_y: Some(0.0),
        ..k(0.0, 0.0)
    };
    let paths = [sub(vec![first, k(10.0, 0.0), k(10.0, 10.0)], Some(true))];
    let d = subpaths_to_path_data(&paths, Bounds::new(0.0, 0.0, 10.0, 10.0))
        .unwrap()
        .unwrap();
    assert!(d.ends_with("C 10.00 10.00 -4.00 0.00 0.00 0.00 Z"), "{d}");
}

#[test]
fn open_paths_stay_open_and_subpaths_are_joined() {
    let paths = [
        sub(vec![k(0.0, 0.0), k(1.0, 0.0), k(1.0, 1.0)], Some(false)),
        sub(vec![k(2.0, 2.0), k(3.0, 2.0), k(3.0, 3.0)], None),
    ];
    let d = subpaths_to_path_data(&paths, Bounds::default()).unwrap().unwrap();
    assert_eq!(
        d,
        "M 0.00 0.00 L 1.00 0.00 L 1.00 1.00 M 2.00 2.00 L 3.00 2.00 L 3.00 3.00 Z"
    );
}

#[test]
fn rect_primitive_without_knots_is_expanded() {
    let paths = [SourceSubpath {
        shape: SubpathShape::Rect,
        bounds: Some(Bounds::new(10.0, 10.0, 4.0, 2.0)),
        ..SourceSubpath::default()
    }];
    let d = subpaths_to_path_data(&paths, Bounds::new(10.0, 10.0, 4.0, 2.0))
        .unwrap()
        .unwrap();
    assert_eq!(d, "M 0.00 0.00 L 4.00 0.00 L 4.00 2.00 L 0.00 2.00 Z");
}

#[test]
fn empty_and_invalid_inputs() {
    assert_eq!(subpaths_to_path_data(&[], Bounds::default()).unwrap(), None);
    assert_eq!(
        subpaths_to_path_data(&[sub(vec![], None)], Bounds::default()).unwrap(),
        None
    );
    let bad = [sub(vec![k(f64::NAN, 0.0), k(1.0, 1.0)], None)];
    assert!(subpaths_to_path_data(&bad, Bounds::default()).is_err());
}
