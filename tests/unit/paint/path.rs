use super::*;

#[test]
fn incremental_and_parsed_paths_are_equivalent() {
    let mut built = Path::new();
    built.move_to((0.0, 0.0));
    built.line_to((10.0, 0.0));
    built.curve_to((10.0, 10.0), (0.0, 10.0), (0.0, 0.0));

    let parsed = Path::parse("M0,0 L10,0 C10,10 0,10 0,0").unwrap();
    assert_eq!(built, parsed);
    assert_eq!(parsed.segments().len(), 3);
}

#[test]
fn appends_preserve_insertion_order() {
    let mut p = Path::new();
    p.line_to((1.0, 1.0));
    p.move_to((2.0, 2.0));
    assert_eq!(
        p.segments(),
        &[
            PathSegment::LineTo(Point::new(1.0, 1.0)),
            PathSegment::MoveTo(Point::new(2.0, 2.0)),
        ]
    );
    assert!(!p.is_renderable());
    assert!(p.bounds().is_none());
}

#[test]
fn close_becomes_line_to_subpath_start() {
    let p = Path::parse("M1,1 L5,1 L5,5 Z").unwrap();
    assert_eq!(p.segments().last(), Some(&PathSegment::LineTo(Point::new(1.0, 1.0))));
}

#[test]
fn relative_and_quadratic_commands_normalize() {
    let p = Path::parse("m 2 2 l 3 0 q 3 0 3 3").unwrap();
    assert_eq!(p.segments()[0], PathSegment::MoveTo(Point::new(2.0, 2.0)));
    assert_eq!(p.segments()[1], PathSegment::LineTo(Point::new(5.0, 2.0)));
    match p.segments()[2] {
        PathSegment::CurveTo(c1, c2, end) => {
            assert_eq!(end, Point::new(8.0, 5.0));
            assert!((c1.x - 7.0).abs() < 1e-9 && (c1.y - 2.0).abs() < 1e-9);
            assert!((c2.x - 8.0).abs() < 1e-9 && (c2.y - 3.0).abs() < 1e-9);
        }
        other => panic!("expected cubic, got {other:?}"),
    }
}

#[test]
fn malformed_text_fails() {
    assert!(matches!(
        Path::parse("M0,0 L10,zz"),
        Err(PixError::PathParse(_))
    ));
    assert!(matches!(Path::parse("M0,0 X3"), Err(PixError::PathParse(_))));
    assert!(Path::parse("   ").unwrap().is_empty());
}

#[test]
fn bounds_cover_control_hull() {
    let p = Path::parse("M0,0 L10,0 L10,4 Z").unwrap();
    let b = p.bounds().unwrap();
    assert_eq!((b.x0, b.y0, b.x1, b.y1), (0.0, 0.0, 10.0, 4.0));
}
