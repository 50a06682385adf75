use std::sync::Arc;

use super::*;
use crate::PixError;
use crate::graph::ids::NodeId;
use crate::graph::value::Properties;

fn run(op: &str, props: Properties, roi: Rectangle, input: &Raster) -> PixResult<Raster> {
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog.resolve(op, &props)?;
    let ctx = ProcessContext {
        node: NodeId::new(0, 0, 0),
        props: &props,
        roi,
        defined: input.rect(),
        input: Some(Arc::new(input.clone())),
        aux: None,
        parallel: true,
        display: None,
    };
    op.process(&ctx)
}

fn required(op: &str, props: Properties, roi: Rectangle) -> Rectangle {
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog.resolve(op, &props).unwrap();
    op.required_region(&props, Pin::Input, roi)
}

fn gray(rect: Rectangle, v: f32) -> Raster {
    Raster::generate(rect, false, |_, _| [v, v, v, 1.0])
}

fn ramp(rect: Rectangle) -> Raster {
    Raster::generate(rect, false, |x, y| {
        let v = ((x * 7 + y * 13).rem_euclid(17)) as f32 / 16.0;
        [v, 1.0 - v, v * 0.5, 1.0]
    })
}

#[test]
fn threshold_splits_on_luminance() {
    let rect = Rectangle::new(0, 0, 2, 1);
    let mut input = Raster::new(rect);
    input.put(0, 0, [0.8, 0.8, 0.8, 0.5]);
    input.put(1, 0, [0.2, 0.2, 0.2, 1.0]);
    let out = run("gegl:threshold", Properties::new(), rect, &input).unwrap();
    assert_eq!(out.get(0, 0), [1.0, 1.0, 1.0, 0.5]);
    assert_eq!(out.get(1, 0), [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn invert_and_brightness_contrast_are_point_operations() {
    let rect = Rectangle::new(0, 0, 1, 1);
    let input = gray(rect, 0.75);
    let inv = run("gegl:invert-linear", Properties::new(), rect, &input).unwrap();
    assert_eq!(inv.get(0, 0), [0.25, 0.25, 0.25, 1.0]);

    let props = Properties::new().with("contrast", 2.0f64).with("brightness", 0.0f64);
    let bc = run("gegl:brightness-contrast", props, rect, &input).unwrap();
    assert_eq!(bc.get(0, 0), [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn gaussian_blur_requests_a_three_sigma_margin() {
    let props = Properties::new().with("std-dev-x", 1.5f64).with("std-dev-y", 0.0f64);
    assert_eq!(
        required("gegl:gaussian-blur", props, Rectangle::new(10, 10, 4, 4)),
        Rectangle::new(5, 10, 14, 4)
    );
}

#[test]
fn gaussian_blur_keeps_flat_areas_and_is_region_exact() {
    let src = Rectangle::new(0, 0, 40, 40);
    let flat = run(
        "gegl:gaussian-blur",
        Properties::new(),
        Rectangle::new(10, 10, 8, 8),
        &gray(src, 0.5),
    )
    .unwrap();
    assert!(flat.pixels().iter().all(|p| (p[0] - 0.5).abs() < 1e-5 && (p[3] - 1.0).abs() < 1e-5));

    let input = ramp(src);
    let full = run("gegl:gaussian-blur", Properties::new(), Rectangle::new(8, 8, 24, 24), &input).unwrap();
    let part = run("gegl:gaussian-blur", Properties::new(), Rectangle::new(15, 12, 5, 6), &input).unwrap();
    for y in 12..18 {
        for x in 15..20 {
            let (a, b) = (full.get(x, y), part.get(x, y));
            for c in 0..4 {
                assert!((a[c] - b[c]).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn pixelize_aligns_blocks_to_the_absolute_grid() {
    let props = || Properties::new().with("size-x", 4i64).with("size-y", 4i64);
    assert_eq!(
        required("gegl:pixelize", props(), Rectangle::new(5, 6, 2, 1)),
        Rectangle::new(4, 4, 4, 4)
    );
    let input = ramp(Rectangle::new(0, 0, 16, 16));
    let out = run("gegl:pixelize", props(), Rectangle::new(0, 0, 16, 16), &input).unwrap();
    let part = run("gegl:pixelize", props(), Rectangle::new(5, 5, 2, 2), &input).unwrap();
    assert_eq!(out.get(4, 4), out.get(7, 7));
    assert_eq!(part.get(5, 5), out.get(4, 4));
    assert_ne!(out.get(4, 4), out.get(8, 4));
}

#[test]
fn pixelize_rejects_zero_sized_blocks() {
    let props = Properties::new().with("size-x", 0i64);
    let input = gray(Rectangle::new(0, 0, 2, 2), 0.5);
    assert!(matches!(
        run("gegl:pixelize", props, input.rect(), &input),
        Err(PixError::Property { property, .. }) if property == "size-x"
    ));
}

#[test]
fn sobel_and_gradient_are_zero_on_flat_input() {
    let input = gray(Rectangle::new(0, 0, 8, 8), 0.4);
    let roi = Rectangle::new(2, 2, 4, 4);
    let sobel = run("gegl:edge-sobel", Properties::new(), roi, &input).unwrap();
    assert!(sobel.pixels().iter().all(|p| p[0].abs() < 1e-6 && p[3] == 1.0));
    let grad = run("gegl:image-gradient", Properties::new(), roi, &input).unwrap();
    assert!(grad.pixels().iter().all(|p| p[0].abs() < 1e-6));
    assert_eq!(
        required("gegl:edge-sobel", Properties::new(), roi),
        Rectangle::new(1, 1, 6, 6)
    );
}

#[test]
fn sobel_responds_to_a_vertical_edge() {
    let input = Raster::generate(Rectangle::new(0, 0, 8, 8), false, |x, _| {
        let v = if x < 4 { 0.0 } else { 1.0 };
        [v, v, v, 1.0]
    });
    let out = run("gegl:edge-sobel", Properties::new(), Rectangle::new(0, 2, 8, 1), &input).unwrap();
    assert!(out.get(4, 2)[0] > 0.5);
    assert!(out.get(1, 2)[0].abs() < 1e-6);
}

#[test]
fn normal_map_of_flat_height_points_up() {
    let input = gray(Rectangle::new(0, 0, 4, 4), 0.3);
    let out = run("gegl:normal-map", Properties::new(), Rectangle::new(1, 1, 2, 2), &input).unwrap();
    for p in out.pixels() {
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert!((p[1] - 0.5).abs() < 1e-6);
        assert!((p[2] - 1.0).abs() < 1e-6);
    }
}

#[test]
fn dither_quantizes_to_the_requested_levels() {
    let props = Properties::new()
        .with("red-levels", 2i64)
        .with("green-levels", 2i64)
        .with("blue-levels", 2i64)
        .with("alpha-levels", 2i64);
    let input = ramp(Rectangle::new(0, 0, 8, 8));
    let out = run("gegl:dither", props, input.rect(), &input).unwrap();
    for p in out.pixels() {
        for v in p {
            assert!(v.abs() < 1e-6 || (v - 1.0).abs() < 1e-6, "unexpected level {v}");
        }
    }
}

#[test]
fn noise_pick_without_chance_is_identity() {
    let input = ramp(Rectangle::new(0, 0, 10, 10));
    let props = Properties::new().with("pct-random", 0.0f64).with("repeat", 2i64);
    let roi = Rectangle::new(3, 3, 4, 4);
    let out = run("gegl:noise-pick", props, roi, &input).unwrap();
    assert_eq!(out, input.crop(roi));
}

#[test]
fn noise_pick_is_region_exact() {
    let input = ramp(Rectangle::new(0, 0, 20, 20));
    let props = || {
        Properties::new()
            .with("pct-random", 60.0f64)
            .with("repeat", 3i64)
            .with("seed", 9i64)
    };
    assert_eq!(
        required("gegl:noise-pick", props(), Rectangle::new(5, 5, 2, 2)),
        Rectangle::new(2, 2, 8, 8)
    );
    let full = run("gegl:noise-pick", props(), Rectangle::new(4, 4, 12, 12), &input).unwrap();
    let part = run("gegl:noise-pick", props(), Rectangle::new(7, 8, 3, 2), &input).unwrap();
    for y in 8..10 {
        for x in 7..10 {
            assert_eq!(part.get(x, y), full.get(x, y));
        }
    }
}

fn crop_props(reset: bool) -> Properties {
    Properties::new()
        .with("x", 2.0f64)
        .with("y", 3.0f64)
        .with("width", 4.0f64)
        .with("height", 2.0f64)
        .with("reset-origin", reset)
}

#[test]
fn crop_limits_the_defined_region() {
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog.resolve("gegl:crop", &crop_props(false)).unwrap();
    let ctx = RegionContext {
        props: &props,
        input: Some(Rectangle::new(0, 0, 5, 10)),
        aux: None,
    };
    assert_eq!(op.defined_region(&ctx).unwrap(), Rectangle::new(2, 3, 3, 2));

    let (op, props) = catalog.resolve("gegl:crop", &crop_props(true)).unwrap();
    let ctx = RegionContext {
        props: &props,
        input: Some(Rectangle::new(0, 0, 10, 10)),
        aux: None,
    };
    assert_eq!(op.defined_region(&ctx).unwrap(), Rectangle::new(0, 0, 4, 2));
    assert_eq!(
        op.required_region(&props, Pin::Input, Rectangle::new(0, 0, 4, 2)),
        Rectangle::new(2, 3, 4, 2)
    );
}

#[test]
fn crop_with_reset_origin_moves_pixels() {
    let input = ramp(Rectangle::new(0, 0, 10, 10));
    let out = run("gegl:crop", crop_props(true), Rectangle::new(0, 0, 4, 2), &input).unwrap();
    assert_eq!(out.get(0, 0), input.get(2, 3));
    assert_eq!(out.get(3, 1), input.get(5, 4));

    let kept = run("gegl:crop", crop_props(false), Rectangle::new(0, 0, 10, 10), &input).unwrap();
    assert_eq!(kept.get(0, 0), [0.0; 4]);
    assert_eq!(kept.get(2, 3), input.get(2, 3));
}

#[test]
fn crop_rejects_negative_sizes() {
    let props = Properties::new().with("width", -1.0f64);
    let input = gray(Rectangle::new(0, 0, 2, 2), 0.5);
    assert!(matches!(
        run("gegl:crop", props, input.rect(), &input),
        Err(PixError::Property { property, .. }) if property == "width"
    ));
}
