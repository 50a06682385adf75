use std::sync::Arc;

use super::*;
use crate::graph::ids::NodeId;
use crate::graph::value::Properties;
use crate::ops::catalog::OperationCatalog;

fn temp_path(name: &str) -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("pixgraph_codec_{}_{name}", std::process::id()));
    p.to_string_lossy().into_owned()
}

fn ctx_run(op: &str, props: Properties, roi: Rectangle, input: Option<Raster>) -> PixResult<Raster> {
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog.resolve(op, &props)?;
    let ctx = ProcessContext {
        node: NodeId::new(0, 0, 0),
        props: &props,
        roi,
        defined: roi,
        input: input.map(Arc::new),
        aux: None,
        parallel: false,
        display: None,
    };
    op.process(&ctx)
}

fn defined(op: &str, props: Properties) -> PixResult<Rectangle> {
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog.resolve(op, &props)?;
    op.defined_region(&RegionContext {
        props: &props,
        input: None,
        aux: None,
    })
}

fn gradient() -> Raster {
    Raster::generate(Rectangle::new(0, 0, 4, 3), false, |x, y| {
        [x as f32 / 3.0, y as f32 / 2.0, 0.5, 1.0]
    })
}

#[test]
fn png_round_trip_keeps_pixels() {
    let path = temp_path("rt8.png");
    let input = gradient();
    ctx_run(
        "gegl:png-save",
        Properties::new().with("path", path.as_str()),
        input.rect(),
        Some(input.clone()),
    )
    .unwrap();

    let props = || Properties::new().with("path", path.as_str());
    assert_eq!(defined("gegl:png-load", props()).unwrap(), Rectangle::new(0, 0, 4, 3));
    let back = ctx_run("gegl:png-load", props(), input.rect(), None).unwrap();
    for (a, b) in back.pixels().iter().zip(input.pixels()) {
        for c in 0..4 {
            assert!((a[c] - b[c]).abs() < 0.01, "{a:?} vs {b:?}");
        }
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn png_sixteen_bit_is_tighter() {
    let path = temp_path("rt16.png");
    let input = gradient();
    ctx_run(
        "gegl:png-save",
        Properties::new()
            .with("path", path.as_str())
            .with("bitdepth", 16i64),
        input.rect(),
        Some(input.clone()),
    )
    .unwrap();
    let back = ctx_run(
        "gegl:png-load",
        Properties::new().with("path", path.as_str()),
        input.rect(),
        None,
    )
    .unwrap();
    for (a, b) in back.pixels().iter().zip(input.pixels()) {
        for c in 0..4 {
            assert!((a[c] - b[c]).abs() < 1e-3, "{a:?} vs {b:?}");
        }
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn png_rejects_odd_bitdepth() {
    let path = temp_path("bad_depth.png");
    let input = gradient();
    let err = ctx_run(
        "gegl:png-save",
        Properties::new()
            .with("path", path.as_str())
            .with("bitdepth", 12i64),
        input.rect(),
        Some(input),
    )
    .unwrap_err();
    assert!(matches!(err, PixError::Property { property, .. } if property == "bitdepth"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn jpg_save_writes_a_decodable_file() {
    let path = temp_path("out.jpg");
    let input = gradient();
    ctx_run(
        "gegl:jpg-save",
        Properties::new().with("path", path.as_str()),
        input.rect(),
        Some(input),
    )
    .unwrap();
    let props = Properties::new().with("path", path.as_str());
    assert_eq!(defined("gegl:jpg-load", props).unwrap(), Rectangle::new(0, 0, 4, 3));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn jpg_quality_out_of_range_is_a_property_error() {
    for quality in [0i64, 101, -5] {
        let err = ctx_run(
            "gegl:jpg-save",
            Properties::new()
                .with("path", temp_path("never.jpg"))
                .with("quality", quality),
            Rectangle::new(0, 0, 1, 1),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PixError::Property { property, .. } if property == "quality"));
    }
}

#[test]
fn saving_an_empty_region_fails() {
    let err = ctx_run(
        "gegl:png-save",
        Properties::new().with("path", temp_path("empty.png")),
        Rectangle::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, PixError::Operation { .. }));
}

#[test]
fn missing_file_is_an_operation_error() {
    let props = Properties::new().with("path", temp_path("does_not_exist.png"));
    let err = defined("gegl:png-load", props).unwrap_err();
    assert!(matches!(err, PixError::Operation { operation, .. } if operation == "gegl:png-load"));
}

#[test]
fn svg_load_uses_intrinsic_or_requested_size() {
    let path = temp_path("square.svg");
    std::fs::write(
        &path,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="6">
<rect x="0" y="0" width="8" height="6" fill="#ff0000"/>
</svg>"##,
    )
    .unwrap();

    let props = || Properties::new().with("path", path.as_str());
    assert_eq!(defined("gegl:svg-load", props()).unwrap(), Rectangle::new(0, 0, 8, 6));
    let scaled = props().with("width", 16i64).with("height", 12i64);
    assert_eq!(defined("gegl:svg-load", scaled).unwrap(), Rectangle::new(0, 0, 16, 12));

    let out = ctx_run("gegl:svg-load", props(), Rectangle::new(0, 0, 8, 6), None).unwrap();
    let px = out.get(4, 3);
    assert!((px[0] - 1.0).abs() < 1e-3);
    assert!(px[1].abs() < 1e-3);
    assert!((px[3] - 1.0).abs() < 1e-3);
    let _ = std::fs::remove_file(&path);
}
