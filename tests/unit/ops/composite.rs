use std::sync::Arc;

use super::*;
use crate::foundation::core::Rectangle;
use crate::graph::ids::NodeId;
use crate::graph::value::Properties;
use crate::ops::catalog::OperationCatalog;

fn blend(op: &str, backdrop: [f32; 4], layer: Option<[f32; 4]>) -> [f32; 4] {
    let rect = Rectangle::new(0, 0, 1, 1);
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog.resolve(op, &Properties::new()).unwrap();
    let ctx = ProcessContext {
        node: NodeId::new(0, 0, 0),
        props: &props,
        roi: rect,
        defined: rect,
        input: Some(Arc::new(Raster::generate(rect, false, |_, _| backdrop))),
        aux: layer.map(|l| Arc::new(Raster::generate(rect, false, |_, _| l))),
        parallel: false,
        display: None,
    };
    op.process(&ctx).unwrap().get(0, 0)
}

#[test]
fn opaque_layers_use_the_blend_function() {
    let out = blend("gegl:multiply", [0.5, 1.0, 0.0, 1.0], Some([0.5, 0.5, 0.5, 1.0]));
    assert_eq!(out, [0.25, 0.5, 0.0, 1.0]);
    let out = blend("gegl:subtract", [0.5, 0.25, 1.0, 1.0], Some([0.25, 0.5, 0.0, 1.0]));
    assert_eq!(out, [0.25, 0.0, 1.0, 1.0]);
    let out = blend("gegl:screen", [0.5; 4], Some([0.5, 0.5, 0.5, 1.0]));
    assert!((out[0] - 0.75).abs() < 1e-6);
}

#[test]
fn missing_or_transparent_layer_keeps_the_backdrop() {
    let backdrop = [0.2, 0.4, 0.6, 1.0];
    assert_eq!(blend("gegl:difference", backdrop, None), backdrop);
    let out = blend("gegl:overlay", backdrop, Some([1.0, 1.0, 1.0, 0.0]));
    for c in 0..4 {
        assert!((out[c] - backdrop[c]).abs() < 1e-6);
    }
}

#[test]
fn layer_over_transparent_backdrop_is_the_layer() {
    let layer = [0.3, 0.6, 0.9, 1.0];
    let out = blend("gegl:exclusion", [0.0; 4], Some(layer));
    for c in 0..4 {
        assert!((out[c] - layer[c]).abs() < 1e-6);
    }
}

#[test]
fn source_over_mixes_by_alpha() {
    let out = source_over([0.0, 0.0, 1.0, 1.0], [1.0, 0.0, 0.0, 0.5]);
    assert!((out[0] - 0.5).abs() < 1e-6);
    assert!((out[2] - 0.5).abs() < 1e-6);
    assert_eq!(out[3], 1.0);
}

#[test]
fn compose_operations_expose_the_srgb_flag() {
    let catalog = OperationCatalog::with_builtins();
    for op in ComposeOp::ALL {
        let props = catalog.list_properties(op.operation_name()).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name, "srgb");
        assert_eq!(props[0].type_tag(), "boolean");
    }
}
