use super::*;
use crate::foundation::error::PixError;
use crate::graph::value::Value;
use crate::session::context::{Context, ContextConfig};

fn graph() -> (Context, Graph) {
    let c = Context::init(ContextConfig::default()).unwrap();
    let g = c.new_graph().unwrap();
    (c, g)
}

#[test]
fn builders_use_catalog_names() {
    let (_c, mut g) = graph();
    let blur = g.gaussian_blur(2.0, 3.0).unwrap();
    let n = g.node(blur).unwrap();
    assert_eq!(n.operation(), "gegl:gaussian-blur");
    assert_eq!(n.property("std-dev-x").and_then(Value::as_double), Some(2.0));
    assert_eq!(n.property("std-dev-y").and_then(Value::as_double), Some(3.0));

    let crop = g.crop(1.0, 2.0, 3.0, 4.0, true).unwrap();
    let n = g.node(crop).unwrap();
    assert_eq!(n.property("reset-origin").and_then(Value::as_bool), Some(true));

    let disp = g.display("preview").unwrap();
    assert_eq!(
        g.node(disp).unwrap().property("window-title").and_then(Value::as_str),
        Some("preview")
    );
}

#[test]
fn jpg_save_defaults_quality_to_ninety() {
    let (_c, mut g) = graph();
    let a = g.jpg_save("/tmp/x.jpg", None).unwrap();
    let b = g.jpg_save("/tmp/x.jpg", Some(40)).unwrap();
    assert_eq!(
        g.node(a).unwrap().property("quality").and_then(Value::as_int),
        Some(DEFAULT_JPEG_QUALITY)
    );
    assert_eq!(
        g.node(b).unwrap().property("quality").and_then(Value::as_int),
        Some(40)
    );
}

#[test]
fn compose_builder_rejects_unknown_index() {
    let (_c, mut g) = graph();
    let n = g.compose(2).unwrap();
    assert_eq!(g.node(n).unwrap().operation(), "gegl:screen");
    assert!(matches!(g.compose(6), Err(PixError::UnknownComposeOp(6))));
    assert_eq!(g.len(), 1);
}

#[test]
fn buffer_source_shares_the_buffer() {
    let (c, mut g) = graph();
    let fmt = c.lookup_format("RGBA u8").unwrap();
    let buf = c
        .new_buffer(crate::foundation::core::Rectangle::new(0, 0, 2, 2), fmt)
        .unwrap();
    assert_eq!(buf.owner_count(), 1);
    let src = g.buffer_source(&buf).unwrap();
    assert_eq!(buf.owner_count(), 2);
    g.release_node(src).unwrap();
    assert_eq!(buf.owner_count(), 1);
}

#[test]
fn connect_helpers_pick_input_and_aux() {
    let (_c, mut g) = graph();
    let a = g.perlin_noise().unwrap();
    let b = g.plasma(8, 8, 1).unwrap();
    let m = g.compose(0).unwrap();
    g.connect_to(a, m).unwrap();
    g.connect_to_aux(b, m).unwrap();
    let n = g.node(m).unwrap();
    assert_eq!(n.source(Pin::Input), Some(a));
    assert_eq!(n.source(Pin::Aux), Some(b));
}
