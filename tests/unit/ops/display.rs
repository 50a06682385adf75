use std::sync::Arc;

use super::*;
use crate::graph::ids::NodeId;
use crate::graph::value::Properties;
use crate::ops::catalog::OperationCatalog;

fn show(sink: Option<Arc<dyn DisplaySink>>) -> Raster {
    let rect = Rectangle::new(0, 0, 2, 1);
    let input = Raster::generate(rect, false, |x, _| {
        if x == 0 { [1.0, 0.0, 0.0, 1.0] } else { [0.0, 0.0, 0.0, 0.0] }
    });
    let catalog = OperationCatalog::with_builtins();
    let (op, props) = catalog
        .resolve("gegl:display", &Properties::new().with("window-title", "preview"))
        .unwrap();
    let ctx = ProcessContext {
        node: NodeId::new(0, 0, 0),
        props: &props,
        roi: rect,
        defined: rect,
        input: Some(Arc::new(input)),
        aux: None,
        parallel: false,
        display: sink,
    };
    op.process(&ctx).unwrap()
}

#[test]
fn display_hands_frames_to_the_sink() {
    let sink = Arc::new(InMemoryDisplay::new());
    let out = show(Some(sink.clone() as Arc<dyn DisplaySink>));
    assert_eq!(out.get(0, 0), [1.0, 0.0, 0.0, 1.0]);

    let frames = sink.frames().unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].title, "preview");
    assert_eq!(frames[0].rect, Rectangle::new(0, 0, 2, 1));
    assert_eq!(frames[0].rgba8, vec![255, 0, 0, 255, 0, 0, 0, 0]);
}

#[test]
fn display_without_sink_passes_through() {
    let out = show(None);
    assert_eq!(out.rect(), Rectangle::new(0, 0, 2, 1));
    assert_eq!(out.get(1, 0), [0.0; 4]);
}
