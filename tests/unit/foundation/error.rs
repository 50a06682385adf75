use super::*;
use crate::graph::ids::NodeId;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PixError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PixError::operation("gegl:crop", "x")
            .to_string()
            .contains("operation error: gegl:crop")
    );
    assert!(
        PixError::property("gegl:crop", "width", "x")
            .to_string()
            .contains("property error: gegl:crop.width")
    );
    assert!(
        PixError::SizeMismatch {
            expected: 1600,
            actual: 1599
        }
        .to_string()
        .contains("expected 1600 bytes, got 1599")
    );
}

#[test]
fn graph_errors_name_the_nodes() {
    let a = NodeId::new(1, 0, 0);
    let b = NodeId::new(1, 1, 0);
    let msg = PixError::CycleDetected { from: a, to: b }.to_string();
    assert!(msg.contains("cycle detected"));
    assert!(msg.contains(&a.to_string()));
    assert!(msg.contains(&b.to_string()));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PixError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
