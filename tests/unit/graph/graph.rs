use super::*;
use crate::session::context::{Context, ContextConfig};

fn ctx() -> Context {
    Context::init(ContextConfig::default()).unwrap()
}

fn node(g: &mut Graph, op: &str) -> NodeId {
    g.create_node(op, Properties::new()).unwrap()
}

#[test]
fn create_node_does_not_validate_the_operation() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let id = node(&mut g, "gegl:no-such-op");
    assert_eq!(g.node(id).unwrap().operation(), "gegl:no-such-op");
    assert_eq!(g.len(), 1);
    assert_eq!(g.ref_count(id).unwrap(), 1);
}

#[test]
fn occupied_pin_is_rejected_and_fan_out_is_allowed() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let a = node(&mut g, "a");
    let b = node(&mut g, "b");
    let cc = node(&mut g, "c");

    g.connect(a, b, Pin::Input).unwrap();
    match g.connect(cc, b, Pin::Input) {
        Err(PixError::DuplicateEdge { node, pin }) => {
            assert_eq!(node, b);
            assert_eq!(pin, Pin::Input);
        }
        other => panic!("expected DuplicateEdge, got {other:?}"),
    }
    assert_eq!(g.node(b).unwrap().source(Pin::Input), Some(a));

    g.connect(a, cc, Pin::Input).unwrap();
    assert_eq!(g.consumers(a).unwrap(), &[(b, Pin::Input), (cc, Pin::Input)]);
}

#[test]
fn cycles_are_rejected_without_changing_the_graph() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let a = node(&mut g, "a");
    let b = node(&mut g, "b");
    let d = node(&mut g, "d");
    g.connect(a, b, Pin::Input).unwrap();
    g.connect(b, d, Pin::Input).unwrap();

    match g.connect(b, a, Pin::Input) {
        Err(PixError::CycleDetected { from, to }) => {
            assert_eq!(from, b);
            assert_eq!(to, a);
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
    assert!(matches!(
        g.connect(d, a, Pin::Aux),
        Err(PixError::CycleDetected { .. })
    ));
    assert!(matches!(
        g.connect(a, a, Pin::Aux),
        Err(PixError::CycleDetected { .. })
    ));
    assert_eq!(g.node(a).unwrap().source(Pin::Input), None);
    assert_eq!(g.node(a).unwrap().source(Pin::Aux), None);
    assert_eq!(g.consumers(b).unwrap(), &[(d, Pin::Input)]);
}

#[test]
fn output_pin_cannot_receive_edges() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let a = node(&mut g, "a");
    let b = node(&mut g, "b");
    assert!(matches!(
        g.connect(a, b, Pin::Output),
        Err(PixError::UnknownPin(_))
    ));
    assert!(matches!(
        g.connect_by_name(a, b, "side"),
        Err(PixError::UnknownPin(_))
    ));
    g.connect_by_name(a, b, "aux").unwrap();
    assert_eq!(g.node(b).unwrap().source(Pin::Aux), Some(a));
}

#[test]
fn disconnect_frees_the_pin_for_a_new_edge() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let a = node(&mut g, "a");
    let b = node(&mut g, "b");
    let d = node(&mut g, "d");
    g.connect(a, b, Pin::Input).unwrap();
    assert_eq!(g.disconnect(b, Pin::Input).unwrap(), Some(a));
    assert_eq!(g.disconnect(b, Pin::Input).unwrap(), None);
    assert!(g.consumers(a).unwrap().is_empty());
    g.connect(d, b, Pin::Input).unwrap();
}

#[test]
fn released_nodes_survive_while_consumed() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let src = node(&mut g, "src");
    let sink = node(&mut g, "sink");
    g.connect(src, sink, Pin::Input).unwrap();

    g.release_node(src).unwrap();
    assert!(g.contains(src));
    assert_eq!(g.ref_count(src).unwrap(), 0);
    assert!(matches!(g.release_node(src), Err(PixError::Validation(_))));

    g.release_node(sink).unwrap();
    assert!(!g.contains(sink));
    assert!(!g.contains(src));
    assert!(g.is_empty());
    assert!(matches!(g.node(src), Err(PixError::StaleNode(_))));
}

#[test]
fn releasing_a_consumer_keeps_externally_held_producers() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let src = node(&mut g, "src");
    let sink = node(&mut g, "sink");
    g.connect(src, sink, Pin::Input).unwrap();
    g.retain(src).unwrap();
    g.release_node(src).unwrap();

    g.release_node(sink).unwrap();
    assert!(g.contains(src));
    assert!(g.consumers(src).unwrap().is_empty());
}

#[test]
fn recycled_slots_do_not_alias_old_handles() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let old = node(&mut g, "a");
    g.release_node(old).unwrap();
    let new = node(&mut g, "b");
    assert_ne!(old, new);
    assert!(matches!(g.node(old), Err(PixError::StaleNode(_))));
    assert_eq!(g.node(new).unwrap().operation(), "b");
}

#[test]
fn handles_from_another_graph_are_rejected() {
    let c = ctx();
    let mut g1 = c.new_graph().unwrap();
    let mut g2 = c.new_graph().unwrap();
    let a = node(&mut g1, "a");
    let b = node(&mut g2, "b");
    assert!(matches!(
        g2.connect(a, b, Pin::Input),
        Err(PixError::ForeignNode(_))
    ));
}

#[test]
fn construction_fails_after_shutdown() {
    let c = ctx();
    let mut g = c.new_graph().unwrap();
    let a = node(&mut g, "a");
    let b = node(&mut g, "b");
    c.shutdown();
    assert!(matches!(
        g.create_node("x", Properties::new()),
        Err(PixError::ContextShutdown)
    ));
    assert!(matches!(
        g.connect(a, b, Pin::Input),
        Err(PixError::ContextShutdown)
    ));
}
