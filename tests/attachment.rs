//! Integration tests for attaching and detaching objects
//!
//! Detaching an object removes its bindings from the counterpart objects so
//! they stop firing into it; reattaching restores them.

mod common;

use common::builders::{RelayBuilder, RelayNode};
use helios_core::{BindingId, BindingValue, HeliosBinding, HeliosGraph, ObjectId, ObjectKind};

struct Fixture {
    graph: HeliosGraph,
    monitor: ObjectId,
    interface: RelayNode,
    a: RelayNode,
    b: RelayNode,
    a_to_b: BindingId,
    interface_to_b: BindingId,
}

fn fixture() -> Fixture {
    let mut graph = HeliosGraph::new();
    let monitor = graph.create_object(ObjectKind::Monitor, "Helios.Base.Monitor", "Monitor 1");
    graph.attach_root(monitor).unwrap();
    let a = RelayBuilder::new("A").sink().parent(monitor).build(&mut graph);
    let b = RelayBuilder::new("B").sink().parent(monitor).build(&mut graph);

    let interface = RelayBuilder::new("Sim").sink().build(&mut graph);
    graph.attach_root(interface.object).unwrap();

    let a_to_b = graph
        .add_binding(HeliosBinding::new(a.trigger, b.action))
        .unwrap();
    let interface_to_b = graph
        .add_binding(HeliosBinding::new(interface.trigger, b.action))
        .unwrap();
    Fixture {
        graph,
        monitor,
        interface,
        a,
        b,
        a_to_b,
        interface_to_b,
    }
}

fn outputs(graph: &HeliosGraph, id: ObjectId) -> Vec<BindingId> {
    graph.object(id).unwrap().output_bindings().to_vec()
}

fn inputs(graph: &HeliosGraph, id: ObjectId) -> Vec<BindingId> {
    graph.object(id).unwrap().input_bindings().to_vec()
}

#[test]
fn test_detached_object_stops_receiving() {
    let mut f = fixture();
    f.graph.remove_child(f.monitor, f.b.object).unwrap();

    assert!(outputs(&f.graph, f.a.object).is_empty());
    assert!(outputs(&f.graph, f.interface.object).is_empty());
    // B keeps its own record of the edges.
    assert_eq!(inputs(&f.graph, f.b.object), vec![f.a_to_b, f.interface_to_b]);

    f.graph.fire_trigger(f.a.trigger, BindingValue::from_double(1.0));
    f.graph
        .fire_trigger(f.interface.trigger, BindingValue::from_double(2.0));
    assert_eq!(f.b.calls(), 0);
}

#[test]
fn test_disconnect_is_idempotent() {
    let mut f = fixture();
    f.graph.disconnect_bindings(f.b.object);
    let a_after_first = outputs(&f.graph, f.a.object);
    let b_after_first = inputs(&f.graph, f.b.object);
    f.graph.disconnect_bindings(f.b.object);
    assert_eq!(outputs(&f.graph, f.a.object), a_after_first);
    assert_eq!(inputs(&f.graph, f.b.object), b_after_first);
}

#[test]
fn test_reattach_restores_membership() {
    let mut f = fixture();
    f.graph.remove_child(f.monitor, f.b.object).unwrap();
    f.graph.add_child(f.monitor, f.b.object).unwrap();

    assert_eq!(outputs(&f.graph, f.a.object), vec![f.a_to_b]);
    assert_eq!(outputs(&f.graph, f.interface.object), vec![f.interface_to_b]);
    assert_eq!(
        f.graph.element(f.a.trigger).unwrap().subscribers(),
        &[f.a_to_b]
    );

    f.graph.fire_trigger(f.a.trigger, BindingValue::from_double(1.0));
    assert_eq!(f.b.calls(), 1);
}

#[test]
fn test_reconnect_waits_for_both_endpoints() {
    let mut f = fixture();
    f.graph.detach_root(f.interface.object).unwrap();
    f.graph.remove_child(f.monitor, f.b.object).unwrap();
    f.graph.add_child(f.monitor, f.b.object).unwrap();

    // The interface is still detached, so B doesn't list its edge yet.
    assert_eq!(inputs(&f.graph, f.b.object), vec![f.a_to_b]);
    assert_eq!(outputs(&f.graph, f.a.object), vec![f.a_to_b]);
    // The detached interface keeps its own view.
    assert_eq!(outputs(&f.graph, f.interface.object), vec![f.interface_to_b]);

    f.graph.attach_root(f.interface.object).unwrap();
    assert_eq!(inputs(&f.graph, f.b.object), vec![f.a_to_b, f.interface_to_b]);
    f.graph
        .fire_trigger(f.interface.trigger, BindingValue::from_double(5.0));
    assert_eq!(*f.b.log.borrow(), vec![BindingValue::from_double(5.0)]);
}

#[test]
fn test_deleting_detached_target_removes_bindings() {
    let mut f = fixture();
    f.graph.remove_child(f.monitor, f.b.object).unwrap();
    f.graph.delete_object(f.b.object).unwrap();

    assert!(f.graph.binding(f.a_to_b).is_none());
    assert!(f.graph.binding(f.interface_to_b).is_none());
    assert_eq!(f.graph.binding_count(), 0);
    assert!(f.graph.element(f.a.trigger).unwrap().subscribers().is_empty());
}

#[test]
fn test_dead_handles_are_rejected() {
    let mut f = fixture();
    f.graph.delete_object(f.b.object).unwrap();
    assert!(f.graph.object(f.b.object).is_none());
    assert!(f
        .graph
        .add_binding(HeliosBinding::new(f.a.trigger, f.b.action))
        .is_err());
    assert!(f
        .graph
        .invoke_action(f.b.action, BindingValue::empty(), false)
        .is_err());
}
