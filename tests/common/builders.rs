//! Test data builders for creating graph fixtures

use helios_core::binding::units;
use helios_core::{BindingValue, ElementId, ElementSpec, HeliosGraph, ObjectId, ObjectKind};
use std::cell::RefCell;
use std::rc::Rc;

/// Values received by an action, in call order.
pub type CallLog = Rc<RefCell<Vec<BindingValue>>>;

/// A visual with a `signal.fired` trigger and a `signal.relay` action that
/// records its value and then fires the trigger with it.
pub struct RelayNode {
    pub object: ObjectId,
    pub trigger: ElementId,
    pub action: ElementId,
    pub log: CallLog,
}

pub struct RelayBuilder {
    name: String,
    parent: Option<ObjectId>,
    relay: bool,
}

impl RelayBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            relay: true,
        }
    }

    pub fn parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Record only; don't fire the trigger from the action.
    pub fn sink(mut self) -> Self {
        self.relay = false;
        self
    }

    pub fn build(self, graph: &mut HeliosGraph) -> RelayNode {
        let object = graph.create_object(ObjectKind::Visual, "Test.Relay", self.name);
        if let Some(parent) = self.parent {
            graph.add_child(parent, object).unwrap();
        }
        let trigger = graph
            .add_element(
                object,
                ElementSpec::trigger("", "signal", "fired").unit(&units::NUMERIC),
            )
            .unwrap();
        let log: CallLog = Rc::default();
        let sink = log.clone();
        let relay = self.relay;
        let action = graph
            .add_element(
                object,
                ElementSpec::action("", "signal", "relay")
                    .unit(&units::NUMERIC)
                    .handler(move |graph, invocation| {
                        sink.borrow_mut().push(invocation.value.clone());
                        if relay {
                            graph.fire_trigger(trigger, invocation.value.clone());
                        }
                        Ok(())
                    }),
            )
            .unwrap();
        RelayNode {
            object,
            trigger,
            action,
            log,
        }
    }
}

impl RelayNode {
    pub fn calls(&self) -> usize {
        self.log.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_builder() {
        let mut graph = HeliosGraph::new();
        let node = RelayBuilder::new("A").sink().build(&mut graph);
        assert_eq!(graph.object(node.object).unwrap().name(), "A");
        assert_eq!(graph.find_action(node.object, "signal.relay"), Some(node.action));
        assert_eq!(node.calls(), 0);
    }
}
