//! Trigger firing and binding execution.
//!
//! Firing is synchronous and depth-first: every subscribed binding runs to
//! completion, including any triggers its action fires in turn, before
//! [`HeliosGraph::fire_trigger`] returns. Nothing here returns an error to
//! the firing caller. Failures are logged against the binding and swallowed.

use super::HeliosGraph;
use crate::binding::element::{ActionInvocation, ElementKind, ElementRole};
use crate::binding::tracer::BindingTraceInfo;
use crate::binding::units;
use crate::binding::value::BindingValue;
use crate::binding::BindingValueSource;
use crate::error::{HeliosError, Result};
use crate::graph::id::{BindingId, ElementId, ObjectId};
use crate::scripting::ScriptValue;

impl HeliosGraph {
    /// Fire a trigger, running every binding subscribed to it.
    pub fn fire_trigger(&mut self, trigger: ElementId, value: BindingValue) {
        let Some(element) = self.elements.get(trigger) else {
            tracing::debug!("Ignoring fire of dead trigger {}", trigger);
            return;
        };
        let subscribers = element.subscribers.clone();
        tracing::trace!(
            "Trigger {} fired with '{}' to {} bindings",
            element.trigger_id().unwrap_or(""),
            value,
            subscribers.len()
        );
        for binding in subscribers {
            self.on_trigger_fired(binding, trigger, &value);
        }
    }

    /// Fire a trigger looked up by persisted ID on `object`.
    pub fn fire_trigger_by_id(
        &mut self,
        object: ObjectId,
        trigger_id: &str,
        value: BindingValue,
    ) -> Result<()> {
        let trigger = self.find_trigger(object, trigger_id).ok_or_else(|| {
            HeliosError::InvalidReference(format!("trigger '{}' on {}", trigger_id, object))
        })?;
        self.fire_trigger(trigger, value);
        Ok(())
    }

    fn on_trigger_fired(&mut self, id: BindingId, trigger: ElementId, value: &BindingValue) {
        let Some(binding) = self.bindings.get(id) else {
            return;
        };
        if !binding.is_active || !binding.is_valid || binding.trigger != Some(trigger) {
            return;
        }

        let trace = self.tracer.is_some().then(|| self.trace_info(id));
        if let (Some(tracer), Some(Some(info))) = (self.tracer.as_mut(), trace.as_ref()) {
            tracer.trace_trigger_fired(info);
        }

        self.execute_binding(id, value);

        if let (Some(tracer), Some(Some(info))) = (self.tracer.as_mut(), trace.as_ref()) {
            tracer.end_trace_trigger_fired(info);
        }
    }

    fn trace_info(&self, id: BindingId) -> Option<BindingTraceInfo> {
        let binding = self.bindings.get(id)?;
        Some(BindingTraceInfo {
            binding: id,
            description: self.binding_description(id),
            trigger_source: self.binding_source(id)?,
            action_target: self.binding_target(id)?,
            binding_executing: binding.is_executing,
        })
    }

    fn execute_binding(&mut self, id: BindingId, value: &BindingValue) {
        let executing = self.bindings.get(id).is_some_and(|b| b.is_executing);
        if executing {
            tracing::warn!(
                "Binding loop condition detected, aborting re-entrant execution of {}",
                self.binding_description(id)
            );
            return;
        }

        if let Some(binding) = self.bindings.get_mut(id) {
            binding.is_executing = true;
        }

        if let Err(e) = self.run_binding(id, value) {
            self.log_binding_problem(id, format!("Error executing binding: {}", e));
        }

        // The action may have removed this binding.
        if let Some(binding) = self.bindings.get_mut(id) {
            binding.is_executing = false;
        }
    }

    fn run_binding(&mut self, id: BindingId, value: &BindingValue) -> Result<()> {
        let binding = self
            .bindings
            .get(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("binding {}", id)))?;
        let condition = binding.condition.clone();
        let source = binding.value_source;
        let stored = binding.value.clone();
        let bypass = binding.bypass_cascading_triggers;
        let (trigger, action) = match (binding.trigger, binding.action) {
            (Some(t), Some(a)) => (t, a),
            _ => return Err(HeliosError::Binding("binding has no endpoints".to_string())),
        };

        if let Some(condition) = condition {
            match self.scripts.evaluate(&condition, value) {
                Ok(results) => {
                    if !results.first().is_some_and(ScriptValue::is_truthy) {
                        tracing::trace!("Condition '{}' false, skipping {}", condition, id);
                        return Ok(());
                    }
                }
                Err(e) => {
                    self.log_binding_problem(id, format!("Error evaluating condition: {}", e));
                    return Ok(());
                }
            }
        }

        let action_value = match source {
            BindingValueSource::StaticValue => stored,
            BindingValueSource::TriggerValue => self.convert_trigger_value(trigger, action, value),
            BindingValueSource::Script => {
                match self.scripts.evaluate(stored.string_value(), value) {
                    Ok(results) => match results.into_iter().next() {
                        Some(result) => result.into_binding_value(),
                        None => {
                            self.log_binding_problem(
                                id,
                                "Script did not return a value".to_string(),
                            );
                            return Ok(());
                        }
                    },
                    Err(e) => {
                        self.log_binding_problem(id, format!("Error evaluating script: {}", e));
                        return Ok(());
                    }
                }
            }
        };

        let target = self
            .elements
            .get(action)
            .map(|e| e.owner())
            .ok_or_else(|| HeliosError::DeadReference(format!("action {}", action)))?;
        let invocation = ActionInvocation {
            action,
            target,
            value: action_value,
            bypass_cascading_triggers: bypass,
        };
        self.execute_action(&invocation)
    }

    fn convert_trigger_value(
        &self,
        trigger: ElementId,
        action: ElementId,
        value: &BindingValue,
    ) -> BindingValue {
        let from = self.elements.get(trigger).map(|e| e.unit());
        let to = self.elements.get(action).map(|e| e.unit());
        match (from, to) {
            (Some(from), Some(to)) if from != to => match units::unit_converter(from, to) {
                Some(converter) => converter.convert_value(value),
                // Mismatched units without a converter pass the value through.
                None => value.clone(),
            },
            _ => value.clone(),
        }
    }

    fn log_binding_problem(&mut self, id: BindingId, message: String) {
        let description = self.binding_description(id);
        let verbose = self.verbose_binding_logging;
        let Some(binding) = self.bindings.get_mut(id) else {
            return;
        };
        if verbose || binding.log_filter.should_log(&message) {
            tracing::warn!(binding = %description, "{}", message);
        }
    }

    /// Invoke an action or set a value directly, outside any binding.
    pub fn invoke_action(
        &mut self,
        action: ElementId,
        value: BindingValue,
        bypass_cascading_triggers: bool,
    ) -> Result<()> {
        let target = self
            .elements
            .get(action)
            .map(|e| e.owner())
            .ok_or_else(|| HeliosError::DeadReference(format!("action {}", action)))?;
        self.execute_action(&ActionInvocation {
            action,
            target,
            value,
            bypass_cascading_triggers,
        })
    }

    fn execute_action(&mut self, invocation: &ActionInvocation) -> Result<()> {
        let element = self
            .elements
            .get(invocation.action)
            .ok_or_else(|| HeliosError::DeadReference(format!("action {}", invocation.action)))?;
        let role = element.role();
        let handler = element.handler();

        match role {
            ElementRole::Trigger => {
                return Err(HeliosError::Binding(format!(
                    "{} is a trigger, not an action",
                    invocation.action
                )))
            }
            ElementRole::Value => {
                self.set_value(
                    invocation.action,
                    invocation.value.clone(),
                    invocation.bypass_cascading_triggers,
                )?;
            }
            ElementRole::Action => {}
        }

        match handler {
            Some(handler) => handler(self, invocation),
            None => Ok(()),
        }
    }

    /// Write a value element.
    ///
    /// With `bypass_cascading_triggers` the value is stored without firing.
    /// Otherwise the first write after creation or [`reset_value`] always
    /// fires; later writes fire only when the new value differs.
    ///
    /// [`reset_value`]: Self::reset_value
    pub fn set_value(
        &mut self,
        element: ElementId,
        new_value: BindingValue,
        bypass_cascading_triggers: bool,
    ) -> Result<()> {
        let slot = self
            .elements
            .get_mut(element)
            .ok_or_else(|| HeliosError::DeadReference(format!("value {}", element)))?;
        let ElementKind::Value {
            value,
            synchronized,
            ..
        } = &mut slot.kind
        else {
            return Err(HeliosError::Binding(format!("{} is not a value", element)));
        };

        if bypass_cascading_triggers {
            *value = new_value;
            return Ok(());
        }

        let changed = !*synchronized || !value.equals(&new_value);
        *value = new_value.clone();
        *synchronized = true;
        if changed {
            self.fire_trigger(element, new_value);
        }
        Ok(())
    }

    /// Force the next write of a value element to fire even if unchanged.
    /// A no-op under legacy reset semantics.
    pub fn reset_value(&mut self, element: ElementId) {
        if self.legacy_value_reset {
            return;
        }
        if let Some(slot) = self.elements.get_mut(element) {
            if let ElementKind::Value { synchronized, .. } = &mut slot.kind {
                *synchronized = false;
            }
        }
    }

    /// Reset every value element in the graph.
    pub fn reset_all_values(&mut self) {
        for element in self.value_elements() {
            self.reset_value(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::element::ElementSpec;
    use crate::binding::units;
    use crate::binding::value::BindingValue;
    use crate::binding::HeliosBinding;
    use crate::graph::{HeliosGraph, ObjectKind};
    use crate::scripting::{MockScriptEvaluator, ScriptValue};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<BindingValue>>>;

    fn recording_action(graph: &mut HeliosGraph, log: &Log) -> crate::graph::ElementId {
        let target = graph.create_object(ObjectKind::Visual, "Test", "Target");
        let log = log.clone();
        graph
            .add_element(
                target,
                ElementSpec::action("", "needle", "set")
                    .unit(&units::NUMERIC)
                    .handler(move |_, invocation| {
                        log.borrow_mut().push(invocation.value.clone());
                        Ok(())
                    }),
            )
            .unwrap()
    }

    fn trigger(graph: &mut HeliosGraph) -> crate::graph::ElementId {
        let source = graph.create_object(ObjectKind::Visual, "Test", "Source");
        graph
            .add_element(
                source,
                ElementSpec::trigger("", "position", "changed").unit(&units::NUMERIC),
            )
            .unwrap()
    }

    #[test]
    fn test_static_value_source() {
        let mut graph = HeliosGraph::new();
        let log: Log = Rc::default();
        let t = trigger(&mut graph);
        let a = recording_action(&mut graph, &log);
        graph
            .add_binding(HeliosBinding::new(t, a).with_static_value(42.0))
            .unwrap();
        graph.fire_trigger(t, BindingValue::from_double(1.0));
        assert_eq!(*log.borrow(), vec![BindingValue::from_double(42.0)]);
    }

    #[test]
    fn test_condition_gates_with_mock() {
        let mut mock = MockScriptEvaluator::new();
        mock.expect_evaluate()
            .returning(|_, value| Ok(vec![ScriptValue::Bool(value.double_value() > 5.0)]));
        let mut graph = HeliosGraph::with_script_evaluator(Box::new(mock));
        let log: Log = Rc::default();
        let t = trigger(&mut graph);
        let a = recording_action(&mut graph, &log);
        graph
            .add_binding(HeliosBinding::new(t, a).with_condition("TriggerValue > 5"))
            .unwrap();
        graph.fire_trigger(t, BindingValue::from_double(1.0));
        graph.fire_trigger(t, BindingValue::from_double(9.0));
        assert_eq!(*log.borrow(), vec![BindingValue::from_double(9.0)]);
    }

    #[test]
    fn test_script_without_result_skips_action() {
        let mut mock = MockScriptEvaluator::new();
        mock.expect_evaluate().returning(|_, _| Ok(vec![]));
        let mut graph = HeliosGraph::with_script_evaluator(Box::new(mock));
        let log: Log = Rc::default();
        let t = trigger(&mut graph);
        let a = recording_action(&mut graph, &log);
        let id = graph
            .add_binding(HeliosBinding::new(t, a).with_script("()"))
            .unwrap();
        graph.fire_trigger(t, BindingValue::from_double(1.0));
        graph.fire_trigger(t, BindingValue::from_double(2.0));
        assert!(log.borrow().is_empty());
        // One distinct message, logged once.
        assert_eq!(graph.binding(id).unwrap().log_filter.len(), 1);
    }

    #[test]
    fn test_script_first_value_is_used() {
        let mut graph = HeliosGraph::new();
        let log: Log = Rc::default();
        let t = trigger(&mut graph);
        let a = recording_action(&mut graph, &log);
        graph
            .add_binding(HeliosBinding::new(t, a).with_script("[TriggerValue * 10.0, 0]"))
            .unwrap();
        graph.fire_trigger(t, BindingValue::from_double(1.5));
        assert_eq!(*log.borrow(), vec![BindingValue::from_double(15.0)]);
    }

    #[test]
    fn test_unit_conversion() {
        let mut graph = HeliosGraph::new();
        let log: Log = Rc::default();
        let source = graph.create_object(ObjectKind::Visual, "Test", "Altimeter");
        let t = graph
            .add_element(source, ElementSpec::trigger("", "altitude", "changed").unit(&units::FEET))
            .unwrap();
        let target = graph.create_object(ObjectKind::Visual, "Test", "Tape");
        let sink = log.clone();
        let a = graph
            .add_element(
                target,
                ElementSpec::action("", "altitude", "set")
                    .unit(&units::METERS)
                    .handler(move |_, inv| {
                        sink.borrow_mut().push(inv.value.clone());
                        Ok(())
                    }),
            )
            .unwrap();
        graph.add_binding(HeliosBinding::new(t, a)).unwrap();
        graph.fire_trigger(t, BindingValue::from_double(1000.0));
        let received = log.borrow()[0].double_value();
        assert!((received - 304.8).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_binding_does_not_fire() {
        let mut graph = HeliosGraph::new();
        let log: Log = Rc::default();
        let t = trigger(&mut graph);
        let a = recording_action(&mut graph, &log);
        graph
            .add_binding(HeliosBinding::new(t, a).inactive())
            .unwrap();
        graph.fire_trigger(t, BindingValue::from_double(1.0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_handler_error_is_swallowed() {
        let mut graph = HeliosGraph::new();
        let t = trigger(&mut graph);
        let target = graph.create_object(ObjectKind::Visual, "Test", "Broken");
        let a = graph
            .add_element(
                target,
                ElementSpec::action("", "explode", "now").handler(|_, _| {
                    Err(crate::error::HeliosError::Binding("boom".to_string()))
                }),
            )
            .unwrap();
        let id = graph.add_binding(HeliosBinding::new(t, a)).unwrap();
        graph.fire_trigger(t, BindingValue::empty());
        assert!(!graph.binding(id).unwrap().is_executing());
    }

    #[test]
    fn test_set_value_bypass_never_fires() {
        let mut graph = HeliosGraph::new();
        let log: Log = Rc::default();
        let owner = graph.create_object(ObjectKind::Visual, "Test", "Switch");
        let value = graph
            .add_element(owner, ElementSpec::value("", "position", BindingValue::from_bool(false)))
            .unwrap();
        let a = recording_action(&mut graph, &log);
        graph.add_binding(HeliosBinding::new(value, a)).unwrap();
        graph
            .set_value(value, BindingValue::from_bool(true), true)
            .unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(graph.value(value), Some(&BindingValue::from_bool(true)));
    }

    #[test]
    fn test_legacy_reset_is_noop() {
        let mut graph = HeliosGraph::new();
        graph.set_legacy_value_reset(true);
        let log: Log = Rc::default();
        let owner = graph.create_object(ObjectKind::Visual, "Test", "Switch");
        let value = graph
            .add_element(owner, ElementSpec::value("", "position", BindingValue::from_bool(false)))
            .unwrap();
        let a = recording_action(&mut graph, &log);
        graph.add_binding(HeliosBinding::new(value, a)).unwrap();
        graph.set_value(value, BindingValue::from_bool(true), false).unwrap();
        graph.reset_value(value);
        graph.set_value(value, BindingValue::from_bool(true), false).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }
}
