//! Built-in components.
//!
//! Rendering is out of scope here; each component only contributes its
//! binding surface and behavior.

use super::ComponentRegistry;
use crate::binding::element::ElementSpec;
use crate::binding::units::{self, BindingValueUnit};
use crate::binding::value::BindingValue;
use crate::error::{HeliosError, Result};
use crate::graph::{ElementId, HeliosGraph, LifecycleHooks, ObjectId, ObjectKind};
use std::rc::Rc;

pub const MONITOR: &str = "Helios.Base.Monitor";
pub const PANEL: &str = "Helios.Base.Panel";
pub const TOGGLE_SWITCH: &str = "Helios.Base.ToggleSwitch";
pub const PUSH_BUTTON: &str = "Helios.Base.PushButton";
pub const GAUGE: &str = "Helios.Base.Gauge";
pub const GUARDED_TOGGLE_SWITCH: &str = "Helios.Base.GuardedToggleSwitch";
pub const PROFILE_INTERFACE: &str = "Helios.Base.ProfileInterface";
pub const SIMULATOR_INTERFACE: &str = "Helios.Base.SimulatorInterface";

/// Live type identifiers of placeholders for unsupported components. Not
/// creatable through the registry.
pub const UNSUPPORTED_VISUAL: &str = "Helios.Base.UnsupportedVisual";
pub const UNSUPPORTED_INTERFACE: &str = "Helios.Base.UnsupportedInterface";

pub fn register_all(registry: &mut ComponentRegistry) {
    registry.register(ObjectKind::Monitor, MONITOR, "Monitor", build_hideable);
    registry.register_visual(PANEL, "Panel", build_hideable);
    registry.register_visual(TOGGLE_SWITCH, "Toggle Switch", build_toggle_switch);
    registry.register_visual(PUSH_BUTTON, "Push Button", build_push_button);
    registry.register_visual(GAUGE, "Gauge", build_gauge);
    registry.register_visual(
        GUARDED_TOGGLE_SWITCH,
        "Guarded Toggle Switch",
        build_guarded_toggle_switch,
    );
    registry.register_interface(PROFILE_INTERFACE, "Profile", build_profile_interface);
    registry.register_interface(
        SIMULATOR_INTERFACE,
        "Simulator",
        build_simulator_interface,
    );
}

fn build_hideable(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    graph.add_element(
        id,
        ElementSpec::value("", "hidden", BindingValue::from_bool(false))
            .unit(&units::BOOLEAN)
            .description("Hides the element and its children when true."),
    )?;
    Ok(())
}

fn build_toggle_switch(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    let position = graph.add_element(
        id,
        ElementSpec::value("", "position", BindingValue::from_bool(false))
            .unit(&units::BOOLEAN)
            .description("Current switch position.")
            .value_description("True when the switch is on."),
    )?;
    graph.add_element(
        id,
        ElementSpec::action("", "position", "toggle").handler(move |graph, _| {
            let current = graph
                .value(position)
                .map(|v| v.bool_value())
                .unwrap_or(false);
            graph.set_value(position, BindingValue::from_bool(!current), false)
        }),
    )?;
    Ok(())
}

fn build_push_button(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    let pushed = graph.add_element(
        id,
        ElementSpec::trigger("", "button", "pushed")
            .description("Fired when the button is pressed."),
    )?;
    let released = graph.add_element(
        id,
        ElementSpec::trigger("", "button", "released")
            .description("Fired when the button is released."),
    )?;
    let state = graph.add_element(
        id,
        ElementSpec::value("", "physical state", BindingValue::from_bool(false))
            .unit(&units::BOOLEAN),
    )?;
    graph.add_element(
        id,
        ElementSpec::action("", "button", "push").handler(move |graph, invocation| {
            graph.set_value(state, BindingValue::from_bool(true), true)?;
            if !invocation.bypass_cascading_triggers {
                graph.fire_trigger(pushed, BindingValue::from_bool(true));
            }
            Ok(())
        }),
    )?;
    graph.add_element(
        id,
        ElementSpec::action("", "button", "release").handler(move |graph, invocation| {
            graph.set_value(state, BindingValue::from_bool(false), true)?;
            if !invocation.bypass_cascading_triggers {
                graph.fire_trigger(released, BindingValue::from_bool(false));
            }
            Ok(())
        }),
    )?;
    Ok(())
}

fn build_gauge(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    graph.add_element(
        id,
        ElementSpec::value("", "needle", BindingValue::from_double(0.0))
            .unit(&units::DEGREES)
            .description("Needle rotation."),
    )?;
    Ok(())
}

/// Two toggle switches (guard and switch) exposed through the parent.
fn build_guarded_toggle_switch(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    graph.set_composite(id, true)?;
    for part in ["guard", "switch"] {
        let child = graph.create_object(ObjectKind::Visual, TOGGLE_SWITCH, capitalize(part));
        build_toggle_switch(graph, child)?;
        graph.add_child(id, child)?;

        let name = format!("{} position", part);
        graph.add_element(
            id,
            ElementSpec::value("", name.as_str(), BindingValue::from_bool(false))
                .unit(&units::BOOLEAN),
        )?;
        graph.add_default_input_binding(
            id,
            &format!("{}.changed", name),
            child,
            "position.set",
        )?;
        graph.add_default_output_binding(
            child,
            "position.changed",
            id,
            &format!("{}.set", name),
        )?;
    }
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

struct ProfileInterfaceHooks {
    started: ElementId,
    stopped: ElementId,
    reset: ElementId,
}

impl LifecycleHooks for ProfileInterfaceHooks {
    fn on_profile_started(&self, graph: &mut HeliosGraph, _object: ObjectId) {
        graph.fire_trigger(self.started, BindingValue::empty());
    }

    fn on_profile_stopped(&self, graph: &mut HeliosGraph, _object: ObjectId) {
        graph.fire_trigger(self.stopped, BindingValue::empty());
    }

    fn on_profile_reset(&self, graph: &mut HeliosGraph, _object: ObjectId) {
        graph.fire_trigger(self.reset, BindingValue::empty());
    }
}

fn build_profile_interface(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    let started = graph.add_element(
        id,
        ElementSpec::trigger("Profile", "", "Started")
            .description("Fired when the profile starts."),
    )?;
    let stopped = graph.add_element(
        id,
        ElementSpec::trigger("Profile", "", "Stopped").description("Fired when the profile stops."),
    )?;
    let reset = graph.add_element(
        id,
        ElementSpec::trigger("Profile", "", "Reset").description("Fired after a profile reset."),
    )?;
    graph.set_object_hooks(
        id,
        Rc::new(ProfileInterfaceHooks {
            started,
            stopped,
            reset,
        }),
    )
}

/// Simulator data points exposed by the simulator interface, as
/// `(device, name, unit, initial value)`.
pub static SIMULATOR_VALUES: &[(&str, &str, &BindingValueUnit, f64)] = &[
    ("Gear", "Handle", &units::BOOLEAN, 0.0),
    ("Lights", "Landing", &units::BOOLEAN, 0.0),
    ("Altimeter", "Altitude", &units::FEET, 0.0),
    ("Altimeter", "Pressure", &units::INCHES_OF_MERCURY, 29.92),
    ("Airspeed", "Indicated", &units::KNOTS, 0.0),
    ("Engine", "RPM", &units::RPM, 0.0),
    ("Engine", "Oil Temperature", &units::CELSIUS, 15.0),
    ("Fuel", "Flow", &units::POUNDS_PER_HOUR, 0.0),
];

fn build_simulator_interface(graph: &mut HeliosGraph, id: ObjectId) -> Result<()> {
    for &(device, name, unit, initial) in SIMULATOR_VALUES {
        let initial = if unit.category == units::UnitCategory::Boolean {
            BindingValue::from_bool(initial != 0.0)
        } else {
            BindingValue::from_double(initial)
        };
        graph.add_element(
            id,
            ElementSpec::value(device, name, initial)
                .unit(unit)
                .description(format!("{} {} reported by the simulator.", device, name)),
        )?;
    }
    Ok(())
}

/// Feed a value received from the simulator into the interface. `key` is
/// `device.name` as listed in [`SIMULATOR_VALUES`].
pub fn simulator_receive(
    graph: &mut HeliosGraph,
    interface: ObjectId,
    key: &str,
    value: BindingValue,
) -> Result<()> {
    let element = graph
        .find_trigger(interface, &format!("{}.changed", key))
        .ok_or_else(|| HeliosError::InvalidReference(format!("simulator value '{}'", key)))?;
    tracing::trace!("Simulator update {} = {}", key, value);
    graph.set_value(element, value, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::HeliosBinding;

    fn registry() -> ComponentRegistry {
        ComponentRegistry::with_builtins()
    }

    #[test]
    fn test_all_builtins_construct() {
        let registry = registry();
        let mut graph = HeliosGraph::new();
        let types: Vec<String> = registry.types().map(|t| t.type_identifier.clone()).collect();
        for type_identifier in types {
            registry
                .create(&mut graph, &type_identifier, "x")
                .unwrap_or_else(|e| panic!("{} failed: {}", type_identifier, e));
        }
    }

    #[test]
    fn test_toggle_switch_toggles() {
        let registry = registry();
        let mut graph = HeliosGraph::new();
        let switch = registry.create(&mut graph, TOGGLE_SWITCH, "Switch").unwrap();
        let toggle = graph.find_action(switch, "position.toggle").unwrap();
        let position = graph.find_value(switch, "position").unwrap();
        graph.invoke_action(toggle, BindingValue::empty(), false).unwrap();
        assert_eq!(graph.value(position), Some(&BindingValue::from_bool(true)));
        graph.invoke_action(toggle, BindingValue::empty(), false).unwrap();
        assert_eq!(graph.value(position), Some(&BindingValue::from_bool(false)));
    }

    #[test]
    fn test_guarded_switch_mirrors_child() {
        let registry = registry();
        let mut graph = HeliosGraph::new();
        let guarded = registry
            .create(&mut graph, GUARDED_TOGGLE_SWITCH, "Master Arm")
            .unwrap();
        graph.attach_root(guarded).unwrap();
        assert!(graph.object(guarded).unwrap().is_composite());
        let guard = graph.find_child(guarded, "Guard").unwrap();

        let child_toggle = graph.find_action(guard, "position.toggle").unwrap();
        graph.invoke_action(child_toggle, BindingValue::empty(), false).unwrap();
        let parent_value = graph.find_value(guarded, "guard position").unwrap();
        assert_eq!(graph.value(parent_value), Some(&BindingValue::from_bool(true)));

        // Parent writes reach the child without echoing back.
        graph
            .set_value(parent_value, BindingValue::from_bool(false), false)
            .unwrap();
        let child_value = graph.find_value(guard, "position").unwrap();
        assert_eq!(graph.value(child_value), Some(&BindingValue::from_bool(false)));
        assert!(graph.bindings().all(|(_, b)| b.is_default()));
    }

    #[test]
    fn test_simulator_receive_fires() {
        let registry = registry();
        let mut graph = HeliosGraph::new();
        let sim = registry.create(&mut graph, SIMULATOR_INTERFACE, "Sim").unwrap();
        let gauge = registry.create(&mut graph, GAUGE, "Altimeter").unwrap();
        let altitude = graph.find_trigger(sim, "Altimeter.Altitude.changed").unwrap();
        let needle = graph.find_action(gauge, "needle.set").unwrap();
        graph
            .add_binding(HeliosBinding::new(altitude, needle).with_script("TriggerValue / 100.0"))
            .unwrap();
        simulator_receive(&mut graph, sim, "Altimeter.Altitude", BindingValue::from_double(3600.0))
            .unwrap();
        let needle_value = graph.find_value(gauge, "needle").unwrap();
        assert_eq!(graph.value(needle_value), Some(&BindingValue::from_double(36.0)));
        assert!(simulator_receive(&mut graph, sim, "Nope", BindingValue::empty()).is_err());
    }

    #[test]
    fn test_profile_interface_ids() {
        let registry = registry();
        let mut graph = HeliosGraph::new();
        let profile = registry.create(&mut graph, PROFILE_INTERFACE, "Profile").unwrap();
        for id in ["Profile.Started", "Profile.Stopped", "Profile.Reset"] {
            assert!(graph.find_trigger(profile, id).is_some(), "{}", id);
        }
    }
}
