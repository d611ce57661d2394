//! Triggers, actions and values: the named endpoints bindings connect.
//!
//! Every element is owned by one object and identified by an ID derived from
//! `(device, name, verb)` as `device.name.verb` with empty parts left out. IDs
//! are written into profiles, so they must stay stable; an explicit ID
//! overrides the derived one when a device or name has to change after release.
//!
//! A value element is a trigger and an action at once. Its trigger ID uses the
//! verb `changed` and its action ID the verb `set`.

use crate::binding::units::{self, BindingValueUnit};
use crate::binding::value::BindingValue;
use crate::error::Result;
use crate::graph::id::{BindingId, ElementId, ObjectId};
use crate::graph::HeliosGraph;
use std::fmt;
use std::rc::Rc;

pub const VALUE_TRIGGER_VERB: &str = "changed";
pub const VALUE_ACTION_VERB: &str = "set";

/// Arguments handed to an action handler.
#[derive(Debug, Clone)]
pub struct ActionInvocation {
    pub action: ElementId,
    pub target: ObjectId,
    pub value: BindingValue,
    pub bypass_cascading_triggers: bool,
}

/// Behavior behind an action. Handlers receive the whole graph so they can
/// set values and fire further triggers.
pub type ActionHandler = Rc<dyn Fn(&mut HeliosGraph, &ActionInvocation) -> Result<()>>;

/// Which binding surface an element exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    Trigger,
    Action,
    Value,
}

pub(crate) enum ElementKind {
    Trigger {
        verb: String,
    },
    Action {
        verb: String,
        handler: Option<ActionHandler>,
    },
    Value {
        value: BindingValue,
        synchronized: bool,
        handler: Option<ActionHandler>,
    },
}

/// Join the non-empty identity parts with `.`.
pub fn compose_id(device: &str, name: &str, verb: &str) -> String {
    [device, name, verb]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}

/// A trigger, action or value owned by an object.
pub struct BindingElement {
    owner: ObjectId,
    device: String,
    name: String,
    description: String,
    value_description: String,
    unit: &'static BindingValueUnit,
    explicit_id: Option<String>,
    trigger_id: Option<String>,
    action_id: Option<String>,
    display_name: String,
    pub(crate) kind: ElementKind,
    pub(crate) subscribers: Vec<BindingId>,
}

impl BindingElement {
    pub(crate) fn from_spec(owner: ObjectId, spec: ElementSpec) -> Self {
        let mut element = Self {
            owner,
            device: spec.device,
            name: spec.name,
            description: spec.description,
            value_description: spec.value_description,
            unit: spec.unit,
            explicit_id: spec.explicit_id,
            trigger_id: None,
            action_id: None,
            display_name: String::new(),
            kind: spec.kind,
            subscribers: Vec::new(),
        };
        element.update_id();
        element.recalculate_name();
        element
    }

    /// Owning object. The element does not keep its owner alive; callers
    /// resolve the handle through the graph.
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn role(&self) -> ElementRole {
        match self.kind {
            ElementKind::Trigger { .. } => ElementRole::Trigger,
            ElementKind::Action { .. } => ElementRole::Action,
            ElementKind::Value { .. } => ElementRole::Value,
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.role(), ElementRole::Trigger | ElementRole::Value)
    }

    pub fn is_action(&self) -> bool {
        matches!(self.role(), ElementRole::Action | ElementRole::Value)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_description(&self) -> &str {
        &self.value_description
    }

    pub fn unit(&self) -> &'static BindingValueUnit {
        self.unit
    }

    pub fn trigger_verb(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Trigger { verb } => Some(verb),
            ElementKind::Value { .. } => Some(VALUE_TRIGGER_VERB),
            ElementKind::Action { .. } => None,
        }
    }

    pub fn action_verb(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Action { verb, .. } => Some(verb),
            ElementKind::Value { .. } => Some(VALUE_ACTION_VERB),
            ElementKind::Trigger { .. } => None,
        }
    }

    /// Persisted trigger ID, if this element can fire.
    pub fn trigger_id(&self) -> Option<&str> {
        self.trigger_id.as_deref()
    }

    /// Persisted action ID, if this element can be invoked.
    pub fn action_id(&self) -> Option<&str> {
        self.action_id.as_deref()
    }

    /// Cosmetic text for UI and logs. Not used for identity.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether invoking this action needs a value from the binding.
    pub fn requires_value(&self) -> bool {
        match self.kind {
            ElementKind::Value { .. } => true,
            ElementKind::Action { .. } => self.unit.has_value(),
            ElementKind::Trigger { .. } => false,
        }
    }

    /// Current value of a value element.
    pub fn value(&self) -> Option<&BindingValue> {
        match &self.kind {
            ElementKind::Value { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_synchronized(&self) -> Option<bool> {
        match self.kind {
            ElementKind::Value { synchronized, .. } => Some(synchronized),
            _ => None,
        }
    }

    pub fn subscribers(&self) -> &[BindingId] {
        &self.subscribers
    }

    pub(crate) fn handler(&self) -> Option<ActionHandler> {
        match &self.kind {
            ElementKind::Action { handler, .. } | ElementKind::Value { handler, .. } => {
                handler.clone()
            }
            ElementKind::Trigger { .. } => None,
        }
    }

    pub(crate) fn set_device(&mut self, device: impl Into<String>) {
        self.device = device.into();
        self.update_id();
        self.recalculate_name();
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.update_id();
        self.recalculate_name();
    }

    fn update_id(&mut self) {
        let explicit = self.explicit_id.clone();
        let id_for = |verb: &str| {
            explicit
                .clone()
                .unwrap_or_else(|| compose_id(&self.device, &self.name, verb))
        };
        self.trigger_id = self.trigger_verb().map(id_for);
        self.action_id = self.action_verb().map(id_for);
        // A value shares one explicit id between both surfaces; keep the verbs apart.
        if let (ElementKind::Value { .. }, Some(explicit)) = (&self.kind, explicit) {
            self.trigger_id = Some(format!("{}.{}", explicit, VALUE_TRIGGER_VERB));
            self.action_id = Some(format!("{}.{}", explicit, VALUE_ACTION_VERB));
        }
    }

    fn recalculate_name(&mut self) {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if !self.device.is_empty() {
            parts.push(&self.device);
        }
        if !self.name.is_empty() {
            parts.push(&self.name);
        }
        self.display_name = parts.join(" ");
    }
}

impl fmt::Debug for BindingElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingElement")
            .field("owner", &self.owner)
            .field("role", &self.role())
            .field("trigger_id", &self.trigger_id)
            .field("action_id", &self.action_id)
            .field("unit", &self.unit.name)
            .finish()
    }
}

/// Builder describing an element before it is added to an object.
pub struct ElementSpec {
    device: String,
    name: String,
    description: String,
    value_description: String,
    unit: &'static BindingValueUnit,
    explicit_id: Option<String>,
    kind: ElementKind,
}

impl ElementSpec {
    pub fn trigger(
        device: impl Into<String>,
        name: impl Into<String>,
        verb: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            device,
            name,
            &units::NO_VALUE,
            ElementKind::Trigger { verb: verb.into() },
        )
    }

    pub fn action(
        device: impl Into<String>,
        name: impl Into<String>,
        verb: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            device,
            name,
            &units::NO_VALUE,
            ElementKind::Action {
                verb: verb.into(),
                handler: None,
            },
        )
    }

    pub fn value(
        device: impl Into<String>,
        name: impl Into<String>,
        initial: BindingValue,
    ) -> Self {
        Self::with_kind(
            device,
            name,
            &units::NUMERIC,
            ElementKind::Value {
                value: initial,
                synchronized: false,
                handler: None,
            },
        )
    }

    fn with_kind(
        device: impl Into<String>,
        name: impl Into<String>,
        unit: &'static BindingValueUnit,
        kind: ElementKind,
    ) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            description: String::new(),
            value_description: String::new(),
            unit,
            explicit_id: None,
            kind,
        }
    }

    pub fn unit(mut self, unit: &'static BindingValueUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value_description(mut self, value_description: impl Into<String>) -> Self {
        self.value_description = value_description.into();
        self
    }

    /// Pin the persisted ID regardless of device/name.
    pub fn explicit_id(mut self, id: impl Into<String>) -> Self {
        self.explicit_id = Some(id.into());
        self
    }

    /// Behavior for actions, or a post-set hook for values. Ignored on triggers.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut HeliosGraph, &ActionInvocation) -> Result<()> + 'static,
    {
        match &mut self.kind {
            ElementKind::Action { handler: slot, .. }
            | ElementKind::Value { handler: slot, .. } => {
                *slot = Some(Rc::new(handler));
            }
            ElementKind::Trigger { .. } => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::id::ArenaHandle;

    fn owner() -> ObjectId {
        ObjectId::from_parts(0, 0)
    }

    #[test]
    fn test_compose_id_skips_empty_parts() {
        assert_eq!(compose_id("Gear", "Handle", "set"), "Gear.Handle.set");
        assert_eq!(compose_id("", "position", "changed"), "position.changed");
        assert_eq!(compose_id("", "", "pushed"), "pushed");
    }

    #[test]
    fn test_value_has_both_ids() {
        let element = BindingElement::from_spec(
            owner(),
            ElementSpec::value("Gear", "Handle", BindingValue::from_bool(false)),
        );
        assert_eq!(element.trigger_id(), Some("Gear.Handle.changed"));
        assert_eq!(element.action_id(), Some("Gear.Handle.set"));
        assert!(element.is_trigger() && element.is_action());
        assert!(element.requires_value());
    }

    #[test]
    fn test_trigger_has_no_action_id() {
        let element =
            BindingElement::from_spec(owner(), ElementSpec::trigger("", "button", "pushed"));
        assert_eq!(element.trigger_id(), Some("button.pushed"));
        assert_eq!(element.action_id(), None);
        assert!(!element.requires_value());
    }

    #[test]
    fn test_rename_updates_id_and_display_name() {
        let mut element =
            BindingElement::from_spec(owner(), ElementSpec::action("Lights", "Landing", "toggle"));
        assert_eq!(element.display_name(), "Lights Landing");
        element.set_name("Taxi");
        assert_eq!(element.action_id(), Some("Lights.Taxi.toggle"));
        assert_eq!(element.display_name(), "Lights Taxi");
        element.set_device("Exterior Lights");
        assert_eq!(element.action_id(), Some("Exterior Lights.Taxi.toggle"));
    }

    #[test]
    fn test_explicit_id_survives_rename() {
        let mut element = BindingElement::from_spec(
            owner(),
            ElementSpec::action("Lights", "Landing", "toggle").explicit_id("legacy.landing"),
        );
        element.set_device("Exterior");
        assert_eq!(element.action_id(), Some("legacy.landing"));
    }

    #[test]
    fn test_action_requires_value_by_unit() {
        let plain = BindingElement::from_spec(owner(), ElementSpec::action("", "Reset", "push"));
        assert!(!plain.requires_value());
        let valued = BindingElement::from_spec(
            owner(),
            ElementSpec::action("", "Needle", "set").unit(&units::DEGREES),
        );
        assert!(valued.requires_value());
    }
}
