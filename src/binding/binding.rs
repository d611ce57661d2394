//! The binding edge: trigger → (condition) → value resolution → action.
//!
//! A [`HeliosBinding`] only stores handles to its endpoints. The firing
//! protocol itself lives on [`HeliosGraph`](crate::graph::HeliosGraph) because
//! executing an action needs mutable access to the whole graph.

use crate::binding::element::BindingElement;
use crate::binding::log_filter::LogFilter;
use crate::binding::units;
use crate::binding::value::BindingValue;
use crate::graph::id::ElementId;
use std::fmt;
use std::str::FromStr;

/// Where the value handed to the action comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingValueSource {
    /// The binding's stored value, unconverted.
    StaticValue,
    /// The fired trigger's value, unit-converted when possible.
    #[default]
    TriggerValue,
    /// The first value returned by the binding's script.
    Script,
}

impl BindingValueSource {
    /// XML element name used in profiles.
    pub fn tag(&self) -> &'static str {
        match self {
            BindingValueSource::StaticValue => "StaticValue",
            BindingValueSource::TriggerValue => "TriggerValue",
            BindingValueSource::Script => "LuaScript",
        }
    }
}

impl fmt::Display for BindingValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for BindingValueSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "StaticValue" => Ok(BindingValueSource::StaticValue),
            "TriggerValue" => Ok(BindingValueSource::TriggerValue),
            "LuaScript" | "Script" => Ok(BindingValueSource::Script),
            other => Err(format!("Unknown binding value source '{}'", other)),
        }
    }
}

/// Result of [`HeliosBinding::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingValidity {
    /// False only when an endpoint is missing; such bindings never execute.
    pub is_valid: bool,
    /// Advisory or fatal explanation, empty when the binding is clean.
    pub message: String,
}

/// A directed edge from one trigger to one action.
#[derive(Debug, Clone)]
pub struct HeliosBinding {
    pub(crate) trigger: Option<ElementId>,
    pub(crate) action: Option<ElementId>,
    pub value_source: BindingValueSource,
    /// Static value, or the script source when `value_source` is `Script`.
    pub value: BindingValue,
    pub condition: Option<String>,
    pub bypass_cascading_triggers: bool,
    pub is_active: bool,
    pub(crate) is_executing: bool,
    pub(crate) is_valid: bool,
    pub(crate) error_message: String,
    /// Created by a composite factory; recreated on load instead of persisted.
    pub(crate) is_default: bool,
    pub(crate) log_filter: LogFilter,
}

impl HeliosBinding {
    pub fn new(trigger: ElementId, action: ElementId) -> Self {
        Self {
            trigger: Some(trigger),
            action: Some(action),
            value_source: BindingValueSource::TriggerValue,
            value: BindingValue::empty(),
            condition: None,
            bypass_cascading_triggers: false,
            is_active: true,
            is_executing: false,
            is_valid: false,
            error_message: String::new(),
            is_default: false,
            log_filter: LogFilter::new(),
        }
    }

    pub fn with_static_value(mut self, value: impl Into<BindingValue>) -> Self {
        self.value_source = BindingValueSource::StaticValue;
        self.value = value.into();
        self
    }

    pub fn with_trigger_value(mut self) -> Self {
        self.value_source = BindingValueSource::TriggerValue;
        self
    }

    pub fn with_script(mut self, source: impl Into<String>) -> Self {
        self.value_source = BindingValueSource::Script;
        self.value = BindingValue::from_string(source.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        let condition = condition.into();
        self.condition = if condition.trim().is_empty() {
            None
        } else {
            Some(condition)
        };
        self
    }

    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass_cascading_triggers = bypass;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn trigger(&self) -> Option<ElementId> {
        self.trigger
    }

    pub fn action(&self) -> Option<ElementId> {
        self.action
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn is_executing(&self) -> bool {
        self.is_executing
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Script source text for `Script` bindings.
    pub fn script(&self) -> Option<&str> {
        match self.value_source {
            BindingValueSource::Script => Some(self.value.string_value()),
            _ => None,
        }
    }

    /// Recompute validity from the live endpoints. `None` means the endpoint
    /// is unset or no longer alive.
    pub fn validate(
        &mut self,
        trigger: Option<&BindingElement>,
        action: Option<&BindingElement>,
    ) -> BindingValidity {
        let validity = Self::check(self, trigger, action);
        self.is_valid = validity.is_valid;
        self.error_message = validity.message.clone();
        self.log_filter.clear();
        validity
    }

    fn check(
        &self,
        trigger: Option<&BindingElement>,
        action: Option<&BindingElement>,
    ) -> BindingValidity {
        let (trigger, action) = match (trigger, action) {
            (None, _) => return BindingValidity::fatal("Binding has no trigger."),
            (_, None) => return BindingValidity::fatal("Binding has no action."),
            (Some(t), Some(a)) => (t, a),
        };
        if !trigger.is_trigger() {
            return BindingValidity::fatal("Bound trigger element cannot fire.");
        }
        if !action.is_action() {
            return BindingValidity::fatal("Bound action element cannot be invoked.");
        }

        if !action.requires_value() {
            return BindingValidity::ok();
        }

        match self.value_source {
            BindingValueSource::TriggerValue => {
                let from = trigger.unit();
                let to = action.unit();
                if !from.has_value() {
                    BindingValidity::advisory(
                        "Trigger does not provide a value but the action requires one.",
                    )
                } else if from != to && units::unit_converter(from, to).is_none() {
                    BindingValidity::advisory(format!(
                        "Trigger value unit '{}' cannot be converted to action unit '{}'. \
                         Disregarding units.",
                        from.long_name, to.long_name
                    ))
                } else {
                    BindingValidity::ok()
                }
            }
            BindingValueSource::StaticValue if self.value.string_value().is_empty() => {
                BindingValidity::advisory("Static value is empty but the action requires a value.")
            }
            BindingValueSource::Script if self.value.string_value().trim().is_empty() => {
                BindingValidity::advisory("Script is empty but the action requires a value.")
            }
            _ => BindingValidity::ok(),
        }
    }
}

impl BindingValidity {
    fn ok() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
        }
    }

    fn advisory(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
        }
    }

    fn fatal(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::element::ElementSpec;
    use crate::graph::id::{ArenaHandle, ObjectId};

    fn element(spec: ElementSpec) -> BindingElement {
        BindingElement::from_spec(ObjectId::from_parts(0, 0), spec)
    }

    fn ids() -> (ElementId, ElementId) {
        (ElementId::from_parts(0, 0), ElementId::from_parts(1, 0))
    }

    #[test]
    fn test_value_source_tags() {
        assert_eq!(BindingValueSource::Script.tag(), "LuaScript");
        assert_eq!(
            "LuaScript".parse::<BindingValueSource>(),
            Ok(BindingValueSource::Script)
        );
        assert!("Bogus".parse::<BindingValueSource>().is_err());
    }

    #[test]
    fn test_missing_endpoint_is_fatal() {
        let (t, a) = ids();
        let mut binding = HeliosBinding::new(t, a);
        let action = element(ElementSpec::action("", "Reset", "push"));
        let validity = binding.validate(None, Some(&action));
        assert!(!validity.is_valid);
        assert!(!binding.is_valid());
        assert!(!binding.error_message().is_empty());
    }

    #[test]
    fn test_unit_mismatch_is_advisory() {
        let (t, a) = ids();
        let mut binding = HeliosBinding::new(t, a);
        let trigger = element(
            ElementSpec::trigger("", "Altitude", "changed").unit(&units::FEET),
        );
        let action = element(ElementSpec::action("", "Needle", "set").unit(&units::DEGREES));
        let validity = binding.validate(Some(&trigger), Some(&action));
        assert!(validity.is_valid);
        assert!(validity.message.contains("Disregarding units"));
    }

    #[test]
    fn test_convertible_units_are_clean() {
        let (t, a) = ids();
        let mut binding = HeliosBinding::new(t, a);
        let trigger = element(ElementSpec::trigger("", "Altitude", "changed").unit(&units::FEET));
        let action = element(ElementSpec::action("", "Tape", "set").unit(&units::METERS));
        let validity = binding.validate(Some(&trigger), Some(&action));
        assert!(validity.is_valid);
        assert!(validity.message.is_empty());
    }

    #[test]
    fn test_empty_static_value_is_advisory() {
        let (t, a) = ids();
        let mut binding = HeliosBinding::new(t, a).with_static_value("");
        let trigger = element(ElementSpec::trigger("", "button", "pushed"));
        let action = element(ElementSpec::action("", "Needle", "set").unit(&units::NUMERIC));
        let validity = binding.validate(Some(&trigger), Some(&action));
        assert!(validity.is_valid);
        assert!(!validity.message.is_empty());
    }

    #[test]
    fn test_action_without_value_ignores_source() {
        let (t, a) = ids();
        let mut binding = HeliosBinding::new(t, a).with_static_value("");
        let trigger = element(ElementSpec::trigger("", "button", "pushed"));
        let action = element(ElementSpec::action("", "Reset", "push"));
        let validity = binding.validate(Some(&trigger), Some(&action));
        assert!(validity.is_valid);
        assert!(validity.message.is_empty());
    }

    #[test]
    fn test_blank_condition_is_dropped() {
        let (t, a) = ids();
        let binding = HeliosBinding::new(t, a).with_condition("   ");
        assert!(!binding.has_condition());
        let binding = HeliosBinding::new(t, a).with_condition("TriggerValue > 3");
        assert!(binding.has_condition());
    }
}
