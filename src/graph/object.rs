//! Objects that own binding elements: monitors, visual controls and interfaces.

use crate::graph::id::{BindingId, ElementId, ObjectId};
use crate::graph::HeliosGraph;
use crate::registry::ComponentUnsupportedSeverity;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Root of a visual tree.
    Monitor,
    /// A control placed on a monitor or inside another visual.
    Visual,
    /// A data source or sink outside the visual tree.
    Interface,
}

/// Profile lifecycle callbacks for component behavior.
pub trait LifecycleHooks {
    fn on_profile_started(&self, _graph: &mut HeliosGraph, _object: ObjectId) {}
    fn on_profile_stopped(&self, _graph: &mut HeliosGraph, _object: ObjectId) {}
    fn on_profile_tick(&self, _graph: &mut HeliosGraph, _object: ObjectId) {}
    fn on_profile_reset(&self, _graph: &mut HeliosGraph, _object: ObjectId) {}
}

/// Stand-in for a component type this build does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedComponent {
    pub original_type_identifier: String,
    /// Original element text, written back verbatim on save.
    pub raw_xml: String,
    pub severity: ComponentUnsupportedSeverity,
}

/// A node of the object graph.
pub struct HeliosObject {
    pub(crate) name: String,
    pub(crate) type_identifier: String,
    pub(crate) kind: ObjectKind,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) attached: bool,
    pub(crate) composite: bool,
    pub(crate) triggers: Vec<ElementId>,
    pub(crate) actions: Vec<ElementId>,
    pub(crate) values: Vec<ElementId>,
    pub(crate) input_bindings: Vec<BindingId>,
    pub(crate) output_bindings: Vec<BindingId>,
    /// Every binding with an endpoint here, whether or not it is connected.
    pub(crate) edges: Vec<BindingId>,
    pub(crate) hooks: Option<Rc<dyn LifecycleHooks>>,
    pub(crate) placeholder: Option<UnsupportedComponent>,
}

impl HeliosObject {
    pub(crate) fn new(
        kind: ObjectKind,
        type_identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_identifier: type_identifier.into(),
            kind,
            parent: None,
            children: Vec::new(),
            attached: false,
            composite: false,
            triggers: Vec::new(),
            actions: Vec::new(),
            values: Vec::new(),
            input_bindings: Vec::new(),
            output_bindings: Vec::new(),
            edges: Vec::new(),
            hooks: None,
            placeholder: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_identifier(&self) -> &str {
        &self.type_identifier
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Whether the object is currently part of a profile.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Composite visuals own auto-generated children wired with default bindings.
    pub fn is_composite(&self) -> bool {
        self.composite
    }

    pub fn triggers(&self) -> &[ElementId] {
        &self.triggers
    }

    pub fn actions(&self) -> &[ElementId] {
        &self.actions
    }

    pub fn values(&self) -> &[ElementId] {
        &self.values
    }

    /// Bindings whose action targets this object.
    pub fn input_bindings(&self) -> &[BindingId] {
        &self.input_bindings
    }

    /// Bindings whose trigger is sourced from this object.
    pub fn output_bindings(&self) -> &[BindingId] {
        &self.output_bindings
    }

    pub fn placeholder(&self) -> Option<&UnsupportedComponent> {
        self.placeholder.as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    pub(crate) fn set_hooks(&mut self, hooks: Rc<dyn LifecycleHooks>) {
        self.hooks = Some(hooks);
    }

    pub(crate) fn hooks(&self) -> Option<Rc<dyn LifecycleHooks>> {
        self.hooks.clone()
    }
}

impl fmt::Debug for HeliosObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeliosObject")
            .field("name", &self.name)
            .field("type_identifier", &self.type_identifier)
            .field("kind", &self.kind)
            .field("children", &self.children.len())
            .field("attached", &self.attached)
            .field("inputs", &self.input_bindings.len())
            .field("outputs", &self.output_bindings.len())
            .finish()
    }
}
