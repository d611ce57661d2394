//! The binding graph: objects, their elements and the bindings between them.
//!
//! [`HeliosGraph`] owns every object, element and binding in generational
//! arenas and is the single mutation API for the edge set. Each binding is
//! listed twice: in the `output_bindings` of its trigger's owner and in the
//! `input_bindings` of its action's owner. A binding fires only while it is
//! in its source's `output_bindings`; adding it there subscribes it to the
//! trigger and removing it unsubscribes it.
//!
//! Objects leaving the profile disconnect: their bindings are removed from
//! the *counterpart* objects' lists only, so an object keeps its own view of
//! its edges and can reconnect when it comes back.

pub mod firing;
pub mod id;
pub mod object;

pub use id::{Arena, ArenaHandle, BindingId, ElementId, ObjectId};
pub use object::{HeliosObject, LifecycleHooks, ObjectKind, UnsupportedComponent};

use crate::binding::element::{BindingElement, ElementRole, ElementSpec};
use crate::binding::tracer::BindingLoopTracer;
use crate::binding::value::BindingValue;
use crate::binding::{BindingValidity, HeliosBinding};
use crate::config::EngineSettings;
use crate::error::{HeliosError, Result};
use crate::registry::builtins;
use crate::scripting::{RhaiScriptEvaluator, ScriptEvaluator};
use std::fmt;
use std::rc::Rc;

pub struct HeliosGraph {
    objects: Arena<ObjectId, HeliosObject>,
    elements: Arena<ElementId, BindingElement>,
    bindings: Arena<BindingId, HeliosBinding>,
    scripts: Box<dyn ScriptEvaluator>,
    tracer: Option<BindingLoopTracer>,
    legacy_value_reset: bool,
    verbose_binding_logging: bool,
}

impl HeliosGraph {
    /// Empty graph with the Rhai evaluator and default settings.
    pub fn new() -> Self {
        Self::with_settings(&EngineSettings::default())
    }

    /// Empty graph configured from engine settings.
    pub fn with_settings(settings: &EngineSettings) -> Self {
        let mut graph = Self::with_script_evaluator(Box::new(RhaiScriptEvaluator::with_limits(
            settings.script_limits,
        )));
        graph.apply_settings(settings);
        graph
    }

    /// Empty graph using a custom script evaluator.
    pub fn with_script_evaluator(scripts: Box<dyn ScriptEvaluator>) -> Self {
        Self {
            objects: Arena::new(),
            elements: Arena::new(),
            bindings: Arena::new(),
            scripts,
            tracer: None,
            legacy_value_reset: false,
            verbose_binding_logging: false,
        }
    }

    /// Apply the runtime flags from `settings`. The script evaluator is kept.
    pub fn apply_settings(&mut self, settings: &EngineSettings) {
        self.legacy_value_reset = settings.legacy_value_reset;
        self.verbose_binding_logging = settings.verbose_binding_logging;
        self.set_loop_tracing(settings.trace_binding_loops);
    }

    /// Replace the evaluator used for conditions and value scripts.
    pub fn set_script_evaluator(&mut self, scripts: Box<dyn ScriptEvaluator>) {
        self.scripts = scripts;
    }

    /// The evaluator used for conditions and value scripts.
    pub fn script_evaluator(&self) -> &dyn ScriptEvaluator {
        self.scripts.as_ref()
    }

    /// Install or remove the soft-loop tracer. Existing reports are dropped.
    pub fn set_loop_tracing(&mut self, enabled: bool) {
        match (enabled, self.tracer.is_some()) {
            (true, false) => self.tracer = Some(BindingLoopTracer::new()),
            (false, true) => self.tracer = None,
            _ => {}
        }
    }

    /// The soft-loop tracer, when tracing is on.
    pub fn loop_tracer(&self) -> Option<&BindingLoopTracer> {
        self.tracer.as_ref()
    }

    /// When set, resetting a value leaves it synchronized.
    pub fn set_legacy_value_reset(&mut self, legacy: bool) {
        self.legacy_value_reset = legacy;
    }

    /// Log every binding problem instead of once per distinct message.
    pub fn set_verbose_binding_logging(&mut self, verbose: bool) {
        self.verbose_binding_logging = verbose;
    }

    // ==================== Objects ====================

    /// Create a detached object with no parent and no elements.
    pub fn create_object(
        &mut self,
        kind: ObjectKind,
        type_identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> ObjectId {
        self.objects
            .insert(HeliosObject::new(kind, type_identifier, name))
    }

    /// Create a stand-in for a component type this build does not know. The
    /// live type identifier is the placeholder descriptor; the original one
    /// stays on the [`UnsupportedComponent`].
    pub fn create_placeholder(
        &mut self,
        kind: ObjectKind,
        name: impl Into<String>,
        component: UnsupportedComponent,
    ) -> ObjectId {
        let descriptor = match kind {
            ObjectKind::Interface => builtins::UNSUPPORTED_INTERFACE,
            ObjectKind::Monitor | ObjectKind::Visual => builtins::UNSUPPORTED_VISUAL,
        };
        let mut object = HeliosObject::new(kind, descriptor, name);
        object.placeholder = Some(component);
        self.objects.insert(object)
    }

    /// Look up a live object.
    pub fn object(&self, id: ObjectId) -> Option<&HeliosObject> {
        self.objects.get(id)
    }

    /// All live objects in arena order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &HeliosObject)> {
        self.objects.iter()
    }

    /// Whether `id` still refers to a live object.
    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains(id)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn live_object(&self, id: ObjectId) -> Result<&HeliosObject> {
        self.objects
            .get(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("object {}", id)))
    }

    fn live_object_mut(&mut self, id: ObjectId) -> Result<&mut HeliosObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("object {}", id)))
    }

    /// Attach lifecycle hooks to an object, replacing any previous ones.
    pub fn set_object_hooks(&mut self, id: ObjectId, hooks: Rc<dyn LifecycleHooks>) -> Result<()> {
        self.live_object_mut(id)?.set_hooks(hooks);
        Ok(())
    }

    pub(crate) fn object_hooks(&self, id: ObjectId) -> Option<Rc<dyn LifecycleHooks>> {
        self.objects.get(id).and_then(|o| o.hooks())
    }

    /// Mark an object as owning generated children.
    pub fn set_composite(&mut self, id: ObjectId, composite: bool) -> Result<()> {
        self.live_object_mut(id)?.composite = composite;
        Ok(())
    }

    /// Rename an object. Its visual path changes with it.
    pub fn rename_object(&mut self, id: ObjectId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let object = self.live_object_mut(id)?;
        tracing::debug!("Renaming '{}' to '{}'", object.name, name);
        object.name = name;
        Ok(())
    }

    /// Direct child of `parent` named `name`.
    pub fn find_child(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        self.objects
            .get(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.objects.get(*child).is_some_and(|c| c.name == name))
    }

    /// The object and all its descendants, parents first.
    pub fn subtree(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(object) = self.objects.get(id) {
                out.push(id);
                stack.extend(object.children.iter().rev().copied());
            }
        }
        out
    }

    /// Dot-joined names from the root of the object's tree down to the object.
    pub fn visual_path(&self, id: ObjectId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cursor) = current {
            let object = self.objects.get(cursor)?;
            names.push(object.name.as_str());
            current = object.parent;
        }
        names.reverse();
        Some(names.join("."))
    }

    /// Whether `ancestor` is above `id` in the tree.
    pub fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = self.objects.get(id).and_then(|o| o.parent);
        while let Some(cursor) = current {
            if cursor == ancestor {
                return true;
            }
            current = self.objects.get(cursor).and_then(|o| o.parent);
        }
        false
    }

    /// Parent `child` under `parent`. When the parent is attached, the child's
    /// subtree attaches and its bindings reconnect.
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<()> {
        let parent_attached = self.live_object(parent)?.attached;
        let existing_parent = self.live_object(child)?.parent;
        if let Some(existing) = existing_parent {
            return Err(HeliosError::Binding(format!(
                "{} already has parent {}",
                child, existing
            )));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(HeliosError::Binding(format!(
                "Adding {} under {} would create a cycle",
                child, parent
            )));
        }

        self.live_object_mut(child)?.parent = Some(parent);
        self.live_object_mut(parent)?.children.push(child);
        if parent_attached {
            self.attach_subtree(child);
        }
        Ok(())
    }

    /// Unparent `child`, detaching its subtree and disconnecting its bindings.
    pub fn remove_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<()> {
        let position = self
            .live_object(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| {
                HeliosError::Binding(format!("{} is not a child of {}", child, parent))
            })?;
        self.live_object_mut(parent)?.children.remove(position);
        let attached = {
            let object = self.live_object_mut(child)?;
            object.parent = None;
            object.attached
        };
        if attached {
            self.detach_subtree(child);
        }
        Ok(())
    }

    /// Attach a monitor or interface (and everything below it) to the profile.
    pub fn attach_root(&mut self, id: ObjectId) -> Result<()> {
        self.live_object(id)?;
        self.attach_subtree(id);
        Ok(())
    }

    /// Detach a monitor or interface and everything below it.
    pub fn detach_root(&mut self, id: ObjectId) -> Result<()> {
        self.live_object(id)?;
        self.detach_subtree(id);
        Ok(())
    }

    fn attach_subtree(&mut self, root: ObjectId) {
        let ids = self.subtree(root);
        for id in &ids {
            if let Some(object) = self.objects.get_mut(*id) {
                object.attached = true;
            }
        }
        for id in ids {
            self.reconnect_bindings(id);
        }
    }

    fn detach_subtree(&mut self, root: ObjectId) {
        let ids = self.subtree(root);
        for id in &ids {
            self.disconnect_bindings(*id);
        }
        for id in ids {
            if let Some(object) = self.objects.get_mut(id) {
                object.attached = false;
            }
        }
    }

    /// Remove an object, its descendants, their elements and every binding
    /// touching them.
    pub fn delete_object(&mut self, id: ObjectId) -> Result<()> {
        if let Some(parent) = self.live_object(id)?.parent {
            self.remove_child(parent, id)?;
        }
        let ids = self.subtree(id);
        for binding in self.bindings_touching(&ids) {
            self.remove_binding(binding);
        }
        for object_id in ids {
            if let Some(object) = self.objects.remove(object_id) {
                for element in object
                    .triggers
                    .iter()
                    .chain(object.actions.iter())
                    .chain(object.values.iter())
                {
                    self.elements.remove(*element);
                }
                tracing::debug!("Deleted object '{}'", object.name);
            }
        }
        Ok(())
    }

    // ==================== Elements ====================

    /// Add a trigger, action or value described by `spec` to `owner`.
    pub fn add_element(&mut self, owner: ObjectId, spec: ElementSpec) -> Result<ElementId> {
        self.live_object(owner)?;
        let element = BindingElement::from_spec(owner, spec);
        let role = element.role();
        let id = self.elements.insert(element);
        let object = self.live_object_mut(owner)?;
        match role {
            ElementRole::Trigger => object.triggers.push(id),
            ElementRole::Action => object.actions.push(id),
            ElementRole::Value => object.values.push(id),
        }
        Ok(id)
    }

    /// Look up a live element.
    pub fn element(&self, id: ElementId) -> Option<&BindingElement> {
        self.elements.get(id)
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut BindingElement> {
        self.elements.get_mut(id)
    }

    /// Change an element's device and recompute its IDs.
    pub fn set_element_device(&mut self, id: ElementId, device: impl Into<String>) -> Result<()> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("element {}", id)))?
            .set_device(device);
        self.revalidate_element_bindings(id);
        Ok(())
    }

    /// Change an element's name and recompute its IDs.
    pub fn set_element_name(&mut self, id: ElementId, name: impl Into<String>) -> Result<()> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("element {}", id)))?
            .set_name(name);
        self.revalidate_element_bindings(id);
        Ok(())
    }

    fn revalidate_element_bindings(&mut self, element: ElementId) {
        let touching: Vec<BindingId> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.trigger == Some(element) || b.action == Some(element))
            .map(|(id, _)| id)
            .collect();
        for binding in touching {
            self.validate_binding(binding);
        }
    }

    /// Look up a trigger on `object` by persisted ID.
    pub fn find_trigger(&self, object: ObjectId, trigger_id: &str) -> Option<ElementId> {
        let object = self.objects.get(object)?;
        object
            .triggers
            .iter()
            .chain(object.values.iter())
            .copied()
            .find(|e| {
                self.elements
                    .get(*e)
                    .and_then(|el| el.trigger_id())
                    .is_some_and(|id| id == trigger_id)
            })
    }

    /// Look up an action on `object` by persisted ID.
    pub fn find_action(&self, object: ObjectId, action_id: &str) -> Option<ElementId> {
        let object = self.objects.get(object)?;
        object
            .actions
            .iter()
            .chain(object.values.iter())
            .copied()
            .find(|e| {
                self.elements
                    .get(*e)
                    .and_then(|el| el.action_id())
                    .is_some_and(|id| id == action_id)
            })
    }

    /// Look up a value element on `object` by name.
    pub fn find_value(&self, object: ObjectId, name: &str) -> Option<ElementId> {
        self.objects.get(object)?.values.iter().copied().find(|e| {
            self.elements.get(*e).is_some_and(|el| el.name() == name)
        })
    }

    /// Like [`find_trigger`](Self::find_trigger), but placeholders grow a
    /// no-op trigger for any ID asked of them.
    pub fn resolve_trigger(&mut self, object: ObjectId, trigger_id: &str) -> Option<ElementId> {
        if let Some(found) = self.find_trigger(object, trigger_id) {
            return Some(found);
        }
        if !self.objects.get(object)?.is_placeholder() {
            return None;
        }
        self.add_element(object, ElementSpec::trigger("", "", "").explicit_id(trigger_id))
            .ok()
    }

    /// Like [`find_action`](Self::find_action), but placeholders grow a
    /// no-op action for any ID asked of them.
    pub fn resolve_action(&mut self, object: ObjectId, action_id: &str) -> Option<ElementId> {
        if let Some(found) = self.find_action(object, action_id) {
            return Some(found);
        }
        if !self.objects.get(object)?.is_placeholder() {
            return None;
        }
        self.add_element(object, ElementSpec::action("", "", "").explicit_id(action_id))
            .ok()
    }

    // ==================== Bindings ====================

    /// Insert a binding and wire it into both endpoint objects.
    pub fn add_binding(&mut self, binding: HeliosBinding) -> Result<BindingId> {
        let (trigger, action) = match (binding.trigger, binding.action) {
            (Some(t), Some(a)) => (t, a),
            _ => {
                return Err(HeliosError::Binding(
                    "Binding needs both a trigger and an action".to_string(),
                ))
            }
        };
        let source = self
            .elements
            .get(trigger)
            .map(|e| e.owner())
            .ok_or_else(|| HeliosError::DeadReference(format!("trigger {}", trigger)))?;
        let target = self
            .elements
            .get(action)
            .map(|e| e.owner())
            .ok_or_else(|| HeliosError::DeadReference(format!("action {}", action)))?;

        let id = self.bindings.insert(binding);
        self.validate_binding(id);
        self.push_output(source, id);
        if let Some(object) = self.objects.get_mut(target) {
            object.input_bindings.push(id);
        }
        for endpoint in [source, target] {
            if let Some(object) = self.objects.get_mut(endpoint) {
                if !object.edges.contains(&id) {
                    object.edges.push(id);
                }
            }
        }
        tracing::trace!("Added binding {}", self.binding_description(id));
        Ok(id)
    }

    /// Remove a binding from both endpoints and drop it.
    pub fn remove_binding(&mut self, id: BindingId) -> Option<HeliosBinding> {
        let binding = self.bindings.get(id)?;
        let source = binding
            .trigger
            .and_then(|t| self.elements.get(t))
            .map(|e| e.owner());
        let target = binding
            .action
            .and_then(|a| self.elements.get(a))
            .map(|e| e.owner());
        if let Some(source) = source {
            self.pull_output(source, id);
        }
        if let Some(target) = target.and_then(|t| self.objects.get_mut(t)) {
            target.input_bindings.retain(|b| *b != id);
        }
        for endpoint in [source, target].into_iter().flatten() {
            if let Some(object) = self.objects.get_mut(endpoint) {
                object.edges.retain(|b| *b != id);
            }
        }
        self.bindings.remove(id)
    }

    /// Look up a live binding.
    pub fn binding(&self, id: BindingId) -> Option<&HeliosBinding> {
        self.bindings.get(id)
    }

    /// All live bindings in arena order.
    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &HeliosBinding)> {
        self.bindings.iter()
    }

    /// Number of live bindings.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Edit a binding's configuration and revalidate it.
    pub fn update_binding<F>(&mut self, id: BindingId, edit: F) -> Result<BindingValidity>
    where
        F: FnOnce(&mut HeliosBinding),
    {
        let binding = self
            .bindings
            .get_mut(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("binding {}", id)))?;
        edit(binding);
        self.validate_binding(id)
            .ok_or_else(|| HeliosError::DeadReference(format!("binding {}", id)))
    }

    /// Recompute validity against the live endpoints.
    pub fn validate_binding(&mut self, id: BindingId) -> Option<BindingValidity> {
        let binding = self.bindings.get_mut(id)?;
        let trigger = binding.trigger.and_then(|t| self.elements.get(t));
        let action = binding.action.and_then(|a| self.elements.get(a));
        Some(binding.validate(trigger, action))
    }

    /// Object owning the binding's trigger.
    pub fn binding_source(&self, id: BindingId) -> Option<ObjectId> {
        let trigger = self.bindings.get(id)?.trigger?;
        self.elements.get(trigger).map(|e| e.owner())
    }

    /// Object owning the binding's action.
    pub fn binding_target(&self, id: BindingId) -> Option<ObjectId> {
        let action = self.bindings.get(id)?.action?;
        self.elements.get(action).map(|e| e.owner())
    }

    /// Human-readable description for logs and UI.
    pub fn binding_description(&self, id: BindingId) -> String {
        let Some(binding) = self.bindings.get(id) else {
            return format!("<removed binding {}>", id);
        };
        let endpoint = |element: Option<ElementId>, trigger: bool| -> String {
            let Some(element) = element.and_then(|e| self.elements.get(e)) else {
                return "<missing>".to_string();
            };
            let owner = self
                .visual_path(element.owner())
                .unwrap_or_else(|| "<removed>".to_string());
            let id = if trigger {
                element.trigger_id()
            } else {
                element.action_id()
            };
            format!("{} {}", owner, id.unwrap_or(""))
        };
        let mut description = format!(
            "{} -> {}",
            endpoint(binding.trigger, true),
            endpoint(binding.action, false)
        );
        if let Some(condition) = &binding.condition {
            description.push_str(&format!(" if {}", condition));
        }
        description
    }

    fn push_output(&mut self, source: ObjectId, binding: BindingId) {
        let Some(object) = self.objects.get_mut(source) else {
            return;
        };
        if object.output_bindings.contains(&binding) {
            return;
        }
        object.output_bindings.push(binding);
        if let Some(trigger) = self.bindings.get(binding).and_then(|b| b.trigger) {
            if let Some(element) = self.elements.get_mut(trigger) {
                if !element.subscribers.contains(&binding) {
                    element.subscribers.push(binding);
                }
            }
        }
    }

    fn pull_output(&mut self, source: ObjectId, binding: BindingId) {
        if let Some(object) = self.objects.get_mut(source) {
            object.output_bindings.retain(|b| *b != binding);
        }
        if let Some(trigger) = self.bindings.get(binding).and_then(|b| b.trigger) {
            if let Some(element) = self.elements.get_mut(trigger) {
                element.subscribers.retain(|b| *b != binding);
            }
        }
    }

    /// Drop this object's bindings from the counterpart objects' lists.
    /// The object's own `input_bindings`/`output_bindings` are left alone.
    pub fn disconnect_bindings(&mut self, id: ObjectId) {
        let Some(object) = self.objects.get(id) else {
            return;
        };
        let outputs = object.output_bindings.clone();
        let inputs = object.input_bindings.clone();

        for binding in outputs {
            if let Some(target) = self.binding_target(binding).filter(|t| *t != id) {
                if let Some(target) = self.objects.get_mut(target) {
                    target.input_bindings.retain(|b| *b != binding);
                }
            }
        }
        for binding in inputs {
            if let Some(source) = self.binding_source(binding).filter(|s| *s != id) {
                self.pull_output(source, binding);
            }
        }
    }

    /// Restore both endpoint lists for every binding touching this object
    /// whose endpoints are both attached. A counterpart that detached earlier
    /// may have dropped the binding from this object's own lists, so the
    /// object's edge index is the record here.
    pub fn reconnect_bindings(&mut self, id: ObjectId) {
        let Some(object) = self.objects.get(id) else {
            return;
        };
        for binding in object.edges.clone() {
            let (Some(source), Some(target)) =
                (self.binding_source(binding), self.binding_target(binding))
            else {
                continue;
            };
            let attached =
                |object: ObjectId| self.objects.get(object).is_some_and(|o| o.attached);
            if !attached(source) || !attached(target) {
                continue;
            }
            self.push_output(source, binding);
            if let Some(target) = self.objects.get_mut(target) {
                if !target.input_bindings.contains(&binding) {
                    target.input_bindings.push(binding);
                }
            }
        }
    }

    /// Bindings with an endpoint owned by one of `objects`.
    fn bindings_touching(&self, objects: &[ObjectId]) -> Vec<BindingId> {
        let mut touching: Vec<BindingId> = objects
            .iter()
            .filter_map(|id| self.objects.get(*id))
            .flat_map(|object| object.edges.iter().copied())
            .collect();
        touching.sort_unstable();
        touching.dedup();
        touching
    }

    /// Wire a composite's trigger into one of its children's actions.
    pub fn add_default_input_binding(
        &mut self,
        parent: ObjectId,
        parent_trigger: &str,
        child: ObjectId,
        child_action: &str,
    ) -> Result<BindingId> {
        let trigger = self.find_trigger(parent, parent_trigger).ok_or_else(|| {
            HeliosError::InvalidReference(format!("trigger '{}' on {}", parent_trigger, parent))
        })?;
        let action = self.find_action(child, child_action).ok_or_else(|| {
            HeliosError::InvalidReference(format!("action '{}' on {}", child_action, child))
        })?;
        let mut binding = HeliosBinding::new(trigger, action).with_bypass(true);
        binding.is_default = true;
        self.add_binding(binding)
    }

    /// Wire one of a composite's children's triggers into the composite's action.
    pub fn add_default_output_binding(
        &mut self,
        child: ObjectId,
        child_trigger: &str,
        parent: ObjectId,
        parent_action: &str,
    ) -> Result<BindingId> {
        let trigger = self.find_trigger(child, child_trigger).ok_or_else(|| {
            HeliosError::InvalidReference(format!("trigger '{}' on {}", child_trigger, child))
        })?;
        let action = self.find_action(parent, parent_action).ok_or_else(|| {
            HeliosError::InvalidReference(format!("action '{}' on {}", parent_action, parent))
        })?;
        let mut binding = HeliosBinding::new(trigger, action);
        binding.is_default = true;
        self.add_binding(binding)
    }

    // ==================== Values ====================

    /// Current value of a value element.
    pub fn value(&self, element: ElementId) -> Option<&BindingValue> {
        self.elements.get(element).and_then(|e| e.value())
    }

    /// Value elements owned by any live object.
    pub fn value_elements(&self) -> Vec<ElementId> {
        self.objects
            .iter()
            .flat_map(|(_, o)| o.values.iter().copied())
            .collect()
    }
}

impl Default for HeliosGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeliosGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeliosGraph")
            .field("objects", &self.objects.len())
            .field("elements", &self.elements.len())
            .field("bindings", &self.bindings.len())
            .field("tracing", &self.tracer.is_some())
            .field("legacy_value_reset", &self.legacy_value_reset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::units;
    use crate::registry::ComponentUnsupportedSeverity;

    fn two_nodes(graph: &mut HeliosGraph) -> (ObjectId, ObjectId, ElementId, ElementId) {
        let monitor = graph.create_object(ObjectKind::Monitor, "Helios.Base.Monitor", "Monitor 1");
        graph.attach_root(monitor).unwrap();
        let source = graph.create_object(ObjectKind::Visual, "Test", "Source");
        let target = graph.create_object(ObjectKind::Visual, "Test", "Target");
        graph.add_child(monitor, source).unwrap();
        graph.add_child(monitor, target).unwrap();
        let trigger = graph
            .add_element(source, ElementSpec::trigger("", "position", "changed"))
            .unwrap();
        let action = graph
            .add_element(target, ElementSpec::action("", "position", "set").unit(&units::NUMERIC))
            .unwrap();
        (source, target, trigger, action)
    }

    #[test]
    fn test_add_binding_wires_both_sides() {
        let mut graph = HeliosGraph::new();
        let (source, target, trigger, action) = two_nodes(&mut graph);
        let id = graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
        assert_eq!(graph.object(source).unwrap().output_bindings(), &[id]);
        assert_eq!(graph.object(target).unwrap().input_bindings(), &[id]);
        assert_eq!(graph.element(trigger).unwrap().subscribers(), &[id]);
        assert!(graph.binding(id).unwrap().is_valid());
    }

    #[test]
    fn test_remove_binding_unwires() {
        let mut graph = HeliosGraph::new();
        let (source, target, trigger, action) = two_nodes(&mut graph);
        let id = graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
        assert!(graph.remove_binding(id).is_some());
        assert!(graph.object(source).unwrap().output_bindings().is_empty());
        assert!(graph.object(target).unwrap().input_bindings().is_empty());
        assert!(graph.element(trigger).unwrap().subscribers().is_empty());
        assert!(graph.remove_binding(id).is_none());
    }

    #[test]
    fn test_edge_index_survives_disconnect() {
        let mut graph = HeliosGraph::new();
        let (source, target, trigger, action) = two_nodes(&mut graph);
        let monitor = graph.object(source).unwrap().parent().unwrap();
        let id = graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
        let other = graph.create_object(ObjectKind::Visual, "Test", "Other");
        graph.add_child(monitor, other).unwrap();
        assert_eq!(graph.object(source).unwrap().edges, vec![id]);
        assert_eq!(graph.object(target).unwrap().edges, vec![id]);
        assert!(graph.object(other).unwrap().edges.is_empty());

        // Detach the target first so the source drops the binding from its
        // own output list, then bring them back in the same order.
        graph.remove_child(monitor, target).unwrap();
        graph.remove_child(monitor, source).unwrap();
        assert!(graph.object(source).unwrap().output_bindings().is_empty());
        assert_eq!(graph.object(source).unwrap().edges, vec![id]);

        graph.add_child(monitor, target).unwrap();
        assert!(graph.element(trigger).unwrap().subscribers().is_empty());
        graph.add_child(monitor, source).unwrap();
        assert_eq!(graph.object(source).unwrap().output_bindings(), &[id]);
        assert_eq!(graph.object(target).unwrap().input_bindings(), &[id]);
        assert_eq!(graph.element(trigger).unwrap().subscribers(), &[id]);

        graph.remove_binding(id);
        assert!(graph.object(source).unwrap().edges.is_empty());
        assert!(graph.object(target).unwrap().edges.is_empty());
    }

    #[test]
    fn test_visual_path() {
        let mut graph = HeliosGraph::new();
        let (source, _, _, _) = two_nodes(&mut graph);
        assert_eq!(graph.visual_path(source).as_deref(), Some("Monitor 1.Source"));
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut graph = HeliosGraph::new();
        let a = graph.create_object(ObjectKind::Visual, "Test", "A");
        let b = graph.create_object(ObjectKind::Visual, "Test", "B");
        graph.add_child(a, b).unwrap();
        assert!(graph.add_child(b, a).is_err());
        assert!(graph.add_child(a, a).is_err());
    }

    #[test]
    fn test_delete_object_removes_edges_and_elements() {
        let mut graph = HeliosGraph::new();
        let (source, target, trigger, action) = two_nodes(&mut graph);
        let id = graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
        graph.delete_object(target).unwrap();
        assert!(graph.binding(id).is_none());
        assert!(graph.element(action).is_none());
        assert!(graph.object(source).unwrap().output_bindings().is_empty());
        assert!(graph.element(trigger).unwrap().subscribers().is_empty());
    }

    #[test]
    fn test_placeholder_grows_elements() {
        let mut graph = HeliosGraph::new();
        let placeholder = graph.create_placeholder(
            ObjectKind::Interface,
            "Old Interface",
            UnsupportedComponent {
                original_type_identifier: "Vendor.Thing".to_string(),
                raw_xml: "<Interface/>".to_string(),
                severity: ComponentUnsupportedSeverity::Ignore,
            },
        );
        let trigger = graph.resolve_trigger(placeholder, "Gear.Handle.changed").unwrap();
        assert_eq!(graph.resolve_trigger(placeholder, "Gear.Handle.changed"), Some(trigger));
        assert!(graph.resolve_action(placeholder, "Anything.set").is_some());
        assert_eq!(
            graph.object(placeholder).unwrap().placeholder().map(|p| p.severity),
            Some(ComponentUnsupportedSeverity::Ignore)
        );

        let plain = graph.create_object(ObjectKind::Visual, "Test", "Plain");
        assert!(graph.resolve_trigger(plain, "missing").is_none());
    }

    #[test]
    fn test_rename_element_revalidates() {
        let mut graph = HeliosGraph::new();
        let (_, target, trigger, action) = two_nodes(&mut graph);
        graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
        graph.set_element_name(action, "angle").unwrap();
        assert_eq!(graph.find_action(target, "angle.set"), Some(action));
        assert!(graph.find_action(target, "position.set").is_none());
    }
}
