//! Component registry: type identifiers to factories.
//!
//! Profiles store each control and interface by `TypeIdentifier`. Loading one
//! creates the object and runs the registered factory, which adds the
//! component's triggers, actions and values (and for composites, its
//! children and default bindings).

pub mod builtins;

use crate::error::{HeliosError, Result};
use crate::graph::{HeliosGraph, ObjectId, ObjectKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// How to treat a persisted component whose type this build doesn't know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentUnsupportedSeverity {
    /// Drop the component and report an error.
    #[default]
    Error,
    /// Drop the component and report a warning.
    Warning,
    /// Keep an opaque placeholder that round-trips its XML.
    Ignore,
}

impl fmt::Display for ComponentUnsupportedSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ComponentUnsupportedSeverity::Error => "Error",
            ComponentUnsupportedSeverity::Warning => "Warning",
            ComponentUnsupportedSeverity::Ignore => "Ignore",
        };
        f.write_str(text)
    }
}

impl FromStr for ComponentUnsupportedSeverity {
    type Err = HeliosError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Error" => Ok(ComponentUnsupportedSeverity::Error),
            "Warning" => Ok(ComponentUnsupportedSeverity::Warning),
            "Ignore" => Ok(ComponentUnsupportedSeverity::Ignore),
            other => Err(HeliosError::Serialization(format!(
                "Unknown unsupported-component severity '{}'",
                other
            ))),
        }
    }
}

/// Populates a freshly created object with its component surface.
pub type ComponentFactory = Rc<dyn Fn(&mut HeliosGraph, ObjectId) -> Result<()>>;

#[derive(Clone)]
pub struct ComponentType {
    pub type_identifier: String,
    pub kind: ObjectKind,
    pub display_name: String,
    factory: ComponentFactory,
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("type_identifier", &self.type_identifier)
            .field("kind", &self.kind)
            .field("display_name", &self.display_name)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    types: BTreeMap<String, ComponentType>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in component.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    pub fn register<F>(
        &mut self,
        kind: ObjectKind,
        type_identifier: impl Into<String>,
        display_name: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&mut HeliosGraph, ObjectId) -> Result<()> + 'static,
    {
        let type_identifier = type_identifier.into();
        let previous = self.types.insert(
            type_identifier.clone(),
            ComponentType {
                type_identifier: type_identifier.clone(),
                kind,
                display_name: display_name.into(),
                factory: Rc::new(factory),
            },
        );
        if previous.is_some() {
            tracing::warn!("Component type '{}' registered twice", type_identifier);
        }
    }

    pub fn register_visual<F>(
        &mut self,
        type_identifier: impl Into<String>,
        display_name: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&mut HeliosGraph, ObjectId) -> Result<()> + 'static,
    {
        self.register(ObjectKind::Visual, type_identifier, display_name, factory);
    }

    pub fn register_interface<F>(
        &mut self,
        type_identifier: impl Into<String>,
        display_name: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&mut HeliosGraph, ObjectId) -> Result<()> + 'static,
    {
        self.register(ObjectKind::Interface, type_identifier, display_name, factory);
    }

    pub fn get(&self, type_identifier: &str) -> Option<&ComponentType> {
        self.types.get(type_identifier)
    }

    pub fn contains(&self, type_identifier: &str) -> bool {
        self.types.contains_key(type_identifier)
    }

    pub fn types(&self) -> impl Iterator<Item = &ComponentType> {
        self.types.values()
    }

    /// Create an object of a registered type and run its factory. The new
    /// object is neither parented nor attached.
    pub fn create(
        &self,
        graph: &mut HeliosGraph,
        type_identifier: &str,
        name: impl Into<String>,
    ) -> Result<ObjectId> {
        let component = self
            .types
            .get(type_identifier)
            .ok_or_else(|| HeliosError::UnknownComponent(type_identifier.to_string()))?;
        let id = graph.create_object(component.kind, type_identifier, name);
        if let Err(e) = (component.factory)(graph, id) {
            graph.delete_object(id)?;
            return Err(e.with_context(format!("Creating '{}'", type_identifier)));
        }
        Ok(id)
    }
}
