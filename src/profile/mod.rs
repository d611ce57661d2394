//! A loaded profile: monitors, interfaces and the graph that holds them.
//!
//! [`HeliosProfile`] owns the [`HeliosGraph`] and decides which roots are
//! attached. Monitors and interfaces added here are attached, so their
//! bindings are live; removing one detaches it first.

use crate::config::{EngineSettings, PROFILE_FILE_EXTENSION};
use crate::error::{HeliosError, Result, ResultExt};
use crate::graph::{HeliosGraph, LifecycleHooks, ObjectId, ObjectKind};
use crate::registry::{builtins, ComponentRegistry};
use crate::serialization::{self, LoadReport};
use std::path::{Path, PathBuf};

pub const UNTITLED: &str = "Untitled";

#[derive(Debug)]
pub struct HeliosProfile {
    graph: HeliosGraph,
    monitors: Vec<ObjectId>,
    interfaces: Vec<ObjectId>,
    name: String,
    path: Option<PathBuf>,
    dirty: bool,
    started: bool,
}

impl HeliosProfile {
    /// An empty profile with no monitors or interfaces.
    pub fn empty(settings: &EngineSettings) -> Self {
        Self::with_graph(HeliosGraph::with_settings(settings))
    }

    /// Wrap an existing graph in an untitled profile with no roots.
    pub fn with_graph(graph: HeliosGraph) -> Self {
        Self {
            graph,
            monitors: Vec::new(),
            interfaces: Vec::new(),
            name: UNTITLED.to_string(),
            path: None,
            dirty: false,
            started: false,
        }
    }

    /// A new profile, with the default interfaces when configured.
    pub fn new(settings: &EngineSettings, registry: &ComponentRegistry) -> Result<Self> {
        let mut profile = Self::empty(settings);
        if settings.auto_add_default_interfaces {
            profile.add_default_interfaces(registry)?;
        }
        profile.dirty = false;
        Ok(profile)
    }

    /// Add a profile interface unless one is already present.
    pub fn add_default_interfaces(&mut self, registry: &ComponentRegistry) -> Result<()> {
        let present = self.interfaces.iter().any(|id| {
            self.graph
                .object(*id)
                .is_some_and(|o| o.type_identifier() == builtins::PROFILE_INTERFACE)
        });
        if !present {
            self.add_interface(registry, builtins::PROFILE_INTERFACE, "Profile")?;
        }
        Ok(())
    }

    /// The profile's object graph.
    pub fn graph(&self) -> &HeliosGraph {
        &self.graph
    }

    /// Mutable access to the profile's object graph.
    pub fn graph_mut(&mut self) -> &mut HeliosGraph {
        &mut self.graph
    }

    /// Monitors in load order.
    pub fn monitors(&self) -> &[ObjectId] {
        &self.monitors
    }

    /// Interfaces in load order.
    pub fn interfaces(&self) -> &[ObjectId] {
        &self.interfaces
    }

    /// Display name, the file stem once loaded or saved.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the profile and mark it dirty.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
    }

    /// File the profile was last loaded from or saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether there are changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the profile is running.
    pub fn is_started(&self) -> bool {
        self.started
    }

    // ==================== Roots ====================

    /// Create a monitor and attach it as a root.
    pub fn add_monitor(
        &mut self,
        registry: &ComponentRegistry,
        name: impl Into<String>,
    ) -> Result<ObjectId> {
        let id = registry.create(&mut self.graph, builtins::MONITOR, name)?;
        self.add_monitor_object(id)?;
        Ok(id)
    }

    /// Attach an already-built monitor.
    pub fn add_monitor_object(&mut self, id: ObjectId) -> Result<()> {
        self.graph.attach_root(id)?;
        if !self.monitors.contains(&id) {
            self.monitors.push(id);
        }
        self.dirty = true;
        Ok(())
    }

    /// Create an interface of `type_identifier` and attach it as a root.
    pub fn add_interface(
        &mut self,
        registry: &ComponentRegistry,
        type_identifier: &str,
        name: impl Into<String>,
    ) -> Result<ObjectId> {
        let id = registry.create(&mut self.graph, type_identifier, name)?;
        self.add_interface_object(id)?;
        Ok(id)
    }

    /// Attach an already-built interface.
    pub fn add_interface_object(&mut self, id: ObjectId) -> Result<()> {
        match self.graph.object(id).map(|o| o.kind()) {
            Some(ObjectKind::Interface) => {}
            Some(kind) => {
                return Err(HeliosError::Binding(format!(
                    "{} is a {:?}, not an interface",
                    id, kind
                )))
            }
            None => return Err(HeliosError::DeadReference(format!("object {}", id))),
        }
        self.graph.attach_root(id)?;
        if !self.interfaces.contains(&id) {
            self.interfaces.push(id);
        }
        self.dirty = true;
        Ok(())
    }

    /// Detach and delete a monitor or interface.
    pub fn remove_root(&mut self, id: ObjectId) -> Result<()> {
        let before = self.monitors.len() + self.interfaces.len();
        self.monitors.retain(|m| *m != id);
        self.interfaces.retain(|i| *i != id);
        if self.monitors.len() + self.interfaces.len() == before {
            return Err(HeliosError::InvalidReference(format!(
                "{} is not a root of this profile",
                id
            )));
        }
        self.graph.detach_root(id)?;
        self.graph.delete_object(id)?;
        self.dirty = true;
        Ok(())
    }

    /// Create a control and place it under `parent`.
    pub fn add_control(
        &mut self,
        registry: &ComponentRegistry,
        parent: ObjectId,
        type_identifier: &str,
        name: impl Into<String>,
    ) -> Result<ObjectId> {
        let id = registry.create(&mut self.graph, type_identifier, name)?;
        if let Err(e) = self.graph.add_child(parent, id) {
            self.graph.delete_object(id)?;
            return Err(e);
        }
        self.dirty = true;
        Ok(id)
    }

    /// Monitor named `name`.
    pub fn find_monitor(&self, name: &str) -> Option<ObjectId> {
        self.monitors
            .iter()
            .copied()
            .find(|id| self.graph.object(*id).is_some_and(|o| o.name() == name))
    }

    /// Interface named `name`.
    pub fn find_interface(&self, name: &str) -> Option<ObjectId> {
        self.interfaces
            .iter()
            .copied()
            .find(|id| self.graph.object(*id).is_some_and(|o| o.name() == name))
    }

    // ==================== Lifecycle ====================

    /// Interfaces first, then every object of every monitor.
    fn lifecycle_order(&self) -> Vec<ObjectId> {
        let mut order = self.interfaces.clone();
        for monitor in &self.monitors {
            order.extend(self.graph.subtree(*monitor));
        }
        order
    }

    fn notify<F>(&mut self, callback: F)
    where
        F: Fn(&dyn LifecycleHooks, &mut HeliosGraph, ObjectId),
    {
        for id in self.lifecycle_order() {
            if let Some(hooks) = self.graph.object_hooks(id) {
                callback(hooks.as_ref(), &mut self.graph, id);
            }
        }
    }

    /// Start the profile: interfaces first, then monitor subtrees.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        tracing::info!("Starting profile '{}'", self.name);
        self.started = true;
        self.notify(|hooks, graph, id| hooks.on_profile_started(graph, id));
    }

    /// Stop a running profile.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        tracing::info!("Stopping profile '{}'", self.name);
        self.notify(|hooks, graph, id| hooks.on_profile_stopped(graph, id));
        self.started = false;
    }

    /// Forward a tick to every object while the profile is running.
    pub fn tick(&mut self) {
        if self.started {
            self.notify(|hooks, graph, id| hooks.on_profile_tick(graph, id));
        }
    }

    /// Mark every value unsynchronized, then notify components.
    pub fn reset(&mut self) {
        tracing::info!("Resetting profile '{}'", self.name);
        self.graph.reset_all_values();
        self.notify(|hooks, graph, id| hooks.on_profile_reset(graph, id));
    }

    /// Stop and detach every root. Bindings stay recorded on each object.
    pub fn unload(&mut self) -> Result<()> {
        self.stop();
        let roots: Vec<ObjectId> = self
            .interfaces
            .iter()
            .chain(self.monitors.iter())
            .copied()
            .collect();
        for root in roots {
            self.graph.detach_root(root)?;
        }
        tracing::debug!("Unloaded profile '{}'", self.name);
        Ok(())
    }

    // ==================== Persistence ====================

    /// Load a profile file, running the loader to completion.
    pub fn load(
        path: impl AsRef<Path>,
        settings: &EngineSettings,
        registry: &ComponentRegistry,
    ) -> Result<(Self, LoadReport)> {
        let path = path.as_ref();
        let loader = serialization::ProfileLoader::open(path, settings, registry)?;
        let (mut profile, report) = loader.finish();
        profile.path = Some(path.to_path_buf());
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            profile.name = stem.to_string();
        }
        tracing::info!(
            "Loaded profile '{}' with {} errors and {} warnings",
            profile.name,
            report.error_count(),
            report.warning_count()
        );
        Ok((profile, report))
    }

    /// Serialize the profile to XML text.
    pub fn to_xml(&self) -> String {
        serialization::write_profile(&self.graph, &self.monitors, &self.interfaces)
    }

    /// Write the profile to `path`, adding the profile extension if missing.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let mut path = path.as_ref().to_path_buf();
        if path.extension().is_none() {
            path.set_extension(PROFILE_FILE_EXTENSION);
        }
        std::fs::write(&path, self.to_xml())
            .map_err(HeliosError::from)
            .context(format!("Writing profile {}", path.display()))?;
        tracing::info!("Saved profile to {}", path.display());
        self.path = Some(path.clone());
        self.dirty = false;
        Ok(path)
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
