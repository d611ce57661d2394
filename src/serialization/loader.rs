//! Incremental profile loading.
//!
//! [`ProfileLoader`] is an iterator: every `next()` performs one load step
//! (a monitor, an interface, alias registration or one binding) and yields a
//! progress message. Callers that don't care about progress use
//! [`ProfileLoader::finish`].
//!
//! Per-component and per-binding problems never abort the load. They become
//! [`LoadDiagnostic`]s, each logged exactly once.

use crate::binding::{BindingValue, BindingValueSource, HeliosBinding};
use crate::config::EngineSettings;
use crate::error::{HeliosError, Result, ResultExt};
use crate::graph::{HeliosGraph, ObjectId, ObjectKind, UnsupportedComponent};
use crate::profile::HeliosProfile;
use crate::registry::{builtins, ComponentRegistry, ComponentUnsupportedSeverity};
use crate::serialization::document::{BindingNode, ControlNode, ProfileDocument};
use crate::serialization::reference::ReferenceResolver;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDiagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
}

/// Everything that went wrong while loading or pasting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    diagnostics: Vec<LoadDiagnostic>,
}

impl LoadReport {
    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &LoadDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LoadDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub(crate) fn error(&mut self, message: String) {
        tracing::error!("{}", message);
        self.diagnostics.push(LoadDiagnostic {
            severity: DiagnosticSeverity::Error,
            message,
        });
    }

    pub(crate) fn warning(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.diagnostics.push(LoadDiagnostic {
            severity: DiagnosticSeverity::Warning,
            message,
        });
    }
}

/// Creates components from XML nodes, substituting placeholders for
/// unsupported types according to their severity.
pub(crate) struct ComponentBuilder<'a> {
    pub graph: &'a mut HeliosGraph,
    pub registry: &'a ComponentRegistry,
    pub default_severity: ComponentUnsupportedSeverity,
    pub report: &'a mut LoadReport,
    /// `(persisted type, live type)` pairs for placeholder interfaces.
    pub aliases: &'a mut Vec<(String, String)>,
    /// One message per control node handled, including skipped ones.
    pub progress: &'a mut Vec<String>,
}

impl ComponentBuilder<'_> {
    /// Build a control and its XML children.
    pub(crate) fn control(
        &mut self,
        node: &ControlNode,
        kind: ObjectKind,
        name: &str,
    ) -> Option<ObjectId> {
        let type_identifier = match (kind, node.type_identifier.as_deref()) {
            (ObjectKind::Monitor, None) => Some(builtins::MONITOR),
            (_, type_identifier) => type_identifier,
        };
        let built = self.component(
            type_identifier,
            kind,
            name,
            &node.raw_xml,
            node.unsupported_severity.as_deref(),
        );
        let Some(id) = built else {
            if kind == ObjectKind::Visual {
                self.progress.push(format!("Skipped control '{}'", name));
            }
            self.skip_children(node, name);
            return None;
        };
        if kind == ObjectKind::Visual {
            self.progress.push(format!("Loaded control '{}'", name));
        }
        if self.graph.object(id).is_some_and(|o| o.is_placeholder()) {
            // The placeholder's raw XML already carries its children.
            self.skip_children(node, name);
        } else {
            self.children(id, &node.children);
        }
        Some(id)
    }

    /// Load XML children under `parent`. Composite parents already own
    /// their generated children; XML children with the same name merge into
    /// those instead of being created again.
    pub(crate) fn children(&mut self, parent: ObjectId, children: &[ControlNode]) {
        for node in children {
            let composite = self.graph.object(parent).is_some_and(|o| o.is_composite());
            if composite {
                if let Some(existing) = self.graph.find_child(parent, &node.name) {
                    self.progress
                        .push(format!("Merged control '{}'", node.name));
                    self.children(existing, &node.children);
                    continue;
                }
            }
            let Some(child) = self.control(node, ObjectKind::Visual, &node.name) else {
                continue;
            };
            if let Err(e) = self.graph.add_child(parent, child) {
                self.report
                    .error(format!("Could not place control '{}': {}", node.name, e));
                self.discard(child);
            }
        }
    }

    fn skip_children(&mut self, node: &ControlNode, parent: &str) {
        for child in &node.children {
            self.progress
                .push(format!("Skipped control '{}' inside '{}'", child.name, parent));
            self.skip_children(child, &child.name);
        }
    }

    pub(crate) fn component(
        &mut self,
        type_identifier: Option<&str>,
        kind: ObjectKind,
        name: &str,
        raw_xml: &str,
        severity: Option<&str>,
    ) -> Option<ObjectId> {
        let Some(type_identifier) = type_identifier.filter(|t| !t.trim().is_empty()) else {
            self.report
                .error(format!("Component '{}' has no TypeIdentifier", name));
            return None;
        };

        match self.registry.create(self.graph, type_identifier, name) {
            Ok(id) => {
                let actual = self.graph.object(id).map(|o| o.kind());
                if actual != Some(kind) {
                    self.report.error(format!(
                        "Component '{}' of type {} is a {:?}, expected a {:?}",
                        name,
                        type_identifier,
                        actual.unwrap_or(kind),
                        kind
                    ));
                    self.discard(id);
                    return None;
                }
                Some(id)
            }
            Err(HeliosError::UnknownComponent(_)) => {
                let severity = self.severity(name, severity);
                self.unsupported(type_identifier, kind, name, raw_xml, severity)
            }
            Err(e) => {
                self.report
                    .error(format!("Failed to create component '{}': {}", name, e));
                None
            }
        }
    }

    fn unsupported(
        &mut self,
        type_identifier: &str,
        kind: ObjectKind,
        name: &str,
        raw_xml: &str,
        severity: ComponentUnsupportedSeverity,
    ) -> Option<ObjectId> {
        match severity {
            ComponentUnsupportedSeverity::Error => {
                self.report.error(format!(
                    "Unsupported component '{}' of type {} was removed",
                    name, type_identifier
                ));
                None
            }
            ComponentUnsupportedSeverity::Warning => {
                self.report.warning(format!(
                    "Unsupported component '{}' of type {} was removed",
                    name, type_identifier
                ));
                None
            }
            ComponentUnsupportedSeverity::Ignore => {
                tracing::debug!(
                    "Keeping placeholder for unsupported component '{}' of type {}",
                    name,
                    type_identifier
                );
                let id = self.graph.create_placeholder(
                    kind,
                    name,
                    UnsupportedComponent {
                        original_type_identifier: type_identifier.to_string(),
                        raw_xml: raw_xml.to_string(),
                        severity,
                    },
                );
                if kind == ObjectKind::Interface {
                    self.aliases.push((
                        type_identifier.to_string(),
                        builtins::UNSUPPORTED_INTERFACE.to_string(),
                    ));
                }
                Some(id)
            }
        }
    }

    fn severity(&mut self, name: &str, attribute: Option<&str>) -> ComponentUnsupportedSeverity {
        match attribute.map(str::parse::<ComponentUnsupportedSeverity>) {
            None => self.default_severity,
            Some(Ok(severity)) => severity,
            Some(Err(e)) => {
                self.report.warning(format!(
                    "Component '{}': {}; using {}",
                    name, e, self.default_severity
                ));
                self.default_severity
            }
        }
    }

    fn discard(&mut self, id: ObjectId) {
        if let Err(e) = self.graph.delete_object(id) {
            tracing::warn!("Failed to discard {}: {}", id, e);
        }
    }
}

/// Human-readable summary of a persisted binding for diagnostics.
pub(crate) fn describe_node(node: &BindingNode) -> String {
    format!(
        "{} {} -> {} {}",
        node.trigger_source.as_deref().unwrap_or("<no source>"),
        node.trigger_name.as_deref().unwrap_or("<no trigger>"),
        node.action_target.as_deref().unwrap_or("<no target>"),
        node.action_name.as_deref().unwrap_or("<no action>")
    )
}

/// Resolve both endpoint objects of a persisted binding.
pub(crate) fn resolve_endpoints(
    resolver: &ReferenceResolver<'_>,
    node: &BindingNode,
) -> std::result::Result<(ObjectId, ObjectId), String> {
    let source = node
        .trigger_source
        .as_deref()
        .ok_or("binding has no trigger source")?;
    let target = node
        .action_target
        .as_deref()
        .ok_or("binding has no action target")?;
    let source = resolver
        .resolve_str(source)
        .map_err(|e| format!("trigger source: {}", e))?;
    let target = resolver
        .resolve_str(target)
        .map_err(|e| format!("action target: {}", e))?;
    Ok((source, target))
}

/// Find the trigger and action on resolved endpoints and build the binding.
/// A control inside a composite may expose its element through the
/// composite parent, so a miss on the control falls back to that parent.
pub(crate) fn build_binding(
    graph: &mut HeliosGraph,
    node: &BindingNode,
    source: ObjectId,
    target: ObjectId,
) -> std::result::Result<HeliosBinding, String> {
    let trigger_name = node.trigger_name.as_deref().unwrap_or_default();
    let action_name = node.action_name.as_deref().unwrap_or_default();

    let trigger = match graph.resolve_trigger(source, trigger_name) {
        Some(trigger) => trigger,
        None => composite_parent(graph, source)
            .and_then(|parent| graph.find_trigger(parent, trigger_name))
            .ok_or_else(|| format!("trigger '{}' not found", trigger_name))?,
    };
    let action = match graph.resolve_action(target, action_name) {
        Some(action) => action,
        None => composite_parent(graph, target)
            .and_then(|parent| graph.find_action(parent, action_name))
            .ok_or_else(|| format!("action '{}' not found", action_name))?,
    };

    let binding = HeliosBinding::new(trigger, action).with_bypass(node.bypass_cascading_triggers);
    let binding = match node.value_source {
        BindingValueSource::TriggerValue => binding.with_trigger_value(),
        BindingValueSource::StaticValue => {
            binding.with_static_value(BindingValue::from_string(node.value.clone()))
        }
        BindingValueSource::Script => binding.with_script(node.value.clone()),
    };
    Ok(match &node.condition {
        Some(condition) => binding.with_condition(condition.clone()),
        None => binding,
    })
}

fn composite_parent(graph: &HeliosGraph, id: ObjectId) -> Option<ObjectId> {
    let parent = graph.object(id)?.parent()?;
    graph
        .object(parent)
        .filter(|p| p.is_composite())
        .map(|_| parent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStep {
    Monitor(usize),
    Interface(usize),
    DefaultInterfaces,
    RegisterAliases,
    Binding(usize),
}

pub struct ProfileLoader<'r> {
    registry: &'r ComponentRegistry,
    default_severity: ComponentUnsupportedSeverity,
    document: ProfileDocument,
    profile: HeliosProfile,
    steps: VecDeque<LoadStep>,
    /// Control messages from the last monitor step, not yet yielded.
    pending: VecDeque<String>,
    yielded: usize,
    total: usize,
    report: LoadReport,
    pending_aliases: Vec<(String, String)>,
    aliases: HashMap<String, String>,
    added_defaults: bool,
}

impl<'r> ProfileLoader<'r> {
    /// Parse profile text. Malformed XML and unsupported versions fail here;
    /// everything else is reported while stepping.
    pub fn from_xml(
        text: &str,
        settings: &EngineSettings,
        registry: &'r ComponentRegistry,
    ) -> Result<Self> {
        let document = ProfileDocument::parse(text)?;
        let mut steps = VecDeque::new();
        steps.extend((0..document.monitors.len()).map(LoadStep::Monitor));
        steps.extend((0..document.interfaces.len()).map(LoadStep::Interface));
        if settings.auto_add_default_interfaces {
            steps.push_back(LoadStep::DefaultInterfaces);
        }
        steps.push_back(LoadStep::RegisterAliases);
        steps.extend((0..document.bindings.len()).map(LoadStep::Binding));
        let controls: usize = document
            .monitors
            .iter()
            .map(ControlNode::descendant_count)
            .sum();

        Ok(Self {
            registry,
            default_severity: settings.default_unsupported_severity,
            total: steps.len() + controls,
            steps,
            pending: VecDeque::new(),
            yielded: 0,
            document,
            profile: HeliosProfile::empty(settings),
            report: LoadReport::default(),
            pending_aliases: Vec::new(),
            aliases: HashMap::new(),
            added_defaults: false,
        })
    }

    pub fn open(
        path: impl AsRef<Path>,
        settings: &EngineSettings,
        registry: &'r ComponentRegistry,
    ) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(HeliosError::from)
            .context(format!("Reading profile {}", path.display()))?;
        Self::from_xml(&text, settings, registry)
            .with_context(|| format!("Loading profile {}", path.display()))
    }

    /// `(yielded, total)` message counts. Every monitor, control,
    /// interface and binding in the document yields one message.
    pub fn progress(&self) -> (usize, usize) {
        (self.yielded, self.total)
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Run the remaining steps and hand over the profile.
    pub fn finish(mut self) -> (HeliosProfile, LoadReport) {
        for message in self.by_ref() {
            tracing::trace!("{}", message);
        }
        if !self.added_defaults {
            self.profile.mark_clean();
        }
        (self.profile, self.report)
    }

    fn builder<'b>(&'b mut self, progress: &'b mut Vec<String>) -> ComponentBuilder<'b> {
        ComponentBuilder {
            graph: self.profile.graph_mut(),
            registry: self.registry,
            default_severity: self.default_severity,
            report: &mut self.report,
            aliases: &mut self.pending_aliases,
            progress,
        }
    }

    fn load_monitor(&mut self, index: usize) -> String {
        let node = self.document.monitors[index].clone();
        let mut controls = Vec::new();
        let built = self
            .builder(&mut controls)
            .control(&node, ObjectKind::Monitor, &node.name);
        self.pending.extend(controls);
        if let Some(id) = built {
            if let Err(e) = self.profile.add_monitor_object(id) {
                self.report
                    .error(format!("Could not add monitor '{}': {}", node.name, e));
            }
        }
        format!("Loaded monitor '{}'", node.name)
    }

    fn load_interface(&mut self, index: usize) -> String {
        let node = self.document.interfaces[index].clone();
        let mut unused = Vec::new();
        let built = self.builder(&mut unused).component(
            node.type_identifier.as_deref(),
            ObjectKind::Interface,
            &node.name,
            &node.raw_xml,
            node.unsupported_severity.as_deref(),
        );
        if let Some(id) = built {
            if let Err(e) = self.profile.add_interface_object(id) {
                self.report
                    .error(format!("Could not add interface '{}': {}", node.name, e));
            }
        }
        format!("Loaded interface '{}'", node.name)
    }

    fn add_default_interfaces(&mut self) -> String {
        let before = self.profile.interfaces().len();
        if let Err(e) = self.profile.add_default_interfaces(self.registry) {
            self.report
                .error(format!("Could not add default interfaces: {}", e));
        }
        self.added_defaults = self.profile.interfaces().len() > before;
        "Checked default interfaces".to_string()
    }

    fn register_aliases(&mut self) -> String {
        for (persisted, live) in self.pending_aliases.drain(..) {
            tracing::debug!("Interface alias {} -> {}", persisted, live);
            self.aliases.insert(persisted, live);
        }
        format!("Registered {} interface aliases", self.aliases.len())
    }

    fn load_binding(&mut self, index: usize) -> String {
        let node = &self.document.bindings[index];
        let endpoints = {
            let resolver = ReferenceResolver::new(
                self.profile.graph(),
                self.profile.monitors(),
                self.profile.interfaces(),
            )
            .with_aliases(&self.aliases);
            resolve_endpoints(&resolver, node)
        };
        let outcome = endpoints
            .and_then(|(source, target)| {
                build_binding(self.profile.graph_mut(), node, source, target)
            })
            .and_then(|binding| {
                self.profile
                    .graph_mut()
                    .add_binding(binding)
                    .map_err(|e| e.to_string())
            });
        if let Err(reason) = outcome {
            self.report.error(format!(
                "Binding {} could not be restored: {}",
                describe_node(node),
                reason
            ));
        }
        format!("Loaded binding {} of {}", index + 1, self.document.bindings.len())
    }
}

impl Iterator for ProfileLoader<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let message = match self.pending.pop_front() {
            Some(message) => message,
            None => match self.steps.pop_front()? {
                LoadStep::Monitor(index) => self.load_monitor(index),
                LoadStep::Interface(index) => self.load_interface(index),
                LoadStep::DefaultInterfaces => self.add_default_interfaces(),
                LoadStep::RegisterAliases => self.register_aliases(),
                LoadStep::Binding(index) => self.load_binding(index),
            },
        };
        self.yielded += 1;
        Some(message)
    }
}
