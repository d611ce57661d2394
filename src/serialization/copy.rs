//! Copy and paste of controls with their bindings.
//!
//! A copy records the visual path of the controls' container as `CopyRoot`.
//! On paste, references below that path resolve against the pasted
//! controls, so bindings between copied controls are rewired to the copies
//! while bindings to anything else keep their original endpoint.

use crate::config::EngineSettings;
use crate::error::{HeliosError, Result};
use crate::graph::{BindingId, HeliosGraph, ObjectId, ObjectKind};
use crate::profile::HeliosProfile;
use crate::registry::ComponentRegistry;
use crate::serialization::document::{CopyDocument, COPY_ROOT};
use crate::serialization::loader::{
    build_binding, describe_node, resolve_endpoints, ComponentBuilder, LoadReport,
};
use crate::serialization::reference::{CopyScope, ReferenceResolver};
use crate::serialization::writer::{is_persistable, write_bindings, write_control, XmlWriter};
use std::collections::HashSet;

/// Serialize sibling controls and every binding touching them.
pub fn copy_controls(graph: &HeliosGraph, controls: &[ObjectId]) -> Result<String> {
    let first = *controls
        .first()
        .ok_or_else(|| HeliosError::Binding("Nothing to copy".to_string()))?;
    let parent = graph
        .object(first)
        .ok_or_else(|| HeliosError::DeadReference(format!("object {}", first)))?
        .parent()
        .ok_or_else(|| HeliosError::Binding(format!("{} has no container", first)))?;
    for control in controls {
        if graph.object(*control).and_then(|o| o.parent()) != Some(parent) {
            return Err(HeliosError::Binding(
                "Copied controls must share one container".to_string(),
            ));
        }
    }
    let copy_root = graph
        .visual_path(parent)
        .ok_or_else(|| HeliosError::DeadReference(format!("object {}", parent)))?;

    let scope: HashSet<ObjectId> = controls
        .iter()
        .flat_map(|control| graph.subtree(*control))
        .collect();
    let bindings: Vec<BindingId> = graph
        .bindings()
        .filter(|(id, _)| is_persistable(graph, *id, Some(&scope)))
        .map(|(id, _)| id)
        .collect();

    let mut w = XmlWriter::new();
    w.open(COPY_ROOT, &[("CopyRoot", copy_root.as_str())]);
    w.open("Controls", &[]);
    for control in controls {
        write_control(&mut w, graph, *control, "Control");
    }
    w.close("Controls");
    write_bindings(&mut w, graph, &bindings);
    w.close(COPY_ROOT);
    tracing::debug!(
        "Copied {} controls and {} bindings from {}",
        controls.len(),
        bindings.len(),
        copy_root
    );
    Ok(w.finish())
}

#[derive(Debug, Default)]
pub struct PasteOutcome {
    /// Top-level pasted controls, in copy order.
    pub controls: Vec<ObjectId>,
    pub bindings: Vec<BindingId>,
    pub report: LoadReport,
}

/// Paste a copy under `parent`. Names that collide with existing children
/// get a numeric suffix.
pub fn paste_controls(
    profile: &mut HeliosProfile,
    registry: &ComponentRegistry,
    settings: &EngineSettings,
    text: &str,
    parent: ObjectId,
) -> Result<PasteOutcome> {
    let document = CopyDocument::parse(text)?;
    if profile.graph().object(parent).is_none() {
        return Err(HeliosError::DeadReference(format!("object {}", parent)));
    }

    let mut outcome = PasteOutcome::default();
    let mut scope = CopyScope {
        copy_root: document.copy_root.clone(),
        ..Default::default()
    };
    let mut aliases = Vec::new();
    let mut pasted = Vec::new();

    for node in &document.controls {
        let name = unique_child_name(profile.graph(), parent, &node.name);
        let built = ComponentBuilder {
            graph: profile.graph_mut(),
            registry,
            default_severity: settings.default_unsupported_severity,
            report: &mut outcome.report,
            aliases: &mut aliases,
            progress: &mut pasted,
        }
        .control(node, ObjectKind::Visual, &name);
        for message in pasted.drain(..) {
            tracing::trace!("Paste: {}", message);
        }
        let Some(id) = built else {
            continue;
        };
        if let Err(e) = profile.graph_mut().add_child(parent, id) {
            profile.graph_mut().delete_object(id)?;
            return Err(e);
        }
        scope.local_objects.insert(node.name.clone(), id);
        outcome.controls.push(id);
    }

    for node in &document.bindings {
        let endpoints = {
            let resolver = ReferenceResolver::new(
                profile.graph(),
                profile.monitors(),
                profile.interfaces(),
            )
            .with_copy_scope(&scope);
            resolve_endpoints(&resolver, node)
        };
        let added = endpoints
            .and_then(|(source, target)| build_binding(profile.graph_mut(), node, source, target))
            .and_then(|binding| {
                profile
                    .graph_mut()
                    .add_binding(binding)
                    .map_err(|e| e.to_string())
            });
        match added {
            Ok(id) => outcome.bindings.push(id),
            Err(reason) => outcome.report.error(format!(
                "Binding {} could not be pasted: {}",
                describe_node(node),
                reason
            )),
        }
    }

    if !outcome.controls.is_empty() {
        profile.mark_dirty();
    }
    Ok(outcome)
}

fn unique_child_name(graph: &HeliosGraph, parent: ObjectId, name: &str) -> String {
    if graph.find_child(parent, name).is_none() {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{} {}", name, n))
        .find(|candidate| graph.find_child(parent, candidate).is_none())
        .unwrap_or_else(|| name.to_string())
}
