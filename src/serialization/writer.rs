//! Profile XML output.

use crate::binding::{BindingValueSource, HeliosBinding};
use crate::graph::{BindingId, HeliosGraph, ObjectId};
use crate::serialization::document::{PROFILE_ROOT, SUPPORTED_VERSION};
use crate::serialization::reference::reference_name;
use std::collections::HashSet;

pub fn escape_xml_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
}

pub fn escape_xml_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Indenting element writer.
pub(crate) struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"),
            depth: 0,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attrs {
            self.out
                .push_str(&format!(" {}=\"{}\"", name, escape_xml_attr(value)));
        }
    }

    pub(crate) fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    pub(crate) fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str(&format!("</{}>\n", tag));
    }

    pub(crate) fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.out.push_str("/>\n");
    }

    pub(crate) fn text(&mut self, tag: &str, text: &str) {
        self.indent();
        self.out
            .push_str(&format!("<{}>{}</{}>\n", tag, escape_xml_text(text), tag));
    }

    /// Pre-serialized element text, written verbatim.
    pub(crate) fn raw(&mut self, xml: &str) {
        self.indent();
        self.out.push_str(xml.trim());
        self.out.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Serialize monitors, interfaces and every persistable binding.
pub fn write_profile(
    graph: &HeliosGraph,
    monitors: &[ObjectId],
    interfaces: &[ObjectId],
) -> String {
    let mut w = XmlWriter::new();
    w.open(PROFILE_ROOT, &[]);
    w.text("Version", SUPPORTED_VERSION);

    w.open("Monitors", &[]);
    for monitor in monitors {
        write_control(&mut w, graph, *monitor, "Monitor");
    }
    w.close("Monitors");

    w.open("Interfaces", &[]);
    for interface in interfaces {
        write_interface(&mut w, graph, *interface);
    }
    w.close("Interfaces");

    let bindings: Vec<BindingId> = graph
        .bindings()
        .filter(|(id, _)| is_persistable(graph, *id, None))
        .map(|(id, _)| id)
        .collect();
    write_bindings(&mut w, graph, &bindings);

    w.close(PROFILE_ROOT);
    w.finish()
}

/// Default bindings are rebuilt by their composite; bindings with a detached
/// or dead endpoint are not part of the profile. With `scope`, at least one
/// endpoint must be inside it.
pub(crate) fn is_persistable(
    graph: &HeliosGraph,
    id: BindingId,
    scope: Option<&HashSet<ObjectId>>,
) -> bool {
    let Some(binding) = graph.binding(id) else {
        return false;
    };
    if binding.is_default() {
        return false;
    }
    let (Some(source), Some(target)) = (graph.binding_source(id), graph.binding_target(id)) else {
        return false;
    };
    let attached = |object: ObjectId| graph.object(object).is_some_and(|o| o.is_attached());
    if !attached(source) || !attached(target) {
        return false;
    }
    match scope {
        Some(scope) => scope.contains(&source) || scope.contains(&target),
        None => true,
    }
}

pub(crate) fn write_control(w: &mut XmlWriter, graph: &HeliosGraph, id: ObjectId, tag: &str) {
    let Some(object) = graph.object(id) else {
        return;
    };
    if let Some(placeholder) = object.placeholder() {
        w.raw(&placeholder.raw_xml);
        return;
    }
    let attrs = [
        ("TypeIdentifier", object.type_identifier()),
        ("Name", object.name()),
    ];
    if object.children().is_empty() {
        w.empty(tag, &attrs);
        return;
    }
    w.open(tag, &attrs);
    w.open("Children", &[]);
    for child in object.children() {
        write_control(w, graph, *child, "Control");
    }
    w.close("Children");
    w.close(tag);
}

fn write_interface(w: &mut XmlWriter, graph: &HeliosGraph, id: ObjectId) {
    let Some(object) = graph.object(id) else {
        return;
    };
    match object.placeholder() {
        Some(placeholder) => w.raw(&placeholder.raw_xml),
        None => w.empty(
            "Interface",
            &[
                ("TypeIdentifier", object.type_identifier()),
                ("Name", object.name()),
            ],
        ),
    }
}

pub(crate) fn write_bindings(w: &mut XmlWriter, graph: &HeliosGraph, bindings: &[BindingId]) {
    w.open("Bindings", &[]);
    for id in bindings {
        if let Some(binding) = graph.binding(*id) {
            write_binding(w, graph, *id, binding);
        }
    }
    w.close("Bindings");
}

fn write_binding(w: &mut XmlWriter, graph: &HeliosGraph, id: BindingId, binding: &HeliosBinding) {
    let endpoint = |object: Option<ObjectId>| {
        object
            .and_then(|o| reference_name(graph, o))
            .map(|r| r.to_string())
            .unwrap_or_default()
    };
    let source = endpoint(graph.binding_source(id));
    let target = endpoint(graph.binding_target(id));
    let trigger_name = binding
        .trigger()
        .and_then(|t| graph.element(t))
        .and_then(|e| e.trigger_id())
        .unwrap_or_default();
    let action_name = binding
        .action()
        .and_then(|a| graph.element(a))
        .and_then(|e| e.action_id())
        .unwrap_or_default();

    let bypass = if binding.bypass_cascading_triggers {
        "true"
    } else {
        "false"
    };
    w.open("Binding", &[("BypassCascadingTriggers", bypass)]);
    w.empty("Trigger", &[("Source", source.as_str()), ("Name", trigger_name)]);
    w.empty("Action", &[("Target", target.as_str()), ("Name", action_name)]);
    match binding.value_source {
        BindingValueSource::TriggerValue => w.empty(BindingValueSource::TriggerValue.tag(), &[]),
        source => w.text(source.tag(), binding.value.string_value()),
    }
    if let Some(condition) = &binding.condition {
        w.text("Condition", condition);
    }
    w.close("Binding");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::element::ElementSpec;
    use crate::graph::ObjectKind;

    #[test]
    fn test_escape() {
        assert_eq!(escape_xml_attr(r#"a<"b">&'c'"#), "a&lt;&quot;b&quot;&gt;&amp;&apos;c&apos;");
        assert_eq!(escape_xml_text("x < 1 && y"), "x &lt; 1 &amp;&amp; y");
    }

    #[test]
    fn test_write_skips_detached_and_default() {
        let mut graph = HeliosGraph::new();
        let monitor = graph.create_object(ObjectKind::Monitor, "Helios.Base.Monitor", "Monitor 1");
        graph.attach_root(monitor).unwrap();
        let lamp = graph.create_object(ObjectKind::Visual, "Test.Lamp", "Lamp");
        graph.add_child(monitor, lamp).unwrap();
        let trigger = graph
            .add_element(lamp, ElementSpec::trigger("", "lamp", "lit"))
            .unwrap();
        let action = graph
            .add_element(lamp, ElementSpec::action("", "lamp", "set"))
            .unwrap();
        let orphan = graph.create_object(ObjectKind::Interface, "Test.Sink", "Sink");
        let sink = graph
            .add_element(orphan, ElementSpec::action("", "sink", "set"))
            .unwrap();

        graph
            .add_binding(HeliosBinding::new(trigger, action).with_condition("a < b"))
            .unwrap();
        graph.add_binding(HeliosBinding::new(trigger, sink)).unwrap();

        let xml = write_profile(&graph, &[monitor], &[]);
        assert_eq!(xml.matches("<Binding ").count(), 1);
        assert!(xml.contains("<Condition>a &lt; b</Condition>"));
        assert!(xml.contains(r#"<Control TypeIdentifier="Test.Lamp" Name="Lamp"/>"#));
        assert!(xml.contains(r#"Source="Visual;Monitor 1.Lamp;Test.Lamp;Lamp" Name="lamp.lit""#));
    }
}
