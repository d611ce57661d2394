//! Owned model of a profile or copy snippet, parsed with roxmltree.
//!
//! Parsing is purely structural. Resolving type identifiers and references
//! happens in the loader, which can report per-node problems without
//! aborting the whole load.

use crate::binding::BindingValueSource;
use crate::error::{HeliosError, Result};

pub const PROFILE_ROOT: &str = "HeliosProfile";
pub const COPY_ROOT: &str = "HeliosCopy";
pub const SUPPORTED_VERSION: &str = "3";

/// A monitor or control and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlNode {
    pub type_identifier: Option<String>,
    pub name: String,
    pub unsupported_severity: Option<String>,
    pub children: Vec<ControlNode>,
    /// The element's original text.
    pub raw_xml: String,
}

impl ControlNode {
    /// Number of controls nested below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceNode {
    pub type_identifier: Option<String>,
    pub name: String,
    pub unsupported_severity: Option<String>,
    pub raw_xml: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingNode {
    pub trigger_source: Option<String>,
    pub trigger_name: Option<String>,
    pub action_target: Option<String>,
    pub action_name: Option<String>,
    pub bypass_cascading_triggers: bool,
    pub value_source: BindingValueSource,
    pub value: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileDocument {
    pub version: String,
    pub monitors: Vec<ControlNode>,
    pub interfaces: Vec<InterfaceNode>,
    pub bindings: Vec<BindingNode>,
}

impl ProfileDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(text)?;
        let root = document.root_element();
        if root.tag_name().name() != PROFILE_ROOT {
            return Err(HeliosError::Serialization(format!(
                "expected root <{}>, found <{}>",
                PROFILE_ROOT,
                root.tag_name().name()
            )));
        }

        let version = child_element(root, "Version")
            .map(text_content)
            .unwrap_or_default();
        if version.trim() != SUPPORTED_VERSION {
            let shown = if version.is_empty() {
                "<missing>".to_string()
            } else {
                version
            };
            return Err(HeliosError::UnsupportedVersion(shown));
        }

        let monitors = child_element(root, "Monitors")
            .map(|section| {
                elements_named(section, "Monitor")
                    .map(|node| parse_control(text, node))
                    .collect()
            })
            .unwrap_or_default();
        let interfaces = child_element(root, "Interfaces")
            .map(|section| {
                elements_named(section, "Interface")
                    .map(|node| parse_interface(text, node))
                    .collect()
            })
            .unwrap_or_default();
        let bindings = child_element(root, "Bindings")
            .map(parse_bindings)
            .unwrap_or_default();

        Ok(Self {
            version: SUPPORTED_VERSION.to_string(),
            monitors,
            interfaces,
            bindings,
        })
    }
}

/// Controls and bindings captured by a copy, with the path their references
/// are relative to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CopyDocument {
    pub copy_root: String,
    pub controls: Vec<ControlNode>,
    pub bindings: Vec<BindingNode>,
}

impl CopyDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(text)?;
        let root = document.root_element();
        if root.tag_name().name() != COPY_ROOT {
            return Err(HeliosError::Serialization(format!(
                "expected root <{}>, found <{}>",
                COPY_ROOT,
                root.tag_name().name()
            )));
        }
        let copy_root = root.attribute("CopyRoot").unwrap_or_default().to_string();
        let controls = child_element(root, "Controls")
            .map(|section| {
                elements_named(section, "Control")
                    .map(|node| parse_control(text, node))
                    .collect()
            })
            .unwrap_or_default();
        let bindings = child_element(root, "Bindings")
            .map(parse_bindings)
            .unwrap_or_default();
        Ok(Self {
            copy_root,
            controls,
            bindings,
        })
    }
}

fn parse_control(text: &str, node: roxmltree::Node<'_, '_>) -> ControlNode {
    let children = child_element(node, "Children")
        .map(|section| {
            elements_named(section, "Control")
                .map(|child| parse_control(text, child))
                .collect()
        })
        .unwrap_or_default();
    ControlNode {
        type_identifier: attribute(node, "TypeIdentifier"),
        name: attribute(node, "Name").unwrap_or_default(),
        unsupported_severity: attribute(node, "UnsupportedSeverity"),
        children,
        raw_xml: text[node.range()].to_string(),
    }
}

fn parse_interface(text: &str, node: roxmltree::Node<'_, '_>) -> InterfaceNode {
    InterfaceNode {
        type_identifier: attribute(node, "TypeIdentifier"),
        name: attribute(node, "Name").unwrap_or_default(),
        unsupported_severity: attribute(node, "UnsupportedSeverity"),
        raw_xml: text[node.range()].to_string(),
    }
}

fn parse_bindings(section: roxmltree::Node<'_, '_>) -> Vec<BindingNode> {
    elements_named(section, "Binding").map(parse_binding).collect()
}

fn parse_binding(node: roxmltree::Node<'_, '_>) -> BindingNode {
    let trigger = child_element(node, "Trigger");
    let action = child_element(node, "Action");

    let mut value_source = BindingValueSource::TriggerValue;
    let mut value = String::new();
    for child in node.children().filter(|c| c.is_element()) {
        if let Ok(source) = child.tag_name().name().parse::<BindingValueSource>() {
            value_source = source;
            value = text_content(child);
        }
    }

    BindingNode {
        trigger_source: trigger.and_then(|t| attribute(t, "Source")),
        trigger_name: trigger.and_then(|t| attribute(t, "Name")),
        action_target: action.and_then(|a| attribute(a, "Target")),
        action_name: action.and_then(|a| attribute(a, "Name")),
        bypass_cascading_triggers: attribute(node, "BypassCascadingTriggers")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
        value_source,
        value,
        condition: child_element(node, "Condition")
            .map(text_content)
            .filter(|c| !c.trim().is_empty()),
    }
}

fn child_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn elements_named<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn attribute(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|entry| entry.is_text())
        .filter_map(|entry| entry.text())
        .collect()
}
