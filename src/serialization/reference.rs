//! Persisted object references and their resolution.
//!
//! A reference is `Visual;<path>;<type>;<name>` or
//! `Interface;;<type>;<name>`, optionally wrapped in braces. Visual paths are
//! dot-joined names from the monitor down to the control.

use crate::error::{HeliosError, Result};
use crate::graph::{HeliosGraph, ObjectId, ObjectKind};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    Visual,
    Interface,
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceType::Visual => f.write_str("Visual"),
            ReferenceType::Interface => f.write_str("Interface"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    pub ref_type: ReferenceType,
    /// Visual path; empty for interfaces.
    pub path: String,
    pub type_identifier: String,
    pub name: String,
}

impl ObjectReference {
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(trimmed);
        let parts: Vec<&str> = inner.splitn(4, ';').collect();
        if parts.len() != 4 {
            return Err(HeliosError::InvalidReference(format!(
                "'{}' does not have four parts",
                text
            )));
        }
        let ref_type = match parts[0] {
            "Visual" => ReferenceType::Visual,
            "Interface" => ReferenceType::Interface,
            other => {
                return Err(HeliosError::InvalidReference(format!(
                    "unknown reference type '{}' in '{}'",
                    other, text
                )))
            }
        };
        Ok(Self {
            ref_type,
            path: parts[1].to_string(),
            type_identifier: parts[2].to_string(),
            name: parts[3].to_string(),
        })
    }
}

impl FromStr for ObjectReference {
    type Err = HeliosError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.ref_type, self.path, self.type_identifier, self.name
        )
    }
}

/// The persisted reference for a live object. Placeholders report the type
/// they were loaded with so saving does not rewrite it.
pub fn reference_name(graph: &HeliosGraph, id: ObjectId) -> Option<ObjectReference> {
    let object = graph.object(id)?;
    let type_identifier = object
        .placeholder()
        .map(|p| p.original_type_identifier.clone())
        .unwrap_or_else(|| object.type_identifier().to_string());
    let (ref_type, path) = match object.kind() {
        ObjectKind::Interface => (ReferenceType::Interface, String::new()),
        ObjectKind::Monitor | ObjectKind::Visual => {
            (ReferenceType::Visual, graph.visual_path(id)?)
        }
    };
    Some(ObjectReference {
        ref_type,
        path,
        type_identifier,
        name: object.name().to_string(),
    })
}

/// Paste context: visual paths under `copy_root` resolve against the pasted
/// objects instead of the live tree.
#[derive(Debug, Clone, Default)]
pub struct CopyScope {
    pub copy_root: String,
    /// Pasted top-level objects keyed by the name they were copied under.
    pub local_objects: HashMap<String, ObjectId>,
}

pub struct ReferenceResolver<'a> {
    graph: &'a HeliosGraph,
    monitors: &'a [ObjectId],
    interfaces: &'a [ObjectId],
    aliases: Option<&'a HashMap<String, String>>,
    copy_scope: Option<&'a CopyScope>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(
        graph: &'a HeliosGraph,
        monitors: &'a [ObjectId],
        interfaces: &'a [ObjectId],
    ) -> Self {
        Self {
            graph,
            monitors,
            interfaces,
            aliases: None,
            copy_scope: None,
        }
    }

    /// Map persisted interface type identifiers onto live ones.
    pub fn with_aliases(mut self, aliases: &'a HashMap<String, String>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_copy_scope(mut self, scope: &'a CopyScope) -> Self {
        self.copy_scope = Some(scope);
        self
    }

    pub fn resolve_str(&self, text: &str) -> Result<ObjectId> {
        self.resolve(&ObjectReference::parse(text)?)
    }

    pub fn resolve(&self, reference: &ObjectReference) -> Result<ObjectId> {
        let found = match reference.ref_type {
            ReferenceType::Visual => self.resolve_visual(&reference.path),
            ReferenceType::Interface => self.resolve_interface(reference),
        };
        found.ok_or_else(|| HeliosError::InvalidReference(format!("no object for {}", reference)))
    }

    fn resolve_visual(&self, path: &str) -> Option<ObjectId> {
        if let Some(scope) = self.copy_scope {
            let local = path
                .strip_prefix(scope.copy_root.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .filter(|rest| !rest.is_empty());
            // Only paths into a pasted object are local; siblings that were
            // not copied still resolve against the live tree.
            if let Some(rest) = local {
                let mut segments = rest.split('.');
                let first = segments.next()?;
                if let Some(start) = scope.local_objects.get(first) {
                    return self.descend(*start, segments);
                }
            }
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let monitor = self
            .monitors
            .iter()
            .copied()
            .find(|m| self.graph.object(*m).is_some_and(|o| o.name() == first))?;
        self.descend(monitor, segments)
    }

    fn descend<'s>(
        &self,
        start: ObjectId,
        segments: impl Iterator<Item = &'s str>,
    ) -> Option<ObjectId> {
        let mut current = start;
        for segment in segments {
            current = self.graph.find_child(current, segment)?;
        }
        Some(current)
    }

    fn resolve_interface(&self, reference: &ObjectReference) -> Option<ObjectId> {
        let wanted = self
            .aliases
            .and_then(|a| a.get(&reference.type_identifier))
            .unwrap_or(&reference.type_identifier);
        self.interfaces.iter().copied().find(|id| {
            self.graph.object(*id).is_some_and(|o| {
                o.name() == reference.name
                    && (o.type_identifier() == wanted
                        || o.type_identifier() == reference.type_identifier)
            })
        })
    }
}
