//! Profile persistence: XML documents, object references, loading, saving
//! and copy/paste.

pub mod copy;
pub mod document;
pub mod loader;
pub mod reference;
pub mod writer;

pub use copy::{copy_controls, paste_controls, PasteOutcome};
pub use document::{BindingNode, ControlNode, CopyDocument, InterfaceNode, ProfileDocument};
pub use loader::{DiagnosticSeverity, LoadDiagnostic, LoadReport, ProfileLoader};
pub use reference::{reference_name, CopyScope, ObjectReference, ReferenceResolver, ReferenceType};
pub use writer::{escape_xml_attr, escape_xml_text, write_profile};
