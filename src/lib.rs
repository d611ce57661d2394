//! # helios-core: binding graph engine for virtual cockpit profiles
//!
//! A profile is a set of monitors (trees of visual controls) and interfaces
//! (simulator or hardware endpoints). Each object exposes triggers, actions
//! and values; bindings connect a trigger to an action, optionally gated by a
//! condition script and with the action's value taken from the trigger, a
//! static value or a script.
//!
//! ## Architecture
//!
//! - **Graph**: [`HeliosGraph`] owns objects, elements and bindings in
//!   generational arenas and runs the firing protocol synchronously
//! - **Binding**: values, units, elements and the binding edge itself, plus
//!   the loop tracer used to diagnose feedback loops
//! - **Scripting**: Rhai-based conditions and value scripts behind the
//!   [`ScriptEvaluator`] trait
//! - **Registry**: component type identifiers mapped to factories
//! - **Serialization**: profile XML, reference strings, loading, saving and
//!   copy/paste
//!
//! ## Configuration
//!
//! Engine settings are stored as JSON in the platform data directory under
//! `dev.helios.helios-core`:
//!
//! - **Linux**: `~/.local/share/dev.helios.helios-core/`
//! - **macOS**: `~/Library/Application Support/dev.helios.helios-core/`
//! - **Windows**: `%APPDATA%\dev.helios.helios-core\`
//!
//! ## Example
//!
//! ```ignore
//! use helios_core::{ComponentRegistry, EngineSettings, HeliosProfile};
//!
//! let settings = EngineSettings::load_or_default();
//! let registry = ComponentRegistry::with_builtins();
//! let (mut profile, report) = HeliosProfile::load("cockpit.hpf", &settings, &registry)?;
//! for problem in report.diagnostics() {
//!     eprintln!("{:?}: {}", problem.severity, problem.message);
//! }
//! profile.start();
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod graph;
pub mod profile;
pub mod registry;
pub mod scripting;
pub mod serialization;

// Re-export commonly used types
pub use binding::{BindingValue, BindingValueSource, ElementSpec, HeliosBinding};
pub use config::EngineSettings;
pub use error::{HeliosError, Result};
pub use graph::{BindingId, ElementId, HeliosGraph, ObjectId, ObjectKind};
pub use profile::HeliosProfile;
pub use registry::{ComponentRegistry, ComponentUnsupportedSeverity};
pub use scripting::{RhaiScriptEvaluator, ScriptEvaluator};
pub use serialization::{LoadReport, ObjectReference, ProfileLoader};
