//! Binding values, elements and edges.

#[allow(clippy::module_inception)]
pub mod binding;
pub mod element;
pub mod log_filter;
pub mod tracer;
pub mod units;
pub mod value;

pub use binding::{BindingValidity, BindingValueSource, HeliosBinding};
pub use element::{
    compose_id, ActionHandler, ActionInvocation, BindingElement, ElementRole, ElementSpec,
};
pub use log_filter::LogFilter;
pub use tracer::{BindingLoopTracer, BindingTraceInfo, LoopKind, LoopReport};
pub use units::{BindingValueUnit, UnitCategory, UnitConverter};
pub use value::{BindingValue, BindingValueType};
