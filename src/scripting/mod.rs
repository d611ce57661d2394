//! Scripted conditions and values for bindings
//!
//! Bindings may gate execution on a condition expression and may compute the
//! value handed to their action with a script. The engine only needs one
//! capability from a script runtime: evaluate a source string with the fired
//! trigger's value bound to a variable and get zero or more typed results
//! back. That capability is the [`ScriptEvaluator`] trait; the default
//! implementation is [`RhaiScriptEvaluator`].
//!
//! ## Script Environment
//!
//! - `TriggerValue` - the fired trigger's value in its native type
//!   (`bool`, `f64` or string; `()` when the trigger carried no value)
//!
//! ## Helper Functions
//!
//! - `clamp(x, min, max)` - Clamp a number into a range
//! - `lerp(a, b, t)` - Linear interpolation
//! - `map_range(x, in_min, in_max, out_min, out_max)` - Rescale a number
//! - `to_bool(x)` - Boolean reading of a string or number
//!
//! ## Results
//!
//! A script returning `()` returns no values. A script returning an array
//! returns each element as a separate value. Anything else is one value.
//!
//! ## Example Scripts
//!
//! Condition gating on a switch position:
//! ```rhai
//! TriggerValue == "ON"
//! ```
//!
//! Scaling a simulator value to a needle angle:
//! ```rhai
//! map_range(TriggerValue, 0.0, 100.0, -135.0, 135.0)
//! ```

mod engine;

pub use engine::RhaiScriptEvaluator;

use crate::binding::value::BindingValue;
use crate::error::Result;

/// One value returned from a script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Unit,
    /// A value of another runtime type, kept as its display text.
    Other(String),
}

impl ScriptValue {
    /// Condition reading: `false` and `()` are false, everything else true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, ScriptValue::Bool(false) | ScriptValue::Unit)
    }

    /// Coerce into a binding value by runtime type.
    pub fn into_binding_value(self) -> BindingValue {
        match self {
            ScriptValue::Bool(b) => BindingValue::from_bool(b),
            ScriptValue::Int(i) => BindingValue::from_double(i as f64),
            ScriptValue::Float(f) => BindingValue::from_double(f),
            ScriptValue::Str(s) | ScriptValue::Other(s) => BindingValue::from_string(s),
            ScriptValue::Unit => BindingValue::empty(),
        }
    }
}

/// Script runtime used by bindings for conditions and computed values.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptEvaluator {
    /// Evaluate `source` with `trigger_value` bound as `TriggerValue`.
    fn evaluate(&self, source: &str, trigger_value: &BindingValue) -> Result<Vec<ScriptValue>>;

    /// Check that `source` compiles.
    fn validate(&self, source: &str) -> Result<()>;
}
