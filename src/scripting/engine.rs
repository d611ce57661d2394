//! Rhai Script Evaluator Implementation
//!
//! Compiles binding conditions and value scripts once per distinct source
//! text and evaluates them with the trigger value in scope.

use crate::binding::value::{BindingValue, BindingValueType};
use crate::config::ScriptLimits;
use crate::error::{HeliosError, Result, ResultExt};
use crate::scripting::{ScriptEvaluator, ScriptValue};
use rhai::{Dynamic, Engine, Scope, AST};
use std::collections::HashMap;
use std::sync::RwLock;

/// Name of the variable holding the fired trigger's value.
pub const TRIGGER_VALUE_VARIABLE: &str = "TriggerValue";

/// Rhai-backed [`ScriptEvaluator`]
pub struct RhaiScriptEvaluator {
    /// The Rhai engine instance
    engine: Engine,
    /// Compiled scripts keyed by source text
    cache: RwLock<HashMap<String, AST>>,
}

impl RhaiScriptEvaluator {
    /// Create an evaluator with default safety limits
    pub fn new() -> Self {
        Self::with_limits(ScriptLimits::default())
    }

    /// Create an evaluator with the given safety limits
    pub fn with_limits(limits: ScriptLimits) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, limits);

        Self {
            engine,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Configure the Rhai engine with helper functions and safety limits
    fn configure_engine(engine: &mut Engine, limits: ScriptLimits) {
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_operations(limits.max_operations);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(1_000);

        // Written out by hand: the std clamp panics on an inverted range.
        engine.register_fn("clamp", |x: f64, min: f64, max: f64| x.max(min).min(max));
        engine.register_fn("clamp", |x: i64, min: i64, max: i64| x.max(min).min(max));

        engine.register_fn("lerp", |a: f64, b: f64, t: f64| a + (b - a) * t);

        engine.register_fn(
            "map_range",
            |x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64| {
                if in_max == in_min {
                    out_min
                } else {
                    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
                }
            },
        );

        // Strings follow the binding value rules; numbers are true when nonzero.
        engine.register_fn("to_bool", |s: &str| {
            BindingValue::from_string(s).bool_value()
        });
        engine.register_fn("to_bool", |x: f64| x != 0.0);
        engine.register_fn("to_bool", |x: i64| x != 0);
        engine.register_fn("to_bool", |b: bool| b);
    }

    /// Compile a script, reusing the cached AST when available
    fn compile(&self, source: &str) -> Result<AST> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| HeliosError::Script(format!("Failed to acquire cache lock: {}", e)))?;
            if let Some(ast) = cache.get(source) {
                return Ok(ast.clone());
            }
        }

        let ast = self.engine.compile(source)?;
        let mut cache = self
            .cache
            .write()
            .map_err(|e| HeliosError::Script(format!("Failed to acquire cache lock: {}", e)))?;
        cache.insert(source.to_string(), ast.clone());
        Ok(ast)
    }

    /// Number of distinct compiled scripts
    pub fn cached_scripts(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Clear the script cache
    pub fn clear_cache(&self) -> Result<()> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| HeliosError::Script(format!("Failed to acquire cache lock: {}", e)))?;
        cache.clear();
        Ok(())
    }

    fn to_dynamic(value: &BindingValue) -> Dynamic {
        if value.is_empty() {
            return Dynamic::UNIT;
        }
        match value.native_type() {
            BindingValueType::Boolean => Dynamic::from(value.bool_value()),
            BindingValueType::Double => Dynamic::from(value.double_value()),
            BindingValueType::String => Dynamic::from(value.string_value().to_string()),
        }
    }

    fn to_script_value(value: Dynamic) -> ScriptValue {
        if value.is_unit() {
            return ScriptValue::Unit;
        }
        if let Ok(b) = value.as_bool() {
            return ScriptValue::Bool(b);
        }
        if let Ok(i) = value.as_int() {
            return ScriptValue::Int(i);
        }
        if let Ok(f) = value.as_float() {
            return ScriptValue::Float(f);
        }
        if value.is_string() {
            return match value.into_string() {
                Ok(s) => ScriptValue::Str(s),
                Err(type_name) => ScriptValue::Other(type_name.to_string()),
            };
        }
        ScriptValue::Other(value.to_string())
    }
}

impl ScriptEvaluator for RhaiScriptEvaluator {
    fn evaluate(&self, source: &str, trigger_value: &BindingValue) -> Result<Vec<ScriptValue>> {
        let ast = self.compile(source)?;

        let mut scope = Scope::new();
        scope.push_dynamic(TRIGGER_VALUE_VARIABLE, Self::to_dynamic(trigger_value));

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .with_context(|| format!("Evaluating '{}'", source))?;

        if result.is_unit() {
            return Ok(Vec::new());
        }
        if result.is_array() {
            let items = result
                .into_array()
                .map_err(|t| HeliosError::Script(format!("Expected array, got {}", t)))?;
            return Ok(items.into_iter().map(Self::to_script_value).collect());
        }
        Ok(vec![Self::to_script_value(result)])
    }

    fn validate(&self, source: &str) -> Result<()> {
        self.engine.compile(source).map(|_| ()).map_err(|e| {
            HeliosError::Script(format!("Validation error: {}", e))
        })
    }
}

impl Default for RhaiScriptEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RhaiScriptEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiScriptEvaluator")
            .field("cache_size", &self.cached_scripts())
            .finish()
    }
}
