//! Engine configuration for helios-core
//!
//! Settings that change how the binding engine behaves at runtime: legacy
//! reset semantics, log filtering, loop tracing, the severity applied to
//! unsupported components and the scripting safety limits.
//!
//! # App Data Location
//!
//! Settings are stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.helios.helios-core/`
//! - **macOS**: `~/Library/Application Support/dev.helios.helios-core/`
//! - **Windows**: `%APPDATA%\dev.helios.helios-core\`
//!
//! # Example
//!
//! ```ignore
//! use helios_core::config::EngineSettings;
//!
//! let mut settings = EngineSettings::load_or_default();
//! settings.trace_binding_loops = true;
//! settings.save()?;
//! ```

use crate::error::{HeliosError, Result};
use crate::registry::ComponentUnsupportedSeverity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.helios.helios-core";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.json";

/// Profile file extension
pub const PROFILE_FILE_EXTENSION: &str = "hpf";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        HeliosError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            HeliosError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the settings file
pub fn settings_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SETTINGS_FILE))
}

// ==================== Script Limits ====================

/// Safety limits applied to the script engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLimits {
    /// Maximum number of operations per evaluation
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,

    /// Maximum function call nesting
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,

    /// Maximum expression nesting depth
    #[serde(default = "default_max_expr_depth")]
    pub max_expr_depth: usize,
}

fn default_max_operations() -> u64 {
    10_000
}

fn default_max_call_levels() -> usize {
    32
}

fn default_max_expr_depth() -> usize {
    64
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_expr_depth: default_max_expr_depth(),
        }
    }
}

// ==================== Engine Settings ====================

/// Persistent engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Version for future migration support
    #[serde(default = "default_settings_version")]
    pub version: u32,

    /// Value reset is a no-op instead of forcing resynchronization
    #[serde(default)]
    pub legacy_value_reset: bool,

    /// Log every binding failure instead of once per distinct message
    #[serde(default)]
    pub verbose_binding_logging: bool,

    /// Install the soft-loop tracer into new graphs
    #[serde(default)]
    pub trace_binding_loops: bool,

    /// Severity for unsupported components that don't carry their own
    #[serde(default)]
    pub default_unsupported_severity: ComponentUnsupportedSeverity,

    /// New profiles get a profile interface automatically
    #[serde(default = "default_true")]
    pub auto_add_default_interfaces: bool,

    /// Script engine safety limits
    #[serde(default)]
    pub script_limits: ScriptLimits,
}

fn default_settings_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: 1,
            legacy_value_reset: false,
            verbose_binding_logging: false,
            trace_binding_loops: false,
            default_unsupported_severity: ComponentUnsupportedSeverity::default(),
            auto_add_default_interfaces: true,
            script_limits: ScriptLimits::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        let path = settings_path().ok_or_else(|| {
            HeliosError::Config("Could not determine settings path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load settings, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(SETTINGS_FILE))
    }

    /// Load settings from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| HeliosError::Config(format!("Failed to read settings: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| HeliosError::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| HeliosError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| HeliosError::Config(format!("Failed to write settings: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = EngineSettings::default();
        assert!(!settings.legacy_value_reset);
        assert!(!settings.trace_binding_loops);
        assert!(settings.auto_add_default_interfaces);
        assert_eq!(
            settings.default_unsupported_severity,
            ComponentUnsupportedSeverity::Error
        );
        assert_eq!(settings.script_limits.max_operations, 10_000);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = EngineSettings {
            trace_binding_loops: true,
            default_unsupported_severity: ComponentUnsupportedSeverity::Ignore,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let parsed: EngineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: EngineSettings =
            serde_json::from_str(r#"{ "legacy_value_reset": true }"#).unwrap();
        assert!(parsed.legacy_value_reset);
        assert!(parsed.auto_add_default_interfaces);
        assert_eq!(parsed.script_limits, ScriptLimits::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = EngineSettings {
            verbose_binding_logging: true,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(EngineSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            EngineSettings::load_from(&path),
            Err(HeliosError::Config(_))
        ));
    }
}
