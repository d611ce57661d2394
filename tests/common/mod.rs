//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use helios_core::{ComponentRegistry, EngineSettings, HeliosProfile};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Settings for deterministic tests: no auto-added interfaces.
pub fn bare_settings() -> EngineSettings {
    EngineSettings {
        auto_add_default_interfaces: false,
        ..Default::default()
    }
}

/// A profile with one monitor named "Monitor 1".
pub fn profile_with_monitor(registry: &ComponentRegistry) -> HeliosProfile {
    let mut profile = HeliosProfile::empty(&bare_settings());
    profile
        .add_monitor(registry, "Monitor 1")
        .expect("monitor should be creatable");
    profile
}
