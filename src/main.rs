//! helios - command line tools for Helios profiles
//!
//! Loads profiles with the built-in component registry to report load
//! problems, rewrite them in the current format, or list value units.

use anyhow::Context;
use clap::{Parser, Subcommand};
use helios_core::{
    binding::units::ALL_UNITS,
    serialization::{DiagnosticSeverity, ProfileLoader},
    ComponentRegistry, EngineSettings, HeliosProfile,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "helios", about = "Inspect and rewrite Helios profiles")]
struct Args {
    /// Engine settings file (defaults to the platform data directory).
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a profile and report every problem found.
    Check {
        #[arg(value_name = "PROFILE")]
        profile: PathBuf,
    },
    /// Load a profile and write it back out.
    Resave {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
    /// List the value units bindings can convert between.
    Units,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,helios_core=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => EngineSettings::load_from(path)
            .with_context(|| format!("Loading settings from {}", path.display()))?,
        None => EngineSettings::load_or_default(),
    };
    let registry = ComponentRegistry::with_builtins();

    match args.command {
        Command::Check { profile } => {
            if !check(&profile, &settings, &registry)? {
                std::process::exit(1);
            }
        }
        Command::Resave { input, output } => {
            let (mut profile, report) = HeliosProfile::load(&input, &settings, &registry)
                .with_context(|| format!("Loading {}", input.display()))?;
            if report.error_count() > 0 {
                tracing::warn!(
                    "{} problems while loading; content that failed to load is not written",
                    report.error_count()
                );
            }
            let written = profile
                .save(&output)
                .with_context(|| format!("Saving {}", output.display()))?;
            println!("Wrote {}", written.display());
        }
        Command::Units => {
            for unit in ALL_UNITS {
                println!("{:<8} {:<24} {:?}", unit.name, unit.long_name, unit.category);
            }
        }
    }
    Ok(())
}

/// Load `path` step by step and print what went wrong. Returns false when the
/// load produced errors.
fn check(
    path: &Path,
    settings: &EngineSettings,
    registry: &ComponentRegistry,
) -> anyhow::Result<bool> {
    let mut loader = ProfileLoader::open(path, settings, registry)
        .with_context(|| format!("Loading {}", path.display()))?;
    while let Some(message) = loader.next() {
        let (done, total) = loader.progress();
        tracing::debug!("[{}/{}] {}", done, total, message);
    }
    let (profile, report) = loader.finish();

    for diagnostic in report.diagnostics() {
        let label = match diagnostic.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        };
        println!("{}: {}", label, diagnostic.message);
    }

    let graph = profile.graph();
    let mut invalid = 0;
    for (id, binding) in graph.bindings() {
        if binding.error_message().is_empty() {
            continue;
        }
        let label = if binding.is_valid() {
            "advisory"
        } else {
            invalid += 1;
            "invalid"
        };
        println!(
            "{}: {}: {}",
            label,
            graph.binding_description(id),
            binding.error_message()
        );
    }

    println!(
        "{}: {} monitors, {} interfaces, {} bindings ({} invalid), {} errors, {} warnings",
        path.display(),
        profile.monitors().len(),
        profile.interfaces().len(),
        graph.binding_count(),
        invalid,
        report.error_count(),
        report.warning_count()
    );
    Ok(report.error_count() == 0)
}
