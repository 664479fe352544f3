//! jadoo CLI
//!
//! Inspection tool for the jadoo interface configuration.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jadoo_config::{Config, Symbol};
use miette::IntoDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "jadoo")]
#[command(about = "Configuration tool for the jadoo alien interface")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/jadoo/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// List keyboards usable with `jadoo-interface --device`
    Devices,

    /// Show the effective key sequence and check its sound files
    Sequence,
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Validate => cmd_validate(&config_path),
        Commands::Devices => cmd_devices(),
        Commands::Sequence => cmd_sequence(&config_path),
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = jadoo_config::parse_config(config_path)?;
    println!("Configuration is valid!");
    println!("  Sequence: {} symbol(s)", config.sequence.len());
    println!("  Ambient:  {:?}", config.ambient);
    println!("  Sounds:   {}", config.sounds.directory.display());
    Ok(())
}

fn cmd_devices() -> miette::Result<()> {
    println!("Available keyboards:\n");

    for entry in std::fs::read_dir("/dev/input").into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }

        match evdev::Device::open(&path) {
            Ok(device) => {
                let is_keyboard = device.supported_events().contains(evdev::EventType::KEY)
                    && device
                        .supported_keys()
                        .map(|keys| keys.contains(evdev::Key::KEY_A))
                        .unwrap_or(false);

                if !is_keyboard {
                    continue;
                }

                let name = device.name().unwrap_or("Unknown");
                let id = device.input_id();
                println!("  {}", name);
                println!("    Path: {}", path.display());
                println!("    ID: {:04x}:{:04x}", id.vendor(), id.product());
                println!();
            }
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Ok(())
}

fn cmd_sequence(config_path: &Path) -> miette::Result<()> {
    let config = jadoo_config::load_config(config_path)?;

    println!("Sequence: {}", format_sequence(&config.sequence));
    println!("Player:   {}", config.sounds.player);
    println!();

    let missing = missing_sounds(&config);
    if missing.is_empty() {
        println!("All sound files present.");
    } else {
        println!("Missing sound files (cues will be skipped):");
        for path in &missing {
            println!("  {}", path.display());
        }
    }

    Ok(())
}

fn format_sequence(sequence: &[Symbol]) -> String {
    sequence
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sound files referenced by the configuration that do not exist, each once
fn missing_sounds(config: &Config) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = config
        .sequence
        .iter()
        .map(|&symbol| config.sounds.key_path(symbol))
        .collect();
    paths.push(config.sounds.receiving_path());

    let mut missing = Vec::new();
    for path in paths {
        if !path.is_file() && !missing.contains(&path) {
            missing.push(path);
        }
    }
    missing
}
