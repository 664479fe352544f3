//! jadoo alien interface
//!
//! Press Enter to open the interface, then play the key sequence shown in the
//! prompt. Each accepted key sends a tone; the full sequence starts the
//! receiving cue.

mod app;
mod audio;
mod controller;
mod device;
mod input;
mod matcher;
mod presentation;
mod terminal;
mod timers;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use jadoo_config::LogLevel;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::audio::AudioPlayer;
use crate::controller::PresentationController;
use crate::matcher::KeySequence;
use crate::terminal::TerminalSink;
use crate::timers::Scheduler;

#[derive(Parser, Debug)]
#[command(name = "jadoo-interface")]
#[command(about = "Key-sequence driven alien interface")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/jadoo/config.kdl")]
    config: String,

    /// Read keys from an evdev device instead of the terminal
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Grab the evdev device for exclusive access (with --device)
    #[arg(long, requires = "device")]
    grab: bool,

    /// Log file (the terminal itself is used for the display)
    #[arg(long, default_value = "~/.cache/jadoo/interface.log")]
    log_file: String,
}

/// Swaps the log filter once the configuration is known
type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn log_subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer),
    );
    (subscriber, handle)
}

/// Install the global subscriber writing to `path`.
///
/// The returned guard flushes pending lines when dropped.
fn init_tracing(path: &Path, filter: EnvFilter) -> Result<(FilterHandle, WorkerGuard)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let (subscriber, handle) = log_subscriber(filter, writer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")?;

    Ok((handle, guard))
}

fn set_log_level(handle: &FilterHandle, level: LogLevel) -> Result<()> {
    handle
        .reload(EnvFilter::new(level.as_filter()))
        .context("Failed to apply the configured log level")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes first so configuration warnings are kept
    let log_path: PathBuf = shellexpand::tilde(&args.log_file).into_owned().into();
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_from_env = env_filter.is_some();
    let filter = env_filter.unwrap_or_else(|| EnvFilter::new(LogLevel::default().as_filter()));
    let (filter_handle, _log_guard) = init_tracing(&log_path, filter)?;

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    // Parse configuration
    let config = jadoo_config::load_config(&config_path)?;

    if !level_from_env {
        set_log_level(&filter_handle, config.global.log_level)?;
    }

    tracing::info!(
        "Loaded configuration from {} ({} symbol sequence)",
        config_path.display(),
        config.sequence.len()
    );

    let sequence =
        KeySequence::new(config.sequence.clone()).context("The key sequence is empty")?;
    tracing::debug!(
        "Sequence: {}",
        sequence.symbols().iter().map(|s| s.to_string()).collect::<String>()
    );

    let (input_tx, input_rx) = mpsc::channel(64);
    let _source = match &args.device {
        Some(path) => input::spawn_device_source(path, args.grab, input_tx)?,
        None => input::spawn_terminal_source(input_tx),
    };

    let (scheduler, timer_rx) = Scheduler::new();
    let sink = TerminalSink::new(AudioPlayer::new(config.sounds.clone()))
        .context("Failed to prepare the terminal")?;
    let controller = PresentationController::new(sink, sequence, config.ambient, scheduler);

    tracing::info!("jadoo interface ready, press Enter");

    // Dropping the controller restores the terminal
    let controller = app::run(controller, input_rx, timer_rx).await;
    drop(controller);

    tracing::info!("Shutting down...");

    Ok(())
}
