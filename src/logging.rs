//! Structured logging and tracing for the vehicle panel
//!
//! Console output through `tracing-subscriber`, optionally mirrored to a
//! daily-rotated file via `tracing-appender`. Components log through
//! [`StructuredLogger`], which attaches a `fields` attribute with the panel
//! session and vehicle ids.

mod level;
mod structured;

pub use level::{level_rank, min_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use crate::config::LoggingConfig;
use crate::error::{PanelError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging based on configuration; later calls are no-ops
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        if let Err(e) = try_init(config) {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(PanelError::config(err.clone()));
    }
    Ok(())
}

fn try_init(config: &LoggingConfig) -> Result<()> {
    let base_level = parse_log_level(&config.level)?;
    let console_level = override_level(config.console_level.as_deref(), base_level);
    let file_level = override_level(config.file_level.as_deref(), base_level);

    let log_dir = if should_use_console_only() {
        None
    } else {
        config.file.as_deref().map(log_directory)
    };

    let most_verbose = if log_dir.is_some() {
        min_level(console_level, file_level)
    } else {
        console_level
    };
    let filter = build_env_filter(most_verbose);

    let file_layer = match log_dir {
        Some(dir) => {
            let appender = rolling::Builder::new()
                .rotation(rolling::Rotation::DAILY)
                .filename_prefix("vehicle-panel")
                .filename_suffix("log")
                .max_log_files(config.backup_count.max(1) as usize)
                .build(dir)
                .map_err(|e| {
                    PanelError::io(format!("Failed to create log file appender: {}", e))
                })?;
            let (writer, guard) = non_blocking(appender);
            let _ = LOG_GUARD.set(guard);

            let base = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false);
            Some(if config.json_format {
                base.json()
                    .with_filter(LevelFilter::from_level(file_level))
                    .boxed()
            } else {
                base.with_filter(LevelFilter::from_level(file_level))
                    .boxed()
            })
        }
        None => None,
    };

    let console_layer = if config.console_output {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        Some(if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(console_level))
                .boxed()
        })
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| PanelError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, file: {}",
        console_level,
        file_level,
        config.file.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn override_level(level: Option<&str>, fallback: Level) -> Level {
    level
        .and_then(|s| parse_log_level(s).ok())
        .unwrap_or(fallback)
}

/// A path with an extension is a file; its parent directory holds the logs
fn log_directory(file: &str) -> &Path {
    let p = Path::new(file);
    if p.extension().is_some() {
        p.parent().unwrap_or(p)
    } else {
        p
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "vehicle_panel={},vehicle_panel::api=info,reqwest=warn,hyper=warn",
            level
        )
        .into()
    })
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("VEHICLE_PANEL_DISABLE_FILE_LOG").is_some()
}
