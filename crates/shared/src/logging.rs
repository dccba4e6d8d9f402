//! Logging infrastructure for the book browser.
//!
//! Structured tracing output with an optional daily-rotated log file next
//! to the console stream. Levels honor `RUST_LOG` when set and fall back
//! to the configured default otherwise.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Resolved logging setup for one process
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Component name, also used for log file naming
    pub component: String,
    /// Log directory path
    pub log_dir: String,
    /// Level applied when `RUST_LOG` is not set
    pub default_level: Level,
    /// Enable console output
    pub console: bool,
    /// Enable file output
    pub file: bool,
    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            component: "book-browser".to_string(),
            log_dir: "logs".to_string(),
            default_level: Level::INFO,
            console: true,
            file: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Resolve the `[logging]` section of the configuration file
    ///
    /// An unparseable level string falls back to `info`.
    pub fn from_settings(component: &str, settings: &LoggingConfig) -> Self {
        Self {
            component: component.to_string(),
            log_dir: settings.log_dir.clone(),
            default_level: settings.default_level.parse().unwrap_or(Level::INFO),
            console: settings.console,
            file: settings.file,
            json_format: settings.json_format,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// Noisy HTTP internals (hyper, reqwest, h2) are capped at `warn` unless
/// `RUST_LOG` overrides the whole filter.
pub fn init(config: LogConfig) -> Result<()> {
    let log_dir = Path::new(&config.log_dir);
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", config.log_dir))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},shared={},book_browser={},hyper=warn,reqwest=warn,h2=warn",
            config.component, config.default_level, config.default_level, config.default_level
        ))
    });

    let mut layers = Vec::new();

    if config.console {
        layers.push(
            fmt::layer()
                .with_target(true)
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stdout)
                .boxed(),
        );
    }

    if config.file {
        // One file per day, named after the component.
        let file_appender = tracing_appender::rolling::daily(log_dir, &config.component);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(file_appender)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender)
                .boxed()
        };
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(
        component = %config.component,
        log_dir = %config.log_dir,
        "Logging initialized"
    );

    Ok(())
}
