// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable, for interactive use
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation
    Json,
}

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - Filtering from `RUST_LOG` (default `info`)
/// - Either human-readable or JSON formatting
/// - Output to stderr so stdout stays free for command output
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use photo_watermark::logging::{init_subscriber, LogFormat};
///
/// init_subscriber(LogFormat::Pretty).expect("Failed to initialize logging");
/// tracing::info!("Application started");
///
/// // a second initialization is reported, not a panic
/// assert!(init_subscriber(LogFormat::Json).is_err());
/// ```
pub fn init_subscriber(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    }
}
