//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// Compact `tracing` output on stderr, filtered by `RUST_LOG` when set and by
/// `level` otherwise. Calling it twice keeps the first subscriber.
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("guest list loaded");
/// ```
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(level).to_string().to_lowercase()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();

    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
