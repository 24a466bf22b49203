use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable naming an optional debug log file
pub const LOG_FILE_ENV: &str = "BASKET_LOG_FILE";

pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Install the global subscriber.
///
/// Console output goes to stderr and honours `RUST_LOG`, falling back to
/// `default_directive`. When `BASKET_LOG_FILE` is set, a second layer appends
/// everything at DEBUG and above to that file.
pub fn init_tracing_with_default(default_directive: &str) {
    let file_logging = std::env::var(LOG_FILE_ENV).ok();

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let registry = tracing_subscriber::registry().with(console);

    let file_layer = file_logging.and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
            ),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", log_path, e);
                None
            }
        }
    });

    // A second init (tests, embedding hosts) keeps the first subscriber.
    let _ = registry.with(file_layer).try_init();
}
